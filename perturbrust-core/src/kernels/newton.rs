use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::complex::Complex;
use crate::error::CoreError;
use crate::kernels::support::OrbitAccumulator;
use crate::params::FractalParams;
use crate::result::IterationResult;

/// Polynomials the Newton family can iterate on. Roots are closed-form and
/// precomputed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NewtonPolynomial {
    /// `z³ − 1`
    Cubic,
    /// `z⁴ − 1`
    Quartic,
    /// `z⁵ − 1`
    Quintic,
    /// `z⁶ − 1`
    Sextic,
    /// `z^n − 1` for a user-chosen `n ≥ 2`
    UnityRoots(u32),
    /// `z³ − 2z + 2` — the classic basin-of-no-convergence example
    CubicBasin,
    /// `z⁴ − z`
    QuarticZ,
}

impl NewtonPolynomial {
    pub fn degree(&self) -> u32 {
        match self {
            Self::Cubic | Self::CubicBasin => 3,
            Self::Quartic | Self::QuarticZ => 4,
            Self::Quintic => 5,
            Self::Sextic => 6,
            Self::UnityRoots(n) => (*n).max(2),
        }
    }

    /// The polynomial's roots, attractor targets for the iteration.
    pub fn roots(&self) -> Vec<Complex> {
        fn unity(n: u32) -> Vec<Complex> {
            (0..n)
                .map(|k| {
                    let theta = TAU * k as f64 / n as f64;
                    Complex::new(theta.cos(), theta.sin())
                })
                .collect()
        }
        match self {
            Self::Cubic => unity(3),
            Self::Quartic => unity(4),
            Self::Quintic => unity(5),
            Self::Sextic => unity(6),
            Self::UnityRoots(n) => unity((*n).max(2)),
            Self::CubicBasin => vec![
                Complex::new(-1.7692923542386314, 0.0),
                Complex::new(0.8846461771193157, 0.5897428050222055),
                Complex::new(0.8846461771193157, -0.5897428050222055),
            ],
            Self::QuarticZ => {
                // z⁴ − z = z·(z³ − 1)
                let mut roots = vec![Complex::ZERO];
                roots.extend(unity(3));
                roots
            }
        }
    }

    /// Evaluate `(f(z), f′(z))`.
    #[inline]
    pub fn eval(&self, z: Complex) -> (Complex, Complex) {
        match self {
            Self::Cubic => {
                let z2 = z.square();
                (z2 * z - Complex::ONE, z2 * 3.0)
            }
            Self::Quartic => {
                let z3 = z.cube();
                (z3 * z - Complex::ONE, z3 * 4.0)
            }
            Self::Quintic => {
                let z4 = z.square().square();
                (z4 * z - Complex::ONE, z4 * 5.0)
            }
            Self::Sextic => {
                let z5 = z.square().square() * z;
                (z5 * z - Complex::ONE, z5 * 6.0)
            }
            Self::UnityRoots(n) => {
                let n = (*n).max(2) as i32;
                let zn1 = z.powi(n - 1);
                (zn1 * z - Complex::ONE, zn1 * n as f64)
            }
            Self::CubicBasin => {
                let z2 = z.square();
                (
                    z2 * z - z * 2.0 + Complex::new(2.0, 0.0),
                    z2 * 3.0 - Complex::new(2.0, 0.0),
                )
            }
            Self::QuarticZ => {
                let z3 = z.cube();
                (z3 * z - z, z3 * 4.0 - Complex::ONE)
            }
        }
    }
}

/// Derivative floor below which the iteration is declared divergent
/// (a critical point swallows the Newton step).
const DERIVATIVE_FLOOR_SQ: f64 = 1e-20;

/// Newton's method as a fractal: `z ← z − α·f(z)/f′(z)`, colored by which
/// root captures the orbit and how fast. Nova mode adds the pixel as a
/// constant term, producing a Mandelbrot-like parameter plane.
#[derive(Debug, Clone)]
pub struct Newton {
    params: FractalParams,
    polynomial: NewtonPolynomial,

    /// Relaxation factor `α`; 1 is the classic method.
    relaxation: Complex,

    nova: bool,

    /// Convergence radius around each root.
    tolerance: f64,

    roots: Vec<Complex>,
}

impl Newton {
    pub const DEFAULT_TOLERANCE: f64 = 1e-6;

    pub fn new(
        params: FractalParams,
        polynomial: NewtonPolynomial,
        relaxation: Complex,
        nova: bool,
        tolerance: f64,
    ) -> crate::Result<Self> {
        params.validate()?;
        if tolerance <= 0.0 || !tolerance.is_finite() {
            return Err(CoreError::InvalidBailout(tolerance));
        }
        let roots = polynomial.roots();
        Ok(Self {
            params,
            polynomial,
            relaxation,
            nova,
            tolerance,
            roots,
        })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn polynomial(&self) -> NewtonPolynomial {
        self.polynomial
    }

    pub fn roots(&self) -> &[Complex] {
        &self.roots
    }

    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let (mut z, c) = if self.nova {
            if p.julia_mode {
                (point, p.julia_c)
            } else {
                // Parameter plane: start from a root's basin center.
                (Complex::ONE, point)
            }
        } else {
            (point, Complex::ZERO)
        };

        let bailout_sq = p.bailout_sq();
        let tol_sq = self.tolerance * self.tolerance;
        let degree = self.polynomial.degree() as f64;
        let mut acc = OrbitAccumulator::new(p);

        let mut closest_root = 0usize;
        let mut closest_dist_sq = f64::INFINITY;

        for n in 0..p.max_iterations {
            let (f, fp) = self.polynomial.eval(z);
            if fp.norm_sq() < DERIVATIVE_FLOOR_SQ {
                return self.diverged(n, z, closest_root, &acc);
            }

            z = z - self.relaxation * (f / fp) + c;
            acc.update(z);

            if !z.is_finite() || z.norm_sq() > bailout_sq {
                return self.diverged(n, z, closest_root, &acc);
            }

            for (i, root) in self.roots.iter().enumerate() {
                let dist_sq = (z - *root).norm_sq();
                if dist_sq < closest_dist_sq {
                    closest_dist_sq = dist_sq;
                    closest_root = i;
                }
                if dist_sq < tol_sq {
                    return self.converged(n, z, i, dist_sq.sqrt(), degree, &acc);
                }
            }
        }

        // Never captured: report the nearest basin.
        let mut result = IterationResult::interior(p.max_iterations, z);
        result.root_index = Some(closest_root);
        result.angle = Some(z.arg());
        acc.apply(&mut result);
        result
    }

    fn converged(
        &self,
        n: u32,
        z: Complex,
        root_index: usize,
        dist: f64,
        degree: f64,
        acc: &OrbitAccumulator,
    ) -> IterationResult {
        let mut result = IterationResult {
            iterations: n,
            escaped: false,
            final_z: z,
            final_norm_sq: z.norm_sq(),
            root_index: Some(root_index),
            ..IterationResult::default()
        };
        // Fractional convergence count; dist ≤ tol makes this ≥ n.
        result.smooth = if dist > 0.0 && degree > 1.0 {
            n as f64 + (self.tolerance / dist).ln() / degree.ln()
        } else {
            n as f64
        };
        result.angle = Some(z.arg());
        acc.apply(&mut result);
        result
    }

    fn diverged(
        &self,
        n: u32,
        z: Complex,
        closest_root: usize,
        acc: &OrbitAccumulator,
    ) -> IterationResult {
        let mut result = IterationResult::escaped(n, z);
        result.root_index = Some(closest_root);
        if z.is_finite() {
            result.angle = Some(z.arg());
        }
        acc.apply(&mut result);
        result
    }
}
