use crate::bigcomplex::BigComplex;
use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// A Julia set: `z_{n+1} = z_n^p + c`, where `c` is a fixed constant and
/// `z₀` is the point on the complex plane.
#[derive(Debug, Clone)]
pub struct Julia {
    params: FractalParams,

    /// The fixed constant `c` that defines this Julia set.
    c: Complex,
}

impl Julia {
    pub fn new(c: Complex, params: FractalParams) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params, c })
    }

    /// A visually interesting default: `c = -0.7 + 0.27015i`.
    pub fn default_c() -> Complex {
        Complex::new(-0.7, 0.27015)
    }

    pub fn c(&self) -> Complex {
        self.c
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }
}

impl Default for Julia {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
            c: Self::default_c(),
        }
    }
}

impl Julia {
    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let bailout_sq = p.bailout_sq();
        let max_iter = p.max_iterations;
        let power = p.power;
        let c = self.c;

        let track_der = p.distance_estimate;
        // d z_{n+1} / d z₀ = p·z^(p−1)·z′, seeded with 1 (in z, not c).
        let mut der = Complex::ONE;

        let mut z = point;
        let mut acc = OrbitAccumulator::new(p);
        let cycle_check = !acc.needs_full_orbit() && !track_der;

        // Brent's cycle detection state.
        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 0..max_iter {
            if track_der {
                der = match power {
                    2 => z * der * 2.0,
                    _ => z.powi(power - 1) * der * power as f64,
                };
            }

            z = match power {
                2 => z.square() + c,
                3 => z.cube() + c,
                _ => z.powi(power) + c,
            };
            acc.update(z);

            let norm_sq = z.norm_sq();
            if norm_sq > bailout_sq {
                return escape_result(p, n, z, track_der.then_some(der), power as f64, &acc);
            }

            if cycle_check {
                if (z.re - old_z.re).abs() < 1e-13 && (z.im - old_z.im).abs() < 1e-13 {
                    return interior_result(p, z, &acc);
                }
                period += 1;
                if period > check {
                    old_z = z;
                    period = 0;
                    check = check.saturating_mul(2);
                }
            }
        }

        interior_result(p, z, &acc)
    }

    /// Arbitrary-precision kernel over [`BigComplex`].
    pub fn iterate_arbitrary(&self, point: &BigComplex) -> IterationResult {
        let p = &self.params;
        let precision = p.precision;
        let c = BigComplex::from_complex(self.c, precision);
        let bailout_sq = BigDecimal::from_f64(p.bailout_sq(), precision);

        let mut z = point.clone();
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..p.max_iterations {
            z = match p.power {
                2 => &z.square() + &c,
                power => &z.powi(power as u32) + &c,
            };
            let z_f64 = z.to_complex();
            acc.update(z_f64);

            if z.escaped(&bailout_sq) {
                let mut result = escape_result(p, n, z_f64, None, p.power as f64, &acc);
                result.final_norm_sq = z.norm_sq().to_f64();
                return result;
            }
        }

        interior_result(p, z.to_complex(), &acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn julia() -> Julia {
        Julia::default()
    }

    #[test]
    fn far_point_escapes() {
        let r = julia().iterate(Complex::new(10.0, 0.0));
        assert!(r.escaped, "far point should escape");
    }

    #[test]
    fn c_zero_origin_is_fixed_point() {
        // Julia with c = 0: z_{n+1} = z_n². The origin never moves.
        let j = Julia::new(Complex::ZERO, FractalParams::default()).unwrap();
        let r = j.iterate(Complex::ZERO);
        assert!(!r.escaped);
    }

    #[test]
    fn c_zero_far_point_escapes() {
        let j = Julia::new(Complex::ZERO, FractalParams::default()).unwrap();
        assert!(j.iterate(Complex::new(3.0, 0.0)).escaped);
    }

    #[test]
    fn symmetric_under_negation() {
        // z → −z maps orbits of z²+c onto each other, so iteration counts
        // agree exactly at z₀ and −z₀.
        let j = julia();
        let points = [
            Complex::new(0.4, 0.3),
            Complex::new(-0.9, 0.1),
            Complex::new(0.05, -0.77),
            Complex::new(1.1, 0.6),
        ];
        for &z0 in &points {
            let a = j.iterate(z0);
            let b = j.iterate(-z0);
            assert_eq!(a.class(), b.class(), "asymmetry at z₀ = {z0}");
        }
    }

    #[test]
    fn matches_arbitrary_precision() {
        let j = julia();
        for &z0 in &[
            Complex::new(0.1, 0.1),
            Complex::new(3.0, 3.0),
            Complex::new(1.5, -0.2),
        ] {
            let double = j.iterate(z0);
            let arbitrary = j.iterate_arbitrary(&BigComplex::from_complex(z0, 50));
            assert_eq!(double.class(), arbitrary.class(), "mismatch at z₀ = {z0}");
        }
    }

    #[test]
    fn deterministic_results() {
        let j = julia();
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(0.5, 0.5),
            Complex::new(-1.0, 0.3),
            Complex::new(0.0, 1.0),
        ];
        let run1: Vec<_> = points.iter().map(|&z| j.iterate(z)).collect();
        let run2: Vec<_> = points.iter().map(|&z| j.iterate(z)).collect();
        assert_eq!(run1, run2, "iteration results must be deterministic");
    }
}
