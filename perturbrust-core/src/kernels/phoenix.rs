use crate::bigcomplex::BigComplex;
use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// The Phoenix fractal: a quadratic recurrence with a one-step history term.
///
/// General form: `z_{n+1} = z_n² + c + p·z_{n−1}`.
/// Ushiki's original form folds the history coefficient into `c`:
/// `z_{n+1} = z_n² + Re(c) + Im(c)·z_{n−1}`.
#[derive(Debug, Clone)]
pub struct Phoenix {
    params: FractalParams,

    /// History coefficient for the general form.
    p: Complex,

    /// Use Ushiki's parameterization (`p` is implied by `Im c`).
    ushiki: bool,
}

impl Phoenix {
    pub fn new(params: FractalParams, p: Complex, ushiki: bool) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params, p, ushiki })
    }

    /// The classic Phoenix Julia constant: `c = 0.5667, p = −0.5`.
    pub fn default_p() -> Complex {
        Complex::new(-0.5, 0.0)
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn p(&self) -> Complex {
        self.p
    }

    pub fn ushiki(&self) -> bool {
        self.ushiki
    }
}

impl Default for Phoenix {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
            p: Self::default_p(),
            ushiki: false,
        }
    }
}

/// One Phoenix step; `prev` is `z_{n−1}`.
#[inline]
pub(crate) fn step(ushiki: bool, z: Complex, prev: Complex, c: Complex, p: Complex) -> Complex {
    if ushiki {
        Complex::new(
            z.re * z.re - z.im * z.im + c.re,
            2.0 * z.re * z.im,
        ) + prev * c.im
    } else {
        z.square() + c + p * prev
    }
}

impl Phoenix {
    pub fn iterate(&self, point: Complex) -> IterationResult {
        let params = &self.params;
        let (z0, c) = if params.julia_mode {
            (point, params.julia_c)
        } else {
            (Complex::ZERO, point)
        };

        let bailout_sq = params.bailout_sq();
        let max_iter = params.max_iterations;

        // Derivative with history: z′_{n+1} = 2·z_n·z′_n + p·z′_{n−1} (+1
        // for the c-seed). Only the general form is analytic in c.
        let track_der = params.distance_estimate && !self.ushiki;
        let der_seed = if params.julia_mode { 0.0 } else { 1.0 };
        let mut der = if params.julia_mode {
            Complex::ONE
        } else {
            Complex::ZERO
        };
        let mut der_prev = Complex::ZERO;

        let mut z = z0;
        let mut prev = Complex::ZERO;
        let mut acc = OrbitAccumulator::new(params);

        for n in 0..max_iter {
            if track_der {
                let next_der = z * der * 2.0 + self.p * der_prev + Complex::new(der_seed, 0.0);
                der_prev = der;
                der = next_der;
            }

            let next = step(self.ushiki, z, prev, c, self.p);
            prev = z;
            z = next;
            acc.update(z);

            let norm_sq = z.norm_sq();
            if norm_sq > bailout_sq {
                return escape_result(params, n, z, track_der.then_some(der), 2.0, &acc);
            }
        }

        interior_result(params, z, &acc)
    }

    /// Arbitrary-precision kernel over [`BigComplex`].
    pub fn iterate_arbitrary(&self, point: &BigComplex) -> IterationResult {
        let params = &self.params;
        let precision = params.precision;
        let (mut z, c) = if params.julia_mode {
            (
                point.clone(),
                BigComplex::from_complex(params.julia_c, precision),
            )
        } else {
            (BigComplex::zero(precision), point.clone())
        };

        let p_big = BigComplex::from_complex(self.p, precision);
        let bailout_sq = BigDecimal::from_f64(params.bailout_sq(), precision);
        let mut prev = BigComplex::zero(precision);
        let mut acc = OrbitAccumulator::new(params);

        for n in 0..params.max_iterations {
            let next = if self.ushiki {
                let sq = z.square();
                let history = prev.scale(&c.im);
                BigComplex::new(&(&sq.re + &c.re) + &history.re, &sq.im + &history.im)
            } else {
                &(&z.square() + &c) + &(&p_big * &prev)
            };
            prev = z;
            z = next;
            let z_f64 = z.to_complex();
            acc.update(z_f64);

            if z.escaped(&bailout_sq) {
                let mut result = escape_result(params, n, z_f64, None, 2.0, &acc);
                result.final_norm_sq = z.norm_sq().to_f64();
                return result;
            }
        }

        interior_result(params, z.to_complex(), &acc)
    }
}
