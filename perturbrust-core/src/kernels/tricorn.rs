use crate::bigcomplex::BigComplex;
use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// The Tricorn (Mandelbar): `z_{n+1} = conj(z_n)^p + c`.
///
/// `power` comes from the shared params; `p = 2` gives the classic
/// three-cornered set, higher powers the multicorns.
#[derive(Debug, Clone)]
pub struct Tricorn {
    params: FractalParams,
}

impl Tricorn {
    pub fn new(params: FractalParams) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }
}

impl Default for Tricorn {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
        }
    }
}

impl Tricorn {
    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let (z0, c) = if p.julia_mode {
            (point, p.julia_c)
        } else {
            (Complex::ZERO, point)
        };

        let bailout_sq = p.bailout_sq();
        let max_iter = p.max_iterations;
        let power = p.power;

        // Anti-holomorphic recurrence: the conjugate linearization is the
        // standard pragmatic derivative for distance estimation.
        let track_der = p.distance_estimate;
        let der_seed = if p.julia_mode { 0.0 } else { 1.0 };
        let mut der = if p.julia_mode {
            Complex::ONE
        } else {
            Complex::ZERO
        };

        let mut z = z0;
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..max_iter {
            let w = z.conj();
            if track_der {
                der = match power {
                    2 => w * der.conj() * 2.0 + Complex::new(der_seed, 0.0),
                    _ => w.powi(power - 1) * der.conj() * power as f64
                        + Complex::new(der_seed, 0.0),
                };
            }

            z = match power {
                2 => w.square() + c,
                _ => w.powi(power) + c,
            };
            acc.update(z);

            let norm_sq = z.norm_sq();
            if norm_sq > bailout_sq {
                return escape_result(p, n, z, track_der.then_some(der), power as f64, &acc);
            }
        }

        interior_result(p, z, &acc)
    }

    /// Arbitrary-precision kernel over [`BigComplex`].
    pub fn iterate_arbitrary(&self, point: &BigComplex) -> IterationResult {
        let p = &self.params;
        let precision = p.precision;
        let (mut z, c) = if p.julia_mode {
            (
                point.clone(),
                BigComplex::from_complex(p.julia_c, precision),
            )
        } else {
            (BigComplex::zero(precision), point.clone())
        };

        let bailout_sq = BigDecimal::from_f64(p.bailout_sq(), precision);
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..p.max_iterations {
            let w = z.conj();
            z = match p.power {
                2 => &w.square() + &c,
                power => &w.powi(power as u32) + &c,
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

    fn tricorn(max_iterations: u32) -> Tricorn {
        Tricorn::new(FractalParams {
            max_iterations,
            ..FractalParams::default()
        })
        .unwrap()
    }

    #[test]
    fn origin_is_interior() {
        let r = tricorn(200).iterate(Complex::ZERO);
        assert!(!r.escaped);
    }

    #[test]
    fn far_point_escapes_immediately() {
        let r = tricorn(100).iterate(Complex::new(4.0, 0.0));
        assert!(r.escaped);
        assert_eq!(r.iterations, 0);
    }

    #[test]
    fn real_axis_matches_mandelbrot() {
        // On the real axis conj(z) = z for real orbits, so the tricorn and
        // the Mandelbrot set coincide there.
        use crate::kernels::mandelbrot::Mandelbrot;
        let t = tricorn(256);
        let m = Mandelbrot::default();
        for &x in &[-1.5, -1.0, -0.5, 0.25, 0.5, 1.0] {
            let c = Complex::new(x, 0.0);
            assert_eq!(t.iterate(c).class(), m.iterate(c).class(), "at c = {x}");
        }
    }

    #[test]
    fn symmetric_across_real_axis() {
        // conj(step(z, c)) = step(conj(z), conj(c)): counts agree exactly
        // at c and conj(c).
        let t = tricorn(400);
        for &c in &[
            Complex::new(0.25, 0.6),
            Complex::new(-0.8, 0.3),
            Complex::new(0.1, -0.9),
        ] {
            let a = t.iterate(c);
            let b = t.iterate(c.conj());
            assert_eq!(a.class(), b.class(), "asymmetry at c = {c}");
        }
    }

    #[test]
    fn multicorn_power_three() {
        let t = Tricorn::new(FractalParams {
            power: 3,
            ..FractalParams::default()
        })
        .unwrap();
        let r = t.iterate(Complex::new(1.0, 0.0));
        assert!(r.escaped);
    }

    #[test]
    fn arbitrary_matches_double_counts() {
        let t = tricorn(300);
        for &c in &[
            Complex::new(0.25, 0.0),
            Complex::new(-1.0, 0.2),
            Complex::new(0.4, 0.4),
        ] {
            let double = t.iterate(c);
            let arbitrary = t.iterate_arbitrary(&BigComplex::from_complex(c, 50));
            assert_eq!(double.class(), arbitrary.class(), "mismatch at c = {c}");
        }
    }
}
