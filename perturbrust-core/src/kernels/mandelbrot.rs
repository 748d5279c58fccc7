use crate::bigcomplex::BigComplex;
use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// The Mandelbrot set: `z_{n+1} = z_n^p + c`, starting from `z₀ = 0`
/// (multibrot for `p > 2`).
///
/// In Julia mode the roles swap: `c` is fixed and `z₀` sweeps the plane.
#[derive(Debug, Clone)]
pub struct Mandelbrot {
    params: FractalParams,
}

impl Mandelbrot {
    pub fn new(params: FractalParams) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }
}

impl Default for Mandelbrot {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
        }
    }
}

/// Returns `true` if `c` lies inside the main cardioid.
///
/// Closed-form check that avoids iterating a large share of visible points
/// at low zoom: with `q = (c_re − ¼)² + c_im²`, the cardioid is
/// `q·(q + (c_re − ¼)) ≤ ¼·c_im²`.
#[inline]
pub(crate) fn in_cardioid(re: f64, im: f64) -> bool {
    let im2 = im * im;
    let q = (re - 0.25) * (re - 0.25) + im2;
    q * (q + (re - 0.25)) <= 0.25 * im2
}

/// Returns `true` if `c` lies inside the period-2 bulb:
/// `(c_re + 1)² + c_im² ≤ 1/16`.
#[inline]
pub(crate) fn in_period2_bulb(re: f64, im: f64) -> bool {
    (re + 1.0) * (re + 1.0) + im * im <= 0.0625
}

impl Mandelbrot {
    /// Plain double-precision kernel.
    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let (z0, c) = if p.julia_mode {
            (point, p.julia_c)
        } else {
            (Complex::ZERO, point)
        };

        // Fast rejection: points known to be interior return without
        // entering the loop. Only valid for the classic parameter plane.
        if !p.julia_mode && p.power == 2 && (in_cardioid(c.re, c.im) || in_period2_bulb(c.re, c.im))
        {
            let acc = OrbitAccumulator::new(p);
            return interior_result(p, z0, &acc);
        }

        let bailout_sq = p.bailout_sq();
        let max_iter = p.max_iterations;
        let power = p.power;
        let track_der = p.distance_estimate;
        // d(z_{n+1})/dc = p·z^(p−1)·z′ + 1 in Mandelbrot mode;
        // d(z_{n+1})/dz₀ = p·z^(p−1)·z′ with seed 1 in Julia mode.
        let der_seed = if p.julia_mode { 0.0 } else { 1.0 };
        let mut der = if p.julia_mode {
            Complex::ONE
        } else {
            Complex::ZERO
        };

        let mut z = z0;
        let mut acc = OrbitAccumulator::new(p);
        let cycle_check = !acc.needs_full_orbit() && !track_der;

        // Brent's cycle detection state.
        let mut old_z = z;
        let mut period: u32 = 0;
        let mut check: u32 = 3;

        for n in 0..max_iter {
            if track_der {
                der = match power {
                    2 => z * der * 2.0 + Complex::new(der_seed, 0.0),
                    _ => z.powi(power - 1) * der * power as f64 + Complex::new(der_seed, 0.0),
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

            // Periodicity detection (Brent's algorithm). Skip the first 32
            // iterations and only check every 4th to reduce branch
            // overhead.
            if cycle_check && n >= 32 && n & 3 == 0 {
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

    /// Arbitrary-precision kernel: the same recurrence over [`BigComplex`],
    /// with the escape comparison done at full precision so truncation can
    /// never flip it.
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

        // Same f64 prefilter as the double kernel, so both paths classify
        // interior points identically.
        let c_f64 = c.to_complex();
        if !p.julia_mode
            && p.power == 2
            && (in_cardioid(c_f64.re, c_f64.im) || in_period2_bulb(c_f64.re, c_f64.im))
        {
            let acc = OrbitAccumulator::new(p);
            return interior_result(p, z.to_complex(), &acc);
        }

        let bailout_sq = BigDecimal::from_f64(p.bailout_sq(), precision);
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..p.max_iterations {
            z = match p.power {
                2 => &z.square() + &c,
                power => &z.powi(power as u32) + &c,
            };
            let z_f64 = z.to_complex();
            acc.update(z_f64);

            if z.escaped(&bailout_sq) {
                let mut result =
                    escape_result(p, n, z_f64, None, p.power as f64, &acc);
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

    fn mb() -> Mandelbrot {
        Mandelbrot::default()
    }

    fn with_max_iter(max_iterations: u32) -> Mandelbrot {
        Mandelbrot::new(FractalParams {
            max_iterations,
            ..FractalParams::default()
        })
        .unwrap()
    }

    #[test]
    fn origin_is_interior() {
        let r = with_max_iter(100).iterate(Complex::ZERO);
        assert!(!r.escaped);
        assert_eq!(r.iterations, 100);
    }

    #[test]
    fn far_point_escapes_immediately() {
        let r = mb().iterate(Complex::new(10.0, 0.0));
        assert!(r.escaped);
        assert_eq!(r.iterations, 0, "should escape on the very first iteration");
    }

    #[test]
    fn known_escape_count() {
        // c = 1.0: z₁=1 (|z|²=1), z₂=2 (|z|²=4, not > 4), z₃=5 → escapes at n=2.
        let r = mb().iterate(Complex::new(1.0, 0.0));
        assert!(r.escaped);
        assert_eq!(r.iterations, 2);
    }

    #[test]
    fn cardioid_point_skips_iteration() {
        // c = −0.5 is inside the main cardioid; the kernel must return
        // before running the loop, so final_z stays at z₀ = 0.
        let m = with_max_iter(1000);
        let r = m.iterate(Complex::new(-0.5, 0.0));
        assert!(!r.escaped);
        assert_eq!(r.iterations, 1000);
        assert_eq!(r.final_z, Complex::ZERO);
    }

    #[test]
    fn period2_bulb_is_interior() {
        let r = mb().iterate(Complex::new(-1.0, 0.0));
        assert!(!r.escaped);
    }

    #[test]
    fn smooth_count_brackets_integer_count() {
        let r = mb().iterate(Complex::new(0.3, 0.5));
        if r.escaped {
            assert!((r.smooth - r.iterations as f64).abs() <= 2.0);
        }
    }

    #[test]
    fn julia_mode_sweeps_z() {
        let params = FractalParams {
            julia_mode: true,
            julia_c: Complex::new(-0.123, 0.745),
            max_iterations: 500,
            ..FractalParams::default()
        };
        let m = Mandelbrot::new(params).unwrap();
        // The Douady rabbit: the origin is in the filled Julia set.
        let r = m.iterate(Complex::ZERO);
        assert!(!r.escaped);
        assert_eq!(r.iterations, 500);
    }

    #[test]
    fn distance_estimate_present_for_escaping_points() {
        let params = FractalParams {
            distance_estimate: true,
            ..FractalParams::default()
        };
        let m = Mandelbrot::new(params).unwrap();
        let r = m.iterate(Complex::new(0.5, 0.5));
        assert!(r.escaped);
        let d = r.distance.expect("escaping point should carry a distance");
        assert!(d > 0.0 && d < 2.0, "distance {d} should be small and positive");
    }

    #[test]
    fn arbitrary_matches_double_counts() {
        let m = with_max_iter(200);
        for &c in &[
            Complex::new(0.3, 0.5),
            Complex::new(-0.75, 0.1),
            Complex::new(0.5, 0.0),
            Complex::new(-2.0, 0.0),
            Complex::new(1.0, 1.0),
        ] {
            let double = m.iterate(c);
            let arbitrary = m.iterate_arbitrary(&BigComplex::from_complex(c, 50));
            assert_eq!(
                double.class(),
                arbitrary.class(),
                "iteration class mismatch at c = {c}"
            );
        }
    }

    #[test]
    fn multibrot_power_three() {
        let params = FractalParams {
            power: 3,
            ..FractalParams::default()
        };
        let m = Mandelbrot::new(params).unwrap();
        // z³+c at c=1: 0 → 1 → 2 (|z|²=4, not >4) → 9 escapes at n=2.
        let r = m.iterate(Complex::new(1.0, 0.0));
        assert!(r.escaped);
        assert_eq!(r.iterations, 2);
    }

    #[test]
    fn deterministic_results() {
        let m = mb();
        let points = [
            Complex::new(0.0, 0.0),
            Complex::new(-0.75, 0.1),
            Complex::new(0.3, 0.5),
            Complex::new(-2.0, 0.0),
            Complex::new(1.0, 1.0),
        ];
        let run1: Vec<_> = points.iter().map(|&c| m.iterate(c)).collect();
        let run2: Vec<_> = points.iter().map(|&c| m.iterate(c)).collect();
        assert_eq!(run1, run2, "iteration results must be deterministic");
    }
}
