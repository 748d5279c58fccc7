use crate::complex::Complex;
use crate::params::{FractalParams, OrbitTrap};
use crate::result::IterationResult;

/// Per-orbit accumulation shared by every escape-time kernel: orbit-trap
/// minimum distance and the stripe-average signal.
///
/// Constructed once per sample, updated once per iterate. When neither
/// channel is requested the update compiles down to nothing, so the plain
/// loops pay for what they use.
pub struct OrbitAccumulator {
    trap: Option<(OrbitTrap, f64)>,
    stripe_density: f64,
    stripe_sum: f64,
    stripe_samples: u32,
    stripe_on: bool,
}

impl OrbitAccumulator {
    pub fn new(params: &FractalParams) -> Self {
        Self {
            trap: params.orbit_trap.map(|t| (t, f64::INFINITY)),
            stripe_density: params.stripe_density,
            stripe_sum: 0.0,
            stripe_samples: 0,
            stripe_on: params.stripe_average,
        }
    }

    /// True when some channel needs every iterate, which disables the
    /// cycle-detection early exit.
    #[inline]
    pub fn needs_full_orbit(&self) -> bool {
        self.trap.is_some() || self.stripe_on
    }

    #[inline]
    pub fn update(&mut self, z: Complex) {
        if let Some((trap, min)) = &mut self.trap {
            let d = trap.distance(z);
            if d < *min {
                *min = d;
            }
        }
        if self.stripe_on {
            self.stripe_sum += 0.5 * (self.stripe_density * z.arg()).sin() + 0.5;
            self.stripe_samples += 1;
        }
    }

    /// Write the accumulated channels into a result.
    pub fn apply(&self, result: &mut IterationResult) {
        if let Some((_, min)) = &self.trap {
            if min.is_finite() {
                result.orbit_trap = Some(*min);
            }
        }
        if self.stripe_on && self.stripe_samples > 0 {
            result.stripe = Some(self.stripe_sum / self.stripe_samples as f64);
        }
    }
}

/// Continuous iteration count at escape:
/// `n + 1 − ln(ln|z| / ln bailout) / ln power`.
///
/// Falls back to the integer count when the inputs put a logarithm out of
/// domain (tiny bailouts, |z| barely past the radius).
pub fn smooth_escape_count(n: u32, norm_sq: f64, bailout: f64, power: f64) -> f64 {
    let log_z = 0.5 * norm_sq.ln(); // ln|z|
    let log_bailout = bailout.ln();
    if log_z <= 0.0 || log_bailout <= 0.0 || power <= 1.0 {
        return n as f64;
    }
    let nu = n as f64 + 1.0 - (log_z / log_bailout).ln() / power.ln();
    if nu.is_finite() {
        nu
    } else {
        n as f64
    }
}

/// Exterior distance estimate from the final iterate and its derivative:
/// `|z|·ln|z| / |z′|`.
pub fn distance_estimate(z: Complex, derivative: Complex) -> Option<f64> {
    let z_norm = z.norm();
    let der_norm = derivative.norm();
    if der_norm == 0.0 || !der_norm.is_finite() {
        return None;
    }
    let d = z_norm * z_norm.ln() / der_norm;
    d.is_finite().then_some(d)
}

/// Assemble the result for an escaped escape-time sample.
pub fn escape_result(
    params: &FractalParams,
    n: u32,
    z: Complex,
    derivative: Option<Complex>,
    power: f64,
    acc: &OrbitAccumulator,
) -> IterationResult {
    let mut result = IterationResult::escaped(n, z);
    if params.smooth_coloring {
        result.smooth = smooth_escape_count(n, result.final_norm_sq, params.bailout, power);
    }
    result.angle = Some(z.arg());
    if let Some(der) = derivative {
        result.derivative = Some(der.norm());
        if params.distance_estimate {
            result.distance = distance_estimate(z, der);
        }
    }
    acc.apply(&mut result);
    result
}

/// Assemble the result for a sample that ran to `max_iterations` (or was
/// detected as periodic) without escaping.
pub fn interior_result(
    params: &FractalParams,
    z: Complex,
    acc: &OrbitAccumulator,
) -> IterationResult {
    let mut result = IterationResult::interior(params.max_iterations, z);
    acc.apply(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::OrbitTrapKind;

    #[test]
    fn smooth_count_is_near_integer_count() {
        // For a typical escape the fractional part stays within one unit.
        let nu = smooth_escape_count(10, 25.0, 2.0, 2.0);
        assert!((nu - 10.0).abs() < 2.0);
    }

    #[test]
    fn smooth_count_degrades_gracefully() {
        assert_eq!(smooth_escape_count(5, 0.0, 2.0, 2.0), 5.0);
        assert_eq!(smooth_escape_count(5, 25.0, 1.0, 2.0), 5.0);
    }

    #[test]
    fn accumulator_tracks_trap_minimum() {
        let params = FractalParams {
            orbit_trap: Some(OrbitTrap {
                kind: OrbitTrapKind::Point,
                center: Complex::ZERO,
                size: 0.0,
            }),
            ..FractalParams::default()
        };
        let mut acc = OrbitAccumulator::new(&params);
        acc.update(Complex::new(3.0, 4.0));
        acc.update(Complex::new(0.0, 1.0));
        acc.update(Complex::new(2.0, 0.0));
        let mut result = IterationResult::default();
        acc.apply(&mut result);
        assert_eq!(result.orbit_trap, Some(1.0));
    }

    #[test]
    fn stripe_average_is_bounded() {
        let params = FractalParams {
            stripe_average: true,
            ..FractalParams::default()
        };
        let mut acc = OrbitAccumulator::new(&params);
        for i in 1..50 {
            acc.update(Complex::new(i as f64 * 0.3, (i % 7) as f64 - 3.0));
        }
        let mut result = IterationResult::default();
        acc.apply(&mut result);
        let stripe = result.stripe.unwrap();
        assert!((0.0..=1.0).contains(&stripe));
    }

    #[test]
    fn distance_estimate_rejects_zero_derivative() {
        assert_eq!(distance_estimate(Complex::new(4.0, 0.0), Complex::ZERO), None);
        assert!(distance_estimate(Complex::new(4.0, 0.0), Complex::ONE).is_some());
    }
}
