use std::time::Instant;

use tracing::{debug, info};

use perturbrust_core::{Complex, FamilyId};

use crate::error::EngineError;
use crate::reference::ReferenceOrbit;

/// Default bound on the series error proxy `|A_{n,K}|·|δc|^(K+1)`.
pub const DEFAULT_ERROR_TOLERANCE: f64 = 1e-6;

/// Default cap on the Taylor order.
pub const DEFAULT_MAX_ORDER: usize = 16;

/// Hard cap on the Taylor order.
pub const MAX_ORDER: usize = 64;

/// Default budget for coefficient computation, in coefficient updates
/// (the computation costs O(order²·length) of them).
pub const DEFAULT_COEFF_BUDGET: f64 = 5e7;

/// The delta stays valid only while `|δ| < κ·|Z|`.
const DELTA_RATIO: f64 = 0.1;

/// Result of probing the series at one iteration for one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validity {
    /// The series is accurate here; carries the evaluated δ.
    Valid(Complex),
    /// Accurate, and the full iterate `Z + δ` has already escaped.
    Escaped(Complex),
    /// The error bound or the delta-ratio bound failed.
    Invalid,
}

/// Outcome of the skip search for one pixel.
#[derive(Debug, Clone, Copy)]
pub struct Skip {
    /// The iteration to resume perturbation from.
    pub n: u32,
    /// δ at that iteration.
    pub delta: Complex,
    /// The evaluated iterate had already escaped inside the series range.
    pub escaped_during_series: bool,
}

/// Per-worker series statistics, merged when a pass ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesStats {
    pub pixels: u64,
    pub evaluations: u64,
    pub total_skipped: u64,
}

impl SeriesStats {
    pub fn average_skip(&self) -> f64 {
        if self.pixels == 0 {
            0.0
        } else {
            self.total_skipped as f64 / self.pixels as f64
        }
    }

    pub fn merge(&mut self, other: &SeriesStats) {
        self.pixels += other.pixels;
        self.evaluations += other.evaluations;
        self.total_skipped += other.total_skipped;
    }
}

/// Taylor coefficients `A[n][k]` of the delta as a polynomial in δc:
/// `δₙ ≈ Σ_{k=1..K} A[n][k]·δcᵏ`.
///
/// Rows follow the Mandelbrot recurrence
/// `A_{n+1,1} = 2·Zₙ·A_{n,1} + 1`,
/// `A_{n+1,k} = 2·Zₙ·A_{n,k} + Σ_{j<k} A_{n,j}·A_{n,k−j}`,
/// seeded with `A[0][k] = 0` (δ₀ ≡ 0). Scoped to one reference orbit and
/// shared read-only across workers.
#[derive(Debug, Clone)]
pub struct SeriesCoefficients {
    /// `a[n][k−1]` is `A_{n,k}`; one row per reference iterate.
    a: Vec<Vec<Complex>>,
    order: usize,
    error_tolerance: f64,
}

impl SeriesCoefficients {
    /// Build the coefficient table for a Mandelbrot-family reference.
    ///
    /// Only the quadratic Mandelbrot parameter plane qualifies: the
    /// recurrence needs `δ₀ ≡ 0`, a `+δc` term, and analyticity in δc.
    pub fn compute(orbit: &ReferenceOrbit, order: usize) -> Result<Self, EngineError> {
        if orbit.family() != FamilyId::Mandelbrot || orbit.julia() {
            return Err(EngineError::Unsupported {
                family: orbit.family(),
                capability: "series approximation",
            });
        }
        let order = order.clamp(1, MAX_ORDER);
        let started = Instant::now();
        let len = orbit.len();

        let mut a = Vec::with_capacity(len);
        let mut row = vec![Complex::ZERO; order];
        a.push(row.clone());

        for n in 0..len.saturating_sub(1) {
            let two_z = orbit.two_z[n];
            let prev = &a[n];
            // k = 1: linear term picks up the +1 from δc itself.
            row[0] = two_z * prev[0] + Complex::ONE;
            for k in 2..=order {
                // Convolution of lower-order terms: Σ_{j=1..k−1} A_j·A_{k−j}.
                let mut sum = Complex::ZERO;
                for j in 1..k {
                    sum += prev[j - 1] * prev[k - j - 1];
                }
                row[k - 1] = two_z * prev[k - 1] + sum;
            }
            a.push(row.clone());
        }

        info!(
            order,
            rows = a.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "series coefficients computed"
        );
        Ok(Self {
            a,
            order,
            error_tolerance: DEFAULT_ERROR_TOLERANCE,
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn len(&self) -> usize {
        self.a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    pub fn error_tolerance(&self) -> f64 {
        self.error_tolerance
    }

    pub fn set_error_tolerance(&mut self, tolerance: f64) {
        self.error_tolerance = tolerance;
    }

    /// Evaluate `δₙ` by Horner's rule in δc (innermost factor `A_{n,K}`).
    pub fn evaluate(&self, n: usize, delta_c: Complex) -> Complex {
        let row = &self.a[n];
        let mut acc = row[self.order - 1];
        for k in (0..self.order - 1).rev() {
            acc = acc * delta_c + row[k];
        }
        acc * delta_c
    }

    /// The three-part validity check for skipping to iteration `n`.
    pub fn probe(&self, orbit: &ReferenceOrbit, n: usize, delta_c: Complex) -> Validity {
        // 1. Error proxy: the next-order term must be negligible.
        let delta_c_norm = delta_c.norm();
        let head = self.a[n][self.order - 1].norm();
        if head * delta_c_norm.powi(self.order as i32 + 1) >= self.error_tolerance {
            return Validity::Invalid;
        }

        // 2. The delta must still be small against the reference.
        let delta = self.evaluate(n, delta_c);
        if delta.norm() >= DELTA_RATIO * orbit.z[n].norm() {
            return Validity::Invalid;
        }

        // 3. Not escaped yet — otherwise the skip point is past the escape.
        let z = orbit.z[n] + delta;
        if z.norm_sq() > orbit.bailout_sq() {
            return Validity::Escaped(delta);
        }
        Validity::Valid(delta)
    }

    /// Binary search for the largest iteration the series may skip to for
    /// this pixel.
    pub fn find_skip(
        &self,
        orbit: &ReferenceOrbit,
        delta_c: Complex,
        stats: &mut SeriesStats,
    ) -> Skip {
        stats.pixels += 1;
        let mut lo = 0usize;
        let mut hi = self.len().saturating_sub(1);

        // Validity is monotone enough in practice for a bisection: probe
        // the midpoint, keep the half where the series still holds.
        while lo < hi {
            let mid = (lo + hi + 1) / 2;
            stats.evaluations += 1;
            match self.probe(orbit, mid, delta_c) {
                Validity::Valid(_) | Validity::Escaped(_) => lo = mid,
                Validity::Invalid => hi = mid - 1,
            }
        }

        stats.evaluations += 1;
        match self.probe(orbit, lo, delta_c) {
            Validity::Valid(delta) => {
                stats.total_skipped += lo as u64;
                Skip {
                    n: lo as u32,
                    delta,
                    escaped_during_series: false,
                }
            }
            Validity::Escaped(delta) => Skip {
                n: lo as u32,
                delta,
                escaped_during_series: true,
            },
            Validity::Invalid => {
                debug!("series invalid even at n = 0 for delta_c = {delta_c}");
                Skip {
                    n: 0,
                    delta: if orbit.julia() { delta_c } else { Complex::ZERO },
                    escaped_during_series: false,
                }
            }
        }
    }
}

/// Choose a Taylor order for the current view.
///
/// Base order grows with zoom (`⌊2·log₁₀ zoom⌋`, clamped to `[8, max]`),
/// halves for wide views where large deltas erode convergence, and shrinks
/// until the O(order²·length) coefficient cost fits the budget.
pub fn adaptive_order(
    zoom: f64,
    view_extent: f64,
    reference_len: usize,
    max_order: usize,
    budget: f64,
) -> usize {
    let max_order = max_order.clamp(2, MAX_ORDER);
    let base = (2.0 * zoom.max(1.0).log10()).floor() as usize;
    let mut order = base.clamp(8, max_order);

    if view_extent > 0.01 {
        order = (order / 2).max(2);
    }

    let len = reference_len.max(1) as f64;
    while order > 2 && (order * order) as f64 * len > budget {
        order -= 1;
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perturbation::{iterate_perturbation, GLITCH_TOLERANCE};
    use perturbrust_core::{FamilyId, Fractal, FractalParams};

    fn mandelbrot_orbit(center_x: &str, center_y: &str, max_iterations: u32) -> (Fractal, ReferenceOrbit) {
        let f = Fractal::from_id(
            FamilyId::Mandelbrot,
            FractalParams {
                max_iterations,
                ..FractalParams::default()
            },
        )
        .unwrap();
        let orbit = crate::reference::compute_reference(&f, center_x, center_y, 60).unwrap();
        (f, orbit)
    }

    #[test]
    fn first_row_is_zero() {
        let (_, orbit) = mandelbrot_orbit("-0.5", "0", 100);
        let series = SeriesCoefficients::compute(&orbit, 8).unwrap();
        for k in 0..series.order() {
            assert_eq!(series.a[0][k], Complex::ZERO, "A[0][{}] must be 0", k + 1);
        }
        // A[1][1] = 2·Z₀·0 + 1 = 1: δ₁ = δc exactly.
        assert_eq!(series.a[1][0], Complex::ONE);
        assert_eq!(series.evaluate(1, Complex::new(1e-4, 0.0)), Complex::new(1e-4, 0.0));
    }

    #[test]
    fn series_matches_direct_delta_recurrence() {
        // Propagate δ directly and compare against the series evaluation
        // while the validity conditions hold.
        let (_, orbit) = mandelbrot_orbit("-0.5", "0.1", 200);
        let series = SeriesCoefficients::compute(&orbit, 12).unwrap();
        let delta_c = Complex::new(2e-5, -1e-5);

        let mut delta = Complex::ZERO;
        for n in 0..60.min(orbit.len() - 1) {
            if let Validity::Valid(series_delta) = series.probe(&orbit, n, delta_c) {
                let err = (series_delta - delta).norm();
                assert!(
                    err < series.error_tolerance() * delta_c.norm().max(1e-300),
                    "n = {n}: series δ off by {err:e}"
                );
            }
            delta = orbit.two_z[n] * delta + delta.square() + delta_c;
        }
    }

    #[test]
    fn skip_search_returns_usable_start() {
        let (f, orbit) = mandelbrot_orbit("-0.5", "0.1", 400);
        let series = SeriesCoefficients::compute(&orbit, 12).unwrap();
        let mut stats = SeriesStats::default();
        let delta_c = Complex::new(1e-7, 1e-7);
        let skip = series.find_skip(&orbit, delta_c, &mut stats);

        assert!(!skip.escaped_during_series);
        assert!(skip.n > 0, "a tiny delta should skip a nonzero prefix");
        assert_eq!(stats.pixels, 1);
        assert!(stats.evaluations > 0);

        // Resuming perturbation from the skip agrees with the full run.
        let from_skip = iterate_perturbation(
            &f,
            &orbit,
            delta_c,
            Some(crate::perturbation::Start {
                n: skip.n,
                delta: skip.delta,
            }),
            GLITCH_TOLERANCE,
        );
        let from_zero = iterate_perturbation(&f, &orbit, delta_c, None, GLITCH_TOLERANCE);
        assert_eq!(from_skip.class(), from_zero.class());
    }

    #[test]
    fn larger_deltas_skip_less() {
        let (_, orbit) = mandelbrot_orbit("-0.5", "0.1", 400);
        let series = SeriesCoefficients::compute(&orbit, 12).unwrap();
        let mut stats = SeriesStats::default();
        let small = series.find_skip(&orbit, Complex::new(1e-9, 0.0), &mut stats);
        let large = series.find_skip(&orbit, Complex::new(1e-3, 0.0), &mut stats);
        assert!(small.n >= large.n);
    }

    #[test]
    fn julia_reference_is_rejected() {
        let f = Fractal::from_id(FamilyId::Julia, FractalParams::default()).unwrap();
        let orbit = crate::reference::compute_reference(&f, "0.1", "0.1", 60).unwrap();
        assert!(matches!(
            SeriesCoefficients::compute(&orbit, 8),
            Err(EngineError::Unsupported { .. })
        ));
    }

    #[test]
    fn stats_merge() {
        let mut a = SeriesStats {
            pixels: 10,
            evaluations: 100,
            total_skipped: 500,
        };
        let b = SeriesStats {
            pixels: 30,
            evaluations: 200,
            total_skipped: 1500,
        };
        a.merge(&b);
        assert_eq!(a.pixels, 40);
        assert_eq!(a.total_skipped, 2000);
        assert!((a.average_skip() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn adaptive_order_grows_with_zoom() {
        let shallow = adaptive_order(1e2, 1e-3, 10_000, 64, DEFAULT_COEFF_BUDGET);
        let deep = adaptive_order(1e20, 1e-18, 10_000, 64, DEFAULT_COEFF_BUDGET);
        assert!(deep >= shallow);
        assert_eq!(shallow, 8, "clamped to the floor at low zoom");
        assert_eq!(deep, 40);
    }

    #[test]
    fn adaptive_order_respects_budget_and_view() {
        // A huge reference forces the order down.
        let constrained = adaptive_order(1e20, 1e-18, 10_000_000, 64, DEFAULT_COEFF_BUDGET);
        assert!(constrained < 40);
        assert!(constrained >= 2);
        // A wide view halves the base order.
        let wide = adaptive_order(1e20, 1.0, 10_000, 64, DEFAULT_COEFF_BUDGET);
        assert_eq!(wide, 20);
    }
}
