use serde::{Deserialize, Serialize};

use crate::complex::Complex;

/// The result of iterating a single sample point.
///
/// The mandatory channels are the integer count, the smooth count, the
/// escape flag, and the final iterate; everything else is filled only when
/// the corresponding option in `FractalParams` asked for it. Downstream
/// colorers pick the channels they need.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IterationResult {
    /// Escape iteration, or `max_iterations` if the orbit never escaped.
    pub iterations: u32,

    /// Continuous iteration count for banding-free coloring. Equals
    /// `iterations` exactly when the orbit did not escape or smoothing is
    /// off.
    pub smooth: f64,

    pub escaped: bool,

    /// The final iterate `z`.
    pub final_z: Complex,

    /// `|z|²` at the final iterate.
    pub final_norm_sq: f64,

    /// Exterior distance estimate, when requested and defined.
    pub distance: Option<f64>,

    /// Minimum trap distance over the orbit, when a trap is configured.
    pub orbit_trap: Option<f64>,

    /// `|z′|` at the final iterate, when the derivative was tracked.
    pub derivative: Option<f64>,

    /// Mean stripe signal over the orbit, when requested.
    pub stripe: Option<f64>,

    /// Argument of the final iterate, when any angular channel was
    /// requested.
    pub angle: Option<f64>,

    /// Index of the converged (or nearest) root, Newton family only.
    pub root_index: Option<usize>,

    /// The sample went through the reference-orbit delta path.
    pub perturbation_used: bool,

    /// Iterations skipped analytically by series approximation.
    pub skipped_iterations: u32,

    /// The perturbation approximation broke down for this sample and a
    /// fallback path produced the result.
    pub glitched: bool,
}

impl IterationResult {
    /// A non-escaping sample after `max_iterations` steps.
    pub fn interior(max_iterations: u32, final_z: Complex) -> Self {
        Self {
            iterations: max_iterations,
            smooth: max_iterations as f64,
            escaped: false,
            final_z,
            final_norm_sq: final_z.norm_sq(),
            ..Self::default()
        }
    }

    /// An escaping sample; `smooth` starts as the integer count and is
    /// refined by the kernel when smoothing is on.
    pub fn escaped(iterations: u32, final_z: Complex) -> Self {
        Self {
            iterations,
            smooth: iterations as f64,
            escaped: true,
            final_z,
            final_norm_sq: final_z.norm_sq(),
            ..Self::default()
        }
    }

    /// The well-formed result for a sample whose computation met a numeric
    /// pathology: zero iterations, not escaped, flagged glitched.
    pub fn degenerate() -> Self {
        Self {
            glitched: true,
            ..Self::default()
        }
    }

    /// Integer classification for comparing neighbouring pixels: the escape
    /// count, or a sentinel for non-escaping points.
    #[inline]
    pub fn class(&self) -> u64 {
        if self.escaped {
            self.iterations as u64
        } else {
            u64::MAX
        }
    }
}

impl Default for IterationResult {
    fn default() -> Self {
        Self {
            iterations: 0,
            smooth: 0.0,
            escaped: false,
            final_z: Complex::ZERO,
            final_norm_sq: 0.0,
            distance: None,
            orbit_trap: None,
            derivative: None,
            stripe: None,
            angle: None,
            root_index: None,
            perturbation_used: false,
            skipped_iterations: 0,
            glitched: false,
        }
    }
}
