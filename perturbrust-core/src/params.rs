use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;

/// Which numeric path the dispatcher runs for a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecisionMode {
    /// Plain `f64` iteration. Correct up to zooms around 10¹³.
    Double,
    /// BigComplex iteration. Correct at any zoom, slow.
    Arbitrary,
    /// Reference orbit + per-pixel deltas. Requires engine-side setup.
    Perturbation,
}

/// Geometric shapes an orbit can be trapped against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrbitTrapKind {
    /// Distance to a single point.
    Point,
    /// Distance to the horizontal line through the center.
    Line,
    /// Distance to the nearer of the horizontal and vertical lines.
    Cross,
    /// Distance to the circle of radius `size`.
    Circle,
    /// Chebyshev distance to the square boundary of half-extent `size`.
    Square,
    /// Distance to the annulus `[size/2, size]` (zero inside the band).
    Ring,
}

/// An orbit-trap configuration: shape, anchor point, and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitTrap {
    pub kind: OrbitTrapKind,
    pub center: Complex,
    pub size: f64,
}

impl OrbitTrap {
    pub fn point(center: Complex) -> Self {
        Self {
            kind: OrbitTrapKind::Point,
            center,
            size: 0.0,
        }
    }

    pub fn circle(center: Complex, radius: f64) -> Self {
        Self {
            kind: OrbitTrapKind::Circle,
            center,
            size: radius,
        }
    }

    /// Distance from `z` to this trap.
    #[inline]
    pub fn distance(&self, z: Complex) -> f64 {
        let d = z - self.center;
        match self.kind {
            OrbitTrapKind::Point => d.norm(),
            OrbitTrapKind::Line => d.im.abs(),
            OrbitTrapKind::Cross => d.re.abs().min(d.im.abs()),
            OrbitTrapKind::Circle => (d.norm() - self.size).abs(),
            OrbitTrapKind::Square => (d.re.abs().max(d.im.abs()) - self.size).abs(),
            OrbitTrapKind::Ring => {
                let r = d.norm();
                let inner = self.size * 0.5;
                if r < inner {
                    inner - r
                } else if r > self.size {
                    r - self.size
                } else {
                    0.0
                }
            }
        }
    }
}

/// Parameters controlling fractal iteration.
///
/// Family-specific extras (Phoenix p, Burning Ship variant, Newton
/// polynomial, …) live on the family structs; this bundle carries everything
/// shared by the escape-time loops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalParams {
    /// Maximum number of iterations before declaring a point non-escaping.
    pub max_iterations: u32,

    /// Bailout radius — if `|z|` exceeds this, the orbit has escaped.
    /// Stored directly; the iteration loop compares against `bailout²`.
    pub bailout: f64,

    /// Exponent of the iteration (`z^power + c`); 2 for the classic sets.
    pub power: i32,

    /// Produce a fractional iteration count for banding-free coloring.
    pub smooth_coloring: bool,

    /// Track the orbit derivative and report an exterior distance estimate.
    pub distance_estimate: bool,

    /// Minimum-distance trap accumulated over the orbit, if any.
    pub orbit_trap: Option<OrbitTrap>,

    /// Accumulate the stripe-average coloring signal.
    pub stripe_average: bool,

    /// Angular frequency of the stripe signal.
    pub stripe_density: f64,

    /// Numeric path the dispatcher runs.
    pub precision_mode: PrecisionMode,

    /// Working precision in decimal digits for the arbitrary path.
    pub precision: usize,

    /// Fix `c` and sweep `z₀` across pixels instead of the reverse.
    pub julia_mode: bool,

    /// The fixed constant when `julia_mode` is set.
    pub julia_c: Complex,
}

impl FractalParams {
    pub const DEFAULT_MAX_ITERATIONS: u32 = 256;
    pub const DEFAULT_BAILOUT: f64 = 2.0;
    pub const DEFAULT_PRECISION: usize = 50;
    pub const DEFAULT_STRIPE_DENSITY: f64 = 4.0;

    pub fn new(max_iterations: u32, bailout: f64) -> crate::Result<Self> {
        let params = Self {
            max_iterations,
            bailout,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Check the invariants the iteration loops rely on.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(self.max_iterations));
        }
        if self.bailout <= 0.0 || !self.bailout.is_finite() {
            return Err(CoreError::InvalidBailout(self.bailout));
        }
        if self.power < 2 {
            return Err(CoreError::InvalidPower(self.power));
        }
        if self.precision < 1 {
            return Err(CoreError::InvalidPrecision(self.precision));
        }
        Ok(())
    }

    /// Pre-computed squared bailout for the inner loop.
    #[inline]
    pub fn bailout_sq(&self) -> f64 {
        self.bailout * self.bailout
    }

    /// True when a loop must visit every iterate (no cycle-detection early
    /// exit) because an accumulator needs the full orbit.
    #[inline]
    pub fn needs_full_orbit(&self) -> bool {
        self.orbit_trap.is_some() || self.stripe_average
    }
}

impl Default for FractalParams {
    fn default() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            bailout: Self::DEFAULT_BAILOUT,
            power: 2,
            smooth_coloring: true,
            distance_estimate: false,
            orbit_trap: None,
            stripe_average: false,
            stripe_density: Self::DEFAULT_STRIPE_DENSITY,
            precision_mode: PrecisionMode::Double,
            precision: Self::DEFAULT_PRECISION,
            julia_mode: false,
            julia_c: Complex::ZERO,
        }
    }
}
