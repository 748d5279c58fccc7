//! Deep-zoom machinery for PerturbRust: reference orbits, perturbation,
//! series approximation, and the data-parallel grid driver.
//!
//! The per-view flow: pick a precision mode from the zoom
//! ([`precision::recommended_mode`]), [`Engine::initialize_perturbation`]
//! with the high-precision centre, [`Engine::compute_reference_orbit`],
//! optionally [`Engine::compute_series`], then evaluate pixels — one at a
//! time via [`Engine::compute`] or a whole viewport via
//! [`grid::compute_grid`].

pub mod error;
pub mod grid;
pub mod hybrid;
pub mod perturbation;
pub mod precision;
pub mod reference;
pub mod series;

pub use error::EngineError;
pub use grid::{compute_grid, compute_grid_at, GridCancel, GridResult, GridStats};
pub use hybrid::iterate_hybrid;
pub use perturbation::{
    iterate_perturbation, Start, GLITCH_TOLERANCE, GLITCH_TOLERANCE_HYBRID,
};
pub use precision::{recommended_mode, recommended_precision, should_use_perturbation};
pub use reference::{compute_reference, ReferenceOrbit};
pub use series::{adaptive_order, SeriesCoefficients, SeriesStats, Skip, Validity};

use std::sync::Arc;

use perturbrust_core::{BigComplex, Complex, Fractal, IterationResult, PrecisionMode};

/// Convenience result type for the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Per-pixel options for [`Engine::compute`].
#[derive(Debug, Clone, Copy)]
pub struct ComputeOptions {
    /// Allow the perturbation path when the engine has a reference ready.
    pub use_perturbation: bool,
    /// Explicit pixel delta from the reference centre; defaults to the
    /// `point` argument when the perturbation path runs.
    pub delta_c: Option<Complex>,
    /// Override the precision mode configured in the params.
    pub precision_mode: Option<PrecisionMode>,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self {
            use_perturbation: true,
            delta_c: None,
            precision_mode: None,
        }
    }
}

/// A per-view orchestrator owning the shared deep-zoom artifacts.
///
/// Setup methods return errors; the per-pixel [`compute`](Self::compute)
/// never does — missing prerequisites degrade to the plainest path that
/// can produce a well-formed result.
///
/// After `compute_reference_orbit`/`compute_series` return, the stored
/// artifacts are immutable and safe to share across workers.
pub struct Engine {
    fractal: Fractal,
    precision: usize,
    center: Option<BigComplex>,
    reference: Option<Arc<ReferenceOrbit>>,
    series: Option<Arc<SeriesCoefficients>>,
}

impl Engine {
    pub fn new(fractal: Fractal) -> Self {
        let precision = fractal.params().precision;
        Self {
            fractal,
            precision,
            center: None,
            reference: None,
            series: None,
        }
    }

    pub fn fractal(&self) -> &Fractal {
        &self.fractal
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn reference(&self) -> Option<&Arc<ReferenceOrbit>> {
        self.reference.as_ref()
    }

    pub fn series(&self) -> Option<&Arc<SeriesCoefficients>> {
        self.series.as_ref()
    }

    /// Record the view centre from high-precision decimal strings and the
    /// working precision. Invalidates any previous reference and series.
    pub fn initialize_perturbation(
        &mut self,
        center_x: &str,
        center_y: &str,
        precision: usize,
    ) -> Result<()> {
        if !self.fractal.capabilities().supports_perturbation {
            return Err(EngineError::Unsupported {
                family: self.fractal.family_id(),
                capability: "perturbation",
            });
        }
        if precision < 1 {
            return Err(perturbrust_core::CoreError::InvalidPrecision(precision).into());
        }
        self.center = Some(BigComplex::parse(center_x, center_y, precision)?);
        self.precision = precision;
        self.reference = None;
        self.series = None;
        Ok(())
    }

    /// Compute the shared reference orbit for the initialized centre.
    pub fn compute_reference_orbit(&mut self) -> Result<()> {
        let center = self.center.as_ref().ok_or(EngineError::NotInitialized)?;
        let orbit = ReferenceOrbit::compute(&self.fractal, center)?;
        self.reference = Some(Arc::new(orbit));
        self.series = None;
        Ok(())
    }

    /// Compute series coefficients of the given order against the current
    /// reference orbit.
    pub fn compute_series(&mut self, order: usize) -> Result<()> {
        let orbit = self.reference.as_ref().ok_or(EngineError::NotInitialized)?;
        if !self
            .fractal
            .capabilities()
            .supports_series_approximation
        {
            return Err(EngineError::Unsupported {
                family: self.fractal.family_id(),
                capability: "series approximation",
            });
        }
        let series = SeriesCoefficients::compute(orbit, order)?;
        self.series = Some(Arc::new(series));
        Ok(())
    }

    /// True when [`compute`](Self::compute) will interpret points as
    /// deltas from the reference centre.
    pub fn perturbation_ready(&self) -> bool {
        self.reference.is_some()
            && matches!(
                self.fractal.params().precision_mode,
                PrecisionMode::Perturbation
            )
    }

    /// Evaluate one sample. On the perturbation path `point` is the pixel's
    /// delta from the reference centre; otherwise it is the absolute
    /// complex-plane coordinate. Never fails.
    pub fn compute(&self, point: Complex, options: &ComputeOptions) -> IterationResult {
        let mut stats = SeriesStats::default();
        self.compute_with_stats(point, options, &mut stats)
    }

    /// [`compute`](Self::compute) with caller-owned series statistics, for
    /// per-worker aggregation.
    pub fn compute_with_stats(
        &self,
        point: Complex,
        options: &ComputeOptions,
        stats: &mut SeriesStats,
    ) -> IterationResult {
        let mode = options
            .precision_mode
            .unwrap_or(self.fractal.params().precision_mode);

        if mode == PrecisionMode::Perturbation && options.use_perturbation {
            if let Some(orbit) = &self.reference {
                let delta_c = options.delta_c.unwrap_or(point);
                if let Some(series) = &self.series {
                    return iterate_hybrid(&self.fractal, orbit, series, delta_c, stats);
                }
                return iterate_perturbation(
                    &self.fractal,
                    orbit,
                    delta_c,
                    None,
                    GLITCH_TOLERANCE,
                );
            }
        }

        // Degraded paths interpret the point in absolute coordinates; if
        // the caller handed a delta, re-anchor it on the known centre.
        let absolute = match (&self.center, mode) {
            (Some(center), PrecisionMode::Perturbation) => {
                center.to_complex() + options.delta_c.unwrap_or(point)
            }
            _ => point,
        };

        match mode {
            PrecisionMode::Arbitrary
                if self.fractal.capabilities().supports_arbitrary_precision =>
            {
                let point_big = match (&self.center, options.delta_c) {
                    // Exact pixel coordinate: centre + delta at precision.
                    (Some(center), Some(delta)) => {
                        &BigComplex::from_complex(delta, self.precision) + center
                    }
                    _ => BigComplex::from_complex(absolute, self.precision),
                };
                self.fractal.iterate_arbitrary(&point_big)
            }
            _ => self.fractal.iterate(absolute),
        }
    }
}
