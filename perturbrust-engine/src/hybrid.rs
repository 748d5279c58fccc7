use perturbrust_core::kernels::support::smooth_escape_count;
use perturbrust_core::{Complex, Fractal, IterationResult};

use crate::perturbation::{iterate_perturbation, Start, GLITCH_TOLERANCE_HYBRID};
use crate::reference::ReferenceOrbit;
use crate::series::{SeriesCoefficients, SeriesStats};

/// Compose series approximation and perturbation for one pixel.
///
/// The series skips the analytic prefix of the orbit; perturbation carries
/// the pixel from there. Iterates inside the skipped prefix are never
/// visited, so orbit-trap and stripe channels only see the tail — the
/// price of skipping, accepted by every renderer that skips.
pub fn iterate_hybrid(
    fractal: &Fractal,
    orbit: &ReferenceOrbit,
    series: &SeriesCoefficients,
    delta_c: Complex,
    stats: &mut SeriesStats,
) -> IterationResult {
    let skip = series.find_skip(orbit, delta_c, stats);

    if skip.escaped_during_series {
        return escape_inside_series(fractal, orbit, series, delta_c, skip.n, stats);
    }

    let mut result = iterate_perturbation(
        fractal,
        orbit,
        delta_c,
        Some(Start {
            n: skip.n,
            delta: skip.delta,
        }),
        GLITCH_TOLERANCE_HYBRID,
    );
    result.skipped_iterations = skip.n;
    result
}

/// The evaluated iterate at the skip point had already escaped: bisect
/// inside `[0, skip]` for the first escaped iteration, re-evaluating the
/// series along the way.
fn escape_inside_series(
    fractal: &Fractal,
    orbit: &ReferenceOrbit,
    series: &SeriesCoefficients,
    delta_c: Complex,
    skip_n: u32,
    stats: &mut SeriesStats,
) -> IterationResult {
    let params = fractal.params();
    let bailout_sq = orbit.bailout_sq();

    let mut lo = 0usize;
    let mut hi = skip_n as usize;
    while lo < hi {
        let mid = (lo + hi) / 2;
        stats.evaluations += 1;
        let z = orbit.z[mid] + series.evaluate(mid, delta_c);
        if z.norm_sq() > bailout_sq {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    let delta = series.evaluate(lo, delta_c);
    let z = orbit.z[lo] + delta;
    // Same attribution as the plain loop: the iterate found at index `lo`
    // is z_lo, which the plain loop reports as iteration lo − 1.
    let n = (lo as u32).saturating_sub(1);
    let mut result = IterationResult::escaped(n, z);
    if params.smooth_coloring {
        result.smooth = smooth_escape_count(n, z.norm_sq(), params.bailout, 2.0);
    }
    result.angle = Some(z.arg());
    result.perturbation_used = true;
    result.skipped_iterations = skip_n;
    result
}
