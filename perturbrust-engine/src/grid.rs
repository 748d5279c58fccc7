use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use perturbrust_core::{IterationResult, Viewport};

use crate::series::SeriesStats;
use crate::{ComputeOptions, Engine};

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// Tracks the current evaluation generation for cancellation and progress.
///
/// Incrementing the generation signals all in-flight rows to stop early.
/// The progress counters let a driver display a progress bar. Cancellation
/// granularity is one row: a pixel always runs to completion.
#[derive(Debug, Default)]
pub struct GridCancel {
    generation: AtomicU64,
    progress_done: AtomicUsize,
    progress_total: AtomicUsize,
}

impl GridCancel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the current evaluation by advancing the generation.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn reset_progress(&self, total: usize) {
        self.progress_total.store(total, Ordering::Relaxed);
        self.progress_done.store(0, Ordering::Relaxed);
    }

    fn inc_progress(&self) {
        self.progress_done.fetch_add(1, Ordering::Relaxed);
    }

    /// Current progress as `(done, total)` rows.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.progress_done.load(Ordering::Relaxed),
            self.progress_total.load(Ordering::Relaxed),
        )
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-worker counters, aggregated without locks and merged on pass end.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStats {
    pub pixels: u64,
    pub escaped: u64,
    pub glitched: u64,
    pub series: SeriesStats,
}

impl GridStats {
    pub fn record(&mut self, result: &IterationResult) {
        self.pixels += 1;
        if result.escaped {
            self.escaped += 1;
        }
        if result.glitched {
            self.glitched += 1;
        }
    }

    pub fn merge(&mut self, other: &GridStats) {
        self.pixels += other.pixels;
        self.escaped += other.escaped;
        self.glitched += other.glitched;
        self.series.merge(&other.series);
    }
}

// ---------------------------------------------------------------------------
// Grid evaluation
// ---------------------------------------------------------------------------

/// The result of evaluating a full pixel grid.
#[derive(Debug, Clone)]
pub struct GridResult {
    pub width: u32,
    pub height: u32,
    /// Row-major iteration data; empty rows were cancelled.
    pub data: Vec<IterationResult>,
    pub stats: GridStats,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Evaluate every pixel of a viewport, one worker per row batch.
///
/// Pixels are independent; the reference orbit and series coefficients
/// inside `engine` are shared read-only. Cancellation is checked between
/// rows against the generation captured at entry.
pub fn compute_grid(engine: &Engine, viewport: &Viewport, cancel: &GridCancel) -> GridResult {
    compute_grid_at(engine, viewport, cancel, cancel.generation())
}

/// Like [`compute_grid`] but pinned to a caller-captured generation, so a
/// driver can hand the same generation to several passes and cancel them
/// all with one `cancel()`.
pub fn compute_grid_at(
    engine: &Engine,
    viewport: &Viewport,
    cancel: &GridCancel,
    generation: u64,
) -> GridResult {
    let started = Instant::now();
    let width = viewport.width;
    let height = viewport.height;
    cancel.reset_progress(height as usize);

    let perturbed = engine.perturbation_ready();
    debug!(width, height, perturbed, "grid evaluation started");

    let rows: Vec<(Vec<IterationResult>, GridStats, bool)> = (0..height)
        .into_par_iter()
        .map(|py| {
            if cancel.generation() != generation {
                return (Vec::new(), GridStats::default(), true);
            }
            let mut row = Vec::with_capacity(width as usize);
            let mut stats = GridStats::default();
            let options = ComputeOptions::default();
            for px in 0..width {
                let point = if perturbed {
                    viewport.pixel_to_delta(px, py)
                } else {
                    viewport.pixel_to_complex(px, py)
                };
                let result = engine.compute_with_stats(point, &options, &mut stats.series);
                stats.record(&result);
                row.push(result);
            }
            cancel.inc_progress();
            (row, stats, false)
        })
        .collect();

    let mut data = Vec::with_capacity(width as usize * height as usize);
    let mut stats = GridStats::default();
    let mut cancelled = false;
    for (row, row_stats, row_cancelled) in rows {
        cancelled |= row_cancelled;
        stats.merge(&row_stats);
        data.extend(row);
    }

    let elapsed = started.elapsed();
    info!(
        pixels = stats.pixels,
        escaped = stats.escaped,
        glitched = stats.glitched,
        average_skip = stats.series.average_skip(),
        cancelled,
        elapsed_ms = elapsed.as_millis() as u64,
        "grid evaluation finished"
    );

    GridResult {
        width,
        height,
        data,
        stats,
        cancelled,
        elapsed,
    }
}
