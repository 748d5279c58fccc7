use serde::{Deserialize, Serialize};

use crate::complex::Complex;
use crate::error::CoreError;
use crate::family::FamilyDescriptor;

/// Complex-plane span of the shorter viewport axis at zoom 1.
///
/// Chosen so that every family's default set fits with margin: the
/// Mandelbrot set needs ~2.5 units of imaginary span, Julia sets live
/// inside `|z| < 2`.
pub const UNIT_ZOOM_SPAN: f64 = 4.4;

/// Defines the visible region of the complex plane.
///
/// At deep zooms the authoritative centre lives in the engine as a
/// BigComplex; this `f64` centre is its truncation. Pixel mapping is
/// delta-first: the offset from the centre is exact in `f64` at any depth,
/// and the absolute coordinate is derived from it for the shallow paths
/// that can afford the truncation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Centre of the viewport.
    pub center: Complex,

    /// Complex-plane units per pixel.
    pub scale: f64,

    /// Viewport width in pixels.
    pub width: u32,

    /// Viewport height in pixels.
    pub height: u32,
}

impl Viewport {
    pub fn new(center: Complex, scale: f64, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("dimensions must be > 0, got {width}×{height}"),
            });
        }
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("scale must be positive and finite, got {scale}"),
            });
        }
        Ok(Self {
            center,
            scale,
            width,
            height,
        })
    }

    /// A viewport at the given magnification: zoom 1 puts
    /// [`UNIT_ZOOM_SPAN`] complex units on the shorter pixel axis.
    pub fn with_zoom(center: Complex, zoom: f64, width: u32, height: u32) -> crate::Result<Self> {
        if zoom <= 0.0 || !zoom.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("zoom must be positive and finite, got {zoom}"),
            });
        }
        let minor_axis = width.min(height).max(1) as f64;
        Self::new(center, UNIT_ZOOM_SPAN / (zoom * minor_axis), width, height)
    }

    /// The family's default view, taken from its descriptor rather than
    /// hardcoded per call site.
    pub fn for_family(
        descriptor: &FamilyDescriptor,
        width: u32,
        height: u32,
    ) -> crate::Result<Self> {
        let view = &descriptor.default_view;
        let parse = |s: &str| {
            s.parse::<f64>().map_err(|_| CoreError::InvalidViewport {
                reason: format!("descriptor centre {s:?} is not a decimal"),
            })
        };
        let center = Complex::new(parse(view.center_x)?, parse(view.center_y)?);
        Self::with_zoom(center, view.zoom, width, height)
    }

    /// Map a pixel to its **delta** from the viewport centre.
    ///
    /// `(0, 0)` is the top-left pixel; pixel-y grows downward, so the
    /// imaginary offset is negated. This is the primary mapping: deltas
    /// feed the perturbation path directly and stay exact in `f64` even
    /// when absolute coordinates cannot.
    #[inline]
    pub fn pixel_to_delta(&self, px: u32, py: u32) -> Complex {
        self.subpixel_to_delta(px as f64, py as f64)
    }

    /// [`pixel_to_delta`](Self::pixel_to_delta) at fractional coordinates,
    /// for sub-pixel sampling.
    #[inline]
    pub fn subpixel_to_delta(&self, px: f64, py: f64) -> Complex {
        let dx = px - 0.5 * self.width as f64;
        let dy = 0.5 * self.height as f64 - py;
        Complex::new(dx, dy) * self.scale
    }

    /// Map a pixel to an absolute complex-plane point (centre plus delta).
    #[inline]
    pub fn pixel_to_complex(&self, px: u32, py: u32) -> Complex {
        self.center + self.pixel_to_delta(px, py)
    }

    /// [`pixel_to_complex`](Self::pixel_to_complex) at fractional
    /// coordinates.
    #[inline]
    pub fn subpixel_to_complex(&self, px: f64, py: f64) -> Complex {
        self.center + self.subpixel_to_delta(px, py)
    }

    /// The viewport extent in complex-plane units, `(re span, im span)`.
    pub fn complex_extent(&self) -> (f64, f64) {
        (
            self.width as f64 * self.scale,
            self.height as f64 * self.scale,
        )
    }

    /// Magnification relative to [`UNIT_ZOOM_SPAN`] on the shorter axis.
    /// The precision policy keys off this number.
    pub fn zoom(&self) -> f64 {
        UNIT_ZOOM_SPAN / (self.scale * self.width.min(self.height) as f64)
    }
}
