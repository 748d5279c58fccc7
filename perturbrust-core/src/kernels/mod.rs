//! Per-family iteration kernels.
//!
//! Each family gets its own tight loop (double precision) and, where the
//! family supports it, an arbitrary-precision loop over `BigComplex`.
//! Shared per-orbit accumulation lives in `support`.

pub mod burning_ship;
pub mod custom;
pub mod julia;
pub mod mandelbrot;
pub mod newton;
pub mod phoenix;
pub mod tricorn;

pub mod support;

pub use burning_ship::{BurningShip, BurningShipVariant};
pub use custom::Custom;
pub use julia::Julia;
pub use mandelbrot::Mandelbrot;
pub use newton::{Newton, NewtonPolynomial};
pub use phoenix::Phoenix;
pub use tricorn::Tricorn;
