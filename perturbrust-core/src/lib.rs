pub mod bigcomplex;
pub mod bigdecimal;
pub mod complex;
pub mod error;
pub mod family;
pub mod formula;
pub mod kernels;
pub mod params;
pub mod result;
pub mod viewport;

// Re-export primary types for convenience.
pub use bigcomplex::BigComplex;
pub use bigdecimal::BigDecimal;
pub use complex::Complex;
pub use error::CoreError;
pub use family::{
    all_families, descriptor, Capabilities, Fractal, FamilyDescriptor, FamilyId, ParamKind,
    ParamSpec, ViewDefaults,
};
pub use kernels::{
    BurningShip, BurningShipVariant, Custom, Julia, Mandelbrot, Newton, NewtonPolynomial, Phoenix,
    Tricorn,
};
pub use params::{FractalParams, OrbitTrap, OrbitTrapKind, PrecisionMode};
pub use result::IterationResult;
pub use viewport::Viewport;

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
