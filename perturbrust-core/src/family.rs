use serde::{Deserialize, Serialize};

use crate::bigcomplex::BigComplex;
use crate::complex::Complex;
use crate::error::CoreError;
use crate::kernels::{
    BurningShip, BurningShipVariant, Custom, Julia, Mandelbrot, Newton, NewtonPolynomial, Phoenix,
    Tricorn,
};
use crate::params::{FractalParams, PrecisionMode};
use crate::result::IterationResult;

/// Identifier for a fractal family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyId {
    Mandelbrot,
    Julia,
    BurningShip,
    Tricorn,
    Newton,
    Phoenix,
    Custom,
}

impl FamilyId {
    pub fn parse(id: &str) -> Result<Self, CoreError> {
        Ok(match id {
            "mandelbrot" => Self::Mandelbrot,
            "julia" => Self::Julia,
            "burning-ship" => Self::BurningShip,
            "tricorn" => Self::Tricorn,
            "newton" => Self::Newton,
            "phoenix" => Self::Phoenix,
            "custom" => Self::Custom,
            other => return Err(CoreError::UnknownFamily(other.to_string())),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mandelbrot => "mandelbrot",
            Self::Julia => "julia",
            Self::BurningShip => "burning-ship",
            Self::Tricorn => "tricorn",
            Self::Newton => "newton",
            Self::Phoenix => "phoenix",
            Self::Custom => "custom",
        }
    }
}

/// What the engine may ask of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Reference-orbit + delta iteration is available.
    pub supports_perturbation: bool,
    /// Taylor-series iteration skipping is available (implies perturbation).
    pub supports_series_approximation: bool,
    /// A BigComplex iteration path exists.
    pub supports_arbitrary_precision: bool,
    /// A closed-form interior test short-circuits the loop.
    pub has_interior: bool,
}

/// The type of an extra family parameter, for UI enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Real,
    Integer,
    Toggle,
    Choice(&'static [&'static str]),
}

/// Description of one extra parameter a family accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

/// Default view for a family: center coordinates as decimal strings (they
/// stay exact when handed to `initialize_perturbation`) and a zoom factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewDefaults {
    pub center_x: &'static str,
    pub center_y: &'static str,
    pub zoom: f64,
}

/// Static description of a family: display data, capabilities, and the
/// extra parameters it accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FamilyDescriptor {
    pub id: FamilyId,
    pub name: &'static str,
    pub formula: &'static str,
    pub default_view: ViewDefaults,
    pub capabilities: Capabilities,
    pub extra_params: &'static [ParamSpec],
}

const ORIGIN_VIEW: ViewDefaults = ViewDefaults {
    center_x: "0",
    center_y: "0",
    zoom: 1.0,
};

static DESCRIPTORS: [FamilyDescriptor; 7] = [
    FamilyDescriptor {
        id: FamilyId::Mandelbrot,
        name: "Mandelbrot",
        formula: "z² + c",
        default_view: ViewDefaults {
            center_x: "-0.75",
            center_y: "0",
            zoom: 1.0,
        },
        capabilities: Capabilities {
            supports_perturbation: true,
            supports_series_approximation: true,
            supports_arbitrary_precision: true,
            has_interior: true,
        },
        extra_params: &[ParamSpec {
            name: "power",
            kind: ParamKind::Integer,
            default: 2.0,
            min: 2.0,
            max: 8.0,
        }],
    },
    FamilyDescriptor {
        id: FamilyId::Julia,
        name: "Julia",
        formula: "z² + c  (c fixed)",
        default_view: ORIGIN_VIEW,
        capabilities: Capabilities {
            supports_perturbation: true,
            supports_series_approximation: false,
            supports_arbitrary_precision: true,
            has_interior: false,
        },
        extra_params: &[
            ParamSpec {
                name: "c_re",
                kind: ParamKind::Real,
                default: -0.7,
                min: -2.0,
                max: 2.0,
            },
            ParamSpec {
                name: "c_im",
                kind: ParamKind::Real,
                default: 0.27015,
                min: -2.0,
                max: 2.0,
            },
        ],
    },
    FamilyDescriptor {
        id: FamilyId::BurningShip,
        name: "Burning Ship",
        formula: "(|Re z| + i·|Im z|)² + c",
        default_view: ViewDefaults {
            center_x: "-0.5",
            center_y: "-0.5",
            zoom: 1.0,
        },
        capabilities: Capabilities {
            supports_perturbation: true,
            supports_series_approximation: false,
            supports_arbitrary_precision: true,
            has_interior: false,
        },
        extra_params: &[ParamSpec {
            name: "variant",
            kind: ParamKind::Choice(&[
                "standard",
                "partial-re",
                "partial-im",
                "buffalo",
                "celtic",
            ]),
            default: 0.0,
            min: 0.0,
            max: 4.0,
        }],
    },
    FamilyDescriptor {
        id: FamilyId::Tricorn,
        name: "Tricorn",
        formula: "conj(z)^p + c",
        default_view: ORIGIN_VIEW,
        capabilities: Capabilities {
            supports_perturbation: true,
            supports_series_approximation: false,
            supports_arbitrary_precision: true,
            has_interior: false,
        },
        extra_params: &[ParamSpec {
            name: "power",
            kind: ParamKind::Integer,
            default: 2.0,
            min: 2.0,
            max: 8.0,
        }],
    },
    FamilyDescriptor {
        id: FamilyId::Newton,
        name: "Newton",
        formula: "z − α·f(z)/f′(z)",
        default_view: ORIGIN_VIEW,
        capabilities: Capabilities {
            supports_perturbation: false,
            supports_series_approximation: false,
            supports_arbitrary_precision: false,
            has_interior: false,
        },
        extra_params: &[
            ParamSpec {
                name: "polynomial",
                kind: ParamKind::Choice(&[
                    "cubic",
                    "quartic",
                    "quintic",
                    "sextic",
                    "unity-roots",
                    "cubic-basin",
                    "quartic-z",
                ]),
                default: 0.0,
                min: 0.0,
                max: 6.0,
            },
            ParamSpec {
                name: "relaxation_re",
                kind: ParamKind::Real,
                default: 1.0,
                min: 0.1,
                max: 2.0,
            },
            ParamSpec {
                name: "relaxation_im",
                kind: ParamKind::Real,
                default: 0.0,
                min: -1.0,
                max: 1.0,
            },
            ParamSpec {
                name: "nova",
                kind: ParamKind::Toggle,
                default: 0.0,
                min: 0.0,
                max: 1.0,
            },
            ParamSpec {
                name: "tolerance",
                kind: ParamKind::Real,
                default: 1e-6,
                min: 1e-12,
                max: 1e-2,
            },
        ],
    },
    FamilyDescriptor {
        id: FamilyId::Phoenix,
        name: "Phoenix",
        formula: "z² + c + p·z₋₁",
        default_view: ORIGIN_VIEW,
        capabilities: Capabilities {
            supports_perturbation: true,
            supports_series_approximation: false,
            supports_arbitrary_precision: true,
            has_interior: false,
        },
        extra_params: &[
            ParamSpec {
                name: "p_re",
                kind: ParamKind::Real,
                default: -0.5,
                min: -2.0,
                max: 2.0,
            },
            ParamSpec {
                name: "p_im",
                kind: ParamKind::Real,
                default: 0.0,
                min: -2.0,
                max: 2.0,
            },
            ParamSpec {
                name: "ushiki",
                kind: ParamKind::Toggle,
                default: 0.0,
                min: 0.0,
                max: 1.0,
            },
        ],
    },
    FamilyDescriptor {
        id: FamilyId::Custom,
        name: "Custom formula",
        formula: "z^2 + c",
        default_view: ORIGIN_VIEW,
        capabilities: Capabilities {
            supports_perturbation: false,
            supports_series_approximation: false,
            supports_arbitrary_precision: false,
            has_interior: false,
        },
        extra_params: &[],
    },
];

/// All family descriptors, in presentation order.
pub fn all_families() -> &'static [FamilyDescriptor] {
    &DESCRIPTORS
}

/// Look up the descriptor for a family. The match mirrors the table order,
/// so exhaustiveness is checked by the compiler.
pub fn descriptor(id: FamilyId) -> &'static FamilyDescriptor {
    match id {
        FamilyId::Mandelbrot => &DESCRIPTORS[0],
        FamilyId::Julia => &DESCRIPTORS[1],
        FamilyId::BurningShip => &DESCRIPTORS[2],
        FamilyId::Tricorn => &DESCRIPTORS[3],
        FamilyId::Newton => &DESCRIPTORS[4],
        FamilyId::Phoenix => &DESCRIPTORS[5],
        FamilyId::Custom => &DESCRIPTORS[6],
    }
}

/// A configured fractal: the closed sum over the supported families.
///
/// The dispatcher keeps the per-pixel routine monomorphic per family — each
/// arm calls straight into that family's kernel with no virtual dispatch
/// inside the loop.
#[derive(Debug, Clone)]
pub enum Fractal {
    Mandelbrot(Mandelbrot),
    Julia(Julia),
    BurningShip(BurningShip),
    Tricorn(Tricorn),
    Newton(Newton),
    Phoenix(Phoenix),
    Custom(Custom),
}

impl Fractal {
    /// Construct a family by id with its default extras.
    pub fn from_id(id: FamilyId, params: FractalParams) -> crate::Result<Self> {
        Ok(match id {
            FamilyId::Mandelbrot => Self::Mandelbrot(Mandelbrot::new(params)?),
            FamilyId::Julia => Self::Julia(Julia::new(Julia::default_c(), params)?),
            FamilyId::BurningShip => {
                Self::BurningShip(BurningShip::new(params, BurningShipVariant::Standard)?)
            }
            FamilyId::Tricorn => Self::Tricorn(Tricorn::new(params)?),
            FamilyId::Newton => Self::Newton(Newton::new(
                params,
                NewtonPolynomial::Cubic,
                Complex::ONE,
                false,
                Newton::DEFAULT_TOLERANCE,
            )?),
            FamilyId::Phoenix => Self::Phoenix(Phoenix::new(params, Phoenix::default_p(), false)?),
            FamilyId::Custom => Self::Custom(Custom::new("z^2 + c", params)?),
        })
    }

    /// Construct a user-formula fractal.
    pub fn custom(formula: &str, params: FractalParams) -> crate::Result<Self> {
        Ok(Self::Custom(Custom::new(formula, params)?))
    }

    pub fn family_id(&self) -> FamilyId {
        match self {
            Self::Mandelbrot(_) => FamilyId::Mandelbrot,
            Self::Julia(_) => FamilyId::Julia,
            Self::BurningShip(_) => FamilyId::BurningShip,
            Self::Tricorn(_) => FamilyId::Tricorn,
            Self::Newton(_) => FamilyId::Newton,
            Self::Phoenix(_) => FamilyId::Phoenix,
            Self::Custom(_) => FamilyId::Custom,
        }
    }

    pub fn params(&self) -> &FractalParams {
        match self {
            Self::Mandelbrot(f) => f.params(),
            Self::Julia(f) => f.params(),
            Self::BurningShip(f) => f.params(),
            Self::Tricorn(f) => f.params(),
            Self::Newton(f) => f.params(),
            Self::Phoenix(f) => f.params(),
            Self::Custom(f) => f.params(),
        }
    }

    /// Capability flags, adjusted for the concrete configuration (e.g.
    /// only the standard Burning Ship fold supports perturbation).
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = descriptor(self.family_id()).capabilities;
        if let Self::BurningShip(f) = self {
            if f.variant() != BurningShipVariant::Standard {
                caps.supports_perturbation = false;
            }
        }
        caps
    }

    /// The double-precision kernel.
    pub fn iterate(&self, point: Complex) -> IterationResult {
        match self {
            Self::Mandelbrot(f) => f.iterate(point),
            Self::Julia(f) => f.iterate(point),
            Self::BurningShip(f) => f.iterate(point),
            Self::Tricorn(f) => f.iterate(point),
            Self::Newton(f) => f.iterate(point),
            Self::Phoenix(f) => f.iterate(point),
            Self::Custom(f) => f.iterate(point),
        }
    }

    /// The arbitrary-precision kernel; families without one degrade to the
    /// double kernel on the truncated point.
    pub fn iterate_arbitrary(&self, point: &BigComplex) -> IterationResult {
        match self {
            Self::Mandelbrot(f) => f.iterate_arbitrary(point),
            Self::Julia(f) => f.iterate_arbitrary(point),
            Self::BurningShip(f) => f.iterate_arbitrary(point),
            Self::Tricorn(f) => f.iterate_arbitrary(point),
            Self::Phoenix(f) => f.iterate_arbitrary(point),
            Self::Newton(f) => f.iterate(point.to_complex()),
            Self::Custom(f) => f.iterate(point.to_complex()),
        }
    }

    /// Route a sample through the configured precision mode. Never fails:
    /// unsupported modes degrade to the double kernel (the engine crate
    /// owns the perturbation path and calls the kernels directly).
    pub fn compute(&self, point: Complex) -> IterationResult {
        match self.params().precision_mode {
            PrecisionMode::Double | PrecisionMode::Perturbation => self.iterate(point),
            PrecisionMode::Arbitrary => {
                if self.capabilities().supports_arbitrary_precision {
                    let precision = self.params().precision;
                    self.iterate_arbitrary(&BigComplex::from_complex(point, precision))
                } else {
                    self.iterate(point)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_id_round_trip() {
        for d in all_families() {
            assert_eq!(FamilyId::parse(d.id.as_str()).unwrap(), d.id);
            // The descriptor match indexes the table by position; every id
            // must land on its own row.
            assert_eq!(descriptor(d.id).id, d.id);
        }
        assert!(FamilyId::parse("mandelbork").is_err());
    }

    #[test]
    fn every_family_constructs_with_defaults() {
        for d in all_families() {
            let f = Fractal::from_id(d.id, FractalParams::default()).unwrap();
            assert_eq!(f.family_id(), d.id);
            // A far point gives a well-formed result from every kernel.
            let r = f.compute(Complex::new(10.0, 10.0));
            assert!(r.iterations <= f.params().max_iterations);
        }
    }

    #[test]
    fn descriptors_are_consistent() {
        for d in all_families() {
            // Series approximation implies perturbation.
            if d.capabilities.supports_series_approximation {
                assert!(
                    d.capabilities.supports_perturbation,
                    "{}: series requires perturbation",
                    d.name
                );
            }
            // Default views parse as decimals.
            assert!(d.default_view.center_x.parse::<f64>().is_ok());
            assert!(d.default_view.center_y.parse::<f64>().is_ok());
            assert!(d.default_view.zoom > 0.0);
        }
    }

    #[test]
    fn non_standard_ship_variant_loses_perturbation() {
        let standard = Fractal::BurningShip(
            BurningShip::new(FractalParams::default(), BurningShipVariant::Standard).unwrap(),
        );
        let celtic = Fractal::BurningShip(
            BurningShip::new(FractalParams::default(), BurningShipVariant::Celtic).unwrap(),
        );
        assert!(standard.capabilities().supports_perturbation);
        assert!(!celtic.capabilities().supports_perturbation);
    }

    #[test]
    fn arbitrary_mode_routes_to_big_kernel() {
        let params = FractalParams {
            precision_mode: PrecisionMode::Arbitrary,
            max_iterations: 100,
            ..FractalParams::default()
        };
        let f = Fractal::from_id(FamilyId::Mandelbrot, params).unwrap();
        let double = f.iterate(Complex::new(0.3, 0.5));
        let routed = f.compute(Complex::new(0.3, 0.5));
        assert_eq!(double.class(), routed.class());
    }

    #[test]
    fn serde_family_id_names() {
        assert_eq!(
            serde_json::to_string(&FamilyId::BurningShip).unwrap(),
            "\"burning-ship\""
        );
    }
}
