use std::time::Instant;

use tracing::info;

use perturbrust_core::{BigComplex, BigDecimal, Complex, FamilyId, Fractal};

use crate::error::EngineError;

/// A high-precision reference orbit, computed once per view and shared
/// read-only by every pixel of that view.
///
/// Parallel tables indexed by iteration `n`:
/// `z[n]` (the `f64` truncation of `z_hp[n]`), `two_z[n]` (the multiplier of
/// the linear term in the family's delta recurrence), and `z_norm_sq[n]`.
/// For Burning Ship, `signs[n]` records the component signs of `Zₙ`, which
/// the delta iteration checks each step.
///
/// If the reference escaped before `max_iterations`, the last entry of each
/// table is the first escaped iterate; otherwise it is the last iterate
/// computed.
#[derive(Debug, Clone)]
pub struct ReferenceOrbit {
    family: FamilyId,
    /// The delta recurrence omits the `+δc` term (parameter fixed).
    julia: bool,
    center: BigComplex,
    c_f64: Complex,
    bailout_sq: f64,
    max_iterations: u32,

    pub z: Vec<Complex>,
    pub z_hp: Vec<BigComplex>,
    pub two_z: Vec<Complex>,
    pub z_norm_sq: Vec<f64>,
    /// Component signs (±1) of `Re Zₙ`, `Im Zₙ`; Burning Ship only.
    pub signs: Vec<(f64, f64)>,

    escaped: bool,
    escape_iteration: Option<u32>,
}

fn sign_of(x: f64) -> f64 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

impl ReferenceOrbit {
    /// Run the family's high-precision recurrence from its natural initial
    /// condition and populate the tables.
    ///
    /// The escape test runs at full precision so truncation can never
    /// retire the reference early.
    pub fn compute(fractal: &Fractal, center: &BigComplex) -> Result<Self, EngineError> {
        let family = fractal.family_id();
        if !fractal.capabilities().supports_perturbation {
            return Err(EngineError::Unsupported {
                family,
                capability: "perturbation",
            });
        }
        let params = *fractal.params();
        // The delta recurrences implemented are the quadratic ones.
        if params.power != 2
            && matches!(
                family,
                FamilyId::Mandelbrot | FamilyId::Julia | FamilyId::Tricorn
            )
        {
            return Err(EngineError::Unsupported {
                family,
                capability: "perturbation with power > 2",
            });
        }

        let started = Instant::now();
        let precision = center.precision();
        let max_iterations = params.max_iterations;
        let capacity = max_iterations as usize;
        let bailout_hp = BigDecimal::from_f64(params.bailout_sq(), precision);

        let mut orbit = Self {
            family,
            julia: params.julia_mode || matches!(family, FamilyId::Julia),
            center: center.clone(),
            c_f64: center.to_complex(),
            bailout_sq: params.bailout_sq(),
            max_iterations,
            z: Vec::with_capacity(capacity),
            z_hp: Vec::with_capacity(capacity),
            two_z: Vec::with_capacity(capacity),
            z_norm_sq: Vec::with_capacity(capacity),
            signs: Vec::new(),
            escaped: false,
            escape_iteration: None,
        };

        // Initial condition and fixed parameter per family.
        let (mut z, c) = Self::seed(fractal, center, precision);
        let mut prev = BigComplex::zero(precision); // Phoenix history
        if matches!(family, FamilyId::BurningShip) {
            orbit.signs = Vec::with_capacity(capacity);
        }

        for n in 0..max_iterations {
            orbit.push_step(family, &z);

            if z.escaped(&bailout_hp) {
                orbit.escaped = true;
                orbit.escape_iteration = Some(n);
                break;
            }

            let next = Self::step(fractal, &z, &prev, &c);
            prev = z;
            z = next;
        }

        info!(
            family = family.as_str(),
            length = orbit.len(),
            escaped = orbit.escaped,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reference orbit computed"
        );
        Ok(orbit)
    }

    /// Initial iterate and fixed parameter for the family.
    fn seed(fractal: &Fractal, center: &BigComplex, precision: usize) -> (BigComplex, BigComplex) {
        let params = fractal.params();
        match fractal {
            Fractal::Julia(j) => (
                center.clone(),
                BigComplex::from_complex(j.c(), precision),
            ),
            _ if params.julia_mode => (
                center.clone(),
                BigComplex::from_complex(params.julia_c, precision),
            ),
            _ => (BigComplex::zero(precision), center.clone()),
        }
    }

    /// One high-precision step of the family recurrence. Shared with the
    /// arbitrary-precision glitch fallback.
    pub(crate) fn step(
        fractal: &Fractal,
        z: &BigComplex,
        prev: &BigComplex,
        c: &BigComplex,
    ) -> BigComplex {
        match fractal {
            Fractal::Mandelbrot(_) | Fractal::Julia(_) => &z.square() + c,
            Fractal::Tricorn(_) => &z.conj().square() + c,
            Fractal::BurningShip(_) => {
                let folded = z.abs_components();
                &folded.square() + c
            }
            Fractal::Phoenix(ph) => {
                if ph.ushiki() {
                    let sq = z.square();
                    let history = prev.scale(&c.im);
                    BigComplex::new(&(&sq.re + &c.re) + &history.re, &sq.im + &history.im)
                } else {
                    let p = BigComplex::from_complex(ph.p(), c.precision());
                    &(&z.square() + c) + &(&p * prev)
                }
            }
            // Capability-gated in compute().
            Fractal::Newton(_) | Fractal::Custom(_) => unreachable!("no perturbation support"),
        }
    }

    /// Append the table entries for the current iterate.
    fn push_step(&mut self, family: FamilyId, z: &BigComplex) {
        let z_f64 = z.to_complex();
        self.z.push(z_f64);
        self.z_hp.push(z.clone());
        self.z_norm_sq.push(z_f64.norm_sq());
        match family {
            FamilyId::Tricorn => self.two_z.push(z_f64.conj() * 2.0),
            FamilyId::BurningShip => {
                self.two_z
                    .push(Complex::new(z_f64.re.abs() * 2.0, z_f64.im.abs() * 2.0));
                self.signs.push((sign_of(z_f64.re), sign_of(z_f64.im)));
            }
            _ => self.two_z.push(z_f64 * 2.0),
        }
    }

    pub fn family(&self) -> FamilyId {
        self.family
    }

    /// True when the delta recurrence has no `+δc` term.
    pub fn julia(&self) -> bool {
        self.julia
    }

    pub fn center(&self) -> &BigComplex {
        &self.center
    }

    /// The reference parameter truncated to `f64`, for fallback paths.
    pub fn c_f64(&self) -> Complex {
        self.c_f64
    }

    pub fn bailout_sq(&self) -> f64 {
        self.bailout_sq
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn len(&self) -> usize {
        self.z.len()
    }

    pub fn is_empty(&self) -> bool {
        self.z.is_empty()
    }

    pub fn escaped(&self) -> bool {
        self.escaped
    }

    pub fn escape_iteration(&self) -> Option<u32> {
        self.escape_iteration
    }
}

/// Convenience: build the orbit from a fractal and a centre given as
/// decimal strings.
pub fn compute_reference(
    fractal: &Fractal,
    center_x: &str,
    center_y: &str,
    precision: usize,
) -> Result<ReferenceOrbit, EngineError> {
    let center = BigComplex::parse(center_x, center_y, precision)?;
    ReferenceOrbit::compute(fractal, &center)
}
