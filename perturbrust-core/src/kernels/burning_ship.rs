use serde::{Deserialize, Serialize};

use crate::bigcomplex::BigComplex;
use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::kernels::support::{escape_result, interior_result, OrbitAccumulator};
use crate::params::FractalParams;
use crate::result::IterationResult;

/// Which components get folded through `abs` before squaring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BurningShipVariant {
    /// `z ← (|Re z| + i·|Im z|)² + c` — the classic ship.
    Standard,
    /// Fold the real component only.
    PartialRe,
    /// Fold the imaginary component only.
    PartialIm,
    /// The Buffalo: folded square with negated terms.
    Buffalo,
    /// The Celtic: fold applied to the real part of the square.
    Celtic,
}

/// The Burning Ship family: absolute values inside the quadratic recurrence
/// break analyticity and give the set its characteristic rigging.
#[derive(Debug, Clone)]
pub struct BurningShip {
    params: FractalParams,
    variant: BurningShipVariant,
}

impl BurningShip {
    pub fn new(params: FractalParams, variant: BurningShipVariant) -> crate::Result<Self> {
        params.validate()?;
        Ok(Self { params, variant })
    }

    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    pub fn variant(&self) -> BurningShipVariant {
        self.variant
    }
}

impl Default for BurningShip {
    fn default() -> Self {
        Self {
            params: FractalParams::default(),
            variant: BurningShipVariant::Standard,
        }
    }
}

/// One step of the variant decision table.
#[inline]
pub(crate) fn step(variant: BurningShipVariant, z: Complex, c: Complex) -> Complex {
    let (a, b) = (z.re, z.im);
    match variant {
        BurningShipVariant::Standard => Complex::new(
            a * a - b * b + c.re,
            2.0 * (a * b).abs() + c.im,
        ),
        BurningShipVariant::PartialRe => Complex::new(
            a * a - b * b + c.re,
            2.0 * a.abs() * b + c.im,
        ),
        BurningShipVariant::PartialIm => Complex::new(
            a * a - b * b + c.re,
            2.0 * a * b.abs() + c.im,
        ),
        BurningShipVariant::Buffalo => Complex::new(
            a * a - b * b - c.re,
            -2.0 * (a * b).abs() + c.im,
        ),
        BurningShipVariant::Celtic => Complex::new(
            (a * a - b * b).abs() + c.re,
            2.0 * a * b + c.im,
        ),
    }
}

impl BurningShip {
    pub fn iterate(&self, point: Complex) -> IterationResult {
        let p = &self.params;
        let (z0, c) = if p.julia_mode {
            (point, p.julia_c)
        } else {
            (Complex::ZERO, point)
        };

        let bailout_sq = p.bailout_sq();
        let max_iter = p.max_iterations;
        let variant = self.variant;

        // Pragmatic derivative for the standard ship: linearize with the
        // sign-masked multiplier, which is exact wherever no fold boundary
        // is crossed.
        let track_der = p.distance_estimate && variant == BurningShipVariant::Standard;
        let der_seed = if p.julia_mode { 0.0 } else { 1.0 };
        let mut der = if p.julia_mode {
            Complex::ONE
        } else {
            Complex::ZERO
        };

        let mut z = z0;
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..max_iter {
            if track_der {
                let masked = Complex::new(z.re.abs(), z.im.abs() * z.re.signum() * z.im.signum());
                der = masked * der * 2.0 + Complex::new(der_seed, 0.0);
            }

            z = step(variant, z, c);
            acc.update(z);

            let norm_sq = z.norm_sq();
            if norm_sq > bailout_sq {
                return escape_result(p, n, z, track_der.then_some(der), 2.0, &acc);
            }
        }

        interior_result(p, z, &acc)
    }

    /// Arbitrary-precision kernel: the same fold over [`BigComplex`].
    pub fn iterate_arbitrary(&self, point: &BigComplex) -> IterationResult {
        let p = &self.params;
        let precision = p.precision;
        let (mut z, c) = if p.julia_mode {
            (
                point.clone(),
                BigComplex::from_complex(p.julia_c, precision),
            )
        } else {
            (BigComplex::zero(precision), point.clone())
        };

        let bailout_sq = BigDecimal::from_f64(p.bailout_sq(), precision);
        let mut acc = OrbitAccumulator::new(p);

        for n in 0..p.max_iterations {
            z = step_arbitrary(self.variant, &z, &c);
            let z_f64 = z.to_complex();
            acc.update(z_f64);

            if z.escaped(&bailout_sq) {
                let mut result = escape_result(p, n, z_f64, None, 2.0, &acc);
                result.final_norm_sq = z.norm_sq().to_f64();
                return result;
            }
        }

        interior_result(p, z.to_complex(), &acc)
    }
}

fn step_arbitrary(variant: BurningShipVariant, z: &BigComplex, c: &BigComplex) -> BigComplex {
    let a2 = &z.re * &z.re;
    let b2 = &z.im * &z.im;
    let ab = &z.re * &z.im;
    match variant {
        BurningShipVariant::Standard => BigComplex::new(
            &(&a2 - &b2) + &c.re,
            &ab.abs().double() + &c.im,
        ),
        BurningShipVariant::PartialRe => BigComplex::new(
            &(&a2 - &b2) + &c.re,
            &(&z.re.abs() * &z.im).double() + &c.im,
        ),
        BurningShipVariant::PartialIm => BigComplex::new(
            &(&a2 - &b2) + &c.re,
            &(&z.re * &z.im.abs()).double() + &c.im,
        ),
        BurningShipVariant::Buffalo => BigComplex::new(
            &(&a2 - &b2) - &c.re,
            &-ab.abs().double() + &c.im,
        ),
        BurningShipVariant::Celtic => BigComplex::new(
            &(&a2 - &b2).abs() + &c.re,
            &ab.double() + &c.im,
        ),
    }
}
