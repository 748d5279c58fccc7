use std::ops::{Add, Mul, Sub};

use crate::bigdecimal::BigDecimal;
use crate::complex::Complex;
use crate::error::CoreError;

/// A complex number over [`BigDecimal`] components sharing one working
/// precision.
///
/// Mirrors [`Complex`] at arbitrary precision. Used by the reference-orbit
/// computation and the arbitrary-precision iteration paths, where `f64`
/// cannot distinguish adjacent pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigComplex {
    pub re: BigDecimal,
    pub im: BigDecimal,
}

impl BigComplex {
    pub fn new(re: BigDecimal, im: BigDecimal) -> Self {
        Self { re, im }
    }

    pub fn zero(precision: usize) -> Self {
        Self {
            re: BigDecimal::zero(precision),
            im: BigDecimal::zero(precision),
        }
    }

    pub fn from_complex(z: Complex, precision: usize) -> Self {
        Self {
            re: BigDecimal::from_f64(z.re, precision),
            im: BigDecimal::from_f64(z.im, precision),
        }
    }

    /// Parse a coordinate pair from high-precision decimal strings.
    pub fn parse(re: &str, im: &str, precision: usize) -> Result<Self, CoreError> {
        Ok(Self {
            re: BigDecimal::parse(re, precision)?,
            im: BigDecimal::parse(im, precision)?,
        })
    }

    /// Downcast to `f64` complex (truncates to ~17 digits per axis).
    pub fn to_complex(&self) -> Complex {
        Complex::new(self.re.to_f64(), self.im.to_f64())
    }

    pub fn precision(&self) -> usize {
        self.re.precision().max(self.im.precision())
    }

    /// `z²` with three decimal multiplies: `(a² − b²) + 2ab·i`.
    pub fn square(&self) -> Self {
        let a2 = &self.re * &self.re;
        let b2 = &self.im * &self.im;
        let ab = &self.re * &self.im;
        Self {
            re: &a2 - &b2,
            im: ab.double(),
        }
    }

    pub fn conj(&self) -> Self {
        Self {
            re: self.re.clone(),
            im: -self.im.clone(),
        }
    }

    /// `(|Re z|, |Im z|)` — the Burning Ship fold.
    pub fn abs_components(&self) -> Self {
        Self {
            re: self.re.abs(),
            im: self.im.abs(),
        }
    }

    /// `re² + im²` as a BigDecimal.
    pub fn norm_sq(&self) -> BigDecimal {
        let a2 = &self.re * &self.re;
        let b2 = &self.im * &self.im;
        &a2 + &b2
    }

    /// High-precision escape test: `|z|² > threshold`.
    pub fn escaped(&self, threshold: &BigDecimal) -> bool {
        self.norm_sq() > *threshold
    }

    /// Scale both components by a decimal factor.
    pub fn scale(&self, factor: &BigDecimal) -> Self {
        Self {
            re: &self.re * factor,
            im: &self.im * factor,
        }
    }

    /// `2·z`.
    pub fn double(&self) -> Self {
        Self {
            re: self.re.double(),
            im: self.im.double(),
        }
    }

    /// `z^n` by binary exponentiation (n ≥ 1).
    pub fn powi(&self, n: u32) -> Self {
        let mut acc: Option<Self> = None;
        let mut base = self.clone();
        let mut exp = n.max(1);
        loop {
            if exp & 1 == 1 {
                acc = Some(match acc {
                    Some(a) => &a * &base,
                    None => base.clone(),
                });
            }
            exp >>= 1;
            if exp == 0 {
                break;
            }
            base = base.square();
        }
        acc.unwrap()
    }
}

// -- Arithmetic operators (by reference, as for BigDecimal) --

impl Add for &BigComplex {
    type Output = BigComplex;

    fn add(self, rhs: Self) -> BigComplex {
        BigComplex {
            re: &self.re + &rhs.re,
            im: &self.im + &rhs.im,
        }
    }
}

impl Sub for &BigComplex {
    type Output = BigComplex;

    fn sub(self, rhs: Self) -> BigComplex {
        BigComplex {
            re: &self.re - &rhs.re,
            im: &self.im - &rhs.im,
        }
    }
}

impl Mul for &BigComplex {
    type Output = BigComplex;

    fn mul(self, rhs: Self) -> BigComplex {
        let ac = &self.re * &rhs.re;
        let bd = &self.im * &rhs.im;
        let ad = &self.re * &rhs.im;
        let bc = &self.im * &rhs.re;
        BigComplex {
            re: &ac - &bd,
            im: &ad + &bc,
        }
    }
}

impl std::fmt::Display for BigComplex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} + {}i", self.re, self.im)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bigdecimal::DEFAULT_PRECISION;

    fn bc(re: f64, im: f64) -> BigComplex {
        BigComplex::from_complex(Complex::new(re, im), DEFAULT_PRECISION)
    }

    #[test]
    fn square_matches_multiplication() {
        let z = bc(1.5, -2.25);
        assert_eq!(z.square(), &z * &z);
    }

    #[test]
    fn square_matches_f64_complex() {
        let z = bc(0.3, 0.7);
        let expected = Complex::new(0.3, 0.7).square();
        let got = z.square().to_complex();
        assert!((got.re - expected.re).abs() < 1e-15);
        assert!((got.im - expected.im).abs() < 1e-15);
    }

    #[test]
    fn norm_sq() {
        let z = bc(3.0, 4.0);
        assert_eq!(z.norm_sq(), BigDecimal::from_i64(25, DEFAULT_PRECISION));
    }

    #[test]
    fn escape_test() {
        let threshold = BigDecimal::from_i64(4, DEFAULT_PRECISION);
        assert!(bc(3.0, 0.0).escaped(&threshold));
        assert!(!bc(1.0, 1.0).escaped(&threshold));
        // Boundary: |z|² == threshold is not escaped.
        assert!(!bc(2.0, 0.0).escaped(&threshold));
    }

    #[test]
    fn conj_and_abs_components() {
        let z = bc(-1.5, -2.5);
        assert_eq!(z.conj(), bc(-1.5, 2.5));
        assert_eq!(z.abs_components(), bc(1.5, 2.5));
    }

    #[test]
    fn parse_deep_center() {
        let z = BigComplex::parse(
            "-1.768778833",
            "0.001738996",
            60,
        )
        .unwrap();
        let f = z.to_complex();
        assert!((f.re + 1.768778833).abs() < 1e-12);
        assert!((f.im - 0.001738996).abs() < 1e-12);
    }

    #[test]
    fn addition_preserves_tiny_offsets() {
        let center = BigComplex::parse("-0.75", "0.1", 60).unwrap();
        let offset = BigComplex::parse("1e-40", "-1e-41", 60).unwrap();
        let moved = &center + &offset;
        assert_ne!(moved, center);
        assert_eq!(&moved - &offset, center);
    }
}
