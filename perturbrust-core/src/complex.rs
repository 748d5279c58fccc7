use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// A complex number represented as two `f64` components.
///
/// This is a lightweight, `Copy` type optimized for the tight iteration loop.
/// We roll our own instead of using `num::Complex` to keep the dependency graph
/// minimal and retain full control over the arithmetic.
///
/// The transcendental set (exp/log/trig/hyperbolic and their inverses) exists
/// for the formula evaluator; the iteration loops only touch the inlined
/// `square`/`mul` paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };
    pub const ONE: Self = Self { re: 1.0, im: 0.0 };
    pub const I: Self = Self { re: 0.0, im: 1.0 };

    #[inline]
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }

    /// Returns `re² + im²` without taking the square root.
    #[inline]
    pub fn norm_sq(self) -> f64 {
        self.re * self.re + self.im * self.im
    }

    /// Returns `√(re² + im²)`.
    #[inline]
    pub fn norm(self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// The principal argument, in `(−π, π]`.
    #[inline]
    pub fn arg(self) -> f64 {
        self.im.atan2(self.re)
    }

    #[inline]
    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    /// `z²` with three multiplies instead of four.
    #[inline]
    pub fn square(self) -> Self {
        Self {
            re: self.re * self.re - self.im * self.im,
            im: 2.0 * self.re * self.im,
        }
    }

    /// In-place `z ← z²` for the hot loops.
    #[inline]
    pub fn square_in_place(&mut self) {
        let re = self.re * self.re - self.im * self.im;
        self.im = 2.0 * self.re * self.im;
        self.re = re;
    }

    #[inline]
    pub fn cube(self) -> Self {
        self.square() * self
    }

    #[inline]
    pub fn recip(self) -> Self {
        let d = self.norm_sq();
        Self {
            re: self.re / d,
            im: -self.im / d,
        }
    }

    /// Integer power by binary exponentiation. `z⁰ = 1`; negative exponents
    /// go through the reciprocal.
    pub fn powi(self, n: i32) -> Self {
        if n < 0 {
            return self.powi(-n).recip();
        }
        let mut base = self;
        let mut exp = n as u32;
        let mut acc = Self::ONE;
        while exp > 0 {
            if exp & 1 == 1 {
                acc *= base;
            }
            base.square_in_place();
            exp >>= 1;
        }
        acc
    }

    /// Real power via polar form: `z^x = r^x·e^(ixθ)`.
    pub fn powf(self, x: f64) -> Self {
        if self.re == 0.0 && self.im == 0.0 {
            return if x == 0.0 { Self::ONE } else { Self::ZERO };
        }
        let r = self.norm().powf(x);
        let theta = self.arg() * x;
        Self::new(r * theta.cos(), r * theta.sin())
    }

    /// Complex power: `z^w = exp(w·log z)`.
    pub fn powc(self, w: Self) -> Self {
        if self.re == 0.0 && self.im == 0.0 {
            return if w.re == 0.0 && w.im == 0.0 {
                Self::ONE
            } else {
                Self::ZERO
            };
        }
        (w * self.ln()).exp()
    }

    pub fn exp(self) -> Self {
        let r = self.re.exp();
        Self::new(r * self.im.cos(), r * self.im.sin())
    }

    /// Principal natural logarithm.
    pub fn ln(self) -> Self {
        Self::new(self.norm().ln(), self.arg())
    }

    pub fn log10(self) -> Self {
        self.ln() * std::f64::consts::LOG10_E
    }

    pub fn log2(self) -> Self {
        self.ln() * std::f64::consts::LOG2_E
    }

    /// Principal square root.
    pub fn sqrt(self) -> Self {
        if self.re == 0.0 && self.im == 0.0 {
            return Self::ZERO;
        }
        let r = self.norm();
        let re = ((r + self.re) / 2.0).sqrt();
        let im = ((r - self.re) / 2.0).sqrt();
        Self::new(re, if self.im < 0.0 { -im } else { im })
    }

    /// Principal cube root via polar form.
    pub fn cbrt(self) -> Self {
        self.powf(1.0 / 3.0)
    }

    pub fn sin(self) -> Self {
        Self::new(
            self.re.sin() * self.im.cosh(),
            self.re.cos() * self.im.sinh(),
        )
    }

    pub fn cos(self) -> Self {
        Self::new(
            self.re.cos() * self.im.cosh(),
            -self.re.sin() * self.im.sinh(),
        )
    }

    pub fn tan(self) -> Self {
        self.sin() / self.cos()
    }

    pub fn sinh(self) -> Self {
        Self::new(
            self.re.sinh() * self.im.cos(),
            self.re.cosh() * self.im.sin(),
        )
    }

    pub fn cosh(self) -> Self {
        Self::new(
            self.re.cosh() * self.im.cos(),
            self.re.sinh() * self.im.sin(),
        )
    }

    pub fn tanh(self) -> Self {
        self.sinh() / self.cosh()
    }

    /// `asin z = −i·ln(iz + √(1 − z²))`.
    pub fn asin(self) -> Self {
        let iz = Self::I * self;
        let root = (Self::ONE - self.square()).sqrt();
        -(Self::I * (iz + root).ln())
    }

    /// `acos z = −i·ln(z + i·√(1 − z²))`.
    pub fn acos(self) -> Self {
        let root = (Self::ONE - self.square()).sqrt();
        -(Self::I * (self + Self::I * root).ln())
    }

    /// `atan z = (i/2)·(ln(1 − iz) − ln(1 + iz))`.
    pub fn atan(self) -> Self {
        let iz = Self::I * self;
        let half_i = Self::new(0.0, 0.5);
        half_i * ((Self::ONE - iz).ln() - (Self::ONE + iz).ln())
    }

    /// `asinh z = ln(z + √(z² + 1))`.
    pub fn asinh(self) -> Self {
        (self + (self.square() + Self::ONE).sqrt()).ln()
    }

    /// `acosh z = ln(z + √(z² − 1))`.
    pub fn acosh(self) -> Self {
        (self + (self.square() - Self::ONE).sqrt()).ln()
    }

    /// `atanh z = ½·ln((1 + z)/(1 − z))`.
    pub fn atanh(self) -> Self {
        ((Self::ONE + self) / (Self::ONE - self)).ln() * 0.5
    }

    /// Componentwise floor.
    #[inline]
    pub fn floor(self) -> Self {
        Self::new(self.re.floor(), self.im.floor())
    }

    /// Componentwise ceiling.
    #[inline]
    pub fn ceil(self) -> Self {
        Self::new(self.re.ceil(), self.im.ceil())
    }

    /// Componentwise rounding to the nearest integer.
    #[inline]
    pub fn round(self) -> Self {
        Self::new(self.re.round(), self.im.round())
    }

    /// Componentwise fractional part.
    #[inline]
    pub fn fract(self) -> Self {
        Self::new(self.re.fract(), self.im.fract())
    }

    /// Complex sign: `z/|z|`, or zero for zero.
    pub fn signum(self) -> Self {
        let n = self.norm();
        if n == 0.0 {
            Self::ZERO
        } else {
            self * (1.0 / n)
        }
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }
}

// -- Arithmetic operators --

impl Add for Complex {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            re: self.re + rhs.re,
            im: self.im + rhs.im,
        }
    }
}

impl AddAssign for Complex {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.re += rhs.re;
        self.im += rhs.im;
    }
}

impl Sub for Complex {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            re: self.re - rhs.re,
            im: self.im - rhs.im,
        }
    }
}

impl SubAssign for Complex {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.re -= rhs.re;
        self.im -= rhs.im;
    }
}

impl Mul for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            re: self.re * rhs.re - self.im * rhs.im,
            im: self.re * rhs.im + self.im * rhs.re,
        }
    }
}

impl MulAssign for Complex {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for Complex {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        let d = rhs.norm_sq();
        Self {
            re: (self.re * rhs.re + self.im * rhs.im) / d,
            im: (self.im * rhs.re - self.re * rhs.im) / d,
        }
    }
}

impl Neg for Complex {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            re: -self.re,
            im: -self.im,
        }
    }
}

/// Scalar multiplication: `Complex * f64`.
impl Mul<f64> for Complex {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self {
            re: self.re * rhs,
            im: self.im * rhs,
        }
    }
}

/// Scalar division: `Complex / f64`.
impl Div<f64> for Complex {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self {
            re: self.re / rhs,
            im: self.im / rhs,
        }
    }
}

impl std::fmt::Display for Complex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.im >= 0.0 {
            write!(f, "{} + {}i", self.re, self.im)
        } else {
            write!(f, "{} - {}i", self.re, -self.im)
        }
    }
}
