use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use crate::error::CoreError;

/// Guard digits carried beyond the working precision by multiplication and
/// division so that rounding error stays below one ulp of the requested
/// precision.
pub const GUARD_DIGITS: usize = 10;

/// Default working precision in decimal digits (~166 bits). Matches the
/// floor of the engine's recommended-precision policy.
pub const DEFAULT_PRECISION: usize = 50;

/// An arbitrary-precision signed decimal.
///
/// Stores base-10 digits most-significant first with a power-of-ten exponent
/// for the leading digit, so `value = sign · Σ digits[i] · 10^(exponent − i)`.
/// Grade-school algorithms throughout: the engine spends its time in the
/// double-precision delta loops, not here, and the simple representation
/// keeps the invariants auditable.
///
/// Canonical form: the leading digit is nonzero unless the value is zero,
/// trailing zero digits are trimmed, and zero is `+1 / [0] / 0`. All
/// operations are pure except [`round`](Self::round). Rounding is half-up on
/// the first truncated digit.
#[derive(Debug, Clone)]
pub struct BigDecimal {
    sign: i8,
    digits: Vec<u8>,
    exponent: i64,
    precision: usize,
}

impl BigDecimal {
    /// Canonical zero at the given working precision.
    pub fn zero(precision: usize) -> Self {
        Self {
            sign: 1,
            digits: vec![0],
            exponent: 0,
            precision: precision.max(1),
        }
    }

    /// One at the given working precision.
    pub fn one(precision: usize) -> Self {
        Self::from_i64(1, precision)
    }

    pub fn from_i64(value: i64, precision: usize) -> Self {
        if value == 0 {
            return Self::zero(precision);
        }
        let sign = if value < 0 { -1 } else { 1 };
        let mut magnitude = value.unsigned_abs();
        let mut digits = Vec::new();
        while magnitude > 0 {
            digits.push((magnitude % 10) as u8);
            magnitude /= 10;
        }
        digits.reverse();
        let exponent = digits.len() as i64 - 1;
        let mut out = Self {
            sign,
            digits,
            exponent,
            precision: precision.max(1),
        };
        out.normalize();
        out
    }

    /// Exact conversion from `f64` via the shortest round-tripping decimal
    /// representation. `NaN` and `±∞` map to zero; callers never pass such
    /// inputs.
    pub fn from_f64(value: f64, precision: usize) -> Self {
        if !value.is_finite() {
            return Self::zero(precision);
        }
        // `{:e}` prints the shortest decimal that parses back to the same
        // bits, so the round trip through `parse` is exact.
        Self::parse(&format!("{value:e}"), precision)
            .unwrap_or_else(|_| Self::zero(precision))
    }

    /// Parse a decimal string: optional sign, digits, optional fraction,
    /// optional `e±NN` exponent. Anything else is a `DecimalParse` error
    /// carrying the byte offset of the offending character.
    pub fn parse(input: &str, precision: usize) -> Result<Self, CoreError> {
        let bytes = input.as_bytes();
        let mut pos = 0;

        let err = |position: usize, message: &str| CoreError::DecimalParse {
            position,
            message: message.to_string(),
        };

        let mut sign: i8 = 1;
        match bytes.first() {
            Some(b'-') => {
                sign = -1;
                pos += 1;
            }
            Some(b'+') => pos += 1,
            _ => {}
        }

        let mut digits: Vec<u8> = Vec::new();
        let mut frac_digits: i64 = 0;
        let mut seen_digit = false;
        let mut seen_point = false;

        while pos < bytes.len() {
            match bytes[pos] {
                b'0'..=b'9' => {
                    digits.push(bytes[pos] - b'0');
                    if seen_point {
                        frac_digits += 1;
                    }
                    seen_digit = true;
                    pos += 1;
                }
                b'.' if !seen_point => {
                    seen_point = true;
                    pos += 1;
                }
                b'e' | b'E' => break,
                _ => return Err(err(pos, "expected digit")),
            }
        }

        if !seen_digit {
            return Err(err(pos, "expected at least one digit"));
        }

        let mut exp10: i64 = 0;
        if pos < bytes.len() {
            // Exponent marker.
            pos += 1;
            let mut exp_sign: i64 = 1;
            match bytes.get(pos) {
                Some(b'-') => {
                    exp_sign = -1;
                    pos += 1;
                }
                Some(b'+') => pos += 1,
                _ => {}
            }
            let exp_start = pos;
            while pos < bytes.len() {
                match bytes[pos] {
                    b'0'..=b'9' => {
                        exp10 = exp10
                            .saturating_mul(10)
                            .saturating_add((bytes[pos] - b'0') as i64);
                        pos += 1;
                    }
                    _ => return Err(err(pos, "expected exponent digit")),
                }
            }
            if pos == exp_start {
                return Err(err(pos, "expected exponent digit"));
            }
            exp10 = exp10.saturating_mul(exp_sign);
        }

        // value = D · 10^(exp10 − frac_digits), D the collected digit string.
        let exponent = (digits.len() as i64 - 1 - frac_digits).saturating_add(exp10);
        let mut out = Self {
            sign,
            digits,
            exponent,
            precision: precision.max(1),
        };
        out.normalize();
        out.round(out.precision);
        Ok(out)
    }

    /// Truncate to `f64`. Correctly rounded: the conversion goes through the
    /// standard library's decimal parser on up to 19 significant digits.
    pub fn to_f64(&self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let mut s = String::with_capacity(self.digits.len().min(19) + 12);
        if self.sign < 0 {
            s.push('-');
        }
        s.push((b'0' + self.digits[0]) as char);
        if self.digits.len() > 1 {
            s.push('.');
            for &d in self.digits[1..].iter().take(18) {
                s.push((b'0' + d) as char);
            }
        }
        s.push('e');
        s.push_str(&self.exponent.to_string());
        s.parse().unwrap_or(0.0)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.digits.len() == 1 && self.digits[0] == 0
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.sign < 0 && !self.is_zero()
    }

    #[inline]
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// The power of ten of the leading digit.
    #[inline]
    pub fn exponent(&self) -> i64 {
        self.exponent
    }

    pub fn abs(&self) -> Self {
        let mut out = self.clone();
        out.sign = 1;
        out
    }

    /// `2·self`, cheaper to read than a multiply at the call sites in the
    /// orbit code.
    pub fn double(&self) -> Self {
        self + self
    }

    /// Total order over values; zeros compare equal regardless of sign and
    /// working precision is ignored.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => return Ordering::Equal,
            (true, false) => {
                return if other.sign > 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, true) => {
                return if self.sign > 0 {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, false) => {}
        }
        if self.sign != other.sign {
            return if self.sign > other.sign {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
        let mag = self.compare_magnitude(other);
        if self.sign > 0 {
            mag
        } else {
            mag.reverse()
        }
    }

    fn compare_magnitude(&self, other: &Self) -> Ordering {
        match self.exponent.cmp(&other.exponent) {
            Ordering::Equal => {}
            ord => return ord,
        }
        let len = self.digits.len().max(other.digits.len());
        for i in 0..len {
            let a = self.digits.get(i).copied().unwrap_or(0);
            let b = other.digits.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// In-place rounding to `max_digits` significant digits, half-up on the
    /// first truncated digit.
    pub fn round(&mut self, max_digits: usize) {
        let max_digits = max_digits.max(1);
        if self.digits.len() <= max_digits {
            return;
        }
        let round_up = self.digits[max_digits] >= 5;
        self.digits.truncate(max_digits);
        if round_up {
            let mut i = self.digits.len();
            loop {
                if i == 0 {
                    // Carry past the most significant digit: 999… → 1000…
                    self.digits.insert(0, 1);
                    self.exponent += 1;
                    self.digits.truncate(max_digits);
                    break;
                }
                i -= 1;
                if self.digits[i] == 9 {
                    self.digits[i] = 0;
                } else {
                    self.digits[i] += 1;
                    break;
                }
            }
        }
        self.normalize();
    }

    /// Restore the canonical invariants: nonzero leading digit, no trailing
    /// zeros, canonical zero.
    fn normalize(&mut self) {
        let mut lead = 0;
        while lead < self.digits.len() && self.digits[lead] == 0 {
            lead += 1;
        }
        if lead == self.digits.len() {
            *self = Self::zero(self.precision);
            return;
        }
        if lead > 0 {
            self.digits.drain(..lead);
            self.exponent -= lead as i64;
        }
        while self.digits.len() > 1 && *self.digits.last().unwrap() == 0 {
            self.digits.pop();
        }
    }

    /// The power of ten of the least significant stored digit.
    fn low_power(&self) -> i64 {
        self.exponent - (self.digits.len() as i64 - 1)
    }

    fn digit_at(&self, power: i64) -> u8 {
        if power > self.exponent || power < self.low_power() {
            0
        } else {
            self.digits[(self.exponent - power) as usize]
        }
    }

    /// Magnitude addition of aligned digit sequences; sign is the caller's.
    fn add_magnitude(&self, other: &Self, sign: i8, precision: usize) -> Self {
        let high = self.exponent.max(other.exponent);
        let low = self.low_power().min(other.low_power());
        let len = (high - low + 1) as usize;
        let mut digits = vec![0u8; len + 1];
        let mut carry = 0u8;
        for (i, power) in (low..=high).enumerate() {
            let sum = self.digit_at(power) + other.digit_at(power) + carry;
            digits[len - i] = sum % 10;
            carry = sum / 10;
        }
        digits[0] = carry;
        let mut out = Self {
            sign,
            digits,
            exponent: high + 1,
            precision,
        };
        out.normalize();
        out
    }

    /// Magnitude subtraction; requires `|self| >= |other|`.
    fn sub_magnitude(&self, other: &Self, sign: i8, precision: usize) -> Self {
        let high = self.exponent.max(other.exponent);
        let low = self.low_power().min(other.low_power());
        let len = (high - low + 1) as usize;
        let mut digits = vec![0u8; len];
        let mut borrow = 0i8;
        for (i, power) in (low..=high).enumerate() {
            let mut diff = self.digit_at(power) as i8 - other.digit_at(power) as i8 - borrow;
            if diff < 0 {
                diff += 10;
                borrow = 1;
            } else {
                borrow = 0;
            }
            digits[len - 1 - i] = diff as u8;
        }
        let mut out = Self {
            sign,
            digits,
            exponent: high,
            precision,
        };
        out.normalize();
        out
    }

    fn add_impl(&self, other: &Self) -> Self {
        let precision = self.precision.max(other.precision);
        if self.is_zero() {
            let mut out = other.clone();
            out.precision = precision;
            return out;
        }
        if other.is_zero() {
            let mut out = self.clone();
            out.precision = precision;
            return out;
        }
        if self.sign == other.sign {
            return self.add_magnitude(other, self.sign, precision);
        }
        match self.compare_magnitude(other) {
            Ordering::Equal => Self::zero(precision),
            Ordering::Greater => self.sub_magnitude(other, self.sign, precision),
            Ordering::Less => other.sub_magnitude(self, other.sign, precision),
        }
    }

    fn mul_impl(&self, other: &Self) -> Self {
        let precision = self.precision.max(other.precision);
        if self.is_zero() || other.is_zero() {
            return Self::zero(precision);
        }
        // O(n·m) digit convolution, least-significant first.
        let la = self.digits.len();
        let lb = other.digits.len();
        let mut acc = vec![0u64; la + lb];
        for (i, &da) in self.digits.iter().rev().enumerate() {
            if da == 0 {
                continue;
            }
            for (j, &db) in other.digits.iter().rev().enumerate() {
                acc[i + j] += da as u64 * db as u64;
            }
        }
        let mut digits = Vec::with_capacity(la + lb);
        let mut carry = 0u64;
        for cell in &acc {
            let v = cell + carry;
            digits.push((v % 10) as u8);
            carry = v / 10;
        }
        while carry > 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
        digits.reverse();
        let low_power = self.low_power() + other.low_power();
        let exponent = low_power + digits.len() as i64 - 1;
        let mut out = Self {
            sign: self.sign * other.sign,
            digits,
            exponent,
            precision,
        };
        out.normalize();
        out.round(precision + GUARD_DIGITS);
        out
    }

    /// Long division to `precision + guard` quotient digits, rounded half-up.
    pub fn div(&self, other: &Self) -> Result<Self, CoreError> {
        if other.is_zero() {
            return Err(CoreError::DivisionByZero);
        }
        let precision = self.precision.max(other.precision);
        if self.is_zero() {
            return Ok(Self::zero(precision));
        }

        // One extra digit beyond the target so that half-up rounding sees
        // the first truncated position, and one more in case the leading
        // quotient digit comes out zero.
        let target = precision + GUARD_DIGITS + 2;
        let den = &other.digits;
        let mut rem: Vec<u8> = Vec::with_capacity(den.len() + 1);
        let mut quotient: Vec<u8> = Vec::with_capacity(target);

        for step in 0..target {
            let next = self.digits.get(step).copied().unwrap_or(0);
            rem.push(next);
            // Trim leading zeros so the comparison below is length-first.
            let lead = rem.iter().take_while(|&&d| d == 0).count();
            if lead == rem.len() {
                rem.clear();
            } else {
                rem.drain(..lead);
            }
            let mut q = 0u8;
            while ge_digits(&rem, den) {
                sub_digits(&mut rem, den);
                q += 1;
            }
            quotient.push(q);
        }

        // quotient = floor(Da · 10^(target − la) / Db) digit-by-digit, so
        // the least significant produced digit sits at this power of ten.
        let low_power =
            self.low_power() - other.low_power() + self.digits.len() as i64 - target as i64;
        let exponent = low_power + quotient.len() as i64 - 1;
        let mut out = Self {
            sign: self.sign * other.sign,
            digits: quotient,
            exponent,
            precision,
        };
        out.normalize();
        out.round(precision + GUARD_DIGITS);
        Ok(out)
    }

    /// Newton's square root: `x ← (x + S/x)/2` from `x₀ = 10^⌊exponent/2⌋`,
    /// run a fixed `⌈log₂ precision⌉ + 5` rounds (each round doubles the
    /// correct digits).
    pub fn sqrt(&self) -> Result<Self, CoreError> {
        if self.is_negative() {
            return Err(CoreError::SqrtOfNegative);
        }
        if self.is_zero() {
            return Ok(Self::zero(self.precision));
        }
        let mut x = Self {
            sign: 1,
            digits: vec![1],
            exponent: self.exponent.div_euclid(2),
            precision: self.precision,
        };
        let half = Self {
            sign: 1,
            digits: vec![5],
            exponent: -1,
            precision: self.precision,
        };
        let rounds = (self.precision.max(2) as f64).log2().ceil() as usize + 5;
        for _ in 0..rounds {
            let quot = self.div(&x)?;
            x = &(&x + &quot) * &half;
        }
        Ok(x)
    }

    /// Integer power by binary exponentiation; negative exponents via the
    /// reciprocal.
    pub fn pow(&self, n: i64) -> Result<Self, CoreError> {
        if n < 0 {
            let positive = self.pow(-n)?;
            return Self::one(self.precision).div(&positive);
        }
        let mut acc = Self::one(self.precision);
        let mut base = self.clone();
        let mut exp = n as u64;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = &acc * &base;
            }
            base = &base * &base;
            exp >>= 1;
        }
        Ok(acc)
    }
}

/// `a >= b` for trimmed MSD-first digit slices.
fn ge_digits(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return a.len() > b.len();
    }
    a >= b
}

/// `a -= b` for MSD-first digit slices; requires `a >= b`.
fn sub_digits(a: &mut Vec<u8>, b: &[u8]) {
    let offset = a.len() - b.len();
    let mut borrow = 0i8;
    for i in (0..a.len()).rev() {
        let sub = if i >= offset { b[i - offset] as i8 } else { 0 };
        let mut diff = a[i] as i8 - sub - borrow;
        if diff < 0 {
            diff += 10;
            borrow = 1;
        } else {
            borrow = 0;
        }
        a[i] = diff as u8;
    }
    let lead = a.iter().take_while(|&&d| d == 0).count();
    if lead == a.len() {
        a.clear();
    } else {
        a.drain(..lead);
    }
}

// -- Operators (by reference: the type owns a heap allocation) --

impl Add for &BigDecimal {
    type Output = BigDecimal;

    fn add(self, rhs: Self) -> BigDecimal {
        self.add_impl(rhs)
    }
}

impl Sub for &BigDecimal {
    type Output = BigDecimal;

    fn sub(self, rhs: Self) -> BigDecimal {
        let negated = BigDecimal {
            sign: -rhs.sign,
            digits: rhs.digits.clone(),
            exponent: rhs.exponent,
            precision: rhs.precision,
        };
        self.add_impl(&negated)
    }
}

impl Mul for &BigDecimal {
    type Output = BigDecimal;

    fn mul(self, rhs: Self) -> BigDecimal {
        self.mul_impl(rhs)
    }
}

impl Neg for BigDecimal {
    type Output = BigDecimal;

    fn neg(mut self) -> BigDecimal {
        if !self.is_zero() {
            self.sign = -self.sign;
        }
        self
    }
}

impl PartialEq for BigDecimal {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for BigDecimal {}

impl PartialOrd for BigDecimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for BigDecimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for BigDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return write!(f, "0");
        }
        if self.sign < 0 {
            write!(f, "-")?;
        }
        let len = self.digits.len() as i64;
        if (-6..=20).contains(&self.exponent) {
            if self.exponent >= len - 1 {
                // Integer, possibly with trailing zeros.
                for &d in &self.digits {
                    write!(f, "{d}")?;
                }
                for _ in 0..(self.exponent - (len - 1)) {
                    write!(f, "0")?;
                }
            } else if self.exponent >= 0 {
                let point = (self.exponent + 1) as usize;
                for &d in &self.digits[..point] {
                    write!(f, "{d}")?;
                }
                write!(f, ".")?;
                for &d in &self.digits[point..] {
                    write!(f, "{d}")?;
                }
            } else {
                write!(f, "0.")?;
                for _ in 0..(-self.exponent - 1) {
                    write!(f, "0")?;
                }
                for &d in &self.digits {
                    write!(f, "{d}")?;
                }
            }
        } else {
            write!(f, "{}", self.digits[0])?;
            if self.digits.len() > 1 {
                write!(f, ".")?;
                for &d in &self.digits[1..] {
                    write!(f, "{d}")?;
                }
            }
            write!(f, "e{}", self.exponent)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bd(s: &str) -> BigDecimal {
        BigDecimal::parse(s, DEFAULT_PRECISION).unwrap()
    }

    // -- Construction and parsing --

    #[test]
    fn parse_plain_and_scientific() {
        assert_eq!(bd("42"), BigDecimal::from_i64(42, 50));
        assert_eq!(bd("-0.5"), BigDecimal::from_f64(-0.5, 50));
        assert_eq!(bd("1.5e3"), BigDecimal::from_i64(1500, 50));
        assert_eq!(bd("+2.5E-2"), BigDecimal::from_f64(0.025, 50));
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "abc", "1.2.3", "1e", "--3", "1x", "e5"] {
            assert!(
                BigDecimal::parse(input, 50).is_err(),
                "should reject {input:?}"
            );
        }
    }

    #[test]
    fn parse_error_position() {
        let err = BigDecimal::parse("12x4", 50).unwrap_err();
        assert_eq!(err.position(), Some(2));
    }

    #[test]
    fn zero_is_canonical() {
        for input in ["0", "-0", "0.000", "0e10", "-0.0e-5"] {
            let z = bd(input);
            assert!(z.is_zero(), "{input:?} should be zero");
            assert_eq!(z, BigDecimal::zero(50));
        }
    }

    #[test]
    fn negative_zero_equals_positive_zero() {
        assert_eq!(bd("-0"), bd("0"));
        assert_eq!(bd("-0").compare(&bd("0")), Ordering::Equal);
    }

    // -- f64 round trips --

    #[test]
    fn f64_round_trip_is_exact() {
        let values = [
            0.0,
            1.0,
            -1.0,
            0.1,
            -0.75,
            1e-300,
            -3.337e18,
            std::f64::consts::PI,
            f64::MIN_POSITIVE,
            f64::MAX,
            2.2250738585072014e-308,
        ];
        for &v in &values {
            let big = BigDecimal::from_f64(v, 50);
            assert_eq!(big.to_f64().to_bits(), v.to_bits(), "round trip of {v:e}");
        }
    }

    #[test]
    fn non_finite_maps_to_zero() {
        assert!(BigDecimal::from_f64(f64::NAN, 50).is_zero());
        assert!(BigDecimal::from_f64(f64::INFINITY, 50).is_zero());
        assert!(BigDecimal::from_f64(f64::NEG_INFINITY, 50).is_zero());
    }

    #[test]
    fn display_parse_round_trip() {
        for input in [
            "123456789",
            "-0.000123",
            "3.14159265358979323846264338327950288",
            "1e-40",
            "-9.999e25",
            "42000",
        ] {
            let a = bd(input);
            let b = bd(&a.to_string());
            assert_eq!(a, b, "display round trip of {input:?}");
        }
    }

    // -- Comparison --

    #[test]
    fn ordering() {
        assert!(bd("2") > bd("1"));
        assert!(bd("-1") < bd("1"));
        assert!(bd("-2") < bd("-1"));
        assert!(bd("0.001") < bd("0.01"));
        assert!(bd("9.999") < bd("10"));
        assert!(bd("1e10") > bd("9.9e9"));
    }

    // -- Addition / subtraction --

    #[test]
    fn addition_with_alignment() {
        assert_eq!(&bd("1.5") + &bd("2.25"), bd("3.75"));
        assert_eq!(&bd("1e10") + &bd("1e-10"), bd("10000000000.0000000001"));
        assert_eq!(&bd("-3") + &bd("5"), bd("2"));
        assert_eq!(&bd("3") + &bd("-5"), bd("-2"));
    }

    #[test]
    fn subtraction_cancellation() {
        assert_eq!(&bd("1.0000000001") - &bd("1"), bd("1e-10"));
        assert!((&bd("7.25") - &bd("7.25")).is_zero());
    }

    #[test]
    fn addition_associative() {
        let a = bd("1.234567890123456789");
        let b = bd("-9.87654321e-7");
        let c = bd("3.5e3");
        assert_eq!(&(&a + &b) + &c, &a + &(&b + &c));
    }

    #[test]
    fn addition_carry_chain() {
        assert_eq!(&bd("999999.999") + &bd("0.001"), bd("1000000"));
    }

    // -- Multiplication --

    #[test]
    fn multiplication_commutes() {
        let a = bd("123.456");
        let b = bd("-0.00789");
        assert_eq!(&a * &b, &b * &a);
        assert_eq!(&a * &b, bd("-0.97406784"));
    }

    #[test]
    fn multiplication_by_zero_and_one() {
        let a = bd("42.42");
        assert!((&a * &BigDecimal::zero(50)).is_zero());
        assert_eq!(&a * &BigDecimal::one(50), a);
    }

    #[test]
    fn multiplication_at_small_working_precision() {
        let a = BigDecimal::parse("1.23456789", 10).unwrap();
        let product = &a * &a;
        // 10 precision + 10 guard digits hold the exact 17-digit square.
        let expected = 1.23456789f64 * 1.23456789f64;
        assert!((product.to_f64() - expected).abs() < 1e-15);
    }

    // -- Division --

    #[test]
    fn division_basics() {
        assert_eq!(bd("1").div(&bd("2")).unwrap(), bd("0.5"));
        assert_eq!(bd("10").div(&bd("4")).unwrap(), bd("2.5"));
        assert_eq!(bd("-9").div(&bd("3")).unwrap(), bd("-3"));
    }

    #[test]
    fn division_by_zero_fails() {
        assert!(matches!(
            bd("1").div(&bd("0")),
            Err(CoreError::DivisionByZero)
        ));
    }

    #[test]
    fn division_inverts_multiplication() {
        let a = bd("123.456789");
        let b = bd("-0.0321");
        let q = a.div(&b).unwrap();
        let back = &q * &b;
        let diff = (&back - &a).abs();
        assert!(diff < bd("1e-45"), "a/b·b should equal a, diff = {diff}");
    }

    #[test]
    fn repeating_decimal_is_rounded() {
        let third = bd("1").div(&bd("3")).unwrap();
        // 50 + 10 guard digits of 3s.
        let as_string = third.to_string();
        assert!(as_string.starts_with("0.3333333333"));
        assert!((third.to_f64() - 1.0 / 3.0).abs() < 1e-16);
    }

    // -- Square root --

    #[test]
    fn sqrt_of_perfect_squares() {
        assert_eq!(bd("4").sqrt().unwrap(), bd("2"));
        assert_eq!(bd("0.25").sqrt().unwrap(), bd("0.5"));
        assert!(bd("0").sqrt().unwrap().is_zero());
    }

    #[test]
    fn sqrt_squares_back() {
        for input in ["2", "3", "10", "0.5", "123456.789", "1e-20"] {
            let a = bd(input);
            let root = a.sqrt().unwrap();
            let square = &root * &root;
            let diff = (&square - &a).abs();
            let tolerance = &a * &bd("1e-48");
            assert!(
                diff <= tolerance.abs(),
                "sqrt({input})² off by {diff}"
            );
        }
    }

    #[test]
    fn sqrt_of_negative_fails() {
        assert!(matches!(
            bd("-1").sqrt(),
            Err(CoreError::SqrtOfNegative)
        ));
    }

    // -- Integer powers --

    #[test]
    fn pow_basics() {
        assert_eq!(bd("2").pow(10).unwrap(), bd("1024"));
        assert_eq!(bd("-3").pow(3).unwrap(), bd("-27"));
        assert_eq!(bd("7").pow(0).unwrap(), bd("1"));
    }

    #[test]
    fn pow_negative_exponent() {
        assert_eq!(bd("2").pow(-2).unwrap(), bd("0.25"));
    }

    // -- Rounding --

    #[test]
    fn round_half_up() {
        let mut a = bd("1.25");
        a.round(2);
        assert_eq!(a, bd("1.3"));
        let mut b = bd("1.24");
        b.round(2);
        assert_eq!(b, bd("1.2"));
    }

    #[test]
    fn round_carries_through_nines() {
        let mut a = bd("9.99");
        a.round(2);
        assert_eq!(a, bd("10"));
    }

    #[test]
    fn deep_zoom_scale_arithmetic() {
        // Distinguishing pixels at 10⁻³⁰ requires the digits f64 lacks.
        let center = bd("-1.999999999999999999999999999999");
        let offset = bd("1e-30");
        let moved = &center + &offset;
        assert_ne!(moved, center);
        let back = &moved - &offset;
        assert_eq!(back, center);
    }
}
