//! # Money Module
//!
//! Provides the `Money` type for handling catalog prices safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    1000 cents split 3 ways = [334, 333, 333]                            │
//! │    The leftover cent is handed out explicitly, nothing is lost          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Text Form
//! Prices travel as `"major.minor"` strings (`"123.45"`, `"-0.50"`), never as
//! JSON numbers. `Display`, `FromStr` and the serde impls all use that form.
//!
//! ## Usage
//! ```rust
//! use shopfront_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! assert_eq!(price.cents(), 1099);
//!
//! let doubled = price * 2;
//! assert_eq!(doubled.to_string(), "21.98");
//! ```

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;

use crate::error::MoneyError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values are representable (adjustments, refunds)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Immutable**: every operation returns a new value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts only the major unit carries the sign:
    /// `from_major_minor(-5, 50)` is `-5.50`.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Parses a decimal literal in `"major.minor"` form.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal("1.00").unwrap().cents(), 100);
    /// assert_eq!(Money::from_decimal("-123.45").unwrap().cents(), -12345);
    /// assert!(Money::from_decimal("12").is_err());
    /// ```
    pub fn from_decimal(literal: &str) -> Result<Self, MoneyError> {
        literal.parse()
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// `self <= other`, usable in const contexts.
    #[inline]
    pub const fn less_or_equal(&self, other: Money) -> bool {
        self.0 <= other.0
    }

    /// Divides by another amount, truncating toward zero.
    ///
    /// ## Errors
    /// [`MoneyError::DivisionByZero`] when `other` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use shopfront_core::money::Money;
    ///
    /// let total = Money::from_cents(1000);
    /// assert_eq!(total.checked_div(Money::from_cents(3)).unwrap().cents(), 333);
    /// assert!(total.checked_div(Money::zero()).is_err());
    /// ```
    pub fn checked_div(&self, other: Money) -> Result<Money, MoneyError> {
        if other.is_zero() {
            return Err(MoneyError::DivisionByZero);
        }
        Ok(Money(self.0 / other.0))
    }

    /// Splits the amount into `n` parts that sum back to the original exactly.
    ///
    /// ## How The Remainder Is Handed Out
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  1000 cents split 3 ways                                            │
    /// │                                                                     │
    /// │  base      = 1000 / 3 = 333                                         │
    /// │  remainder = 1000 % 3 = 1                                           │
    /// │                                                                     │
    /// │  parts[0] = 333 + 1 = 334   ← first `remainder` parts get one unit  │
    /// │  parts[1] = 333                                                     │
    /// │  parts[2] = 333                                                     │
    /// │                                                                     │
    /// │  334 + 333 + 333 = 1000 ✓                                           │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// For negative amounts the remainder is negative and the first parts
    /// get one unit of that sign, so the sum is still exact.
    ///
    /// Returns an empty vector when `n == 0`.
    pub fn split(&self, n: usize) -> Vec<Money> {
        if n == 0 {
            return Vec::new();
        }

        let count = n as i64;
        let base = self.0 / count;
        let remainder = self.0 % count;
        let unit = remainder.signum();
        let extra = remainder.unsigned_abs() as usize;

        (0..n)
            .map(|i| {
                if i < extra {
                    Money(base + unit)
                } else {
                    Money(base)
                }
            })
            .collect()
    }
}

// =============================================================================
// Text Form
// =============================================================================

/// Renders `"major.minor"` with a single leading minus for negative values.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

/// Parses `-?<digits>.<two digits>`; anything else is a format error.
impl FromStr for Money {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || MoneyError::Format(s.to_string());

        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major, minor) = unsigned.split_once('.').ok_or_else(format_err)?;

        let all_digits = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(major) || !all_digits(minor) || minor.len() != 2 {
            return Err(format_err());
        }

        let major: i64 = major.parse().map_err(|_| format_err())?;
        let minor: i64 = minor.parse().map_err(|_| format_err())?;

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(format_err)?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Raw cents-by-cents product, kept for parity with the amount API.
impl Mul for Money {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        Money(self.0 * other.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
