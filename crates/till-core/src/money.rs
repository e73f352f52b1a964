//! # Money Module
//!
//! Provides the `Money` type for reference-currency (USD) amounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A draft total is Σ(qty × unit price). Summing floats drifts; summing  │
//! │  integer cents does not.                                                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents internally, decimal numbers on the wire    │
//! │    API → "5.00" / 5 / 5.0  ──parse──►  Money(500)                       │
//! │    Money(1350)  ──serialize──►  13.5  → API                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let price = Money::from_cents(500); // $5.00
//! let line = price.multiply_quantity(2);
//! assert_eq!(line.cents(), 1000);
//!
//! let typed = Money::parse("3.50").unwrap();
//! assert_eq!(typed.cents(), 350);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest reference-currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: arithmetic stays closed; non-negativity is enforced by
///   the draft at its edges, not by the type
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.price_usd ──► SaleLine.unit_price ──► line total ──► draft total
///
/// Operator input ─────► PaymentSpec.amount_tendered ──► pay.amount_usd
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units (dollars and cents).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let price = Money::from_major_minor(13, 50); // $13.50
    /// assert_eq!(price.cents(), 1350);
    /// ```
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Creates Money from an exact decimal, rounding half away from zero to
    /// the cent.
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        let cents = value
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        cents.to_i64().map(Money)
    }

    /// Parses operator or wire text such as `"5"`, `"3.5"`, `"13.50"`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// assert_eq!(Money::parse("13.50").unwrap().cents(), 1350);
    /// assert_eq!(Money::parse(" 2 ").unwrap().cents(), 200);
    /// assert!(Money::parse("abc").is_err());
    /// ```
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        if text.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let value = Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|_| invalid("not a decimal number"))?;

        Money::from_decimal(value).ok_or_else(|| invalid("amount is too large"))
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns the amount as an exact two-place decimal.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
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

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(350); // $3.50
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 1050);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount with two decimals and a dollar sign.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Wire Format
// =============================================================================

/// Serde adapter for API fields that carry dollars as a JSON number
/// (`unit_price_usd`, `amount_usd`, `total_usd`).
///
/// Deserialization accepts a number or a numeric string, since the API
/// returns database decimals as strings.
pub mod decimal {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        let value = money.to_decimal().to_f64().unwrap_or_default();
        serializer.serialize_f64(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        from_json(&raw)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::custom("expected a decimal amount, got null"))
    }

    pub(crate) fn from_json(raw: &serde_json::Value) -> Result<Option<Money>, String> {
        match raw {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Number(n) => Money::parse(&n.to_string())
                .map(Some)
                .map_err(|e| e.to_string()),
            serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
            serde_json::Value::String(s) => Money::parse(s).map(Some).map_err(|e| e.to_string()),
            other => Err(format!("expected a decimal amount, got {}", other)),
        }
    }
}

/// Optional variant of [`decimal`]: `null`, a missing field or `""` map to `None`.
pub mod decimal_opt {
    use super::*;
    use serde::de::Error as _;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        money: &Option<Money>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match money {
            Some(m) => decimal::serialize(m, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Money>, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        decimal::from_json(&raw).map_err(D::Error::custom)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
