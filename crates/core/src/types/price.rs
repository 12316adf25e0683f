//! Type-safe price representation using decimal arithmetic.
//!
//! All FitWear amounts are in a single store currency, so a price is just a
//! non-floating decimal amount. Totals never go through `f64`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency.
///
/// Serializes as a decimal string (lossless). Deserializes from either a
/// string or a JSON number, since the FitWear API emits floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an integer number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at the largest representable amount.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Price of `quantity` units, or `None` if it overflows.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Sum of two amounts, or `None` if it overflows.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0.round_dp(2))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturates at the largest representable amount.
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// Serde adapter emitting a [`Price`] as a JSON number.
///
/// The FitWear API expects numeric money fields in request bodies:
///
/// ```rust
/// # use fitwear_core::Price;
/// #[derive(serde::Serialize)]
/// struct Line {
///     #[serde(with = "fitwear_core::price::as_number")]
///     unit_price: Price,
/// }
/// ```
pub mod as_number {
    use serde::{Deserializer, Serializer};

    use super::Price;

    /// Serialize as a JSON number.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if the amount cannot be represented.
    pub fn serialize<S: Serializer>(price: &Price, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&price.0, serializer)
    }

    /// Deserialize from a JSON number.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the value is not numeric.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Price, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Price)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let lines = [Price::from_cents(1000).times(2), Price::from_cents(500).times(1)];
        let total: Price = lines.into_iter().sum();
        assert_eq!(total, Price::from_cents(2500));
    }

    #[test]
    fn test_empty_sum_is_zero() {
        let total: Price = core::iter::empty().sum();
        assert_eq!(total, Price::ZERO);
    }

    #[test]
    fn test_overflow_is_checked_or_saturated() {
        let huge = Price::new(Decimal::MAX);
        assert_eq!(huge.checked_times(2), None);
        assert_eq!(huge.checked_add(Price::from_cents(1)), None);
        assert_eq!(huge.times(2), huge);
        assert_eq!(huge + huge, huge);
        assert_eq!(
            Price::from_cents(250).checked_times(4),
            Some(Price::from_cents(1000))
        );
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_cents(1999).to_string(), "$19.99");
        assert_eq!(Price::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_deserializes_api_float() {
        let price: Price = serde_json::from_str("29.99").unwrap();
        assert_eq!(price, Price::from_cents(2999));
    }

    #[test]
    fn test_as_number_emits_json_number() {
        #[derive(serde::Serialize)]
        struct Line {
            #[serde(with = "as_number")]
            unit_price: Price,
        }
        let json = serde_json::to_value(Line {
            unit_price: Price::from_cents(1250),
        })
        .unwrap();
        assert!(json["unit_price"].is_number());
        assert!((json["unit_price"].as_f64().unwrap() - 12.5).abs() < f64::EPSILON);
    }
}
