//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are kept as [`Decimal`] in the currency's standard unit so that cart
//! totals are exact sums. The backend quotes a single currency, so unlike a
//! multi-currency storefront there is no currency code attached.

use std::iter::Sum;
use std::ops::{Add, Mul};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A unit or line price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at `Decimal::MAX` instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Format for display with two decimal places (e.g., "12.50").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Mul<u32> for Price {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self {
        self.times(rhs)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_units(100).times(2), Price::from_units(50) * 1]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_units(250));
    }

    #[test]
    fn test_arithmetic_saturates_instead_of_panicking() {
        let huge = Price::new(Decimal::MAX - Decimal::from(10));
        assert_eq!(huge.times(2), Price::new(Decimal::MAX));
        assert_eq!(huge + huge, Price::new(Decimal::MAX));

        let total: Price = [huge, huge, Price::from_units(1)].into_iter().sum();
        assert_eq!(total, Price::new(Decimal::MAX));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(1250, 2));
        assert_eq!(price.display(), "12.50");
        assert_eq!(Price::from_units(3).display(), "3.00");
    }

    #[test]
    fn test_deserialize_from_number_or_string() {
        let from_number: Price = serde_json::from_str("100").unwrap();
        let from_string: Price = serde_json::from_str("\"100\"").unwrap();
        assert_eq!(from_number, Price::from_units(100));
        assert_eq!(from_string, from_number);
    }
}
