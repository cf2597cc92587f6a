//! # Money Module
//!
//! Integer currency amounts.
//!
//! ## Minor Units
//! Every amount is an `i64` count of the smallest currency unit: pesos for
//! a CLP store, cents for a USD one. A shift close compares counted cash
//! against a total folded from hundreds of tickets, and binary floats
//! would turn rounding drift into a fake variance.
//!
//! ## Usage
//! ```rust
//! use caja_core::money::Money;
//!
//! let price = Money::from_minor(1000);
//! let doubled = price * 2;
//! let total = price + Money::from_minor(500);
//! assert_eq!(doubled.minor(), 2000);
//! assert_eq!(total.minor(), 1500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: shift variances and netted returns can be negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Newtype serde**: serializes as a bare number, like the stored rows
/// - **Saturating**: arithmetic clamps at the `i64` bounds instead of
///   panicking or wrapping; validation caps inputs at [`MAX_AMOUNT`]
///
/// [`MAX_AMOUNT`]: crate::MAX_AMOUNT
///
/// ## Where Money Flows
/// ```text
/// Product.price ──► CartLine.unit_price ──► Sale.total ──► ShiftSummary
///                                              │
///                                              └──► Client.balance (fiado)
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use caja_core::money::Money;
    ///
    /// let price = Money::from_minor(1099);
    /// assert_eq!(price.minor(), 1099);
    /// ```
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Strictly above zero.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Line total: unit price times units.
    ///
    /// ## Example
    /// ```rust
    /// use caja_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// `None` when the sum leaves the `i64` range.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// Used for credit balances, which never turn into an asset.
    ///
    /// ## Example
    /// ```rust
    /// use caja_core::money::Money;
    ///
    /// let balance = Money::from_minor(300);
    /// assert_eq!(balance.saturating_sub_floor(Money::from_minor(500)), Money::zero());
    /// ```
    #[inline]
    pub fn saturating_sub_floor(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the raw amount with a `$` sign, for logs and error messages.
///
/// ## Note
/// Localized formatting (thousands separators, decimals) belongs to
/// `LedgerConfig::format_currency` in caja-ledger.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, self.0.abs())
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// `price * qty` for cart and return lines.
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

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_minor(52000)), "$52000");
        assert_eq!(format!("{}", Money::from_minor(-300)), "-$300");
        assert_eq!(format!("{}", Money::zero()), "$0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((-a).minor(), -1000);
        let result: Money = a * 3;
        assert_eq!(result.minor(), 3000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_minor(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().minor(), 100);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_minor(100), Money::from_minor(250)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.minor(), 350);
    }

    #[test]
    fn test_floor_at_zero() {
        let balance = Money::from_minor(7000);
        assert_eq!(
            balance.saturating_sub_floor(Money::from_minor(2000)).minor(),
            5000
        );
        assert!(balance
            .saturating_sub_floor(Money::from_minor(9000))
            .is_zero());
    }

    #[test]
    fn test_overflow_saturates() {
        let huge = Money::from_minor(i64::MAX / 2);
        assert_eq!(huge.multiply_quantity(3).minor(), i64::MAX);
        assert_eq!((huge + huge + huge).minor(), i64::MAX);
        assert_eq!((-huge - huge - huge).minor(), i64::MIN);
        assert_eq!(huge.checked_add(huge), Some(Money::from_minor(i64::MAX - 1)));
        assert_eq!(huge.checked_add(Money::from_minor(i64::MAX)), None);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Money::from_minor(1500)).unwrap();
        assert_eq!(json, "1500");
    }
}
