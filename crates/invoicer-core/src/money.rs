//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    249.99 * 0.10 = 24.999000000000002                                   │
//! │                                                                         │
//! │  An invoice total must be reproducible to the cent on every machine,   │
//! │  so every amount is an integer number of cents:                        │
//! │    24_999 cents * 1000 bps = 24_999_000 / 10_000 = 2_499.9 → 2_500      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::money::Money;
//!
//! let price = Money::from_cents(4_999); // 49.99
//! let line = price * 3;                 // 149.97
//! assert_eq!(line.cents(), 14_997);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in one whole (100%).
const BPS_SCALE: i128 = 10_000;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Where Money Flows
/// ```text
/// Product.unit_price_cents ──► DraftLine.unit_price ──► DraftLine.total
///                                                          │
///                        InvoiceTotals.subtotal ◄──────────┘ (Σ)
///                                │
///                                ├──► calculate_tax(rate) ──► tax
///                                ▼
///                        InvoiceTotals.total = subtotal + tax
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ```rust
    /// use invoicer_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(10_000).cents(), 10_000); // 100.00
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Calculates tax on this amount, rounding half away from zero.
    ///
    /// ## Rounding Convention
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF AWAY FROM ZERO                                          │
    /// │                                                                     │
    /// │   2.4 →  2     2.5 →  3     2.6 →  3                                │
    /// │  -2.4 → -2    -2.5 → -3    -2.6 → -3                                │
    /// │                                                                     │
    /// │  One convention for every invoice; tax is the only value that      │
    /// │  ever needs rounding because subtotal and total are exact sums.   │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Example
    /// ```rust
    /// use invoicer_core::money::Money;
    /// use invoicer_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_cents(24_999);
    /// assert_eq!(subtotal.calculate_tax(TaxRate::from_bps(1000)).cents(), 2_500);
    ///
    /// let small = Money::from_cents(5); // 0.05 × 10% = 0.005 → 0.01
    /// assert_eq!(small.calculate_tax(TaxRate::from_bps(1000)).cents(), 1);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps amount × bps exact for any i64 amount
        let scaled = self.0 as i128 * rate.bps() as i128;
        let half = BPS_SCALE / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / BPS_SCALE
        } else {
            (scaled - half) / BPS_SCALE
        };
        Money::from_cents(rounded as i64)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    ///
    /// ```rust
    /// use invoicer_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(299).checked_mul_quantity(3), Some(Money::from_cents(897)));
    /// assert_eq!(Money::from_cents(i64::MAX).checked_mul_quantity(2), None);
    /// ```
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering with two fraction digits (`1234.50`).
///
/// Currency symbols are a presentation concern of the client.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(4_999);
        assert_eq!(money.cents(), 4_999);
        assert_eq!(money.major(), 49);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(27_499).to_string(), "274.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(0).to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(10_000);
        let b = Money::from_cents(4_999);

        assert_eq!((a * 2 + b).cents(), 24_999);

        let mut acc = Money::zero();
        acc += a;
        acc += b;
        assert_eq!(acc.cents(), 14_999);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 4_999]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 5_349);
    }

    #[test]
    fn test_tax_exact() {
        let tax = Money::from_cents(1_000).calculate_tax(TaxRate::from_bps(1000));
        assert_eq!(tax.cents(), 100);
    }

    #[test]
    fn test_tax_rounds_half_away_from_zero() {
        let rate = TaxRate::from_bps(1000);

        // 0.045 → 0.05 (exactly half rounds up)
        assert_eq!(Money::from_cents(45).calculate_tax(rate).cents(), 5);
        // 0.044 → 0.04
        assert_eq!(Money::from_cents(44).calculate_tax(rate).cents(), 4);
        // -0.045 → -0.05 (away from zero, not toward it)
        assert_eq!(Money::from_cents(-45).calculate_tax(rate).cents(), -5);
        // 24.999 → 25.00
        assert_eq!(Money::from_cents(24_999).calculate_tax(rate).cents(), 2_500);
    }

    #[test]
    fn test_tax_zero_rate() {
        let tax = Money::from_cents(12_345).calculate_tax(TaxRate::zero());
        assert_eq!(tax, Money::zero());
    }

    #[test]
    fn test_checked_operations() {
        assert_eq!(
            Money::from_cents(4_999).checked_mul_quantity(2),
            Some(Money::from_cents(9_998))
        );
        assert_eq!(Money::from_cents(i64::MAX / 2 + 1).checked_mul_quantity(2), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
    }

    #[test]
    fn test_is_positive() {
        assert!(Money::from_cents(1).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::from_cents(-1).is_positive());
    }
}
