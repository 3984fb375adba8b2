//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A drawer reconciled with floats will drift by fractions of a          │
//! │  centavo and "exact match" becomes untestable.                          │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Centavos                                         │
//! │    R$10,00 = 1000 centavos. All arithmetic is exact. The only          │
//! │    tolerance in the system is ROUNDING_TOLERANCE, applied at           │
//! │    boundary comparisons ("fully paid", "exact match") and nowhere      │
//! │    else.                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pdv_core::money::Money;
//!
//! // Create from centavos (preferred)
//! let price = Money::from_centavos(1099); // R$10,99
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_centavos(500); // R$15,99
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Tolerance used wherever "fully paid" or "exact match" is tested.
///
/// Consumers of the HTTP API send decimal values with two fraction digits;
/// one minor unit (R$0,01) absorbs any boundary rounding on their side.
/// This constant is used ONLY at boundary comparisons, never inside
/// arithmetic.
pub const ROUNDING_TOLERANCE: Money = Money::from_centavos(1);

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in centavos (the smallest currency unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds, shortages, variance
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// let price = Money::from_centavos(1099); // R$10,99
    /// assert_eq!(price.centavos(), 1099);
    /// ```
    #[inline]
    pub const fn from_centavos(centavos: i64) -> Self {
        Money(centavos)
    }

    /// Creates a Money value from major and minor units (reais and centavos).
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_reais_centavos(-5, 50)` = −R$5,50, not −R$4,50.
    #[inline]
    pub const fn from_reais_centavos(reais: i64, centavos: i64) -> Self {
        if reais < 0 {
            Money(reais * 100 - centavos)
        } else {
            Money(reais * 100 + centavos)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn centavos(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (reais) portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (centavos) portion (always 0-99).
    #[inline]
    pub const fn centavos_part(&self) -> i64 {
        (self.0 % 100).abs()
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// // remaining = max(0, total_due − paid)
    /// let remaining = (Money::from_centavos(5000) - Money::from_centavos(8000))
    ///     .clamp_non_negative();
    /// assert!(remaining.is_zero());
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// let unit_price = Money::from_centavos(299); // R$2,99
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.centavos(), 897); // R$8,97
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Compares two amounts for equality within [`ROUNDING_TOLERANCE`].
    ///
    /// Used for the "fully paid" and drawer "exact match" checks required
    /// at the API boundary; everywhere else Money comparison is exact.
    #[inline]
    pub const fn matches_within_tolerance(&self, other: Money) -> bool {
        (self.0 - other.0).abs() <= ROUNDING_TOLERANCE.0
    }

    /// Checks whether `self` covers `due` within [`ROUNDING_TOLERANCE`].
    ///
    /// ## Example
    /// ```rust
    /// use pdv_core::money::Money;
    ///
    /// let due = Money::from_centavos(1000);
    /// assert!(Money::from_centavos(1000).covers(due));
    /// assert!(Money::from_centavos(999).covers(due));  // within tolerance
    /// assert!(!Money::from_centavos(998).covers(due));
    /// ```
    #[inline]
    pub const fn covers(&self, due: Money) -> bool {
        self.0 + ROUNDING_TOLERANCE.0 >= due.0
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and receipts. Callers needing locale-aware formatting
/// should format from `centavos()` themselves.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R${},{:02}", sign, self.reais().abs(), self.centavos_part())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation over iterators (payment lists, movement logs).
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_centavos() {
        let money = Money::from_centavos(1099);
        assert_eq!(money.centavos(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.centavos_part(), 99);
    }

    #[test]
    fn test_from_reais_centavos() {
        let money = Money::from_reais_centavos(10, 99);
        assert_eq!(money.centavos(), 1099);

        let negative = Money::from_reais_centavos(-5, 50);
        assert_eq!(negative.centavos(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_centavos(1099)), "R$10,99");
        assert_eq!(format!("{}", Money::from_centavos(500)), "R$5,00");
        assert_eq!(format!("{}", Money::from_centavos(-550)), "-R$5,50");
        assert_eq!(format!("{}", Money::from_centavos(0)), "R$0,00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_centavos(1000);
        let b = Money::from_centavos(500);

        assert_eq!((a + b).centavos(), 1500);
        assert_eq!((a - b).centavos(), 500);
        assert_eq!((-a).centavos(), -1000);
        let result: Money = a * 3;
        assert_eq!(result.centavos(), 3000);
    }

    #[test]
    fn test_sum() {
        let payments = [
            Money::from_centavos(1000),
            Money::from_centavos(2550),
            Money::from_centavos(450),
        ];
        let total: Money = payments.iter().copied().sum();
        assert_eq!(total.centavos(), 4000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(
            (Money::from_centavos(300) - Money::from_centavos(500))
                .clamp_non_negative()
                .centavos(),
            0
        );
        assert_eq!(
            (Money::from_centavos(500) - Money::from_centavos(300))
                .clamp_non_negative()
                .centavos(),
            200
        );
    }

    #[test]
    fn test_covers_uses_one_centavo_tolerance() {
        let due = Money::from_centavos(8000);

        assert!(Money::from_centavos(8000).covers(due));
        assert!(Money::from_centavos(8001).covers(due));
        assert!(Money::from_centavos(7999).covers(due)); // one centavo short is OK
        assert!(!Money::from_centavos(7998).covers(due));
    }

    #[test]
    fn test_matches_within_tolerance() {
        let counted = Money::from_centavos(15000);
        assert!(counted.matches_within_tolerance(Money::from_centavos(15001)));
        assert!(counted.matches_within_tolerance(Money::from_centavos(14999)));
        assert!(!counted.matches_within_tolerance(Money::from_centavos(15002)));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_centavos(100);
        assert!(positive.is_positive());

        let negative = Money::from_centavos(-100);
        assert!(negative.is_negative());
    }
}
