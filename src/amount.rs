//! Signed integer monetary amount.
//!
//! Amounts are whole currency units carried in an `i64`, so every balance
//! is an exact integer sum with no floating-point rounding.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A signed amount of money in whole units.
///
/// Negative amounts are legal: payments are usually recorded as negative
/// values so that they reduce the payable balance.
///
/// # Examples
///
/// ```
/// use credit_summarizer::Amount;
///
/// assert_eq!(Amount::new(50).to_string(), "$50");
/// assert_eq!(Amount::new(-50).to_string(), "-$50");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(0);

    /// Creates an amount from whole units.
    pub const fn new(value: i64) -> Self {
        Amount(value)
    }

    /// Returns the raw number of units.
    pub const fn value(&self) -> i64 {
        self.0
    }

    /// Addition that returns `None` instead of overflowing.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// Subtraction that returns `None` instead of overflowing.
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Amount)
    }

    /// Returns `true` if this amount is below zero.
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Amount(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0 {
            write!(f, "${}", self.0)
        } else {
            write!(f, "-${}", self.0.unsigned_abs())
        }
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_dollar_prefix() {
        assert_eq!(Amount::new(0).to_string(), "$0");
        assert_eq!(Amount::new(50).to_string(), "$50");
        assert_eq!(Amount::new(-50).to_string(), "-$50");
    }

    #[test]
    fn test_display_handles_extreme_negative() {
        assert_eq!(
            Amount::new(i64::MIN).to_string(),
            "-$9223372036854775808"
        );
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Amount::new(456);
        let b = Amount::new(-456);

        assert_eq!(a + b, Amount::ZERO);
        assert_eq!(a - b, Amount::new(912));
        assert_eq!(-a, b);

        let mut c = Amount::new(1000);
        c -= a;
        c += Amount::new(10);
        assert_eq!(c.value(), 554);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Amount::new(i64::MAX);
        assert_eq!(max.checked_add(Amount::new(1)), None);
        assert_eq!(Amount::new(i64::MIN).checked_sub(Amount::new(1)), None);
        assert_eq!(
            Amount::new(5).checked_sub(Amount::new(7)),
            Some(Amount::new(-2))
        );
    }

    #[test]
    fn test_sum() {
        let total: Amount = [1, 2, 3, -10].into_iter().map(Amount::new).sum();
        assert_eq!(total, Amount::new(-4));
        assert!(total.is_negative());
    }

    #[test]
    fn test_serde_is_transparent() {
        let json = serde_json::to_string(&Amount::new(-12)).unwrap();
        assert_eq!(json, "-12");

        let parsed: Amount = serde_json::from_str("123").unwrap();
        assert_eq!(parsed, Amount::new(123));
    }
}
