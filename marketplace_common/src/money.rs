use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const BAHT_CURRENCY_CODE: &str = "THB";

/// An amount of money in minor currency units (satang). All arithmetic in the settlement pipeline is integer
/// arithmetic on this type; amounts only become fractional at display time.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let baht = self.0 as f64 / 100.0;
        write!(f, "฿{baht:0.2}")
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_baht(baht: i64) -> Self {
        Self(baht * 100)
    }

    /// The share of this amount given by a fee rate in basis points, truncated towards zero.
    pub fn basis_points(&self, bps: i64) -> Self {
        Self(self.0 * bps / 10_000)
    }
}

#[cfg(test)]
mod test {
    use super::Money;

    #[test]
    fn display_in_major_units() {
        assert_eq!(Money::from(123_450).to_string(), "฿1234.50");
        assert_eq!(Money::from_baht(90).to_string(), "฿90.00");
    }

    #[test]
    fn arithmetic() {
        let a = Money::from(600);
        let b = Money::from(400);
        assert_eq!(a + b, Money::from(1000));
        assert_eq!(a - b, Money::from(200));
        assert_eq!(a * 3, Money::from(1800));
        assert_eq!([a, b].into_iter().sum::<Money>(), Money::from(1000));
    }

    #[test]
    fn fee_shares() {
        // 10% platform fee
        assert_eq!(Money::from(100_000).basis_points(1000), Money::from(10_000));
        // truncation, never rounding up
        assert_eq!(Money::from(999).basis_points(1000), Money::from(99));
        assert_eq!(Money::from(0).basis_points(1000), Money::from(0));
    }
}
