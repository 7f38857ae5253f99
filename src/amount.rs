//! Monetary amounts in integer minor units.
//!
//! All ledger rows carry amounts as whole minor units (e.g. cents), so
//! arithmetic is exact and the wire representation is a plain integer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A monetary amount in minor currency units.
///
/// Signed: derived balances and history rows subtract debits, so
/// intermediate values (and history amounts for outgoing events) may be
/// negative even though every stored event amount is positive.
///
/// # Examples
///
/// ```
/// use balance_engine::Amount;
///
/// let a = Amount::new(100);
/// let b = Amount::new(40);
/// assert_eq!((a - b).get(), 60);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero value.
    pub const ZERO: Self = Amount(0);

    /// Creates an amount from a raw minor-unit count.
    pub const fn new(units: i64) -> Self {
        Amount(units)
    }

    /// Returns the raw minor-unit count.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns `true` if this amount is strictly positive.
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if this amount is zero.
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Amount {
        iter.fold(Amount::ZERO, Add::add)
    }
}
