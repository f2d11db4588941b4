//! # Percent
//!
//! Whole-number percentage in `[0, 100]`, used for commission bases and the
//! swap slippage tolerance.

use crate::domain::value_objects::arithmetic::{ArithmeticResult, CheckedArithmetic, Rounding};
use crate::domain::value_objects::token_amount::TokenAmount;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a percentage exceeds 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("percentage out of range: {0} (must be 0..=100)")]
pub struct InvalidPercentError(pub u32);

/// A whole-number percentage between 0 and 100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Percent(u8);

impl Percent {
    /// 0%.
    pub const ZERO: Self = Self(0);
    /// 100%.
    pub const HUNDRED: Self = Self(100);

    /// Creates a percentage.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPercentError`] if `value > 100`.
    pub fn new(value: u32) -> Result<Self, InvalidPercentError> {
        match u8::try_from(value) {
            Ok(v) if v <= 100 => Ok(Self(v)),
            _ => Err(InvalidPercentError(value)),
        }
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Returns `100 - self`.
    #[inline]
    #[must_use]
    pub fn complement(self) -> Self {
        Self(100 - self.0)
    }

    /// Applies this percentage to an amount, rounding to token precision.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use data_deal_escrow::domain::value_objects::{Percent, Rounding, TokenAmount};
    ///
    /// let price = TokenAmount::from_units(1_000);
    /// let seller = Percent::new(20).unwrap().complement();
    /// assert_eq!(seller.of(price, Rounding::Down).unwrap(), TokenAmount::from_units(800));
    /// ```
    pub fn of(self, amount: TokenAmount, rounding: Rounding) -> ArithmeticResult<TokenAmount> {
        let scaled = amount
            .as_decimal()
            .safe_mul(Decimal::from(self.0))?
            .safe_div(Decimal::ONE_HUNDRED)?;
        TokenAmount::from_decimal_rounded(scaled, rounding)
    }
}

impl TryFrom<u32> for Percent {
    type Error = InvalidPercentError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for u32 {
    fn from(p: Percent) -> Self {
        u32::from(p.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}
