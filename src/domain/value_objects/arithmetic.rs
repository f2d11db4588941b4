//! # Checked Arithmetic
//!
//! Overflow-aware decimal math underneath [`TokenAmount`] and [`Percent`].
//!
//! Settlement math never rounds in favour of the staking pool or the
//! platform: shares are rounded [`Rounding::Down`] to token precision and
//! the dust stays with the residual recipient. Swap inputs quoted from an
//! output are rounded [`Rounding::Up`].
//!
//! [`TokenAmount`]: crate::domain::value_objects::TokenAmount
//! [`Percent`]: crate::domain::value_objects::Percent
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::domain::value_objects::arithmetic::{ArithmeticError, CheckedArithmetic};
//! use rust_decimal::Decimal;
//!
//! let price = Decimal::new(1_000, 0);
//! assert_eq!(price.safe_div(Decimal::ZERO), Err(ArithmeticError::DivisionByZero));
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of a checked operation on amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Result exceeds the decimal range.
    #[error("arithmetic overflow")]
    Overflow,

    /// Result would be negative.
    #[error("arithmetic underflow")]
    Underflow,

    /// Zero divisor.
    #[error("division by zero")]
    DivisionByZero,

    /// Value outside the domain of the target type.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Direction used when dropping digits beyond token precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Toward zero.
    Down,
    /// Away from zero.
    Up,
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Down => "down",
            Self::Up => "up",
        })
    }
}

/// Cuts `value` to `decimals` fractional digits in the given direction.
///
/// ```
/// use data_deal_escrow::domain::value_objects::arithmetic::{round_to_precision, Rounding};
/// use rust_decimal::Decimal;
///
/// let share = Decimal::new(11_115, 1); // 1111.5
/// assert_eq!(round_to_precision(share, 0, Rounding::Down), Decimal::new(1_111, 0));
/// assert_eq!(round_to_precision(share, 0, Rounding::Up), Decimal::new(1_112, 0));
/// ```
#[inline]
#[must_use]
pub fn round_to_precision(value: Decimal, decimals: u32, rounding: Rounding) -> Decimal {
    let strategy = match rounding {
        Rounding::Down => RoundingStrategy::ToZero,
        Rounding::Up => RoundingStrategy::AwayFromZero,
    };
    value.round_dp_with_strategy(decimals, strategy)
}

/// `Result`-returning counterparts of the arithmetic operators.
pub trait CheckedArithmetic: Sized {
    /// `self + rhs`.
    ///
    /// # Errors
    ///
    /// `ArithmeticError::Overflow` outside the representable range.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// `self - rhs`.
    ///
    /// # Errors
    ///
    /// `ArithmeticError::Underflow` outside the representable range.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// `self * rhs`.
    ///
    /// # Errors
    ///
    /// `ArithmeticError::Overflow` outside the representable range.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// `self / rhs`.
    ///
    /// # Errors
    ///
    /// `ArithmeticError::DivisionByZero` for a zero divisor.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod precision {
        use super::*;

        #[test]
        fn down_drops_excess_digits() {
            let value = Decimal::new(1_111_555, 3);
            assert_eq!(
                round_to_precision(value, 2, Rounding::Down),
                Decimal::new(111_155, 2)
            );
        }

        #[test]
        fn up_bumps_excess_digits() {
            let value = Decimal::new(1_111_551, 3);
            assert_eq!(
                round_to_precision(value, 2, Rounding::Up),
                Decimal::new(111_156, 2)
            );
        }

        #[test]
        fn token_precision_keeps_half_units() {
            let value = Decimal::new(11_115, 1);
            assert_eq!(round_to_precision(value, 18, Rounding::Down), value);
            assert_eq!(round_to_precision(value, 18, Rounding::Up), value);
        }
    }

    mod checked {
        use super::*;

        #[test]
        fn remainder_after_required() {
            let held = Decimal::new(20_000, 0);
            let required = Decimal::new(17_777, 0);
            assert_eq!(held.safe_sub(required).unwrap(), Decimal::new(2_223, 0));
        }

        #[test]
        fn mul_overflow() {
            assert_eq!(
                Decimal::MAX.safe_mul(Decimal::TWO),
                Err(ArithmeticError::Overflow)
            );
        }

        #[test]
        fn div_by_zero() {
            assert_eq!(
                Decimal::ONE_HUNDRED.safe_div(Decimal::ZERO),
                Err(ArithmeticError::DivisionByZero)
            );
        }

        #[test]
        fn error_messages() {
            assert_eq!(ArithmeticError::Underflow.to_string(), "arithmetic underflow");
            assert_eq!(
                ArithmeticError::InvalidValue("negative").to_string(),
                "invalid value: negative"
            );
        }
    }
}
