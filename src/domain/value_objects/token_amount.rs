//! # Token Amount Value Object
//!
//! Non-negative quantity of a fungible token, expressed in whole-token units
//! with at most [`TOKEN_DECIMALS`] fractional digits.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::domain::value_objects::TokenAmount;
//!
//! let held = TokenAmount::from_units(20_000);
//! let required = TokenAmount::from_units(17_777);
//!
//! assert_eq!(held.saturating_sub(required), TokenAmount::from_units(2_223));
//! assert!(required.saturating_sub(held).is_zero());
//! ```

use crate::domain::value_objects::arithmetic::{
    round_to_precision, ArithmeticError, ArithmeticResult, CheckedArithmetic, Rounding,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fractional precision of both settlement tokens.
pub const TOKEN_DECIMALS: u32 = 18;

/// Largest whole-token count representable at full [`TOKEN_DECIMALS`]
/// precision: the 96-bit decimal mantissa divided by `10^18`.
pub const MAX_WHOLE_TOKENS: u64 = 79_228_162_514;

/// A non-negative token quantity.
///
/// # Invariants
///
/// - Never negative
/// - At most [`TOKEN_DECIMALS`] fractional digits
///
/// # Range
///
/// An amount carrying all 18 fractional digits tops out just above
/// [`MAX_WHOLE_TOKENS`] whole tokens. Larger on-chain values, such as an
/// 18-decimal router quote above that bound, cannot be represented and are
/// rejected at the venue boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct TokenAmount(Decimal);

impl TokenAmount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative or
    /// carries more than [`TOKEN_DECIMALS`] fractional digits.
    pub fn new(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue("token amount must not be negative"));
        }
        if value.scale() > TOKEN_DECIMALS && value.normalize().scale() > TOKEN_DECIMALS {
            return Err(ArithmeticError::InvalidValue(
                "token amount exceeds token precision",
            ));
        }
        Ok(Self(value.normalize()))
    }

    /// Creates an amount of whole tokens.
    #[must_use]
    pub fn from_units(units: u64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates an amount from a decimal, rounding to token precision.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative.
    pub fn from_decimal_rounded(value: Decimal, rounding: Rounding) -> ArithmeticResult<Self> {
        Self::new(round_to_precision(value, TOKEN_DECIMALS, rounding))
    }

    /// Returns the amount as a decimal.
    #[inline]
    #[must_use]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Adds two amounts.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn checked_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.0.safe_add(rhs.0).map(Self)
    }

    /// Subtracts `rhs`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Underflow` if `rhs` is larger.
    pub fn checked_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.0 > self.0 {
            return Err(ArithmeticError::Underflow);
        }
        self.0.safe_sub(rhs.0).map(Self)
    }

    /// Subtracts `rhs`, flooring at zero.
    #[must_use]
    pub fn saturating_sub(self, rhs: Self) -> Self {
        self.checked_sub(rhs).unwrap_or(Self::ZERO)
    }
}

impl TryFrom<Decimal> for TokenAmount {
    type Error = ArithmeticError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TokenAmount> for Decimal {
    fn from(amount: TokenAmount) -> Self {
        amount.0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod construction {
        use super::*;

        #[test]
        fn rejects_negative() {
            assert!(TokenAmount::new(Decimal::NEGATIVE_ONE).is_err());
        }

        #[test]
        fn rejects_excess_precision() {
            let tiny = Decimal::new(1, 20);
            assert!(TokenAmount::new(tiny).is_err());
        }

        #[test]
        fn accepts_trailing_zero_scale() {
            let value = Decimal::new(11_115_000, 4);
            let amount = TokenAmount::new(value).unwrap();
            assert_eq!(amount.as_decimal(), Decimal::new(11_115, 1));
        }

        #[test]
        fn from_decimal_rounded_truncates() {
            let value = Decimal::new(1, 20);
            let amount = TokenAmount::from_decimal_rounded(value, Rounding::Down).unwrap();
            assert!(amount.is_zero());
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn checked_sub_underflows() {
            let a = TokenAmount::from_units(1);
            let b = TokenAmount::from_units(2);
            assert_eq!(a.checked_sub(b), Err(ArithmeticError::Underflow));
            assert_eq!(a.saturating_sub(b), TokenAmount::ZERO);
        }

        #[test]
        fn checked_add_sums() {
            let a = TokenAmount::from_units(16_000);
            let b = TokenAmount::from_units(4_000);
            assert_eq!(a.checked_add(b).unwrap(), TokenAmount::from_units(20_000));
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn deserialize_rejects_negative() {
            let result: Result<TokenAmount, _> = serde_json::from_str("\"-1\"");
            assert!(result.is_err());
        }

        #[test]
        fn serde_roundtrip() {
            let amount = TokenAmount::new(Decimal::new(27_275, 1)).unwrap();
            let json = serde_json::to_string(&amount).unwrap();
            let back: TokenAmount = serde_json::from_str(&json).unwrap();
            assert_eq!(amount, back);
        }
    }
}
