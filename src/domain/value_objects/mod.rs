//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`DealIndex`]: registry key of a deal
//! - [`EventId`]: domain event identifier
//! - [`Address`], [`ContentHash`]: on-chain account and asset references
//!
//! ## Numeric Types
//!
//! - [`TokenAmount`]: non-negative token quantity at 18-decimal precision
//! - [`Percent`]: whole percentage in `[0, 100]`
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`], [`CheckedArithmetic`], [`Rounding`]

pub mod arithmetic;
pub mod asset;
pub mod ids;
pub mod percent;
pub mod timestamp;
pub mod token_amount;

pub use arithmetic::{
    round_to_precision, ArithmeticError, ArithmeticResult, CheckedArithmetic, Rounding,
};
pub use asset::{Asset, InvalidSwapPathError, SwapPath};
pub use ethers::types::Address;
pub use ids::{DealIndex, EventId};
pub use percent::{InvalidPercentError, Percent};
pub use timestamp::Timestamp;
pub use token_amount::{TokenAmount, MAX_WHOLE_TOKENS, TOKEN_DECIMALS};

/// Opaque 32-byte reference to the licensed data asset.
pub type ContentHash = ethers::types::H256;
