//! # Swap Gateway Trait
//!
//! Port definition for the external swap venue.
//!
//! The engine needs three things from a venue: how much input a given
//! output costs ([`SwapGateway::amounts_in`]), how much output a given input
//! buys ([`SwapGateway::amounts_out`]), and an exact-input swap bounded by a
//! minimum output and a deadline ([`SwapGateway::swap_exact_in`]). Quotes
//! return one amount per path hop, matching Uniswap-V2 router semantics.
//!
//! # Examples
//!
//! ```ignore
//! use data_deal_escrow::infrastructure::swap::traits::SwapGateway;
//!
//! async fn required_utility(gateway: &dyn SwapGateway, path: &SwapPath) {
//!     let required = gateway.quote_in(TokenAmount::from_units(800), path).await?;
//! }
//! ```

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, SwapPath, TokenAmount};
use crate::infrastructure::swap::error::{SwapError, SwapResult};
use async_trait::async_trait;
use ethers::types::H256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A bounded exact-input swap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOrder {
    /// Exact input amount.
    pub amount_in: TokenAmount,
    /// Minimum acceptable output.
    pub min_amount_out: TokenAmount,
    /// Route, input token first.
    pub path: SwapPath,
    /// Receives the output tokens.
    pub recipient: Address,
    /// The venue rejects the swap after this instant.
    pub deadline: Timestamp,
}

/// Outcome of an executed swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapReceipt {
    /// Input consumed.
    pub amount_in: TokenAmount,
    /// Output delivered to the recipient.
    pub amount_out: TokenAmount,
    /// On-chain transaction, when the venue is a chain.
    pub tx_hash: Option<H256>,
}

/// Port for swap venue integrations.
#[async_trait]
pub trait SwapGateway: Send + Sync + fmt::Debug {
    /// Address identifying the venue (the router contract).
    fn router(&self) -> Address;

    /// Input amounts needed per hop to receive exactly `amount_out`.
    ///
    /// # Errors
    ///
    /// - `SwapError::QuoteUnavailable` - The venue cannot quote the path
    async fn amounts_in(&self, amount_out: TokenAmount, path: &SwapPath)
    -> SwapResult<Vec<TokenAmount>>;

    /// Output amounts per hop for exactly `amount_in`.
    ///
    /// # Errors
    ///
    /// - `SwapError::QuoteUnavailable` - The venue cannot quote the path
    async fn amounts_out(&self, amount_in: TokenAmount, path: &SwapPath)
    -> SwapResult<Vec<TokenAmount>>;

    /// Executes an exact-input swap.
    ///
    /// # Errors
    ///
    /// - `SwapError::SlippageExceeded` - Output below `min_amount_out`
    /// - `SwapError::DeadlineExpired` - Executed after `deadline`
    /// - `SwapError::Rejected` - Venue rejected the swap
    async fn swap_exact_in(&self, order: &SwapOrder) -> SwapResult<SwapReceipt>;

    /// First element of [`amounts_in`](Self::amounts_in): total input required.
    ///
    /// # Errors
    ///
    /// Propagates quote errors; `SwapError::QuoteUnavailable` on an empty quote.
    async fn quote_in(&self, amount_out: TokenAmount, path: &SwapPath) -> SwapResult<TokenAmount> {
        self.amounts_in(amount_out, path)
            .await?
            .first()
            .copied()
            .ok_or_else(|| SwapError::quote_unavailable("empty amounts_in quote"))
    }

    /// Last element of [`amounts_out`](Self::amounts_out): final output.
    ///
    /// # Errors
    ///
    /// Propagates quote errors; `SwapError::QuoteUnavailable` on an empty quote.
    async fn quote_out(&self, amount_in: TokenAmount, path: &SwapPath) -> SwapResult<TokenAmount> {
        self.amounts_out(amount_in, path)
            .await?
            .last()
            .copied()
            .ok_or_else(|| SwapError::quote_unavailable("empty amounts_out quote"))
    }
}
