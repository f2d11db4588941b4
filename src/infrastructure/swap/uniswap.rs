//! # Uniswap V2 Gateway
//!
//! [`SwapGateway`] backed by a Uniswap-V2-style router contract through
//! ethers-rs bindings.
//!
//! Amounts cross the boundary as 18-decimal integer units: a
//! [`TokenAmount`] of `1.5` is `1_500_000_000_000_000_000` on chain.
//! Quotes map to `getAmountsIn` / `getAmountsOut`; swaps simulate
//! `swapExactTokensForTokens` with `call` first (so slippage and deadline
//! reverts surface without spending gas) and then send it.

use crate::domain::value_objects::{Address, SwapPath, TokenAmount, MAX_WHOLE_TOKENS, TOKEN_DECIMALS};
use crate::infrastructure::swap::error::{SwapError, SwapResult};
use crate::infrastructure::swap::traits::{SwapGateway, SwapOrder, SwapReceipt};
use async_trait::async_trait;
use ethers::prelude::{Http, Middleware, Provider, U256};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::debug;

#[allow(missing_docs)]
mod bindings {
    use ethers::contract::abigen;

    abigen!(
        UniswapV2Router,
        r#"[
            function getAmountsIn(uint256 amountOut, address[] path) external view returns (uint256[] amounts)
            function getAmountsOut(uint256 amountIn, address[] path) external view returns (uint256[] amounts)
            function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] path, address to, uint256 deadline) external returns (uint256[] amounts)
        ]"#
    );
}

pub use bindings::UniswapV2Router;

/// Converts a token amount to 18-decimal integer units.
///
/// # Errors
///
/// Returns `SwapError::Conversion` if the amount does not fit.
pub fn to_base_units(amount: TokenAmount) -> SwapResult<U256> {
    let value = amount.as_decimal();
    let mantissa = u128::try_from(value.mantissa())
        .map_err(|_| SwapError::conversion(format!("negative amount {value}")))?;
    let exponent = TOKEN_DECIMALS
        .checked_sub(value.scale())
        .ok_or_else(|| SwapError::conversion(format!("{value} exceeds token precision")))?;
    U256::from(mantissa)
        .checked_mul(U256::exp10(exponent as usize))
        .ok_or_else(|| SwapError::conversion(format!("{value} overflows uint256")))
}

/// Converts 18-decimal integer units to a token amount.
///
/// # Errors
///
/// Returns `SwapError::Conversion` above [`MAX_WHOLE_TOKENS`] whole tokens,
/// the range limit of [`TokenAmount`].
pub fn from_base_units(units: U256) -> SwapResult<TokenAmount> {
    let out_of_range = || {
        SwapError::conversion(format!(
            "{units} base units exceed the token amount range of {MAX_WHOLE_TOKENS} whole tokens"
        ))
    };
    if units > U256::from(i128::MAX as u128) {
        return Err(out_of_range());
    }
    let raw = i128::try_from(units.as_u128()).map_err(|_| out_of_range())?;
    let value =
        Decimal::try_from_i128_with_scale(raw, TOKEN_DECIMALS).map_err(|_| out_of_range())?;
    TokenAmount::new(value).map_err(|e| SwapError::conversion(e.to_string()))
}

fn convert_all(amounts: Vec<U256>) -> SwapResult<Vec<TokenAmount>> {
    amounts.into_iter().map(from_base_units).collect()
}

/// Swap gateway talking to an on-chain Uniswap V2 router.
#[derive(Debug)]
pub struct UniswapV2Gateway<M> {
    router: UniswapV2Router<M>,
}

impl<M: Middleware + 'static> UniswapV2Gateway<M> {
    /// Binds the router at `address` to `client`.
    ///
    /// `client` must carry a signer for [`SwapGateway::swap_exact_in`].
    #[must_use]
    pub fn new(address: Address, client: Arc<M>) -> Self {
        Self {
            router: UniswapV2Router::new(address, client),
        }
    }
}

impl UniswapV2Gateway<Provider<Http>> {
    /// Creates a quote-only gateway over an HTTP provider.
    ///
    /// # Errors
    ///
    /// Returns `SwapError::Connection` if the RPC URL is invalid.
    pub fn connect(rpc_url: &str, address: Address) -> SwapResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| SwapError::connection(e.to_string()))?;
        Ok(Self::new(address, Arc::new(provider)))
    }
}

#[async_trait]
impl<M: Middleware + 'static> SwapGateway for UniswapV2Gateway<M> {
    fn router(&self) -> Address {
        self.router.address()
    }

    async fn amounts_in(
        &self,
        amount_out: TokenAmount,
        path: &SwapPath,
    ) -> SwapResult<Vec<TokenAmount>> {
        let amounts = self
            .router
            .get_amounts_in(to_base_units(amount_out)?, path.hops().to_vec())
            .call()
            .await
            .map_err(|e| SwapError::quote_unavailable(e.to_string()))?;
        debug!(%amount_out, hops = path.hops().len(), "quoted getAmountsIn");
        convert_all(amounts)
    }

    async fn amounts_out(
        &self,
        amount_in: TokenAmount,
        path: &SwapPath,
    ) -> SwapResult<Vec<TokenAmount>> {
        let amounts = self
            .router
            .get_amounts_out(to_base_units(amount_in)?, path.hops().to_vec())
            .call()
            .await
            .map_err(|e| SwapError::quote_unavailable(e.to_string()))?;
        debug!(%amount_in, hops = path.hops().len(), "quoted getAmountsOut");
        convert_all(amounts)
    }

    async fn swap_exact_in(&self, order: &SwapOrder) -> SwapResult<SwapReceipt> {
        let deadline = u64::try_from(order.deadline.timestamp_secs())
            .map_err(|_| SwapError::invalid_request("deadline before epoch"))?;
        let call = self.router.swap_exact_tokens_for_tokens(
            to_base_units(order.amount_in)?,
            to_base_units(order.min_amount_out)?,
            order.path.hops().to_vec(),
            order.recipient,
            U256::from(deadline),
        );

        let simulated = call
            .call()
            .await
            .map_err(|e| SwapError::rejected("simulation", e.to_string()))?;
        let amount_out = simulated
            .last()
            .copied()
            .map(from_base_units)
            .transpose()?
            .ok_or_else(|| SwapError::rejected("simulation", "router returned no amounts"))?;

        let pending = call
            .send()
            .await
            .map_err(|e| SwapError::rejected("send", e.to_string()))?;
        let receipt = pending
            .await
            .map_err(|e| SwapError::connection(e.to_string()))?
            .ok_or_else(|| SwapError::rejected("receipt", "transaction dropped"))?;

        Ok(SwapReceipt {
            amount_in: order.amount_in,
            amount_out,
            tx_hash: Some(receipt.transaction_hash),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn whole_tokens_scale_by_eighteen() {
        let units = to_base_units(TokenAmount::from_units(2)).unwrap();
        assert_eq!(units, U256::exp10(18) * 2);
    }

    #[test]
    fn fractional_tokens_keep_precision() {
        let amount = TokenAmount::new(Decimal::new(11_115, 1)).unwrap();
        let units = to_base_units(amount).unwrap();
        assert_eq!(units, U256::from(11_115u64) * U256::exp10(17));
        assert_eq!(from_base_units(units).unwrap(), amount);
    }

    #[test]
    fn smallest_unit_roundtrips() {
        let amount = from_base_units(U256::one()).unwrap();
        assert_eq!(amount.as_decimal(), Decimal::new(1, 18));
        assert_eq!(to_base_units(amount).unwrap(), U256::one());
    }

    #[test]
    fn oversized_units_rejected() {
        assert!(from_base_units(U256::MAX).is_err());
    }

    #[test]
    fn range_limit_is_max_whole_tokens() {
        let at_limit = U256::from(MAX_WHOLE_TOKENS) * U256::exp10(18);
        assert_eq!(
            from_base_units(at_limit).unwrap(),
            TokenAmount::from_units(MAX_WHOLE_TOKENS)
        );

        let above = U256::from(MAX_WHOLE_TOKENS + 1) * U256::exp10(18);
        let err = from_base_units(above).unwrap_err();
        assert!(matches!(err, SwapError::Conversion(_)));
        assert!(err.to_string().contains("79228162514 whole tokens"));
    }

    #[test]
    fn gateway_reports_router_address() {
        let address = Address::repeat_byte(0x42);
        let gateway = UniswapV2Gateway::connect("http://localhost:8545", address).unwrap();
        assert_eq!(gateway.router(), address);
    }
}
