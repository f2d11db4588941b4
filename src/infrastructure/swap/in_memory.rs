//! # Scripted Swap Gateway
//!
//! In-memory [`SwapGateway`] for tests and offline previews.
//!
//! Quotes follow a fixed exchange rate unless a test scripts an exact
//! response, the way venue mocks pin `getAmountsIn`/`getAmountsOut`.
//! Executed orders are recorded for inspection.

use crate::domain::value_objects::{Address, Rounding, SwapPath, TokenAmount};
use crate::domain::value_objects::arithmetic::CheckedArithmetic;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::swap::error::{SwapError, SwapResult};
use crate::infrastructure::swap::traits::{SwapGateway, SwapOrder, SwapReceipt};
use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Script {
    rate: Decimal,
    amounts_in: Option<TokenAmount>,
    amounts_out: Option<TokenAmount>,
    quote_failure: Option<SwapError>,
    swap_failure: Option<SwapError>,
    executed: Vec<SwapOrder>,
}

/// Scripted in-memory swap venue.
#[derive(Debug)]
pub struct ScriptedSwapGateway {
    router: Address,
    script: Mutex<Script>,
    clock: Option<Arc<dyn Clock>>,
}

impl ScriptedSwapGateway {
    /// Creates a gateway quoting one output unit per input unit.
    #[must_use]
    pub fn new(router: Address) -> Self {
        Self {
            router,
            script: Mutex::new(Script {
                rate: Decimal::ONE,
                amounts_in: None,
                amounts_out: None,
                quote_failure: None,
                swap_failure: None,
                executed: Vec::new(),
            }),
            clock: None,
        }
    }

    /// Sets the output-per-input exchange rate. Non-positive rates are ignored.
    #[must_use]
    pub fn with_rate(self, rate: Decimal) -> Self {
        if rate > Decimal::ZERO {
            self.script.lock().rate = rate;
        }
        self
    }

    /// Enforces swap deadlines against `clock`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Pins the total input every `amounts_in` quote reports.
    pub fn script_amounts_in(&self, amount: TokenAmount) {
        self.script.lock().amounts_in = Some(amount);
    }

    /// Pins the final output every `amounts_out` quote and swap reports.
    pub fn script_amounts_out(&self, amount: TokenAmount) {
        self.script.lock().amounts_out = Some(amount);
    }

    /// Makes every quote fail with `error`.
    pub fn fail_quotes(&self, error: SwapError) {
        self.script.lock().quote_failure = Some(error);
    }

    /// Makes every swap fail with `error`.
    pub fn fail_swaps(&self, error: SwapError) {
        self.script.lock().swap_failure = Some(error);
    }

    /// Clears scripted failures.
    pub fn clear_failures(&self) {
        let mut script = self.script.lock();
        script.quote_failure = None;
        script.swap_failure = None;
    }

    /// Orders executed so far.
    #[must_use]
    pub fn executed(&self) -> Vec<SwapOrder> {
        self.script.lock().executed.clone()
    }

    fn hops(first: TokenAmount, last: TokenAmount, path: &SwapPath) -> Vec<TokenAmount> {
        let mut amounts = vec![first; path.hops().len().saturating_sub(1)];
        amounts.push(last);
        amounts
    }

    fn output_for(script: &Script, amount_in: TokenAmount) -> SwapResult<TokenAmount> {
        if let Some(pinned) = script.amounts_out {
            return Ok(pinned);
        }
        let raw = amount_in
            .as_decimal()
            .safe_mul(script.rate)
            .map_err(|e| SwapError::conversion(e.to_string()))?;
        TokenAmount::from_decimal_rounded(raw, Rounding::Down)
            .map_err(|e| SwapError::conversion(e.to_string()))
    }

    fn input_for(script: &Script, amount_out: TokenAmount) -> SwapResult<TokenAmount> {
        if let Some(pinned) = script.amounts_in {
            return Ok(pinned);
        }
        let raw = amount_out
            .as_decimal()
            .safe_div(script.rate)
            .map_err(|e| SwapError::conversion(e.to_string()))?;
        TokenAmount::from_decimal_rounded(raw, Rounding::Up)
            .map_err(|e| SwapError::conversion(e.to_string()))
    }
}

#[async_trait]
impl SwapGateway for ScriptedSwapGateway {
    fn router(&self) -> Address {
        self.router
    }

    async fn amounts_in(
        &self,
        amount_out: TokenAmount,
        path: &SwapPath,
    ) -> SwapResult<Vec<TokenAmount>> {
        let script = self.script.lock();
        if let Some(error) = &script.quote_failure {
            return Err(error.clone());
        }
        let required = Self::input_for(&script, amount_out)?;
        Ok(Self::hops(required, amount_out, path))
    }

    async fn amounts_out(
        &self,
        amount_in: TokenAmount,
        path: &SwapPath,
    ) -> SwapResult<Vec<TokenAmount>> {
        let script = self.script.lock();
        if let Some(error) = &script.quote_failure {
            return Err(error.clone());
        }
        let output = Self::output_for(&script, amount_in)?;
        Ok(Self::hops(amount_in, output, path))
    }

    async fn swap_exact_in(&self, order: &SwapOrder) -> SwapResult<SwapReceipt> {
        let mut script = self.script.lock();
        if let Some(error) = &script.swap_failure {
            return Err(error.clone());
        }
        if order.amount_in.is_zero() {
            return Err(SwapError::invalid_request("swap input must be positive"));
        }
        let expired = self
            .clock
            .as_ref()
            .is_some_and(|clock| clock.now() > order.deadline);
        if expired {
            return Err(SwapError::DeadlineExpired {
                deadline: order.deadline,
            });
        }

        let amount_out = Self::output_for(&script, order.amount_in)?;
        if amount_out < order.min_amount_out {
            return Err(SwapError::SlippageExceeded {
                min_out: order.min_amount_out,
                actual: amount_out,
            });
        }

        script.executed.push(order.clone());
        Ok(SwapReceipt {
            amount_in: order.amount_in,
            amount_out,
            tx_hash: None,
        })
    }
}
