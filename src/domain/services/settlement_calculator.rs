//! # Settlement Calculator
//!
//! Pure computation of the two terminal settlement plans.
//!
//! # Payout
//!
//! ```text
//! seller_commission = price × (100 − A) / 100            (stable)
//! required          = amounts_in(seller_commission)      (utility, quoted)
//! remainder         = max(0, held − required)
//! staking_share     = ⌊remainder × B / 100⌋              (token precision)
//! platform_share    = remainder − staking_share
//! outflow           = required + remainder
//! ```
//!
//! When the utility token appreciated since creation, `required < held` and
//! the surplus is split between staking and platform. When it depreciated,
//! `required > held`, nothing is split, and the shortfall is drawn from
//! general utility custody.
//!
//! # Refund
//!
//! The buyer gets back the full stable price: `required = amounts_in(price)`,
//! no commissions.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::domain::services::settlement_calculator::PayoutPlan;
//! use data_deal_escrow::domain::value_objects::{Percent, TokenAmount};
//!
//! let plan = PayoutPlan::compute(
//!     TokenAmount::from_units(800),
//!     TokenAmount::from_units(20_000),
//!     TokenAmount::from_units(16_000),
//!     Percent::new(50).unwrap(),
//! )
//! .unwrap();
//!
//! assert_eq!(plan.staking_share, TokenAmount::from_units(2_000));
//! assert_eq!(plan.platform_share, TokenAmount::from_units(2_000));
//! assert_eq!(plan.total_utility_outflow, TokenAmount::from_units(20_000));
//! ```

use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{ArithmeticResult, Percent, Rounding, TokenAmount};
use serde::{Deserialize, Serialize};

/// Stable-token amount owed to the seller: `price × (100 − A) / 100`.
///
/// # Errors
///
/// Returns an arithmetic error on overflow.
pub fn seller_commission(price: TokenAmount, basis_a: Percent) -> DomainResult<TokenAmount> {
    Ok(basis_a.complement().of(price, Rounding::Down)?)
}

/// Minimum acceptable swap output given a quote and a slippage tolerance.
///
/// # Errors
///
/// Returns an arithmetic error on overflow.
pub fn min_amount_out(quoted_out: TokenAmount, slippage: Percent) -> ArithmeticResult<TokenAmount> {
    slippage.complement().of(quoted_out, Rounding::Down)
}

/// Computed payout settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutPlan {
    /// Stable tokens the seller must receive.
    pub seller_commission: TokenAmount,
    /// Utility tokens allocated to the deal at creation.
    pub held: TokenAmount,
    /// Utility tokens to sell for the seller commission.
    pub required: TokenAmount,
    /// `max(0, held − required)`.
    pub remainder: TokenAmount,
    /// Utility tokens to the staking pool.
    pub staking_share: TokenAmount,
    /// Utility tokens to the platform beneficiary.
    pub platform_share: TokenAmount,
    /// `max(0, required − held)`, drawn from general custody.
    pub shortfall: TokenAmount,
    /// `required + remainder`.
    pub total_utility_outflow: TokenAmount,
}

impl PayoutPlan {
    /// Builds a payout plan from the quoted `required` amount.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn compute(
        seller_commission: TokenAmount,
        held: TokenAmount,
        required: TokenAmount,
        basis_b: Percent,
    ) -> DomainResult<Self> {
        let remainder = held.saturating_sub(required);
        let staking_share = basis_b.of(remainder, Rounding::Down)?;
        let platform_share = remainder.checked_sub(staking_share)?;

        Ok(Self {
            seller_commission,
            held,
            required,
            remainder,
            staking_share,
            platform_share,
            shortfall: required.saturating_sub(held),
            total_utility_outflow: required.checked_add(remainder)?,
        })
    }
}

/// Computed decline refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPlan {
    /// Stable tokens the buyer must receive (the full price).
    pub refund: TokenAmount,
    /// Utility tokens allocated to the deal at creation.
    pub held: TokenAmount,
    /// Utility tokens to sell for the refund.
    pub required: TokenAmount,
    /// `max(0, required − held)`, drawn from general custody.
    pub shortfall: TokenAmount,
    /// Equal to `required`; nothing is distributed.
    pub total_utility_outflow: TokenAmount,
}

impl RefundPlan {
    /// Builds a refund plan from the quoted `required` amount.
    #[must_use]
    pub fn compute(refund: TokenAmount, held: TokenAmount, required: TokenAmount) -> Self {
        Self {
            refund,
            held,
            required,
            shortfall: required.saturating_sub(held),
            total_utility_outflow: required,
        }
    }
}

/// Either terminal settlement plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum SettlementPlan {
    /// Accepted deal.
    Payout(PayoutPlan),
    /// Declined deal.
    Refund(RefundPlan),
}

impl SettlementPlan {
    /// Utility tokens this plan moves out of custody.
    #[must_use]
    pub fn total_utility_outflow(&self) -> TokenAmount {
        match self {
            Self::Payout(plan) => plan.total_utility_outflow,
            Self::Refund(plan) => plan.total_utility_outflow,
        }
    }

    /// Utility tokens this plan sells through the swap venue.
    #[must_use]
    pub fn utility_to_sell(&self) -> TokenAmount {
        match self {
            Self::Payout(plan) => plan.required,
            Self::Refund(plan) => plan.required,
        }
    }

    /// Stable tokens the swap must realise.
    #[must_use]
    pub fn stable_target(&self) -> TokenAmount {
        match self {
            Self::Payout(plan) => plan.seller_commission,
            Self::Refund(plan) => plan.refund,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn pct(value: u32) -> Percent {
        Percent::new(value).unwrap()
    }

    fn units(value: u64) -> TokenAmount {
        TokenAmount::from_units(value)
    }

    fn plan_for(required: u64) -> PayoutPlan {
        let commission = seller_commission(units(1_000), pct(20)).unwrap();
        PayoutPlan::compute(commission, units(20_000), units(required), pct(50)).unwrap()
    }

    mod seller_commission {
        use super::*;

        #[test]
        fn takes_complement_of_basis_a() {
            assert_eq!(seller_commission(units(1_000), pct(20)).unwrap(), units(800));
            assert_eq!(seller_commission(units(1_000), pct(0)).unwrap(), units(1_000));
            assert_eq!(seller_commission(units(1_000), pct(100)).unwrap(), units(0));
        }
    }

    mod payout {
        use super::*;

        #[test]
        fn appreciation_splits_evenly() {
            let plan = plan_for(16_000);
            assert_eq!(plan.remainder, units(4_000));
            assert_eq!(plan.staking_share, units(2_000));
            assert_eq!(plan.platform_share, units(2_000));
            assert!(plan.shortfall.is_zero());
        }

        #[test]
        fn odd_remainder_keeps_fraction() {
            let plan = plan_for(17_777);
            let half = TokenAmount::new(Decimal::new(11_115, 1)).unwrap();
            assert_eq!(plan.staking_share, half);
            assert_eq!(plan.platform_share, half);
            assert_eq!(plan.total_utility_outflow, units(20_000));
        }

        #[test]
        fn exact_match_distributes_nothing() {
            let plan = plan_for(20_000);
            assert!(plan.remainder.is_zero());
            assert!(plan.staking_share.is_zero());
            assert!(plan.platform_share.is_zero());
        }

        #[test]
        fn larger_appreciation() {
            let plan = plan_for(14_545);
            let half = TokenAmount::new(Decimal::new(27_275, 1)).unwrap();
            assert_eq!(plan.staking_share, half);
            assert_eq!(plan.platform_share, half);
        }

        #[test]
        fn depreciation_draws_shortfall() {
            let plan = plan_for(22_000);
            assert!(plan.remainder.is_zero());
            assert_eq!(plan.shortfall, units(2_000));
            assert_eq!(plan.total_utility_outflow, units(22_000));
        }

        #[test]
        fn staking_rounds_down_platform_takes_dust() {
            let held = TokenAmount::new(Decimal::new(1, 18)).unwrap();
            let plan = PayoutPlan::compute(units(1), held, units(0), pct(50)).unwrap();
            assert!(plan.staking_share.is_zero());
            assert_eq!(plan.platform_share, held);
        }
    }

    mod refund {
        use super::*;

        #[test]
        fn refund_moves_only_required() {
            let plan = RefundPlan::compute(units(1_000), units(20_000), units(20_000));
            assert_eq!(plan.total_utility_outflow, units(20_000));
            assert!(plan.shortfall.is_zero());

            let wrapped = SettlementPlan::Refund(plan);
            assert_eq!(wrapped.stable_target(), units(1_000));
            assert_eq!(wrapped.utility_to_sell(), units(20_000));
        }
    }

    mod slippage {
        use super::*;

        #[test]
        fn min_out_applies_tolerance() {
            assert_eq!(min_amount_out(units(800), pct(50)).unwrap(), units(400));
            assert_eq!(min_amount_out(units(800), pct(0)).unwrap(), units(800));
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn split_sums_to_remainder(
                held in 0u64..10_000_000,
                required in 0u64..10_000_000,
                b in 0u32..=100,
            ) {
                let plan = PayoutPlan::compute(units(1), units(held), units(required), pct(b)).unwrap();
                let distributed = plan.staking_share.checked_add(plan.platform_share).unwrap();
                prop_assert_eq!(distributed, plan.remainder);
                prop_assert!(plan.remainder <= units(held).saturating_sub(units(required)));
            }

            #[test]
            fn outflow_is_max_of_held_and_required(
                held in 0u64..10_000_000,
                required in 0u64..10_000_000,
            ) {
                let plan = PayoutPlan::compute(units(1), units(held), units(required), pct(50)).unwrap();
                prop_assert_eq!(plan.total_utility_outflow, units(held.max(required)));
            }
        }
    }
}
