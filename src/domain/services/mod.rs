//! # Domain Services
//!
//! Domain logic that doesn't naturally belong to a single entity.
//!
//! ## Services
//!
//! - [`settlement_calculator`]: payout and refund plan computation

pub mod settlement_calculator;

pub use settlement_calculator::{
    min_amount_out, seller_commission, PayoutPlan, RefundPlan, SettlementPlan,
};
