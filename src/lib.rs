//! # Data Deal Escrow
//!
//! Escrow and settlement engine for data-licensing deals between a buyer and
//! a seller, brokered by a platform.
//!
//! A buyer's payment arrives in custody as a stable token. Creating a deal
//! swaps it into a utility token that is held for a lock window, during
//! which the buyer may decline or re-accept. Once the window elapses the
//! deal settles exactly once:
//!
//! - **payout**: the seller commission is realised in stable tokens for the
//!   payout relay and the utility remainder is split between the staking
//!   pool and the platform beneficiary, compensating for price drift since
//!   creation
//! - **decline settlement**: the full price is refunded in stable tokens
//!
//! # Layers
//!
//! - [`domain`]: deal aggregate, value objects, events, settlement calculator
//! - [`application`]: the [`DealEngine`](application::services::DealEngine)
//!   and its errors
//! - [`infrastructure`]: registry, custody ledger, swap gateways, clock
//! - [`config`]: engine configuration
//! - [`telemetry`]: tracing subscriber setup
//!
//! # Example
//!
//! ```
//! use data_deal_escrow::application::services::DealEngine;
//! use data_deal_escrow::config::EngineConfig;
//! use data_deal_escrow::domain::entities::DealTerms;
//! use data_deal_escrow::domain::value_objects::{
//!     Address, Asset, ContentHash, Percent, TokenAmount,
//! };
//! use data_deal_escrow::infrastructure::clock::SystemClock;
//! use data_deal_escrow::infrastructure::swap::ScriptedSwapGateway;
//! use rust_decimal::Decimal;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let owner = Address::repeat_byte(0x0a);
//! let config = EngineConfig::builder(Address::repeat_byte(1), Address::repeat_byte(2))
//!     .payout_relay(Address::repeat_byte(3))
//!     .staking_pool(Address::repeat_byte(4))
//!     .build()?;
//! let gateway = Arc::new(ScriptedSwapGateway::new(Address::repeat_byte(5)).with_rate(Decimal::from(20)));
//! let engine = DealEngine::new(owner, config, gateway, Arc::new(SystemClock))?;
//!
//! engine
//!     .receive_deposit(Address::repeat_byte(6), Asset::Stable, TokenAmount::from_units(1_000))
//!     .await?;
//! let index = engine
//!     .create_deal(
//!         owner,
//!         DealTerms {
//!             external_id: "did:databroker:deal1:weatherdata".to_string(),
//!             buyer: Address::repeat_byte(6),
//!             seller: Address::repeat_byte(7),
//!             content_hash: ContentHash::zero(),
//!             price_amount: TokenAmount::from_units(1_000),
//!             min_utility_amount: TokenAmount::from_units(19_000),
//!             commission_basis_a: Percent::new(20)?,
//!             commission_basis_b: Percent::new(50)?,
//!             lock_duration_secs: 1_296_000,
//!             platform_beneficiary: Address::repeat_byte(8),
//!         },
//!     )
//!     .await?;
//!
//! let deal = engine.get_deal(index).await?;
//! assert_eq!(deal.utility_allocated(), TokenAmount::from_units(20_000));
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
