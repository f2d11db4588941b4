//! # Engine Configuration
//!
//! Initialization parameters of the [`DealEngine`](crate::application::services::DealEngine).
//!
//! Loaded from `DEALS_`-prefixed environment variables (after an optional
//! `.env` file), from a config file, or built in code:
//!
//! | variable | field |
//! |---|---|
//! | `DEALS_STABLE_TOKEN` | [`EngineConfig::stable_token`] |
//! | `DEALS_UTILITY_TOKEN` | [`EngineConfig::utility_token`] |
//! | `DEALS_SWAP_ROUTER` | [`EngineConfig::swap_router`] |
//! | `DEALS_PAYOUT_RELAY` | [`EngineConfig::payout_relay`] |
//! | `DEALS_STAKING_POOL` | [`EngineConfig::staking_pool`] |
//! | `DEALS_INITIAL_ADMIN` | [`EngineConfig::initial_admin`] |
//! | `DEALS_CUSTODY_ACCOUNT` | [`EngineConfig::custody_account`] |
//! | `DEALS_SWAP_DEADLINE_SECS` | [`EngineConfig::swap_deadline_secs`] |
//! | `DEALS_SLIPPAGE_TOLERANCE` | [`EngineConfig::slippage_tolerance`] |
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::config::EngineConfig;
//! use data_deal_escrow::domain::value_objects::{Address, Percent};
//!
//! let config = EngineConfig::builder(Address::repeat_byte(1), Address::repeat_byte(2))
//!     .swap_router(Address::repeat_byte(3))
//!     .slippage_tolerance(Percent::new(30).unwrap())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.swap_deadline_secs, 1_200);
//! ```

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::value_objects::{Address, Percent, SwapPath};
use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DEALS";

/// Default swap deadline offset.
pub const DEFAULT_SWAP_DEADLINE_SECS: u64 = 1_200;

/// Default slippage tolerance.
pub const DEFAULT_SLIPPAGE_PERCENT: u32 = 50;

fn default_swap_deadline_secs() -> u64 {
    DEFAULT_SWAP_DEADLINE_SECS
}

fn default_slippage_tolerance() -> Percent {
    Percent::new(DEFAULT_SLIPPAGE_PERCENT).unwrap_or(Percent::HUNDRED)
}

/// Engine initialization parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Stable settlement token.
    pub stable_token: Address,
    /// Utility/reward token.
    pub utility_token: Address,
    /// Swap venue router.
    pub swap_router: Address,
    /// Receives stable tokens for the off-chain fiat payout.
    pub payout_relay: Address,
    /// Receives staking shares.
    pub staking_pool: Address,
    /// Holds admin alongside the deployer.
    pub initial_admin: Address,
    /// The engine's own account; receives creation-swap output.
    pub custody_account: Address,
    /// Offset added to "now" for swap deadlines.
    #[serde(default = "default_swap_deadline_secs")]
    pub swap_deadline_secs: u64,
    /// Maximum accepted shortfall of a swap output against its quote.
    #[serde(default = "default_slippage_tolerance")]
    pub slippage_tolerance: Percent,
}

impl EngineConfig {
    /// Starts a builder; every other address defaults to zero.
    #[must_use]
    pub fn builder(stable_token: Address, utility_token: Address) -> EngineConfigBuilder {
        EngineConfigBuilder::new(stable_token, utility_token)
    }

    /// Loads configuration from `DEALS_*` environment variables, reading a
    /// `.env` file first if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if a variable is missing or
    /// malformed, or validation fails.
    pub fn from_env() -> ApplicationResult<Self> {
        dotenvy::dotenv().ok();
        Self::load(None)
    }

    /// Loads configuration from an optional file overlaid by `DEALS_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if a source cannot be read,
    /// a field is missing or malformed, or validation fails.
    pub fn load(path: Option<&Path>) -> ApplicationResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ApplicationError::configuration(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if the deadline is zero or
    /// both tokens are the same.
    pub fn validate(&self) -> ApplicationResult<()> {
        if self.swap_deadline_secs == 0 {
            return Err(ApplicationError::configuration(
                "swap deadline must be positive",
            ));
        }
        if self.stable_token == self.utility_token {
            return Err(ApplicationError::configuration(
                "stable and utility tokens must differ",
            ));
        }
        Ok(())
    }

    /// Path utility → stable used by settlements.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if both tokens are equal.
    pub fn settlement_path(&self) -> ApplicationResult<SwapPath> {
        SwapPath::direct(self.utility_token, self.stable_token)
            .map_err(|e| ApplicationError::configuration(e.to_string()))
    }

    /// Path stable → utility used at deal creation.
    ///
    /// # Errors
    ///
    /// Returns `ApplicationError::Configuration` if both tokens are equal.
    pub fn creation_path(&self) -> ApplicationResult<SwapPath> {
        SwapPath::direct(self.stable_token, self.utility_token)
            .map_err(|e| ApplicationError::configuration(e.to_string()))
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    fn new(stable_token: Address, utility_token: Address) -> Self {
        Self {
            config: EngineConfig {
                stable_token,
                utility_token,
                swap_router: Address::zero(),
                payout_relay: Address::zero(),
                staking_pool: Address::zero(),
                initial_admin: Address::zero(),
                custody_account: Address::zero(),
                swap_deadline_secs: DEFAULT_SWAP_DEADLINE_SECS,
                slippage_tolerance: default_slippage_tolerance(),
            },
        }
    }

    /// Sets the swap router.
    #[must_use]
    pub fn swap_router(mut self, address: Address) -> Self {
        self.config.swap_router = address;
        self
    }

    /// Sets the payout relay.
    #[must_use]
    pub fn payout_relay(mut self, address: Address) -> Self {
        self.config.payout_relay = address;
        self
    }

    /// Sets the staking pool.
    #[must_use]
    pub fn staking_pool(mut self, address: Address) -> Self {
        self.config.staking_pool = address;
        self
    }

    /// Sets the initial admin.
    #[must_use]
    pub fn initial_admin(mut self, address: Address) -> Self {
        self.config.initial_admin = address;
        self
    }

    /// Sets the custody account.
    #[must_use]
    pub fn custody_account(mut self, address: Address) -> Self {
        self.config.custody_account = address;
        self
    }

    /// Sets the swap deadline offset.
    #[must_use]
    pub fn swap_deadline_secs(mut self, secs: u64) -> Self {
        self.config.swap_deadline_secs = secs;
        self
    }

    /// Sets the slippage tolerance.
    #[must_use]
    pub fn slippage_tolerance(mut self, tolerance: Percent) -> Self {
        self.config.slippage_tolerance = tolerance;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// See [`EngineConfig::validate`].
    pub fn build(self) -> ApplicationResult<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
