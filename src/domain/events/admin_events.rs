//! # Admin Events
//!
//! Engine-wide events: pause switches, configuration changes, custody
//! withdrawals, role changes and logic upgrades.

use crate::domain::entities::deal::LogicVersion;
use crate::domain::events::domain_event::{
    impl_domain_event, DomainEvent, EventCategory, EventMetadata,
};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, Asset, DealIndex, EventId, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Emitted when deal operations are paused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnginePaused {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Admin who paused.
    pub by: Address,
}

impl EnginePaused {
    /// Pause by `by`.
    #[must_use]
    pub fn new(by: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            by,
        }
    }
}

impl_domain_event!(EnginePaused, EventCategory::Admin, "EnginePaused");

/// Emitted when deal operations resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineUnpaused {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Admin who unpaused.
    pub by: Address,
}

impl EngineUnpaused {
    /// Resume by `by`.
    #[must_use]
    pub fn new(by: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            by,
        }
    }
}

impl_domain_event!(EngineUnpaused, EventCategory::Admin, "EngineUnpaused");

/// Configuration parameter that was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigParameter {
    /// Stable token address.
    StableToken,
    /// Utility token address.
    UtilityToken,
    /// Swap venue router address.
    SwapRouter,
    /// Swap deadline offset in seconds.
    SwapDeadline,
    /// Slippage tolerance percent.
    SlippageTolerance,
}

impl fmt::Display for ConfigParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::StableToken => "stable_token",
            Self::UtilityToken => "utility_token",
            Self::SwapRouter => "swap_router",
            Self::SwapDeadline => "swap_deadline",
            Self::SlippageTolerance => "slippage_tolerance",
        };
        f.write_str(name)
    }
}

/// Emitted when an admin changes a configuration parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Which parameter changed.
    pub parameter: ConfigParameter,
    /// New value, rendered.
    pub value: String,
    /// Admin who made the change.
    pub by: Address,
}

impl ConfigUpdated {
    /// `value` is stored in its `Display` form.
    #[must_use]
    pub fn new(parameter: ConfigParameter, value: impl ToString, by: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            parameter,
            value: value.to_string(),
            by,
        }
    }
}

impl_domain_event!(ConfigUpdated, EventCategory::Admin, "ConfigUpdated");

/// Emitted when the owner sweeps a custody balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyWithdrawn {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Swept asset.
    pub asset: Asset,
    /// Amount transferred.
    pub amount: TokenAmount,
    /// Receiving owner.
    pub recipient: Address,
}

impl CustodyWithdrawn {
    /// Sweep of `amount` of `asset` to the owner.
    #[must_use]
    pub fn new(asset: Asset, amount: TokenAmount, recipient: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            asset,
            amount,
            recipient,
        }
    }
}

impl_domain_event!(CustodyWithdrawn, EventCategory::Admin, "CustodyWithdrawn");

/// Emitted after the transition logic is upgraded in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicUpgraded {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Previous version.
    pub from: LogicVersion,
    /// New version.
    pub to: LogicVersion,
    /// First index the new version may assign.
    pub next_index: DealIndex,
}

impl LogicUpgraded {
    /// Upgrade from `from` to `to`; the registry resumes at `next_index`.
    #[must_use]
    pub fn new(from: LogicVersion, to: LogicVersion, next_index: DealIndex, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            from,
            to,
            next_index,
        }
    }
}

impl_domain_event!(LogicUpgraded, EventCategory::Admin, "LogicUpgraded");

/// Emitted when the owner grants the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminGranted {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// New admin.
    pub account: Address,
}

impl AdminGranted {
    /// Grant to `account`.
    #[must_use]
    pub fn new(account: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            account,
        }
    }
}

impl_domain_event!(AdminGranted, EventCategory::Admin, "AdminGranted");

/// Emitted when the owner revokes the admin role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminRevoked {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Former admin.
    pub account: Address,
}

impl AdminRevoked {
    /// Revocation from `account`.
    #[must_use]
    pub fn new(account: Address, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::engine(at),
            account,
        }
    }
}

impl_domain_event!(AdminRevoked, EventCategory::Admin, "AdminRevoked");

/// Union of all engine-wide events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AdminEvent {
    /// Operations paused.
    Paused(EnginePaused),
    /// Operations resumed.
    Unpaused(EngineUnpaused),
    /// Configuration changed.
    ConfigUpdated(ConfigUpdated),
    /// Custody swept.
    CustodyWithdrawn(CustodyWithdrawn),
    /// Logic upgraded.
    LogicUpgraded(LogicUpgraded),
    /// Admin role granted.
    AdminGranted(AdminGranted),
    /// Admin role revoked.
    AdminRevoked(AdminRevoked),
}

impl AdminEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::Paused(e) => e,
            Self::Unpaused(e) => e,
            Self::ConfigUpdated(e) => e,
            Self::CustodyWithdrawn(e) => e,
            Self::LogicUpgraded(e) => e,
            Self::AdminGranted(e) => e,
            Self::AdminRevoked(e) => e,
        }
    }
}

impl DomainEvent for AdminEvent {
    fn event_id(&self) -> EventId {
        self.inner().event_id()
    }

    fn deal_index(&self) -> Option<DealIndex> {
        None
    }

    fn timestamp(&self) -> Timestamp {
        self.inner().timestamp()
    }

    fn category(&self) -> EventCategory {
        EventCategory::Admin
    }

    fn event_name(&self) -> &'static str {
        self.inner().event_name()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at() -> Timestamp {
        Timestamp::from_secs(1_700_000_000).unwrap()
    }

    #[test]
    fn config_updated_renders_value() {
        let event = ConfigUpdated::new(
            ConfigParameter::SlippageTolerance,
            30,
            Address::repeat_byte(1),
            at(),
        );
        assert_eq!(event.value, "30");
        assert_eq!(event.parameter.to_string(), "slippage_tolerance");
        assert_eq!(event.event_name(), "ConfigUpdated");
    }

    #[test]
    fn admin_events_have_no_deal() {
        let event = AdminEvent::Paused(EnginePaused::new(Address::repeat_byte(1), at()));
        assert!(event.deal_index().is_none());
        assert_eq!(event.category(), EventCategory::Admin);
        assert_eq!(event.event_name(), "EnginePaused");
    }

    #[test]
    fn upgrade_event_records_versions() {
        let event = LogicUpgraded::new(LogicVersion::V1, LogicVersion::V2, DealIndex::new(101), at());
        assert_eq!(event.from, LogicVersion::V1);
        assert_eq!(event.to, LogicVersion::V2);
        assert_eq!(event.next_index.get(), 101);
    }

    #[test]
    fn withdrawal_serializes_asset_lowercase() {
        let event = AdminEvent::CustodyWithdrawn(CustodyWithdrawn::new(
            Asset::Utility,
            TokenAmount::from_units(5),
            Address::repeat_byte(2),
            at(),
        ));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "custody_withdrawn");
        assert_eq!(json["asset"], "utility");
    }
}
