//! # Domain Events
//!
//! Events emitted by the engine and kept in its journal as an audit trail.
//!
//! ## Deal Events
//!
//! - [`DealCreated`]: deal opened and deposit swapped into escrow
//! - [`DealDeclined`] / [`DealAccepted`]: buyer intent changed
//! - [`PayoutSettled`]: seller paid, commission split distributed
//! - [`DeclineSettled`]: buyer refunded
//!
//! ## Admin Events
//!
//! - [`EnginePaused`] / [`EngineUnpaused`]
//! - [`ConfigUpdated`]
//! - [`CustodyWithdrawn`]
//! - [`LogicUpgraded`]
//! - [`AdminGranted`] / [`AdminRevoked`]

pub mod admin_events;
pub mod deal_events;
pub mod domain_event;

pub use admin_events::{
    AdminEvent, AdminGranted, AdminRevoked, ConfigParameter, ConfigUpdated, CustodyWithdrawn,
    EnginePaused, EngineUnpaused, LogicUpgraded,
};
pub use deal_events::{
    DealAccepted, DealCreated, DealDeclined, DealEvent, DeclineSettled, PayoutSettled,
};
pub use domain_event::{DomainEvent, EventMetadata, EventCategory};

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{DealIndex, EventId};
use serde::{Deserialize, Serialize};

/// Any event the engine journals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "payload", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Deal lifecycle event.
    Deal(DealEvent),
    /// Engine-wide event.
    Admin(AdminEvent),
}

impl DomainEvent for EngineEvent {
    fn event_id(&self) -> EventId {
        match self {
            Self::Deal(e) => e.event_id(),
            Self::Admin(e) => e.event_id(),
        }
    }

    fn deal_index(&self) -> Option<DealIndex> {
        match self {
            Self::Deal(e) => e.deal_index(),
            Self::Admin(e) => e.deal_index(),
        }
    }

    fn timestamp(&self) -> Timestamp {
        match self {
            Self::Deal(e) => e.timestamp(),
            Self::Admin(e) => e.timestamp(),
        }
    }

    fn category(&self) -> EventCategory {
        match self {
            Self::Deal(e) => e.category(),
            Self::Admin(e) => e.category(),
        }
    }

    fn event_name(&self) -> &'static str {
        match self {
            Self::Deal(e) => e.event_name(),
            Self::Admin(e) => e.event_name(),
        }
    }
}

impl From<DealEvent> for EngineEvent {
    fn from(event: DealEvent) -> Self {
        Self::Deal(event)
    }
}

impl From<AdminEvent> for EngineEvent {
    fn from(event: AdminEvent) -> Self {
        Self::Admin(event)
    }
}
