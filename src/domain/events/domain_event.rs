//! # Journal Event Contract
//!
//! What every journaled engine event exposes, and the identity block each
//! concrete event embeds.
//!
//! Event times are taken from the engine clock, not the wall clock, so a
//! run under a manual clock produces the same journal every time.

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{DealIndex, EventId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse grouping used when filtering the journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    /// Creation and buyer accept/decline.
    Deal,
    /// Terminal payout or refund.
    Settlement,
    /// Pause, configuration, custody, roles and upgrades.
    Admin,
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Deal => "DEAL",
            Self::Settlement => "SETTLEMENT",
            Self::Admin => "ADMIN",
        })
    }
}

/// Read access shared by all journaled events.
pub trait DomainEvent: Send + Sync + fmt::Debug {
    /// Journal-unique id.
    fn event_id(&self) -> EventId;

    /// Deal the event belongs to; `None` for engine-wide events.
    fn deal_index(&self) -> Option<DealIndex>;

    /// Engine-clock time of emission.
    fn timestamp(&self) -> Timestamp;

    /// Journal grouping.
    fn category(&self) -> EventCategory;

    /// Stable name, e.g. `"DealCreated"`.
    fn event_name(&self) -> &'static str;
}

/// Identity block embedded in each concrete event as `metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Journal-unique id.
    pub event_id: EventId,
    /// Owning deal, if any.
    pub deal_index: Option<DealIndex>,
    /// Engine-clock time of emission.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Metadata about deal `index`, with a fresh id.
    #[must_use]
    pub fn for_deal(index: DealIndex, timestamp: Timestamp) -> Self {
        Self {
            event_id: EventId::new_v4(),
            deal_index: Some(index),
            timestamp,
        }
    }

    /// Metadata for an engine-wide event, with a fresh id.
    #[must_use]
    pub fn engine(timestamp: Timestamp) -> Self {
        Self {
            event_id: EventId::new_v4(),
            deal_index: None,
            timestamp,
        }
    }
}

/// Implements [`DomainEvent`] by reading the event's `metadata` field.
macro_rules! impl_domain_event {
    ($event:ty, $kind:expr, $name:literal) => {
        impl $crate::domain::events::domain_event::DomainEvent for $event {
            fn event_id(&self) -> $crate::domain::value_objects::EventId {
                self.metadata.event_id
            }

            fn deal_index(&self) -> Option<$crate::domain::value_objects::DealIndex> {
                self.metadata.deal_index
            }

            fn timestamp(&self) -> $crate::domain::value_objects::Timestamp {
                self.metadata.timestamp
            }

            fn category(&self) -> $crate::domain::events::domain_event::EventCategory {
                $kind
            }

            fn event_name(&self) -> &'static str {
                $name
            }
        }
    };
}

pub(crate) use impl_domain_event;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn category_renders_upper_case() {
        assert_eq!(EventCategory::Settlement.to_string(), "SETTLEMENT");
        assert_eq!(
            serde_json::to_string(&EventCategory::Admin).unwrap(),
            "\"ADMIN\""
        );
    }

    #[test]
    fn deal_metadata_carries_index_and_clock_time() {
        let at = Timestamp::from_secs(1_000).unwrap();
        let metadata = EventMetadata::for_deal(DealIndex::new(7), at);
        assert_eq!(metadata.deal_index, Some(DealIndex::new(7)));
        assert_eq!(metadata.timestamp, at);
    }

    #[test]
    fn engine_metadata_gets_distinct_ids() {
        let at = Timestamp::from_secs(1).unwrap();
        let first = EventMetadata::engine(at);
        let second = EventMetadata::engine(at);
        assert!(first.deal_index.is_none());
        assert_ne!(first.event_id, second.event_id);
    }
}
