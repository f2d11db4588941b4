//! # Deal Events
//!
//! Events tracking a deal from creation to its terminal settlement.
//!
//! # Event Flow
//!
//! ```text
//! DealCreated -> (DealDeclined -> DealAccepted)* -> PayoutSettled
//!                                                 | DeclineSettled
//! ```

use crate::domain::entities::deal::{Deal, LogicVersion};
use crate::domain::events::domain_event::{
    impl_domain_event, DomainEvent, EventCategory, EventMetadata,
};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, DealIndex, EventId, TokenAmount};
use serde::{Deserialize, Serialize};

/// Emitted when a deal is created and its deposit swapped into escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCreated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// External identifier.
    pub external_id: String,
    /// Paying party.
    pub buyer: Address,
    /// Licensing party.
    pub seller: Address,
    /// Stable-token price.
    pub price_amount: TokenAmount,
    /// Utility tokens received by the creation swap.
    pub utility_allocated: TokenAmount,
    /// Operation set that created the deal.
    pub logic_version: LogicVersion,
}

impl DealCreated {
    /// Creates the event from the freshly opened deal.
    #[must_use]
    pub fn from_deal(deal: &Deal) -> Self {
        Self {
            metadata: EventMetadata::for_deal(deal.index(), deal.created_at()),
            external_id: deal.external_id().to_string(),
            buyer: deal.buyer(),
            seller: deal.seller(),
            price_amount: deal.price_amount(),
            utility_allocated: deal.utility_allocated(),
            logic_version: deal.logic_version(),
        }
    }
}

impl_domain_event!(DealCreated, EventCategory::Deal, "DealCreated");

/// Emitted when the buyer re-accepts a declined deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealAccepted {
    /// Event metadata.
    pub metadata: EventMetadata,
}

impl DealAccepted {
    /// Acceptance of deal `index` at `at`.
    #[must_use]
    pub fn new(index: DealIndex, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_deal(index, at),
        }
    }
}

impl_domain_event!(DealAccepted, EventCategory::Deal, "DealAccepted");

/// Emitted when the buyer declines a deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealDeclined {
    /// Event metadata.
    pub metadata: EventMetadata,
}

impl DealDeclined {
    /// Decline of deal `index` at `at`.
    #[must_use]
    pub fn new(index: DealIndex, at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::for_deal(index, at),
        }
    }
}

impl_domain_event!(DealDeclined, EventCategory::Deal, "DealDeclined");

/// Emitted after a successful payout settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutSettled {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Stable tokens delivered to the payout relay for the seller.
    pub stable_out: TokenAmount,
    /// Utility tokens sold to realise the seller commission.
    pub utility_sold: TokenAmount,
    /// Utility tokens sent to the staking pool.
    pub staking_share: TokenAmount,
    /// Utility tokens sent to the platform beneficiary.
    pub platform_share: TokenAmount,
}

impl PayoutSettled {
    /// Payout outcome as executed.
    #[must_use]
    pub fn new(
        index: DealIndex,
        at: Timestamp,
        stable_out: TokenAmount,
        utility_sold: TokenAmount,
        staking_share: TokenAmount,
        platform_share: TokenAmount,
    ) -> Self {
        Self {
            metadata: EventMetadata::for_deal(index, at),
            stable_out,
            utility_sold,
            staking_share,
            platform_share,
        }
    }
}

impl_domain_event!(PayoutSettled, EventCategory::Settlement, "PayoutSettled");

/// Emitted after a successful decline refund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclineSettled {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Stable tokens delivered to the payout relay for the buyer.
    pub stable_out: TokenAmount,
    /// Utility tokens sold to realise the refund.
    pub utility_sold: TokenAmount,
}

impl DeclineSettled {
    /// Refund outcome as executed.
    #[must_use]
    pub fn new(
        index: DealIndex,
        at: Timestamp,
        stable_out: TokenAmount,
        utility_sold: TokenAmount,
    ) -> Self {
        Self {
            metadata: EventMetadata::for_deal(index, at),
            stable_out,
            utility_sold,
        }
    }
}

impl_domain_event!(DeclineSettled, EventCategory::Settlement, "DeclineSettled");

/// Union of all deal lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DealEvent {
    /// Deal was created.
    Created(DealCreated),
    /// Deal was re-accepted.
    Accepted(DealAccepted),
    /// Deal was declined.
    Declined(DealDeclined),
    /// Payout settlement completed.
    PayoutSettled(PayoutSettled),
    /// Decline refund completed.
    DeclineSettled(DeclineSettled),
}

impl DealEvent {
    fn inner(&self) -> &dyn DomainEvent {
        match self {
            Self::Created(e) => e,
            Self::Accepted(e) => e,
            Self::Declined(e) => e,
            Self::PayoutSettled(e) => e,
            Self::DeclineSettled(e) => e,
        }
    }
}

impl DomainEvent for DealEvent {
    fn event_id(&self) -> EventId {
        self.inner().event_id()
    }

    fn deal_index(&self) -> Option<DealIndex> {
        self.inner().deal_index()
    }

    fn timestamp(&self) -> Timestamp {
        self.inner().timestamp()
    }

    fn category(&self) -> EventCategory {
        self.inner().category()
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

    mod lifecycle {
        use super::*;

        #[test]
        fn declined_event_carries_index() {
            let event = DealDeclined::new(DealIndex::new(4), at());
            assert_eq!(event.deal_index(), Some(DealIndex::new(4)));
            assert_eq!(event.event_name(), "DealDeclined");
            assert_eq!(event.category(), EventCategory::Deal);
        }

        #[test]
        fn accepted_event_name() {
            let event = DealAccepted::new(DealIndex::new(4), at());
            assert_eq!(event.event_name(), "DealAccepted");
        }
    }

    mod settlement {
        use super::*;

        #[test]
        fn payout_event_is_settlement_type() {
            let event = PayoutSettled::new(
                DealIndex::new(0),
                at(),
                TokenAmount::from_units(800),
                TokenAmount::from_units(16_000),
                TokenAmount::from_units(2_000),
                TokenAmount::from_units(2_000),
            );
            assert_eq!(event.category(), EventCategory::Settlement);
            assert_eq!(event.timestamp(), at());
        }

        #[test]
        fn wrapped_event_delegates() {
            let inner = DeclineSettled::new(
                DealIndex::new(2),
                at(),
                TokenAmount::from_units(1_000),
                TokenAmount::from_units(20_000),
            );
            let id = inner.event_id();
            let event = DealEvent::DeclineSettled(inner);
            assert_eq!(event.event_id(), id);
            assert_eq!(event.event_name(), "DeclineSettled");
            assert_eq!(event.deal_index(), Some(DealIndex::new(2)));
        }

        #[test]
        fn wrapped_event_serializes_with_tag() {
            let event = DealEvent::Declined(DealDeclined::new(DealIndex::new(1), at()));
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], "declined");
        }
    }
}
