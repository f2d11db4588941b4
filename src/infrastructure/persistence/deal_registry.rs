//! # Deal Registry
//!
//! Append-only arena of [`Deal`] records keyed by [`DealIndex`], with two
//! derived indexes maintained incrementally on creation:
//!
//! - external id → indices, in creation order
//! - participant (buyer or seller) → indices, in creation order, deduplicated
//!
//! Deals are never removed. The index counter only moves forward;
//! [`DealRegistry::reserve_until`] may skip a range of indices that then
//! never hold a deal.
//!
//! The registry serializes as its deal list plus the counter. Derived
//! indexes are rebuilt on deserialization.

use crate::domain::entities::deal::Deal;
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, DealIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error type for registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No deal is stored at this index.
    #[error("invalid deal index: {0}")]
    InvalidIndex(DealIndex),

    /// The registry holds no deals.
    #[error("no deals have been created")]
    Empty,

    /// A deal was inserted out of sequence.
    #[error("index mismatch: expected {expected}, got {actual}")]
    IndexMismatch {
        /// Next index the registry would assign.
        expected: DealIndex,
        /// Index carried by the inserted deal.
        actual: DealIndex,
    },

    /// The index counter is exhausted.
    #[error("deal index space exhausted")]
    Overflow,

    /// A serialized registry is inconsistent.
    #[error("corrupt registry record: {0}")]
    Corrupt(String),
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Serialized form of the registry: the counter and the deal list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryRecord {
    next_index: u64,
    deals: Vec<Deal>,
}

/// Arena of deals with derived lookup indexes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegistryRecord", into = "RegistryRecord")]
pub struct DealRegistry {
    deals: BTreeMap<DealIndex, Deal>,
    next_index: u64,
    by_external_id: BTreeMap<String, Vec<DealIndex>>,
    by_participant: BTreeMap<Address, Vec<DealIndex>>,
}

impl DealRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored deals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deals.len()
    }

    /// Returns true if no deal has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Index the next created deal will receive.
    #[must_use]
    pub fn next_index(&self) -> DealIndex {
        DealIndex::new(self.next_index)
    }

    /// Appends a deal carrying [`next_index`](Self::next_index) and updates
    /// both derived indexes.
    ///
    /// # Errors
    ///
    /// - `RegistryError::IndexMismatch` if the deal carries another index
    /// - `RegistryError::Overflow` if the counter cannot advance
    pub fn create(&mut self, deal: Deal) -> RegistryResult<DealIndex> {
        let index = deal.index();
        if index != self.next_index() {
            return Err(RegistryError::IndexMismatch {
                expected: self.next_index(),
                actual: index,
            });
        }
        let advanced = self.next_index.checked_add(1).ok_or(RegistryError::Overflow)?;

        self.index_deal(&deal);
        self.deals.insert(index, deal);
        self.next_index = advanced;
        Ok(index)
    }

    /// Returns the deal at `index`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidIndex` if no deal is stored there.
    pub fn get(&self, index: DealIndex) -> RegistryResult<&Deal> {
        self.deals
            .get(&index)
            .ok_or(RegistryError::InvalidIndex(index))
    }

    /// Returns the deal at `index` for a lifecycle transition.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::InvalidIndex` if no deal is stored there.
    pub fn get_mut(&mut self, index: DealIndex) -> RegistryResult<&mut Deal> {
        self.deals
            .get_mut(&index)
            .ok_or(RegistryError::InvalidIndex(index))
    }

    /// Indices of deals created with `external_id`, in creation order.
    #[must_use]
    pub fn indices_by_external_id(&self, external_id: &str) -> Vec<DealIndex> {
        self.by_external_id
            .get(external_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Indices of deals where `account` is buyer or seller, in creation order.
    #[must_use]
    pub fn indices_by_participant(&self, account: Address) -> Vec<DealIndex> {
        self.by_participant
            .get(&account)
            .cloned()
            .unwrap_or_default()
    }

    /// Index of the most recently created deal.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Empty` if no deal exists.
    pub fn latest_index(&self) -> RegistryResult<DealIndex> {
        self.deals
            .keys()
            .next_back()
            .copied()
            .ok_or(RegistryError::Empty)
    }

    /// Advances the counter so the next assigned index is at least `index`.
    ///
    /// Never moves the counter backwards.
    pub fn reserve_until(&mut self, index: DealIndex) {
        self.next_index = self.next_index.max(index.get());
    }

    /// Deals whose lock window has elapsed but are not yet settled.
    pub fn pending_eligible(&self, now: Timestamp) -> impl Iterator<Item = &Deal> {
        self.deals
            .values()
            .filter(move |deal| deal.is_settlement_due(now))
    }

    /// All deals in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Deal> {
        self.deals.values()
    }

    fn index_deal(&mut self, deal: &Deal) {
        let index = deal.index();
        self.by_external_id
            .entry(deal.external_id().to_string())
            .or_default()
            .push(index);

        self.by_participant
            .entry(deal.buyer())
            .or_default()
            .push(index);
        if deal.seller() != deal.buyer() {
            self.by_participant
                .entry(deal.seller())
                .or_default()
                .push(index);
        }
    }
}

impl TryFrom<RegistryRecord> for DealRegistry {
    type Error = RegistryError;

    fn try_from(record: RegistryRecord) -> Result<Self, Self::Error> {
        let mut registry = Self {
            next_index: record.next_index,
            ..Self::default()
        };
        for deal in record.deals {
            let index = deal.index();
            if index.get() >= record.next_index {
                return Err(RegistryError::Corrupt(format!(
                    "deal {index} is beyond next index {}",
                    record.next_index
                )));
            }
            if registry.deals.contains_key(&index) {
                return Err(RegistryError::Corrupt(format!("duplicate deal {index}")));
            }
            registry.index_deal(&deal);
            registry.deals.insert(index, deal);
        }
        Ok(registry)
    }
}

impl From<DealRegistry> for RegistryRecord {
    fn from(registry: DealRegistry) -> Self {
        Self {
            next_index: registry.next_index,
            deals: registry.deals.into_values().collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::deal::{DealTerms, LogicVersion};
    use crate::domain::value_objects::{ContentHash, Percent, TokenAmount};

    const LOCK: u64 = 100;

    fn created_at() -> Timestamp {
        Timestamp::from_secs(1_700_000_000).unwrap()
    }

    fn make_deal(index: DealIndex, external_id: &str, buyer: u8, seller: u8) -> Deal {
        let terms = DealTerms {
            external_id: external_id.to_string(),
            buyer: Address::repeat_byte(buyer),
            seller: Address::repeat_byte(seller),
            content_hash: ContentHash::zero(),
            price_amount: TokenAmount::from_units(1_000),
            min_utility_amount: TokenAmount::ZERO,
            commission_basis_a: Percent::new(20).unwrap(),
            commission_basis_b: Percent::new(50).unwrap(),
            lock_duration_secs: LOCK,
            platform_beneficiary: Address::repeat_byte(0xee),
        };
        Deal::open(
            index,
            terms,
            TokenAmount::from_units(20_000),
            created_at(),
            LogicVersion::V1,
        )
        .unwrap()
    }

    fn push(registry: &mut DealRegistry, external_id: &str, buyer: u8, seller: u8) -> DealIndex {
        let deal = make_deal(registry.next_index(), external_id, buyer, seller);
        registry.create(deal).unwrap()
    }

    mod creation {
        use super::*;

        #[test]
        fn assigns_sequential_indices() {
            let mut registry = DealRegistry::new();
            assert_eq!(push(&mut registry, "a", 1, 2).get(), 0);
            assert_eq!(push(&mut registry, "b", 1, 2).get(), 1);
            assert_eq!(registry.len(), 2);
            assert_eq!(registry.latest_index().unwrap().get(), 1);
        }

        #[test]
        fn rejects_out_of_sequence_insert() {
            let mut registry = DealRegistry::new();
            let deal = make_deal(DealIndex::new(5), "a", 1, 2);
            let result = registry.create(deal);
            assert!(matches!(result, Err(RegistryError::IndexMismatch { .. })));
            assert!(registry.is_empty());
        }

        #[test]
        fn empty_registry_has_no_latest() {
            let registry = DealRegistry::new();
            assert_eq!(registry.latest_index(), Err(RegistryError::Empty));
        }

        #[test]
        fn unknown_index_is_invalid() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            assert_eq!(
                registry.get(DealIndex::new(9)).unwrap_err(),
                RegistryError::InvalidIndex(DealIndex::new(9))
            );
        }
    }

    mod derived_indexes {
        use super::*;

        #[test]
        fn external_id_lists_in_creation_order() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "did:x", 1, 2);
            push(&mut registry, "did:y", 1, 2);
            push(&mut registry, "did:x", 3, 4);

            let ids: Vec<u64> = registry
                .indices_by_external_id("did:x")
                .iter()
                .map(|i| i.get())
                .collect();
            assert_eq!(ids, vec![0, 2]);
            assert!(registry.indices_by_external_id("did:z").is_empty());
        }

        #[test]
        fn participant_lists_buyer_and_seller() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            push(&mut registry, "b", 2, 3);

            assert_eq!(registry.indices_by_participant(Address::repeat_byte(1)).len(), 1);
            assert_eq!(registry.indices_by_participant(Address::repeat_byte(2)).len(), 2);
            assert_eq!(registry.indices_by_participant(Address::repeat_byte(3)).len(), 1);
        }

        #[test]
        fn self_dealing_listed_once() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 7, 7);
            assert_eq!(
                registry.indices_by_participant(Address::repeat_byte(7)),
                vec![DealIndex::new(0)]
            );
        }
    }

    mod reservation {
        use super::*;

        #[test]
        fn reserve_skips_indices() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            registry.reserve_until(DealIndex::new(101));
            assert_eq!(push(&mut registry, "b", 1, 2).get(), 101);
            assert!(registry.get(DealIndex::new(50)).is_err());
            assert_eq!(registry.latest_index().unwrap().get(), 101);
        }

        #[test]
        fn reserve_never_moves_backwards() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            push(&mut registry, "b", 1, 2);
            registry.reserve_until(DealIndex::new(1));
            assert_eq!(registry.next_index().get(), 2);
        }
    }

    mod eligibility {
        use super::*;

        #[test]
        fn pending_eligible_filters_by_window_and_settlement() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            push(&mut registry, "b", 1, 2);

            assert_eq!(registry.pending_eligible(created_at()).count(), 0);

            let later = created_at().saturating_add_secs(LOCK);
            assert_eq!(registry.pending_eligible(later).count(), 2);

            registry.get_mut(DealIndex::new(0)).unwrap().mark_settled().unwrap();
            assert_eq!(registry.pending_eligible(later).count(), 1);
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn roundtrip_rebuilds_indexes() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "did:x", 1, 2);
            registry.reserve_until(DealIndex::new(101));
            push(&mut registry, "did:x", 2, 3);

            let json = serde_json::to_string(&registry).unwrap();
            let back: DealRegistry = serde_json::from_str(&json).unwrap();

            assert_eq!(back, registry);
            assert_eq!(back.indices_by_external_id("did:x").len(), 2);
            assert_eq!(back.next_index().get(), 102);
        }

        #[test]
        fn rejects_deal_beyond_counter() {
            let mut registry = DealRegistry::new();
            push(&mut registry, "a", 1, 2);
            let mut json = serde_json::to_value(&registry).unwrap();
            json["next_index"] = serde_json::json!(0);
            let result: Result<DealRegistry, _> = serde_json::from_value(json);
            assert!(result.is_err());
        }
    }
}
