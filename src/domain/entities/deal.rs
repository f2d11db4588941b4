//! # Deal Aggregate Root
//!
//! One escrowed buyer/seller data-licensing transaction with its commission
//! terms and lock timer.
//!
//! # State Machine
//!
//! ```text
//!            decline               accept
//!   Open ──────────────→ Declined ───────→ Open
//!    │   (window open)      │   (window open)
//!    │ payout               │ settle declined
//!    ↓ (window elapsed)     ↓ (window elapsed)
//!  PaidOut               Refunded
//! ```
//!
//! `created_at + lock_duration` is the single boundary: accept/decline are
//! only possible strictly before it, settlement only at or after it.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::domain::entities::deal::{Deal, DealStatus, DealTerms, LogicVersion};
//! use data_deal_escrow::domain::value_objects::{
//!     Address, ContentHash, DealIndex, Percent, Timestamp, TokenAmount,
//! };
//!
//! let terms = DealTerms {
//!     external_id: "did:databroker:deal1:weatherdata".to_string(),
//!     buyer: Address::repeat_byte(1),
//!     seller: Address::repeat_byte(2),
//!     content_hash: ContentHash::zero(),
//!     price_amount: TokenAmount::from_units(1_000),
//!     min_utility_amount: TokenAmount::from_units(20_000),
//!     commission_basis_a: Percent::new(20).unwrap(),
//!     commission_basis_b: Percent::new(50).unwrap(),
//!     lock_duration_secs: 1_296_000,
//!     platform_beneficiary: Address::repeat_byte(3),
//! };
//! let created_at = Timestamp::from_secs(1_700_000_000).unwrap();
//! let deal = Deal::open(
//!     DealIndex::new(0),
//!     terms,
//!     TokenAmount::from_units(20_000),
//!     created_at,
//!     LogicVersion::V1,
//! )
//! .unwrap();
//!
//! assert_eq!(deal.status(), DealStatus::Open);
//! assert!(deal.accepted());
//! assert!(!deal.payout_processed());
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{Address, ContentHash, DealIndex, Percent, TokenAmount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the operation set that created a deal record.
///
/// Versions only ever append; fields written by an older version keep
/// their meaning under every newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicVersion {
    /// Initial operation set.
    #[default]
    V1,
    /// Operation set adding `create_deal_v2`.
    V2,
}

impl fmt::Display for LogicVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

/// Lifecycle position of a deal, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    /// Accepted and awaiting settlement.
    Open,
    /// Declined and awaiting refund.
    Declined,
    /// Settled through the payout path.
    PaidOut,
    /// Settled through the decline-refund path.
    Refunded,
}

impl DealStatus {
    /// Returns true for the two terminal states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PaidOut | Self::Refunded)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Declined => write!(f, "DECLINED"),
            Self::PaidOut => write!(f, "PAID_OUT"),
            Self::Refunded => write!(f, "REFUNDED"),
        }
    }
}

/// Commercial terms supplied when a deal is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealTerms {
    /// External deal identifier, e.g. a DID. May recur across deals.
    pub external_id: String,
    /// Paying party.
    pub buyer: Address,
    /// Licensing party.
    pub seller: Address,
    /// Reference to the licensed asset.
    pub content_hash: ContentHash,
    /// Stable-token amount deposited by the buyer.
    pub price_amount: TokenAmount,
    /// Slippage floor for the creation-time stable→utility swap.
    pub min_utility_amount: TokenAmount,
    /// Total staking+platform commission.
    pub commission_basis_a: Percent,
    /// Staking share of the commission split.
    pub commission_basis_b: Percent,
    /// Decision window and minimum age before settlement.
    pub lock_duration_secs: u64,
    /// Receives the platform share.
    pub platform_beneficiary: Address,
}

impl DealTerms {
    /// Validates the terms.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the price is zero.
    pub fn validate(&self) -> DomainResult<()> {
        if self.price_amount.is_zero() {
            return Err(DomainError::validation("price amount must be positive"));
        }
        Ok(())
    }
}

/// Deal aggregate root.
///
/// # Invariants
///
/// - All fields except `accepted` and `payout_processed` are immutable
/// - `payout_processed` only ever goes from false to true
/// - Once settled, no transition succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    /// Registry key.
    index: DealIndex,
    /// External identifier.
    external_id: String,
    /// Paying party.
    buyer: Address,
    /// Licensing party.
    seller: Address,
    /// Licensed asset reference.
    content_hash: ContentHash,
    /// Stable-token price.
    price_amount: TokenAmount,
    /// Creation swap slippage floor.
    min_utility_amount: TokenAmount,
    /// Utility tokens received by the creation swap.
    utility_allocated: TokenAmount,
    /// Total staking+platform commission.
    commission_basis_a: Percent,
    /// Staking share of the split.
    commission_basis_b: Percent,
    /// Lock window length in seconds.
    lock_duration_secs: u64,
    /// Receives the platform share.
    platform_beneficiary: Address,
    /// When the deal was created.
    created_at: Timestamp,
    /// Buyer intent; optimistic default is true.
    accepted: bool,
    /// Set once a terminal settlement succeeds.
    payout_processed: bool,
    /// Operation set that created this record.
    logic_version: LogicVersion,
}

impl Deal {
    /// Opens a new deal in the accepted, unsettled state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the terms are invalid or the
    /// lock window end is not representable.
    pub fn open(
        index: DealIndex,
        terms: DealTerms,
        utility_allocated: TokenAmount,
        created_at: Timestamp,
        logic_version: LogicVersion,
    ) -> DomainResult<Self> {
        terms.validate()?;
        if created_at
            .checked_add_secs(terms.lock_duration_secs)
            .is_none()
        {
            return Err(DomainError::validation("lock duration out of range"));
        }

        Ok(Self {
            index,
            external_id: terms.external_id,
            buyer: terms.buyer,
            seller: terms.seller,
            content_hash: terms.content_hash,
            price_amount: terms.price_amount,
            min_utility_amount: terms.min_utility_amount,
            utility_allocated,
            commission_basis_a: terms.commission_basis_a,
            commission_basis_b: terms.commission_basis_b,
            lock_duration_secs: terms.lock_duration_secs,
            platform_beneficiary: terms.platform_beneficiary,
            created_at,
            accepted: true,
            payout_processed: false,
            logic_version,
        })
    }

    // ========== Accessors ==========

    /// Returns the registry index.
    #[inline]
    #[must_use]
    pub fn index(&self) -> DealIndex {
        self.index
    }

    /// Returns the external identifier.
    #[inline]
    #[must_use]
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    /// Returns the buyer.
    #[inline]
    #[must_use]
    pub fn buyer(&self) -> Address {
        self.buyer
    }

    /// Returns the seller.
    #[inline]
    #[must_use]
    pub fn seller(&self) -> Address {
        self.seller
    }

    /// Returns the content hash.
    #[inline]
    #[must_use]
    pub fn content_hash(&self) -> ContentHash {
        self.content_hash
    }

    /// Returns the stable-token price.
    #[inline]
    #[must_use]
    pub fn price_amount(&self) -> TokenAmount {
        self.price_amount
    }

    /// Returns the creation swap slippage floor.
    #[inline]
    #[must_use]
    pub fn min_utility_amount(&self) -> TokenAmount {
        self.min_utility_amount
    }

    /// Returns the utility tokens allocated to this deal at creation.
    #[inline]
    #[must_use]
    pub fn utility_allocated(&self) -> TokenAmount {
        self.utility_allocated
    }

    /// Returns the total staking+platform commission.
    #[inline]
    #[must_use]
    pub fn commission_basis_a(&self) -> Percent {
        self.commission_basis_a
    }

    /// Returns the staking share of the split.
    #[inline]
    #[must_use]
    pub fn commission_basis_b(&self) -> Percent {
        self.commission_basis_b
    }

    /// Returns the lock window length in seconds.
    #[inline]
    #[must_use]
    pub fn lock_duration_secs(&self) -> u64 {
        self.lock_duration_secs
    }

    /// Returns the platform beneficiary.
    #[inline]
    #[must_use]
    pub fn platform_beneficiary(&self) -> Address {
        self.platform_beneficiary
    }

    /// Returns when the deal was created.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the buyer's current intent.
    #[inline]
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.accepted
    }

    /// Returns true once a terminal settlement has succeeded.
    #[inline]
    #[must_use]
    pub fn payout_processed(&self) -> bool {
        self.payout_processed
    }

    /// Returns the operation set that created this deal.
    #[inline]
    #[must_use]
    pub fn logic_version(&self) -> LogicVersion {
        self.logic_version
    }

    // ========== Window Helpers ==========

    /// End of the decision window and start of settlement eligibility.
    #[must_use]
    pub fn unlocks_at(&self) -> Timestamp {
        self.created_at.saturating_add_secs(self.lock_duration_secs)
    }

    /// Returns true while accept/decline are permitted.
    #[must_use]
    pub fn is_window_open(&self, now: Timestamp) -> bool {
        now < self.unlocks_at()
    }

    /// Returns true if the deal is eligible for settlement but unsettled.
    #[must_use]
    pub fn is_settlement_due(&self, now: Timestamp) -> bool {
        !self.payout_processed && !self.is_window_open(now)
    }

    /// Returns true if `account` is the buyer or the seller.
    #[must_use]
    pub fn involves(&self, account: Address) -> bool {
        self.buyer == account || self.seller == account
    }

    /// Returns the derived lifecycle status.
    #[must_use]
    pub fn status(&self) -> DealStatus {
        match (self.payout_processed, self.accepted) {
            (false, true) => DealStatus::Open,
            (false, false) => DealStatus::Declined,
            (true, true) => DealStatus::PaidOut,
            (true, false) => DealStatus::Refunded,
        }
    }

    // ========== Transitions ==========

    /// Registers the buyer's decline.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` if already declined
    /// - `DomainError::AlreadySettled` once settled, whatever the clock says
    /// - `DomainError::WindowClosed` if the decision window has closed
    pub fn decline(&mut self, now: Timestamp) -> DomainResult<()> {
        if !self.accepted {
            return Err(DomainError::invalid_state(format!(
                "deal {} was already declined",
                self.index
            )));
        }
        self.ensure_unsettled()?;
        self.ensure_window_open(now)?;
        self.accepted = false;
        Ok(())
    }

    /// Re-registers acceptance after a decline.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidState` if already accepted
    /// - `DomainError::AlreadySettled` once settled, whatever the clock says
    /// - `DomainError::WindowClosed` if the decision window has closed
    pub fn accept(&mut self, now: Timestamp) -> DomainResult<()> {
        if self.accepted {
            return Err(DomainError::invalid_state(format!(
                "deal {} was already accepted",
                self.index
            )));
        }
        self.ensure_unsettled()?;
        self.ensure_window_open(now)?;
        self.accepted = true;
        Ok(())
    }

    /// Checks that the payout path may run.
    ///
    /// # Errors
    ///
    /// - `DomainError::AlreadySettled` if settled
    /// - `DomainError::Locked` if the lock window has not elapsed
    /// - `DomainError::DeclinedState` if the buyer declined
    pub fn ensure_payable(&self, now: Timestamp) -> DomainResult<()> {
        if self.payout_processed {
            return Err(DomainError::AlreadySettled(self.index));
        }
        self.ensure_unlocked(now)?;
        if !self.accepted {
            return Err(DomainError::DeclinedState(self.index));
        }
        Ok(())
    }

    /// Checks that the decline-refund path may run.
    ///
    /// # Errors
    ///
    /// - `DomainError::NotDeclined` if the deal is accepted
    /// - `DomainError::Locked` if the lock window has not elapsed
    /// - `DomainError::AlreadySettled` if settled
    pub fn ensure_refundable(&self, now: Timestamp) -> DomainResult<()> {
        if self.accepted {
            return Err(DomainError::NotDeclined(self.index));
        }
        self.ensure_unlocked(now)?;
        if self.payout_processed {
            return Err(DomainError::AlreadySettled(self.index));
        }
        Ok(())
    }

    /// Marks the terminal settlement as done.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AlreadySettled` if already settled.
    pub fn mark_settled(&mut self) -> DomainResult<DealStatus> {
        self.ensure_unsettled()?;
        self.payout_processed = true;
        Ok(self.status())
    }

    fn ensure_unsettled(&self) -> DomainResult<()> {
        if self.payout_processed {
            return Err(DomainError::AlreadySettled(self.index));
        }
        Ok(())
    }

    fn ensure_window_open(&self, now: Timestamp) -> DomainResult<()> {
        if !self.is_window_open(now) {
            return Err(DomainError::WindowClosed {
                index: self.index,
                closed_at: self.unlocks_at(),
            });
        }
        Ok(())
    }

    fn ensure_unlocked(&self, now: Timestamp) -> DomainResult<()> {
        if self.is_window_open(now) {
            return Err(DomainError::Locked {
                index: self.index,
                unlocks_at: self.unlocks_at(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deal({} {} price={} held={} [{}])",
            self.index, self.external_id, self.price_amount, self.utility_allocated, self.status()
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LOCK: u64 = 1_296_000;

    fn created_at() -> Timestamp {
        Timestamp::from_secs(1_700_000_000).unwrap()
    }

    fn at(offset: u64) -> Timestamp {
        created_at().saturating_add_secs(offset)
    }

    fn test_terms() -> DealTerms {
        DealTerms {
            external_id: "did:databroker:deal1:weatherdata".to_string(),
            buyer: Address::repeat_byte(0xb1),
            seller: Address::repeat_byte(0x5e),
            content_hash: ContentHash::repeat_byte(0xf6),
            price_amount: TokenAmount::from_units(1_000),
            min_utility_amount: TokenAmount::from_units(20_000),
            commission_basis_a: Percent::new(20).unwrap(),
            commission_basis_b: Percent::new(50).unwrap(),
            lock_duration_secs: LOCK,
            platform_beneficiary: Address::repeat_byte(0x30),
        }
    }

    fn create_test_deal() -> Deal {
        Deal::open(
            DealIndex::new(0),
            test_terms(),
            TokenAmount::from_units(20_000),
            created_at(),
            LogicVersion::V1,
        )
        .unwrap()
    }

    mod construction {
        use super::*;

        #[test]
        fn open_starts_accepted_and_unsettled() {
            let deal = create_test_deal();
            assert!(deal.accepted());
            assert!(!deal.payout_processed());
            assert_eq!(deal.status(), DealStatus::Open);
            assert_eq!(deal.unlocks_at(), at(LOCK));
        }

        #[test]
        fn open_rejects_zero_price() {
            let mut terms = test_terms();
            terms.price_amount = TokenAmount::ZERO;
            let result = Deal::open(
                DealIndex::new(0),
                terms,
                TokenAmount::ZERO,
                created_at(),
                LogicVersion::V1,
            );
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }

        #[test]
        fn open_rejects_unrepresentable_lock() {
            let mut terms = test_terms();
            terms.lock_duration_secs = u64::MAX;
            let result = Deal::open(
                DealIndex::new(0),
                terms,
                TokenAmount::ZERO,
                created_at(),
                LogicVersion::V1,
            );
            assert!(matches!(result, Err(DomainError::Validation(_))));
        }

        #[test]
        fn involves_buyer_and_seller_only() {
            let deal = create_test_deal();
            assert!(deal.involves(Address::repeat_byte(0xb1)));
            assert!(deal.involves(Address::repeat_byte(0x5e)));
            assert!(!deal.involves(Address::repeat_byte(0x30)));
        }
    }

    mod decision_window {
        use super::*;

        #[test]
        fn decline_then_decline_is_invalid_state() {
            let mut deal = create_test_deal();
            deal.decline(at(10)).unwrap();
            assert!(!deal.accepted());

            let result = deal.decline(at(11));
            assert!(matches!(result, Err(DomainError::InvalidState(_))));
        }

        #[test]
        fn accept_when_accepted_is_invalid_state() {
            let mut deal = create_test_deal();
            let result = deal.accept(at(10));
            assert!(matches!(result, Err(DomainError::InvalidState(_))));
        }

        #[test]
        fn accept_after_decline_reopens() {
            let mut deal = create_test_deal();
            deal.decline(at(10)).unwrap();
            deal.accept(at(20)).unwrap();
            assert_eq!(deal.status(), DealStatus::Open);
        }

        #[test]
        fn decline_at_boundary_is_window_closed() {
            let mut deal = create_test_deal();
            let result = deal.decline(at(LOCK));
            assert!(matches!(result, Err(DomainError::WindowClosed { .. })));
            assert!(deal.accepted());
        }

        #[test]
        fn accept_after_window_is_window_closed() {
            let mut deal = create_test_deal();
            deal.decline(at(10)).unwrap();
            let result = deal.accept(at(LOCK + 1));
            assert!(matches!(result, Err(DomainError::WindowClosed { .. })));
            assert!(!deal.accepted());
        }

        #[test]
        fn decline_one_second_before_boundary_succeeds() {
            let mut deal = create_test_deal();
            assert!(deal.decline(at(LOCK - 1)).is_ok());
        }
    }

    mod settlement_guards {
        use super::*;

        #[test]
        fn payable_is_locked_before_boundary() {
            let deal = create_test_deal();
            let result = deal.ensure_payable(at(LOCK - 1));
            assert!(matches!(result, Err(DomainError::Locked { .. })));
            assert!(deal.ensure_payable(at(LOCK)).is_ok());
        }

        #[test]
        fn payable_rejects_declined_deal() {
            let mut deal = create_test_deal();
            deal.decline(at(1)).unwrap();
            let result = deal.ensure_payable(at(LOCK));
            assert_eq!(result, Err(DomainError::DeclinedState(DealIndex::new(0))));
        }

        #[test]
        fn payable_reports_locked_before_declined() {
            let mut deal = create_test_deal();
            deal.decline(at(1)).unwrap();
            let result = deal.ensure_payable(at(2));
            assert!(matches!(result, Err(DomainError::Locked { .. })));
        }

        #[test]
        fn refundable_requires_decline() {
            let deal = create_test_deal();
            let result = deal.ensure_refundable(at(LOCK));
            assert_eq!(result, Err(DomainError::NotDeclined(DealIndex::new(0))));
        }

        #[test]
        fn refundable_is_locked_before_boundary() {
            let mut deal = create_test_deal();
            deal.decline(at(1)).unwrap();
            let result = deal.ensure_refundable(at(2));
            assert!(matches!(result, Err(DomainError::Locked { .. })));
            assert!(deal.ensure_refundable(at(LOCK)).is_ok());
        }

        #[test]
        fn mark_settled_is_once_only() {
            let mut deal = create_test_deal();
            assert_eq!(deal.mark_settled().unwrap(), DealStatus::PaidOut);
            assert_eq!(
                deal.mark_settled(),
                Err(DomainError::AlreadySettled(DealIndex::new(0)))
            );
            assert_eq!(
                deal.ensure_payable(at(LOCK)),
                Err(DomainError::AlreadySettled(DealIndex::new(0)))
            );
        }

        #[test]
        fn refunded_deal_rejects_everything() {
            let mut deal = create_test_deal();
            deal.decline(at(1)).unwrap();
            assert_eq!(deal.mark_settled().unwrap(), DealStatus::Refunded);
            assert!(deal.ensure_refundable(at(LOCK)).is_err());
            assert!(deal.accept(at(LOCK)).is_err());
            assert!(deal.decline(at(LOCK)).is_err());
        }

        #[test]
        fn settled_deal_ignores_rewound_clock() {
            let mut deal = create_test_deal();
            deal.mark_settled().unwrap();
            let before_unlock = at(10);
            assert!(before_unlock < deal.unlocks_at());

            assert_eq!(
                deal.decline(before_unlock),
                Err(DomainError::AlreadySettled(DealIndex::new(0)))
            );
            assert_eq!(deal.status(), DealStatus::PaidOut);
        }

        #[test]
        fn refunded_deal_cannot_be_reaccepted_early() {
            let mut deal = create_test_deal();
            deal.decline(at(1)).unwrap();
            deal.mark_settled().unwrap();

            assert_eq!(
                deal.accept(at(2)),
                Err(DomainError::AlreadySettled(DealIndex::new(0)))
            );
            assert_eq!(deal.status(), DealStatus::Refunded);
        }

        #[test]
        fn settlement_due_only_after_boundary_and_unsettled() {
            let mut deal = create_test_deal();
            assert!(!deal.is_settlement_due(at(LOCK - 1)));
            assert!(deal.is_settlement_due(at(LOCK)));
            deal.mark_settled().unwrap();
            assert!(!deal.is_settlement_due(at(LOCK)));
        }
    }

    mod display {
        use super::*;

        #[test]
        fn display_contains_status() {
            let deal = create_test_deal();
            let display = deal.to_string();
            assert!(display.contains("Deal(0"));
            assert!(display.contains("OPEN"));
        }
    }

    mod serde {
        use super::*;

        #[test]
        fn serde_roundtrip() {
            let deal = create_test_deal();
            let json = serde_json::to_string(&deal).unwrap();
            let back: Deal = serde_json::from_str(&json).unwrap();
            assert_eq!(deal, back);
        }
    }
}
