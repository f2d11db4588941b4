//! # Custody Ledger
//!
//! Engine-owned balances of the two custody assets plus a journal of every
//! movement.
//!
//! Transfers of one operation are staged in a [`TransferBatch`]. The engine
//! checks the batch with [`CustodyLedger::ensure_covers`] before any
//! external call and applies it with [`CustodyLedger::commit`] afterwards;
//! `commit` re-checks and then applies every entry or none.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::infrastructure::custody::{CustodyLedger, TransferBatch, TransferReason};
//! use data_deal_escrow::domain::value_objects::{Address, Asset, TokenAmount};
//!
//! let mut ledger = CustodyLedger::new();
//! ledger
//!     .deposit(Asset::Utility, TokenAmount::from_units(100), Address::zero())
//!     .unwrap();
//!
//! let mut batch = TransferBatch::new();
//! batch.debit(Asset::Utility, TokenAmount::from_units(150), Address::zero(), TransferReason::StakingShare);
//! assert!(ledger.commit(batch).is_err());
//! assert_eq!(ledger.balance(Asset::Utility), TokenAmount::from_units(100));
//! ```

use crate::domain::value_objects::{Address, ArithmeticError, Asset, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Error type for custody operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Custody cannot fund the requested outflow.
    #[error("insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Asset that is short.
        asset: Asset,
        /// Total outflow requested.
        required: TokenAmount,
        /// Balance held.
        available: TokenAmount,
    },

    /// Balance arithmetic failed.
    #[error("ledger arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Result type for custody operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Direction of a ledger movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Into custody.
    In,
    /// Out of custody.
    Out,
}

/// Why tokens moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    /// External transfer into custody.
    Deposit,
    /// Utility tokens bought at deal creation.
    CreationSwapIn,
    /// Stable price sold at deal creation.
    CreationSwapOut,
    /// Utility tokens sold for a seller payout or buyer refund.
    SettlementSwap,
    /// Staking share of a payout remainder.
    StakingShare,
    /// Platform share of a payout remainder.
    PlatformShare,
    /// Owner sweep.
    Withdrawal,
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deposit => "deposit",
            Self::CreationSwapIn => "creation_swap_in",
            Self::CreationSwapOut => "creation_swap_out",
            Self::SettlementSwap => "settlement_swap",
            Self::StakingShare => "staking_share",
            Self::PlatformShare => "platform_share",
            Self::Withdrawal => "withdrawal",
        };
        f.write_str(name)
    }
}

/// One recorded movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Moved asset.
    pub asset: Asset,
    /// In or out.
    pub direction: Direction,
    /// Amount moved.
    pub amount: TokenAmount,
    /// Source for inflows, destination for outflows.
    pub counterparty: Address,
    /// Why.
    pub reason: TransferReason,
}

/// Transfers staged for one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferBatch {
    entries: Vec<LedgerEntry>,
}

impl TransferBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages an outflow. Zero amounts are skipped.
    pub fn debit(&mut self, asset: Asset, amount: TokenAmount, to: Address, reason: TransferReason) {
        self.push(asset, Direction::Out, amount, to, reason);
    }

    /// Stages an inflow. Zero amounts are skipped.
    pub fn credit(&mut self, asset: Asset, amount: TokenAmount, from: Address, reason: TransferReason) {
        self.push(asset, Direction::In, amount, from, reason);
    }

    /// Staged entries.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Returns true if nothing is staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total staged outflow per asset.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` on overflow.
    pub fn outflows(&self) -> Result<BTreeMap<Asset, TokenAmount>, ArithmeticError> {
        let mut totals = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.direction == Direction::Out) {
            let total: &mut TokenAmount = totals.entry(entry.asset).or_default();
            *total = total.checked_add(entry.amount)?;
        }
        Ok(totals)
    }

    fn push(
        &mut self,
        asset: Asset,
        direction: Direction,
        amount: TokenAmount,
        counterparty: Address,
        reason: TransferReason,
    ) {
        if amount.is_zero() {
            return;
        }
        self.entries.push(LedgerEntry {
            asset,
            direction,
            amount,
            counterparty,
            reason,
        });
    }
}

/// Stable and utility balances held by the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyLedger {
    stable: TokenAmount,
    utility: TokenAmount,
    journal: Vec<LedgerEntry>,
}

impl CustodyLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current balance of `asset`.
    #[must_use]
    pub fn balance(&self, asset: Asset) -> TokenAmount {
        match asset {
            Asset::Stable => self.stable,
            Asset::Utility => self.utility,
        }
    }

    /// Every committed movement, oldest first.
    ///
    /// Retained for the ledger's lifetime; [`transferred_to`](Self::transferred_to)
    /// is summed from it.
    #[must_use]
    pub fn journal(&self) -> &[LedgerEntry] {
        &self.journal
    }

    /// Sum of `asset` sent out to `recipient`.
    #[must_use]
    pub fn transferred_to(&self, recipient: Address, asset: Asset) -> TokenAmount {
        self.journal
            .iter()
            .filter(|e| e.direction == Direction::Out && e.asset == asset && e.counterparty == recipient)
            .fold(TokenAmount::ZERO, |acc, e| {
                acc.checked_add(e.amount).unwrap_or(acc)
            })
    }

    /// Records an external transfer into custody.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Arithmetic` on overflow.
    pub fn deposit(&mut self, asset: Asset, amount: TokenAmount, from: Address) -> LedgerResult<()> {
        let mut batch = TransferBatch::new();
        batch.credit(asset, amount, from, TransferReason::Deposit);
        self.commit(batch)
    }

    /// Checks that current balances cover every staged outflow.
    ///
    /// Inflows staged in the same batch do not count towards coverage.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientBalance` naming the first short asset.
    pub fn ensure_covers(&self, batch: &TransferBatch) -> LedgerResult<()> {
        for (asset, required) in batch.outflows()? {
            let available = self.balance(asset);
            if required > available {
                return Err(LedgerError::InsufficientBalance {
                    asset,
                    required,
                    available,
                });
            }
        }
        Ok(())
    }

    /// Applies a batch atomically.
    ///
    /// # Errors
    ///
    /// - `LedgerError::InsufficientBalance` if an outflow is not covered
    /// - `LedgerError::Arithmetic` on overflow
    ///
    /// On error no balance changes.
    pub fn commit(&mut self, batch: TransferBatch) -> LedgerResult<()> {
        self.ensure_covers(&batch)?;

        let mut stable = self.stable;
        let mut utility = self.utility;
        for entry in batch.entries() {
            let balance = match entry.asset {
                Asset::Stable => &mut stable,
                Asset::Utility => &mut utility,
            };
            *balance = match entry.direction {
                Direction::In => balance.checked_add(entry.amount)?,
                Direction::Out => balance.checked_sub(entry.amount)?,
            };
        }

        self.stable = stable;
        self.utility = utility;
        self.journal.extend(batch.entries);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn units(value: u64) -> TokenAmount {
        TokenAmount::from_units(value)
    }

    fn funded(stable: u64, utility: u64) -> CustodyLedger {
        let mut ledger = CustodyLedger::new();
        ledger.deposit(Asset::Stable, units(stable), Address::zero()).unwrap();
        ledger.deposit(Asset::Utility, units(utility), Address::zero()).unwrap();
        ledger
    }

    mod batches {
        use super::*;

        #[test]
        fn zero_amounts_are_not_staged() {
            let mut batch = TransferBatch::new();
            batch.debit(Asset::Utility, TokenAmount::ZERO, Address::zero(), TransferReason::StakingShare);
            assert!(batch.is_empty());
        }

        #[test]
        fn outflows_sum_per_asset() {
            let mut batch = TransferBatch::new();
            batch.debit(Asset::Utility, units(3), Address::zero(), TransferReason::SettlementSwap);
            batch.debit(Asset::Utility, units(4), Address::zero(), TransferReason::StakingShare);
            batch.credit(Asset::Stable, units(9), Address::zero(), TransferReason::Deposit);
            let totals = batch.outflows().unwrap();
            assert_eq!(totals.get(&Asset::Utility), Some(&units(7)));
            assert!(!totals.contains_key(&Asset::Stable));
        }
    }

    mod commit {
        use super::*;

        #[test]
        fn applies_all_entries() {
            let mut ledger = funded(1_000, 20_000);
            let staking = Address::repeat_byte(5);

            let mut batch = TransferBatch::new();
            batch.debit(Asset::Utility, units(16_000), Address::zero(), TransferReason::SettlementSwap);
            batch.debit(Asset::Utility, units(2_000), staking, TransferReason::StakingShare);
            ledger.commit(batch).unwrap();

            assert_eq!(ledger.balance(Asset::Utility), units(2_000));
            assert_eq!(ledger.transferred_to(staking, Asset::Utility), units(2_000));
        }

        #[test]
        fn short_batch_changes_nothing() {
            let mut ledger = funded(0, 19_500);
            let before = ledger.clone();

            let mut batch = TransferBatch::new();
            batch.debit(Asset::Utility, units(17_777), Address::zero(), TransferReason::SettlementSwap);
            batch.debit(Asset::Utility, units(2_223), Address::zero(), TransferReason::StakingShare);

            let err = ledger.commit(batch).unwrap_err();
            assert_eq!(
                err,
                LedgerError::InsufficientBalance {
                    asset: Asset::Utility,
                    required: units(20_000),
                    available: units(19_500),
                }
            );
            assert_eq!(ledger, before);
        }

        #[test]
        fn same_batch_credit_does_not_fund_debit() {
            let ledger = funded(0, 0);
            let mut batch = TransferBatch::new();
            batch.credit(Asset::Utility, units(10), Address::zero(), TransferReason::CreationSwapIn);
            batch.debit(Asset::Utility, units(10), Address::zero(), TransferReason::StakingShare);
            assert!(ledger.ensure_covers(&batch).is_err());
        }

        #[test]
        fn journal_records_in_order() {
            let ledger = funded(5, 7);
            let reasons: Vec<_> = ledger.journal().iter().map(|e| e.asset).collect();
            assert_eq!(reasons, vec![Asset::Stable, Asset::Utility]);
        }
    }
}
