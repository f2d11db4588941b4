//! # Custody
//!
//! Engine-owned token balances and their transfer journal.

pub mod ledger;

pub use ledger::{
    CustodyLedger, Direction, LedgerEntry, LedgerError, LedgerResult, TransferBatch,
    TransferReason,
};
