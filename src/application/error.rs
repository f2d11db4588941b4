//! # Application Errors
//!
//! Error types surfaced by the [`DealEngine`](crate::application::services::DealEngine).
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Domain(DomainError)       - Deal lifecycle rule violations
//! ├── Gateway(SwapError)        - Swap venue quote/execution failures
//! ├── Registry(RegistryError)   - Unknown deal index, empty registry
//! ├── Custody(LedgerError)      - Custody cannot fund a transfer
//! ├── Unauthorized              - Caller lacks the admin/owner role
//! ├── Paused                    - Deal operations are paused
//! ├── PendingSettlements        - Withdrawal blocked by unsettled deals
//! └── ... (validation, unsupported operation, configuration)
//! ```
//!
//! Every variant maps to one flat [`ErrorKind`] for callers that only need
//! to branch on the failure class.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::application::error::{ApplicationError, ErrorKind};
//! use data_deal_escrow::application::services::Role;
//! use data_deal_escrow::domain::value_objects::Address;
//!
//! let err = ApplicationError::unauthorized(Role::Owner, Address::zero());
//! assert_eq!(err.kind(), ErrorKind::Unauthorized);
//! ```

use crate::application::services::access_gate::Role;
use crate::domain::errors::DomainError;
use crate::domain::value_objects::Address;
use crate::infrastructure::custody::LedgerError;
use crate::infrastructure::persistence::RegistryError;
use crate::infrastructure::swap::SwapError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Flat classification of engine failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Wrong role.
    Unauthorized,
    /// Deal operations paused.
    Paused,
    /// Unknown deal index.
    InvalidIndex,
    /// Redundant accept/decline.
    InvalidState,
    /// Decision window elapsed.
    WindowClosed,
    /// Settlement before the window elapsed.
    Locked,
    /// Refund attempted on an accepted deal.
    NotDeclined,
    /// Payout attempted on a declined deal.
    DeclinedState,
    /// Terminal settlement already done.
    AlreadySettled,
    /// Custody cannot fund the operation.
    InsufficientBalance,
    /// Swap venue failed.
    GatewayFailure,
    /// Withdrawal blocked by unsettled deals.
    PendingSettlements,
    /// Bad input.
    Validation,
    /// Operation not available in the current logic version.
    UnsupportedOperation,
    /// Checked arithmetic failed.
    Arithmetic,
    /// Configuration or snapshot could not be loaded.
    Configuration,
    /// Internal inconsistency.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Deal lifecycle rule violation.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Swap venue failure.
    #[error("gateway error: {0}")]
    Gateway(#[from] SwapError),

    /// Registry lookup failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Custody failure.
    #[error("custody error: {0}")]
    Custody(#[from] LedgerError),

    /// Caller lacks the required role.
    #[error("caller {caller:?} is not {role}")]
    Unauthorized {
        /// Required role.
        role: Role,
        /// Rejected caller.
        caller: Address,
    },

    /// Deal operations are paused.
    #[error("engine is paused")]
    Paused,

    /// Withdrawal blocked while eligible deals are unsettled.
    #[error("payout is still pending for {count} deal(s)")]
    PendingSettlements {
        /// Number of eligible unsettled deals.
        count: usize,
    },

    /// Operation not available in the current logic version.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration or snapshot error.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// `caller` does not hold `role`.
    #[must_use]
    pub fn unauthorized(role: Role, caller: Address) -> Self {
        Self::Unauthorized { role, caller }
    }

    /// Operation missing from the active logic version.
    #[must_use]
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOperation(message.into())
    }

    /// Rejected input.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Unusable configuration or snapshot.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Flat failure class, for callers that branch without matching nested errors.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Domain(e) => match e {
                DomainError::InvalidState(_) => ErrorKind::InvalidState,
                DomainError::WindowClosed { .. } => ErrorKind::WindowClosed,
                DomainError::Locked { .. } => ErrorKind::Locked,
                DomainError::NotDeclined(_) => ErrorKind::NotDeclined,
                DomainError::DeclinedState(_) => ErrorKind::DeclinedState,
                DomainError::AlreadySettled(_) => ErrorKind::AlreadySettled,
                DomainError::Validation(_) => ErrorKind::Validation,
                DomainError::Arithmetic(_) => ErrorKind::Arithmetic,
            },
            Self::Gateway(_) => ErrorKind::GatewayFailure,
            Self::Registry(e) => match e {
                RegistryError::InvalidIndex(_) | RegistryError::Empty => ErrorKind::InvalidIndex,
                RegistryError::Overflow => ErrorKind::Arithmetic,
                RegistryError::IndexMismatch { .. } | RegistryError::Corrupt(_) => {
                    ErrorKind::Internal
                }
            },
            Self::Custody(e) => match e {
                LedgerError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
                LedgerError::Arithmetic(_) => ErrorKind::Arithmetic,
            },
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Paused => ErrorKind::Paused,
            Self::PendingSettlements { .. } => ErrorKind::PendingSettlements,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// Returns true if re-issuing the operation unchanged may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Asset, DealIndex, TokenAmount};

    mod kinds {
        use super::*;

        #[test]
        fn domain_errors_keep_their_kind() {
            let err: ApplicationError = DomainError::AlreadySettled(DealIndex::new(1)).into();
            assert_eq!(err.kind(), ErrorKind::AlreadySettled);

            let err: ApplicationError = DomainError::NotDeclined(DealIndex::new(1)).into();
            assert_eq!(err.kind(), ErrorKind::NotDeclined);
        }

        #[test]
        fn registry_miss_is_invalid_index() {
            let err: ApplicationError = RegistryError::InvalidIndex(DealIndex::new(9)).into();
            assert_eq!(err.kind(), ErrorKind::InvalidIndex);
            let err: ApplicationError = RegistryError::Empty.into();
            assert_eq!(err.kind(), ErrorKind::InvalidIndex);
        }

        #[test]
        fn short_custody_is_insufficient_balance() {
            let err: ApplicationError = LedgerError::InsufficientBalance {
                asset: Asset::Utility,
                required: TokenAmount::from_units(20_000),
                available: TokenAmount::from_units(19_500),
            }
            .into();
            assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
            assert!(err.to_string().contains("19500"));
        }

        #[test]
        fn gateway_errors_are_gateway_failures() {
            let err: ApplicationError = SwapError::timeout("slow").into();
            assert_eq!(err.kind(), ErrorKind::GatewayFailure);
            assert!(err.is_retryable());
        }
    }

    mod display {
        use super::*;

        #[test]
        fn pending_settlements_names_count() {
            let err = ApplicationError::PendingSettlements { count: 2 };
            assert_eq!(err.to_string(), "payout is still pending for 2 deal(s)");
        }

        #[test]
        fn unauthorized_names_role() {
            let err = ApplicationError::unauthorized(Role::Admin, Address::zero());
            assert!(err.to_string().contains("admin"));
            assert!(!err.is_retryable());
        }

        #[test]
        fn kind_display_matches_variant() {
            assert_eq!(ErrorKind::WindowClosed.to_string(), "WindowClosed");
        }
    }
}
