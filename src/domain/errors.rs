//! # Domain Errors
//!
//! Business-rule violations raised by the [`Deal`](crate::domain::entities::Deal)
//! aggregate and the settlement calculator.

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::{ArithmeticError, DealIndex};
use thiserror::Error;

/// Error type for domain rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Redundant accept/decline.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Accept/decline attempted after the decision window closed.
    #[error("decision window for deal {index} closed at {closed_at}")]
    WindowClosed {
        /// The deal.
        index: DealIndex,
        /// End of the window.
        closed_at: Timestamp,
    },

    /// Settlement attempted before the lock window elapsed.
    #[error("deal {index} is locked until {unlocks_at}")]
    Locked {
        /// The deal.
        index: DealIndex,
        /// When settlement becomes possible.
        unlocks_at: Timestamp,
    },

    /// Decline settlement attempted on an accepted deal.
    #[error("deal {0} was not declined")]
    NotDeclined(DealIndex),

    /// Payout attempted on a declined deal.
    #[error("deal {0} was declined by the buyer")]
    DeclinedState(DealIndex),

    /// Terminal settlement already happened.
    #[error("deal {0} is already settled")]
    AlreadySettled(DealIndex),

    /// Input failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

impl DomainError {
    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
