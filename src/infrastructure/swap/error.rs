//! # Swap Errors
//!
//! Failures reported by a [`SwapGateway`](super::traits::SwapGateway).
//!
//! The engine never retries a swap itself. A failed swap aborts the
//! whole deal operation, and [`SwapError::is_retryable`] tells the caller
//! whether submitting that operation again can succeed.
//!
//! # Examples
//!
//! ```
//! use data_deal_escrow::infrastructure::swap::error::SwapError;
//!
//! assert!(SwapError::timeout("router did not answer").is_retryable());
//! assert!(!SwapError::invalid_request("empty path").is_retryable());
//! ```

use crate::domain::value_objects::timestamp::Timestamp;
use crate::domain::value_objects::TokenAmount;
use thiserror::Error;

/// Error type for swap gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SwapError {
    /// The venue did not answer in time.
    #[error("swap venue timeout: {0}")]
    Timeout(String),

    /// Transport failure talking to the venue.
    #[error("swap venue unreachable: {0}")]
    Connection(String),

    /// The request itself is malformed.
    #[error("invalid swap request: {0}")]
    InvalidRequest(String),

    /// No quote for the path, usually a missing pair or empty reserves.
    #[error("swap quote unavailable: {0}")]
    QuoteUnavailable(String),

    /// Output fell below the slippage floor.
    #[error("swap output {actual} below minimum {min_out}")]
    SlippageExceeded {
        /// Requested floor.
        min_out: TokenAmount,
        /// What the venue would deliver.
        actual: TokenAmount,
    },

    /// The swap deadline passed before execution.
    #[error("swap deadline {deadline} expired")]
    DeadlineExpired {
        /// The deadline.
        deadline: Timestamp,
    },

    /// The venue rejected the swap at the given stage.
    #[error("swap rejected during {stage}: {reason}")]
    Rejected {
        /// Where the rejection happened (`simulation`, `send`, `receipt`).
        stage: &'static str,
        /// Venue-provided reason.
        reason: String,
    },

    /// Amount does not fit the venue's integer units.
    #[error("swap amount conversion failed: {0}")]
    Conversion(String),
}

impl SwapError {
    /// Timeout with a message.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Transport failure with a message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Malformed request.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Missing quote.
    #[must_use]
    pub fn quote_unavailable(message: impl Into<String>) -> Self {
        Self::QuoteUnavailable(message.into())
    }

    /// Rejection at `stage`.
    #[must_use]
    pub fn rejected(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::Rejected {
            stage,
            reason: reason.into(),
        }
    }

    /// Unit conversion failure.
    #[must_use]
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// True when resubmitting the same operation may succeed.
    ///
    /// Price movement and deadlines are transient; a rejected or malformed
    /// swap will fail the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::Connection(_)
                | Self::SlippageExceeded { .. }
                | Self::DeadlineExpired { .. }
        )
    }
}

/// Result type for swap operations.
pub type SwapResult<T> = Result<T, SwapError>;
