//! # Settlement Assets and Swap Paths
//!
//! The engine holds exactly two assets: the stable settlement token the
//! buyer's fiat is converted into, and the utility token deals are escrowed
//! in between creation and settlement.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One of the two assets held in custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    /// Stable settlement token (deposits, seller commissions, refunds).
    Stable,
    /// Utility/reward token (escrowed allocations, staking/platform shares).
    Utility,
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Utility => write!(f, "utility"),
        }
    }
}

/// Error returned for a malformed swap path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid swap path: {0}")]
pub struct InvalidSwapPathError(pub &'static str);

/// Ordered list of token addresses a swap routes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
pub struct SwapPath(Vec<Address>);

impl SwapPath {
    /// Creates a path.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSwapPathError`] if fewer than two hops are given or
    /// two consecutive hops are the same token.
    pub fn new(hops: Vec<Address>) -> Result<Self, InvalidSwapPathError> {
        if hops.len() < 2 {
            return Err(InvalidSwapPathError("path needs at least two tokens"));
        }
        if hops.windows(2).any(|pair| pair.first() == pair.get(1)) {
            return Err(InvalidSwapPathError("consecutive hops must differ"));
        }
        Ok(Self(hops))
    }

    /// Direct two-token path.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSwapPathError`] if `from == to`.
    pub fn direct(from: Address, to: Address) -> Result<Self, InvalidSwapPathError> {
        Self::new(vec![from, to])
    }

    /// Returns the hops.
    #[must_use]
    pub fn hops(&self) -> &[Address] {
        &self.0
    }

    /// Returns the input token.
    #[must_use]
    pub fn input(&self) -> Address {
        self.0.first().copied().unwrap_or_default()
    }

    /// Returns the output token.
    #[must_use]
    pub fn output(&self) -> Address {
        self.0.last().copied().unwrap_or_default()
    }
}

impl TryFrom<Vec<Address>> for SwapPath {
    type Error = InvalidSwapPathError;

    fn try_from(hops: Vec<Address>) -> Result<Self, Self::Error> {
        Self::new(hops)
    }
}

impl From<SwapPath> for Vec<Address> {
    fn from(path: SwapPath) -> Self {
        path.0
    }
}
