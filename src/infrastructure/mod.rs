//! # Infrastructure Layer
//!
//! Adapters and engine-owned storage.
//!
//! - [`persistence`]: deal registry
//! - [`custody`]: token balances and transfer journal
//! - [`swap`]: swap venue port and adapters
//! - [`clock`]: time source

pub mod clock;
pub mod custody;
pub mod persistence;
pub mod swap;
