//! # Domain Entities
//!
//! Aggregate roots representing core business concepts.
//!
//! ## Aggregates
//!
//! - [`Deal`]: escrowed data-licensing deal with its lock-window state machine

pub mod deal;

pub use deal::{Deal, DealStatus, DealTerms, LogicVersion};
