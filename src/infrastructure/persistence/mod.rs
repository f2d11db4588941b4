//! # Persistence Layer
//!
//! Engine-owned storage of deal records.
//!
//! - [`DealRegistry`]: append-only deal arena with derived indexes

pub mod deal_registry;

pub use deal_registry::{DealRegistry, RegistryError, RegistryResult};
