//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`DealEngine`]: Deal creation, lifecycle transitions and settlement
//! - [`AccessGate`]: Admin/owner roles and the pause switch

pub mod access_gate;
pub mod deal_engine;

pub use access_gate::{AccessGate, Role};
pub use deal_engine::{DealEngine, EngineSnapshot, SNAPSHOT_SCHEMA_VERSION, V2_FIRST_INDEX};
