//! # Application Layer
//!
//! The [`DealEngine`](services::DealEngine) and its error surface.

pub mod error;
pub mod services;
