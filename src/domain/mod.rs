//! # Domain Layer
//!
//! Pure business logic with no I/O: the [`Deal`](entities::Deal) aggregate,
//! value objects, domain events, and the settlement calculator.

pub mod entities;
pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;
