//! # Swap Venue
//!
//! Port and adapters for the external swap venue.
//!
//! - [`SwapGateway`]: the port
//! - [`ScriptedSwapGateway`]: in-memory scripted venue
//! - [`UniswapV2Gateway`]: on-chain Uniswap V2 router

pub mod error;
pub mod in_memory;
pub mod traits;
pub mod uniswap;

pub use error::{SwapError, SwapResult};
pub use in_memory::ScriptedSwapGateway;
pub use traits::{SwapGateway, SwapOrder, SwapReceipt};
pub use uniswap::UniswapV2Gateway;
