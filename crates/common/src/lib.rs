//! Shared identifier types for the retail chain system.

pub mod types;

pub use types::{ChainId, StoreId};
