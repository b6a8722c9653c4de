//! Queries: read-only messages, one handler each.

use common::{ChainId, StoreId};
use domain::{Chain, Store};

/// Marker trait for queries.
///
/// A missing row is a recoverable `RecordNotFound` failure, never an
/// unrecovered fault.
pub trait Query: Send {
    /// Value produced when the query succeeds.
    type Output: Send;

    /// Name used in spans and metrics.
    const NAME: &'static str;
}

/// Fetches a chain without its stores.
#[derive(Debug, Clone)]
pub struct GetChain {
    pub id: ChainId,
}

impl GetChain {
    pub fn new(id: ChainId) -> Self {
        Self { id }
    }
}

impl Query for GetChain {
    type Output = Chain;
    const NAME: &'static str = "get_chain";
}

/// Fetches a chain together with its owned stores.
#[derive(Debug, Clone)]
pub struct GetChainIncludingStores {
    pub id: ChainId,
}

impl GetChainIncludingStores {
    pub fn new(id: ChainId) -> Self {
        Self { id }
    }
}

impl Query for GetChainIncludingStores {
    type Output = Chain;
    const NAME: &'static str = "get_chain_including_stores";
}

/// Fetches a single store.
#[derive(Debug, Clone)]
pub struct GetStore {
    pub id: StoreId,
}

impl GetStore {
    pub fn new(id: StoreId) -> Self {
        Self { id }
    }
}

impl Query for GetStore {
    type Output = Store;
    const NAME: &'static str = "get_store";
}

/// Fetches every store owned by a chain, ordered by store number.
#[derive(Debug, Clone)]
pub struct GetStoresByChain {
    pub chain_id: ChainId,
}

impl GetStoresByChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }
}

impl Query for GetStoresByChain {
    type Output = Vec<Store>;
    const NAME: &'static str = "get_stores_by_chain";
}
