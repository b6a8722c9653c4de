use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ChainId, StoreId};
use domain::{Chain, Store};

use crate::Result;

/// Persistence operations for the Chain aggregate.
///
/// All implementations must be thread-safe (Send + Sync). Write-path
/// methods are internally transactional: a failing call leaves no partial
/// writes behind.
#[async_trait]
pub trait ChainRepository: Send + Sync {
    /// Persists a chain together with its owned stores.
    ///
    /// Runs as a single read-committed transaction committed only after
    /// every row write succeeds; any failure rolls the whole unit back.
    async fn add(&self, chain: &Chain) -> Result<()>;

    /// Fetches a chain without its stores. Plain single-row read; no
    /// explicit transaction.
    async fn get_by_id(&self, id: ChainId) -> Result<Option<Chain>>;

    /// Fetches a chain with its owned stores, ordered by store number.
    async fn get_by_id_including_stores(&self, id: ChainId) -> Result<Option<Chain>>;

    /// Optimistic single-row update of the chain's own fields.
    ///
    /// `expected_modified_on` is the token the writer last read; a stale
    /// token fails with [`crate::RepositoryError::ConcurrencyConflict`],
    /// a missing row with [`crate::RepositoryError::NotFound`].
    async fn update(&self, chain: &Chain, expected_modified_on: DateTime<Utc>) -> Result<()>;

    /// Deletes the chain row.
    ///
    /// Runs under repeatable read and re-verifies inside the transaction
    /// that no stores reference the chain, failing with
    /// [`crate::RepositoryError::ChainNotEmpty`] if one appeared between
    /// the caller's count and the delete.
    async fn delete(&self, id: ChainId) -> Result<()>;

    /// Counts the stores owned by the chain.
    ///
    /// Runs under repeatable read so the count is stable for the
    /// read-then-act sequences that depend on it.
    async fn count_stores(&self, id: ChainId) -> Result<u64>;
}

/// Persistence operations for Store entities.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// Persists a single store.
    async fn add(&self, store: &Store) -> Result<()>;

    /// Persists a batch of stores as one read-committed transaction.
    ///
    /// All rows are written or none are; partial success is never
    /// observable.
    async fn add_range(&self, stores: &[Store]) -> Result<()>;

    /// Plain single-row read; no explicit transaction.
    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>>;

    /// Fetches every store owned by a chain, ordered by store number.
    async fn get_all_by_chain(&self, chain_id: ChainId) -> Result<Vec<Store>>;

    /// Optimistic single-row update keyed on `expected_modified_on`; see
    /// [`ChainRepository::update`] for the token semantics.
    async fn update(&self, store: &Store, expected_modified_on: DateTime<Utc>) -> Result<()>;

    /// Deletes a store row, failing with
    /// [`crate::RepositoryError::NotFound`] if it does not exist.
    async fn delete(&self, id: StoreId) -> Result<()>;

    /// Deletes every store owned by the chain as one transaction and
    /// returns the number of rows removed.
    async fn delete_by_chain(&self, chain_id: ChainId) -> Result<u64>;
}
