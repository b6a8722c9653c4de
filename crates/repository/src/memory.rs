use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ChainId, StoreId};
use domain::{Chain, Store};
use tokio::sync::RwLock;

use crate::contracts::{ChainRepository, StoreRepository};
use crate::error::{RepositoryError, Result};

/// In-memory repository implementation for testing.
///
/// Implements both repository contracts over shared maps, simulating the
/// unique constraints, foreign-key checks, and optimistic token semantics
/// of the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    chains: Arc<RwLock<HashMap<ChainId, Chain>>>,
    stores: Arc<RwLock<HashMap<StoreId, Store>>>,
}

/// A chain row: the aggregate without its owned stores.
fn chain_row(chain: &Chain) -> Chain {
    Chain::hydrate(
        chain.id(),
        chain.name().to_string(),
        Vec::new(),
        chain.created_on(),
        chain.modified_on(),
    )
}

impl InMemoryRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of persisted chains.
    pub async fn chain_count(&self) -> usize {
        self.chains.read().await.len()
    }

    /// Returns the total number of persisted stores.
    pub async fn store_count(&self) -> usize {
        self.stores.read().await.len()
    }

    /// Clears all chains and stores.
    pub async fn clear(&self) {
        self.chains.write().await.clear();
        self.stores.write().await.clear();
    }

    fn check_unique_number(
        stores: &HashMap<StoreId, Store>,
        candidate: &Store,
    ) -> Result<()> {
        let taken = stores
            .values()
            .any(|s| s.number() == candidate.number() && s.id() != candidate.id());
        if taken {
            return Err(RepositoryError::UniqueViolation {
                entity: "Store",
                field: "number",
                value: candidate.number().to_string(),
            });
        }
        Ok(())
    }

    fn check_chain_exists(
        chains: &HashMap<ChainId, Chain>,
        store: &Store,
    ) -> Result<()> {
        if let Some(chain_id) = store.chain_id()
            && !chains.contains_key(&chain_id)
        {
            return Err(RepositoryError::MissingChain(chain_id));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainRepository for InMemoryRepository {
    async fn add(&self, chain: &Chain) -> Result<()> {
        let mut chains = self.chains.write().await;
        let mut stores = self.stores.write().await;

        if chains.values().any(|c| c.name() == chain.name()) {
            return Err(RepositoryError::UniqueViolation {
                entity: "Chain",
                field: "name",
                value: chain.name().to_string(),
            });
        }

        // Validate every row before writing anything: all-or-nothing.
        for (i, store) in chain.stores().iter().enumerate() {
            Self::check_unique_number(&stores, store)?;
            let duplicate_in_batch = chain.stores()[..i]
                .iter()
                .any(|other| other.number() == store.number());
            if duplicate_in_batch {
                return Err(RepositoryError::UniqueViolation {
                    entity: "Store",
                    field: "number",
                    value: store.number().to_string(),
                });
            }
        }

        chains.insert(chain.id(), chain_row(chain));
        for store in chain.stores() {
            stores.insert(store.id(), store.clone());
        }
        Ok(())
    }

    async fn get_by_id(&self, id: ChainId) -> Result<Option<Chain>> {
        Ok(self.chains.read().await.get(&id).map(chain_row))
    }

    async fn get_by_id_including_stores(&self, id: ChainId) -> Result<Option<Chain>> {
        let chains = self.chains.read().await;
        let Some(chain) = chains.get(&id) else {
            return Ok(None);
        };

        let stores = self.stores.read().await;
        let mut owned: Vec<Store> = stores
            .values()
            .filter(|s| s.chain_id() == Some(id))
            .cloned()
            .collect();
        owned.sort_by_key(Store::number);

        let mut result = chain_row(chain);
        result
            .add_stores(owned)
            .map_err(|e| RepositoryError::Decode(e.message))?;
        Ok(Some(result))
    }

    async fn update(&self, chain: &Chain, expected_modified_on: DateTime<Utc>) -> Result<()> {
        let mut chains = self.chains.write().await;

        let taken = chains
            .values()
            .any(|c| c.name() == chain.name() && c.id() != chain.id());
        if taken {
            return Err(RepositoryError::UniqueViolation {
                entity: "Chain",
                field: "name",
                value: chain.name().to_string(),
            });
        }

        let Some(current) = chains.get(&chain.id()) else {
            return Err(RepositoryError::NotFound {
                entity: "Chain",
                id: chain.id().to_string(),
            });
        };
        if current.modified_on() != expected_modified_on {
            return Err(RepositoryError::ConcurrencyConflict {
                entity: "Chain",
                id: chain.id().to_string(),
            });
        }

        chains.insert(chain.id(), chain_row(chain));
        Ok(())
    }

    async fn delete(&self, id: ChainId) -> Result<()> {
        let mut chains = self.chains.write().await;
        let stores = self.stores.read().await;

        if !chains.contains_key(&id) {
            return Err(RepositoryError::NotFound {
                entity: "Chain",
                id: id.to_string(),
            });
        }
        if stores.values().any(|s| s.chain_id() == Some(id)) {
            return Err(RepositoryError::ChainNotEmpty(id));
        }

        chains.remove(&id);
        Ok(())
    }

    async fn count_stores(&self, id: ChainId) -> Result<u64> {
        let stores = self.stores.read().await;
        Ok(stores.values().filter(|s| s.chain_id() == Some(id)).count() as u64)
    }
}

#[async_trait]
impl StoreRepository for InMemoryRepository {
    async fn add(&self, store: &Store) -> Result<()> {
        let chains = self.chains.read().await;
        let mut stores = self.stores.write().await;

        Self::check_chain_exists(&chains, store)?;
        Self::check_unique_number(&stores, store)?;

        stores.insert(store.id(), store.clone());
        Ok(())
    }

    async fn add_range(&self, batch: &[Store]) -> Result<()> {
        let chains = self.chains.read().await;
        let mut stores = self.stores.write().await;

        // Validate every row before writing anything: all-or-nothing.
        for (i, store) in batch.iter().enumerate() {
            Self::check_chain_exists(&chains, store)?;
            Self::check_unique_number(&stores, store)?;
            let duplicate_in_batch = batch[..i]
                .iter()
                .any(|other| other.number() == store.number());
            if duplicate_in_batch {
                return Err(RepositoryError::UniqueViolation {
                    entity: "Store",
                    field: "number",
                    value: store.number().to_string(),
                });
            }
        }

        for store in batch {
            stores.insert(store.id(), store.clone());
        }
        Ok(())
    }

    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>> {
        Ok(self.stores.read().await.get(&id).cloned())
    }

    async fn get_all_by_chain(&self, chain_id: ChainId) -> Result<Vec<Store>> {
        let stores = self.stores.read().await;
        let mut owned: Vec<Store> = stores
            .values()
            .filter(|s| s.chain_id() == Some(chain_id))
            .cloned()
            .collect();
        owned.sort_by_key(Store::number);
        Ok(owned)
    }

    async fn update(&self, store: &Store, expected_modified_on: DateTime<Utc>) -> Result<()> {
        let chains = self.chains.read().await;
        let mut stores = self.stores.write().await;

        let Some(current) = stores.get(&store.id()) else {
            return Err(RepositoryError::NotFound {
                entity: "Store",
                id: store.id().to_string(),
            });
        };
        if current.modified_on() != expected_modified_on {
            return Err(RepositoryError::ConcurrencyConflict {
                entity: "Store",
                id: store.id().to_string(),
            });
        }

        Self::check_chain_exists(&chains, store)?;
        Self::check_unique_number(&stores, store)?;

        stores.insert(store.id(), store.clone());
        Ok(())
    }

    async fn delete(&self, id: StoreId) -> Result<()> {
        let mut stores = self.stores.write().await;
        if stores.remove(&id).is_none() {
            return Err(RepositoryError::NotFound {
                entity: "Store",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_by_chain(&self, chain_id: ChainId) -> Result<u64> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|_, s| s.chain_id() != Some(chain_id));
        Ok((before - stores.len()) as u64)
    }
}
