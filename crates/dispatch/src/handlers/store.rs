//! Handlers for store commands and queries.

use async_trait::async_trait;
use domain::{DomainError, DomainResult, Store};
use repository::{ChainRepository, StoreRepository};
use tokio_util::sync::CancellationToken;

use crate::command::{
    BulkCreateStores, Command, CreateStore, DeleteAllStoresByChain, DeleteStore, UpdateStore,
};
use crate::dispatcher::{Dispatcher, HandleCommand, HandleQuery};
use crate::query::{GetStore, GetStoresByChain};

use super::{build_store, build_store_parts, index_error, map_repo_error};

#[async_trait]
impl<C, S> HandleCommand<CreateStore> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(chain_id = %command.chain_id, number = command.fields.number))]
    async fn handle(&self, command: CreateStore, cancel: &CancellationToken) -> DomainResult<Store> {
        let store = build_store(Some(command.chain_id), &command.fields)?;

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(CreateStore::NAME));
        }

        self.stores().add(&store).await.map_err(map_repo_error)?;
        Ok(store)
    }
}

#[async_trait]
impl<C, S> HandleCommand<BulkCreateStores> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(count = command.stores.len()))]
    async fn handle(
        &self,
        command: BulkCreateStores,
        cancel: &CancellationToken,
    ) -> DomainResult<Vec<Store>> {
        if command.stores.is_empty() {
            return Ok(Vec::new());
        }

        // The batch must target a single chain (or be uniformly
        // independent) before any entity is built.
        let first = command.stores[0].chain_id;
        if command.stores.iter().any(|draft| draft.chain_id != first) {
            return Err(DomainError::shared_chain_id());
        }

        let mut errors = Vec::new();
        let mut stores = Vec::with_capacity(command.stores.len());
        for (index, draft) in command.stores.iter().enumerate() {
            match build_store(draft.chain_id, &draft.fields) {
                Ok(store) => stores.push(store),
                Err(err) => errors.push(index_error(index, err)),
            }
        }
        if !errors.is_empty() {
            return Err(DomainError::aggregate(errors));
        }

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(BulkCreateStores::NAME));
        }

        self.stores()
            .add_range(&stores)
            .await
            .map_err(map_repo_error)?;
        Ok(stores)
    }
}

#[async_trait]
impl<C, S> HandleCommand<UpdateStore> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(id = %command.id))]
    async fn handle(&self, command: UpdateStore, cancel: &CancellationToken) -> DomainResult<()> {
        let mut store = self
            .stores()
            .get_by_id(command.id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Store", command.id))?;

        let (address, phone, email, owner) = build_store_parts(&command.fields)?;
        store.update(
            command.chain_id,
            command.fields.number,
            &command.fields.name,
            address,
            phone,
            email,
            owner,
        )?;

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(UpdateStore::NAME));
        }

        self.stores()
            .update(&store, command.modified_on)
            .await
            .map_err(map_repo_error)
    }
}

#[async_trait]
impl<C, S> HandleCommand<DeleteStore> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(id = %command.id))]
    async fn handle(&self, command: DeleteStore, cancel: &CancellationToken) -> DomainResult<()> {
        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(DeleteStore::NAME));
        }

        self.stores()
            .delete(command.id)
            .await
            .map_err(map_repo_error)
    }
}

#[async_trait]
impl<C, S> HandleCommand<DeleteAllStoresByChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(chain_id = %command.chain_id))]
    async fn handle(
        &self,
        command: DeleteAllStoresByChain,
        cancel: &CancellationToken,
    ) -> DomainResult<u64> {
        self.chains()
            .get_by_id(command.chain_id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Chain", command.chain_id))?;

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(DeleteAllStoresByChain::NAME));
        }

        self.stores()
            .delete_by_chain(command.chain_id)
            .await
            .map_err(map_repo_error)
    }
}

#[async_trait]
impl<C, S> HandleQuery<GetStore> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    async fn handle_query(&self, query: GetStore) -> DomainResult<Store> {
        self.stores()
            .get_by_id(query.id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Store", query.id))
    }
}

#[async_trait]
impl<C, S> HandleQuery<GetStoresByChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    async fn handle_query(&self, query: GetStoresByChain) -> DomainResult<Vec<Store>> {
        self.stores()
            .get_all_by_chain(query.chain_id)
            .await
            .map_err(map_repo_error)
    }
}
