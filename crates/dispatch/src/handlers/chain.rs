//! Handlers for chain commands and queries.

use async_trait::async_trait;
use domain::{Chain, DomainError, DomainResult};
use repository::{ChainRepository, StoreRepository};
use tokio_util::sync::CancellationToken;

use crate::command::{Command, CreateChain, DeleteChain, UpdateChain};
use crate::dispatcher::{Dispatcher, HandleCommand, HandleQuery};
use crate::query::{GetChain, GetChainIncludingStores};

use super::{build_store, index_error, map_repo_error};

#[async_trait]
impl<C, S> HandleCommand<CreateChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(name = %command.name, stores = command.stores.len()))]
    async fn handle(&self, command: CreateChain, cancel: &CancellationToken) -> DomainResult<Chain> {
        let mut errors = Vec::new();

        let chain = Chain::create(&command.name)
            .map_err(|e| errors.push(e))
            .ok();
        let chain_id = chain.as_ref().map(Chain::id);

        // Build every store regardless of earlier failures so the caller
        // sees all entity-build errors at once.
        let mut stores = Vec::with_capacity(command.stores.len());
        for (index, fields) in command.stores.iter().enumerate() {
            match build_store(chain_id, fields) {
                Ok(store) => stores.push(store),
                Err(err) => errors.push(index_error(index, err)),
            }
        }

        let (Some(mut chain), true) = (chain, errors.is_empty()) else {
            return Err(DomainError::aggregate(errors));
        };
        chain.add_stores(stores)?;

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(CreateChain::NAME));
        }

        self.chains().add(&chain).await.map_err(map_repo_error)?;
        Ok(chain)
    }
}

#[async_trait]
impl<C, S> HandleCommand<UpdateChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(id = %command.id))]
    async fn handle(&self, command: UpdateChain, cancel: &CancellationToken) -> DomainResult<()> {
        let mut chain = self
            .chains()
            .get_by_id(command.id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Chain", command.id))?;

        chain.update_details(&command.name)?;

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(UpdateChain::NAME));
        }

        self.chains()
            .update(&chain, command.modified_on)
            .await
            .map_err(map_repo_error)
    }
}

#[async_trait]
impl<C, S> HandleCommand<DeleteChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    #[tracing::instrument(skip_all, fields(id = %command.id))]
    async fn handle(&self, command: DeleteChain, cancel: &CancellationToken) -> DomainResult<()> {
        let count = self
            .chains()
            .count_stores(command.id)
            .await
            .map_err(map_repo_error)?;
        if count > 0 {
            return Err(DomainError::chain_has_stores(command.id));
        }

        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(DeleteChain::NAME));
        }

        self.chains()
            .delete(command.id)
            .await
            .map_err(map_repo_error)
    }
}

#[async_trait]
impl<C, S> HandleQuery<GetChain> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    async fn handle_query(&self, query: GetChain) -> DomainResult<Chain> {
        self.chains()
            .get_by_id(query.id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Chain", query.id))
    }
}

#[async_trait]
impl<C, S> HandleQuery<GetChainIncludingStores> for Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    async fn handle_query(&self, query: GetChainIncludingStores) -> DomainResult<Chain> {
        self.chains()
            .get_by_id_including_stores(query.id)
            .await
            .map_err(map_repo_error)?
            .ok_or_else(|| DomainError::not_found("Chain", query.id))
    }
}
