//! Typed message dispatcher.

use async_trait::async_trait;
use domain::{DomainError, DomainResult};
use repository::{ChainRepository, StoreRepository};
use tokio_util::sync::CancellationToken;

use crate::command::Command;
use crate::query::Query;

/// Handler for a single command type.
///
/// Implemented on [`Dispatcher`] once per command, so the type system
/// guarantees exactly one handler per message.
#[async_trait]
pub trait HandleCommand<M: Command> {
    async fn handle(&self, command: M, cancel: &CancellationToken) -> DomainResult<M::Output>;
}

/// Handler for a single query type.
#[async_trait]
pub trait HandleQuery<Q: Query> {
    async fn handle_query(&self, query: Q) -> DomainResult<Q::Output>;
}

/// Routes commands and queries to their handlers.
///
/// Holds the repository pair every handler orchestrates; no other state is
/// shared between operations, so concurrent dispatches only coordinate
/// through the storage layer.
pub struct Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    chains: C,
    stores: S,
}

impl<C, S> Dispatcher<C, S>
where
    C: ChainRepository,
    S: StoreRepository,
{
    /// Creates a dispatcher over the given repositories.
    pub fn new(chains: C, stores: S) -> Self {
        Self { chains, stores }
    }

    pub(crate) fn chains(&self) -> &C {
        &self.chains
    }

    pub(crate) fn stores(&self) -> &S {
        &self.stores
    }

    /// Dispatches a command to its handler and returns the handler's
    /// result unmodified.
    ///
    /// A token observed cancelled before the handler runs aborts the
    /// operation with `OperationCancelled`; handlers re-check the token
    /// before each transactional write so no partial writes survive a
    /// cancellation.
    pub async fn dispatch<M>(&self, command: M, cancel: CancellationToken) -> DomainResult<M::Output>
    where
        M: Command,
        Self: HandleCommand<M>,
    {
        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(M::NAME));
        }

        let result = self.handle(command, &cancel).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("commands_dispatched_total", "command" => M::NAME, "outcome" => outcome)
            .increment(1);
        result
    }

    /// Dispatches a query to its handler.
    ///
    /// Queries take the same cancellation signal as commands; a token
    /// observed cancelled before the handler runs aborts the read.
    pub async fn query<Q>(&self, query: Q, cancel: CancellationToken) -> DomainResult<Q::Output>
    where
        Q: Query,
        Self: HandleQuery<Q>,
    {
        if cancel.is_cancelled() {
            return Err(DomainError::cancelled(Q::NAME));
        }

        let result = self.handle_query(query).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!("queries_dispatched_total", "query" => Q::NAME, "outcome" => outcome)
            .increment(1);
        result
    }
}
