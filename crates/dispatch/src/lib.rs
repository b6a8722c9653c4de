//! Command/query dispatch layer for the retail chain system.
//!
//! Callers build a command or query, hand it to the [`Dispatcher`], and get
//! back a `DomainResult` unmodified from the single handler the message
//! type routes to. Handlers orchestrate entity creation/mutation,
//! repository calls, and result composition; they hold no state of their
//! own.

pub mod command;
pub mod dispatcher;
pub mod handlers;
pub mod query;

pub use command::{
    BulkCreateStores, Command, CreateChain, CreateStore, DeleteAllStoresByChain, DeleteChain,
    DeleteStore, StoreDraft, StoreFields, UpdateChain, UpdateStore,
};
pub use dispatcher::{Dispatcher, HandleCommand, HandleQuery};
pub use query::{GetChain, GetChainIncludingStores, GetStore, GetStoresByChain, Query};
pub use tokio_util::sync::CancellationToken;
