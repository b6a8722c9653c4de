//! Commands: state-changing messages, one handler each.

use chrono::{DateTime, Utc};
use common::{ChainId, StoreId};
use domain::{Chain, Store};

/// Marker trait for commands.
///
/// A command represents an intention to change state. The dispatcher routes
/// each command type to exactly one handler and returns that handler's
/// result unmodified.
pub trait Command: Send {
    /// Value produced when the command succeeds.
    type Output: Send;

    /// Name used in spans and metrics.
    const NAME: &'static str;
}

/// Raw store field values as supplied by the presentation layer.
///
/// Field-level syntax has already been checked upstream; the value-object
/// factories applied by the handlers enforce the domain rules.
#[derive(Debug, Clone)]
pub struct StoreFields {
    pub number: i32,
    pub name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}

/// A store awaiting creation with its chain affiliation already resolved.
#[derive(Debug, Clone)]
pub struct StoreDraft {
    /// The owning chain, or `None` for an independent store.
    pub chain_id: Option<ChainId>,
    pub fields: StoreFields,
}

impl StoreDraft {
    pub fn new(chain_id: Option<ChainId>, fields: StoreFields) -> Self {
        Self { chain_id, fields }
    }
}

/// Command to create a chain together with its initial stores.
///
/// The stores are created owned by the new chain; an empty list creates a
/// chain with no stores.
#[derive(Debug, Clone)]
pub struct CreateChain {
    pub name: String,
    pub stores: Vec<StoreFields>,
}

impl CreateChain {
    pub fn new(name: impl Into<String>, stores: Vec<StoreFields>) -> Self {
        Self {
            name: name.into(),
            stores,
        }
    }
}

impl Command for CreateChain {
    type Output = Chain;
    const NAME: &'static str = "create_chain";
}

/// Command to rename a chain.
#[derive(Debug, Clone)]
pub struct UpdateChain {
    pub id: ChainId,
    pub name: String,

    /// The `modified_on` token the caller last read.
    pub modified_on: DateTime<Utc>,
}

impl UpdateChain {
    pub fn new(id: ChainId, name: impl Into<String>, modified_on: DateTime<Utc>) -> Self {
        Self {
            id,
            name: name.into(),
            modified_on,
        }
    }
}

impl Command for UpdateChain {
    type Output = ();
    const NAME: &'static str = "update_chain";
}

/// Command to delete a chain. Permitted only when it owns zero stores.
#[derive(Debug, Clone)]
pub struct DeleteChain {
    pub id: ChainId,
}

impl DeleteChain {
    pub fn new(id: ChainId) -> Self {
        Self { id }
    }
}

impl Command for DeleteChain {
    type Output = ();
    const NAME: &'static str = "delete_chain";
}

/// Command to create a single chain-affiliated store.
#[derive(Debug, Clone)]
pub struct CreateStore {
    pub chain_id: ChainId,
    pub fields: StoreFields,
}

impl CreateStore {
    pub fn new(chain_id: ChainId, fields: StoreFields) -> Self {
        Self { chain_id, fields }
    }
}

impl Command for CreateStore {
    type Output = Store;
    const NAME: &'static str = "create_store";
}

/// Command to create a batch of stores in one atomic pass.
///
/// All drafts must share a single `chain_id` value (or all be independent);
/// any invalid draft fails the whole batch before anything is persisted.
#[derive(Debug, Clone)]
pub struct BulkCreateStores {
    pub stores: Vec<StoreDraft>,
}

impl BulkCreateStores {
    pub fn new(stores: Vec<StoreDraft>) -> Self {
        Self { stores }
    }
}

impl Command for BulkCreateStores {
    type Output = Vec<Store>;
    const NAME: &'static str = "bulk_create_stores";
}

/// Command to overwrite a store's fields, including its chain affiliation.
#[derive(Debug, Clone)]
pub struct UpdateStore {
    pub id: StoreId,

    /// New affiliation; `None` makes the store independent.
    pub chain_id: Option<ChainId>,
    pub fields: StoreFields,

    /// The `modified_on` token the caller last read.
    pub modified_on: DateTime<Utc>,
}

impl UpdateStore {
    pub fn new(
        id: StoreId,
        chain_id: Option<ChainId>,
        fields: StoreFields,
        modified_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chain_id,
            fields,
            modified_on,
        }
    }
}

impl Command for UpdateStore {
    type Output = ();
    const NAME: &'static str = "update_store";
}

/// Command to delete a single store.
#[derive(Debug, Clone)]
pub struct DeleteStore {
    pub id: StoreId,
}

impl DeleteStore {
    pub fn new(id: StoreId) -> Self {
        Self { id }
    }
}

impl Command for DeleteStore {
    type Output = ();
    const NAME: &'static str = "delete_store";
}

/// Command to delete every store owned by a chain.
#[derive(Debug, Clone)]
pub struct DeleteAllStoresByChain {
    pub chain_id: ChainId,
}

impl DeleteAllStoresByChain {
    pub fn new(chain_id: ChainId) -> Self {
        Self { chain_id }
    }
}

impl Command for DeleteAllStoresByChain {
    /// Number of stores removed.
    type Output = u64;
    const NAME: &'static str = "delete_all_stores_by_chain";
}
