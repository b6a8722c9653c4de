//! Chain aggregate root.

use chrono::{DateTime, Utc};
use common::ChainId;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::store::Store;

/// Maximum accepted chain name length.
const NAME_MAX_LEN: usize = 100;

/// A retail brand owning zero or more stores.
///
/// The chain is the consistency boundary for its stores: the owned
/// collection only ever contains stores whose `chain_id` equals the chain's
/// own id, and a chain may only be deleted once it owns none. `modified_on`
/// doubles as the optimistic concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    id: ChainId,
    name: String,
    stores: Vec<Store>,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
}

fn validate_name(name: &str) -> DomainResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::required("chain name"));
    }
    if trimmed.chars().count() > NAME_MAX_LEN {
        return Err(DomainError::too_long("chain name", NAME_MAX_LEN));
    }
    Ok(trimmed.to_string())
}

impl Chain {
    /// Validates and creates a chain with a freshly minted id and no stores.
    ///
    /// `created_on` and `modified_on` are set to the same instant.
    pub fn create(name: &str) -> DomainResult<Self> {
        let name = validate_name(name)?;
        let now = Utc::now();

        Ok(Self {
            id: ChainId::new(),
            name,
            stores: Vec::new(),
            created_on: now,
            modified_on: now,
        })
    }

    /// Rebuilds a persisted chain from row values without re-validating or
    /// re-minting id and timestamps. Repository use only.
    pub fn hydrate(
        id: ChainId,
        name: String,
        stores: Vec<Store>,
        created_on: DateTime<Utc>,
        modified_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            stores,
            created_on,
            modified_on,
        }
    }

    /// Appends stores to the owned collection.
    ///
    /// Every store must already carry this chain's id; callers build each
    /// store with the chain id resolved up front rather than re-parenting
    /// afterwards. Fails without appending anything if any store belongs
    /// elsewhere.
    pub fn add_stores(&mut self, stores: Vec<Store>) -> DomainResult<()> {
        for store in &stores {
            if store.chain_id() != Some(self.id) {
                return Err(DomainError::invalid(format!(
                    "store {} does not belong to chain {}",
                    store.number(),
                    self.id
                )));
            }
        }

        self.stores.extend(stores);
        Ok(())
    }

    /// Re-validates and overwrites the name, refreshing the token.
    pub fn update_details(&mut self, name: &str) -> DomainResult<()> {
        self.name = validate_name(name)?;
        self.modified_on = Utc::now();
        Ok(())
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The owned stores, in insertion order.
    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    pub fn created_on(&self) -> DateTime<Utc> {
        self.created_on
    }

    /// The optimistic concurrency token.
    pub fn modified_on(&self) -> DateTime<Utc> {
        self.modified_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::value_objects::{Address, Email, FullName, PhoneNumber};

    fn store_for(chain_id: Option<ChainId>, number: i32) -> Store {
        Store::create(
            chain_id,
            number,
            "Outlet",
            Address::create("Main St 1", "1000", "Copenhagen").unwrap(),
            PhoneNumber::create("45", "12345678").unwrap(),
            Email::create("owner@example.com").unwrap(),
            FullName::create("Ada", "Lovelace").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn create_mints_fresh_id_and_equal_timestamps() {
        let chain = Chain::create("Brand").unwrap();
        assert!(!chain.id().is_nil());
        assert_eq!(chain.created_on(), chain.modified_on());
        assert_eq!(chain.store_count(), 0);
    }

    #[test]
    fn create_trims_the_name() {
        let chain = Chain::create("  Brand  ").unwrap();
        assert_eq!(chain.name(), "Brand");
    }

    #[test]
    fn create_rejects_blank_names() {
        for name in ["", "   "] {
            let err = Chain::create(name).unwrap_err();
            assert_eq!(err.code, ErrorCode::ValueIsRequired);
        }
    }

    #[test]
    fn create_rejects_overlong_names() {
        let err = Chain::create(&"x".repeat(101)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueTooLong);
        assert!(Chain::create(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn add_stores_accepts_stores_carrying_the_chain_id() {
        let mut chain = Chain::create("Brand").unwrap();
        let stores = vec![
            store_for(Some(chain.id()), 1),
            store_for(Some(chain.id()), 2),
        ];

        chain.add_stores(stores).unwrap();
        assert_eq!(chain.store_count(), 2);
        assert_eq!(chain.stores()[0].number(), 1);
    }

    #[test]
    fn add_stores_rejects_foreign_stores_without_appending() {
        let mut chain = Chain::create("Brand").unwrap();
        let stores = vec![
            store_for(Some(chain.id()), 1),
            store_for(Some(ChainId::new()), 2),
        ];

        let err = chain.add_stores(stores).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsInvalid);
        assert_eq!(chain.store_count(), 0);
    }

    #[test]
    fn add_stores_rejects_independent_stores() {
        let mut chain = Chain::create("Brand").unwrap();
        let err = chain.add_stores(vec![store_for(None, 1)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsInvalid);
    }

    #[test]
    fn update_details_overwrites_name_and_bumps_token() {
        let mut chain = Chain::create("Brand").unwrap();
        let before = chain.modified_on();

        chain.update_details("Rebranded").unwrap();
        assert_eq!(chain.name(), "Rebranded");
        assert!(chain.modified_on() >= before);
    }

    #[test]
    fn update_details_rejects_blank_name_without_mutating() {
        let mut chain = Chain::create("Brand").unwrap();
        let token = chain.modified_on();

        let err = chain.update_details(" ").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsRequired);
        assert_eq!(chain.name(), "Brand");
        assert_eq!(chain.modified_on(), token);
    }

    #[test]
    fn hydrate_preserves_row_values() {
        let original = Chain::create("Brand").unwrap();
        let copy = Chain::hydrate(
            original.id(),
            original.name().to_string(),
            Vec::new(),
            original.created_on(),
            original.modified_on(),
        );

        assert_eq!(copy.id(), original.id());
        assert_eq!(copy.modified_on(), original.modified_on());
    }
}
