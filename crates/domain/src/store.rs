//! Store entity.

use chrono::{DateTime, Utc};
use common::{ChainId, StoreId};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_objects::{Address, Email, FullName, PhoneNumber};

/// An individual retail outlet.
///
/// A store is either chain-affiliated (`chain_id` set) or independent
/// (`chain_id` absent). The store number is unique across all stores; the
/// uniqueness itself is enforced by the persistence layer. `modified_on`
/// doubles as the optimistic concurrency token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    id: StoreId,
    chain_id: Option<ChainId>,
    number: i32,
    name: String,
    address: Address,
    phone: PhoneNumber,
    email: Email,
    owner: FullName,
    created_on: DateTime<Utc>,
    modified_on: DateTime<Utc>,
}

fn validate_store_fields(chain_id: Option<ChainId>, name: &str) -> DomainResult<String> {
    let mut errors = Vec::new();

    if let Some(id) = chain_id
        && id.is_nil()
    {
        errors.push(DomainError::required("chain id"));
    }

    let trimmed = name.trim();
    if trimmed.is_empty() {
        errors.push(DomainError::required("store name"));
    }

    if errors.is_empty() {
        Ok(trimmed.to_string())
    } else {
        Err(DomainError::aggregate(errors))
    }
}

impl Store {
    /// Validates and creates a store with a freshly minted id.
    ///
    /// Fails if `chain_id` is present but nil, or if the name is blank.
    /// Value objects arrive already validated by their own factories.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        chain_id: Option<ChainId>,
        number: i32,
        name: &str,
        address: Address,
        phone: PhoneNumber,
        email: Email,
        owner: FullName,
    ) -> DomainResult<Self> {
        let name = validate_store_fields(chain_id, name)?;
        let now = Utc::now();

        Ok(Self {
            id: StoreId::new(),
            chain_id,
            number,
            name,
            address,
            phone,
            email,
            owner,
            created_on: now,
            modified_on: now,
        })
    }

    /// Rebuilds a persisted store from row values without re-validating or
    /// re-minting id and timestamps. Repository use only.
    #[allow(clippy::too_many_arguments)]
    pub fn hydrate(
        id: StoreId,
        chain_id: Option<ChainId>,
        number: i32,
        name: String,
        address: Address,
        phone: PhoneNumber,
        email: Email,
        owner: FullName,
        created_on: DateTime<Utc>,
        modified_on: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chain_id,
            number,
            name,
            address,
            phone,
            email,
            owner,
            created_on,
            modified_on,
        }
    }

    /// Overwrites all mutable fields and refreshes the concurrency token.
    ///
    /// Re-parenting to another chain, or to independent by passing `None`,
    /// is permitted unconditionally here; any business restriction on
    /// re-parenting belongs to the handler layer.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        chain_id: Option<ChainId>,
        number: i32,
        name: &str,
        address: Address,
        phone: PhoneNumber,
        email: Email,
        owner: FullName,
    ) -> DomainResult<()> {
        let name = validate_store_fields(chain_id, name)?;

        self.chain_id = chain_id;
        self.number = number;
        self.name = name;
        self.address = address;
        self.phone = phone;
        self.email = email;
        self.owner = owner;
        self.modified_on = Utc::now();
        Ok(())
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn chain_id(&self) -> Option<ChainId> {
        self.chain_id
    }

    /// Returns true if the store belongs to no chain.
    pub fn is_independent(&self) -> bool {
        self.chain_id.is_none()
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn owner(&self) -> &FullName {
        &self.owner
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
    use uuid::Uuid;

    fn valid_parts() -> (Address, PhoneNumber, Email, FullName) {
        (
            Address::create("Main St 1", "1000", "Copenhagen").unwrap(),
            PhoneNumber::create("45", "12345678").unwrap(),
            Email::create("owner@example.com").unwrap(),
            FullName::create("Ada", "Lovelace").unwrap(),
        )
    }

    #[test]
    fn create_sets_both_timestamps_to_the_same_instant() {
        let (address, phone, email, owner) = valid_parts();
        let store = Store::create(None, 7, "Downtown", address, phone, email, owner).unwrap();

        assert!(!store.id().is_nil());
        assert_eq!(store.created_on(), store.modified_on());
        assert!(store.is_independent());
    }

    #[test]
    fn create_rejects_nil_chain_id() {
        let (address, phone, email, owner) = valid_parts();
        let nil = ChainId::from_uuid(Uuid::nil());
        let err =
            Store::create(Some(nil), 7, "Downtown", address, phone, email, owner).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsRequired);
        assert!(err.message.contains("chain id"));
    }

    #[test]
    fn create_rejects_blank_name() {
        let (address, phone, email, owner) = valid_parts();
        let err = Store::create(None, 7, "   ", address, phone, email, owner).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsRequired);
    }

    #[test]
    fn create_aggregates_nil_chain_and_blank_name() {
        let (address, phone, email, owner) = valid_parts();
        let nil = ChainId::from_uuid(Uuid::nil());
        let err = Store::create(Some(nil), 7, "", address, phone, email, owner).unwrap_err();
        assert_eq!(err.code, ErrorCode::MultipleErrors);
    }

    #[test]
    fn update_overwrites_fields_and_bumps_token() {
        let (address, phone, email, owner) = valid_parts();
        let mut store =
            Store::create(None, 7, "Downtown", address, phone, email, owner).unwrap();
        let before = store.modified_on();

        let new_chain = ChainId::new();
        let (address, phone, email, owner) = valid_parts();
        store
            .update(Some(new_chain), 8, "Uptown", address, phone, email, owner)
            .unwrap();

        assert_eq!(store.chain_id(), Some(new_chain));
        assert_eq!(store.number(), 8);
        assert_eq!(store.name(), "Uptown");
        assert!(store.modified_on() >= before);
    }

    #[test]
    fn update_to_independent_is_permitted() {
        let (address, phone, email, owner) = valid_parts();
        let mut store = Store::create(
            Some(ChainId::new()),
            7,
            "Downtown",
            address,
            phone,
            email,
            owner,
        )
        .unwrap();

        let (address, phone, email, owner) = valid_parts();
        store
            .update(None, 7, "Downtown", address, phone, email, owner)
            .unwrap();
        assert!(store.is_independent());
    }

    #[test]
    fn update_rejects_invalid_input_without_mutating() {
        let (address, phone, email, owner) = valid_parts();
        let mut store =
            Store::create(None, 7, "Downtown", address, phone, email, owner).unwrap();
        let token = store.modified_on();

        let (address, phone, email, owner) = valid_parts();
        let err = store
            .update(None, 7, " ", address, phone, email, owner)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueIsRequired);
        assert_eq!(store.name(), "Downtown");
        assert_eq!(store.modified_on(), token);
    }
}
