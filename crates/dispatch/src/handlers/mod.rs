//! Command and query handlers, one per operation.

mod chain;
mod store;

use common::ChainId;
use domain::{Address, DomainError, DomainResult, Email, FullName, PhoneNumber, Store};
use repository::RepositoryError;

use crate::command::StoreFields;

/// Converts an infrastructure error into the uniform domain failure model.
///
/// Expected storage outcomes map to their domain codes; anything else is an
/// unexpected fault, logged and wrapped rather than propagated as a panic.
pub(crate) fn map_repo_error(err: RepositoryError) -> DomainError {
    match err {
        RepositoryError::NotFound { entity, id } => DomainError::not_found(entity, id),
        RepositoryError::ConcurrencyConflict { entity, id } => {
            DomainError::concurrent_modification(entity, id)
        }
        RepositoryError::UniqueViolation {
            entity,
            field,
            value,
        } => DomainError::duplicate(entity, field, value),
        RepositoryError::MissingChain(id) => DomainError::not_found("Chain", id),
        RepositoryError::ChainNotEmpty(id) => DomainError::chain_has_stores(id),
        RepositoryError::Decode(_) | RepositoryError::Database(_) => {
            tracing::error!(error = %err, "repository fault");
            DomainError::unexpected(err)
        }
    }
}

/// Builds the value objects for a store from raw field values, aggregating
/// every field failure into one error.
pub(crate) fn build_store_parts(
    fields: &StoreFields,
) -> DomainResult<(Address, PhoneNumber, Email, FullName)> {
    let mut errors = Vec::new();

    let address = Address::create(&fields.street, &fields.postal_code, &fields.city)
        .map_err(|e| errors.push(e))
        .ok();
    let phone = PhoneNumber::create(&fields.phone_country_code, &fields.phone_number)
        .map_err(|e| errors.push(e))
        .ok();
    let email = Email::create(&fields.email).map_err(|e| errors.push(e)).ok();
    let owner = FullName::create(&fields.owner_first_name, &fields.owner_last_name)
        .map_err(|e| errors.push(e))
        .ok();

    match (address, phone, email, owner) {
        (Some(address), Some(phone), Some(email), Some(owner)) => {
            Ok((address, phone, email, owner))
        }
        _ => Err(DomainError::aggregate(errors)),
    }
}

/// Builds a store entity from raw field values with its chain affiliation
/// already resolved.
pub(crate) fn build_store(
    chain_id: Option<ChainId>,
    fields: &StoreFields,
) -> DomainResult<Store> {
    let (address, phone, email, owner) = build_store_parts(fields)?;
    Store::create(
        chain_id,
        fields.number,
        &fields.name,
        address,
        phone,
        email,
        owner,
    )
}

/// Tags an entity-build error with the index of the store it came from,
/// keeping batch error reporting deterministic.
pub(crate) fn index_error(index: usize, err: DomainError) -> DomainError {
    DomainError::new(err.code, format!("store {index}: {}", err.message))
}
