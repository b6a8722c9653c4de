use common::ChainId;
use thiserror::Error;

/// Errors that can occur when interacting with a repository.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted row does not exist.
    #[error("{entity} {id} was not found")]
    NotFound { entity: &'static str, id: String },

    /// An optimistic write targeted a `modified_on` token that is no longer
    /// current. Distinct from [`RepositoryError::NotFound`] so callers can
    /// reload and retry.
    #[error("{entity} {id} was modified concurrently")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// A unique column value is already taken.
    #[error("{entity} with {field} {value} already exists")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A store references a chain that does not exist.
    #[error("chain {0} referenced by store does not exist")]
    MissingChain(ChainId),

    /// A chain delete found stores still referencing the chain.
    #[error("chain {0} still owns stores")]
    ChainNotEmpty(ChainId),

    /// A persisted row failed to rebuild into a domain entity.
    #[error("row decoding error: {0}")]
    Decode(String),

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
