//! Domain error model.
//!
//! Every expected failure (validation, not-found, business rule violation,
//! concurrency conflict) is returned as an `Err(DomainError)` carrying a
//! stable `(code, message, status_code)` triple. Only genuinely unexpected
//! faults are wrapped into [`ErrorCode::UnexpectedError`] at the handler
//! boundary; nothing propagates as a panic.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable error codes, grouped by failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A required field was empty or missing.
    ValueIsRequired,

    /// A field value was malformed.
    ValueIsInvalid,

    /// A field value exceeded its maximum length.
    ValueTooLong,

    /// A bulk store batch mixed different chain ids.
    SharedChainId,

    /// The referenced identifier has no backing row.
    RecordNotFound,

    /// A chain cannot be deleted while it still owns stores.
    ChainHasStores,

    /// A unique value (chain name, store number) is already taken.
    DuplicateValue,

    /// The optimistic concurrency token was stale.
    ConcurrentModification,

    /// The operation was cancelled before its writes were committed.
    OperationCancelled,

    /// Several validation failures aggregated into one error.
    MultipleErrors,

    /// A storage or infrastructure fault, never silently swallowed.
    UnexpectedError,
}

impl ErrorCode {
    /// Returns the stable string form of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValueIsRequired => "ValueIsRequired",
            ErrorCode::ValueIsInvalid => "ValueIsInvalid",
            ErrorCode::ValueTooLong => "ValueTooLong",
            ErrorCode::SharedChainId => "SharedChainId",
            ErrorCode::RecordNotFound => "RecordNotFound",
            ErrorCode::ChainHasStores => "ChainHasStores",
            ErrorCode::DuplicateValue => "DuplicateValue",
            ErrorCode::ConcurrentModification => "ConcurrentModification",
            ErrorCode::OperationCancelled => "OperationCancelled",
            ErrorCode::MultipleErrors => "MultipleErrors",
            ErrorCode::UnexpectedError => "UnexpectedError",
        }
    }

    /// Returns the HTTP-equivalent status code a transport layer would use.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::ValueIsRequired
            | ErrorCode::ValueIsInvalid
            | ErrorCode::ValueTooLong
            | ErrorCode::SharedChainId
            | ErrorCode::MultipleErrors => 400,
            ErrorCode::RecordNotFound => 404,
            ErrorCode::ChainHasStores
            | ErrorCode::DuplicateValue
            | ErrorCode::ConcurrentModification => 409,
            ErrorCode::OperationCancelled => 499,
            ErrorCode::UnexpectedError => 500,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, expected failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct DomainError {
    /// Stable machine-readable code.
    pub code: ErrorCode,

    /// Human-readable description. For [`ErrorCode::MultipleErrors`] this is
    /// the newline-joined concatenation of the individual messages.
    pub message: String,
}

impl DomainError {
    /// Creates an error with an explicit code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// A required field was empty or whitespace.
    pub fn required(field: &str) -> Self {
        Self::new(ErrorCode::ValueIsRequired, format!("{field} is required"))
    }

    /// A field value was malformed.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValueIsInvalid, message)
    }

    /// A field value exceeded its maximum length.
    pub fn too_long(field: &str, max: usize) -> Self {
        Self::new(
            ErrorCode::ValueTooLong,
            format!("{field} must be shorter than {max} characters"),
        )
    }

    /// The referenced entity has no backing row.
    pub fn not_found(entity: &str, id: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RecordNotFound, format!("{entity} {id} was not found"))
    }

    /// A chain still owns stores and cannot be deleted.
    pub fn chain_has_stores(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ChainHasStores,
            format!("chain {id} still owns stores and cannot be deleted"),
        )
    }

    /// A bulk batch mixed different chain ids.
    pub fn shared_chain_id() -> Self {
        Self::new(
            ErrorCode::SharedChainId,
            "all stores in a batch must share a single chain id or all be independent",
        )
    }

    /// A unique value is already taken.
    pub fn duplicate(entity: &str, field: &str, value: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::DuplicateValue,
            format!("{entity} with {field} {value} already exists"),
        )
    }

    /// The optimistic concurrency token was stale.
    pub fn concurrent_modification(entity: &str, id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::ConcurrentModification,
            format!("{entity} {id} was modified concurrently; reload and retry"),
        )
    }

    /// The operation was cancelled before committing.
    pub fn cancelled(operation: &str) -> Self {
        Self::new(
            ErrorCode::OperationCancelled,
            format!("{operation} was cancelled before completing"),
        )
    }

    /// A storage or infrastructure fault, carrying the underlying message.
    pub fn unexpected(message: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UnexpectedError, message.to_string())
    }

    /// Reduces a list of failures to a single error.
    ///
    /// One error is returned unchanged; several are aggregated into a
    /// `MultipleErrors` error whose message joins the individual messages
    /// with newlines. Callers needing per-error detail inspect the message
    /// by substring.
    pub fn aggregate(mut errors: Vec<DomainError>) -> Self {
        match errors.len() {
            0 => Self::unexpected("error aggregation over an empty list"),
            1 => errors.remove(0),
            _ => {
                let message = errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("\n");
                Self::new(ErrorCode::MultipleErrors, message)
            }
        }
    }

    /// Returns the HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }
}

/// Result type used throughout the domain core.
pub type DomainResult<T> = Result<T, DomainError>;
