//! Domain layer for the retail chain system.
//!
//! This crate provides the consistency core:
//! - `DomainError` / `DomainResult` for the uniform success/failure model
//! - Self-validating value objects (Address, Email, PhoneNumber, FullName)
//! - The Chain aggregate root and the Store entity it owns
//!
//! The crate is pure: no I/O, no database types. Persistence and command
//! dispatch live in the `repository` and `dispatch` crates.

pub mod chain;
pub mod error;
pub mod store;
pub mod value_objects;

pub use chain::Chain;
pub use error::{DomainError, DomainResult, ErrorCode};
pub use store::Store;
pub use value_objects::{Address, Email, FullName, PhoneNumber};
