//! Persistence layer for the retail chain system.
//!
//! Defines the repository contracts consumed by the command/query handlers
//! together with two implementations: an in-memory one for tests and a
//! PostgreSQL one (sqlx) honoring the transaction/isolation discipline the
//! contracts document.

pub mod contracts;
pub mod error;
pub mod memory;
pub mod postgres;

pub use common::{ChainId, StoreId};
pub use contracts::{ChainRepository, StoreRepository};
pub use error::{RepositoryError, Result};
pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;
