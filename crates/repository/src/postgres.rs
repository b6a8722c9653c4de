use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{ChainId, StoreId};
use domain::{Address, Chain, Email, FullName, PhoneNumber, Store};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::contracts::{ChainRepository, StoreRepository};
use crate::error::{RepositoryError, Result};

const STORE_COLUMNS: &str = "id, chain_id, number, name, street, postal_code, city, \
     phone_country_code, phone_number, email, owner_first_name, owner_last_name, \
     created_on, modified_on";

/// PostgreSQL-backed repository implementation.
///
/// Every write-path method runs inside its own transaction at the isolation
/// level the contracts document: repeatable read for the read-then-act
/// chain delete and the store count it depends on, read committed for
/// multi-row writes.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new PostgreSQL repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_chain(row: &PgRow) -> Result<Chain> {
        Ok(Chain::hydrate(
            ChainId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get("name")?,
            Vec::new(),
            row.try_get("created_on")?,
            row.try_get("modified_on")?,
        ))
    }

    fn row_to_store(row: &PgRow) -> Result<Store> {
        let decode = |e: domain::DomainError| {
            tracing::error!(error = %e, "store row failed to rebuild into an entity");
            RepositoryError::Decode(e.message)
        };

        let address = Address::create(
            row.try_get("street")?,
            row.try_get("postal_code")?,
            row.try_get("city")?,
        )
        .map_err(decode)?;
        let phone = PhoneNumber::create(
            row.try_get("phone_country_code")?,
            row.try_get("phone_number")?,
        )
        .map_err(decode)?;
        let email = Email::create(row.try_get("email")?).map_err(decode)?;
        let owner = FullName::create(
            row.try_get("owner_first_name")?,
            row.try_get("owner_last_name")?,
        )
        .map_err(decode)?;

        Ok(Store::hydrate(
            StoreId::from_uuid(row.try_get::<Uuid, _>("id")?),
            row.try_get::<Option<Uuid>, _>("chain_id")?
                .map(ChainId::from_uuid),
            row.try_get("number")?,
            row.try_get("name")?,
            address,
            phone,
            email,
            owner,
            row.try_get("created_on")?,
            row.try_get("modified_on")?,
        ))
    }

    async fn insert_store(tx: &mut Transaction<'_, Postgres>, store: &Store) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO stores (id, chain_id, number, name, street, postal_code, city,
                                phone_country_code, phone_number, email,
                                owner_first_name, owner_last_name, created_on, modified_on)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(store.id().as_uuid())
        .bind(store.chain_id().map(|c| c.as_uuid()))
        .bind(store.number())
        .bind(store.name())
        .bind(store.address().street())
        .bind(store.address().postal_code())
        .bind(store.address().city())
        .bind(store.phone().country_code())
        .bind(store.phone().number())
        .bind(store.email().value())
        .bind(store.owner().first())
        .bind(store.owner().last())
        .bind(store.created_on())
        .bind(store.modified_on())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_store_constraint(e, store))?;

        Ok(())
    }
}

/// Maps unique/foreign-key constraint violations on the stores table to
/// their repository errors.
fn map_store_constraint(e: sqlx::Error, store: &Store) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        match db_err.constraint() {
            Some("unique_store_number") => {
                return RepositoryError::UniqueViolation {
                    entity: "Store",
                    field: "number",
                    value: store.number().to_string(),
                };
            }
            Some("fk_store_chain") => {
                if let Some(chain_id) = store.chain_id() {
                    return RepositoryError::MissingChain(chain_id);
                }
            }
            _ => {}
        }
    }
    tracing::error!(error = %e, store_id = %store.id(), "unmapped database error on store write");
    RepositoryError::Database(e)
}

fn map_chain_constraint(e: sqlx::Error, chain: &Chain) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.constraint() == Some("unique_chain_name")
    {
        return RepositoryError::UniqueViolation {
            entity: "Chain",
            field: "name",
            value: chain.name().to_string(),
        };
    }
    tracing::error!(error = %e, chain_id = %chain.id(), "unmapped database error on chain write");
    RepositoryError::Database(e)
}

async fn set_isolation(tx: &mut Transaction<'_, Postgres>, level: &str) -> Result<()> {
    sqlx::query(&format!("SET TRANSACTION ISOLATION LEVEL {level}"))
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[async_trait]
impl ChainRepository for PostgresRepository {
    async fn add(&self, chain: &Chain) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        set_isolation(&mut tx, "READ COMMITTED").await?;

        sqlx::query(
            r#"
            INSERT INTO chains (id, name, created_on, modified_on)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(chain.id().as_uuid())
        .bind(chain.name())
        .bind(chain.created_on())
        .bind(chain.modified_on())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_chain_constraint(e, chain))?;

        for store in chain.stores() {
            Self::insert_store(&mut tx, store).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: ChainId) -> Result<Option<Chain>> {
        let row = sqlx::query(
            "SELECT id, name, created_on, modified_on FROM chains WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_chain).transpose()
    }

    async fn get_by_id_including_stores(&self, id: ChainId) -> Result<Option<Chain>> {
        let Some(mut chain) = ChainRepository::get_by_id(self, id).await? else {
            return Ok(None);
        };

        let stores = self.get_all_by_chain(id).await?;
        chain
            .add_stores(stores)
            .map_err(|e| RepositoryError::Decode(e.message))?;
        Ok(Some(chain))
    }

    async fn update(&self, chain: &Chain, expected_modified_on: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE chains SET name = $2, modified_on = $3
            WHERE id = $1 AND modified_on = $4
            "#,
        )
        .bind(chain.id().as_uuid())
        .bind(chain.name())
        .bind(chain.modified_on())
        .bind(expected_modified_on)
        .execute(&self.pool)
        .await
        .map_err(|e| map_chain_constraint(e, chain))?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM chains WHERE id = $1")
                .bind(chain.id().as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            return Err(if exists.is_some() {
                RepositoryError::ConcurrencyConflict {
                    entity: "Chain",
                    id: chain.id().to_string(),
                }
            } else {
                RepositoryError::NotFound {
                    entity: "Chain",
                    id: chain.id().to_string(),
                }
            });
        }

        Ok(())
    }

    async fn delete(&self, id: ChainId) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        set_isolation(&mut tx, "REPEATABLE READ").await?;

        // The emptiness check must hold at commit time, not just at the
        // caller's earlier count.
        let store_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE chain_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;
        if store_count > 0 {
            return Err(RepositoryError::ChainNotEmpty(id));
        }

        let result = sqlx::query("DELETE FROM chains WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Chain",
                id: id.to_string(),
            });
        }

        tx.commit().await?;
        Ok(())
    }

    async fn count_stores(&self, id: ChainId) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        set_isolation(&mut tx, "REPEATABLE READ").await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores WHERE chain_id = $1")
            .bind(id.as_uuid())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(count as u64)
    }
}

#[async_trait]
impl StoreRepository for PostgresRepository {
    async fn add(&self, store: &Store) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        Self::insert_store(&mut tx, store).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn add_range(&self, stores: &[Store]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        set_isolation(&mut tx, "READ COMMITTED").await?;

        for store in stores {
            Self::insert_store(&mut tx, store).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>> {
        let row = sqlx::query(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_store).transpose()
    }

    async fn get_all_by_chain(&self, chain_id: ChainId) -> Result<Vec<Store>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE chain_id = $1 ORDER BY number ASC"
        ))
        .bind(chain_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_store).collect()
    }

    async fn update(&self, store: &Store, expected_modified_on: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE stores
            SET chain_id = $2, number = $3, name = $4, street = $5, postal_code = $6,
                city = $7, phone_country_code = $8, phone_number = $9, email = $10,
                owner_first_name = $11, owner_last_name = $12, modified_on = $13
            WHERE id = $1 AND modified_on = $14
            "#,
        )
        .bind(store.id().as_uuid())
        .bind(store.chain_id().map(|c| c.as_uuid()))
        .bind(store.number())
        .bind(store.name())
        .bind(store.address().street())
        .bind(store.address().postal_code())
        .bind(store.address().city())
        .bind(store.phone().country_code())
        .bind(store.phone().number())
        .bind(store.email().value())
        .bind(store.owner().first())
        .bind(store.owner().last())
        .bind(store.modified_on())
        .bind(expected_modified_on)
        .execute(&self.pool)
        .await
        .map_err(|e| map_store_constraint(e, store))?;

        if result.rows_affected() == 0 {
            let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM stores WHERE id = $1")
                .bind(store.id().as_uuid())
                .fetch_optional(&self.pool)
                .await?;
            return Err(if exists.is_some() {
                RepositoryError::ConcurrencyConflict {
                    entity: "Store",
                    id: store.id().to_string(),
                }
            } else {
                RepositoryError::NotFound {
                    entity: "Store",
                    id: store.id().to_string(),
                }
            });
        }

        Ok(())
    }

    async fn delete(&self, id: StoreId) -> Result<()> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Store",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn delete_by_chain(&self, chain_id: ChainId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM stores WHERE chain_id = $1")
            .bind(chain_id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
