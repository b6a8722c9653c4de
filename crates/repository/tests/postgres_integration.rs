//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency. Each test
//! truncates the tables before running, so they are marked `#[serial]`.
//!
//! ```bash
//! cargo test -p repository --test postgres_integration
//! ```

use std::sync::Arc;

use common::{ChainId, StoreId};
use domain::{Address, Chain, Email, FullName, PhoneNumber, Store};
use repository::{ChainRepository, PostgresRepository, RepositoryError, StoreRepository};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Create a temporary pool just for migrations
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            // Run migrations using raw_sql to execute multiple statements
            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_chains_and_stores.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh repository with its own pool and cleared tables
async fn get_test_repo() -> PostgresRepository {
    let info = get_container_info().await;

    // Create a fresh pool for each test to avoid connection issues
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    // Clear tables for test isolation
    sqlx::query("TRUNCATE TABLE stores, chains")
        .execute(&pool)
        .await
        .unwrap();

    PostgresRepository::new(pool)
}

fn test_store(chain_id: Option<ChainId>, number: i32, name: &str) -> Store {
    Store::create(
        chain_id,
        number,
        name,
        Address::create("Main St 1", "1000", "Copenhagen").unwrap(),
        PhoneNumber::create("45", "12345678").unwrap(),
        Email::create("owner@example.com").unwrap(),
        FullName::create("Ada", "Lovelace").unwrap(),
    )
    .unwrap()
}

#[tokio::test]
#[serial]
async fn add_chain_with_stores_and_load_it_back() {
    let repo = get_test_repo().await;

    let mut chain = Chain::create("Brand").unwrap();
    chain
        .add_stores(vec![
            test_store(Some(chain.id()), 2, "Uptown"),
            test_store(Some(chain.id()), 1, "Downtown"),
        ])
        .unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    let loaded = repo
        .get_by_id_including_stores(chain.id())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(loaded.name(), "Brand");
    assert_eq!(loaded.store_count(), 2);
    // Stores come back ordered by number.
    assert_eq!(loaded.stores()[0].number(), 1);
    assert_eq!(loaded.stores()[1].number(), 2);
    assert!(loaded.stores().iter().all(|s| s.chain_id() == Some(chain.id())));
}

#[tokio::test]
#[serial]
async fn add_chain_with_duplicate_store_number_rolls_back_everything() {
    let repo = get_test_repo().await;

    let mut other = Chain::create("First").unwrap();
    other
        .add_stores(vec![test_store(Some(other.id()), 1, "Taken")])
        .unwrap();
    ChainRepository::add(&repo, &other).await.unwrap();

    let mut chain = Chain::create("Second").unwrap();
    chain
        .add_stores(vec![
            test_store(Some(chain.id()), 2, "Fine"),
            test_store(Some(chain.id()), 1, "Collides"),
        ])
        .unwrap();

    let result = ChainRepository::add(&repo, &chain).await;
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueViolation { field: "number", .. })
    ));

    // Neither the chain row nor the valid store made it in.
    assert!(ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().is_none());
    assert_eq!(repo.count_stores(other.id()).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn duplicate_chain_name_hits_the_unique_constraint() {
    let repo = get_test_repo().await;
    ChainRepository::add(&repo, &Chain::create("Brand").unwrap())
        .await
        .unwrap();

    let result = ChainRepository::add(&repo, &Chain::create("Brand").unwrap()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueViolation {
            entity: "Chain",
            field: "name",
            ..
        })
    ));
}

#[tokio::test]
#[serial]
async fn chain_update_with_fresh_token_succeeds() {
    let repo = get_test_repo().await;
    let mut chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    let token = chain.modified_on();
    chain.update_details("Rebranded").unwrap();
    ChainRepository::update(&repo, &chain, token).await.unwrap();

    let loaded = ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().unwrap();
    assert_eq!(loaded.name(), "Rebranded");
    assert_eq!(loaded.modified_on(), chain.modified_on());
}

#[tokio::test]
#[serial]
async fn chain_update_with_stale_token_conflicts() {
    let repo = get_test_repo().await;
    let mut chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    let stale = chain.modified_on();
    chain.update_details("Rebranded").unwrap();
    ChainRepository::update(&repo, &chain, stale).await.unwrap();

    let mut racer = ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().unwrap();
    racer.update_details("Other").unwrap();
    let result = ChainRepository::update(&repo, &racer, stale).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConcurrencyConflict { entity: "Chain", .. })
    ));

    // The conflicting write left the row untouched.
    let loaded = ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().unwrap();
    assert_eq!(loaded.name(), "Rebranded");
}

#[tokio::test]
#[serial]
async fn chain_update_of_missing_row_is_not_found() {
    let repo = get_test_repo().await;
    let chain = Chain::create("Brand").unwrap();

    let result = ChainRepository::update(&repo, &chain, chain.modified_on()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "Chain", .. })
    ));
}

#[tokio::test]
#[serial]
async fn delete_chain_owning_stores_fails_inside_the_transaction() {
    let repo = get_test_repo().await;
    let mut chain = Chain::create("Brand").unwrap();
    chain
        .add_stores(vec![test_store(Some(chain.id()), 1, "Downtown")])
        .unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    let result = ChainRepository::delete(&repo, chain.id()).await;
    assert!(matches!(result, Err(RepositoryError::ChainNotEmpty(_))));

    // Chain and store rows survive the failed delete.
    assert!(ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().is_some());
    assert_eq!(repo.count_stores(chain.id()).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn delete_empty_chain_succeeds() {
    let repo = get_test_repo().await;
    let chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    ChainRepository::delete(&repo, chain.id()).await.unwrap();
    assert!(ChainRepository::get_by_id(&repo, chain.id()).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn delete_missing_chain_is_not_found() {
    let repo = get_test_repo().await;
    let result = ChainRepository::delete(&repo, ChainId::new()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "Chain", .. })
    ));
}

#[tokio::test]
#[serial]
async fn store_referencing_missing_chain_hits_the_foreign_key() {
    let repo = get_test_repo().await;
    let orphan = test_store(Some(ChainId::new()), 1, "Orphan");

    let result = StoreRepository::add(&repo, &orphan).await;
    assert!(matches!(result, Err(RepositoryError::MissingChain(_))));
}

#[tokio::test]
#[serial]
async fn independent_store_round_trips_all_value_objects() {
    let repo = get_test_repo().await;
    let store = test_store(None, 7, "Downtown");
    StoreRepository::add(&repo, &store).await.unwrap();

    let loaded = StoreRepository::get_by_id(&repo, store.id())
        .await
        .unwrap()
        .unwrap();
    assert!(loaded.is_independent());
    assert_eq!(loaded.number(), 7);
    assert_eq!(loaded.name(), "Downtown");
    assert_eq!(loaded.address(), store.address());
    assert_eq!(loaded.phone().value(), "+4512345678");
    assert_eq!(loaded.email().value(), "owner@example.com");
    assert_eq!(loaded.owner(), store.owner());
}

#[tokio::test]
#[serial]
async fn add_range_is_all_or_nothing() {
    let repo = get_test_repo().await;
    let chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    let batch = vec![
        test_store(Some(chain.id()), 1, "One"),
        test_store(Some(chain.id()), 1, "Same number"),
    ];
    let result = repo.add_range(&batch).await;
    assert!(matches!(
        result,
        Err(RepositoryError::UniqueViolation { field: "number", .. })
    ));
    assert_eq!(repo.count_stores(chain.id()).await.unwrap(), 0);
}

#[tokio::test]
#[serial]
async fn get_all_by_chain_orders_by_store_number() {
    let repo = get_test_repo().await;
    let chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    repo.add_range(&[
        test_store(Some(chain.id()), 5, "Five"),
        test_store(Some(chain.id()), 1, "One"),
        test_store(Some(chain.id()), 3, "Three"),
    ])
    .await
    .unwrap();

    let stores = repo.get_all_by_chain(chain.id()).await.unwrap();
    let numbers: Vec<i32> = stores.iter().map(Store::number).collect();
    assert_eq!(numbers, vec![1, 3, 5]);
}

#[tokio::test]
#[serial]
async fn store_update_with_stale_token_conflicts() {
    let repo = get_test_repo().await;
    let mut store = test_store(None, 1, "Downtown");
    StoreRepository::add(&repo, &store).await.unwrap();

    let stale = store.modified_on();
    store
        .update(
            None,
            1,
            "Renamed",
            store.address().clone(),
            store.phone().clone(),
            store.email().clone(),
            store.owner().clone(),
        )
        .unwrap();
    StoreRepository::update(&repo, &store, stale).await.unwrap();

    let result = StoreRepository::update(&repo, &store, stale).await;
    assert!(matches!(
        result,
        Err(RepositoryError::ConcurrencyConflict { entity: "Store", .. })
    ));
}

#[tokio::test]
#[serial]
async fn store_update_of_missing_row_is_not_found() {
    let repo = get_test_repo().await;
    let store = test_store(None, 1, "Ghost");

    let result = StoreRepository::update(&repo, &store, store.modified_on()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "Store", .. })
    ));
}

#[tokio::test]
#[serial]
async fn store_update_can_reparent_to_another_chain() {
    let repo = get_test_repo().await;
    let first = Chain::create("First").unwrap();
    let second = Chain::create("Second").unwrap();
    ChainRepository::add(&repo, &first).await.unwrap();
    ChainRepository::add(&repo, &second).await.unwrap();

    let mut store = test_store(Some(first.id()), 1, "Downtown");
    StoreRepository::add(&repo, &store).await.unwrap();

    let token = store.modified_on();
    store
        .update(
            Some(second.id()),
            1,
            "Downtown",
            store.address().clone(),
            store.phone().clone(),
            store.email().clone(),
            store.owner().clone(),
        )
        .unwrap();
    StoreRepository::update(&repo, &store, token).await.unwrap();

    assert_eq!(repo.count_stores(first.id()).await.unwrap(), 0);
    assert_eq!(repo.count_stores(second.id()).await.unwrap(), 1);
}

#[tokio::test]
#[serial]
async fn delete_store_removes_only_that_row() {
    let repo = get_test_repo().await;
    let first = test_store(None, 1, "One");
    let second = test_store(None, 2, "Two");
    StoreRepository::add(&repo, &first).await.unwrap();
    StoreRepository::add(&repo, &second).await.unwrap();

    StoreRepository::delete(&repo, first.id()).await.unwrap();

    assert!(
        StoreRepository::get_by_id(&repo, first.id())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        StoreRepository::get_by_id(&repo, second.id())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
#[serial]
async fn delete_missing_store_is_not_found() {
    let repo = get_test_repo().await;
    let result = StoreRepository::delete(&repo, StoreId::new()).await;
    assert!(matches!(
        result,
        Err(RepositoryError::NotFound { entity: "Store", .. })
    ));
}

#[tokio::test]
#[serial]
async fn delete_by_chain_reports_the_removed_count() {
    let repo = get_test_repo().await;
    let chain = Chain::create("Brand").unwrap();
    ChainRepository::add(&repo, &chain).await.unwrap();

    repo.add_range(&[
        test_store(Some(chain.id()), 1, "One"),
        test_store(Some(chain.id()), 2, "Two"),
        test_store(None, 3, "Independent"),
    ])
    .await
    .unwrap();

    let removed = repo.delete_by_chain(chain.id()).await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(repo.count_stores(chain.id()).await.unwrap(), 0);
    assert_eq!(repo.get_all_by_chain(chain.id()).await.unwrap().len(), 0);
}
