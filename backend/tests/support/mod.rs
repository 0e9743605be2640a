//! Shared helpers for the Diesel integration suites.
//!
//! Each test gets its own temporary database on the shared embedded
//! PostgreSQL cluster, migrated with the same embedded migrations the server
//! applies at startup.

use inkwell::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use pg_embedded_setup_unpriv::test_support::shared_cluster_handle;
use tokio::runtime::Runtime;
use uuid::Uuid;

/// Returns true when `SKIP_TEST_CLUSTER` is set to "1", "true", or "yes".
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when `SKIP_TEST_CLUSTER` is truthy; otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// A migrated temporary database and a pool connected to it.
///
/// The database is dropped with this value, after the pool.
pub struct MigratedDatabase {
    pub pool: DbPool,
    _database: TemporaryDatabase,
}

/// Provision and migrate a fresh database on the shared cluster.
pub fn migrated_database(runtime: &Runtime, max_size: u32) -> Result<MigratedDatabase, String> {
    let cluster = shared_cluster_handle().map_err(|err| err.to_string())?;
    let name = format!("inkwell_test_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| err.to_string())?;
    let database_url = database.url().to_owned();

    runtime
        .block_on(run_migrations(&database_url))
        .map_err(|err| err.to_string())?;
    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(max_size)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.into_message())?;

    Ok(MigratedDatabase {
        pool,
        _database: database,
    })
}
