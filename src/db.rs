//! Database connection pool and migration management.
//!
//! This module provides utilities for:
//! - Creating and managing a PostgreSQL connection pool
//! - Running database migrations automatically
//! - Dropping the schema for destructive admin operations

use sqlx::{Pool, Postgres};

/// Type alias for PostgreSQL connection pool.
pub type DbPool = Pool<Postgres>;

/// Create a new PostgreSQL connection pool.
///
/// A connection pool maintains multiple database connections that can be
/// reused across HTTP requests and CLI commands, which is much more efficient
/// than opening a new connection per operation.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection string is invalid
/// - Cannot connect to PostgreSQL server
/// - Database authentication fails
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    sqlx::postgres::PgPoolOptions::new()
        // Limit concurrent connections
        .max_connections(5)
        .connect(database_url)
        .await
}

/// Run database migrations from the `migrations/` directory.
///
/// Migrations are tracked in the `_sqlx_migrations` table, so each migration
/// runs only once. Files follow the `<timestamp>_<name>.sql` convention.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    // The macro reads migrations at compile time from ./migrations directory
    sqlx::migrate!("./migrations").run(pool).await
}

/// Drop every application table, including the sqlx migration ledger.
///
/// Irreversible. Only called from `db-reset` and `db-import --wipe`, both of
/// which require explicit operator confirmation and exclusive access to the
/// database.
pub async fn drop_all(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DROP TABLE IF EXISTS
            purchases,
            resource_links,
            users,
            resources,
            platforms,
            api_keys,
            _sqlx_migrations
        CASCADE
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
