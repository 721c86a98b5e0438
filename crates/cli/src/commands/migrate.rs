//! Database migration command.
//!
//! Applies the schema migrations from `crates/storefront/migrations/`, then
//! creates the session table used by tower-sessions.

use tower_sessions_sqlx_store::PostgresStore;

use bookstore_storefront::db;

use super::{CliError, connect};

/// Run all migrations.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;

    tracing::info!("Running bookstore migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
