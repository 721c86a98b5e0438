//! User account commands.

use bookstore_core::Role;
use bookstore_storefront::db::PgStorage;
use bookstore_storefront::services::auth::AuthService;

use super::{CliError, connect};

/// Create a user with a hashed password.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(email: &str, role: &str, password: &str) -> Result<i32, CliError> {
    let role: Role = role.parse()?;
    let storage = PgStorage::new(connect().await?);

    tracing::info!("Creating user: {} ({})", email, role);
    let user = AuthService::new(&storage)
        .register(email, role, password)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    if role == Role::Seller {
        tracing::info!("Next: bookstore store create -e {} -n <store name>", user.email);
    }

    Ok(user.id.as_i32())
}
