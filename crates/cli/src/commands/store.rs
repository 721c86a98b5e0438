//! Store commands. Each seller owns at most one store.

use bookstore_core::{Email, Role};
use bookstore_storefront::db::{PgStorage, StoreRepository, UserRepository};

use super::{CliError, connect};

/// Open a store for the seller with `email`.
///
/// # Returns
///
/// The ID of the created store.
pub async fn create(email: &str, name: &str) -> Result<i32, CliError> {
    let email = Email::parse(email).map_err(|_| CliError::UserNotFound(email.to_owned()))?;
    let storage = PgStorage::new(connect().await?);

    let user = storage
        .get_user_by_email(&email)
        .await?
        .ok_or_else(|| CliError::UserNotFound(email.to_string()))?;

    if user.role != Role::Seller {
        return Err(CliError::NotASeller(email.to_string()));
    }

    let store = storage.create_store(user.id, name.trim()).await?;

    tracing::info!(
        "Store created successfully! ID: {}, Name: {}, Owner: {}",
        store.id,
        store.name,
        email
    );
    Ok(store.id.as_i32())
}
