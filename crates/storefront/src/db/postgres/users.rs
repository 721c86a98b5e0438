//! Account and store queries.

use async_trait::async_trait;

use bookstore_core::{Email, Role, UserId};

use super::{PgStorage, is_foreign_key_violation, unique_violation};
use crate::db::{RepositoryError, StoreRepository, UserRepository};
use crate::models::{Store, User, UserWithPassword};

#[async_trait]
impl UserRepository for PgStorage {
    async fn get_user_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<UserWithPassword>, RepositoryError> {
        let row = sqlx::query_as(
            r"
            SELECT id, email, role, created_at, password_hash
            FROM app_user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as(
            r"
            SELECT id, email, role, created_at
            FROM app_user
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_user(
        &self,
        email: &Email,
        role: Role,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as(
            r"
            INSERT INTO app_user (email, role, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, role, created_at
            ",
        )
        .bind(email)
        .bind(role)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "email already exists"))?;
        Ok(row)
    }
}

#[async_trait]
impl StoreRepository for PgStorage {
    async fn store_for_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError> {
        let store = sqlx::query_as("SELECT id, owner_id, name FROM store WHERE owner_id = $1")
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;
        Ok(store)
    }

    async fn create_store(&self, owner: UserId, name: &str) -> Result<Store, RepositoryError> {
        let store = sqlx::query_as(
            r"
            INSERT INTO store (owner_id, name)
            VALUES ($1, $2)
            RETURNING id, owner_id, name
            ",
        )
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return RepositoryError::NotFound;
            }
            unique_violation(e, "this seller already owns a store")
        })?;
        Ok(store)
    }
}
