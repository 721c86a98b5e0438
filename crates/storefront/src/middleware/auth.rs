//! Authentication extractors.
//!
//! The logged-in user lives in the session as a [`CurrentUser`]. Handlers
//! declare what they need by taking one of these extractors:
//!
//! - [`RequireCustomer`] - a customer (401 anonymous, 403 seller)
//! - [`RequireSeller`] - a seller (401 anonymous, 403 customer)
//!
//! # Example
//!
//! ```rust,ignore
//! async fn view_cart(RequireCustomer(user): RequireCustomer) -> impl IntoResponse {
//!     format!("cart of {}", user.email)
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bookstore_core::Role;

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::models::session::keys;

/// Read the current user from the session, if any.
async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Require a logged-in user holding `role`.
async fn require_role(parts: &Parts, role: Role) -> Result<CurrentUser, AppError> {
    let user = current_user(parts)
        .await
        .ok_or_else(|| AppError::Unauthorized("login required".to_owned()))?;

    if user.role != role {
        tracing::debug!(user_id = %user.id, required = %role, "Role check failed");
        return Err(AppError::Forbidden(format!("{role} account required")));
    }
    Ok(user)
}

/// Extractor that requires a logged-in customer.
pub struct RequireCustomer(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireCustomer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Customer).await.map(Self)
    }
}

/// Extractor that requires a logged-in seller.
pub struct RequireSeller(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireSeller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        require_role(parts, Role::Seller).await.map(Self)
    }
}

/// Helper to set the current user in the session.
///
/// The session ID is cycled first so a pre-login session cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(keys::CURRENT_USER, user).await
}

/// Helper to clear the current user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
