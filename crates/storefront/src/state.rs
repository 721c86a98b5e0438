//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Storage;
use crate::services::auth::AuthService;
use crate::services::cart::CartService;
use crate::services::catalog::CatalogService;
use crate::services::checkout::CheckoutService;
use crate::services::images::ImageStore;
use crate::services::locks::UserLocks;
use crate::services::notifier::OrderNotifier;
use crate::services::orders::OrderService;
use crate::services::seller::SellerBookService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Collaborators are trait
/// objects so tests can run the router over in-memory adapters.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    notifier: Arc<dyn OrderNotifier>,
    images: Arc<dyn ImageStore>,
    checkout_locks: UserLocks,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn OrderNotifier>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                notifier,
                images,
                checkout_locks: UserLocks::new(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage adapter.
    #[must_use]
    pub fn storage(&self) -> &dyn Storage {
        self.inner.storage.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.storage())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.storage())
    }

    #[must_use]
    pub fn cart(&self) -> CartService<'_> {
        CartService::new(self.storage(), self.inner.config.total_decimals)
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutService<'_> {
        CheckoutService::new(
            self.storage(),
            self.inner.notifier.as_ref(),
            &self.inner.checkout_locks,
            self.inner.config.total_decimals,
        )
    }

    #[must_use]
    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self.storage())
    }

    #[must_use]
    pub fn seller_books(&self) -> SellerBookService<'_> {
        SellerBookService::new(self.storage(), self.inner.images.as_ref())
    }
}
