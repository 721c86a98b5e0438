//! Bookstore storefront library.
//!
//! Catalog browsing, carts, checkout and seller book management behind an
//! Axum JSON API. Exposed as a library so the CLI and integration tests can
//! reuse the storage adapters, services and router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
