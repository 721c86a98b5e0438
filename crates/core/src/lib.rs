//! Bookstore Core - Shared types library.
//!
//! This crate provides the types used across all bookstore components:
//! - `storefront` - Catalog, cart, checkout and seller HTTP service
//! - `cli` - Command-line tools for migrations and account management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Rounding and pagination arithmetic live here so that every
//! storage adapter computes them identically.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, ISBNs, emails, roles, money rounding and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
