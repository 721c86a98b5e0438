//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod isbn;
pub mod money;
pub mod page;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use isbn::{Isbn, IsbnError};
pub use money::{DEFAULT_TOTAL_DECIMALS, MAX_TOTAL_DECIMALS, line_total, round_total};
pub use page::{PAGE_SIZE, Page, PageRequest, total_pages};
pub use role::{Role, RoleParseError};
