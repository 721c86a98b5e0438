//! Domain models for the bookstore.
//!
//! Row types derive `sqlx::FromRow` so the `PostgreSQL` adapter can map query
//! results directly. Input types (`BookDraft`, `BookDetails`) carry raw client
//! values and are validated before they reach storage.

pub mod book;
pub mod cart;
pub mod order;
pub mod session;
pub mod store;
pub mod user;

pub use book::{Book, BookDetails, BookDraft, BookValidationError, NewBook};
pub use cart::{CartItem, CartLine, CartSummary, PricedCartLine};
pub use order::{NewOrderDetail, Order, OrderDetail, OrderWithDetails, Receipt};
pub use session::CurrentUser;
pub use store::Store;
pub use user::{User, UserWithPassword};
