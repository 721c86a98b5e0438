//! Checkout transaction.
//!
//! Concurrent checkouts for one user are serialized by a transaction-scoped
//! advisory lock keyed on the user id, taken before the cart rows are read
//! `FOR UPDATE`. The second checkout therefore sees the cart the first one
//! left behind.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use bookstore_core::{OrderId, UserId};

use super::PgStorage;
use super::cart::PRICED_CART_QUERY;
use crate::db::{CheckoutRepository, CheckoutTransaction, RepositoryError};
use crate::models::{NewOrderDetail, Order, OrderDetail, PricedCartLine};

/// An open checkout transaction. Dropping it rolls back.
pub struct PgCheckout {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutRepository for PgStorage {
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgCheckout { tx }))
    }
}

#[async_trait]
impl CheckoutTransaction for PgCheckout {
    async fn lock_cart(&mut self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(i64::from(user.as_i32()))
            .execute(&mut *self.tx)
            .await?;

        let lines = sqlx::query_as(&format!("{PRICED_CART_QUERY} FOR UPDATE OF c"))
            .bind(user)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(lines)
    }

    async fn insert_order(
        &mut self,
        user: UserId,
        ordered_at: DateTime<Utc>,
        total: Decimal,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as(
            r"
            INSERT INTO customer_order (user_id, ordered_at, total)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, ordered_at, total
            ",
        )
        .bind(user)
        .bind(ordered_at)
        .bind(total)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(order)
    }

    async fn insert_order_detail(
        &mut self,
        order: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, RepositoryError> {
        let row = sqlx::query_as(
            r"
            INSERT INTO order_detail (order_id, isbn, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING order_id, isbn, quantity, unit_price
            ",
        )
        .bind(order)
        .bind(&detail.isbn)
        .bind(detail.quantity)
        .bind(detail.unit_price)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn clear_cart(&mut self, user: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_line WHERE user_id = $1")
            .bind(user)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
