//! Order history queries.

use async_trait::async_trait;

use bookstore_core::{OrderId, UserId};

use super::PgStorage;
use crate::db::{OrderRepository, RepositoryError};
use crate::models::{Order, OrderDetail, OrderWithDetails};

#[async_trait]
impl OrderRepository for PgStorage {
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as(
            r"
            SELECT id, user_id, ordered_at, total
            FROM customer_order
            WHERE user_id = $1
            ORDER BY ordered_at DESC, id DESC
            ",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderWithDetails>, RepositoryError> {
        let header: Option<Order> = sqlx::query_as(
            r"
            SELECT id, user_id, ordered_at, total
            FROM customer_order
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(order)
        .bind(user)
        .fetch_optional(&self.pool)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let details: Vec<OrderDetail> = sqlx::query_as(
            r"
            SELECT order_id, isbn, quantity, unit_price
            FROM order_detail
            WHERE order_id = $1
            ORDER BY isbn
            ",
        )
        .bind(header.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(OrderWithDetails {
            order: header,
            details,
        }))
    }
}
