//! The checkout transaction.
//!
//! Converts a user's cart into an order in one storage transaction:
//!
//! 1. lock and read the cart lines with current prices
//! 2. compute the total, rounded once after summing
//! 3. write the order header and one detail per line
//! 4. clear the cart and commit
//!
//! Any failure after the transaction opens rolls everything back. The
//! confirmation email goes out only after commit, and its failure never
//! affects the order.

use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use bookstore_core::{UserId, round_total};

use super::locks::UserLocks;
use super::notifier::{OrderConfirmation, OrderNotifier};
use crate::db::{CheckoutTransaction, RepositoryError, Storage};
use crate::models::{
    CartSummary, CurrentUser, NewOrderDetail, Order, OrderDetail, PricedCartLine, Receipt,
};

/// Errors from checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no lines. Nothing was written.
    #[error("cart is empty")]
    EmptyCart,

    /// A storage step failed and the transaction was rolled back.
    /// Safe to retry.
    #[error("checkout failed: {0}")]
    TransactionFailed(#[source] RepositoryError),
}

/// How long checkout waits for the confirmation send before answering.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(5);

/// Places orders.
pub struct CheckoutService<'a> {
    storage: &'a dyn Storage,
    notifier: &'a dyn OrderNotifier,
    locks: &'a UserLocks,
    total_decimals: u32,
    confirmation_timeout: Duration,
}

impl<'a> CheckoutService<'a> {
    /// `total_decimals` is the number of places order totals are rounded to.
    #[must_use]
    pub const fn new(
        storage: &'a dyn Storage,
        notifier: &'a dyn OrderNotifier,
        locks: &'a UserLocks,
        total_decimals: u32,
    ) -> Self {
        Self {
            storage,
            notifier,
            locks,
            total_decimals,
            confirmation_timeout: CONFIRMATION_TIMEOUT,
        }
    }

    /// Give up waiting on the confirmation send after `timeout`.
    #[must_use]
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    /// Turn the user's cart into an order.
    ///
    /// The confirmation is sent after commit and awaited for at most the
    /// confirmation timeout, so `confirmation_sent` reports whether it was
    /// delivered to the relay. A failed or timed-out send leaves the order
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if there is nothing to buy and
    /// `CheckoutError::TransactionFailed` if any storage step fails. In both
    /// cases storage is left as it was.
    #[tracing::instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn checkout(&self, user: &CurrentUser) -> Result<Receipt, CheckoutError> {
        let guard = self.locks.acquire(user.id).await;

        let mut tx = self
            .storage
            .begin_checkout()
            .await
            .map_err(CheckoutError::TransactionFailed)?;

        let lines = match tx.lock_cart(user.id).await {
            Ok(lines) => lines,
            Err(e) => return Err(abort(tx, user.id, e).await),
        };

        if lines.is_empty() {
            tx.rollback()
                .await
                .map_err(CheckoutError::TransactionFailed)?;
            return Err(CheckoutError::EmptyCart);
        }

        let total = round_total(
            lines.iter().map(PricedCartLine::line_total),
            self.total_decimals,
        );

        let (order, details) = match write_order(tx.as_mut(), user.id, &lines, total).await {
            Ok(written) => written,
            Err(e) => return Err(abort(tx, user.id, e).await),
        };

        if let Err(e) = tx.commit().await {
            tracing::error!(user_id = %user.id, error = %e, "Checkout commit failed");
            return Err(CheckoutError::TransactionFailed(e));
        }
        drop(guard);

        tracing::info!(
            order_id = %order.id,
            total = %order.total,
            lines = details.len(),
            "Order placed"
        );

        let confirmation = OrderConfirmation {
            order: order.clone(),
            items: CartSummary::from_lines(lines, self.total_decimals).lines,
        };
        let send = self
            .notifier
            .send_order_confirmation(&user.email, &confirmation);
        let confirmation_sent = match tokio::time::timeout(self.confirmation_timeout, send).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(
                    order_id = %order.id,
                    error = %e,
                    "Order confirmation not sent"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    order_id = %order.id,
                    timeout_ms = self.confirmation_timeout.as_millis(),
                    "Order confirmation timed out"
                );
                false
            }
        };

        Ok(Receipt {
            order,
            details,
            confirmation_sent,
        })
    }
}

/// Steps 3 and 4: header, details, cart clear.
async fn write_order(
    tx: &mut dyn CheckoutTransaction,
    user: UserId,
    lines: &[PricedCartLine],
    total: Decimal,
) -> Result<(Order, Vec<OrderDetail>), RepositoryError> {
    let order = tx.insert_order(user, Utc::now(), total).await?;

    let mut details = Vec::with_capacity(lines.len());
    for line in lines {
        let detail = NewOrderDetail {
            isbn: line.isbn.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        };
        details.push(tx.insert_order_detail(order.id, &detail).await?);
    }

    tx.clear_cart(user).await?;
    Ok((order, details))
}

/// Roll back after `cause` and report the failure.
async fn abort(
    tx: Box<dyn CheckoutTransaction>,
    user: UserId,
    cause: RepositoryError,
) -> CheckoutError {
    tracing::error!(user_id = %user, error = %cause, "Checkout failed, rolling back");
    if let Err(e) = tx.rollback().await {
        tracing::warn!(user_id = %user, error = %e, "Rollback failed");
    }
    CheckoutError::TransactionFailed(cause)
}
