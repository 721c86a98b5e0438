//! Order confirmation notifications.
//!
//! Sending happens after the checkout transaction commits. A failed send is
//! logged and reported on the receipt; the order is never rolled back.

use async_trait::async_trait;

use bookstore_core::Email;

use super::email::EmailError;
use crate::models::{CartItem, Order};

/// What a confirmation message needs to say about an order.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order: Order,
    /// Purchased lines with titles, as they were priced at checkout.
    pub items: Vec<CartItem>,
}

/// Sends order confirmations to customers.
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    /// Tell `to` that their order went through.
    async fn send_order_confirmation(
        &self,
        to: &Email,
        confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError>;
}

/// Notifier used when SMTP is not configured. Logs and reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl OrderNotifier for LogNotifier {
    async fn send_order_confirmation(
        &self,
        to: &Email,
        confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        tracing::info!(
            to = %to,
            order_id = %confirmation.order.id,
            total = %confirmation.order.total,
            "SMTP not configured, order confirmation logged only"
        );
        Ok(())
    }
}

/// Notifier that remembers every confirmation it was asked to send.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: std::sync::Arc<tokio::sync::Mutex<Vec<(Email, OrderConfirmation)>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingNotifier {
    /// Create a notifier with an empty outbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far.
    pub async fn sent(&self) -> Vec<(Email, OrderConfirmation)> {
        self.sent.lock().await.clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl OrderNotifier for RecordingNotifier {
    async fn send_order_confirmation(
        &self,
        to: &Email,
        confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        self.sent
            .lock()
            .await
            .push((to.clone(), confirmation.clone()));
        Ok(())
    }
}

/// Notifier whose every send fails.
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingNotifier;

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl OrderNotifier for FailingNotifier {
    async fn send_order_confirmation(
        &self,
        _to: &Email,
        _confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        Err(EmailError::Unavailable("mail relay unreachable".to_owned()))
    }
}
