//! Email service for order confirmations.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text templates.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use bookstore_core::Email;

use super::notifier::{OrderConfirmation, OrderNotifier};
use crate::config::EmailConfig;
use crate::models::CartItem;

/// HTML template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_id: i32,
    ordered_at: &'a str,
    lines: &'a [CartItem],
    total: Decimal,
    order_url: &'a str,
}

/// Plain text template for the order confirmation email.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_id: i32,
    ordered_at: &'a str,
    lines: &'a [CartItem],
    total: Decimal,
    order_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Delivery is not possible right now.
    #[error("Email delivery unavailable: {0}")]
    Unavailable(String),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `base_url` is used to link to the order page.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for EmailService {
    async fn send_order_confirmation(
        &self,
        to: &Email,
        confirmation: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        let order = &confirmation.order;
        let order_id = order.id.as_i32();
        let ordered_at = order.ordered_at.format("%Y-%m-%d %H:%M UTC").to_string();
        let order_url = format!("{}/orders/{order_id}", self.base_url);

        let html = OrderConfirmationHtml {
            order_id,
            ordered_at: &ordered_at,
            lines: &confirmation.items,
            total: order.total,
            order_url: &order_url,
        }
        .render()?;
        let text = OrderConfirmationText {
            order_id,
            ordered_at: &ordered_at,
            lines: &confirmation.items,
            total: order.total,
            order_url: &order_url,
        }
        .render()?;

        self.send_multipart_email(
            to.as_str(),
            &format!("Your bookstore order #{order_id}"),
            &text,
            &html,
        )
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bookstore_core::Isbn;

    fn items() -> Vec<CartItem> {
        vec![CartItem {
            isbn: Isbn::parse("0306406152").unwrap(),
            title: "Tom & Jerry".to_owned(),
            unit_price: Decimal::new(1000, 2),
            quantity: 2,
            line_total: Decimal::new(2000, 2),
        }]
    }

    #[test]
    fn test_text_template_lists_lines() {
        let lines = items();
        let text = OrderConfirmationText {
            order_id: 7,
            ordered_at: "2025-01-01 10:00 UTC",
            lines: &lines,
            total: Decimal::new(2000, 2),
            order_url: "http://localhost:3000/orders/7",
        }
        .render()
        .unwrap();

        assert!(text.contains("Order #7"));
        assert!(text.contains("2 x Tom & Jerry (ISBN 0306406152) @ 10.00 = 20.00"));
        assert!(text.contains("Total: 20.00"));
    }

    #[test]
    fn test_html_template_escapes_titles() {
        let lines = items();
        let html = OrderConfirmationHtml {
            order_id: 7,
            ordered_at: "2025-01-01 10:00 UTC",
            lines: &lines,
            total: Decimal::new(2000, 2),
            order_url: "http://localhost:3000/orders/7",
        }
        .render()
        .unwrap();

        assert!(html.contains("Tom &#38; Jerry") || html.contains("Tom &amp; Jerry"));
    }
}
