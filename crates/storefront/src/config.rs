//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BOOKSTORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `BOOKSTORE_HOST` - Bind address (default: 127.0.0.1)
//! - `BOOKSTORE_PORT` - Listen port (default: 3000)
//! - `BOOKSTORE_BASE_URL` - Public URL used in email links (default: `http://<host>:<port>`)
//! - `BOOKSTORE_IMAGE_DIR` - Cover image directory (default: crates/storefront/static/images)
//! - `BOOKSTORE_TOTAL_DECIMALS` - Decimal places on order totals, 0-6 (default: 2)
//! - `SMTP_HOST`, `SMTP_PORT` (default 587), `SMTP_USERNAME`, `SMTP_PASSWORD`,
//!   `EMAIL_FROM` - Order confirmation email; all but the port are required
//!   once `SMTP_HOST` is set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use bookstore_core::{DEFAULT_TOTAL_DECIMALS, MAX_TOTAL_DECIMALS};

/// Default directory holding uploaded cover images.
pub const DEFAULT_IMAGE_DIR: &str = "crates/storefront/static/images";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for links in emails
    pub base_url: String,
    /// Directory cover images are written to and served from
    pub image_dir: PathBuf,
    /// Decimal places order totals and cart subtotals are rounded to
    pub total_decimals: u32,
    /// SMTP settings; `None` logs confirmations instead of sending them
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// SMTP configuration for order confirmation emails.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BOOKSTORE_DATABASE_URL")?;

        let host: IpAddr = parse_env("BOOKSTORE_HOST", "127.0.0.1")?;
        let port: u16 = parse_env("BOOKSTORE_PORT", "3000")?;

        let base_url = get_optional_env("BOOKSTORE_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let image_dir = PathBuf::from(get_env_or_default("BOOKSTORE_IMAGE_DIR", DEFAULT_IMAGE_DIR));

        let total_decimals: u32 = parse_env(
            "BOOKSTORE_TOTAL_DECIMALS",
            &DEFAULT_TOTAL_DECIMALS.to_string(),
        )?;
        validate_total_decimals(total_decimals)?;

        let email = EmailConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            image_dir,
            total_decimals,
            email,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests: local addresses, no email, no Sentry.
    #[cfg(any(test, feature = "test-support"))]
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            database_url: SecretString::from("postgres://localhost/bookstore_test"),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://127.0.0.1:3000".to_string(),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            total_decimals: DEFAULT_TOTAL_DECIMALS,
            email: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    /// SMTP settings, present only when `SMTP_HOST` is set.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = get_optional_env("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_password = get_required_secret("SMTP_PASSWORD")?;
        validate_not_placeholder(smtp_password.expose_secret(), "SMTP_PASSWORD")?;

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: get_required_env("SMTP_USERNAME")?,
            smtp_password,
            from_address: get_required_env("EMAIL_FROM")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }

    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }

    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, using `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Order totals cannot be stored with more than `MAX_TOTAL_DECIMALS` places.
fn validate_total_decimals(decimals: u32) -> Result<(), ConfigError> {
    if decimals > MAX_TOTAL_DECIMALS {
        return Err(ConfigError::InvalidEnvVar(
            "BOOKSTORE_TOTAL_DECIMALS".to_string(),
            format!("must be between 0 and {MAX_TOTAL_DECIMALS} (got {decimals})"),
        ));
    }
    Ok(())
}

/// Reject secrets that are obviously template placeholders.
fn validate_not_placeholder(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_total_decimals() {
        assert!(validate_total_decimals(0).is_ok());
        assert!(validate_total_decimals(2).is_ok());
        assert!(validate_total_decimals(6).is_ok());
        assert!(matches!(
            validate_total_decimals(7),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_validate_not_placeholder() {
        assert!(validate_not_placeholder("your-smtp-password", "SMTP_PASSWORD").is_err());
        assert!(validate_not_placeholder("CHANGEME", "SMTP_PASSWORD").is_err());
        assert!(validate_not_placeholder("k8#Qz!m2Vr", "SMTP_PASSWORD").is_ok());
    }

    #[test]
    fn test_parse_env_uses_default() {
        let port: u16 = parse_env("BOOKSTORE_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
        let bad: Result<u16, _> = parse_env("BOOKSTORE_TEST_UNSET_PORT", "not-a-port");
        assert!(matches!(bad, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("hunter2-hunter2"),
            from_address: "orders@example.com".to_string(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            port: 8080,
            ..StorefrontConfig::for_testing()
        };
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
    }
}
