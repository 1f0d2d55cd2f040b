//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `BASE_URL` - Public URL of this API (used for webhook URLs)
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//! - `PAYMENT_API_KEY` - Payment provider API key
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8000)
//! - `FRONTEND_URL` - Webshop frontend base for payment redirects
//!   (default: `BASE_URL`)
//! - `PAYMENT_API_BASE` - Provider API base (default: Mollie v2)
//! - `PDOK_LOOKUP_URL` / `PDOK_SUGGEST_URL` - Locatieserver endpoints
//! - `SMTP_HOST` / `SMTP_USERNAME` / `SMTP_PASSWORD` / `EMAIL_FROM` -
//!   confirmation email relay; email is disabled when absent
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::IpAddr;

use secrecy::SecretString;
use thiserror::Error;

use crate::services::email::EmailConfig;
use crate::services::payments::PaymentConfig;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_PAYMENT_API_BASE: &str = "https://api.mollie.com/v2";
const DEFAULT_PDOK_LOOKUP_URL: &str =
    "https://api.pdok.nl/bzk/locatieserver/search/v3_1/free";
const DEFAULT_PDOK_SUGGEST_URL: &str =
    "https://api.pdok.nl/bzk/locatieserver/suggest/v3_1/free";

/// Blocklist of common placeholder patterns (case-insensitive).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "secret", "password", "xxx",
    "todo", "fixme", "insert", "enter-", "put-your", "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL (contains password).
    pub database_url: SecretString,
    /// IP address to bind the server to.
    pub host: IpAddr,
    /// Port to listen on.
    pub port: u16,
    /// Public base URL of this API.
    pub base_url: String,
    /// JWT signing secret.
    pub jwt_secret: SecretString,
    /// Payment provider configuration.
    pub payment: PaymentConfig,
    /// PDOK Locatieserver endpoints.
    pub pdok_lookup_url: String,
    pub pdok_suggest_url: String,
    /// SMTP relay; `None` disables confirmation email.
    pub email: Option<EmailConfig>,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment name.
    pub sentry_environment: Option<String>,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for missing or invalid variables, or a
    /// JWT secret that is too short, too low-entropy or a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = SecretString::from(require("DATABASE_URL")?);
        let base_url = require("BASE_URL")?.trim_end_matches('/').to_owned();

        let jwt_secret = require("JWT_SECRET")?;
        validate_secret("JWT_SECRET", &jwt_secret)?;
        let jwt_secret = SecretString::from(jwt_secret);

        let host: IpAddr = optional("HOST")
            .unwrap_or_else(|| "127.0.0.1".to_owned())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_owned(), format!("{e}")))?;
        let port: u16 = optional("PORT")
            .unwrap_or_else(|| "8000".to_owned())
            .parse()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_owned(), format!("{e}")))?;

        let frontend_url = optional("FRONTEND_URL")
            .map_or_else(|| base_url.clone(), |u| u.trim_end_matches('/').to_owned());

        let payment = PaymentConfig {
            api_base: optional("PAYMENT_API_BASE")
                .unwrap_or_else(|| DEFAULT_PAYMENT_API_BASE.to_owned()),
            api_key: SecretString::from(require("PAYMENT_API_KEY")?),
            webhook_url: format!("{base_url}/api/webhooks/payment"),
            redirect_base: frontend_url,
        };

        let email = match (
            optional("SMTP_HOST"),
            optional("SMTP_USERNAME"),
            optional("SMTP_PASSWORD"),
            optional("EMAIL_FROM"),
        ) {
            (Some(smtp_host), Some(smtp_username), Some(smtp_password), Some(from_address)) => {
                Some(EmailConfig {
                    smtp_host,
                    smtp_username,
                    smtp_password: SecretString::from(smtp_password),
                    from_address,
                })
            }
            _ => None,
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            payment,
            pdok_lookup_url: optional("PDOK_LOOKUP_URL")
                .unwrap_or_else(|| DEFAULT_PDOK_LOOKUP_URL.to_owned()),
            pdok_suggest_url: optional("PDOK_SUGGEST_URL")
                .unwrap_or_else(|| DEFAULT_PDOK_SUGGEST_URL.to_owned()),
            email,
            sentry_dsn: optional("SENTRY_DSN"),
            sentry_environment: optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Socket address to bind.
    #[must_use]
    pub const fn socket_addr(&self) -> std::net::SocketAddr {
        std::net::SocketAddr::new(self.host, self.port)
    }
}

fn require(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Reject short, low-entropy or placeholder secrets before the server
/// starts signing tokens with them.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_JWT_SECRET_LENGTH} characters"),
        ));
    }

    let lower = value.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("looks like a placeholder (contains \"{pattern}\")"),
        ));
    }

    if shannon_entropy_per_char(value) < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            "entropy too low; use a randomly generated value".to_owned(),
        ));
    }

    Ok(())
}

/// Shannon entropy in bits per character.
fn shannon_entropy_per_char(s: &str) -> f64 {
    let mut counts = std::collections::HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_insert(0u32) += 1;
    }
    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    counts
        .values()
        .map(|&count| {
            let p = f64::from(count) / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_rejected() {
        assert!(matches!(
            validate_secret("JWT_SECRET", "kort"),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn placeholder_secrets_are_rejected() {
        assert!(matches!(
            validate_secret("JWT_SECRET", "changeme-changeme-changeme-changeme"),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn repeated_characters_have_no_entropy() {
        assert!(matches!(
            validate_secret("JWT_SECRET", &"a".repeat(64)),
            Err(ConfigError::InsecureSecret(..))
        ));
    }

    #[test]
    fn random_looking_secrets_pass() {
        assert!(validate_secret("JWT_SECRET", "fJ8#kP2$mN9@qR5!wT7%yU3^zA6&bC4*").is_ok());
    }
}
