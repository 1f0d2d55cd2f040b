//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::address_lookup::{AddressLookup, LookupError};
use crate::services::email::{EmailError, Mailer};
use crate::services::payments::{PaymentClient, PaymentError};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("address lookup client: {0}")]
    Lookup(#[from] LookupError),
    #[error("payment client: {0}")]
    Payment(#[from] PaymentError),
    #[error("mailer: {0}")]
    Email(#[from] EmailError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool,
/// configuration and external-service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    lookup: AddressLookup,
    payments: PaymentClient,
    mailer: Mailer,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns a `StateError` when one of the external clients cannot be
    /// constructed.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let lookup = AddressLookup::new(&config.pdok_lookup_url, &config.pdok_suggest_url)?;
        let payments = PaymentClient::new(config.payment.clone())?;
        let mailer = Mailer::new(config.email.as_ref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                lookup,
                payments,
                mailer,
            }),
        })
    }

    /// The API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// The database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The PDOK address lookup client.
    #[must_use]
    pub fn lookup(&self) -> &AddressLookup {
        &self.inner.lookup
    }

    /// The payment provider client.
    #[must_use]
    pub fn payments(&self) -> &PaymentClient {
        &self.inner.payments
    }

    /// The confirmation mailer.
    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }
}
