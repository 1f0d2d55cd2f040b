//! Payment provider client.
//!
//! Thin reqwest client for the hosted-payment provider (Mollie-style
//! API): create a payment for an order, fetch a payment's current
//! status. Calls are bounded by a short timeout and are never made while
//! a database transaction is open.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::models::{Order, PaymentMethod, TransactionStatus};

/// Provider request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the payment provider boundary.
#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    /// The provider did not answer in time.
    #[error("payment provider timed out")]
    Timeout,

    /// Transport-level failure.
    #[error("payment provider unreachable: {0}")]
    Network(reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("payment provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider's response did not have the expected shape.
    #[error("unexpected payment provider response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(e)
        }
    }
}

/// Configuration for the payment provider client.
#[derive(Clone)]
pub struct PaymentConfig {
    /// Provider API base, e.g. `https://api.mollie.com/v2`.
    pub api_base: String,
    /// Provider API key.
    pub api_key: SecretString,
    /// Absolute URL the provider calls with status changes.
    pub webhook_url: String,
    /// Frontend base for the post-payment redirect.
    pub redirect_base: String,
}

impl std::fmt::Debug for PaymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"[REDACTED]")
            .field("webhook_url", &self.webhook_url)
            .field("redirect_base", &self.redirect_base)
            .finish()
    }
}

/// A payment freshly created at the provider.
#[derive(Debug, Clone)]
pub struct CreatedPayment {
    pub id: String,
    pub status: TransactionStatus,
    /// Where to send the customer to complete the payment.
    pub checkout_url: Option<String>,
}

/// A payment's current provider-side state.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    pub id: String,
    pub status: TransactionStatus,
    pub amount: Decimal,
    pub method: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: String,
    status: TransactionStatus,
    amount: AmountResponse,
    #[serde(default)]
    method: Option<String>,
    #[serde(default, rename = "_links")]
    links: Links,
}

#[derive(Debug, Deserialize)]
struct AmountResponse {
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    checkout: Option<Link>,
}

#[derive(Debug, Deserialize)]
struct Link {
    href: String,
}

/// Client for the payment provider API.
#[derive(Clone)]
pub struct PaymentClient {
    inner: Arc<PaymentClientInner>,
}

struct PaymentClientInner {
    client: reqwest::Client,
    config: PaymentConfig,
}

impl PaymentClient {
    /// Create a new payment client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Network` if the HTTP client cannot be
    /// built.
    pub fn new(config: PaymentConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            inner: Arc::new(PaymentClientInner { client, config }),
        })
    }

    /// Create a payment for an order and return the provider's payment
    /// ID plus the checkout URL to redirect the customer to.
    ///
    /// # Errors
    ///
    /// Returns a `PaymentError` for timeouts, transport failures,
    /// provider rejections or malformed responses.
    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn create_payment(&self, order: &Order) -> Result<CreatedPayment, PaymentError> {
        let cfg = &self.inner.config;
        let body = json!({
            "amount": {
                "currency": "EUR",
                "value": format_amount(order.total_amount),
            },
            "description": format!("Groenmarkt bestelling {}", order.order_number),
            "redirectUrl": format!("{}/checkout/return/{}", cfg.redirect_base, order.id),
            "webhookUrl": cfg.webhook_url,
            "method": [provider_method(order.payment_method)],
            "metadata": {
                "order_id": order.id,
                "order_number": order.order_number,
                "customer_email": order.customer_email,
            },
        });

        let response = self
            .inner
            .client
            .post(format!("{}/payments", cfg.api_base))
            .bearer_auth(cfg.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let payment = Self::parse_response(response).await?;
        tracing::info!(payment_id = %payment.id, "payment created at provider");
        Ok(CreatedPayment {
            checkout_url: payment.links.checkout.map(|l| l.href),
            id: payment.id,
            status: payment.status,
        })
    }

    /// Fetch a payment's current status from the provider. The webhook
    /// handler calls this instead of trusting the notification body.
    ///
    /// # Errors
    ///
    /// Returns a `PaymentError` for timeouts, transport failures,
    /// provider rejections or malformed responses.
    #[instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: &str) -> Result<ProviderPayment, PaymentError> {
        let cfg = &self.inner.config;
        let response = self
            .inner
            .client
            .get(format!("{}/payments/{payment_id}", cfg.api_base))
            .bearer_auth(cfg.api_key.expose_secret())
            .send()
            .await?;

        let payment = Self::parse_response(response).await?;
        let amount = payment
            .amount
            .value
            .parse::<Decimal>()
            .map_err(|e| PaymentError::Malformed(format!("bad amount: {e}")))?;

        Ok(ProviderPayment {
            id: payment.id,
            status: payment.status,
            amount,
            method: payment.method.unwrap_or_default(),
        })
    }

    async fn parse_response(response: reqwest::Response) -> Result<PaymentResponse, PaymentError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: text.chars().take(500).collect(),
            });
        }

        serde_json::from_str(&text).map_err(|e| PaymentError::Malformed(e.to_string()))
    }
}

/// The provider's method identifier for a checkout payment method.
const fn provider_method(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Ideal => "ideal",
        PaymentMethod::Creditcard => "creditcard",
        PaymentMethod::Paypal => "paypal",
    }
}

/// Provider amounts are strings with exactly two decimals.
fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_format_with_two_decimals() {
        assert_eq!(format_amount("35.2".parse().unwrap()), "35.20");
        assert_eq!(format_amount("10".parse().unwrap()), "10.00");
        assert_eq!(format_amount("4.955".parse().unwrap()), "4.96");
    }

    #[test]
    fn provider_methods_match_the_provider_vocabulary() {
        assert_eq!(provider_method(PaymentMethod::Ideal), "ideal");
        assert_eq!(provider_method(PaymentMethod::Creditcard), "creditcard");
        assert_eq!(provider_method(PaymentMethod::Paypal), "paypal");
    }

    #[test]
    fn payment_responses_deserialize() {
        let json = r#"{
            "id": "tr_WDqYK6vllg",
            "status": "paid",
            "amount": { "currency": "EUR", "value": "35.20" },
            "method": "ideal",
            "_links": { "checkout": { "href": "https://pay.example/tr_WDqYK6vllg" } }
        }"#;
        let payment: PaymentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(payment.id, "tr_WDqYK6vllg");
        assert_eq!(payment.status, TransactionStatus::Paid);
        assert_eq!(payment.amount.value, "35.20");
        assert_eq!(payment.links.checkout.unwrap().href, "https://pay.example/tr_WDqYK6vllg");
    }

    #[test]
    fn minimal_payment_responses_deserialize() {
        let json = r#"{
            "id": "tr_x",
            "status": "open",
            "amount": { "currency": "EUR", "value": "10.00" }
        }"#;
        let payment: PaymentResponse = serde_json::from_str(json).unwrap();
        assert!(payment.method.is_none());
        assert!(payment.links.checkout.is_none());
    }
}
