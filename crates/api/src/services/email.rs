//! Order confirmation email.
//!
//! SMTP via lettre. The mailer is optional: without SMTP configuration
//! the send becomes a log line, and a failed send never fails the
//! request that triggered it (reconciliation already committed).

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::models::{Order, OrderItem};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build the email message.
    #[error("failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid sender or recipient address.
    #[error("invalid email address: {0}")]
    InvalidAddress(String),
}

/// SMTP settings; absent entirely when email is disabled.
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Order confirmation sender.
#[derive(Clone)]
pub enum Mailer {
    /// Live SMTP transport.
    Smtp {
        transport: AsyncSmtpTransport<Tokio1Executor>,
        from_address: String,
    },
    /// No SMTP configured; sends are logged and dropped.
    Disabled,
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Smtp { from_address, .. } => f
                .debug_struct("Mailer::Smtp")
                .field("from_address", from_address)
                .finish_non_exhaustive(),
            Self::Disabled => f.write_str("Mailer::Disabled"),
        }
    }
}

impl Mailer {
    /// Build a mailer from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the relay configuration is invalid.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, EmailError> {
        let Some(config) = config else {
            tracing::info!("SMTP not configured; confirmation emails disabled");
            return Ok(Self::Disabled);
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_owned(),
            ))
            .build();

        Ok(Self::Smtp {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// Send the confirmation mail for a freshly paid order.
    ///
    /// # Errors
    ///
    /// Returns an `EmailError` when the message cannot be built or the
    /// relay rejects it. Callers log and move on; the payment is already
    /// reconciled.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        items: &[OrderItem],
    ) -> Result<(), EmailError> {
        let Self::Smtp {
            transport,
            from_address,
        } = self
        else {
            tracing::info!(
                order_number = %order.order_number,
                "confirmation email skipped (mailer disabled)"
            );
            return Ok(());
        };

        let message = Message::builder()
            .from(
                from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(from_address.clone()))?,
            )
            .to(order
                .customer_email
                .parse()
                .map_err(|_| EmailError::InvalidAddress(order.customer_email.clone()))?)
            .subject(format!("Bevestiging bestelling {}", order.order_number))
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(order, items))?;

        transport.send(message).await?;
        tracing::info!(order_number = %order.order_number, "confirmation email sent");
        Ok(())
    }
}

/// Plain-text confirmation body.
fn confirmation_body(order: &Order, items: &[OrderItem]) -> String {
    let mut body = format!(
        "Beste {},\n\nBedankt voor je bestelling {}.\n\n",
        order.customer_name, order.order_number
    );
    for item in items {
        body.push_str(&format!(
            "  {} x {} — € {:.2}\n",
            item.quantity, item.product_name, item.total_price
        ));
    }
    body.push_str(&format!(
        "\nSubtotaal: € {:.2}\nBTW ({}%): € {:.2}\nVerzendkosten: € {:.2}\nTotaal: € {:.2}\n",
        order.subtotal,
        order.tax_rate * rust_decimal::Decimal::ONE_HUNDRED,
        order.tax_amount,
        order.shipping_cost,
        order.total_amount
    ));
    body.push_str("\nVerzendadres:\n");
    body.push_str(&order.shipping_address_text);
    body.push_str("\n\nJe ontvangt een bericht zodra de bestelling is verzonden.\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, PaymentMethod, PaymentStatus};
    use chrono::Utc;
    use groenmarkt_core::{OrderId, OrderItemId, ProductId, UserId};

    fn dec(s: &str) -> rust_decimal::Decimal {
        s.parse().unwrap()
    }

    fn order() -> Order {
        Order {
            id: OrderId::new(1),
            order_number: "GM202608070001".to_owned(),
            user_id: UserId::new(1),
            customer_email: "klant@example.nl".to_owned(),
            customer_name: "Jan de Vries".to_owned(),
            customer_phone: String::new(),
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Paid,
            shipping_address_id: None,
            billing_address_id: None,
            shipping_address_text: "Jan de Vries\nKeizersgracht 12\n1015 CR Amsterdam".to_owned(),
            billing_address_text: String::new(),
            subtotal: dec("25.00"),
            tax_rate: dec("0.21"),
            tax_amount: dec("5.25"),
            shipping_cost: dec("4.95"),
            total_amount: dec("35.20"),
            payment_method: PaymentMethod::Ideal,
            ideal_bank: "ING".to_owned(),
            payment_reference: "tr_x".to_owned(),
            tracking_number: String::new(),
            customer_notes: String::new(),
            confirmation_sent_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            shipped_at: None,
            delivered_at: None,
        }
    }

    #[test]
    fn body_lists_items_and_totals() {
        let items = vec![OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: "Manuka honing".to_owned(),
            product_sku: "GM-MAN-AAAAAAAA".to_owned(),
            unit_price: dec("10.00"),
            quantity: 2,
            total_price: dec("20.00"),
            created_at: Utc::now(),
        }];
        let body = confirmation_body(&order(), &items);
        assert!(body.contains("GM202608070001"));
        assert!(body.contains("2 x Manuka honing"));
        assert!(body.contains("Totaal: € 35.20"));
        assert!(body.contains("Keizersgracht 12"));
    }

    #[tokio::test]
    async fn disabled_mailer_swallows_sends() {
        let mailer = Mailer::new(None).unwrap();
        assert!(mailer.send_order_confirmation(&order(), &[]).await.is_ok());
    }
}
