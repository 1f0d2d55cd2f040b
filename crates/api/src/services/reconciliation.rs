//! Order/payment reconciliation.
//!
//! Applies external payment-provider notifications to an order's
//! (status, payment status) pair. The transition rules are a pure
//! function so they can be tested exhaustively; the service wraps them
//! in a transaction together with the payment-transaction mirror row.
//!
//! Reconciliation is idempotent: providers redeliver notifications, so
//! replaying "paid" on an already-paid order is a no-op and the
//! confirmation email is sent at most once (guarded by
//! `confirmation_sent_at`, stamped in the same transaction).

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::instrument;

use crate::db::RepositoryError;
use crate::db::orders::OrderRepository;
use crate::models::{Order, OrderStatus, PaymentStatus, TransactionStatus};

/// Errors produced by reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// No order is linked to the notified payment.
    #[error("no order for payment {0}")]
    UnknownPayment(String),

    /// The requested transition is not allowed from the current state.
    #[error("cannot {action} an order that is {from:?}")]
    InvalidTransition {
        action: &'static str,
        from: OrderStatus,
    },

    /// Database failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// What a notification should do to an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Write the new status pair; `send_confirmation` is set the first
    /// time a payment succeeds.
    Apply {
        status: OrderStatus,
        payment_status: PaymentStatus,
        send_confirmation: bool,
    },
    /// Redelivery or irrelevant provider state; change nothing.
    Noop,
}

/// Decide what a provider notification does to the current state.
///
/// Pure function over (status, payment status, provider status).
#[must_use]
pub fn plan_transition(
    status: OrderStatus,
    payment_status: PaymentStatus,
    provider: TransactionStatus,
    confirmation_already_sent: bool,
) -> Transition {
    match provider {
        TransactionStatus::Paid => {
            if payment_status == PaymentStatus::Paid {
                // Redelivered success notification.
                Transition::Noop
            } else {
                Transition::Apply {
                    status: OrderStatus::Processing,
                    payment_status: PaymentStatus::Paid,
                    send_confirmation: !confirmation_already_sent,
                }
            }
        }
        TransactionStatus::Failed | TransactionStatus::Expired | TransactionStatus::Cancelled => {
            if payment_status == PaymentStatus::Paid {
                // A failure after success is provider noise; never
                // regress a paid order.
                Transition::Noop
            } else if status == OrderStatus::Cancelled
                && payment_status == PaymentStatus::Failed
            {
                Transition::Noop
            } else {
                Transition::Apply {
                    status: OrderStatus::Cancelled,
                    payment_status: PaymentStatus::Failed,
                    send_confirmation: false,
                }
            }
        }
        TransactionStatus::Open | TransactionStatus::Pending => Transition::Noop,
    }
}

/// Outcome of an applied notification, for the caller's post-commit
/// side effects.
#[derive(Debug)]
pub struct ReconcileOutcome {
    pub order: Order,
    /// The order just became paid for the first time; send the
    /// confirmation email.
    pub send_confirmation: bool,
}

/// Reconciliation service.
pub struct ReconciliationService<'a> {
    pool: &'a PgPool,
}

impl<'a> ReconciliationService<'a> {
    /// Create a new reconciliation service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Apply a provider notification to the order owning
    /// `provider_payment_id`.
    ///
    /// The payment-transaction mirror (including the raw payload) and
    /// the status transition commit together; the confirmation email is
    /// left to the caller, after commit, when `send_confirmation` is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::UnknownPayment` when no order references
    /// the payment, or `Repository` for database failures.
    #[instrument(skip(self, payload))]
    pub async fn apply_notification(
        &self,
        provider_payment_id: &str,
        provider_status: TransactionStatus,
        amount: Decimal,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let orders = OrderRepository::new(self.pool);
        let order = orders
            .get_by_payment_reference(provider_payment_id)
            .await?
            .ok_or_else(|| ReconcileError::UnknownPayment(provider_payment_id.to_owned()))?;

        let plan = plan_transition(
            order.status,
            order.payment_status,
            provider_status,
            order.confirmation_sent_at.is_some(),
        );

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        OrderRepository::upsert_payment_transaction_in_tx(
            &mut tx,
            order.id,
            provider_payment_id,
            provider_status,
            amount,
            method,
            payload,
        )
        .await?;

        let outcome = match plan {
            Transition::Apply {
                status,
                payment_status,
                send_confirmation,
            } => {
                let stamp = send_confirmation.then(Utc::now);
                OrderRepository::set_statuses_in_tx(&mut tx, order.id, status, payment_status, stamp)
                    .await?;
                tracing::info!(
                    order_number = %order.order_number,
                    ?status,
                    ?payment_status,
                    "payment notification applied"
                );
                ReconcileOutcome {
                    order: Order {
                        status,
                        payment_status,
                        confirmation_sent_at: stamp.or(order.confirmation_sent_at),
                        ..order
                    },
                    send_confirmation,
                }
            }
            Transition::Noop => {
                tracing::debug!(
                    order_number = %order.order_number,
                    ?provider_status,
                    "payment notification was a no-op"
                );
                ReconcileOutcome {
                    order,
                    send_confirmation: false,
                }
            }
        };

        tx.commit().await.map_err(RepositoryError::from)?;
        Ok(outcome)
    }

    /// Cancel an order. Only allowed while it is pending or confirmed;
    /// anything later fails with a domain error rather than silently
    /// succeeding.
    ///
    /// # Errors
    ///
    /// Returns `ReconcileError::InvalidTransition` when the order is
    /// past the cancellation window.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order: &Order) -> Result<Order, ReconcileError> {
        if !order.status.can_be_cancelled() {
            return Err(ReconcileError::InvalidTransition {
                action: "cancel",
                from: order.status,
            });
        }

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        OrderRepository::set_statuses_in_tx(
            &mut tx,
            order.id,
            OrderStatus::Cancelled,
            order.payment_status,
            None,
        )
        .await?;
        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(order_number = %order.order_number, "order cancelled");
        Ok(Order {
            status: OrderStatus::Cancelled,
            ..order.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paid_notification_moves_a_fresh_order_to_processing() {
        let plan = plan_transition(
            OrderStatus::Confirmed,
            PaymentStatus::Pending,
            TransactionStatus::Paid,
            false,
        );
        assert_eq!(
            plan,
            Transition::Apply {
                status: OrderStatus::Processing,
                payment_status: PaymentStatus::Paid,
                send_confirmation: true,
            }
        );
    }

    #[test]
    fn replayed_paid_notification_is_a_noop() {
        let plan = plan_transition(
            OrderStatus::Processing,
            PaymentStatus::Paid,
            TransactionStatus::Paid,
            true,
        );
        assert_eq!(plan, Transition::Noop);
    }

    #[test]
    fn confirmation_is_sent_at_most_once() {
        // Paid arrives while the stamp is already set (e.g. a crash
        // between commit and redelivery): still no second email.
        let plan = plan_transition(
            OrderStatus::Confirmed,
            PaymentStatus::Pending,
            TransactionStatus::Paid,
            true,
        );
        assert_eq!(
            plan,
            Transition::Apply {
                status: OrderStatus::Processing,
                payment_status: PaymentStatus::Paid,
                send_confirmation: false,
            }
        );
    }

    #[test]
    fn failure_family_cancels_unpaid_orders() {
        for provider in [
            TransactionStatus::Failed,
            TransactionStatus::Expired,
            TransactionStatus::Cancelled,
        ] {
            let plan = plan_transition(
                OrderStatus::Confirmed,
                PaymentStatus::Pending,
                provider,
                false,
            );
            assert_eq!(
                plan,
                Transition::Apply {
                    status: OrderStatus::Cancelled,
                    payment_status: PaymentStatus::Failed,
                    send_confirmation: false,
                },
                "provider status {provider:?}"
            );
        }
    }

    #[test]
    fn failure_never_regresses_a_paid_order() {
        let plan = plan_transition(
            OrderStatus::Processing,
            PaymentStatus::Paid,
            TransactionStatus::Failed,
            true,
        );
        assert_eq!(plan, Transition::Noop);
    }

    #[test]
    fn replayed_failure_is_a_noop() {
        let plan = plan_transition(
            OrderStatus::Cancelled,
            PaymentStatus::Failed,
            TransactionStatus::Expired,
            false,
        );
        assert_eq!(plan, Transition::Noop);
    }

    #[test]
    fn open_and_pending_change_nothing() {
        for provider in [TransactionStatus::Open, TransactionStatus::Pending] {
            let plan = plan_transition(
                OrderStatus::Confirmed,
                PaymentStatus::Pending,
                provider,
                false,
            );
            assert_eq!(plan, Transition::Noop);
        }
    }
}
