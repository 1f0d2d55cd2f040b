//! Payment-provider webhook.
//!
//! The provider posts `id=<payment id>` when a payment changes state.
//! The notification body is never trusted: the handler fetches the
//! payment's current status from the provider first (bounded timeout,
//! no open transaction), then lets the reconciliation service apply it.
//! Unknown payments are acknowledged with 200 so the provider stops
//! redelivering them.

use axum::{Form, Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::orders::OrderRepository;
use crate::error::Result;
use crate::services::reconciliation::{ReconcileError, ReconciliationService};
use crate::state::AppState;

/// Provider notification body.
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub id: String,
}

/// `POST /api/webhooks/payment`
pub async fn payment(
    State(state): State<AppState>,
    Form(payload): Form<WebhookPayload>,
) -> Result<Json<Value>> {
    // Authoritative status comes from the provider, not the webhook.
    let provider_payment = state.payments().get_payment(&payload.id).await?;

    let raw = json!({
        "id": provider_payment.id,
        "status": provider_payment.status,
        "amount": provider_payment.amount,
        "method": provider_payment.method,
    });

    let service = ReconciliationService::new(state.pool());
    let outcome = match service
        .apply_notification(
            &provider_payment.id,
            provider_payment.status,
            provider_payment.amount,
            &provider_payment.method,
            &raw,
        )
        .await
    {
        Ok(outcome) => outcome,
        Err(ReconcileError::UnknownPayment(id)) => {
            tracing::warn!(payment_id = %id, "webhook for unknown payment acknowledged");
            return Ok(Json(json!({ "status": "ignored" })));
        }
        Err(e) => return Err(e.into()),
    };

    // Post-commit side effect: the confirmation mail, at most once per
    // order (guarded by the stamp written with the transition). A send
    // failure is logged, never bubbled: the payment is reconciled.
    if outcome.send_confirmation {
        let items = OrderRepository::new(state.pool()).items(outcome.order.id).await?;
        if let Err(e) = state
            .mailer()
            .send_order_confirmation(&outcome.order, &items)
            .await
        {
            tracing::error!(
                order_number = %outcome.order.order_number,
                error = %e,
                "confirmation email failed"
            );
        }
    }

    Ok(Json(json!({ "status": "processed" })))
}
