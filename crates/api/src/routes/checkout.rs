//! Checkout handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde_json::{Value, json};

use groenmarkt_core::STANDARD_VAT_RATE;

use crate::db::addresses::AddressRepository;
use crate::db::carts::CartRepository;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::cart::CartView;
use crate::services::checkout::{
    CheckoutError, CheckoutInput, CheckoutService, Customer, IDEAL_BANKS, SHIPPING_COST,
};
use crate::state::AppState;

/// `GET /api/checkout` — everything the client needs to render the
/// checkout form: cart contents, the caller's addresses, the iDEAL bank
/// list, shipping cost and tax rate.
pub async fn init(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Value>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts
        .get_for_user(user.id)
        .await?
        .ok_or(AppError::Checkout(CheckoutError::EmptyCart))?;
    let lines = carts.items(cart.id).await?;
    if lines.is_empty() {
        return Err(AppError::Checkout(CheckoutError::EmptyCart));
    }

    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    let address_summaries: Vec<Value> = addresses
        .iter()
        .map(|a| {
            json!({
                "id": a.id,
                "address_type": a.address_type,
                "full_address": a.formatted(),
                "is_default_shipping": a.is_default_shipping,
                "is_default_billing": a.is_default_billing,
            })
        })
        .collect();

    Ok(Json(json!({
        "cart": CartView::from_lines(lines),
        "addresses": address_summaries,
        "ideal_banks": IDEAL_BANKS,
        "shipping_cost": SHIPPING_COST,
        "tax_rate": STANDARD_VAT_RATE,
    })))
}

/// `POST /api/checkout` — run the atomic cart → order conversion, then
/// create the payment at the provider (outside the transaction) and
/// hand back the checkout URL.
pub async fn process(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Json(input): Json<CheckoutInput>,
) -> Result<(StatusCode, Json<Value>)> {
    // The denormalized order fields come from the token claims; no
    // separate user fetch is needed.
    let customer = Customer {
        id: current.id,
        email: current.email.clone(),
        name: current.full_name(),
        phone: String::new(),
    };

    let outcome = CheckoutService::new(state.pool())
        .process(&customer, &input)
        .await?;

    // Post-commit: create the payment at the provider. The order stands
    // even if this fails; the client can retry the payment.
    let payment_url = match state.payments().create_payment(&outcome.order).await {
        Ok(payment) => {
            OrderRepository::new(state.pool())
                .set_payment_reference(outcome.order.id, &payment.id)
                .await?;
            payment.checkout_url
        }
        Err(e) => {
            tracing::warn!(
                order_number = %outcome.order.order_number,
                error = %e,
                "payment creation failed after checkout; order kept, payment must be retried"
            );
            None
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "order placed",
            "order_number": outcome.order.order_number,
            "order": outcome.order,
            "items": outcome.items,
            "payment_url": payment_url,
        })),
    ))
}
