//! Order handlers (owner-scoped unless staff).

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use groenmarkt_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::reconciliation::ReconciliationService;
use crate::state::AppState;

/// `GET /api/orders` — the caller's orders; staff see all.
pub async fn list(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<Value>> {
    let orders = OrderRepository::new(state.pool())
        .list_visible(user.id, user.is_staff)
        .await?;
    Ok(Json(json!({ "count": orders.len(), "orders": orders })))
}

/// `GET /api/orders/{id}` — one order with its snapshot items.
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>> {
    let repo = OrderRepository::new(state.pool());
    let order = repo
        .get_visible(id, user.id, user.is_staff)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;
    let items = repo.items(order.id).await?;
    Ok(Json(json!({ "order": order, "items": items })))
}

/// `POST /api/orders/{id}/cancel` — allowed from pending/confirmed only;
/// later states answer with a conflict instead of silently succeeding.
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>> {
    let order = OrderRepository::new(state.pool())
        .get_visible(id, user.id, user.is_staff)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let cancelled = ReconciliationService::new(state.pool()).cancel(&order).await?;
    Ok(Json(json!({
        "message": format!("order {} cancelled", cancelled.order_number),
        "order": cancelled,
    })))
}
