//! Cart handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use groenmarkt_core::{CartItemId, ProductId};

use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::CartItemWithProduct;
use crate::state::AppState;

/// Cart display data: lines plus running totals.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total_items: i64,
    pub subtotal: Decimal,
}

/// One cart line with its line total.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    #[serde(flatten)]
    pub line: CartItemWithProduct,
    pub total_price: Decimal,
}

impl CartView {
    /// Assemble the view from joined cart lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartItemWithProduct>) -> Self {
        let total_items = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal = lines.iter().map(CartItemWithProduct::total_price).sum();
        Self {
            items: lines
                .into_iter()
                .map(|line| CartLineView {
                    total_price: line.total_price(),
                    line,
                })
                .collect(),
            total_items,
            subtotal,
        }
    }
}

/// `GET /api/cart` — the caller's cart, created on first use.
pub async fn show(State(state): State<AppState>, RequireAuth(user): RequireAuth) -> Result<Json<CartView>> {
    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(user.id).await?;
    let lines = carts.items(cart.id).await?;
    Ok(Json(CartView::from_lines(lines)))
}

/// Add-item payload.
#[derive(Debug, Deserialize)]
pub struct AddItemPayload {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// `POST /api/cart/items` — add a product; an existing line has its
/// quantity incremented instead.
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<Value>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_owned()));
    }

    let product = ProductRepository::new(state.pool())
        .get_active(payload.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", payload.product_id)))?;

    let carts = CartRepository::new(state.pool());
    let cart = carts.get_or_create(user.id).await?;
    carts.add_item(cart.id, product.id, payload.quantity).await?;
    let lines = carts.items(cart.id).await?;

    Ok(Json(json!({
        "message": format!("{} added to cart", product.name),
        "cart": CartView::from_lines(lines),
    })))
}

/// Quantity update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateItemPayload {
    pub quantity: i32,
}

/// `PUT /api/cart/items/{id}` — set the quantity; zero removes the line.
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
    Json(payload): Json<UpdateItemPayload>,
) -> Result<Json<Value>> {
    let carts = CartRepository::new(state.pool());
    let updated = carts
        .set_item_quantity(id, user.id, payload.quantity)
        .await?;

    Ok(Json(match updated {
        Some(item) => json!({ "message": "quantity updated", "quantity": item.quantity }),
        None => json!({ "message": "item removed from cart" }),
    }))
}

/// `DELETE /api/cart/items/{id}`
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<Value>> {
    CartRepository::new(state.pool()).remove_item(id, user.id).await?;
    Ok(Json(json!({ "message": "item removed from cart" })))
}
