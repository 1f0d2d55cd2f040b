//! Liveness and endpoint-map handlers.

use axum::Json;
use serde_json::{Value, json};

/// `GET /api/health`
pub async fn health() -> Json<Value> {
    Json(json!({
        "message": "Groenmarkt e-commerce API",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `GET /api/status` — endpoint map for API consumers.
pub async fn status() -> Json<Value> {
    Json(json!({
        "api_status": "running",
        "endpoints": {
            "products": "/api/products",
            "posts": "/api/posts",
            "addresses": "/api/addresses",
            "address_lookup": "/api/address/lookup",
            "address_suggest": "/api/address/suggest",
            "cart": "/api/cart",
            "checkout": "/api/checkout",
            "orders": "/api/orders",
        },
    }))
}
