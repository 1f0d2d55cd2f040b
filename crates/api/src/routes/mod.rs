//! Route handlers and router assembly.
//!
//! One module per resource; handlers stay thin and delegate to the
//! services. Authentication is declared per handler via the
//! `RequireAuth` extractor, rate limiting per group via the governor
//! layers.

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod posts;
pub mod products;
pub mod webhooks;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{anon_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Build the full API router.
#[must_use]
pub fn router(state: AppState) -> Router {
    // Anonymous read-only endpoints: separate, relaxed rate budget.
    let public = Router::new()
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::detail))
        .route("/address/lookup", get(addresses::lookup))
        .route("/address/suggest", get(addresses::suggest))
        .layer(anon_rate_limiter());

    // Credential endpoints: strict rate budget.
    let credentials = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/token", post(auth::token))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout", post(auth::logout))
        .layer(auth_rate_limiter());

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/status", get(health::status))
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::detail).put(posts::update).delete(posts::delete),
        )
        .route(
            "/posts/{id}/comments",
            get(posts::list_comments).post(posts::add_comment),
        )
        .route("/comments/{id}", axum::routing::delete(posts::delete_comment))
        .route("/addresses", get(addresses::list).post(addresses::create))
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
        .route("/cart", get(cart::show))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/checkout", get(checkout::init).post(checkout::process))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::detail))
        .route("/orders/{id}/cancel", post(orders::cancel))
        .route("/webhooks/payment", post(webhooks::payment));

    Router::new()
        .nest("/api", app.merge(public).merge(credentials))
        .layer(TraceLayer::new_for_http())
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
        .with_state(state)
}
