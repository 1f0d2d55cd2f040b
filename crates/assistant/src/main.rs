//! Groenmarkt Assistant - tool server binary.
//!
//! Serves the portfolio tools on port 8100 (override with
//! `ASSISTANT_HOST` / `ASSISTANT_PORT`). The database defaults to a
//! local `SQLite` file (`ASSISTANT_DATABASE_URL`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use groenmarkt_assistant::{db, routes};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "groenmarkt_assistant=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let database_url = std::env::var("ASSISTANT_DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://portfolio.db?mode=rwc".to_owned());
    let host = std::env::var("ASSISTANT_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let port = std::env::var("ASSISTANT_PORT").unwrap_or_else(|_| "8100".to_owned());

    let pool = db::create_pool(&database_url)
        .await
        .expect("failed to open assistant database");
    tracing::info!(%database_url, "assistant database ready");

    let app = routes::router(pool);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(%addr, "groenmarkt-assistant listening");

    axum::serve(listener, app).await.expect("server error");
}
