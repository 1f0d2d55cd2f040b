//! Assistant HTTP surface.
//!
//! `GET /tools` lists the tool definitions; `POST /invoke` runs one and
//! returns its text output.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::error::ToolError;
use crate::tools::{ToolExecutor, all_tools};

/// Build the assistant router.
#[must_use]
pub fn router(pool: SqlitePool) -> Router {
    Router::new()
        .route("/tools", get(list_tools))
        .route("/invoke", post(invoke))
        .with_state(pool)
}

/// `GET /tools`
async fn list_tools() -> Json<Value> {
    let tools = all_tools();
    Json(json!({ "count": tools.len(), "tools": tools }))
}

/// Invocation request.
#[derive(Debug, Deserialize)]
struct InvokeRequest {
    name: String,
    #[serde(default)]
    input: Value,
}

/// `POST /invoke` — run a tool, answer with its text.
async fn invoke(
    State(pool): State<SqlitePool>,
    Json(request): Json<InvokeRequest>,
) -> Result<Json<Value>, ToolError> {
    let text = ToolExecutor::new(&pool)
        .execute(&request.name, &request.input)
        .await?;
    Ok(Json(json!({ "content": text })))
}
