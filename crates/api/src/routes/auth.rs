//! Registration and token handlers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::auth::{AuthService, RegistrationInput};
use crate::state::AppState;

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegistrationInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let service = AuthService::new(state.pool(), &state.config().jwt_secret);
    let (user, tokens) = service.register(&input).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "account created",
            "user": user,
            "tokens": tokens,
        })),
    ))
}

/// Login credentials.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/token` — JWT issuance.
pub async fn token(
    State(state): State<AppState>,
    Json(input): Json<TokenRequest>,
) -> Result<Json<Value>> {
    let service = AuthService::new(state.pool(), &state.config().jwt_secret);
    let (user, tokens) = service.login(&input.email, &input.password).await?;

    Ok(Json(json!({
        "user": user,
        "tokens": tokens,
    })))
}

/// Refresh-token payload.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// `POST /api/auth/refresh` — rotate the refresh token, issue a fresh
/// pair.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> Result<Json<Value>> {
    let service = AuthService::new(state.pool(), &state.config().jwt_secret);
    let (user, tokens) = service.refresh(&input.refresh).await?;

    Ok(Json(json!({
        "user": user,
        "tokens": tokens,
    })))
}

/// `POST /api/auth/logout` — revoke every live refresh token of the
/// caller. Access tokens simply expire.
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let service = AuthService::new(state.pool(), &state.config().jwt_secret);
    service.logout_everywhere(user.id).await?;
    Ok(Json(json!({ "message": "logged out" })))
}
