//! Authentication extractor.
//!
//! Bearer-token (JWT) authentication: handlers that need a caller take
//! `RequireAuth` in their signature and get the decoded token claims as
//! a `CurrentUser`.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use groenmarkt_core::UserId;

use crate::error::AppError;
use crate::services::auth::decode_access_token;
use crate::state::AppState;

/// The authenticated caller, decoded from the access token. No database
/// round-trip: the token is the source of truth for its lifetime.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
}

impl CurrentUser {
    /// Display name used for denormalized order fields.
    #[must_use]
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_owned()
        }
    }
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let claims = decode_access_token(token, &state.config().jwt_secret)
            .map_err(|_| AppError::Unauthorized("invalid or expired token".to_owned()))?;

        Ok(Self(CurrentUser {
            id: UserId::new(claims.sub),
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            is_staff: claims.is_staff,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_falls_back_to_email() {
        let user = CurrentUser {
            id: UserId::new(1),
            email: "klant@example.nl".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
        };
        assert_eq!(user.full_name(), "klant@example.nl");
    }
}
