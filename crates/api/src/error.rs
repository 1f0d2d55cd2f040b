//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-side errors
//! to Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; clients get JSON bodies and never see internal
//! detail.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::address_lookup::LookupError;
use crate::services::auth::AuthError;
use crate::services::checkout::{CheckoutError, FieldError};
use crate::services::payments::PaymentError;
use crate::services::reconciliation::ReconcileError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout workflow failed.
    #[error("checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Reconciliation failed.
    #[error("reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Address lookup failed.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Payment provider failed.
    #[error("payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Request field validation failed.
    #[error("validation failed")]
    Validation(Vec<FieldError>),

    /// Resource not found (or not owned by the caller).
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials
                | AuthError::InvalidRefreshToken
                | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
                AuthError::UserAlreadyExists => StatusCode::CONFLICT,
                AuthError::MissingField(_)
                | AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::PasswordMismatch => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash(_) | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart | CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
                CheckoutError::AddressNotFound => StatusCode::NOT_FOUND,
                CheckoutError::NumberContention | CheckoutError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Reconcile(err) => match err {
                ReconcileError::UnknownPayment(_) => StatusCode::NOT_FOUND,
                ReconcileError::InvalidTransition { .. } => StatusCode::CONFLICT,
                ReconcileError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Lookup(err) => match err {
                LookupError::InvalidPostcode(_) | LookupError::MissingHouseNumber => {
                    StatusCode::BAD_REQUEST
                }
                LookupError::NotFound => StatusCode::NOT_FOUND,
                LookupError::Timeout | LookupError::Network(_) | LookupError::ServiceError(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            },
            Self::Payment(err) => match err {
                PaymentError::Timeout | PaymentError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
                PaymentError::Api { .. } | PaymentError::Malformed(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Client-facing message; internal detail stays server-side.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal server error".to_owned(),
            Self::Auth(err) => match err {
                AuthError::PasswordHash(_) | AuthError::Repository(_) => {
                    "internal server error".to_owned()
                }
                other => other.to_string(),
            },
            Self::Checkout(err) => match err {
                CheckoutError::NumberContention | CheckoutError::Repository(_) => {
                    "internal server error".to_owned()
                }
                other => other.to_string(),
            },
            Self::Reconcile(ReconcileError::Repository(_)) => "internal server error".to_owned(),
            Self::Lookup(err) => match err {
                LookupError::Timeout => "address service timed out, try again".to_owned(),
                LookupError::Network(_) => "address service unreachable, try again".to_owned(),
                LookupError::ServiceError(_) => {
                    "address service temporarily unavailable".to_owned()
                }
                other => other.to_string(),
            },
            Self::Payment(_) => "payment service temporarily unavailable".to_owned(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry.
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        // Validation errors carry the full field list.
        let body = match &self {
            Self::Validation(fields) | Self::Checkout(CheckoutError::Validation(fields)) => {
                json!({ "errors": fields })
            }
            _ => json!({ "error": self.public_message() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(status_of(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::Unauthorized("x".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::BadRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::Internal("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        assert_eq!(
            status_of(AppError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn lookup_failures_are_service_unavailable() {
        assert_eq!(
            status_of(AppError::Lookup(LookupError::Timeout)),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(AppError::Lookup(LookupError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn invalid_cancellation_is_a_conflict() {
        use crate::models::OrderStatus;
        assert_eq!(
            status_of(AppError::Reconcile(ReconcileError::InvalidTransition {
                action: "cancel",
                from: OrderStatus::Shipped,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn checkout_validation_lists_every_field() {
        let err = AppError::Checkout(CheckoutError::Validation(vec![
            FieldError {
                field: "terms_accepted",
                message: "the terms must be accepted",
            },
            FieldError {
                field: "ideal_bank",
                message: "select a bank for iDEAL payments",
            },
        ]));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = AppError::Internal("connection string postgres://user:pw@host".into());
        assert_eq!(err.public_message(), "internal server error");
    }
}
