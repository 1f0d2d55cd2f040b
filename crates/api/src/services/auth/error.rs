//! Authentication error types.

use thiserror::Error;

use groenmarkt_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required registration field is missing or empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The email address is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password does not meet requirements.
    #[error("{0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The email is already registered.
    #[error("email already registered")]
    UserAlreadyExists,

    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The refresh token is unknown, revoked or expired.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Password hashing failed.
    #[error("password hash error: {0}")]
    PasswordHash(String),

    /// JWT encoding/decoding failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// Database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
