//! User and refresh-token repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use groenmarkt_core::{Email, UserId};

use super::RepositoryError;
use crate::models::User;

/// Repository for user accounts and their refresh tokens.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name, password_hash, is_staff,
                    created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, first_name, last_name, password_hash, is_staff,
                    created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists,
    /// `RepositoryError::Database` for other failures.
    pub async fn create(
        &self,
        email: &Email,
        first_name: &str,
        last_name: &str,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (email, first_name, last_name, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING id, email, first_name, last_name, password_hash, is_staff,
                       created_at, updated_at",
        )
        .bind(email.as_str())
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "email already exists"))
    }

    /// Whether an email is already registered. Checked before any write
    /// so registration can fail early with a clear message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn email_exists(&self, email: &Email) -> Result<bool, RepositoryError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email.as_str())
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    // =========================================================================
    // Refresh tokens
    // =========================================================================

    /// Store a refresh-token digest for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_refresh_token(
        &self,
        user_id: UserId,
        token_digest: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (user_id, token_digest, expires_at)
             VALUES ($1, $2, $3)",
        )
        .bind(user_id)
        .bind(token_digest)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Atomically consume a refresh token: mark it revoked and return its
    /// owner, but only if it was live and unexpired. Returns `None` for
    /// unknown, revoked or expired tokens.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn consume_refresh_token(
        &self,
        token_digest: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(UserId,)> = sqlx::query_as(
            "UPDATE refresh_tokens
             SET revoked = TRUE
             WHERE token_digest = $1 AND NOT revoked AND expires_at > now()
             RETURNING user_id",
        )
        .bind(token_digest)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Revoke all live refresh tokens of a user (logout-everywhere).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn revoke_refresh_tokens(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
