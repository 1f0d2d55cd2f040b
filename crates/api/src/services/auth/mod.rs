//! Authentication service.
//!
//! Password registration/login with argon2 hashing, short-lived JWT
//! access tokens and opaque rotating refresh tokens (stored as SHA-256
//! digests, revoked on every use).

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use groenmarkt_core::{Email, UserId};

use crate::db::users::UserRepository;
use crate::models::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Access token lifetime.
const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

/// Refresh token lifetime.
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// JWT claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: i32,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
}

/// An access/refresh token pair as returned to the client.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Raw registration input; validated field by field, first failure wins
/// (matching the registration endpoint's contract).
#[derive(Debug, Deserialize)]
pub struct RegistrationInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub password_confirm: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    jwt_secret: &'a SecretString,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, jwt_secret: &'a SecretString) -> Self {
        Self {
            users: UserRepository::new(pool),
            jwt_secret,
        }
    }

    // =========================================================================
    // Registration and login
    // =========================================================================

    /// Register a new user and issue their first token pair.
    ///
    /// # Errors
    ///
    /// Returns a validation variant for bad input and
    /// `AuthError::UserAlreadyExists` for a duplicate email; the
    /// duplicate check runs before any write.
    pub async fn register(&self, input: &RegistrationInput) -> Result<(User, TokenPair), AuthError> {
        for (value, field) in [
            (&input.email, "email"),
            (&input.first_name, "first_name"),
            (&input.last_name, "last_name"),
            (&input.password, "password"),
            (&input.password_confirm, "password_confirm"),
        ] {
            if value.trim().is_empty() {
                return Err(AuthError::MissingField(field));
            }
        }

        let email = Email::parse(&input.email)?;

        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(&input.password)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .users
            .create(&email, &input.first_name, &input.last_name, &password_hash)
            .await
            .map_err(|e| {
                if e.is_conflict() {
                    AuthError::UserAlreadyExists
                } else {
                    AuthError::Repository(e)
                }
            })?;

        let tokens = self.issue_tokens(&user).await?;
        tracing::info!(user_id = %user.id, "new user registered");
        Ok((user, tokens))
    }

    /// Login with email and password, issuing a fresh token pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` when the email is unknown
    /// or the password wrong; the two cases are indistinguishable to the
    /// caller.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, TokenPair), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &user.password_hash)?;

        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    /// Redeem a refresh token: revoke it and issue a new pair (rotation).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidRefreshToken` for unknown, revoked or
    /// expired tokens.
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, TokenPair), AuthError> {
        let digest = digest_token(refresh_token);
        let user_id = self
            .users
            .consume_refresh_token(&digest)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let tokens = self.issue_tokens(&user).await?;
        Ok((user, tokens))
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Issue an access/refresh pair for a user.
    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AuthError> {
        let access = self.encode_access_token(user)?;

        let refresh = generate_opaque_token();
        let expires_at = Utc::now() + Duration::days(REFRESH_TOKEN_TTL_DAYS);
        self.users
            .insert_refresh_token(user.id, &digest_token(&refresh), expires_at)
            .await?;

        Ok(TokenPair { access, refresh })
    }

    fn encode_access_token(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.as_i32(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
            iat: now.timestamp(),
        };
        let key = EncodingKey::from_secret(self.jwt_secret.expose_secret().as_bytes());
        Ok(jsonwebtoken::encode(&Header::default(), &claims, &key)?)
    }

    /// Revoke every live refresh token of a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the update fails.
    pub async fn logout_everywhere(&self, user_id: UserId) -> Result<(), AuthError> {
        self.users.revoke_refresh_tokens(user_id).await?;
        Ok(())
    }
}

/// Decode and validate an access token's claims.
///
/// # Errors
///
/// Returns `AuthError::Token` for malformed, mis-signed or expired
/// tokens.
pub fn decode_access_token(token: &str, jwt_secret: &SecretString) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(jwt_secret.expose_secret().as_bytes());
    let data = jsonwebtoken::decode::<Claims>(token, &key, &Validation::default())?;
    Ok(data.claims)
}

/// Validate password strength.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2id and a fresh salt.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a stored argon2 hash.
fn verify_password(password: &str, stored_hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// 256 bits of randomness, hex-encoded. Only the digest is stored.
fn generate_opaque_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest of a token, hex-encoded, as stored in the database.
fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_roundtrip() {
        let hash = hash_password("wachtwoord123").unwrap();
        assert!(verify_password("wachtwoord123", &hash).is_ok());
        assert!(matches!(
            verify_password("verkeerd", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(matches!(
            validate_password("kort"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("langgenoeg").is_ok());
    }

    #[test]
    fn opaque_tokens_are_unique_and_digested() {
        let a = generate_opaque_token();
        let b = generate_opaque_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        // digest is deterministic and differs from the token
        assert_eq!(digest_token(&a), digest_token(&a));
        assert_ne!(digest_token(&a), a);
    }

    #[test]
    fn access_tokens_roundtrip_through_the_secret() {
        let secret = SecretString::from("een-geheim-van-voldoende-lengte!");
        let user = User {
            id: UserId::new(7),
            email: "klant@example.nl".to_owned(),
            first_name: "Jan".to_owned(),
            last_name: "de Vries".to_owned(),
            password_hash: String::new(),
            is_staff: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        // Encode via a service that never touches the pool.
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.as_i32(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            exp: (now + Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)).timestamp(),
            iat: now.timestamp(),
        };
        let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
        let token = jsonwebtoken::encode(&Header::default(), &claims, &key).unwrap();

        let decoded = decode_access_token(&token, &secret).unwrap();
        assert_eq!(decoded.sub, 7);
        assert_eq!(decoded.email, "klant@example.nl");
        assert!(decoded.is_staff);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let secret = SecretString::from("een-geheim-van-voldoende-lengte!");
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            sub: 1,
            email: "klant@example.nl".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            exp: past.timestamp(),
            iat: past.timestamp(),
        };
        let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
        let token = jsonwebtoken::encode(&Header::default(), &claims, &key).unwrap();

        assert!(matches!(
            decode_access_token(&token, &secret),
            Err(AuthError::Token(_))
        ));
    }
}
