//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use groenmarkt_core::UserId;

/// A registered customer (or staff member).
///
/// The password hash never leaves the db/auth layers; it is skipped on
/// serialization.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Display name: "First Last", falling back to the email.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: UserId::new(1),
            email: "klant@example.nl".to_owned(),
            first_name: first.to_owned(),
            last_name: last.to_owned(),
            password_hash: "x".to_owned(),
            is_staff: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(user("Jan", "de Vries").full_name(), "Jan de Vries");
    }

    #[test]
    fn full_name_falls_back_to_email() {
        assert_eq!(user("", "").full_name(), "klant@example.nl");
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let json = serde_json::to_value(user("Jan", "de Vries")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "klant@example.nl");
    }
}
