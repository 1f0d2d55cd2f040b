//! Customer addresses (Dutch postal fields).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use groenmarkt_core::{AddressId, UserId};

/// Whether an address is used for shipping or billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AddressType {
    Shipping,
    Billing,
}

/// A customer address. Postal codes are stored canonical (`"1234 AB"`).
///
/// Per user, at most one address carries `is_default_shipping` and at
/// most one carries `is_default_billing`; the repository clears the
/// competing flags in the same transaction as any write that sets one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub address_type: AddressType,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub street: String,
    pub house_number: String,
    pub house_number_addition: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// Multi-line Dutch address block for order snapshots and display.
    #[must_use]
    pub fn formatted(&self) -> String {
        let mut lines = Vec::with_capacity(4);

        let name = format!("{} {}", self.first_name, self.last_name);
        if self.company.is_empty() {
            lines.push(name);
        } else {
            lines.push(self.company.clone());
            lines.push(name);
        }

        let mut street = format!("{} {}", self.street, self.house_number);
        if !self.house_number_addition.is_empty() {
            street.push(' ');
            street.push_str(&self.house_number_addition);
        }
        lines.push(street);

        lines.push(format!("{} {}", self.postal_code, self.city));

        if !self.country.eq_ignore_ascii_case("nederland") {
            lines.push(self.country.clone());
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            id: AddressId::new(1),
            user_id: UserId::new(1),
            address_type: AddressType::Shipping,
            first_name: "Jan".to_owned(),
            last_name: "de Vries".to_owned(),
            company: String::new(),
            street: "Keizersgracht".to_owned(),
            house_number: "12".to_owned(),
            house_number_addition: "B".to_owned(),
            postal_code: "1015 CR".to_owned(),
            city: "Amsterdam".to_owned(),
            province: "Noord-Holland".to_owned(),
            country: "Nederland".to_owned(),
            is_default_shipping: true,
            is_default_billing: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn formats_a_dutch_address_block() {
        assert_eq!(
            address().formatted(),
            "Jan de Vries\nKeizersgracht 12 B\n1015 CR Amsterdam"
        );
    }

    #[test]
    fn company_gets_its_own_line() {
        let mut a = address();
        a.company = "Groenmarkt BV".to_owned();
        assert!(a.formatted().starts_with("Groenmarkt BV\nJan de Vries\n"));
    }

    #[test]
    fn foreign_country_is_appended() {
        let mut a = address();
        a.country = "België".to_owned();
        assert!(a.formatted().ends_with("\nBelgië"));
    }
}
