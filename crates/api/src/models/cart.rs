//! Shopping cart models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use groenmarkt_core::{CartId, CartItemId, ProductId, UserId};

/// A user's cart (1:1 with the user, created lazily).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line. At most one per (cart, product); adding the same product
/// again increments `quantity`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with the live product fields needed for display
/// and checkout.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CartItemWithProduct {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub product_name: String,
    pub product_sku: String,
    pub unit_price: Decimal,
}

impl CartItemWithProduct {
    /// Line total at the product's current price.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_is_price_times_quantity() {
        let item = CartItemWithProduct {
            id: CartItemId::new(1),
            cart_id: CartId::new(1),
            product_id: ProductId::new(1),
            quantity: 3,
            product_name: "Bijenwas".to_owned(),
            product_sku: "GM-WEL-AAAAAAAA".to_owned(),
            unit_price: "4.50".parse().unwrap(),
        };
        assert_eq!(item.total_price(), "13.50".parse::<Decimal>().unwrap());
    }
}
