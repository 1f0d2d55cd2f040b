//! Shared builders for the behavioral tests.
//!
//! These tests exercise the domain rules (totals, order numbers, the
//! reconciliation state machine) without requiring live services.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::Utc;
use rust_decimal::Decimal;

use groenmarkt_api::models::{
    CartItemWithProduct, Order, OrderStatus, PaymentMethod, PaymentStatus,
};
use groenmarkt_core::{CartId, CartItemId, OrderId, ProductId, UserId};

/// Parse a decimal literal for test assertions.
///
/// # Panics
///
/// Panics on malformed input; tests only.
#[must_use]
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

/// Build a cart line with the given unit price and quantity.
#[must_use]
pub fn cart_line(id: i32, unit_price: &str, quantity: i32) -> CartItemWithProduct {
    CartItemWithProduct {
        id: CartItemId::new(id),
        cart_id: CartId::new(1),
        product_id: ProductId::new(id),
        quantity,
        product_name: format!("product {id}"),
        product_sku: format!("GM-WEL-{id:08}"),
        unit_price: dec(unit_price),
    }
}

/// Build an order in the given state for reconciliation tests.
#[must_use]
pub fn order_in_state(status: OrderStatus, payment_status: PaymentStatus) -> Order {
    Order {
        id: OrderId::new(1),
        order_number: "GM202608070001".to_owned(),
        user_id: UserId::new(1),
        customer_email: "klant@example.nl".to_owned(),
        customer_name: "Jan de Vries".to_owned(),
        customer_phone: String::new(),
        status,
        payment_status,
        shipping_address_id: None,
        billing_address_id: None,
        shipping_address_text: String::new(),
        billing_address_text: String::new(),
        subtotal: dec("25.00"),
        tax_rate: dec("0.21"),
        tax_amount: dec("5.25"),
        shipping_cost: dec("4.95"),
        total_amount: dec("35.20"),
        payment_method: PaymentMethod::Ideal,
        ideal_bank: "ING".to_owned(),
        payment_reference: "tr_test".to_owned(),
        tracking_number: String::new(),
        customer_notes: String::new(),
        confirmation_sent_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        shipped_at: None,
        delivered_at: None,
    }
}
