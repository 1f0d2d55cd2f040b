//! Checkout workflow: the atomic cart → order conversion.
//!
//! Preconditions are checked in a fixed order (cart non-empty, addresses
//! owned, payload valid), then a single transaction creates the order,
//! snapshots every cart line into an order item, recomputes the totals
//! from those snapshots and empties the cart. Nothing about payment is
//! decided here: orders leave checkout as (confirmed, pending) and only
//! the reconciliation service can mark them paid.
//!
//! Order-number races are absorbed by retrying the whole transaction
//! when the unique index on `order_number` rejects the insert.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::instrument;

use groenmarkt_core::{AddressId, OrderNumber, STANDARD_VAT_RATE};

use crate::db::RepositoryError;
use crate::db::addresses::AddressRepository;
use crate::db::carts::CartRepository;
use crate::db::orders::{NewOrder, OrderRepository, OrderTotals};
use crate::models::{Address, CartItemWithProduct, Order, OrderItem, PaymentMethod};

/// Flat Dutch shipping cost in EUR.
pub const SHIPPING_COST: Decimal = Decimal::from_parts(495, 0, 0, false, 2);

/// How often an order-number collision is retried before giving up.
const MAX_NUMBER_RETRIES: u32 = 3;

/// The iDEAL banks offered at checkout.
pub const IDEAL_BANKS: &[IdealBank] = &[
    IdealBank { code: "ING", name: "ING Bank" },
    IdealBank { code: "RABO", name: "Rabobank" },
    IdealBank { code: "ABNAMRO", name: "ABN AMRO" },
    IdealBank { code: "SNS", name: "SNS Bank" },
    IdealBank { code: "ASNB", name: "ASN Bank" },
    IdealBank { code: "BUNQ", name: "bunq" },
    IdealBank { code: "KNAB", name: "Knab" },
    IdealBank { code: "REGIOBANK", name: "RegioBank" },
];

/// An iDEAL bank selector entry.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IdealBank {
    pub code: &'static str,
    pub name: &'static str,
}

/// One failed field in the checkout payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// The submitted checkout payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutInput {
    pub shipping_address_id: AddressId,
    pub billing_address_id: AddressId,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub ideal_bank: Option<String>,
    #[serde(default)]
    pub terms_accepted: bool,
    #[serde(default)]
    pub customer_notes: String,
}

/// Errors produced by the checkout workflow, in precondition order.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// The cart does not exist or holds no items.
    #[error("cart is empty")]
    EmptyCart,

    /// An address ID does not resolve to an address owned by the caller.
    #[error("address not found")]
    AddressNotFound,

    /// The payload failed field validation; every failing field listed.
    #[error("checkout payload invalid")]
    Validation(Vec<FieldError>),

    /// The daily order-number sequence could not be reserved.
    #[error("could not allocate an order number")]
    NumberContention,

    /// Database failure inside the workflow.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of a committed checkout.
#[derive(Debug)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// The checkout caller's identity, denormalized onto the order.
#[derive(Debug, Clone)]
pub struct Customer {
    pub id: groenmarkt_core::UserId,
    pub email: String,
    pub name: String,
    pub phone: String,
}

/// Pure total computation over snapshot lines.
///
/// The subtotal sums tax-inclusive line totals; tax is
/// `subtotal * rate` (the shop's established formula), rounded to whole
/// cents; the grand total adds shipping.
#[must_use]
pub fn compute_totals(
    items: &[CartItemWithProduct],
    tax_rate: Decimal,
    shipping_cost: Decimal,
) -> OrderTotals {
    let subtotal: Decimal = items.iter().map(CartItemWithProduct::total_price).sum();
    let tax_amount = (subtotal * tax_rate).round_dp(2);
    OrderTotals {
        subtotal,
        tax_amount,
        shipping_cost,
        total_amount: subtotal + tax_amount + shipping_cost,
    }
}

/// Validate the checkout payload, collecting every failing field.
#[must_use]
pub fn validate_payload(input: &CheckoutInput) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !input.terms_accepted {
        errors.push(FieldError {
            field: "terms_accepted",
            message: "the terms must be accepted",
        });
    }
    if input.payment_method == PaymentMethod::Ideal
        && input.ideal_bank.as_deref().is_none_or(|b| b.trim().is_empty())
    {
        errors.push(FieldError {
            field: "ideal_bank",
            message: "select a bank for iDEAL payments",
        });
    }
    errors
}

/// Checkout service.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Run the checkout workflow for `customer`.
    ///
    /// # Errors
    ///
    /// Returns the first failing precondition (`EmptyCart`,
    /// `AddressNotFound`, `Validation`), `NumberContention` when the
    /// order-number retry budget is exhausted, or `Repository` for
    /// database failures. Any error inside the transaction rolls the
    /// whole conversion back.
    #[instrument(skip(self, customer, input), fields(user_id = %customer.id))]
    pub async fn process(
        &self,
        customer: &Customer,
        input: &CheckoutInput,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // Precondition 1: a cart with items.
        let carts = CartRepository::new(self.pool);
        let cart = carts
            .get_for_user(customer.id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        // Precondition 2: both addresses resolve and are owned.
        let addresses = AddressRepository::new(self.pool);
        let shipping = addresses
            .get_owned(input.shipping_address_id, customer.id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;
        let billing = addresses
            .get_owned(input.billing_address_id, customer.id)
            .await?
            .ok_or(CheckoutError::AddressNotFound)?;

        // Precondition 3: payload validation, all failures at once.
        let field_errors = validate_payload(input);
        if !field_errors.is_empty() {
            return Err(CheckoutError::Validation(field_errors));
        }

        for attempt in 1..=MAX_NUMBER_RETRIES {
            match self
                .try_convert(customer, input, cart.id, &shipping, &billing)
                .await
            {
                Err(CheckoutError::Repository(e)) if e.is_conflict() => {
                    tracing::warn!(attempt, "order number collision, retrying checkout");
                }
                other => return other,
            }
        }
        Err(CheckoutError::NumberContention)
    }

    /// One attempt at the atomic conversion. A `Conflict` return means
    /// the order number lost a race and the caller should retry.
    async fn try_convert(
        &self,
        customer: &Customer,
        input: &CheckoutInput,
        cart_id: groenmarkt_core::CartId,
        shipping: &Address,
        billing: &Address,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        // Row lock: a second concurrent checkout of this cart blocks
        // here and then sees an empty cart.
        CartRepository::lock_in_tx(&mut tx, cart_id)
            .await?
            .ok_or(CheckoutError::EmptyCart)?;

        let lines = CartRepository::items_in_tx(&mut tx, cart_id).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let today = Utc::now().date_naive();
        let highest = OrderRepository::highest_number_for_day(
            &mut tx,
            &OrderNumber::day_prefix(today),
        )
        .await?
        .and_then(|n| n.parse::<OrderNumber>().ok());
        let order_number = OrderNumber::next(today, highest.as_ref());

        let order = OrderRepository::insert_in_tx(
            &mut tx,
            &NewOrder {
                order_number: &order_number,
                user_id: customer.id,
                customer_email: &customer.email,
                customer_name: &customer.name,
                customer_phone: &customer.phone,
                shipping_address_id: shipping.id,
                billing_address_id: billing.id,
                shipping_address_text: &shipping.formatted(),
                billing_address_text: &billing.formatted(),
                tax_rate: STANDARD_VAT_RATE,
                shipping_cost: SHIPPING_COST,
                payment_method: input.payment_method,
                ideal_bank: input.ideal_bank.as_deref().unwrap_or(""),
                customer_notes: &input.customer_notes,
            },
        )
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            items.push(OrderRepository::insert_item_in_tx(&mut tx, order.id, line).await?);
        }

        let totals = compute_totals(&lines, STANDARD_VAT_RATE, SHIPPING_COST);
        let order = OrderRepository::apply_totals_in_tx(&mut tx, order.id, &totals).await?;

        CartRepository::clear_in_tx(&mut tx, cart_id).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            order_number = %order.order_number,
            total = %order.total_amount,
            "checkout completed"
        );
        Ok(CheckoutOutcome { order, items })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use groenmarkt_core::{CartId, CartItemId, ProductId};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(id: i32, price: &str, quantity: i32) -> CartItemWithProduct {
        CartItemWithProduct {
            id: CartItemId::new(id),
            cart_id: CartId::new(1),
            product_id: ProductId::new(id),
            quantity,
            product_name: format!("product {id}"),
            product_sku: format!("GM-WEL-{id:08}"),
            unit_price: dec(price),
        }
    }

    #[test]
    fn worked_example_from_the_shop_floor() {
        // 2 x 10.00 + 1 x 5.00 at 21% with 4.95 shipping
        let lines = vec![line(1, "10.00", 2), line(2, "5.00", 1)];
        let totals = compute_totals(&lines, STANDARD_VAT_RATE, SHIPPING_COST);
        assert_eq!(totals.subtotal, dec("25.00"));
        assert_eq!(totals.tax_amount, dec("5.25"));
        assert_eq!(totals.shipping_cost, dec("4.95"));
        assert_eq!(totals.total_amount, dec("35.20"));
    }

    #[test]
    fn totals_satisfy_the_invariants() {
        let lines = vec![line(1, "12.34", 3), line(2, "0.99", 7), line(3, "5.00", 1)];
        let totals = compute_totals(&lines, STANDARD_VAT_RATE, SHIPPING_COST);
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount + totals.shipping_cost
        );
        assert_eq!(totals.tax_amount, (totals.subtotal * dec("0.21")).round_dp(2));
    }

    #[test]
    fn empty_line_list_totals_to_shipping_only() {
        let totals = compute_totals(&[], STANDARD_VAT_RATE, SHIPPING_COST);
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax_amount, Decimal::ZERO);
        assert_eq!(totals.total_amount, SHIPPING_COST);
    }

    fn input(terms: bool, method: PaymentMethod, bank: Option<&str>) -> CheckoutInput {
        CheckoutInput {
            shipping_address_id: AddressId::new(1),
            billing_address_id: AddressId::new(2),
            payment_method: method,
            ideal_bank: bank.map(str::to_owned),
            terms_accepted: terms,
            customer_notes: String::new(),
        }
    }

    #[test]
    fn valid_payload_passes() {
        assert!(validate_payload(&input(true, PaymentMethod::Ideal, Some("ING"))).is_empty());
        assert!(validate_payload(&input(true, PaymentMethod::Paypal, None)).is_empty());
    }

    #[test]
    fn all_failing_fields_are_reported_together() {
        let errors = validate_payload(&input(false, PaymentMethod::Ideal, None));
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["terms_accepted", "ideal_bank"]);
    }

    #[test]
    fn blank_bank_selector_counts_as_missing() {
        let errors = validate_payload(&input(true, PaymentMethod::Ideal, Some("   ")));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.field), Some("ideal_bank"));
    }

    #[test]
    fn non_ideal_methods_need_no_bank() {
        assert!(validate_payload(&input(true, PaymentMethod::Creditcard, None)).is_empty());
    }
}
