//! Checkout total and validation properties.

use groenmarkt_api::models::{CartItemWithProduct, PaymentMethod};
use groenmarkt_api::services::checkout::{
    CheckoutInput, SHIPPING_COST, compute_totals, validate_payload,
};
use groenmarkt_core::{AddressId, STANDARD_VAT_RATE};
use groenmarkt_integration_tests::{cart_line, dec};

#[test]
fn worked_example_matches_the_spec_sheet() {
    // 2 x 10.00 + 1 x 5.00, 21% VAT, 4.95 shipping
    let lines = vec![cart_line(1, "10.00", 2), cart_line(2, "5.00", 1)];
    let totals = compute_totals(&lines, STANDARD_VAT_RATE, SHIPPING_COST);

    assert_eq!(totals.subtotal, dec("25.00"));
    assert_eq!(totals.tax_amount, dec("5.25"));
    assert_eq!(totals.total_amount, dec("35.20"));
}

#[test]
fn subtotal_always_equals_the_sum_of_line_totals() {
    let carts: Vec<Vec<CartItemWithProduct>> = vec![
        vec![cart_line(1, "0.01", 1)],
        vec![cart_line(1, "9.99", 3), cart_line(2, "1.25", 8)],
        (1..=20).map(|i| cart_line(i, "2.50", i)).collect(),
    ];

    for lines in carts {
        let totals = compute_totals(&lines, STANDARD_VAT_RATE, SHIPPING_COST);
        let expected: rust_decimal::Decimal =
            lines.iter().map(CartItemWithProduct::total_price).sum();
        assert_eq!(totals.subtotal, expected);
        assert_eq!(
            totals.total_amount,
            totals.subtotal + totals.tax_amount + totals.shipping_cost
        );
        assert_eq!(
            totals.tax_amount,
            (totals.subtotal * STANDARD_VAT_RATE).round_dp(2)
        );
    }
}

#[test]
fn tax_rate_is_taken_from_the_argument_not_a_global() {
    // A historical order recomputed at its frozen 19% rate must not see
    // today's 21%.
    let lines = vec![cart_line(1, "100.00", 1)];
    let totals = compute_totals(&lines, dec("0.19"), SHIPPING_COST);
    assert_eq!(totals.tax_amount, dec("19.00"));
}

fn payload(terms: bool, method: PaymentMethod, bank: Option<&str>) -> CheckoutInput {
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
fn validation_lists_every_failing_field_at_once() {
    let errors = validate_payload(&payload(false, PaymentMethod::Ideal, None));
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.field == "terms_accepted"));
    assert!(errors.iter().any(|e| e.field == "ideal_bank"));
}

#[test]
fn ideal_without_bank_fails_but_paypal_does_not() {
    assert!(!validate_payload(&payload(true, PaymentMethod::Ideal, None)).is_empty());
    assert!(validate_payload(&payload(true, PaymentMethod::Paypal, None)).is_empty());
    assert!(validate_payload(&payload(true, PaymentMethod::Ideal, Some("RABO"))).is_empty());
}
