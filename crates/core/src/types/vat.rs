//! Dutch VAT (BTW) arithmetic.
//!
//! Prices in the catalog are stored tax-inclusive; the tax-exclusive
//! price is always derived, never stored. Order tax follows the shop's
//! established formula: `tax = subtotal * rate` over the tax-inclusive
//! subtotal, with the rate frozen on the order at creation time.

use rust_decimal::Decimal;

/// The standard Dutch VAT rate (21%).
pub const STANDARD_VAT_RATE: Decimal = Decimal::from_parts(21, 0, 0, false, 2);

/// Derive the tax-exclusive price from a tax-inclusive one.
///
/// Returns `None` for a zero price, matching the catalog's "no
/// administrative price" convention. Rounded to whole cents, banker's
/// rounding.
#[must_use]
pub fn price_excl_vat(price_incl: Decimal, rate: Decimal) -> Option<Decimal> {
    if price_incl.is_zero() {
        return None;
    }
    let divisor = Decimal::ONE + rate;
    Some((price_incl / divisor).round_dp(2))
}

/// The VAT portion of a tax-inclusive price, rounded to whole cents.
#[must_use]
pub fn vat_amount(price_incl: Decimal, rate: Decimal) -> Option<Decimal> {
    price_excl_vat(price_incl, rate).map(|excl| price_incl - excl)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn standard_rate_is_21_percent() {
        assert_eq!(STANDARD_VAT_RATE, dec("0.21"));
    }

    #[test]
    fn derives_exclusive_price_from_inclusive() {
        // 121.00 incl 21% -> 100.00 excl
        assert_eq!(
            price_excl_vat(dec("121.00"), STANDARD_VAT_RATE),
            Some(dec("100.00"))
        );
    }

    #[test]
    fn vat_amount_is_the_difference() {
        assert_eq!(
            vat_amount(dec("121.00"), STANDARD_VAT_RATE),
            Some(dec("21.00"))
        );
        // 10.00 incl -> 8.26 excl -> 1.74 VAT
        assert_eq!(vat_amount(dec("10.00"), STANDARD_VAT_RATE), Some(dec("1.74")));
    }

    #[test]
    fn zero_price_has_no_administrative_price() {
        assert_eq!(price_excl_vat(Decimal::ZERO, STANDARD_VAT_RATE), None);
        assert_eq!(vat_amount(Decimal::ZERO, STANDARD_VAT_RATE), None);
    }
}
