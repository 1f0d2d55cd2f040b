//! Product catalog model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use groenmarkt_core::{ProductId, STANDARD_VAT_RATE, price_excl_vat, vat_amount};

/// Catalog categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProductCategory {
    Honey,
    Manuka,
    Cupping,
    Supplements,
    Vitamins,
    Herbs,
    Oils,
    Massage,
    Wellness,
    Books,
    Equipment,
}

impl ProductCategory {
    /// Three-letter tag used as the middle segment of generated SKUs.
    #[must_use]
    pub const fn sku_tag(self) -> &'static str {
        match self {
            Self::Honey => "HON",
            Self::Manuka => "MAN",
            Self::Cupping => "CUP",
            Self::Supplements => "SUP",
            Self::Vitamins => "VIT",
            Self::Herbs => "HER",
            Self::Oils => "OIL",
            Self::Massage => "MAS",
            Self::Wellness => "WEL",
            Self::Books => "BOO",
            Self::Equipment => "EQU",
        }
    }
}

/// A catalog product. The stored price is tax-inclusive EUR.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub features: String,
    pub sku: String,
    pub category: ProductCategory,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock: i32,
    pub low_stock_threshold: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Tax-exclusive price, derived for administrative use only.
    #[must_use]
    pub fn price_excl_vat(&self) -> Option<Decimal> {
        price_excl_vat(self.price, STANDARD_VAT_RATE)
    }

    /// VAT portion of the display price.
    #[must_use]
    pub fn vat_amount(&self) -> Option<Decimal> {
        vat_amount(self.price, STANDARD_VAT_RATE)
    }

    /// Whether the product currently has a discounted price.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.original_price.is_some_and(|orig| orig > self.price)
    }

    /// Discount percentage against the original price, 0 when not on sale.
    #[must_use]
    pub fn sale_percentage(&self) -> u32 {
        let Some(original) = self.original_price else {
            return 0;
        };
        if original <= self.price || original.is_zero() {
            return 0;
        }
        let fraction = (original - self.price) / original;
        (fraction * Decimal::ONE_HUNDRED).trunc().to_u32().unwrap_or(0)
    }

    /// Whether the stock has dropped to the warning threshold.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }

    /// The `features` text split into one entry per non-empty line.
    #[must_use]
    pub fn features_list(&self) -> Vec<&str> {
        self.features
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Generate a SKU for a product that was created without one:
/// `GM-<category tag>-<8 uuid chars>`.
#[must_use]
pub fn generate_sku(category: ProductCategory) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();
    let short = unique.get(..8).unwrap_or(&unique).to_ascii_uppercase();
    format!("GM-{}-{short}", category.sku_tag())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn product(price: &str, original: Option<&str>) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Manuka honing 250g".to_owned(),
            description: String::new(),
            short_description: String::new(),
            features: "MGO 400+\n\n  Rauw  \n".to_owned(),
            sku: "GM-MAN-DEADBEEF".to_owned(),
            category: ProductCategory::Manuka,
            price: dec(price),
            original_price: original.map(dec),
            stock: 5,
            low_stock_threshold: 10,
            is_active: true,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn derives_exclusive_price() {
        let p = product("121.00", None);
        assert_eq!(p.price_excl_vat(), Some(dec("100.00")));
        assert_eq!(p.vat_amount(), Some(dec("21.00")));
    }

    #[test]
    fn sale_detection_and_percentage() {
        let p = product("15.00", Some("20.00"));
        assert!(p.is_on_sale());
        assert_eq!(p.sale_percentage(), 25);

        let not_discounted = product("20.00", Some("20.00"));
        assert!(!not_discounted.is_on_sale());
        assert_eq!(not_discounted.sale_percentage(), 0);

        assert!(!product("20.00", None).is_on_sale());
    }

    #[test]
    fn low_stock_uses_the_threshold() {
        assert!(product("10.00", None).is_low_stock());
    }

    #[test]
    fn features_list_skips_blank_lines() {
        let p = product("10.00", None);
        assert_eq!(p.features_list(), vec!["MGO 400+", "Rauw"]);
    }

    #[test]
    fn generated_skus_carry_the_category_tag() {
        let sku = generate_sku(ProductCategory::Honey);
        assert!(sku.starts_with("GM-HON-"));
        assert_eq!(sku.len(), "GM-HON-".len() + 8);
    }

    #[test]
    fn category_serializes_snake_case() {
        let json = serde_json::to_string(&ProductCategory::Supplements).unwrap();
        assert_eq!(json, "\"supplements\"");
    }
}
