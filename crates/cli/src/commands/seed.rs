//! Catalog seed command.

use rust_decimal::Decimal;

use groenmarkt_api::db::{self, products::ProductRepository};
use groenmarkt_api::models::{ProductCategory, product::generate_sku};

/// Sample catalog: (name, description, category, price, stock, featured).
const SAMPLE_PRODUCTS: &[(&str, &str, ProductCategory, &str, i32, bool)] = &[
    (
        "Biologische honing 450g",
        "Rauwe biologische bloemenhoning van Nederlandse imkers.",
        ProductCategory::Honey,
        "8.95",
        120,
        true,
    ),
    (
        "Manuka honing MGO 400+ 250g",
        "Gecertificeerde Manuka honing uit Nieuw-Zeeland.",
        ProductCategory::Manuka,
        "49.95",
        35,
        true,
    ),
    (
        "Cupping set siliconen (4 cups)",
        "Complete siliconen cupping set voor thuisgebruik.",
        ProductCategory::Cupping,
        "24.95",
        60,
        false,
    ),
    (
        "Vitamine D3 3000 IE (90 caps)",
        "Hooggedoseerde vitamine D3 softgels.",
        ProductCategory::Vitamins,
        "14.50",
        200,
        false,
    ),
    (
        "Etherische lavendelolie 10ml",
        "100% pure lavendelolie voor diffuser en massage.",
        ProductCategory::Oils,
        "9.95",
        80,
        false,
    ),
    (
        "Massageolie arnica 250ml",
        "Warmende massageolie met arnica-extract.",
        ProductCategory::Massage,
        "12.95",
        45,
        false,
    ),
];

/// Seed the catalog with sample products. Existing SKUs are left alone;
/// the seeder only reports conflicts and moves on.
///
/// # Errors
///
/// Returns an error when the database is unreachable.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;
    let pool = db::create_pool(&database_url).await?;
    let repo = ProductRepository::new(&pool);

    for (name, description, category, price, stock, featured) in SAMPLE_PRODUCTS {
        let price: Decimal = price.parse()?;
        let sku = generate_sku(*category);
        match repo
            .insert(name, description, &sku, *category, price, *stock, *featured)
            .await
        {
            Ok(product) => tracing::info!(name = %product.name, sku = %product.sku, "seeded"),
            Err(e) if e.is_conflict() => tracing::warn!(name, "already seeded, skipping"),
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!("seed complete");
    Ok(())
}
