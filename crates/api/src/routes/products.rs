//! Product catalog handlers (read-only).

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use groenmarkt_core::ProductId;

use crate::db::products::{ProductFilter, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Product, ProductCategory};
use crate::state::AppState;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<ProductCategory>,
    pub featured: Option<bool>,
    pub q: Option<String>,
}

/// Product display data with derived pricing fields.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub price_excl_vat: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub is_on_sale: bool,
    pub sale_percentage: u32,
    pub is_low_stock: bool,
    pub features_list: Vec<String>,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        Self {
            price_excl_vat: product.price_excl_vat(),
            vat_amount: product.vat_amount(),
            is_on_sale: product.is_on_sale(),
            sale_percentage: product.sale_percentage(),
            is_low_stock: product.is_low_stock(),
            features_list: product
                .features_list()
                .into_iter()
                .map(str::to_owned)
                .collect(),
            product,
        }
    }
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let filter = ProductFilter {
        category: query.category,
        featured: query.featured,
        search: query.q.filter(|q| !q.trim().is_empty()),
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    let views: Vec<ProductView> = products.into_iter().map(ProductView::from).collect();

    Ok(Json(json!({
        "count": views.len(),
        "products": views,
    })))
}

/// `GET /api/products/{id}`
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductView>> {
    let product = ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(ProductView::from(product)))
}
