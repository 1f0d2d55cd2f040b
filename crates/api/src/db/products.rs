//! Product catalog repository (read-mostly).

use sqlx::PgPool;

use groenmarkt_core::ProductId;

use super::RepositoryError;
use crate::models::{Product, ProductCategory};

const PRODUCT_COLUMNS: &str = "id, name, description, short_description, features, sku, category, \
                               price, original_price, stock, low_stock_threshold, is_active, \
                               is_featured, created_at, updated_at";

/// Filters accepted by [`ProductRepository::list`].
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    pub category: Option<ProductCategory>,
    pub featured: Option<bool>,
    /// Case-insensitive substring match on name and description.
    pub search: Option<String>,
}

/// Repository for catalog products.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products, optionally filtered, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE is_active
               AND ($1::text IS NULL OR category = $1)
               AND ($2::boolean IS NULL OR is_featured = $2)
               AND ($3::text IS NULL OR name ILIKE '%' || $3 || '%'
                                     OR description ILIKE '%' || $3 || '%')
             ORDER BY name"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.category)
            .bind(filter.featured)
            .bind(filter.search.as_deref())
            .fetch_all(self.pool)
            .await?;
        Ok(products)
    }

    /// Get an active product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Insert a product (used by the seeder; catalog management proper
    /// is out of scope for the API).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a duplicate SKU,
    /// `RepositoryError::Database` for other failures.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        &self,
        name: &str,
        description: &str,
        sku: &str,
        category: ProductCategory,
        price: rust_decimal::Decimal,
        stock: i32,
        is_featured: bool,
    ) -> Result<Product, RepositoryError> {
        let sql = format!(
            "INSERT INTO products (name, description, sku, category, price, stock, is_featured)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&sql)
            .bind(name)
            .bind(description)
            .bind(sku)
            .bind(category)
            .bind(price)
            .bind(stock)
            .bind(is_featured)
            .fetch_one(self.pool)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "sku already exists"))
    }
}
