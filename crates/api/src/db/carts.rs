//! Shopping cart repository.

use sqlx::{PgPool, Postgres, Transaction};

use groenmarkt_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartItem, CartItemWithProduct};

const ITEM_JOIN: &str = "SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity,
                                p.name AS product_name, p.sku AS product_sku,
                                p.price AS unit_price
                         FROM cart_items ci
                         JOIN products p ON p.id = ci.product_id";

/// Repository for carts and cart items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // Upsert keeps this race-free when two requests arrive for a
        // user without a cart.
        Ok(sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (user_id) VALUES ($1)
             ON CONFLICT (user_id) DO UPDATE SET updated_at = now()
             RETURNING id, user_id, created_at, updated_at",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?)
    }

    /// Get the user's cart without creating one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(&self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        Ok(sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// List the cart's items joined with live product data.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: CartId) -> Result<Vec<CartItemWithProduct>, RepositoryError> {
        let sql = format!("{ITEM_JOIN} WHERE ci.cart_id = $1 ORDER BY ci.created_at");
        Ok(sqlx::query_as::<_, CartItemWithProduct>(&sql)
            .bind(cart_id)
            .fetch_all(self.pool)
            .await?)
    }

    /// Add a product to the cart. If the product is already in the cart
    /// the quantity is incremented instead of creating a second line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        Ok(sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (cart_id, product_id, quantity)
             VALUES ($1, $2, $3)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                           updated_at = now()
             RETURNING id, cart_id, product_id, quantity, created_at, updated_at",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?)
    }

    /// Set an item's quantity, owner-scoped through the cart. A quantity
    /// of zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item does not belong
    /// to the user's cart.
    pub async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        user_id: UserId,
        quantity: i32,
    ) -> Result<Option<CartItem>, RepositoryError> {
        if quantity <= 0 {
            self.remove_item(item_id, user_id).await?;
            return Ok(None);
        }
        sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items ci
             SET quantity = $1, updated_at = now()
             FROM carts c
             WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $3
             RETURNING ci.id, ci.cart_id, ci.product_id, ci.quantity,
                       ci.created_at, ci.updated_at",
        )
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?
        .map_or_else(
            || Err(RepositoryError::NotFound(format!("cart item {item_id}"))),
            |item| Ok(Some(item)),
        )
    }

    /// Remove an item, owner-scoped through the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn remove_item(
        &self,
        item_id: CartItemId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM cart_items ci
             USING carts c
             WHERE ci.id = $1 AND ci.cart_id = c.id AND c.user_id = $2",
        )
        .bind(item_id)
        .bind(user_id)
        .execute(self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("cart item {item_id}")));
        }
        Ok(())
    }

    // =========================================================================
    // Transaction-scoped operations used by checkout
    // =========================================================================

    /// Lock the cart row for the duration of the transaction, preventing
    /// a second concurrent checkout of the same cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
    ) -> Result<Option<Cart>, RepositoryError> {
        Ok(sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE id = $1 FOR UPDATE",
        )
        .bind(cart_id)
        .fetch_optional(&mut **tx)
        .await?)
    }

    /// Re-read the cart's items inside the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
    ) -> Result<Vec<CartItemWithProduct>, RepositoryError> {
        let sql = format!("{ITEM_JOIN} WHERE ci.cart_id = $1 ORDER BY ci.created_at");
        Ok(sqlx::query_as::<_, CartItemWithProduct>(&sql)
            .bind(cart_id)
            .fetch_all(&mut **tx)
            .await?)
    }

    /// Empty the cart inside the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        cart_id: CartId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
