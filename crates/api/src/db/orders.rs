//! Order repository.
//!
//! Order creation is transaction-scoped: the checkout service owns the
//! transaction and calls the `*_in_tx` helpers so the order row, its
//! snapshot items, the recomputed totals and the cart clearing commit or
//! roll back as one unit.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use groenmarkt_core::{OrderId, OrderNumber, UserId};

use super::RepositoryError;
use crate::models::{
    CartItemWithProduct, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    PaymentTransaction, TransactionStatus,
};

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_email, customer_name, \
                             customer_phone, status, payment_status, shipping_address_id, \
                             billing_address_id, shipping_address_text, billing_address_text, \
                             subtotal, tax_rate, tax_amount, shipping_cost, total_amount, \
                             payment_method, ideal_bank, payment_reference, tracking_number, \
                             customer_notes, confirmation_sent_at, created_at, updated_at, \
                             shipped_at, delivered_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, product_name, product_sku, unit_price, \
                            quantity, total_price, created_at";

/// Everything needed to insert the order row itself.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub order_number: &'a OrderNumber,
    pub user_id: UserId,
    pub customer_email: &'a str,
    pub customer_name: &'a str,
    pub customer_phone: &'a str,
    pub shipping_address_id: groenmarkt_core::AddressId,
    pub billing_address_id: groenmarkt_core::AddressId,
    pub shipping_address_text: &'a str,
    pub billing_address_text: &'a str,
    pub tax_rate: Decimal,
    pub shipping_cost: Decimal,
    pub payment_method: PaymentMethod,
    pub ideal_bank: &'a str,
    pub customer_notes: &'a str,
}

/// Derived monetary aggregates for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub shipping_cost: Decimal,
    pub total_amount: Decimal,
}

/// Repository for orders, order items and payment transactions.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders: staff see everything, customers their own, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_visible(
        &self,
        user_id: UserId,
        is_staff: bool,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE $2 OR user_id = $1
             ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(is_staff)
            .fetch_all(self.pool)
            .await?)
    }

    /// Get one order, owner-scoped unless staff.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_visible(
        &self,
        id: OrderId,
        user_id: UserId,
        is_staff: bool,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND ($3 OR user_id = $2)");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(is_staff)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Find the order a provider payment belongs to.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_payment_reference(
        &self,
        payment_reference: &str,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1");
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(payment_reference)
            .fetch_optional(self.pool)
            .await?)
    }

    /// List an order's snapshot items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id");
        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(self.pool)
            .await?)
    }

    /// Store the provider's payment ID on the order after the payment is
    /// created (post-commit, so this is a plain update).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_payment_reference(
        &self,
        id: OrderId,
        payment_reference: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE orders SET payment_reference = $1, updated_at = now() WHERE id = $2")
            .bind(payment_reference)
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Checkout transaction
    // =========================================================================

    /// Highest existing daily sequence for the given day prefix, or
    /// `None` when today has no orders yet. Called inside the checkout
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn highest_number_for_day(
        tx: &mut Transaction<'_, Postgres>,
        day_prefix: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT order_number FROM orders
             WHERE order_number LIKE $1 || '%'
             ORDER BY order_number DESC
             LIMIT 1",
        )
        .bind(day_prefix)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(row.map(|(n,)| n))
    }

    /// Insert the order row (status pending, payment pending, zero
    /// totals) inside the checkout transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` when the order number lost a
    /// race (the caller retries the whole transaction), or
    /// `RepositoryError::Database` for other failures.
    pub async fn insert_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        new: &NewOrder<'_>,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "INSERT INTO orders (order_number, user_id, customer_email, customer_name,
                                 customer_phone, shipping_address_id, billing_address_id,
                                 shipping_address_text, billing_address_text, tax_rate,
                                 shipping_cost, payment_method, ideal_bank, customer_notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {ORDER_COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&sql)
            .bind(new.order_number.to_string())
            .bind(new.user_id)
            .bind(new.customer_email)
            .bind(new.customer_name)
            .bind(new.customer_phone)
            .bind(new.shipping_address_id)
            .bind(new.billing_address_id)
            .bind(new.shipping_address_text)
            .bind(new.billing_address_text)
            .bind(new.tax_rate)
            .bind(new.shipping_cost)
            .bind(new.payment_method)
            .bind(new.ideal_bank)
            .bind(new.customer_notes)
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| RepositoryError::from_sqlx(e, "order number already taken"))
    }

    /// Snapshot one cart line into an order item.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_item_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        line: &CartItemWithProduct,
    ) -> Result<OrderItem, RepositoryError> {
        let sql = format!(
            "INSERT INTO order_items (order_id, product_id, product_name, product_sku,
                                      unit_price, quantity, total_price)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ITEM_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(&line.product_sku)
            .bind(line.unit_price)
            .bind(line.quantity)
            .bind(line.total_price())
            .fetch_one(&mut **tx)
            .await?)
    }

    /// Write the recomputed aggregates and move the order to `confirmed`
    /// (payment still pending — payment confirmation only ever arrives
    /// through reconciliation).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn apply_totals_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        totals: &OrderTotals,
    ) -> Result<Order, RepositoryError> {
        let sql = format!(
            "UPDATE orders
             SET subtotal = $1, tax_amount = $2, shipping_cost = $3, total_amount = $4,
                 status = 'confirmed', updated_at = now()
             WHERE id = $5
             RETURNING {ORDER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Order>(&sql)
            .bind(totals.subtotal)
            .bind(totals.tax_amount)
            .bind(totals.shipping_cost)
            .bind(totals.total_amount)
            .bind(id)
            .fetch_one(&mut **tx)
            .await?)
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Apply a status pair reached by the reconciliation state machine,
    /// optionally stamping `confirmation_sent_at`, inside the caller's
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_statuses_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        status: OrderStatus,
        payment_status: PaymentStatus,
        confirmation_sent_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE orders
             SET status = $1, payment_status = $2,
                 confirmation_sent_at = COALESCE($3, confirmation_sent_at),
                 updated_at = now()
             WHERE id = $4",
        )
        .bind(status)
        .bind(payment_status)
        .bind(confirmation_sent_at)
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Record or refresh the mirror of a provider payment, keeping the
    /// raw notification payload for audit.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert_payment_transaction_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: OrderId,
        provider_payment_id: &str,
        status: TransactionStatus,
        amount: Decimal,
        method: &str,
        webhook_payload: &serde_json::Value,
    ) -> Result<PaymentTransaction, RepositoryError> {
        Ok(sqlx::query_as::<_, PaymentTransaction>(
            "INSERT INTO payment_transactions
                 (order_id, provider_payment_id, status, amount, method, webhook_payload)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (provider_payment_id)
             DO UPDATE SET status = EXCLUDED.status,
                           webhook_payload = EXCLUDED.webhook_payload,
                           updated_at = now()
             RETURNING id, order_id, provider_payment_id, status, amount, method,
                       webhook_payload, created_at, updated_at",
        )
        .bind(order_id)
        .bind(provider_payment_id)
        .bind(status)
        .bind(amount)
        .bind(method)
        .bind(webhook_payload)
        .fetch_one(&mut **tx)
        .await?)
    }
}
