//! Address repository.
//!
//! The default-flag invariant (at most one default shipping and one
//! default billing address per user) is enforced here: every write that
//! sets a flag clears the competing flags inside the same transaction.

use sqlx::{PgPool, Postgres, Transaction};

use groenmarkt_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, AddressType};

const ADDRESS_COLUMNS: &str = "id, user_id, address_type, first_name, last_name, company, street, \
                               house_number, house_number_addition, postal_code, city, province, \
                               country, is_default_shipping, is_default_billing, created_at, \
                               updated_at";

/// Field values for creating or updating an address. Postal codes are
/// expected in canonical form; the routes validate and canonicalize
/// before calling in.
#[derive(Debug, Clone)]
pub struct AddressInput {
    pub address_type: AddressType,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub street: String,
    pub house_number: String,
    pub house_number_addition: String,
    pub postal_code: String,
    pub city: String,
    pub province: String,
    pub country: String,
    pub is_default_shipping: bool,
    pub is_default_billing: bool,
}

/// Repository for customer addresses.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's addresses, defaults first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1
             ORDER BY is_default_shipping DESC, is_default_billing DESC, created_at DESC"
        );
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?)
    }

    /// Get one address, owner-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_owned(
        &self,
        id: AddressId,
        user_id: UserId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND user_id = $2");
        Ok(sqlx::query_as::<_, Address>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?)
    }

    /// Create an address. When a default flag is set, competing flags on
    /// the user's other addresses are cleared in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction rolls back as a whole.
    pub async fn create(
        &self,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        clear_competing_defaults(&mut tx, user_id, None, input).await?;

        let sql = format!(
            "INSERT INTO addresses (user_id, address_type, first_name, last_name, company,
                                    street, house_number, house_number_addition, postal_code,
                                    city, province, country, is_default_shipping,
                                    is_default_billing)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {ADDRESS_COLUMNS}"
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(user_id)
            .bind(input.address_type)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.company)
            .bind(&input.street)
            .bind(&input.house_number)
            .bind(&input.house_number_addition)
            .bind(&input.postal_code)
            .bind(&input.city)
            .bind(&input.province)
            .bind(&input.country)
            .bind(input.is_default_shipping)
            .bind(input.is_default_billing)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(address)
    }

    /// Update an address, owner-scoped, maintaining the default-flag
    /// invariant transactionally.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not exist
    /// or is not owned by `user_id`.
    pub async fn update(
        &self,
        id: AddressId,
        user_id: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        clear_competing_defaults(&mut tx, user_id, Some(id), input).await?;

        let sql = format!(
            "UPDATE addresses
             SET address_type = $1, first_name = $2, last_name = $3, company = $4,
                 street = $5, house_number = $6, house_number_addition = $7,
                 postal_code = $8, city = $9, province = $10, country = $11,
                 is_default_shipping = $12, is_default_billing = $13, updated_at = now()
             WHERE id = $14 AND user_id = $15
             RETURNING {ADDRESS_COLUMNS}"
        );
        let address = sqlx::query_as::<_, Address>(&sql)
            .bind(input.address_type)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.company)
            .bind(&input.street)
            .bind(&input.house_number)
            .bind(&input.house_number_addition)
            .bind(&input.postal_code)
            .bind(&input.city)
            .bind(&input.province)
            .bind(&input.country)
            .bind(input.is_default_shipping)
            .bind(input.is_default_billing)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("address {id}")))?;

        tx.commit().await?;
        Ok(address)
    }

    /// Delete an address, owner-scoped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if nothing was deleted.
    pub async fn delete(&self, id: AddressId, user_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("address {id}")));
        }
        Ok(())
    }
}

/// Clear default flags on the user's other addresses for every flag the
/// incoming write sets. Runs inside the caller's transaction so the
/// invariant can never be observed violated.
async fn clear_competing_defaults(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    exclude: Option<AddressId>,
    input: &AddressInput,
) -> Result<(), RepositoryError> {
    if input.is_default_shipping {
        sqlx::query(
            "UPDATE addresses SET is_default_shipping = FALSE
             WHERE user_id = $1 AND is_default_shipping AND ($2::integer IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(exclude)
        .execute(&mut **tx)
        .await?;
    }
    if input.is_default_billing {
        sqlx::query(
            "UPDATE addresses SET is_default_billing = FALSE
             WHERE user_id = $1 AND is_default_billing AND ($2::integer IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(exclude)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
