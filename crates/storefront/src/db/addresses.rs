//! Address repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samara_core::{AddressId, CityId, CustomerId};

use super::RepositoryError;
use crate::models::Address;

/// Columns selected for an address, joined with its city.
const ADDRESS_COLUMNS: &str = r"
    a.id, a.user_id, a.country, a.city_id, a.city, a.street, a.floor, a.landmark,
    a.created_at, a.updated_at,
    c.name AS city_name,
    c.is_active AS city_is_active
";

#[derive(sqlx::FromRow)]
struct AddressRow {
    id: i32,
    user_id: CustomerId,
    country: String,
    city_id: Option<i32>,
    city: Option<String>,
    street: String,
    floor: String,
    landmark: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    city_name: Option<String>,
    city_is_active: Option<String>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: row.user_id,
            country: row.country,
            city_id: row.city_id.map(CityId::new),
            city: row.city,
            city_name: row.city_name,
            city_active: row.city_is_active.map(|flag| flag.trim() == "Y"),
            street: row.street,
            floor: row.floor,
            landmark: row.landmark,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Address fields after validation, ready to store.
#[derive(Debug, Clone)]
pub struct AddressFields {
    pub country: String,
    pub city_id: CityId,
    pub city: String,
    pub street: String,
    pub floor: String,
    pub landmark: String,
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

    /// All addresses of a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: CustomerId,
    ) -> Result<Vec<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS}
             FROM samara.addresses a
             LEFT JOIN samara.cities c ON c.id = a.city_id
             WHERE a.user_id = $1
             ORDER BY a.created_at DESC, a.id DESC"
        );
        let rows = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Get one of the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: CustomerId,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let sql = format!(
            "SELECT {ADDRESS_COLUMNS}
             FROM samara.addresses a
             LEFT JOIN samara.cities c ON c.id = a.city_id
             WHERE a.user_id = $1 AND a.id = $2"
        );
        let row = sqlx::query_as::<_, AddressRow>(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Address::from))
    }

    /// Insert a new address and return it with its city resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        user_id: CustomerId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO samara.addresses (user_id, country, city_id, city, street, floor, landmark)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(&fields.country)
        .bind(fields.city_id)
        .bind(&fields.city)
        .bind(&fields.street)
        .bind(&fields.floor)
        .bind(&fields.landmark)
        .fetch_one(self.pool)
        .await?;

        self.get_for_user(user_id, AddressId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Update one of the customer's addresses.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address does not belong to
    /// the customer, `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        user_id: CustomerId,
        id: AddressId,
        fields: &AddressFields,
    ) -> Result<Address, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE samara.addresses
            SET country = $3, city_id = $4, city = $5, street = $6, floor = $7,
                landmark = $8, updated_at = now()
            WHERE user_id = $1 AND id = $2
            ",
        )
        .bind(user_id)
        .bind(id)
        .bind(&fields.country)
        .bind(fields.city_id)
        .bind(&fields.city)
        .bind(&fields.street)
        .bind(&fields.floor)
        .bind(&fields.landmark)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_for_user(user_id, id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Delete one of the customer's addresses.
    ///
    /// # Returns
    ///
    /// Returns `true` if the address was deleted, `false` if it didn't exist
    /// or belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(
        &self,
        user_id: CustomerId,
        id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM samara.addresses WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
