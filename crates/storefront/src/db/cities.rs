//! City repository.

use sqlx::PgPool;

use samara_core::CityId;

use super::{RepositoryError, parse_flag};
use crate::models::City;

#[derive(sqlx::FromRow)]
struct CityRow {
    id: i32,
    name: String,
    is_active: String,
}

impl TryFrom<CityRow> for City {
    type Error = RepositoryError;

    fn try_from(row: CityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CityId::new(row.id),
            name: row.name,
            is_active: parse_flag(&row.is_active, "cities.is_active")?,
        })
    }
}

/// Repository for delivery cities.
pub struct CityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CityRepository<'a> {
    /// Create a new city repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Cities inside delivery coverage, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<City>, RepositoryError> {
        let rows = sqlx::query_as::<_, CityRow>(
            r"
            SELECT id, name, is_active
            FROM samara.cities
            WHERE is_active = 'Y'
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(City::try_from).collect()
    }

    /// Get a city by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CityId) -> Result<Option<City>, RepositoryError> {
        let row = sqlx::query_as::<_, CityRow>(
            "SELECT id, name, is_active FROM samara.cities WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(City::try_from).transpose()
    }

    /// Find a city by name (case-insensitive) or create it as inactive.
    ///
    /// Customer-entered cities start outside delivery coverage until staff
    /// activate them.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_or_create_inactive(&self, name: &str) -> Result<City, RepositoryError> {
        let row = sqlx::query_as::<_, CityRow>(
            r"
            INSERT INTO samara.cities (name, is_active)
            VALUES ($1, 'N')
            ON CONFLICT ((lower(name))) DO UPDATE SET name = samara.cities.name
            RETURNING id, name, is_active
            ",
        )
        .bind(name.trim())
        .fetch_one(self.pool)
        .await?;

        City::try_from(row)
    }

    /// Insert a city if no city with that name exists yet.
    ///
    /// Returns `true` when a row was inserted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert_if_missing(
        &self,
        name: &str,
        active: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO samara.cities (name, is_active)
            VALUES ($1, $2)
            ON CONFLICT ((lower(name))) DO NOTHING
            ",
        )
        .bind(name.trim())
        .bind(if active { "Y" } else { "N" })
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
