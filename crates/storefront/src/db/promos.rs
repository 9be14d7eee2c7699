//! Promo code and charity eligibility lookups.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samara_core::{CustomerId, PromoCodeId};

use super::{RepositoryError, parse_flag};
use crate::models::PromoCode;

#[derive(sqlx::FromRow)]
struct PromoCodeRow {
    id: i32,
    code: String,
    discount_value: i32,
    active: String,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<i32>,
}

impl TryFrom<PromoCodeRow> for PromoCode {
    type Error = RepositoryError;

    fn try_from(row: PromoCodeRow) -> Result<Self, Self::Error> {
        let discount_value = u8::try_from(row.discount_value)
            .ok()
            .filter(|v| (1..=100).contains(v))
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "promo_codes.discount_value out of range: {}",
                    row.discount_value
                ))
            })?;

        Ok(Self {
            id: PromoCodeId::new(row.id),
            code: row.code,
            discount_value,
            active: parse_flag(&row.active, "promo_codes.active")?,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
        })
    }
}

/// Repository for discount eligibility.
pub struct PromoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PromoRepository<'a> {
    /// Create a new promo repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find a promo code, ignoring case and surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<PromoCode>, RepositoryError> {
        let row = sqlx::query_as::<_, PromoCodeRow>(
            r"
            SELECT id, code, discount_value, active, starts_at, expires_at, max_uses
            FROM samara.promo_codes
            WHERE lower(code) = lower($1)
            ",
        )
        .bind(code.trim())
        .fetch_optional(self.pool)
        .await?;

        row.map(PromoCode::try_from).transpose()
    }

    /// How many paid checkouts and placed orders used this code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_uses(&self, code: &str) -> Result<i64, RepositoryError> {
        let uses: i64 = sqlx::query_scalar(
            r"
            SELECT
                (SELECT count(*) FROM samara.order_payment_confirmation
                 WHERE lower(promocode) = lower($1) AND status = 'PAID')
              + (SELECT count(*) FROM samara.orders
                 WHERE lower(promo_code) = lower($1))
            ",
        )
        .bind(code.trim())
        .fetch_one(self.pool)
        .await?;

        Ok(uses)
    }

    /// Whether the customer may use the charity discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_charity_beneficiary(
        &self,
        user_id: CustomerId,
    ) -> Result<bool, RepositoryError> {
        let eligible: bool = sqlx::query_scalar(
            r"
            SELECT EXISTS (
                SELECT 1 FROM samara.charity_beneficiaries
                WHERE user_id = $1 AND active = 'Y'
            )
            ",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(eligible)
    }
}
