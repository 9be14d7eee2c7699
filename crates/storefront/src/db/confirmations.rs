//! Payment confirmation repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use samara_core::{ConfirmationId, CustomerId, PaymentStatus};

use super::RepositoryError;
use crate::models::{NewPaymentConfirmation, PaymentConfirmation};

const CONFIRMATION_COLUMNS: &str = r"
    id, user_id, checkout_id, status, country, city, street, floor, landmark,
    f_name, s_name, phone, email, notes, donation, discount_type,
    discount_amount, promocode, final_price, price, created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct ConfirmationRow {
    id: i32,
    user_id: CustomerId,
    checkout_id: Option<String>,
    status: String,
    country: Option<String>,
    city: Option<String>,
    street: Option<String>,
    floor: Option<String>,
    landmark: Option<String>,
    f_name: Option<String>,
    s_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    notes: Option<String>,
    donation: Decimal,
    discount_type: Option<String>,
    discount_amount: Decimal,
    promocode: Option<String>,
    final_price: Option<Decimal>,
    price: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConfirmationRow> for PaymentConfirmation {
    fn from(row: ConfirmationRow) -> Self {
        Self {
            id: ConfirmationId::new(row.id),
            user_id: row.user_id,
            checkout_id: row.checkout_id,
            status: row.status,
            country: row.country,
            city: row.city,
            street: row.street,
            floor: row.floor,
            landmark: row.landmark,
            f_name: row.f_name,
            s_name: row.s_name,
            phone: row.phone,
            email: row.email,
            notes: row.notes,
            donation: row.donation,
            discount_type: row.discount_type,
            discount_amount: row.discount_amount,
            promocode: row.promocode,
            final_price: row.final_price,
            price: row.price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for payment confirmations.
pub struct ConfirmationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ConfirmationRepository<'a> {
    /// Create a new confirmation repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a confirmation. A missing status is stored as `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if no customer is given,
    /// `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        new: &NewPaymentConfirmation,
    ) -> Result<PaymentConfirmation, RepositoryError> {
        let user_id = new
            .user_id
            .ok_or_else(|| RepositoryError::DataCorruption("user_id is required".to_owned()))?;
        let status = new
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(PaymentStatus::Pending.as_str());

        let sql = format!(
            "INSERT INTO samara.order_payment_confirmation (
                user_id, checkout_id, status, country, city, street, floor, landmark,
                f_name, s_name, phone, email, notes, donation, discount_type,
                discount_amount, promocode, final_price, price
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
             RETURNING {CONFIRMATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ConfirmationRow>(&sql)
            .bind(user_id)
            .bind(&new.checkout_id)
            .bind(status)
            .bind(&new.country)
            .bind(&new.city)
            .bind(&new.street)
            .bind(&new.floor)
            .bind(&new.landmark)
            .bind(&new.f_name)
            .bind(&new.s_name)
            .bind(&new.phone)
            .bind(&new.email)
            .bind(&new.notes)
            .bind(new.donation.unwrap_or_default())
            .bind(&new.discount_type)
            .bind(new.discount_amount.unwrap_or_default())
            .bind(&new.promocode)
            .bind(new.final_price)
            .bind(new.price)
            .fetch_one(self.pool)
            .await?;

        Ok(PaymentConfirmation::from(row))
    }

    /// The customer's `PENDING` confirmations created since midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_today(
        &self,
        user_id: CustomerId,
    ) -> Result<Vec<PaymentConfirmation>, RepositoryError> {
        let sql = format!(
            "SELECT {CONFIRMATION_COLUMNS}
             FROM samara.order_payment_confirmation
             WHERE user_id = $1
               AND status = 'PENDING'
               AND created_at >= date_trunc('day', now() AT TIME ZONE 'UTC') AT TIME ZONE 'UTC'
             ORDER BY created_at ASC"
        );
        let rows = sqlx::query_as::<_, ConfirmationRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(PaymentConfirmation::from).collect())
    }

    /// Set the status of a confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row has this ID,
    /// `RepositoryError::Database` if the query fails.
    pub async fn set_status(
        &self,
        id: ConfirmationId,
        status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE samara.order_payment_confirmation
            SET status = $2, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark a confirmation as paid.
    ///
    /// # Errors
    ///
    /// See [`Self::set_status`].
    pub async fn mark_paid(&self, id: ConfirmationId) -> Result<(), RepositoryError> {
        self.set_status(id, PaymentStatus::Paid).await
    }
}
