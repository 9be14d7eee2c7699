//! Loyalty wallet repository.
//!
//! Points live in `app_users.bonus`. Deductions are a single conditional
//! `UPDATE`, so two concurrent deductions can never spend the same points.

use sqlx::PgPool;

use samara_core::CustomerId;

use super::RepositoryError;

/// Outcome of a deduction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deduction {
    /// Points were removed; carries the new balance.
    Applied(i32),
    /// Balance was lower than the requested amount (or the user is unknown).
    Insufficient,
}

/// Repository for wallet balances.
pub struct WalletRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WalletRepository<'a> {
    /// Create a new wallet repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Current balance; unknown users and empty wallets read as zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn balance(&self, user_id: CustomerId) -> Result<i32, RepositoryError> {
        let bonus: Option<Option<i32>> =
            sqlx::query_scalar("SELECT bonus FROM samara.app_users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(bonus.flatten().unwrap_or(0))
    }

    /// Atomically deduct `amount` points if the balance covers it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deduct(
        &self,
        user_id: CustomerId,
        amount: i32,
    ) -> Result<Deduction, RepositoryError> {
        let remaining: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE samara.app_users
            SET bonus = COALESCE(bonus, 0) - $2
            WHERE id = $1 AND COALESCE(bonus, 0) >= $2
            RETURNING bonus
            ",
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(self.pool)
        .await?;

        Ok(remaining.map_or(Deduction::Insufficient, Deduction::Applied))
    }
}
