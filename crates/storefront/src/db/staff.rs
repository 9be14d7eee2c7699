//! Staff account repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samara_core::{StaffRole, StaffUserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::StaffUser;

#[derive(sqlx::FromRow)]
struct StaffRow {
    id: i32,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<StaffRow> for StaffUser {
    type Error = RepositoryError;

    fn try_from(row: StaffRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<StaffRole>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id: StaffUserId::new(row.id),
            username: row.username,
            role,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct StaffCredentialsRow {
    id: i32,
    username: String,
    role: String,
    created_at: DateTime<Utc>,
    password_hash: String,
}

/// Repository for staff accounts.
pub struct StaffRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> StaffRepository<'a> {
    /// Create a new staff repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All staff accounts ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<StaffUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, StaffRow>(
            "SELECT id, username, role, created_at FROM samara.admin_users ORDER BY id ASC",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(StaffUser::try_from).collect()
    }

    /// Create a staff account with an already hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken,
    /// `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        role: StaffRole,
    ) -> Result<StaffUser, RepositoryError> {
        let row = sqlx::query_as::<_, StaffRow>(
            r"
            INSERT INTO samara.admin_users (username, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, role, created_at
            ",
        )
        .bind(username)
        .bind(password_hash)
        .bind(role.to_string())
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "username"))?;

        StaffUser::try_from(row)
    }

    /// Get a staff account and its password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_hash(
        &self,
        username: &str,
    ) -> Result<Option<(StaffUser, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffCredentialsRow>(
            r"
            SELECT id, username, role, created_at, password_hash
            FROM samara.admin_users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(|row| {
            let user = StaffUser::try_from(StaffRow {
                id: row.id,
                username: row.username,
                role: row.role,
                created_at: row.created_at,
            })?;
            Ok((user, row.password_hash))
        })
        .transpose()
    }
}
