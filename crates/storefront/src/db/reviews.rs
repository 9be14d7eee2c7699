//! Review repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use samara_core::{CustomerId, ReviewId, YesNo};

use super::catalog::escape_like;
use super::{RepositoryError, parse_flag};
use crate::models::{Review, ReviewAuthor, ReviewStats};

const REVIEW_SELECT: &str = r"
    SELECT r.id, r.user_id, r.rating, r.comment, r.subject, r.show, r.created_at,
           u.full_name, u.image
    FROM samara.reviews r
    LEFT JOIN samara.app_users u ON u.id = r.user_id
";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i32,
    user_id: CustomerId,
    rating: i32,
    comment: String,
    subject: Option<String>,
    show: String,
    created_at: DateTime<Utc>,
    full_name: Option<String>,
    image: Option<String>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = RepositoryError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReviewId::new(row.id),
            user_id: row.user_id,
            rating: row.rating,
            comment: row.comment,
            subject: row.subject,
            show: parse_flag(&row.show, "reviews.show")?,
            created_at: row.created_at,
            author: ReviewAuthor {
                full_name: row.full_name,
                image: row.image,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct StatsRow {
    total: i64,
    show: i64,
    hide: i64,
}

/// Repository for customer reviews.
pub struct ReviewRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// One page of visible reviews, newest first, plus the visible total.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn visible_page(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<Review>, i64), RepositoryError> {
        let sql = format!(
            "{REVIEW_SELECT}
             WHERE r.show = 'Y'
             ORDER BY r.created_at DESC, r.id DESC
             OFFSET $1 LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(offset)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar("SELECT count(*) FROM samara.reviews WHERE show = 'Y'")
            .fetch_one(self.pool)
            .await?;

        let reviews = rows
            .into_iter()
            .map(Review::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((reviews, total))
    }

    /// Reviews for moderation, optionally filtered by subject and visibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_moderation(
        &self,
        search: Option<&str>,
        show: Option<YesNo>,
    ) -> Result<Vec<Review>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let sql = format!(
            "{REVIEW_SELECT}
             WHERE ($1::text IS NULL OR r.subject ILIKE $1)
               AND ($2::text IS NULL OR r.show = $2)
             ORDER BY r.created_at DESC, r.id DESC"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(pattern)
            .bind(show.map(YesNo::as_str))
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Review::try_from).collect()
    }

    /// Counts of all, visible and hidden reviews.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<ReviewStats, RepositoryError> {
        let row = sqlx::query_as::<_, StatsRow>(
            r"
            SELECT count(*) AS total,
                   count(*) FILTER (WHERE show = 'Y') AS show,
                   count(*) FILTER (WHERE show <> 'Y') AS hide
            FROM samara.reviews
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(ReviewStats {
            total: row.total,
            show: row.show,
            hide: row.hide,
        })
    }

    /// Show or hide a review.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no review has this ID,
    /// `RepositoryError::Database` if the query fails.
    pub async fn set_show(&self, id: ReviewId, show: YesNo) -> Result<Review, RepositoryError> {
        let result = sqlx::query("UPDATE samara.reviews SET show = $2 WHERE id = $1")
            .bind(id)
            .bind(show.as_str())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let sql = format!("{REVIEW_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, ReviewRow>(&sql)
            .bind(id)
            .fetch_one(self.pool)
            .await?;

        Review::try_from(row)
    }
}
