//! Customer reviews and their moderation.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::{ReviewId, YesNo};

use crate::db::{RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Review, ReviewAuthor};
use crate::state::AppState;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PAGE_SIZE: i64 = 8;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

impl PageQuery {
    /// `(offset, limit)` for the requested page.
    fn window(&self) -> (i64, i64) {
        let parse = |raw: Option<&str>, default: i64| {
            raw.and_then(|s| s.trim().parse::<i64>().ok())
                .filter(|n| *n >= 1)
                .unwrap_or(default)
        };
        let page = parse(self.page.as_deref(), DEFAULT_PAGE);
        let size = parse(self.page_size.as_deref(), DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
        ((page - 1).saturating_mul(size), size)
    }
}

/// A review as shown on the public review wall.
#[derive(Debug, Serialize)]
pub struct PublicReview<'a> {
    pub id: ReviewId,
    pub rating: i32,
    pub comment: &'a str,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub app_users: &'a ReviewAuthor,
}

impl<'a> From<&'a Review> for PublicReview<'a> {
    fn from(review: &'a Review) -> Self {
        Self {
            id: review.id,
            rating: review.rating,
            comment: &review.comment,
            created_at: review.created_at,
            app_users: &review.author,
        }
    }
}

/// Visible reviews, newest first.
#[instrument(skip(state))]
pub async fn visible(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>> {
    let (offset, limit) = query.window();
    let (reviews, total) = ReviewRepository::new(state.pool())
        .visible_page(offset, limit)
        .await
        .map_err(|e| AppError::query("Failed to fetch reviews", e))?;

    let reviews: Vec<PublicReview<'_>> = reviews.iter().map(PublicReview::from).collect();
    Ok(Json(json!({ "reviews": reviews, "total": total })))
}

#[derive(Debug, Deserialize)]
pub struct ModerationQuery {
    pub search: Option<String>,
    pub show: Option<String>,
}

/// Reviews for the moderation dashboard, with visibility counts.
#[instrument(skip_all)]
pub async fn moderation_list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ModerationQuery>,
) -> Result<Json<Value>> {
    let show = query
        .show
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<YesNo>)
        .transpose()
        .map_err(|_| AppError::bad_request("show must be Y or N"))?;

    let repo = ReviewRepository::new(state.pool());
    let (reviews, stats) = futures::try_join!(
        repo.list_for_moderation(query.search.as_deref(), show),
        repo.stats(),
    )?;

    Ok(Json(json!({ "reviews": reviews, "stats": stats })))
}

#[derive(Debug, Deserialize)]
pub struct VisibilityBody {
    pub show: Option<String>,
}

/// Show or hide a review.
#[instrument(skip_all, fields(admin = %admin.username, review_id = id))]
pub async fn set_visibility(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<VisibilityBody>,
) -> Result<Json<Value>> {
    let show = body
        .show
        .as_deref()
        .and_then(|s| s.parse::<YesNo>().ok())
        .ok_or_else(|| AppError::bad_request("show must be Y or N"))?;

    let review = ReviewRepository::new(state.pool())
        .set_show(ReviewId::new(id), show)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Review not found".to_owned()),
            other => AppError::Database(other),
        })?;

    tracing::info!(show = show.as_str(), "Review visibility changed");
    Ok(Json(json!({ "review": review })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, size: Option<&str>) -> PageQuery {
        PageQuery {
            page: page.map(str::to_owned),
            page_size: size.map(str::to_owned),
        }
    }

    #[test]
    fn test_default_window() {
        assert_eq!(query(None, None).window(), (0, 8));
    }

    #[test]
    fn test_window_for_later_pages() {
        assert_eq!(query(Some("3"), Some("10")).window(), (20, 10));
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        assert_eq!(query(Some("abc"), Some("0")).window(), (0, 8));
        assert_eq!(query(Some("-2"), Some("x")).window(), (0, 8));
    }

    #[test]
    fn test_page_size_capped() {
        assert_eq!(query(Some("2"), Some("500")).window(), (100, 100));
    }
}
