//! Customer reviews.

use chrono::{DateTime, Utc};
use serde::Serialize;

use samara_core::{CustomerId, ReviewId, YesNo};

/// Public profile fields shown next to a review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewAuthor {
    pub full_name: Option<String>,
    pub image: Option<String>,
}

/// A review with its author.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: CustomerId,
    pub rating: i32,
    pub comment: String,
    pub subject: Option<String>,
    pub show: YesNo,
    pub created_at: DateTime<Utc>,
    pub author: ReviewAuthor,
}

/// Counts shown on the moderation dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReviewStats {
    pub total: i64,
    pub show: i64,
    pub hide: i64,
}
