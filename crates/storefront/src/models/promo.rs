//! Promo codes.

use chrono::{DateTime, Utc};

use samara_core::{PromoCodeId, YesNo};

/// A promo code row.
#[derive(Debug, Clone)]
pub struct PromoCode {
    pub id: PromoCodeId,
    pub code: String,
    /// Percentage off the subtotal (1..=100).
    pub discount_value: u8,
    pub active: YesNo,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
}

/// Why a promo code cannot be used right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PromoRejection {
    #[error("Invalid promo code")]
    Unknown,
    #[error("This promo code is no longer active")]
    Inactive,
    #[error("This promo code is not valid yet")]
    NotStarted,
    #[error("This promo code has expired")]
    Expired,
    #[error("This promo code has reached its usage limit")]
    Exhausted,
}

impl PromoCode {
    /// Check whether the code can be redeemed at `now`, given how many paid
    /// orders already used it.
    ///
    /// # Errors
    ///
    /// Returns the first [`PromoRejection`] that applies.
    pub fn check_redeemable(&self, now: DateTime<Utc>, uses: i64) -> Result<(), PromoRejection> {
        if !self.active.is_yes() {
            return Err(PromoRejection::Inactive);
        }
        if self.starts_at.is_some_and(|start| now < start) {
            return Err(PromoRejection::NotStarted);
        }
        if self.expires_at.is_some_and(|end| now >= end) {
            return Err(PromoRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| uses >= i64::from(max)) {
            return Err(PromoRejection::Exhausted);
        }
        Ok(())
    }
}
