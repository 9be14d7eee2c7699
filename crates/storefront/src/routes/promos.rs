//! Promo code and charity discount checks.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::PromoRepository;
use crate::error::{AppError, Result};
use crate::routes::require_user_id;
use crate::services::checkout::{CheckoutError, redeemable_promo};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CharityQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Check whether a promo code can be used right now.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<Value>> {
    let code = query
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::bad_request("Promo code is required"))?;

    match redeemable_promo(state.pool(), code).await {
        Ok(promo) => Ok(Json(json!({
            "valid": true,
            "discount_value": promo.discount_value,
            "message": format!("Promo code applied! {}% off", promo.discount_value),
        }))),
        Err(CheckoutError::Promo(rejection)) => Ok(Json(json!({
            "valid": false,
            "message": rejection.to_string(),
        }))),
        Err(e) => Err(e.into()),
    }
}

/// Check whether a customer gets the charity discount.
#[instrument(skip(state))]
pub async fn check_charity(
    State(state): State<AppState>,
    Query(query): Query<CharityQuery>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    let eligible = PromoRepository::new(state.pool())
        .is_charity_beneficiary(user_id)
        .await?;

    let message = if eligible {
        "Charity discount applied"
    } else {
        "You are not eligible for charity discount"
    };
    Ok(Json(json!({ "eligible": eligible, "message": message })))
}
