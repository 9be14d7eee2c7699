//! Loyalty wallet.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::WalletRepository;
use crate::db::wallet::Deduction;
use crate::error::{AppError, Result};
use crate::routes::require_user_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeductBody {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub deduct: Option<Value>,
}

/// Read a positive whole number of points. `300.0` counts as whole.
fn positive_points(value: Option<&Value>) -> Option<i32> {
    let n = value?.as_f64()?;
    if n <= 0.0 || n.fract() != 0.0 || n > f64::from(i32::MAX) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    let points = n as i32;
    Some(points)
}

/// Get a customer's points balance.
#[instrument(skip(state))]
pub async fn balance(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    let points = WalletRepository::new(state.pool()).balance(user_id).await?;

    Ok(Json(json!({ "points": points })))
}

/// Spend points from a customer's wallet.
#[instrument(skip(state))]
pub async fn deduct(
    State(state): State<AppState>,
    Json(body): Json<DeductBody>,
) -> Result<Json<Value>> {
    let required = || AppError::bad_request("userId and positive deduct amount are required");
    let points = positive_points(body.deduct.as_ref()).ok_or_else(required)?;
    let user_id = body
        .user_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(required)
        .and_then(|raw| require_user_id(Some(raw)))?;

    match WalletRepository::new(state.pool())
        .deduct(user_id, points)
        .await?
    {
        Deduction::Applied(balance) => {
            tracing::info!(points, balance, "Wallet points deducted");
            Ok(Json(json!({ "points": balance })))
        }
        Deduction::Insufficient => Err(AppError::bad_request("Insufficient points")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_positive_points() {
        assert_eq!(positive_points(Some(&json!(300))), Some(300));
        assert_eq!(positive_points(Some(&json!(300.0))), Some(300));
        assert_eq!(positive_points(Some(&json!(0))), None);
        assert_eq!(positive_points(Some(&json!(-5))), None);
        assert_eq!(positive_points(Some(&json!(2.5))), None);
        assert_eq!(positive_points(Some(&json!("300"))), None);
        assert_eq!(positive_points(None), None);
    }
}
