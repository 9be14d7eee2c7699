//! Delivery cities.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::CityRepository;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// List cities inside delivery coverage.
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> Result<Json<Value>> {
    let cities = CityRepository::new(state.pool())
        .list_active()
        .await
        .map_err(|e| AppError::query("Failed to fetch cities", e))?;

    Ok(Json(json!({ "cities": cities })))
}
