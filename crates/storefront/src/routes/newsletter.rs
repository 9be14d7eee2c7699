//! Newsletter sign-up via Resend.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::Email;

use crate::error::{AppError, Result};
use crate::services::resend::ResendError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

/// Add an email address to the newsletter audience.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(body): Json<SubscribeBody>,
) -> Result<Json<Value>> {
    let email = Email::parse(&body.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let resend = state
        .resend()
        .ok_or_else(|| ResendError::Config("RESEND_API_KEY is not set".to_owned()))?;

    let data = resend
        .create_contact(&email, body.first_name.as_deref())
        .await?;

    tracing::info!(domain = %email.domain(), "Newsletter subscription created");
    Ok(Json(json!({ "success": true, "data": data })))
}
