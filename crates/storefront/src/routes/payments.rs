//! Payment confirmations and reconciliation with `SumUp`.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::{ConfirmationId, PaymentStatus};

use crate::db::{ConfirmationRepository, RepositoryError};
use crate::error::Result;
use crate::models::{NewPaymentConfirmation, PaymentConfirmation};
use crate::routes::require_user_id;
use crate::state::AppState;

/// Status reported when `SumUp` could not be asked about a checkout.
const UNKNOWN_STATUS: &str = "UNKNOWN";

#[derive(Debug, Deserialize)]
pub struct ReconcileBody {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
}

/// Outcome for one pending confirmation.
#[derive(Debug, Serialize)]
pub struct ReconcileResult {
    pub id: ConfirmationId,
    pub checkout_id: String,
    pub status: String,
}

fn confirmation_rejected(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}

/// Record a payment confirmation for a gateway checkout.
///
/// Takes the raw payload so malformed fields get the same error shape as
/// failed inserts.
#[instrument(skip_all)]
pub async fn record_confirmation(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    let new: NewPaymentConfirmation = match serde_json::from_value(body) {
        Ok(new) => new,
        Err(e) => return confirmation_rejected(e.to_string()),
    };

    match ConfirmationRepository::new(state.pool()).create(&new).await {
        Ok(row) => {
            tracing::info!(
                confirmation_id = %row.id,
                checkout_id = ?row.checkout_id,
                status = %row.status,
                "Payment confirmation recorded"
            );
            Json(json!({ "success": true, "data": [row] })).into_response()
        }
        Err(RepositoryError::DataCorruption(msg)) => confirmation_rejected(msg),
        Err(e) => {
            tracing::error!(
                error = %e,
                checkout_id = ?new.checkout_id,
                "Failed to record payment confirmation"
            );
            confirmation_rejected("Failed to record payment confirmation")
        }
    }
}

/// Ask `SumUp` about one confirmation and mark it paid if it was.
async fn reconcile_one(
    state: &AppState,
    confirmation: PaymentConfirmation,
) -> Option<ReconcileResult> {
    let checkout_id = confirmation.checkout_id.filter(|id| !id.is_empty())?;

    let status = match state.sumup().checkout_status(&checkout_id).await {
        Ok(checkout) if checkout.payment_status() == Some(PaymentStatus::Paid) => {
            match ConfirmationRepository::new(state.pool())
                .mark_paid(confirmation.id)
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        confirmation_id = %confirmation.id,
                        %checkout_id,
                        "Pending payment settled"
                    );
                    PaymentStatus::Paid.as_str().to_owned()
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        confirmation_id = %confirmation.id,
                        %checkout_id,
                        "Failed to mark payment as paid"
                    );
                    UNKNOWN_STATUS.to_owned()
                }
            }
        }
        Ok(checkout) => checkout
            .status
            .unwrap_or_else(|| UNKNOWN_STATUS.to_owned()),
        Err(e) => {
            tracing::warn!(error = %e, %checkout_id, "SumUp status lookup failed");
            UNKNOWN_STATUS.to_owned()
        }
    };

    Some(ReconcileResult {
        id: confirmation.id,
        checkout_id,
        status,
    })
}

/// Settle today's pending confirmations against `SumUp`.
#[instrument(skip(state))]
pub async fn reconcile(
    State(state): State<AppState>,
    Json(body): Json<ReconcileBody>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(body.user_id.as_deref())?;
    let pending = ConfirmationRepository::new(state.pool())
        .pending_today(user_id)
        .await?;

    let results: Vec<ReconcileResult> =
        join_all(pending.into_iter().map(|row| reconcile_one(&state, row)))
            .await
            .into_iter()
            .flatten()
            .collect();

    Ok(Json(json!({ "results": results })))
}
