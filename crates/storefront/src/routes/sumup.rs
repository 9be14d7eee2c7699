//! `SumUp` payment gateway proxy.
//!
//! The browser never sees the `SumUp` API key; it creates checkouts and
//! submits cards through these endpoints instead.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::CurrencyCode;

use crate::error::{AppError, Result};
use crate::services::checkout::CHECKOUT_DESCRIPTION;
use crate::services::sumup::{CardDetails, NewCheckout, SumUpError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCheckoutBody {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub checkout_reference: Option<String>,
}

/// Card fields as posted by the payment form.
#[derive(Deserialize)]
pub struct CardInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub expiry_month: String,
    #[serde(default)]
    pub expiry_year: String,
    #[serde(default)]
    pub cvv: String,
}

impl From<CardInput> for CardDetails {
    fn from(card: CardInput) -> Self {
        Self {
            name: card.name,
            number: SecretString::from(card.number),
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            cvv: SecretString::from(card.cvv),
        }
    }
}

#[derive(Deserialize)]
pub struct ProcessCheckoutBody {
    #[serde(default)]
    pub payment_type: Option<String>,
    pub card: Option<CardInput>,
}

#[derive(Debug, Deserialize)]
pub struct CheckCheckoutBody {
    #[serde(default)]
    pub checkout_id: Option<String>,
}

/// Read a checkout amount: a JSON number greater than zero.
fn checkout_amount(value: Option<&Value>) -> Option<Decimal> {
    let Value::Number(n) = value? else {
        return None;
    };
    let amount = n
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok()))?;
    (amount > Decimal::ZERO).then_some(amount)
}

/// Create a hosted checkout.
#[instrument(skip(state))]
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(body): Json<CreateCheckoutBody>,
) -> Result<Response> {
    let amount = checkout_amount(body.amount.as_ref())
        .ok_or_else(|| AppError::bad_request("Invalid amount"))?;
    let currency = match body.currency.as_deref() {
        Some(code) => code.parse::<CurrencyCode>().map_err(AppError::BadRequest)?,
        None => CurrencyCode::EUR,
    };

    let request = NewCheckout {
        amount,
        currency,
        description: body
            .description
            .unwrap_or_else(|| CHECKOUT_DESCRIPTION.to_owned()),
        checkout_reference: body.checkout_reference,
    };
    let (status, checkout) = state.sumup().create_checkout(&request).await?;

    Ok((status, Json(checkout)).into_response())
}

/// Pay a checkout by card.
#[instrument(skip(state, body))]
pub async fn process_checkout(
    State(state): State<AppState>,
    Path(checkout_id): Path<String>,
    Json(body): Json<ProcessCheckoutBody>,
) -> Result<Json<Value>> {
    if body.payment_type.as_deref().is_some_and(|t| t != "card") {
        return Err(AppError::bad_request("Only card payments are supported"));
    }
    let card: CardDetails = body
        .card
        .ok_or_else(|| AppError::bad_request("Card details are required"))?
        .into();

    let result = state.sumup().process_checkout(&checkout_id, &card).await?;
    Ok(Json(result))
}

/// Look up a checkout.
#[instrument(skip(state))]
pub async fn check_checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckCheckoutBody>,
) -> Response {
    let Some(checkout_id) = body
        .checkout_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "checkout_id is required" })),
        )
            .into_response();
    };

    match state.sumup().get_checkout(checkout_id).await {
        Ok(data) => Json(json!({ "success": true, "data": data })).into_response(),
        Err(SumUpError::Api { status, body }) => {
            let message = body
                .get("message")
                .or_else(|| body.get("error_message"))
                .cloned()
                .unwrap_or(body);
            (
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Json(json!({ "success": false, "error": message })),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, checkout_id, "SumUp checkout lookup failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "success": false, "error": "Payment gateway unavailable" })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_amount() {
        assert_eq!(
            checkout_amount(Some(&json!(12.5))),
            Some(Decimal::new(125, 1))
        );
        assert_eq!(checkout_amount(Some(&json!(3))), Some(Decimal::from(3)));
        assert_eq!(checkout_amount(Some(&json!(0))), None);
        assert_eq!(checkout_amount(Some(&json!(-4.2))), None);
        assert_eq!(checkout_amount(Some(&json!("12.50"))), None);
        assert_eq!(checkout_amount(None), None);
    }
}
