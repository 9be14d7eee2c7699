//! `SumUp` checkout API client.
//!
//! Creates hosted checkouts, submits card details against them, and reads
//! their status back. Card numbers and CVVs travel as [`SecretString`] and are
//! only exposed while the request body is being built.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use samara_core::{CurrencyCode, PaymentStatus};

use crate::config::SumUpConfig;

/// Length of the random suffix on generated checkout references.
const REFERENCE_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors that can occur when talking to `SumUp`.
#[derive(Debug, Error)]
pub enum SumUpError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `SumUp` answered with a non-success status and a JSON body.
    #[error("API error: {status}")]
    Api { status: u16, body: Value },

    /// `SumUp` answered with something that is not JSON.
    #[error("invalid response ({status}): {raw}")]
    InvalidResponse { status: u16, raw: String },

    /// Client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Parameters for a new checkout.
#[derive(Debug, Clone)]
pub struct NewCheckout {
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub description: String,
    /// Merchant-side reference; generated when absent.
    pub checkout_reference: Option<String>,
}

/// Card details submitted against a checkout.
pub struct CardDetails {
    pub name: String,
    pub number: SecretString,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: SecretString,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("name", &self.name)
            .field("number", &"[REDACTED]")
            .field("expiry_month", &self.expiry_month)
            .field("expiry_year", &self.expiry_year)
            .field("cvv", &"[REDACTED]")
            .finish()
    }
}

/// A checkout as returned by `SumUp`.
///
/// Only the fields the storefront acts on are typed; everything else is kept
/// in `extra` so the object can be handed back to clients unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkout {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkout_reference: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Checkout {
    /// Parsed payment status, when `SumUp` reported a known one.
    #[must_use]
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    /// Best human-readable failure reason `SumUp` attached to the checkout.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        let from_transactions = self
            .extra
            .get("transactions")
            .and_then(Value::as_array)
            .and_then(|txs| txs.last())
            .and_then(|tx| tx.get("status").or_else(|| tx.get("message")))
            .and_then(Value::as_str);
        self.extra
            .get("message")
            .and_then(Value::as_str)
            .or(from_transactions)
            .map(str::to_owned)
    }
}

#[derive(Serialize)]
struct CreateCheckoutBody<'a> {
    checkout_reference: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
    currency: &'a str,
    merchant_code: &'a str,
    description: &'a str,
    return_url: &'a str,
    redirect_url: &'a str,
    hosted_checkout: HostedCheckout,
}

#[derive(Serialize)]
struct HostedCheckout {
    enabled: bool,
}

/// `SumUp` API client.
#[derive(Clone)]
pub struct SumUpClient {
    inner: Arc<SumUpClientInner>,
}

struct SumUpClientInner {
    client: reqwest::Client,
    api_url: String,
    merchant_code: String,
    return_url: String,
}

impl SumUpClient {
    /// Create a new `SumUp` client.
    ///
    /// # Errors
    ///
    /// Returns error if the access token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &SumUpConfig) -> Result<Self, SumUpError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!(
            "Bearer {}",
            config.access_token.expose_secret()
        ))
        .map_err(|e| SumUpError::Config(format!("invalid access token: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(SumUpClientInner {
                client,
                api_url: config.api_url.clone(),
                merchant_code: config.merchant_code.clone(),
                return_url: config.return_url.clone(),
            }),
        })
    }

    /// Create a hosted checkout.
    ///
    /// Returns the checkout together with the status `SumUp` answered with.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or `SumUp` rejects the checkout.
    #[instrument(skip(self), fields(amount = %checkout.amount))]
    pub async fn create_checkout(
        &self,
        checkout: &NewCheckout,
    ) -> Result<(StatusCode, Checkout), SumUpError> {
        let reference = checkout
            .checkout_reference
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(generate_reference);

        let body = CreateCheckoutBody {
            checkout_reference: &reference,
            amount: checkout.amount,
            currency: checkout.currency.code(),
            merchant_code: &self.inner.merchant_code,
            description: &checkout.description,
            return_url: &self.inner.return_url,
            redirect_url: &self.inner.return_url,
            hosted_checkout: HostedCheckout { enabled: true },
        };

        let url = format!("{}/v0.1/checkouts", self.inner.api_url);
        let response = self.inner.client.post(&url).json(&body).send().await?;
        let (status, value) = read_json(response).await?;
        let parsed = parse_checkout(status, value)?;

        tracing::info!(checkout_id = %parsed.id, reference = %reference, "SumUp checkout created");
        Ok((status, parsed))
    }

    /// Submit card details against a checkout.
    ///
    /// Returns the raw JSON `SumUp` answered with.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or `SumUp` rejects the payment.
    #[instrument(skip(self, card))]
    pub async fn process_checkout(
        &self,
        checkout_id: &str,
        card: &CardDetails,
    ) -> Result<Value, SumUpError> {
        let body = serde_json::json!({
            "payment_type": "card",
            "card": {
                "name": card.name,
                "number": card.number.expose_secret(),
                "expiry_month": card.expiry_month,
                "expiry_year": card.expiry_year,
                "cvv": card.cvv.expose_secret(),
            }
        });

        let url = self.checkout_url(checkout_id);
        let response = self.inner.client.put(&url).json(&body).send().await?;
        let (_, value) = read_json(response).await?;
        Ok(value)
    }

    /// Fetch a checkout by ID.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or `SumUp` does not know the checkout.
    #[instrument(skip(self))]
    pub async fn get_checkout(&self, checkout_id: &str) -> Result<Value, SumUpError> {
        let url = self.checkout_url(checkout_id);
        let response = self.inner.client.get(&url).send().await?;
        let (_, value) = read_json(response).await?;
        Ok(value)
    }

    /// Fetch a checkout and parse it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_checkout`], plus [`SumUpError::InvalidResponse`]
    /// when the body is not a checkout object.
    pub async fn checkout_status(&self, checkout_id: &str) -> Result<Checkout, SumUpError> {
        let value = self.get_checkout(checkout_id).await?;
        parse_checkout(StatusCode::OK, value)
    }

    fn checkout_url(&self, checkout_id: &str) -> String {
        format!(
            "{}/v0.1/checkouts/{}",
            self.inner.api_url,
            urlencoding::encode(checkout_id)
        )
    }
}

/// Parse a checkout object out of a JSON value.
///
/// # Errors
///
/// Returns [`SumUpError::InvalidResponse`] when the value lacks an `id`.
pub fn parse_checkout(status: StatusCode, value: Value) -> Result<Checkout, SumUpError> {
    serde_json::from_value(value.clone()).map_err(|_| SumUpError::InvalidResponse {
        status: status.as_u16(),
        raw: value.to_string(),
    })
}

/// Read a response body as JSON, turning error statuses into [`SumUpError::Api`].
async fn read_json(response: reqwest::Response) -> Result<(StatusCode, Value), SumUpError> {
    let status = response.status();
    let text = response.text().await?;

    let value: Value = serde_json::from_str(&text).map_err(|_| {
        tracing::warn!(status = %status, "SumUp returned a non-JSON body");
        SumUpError::InvalidResponse {
            status: status.as_u16(),
            raw: text.clone(),
        }
    })?;

    if !status.is_success() {
        tracing::warn!(status = %status, "SumUp returned an error");
        return Err(SumUpError::Api {
            status: status.as_u16(),
            body: value,
        });
    }

    Ok((status, value))
}

/// Generate a checkout reference: `REF-<unix millis>-<6 uppercase base-36 chars>`.
#[must_use]
pub fn generate_reference() -> String {
    use rand::seq::IndexedRandom;

    let millis = chrono::Utc::now().timestamp_millis();
    let mut rng = rand::rng();
    let suffix: String = (0..REFERENCE_SUFFIX_LEN)
        .filter_map(|_| BASE36.choose(&mut rng).copied().map(char::from))
        .collect();
    format!("REF-{millis}-{suffix}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_reference_shape() {
        let reference = generate_reference();
        let parts: Vec<&str> = reference.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "REF");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), REFERENCE_SUFFIX_LEN);
        assert!(
            parts[2]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_create_body_sends_amount_as_number() {
        let body = CreateCheckoutBody {
            checkout_reference: "REF-1",
            amount: Decimal::new(1250, 2),
            currency: "EUR",
            merchant_code: "M1",
            description: "Website Order",
            return_url: "https://samarashop.ie/payment-success",
            redirect_url: "https://samarashop.ie/payment-success",
            hosted_checkout: HostedCheckout { enabled: true },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["amount"], serde_json::json!(12.5));
        assert_eq!(json["hosted_checkout"]["enabled"], true);
    }

    #[test]
    fn test_checkout_keeps_unknown_fields() {
        let value = serde_json::json!({
            "id": "chk_1",
            "status": "PENDING",
            "amount": 12.5,
            "merchant_code": "M1"
        });
        let checkout = parse_checkout(StatusCode::OK, value).unwrap();
        assert_eq!(checkout.payment_status(), Some(PaymentStatus::Pending));

        let back = serde_json::to_value(&checkout).unwrap();
        assert_eq!(back["amount"], serde_json::json!(12.5));
        assert_eq!(back["merchant_code"], "M1");
    }

    #[test]
    fn test_parse_checkout_without_id_is_invalid() {
        let err =
            parse_checkout(StatusCode::OK, serde_json::json!({"status": "PAID"})).unwrap_err();
        assert!(matches!(err, SumUpError::InvalidResponse { status: 200, .. }));
    }

    #[test]
    fn test_failure_message_prefers_top_level_message() {
        let checkout: Checkout = serde_json::from_value(serde_json::json!({
            "id": "chk_1",
            "status": "FAILED",
            "message": "Card declined",
            "transactions": [{"status": "FAILED"}]
        }))
        .unwrap();
        assert_eq!(checkout.failure_message().as_deref(), Some("Card declined"));
    }

    #[test]
    fn test_card_details_debug_redacts() {
        let card = CardDetails {
            name: "A Customer".into(),
            number: SecretString::from("4111111111111111"),
            expiry_month: "12".into(),
            expiry_year: "30".into(),
            cvv: SecretString::from("123"),
        };
        let debug = format!("{card:?}");
        assert!(!debug.contains("4111111111111111"));
        assert!(!debug.contains("123\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
