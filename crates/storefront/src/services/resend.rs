//! Resend contacts API client for newsletter signups.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use samara_core::Email;

use crate::config::ResendConfig;

/// Resend API base URL.
const BASE_URL: &str = "https://api.resend.com";

/// Errors that can occur when interacting with the Resend API.
#[derive(Debug, Error)]
pub enum ResendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },

    /// Client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Serialize)]
struct NewContact<'a> {
    email: &'a str,
    first_name: Option<&'a str>,
    last_name: &'a str,
    unsubscribed: bool,
}

/// Resend API client.
#[derive(Clone)]
pub struct ResendClient {
    client: reqwest::Client,
    audience_id: String,
}

impl ResendClient {
    /// Create a new Resend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ResendConfig) -> Result<Self, ResendError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|e| ResendError::Config(format!("Invalid API key format: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            audience_id: config.audience_id.clone(),
        })
    }

    /// Add a subscribed contact to the configured audience.
    ///
    /// Returns the JSON Resend answered with (`{"object":"contact","id":…}`).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or Resend rejects the contact.
    #[instrument(skip(self, email), fields(domain = %email.domain()))]
    pub async fn create_contact(
        &self,
        email: &Email,
        first_name: Option<&str>,
    ) -> Result<Value, ResendError> {
        let url = format!(
            "{BASE_URL}/audiences/{}/contacts",
            urlencoding::encode(&self.audience_id)
        );
        let body = NewContact {
            email: email.as_str(),
            first_name: first_name.map(str::trim).filter(|n| !n.is_empty()),
            last_name: "",
            unsubscribed: false,
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        let value: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            let message = value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Failed to create contact")
                .to_owned();
            tracing::warn!(status = %status, error = %message, "Resend contact creation failed");
            return Err(ResendError::Api {
                status: status.as_u16(),
                message,
                body: value,
            });
        }

        tracing::info!("Newsletter contact created");
        Ok(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_contact_body() {
        let body = NewContact {
            email: "user@example.com",
            first_name: None,
            last_name: "",
            unsubscribed: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["email"], "user@example.com");
        assert!(json["first_name"].is_null());
        assert_eq!(json["unsubscribed"], false);
    }

    #[test]
    fn test_api_error_displays_upstream_message() {
        let err = ResendError::Api {
            status: 422,
            message: "Invalid `email` field".into(),
            body: Value::Null,
        };
        assert_eq!(err.to_string(), "Invalid `email` field");
    }
}
