//! `OpenAI` chat-completions client.

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use crate::config::OpenAiConfig;

/// Errors that can occur when interacting with the `OpenAI` API.
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The completion had no choices.
    #[error("empty completion")]
    EmptyCompletion,

    /// Client could not be built from configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    role: ChatRole,
    #[serde(default)]
    content: Option<String>,
}

/// `OpenAI` API client.
#[derive(Clone)]
pub struct OpenAiClient {
    inner: Arc<OpenAiClientInner>,
}

struct OpenAiClientInner {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OpenAiClient {
    /// Create a new `OpenAI` client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &OpenAiConfig) -> Result<Self, OpenAiError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key.expose_secret()))
            .map_err(|e| OpenAiError::Config(format!("invalid API key: {e}")))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(OpenAiClientInner {
                client,
                api_url: config.api_url.clone(),
                model: config.model.clone(),
            }),
        })
    }

    /// Run a chat completion and return the first reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the API answers with an error,
    /// or the completion carries no choices.
    #[instrument(
        skip(self, messages),
        fields(model = %self.inner.model, messages = messages.len())
    )]
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatMessage, OpenAiError> {
        let request = CompletionRequest {
            model: &self.inner.model,
            messages,
        };

        let url = format!("{}/chat/completions", self.inner.api_url);
        let response = self.inner.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::String(text));
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("request failed")
                .to_owned();
            return Err(OpenAiError::Api {
                status: status.as_u16(),
                message,
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::Parse(e.to_string()))?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .ok_or(OpenAiError::EmptyCompletion)?
            .message;

        Ok(ChatMessage {
            role: reply.role,
            content: reply.content.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_serialize_lowercase() {
        let msg = ChatMessage::system("hi");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "system");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: Result<ChatMessage, _> =
            serde_json::from_str(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_completion_response_parses_null_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let parsed: CompletionResponse = serde_json::from_str(json).unwrap();
        let reply = &parsed.choices[0].message;
        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.content.is_none());
    }
}
