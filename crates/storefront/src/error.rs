//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Errors render as `{"error": <message>, "details": <optional>}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::chat::ChatError;
use crate::services::checkout::CheckoutError;
use crate::services::openai::OpenAiError;
use crate::services::resend::ResendError;
use crate::services::sumup::SumUpError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Database operation failed; `context` is what the client sees.
    #[error("{context}: {source}")]
    Query {
        context: &'static str,
        source: RepositoryError,
    },

    /// `SumUp` API operation failed.
    #[error("SumUp error: {0}")]
    SumUp(#[from] SumUpError),

    /// `OpenAI` API operation failed.
    #[error("OpenAI error: {0}")]
    OpenAi(#[from] OpenAiError),

    /// Shopping assistant failed.
    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    /// Resend API operation failed.
    #[error("Resend error: {0}")]
    Resend(#[from] ResendError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but lacks the required role.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request conflicts with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a repository error with the message the client should see.
    #[must_use]
    pub const fn query(context: &'static str, source: RepositoryError) -> Self {
        Self::Query { context, source }
    }

    /// Shorthand for [`AppError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    fn with_details(error: impl Into<String>, details: Value) -> Self {
        Self {
            error: error.into(),
            details: Some(details),
        }
    }
}

const INTERNAL: &str = "Internal server error";

fn repository_response(err: &RepositoryError) -> (StatusCode, ErrorBody) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, ErrorBody::new("Not found")),
        RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new(msg.clone())),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL))
        }
    }
}

fn sumup_response(err: &SumUpError) -> (StatusCode, ErrorBody) {
    match err {
        SumUpError::Api { status, body } => (
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
            ErrorBody::with_details("SumUp error", body.clone()),
        ),
        SumUpError::InvalidResponse { raw, .. } => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::with_details("Invalid response from SumUp", Value::String(raw.clone())),
        ),
        SumUpError::Http(_) => (
            StatusCode::BAD_GATEWAY,
            ErrorBody::new("Payment gateway unavailable"),
        ),
        SumUpError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL)),
    }
}

fn openai_details(err: &OpenAiError) -> Value {
    match err {
        OpenAiError::Api { message, .. } => Value::String(message.clone()),
        other => Value::String(other.to_string()),
    }
}

impl AppError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Query { context, source } => match source {
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(*context),
                ),
                other => repository_response(other),
            },
            Self::SumUp(err) => sumup_response(err),
            Self::OpenAi(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::with_details("OpenAI API error", openai_details(err)),
            ),
            Self::Chat(err) => {
                let details = match err {
                    ChatError::OpenAi(e) => openai_details(e),
                    ChatError::Catalog(_) => Value::String("catalog unavailable".to_owned()),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::with_details("OpenAI API error", details),
                )
            }
            Self::Resend(err) => match err {
                ResendError::Api { message, .. } => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(message.clone()))
                }
                ResendError::Http(_) => (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody::new("Email service unavailable"),
                ),
                ResendError::Config(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Server configuration error"),
                ),
            },
            Self::Auth(err) => match err {
                AuthError::MissingCredentials | AuthError::UsernameTooShort { .. } => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
                }
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, ErrorBody::new(err.to_string()))
                }
                AuthError::WrongRole(_) => (StatusCode::FORBIDDEN, ErrorBody::new(err.to_string())),
                AuthError::UserAlreadyExists => {
                    (StatusCode::CONFLICT, ErrorBody::new(err.to_string()))
                }
                AuthError::Repository(e) => repository_response(e),
                AuthError::PasswordHash => {
                    (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL))
                }
            },
            Self::Checkout(err) => match err {
                CheckoutError::Validation(_)
                | CheckoutError::OutOfCoverage(_)
                | CheckoutError::Promo(_)
                | CheckoutError::CharityNotEligible
                | CheckoutError::Pricing(_) => {
                    (StatusCode::BAD_REQUEST, ErrorBody::new(err.to_string()))
                }
                CheckoutError::AddressNotFound => {
                    (StatusCode::NOT_FOUND, ErrorBody::new(err.to_string()))
                }
                CheckoutError::CheckoutNotCreated => {
                    (StatusCode::BAD_GATEWAY, ErrorBody::new(err.to_string()))
                }
                CheckoutError::PaymentFailed(_) | CheckoutError::PaymentIncomplete => {
                    (StatusCode::PAYMENT_REQUIRED, ErrorBody::new(err.to_string()))
                }
                CheckoutError::SumUp(e) => sumup_response(e),
                CheckoutError::Repository(e) => repository_response(e),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorBody::new(msg.clone())),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorBody::new(msg.clone())),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorBody::new(msg.clone())),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg.clone())),
            Self::Conflict(msg) => (StatusCode::CONFLICT, ErrorBody::new(msg.clone())),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody::new("Too many requests"),
            ),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(INTERNAL)),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for a signed-in staff member.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: username.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Card submitted", Some(&[("checkout_id", "abc")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use samara_core::StaffRole;
    use samara_core::checkout::PricingError;
    use serde_json::json;

    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_of(err: AppError) -> Value {
        let response = err.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order 12".to_string());
        assert_eq!(err.to_string(), "Not found: order 12");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            status_of(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::RateLimited), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            status_of(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_auth_and_checkout_statuses() {
        assert_eq!(
            status_of(AuthError::WrongRole(StaffRole::Delivery).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CheckoutError::PaymentIncomplete.into()),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(CheckoutError::Pricing(PricingError::CharityOverLimit).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CheckoutError::CheckoutNotCreated.into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn test_sumup_api_error_forwards_status_and_body() {
        let err = AppError::SumUp(SumUpError::Api {
            status: 409,
            body: json!({"error_code": "DUPLICATED_CHECKOUT"}),
        });
        assert_eq!(
            status_of(AppError::SumUp(SumUpError::Api {
                status: 409,
                body: json!({}),
            })),
            StatusCode::CONFLICT
        );

        let body = body_of(err).await;
        assert_eq!(body["error"], "SumUp error");
        assert_eq!(body["details"]["error_code"], "DUPLICATED_CHECKOUT");
    }

    #[tokio::test]
    async fn test_sumup_invalid_response_is_bad_gateway() {
        let err = AppError::SumUp(SumUpError::InvalidResponse {
            status: 200,
            raw: "<html>".into(),
        });
        assert_eq!(
            status_of(AppError::SumUp(SumUpError::InvalidResponse {
                status: 200,
                raw: String::new(),
            })),
            StatusCode::BAD_GATEWAY
        );
        let body = body_of(err).await;
        assert_eq!(body["error"], "Invalid response from SumUp");
        assert_eq!(body["details"], "<html>");
    }

    #[tokio::test]
    async fn test_query_error_hides_details() {
        let err = AppError::query(
            "Failed to fetch cities",
            RepositoryError::DataCorruption("cities.is_active: X".into()),
        );
        let body = body_of(err).await;
        assert_eq!(body, json!({"error": "Failed to fetch cities"}));
    }

    #[tokio::test]
    async fn test_resend_error_message_is_forwarded() {
        let err = AppError::Resend(ResendError::Api {
            status: 422,
            message: "Invalid `email` field".into(),
            body: json!({}),
        });
        let body = body_of(err).await;
        assert_eq!(body["error"], "Invalid `email` field");
    }
}
