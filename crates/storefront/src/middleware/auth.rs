//! Staff authentication extractors and session helpers.
//!
//! Dashboard routes take [`RequireAdmin`]; courier routes take
//! [`RequireDelivery`]. Both read the identity stored by the login handlers.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use samara_core::StaffRole;

use crate::models::{CurrentStaff, session_keys};
use crate::services::auth::AuthError;

/// Extractor that requires an `admin` session.
///
/// # Example
///
/// ```rust,ignore
/// async fn list_users(RequireAdmin(staff): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", staff.username)
/// }
/// ```
pub struct RequireAdmin(pub CurrentStaff);

/// Extractor that requires a `delivery` session.
pub struct RequireDelivery(pub CurrentStaff);

/// Error returned when a staff session is missing or has the wrong role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// No staff member is signed in.
    Unauthorized,
    /// Signed in with a different role.
    Forbidden(StaffRole),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Not logged in" })),
            )
                .into_response(),
            Self::Forbidden(role) => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": AuthError::WrongRole(role).to_string() })),
            )
                .into_response(),
        }
    }
}

/// Read the staff identity from the session and check its role.
async fn staff_with_role(parts: &Parts, role: StaffRole) -> Result<CurrentStaff, AuthRejection> {
    // Get the session from extensions (set by SessionManagerLayer)
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::Unauthorized)?;

    let staff: CurrentStaff = session
        .get(session_keys::CURRENT_STAFF)
        .await
        .ok()
        .flatten()
        .ok_or(AuthRejection::Unauthorized)?;

    if staff.role != role {
        return Err(AuthRejection::Forbidden(role));
    }

    sentry::configure_scope(|scope| {
        scope.set_tag("staff_role", staff.role.to_string());
    });
    Ok(staff)
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        staff_with_role(parts, StaffRole::Admin).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireDelivery
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        staff_with_role(parts, StaffRole::Delivery).await.map(Self)
    }
}

/// Helper to set the signed-in staff member in the session.
///
/// The session ID is cycled first so a pre-login cookie cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_staff(
    session: &Session,
    staff: &CurrentStaff,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_STAFF, staff).await
}

/// Helper to clear the signed-in staff member from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_staff(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentStaff>(session_keys::CURRENT_STAFF)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    #[tokio::test]
    async fn test_missing_session_is_unauthorized() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/admin/reviews")
            .body(())
            .unwrap()
            .into_parts();

        let rejection = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection, AuthRejection::Unauthorized);
        assert_eq!(
            rejection.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    fn parts_with_session(session: Session) -> Parts {
        let (mut parts, ()) = Request::builder()
            .uri("/api/delivery/update")
            .body(())
            .unwrap()
            .into_parts();
        parts.extensions.insert(session);
        parts
    }

    fn courier() -> CurrentStaff {
        CurrentStaff {
            id: samara_core::StaffUserId::new(7),
            username: "karim".into(),
            role: StaffRole::Delivery,
        }
    }

    #[tokio::test]
    async fn test_role_checked_against_session() {
        let store = std::sync::Arc::new(tower_sessions::MemoryStore::default());
        let session = Session::new(None, store, None);
        session
            .insert(session_keys::CURRENT_STAFF, courier())
            .await
            .unwrap();

        let mut parts = parts_with_session(session.clone());
        let RequireDelivery(staff) = RequireDelivery::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(staff, courier());

        let mut parts = parts_with_session(session.clone());
        let rejection = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection, AuthRejection::Forbidden(StaffRole::Admin));

        clear_current_staff(&session).await.unwrap();
        let mut parts = parts_with_session(session);
        let rejection = RequireDelivery::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection, AuthRejection::Unauthorized);
    }

    #[test]
    fn test_forbidden_status() {
        let response = AuthRejection::Forbidden(StaffRole::Delivery).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
