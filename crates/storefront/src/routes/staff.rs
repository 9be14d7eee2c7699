//! Staff accounts and sign-in for the dashboard and couriers.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use samara_core::StaffRole;

use crate::db::StaffRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, RequireDelivery, clear_current_staff, set_current_staff};
use crate::models::CurrentStaff;
use crate::services::auth::AuthService;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CredentialsBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateStaffBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// List staff accounts.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let users = StaffRepository::new(state.pool()).list().await?;
    let users: Vec<Value> = users
        .iter()
        .map(|u| json!({ "id": u.id, "username": u.username, "role": u.role }))
        .collect();

    Ok(Json(json!({ "users": users })))
}

/// Create a staff account. The role defaults to `admin`.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateStaffBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let role = match body.role.as_deref().map(str::trim) {
        None | Some("") => StaffRole::Admin,
        Some(raw) => raw.parse::<StaffRole>().map_err(AppError::BadRequest)?,
    };

    let user = AuthService::new(state.pool())
        .create_staff(&body.username, &body.password, role)
        .await?;

    tracing::info!(
        user_id = %user.id,
        username = %user.username,
        role = %user.role,
        "Staff account created"
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": { "id": user.id, "username": user.username } })),
    ))
}

async fn login(
    state: &AppState,
    session: &Session,
    body: CredentialsBody,
    role: StaffRole,
) -> Result<Json<Value>> {
    let user = AuthService::new(state.pool())
        .login(&body.username, &body.password, Some(role))
        .await?;

    let staff = CurrentStaff::from(&user);
    set_current_staff(session, &staff)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store session: {e}")))?;
    set_sentry_user(&staff.id, Some(&staff.username));

    tracing::info!(user_id = %staff.id, role = %staff.role, "Staff signed in");
    Ok(Json(json!({
        "id": staff.id,
        "username": staff.username,
        "role": staff.role,
    })))
}

/// Dashboard sign-in.
#[instrument(skip_all)]
pub async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>> {
    login(&state, &session, body, StaffRole::Admin).await
}

/// Courier sign-in.
#[instrument(skip_all)]
pub async fn delivery_login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<CredentialsBody>,
) -> Result<Json<Value>> {
    login(&state, &session, body, StaffRole::Delivery).await
}

/// Sign out of either staff area.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<Value>> {
    clear_current_staff(&session)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to clear session: {e}")))?;
    clear_sentry_user();

    Ok(Json(json!({ "success": true })))
}

/// The signed-in courier.
#[instrument(skip_all)]
pub async fn delivery_session(RequireDelivery(staff): RequireDelivery) -> Json<CurrentStaff> {
    Json(staff)
}
