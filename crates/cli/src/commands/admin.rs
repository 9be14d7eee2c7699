//! Staff account management commands.
//!
//! # Usage
//!
//! ```bash
//! samara-cli admin create -u nadia -p 'long-secret' -r admin
//! ```
//!
//! # Environment Variables
//!
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string

use samara_core::{StaffRole, StaffUserId};
use samara_storefront::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during staff operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: admin, delivery")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new staff account.
///
/// # Arguments
///
/// * `username` - Sign-in name
/// * `password` - Plain-text password, hashed before storage
/// * `role` - `admin` or `delivery`
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns an error for an unknown role, invalid credentials, a taken
/// username, or a database failure.
pub async fn create_user(
    username: &str,
    password: &str,
    role: &str,
) -> Result<StaffUserId, AdminError> {
    // Parse and validate role before connecting
    let role: StaffRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;

    tracing::info!("Creating staff account: {} ({})", username.trim(), role);
    let user = AuthService::new(&pool)
        .create_staff(username, password, role)
        .await?;

    tracing::info!(
        "Staff account created successfully! ID: {}, Username: {}, Role: {}",
        user.id,
        user.username,
        user.role
    );
    Ok(user.id)
}
