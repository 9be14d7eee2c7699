//! Staff authentication error types.

use thiserror::Error;

use samara_core::StaffRole;

use crate::db::RepositoryError;

/// Errors that can occur during staff authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password missing.
    #[error("username and password are required")]
    MissingCredentials,

    /// Username shorter than the minimum.
    #[error("username must be at least {min} characters")]
    UsernameTooShort { min: usize },

    /// Invalid credentials (wrong password or user not found).
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but lacks the role required for this login.
    #[error("Unauthorized: not {} user", with_article(*.0))]
    WrongRole(StaffRole),

    /// Username already taken.
    #[error("username already exists")]
    UserAlreadyExists,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

const fn with_article(role: StaffRole) -> &'static str {
    match role {
        StaffRole::Admin => "an admin",
        StaffRole::Delivery => "a delivery",
    }
}
