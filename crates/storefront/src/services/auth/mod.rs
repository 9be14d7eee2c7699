//! Staff authentication service.
//!
//! Dashboard admins and couriers sign in with a username and password. Passwords
//! are stored as Argon2id hashes; the session layer keeps the signed-in
//! identity (see [`crate::middleware::auth`]).

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::instrument;

use samara_core::StaffRole;

use crate::db::{RepositoryError, StaffRepository};
use crate::models::StaffUser;

/// Minimum username length.
pub const MIN_USERNAME_LENGTH: usize = 3;

/// Staff authentication service.
pub struct AuthService<'a> {
    staff: StaffRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            staff: StaffRepository::new(pool),
        }
    }

    /// Create a staff account.
    ///
    /// The username is trimmed; the password is hashed before storage.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingCredentials` or `AuthError::UsernameTooShort`
    /// on invalid input, `AuthError::UserAlreadyExists` if the username is
    /// taken.
    #[instrument(skip(self, password))]
    pub async fn create_staff(
        &self,
        username: &str,
        password: &str,
        role: StaffRole,
    ) -> Result<StaffUser, AuthError> {
        let username = validate_username(username, password)?;
        let password_hash = hash_password(password)?;

        self.staff
            .create(username, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Check a username and password, optionally requiring a role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is
    /// wrong, `AuthError::WrongRole` if the account has another role.
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        required_role: Option<StaffRole>,
    ) -> Result<StaffUser, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let (user, password_hash) = self
            .staff
            .get_with_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        if let Some(role) = required_role
            && user.role != role
        {
            return Err(AuthError::WrongRole(role));
        }

        Ok(user)
    }
}

/// Trim and validate a new username.
fn validate_username<'u>(username: &'u str, password: &str) -> Result<&'u str, AuthError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    if username.chars().count() < MIN_USERNAME_LENGTH {
        return Err(AuthError::UsernameTooShort {
            min: MIN_USERNAME_LENGTH,
        });
    }
    Ok(username)
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("delivery-van-7").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("delivery-van-7", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_hash() {
        assert!(matches!(
            verify_password("anything", "plaintext"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_validate_username() {
        assert_eq!(validate_username("  omar ", "pw").unwrap(), "omar");
        assert!(matches!(
            validate_username("  ", "pw"),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            validate_username("omar", ""),
            Err(AuthError::MissingCredentials)
        ));
        assert!(matches!(
            validate_username("ab", "pw"),
            Err(AuthError::UsernameTooShort { min: 3 })
        ));
    }

    #[test]
    fn test_wrong_role_message() {
        assert_eq!(
            AuthError::WrongRole(StaffRole::Delivery).to_string(),
            "Unauthorized: not a delivery user"
        );
    }
}
