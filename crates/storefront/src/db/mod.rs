//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Schema: `samara`
//!
//! ## Tables
//!
//! - `cities` - Delivery coverage (`is_active = 'Y'` means we deliver there)
//! - `app_users` - Customer profiles mirrored from the identity provider, plus
//!   the loyalty wallet (`bonus`)
//! - `addresses` - Customer delivery addresses
//! - `categories`, `products` - Catalog
//! - `promo_codes`, `charity_beneficiaries` - Discount eligibility
//! - `order_payment_confirmation` - One row per gateway checkout
//! - `orders` - Placed orders and their delivery progress
//! - `reviews` - Customer reviews, moderated via `show`
//! - `admin_users` - Staff accounts (admin and delivery roles)
//! - `tower_sessions.session` - Tower-sessions storage
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p samara-cli -- migrate
//! ```

pub mod addresses;
pub mod catalog;
pub mod cities;
pub mod confirmations;
pub mod orders;
pub mod promos;
pub mod reviews;
pub mod staff;
pub mod wallet;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use samara_core::YesNo;

pub use addresses::AddressRepository;
pub use catalog::CatalogRepository;
pub use cities::CityRepository;
pub use confirmations::ConfirmationRepository;
pub use orders::OrderRepository;
pub use promos::PromoRepository;
pub use reviews::ReviewRepository;
pub use staff::StaffRepository;
pub use wallet::WalletRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique violations to [`RepositoryError::Conflict`].
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Parse a stored `Y`/`N` column.
pub(crate) fn parse_flag(value: &str, column: &str) -> Result<YesNo, RepositoryError> {
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("{column}: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Y", "active").ok(), Some(YesNo::Yes));
        assert!(matches!(
            parse_flag("X", "active"),
            Err(RepositoryError::DataCorruption(msg)) if msg.starts_with("active")
        ));
    }
}
