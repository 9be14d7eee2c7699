//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Environment variable holding the storefront database URL.
pub const DATABASE_URL_VAR: &str = "STOREFRONT_DATABASE_URL";

/// Connect to the storefront database named by [`DATABASE_URL_VAR`]
/// (falling back to `DATABASE_URL`).
///
/// # Errors
///
/// Returns an error if the variable is missing or the connection fails.
pub async fn connect() -> Result<PgPool, ConnectError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var(DATABASE_URL_VAR)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConnectError::MissingEnvVar(DATABASE_URL_VAR))?;

    tracing::info!("Connecting to storefront database...");
    Ok(samara_storefront::db::create_pool(&database_url).await?)
}

/// Errors from [`connect`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}
