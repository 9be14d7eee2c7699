//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `STOREFRONT_SESSION_SECRET` - Session signing secret (min 32 chars, high entropy)
//! - `SUMUP_ACCESS_TOKEN` - `SumUp` API bearer token
//! - `SUMUP_MERCHANT_CODE` - `SumUp` merchant code checkouts are created for
//! - `OPENAI_API_KEY` - `OpenAI` API key for the chat assistant
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `SUMUP_API_URL` - `SumUp` API base URL (default: <https://api.sumup.com>)
//! - `SUMUP_RETURN_URL` - Where the hosted checkout sends customers back to
//!   (default: `{STOREFRONT_BASE_URL}/payment-success`)
//! - `OPENAI_API_URL` - `OpenAI` API base URL (default: <https://api.openai.com/v1>)
//! - `OPENAI_MODEL` - Chat model (default: gpt-4o-mini)
//! - `RESEND_API_KEY` - Resend API key; newsletter signup is disabled without it
//! - `RESEND_AUDIENCE_ID` - Resend audience new contacts are added to (required
//!   once `RESEND_API_KEY` is set)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_SUMUP_API_URL: &str = "https://api.sumup.com";
const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session signing secret
    pub session_secret: SecretString,
    /// Payment gateway configuration
    pub sumup: SumUpConfig,
    /// Chat assistant configuration
    pub openai: OpenAiConfig,
    /// Newsletter contact API configuration, absent when not deployed
    pub resend: Option<ResendConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (production, staging, ...)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// `SumUp` API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct SumUpConfig {
    /// API base URL without trailing slash
    pub api_url: String,
    /// Bearer token
    pub access_token: SecretString,
    /// Merchant code checkouts are created for
    pub merchant_code: String,
    /// Return/redirect URL for hosted checkouts
    pub return_url: String,
}

impl std::fmt::Debug for SumUpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SumUpConfig")
            .field("api_url", &self.api_url)
            .field("access_token", &"[REDACTED]")
            .field("merchant_code", &self.merchant_code)
            .field("return_url", &self.return_url)
            .finish()
    }
}

/// `OpenAI` API configuration.
#[derive(Clone)]
pub struct OpenAiConfig {
    /// API base URL without trailing slash
    pub api_url: String,
    pub api_key: SecretString,
    pub model: String,
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

/// Resend contacts API configuration.
#[derive(Clone)]
pub struct ResendConfig {
    pub api_key: SecretString,
    pub audience_id: String,
}

impl std::fmt::Debug for ResendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendConfig")
            .field("api_key", &"[REDACTED]")
            .field("audience_id", &self.audience_id)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url =
            validated_url("STOREFRONT_BASE_URL", get_required_env("STOREFRONT_BASE_URL")?)?;
        let session_secret = get_validated_secret("STOREFRONT_SESSION_SECRET")?;
        validate_session_secret(&session_secret, "STOREFRONT_SESSION_SECRET")?;

        let sumup = SumUpConfig::from_env(&base_url)?;
        let openai = OpenAiConfig::from_env()?;
        let resend = ResendConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            session_secret,
            sumup,
            openai,
            resend,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl SumUpConfig {
    fn from_env(base_url: &str) -> Result<Self, ConfigError> {
        let return_url = get_optional_env("SUMUP_RETURN_URL")
            .unwrap_or_else(|| format!("{base_url}/payment-success"));
        Ok(Self {
            api_url: validated_url(
                "SUMUP_API_URL",
                get_env_or_default("SUMUP_API_URL", DEFAULT_SUMUP_API_URL),
            )?,
            access_token: get_validated_secret("SUMUP_ACCESS_TOKEN")?,
            merchant_code: get_required_env("SUMUP_MERCHANT_CODE")?,
            return_url,
        })
    }
}

impl OpenAiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: validated_url(
                "OPENAI_API_URL",
                get_env_or_default("OPENAI_API_URL", DEFAULT_OPENAI_API_URL),
            )?,
            api_key: get_validated_secret("OPENAI_API_KEY")?,
            model: get_env_or_default("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
        })
    }
}

impl ResendConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(api_key) = get_optional_env("RESEND_API_KEY") else {
            return Ok(None);
        };
        validate_secret_strength(&api_key, "RESEND_API_KEY")?;
        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            audience_id: get_required_env("RESEND_AUDIENCE_ID")?,
        }))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

/// Check that a variable holds an absolute http(s) URL and drop trailing
/// slashes so paths can be appended with `format!`.
fn validated_url(key: &str, value: String) -> Result<String, ConfigError> {
    let parsed = url::Url::parse(&value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", parsed.scheme()),
        ));
    }
    Ok(trim_trailing_slash(value))
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    /// Config pointing at local fakes, shared by tests in other modules.
    pub(crate) fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/samara_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            sumup: SumUpConfig {
                api_url: "http://127.0.0.1:9".to_string(),
                access_token: SecretString::from("sup_sk_test_token_value"),
                merchant_code: "MTEST123".to_string(),
                return_url: "http://localhost:3000/payment-success".to_string(),
            },
            openai: OpenAiConfig {
                api_url: "http://127.0.0.1:9".to_string(),
                api_key: SecretString::from("sk-test-openai-key"),
                model: DEFAULT_OPENAI_MODEL.to_string(),
            },
            resend: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let err = validate_secret_strength("your-sumup-token-here", "SUMUP_ACCESS_TOKEN")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_session_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_session_secret(&secret, "TEST_SESSION").is_err());
    }

    #[test]
    fn test_trim_trailing_slash() {
        assert_eq!(
            trim_trailing_slash("https://api.sumup.com//".to_string()),
            "https://api.sumup.com"
        );
        assert_eq!(trim_trailing_slash("http://x".to_string()), "http://x");
    }

    #[test]
    fn test_validated_url() {
        assert_eq!(
            validated_url("SUMUP_API_URL", "https://api.sumup.com/".to_string()).unwrap(),
            "https://api.sumup.com"
        );
        assert!(validated_url("SUMUP_API_URL", "api.sumup.com".to_string()).is_err());
        assert!(validated_url("OPENAI_API_URL", "ftp://example.com".to_string()).is_err());
    }

    #[test]
    fn test_socket_addr_and_https() {
        let config = test_config();
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_https());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = test_config();
        let debug_output = format!("{:?} {:?}", config.sumup, config.openai);

        assert!(debug_output.contains("MTEST123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sup_sk_test_token_value"));
        assert!(!debug_output.contains("sk-test-openai-key"));
    }
}
