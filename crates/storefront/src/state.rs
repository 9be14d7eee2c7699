//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::chat::CatalogCache;
use crate::services::openai::{OpenAiClient, OpenAiError};
use crate::services::resend::{ResendClient, ResendError};
use crate::services::sumup::{SumUpClient, SumUpError};

/// Error building the upstream API clients.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("SumUp client: {0}")]
    SumUp(#[from] SumUpError),
    #[error("OpenAI client: {0}")]
    OpenAi(#[from] OpenAiError),
    #[error("Resend client: {0}")]
    Resend(#[from] ResendError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    sumup: SumUpClient,
    openai: OpenAiClient,
    resend: Option<ResendClient>,
    catalog_cache: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if an upstream client cannot be built from the
    /// configuration.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let sumup = SumUpClient::new(&config.sumup)?;
        let openai = OpenAiClient::new(&config.openai)?;
        let resend = config.resend.as_ref().map(ResendClient::new).transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sumup,
                openai,
                resend,
                catalog_cache: CatalogCache::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the `SumUp` client.
    #[must_use]
    pub fn sumup(&self) -> &SumUpClient {
        &self.inner.sumup
    }

    /// Get a reference to the `OpenAI` client.
    #[must_use]
    pub fn openai(&self) -> &OpenAiClient {
        &self.inner.openai
    }

    /// Get the Resend client, if an API key is configured.
    #[must_use]
    pub fn resend(&self) -> Option<&ResendClient> {
        self.inner.resend.as_ref()
    }

    /// Get the chat assistant's catalog cache.
    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }
}
