//! Shopping assistant: builds the system prompt from the live catalog and
//! forwards the conversation to `OpenAI`.
//!
//! The catalog snapshot (categories, products, delivery cities) is cached for
//! 5 minutes so a busy chat does not hit the database on every message.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use samara_core::Price;

use crate::db::{CatalogRepository, CityRepository, RepositoryError};
use crate::models::{Category, City, Product};
use crate::services::openai::{ChatMessage, OpenAiClient, OpenAiError};

/// Public shop URL used for category and product links.
pub const SHOP_URL: &str = "https://samarashop.ie";

/// Errors from the assistant.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("catalog unavailable: {0}")]
    Catalog(#[from] RepositoryError),

    #[error(transparent)]
    OpenAi(#[from] OpenAiError),
}

/// What the assistant knows about the shop.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub cities: Vec<City>,
}

/// Cache for the catalog snapshot.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<(), Arc<CatalogSnapshot>>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// Return the cached snapshot or load a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if loading from the database fails.
    pub async fn get_or_load(
        &self,
        pool: &PgPool,
    ) -> Result<Arc<CatalogSnapshot>, RepositoryError> {
        if let Some(snapshot) = self.cache.get(&()).await {
            debug!("Cache hit for catalog snapshot");
            return Ok(snapshot);
        }

        let catalog = CatalogRepository::new(pool);
        let cities = CityRepository::new(pool);
        let (categories, products, cities) = futures::try_join!(
            catalog.active_categories(),
            catalog.active_products(),
            cities.list_active(),
        )?;

        let snapshot = Arc::new(CatalogSnapshot {
            categories,
            products,
            cities,
        });
        self.cache.insert((), Arc::clone(&snapshot)).await;
        Ok(snapshot)
    }

    /// Drop the cached snapshot.
    pub async fn invalidate(&self) {
        self.cache.invalidate(&()).await;
    }
}

/// Build the assistant's system prompt.
#[must_use]
pub fn system_prompt(snapshot: &CatalogSnapshot) -> String {
    let mut categories = String::new();
    for c in &snapshot.categories {
        let desc = c
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or("No description");
        let _ = writeln!(
            categories,
            "- {} ({desc}) {SHOP_URL}/category/{}",
            c.name, c.id
        );
    }
    if categories.is_empty() {
        categories.push_str("No categories available\n");
    }

    let mut products = String::new();
    for p in &snapshot.products {
        let unit = p.unit_name.as_deref().unwrap_or("");
        let _ = writeln!(
            products,
            "- {} (Category: {}, Price: {} {unit}) {SHOP_URL}/product/{}",
            p.name,
            p.category_name,
            Price::eur(p.price),
            p.id
        );
    }
    if products.is_empty() {
        products.push_str("No products available\n");
    }

    let mut cities = String::new();
    for c in &snapshot.cities {
        let _ = writeln!(cities, "- {}", c.name);
    }
    if cities.is_empty() {
        cities.push_str("No cities available\n");
    }

    format!(
        "You are Samara AI Assistant, a helpful support chatbot for Samara, a website selling food in Ireland.
Respond in Arabic or English, matching the language the user writes in.
Focus only on the topics below:

1. Food categories available:
{categories}
When a user asks for a category link, use the link listed next to it.

2. Products available:
{products}
When a user asks for a product link, use the link listed next to it.

3. Cities where delivery is available:
{cities}
4. Online food sales and delivery
5. Food safety and Irish e-commerce regulations
6. Internal staff and operations questions

If a question is unrelated, politely explain you can only help with food e-commerce topics in Ireland.
"
    )
}

/// Answer a conversation.
///
/// # Errors
///
/// Returns `ChatError::Catalog` if the catalog cannot be loaded,
/// `ChatError::OpenAi` if the completion fails.
#[instrument(skip_all, fields(messages = messages.len()))]
pub async fn reply(
    pool: &PgPool,
    cache: &CatalogCache,
    openai: &OpenAiClient,
    messages: Vec<ChatMessage>,
) -> Result<ChatMessage, ChatError> {
    let snapshot = cache.get_or_load(pool).await?;

    let mut conversation = Vec::with_capacity(messages.len() + 1);
    conversation.push(ChatMessage::system(system_prompt(&snapshot)));
    conversation.extend(messages);

    Ok(openai.complete(&conversation).await?)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use samara_core::{CategoryId, CityId, ProductId, YesNo};

    use super::*;

    #[test]
    fn test_prompt_for_empty_catalog() {
        let prompt = system_prompt(&CatalogSnapshot::default());
        assert!(prompt.contains("No categories available"));
        assert!(prompt.contains("No products available"));
        assert!(prompt.contains("No cities available"));
        assert!(prompt.contains("Arabic or English"));
    }

    #[test]
    fn test_prompt_lists_catalog_with_links() {
        let snapshot = CatalogSnapshot {
            categories: vec![Category {
                id: CategoryId::new(4),
                name: "Spices".into(),
                description: None,
                image: None,
                active: YesNo::Yes,
            }],
            products: vec![Product {
                id: ProductId::new(9),
                name: "Za'atar".into(),
                category_id: CategoryId::new(4),
                category_name: "Spices".into(),
                price: Decimal::new(350, 2),
                unit_name: Some("200g".into()),
            }],
            cities: vec![City {
                id: CityId::new(1),
                name: "Galway".into(),
                is_active: YesNo::Yes,
            }],
        };

        let prompt = system_prompt(&snapshot);
        assert!(prompt.contains("- Spices (No description) https://samarashop.ie/category/4"));
        assert!(prompt.contains(
            "- Za'atar (Category: Spices, Price: €3.50 200g) https://samarashop.ie/product/9"
        ));
        assert!(prompt.contains("- Galway"));
        assert!(!prompt.contains("No cities available"));
    }
}
