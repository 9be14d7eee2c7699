//! Catalog repository: categories and products.

use rust_decimal::Decimal;
use sqlx::PgPool;

use samara_core::{CategoryId, ProductId};

use super::{RepositoryError, parse_flag};
use crate::models::{Category, CategoryInput, Product};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    description: Option<String>,
    image: Option<String>,
    active: String,
}

impl TryFrom<CategoryRow> for Category {
    type Error = RepositoryError;

    fn try_from(row: CategoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CategoryId::new(row.id),
            name: row.name,
            description: row.description,
            image: row.image,
            active: parse_flag(&row.active, "categories.active")?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    category_id: i32,
    category_name: String,
    price: Decimal,
    unit_name: Option<String>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            name: row.name,
            category_id: CategoryId::new(row.category_id),
            category_name: row.category_name,
            price: row.price,
            unit_name: row.unit_name,
        }
    }
}

/// Repository for the product catalog.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, active
            FROM samara.categories
            WHERE active = 'Y'
            ORDER BY name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// Active products in active categories, with the category name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.name, p.category_id, c.name AS category_name,
                   p.price, p.unit_name
            FROM samara.products p
            JOIN samara.categories c ON c.id = p.category_id
            WHERE p.active = 'Y' AND c.active = 'Y'
            ORDER BY c.name ASC, p.name ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// All categories for the dashboard, optionally filtered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(
        &self,
        search: Option<&str>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", escape_like(s)));

        let rows = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, active
            FROM samara.categories
            WHERE $1::text IS NULL OR name ILIKE $1
            ORDER BY id ASC
            ",
        )
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Category::try_from).collect()
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create_category(
        &self,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO samara.categories (name, description, image, active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, image, active
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.active.as_str())
        .fetch_one(self.pool)
        .await?;

        Category::try_from(row)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no category has this ID,
    /// `RepositoryError::Database` if the query fails.
    pub async fn update_category(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE samara.categories
            SET name = $2, description = $3, image = $4, active = $5
            WHERE id = $1
            RETURNING id, name, description, image, active
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.active.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Category::try_from(row)
    }
}

/// Escape `LIKE` wildcards in user input.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("dates"), "dates");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like(r"a\b"), r"a\\b");
    }
}
