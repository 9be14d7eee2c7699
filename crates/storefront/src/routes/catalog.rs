//! Catalog listings and category administration.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::CategoryId;

use crate::db::{CatalogRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::CategoryInput;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Active categories for the shop.
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = CatalogRepository::new(state.pool())
        .active_categories()
        .await
        .map_err(|e| AppError::query("Failed to fetch categories", e))?;

    Ok(Json(json!({ "categories": categories })))
}

/// Active products for the shop.
#[instrument(skip(state))]
pub async fn products(State(state): State<AppState>) -> Result<Json<Value>> {
    let products = CatalogRepository::new(state.pool())
        .active_products()
        .await
        .map_err(|e| AppError::query("Failed to fetch products", e))?;

    Ok(Json(json!({ "products": products })))
}

/// All categories, active or not.
#[instrument(skip_all)]
pub async fn admin_categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>> {
    let categories = CatalogRepository::new(state.pool())
        .list_categories(query.search.as_deref())
        .await?;

    Ok(Json(json!({ "categories": categories })))
}

fn validated(input: CategoryInput) -> Result<CategoryInput> {
    let input = input.normalized();
    if input.name.is_empty() {
        return Err(AppError::bad_request("Category name is required."));
    }
    Ok(input)
}

/// Create a category.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let input = validated(input)?;
    let category = CatalogRepository::new(state.pool())
        .create_category(&input)
        .await?;
    state.catalog_cache().invalidate().await;

    tracing::info!(category_id = %category.id, "Category created");
    Ok((StatusCode::CREATED, Json(json!({ "category": category }))))
}

/// Update a category.
#[instrument(skip_all, fields(admin = %admin.username))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(input): Json<CategoryInput>,
) -> Result<Json<Value>> {
    let input = validated(input)?;
    let category = CatalogRepository::new(state.pool())
        .update_category(CategoryId::new(id), &input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Category not found".to_owned()),
            other => AppError::Database(other),
        })?;
    state.catalog_cache().invalidate().await;

    Ok(Json(json!({ "category": category })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_name_required() {
        let input: CategoryInput = serde_json::from_value(json!({ "name": "   " })).unwrap();
        assert!(matches!(
            validated(input),
            Err(AppError::BadRequest(msg)) if msg == "Category name is required."
        ));
    }

    #[test]
    fn test_category_input_trimmed() {
        let input: CategoryInput =
            serde_json::from_value(json!({ "name": " Bakery ", "desc": " Fresh daily " }))
                .unwrap();
        let input = validated(input).unwrap();
        assert_eq!(input.name, "Bakery");
        assert_eq!(input.description.as_deref(), Some("Fresh daily"));
    }
}
