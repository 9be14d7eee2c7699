//! Customer address book.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::{AddressId, CityId};

use crate::db::addresses::AddressFields;
use crate::db::{AddressRepository, CityRepository, RepositoryError};
use crate::error::{AppError, Result};
use crate::models::{AddressInput, CityChoice};
use crate::routes::require_user_id;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "addressId")]
    pub address_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAddressBody {
    #[serde(default, rename = "userId")]
    pub user_id: Option<String>,
    #[serde(default, rename = "addressData")]
    pub address_data: Option<AddressInput>,
}

/// The city the form resolved to, before any database lookups.
#[derive(Debug, PartialEq, Eq)]
enum ResolvedCity {
    Existing(CityId),
    Typed(String),
}

fn resolve_city(input: &AddressInput) -> Result<ResolvedCity> {
    match CityChoice::from_form(input.city_id.as_ref()).map_err(AppError::BadRequest)? {
        CityChoice::Existing(id) => Ok(ResolvedCity::Existing(id)),
        CityChoice::New => input
            .city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| ResolvedCity::Typed(c.to_owned()))
            .ok_or_else(|| AppError::bad_request("Please enter a city name")),
    }
}

fn trimmed(value: Option<&String>) -> String {
    value.map(|s| s.trim().to_owned()).unwrap_or_default()
}

/// List a customer's saved addresses.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    let addresses = AddressRepository::new(state.pool())
        .list_for_user(user_id)
        .await?;

    Ok(Json(json!({ "addresses": addresses })))
}

/// Create or update an address.
///
/// A city typed in by the customer is stored as a new, inactive city so it
/// shows up for review without entering delivery coverage.
#[instrument(skip(state, body))]
pub async fn save(
    State(state): State<AppState>,
    Json(body): Json<SaveAddressBody>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(body.user_id.as_deref())?;
    let input = body
        .address_data
        .ok_or_else(|| AppError::bad_request("Address data is required"))?;
    let resolved = resolve_city(&input)?;

    let cities = CityRepository::new(state.pool());
    let city = match resolved {
        ResolvedCity::Existing(id) => cities
            .get(id)
            .await?
            .ok_or_else(|| AppError::bad_request("Unknown city"))?,
        ResolvedCity::Typed(name) => {
            let city = cities.find_or_create_inactive(&name).await?;
            tracing::info!(city = %city.name, "Customer entered a city outside the list");
            city
        }
    };

    let fields = AddressFields {
        country: trimmed(input.country.as_ref()),
        city_id: city.id,
        city: city.name,
        street: trimmed(input.street.as_ref()),
        floor: trimmed(input.floor.as_ref()),
        landmark: trimmed(input.landmark.as_ref()),
    };

    let addresses = AddressRepository::new(state.pool());
    let address = match input.id {
        Some(id) => addresses
            .update(user_id, id, &fields)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => {
                    AppError::NotFound("Address not found".to_owned())
                }
                other => AppError::Database(other),
            })?,
        None => addresses.create(user_id, &fields).await?,
    };

    Ok(Json(json!({ "address": address })))
}

/// Delete one of the customer's addresses.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    let address_id: AddressId = query
        .address_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i32>().ok())
        .map(AddressId::new)
        .ok_or_else(|| AppError::bad_request("Address ID is required"))?;

    let deleted = AddressRepository::new(state.pool())
        .delete(user_id, address_id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound("Address not found".to_owned()));
    }

    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(value: Value) -> AddressInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolve_listed_city() {
        let form = input(json!({ "city_id": "3", "street": "Main St" }));
        assert_eq!(
            resolve_city(&form).unwrap(),
            ResolvedCity::Existing(CityId::new(3))
        );
    }

    #[test]
    fn test_resolve_typed_city() {
        let form = input(json!({ "city_id": "new-city", "city": "  Ennis " }));
        assert_eq!(
            resolve_city(&form).unwrap(),
            ResolvedCity::Typed("Ennis".to_owned())
        );
    }

    #[test]
    fn test_typed_city_requires_a_name() {
        let form = input(json!({ "city_id": "", "city": "   " }));
        assert!(matches!(
            resolve_city(&form),
            Err(AppError::BadRequest(msg)) if msg == "Please enter a city name"
        ));
    }
}
