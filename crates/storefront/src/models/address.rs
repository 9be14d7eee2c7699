//! Customer delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use samara_core::{AddressId, CityId, CustomerId};

/// Marker the address form sends when the customer typed a city that is not
/// in the list.
pub const NEW_CITY_MARKER: &str = "new-city";

/// A saved delivery address.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: CustomerId,
    pub country: String,
    pub city_id: Option<CityId>,
    /// City name as typed on the address.
    pub city: Option<String>,
    /// Name of the linked city, when `city_id` is set.
    pub city_name: Option<String>,
    /// Whether the linked city is inside delivery coverage.
    pub city_active: Option<bool>,
    pub street: String,
    pub floor: String,
    pub landmark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// True when the address points at a city we do not deliver to.
    #[must_use]
    pub fn is_out_of_coverage(&self) -> bool {
        self.city_active == Some(false)
    }
}

/// How the address form picked its city.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityChoice {
    /// One of the listed cities.
    Existing(CityId),
    /// A city typed in by the customer.
    New,
}

impl CityChoice {
    /// Interpret the `city_id` field of the address form.
    ///
    /// Numbers and numeric strings select an existing city; `null`, an empty
    /// string and `"new-city"` mean the customer typed one in.
    ///
    /// # Errors
    ///
    /// Returns a message when the value is neither.
    pub fn from_form(value: Option<&Value>) -> Result<Self, String> {
        match value {
            None | Some(Value::Null) => Ok(Self::New),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|id| Self::Existing(CityId::new(id)))
                .ok_or_else(|| format!("invalid city_id: {n}")),
            Some(Value::String(s)) => {
                let s = s.trim();
                if s.is_empty() || s == NEW_CITY_MARKER {
                    Ok(Self::New)
                } else {
                    s.parse::<i32>()
                        .map(|id| Self::Existing(CityId::new(id)))
                        .map_err(|_| format!("invalid city_id: {s}"))
                }
            }
            Some(other) => Err(format!("invalid city_id: {other}")),
        }
    }
}

/// Address fields as submitted by the address form.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    #[serde(default)]
    pub id: Option<AddressId>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city_id: Option<Value>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_city_choice_from_form() {
        assert_eq!(CityChoice::from_form(None).unwrap(), CityChoice::New);
        assert_eq!(
            CityChoice::from_form(Some(&json!(""))).unwrap(),
            CityChoice::New
        );
        assert_eq!(
            CityChoice::from_form(Some(&json!("new-city"))).unwrap(),
            CityChoice::New
        );
        assert_eq!(
            CityChoice::from_form(Some(&json!(7))).unwrap(),
            CityChoice::Existing(CityId::new(7))
        );
        assert_eq!(
            CityChoice::from_form(Some(&json!("12"))).unwrap(),
            CityChoice::Existing(CityId::new(12))
        );
        assert!(CityChoice::from_form(Some(&json!("dublin"))).is_err());
        assert!(CityChoice::from_form(Some(&json!(true))).is_err());
    }
}
