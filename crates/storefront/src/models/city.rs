//! Delivery cities.

use serde::Serialize;

use samara_core::{CityId, YesNo};

/// A city customers can pick for delivery.
///
/// Inactive cities exist (customers can type in a new one) but are outside
/// delivery coverage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub is_active: YesNo,
}
