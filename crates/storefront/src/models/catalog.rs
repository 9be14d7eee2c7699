//! Catalog: categories and products.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use samara_core::{CategoryId, ProductId, YesNo};

/// A product category.
#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(rename = "desc")]
    pub description: Option<String>,
    pub image: Option<String>,
    pub active: YesNo,
}

/// Category fields accepted by the dashboard.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "desc")]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub active: YesNo,
}

impl CategoryInput {
    /// Trim name and description; blank descriptions become `None`.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            image: self.image.filter(|i| !i.trim().is_empty()),
            active: self.active,
        }
    }
}

/// A product with its category name resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub category_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub unit_name: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_category_input_normalized() {
        let input: CategoryInput =
            serde_json::from_str(r#"{"name":"  Sweets ","desc":"   ","active":"Y"}"#).unwrap();
        let input = input.normalized();
        assert_eq!(input.name, "Sweets");
        assert_eq!(input.description, None);
        assert_eq!(input.active, YesNo::Yes);
    }

    #[test]
    fn test_product_serializes_contract_names() {
        let product = Product {
            id: ProductId::new(3),
            name: "Dates".into(),
            category_id: CategoryId::new(1),
            category_name: "Dried fruit".into(),
            price: Decimal::new(450, 2),
            unit_name: Some("kg".into()),
        };
        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["categoryName"], "Dried fruit");
        assert_eq!(json["unitName"], "kg");
        assert_eq!(json["price"], serde_json::json!(4.5));
    }
}
