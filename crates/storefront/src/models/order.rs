//! Orders and the data needed to place one.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use samara_core::{CityId, CustomerId, Email, OrderId};

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: CustomerId,
    pub country: Option<String>,
    pub city_id: Option<CityId>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub floor: Option<String>,
    pub landmark: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub promo_code: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub charity_discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub points_discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub donation: Decimal,
    pub notes: Option<String>,
    pub transaction_code: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_total: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub items: Value,
    pub status: String,
    pub delivery_comment: Option<String>,
    pub delivery_image: Option<String>,
    pub delivery_user: Option<String>,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart totals computed by the cart page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSummary {
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub delivery: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub items: Vec<Value>,
}

/// Contact details entered at checkout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl ContactInfo {
    /// Check that every field is filled and the email is well formed.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first problem found.
    pub fn validate(&self) -> Result<Email, String> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("First and last name are required".to_owned());
        }
        if self.phone.trim().is_empty() {
            return Err("Phone number is required".to_owned());
        }
        Email::parse(&self.email).map_err(|e| e.to_string())
    }
}

/// Everything stored when an order is created.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: CustomerId,
    pub country: Option<String>,
    pub city_id: Option<CityId>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub floor: Option<String>,
    pub landmark: Option<String>,
    pub contact: ContactInfo,
    pub promo_code: Option<String>,
    pub discount: Decimal,
    pub charity_discount: Decimal,
    pub points_discount: Decimal,
    pub donation: Decimal,
    pub notes: Option<String>,
    pub transaction_code: String,
    pub final_total: Decimal,
    pub summary: OrderSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact() -> ContactInfo {
        ContactInfo {
            first_name: "Layla".into(),
            last_name: "Haddad".into(),
            phone: "+353 1 555 0100".into(),
            email: "layla@example.ie".into(),
        }
    }

    #[test]
    fn test_contact_info_valid() {
        assert!(contact().validate().is_ok());
    }

    #[test]
    fn test_contact_info_requires_names_and_phone() {
        let missing_name = ContactInfo {
            last_name: " ".into(),
            ..contact()
        };
        assert!(missing_name.validate().is_err());

        let missing_phone = ContactInfo {
            phone: String::new(),
            ..contact()
        };
        assert_eq!(
            missing_phone.validate().err().as_deref(),
            Some("Phone number is required")
        );
    }

    #[test]
    fn test_contact_info_rejects_bad_email() {
        let bad = ContactInfo {
            email: "layla@localhost".into(),
            ..contact()
        };
        assert_eq!(bad.validate().err().as_deref(), Some("Invalid email format"));
    }
}
