//! Payment confirmation rows: one per gateway checkout, recorded before the
//! card is charged so a captured payment can always be traced back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use samara_core::{ConfirmationId, CustomerId};

/// A stored payment confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfirmation {
    pub id: ConfirmationId,
    pub user_id: CustomerId,
    pub checkout_id: Option<String>,
    /// Gateway status as last recorded (`PENDING`, `PAID`, ...).
    pub status: String,
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub floor: Option<String>,
    pub landmark: Option<String>,
    pub f_name: Option<String>,
    pub s_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub donation: Decimal,
    pub discount_type: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    pub promocode: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub final_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when recording a confirmation.
///
/// Mirrors the checkout page's payload; everything but the customer is
/// optional so partially filled forms can still be traced.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPaymentConfirmation {
    pub user_id: Option<CustomerId>,
    #[serde(default)]
    pub checkout_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub floor: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub f_name: Option<String>,
    #[serde(default)]
    pub s_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub donation: Option<Decimal>,
    #[serde(default)]
    pub discount_type: Option<String>,
    #[serde(default)]
    pub discount_amount: Option<Decimal>,
    #[serde(default)]
    pub promocode: Option<String>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}
