//! Order creation, server-side checkout and order lookup.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::{AddressId, OrderId, PaymentStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{AddressInput, CityChoice, ContactInfo, NewOrder, OrderSummary};
use crate::routes::require_user_id;
use crate::routes::sumup::CardInput;
use crate::services::checkout::{CheckoutRequest, CheckoutService};
use crate::state::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub address_data: Option<AddressInput>,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub charity_discount: Decimal,
    #[serde(default)]
    pub points_discount: Decimal,
    #[serde(default)]
    pub donation: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transaction_code: Option<String>,
    #[serde(default)]
    pub final_total: Decimal,
    #[serde(default)]
    pub order_summary: OrderSummary,
}

impl CreateOrderBody {
    fn into_new_order(self) -> Result<NewOrder> {
        let missing =
            || AppError::bad_request("userId, addressData and transactionCode are required");
        let user_id = match self.user_id.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => require_user_id(Some(raw))?,
            _ => return Err(missing()),
        };
        let address = self.address_data.ok_or_else(missing)?;
        let transaction_code = non_empty(self.transaction_code).ok_or_else(missing)?;

        let city_id = match CityChoice::from_form(address.city_id.as_ref()) {
            Ok(CityChoice::Existing(id)) => Some(id),
            Ok(CityChoice::New) | Err(_) => None,
        };

        Ok(NewOrder {
            user_id,
            country: non_empty(address.country),
            city_id,
            city: non_empty(address.city),
            street: non_empty(address.street),
            floor: non_empty(address.floor),
            landmark: non_empty(address.landmark),
            contact: self.contact_info,
            promo_code: non_empty(self.promo_code),
            discount: self.discount,
            charity_discount: self.charity_discount,
            points_discount: self.points_discount,
            donation: self.donation,
            notes: non_empty(self.notes),
            transaction_code,
            final_total: self.final_total,
            summary: self.order_summary,
        })
    }
}

/// Record an order the client already paid for.
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = body.into_new_order()?;
    let order_id = OrderRepository::new(state.pool()).create(&order).await?;

    tracing::info!(%order_id, transaction_code = %order.transaction_code, "Order created");
    Ok((StatusCode::CREATED, Json(json!({ "orderId": order_id }))))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub address_id: Option<AddressId>,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub promo_code: Option<String>,
    #[serde(default)]
    pub use_points: bool,
    #[serde(default)]
    pub donate: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub order_summary: OrderSummary,
    pub card: Option<CardInput>,
}

impl CheckoutBody {
    fn into_request(self) -> Result<CheckoutRequest> {
        let user_id = require_user_id(self.user_id.as_deref())?;
        let address_id = self
            .address_id
            .ok_or_else(|| AppError::bad_request("Please select a delivery address"))?;
        let card = self
            .card
            .ok_or_else(|| AppError::bad_request("Card details are required"))?;

        Ok(CheckoutRequest {
            user_id,
            address_id,
            contact: self.contact_info,
            promo_code: non_empty(self.promo_code),
            use_points: self.use_points,
            donate: self.donate,
            notes: non_empty(self.notes),
            summary: self.order_summary,
            card: card.into(),
        })
    }
}

/// Price, pay for and record an order in one request.
#[instrument(skip_all)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(body): Json<CheckoutBody>,
) -> Result<(StatusCode, Json<Value>)> {
    let request = body.into_request()?;
    let user = request.user_id.to_string();
    add_breadcrumb("checkout", "Checkout started", Some(&[("user_id", user.as_str())]));

    let outcome = CheckoutService::new(state.pool(), state.sumup())
        .place_order(request)
        .await?;

    let order_id = outcome.order_id.to_string();
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[
            ("order_id", order_id.as_str()),
            ("checkout_id", outcome.checkout_id.as_str()),
        ]),
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "orderId": outcome.order_id,
            "checkoutId": outcome.checkout_id,
            "status": PaymentStatus::Paid.as_str(),
            "breakdown": outcome.breakdown,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Get one of the customer's orders.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Value>> {
    let user_id = require_user_id(query.user_id.as_deref())?;
    let order = OrderRepository::new(state.pool())
        .get_for_user(user_id, OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    Ok(Json(json!({ "order": order })))
}
