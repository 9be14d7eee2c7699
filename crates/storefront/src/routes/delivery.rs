//! Courier delivery progress.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use samara_core::{DeliveryStatus, OrderId};

use crate::db::OrderRepository;
use crate::db::orders::DeliveryUpdate;
use crate::error::{AppError, Result};
use crate::middleware::RequireDelivery;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DeliveryUpdateBody {
    #[serde(default)]
    pub order_id: Option<OrderId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub delivery_comment: Option<String>,
    #[serde(default)]
    pub delivery_image: Option<String>,
    #[serde(default)]
    pub delivery_user: Option<String>,
}

impl DeliveryUpdateBody {
    /// Validate the body; the courier defaults to whoever is signed in.
    fn into_update(self, courier: &str) -> Result<(OrderId, DeliveryUpdate)> {
        let required = || AppError::bad_request("order_id and status are required");
        let order_id = self.order_id.ok_or_else(required)?;
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(required)?
            .parse::<DeliveryStatus>()
            .map_err(AppError::BadRequest)?;

        let clean = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        Ok((
            order_id,
            DeliveryUpdate {
                status,
                comment: clean(self.delivery_comment),
                image: clean(self.delivery_image),
                courier: clean(self.delivery_user).unwrap_or_else(|| courier.to_owned()),
            },
        ))
    }
}

/// Record delivery progress on an order.
#[instrument(skip_all, fields(courier = %staff.username))]
pub async fn update(
    State(state): State<AppState>,
    RequireDelivery(staff): RequireDelivery,
    Json(body): Json<DeliveryUpdateBody>,
) -> Result<Json<Value>> {
    let (order_id, update) = body.into_update(&staff.username)?;

    let order = OrderRepository::new(state.pool())
        .update_delivery(order_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found or no changes applied".to_owned()))?;

    tracing::info!(%order_id, status = %update.status, "Delivery status updated");
    Ok(Json(json!({ "success": true, "order": order })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn body(value: Value) -> DeliveryUpdateBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_requires_order_and_status() {
        let err = body(json!({ "status": "delivered" }))
            .into_update("karim")
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::BadRequest(msg) if msg == "order_id and status are required"
        ));

        let err = body(json!({ "order_id": 5 })).into_update("karim").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_rejects_unknown_status() {
        let err = body(json!({ "order_id": 5, "status": "lost" }))
            .into_update("karim")
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_courier_defaults_to_session_user() {
        let (order_id, update) = body(json!({
            "order_id": 5,
            "status": "on_the_way",
            "delivery_comment": "  ",
        }))
        .into_update("karim")
        .unwrap();

        assert_eq!(order_id, OrderId::new(5));
        assert_eq!(update.status, DeliveryStatus::OnTheWay);
        assert_eq!(update.comment, None);
        assert_eq!(update.courier, "karim");
    }
}
