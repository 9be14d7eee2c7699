//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::types::Json;

use samara_core::{CityId, CustomerId, DeliveryStatus, OrderId};

use super::RepositoryError;
use crate::models::{NewOrder, Order};

const ORDER_COLUMNS: &str = r"
    id, user_id, country, city_id, city, street, floor, landmark,
    first_name, last_name, phone, email, promo_code, discount,
    charity_discount, points_discount, donation, notes, transaction_code,
    final_total, subtotal, tax, delivery, total, items, status,
    delivery_comment, delivery_image, delivery_user, delivery_date,
    created_at, updated_at
";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: CustomerId,
    country: Option<String>,
    city_id: Option<i32>,
    city: Option<String>,
    street: Option<String>,
    floor: Option<String>,
    landmark: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    promo_code: Option<String>,
    discount: Decimal,
    charity_discount: Decimal,
    points_discount: Decimal,
    donation: Decimal,
    notes: Option<String>,
    transaction_code: String,
    final_total: Decimal,
    subtotal: Decimal,
    tax: Decimal,
    delivery: Decimal,
    total: Decimal,
    items: Json<Value>,
    status: String,
    delivery_comment: Option<String>,
    delivery_image: Option<String>,
    delivery_user: Option<String>,
    delivery_date: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: row.user_id,
            country: row.country,
            city_id: row.city_id.map(CityId::new),
            city: row.city,
            street: row.street,
            floor: row.floor,
            landmark: row.landmark,
            first_name: row.first_name,
            last_name: row.last_name,
            phone: row.phone,
            email: row.email,
            promo_code: row.promo_code,
            discount: row.discount,
            charity_discount: row.charity_discount,
            points_discount: row.points_discount,
            donation: row.donation,
            notes: row.notes,
            transaction_code: row.transaction_code,
            final_total: row.final_total,
            subtotal: row.subtotal,
            tax: row.tax,
            delivery: row.delivery,
            total: row.total,
            items: row.items.0,
            status: row.status,
            delivery_comment: row.delivery_comment,
            delivery_image: row.delivery_image,
            delivery_user: row.delivery_user,
            delivery_date: row.delivery_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Delivery progress reported by a courier.
#[derive(Debug, Clone)]
pub struct DeliveryUpdate {
    pub status: DeliveryStatus,
    pub comment: Option<String>,
    pub image: Option<String>,
    pub courier: String,
}

/// Repository for orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and return its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let summary = &order.summary;
        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO samara.orders (
                user_id, country, city_id, city, street, floor, landmark,
                first_name, last_name, phone, email, promo_code, discount,
                charity_discount, points_discount, donation, notes,
                transaction_code, final_total, subtotal, tax, delivery, total, items
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23, $24)
            RETURNING id
            ",
        )
        .bind(order.user_id)
        .bind(&order.country)
        .bind(order.city_id)
        .bind(&order.city)
        .bind(&order.street)
        .bind(&order.floor)
        .bind(&order.landmark)
        .bind(order.contact.first_name.trim())
        .bind(order.contact.last_name.trim())
        .bind(order.contact.phone.trim())
        .bind(order.contact.email.trim())
        .bind(&order.promo_code)
        .bind(order.discount)
        .bind(order.charity_discount)
        .bind(order.points_discount)
        .bind(order.donation)
        .bind(&order.notes)
        .bind(&order.transaction_code)
        .bind(order.final_total)
        .bind(summary.subtotal)
        .bind(summary.tax)
        .bind(summary.delivery)
        .bind(summary.total)
        .bind(Json(&summary.items))
        .fetch_one(self.pool)
        .await?;

        Ok(OrderId::new(id))
    }

    /// Get one of the customer's orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_for_user(
        &self,
        user_id: CustomerId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM samara.orders WHERE id = $1 AND user_id = $2"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }

    /// Record delivery progress and stamp the delivery date.
    ///
    /// Returns `None` when no order has this ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_delivery(
        &self,
        id: OrderId,
        update: &DeliveryUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "UPDATE samara.orders
             SET status = $2, delivery_comment = $3, delivery_image = $4,
                 delivery_user = $5, delivery_date = now(), updated_at = now()
             WHERE id = $1
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(update.status.as_str())
            .bind(&update.comment)
            .bind(&update.image)
            .bind(&update.courier)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Order::from))
    }
}
