//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Readiness (database ping)
//!
//! # Reference data and catalog
//! GET    /api/cities                    - Delivery cities
//! GET    /api/categories                - Active categories
//! GET    /api/products                  - Active products
//!
//! # Customer
//! GET    /api/users/wallet              - Wallet balance
//! PATCH  /api/users/wallet              - Spend points
//! GET    /api/users/address             - Saved addresses
//! POST   /api/users/address             - Create or update an address
//! DELETE /api/users/address             - Delete an address
//! GET    /api/promocode/verify          - Check a promo code
//! GET    /api/charity/check-discount    - Charity eligibility
//! GET    /api/reviews/all               - Visible reviews, paginated
//! POST   /api/newsletter/subscribe      - Newsletter sign-up
//! POST   /api/chat                      - Shopping assistant
//!
//! # Payments and orders
//! POST   /api/sumup/checkout            - Create a SumUp checkout
//! PUT    /api/sumup/checkout/{id}       - Pay a checkout by card
//! POST   /api/sumup/check-sumup         - Fetch a checkout
//! POST   /api/orderpaymentconfirmation  - Record a payment confirmation
//! POST   /api/payments/reconcile        - Settle today's pending payments
//! POST   /api/checkout                  - Price, pay and place an order
//! POST   /api/orders/create             - Record a paid order
//! GET    /api/orders/{id}               - Order details
//!
//! # Staff
//! POST   /api/admin/login               - Admin sign-in
//! POST   /api/admin/logout              - Admin sign-out
//! GET    /api/admin/reviews             - Review moderation list
//! PATCH  /api/admin/reviews/{id}        - Show or hide a review
//! GET    /api/admin/categories          - All categories
//! POST   /api/admin/categories          - Create a category
//! PUT    /api/admin/categories/{id}     - Update a category
//! GET    /api/admin-users               - Staff accounts
//! POST   /api/admin-users               - Create a staff account
//! POST   /api/delivery/login            - Courier sign-in
//! POST   /api/delivery/logout           - Courier sign-out
//! GET    /api/delivery/session          - Current courier
//! POST   /api/delivery/update           - Report delivery progress
//! ```

pub mod addresses;
pub mod catalog;
pub mod chat;
pub mod cities;
pub mod delivery;
pub mod health;
pub mod newsletter;
pub mod orders;
pub mod payments;
pub mod promos;
pub mod reviews;
pub mod staff;
pub mod sumup;
pub mod wallet;

use axum::{
    Router,
    routing::{get, patch, post, put},
};

use samara_core::CustomerId;

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, login_rate_limiter};
use crate::state::AppState;

/// Parse the `userId` every customer endpoint takes.
///
/// # Errors
///
/// Returns `AppError::BadRequest` when it is missing or not a UUID.
pub(crate) fn require_user_id(raw: Option<&str>) -> Result<CustomerId, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::bad_request("User ID is required"))?;
    raw.parse()
        .map_err(|_| AppError::bad_request("Invalid user ID"))
}

/// Catalog, reference data and customer routes.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/cities", get(cities::list))
        .route("/categories", get(catalog::categories))
        .route("/products", get(catalog::products))
        .route("/users/wallet", get(wallet::balance).patch(wallet::deduct))
        .route(
            "/users/address",
            get(addresses::list)
                .post(addresses::save)
                .delete(addresses::delete),
        )
        .route("/promocode/verify", get(promos::verify))
        .route("/charity/check-discount", get(promos::check_charity))
        .route("/reviews/all", get(reviews::visible))
        .route("/newsletter/subscribe", post(newsletter::subscribe))
        .route("/orders/create", post(orders::create))
        .route("/orders/{id}", get(orders::show))
        .route(
            "/orderpaymentconfirmation",
            post(payments::record_confirmation),
        )
}

/// Routes that call paid upstream APIs.
pub fn upstream_routes() -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::reply))
        .route("/sumup/checkout", post(sumup::create_checkout))
        .route("/sumup/checkout/{id}", put(sumup::process_checkout))
        .route("/sumup/check-sumup", post(sumup::check_checkout))
        .route("/payments/reconcile", post(payments::reconcile))
        .route("/checkout", post(orders::checkout))
        .layer(api_rate_limiter())
}

/// Staff sign-in routes.
pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/login", post(staff::admin_login))
        .route("/delivery/login", post(staff::delivery_login))
        .layer(login_rate_limiter())
}

/// Staff dashboard and courier routes.
pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/logout", post(staff::logout))
        .route("/admin/reviews", get(reviews::moderation_list))
        .route("/admin/reviews/{id}", patch(reviews::set_visibility))
        .route(
            "/admin/categories",
            get(catalog::admin_categories).post(catalog::create_category),
        )
        .route("/admin/categories/{id}", put(catalog::update_category))
        .route("/admin-users", get(staff::list).post(staff::create))
        .route("/delivery/logout", post(staff::logout))
        .route("/delivery/session", get(staff::delivery_session))
        .route("/delivery/update", post(delivery::update))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(customer_routes())
        .merge(upstream_routes())
        .merge(login_routes())
        .merge(staff_routes());

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_user_id() {
        assert!(require_user_id(Some("6f1c1c3e-9a4b-4c8e-8b71-1a2b3c4d5e6f")).is_ok());
        assert!(matches!(
            require_user_id(None),
            Err(AppError::BadRequest(msg)) if msg == "User ID is required"
        ));
        assert!(matches!(
            require_user_id(Some("  ")),
            Err(AppError::BadRequest(msg)) if msg == "User ID is required"
        ));
        assert!(matches!(
            require_user_id(Some("42")),
            Err(AppError::BadRequest(msg)) if msg == "Invalid user ID"
        ));
    }
}
