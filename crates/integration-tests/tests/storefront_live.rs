//! End-to-end tests against a running storefront.
//!
//! These tests require:
//! - A migrated and seeded `PostgreSQL` database (`samara-cli migrate`,
//!   `samara-cli seed cities`)
//! - The storefront running (`cargo run -p samara-storefront`)
//! - A staff admin account whose credentials are in `SAMARA_ADMIN_USERNAME`
//!   and `SAMARA_ADMIN_PASSWORD`
//!
//! Run with: cargo test -p samara-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the storefront API (configurable via environment).
fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// Sign in as the configured admin and return the cookie-carrying client.
async fn admin_client() -> Client {
    let client = client();
    let username = std::env::var("SAMARA_ADMIN_USERNAME").expect("SAMARA_ADMIN_USERNAME");
    let password = std::env::var("SAMARA_ADMIN_PASSWORD").expect("SAMARA_ADMIN_PASSWORD");

    let resp = client
        .post(format!("{}/api/admin/login", base_url()))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to sign in");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to read login body");
    assert_eq!(body["role"], "admin");
    client
}

// ============================================================================
// Catalog
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_cities_are_active_and_sorted() {
    let body: Value = client()
        .get(format!("{}/api/cities", base_url()))
        .send()
        .await
        .expect("Failed to get cities")
        .json()
        .await
        .expect("Failed to read cities");

    let cities = body["cities"].as_array().expect("cities array");
    assert!(!cities.is_empty(), "seed cities first");
    assert!(cities.iter().all(|c| c["is_active"] == "Y"));

    let names: Vec<&str> = cities.iter().filter_map(|c| c["name"].as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort_unstable();
    assert_eq!(names, sorted);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_reviews_pagination() {
    let body: Value = client()
        .get(format!("{}/api/reviews/all?page=1&pageSize=2", base_url()))
        .send()
        .await
        .expect("Failed to get reviews")
        .json()
        .await
        .expect("Failed to read reviews");

    let reviews = body["reviews"].as_array().expect("reviews array");
    assert!(reviews.len() <= 2);
    assert!(body["total"].as_i64().is_some());
    for review in reviews {
        assert!(review.get("app_users").is_some());
        assert!(review.get("createdAt").is_some());
    }
}

// ============================================================================
// Customer
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_customer_has_empty_wallet() {
    let user = Uuid::new_v4();
    let body: Value = client()
        .get(format!("{}/api/users/wallet?userId={user}", base_url()))
        .send()
        .await
        .expect("Failed to get wallet")
        .json()
        .await
        .expect("Failed to read wallet");
    assert_eq!(body, json!({ "points": 0 }));

    let resp = client()
        .patch(format!("{}/api/users/wallet", base_url()))
        .json(&json!({ "userId": user, "deduct": 300 }))
        .send()
        .await
        .expect("Failed to deduct");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("Failed to read error");
    assert_eq!(body["error"], "Insufficient points");
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_unknown_promo_code_is_invalid() {
    let body: Value = client()
        .get(format!("{}/api/promocode/verify?code=NOPE-{}", base_url(), Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to verify promo")
        .json()
        .await
        .expect("Failed to read promo");
    assert_eq!(body["valid"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_foreign_order_is_not_found() {
    let resp = client()
        .get(format!("{}/api/orders/1?userId={}", base_url(), Uuid::new_v4()))
        .send()
        .await
        .expect("Failed to get order");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Staff
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront, database and admin credentials"]
async fn test_admin_session_round_trip() {
    let client = admin_client().await;

    let resp = client
        .get(format!("{}/api/admin/reviews", base_url()))
        .send()
        .await
        .expect("Failed to list reviews");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to read reviews");
    assert!(body["stats"]["total"].as_i64().is_some());

    // An admin session is not a courier session
    let resp = client
        .get(format!("{}/api/delivery/session", base_url()))
        .send()
        .await
        .expect("Failed to get delivery session");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    client
        .post(format!("{}/api/admin/logout", base_url()))
        .send()
        .await
        .expect("Failed to sign out");
    let resp = client
        .get(format!("{}/api/admin/reviews", base_url()))
        .send()
        .await
        .expect("Failed to list reviews");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront, database and admin credentials"]
async fn test_duplicate_staff_username_conflicts() {
    let client = admin_client().await;
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    let username = format!("courier-{suffix}");
    let payload = json!({ "username": username, "password": "van-route-19", "role": "delivery" });

    let resp = client
        .post(format!("{}/api/admin-users", base_url()))
        .json(&payload)
        .send()
        .await
        .expect("Failed to create staff");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = client
        .post(format!("{}/api/admin-users", base_url()))
        .json(&payload)
        .send()
        .await
        .expect("Failed to create staff");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The new courier can sign in to the delivery area only
    let courier = self::client();
    let resp = courier
        .post(format!("{}/api/delivery/login", base_url()))
        .json(&json!({ "username": username, "password": "van-route-19" }))
        .send()
        .await
        .expect("Failed to sign in courier");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = self::client()
        .post(format!("{}/api/admin/login", base_url()))
        .json(&json!({ "username": username, "password": "van-route-19" }))
        .send()
        .await
        .expect("Failed to attempt admin sign in");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}
