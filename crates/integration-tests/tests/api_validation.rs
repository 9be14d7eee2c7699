//! Request validation and staff access control.
//!
//! The router is served in-process on a pool that never connects, so every
//! request here must be answered before touching the database or, where
//! noted, must fail cleanly when it does.

#![allow(clippy::unwrap_used)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use samara_integration_tests::{send, test_app};

const CUSTOMER: &str = "6f1c1c3e-9a4b-4c8e-8b71-1a2b3c4d5e6f";

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_liveness() {
    let (status, body) = send(test_app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_readiness_without_database() {
    let (status, _) = send(test_app(), "GET", "/health/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_security_and_request_id_headers() {
    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "edge-42")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["cache-control"], "no-store, max-age=0");
    assert_eq!(headers["x-request-id"], "edge-42");
}

// ============================================================================
// Customer endpoints
// ============================================================================

#[tokio::test]
async fn test_wallet_requires_user_id() {
    let (status, body) = send(test_app(), "GET", "/api/users/wallet", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "User ID is required");

    let (status, body) = send(test_app(), "GET", "/api/users/wallet?userId=42", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid user ID");
}

#[tokio::test]
async fn test_wallet_deduct_requires_positive_amount() {
    for deduct in [json!(0), json!(-300), json!("300"), json!(null)] {
        let (status, body) = send(
            test_app(),
            "PATCH",
            "/api/users/wallet",
            Some(json!({ "userId": CUSTOMER, "deduct": deduct })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "deduct = {deduct}");
        assert_eq!(body["error"], "userId and positive deduct amount are required");
    }
}

#[tokio::test]
async fn test_promo_verify_requires_code() {
    let (status, _) = send(test_app(), "GET", "/api/promocode/verify?code=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_new_city_requires_a_name() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/users/address",
        Some(json!({
            "userId": CUSTOMER,
            "addressData": { "city_id": "new-city", "city": "", "street": "Quay St" },
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please enter a city name");
}

#[tokio::test]
async fn test_order_create_requires_transaction_code() {
    let (status, _) = send(
        test_app(),
        "POST",
        "/api/orders/create",
        Some(json!({ "userId": CUSTOMER, "addressData": { "city": "Cork" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_requires_an_address() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/checkout",
        Some(json!({ "userId": CUSTOMER, "contactInfo": {} })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Please select a delivery address");
}

#[tokio::test]
async fn test_reviews_report_database_failure() {
    let (status, body) = send(test_app(), "GET", "/api/reviews/all", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to fetch reviews");
}

// ============================================================================
// Newsletter
// ============================================================================

#[tokio::test]
async fn test_newsletter_validation() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/newsletter/subscribe",
        Some(json!({ "email": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Email is required");

    let (status, body) = send(
        test_app(),
        "POST",
        "/api/newsletter/subscribe",
        Some(json!({ "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid email format");
}

#[tokio::test]
async fn test_newsletter_without_resend_key() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/newsletter/subscribe",
        Some(json!({ "email": "nadia@example.ie", "firstName": "Nadia" })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Server configuration error");
}

// ============================================================================
// Payments
// ============================================================================

#[tokio::test]
async fn test_sumup_checkout_rejects_bad_amounts() {
    for amount in [json!(0), json!(-1), json!("12.50"), json!(null)] {
        let (status, body) = send(
            test_app(),
            "POST",
            "/api/sumup/checkout",
            Some(json!({ "amount": amount })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "amount = {amount}");
        assert_eq!(body["error"], "Invalid amount");
    }
}

#[tokio::test]
async fn test_check_sumup_requires_checkout_id() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/sumup/check-sumup",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "success": false, "error": "checkout_id is required" })
    );
}

#[tokio::test]
async fn test_payment_confirmation_requires_user() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/orderpaymentconfirmation",
        Some(json!({ "checkout_id": "chk_1", "status": "PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "user_id is required");
}

// ============================================================================
// Chat
// ============================================================================

#[tokio::test]
async fn test_chat_rejects_missing_messages() {
    for payload in [json!({}), json!({ "messages": "hi" })] {
        let (status, body) = send(test_app(), "POST", "/api/chat", Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No messages provided or invalid format");
    }
}

#[tokio::test]
async fn test_chat_reports_upstream_failure() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/api/chat",
        Some(json!({ "messages": [{ "role": "user", "content": "Do you sell dates?" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "OpenAI API error");
}

// ============================================================================
// Staff access control
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_a_session() {
    for (method, uri) in [
        ("GET", "/api/admin/reviews"),
        ("GET", "/api/admin/categories"),
        ("GET", "/api/admin-users"),
    ] {
        let (status, body) = send(test_app(), method, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["error"], "Not logged in");
    }
}

#[tokio::test]
async fn test_delivery_routes_require_a_session() {
    let (status, _) = send(test_app(), "GET", "/api/delivery/session", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        test_app(),
        "POST",
        "/api/delivery/update",
        Some(json!({ "order_id": 1, "status": "delivered" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_credentials() {
    for uri in ["/api/admin/login", "/api/delivery/login"] {
        let (status, body) = send(
            test_app(),
            "POST",
            uri,
            Some(json!({ "username": "  ", "password": "" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "username and password are required");
    }
}
