//! Black-box tests for the admin API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (pw-cli migrate)
//! - An admin account (pw-cli admin create) with its credentials in
//!   `ADMIN_TEST_EMAIL` and `PUREWELL_ADMIN_PASSWORD`
//! - The admin server running (cargo run -p purewell-admin)

#![allow(clippy::unwrap_used)]

use purewell_integration_tests::{admin_url, session_client, sign_in_admin};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_unauthenticated_requests_rejected() {
    let client = session_client();
    for path in ["/api/admin/dashboard", "/api/admin/members", "/api/admin/orders"] {
        let resp = client
            .get(format!("{}{path}", admin_url()))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_wrong_password_rejected() {
    let resp = session_client()
        .post(format!("{}/api/admin/auth/login", admin_url()))
        .json(&json!({ "email": "nobody@purewell.test", "password": "not-the-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server"]
async fn test_security_headers_present() {
    let resp = session_client()
        .get(format!("{}/health", admin_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_dashboard_summary() {
    let client = session_client();
    sign_in_admin(&client).await;

    let summary: Value = client
        .get(format!("{}/api/admin/dashboard", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(summary["today_order_count"].is_number());
    assert!(summary["low_stock"].is_array());
    let threshold = summary["low_stock_threshold"].as_i64().unwrap();
    for product in summary["low_stock"].as_array().unwrap() {
        assert!(product["stock"].as_i64().unwrap() <= threshold);
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_catalog_maintenance_round() {
    let client = session_client();
    sign_in_admin(&client).await;
    let base = format!("{}/api/admin", admin_url());
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    let resp = client
        .post(format!("{base}/categories"))
        .json(&json!({ "name": format!("Test {suffix}") }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let main: Value = resp.json().await.unwrap();

    let resp = client
        .post(format!("{base}/categories"))
        .json(&json!({ "parent_id": main["id"], "name": "Sub" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let sub: Value = resp.json().await.unwrap();

    // Only two levels.
    let resp = client
        .post(format!("{base}/categories"))
        .json(&json!({ "parent_id": sub["id"], "name": "Too deep" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = client
        .post(format!("{base}/products"))
        .json(&json!({
            "category_id": sub["id"],
            "name": "Test Cartridge",
            "model_code": format!("T-{suffix}"),
            "customer_price": "10000",
            "business_price": "8000",
            "stock": 3,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let product: Value = resp.json().await.unwrap();
    let product_url = format!("{base}/products/{}", product["id"]);

    // A category with products cannot be removed.
    let resp = client
        .delete(format!("{base}/categories/{}", sub["id"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = client
        .post(format!("{product_url}/stock"))
        .json(&json!({ "delta": -3 }))
        .send()
        .await
        .unwrap();
    let adjusted: Value = resp.json().await.unwrap();
    assert_eq!(adjusted["stock"], 0);
    assert_eq!(adjusted["status"], "sold_out");

    let resp = client
        .post(format!("{product_url}/stock"))
        .json(&json!({ "delta": -1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let deleted: Value = client
        .delete(&product_url)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(deleted["hidden"], false);

    for id in [&sub["id"], &main["id"]] {
        let resp = client
            .delete(format!("{base}/categories/{id}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
}

#[tokio::test]
#[ignore = "Requires running admin server and admin credentials"]
async fn test_order_date_window_must_be_ordered() {
    let client = session_client();
    sign_in_admin(&client).await;

    let resp = client
        .get(format!(
            "{}/api/admin/orders?from=2026-03-10&to=2026-03-01",
            admin_url()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
