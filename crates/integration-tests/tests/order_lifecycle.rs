//! Black-box tests that span both servers: orders paid with points,
//! cancellation, account status changes and the payment webhook.
//!
//! These tests require everything `admin_api` and `storefront_api` need,
//! both servers running against the same database, and for the webhook
//! test a storefront started with a webhook secret.

#![allow(clippy::unwrap_used)]

use purewell_integration_tests::{
    admin_url, individual_registration, session_client, sign_in_admin, storefront_url,
    unique_email,
};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Value, json};

const PASSWORD: &str = "filter-change-2026";

/// Amounts serialize as strings; accept numbers too.
fn amount(value: &Value) -> Decimal {
    value
        .as_str()
        .map_or_else(|| value.to_string(), str::to_string)
        .parse()
        .unwrap()
}

/// Register and sign in a fresh individual member. Returns the member id
/// as it appears in the registration response.
async fn signed_in_shopper(client: &Client) -> Value {
    let base = storefront_url();
    let email = unique_email("lifecycle");

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&individual_registration(&email, PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let member: Value = resp.json().await.unwrap();

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    member["id"].clone()
}

/// A product above the free shipping threshold, in a category of its own.
async fn create_product(admin: &Client, stock: i64) -> Value {
    let base = format!("{}/api/admin", admin_url());
    let suffix = uuid::Uuid::new_v4().simple().to_string();

    let category: Value = admin
        .post(format!("{base}/categories"))
        .json(&json!({ "name": format!("Lifecycle {suffix}") }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let resp = admin
        .post(format!("{base}/products"))
        .json(&json!({
            "category_id": category["id"],
            "name": "Whole House Filter",
            "model_code": format!("WH-{suffix}"),
            "customer_price": "60000",
            "business_price": "52000",
            "stock": stock,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.unwrap()
}

async fn product_stock(admin: &Client, product_id: &Value) -> i64 {
    let product: Value = admin
        .get(format!("{}/api/admin/products/{product_id}", admin_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    product["stock"].as_i64().unwrap()
}

async fn points_balance(client: &Client) -> Decimal {
    let view: Value = client
        .get(format!("{}/api/account/points", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    amount(&view["balance"])
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and admin credentials"]
async fn test_points_order_cancel_restocks_and_restores_points() {
    let admin = session_client();
    sign_in_admin(&admin).await;
    let product = create_product(&admin, 2).await;

    let shopper = session_client();
    let member_id = signed_in_shopper(&shopper).await;
    let base = storefront_url();

    let resp = admin
        .post(format!("{}/api/admin/members/{member_id}/points", admin_url()))
        .json(&json!({ "delta": "60000", "reason": "lifecycle test" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = shopper
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product["id"], "quantity": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Points cover the whole amount, so no gateway is involved.
    let resp = shopper
        .post(format!("{base}/api/checkout"))
        .json(&json!({
            "recipient_name": "Test Shopper",
            "recipient_phone": "010-1234-5678",
            "postal_code": "06236",
            "address_line1": "123 Teheran-ro",
            "points": "60000",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let request: Value = resp.json().await.unwrap();
    assert_eq!(request["paid"], true);
    assert_eq!(amount(&request["amount"]), Decimal::ZERO);
    let order_number = request["order_number"].as_str().unwrap().to_string();

    assert_eq!(product_stock(&admin, &product["id"]).await, 1);
    assert_eq!(points_balance(&shopper).await, Decimal::ZERO);

    let resp = shopper
        .post(format!("{base}/api/orders/{order_number}/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cancelled: Value = resp.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    assert_eq!(product_stock(&admin, &product["id"]).await, 2);
    assert_eq!(points_balance(&shopper).await, Decimal::from(60_000));

    // Already reversed; nothing is put back twice.
    let resp = shopper
        .post(format!("{base}/api/orders/{order_number}/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(product_stock(&admin, &product["id"]).await, 2);
}

#[tokio::test]
#[ignore = "Requires running storefront and admin servers and admin credentials"]
async fn test_rejected_member_is_signed_out() {
    let shopper = session_client();
    let member_id = signed_in_shopper(&shopper).await;
    let base = storefront_url();

    let resp = shopper
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let admin = session_client();
    sign_in_admin(&admin).await;
    let resp = admin
        .patch(format!("{}/api/admin/members/{member_id}/status", admin_url()))
        .json(&json!({ "status": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = shopper
        .get(format!("{base}/api/auth/me"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    // The session is gone; browsing continues as a guest.
    let resp = shopper
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server with a webhook secret"]
async fn test_webhook_requires_valid_signature() {
    let client = session_client();
    let url = format!("{}/api/payments/webhook", storefront_url());
    let body = json!({
        "imp_uid": "imp_000000000000",
        "merchant_uid": "20260101-AAAAAAAA",
        "status": "paid",
    });

    let resp = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = client
        .post(&url)
        .header("webhook-id", "msg_lifecycle")
        .header("webhook-timestamp", chrono::Utc::now().timestamp().to_string())
        .header("webhook-signature", "v1,bm90LWEtc2lnbmF0dXJl")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let error: Value = resp.json().await.unwrap();
    assert!(error["error"].is_string());
}
