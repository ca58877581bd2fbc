//! Black-box tests for the storefront API.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (pw-cli migrate)
//! - The example catalog seeded (pw-cli seed catalog ...)
//! - The storefront server running (cargo run -p purewell-storefront)

#![allow(clippy::unwrap_used)]

use purewell_integration_tests::{
    individual_registration, session_client, storefront_url, unique_email,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

const PASSWORD: &str = "cleanwater42";

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health() {
    let resp = session_client()
        .get(format!("{}/health", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_category_tree_has_two_levels() {
    let tree: Value = session_client()
        .get(format!("{}/api/categories", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let roots = tree.as_array().unwrap();
    assert!(!roots.is_empty());
    for root in roots {
        assert!(root["parent_id"].is_null());
        for child in root["children"].as_array().unwrap() {
            assert_eq!(child["parent_id"], root["id"]);
            assert!(child.get("children").is_none());
        }
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_guest_sees_customer_price_only() {
    let page: Value = session_client()
        .get(format!("{}/api/products?per_page=5", storefront_url()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    for item in page["items"].as_array().unwrap() {
        assert_eq!(item["price"]["view"], "customer");
        assert!(item.get("stock").is_none());
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_me_requires_sign_in() {
    let resp = session_client()
        .get(format!("{}/api/auth/me", storefront_url()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_register_login_and_guest_cart_merge() {
    let client = session_client();
    let base = storefront_url();
    let email = unique_email("shopper");

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&individual_registration(&email, PASSWORD))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let member: Value = resp.json().await.unwrap();
    assert_eq!(member["status"], "active");
    assert!(member.get("password_hash").is_none());

    // Put something in the guest cart before signing in.
    let page: Value = client
        .get(format!("{base}/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["available"] == true)
        .cloned()
        .unwrap();
    let resp = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product["id"], "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({ "email": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cart: Value = client
        .get(format!("{base}/api/cart"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cart["item_count"], 2);

    let resp = client
        .post(format!("{base}/api/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_duplicate_email_rejected() {
    let client = session_client();
    let base = storefront_url();
    let email = unique_email("dup");

    for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
        let resp = client
            .post(format!("{base}/api/auth/register"))
            .json(&individual_registration(&email, PASSWORD))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_headquarters_waits_for_approval() {
    let client = session_client();
    let base = storefront_url();
    let email = unique_email("hq");
    let digits = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({
            "email": email,
            "password": PASSWORD,
            "name": "Head Office",
            "phone": "02-555-0100",
            "member_type": "headquarters",
            "business_name": "Clear Springs Co.",
            "business_number": format!("{digits:010}"),
            "representative": "Kim Purewell",
        }))
        .send()
        .await
        .unwrap();

    // Random digits rarely form a valid registration number; either way the
    // account must not be usable yet.
    if resp.status() == StatusCode::CREATED {
        let member: Value = resp.json().await.unwrap();
        assert_eq!(member["status"], "pending");

        let resp = client
            .post(format!("{base}/api/auth/login"))
            .json(&json!({ "email": email, "password": PASSWORD }))
            .send()
            .await
            .unwrap();
        assert!(!resp.status().is_success());
    } else {
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_guest_quote_has_no_points() {
    let client = session_client();
    let base = storefront_url();

    let page: Value = client
        .get(format!("{base}/api/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let product = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["available"] == true)
        .cloned()
        .unwrap();
    client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .unwrap();

    let resp = client
        .post(format!("{base}/api/checkout/quote"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let view: Value = resp.json().await.unwrap();
    assert_eq!(view["quote"]["earned_points"], "0");
}
