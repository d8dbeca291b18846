//! End-to-end flows against a running server.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`adburst migrate`)
//! - The server running (`cargo run -p adburst-server`)
//! - `ADBURST_IDENTITY_SECRET` matching the server's secret
//!
//! Run with: cargo test -p adburst-integration-tests -- --ignored

use adburst_core::{AspectRatio, CreationId, CreationKind, UserId};
use adburst_integration_tests::{live_base_url, live_identity_secret, live_pool};
use adburst_server::db::{CreationRepository, CreditRepository};
use adburst_server::models::NewCreation;
use adburst_server::routes::auth::{SIGNATURE_HEADER, sign_email};
use chrono::{Duration, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// A client with a fresh session for a unique user.
async fn signed_in_client() -> (Client, Value) {
    let client = Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client");

    let email = format!(
        "it-{}@example.com",
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    );
    let signature = sign_email(live_identity_secret().as_bytes(), &email);

    let resp = client
        .post(format!("{}/api/auth/session", live_base_url()))
        .header(SIGNATURE_HEADER, signature)
        .json(&json!({"email": email, "display_name": "Integration"}))
        .send()
        .await
        .expect("Failed to establish session");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.expect("Failed to parse session");
    assert_eq!(body["created"], true);
    (client, body["user"].clone())
}

fn user_id(user: &Value) -> UserId {
    let id = user["id"].as_i64().expect("user id");
    UserId::new(i32::try_from(id).expect("user id fits i32"))
}

/// Leave the user with exactly `credits`.
async fn set_balance(user: &Value, credits: i32) {
    let current = i32::try_from(user["credits"].as_i64().expect("credits")).expect("credits fit i32");
    CreditRepository::new(&live_pool().await)
        .adjust(user_id(user), credits - current, "integration test")
        .await
        .expect("Failed to adjust credits");
}

// ============================================================================
// Session
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_session_round_trip() {
    let (client, user) = signed_in_client().await;
    let base_url = live_base_url();

    let me: Value = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user")
        .json()
        .await
        .expect("Failed to parse user");
    assert_eq!(me["id"], user["id"]);
    assert_eq!(me["tier"], "free");

    let resp = client
        .delete(format!("{base_url}/api/auth/session"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .get(format!("{base_url}/api/auth/me"))
        .send()
        .await
        .expect("Failed to get current user");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Brand kits
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_brand_kit_activation_is_exclusive() {
    let (client, _) = signed_in_client().await;
    let base_url = live_base_url();

    let mut ids = Vec::new();
    for name in ["Summer", "Winter"] {
        let resp = client
            .post(format!("{base_url}/api/brand-kits"))
            .json(&json!({
                "name": name,
                "primary_color": "#1E40AF",
                "secondary_color": "#f59e0b",
                "accent_color": "#10B981"
            }))
            .send()
            .await
            .expect("Failed to create brand kit");
        assert_eq!(resp.status(), StatusCode::CREATED);
        let kit: Value = resp.json().await.expect("Failed to parse brand kit");
        ids.push(kit["id"].as_i64().expect("numeric id"));
    }

    let resp = client
        .post(format!("{base_url}/api/brand-kits/{}/activate", ids[1]))
        .send()
        .await
        .expect("Failed to activate brand kit");
    assert_eq!(resp.status(), StatusCode::OK);

    let kits: Vec<Value> = client
        .get(format!("{base_url}/api/brand-kits"))
        .send()
        .await
        .expect("Failed to list brand kits")
        .json()
        .await
        .expect("Failed to parse brand kits");
    let active: Vec<i64> = kits
        .iter()
        .filter(|k| k["is_active"] == true)
        .filter_map(|k| k["id"].as_i64())
        .collect();
    assert_eq!(active, vec![ids[1]]);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_brand_kit_rejects_bad_colour() {
    let (client, _) = signed_in_client().await;

    let resp = client
        .post(format!("{}/api/brand-kits", live_base_url()))
        .json(&json!({
            "name": "Broken",
            "primary_color": "blue",
            "secondary_color": "#000000",
            "accent_color": "#ffffff"
        }))
        .send()
        .await
        .expect("Failed to post brand kit");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Credits and generation limits
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_signup_credits_and_free_tier_burst_limit() {
    let (client, _) = signed_in_client().await;
    let base_url = live_base_url();

    let summary: Value = client
        .get(format!("{base_url}/api/credits"))
        .send()
        .await
        .expect("Failed to get credits")
        .json()
        .await
        .expect("Failed to parse credits");
    assert_eq!(summary["tier"], "free");
    assert_eq!(summary["max_variations"], 2);
    assert!(summary["credits"].as_i64().unwrap_or_default() > 0);

    // Four default ratios exceed the free tier
    let resp = client
        .post(format!("{base_url}/api/adburst"))
        .header("x-forwarded-for", "203.0.113.50")
        .json(&json!({"prompt": "Spring collection launch"}))
        .send()
        .await
        .expect("Failed to post burst");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_generation_without_credits_is_payment_required() {
    let (client, user) = signed_in_client().await;
    let base_url = live_base_url();
    set_balance(&user, 0).await;

    let resp = client
        .post(format!("{base_url}/api/generate"))
        .header("x-forwarded-for", "203.0.113.51")
        .json(&json!({"prompt": "Bake sale this Saturday"}))
        .send()
        .await
        .expect("Failed to post generate");
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);

    // Not even the first variation is affordable
    let resp = client
        .post(format!("{base_url}/api/adburst"))
        .header("x-forwarded-for", "203.0.113.51")
        .json(&json!({"prompt": "Bake sale this Saturday", "variations": 2}))
        .send()
        .await
        .expect("Failed to post burst");
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
#[ignore = "Requires running server, database, Claude and Chromium"]
async fn test_burst_stops_when_credits_run_out() {
    let (client, user) = signed_in_client().await;
    let base_url = live_base_url();
    set_balance(&user, 1).await;

    let resp = client
        .post(format!("{base_url}/api/adburst"))
        .header("x-forwarded-for", "203.0.113.52")
        .json(&json!({"prompt": "Farmers market opening", "aspect_ratios": ["1:1", "9:16"]}))
        .send()
        .await
        .expect("Failed to post burst");
    assert_eq!(resp.status(), StatusCode::OK);
    let burst: Value = resp.json().await.expect("Failed to parse burst");
    let variations = burst["variations"].as_array().expect("variations");

    // Fallbacks cost nothing and persist nothing; each design costs one credit.
    let designs = variations.iter().filter(|v| v["fallback"] == false).count();
    for variation in variations {
        if variation["fallback"] == true {
            assert!(variation.get("creation").is_none());
            assert!(variation["message"].is_string());
        } else {
            assert!(variation["creation"]["id"].is_number());
        }
    }
    assert!(designs <= 1);
    assert_eq!(burst["credits_remaining"], 1 - i64::try_from(designs).unwrap_or_default());
    if designs == 1 && variations.len() < 2 {
        assert_eq!(burst["stopped_early"], true);
    } else {
        assert_eq!(burst["stopped_early"], false);
    }
}

// ============================================================================
// Social scheduling
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_post_cannot_link_another_users_creation() {
    let (_, owner) = signed_in_client().await;
    let (client, _) = signed_in_client().await;
    let base_url = live_base_url();

    let pool = live_pool().await;
    let (creation, _) = CreationRepository::new(&pool)
        .create_charged(
            &NewCreation {
                user_id: user_id(&owner),
                brand_kit_id: None,
                kind: CreationKind::Flyer,
                image_url: format!("{base_url}/uploads/creations/owner.png"),
                headline: Some("Owner only".to_string()),
                content: None,
                style_prompt: "Owner only".to_string(),
                template_id: None,
                aspect_ratio: AspectRatio::Square,
                metadata: json!({}),
            },
            1,
        )
        .await
        .expect("Failed to create creation");
    let foreign: CreationId = creation.id;

    let account: Value = client
        .post(format!("{base_url}/api/social-accounts"))
        .json(&json!({"platform": "facebook", "account_name": "Corner Cafe"}))
        .send()
        .await
        .expect("Failed to create account")
        .json()
        .await
        .expect("Failed to parse account");

    let resp = client
        .post(format!("{base_url}/api/social-posts"))
        .json(&json!({
            "social_account_id": account["id"],
            "creation_id": foreign,
            "caption": "Not mine",
            "scheduled_at": Utc::now() + Duration::days(1)
        }))
        .send()
        .await
        .expect("Failed to schedule post");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let post: Value = client
        .post(format!("{base_url}/api/social-posts"))
        .json(&json!({
            "social_account_id": account["id"],
            "caption": "Mine",
            "scheduled_at": Utc::now() + Duration::days(1)
        }))
        .send()
        .await
        .expect("Failed to schedule post")
        .json()
        .await
        .expect("Failed to parse post");

    let resp = client
        .put(format!("{base_url}/api/social-posts/{}", post["id"]))
        .json(&json!({"creation_id": foreign}))
        .send()
        .await
        .expect("Failed to update post");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_schedule_and_edit_post() {
    let (client, _) = signed_in_client().await;
    let base_url = live_base_url();

    let account: Value = client
        .post(format!("{base_url}/api/social-accounts"))
        .json(&json!({
            "platform": "instagram",
            "account_name": "@bakery",
            "credentials": {"webhook_url": "https://hooks.example.com/bakery", "token": "secret"}
        }))
        .send()
        .await
        .expect("Failed to create account")
        .json()
        .await
        .expect("Failed to parse account");
    assert!(account.get("credentials").is_none());

    let resp = client
        .post(format!("{base_url}/api/social-posts"))
        .json(&json!({
            "social_account_id": account["id"],
            "caption": "Fresh bread every morning",
            "hashtags": ["#bakery", "bread", "bakery"],
            "scheduled_at": Utc::now() + Duration::days(1)
        }))
        .send()
        .await
        .expect("Failed to schedule post");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post: Value = resp.json().await.expect("Failed to parse post");
    assert_eq!(post["status"], "scheduled");
    assert_eq!(post["hashtags"], json!(["bakery", "bread"]));

    let updated: Value = client
        .put(format!("{base_url}/api/social-posts/{}", post["id"]))
        .json(&json!({"caption": "Fresh bread, all day"}))
        .send()
        .await
        .expect("Failed to update post")
        .json()
        .await
        .expect("Failed to parse post");
    assert_eq!(updated["caption"], "Fresh bread, all day");
    assert_eq!(updated["hashtags"], post["hashtags"]);

    let resp = client
        .get(format!("{base_url}/api/social-posts?status=bogus"))
        .send()
        .await
        .expect("Failed to list posts");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Inspiration
// ============================================================================

#[tokio::test]
#[ignore = "Requires running server and database"]
async fn test_save_and_delete_inspiration() {
    let (client, _) = signed_in_client().await;
    let base_url = live_base_url();

    let resp = client
        .post(format!("{base_url}/api/ad-inspiration/saved"))
        .json(&json!({
            "title": "Competitor summer promo",
            "image_url": "https://images.example.com/promo.jpg",
            "platform": "facebook"
        }))
        .send()
        .await
        .expect("Failed to save ad");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let ad: Value = resp.json().await.expect("Failed to parse ad");

    let resp = client
        .delete(format!("{base_url}/api/ad-inspiration/saved/{}", ad["id"]))
        .send()
        .await
        .expect("Failed to delete ad");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = client
        .delete(format!("{base_url}/api/ad-inspiration/saved/{}", ad["id"]))
        .send()
        .await
        .expect("Failed to delete ad");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
