//! In-process requests through the full router and middleware stack.
//!
//! Every request here is answered before any database access, so the lazy
//! pool behind [`test_app`] never connects.

#![allow(clippy::unwrap_used)]

use adburst_integration_tests::{TEST_CLIENT_IP, TEST_IDENTITY_SECRET, test_app};
use adburst_server::routes::auth::{SIGNATURE_HEADER, sign_email};
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
}

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = test_app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn send_json(request: Request<Body>) -> (StatusCode, Value) {
    let (status, _, body) = send(request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, _, body) = send(
        request(Method::GET, "/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test]
async fn test_request_id_echoed_and_generated() {
    let (_, headers, _) = send(
        request(Method::GET, "/health")
            .header("x-request-id", "req-abc-123")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(headers["x-request-id"], "req-abc-123");

    let (_, headers, _) = send(
        request(Method::GET, "/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(headers["x-request-id"].len(), 36);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    for (method, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/brand-kits"),
        (Method::GET, "/api/creations"),
        (Method::GET, "/api/my-flyers"),
        (Method::GET, "/api/social-posts?status=scheduled"),
        (Method::GET, "/api/ad-inspiration/search?q=coffee"),
        (Method::GET, "/api/credits"),
        (Method::DELETE, "/api/creations/1/share"),
    ] {
        let (status, body) = send_json(
            request(method.clone(), uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body, json!({"error": "Authentication required"}));
    }
}

#[tokio::test]
async fn test_generate_requires_session_before_body() {
    let (status, _) = send_json(
        request(Method::POST, "/api/generate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_rejects_missing_signature() {
    let (status, body) = send_json(
        request(Method::POST, "/api/auth/session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"email":"ada@example.com"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing identity signature");
}

#[tokio::test]
async fn test_session_rejects_signature_for_other_email() {
    let signature = sign_email(TEST_IDENTITY_SECRET.as_bytes(), "eve@example.com");
    let (status, body) = send_json(
        request(Method::POST, "/api/auth/session")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(r#"{"email":"ada@example.com"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid identity signature");
}

#[tokio::test]
async fn test_session_rejects_malformed_email_after_signature() {
    let signature = sign_email(TEST_IDENTITY_SECRET.as_bytes(), "not-an-email");
    let (status, body) = send_json(
        request(Method::POST, "/api/auth/session")
            .header(header::CONTENT_TYPE, "application/json")
            .header(SIGNATURE_HEADER, signature)
            .body(Body::from(r#"{"email":"not-an-email"}"#))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid email"));
}

#[tokio::test]
async fn test_malformed_json_is_a_json_error() {
    let (status, body) = send_json(
        request(Method::POST, "/api/auth/session")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\":"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_logout_without_session() {
    let (status, _, _) = send(
        request(Method::DELETE, "/api/auth/session")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_unknown_route() {
    let (status, _, _) = send(
        request(Method::GET, "/api/nope")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
