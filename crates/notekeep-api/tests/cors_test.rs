//! CORS and request-id behavior of the router.
//!
//! Origins come from an explicit allow list; nothing is served with a
//! wildcard origin.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    Router,
};
use notekeep_api::{build_router, config::parse_allowed_origins, AppState};
use notekeep_core::mock::MemoryStore;
use tower::ServiceExt;

fn app(origins: &str) -> Router {
    build_router(
        AppState::new(Arc::new(MemoryStore::new())),
        parse_allowed_origins(origins),
    )
}

fn preflight(origin: &str) -> Request<Body> {
    Request::builder()
        .method(Method::OPTIONS)
        .uri("/notes")
        .header(header::ORIGIN, origin)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_preflight_from_allowed_origin() {
    let resp = app("https://notes.example.com,http://localhost:3000")
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("http://localhost:3000"))
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS),
        Some(&HeaderValue::from_static("true"))
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_MAX_AGE),
        Some(&HeaderValue::from_static("3600"))
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    for method in ["GET", "POST", "PUT", "PATCH", "DELETE"] {
        assert!(methods.contains(method), "missing {} in {}", method, methods);
    }
}

#[tokio::test]
async fn test_preflight_from_unknown_origin_gets_no_cors_headers() {
    let resp = app("https://notes.example.com")
        .oneshot(preflight("https://evil.example.com"))
        .await
        .unwrap();

    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_wildcard_falls_back_to_default_origin() {
    let resp = app("*")
        .oneshot(preflight("https://anything.example.com"))
        .await
        .unwrap();
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    let resp = app("*")
        .oneshot(preflight("http://localhost:3000"))
        .await
        .unwrap();
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
        Some(&HeaderValue::from_static("http://localhost:3000"))
    );
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let resp = app("")
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let id = resp
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .expect("x-request-id header");
    let parsed = uuid_version(id);
    assert_eq!(parsed, Some('7'));
}

#[tokio::test]
async fn test_incoming_request_id_is_kept() {
    let resp = app("")
        .oneshot(
            Request::get("/")
                .header("x-request-id", "client-supplied")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        resp.headers().get("x-request-id"),
        Some(&HeaderValue::from_static("client-supplied"))
    );
}

/// Version nibble of a hyphenated UUID string.
fn uuid_version(id: &str) -> Option<char> {
    let groups: Vec<&str> = id.split('-').collect();
    if groups.len() != 5 {
        return None;
    }
    groups[2].chars().next()
}
