//! End-to-end tests for the request admission pipeline.
//!
//! These drive the fully composed router in-memory via
//! `tower::ServiceExt::oneshot` - no sockets, no sleeping. The mounted
//! sub-router is a test double, since the pipeline treats it as opaque.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::routing::get;
use polygon_core::{Config, build_router};
use tower::ServiceExt;

/// Configuration with a quota small enough to exhaust in a test.
fn config_with_quota(max_requests: u32) -> Config {
    Config {
        rate_limit_max_requests: max_requests,
        rate_limit_window: Duration::from_secs(60),
        ..Config::default()
    }
}

/// A stand-in for the mounted API router.
fn test_api() -> Router {
    Router::new()
        .route("/x", get(|| async { "business response" }))
        .route("/boom", get(|| async { panic!("business logic fault"); }))
}

fn request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn quota_admits_exactly_n_then_probe_still_answers() {
    // N=2, D=1 minute: of three requests in the same window, exactly two
    // reach the mounted router and one is rejected with 429.
    let app = build_router(&config_with_quota(2), test_api());

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let resp = app
            .clone()
            .oneshot(request(Method::GET, "/api/v1/x"))
            .await
            .unwrap();
        statuses.push(resp.status());
    }

    let ok = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let rejected = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(ok, 2);
    assert_eq!(rejected, 1);

    // The probe is unaffected by the exhausted window
    let probe = app.oneshot(request(Method::GET, "/status")).await.unwrap();
    assert_eq!(probe.status(), StatusCode::OK);
}

#[tokio::test]
async fn rejection_carries_rate_limit_headers() {
    let app = build_router(&config_with_quota(1), test_api());

    let first = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/x"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .oneshot(request(Method::GET, "/api/v1/x"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(second.headers()["X-RateLimit-Limit"], "1");
    assert_eq!(second.headers()["X-RateLimit-Remaining"], "0");
    assert!(second.headers().contains_key("Retry-After"));
}

#[tokio::test]
async fn no_store_headers_on_every_response_kind() {
    let app = build_router(&config_with_quota(1), test_api());

    // Routed response
    let routed = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/x"))
        .await
        .unwrap();
    assert_eq!(routed.status(), StatusCode::OK);

    // Rate-limited rejection (window now exhausted)
    let rejected = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/x"))
        .await
        .unwrap();
    assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);

    // Probe short-circuit
    let probe = app.oneshot(request(Method::GET, "/status")).await.unwrap();
    assert_eq!(probe.status(), StatusCode::OK);

    for (label, resp) in [("routed", routed), ("rejected", rejected), ("probe", probe)] {
        let cache_control = resp
            .headers()
            .get("cache-control")
            .unwrap_or_else(|| panic!("{label} response missing cache-control"));
        assert!(
            cache_control.to_str().unwrap().contains("no-store"),
            "{label} response is cacheable"
        );
        assert_eq!(resp.headers()["pragma"], "no-cache", "{label}");
    }
}

#[tokio::test]
async fn handler_panic_is_contained() {
    let app = build_router(&config_with_quota(10), test_api());

    let crashed = app
        .clone()
        .oneshot(request(Method::GET, "/api/v1/boom"))
        .await
        .unwrap();
    assert_eq!(crashed.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // No internal detail reaches the body
    let body = axum::body::to_bytes(crashed.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(!String::from_utf8_lossy(&body).contains("business logic fault"));

    // The server keeps serving unrelated requests
    let ok = app.oneshot(request(Method::GET, "/api/v1/x")).await.unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn head_requests_are_normalized_through_the_full_chain() {
    let app = build_router(&config_with_quota(10), test_api());

    let resp = app.oneshot(request(Method::HEAD, "/api/v1/x")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // Same headers as GET, no body
    assert!(resp.headers().contains_key("cache-control"));
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn probe_path_is_configurable() {
    let config = Config {
        health_path: "/healthz".to_string(),
        ..config_with_quota(10)
    };
    let app = build_router(&config, test_api());

    let probe = app
        .clone()
        .oneshot(request(Method::GET, "/healthz"))
        .await
        .unwrap();
    assert_eq!(probe.status(), StatusCode::OK);

    // The default path is now an ordinary (unmatched) route
    let old = app.oneshot(request(Method::GET, "/status")).await.unwrap();
    assert_eq!(old.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unmatched_paths_flow_through_the_pipeline() {
    let app = build_router(&config_with_quota(10), test_api());

    let resp = app.oneshot(request(Method::GET, "/nowhere")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    // Even the 404 is marked non-cacheable
    assert!(resp.headers().contains_key("cache-control"));
}
