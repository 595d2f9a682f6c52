//! End-to-end request tracking through the axum router.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use reqmeter_core::{ErrorCode, Registry};
use reqmeter_server::{
    app_state::AppState,
    config::{PathLabel, ServerConfig},
    router, track,
};

const COUNTER: &str = "http_requests_total";

fn app() -> (Router, Arc<Registry>) {
    let state = AppState::new(ServerConfig::default()).unwrap();
    let registry = state.registry();
    (router::build_router(state), registry)
}

async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn counts_completed_requests_per_label_tuple() {
    let (app, registry) = app();

    for _ in 0..3 {
        let (status, body) = send(&app, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"message":"Hello from monitored app"}"#);
    }
    send(&app, Method::GET, "/missing?x=1").await;
    send(&app, Method::POST, "/").await;

    assert_eq!(registry.get(COUNTER, &["GET", "/", "200"]), Some(3.0));
    assert_eq!(registry.get(COUNTER, &["GET", "/missing", "404"]), Some(1.0));
    assert_eq!(registry.get(COUNTER, &["POST", "/", "405"]), Some(1.0));
}

#[tokio::test]
async fn abandoned_response_is_not_recorded() {
    let (app, registry) = app();

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    drop(res);

    assert_eq!(registry.get(COUNTER, &["GET", "/", "200"]), None);
}

#[tokio::test]
async fn empty_body_is_recorded_without_polling() {
    let state = AppState::new(ServerConfig::default()).unwrap();
    let registry = state.registry();
    let app = Router::new()
        .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
        .layer(middleware::from_fn_with_state(state.clone(), track::track_requests))
        .with_state(state);

    let req = Request::builder().uri("/empty").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    drop(res);

    assert_eq!(registry.get(COUNTER, &["GET", "/empty", "204"]), Some(1.0));
}

#[tokio::test]
async fn head_request_is_recorded() {
    let (app, registry) = app();

    let req = Request::builder()
        .method(Method::HEAD)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.into_body().collect().await.unwrap().to_bytes();
    assert!(body.is_empty());

    assert_eq!(registry.get(COUNTER, &["HEAD", "/", "200"]), Some(1.0));
    assert_eq!(registry.get(COUNTER, &["GET", "/", "200"]), None);
}

#[tokio::test]
async fn not_modified_with_leftover_body_is_recorded_once() {
    let state = AppState::new(ServerConfig::default()).unwrap();
    let registry = state.registry();
    let app = Router::new()
        .route("/cached", get(|| async { (StatusCode::NOT_MODIFIED, "stale body") }))
        .layer(middleware::from_fn_with_state(state.clone(), track::track_requests))
        .with_state(state);

    let req = Request::builder().uri("/cached").body(Body::empty()).unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    drop(res);

    assert_eq!(registry.get(COUNTER, &["GET", "/cached", "304"]), Some(1.0));
}

#[tokio::test]
async fn metrics_endpoint_exposes_counter_and_default_gauges() {
    let (app, _registry) = app();

    send(&app, Method::GET, "/").await;

    let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        reqmeter_core::CONTENT_TYPE
    );
    let body = res.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("# TYPE http_requests_total counter\n"));
    assert!(text.contains("http_requests_total{method=\"GET\",path=\"/\",status=\"200\"} 1\n"));
    assert!(text.contains("process_uptime_seconds "));
    // the scrape itself completes after rendering
    assert!(!text.contains("path=\"/metrics\""));

    let (_, text) = send(&app, Method::GET, "/metrics").await;
    assert!(text.contains(
        "http_requests_total{method=\"GET\",path=\"/metrics\",status=\"200\"} 1\n"
    ));
}

#[tokio::test]
async fn default_metrics_can_be_disabled() {
    let mut cfg = ServerConfig::default();
    cfg.metrics.default_metrics = false;
    let app = router::build_router(AppState::new(cfg).unwrap());

    let (status, text) = send(&app, Method::GET, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(!text.contains("process_uptime_seconds"));
}

#[tokio::test]
async fn matched_mode_bounds_path_cardinality() {
    let mut cfg = ServerConfig::default();
    cfg.metrics.path_label = PathLabel::Matched;
    let state = AppState::new(cfg).unwrap();
    let registry = state.registry();
    let app = router::build_router(state);

    send(&app, Method::GET, "/").await;
    send(&app, Method::GET, "/nope/1").await;
    send(&app, Method::GET, "/nope/2").await;

    assert_eq!(registry.get(COUNTER, &["GET", "/", "200"]), Some(1.0));
    assert_eq!(
        registry.get(COUNTER, &["GET", track::UNMATCHED_PATH, "404"]),
        Some(2.0)
    );
    assert_eq!(registry.get(COUNTER, &["GET", "/nope/1", "404"]), None);
}

#[tokio::test]
async fn concurrent_requests_lose_no_updates() {
    const N: usize = 64;
    let (app, registry) = app();

    let tasks: Vec<_> = (0..N)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move { send(&app, Method::GET, "/healthz").await })
        })
        .collect();
    for t in tasks {
        let (status, body) = t.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    assert_eq!(registry.get(COUNTER, &["GET", "/healthz", "200"]), Some(N as f64));
}

#[tokio::test]
async fn duplicate_counter_aborts_startup() {
    let registry = Arc::new(Registry::new());
    registry
        .register(reqmeter_core::MetricDefinition::gauge(COUNTER, "taken"))
        .unwrap();

    let err = AppState::with_registry(ServerConfig::default(), Arc::clone(&registry))
        .err()
        .expect("must fail");
    assert_eq!(err.code(), ErrorCode::DuplicateName);
}

#[tokio::test]
async fn failed_scrape_returns_500_and_service_keeps_serving() {
    let registry = Arc::new(Registry::new());
    registry
        .register(reqmeter_core::MetricDefinition::counter("process_open_fds", "clash"))
        .unwrap();
    let state = AppState::with_registry(ServerConfig::default(), Arc::clone(&registry)).unwrap();
    let app = router::build_router(state);

    let (status, body) = send(&app, Method::GET, "/metrics").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let err: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(err["code"], "DUPLICATE_NAME");
    assert!(err["msg"].as_str().unwrap().contains("process_open_fds"));

    let (status, _) = send(&app, Method::GET, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(registry.get(COUNTER, &["GET", "/metrics", "500"]), Some(1.0));
    assert_eq!(registry.get(COUNTER, &["GET", "/", "200"]), Some(1.0));
}
