//! Axum router wiring.
//!
//! Every route, including `/metrics` and the 404 fallback, runs behind the
//! request-tracking middleware.

use axum::{middleware, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::{app_state::AppState, ops, track};

async fn index() -> Json<Value> {
    Json(json!({ "message": "Hello from monitored app" }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .layer(middleware::from_fn_with_state(state.clone(), track::track_requests))
        .with_state(state)
}
