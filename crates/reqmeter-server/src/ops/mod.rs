//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness
//! - `/metrics` : Prometheus text format, default gauges resampled per scrape

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::app_state::AppState;
use crate::error::ApiError;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let registry = state.registry();
    if state.cfg().metrics.default_metrics {
        registry.collect_default()?;
    }
    let body = registry.serialize();

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, reqmeter_core::CONTENT_TYPE)],
        body,
    )
        .into_response())
}
