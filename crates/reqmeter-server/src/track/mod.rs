//! Request-tracking middleware.
//!
//! Per request: labels are captured on the way in (method, path) and out
//! (status), then the response body is wrapped in a [`TrackedBody`]. The
//! counter is incremented exactly once, when that body reaches end-of-stream.
//! A body dropped early (client went away) records nothing. Responses that
//! carry no body on the wire (`HEAD`, 1xx, 204, 304) count once dropped.

mod body;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

use reqmeter_core::Registry;

use crate::app_state::AppState;
use crate::config::PathLabel;

pub use body::TrackedBody;

/// `path` label for requests no route matched, in `matched` mode.
pub const UNMATCHED_PATH: &str = "<unmatched>";

/// A pending counter increment, fired once the response completes.
pub struct Completion {
    registry: Arc<Registry>,
    counter: String,
    method: String,
    path: String,
    status: String,
    bodyless: bool,
}

impl Completion {
    fn record(self) {
        let labels = [self.method.as_str(), self.path.as_str(), self.status.as_str()];
        if let Err(e) = self.registry.inc(&self.counter, &labels) {
            tracing::warn!(metric = %self.counter, error = %e, "request observation rejected");
        }
    }
}

fn path_label(req: &Request, mode: PathLabel) -> String {
    match mode {
        PathLabel::Raw => req.uri().path().to_owned(),
        PathLabel::Matched => req
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| UNMATCHED_PATH.to_owned()),
    }
}

/// True when the response body never reaches the wire, so nothing will poll
/// it to end-of-stream.
fn is_bodyless(method: &Method, status: StatusCode) -> bool {
    *method == Method::HEAD
        || status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED
}

pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = path_label(&req, state.cfg().metrics.path_label);

    let res = next.run(req).await;

    let completion = Completion {
        registry: state.registry(),
        counter: state.cfg().metrics.request_counter.clone(),
        method: method.as_str().to_owned(),
        path,
        status: res.status().as_u16().to_string(),
        bodyless: is_bodyless(&method, res.status()),
    };

    let (parts, body) = res.into_parts();
    Response::from_parts(parts, Body::new(TrackedBody::new(body, completion)))
}
