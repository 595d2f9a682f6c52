//! HTTP mapping for `ReqMeterError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use reqmeter_core::ReqMeterError;

/// Handler error: always a 500, the process keeps serving.
#[derive(Debug)]
pub struct ApiError(pub ReqMeterError);

impl From<ReqMeterError> for ApiError {
    fn from(e: ReqMeterError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(code = self.0.code().as_str(), error = %self.0, "request failed");
        let body = json!({
            "code": self.0.code().as_str(),
            "msg": self.0.to_string(),
        });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
