//! Shared error type across reqmeter crates.

use thiserror::Error;

/// Stable machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A metric with the same name is already registered.
    DuplicateName,
    /// Malformed metric definition (name, labels, buckets).
    InvalidDefinition,
    /// No metric registered under that name.
    UnknownMetric,
    /// Wrong number of label values.
    LabelCardinality,
    /// Operation not supported by the metric kind.
    KindMismatch,
    /// Rejected observation value.
    InvalidDelta,
    /// Invalid configuration.
    BadConfig,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used in logs and HTTP error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::DuplicateName => "DUPLICATE_NAME",
            ErrorCode::InvalidDefinition => "INVALID_DEFINITION",
            ErrorCode::UnknownMetric => "UNKNOWN_METRIC",
            ErrorCode::LabelCardinality => "LABEL_CARDINALITY",
            ErrorCode::KindMismatch => "KIND_MISMATCH",
            ErrorCode::InvalidDelta => "INVALID_DELTA",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ReqMeterError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ReqMeterError {
    #[error("metric already registered: {0}")]
    DuplicateName(String),
    #[error("invalid metric definition: {0}")]
    InvalidDefinition(String),
    #[error("unknown metric: {0}")]
    UnknownMetric(String),
    #[error("metric {name} expects {expected} label values, got {got}")]
    LabelCardinality {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("metric {name} is a {kind}: {op} not supported")]
    KindMismatch {
        name: String,
        kind: &'static str,
        op: &'static str,
    },
    #[error("invalid delta {delta} for metric {name}")]
    InvalidDelta { name: String, delta: f64 },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ReqMeterError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            ReqMeterError::DuplicateName(_) => ErrorCode::DuplicateName,
            ReqMeterError::InvalidDefinition(_) => ErrorCode::InvalidDefinition,
            ReqMeterError::UnknownMetric(_) => ErrorCode::UnknownMetric,
            ReqMeterError::LabelCardinality { .. } => ErrorCode::LabelCardinality,
            ReqMeterError::KindMismatch { .. } => ErrorCode::KindMismatch,
            ReqMeterError::InvalidDelta { .. } => ErrorCode::InvalidDelta,
            ReqMeterError::BadConfig(_) => ErrorCode::BadConfig,
            ReqMeterError::Internal(_) => ErrorCode::Internal,
        }
    }
}
