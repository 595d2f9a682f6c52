//! reqmeter core: metric registry, text exposition, and process sampling.
//!
//! This crate holds the metric model shared by the server and any embedding
//! host. It carries no transport or runtime dependencies so a registry can be
//! built and asserted on in plain unit tests.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Bad observations surface as `ReqMeterError` so a request path can log and
//! move on instead of taking the process down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod registry;

/// Shared result type.
pub use error::{ErrorCode, ReqMeterError, Result};
pub use registry::{MetricDefinition, MetricKind, Registry, CONTENT_TYPE};
