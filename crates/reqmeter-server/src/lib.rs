//! reqmeter server library entry.
//!
//! Wires config, the shared registry, the request-tracking middleware, and
//! the operational endpoints into an axum router. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod error;
pub mod ops;
pub mod router;
pub mod track;
