//! Shared application state.
//!
//! The registry is built here, at the composition root, and handed to the
//! middleware and the exposition handler by `Arc`.

use std::sync::Arc;

use reqmeter_core::error::Result;
use reqmeter_core::Registry;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<Registry>,
}

struct AppStateInner {
    cfg: ServerConfig,
}

impl AppState {
    /// Build application state with a fresh registry.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        Self::with_registry(cfg, Arc::new(Registry::new()))
    }

    /// Build application state over an existing registry.
    ///
    /// Fails with `DuplicateName` if the request counter name is already
    /// taken; startup must not continue in that case.
    pub fn with_registry(cfg: ServerConfig, registry: Arc<Registry>) -> Result<Self> {
        registry.register(cfg.metrics.request_counter_def())?;
        tracing::info!(
            counter = %cfg.metrics.request_counter,
            path_label = ?cfg.metrics.path_label,
            "request tracking enabled"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner { cfg }),
            registry,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }
}
