use std::net::SocketAddr;

use serde::Deserialize;
use reqmeter_core::error::{ReqMeterError, Result};
use reqmeter_core::MetricDefinition;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ReqMeterError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }

    /// Replace the port of `server.listen` with `PORT`, if given.
    pub fn apply_port(&mut self, port: Option<&str>) -> Result<()> {
        let Some(port) = port else {
            return Ok(());
        };
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| ReqMeterError::BadConfig(format!("PORT must be a u16, got {port:?}")))?;
        let mut addr = self.server.listen_addr()?;
        addr.set_port(port);
        self.server.listen = addr.to_string();
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            ReqMeterError::BadConfig(format!(
                "server.listen must be a valid SocketAddr, got {:?}",
                self.listen
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

/// Source of the `path` label on the request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathLabel {
    /// Request path as received, without the query string.
    #[default]
    Raw,
    /// Route template (`/users/:id`); unrouted requests share one label.
    Matched,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default)]
    pub path_label: PathLabel,

    #[serde(default = "default_true")]
    pub default_metrics: bool,

    #[serde(default = "default_request_counter")]
    pub request_counter: String,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            path_label: PathLabel::default(),
            default_metrics: true,
            request_counter: default_request_counter(),
        }
    }
}

impl MetricsSection {
    /// Definition of the per-request counter.
    pub fn request_counter_def(&self) -> MetricDefinition {
        MetricDefinition::counter(self.request_counter.as_str(), "Total number of HTTP requests")
            .with_labels(["method", "path", "status"])
    }

    pub fn validate(&self) -> Result<()> {
        self.request_counter_def()
            .validate()
            .map_err(|e| ReqMeterError::BadConfig(format!("metrics.request_counter: {e}")))
    }
}

fn default_true() -> bool {
    true
}
fn default_request_counter() -> String {
    "http_requests_total".into()
}
