//! Server config loader (strict parsing).
//!
//! The YAML file is optional: without `REQMETER_CONFIG` the defaults apply.
//! `PORT` always wins over the port in `server.listen`.

pub mod schema;

use std::fs;

use reqmeter_core::error::{ReqMeterError, Result};

pub use schema::{MetricsSection, PathLabel, ServerConfig, ServerSection};

/// Env var naming the YAML config file.
pub const CONFIG_ENV: &str = "REQMETER_CONFIG";
/// Env var overriding the listen port.
pub const PORT_ENV: &str = "PORT";

pub fn load_from_file(path: &str) -> Result<ServerConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ReqMeterError::BadConfig(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ServerConfig> {
    let cfg: ServerConfig = serde_yaml::from_str(s)
        .map_err(|e| ReqMeterError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Resolve config from the process environment.
pub fn load_from_env() -> Result<ServerConfig> {
    let mut cfg = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            tracing::info!(%path, "loading config file");
            load_from_file(&path)?
        }
        Err(_) => ServerConfig::default(),
    };
    let port = std::env::var(PORT_ENV).ok();
    cfg.apply_port(port.as_deref())?;
    Ok(cfg)
}
