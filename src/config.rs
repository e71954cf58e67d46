//! Environment-driven server configuration.

use std::time::Duration;

use crate::script::DEFAULT_TICK_INTERVAL;

const DEFAULT_PORT: u16 = 3000;

/// Runtime knobs read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port (`SERVER_PORT`).
    pub port: u16,
    /// Runner tick interval (`CREWDECK_TICK_MS`).
    pub tick_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults
    /// on missing or unparseable values.
    pub fn from_env() -> Self {
        let port = std::env::var("SERVER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let tick_interval = std::env::var("CREWDECK_TICK_MS")
            .ok()
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TICK_INTERVAL);
        Self {
            port,
            tick_interval,
        }
    }
}
