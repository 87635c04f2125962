//! Configuration Management Module
//!
//! Loading and access for the solver service configuration: node endpoints,
//! event feed settings, and the candidate search strategy.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::search::SearchStrategy;

/// Main configuration structure containing all solver service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Service configuration (node URL, feed settings)
    pub service: ServiceConfig,
    /// Candidate search configuration
    #[serde(default)]
    pub search: SearchConfig,
}

/// Service-level configuration for the solver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Node HTTP API base URL (e.g., "http://127.0.0.1:4000")
    pub node_url: String,
    /// Event feed topic to subscribe to
    #[serde(default = "default_topic")]
    pub topic: String,
    /// HTTP request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Delay before reconnecting a dropped event stream, in milliseconds
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

/// Candidate search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Enumeration strategy over the pending pool
    #[serde(default = "default_strategy")]
    pub strategy: SearchStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
        }
    }
}

fn default_topic() -> String {
    "tx_events".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_reconnect_delay_ms() -> u64 {
    2_000
}

fn default_strategy() -> SearchStrategy {
    SearchStrategy::Subset
}

impl SolverConfig {
    /// Load configuration from the default location.
    ///
    /// Reads the path from the `SOLVER_CONFIG_PATH` environment variable,
    /// falling back to `solver.toml` in the working directory.
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from an explicit path, or the default location
    /// when `None`.
    pub fn load_from_path(path: Option<&str>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_string(),
            None => std::env::var("SOLVER_CONFIG_PATH")
                .unwrap_or_else(|_| "solver.toml".to_string()),
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: SolverConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        Ok(config)
    }

    /// WebSocket URL of the node's event stream, derived from the node URL.
    pub fn events_url(&self) -> Result<String> {
        let base = &self.service.node_url;
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            anyhow::bail!(
                "Node URL must start with http:// or https://, got: {}",
                base
            );
        };

        Ok(format!("{}/socket/websocket", ws_base.trim_end_matches('/')))
    }

    /// HTTP request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.service.request_timeout_ms)
    }

    /// Feed reconnect delay as a `Duration`.
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.service.reconnect_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_applies_defaults() {
        let toml = r#"
            [service]
            node_url = "http://127.0.0.1:4000"
        "#;

        let config: SolverConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.service.node_url, "http://127.0.0.1:4000");
        assert_eq!(config.service.topic, "tx_events");
        assert_eq!(config.service.request_timeout_ms, 30_000);
        assert_eq!(config.service.reconnect_delay_ms, 2_000);
        assert_eq!(config.search.strategy, SearchStrategy::Subset);
    }

    #[test]
    fn test_full_config_parses() {
        let toml = r#"
            [service]
            node_url = "http://node.example:4000"
            topic = "*"
            request_timeout_ms = 5000
            reconnect_delay_ms = 500

            [search]
            strategy = "pairwise"
        "#;

        let config: SolverConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.service.topic, "*");
        assert_eq!(config.request_timeout(), Duration::from_millis(5000));
        assert_eq!(config.search.strategy, SearchStrategy::Pairwise);
    }

    #[test]
    fn test_events_url_derivation() {
        let toml = r#"
            [service]
            node_url = "http://127.0.0.1:4000"
        "#;
        let config: SolverConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.events_url().unwrap(),
            "ws://127.0.0.1:4000/socket/websocket"
        );

        let toml = r#"
            [service]
            node_url = "https://node.example/"
        "#;
        let config: SolverConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            config.events_url().unwrap(),
            "wss://node.example/socket/websocket"
        );
    }

    #[test]
    fn test_events_url_rejects_unknown_scheme() {
        let toml = r#"
            [service]
            node_url = "ftp://node.example"
        "#;
        let config: SolverConfig = toml::from_str(toml).unwrap();
        assert!(config.events_url().is_err());
    }
}
