//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use super::linestack::LinestackConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Proxy identity.
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Upstream network and our identity on it.
    pub network: NetworkConfig,
    /// Line log storage.
    #[serde(default)]
    pub linestack: LinestackConfig,
    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Proxy identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    /// Server name used as the origin of synthesised numerics and as the
    /// first half of netsplit quit reasons.
    #[serde(default = "default_proxy_name")]
    pub name: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            name: default_proxy_name(),
        }
    }
}

/// Upstream network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Network name (e.g., "Libera").
    pub name: String,
    /// Nick we register with.
    pub nick: String,
    /// Username (ident) we register with.
    #[serde(default = "default_username")]
    pub username: String,
    /// Hostname we expect the server to show for us until it tells us.
    #[serde(default = "default_hostname")]
    pub hostname: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

fn default_proxy_name() -> String {
    "slproxy".to_string()
}

fn default_username() -> String {
    "slproxy".to_string()
}

fn default_hostname() -> String {
    "localhost".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinestackBackendKind;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [network]
            name = "Example"
            nick = "jelmer"
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.name, "slproxy");
        assert_eq!(config.network.username, "slproxy");
        assert_eq!(config.linestack.backend, LinestackBackendKind::Memory);
        assert_eq!(config.linestack.snapshot_interval, 1000);
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [proxy]
            name = "bouncer.example.net"

            [network]
            name = "Example"
            nick = "jelmer"
            username = "jvr"
            hostname = "example.org"

            [linestack]
            backend = "redb"
            path = "/var/lib/slproxy/example.redb"
            snapshot_interval = 250

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.proxy.name, "bouncer.example.net");
        assert_eq!(config.network.hostname, "example.org");
        assert_eq!(config.linestack.backend, LinestackBackendKind::Redb);
        assert_eq!(config.linestack.path, "/var/lib/slproxy/example.redb");
        assert_eq!(config.linestack.snapshot_interval, 250);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_network_is_an_error() {
        assert!(toml::from_str::<Config>("[proxy]\nname = \"x\"\n").is_err());
    }

    #[test]
    fn test_load_reports_io_error() {
        let err = Config::load("/nonexistent/slproxy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
