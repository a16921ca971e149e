//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions (Config, ProxyConfig, NetworkConfig, LoggingConfig)
//! - [`linestack`]: Line log storage configuration (LinestackConfig, LinestackBackendKind)
//! - [`validation`]: Startup checks run after loading

mod linestack;
mod types;
mod validation;

pub use linestack::{LinestackBackendKind, LinestackConfig};
pub use types::{Config, ConfigError, LogFormat, LoggingConfig, NetworkConfig, ProxyConfig};
pub use validation::{ValidationError, validate};
