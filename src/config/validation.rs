//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::{Config, LinestackBackendKind};
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("network.name is required")]
    MissingNetworkName,
    #[error("network.nick is required")]
    MissingNick,
    #[error("network.nick may not contain spaces, '!' or '@': {0}")]
    InvalidNick(String),
    #[error("proxy.name is required")]
    MissingProxyName,
    #[error("linestack.snapshot_interval must be at least 1")]
    ZeroSnapshotInterval,
    #[error("linestack.path parent directory does not exist: {0}")]
    LinestackPathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.network.name.is_empty() {
        errors.push(ValidationError::MissingNetworkName);
    }
    if config.network.nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if config.network.nick.contains([' ', '!', '@']) {
        errors.push(ValidationError::InvalidNick(config.network.nick.clone()));
    }
    if config.proxy.name.is_empty() {
        errors.push(ValidationError::MissingProxyName);
    }

    if config.linestack.snapshot_interval == 0 {
        errors.push(ValidationError::ZeroSnapshotInterval);
    }

    if config.linestack.backend == LinestackBackendKind::Redb {
        let path = Path::new(&config.linestack.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::LinestackPathInvalid(
                config.linestack.path.clone(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(toml_src: &str) -> Config {
        toml::from_str(toml_src).unwrap()
    }

    #[test]
    fn test_valid_config_passes() {
        let cfg = config("[network]\nname = \"Example\"\nnick = \"me\"\n");
        assert_eq!(validate(&cfg), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let cfg = config(
            "[network]\nname = \"\"\nnick = \"bad nick\"\n[linestack]\nsnapshot_interval = 0\n",
        );
        let errors = validate(&cfg).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingNetworkName,
                ValidationError::InvalidNick("bad nick".into()),
                ValidationError::ZeroSnapshotInterval,
            ]
        );
    }

    #[test]
    fn test_redb_path_parent_must_exist() {
        let cfg = config(
            "[network]\nname = \"x\"\nnick = \"me\"\n[linestack]\nbackend = \"redb\"\npath = \"/does/not/exist/log.redb\"\n",
        );
        assert!(matches!(
            validate(&cfg).unwrap_err().as_slice(),
            [ValidationError::LinestackPathInvalid(_)]
        ));
    }
}
