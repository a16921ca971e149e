//! Line log storage configuration.

use serde::Deserialize;

/// Which backend stores the line log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinestackBackendKind {
    /// Kept in memory; lost on restart.
    #[default]
    Memory,
    /// Redb database file at `path`.
    Redb,
}

/// Linestack configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LinestackConfig {
    /// Backend type: "memory" or "redb".
    #[serde(default)]
    pub backend: LinestackBackendKind,
    /// Path to the database file (redb backend only).
    #[serde(default = "default_linestack_path")]
    pub path: String,
    /// Lines between two state snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

impl Default for LinestackConfig {
    fn default() -> Self {
        Self {
            backend: LinestackBackendKind::default(),
            path: default_linestack_path(),
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

fn default_linestack_path() -> String {
    "linestack.redb".to_string()
}

fn default_snapshot_interval() -> u64 {
    1000
}
