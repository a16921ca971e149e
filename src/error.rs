//! Unified error handling for slproxy.
//!
//! Each concern gets its own error type. Parse and lookup failures are
//! recoverable and usually turned into no-ops where they occur; storage and
//! transport failures always reach the caller.

pub use slproxy_proto::ParseError;
use thiserror::Error;

// ============================================================================
// Lookup Errors (state queries)
// ============================================================================

/// A channel, nick or mode option was not found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no such channel: {0}")]
    NoSuchChannel(String),

    #[error("no such nick: {0}")]
    NoSuchNick(String),

    #[error("mode +{mode} has no value on {channel}")]
    ModeOptionUnset { channel: String, mode: char },
}

// ============================================================================
// Routing Errors (query stack)
// ============================================================================

/// A server reply could not be attributed to any pending query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no pending query for reply {0}")]
    Unroutable(String),
}

// ============================================================================
// Transport Errors (client writes)
// ============================================================================

/// Writing a line to a client failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport rejected line: {0}")]
    Rejected(String),
}

/// A state sync stopped part way through.
///
/// `written` lines already reached the client, so its view is now somewhere
/// between the old and the new state.
#[derive(Debug, Error)]
#[error("state sync aborted after {written} line(s): {source}")]
pub struct SyncError {
    pub written: usize,
    #[source]
    pub source: TransportError,
}

impl SyncError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self.source {
            TransportError::Closed => "sync_closed",
            TransportError::Io(_) => "sync_io",
            TransportError::Rejected(_) => "sync_rejected",
        }
    }
}

// ============================================================================
// Storage Errors (linestack)
// ============================================================================

/// Appending to or reading from the line log failed.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("marker {marker} is beyond the end of the log ({len} entries)")]
    MarkerOutOfRange { marker: u64, len: u64 },
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
