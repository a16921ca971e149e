//! Tracing setup and standard spans.

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Install the global subscriber. `RUST_LOG` overrides the default `info`
/// filter.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Standardized span constructors for proxy observability.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one upstream network session.
    pub fn session(network: &str) -> Span {
        info_span!("session", network = %network)
    }

    /// Span for one downstream client connection.
    pub fn client(id: &str, origin: &str) -> Span {
        info_span!("client", id = %id, origin = %origin)
    }

    /// Span for a linestack replay between two markers.
    pub fn replay(from: u64, to: u64) -> Span {
        info_span!("replay", from = from, to = to)
    }
}
