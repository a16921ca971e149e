//! slproxy - Straylight IRC Proxy
//!
//! Loads the configuration, opens the network's line log and rebuilds the
//! last known network state from it.

use std::sync::Arc;

use anyhow::Context;
use slproxy::config::{Config, validate};
use slproxy::linestack::Linestack;
use slproxy::session::{Session, SessionRegistry};
use slproxy::state::NetworkState;
use slproxy::telemetry;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    telemetry::init(config.logging.format);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        proxy = %config.proxy.name,
        network = %config.network.name,
        nick = %config.network.nick,
        "Starting slproxy"
    );

    let network = &config.network;
    let initial = NetworkState::new(&network.nick, &network.username, &network.hostname);
    let linestack = Linestack::open(&config.linestack, &initial).context("failed to open linestack")?;

    let marker = linestack.get_marker();
    let state = linestack
        .get_state(marker)
        .context("failed to rebuild network state")?;

    info!(
        %marker,
        nick = %state.me().nick(),
        channels = state.channel_count(),
        nicks = state.nicks().count(),
        "Network state restored"
    );
    for channel in state.channels() {
        info!(
            channel = %channel.name(),
            members = channel.member_count(),
            topic = channel.topic.as_deref().unwrap_or(""),
            "channel"
        );
    }

    let registry = SessionRegistry::new();
    registry.insert(Arc::new(Session::new(network.name.clone(), state, linestack)));
    info!(sessions = ?registry.names(), "ready");

    Ok(())
}
