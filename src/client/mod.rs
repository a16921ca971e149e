//! Client connections and state synchronisation.
//!
//! A [`Client`] wraps a [`Transport`] and keeps its own view of the network
//! state: every line written to the client is also applied to that view, so
//! the proxy always knows what the client believes. The sync engine in
//! [`diff`] compares views and emits the lines a real server would have
//! sent.

mod diff;
mod transport;

use slproxy_proto::{Line, NetworkInfo, Trailing};
use tracing::debug;
use uuid::Uuid;

use crate::error::{SyncError, TransportError};
use crate::state::{ChannelState, NetworkState};

pub use transport::{ChannelTransport, Transport};

/// Longest line we build, without the CR LF.
const MAX_LINE_LEN: usize = 510;

/// One downstream client.
pub struct Client<T> {
    id: Uuid,
    transport: T,
    default_origin: String,
    description: String,
    view: Option<NetworkState>,
}

impl<T: Transport> Client<T> {
    /// A client with no known state. `default_origin` is the server name
    /// synthesised numerics come from.
    pub fn new(transport: T, default_origin: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            default_origin: default_origin.into(),
            description: description.into(),
            view: None,
        }
    }

    /// Identifier used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn default_origin(&self) -> &str {
        &self.default_origin
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// What the client currently believes, once registered.
    pub fn state(&self) -> Option<&NetworkState> {
        self.view.as_ref()
    }

    /// Install the client's view, typically right after registration.
    pub fn set_state(&mut self, state: NetworkState) {
        self.view = Some(state);
    }

    pub fn state_mut(&mut self) -> Option<&mut NetworkState> {
        self.view.as_mut()
    }

    /// Target of synthesised numerics: the client's nick, or `*` before
    /// registration.
    pub fn default_target(&self) -> &str {
        self.view.as_ref().map_or("*", |v| v.me().nick())
    }

    /// The client's own `nick!user@host`, when known.
    pub fn own_hostmask(&self) -> Option<String> {
        self.view.as_ref().and_then(|v| v.me().hostmask())
    }

    fn info(&self) -> NetworkInfo {
        self.view
            .as_ref()
            .map(|v| v.info().clone())
            .unwrap_or_default()
    }

    /// Write one line to the client. Once the transport has taken it, the
    /// line is applied to the client's view.
    pub async fn send_line(&mut self, line: Line) -> Result<(), TransportError> {
        if !self.transport.is_connected() {
            return Err(TransportError::Closed);
        }
        self.transport.send_line(&line).await?;
        if let Some(view) = self.view.as_mut()
            && let Err(e) = view.handle_line(&line)
        {
            debug!(error = %e, "line not applied to client view");
        }
        Ok(())
    }

    /// [`send_line`](Self::send_line) as one step of a longer sequence.
    async fn emit(&mut self, line: Line, written: &mut usize) -> Result<(), SyncError> {
        self.send_line(line).await.map_err(|source| SyncError {
            written: *written,
            source,
        })?;
        *written += 1;
        Ok(())
    }

    /// A numeric from the default origin to the default target.
    fn numeric(&self, code: &str, args: &[&str]) -> Line {
        let target = self.default_target();
        Line::new(
            Some(self.default_origin.as_str()),
            code,
            std::iter::once(target).chain(args.iter().copied()),
        )
        .with_trailing(Trailing::Auto)
    }

    // ------------------------------------------------------------------
    // Single replies
    // ------------------------------------------------------------------

    /// `375`, one `372` per line and `376`; or `422` without a MOTD.
    pub async fn send_motd(&mut self, motd: Option<&[String]>) -> Result<usize, SyncError> {
        let mut written = 0;
        match motd {
            Some(lines) => {
                let start = self.numeric("375", &["Start of MOTD"]);
                self.emit(start, &mut written).await?;
                for text in lines {
                    let line = self.numeric("372", &[text.as_str()]);
                    self.emit(line, &mut written).await?;
                }
                let end = self.numeric("376", &["End of MOTD"]);
                self.emit(end, &mut written).await?;
            }
            None => {
                let none = self.numeric("422", &["No MOTD file"]);
                self.emit(none, &mut written).await?;
            }
        }
        Ok(written)
    }

    /// `254`: number of channels formed.
    pub async fn send_luserchannels(&mut self, count: usize) -> Result<usize, SyncError> {
        let mut written = 0;
        let count = count.to_string();
        let line = self.numeric("254", &[&count, "channels formed"]);
        self.emit(line, &mut written).await?;
        Ok(written)
    }

    /// `332` and `333` for a channel with a topic. Without one, `331` is
    /// sent only when `explicit` (the client asked).
    pub async fn send_topic(&mut self, channel: &ChannelState, explicit: bool) -> Result<usize, SyncError> {
        let mut written = 0;
        self.write_topic(channel, explicit, &mut written).await?;
        Ok(written)
    }

    async fn write_topic(
        &mut self,
        channel: &ChannelState,
        explicit: bool,
        written: &mut usize,
    ) -> Result<(), SyncError> {
        let Some(topic) = channel.topic.as_deref() else {
            if explicit {
                let line = self.numeric("331", &[channel.name(), "No topic set"]);
                self.emit(line, written).await?;
            }
            return Ok(());
        };
        let line = self.numeric("332", &[channel.name(), topic]);
        self.emit(line, written).await?;

        if channel.topic_set_time != 0
            && let Some(set_by) = channel.topic_set_by.as_deref()
        {
            let time = channel.topic_set_time.to_string();
            let line = self.numeric("333", &[channel.name(), set_by, &time]);
            self.emit(line, written).await?;
        }
        Ok(())
    }

    /// `353` replies for every member, then `366`.
    pub async fn send_nameslist(&mut self, channel: &ChannelState) -> Result<usize, SyncError> {
        let mut written = 0;
        let info = self.info();
        self.write_names(channel, &info, &mut written).await?;
        Ok(written)
    }

    async fn write_names(
        &mut self,
        channel: &ChannelState,
        info: &NetworkInfo,
        written: &mut usize,
    ) -> Result<(), SyncError> {
        let visibility = channel.visibility.unwrap_or('=').to_string();
        let overhead = format!(
            ":{} 353 {} {} {} :",
            self.default_origin,
            self.default_target(),
            visibility,
            channel.name()
        )
        .len();
        let budget = MAX_LINE_LEN.saturating_sub(overhead);

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();
        for member in channel.members() {
            let mut entry = String::new();
            if let Some(prefix) = info.highest_prefix(&member.modes) {
                entry.push(prefix);
            }
            entry.push_str(member.nick());
            if !current.is_empty() && current.len() + 1 + entry.len() > budget {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&entry);
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        for names in chunks {
            let line = self.numeric("353", &[&visibility, channel.name(), &names]);
            self.emit(line, written).await?;
        }
        let end = self.numeric("366", &[channel.name(), "End of /NAMES list"]);
        self.emit(end, written).await
    }

    /// One `367` per ban, then `368`.
    pub async fn send_banlist(&mut self, channel: &ChannelState) -> Result<usize, SyncError> {
        let mut written = 0;
        for ban in channel.list('b') {
            let line = match ban.set_by.as_deref() {
                Some(set_by) => {
                    let set_at = ban.set_at.to_string();
                    self.numeric("367", &[channel.name(), &ban.mask, set_by, &set_at])
                }
                None => self.numeric("367", &[channel.name(), &ban.mask]),
            };
            self.emit(line, &mut written).await?;
        }
        let end = self.numeric("368", &[channel.name(), "End of channel ban list"]);
        self.emit(end, &mut written).await?;
        Ok(written)
    }

    /// `324` with the channel's modes and `329` with its creation time.
    /// Nothing when no modes are known.
    pub async fn send_channel_mode(&mut self, channel: &ChannelState) -> Result<usize, SyncError> {
        let mut written = 0;
        if self.write_modes(channel, &mut written).await? {
            self.write_creation_time(channel, &mut written).await?;
        }
        Ok(written)
    }

    /// Returns whether a `324` was sent.
    async fn write_modes(&mut self, channel: &ChannelState, written: &mut usize) -> Result<bool, SyncError> {
        if channel.modes().is_empty() {
            return Ok(false);
        }
        let flags = channel.mode_string();
        let values: Vec<&str> = channel
            .modes()
            .iter()
            .filter_map(|m| channel.mode_option(m).ok())
            .collect();
        let mut args = vec![channel.name(), flags.as_str()];
        args.extend(values);
        let line = self.numeric("324", &args);
        self.emit(line, written).await?;
        Ok(true)
    }

    async fn write_creation_time(&mut self, channel: &ChannelState, written: &mut usize) -> Result<(), SyncError> {
        if channel.creation_time == 0 {
            return Ok(());
        }
        let time = channel.creation_time.to_string();
        let line = self.numeric("329", &[channel.name(), &time]);
        self.emit(line, written).await
    }

    /// Everything a client sees when it joins: JOIN, topic, names and modes.
    pub async fn send_channel_state(&mut self, channel: &ChannelState) -> Result<usize, SyncError> {
        let mut written = 0;
        let info = self.info();
        self.write_channel_state(channel, &info, &mut written).await?;
        Ok(written)
    }

    async fn write_channel_state(
        &mut self,
        channel: &ChannelState,
        info: &NetworkInfo,
        written: &mut usize,
    ) -> Result<(), SyncError> {
        let join = Line::new(self.own_hostmask().as_deref(), "JOIN", [channel.name()])
            .with_trailing(Trailing::Auto);
        self.emit(join, written).await?;
        self.write_topic(channel, false, written).await?;
        self.write_names(channel, info, written).await?;
        self.write_modes(channel, written).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Netsplits
    // ------------------------------------------------------------------

    /// Tell the client that every nick it shares a channel with went away
    /// in a netsplit between `my_name` and `server`.
    ///
    /// One QUIT per nick; a client without a view gets nothing.
    pub async fn send_netsplit(&mut self, my_name: &str, server: &str) -> Result<usize, SyncError> {
        let Some(view) = self.view.as_ref() else {
            return Ok(0);
        };
        let mut seen = std::collections::BTreeSet::new();
        let mut masks = Vec::new();
        for channel in view.channels() {
            for nick in channel.nicks() {
                if view.is_me(nick) || !seen.insert(view.info().fold(nick)) {
                    continue;
                }
                let mask = match view.nick(nick) {
                    Some(record) => record.hostmask_or_unknown(),
                    None => format!("{}!~UNKNOWN@UNKNOWN", nick),
                };
                masks.push(mask);
            }
        }

        let reason = format!("{} {}", my_name, server);
        let mut written = 0;
        for mask in masks {
            let quit = Line::new(Some(mask.as_str()), "QUIT", [reason.as_str()]).with_trailing(Trailing::Auto);
            self.emit(quit, &mut written).await?;
        }
        Ok(written)
    }
}
