//! State diffing.
//!
//! Everything here is a function of an old and a new [`NetworkState`] plus
//! the client's output; neither state is modified. Channels are visited in
//! case-folded name order, so the emitted sequence is deterministic.

use slproxy_proto::{ChanModeType, Line, NetworkInfo, Sign, Trailing};
use tracing::{Instrument, debug, warn};

use super::{Client, Transport};
use crate::error::SyncError;
use crate::state::{ChannelState, NetworkState};
use crate::telemetry::spans;

/// Value-bearing changes per MODE line when the server did not say.
const DEFAULT_MAX_MODES: usize = 3;

/// One pending `+x arg` or `-x arg`.
struct ModeDelta {
    sign: Sign,
    mode: char,
    arg: Option<String>,
}

/// Render mode changes as MODE argument lists, at most `max_args`
/// value-bearing changes per list.
fn render_mode_lines(changes: &[ModeDelta], max_args: usize) -> Vec<Vec<String>> {
    let mut lines = Vec::new();
    let mut flags = String::new();
    let mut args: Vec<String> = Vec::new();
    let mut sign = None;

    for change in changes {
        if change.arg.is_some() && args.len() == max_args {
            let mut line = vec![std::mem::take(&mut flags)];
            line.append(&mut args);
            lines.push(line);
            sign = None;
        }
        if sign != Some(change.sign) {
            flags.push(change.sign.as_char());
            sign = Some(change.sign);
        }
        flags.push(change.mode);
        if let Some(arg) = &change.arg {
            args.push(arg.clone());
        }
    }
    if !flags.is_empty() {
        let mut line = vec![flags];
        line.append(&mut args);
        lines.push(line);
    }
    lines
}

/// Channel mode and membership-mode changes from `old` to `new`.
fn channel_mode_changes(old: &ChannelState, new: &ChannelState, info: &NetworkInfo) -> Vec<ModeDelta> {
    let mut plus = Vec::new();
    let mut minus = Vec::new();

    let option = |channel: &ChannelState, mode: char| channel.mode_option(mode).ok().map(str::to_owned);

    for mode in new.modes().iter() {
        let value = option(new, mode);
        if !old.modes().contains(mode) || option(old, mode) != value {
            plus.push(ModeDelta {
                sign: Sign::Plus,
                mode,
                arg: value,
            });
        }
    }
    for mode in old.modes().difference(new.modes()) {
        let arg = if info.takes_arg(Sign::Minus, mode) {
            Some(option(old, mode).unwrap_or_else(|| "*".to_owned()))
        } else {
            None
        };
        minus.push(ModeDelta {
            sign: Sign::Minus,
            mode,
            arg,
        });
    }

    for member in new.members() {
        let before = old.member(member.nick());
        for mode in member.modes.iter() {
            if !before.is_some_and(|b| b.modes.contains(mode)) {
                plus.push(ModeDelta {
                    sign: Sign::Plus,
                    mode,
                    arg: Some(member.nick().to_owned()),
                });
            }
        }
        if let Some(before) = before {
            for mode in before.modes.difference(&member.modes) {
                minus.push(ModeDelta {
                    sign: Sign::Minus,
                    mode,
                    arg: Some(member.nick().to_owned()),
                });
            }
        }
    }

    plus.retain(|d| info.chanmode_type(d.mode) != ChanModeType::List);
    plus.extend(minus);
    plus
}

/// Origin for a line attributed to `nick` in `state`.
fn mask_in(state: &NetworkState, nick: &str) -> String {
    state
        .nick(nick)
        .and_then(|n| n.hostmask())
        .unwrap_or_else(|| nick.to_owned())
}

impl<T: Transport> Client<T> {
    /// Bring a client that knows nothing up to `state`.
    ///
    /// Equivalent to a diff from an empty state with the client's current
    /// nick.
    pub async fn send_state(&mut self, state: &NetworkState) -> Result<usize, SyncError> {
        let mut old = state.empty_like();
        if let Some(view) = self.state() {
            let nick = view.me().nick().to_owned();
            old.me_mut().set_nick(nick);
        }
        self.send_state_diff(&old, state).await
    }

    /// Emit the lines that take a client from `old` to `new`.
    ///
    /// Returns the number of lines written. On a transport failure the
    /// remaining lines are abandoned and the error says how many made it.
    pub async fn send_state_diff(&mut self, old: &NetworkState, new: &NetworkState) -> Result<usize, SyncError> {
        let span = spans::client(&self.id.to_string(), &self.default_origin);
        match self.write_state_diff(old, new).instrument(span).await {
            Ok(written) => {
                debug!(client = %self.id, written, "state sync complete");
                Ok(written)
            }
            Err(e) => {
                warn!(
                    client = %self.id,
                    code = e.error_code(),
                    written = e.written,
                    error = %e,
                    "state sync aborted"
                );
                Err(e)
            }
        }
    }

    async fn write_state_diff(&mut self, old: &NetworkState, new: &NetworkState) -> Result<usize, SyncError> {
        let mut written = 0;
        let info = new.info();

        if old.me().nick() != new.me().nick() {
            let origin = old
                .me()
                .hostmask()
                .unwrap_or_else(|| old.me().nick().to_owned());
            let line = Line::new(Some(origin.as_str()), "NICK", [new.me().nick()])
                .with_trailing(Trailing::Auto);
            self.emit(line, &mut written).await?;
        }

        for channel in new.channels() {
            if old.channel(channel.name()).is_none() {
                self.write_channel_state(channel, info, &mut written).await?;
            }
        }

        for channel in old.channels() {
            if new.channel(channel.name()).is_none() {
                let part = Line::new(self.own_hostmask().as_deref(), "PART", [channel.name()])
                    .with_trailing(Trailing::Auto);
                self.emit(part, &mut written).await?;
            }
        }

        for channel in new.channels() {
            if let Some(before) = old.channel(channel.name()) {
                self.write_channel_diff(old, new, before, channel, &mut written)
                    .await?;
            }
        }

        let added = new.me().mode_set().difference(old.me().mode_set());
        let removed = old.me().mode_set().difference(new.me().mode_set());
        let mut flags = String::new();
        for (sign, modes) in [('+', added.collect::<String>()), ('-', removed.collect())] {
            if !modes.is_empty() {
                flags.push(sign);
                flags.push_str(&modes);
            }
        }
        if !flags.is_empty() {
            let nick = new.me().nick();
            let line = Line::new(Some(nick), "MODE", [nick, flags.as_str()])
                .with_trailing(Trailing::Auto);
            self.emit(line, &mut written).await?;
        }

        Ok(written)
    }

    /// Emit the differences between two versions of one channel. Nick
    /// masks are looked up in the state each version belongs to.
    pub async fn send_channel_state_diff(
        &mut self,
        old_state: &NetworkState,
        new_state: &NetworkState,
        old: &ChannelState,
        new: &ChannelState,
    ) -> Result<usize, SyncError> {
        let mut written = 0;
        self.write_channel_diff(old_state, new_state, old, new, &mut written)
            .await?;
        Ok(written)
    }

    async fn write_channel_diff(
        &mut self,
        old_state: &NetworkState,
        new_state: &NetworkState,
        old: &ChannelState,
        new: &ChannelState,
        written: &mut usize,
    ) -> Result<(), SyncError> {
        let name = new.name();

        if old.topic != new.topic {
            let line = match new.topic.as_deref() {
                Some(topic) => Line::new(new.topic_set_by.as_deref(), "TOPIC", [name, topic]),
                None => Line::new(None, "TOPIC", [name]),
            };
            self.emit(line.with_trailing(Trailing::Auto), written).await?;
        }

        for member in old.members() {
            if !new.contains(member.nick()) {
                let mask = mask_in(old_state, member.nick());
                let line = Line::new(Some(mask.as_str()), "PART", [name]).with_trailing(Trailing::Auto);
                self.emit(line, written).await?;
            }
        }
        for member in new.members() {
            if !old.contains(member.nick()) {
                let mask = mask_in(new_state, member.nick());
                let line = Line::new(Some(mask.as_str()), "JOIN", [name]).with_trailing(Trailing::Auto);
                self.emit(line, written).await?;
            }
        }

        let info = new_state.info();
        let max_args = info
            .max_modes
            .map_or(DEFAULT_MAX_MODES, |n| (n as usize).max(1));
        let changes = channel_mode_changes(old, new, info);
        for args in render_mode_lines(&changes, max_args) {
            let line = Line::new(
                Some(self.default_origin.as_str()),
                "MODE",
                std::iter::once(name.to_owned()).chain(args),
            )
            .with_trailing(Trailing::Auto);
            self.emit(line, written).await?;
        }
        Ok(())
    }
}
