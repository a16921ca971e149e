//! Network state tracking.
//!
//! [`NetworkState`] is the proxy's picture of one IRC network: our own
//! identity, the channels we are in with their members, modes and topics,
//! and every nick we can currently see. It is driven one line at a time by
//! [`NetworkState::handle_line`]; the per-command transitions live in
//! [`handlers`].

mod channel;
mod handlers;
mod nick;
mod observer;

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use slproxy_proto::{Line, NetworkInfo, ParseError};

use crate::error::LookupError;

pub use channel::{ChannelMember, ChannelState, ListEntry};
pub use nick::Nick;
pub use observer::StateObserver;

/// Live state of one IRC network as seen by the proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkState {
    info: NetworkInfo,
    me: Nick,
    nicks: BTreeMap<String, Nick>,
    channels: BTreeMap<String, ChannelState>,
}

impl NetworkState {
    /// Fresh state for a session: no channels, only ourselves.
    pub fn new(nick: &str, username: &str, hostname: &str) -> Self {
        let mut me = Nick::new(nick, username, hostname);
        me.query = true;
        Self {
            info: NetworkInfo::default(),
            me,
            nicks: BTreeMap::new(),
            channels: BTreeMap::new(),
        }
    }

    /// Same identity and network info without channels, nicks, user modes
    /// or away state: what a freshly registered client knows.
    pub fn empty_like(&self) -> Self {
        let mut me = self.me.clone();
        me.set_modes("");
        me.away = false;
        Self {
            info: self.info.clone(),
            me,
            nicks: BTreeMap::new(),
            channels: BTreeMap::new(),
        }
    }

    pub fn info(&self) -> &NetworkInfo {
        &self.info
    }

    /// Our own nick record.
    pub fn me(&self) -> &Nick {
        &self.me
    }

    pub fn me_mut(&mut self) -> &mut Nick {
        &mut self.me
    }

    /// Whether `nick` is us.
    pub fn is_me(&self, nick: &str) -> bool {
        self.info.irc_eq(nick, self.me.nick())
    }

    // ------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------

    pub fn channel(&self, name: &str) -> Option<&ChannelState> {
        self.channels.get(&self.info.fold(name))
    }

    pub fn channel_mut(&mut self, name: &str) -> Option<&mut ChannelState> {
        self.channels.get_mut(&self.info.fold(name))
    }

    /// Like [`channel`](Self::channel), as a `Result`.
    pub fn get_channel(&self, name: &str) -> Result<&ChannelState, LookupError> {
        self.channel(name)
            .ok_or_else(|| LookupError::NoSuchChannel(name.to_owned()))
    }

    /// Channels in case-folded name order.
    pub fn channels(&self) -> impl Iterator<Item = &ChannelState> {
        self.channels.values()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Track a channel, replacing any channel with the same name. Members
    /// without a nick record get one.
    pub fn add_channel(&mut self, mut channel: ChannelState) {
        channel.set_casemapping(self.info.casemapping);
        let members: Vec<String> = channel.nicks().map(str::to_owned).collect();
        self.channels.insert(channel.key(), channel);
        for nick in members {
            self.ensure_nick(&nick);
        }
    }

    /// Stop tracking a channel. Nicks left without any shared channel are
    /// forgotten.
    pub fn remove_channel(&mut self, name: &str) -> Option<ChannelState> {
        let channel = self.channels.remove(&self.info.fold(name))?;
        for member in channel.members() {
            self.drop_if_orphan(member.nick());
        }
        Some(channel)
    }

    // ------------------------------------------------------------------
    // Nicks
    // ------------------------------------------------------------------

    pub fn nick(&self, name: &str) -> Option<&Nick> {
        if self.is_me(name) {
            return Some(&self.me);
        }
        self.nicks.get(&self.info.fold(name))
    }

    pub fn nick_mut(&mut self, name: &str) -> Option<&mut Nick> {
        if self.is_me(name) {
            return Some(&mut self.me);
        }
        self.nicks.get_mut(&self.info.fold(name))
    }

    /// Like [`nick`](Self::nick), as a `Result`.
    pub fn get_nick(&self, name: &str) -> Result<&Nick, LookupError> {
        self.nick(name)
            .ok_or_else(|| LookupError::NoSuchNick(name.to_owned()))
    }

    /// Every known nick, ourselves first.
    pub fn nicks(&self) -> impl Iterator<Item = &Nick> {
        std::iter::once(&self.me).chain(self.nicks.values())
    }

    /// Track a nick. Our own nick cannot be replaced this way.
    pub fn add_nick(&mut self, nick: Nick) {
        if self.is_me(nick.nick()) {
            return;
        }
        self.nicks.insert(self.info.fold(nick.nick()), nick);
    }

    /// Channels `nick` is a member of.
    pub fn nick_channels<'a>(&'a self, nick: &'a str) -> impl Iterator<Item = &'a ChannelState> + 'a {
        self.channels.values().filter(move |c| c.contains(nick))
    }

    // ------------------------------------------------------------------
    // Line processing
    // ------------------------------------------------------------------

    /// Apply one line to the state.
    ///
    /// Lines below the minimum argument count for their command are
    /// rejected with [`ParseError::NotEnoughArguments`] and change nothing.
    /// Anything else is accepted; unknown commands, channels and nicks are
    /// no-ops.
    pub fn handle_line(&mut self, line: &Line) -> Result<(), ParseError> {
        self.handle_line_at(line, Utc::now().timestamp())
    }

    /// [`handle_line`](Self::handle_line) with an explicit clock, so replay
    /// reproduces the timestamps live processing recorded.
    pub fn handle_line_at(&mut self, line: &Line, now: i64) -> Result<(), ParseError> {
        line.check_args()?;
        self.dispatch(line, now);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Internal helpers shared by the handlers
    // ------------------------------------------------------------------

    /// Nick record for `nick`, created when missing.
    fn ensure_nick(&mut self, nick: &str) -> &mut Nick {
        if self.is_me(nick) {
            return &mut self.me;
        }
        self.nicks
            .entry(self.info.fold(nick))
            .or_insert_with(|| Nick::from_name(nick))
    }

    /// Nick record for the sender of `mask`, with its user and host filled
    /// in when the mask carries them.
    fn ensure_nick_mask(&mut self, mask: &str) -> &mut Nick {
        let nick = slproxy_proto::nick_of(mask);
        let record = self.ensure_nick(nick);
        if mask.contains('!') || mask.contains('@') {
            record.set_hostmask(mask);
        }
        record
    }

    fn is_orphan(&self, nick: &str) -> bool {
        !self.is_me(nick)
            && !self.nick(nick).is_some_and(|n| n.query)
            && !self.channels.values().any(|c| c.contains(nick))
    }

    fn drop_if_orphan(&mut self, nick: &str) {
        if self.is_orphan(nick) {
            self.nicks.remove(&self.info.fold(nick));
        }
    }

    /// Forget every nick that shares no channel with us.
    fn prune_orphans(&mut self) {
        let orphans: Vec<String> = self
            .nicks
            .values()
            .filter(|n| self.is_orphan(n.nick()))
            .map(|n| n.nick().to_owned())
            .collect();
        for nick in orphans {
            self.nicks.remove(&self.info.fold(&nick));
        }
    }

    /// Rebuild lookup keys after the casemapping changed.
    fn rekey(&mut self) {
        let casemapping = self.info.casemapping;
        let channels = std::mem::take(&mut self.channels);
        self.channels = channels
            .into_values()
            .map(|mut c| {
                c.set_casemapping(casemapping);
                (c.key(), c)
            })
            .collect();
        let nicks = std::mem::take(&mut self.nicks);
        self.nicks = nicks
            .into_values()
            .map(|n| (casemapping.fold(n.nick()), n))
            .collect();
    }
}
