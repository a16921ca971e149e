//! Nick-related types and state.

use serde::{Deserialize, Serialize};
use slproxy_proto::ModeSet;

/// A participant visible on the network.
///
/// Per-channel modes (op, voice) live on the channel membership, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nick {
    nick: String,
    username: Option<String>,
    hostname: Option<String>,
    /// Real name from WHO replies.
    pub realname: Option<String>,
    /// Server the nick is connected to, from WHO replies.
    pub server: Option<String>,
    /// Hop count from WHO replies.
    pub hops: Option<u32>,
    modes: ModeSet,
    /// Marked away.
    pub away: bool,
    /// We have a private conversation with this nick, so keep it around
    /// even when it shares no channel with us.
    pub query: bool,
}

impl Nick {
    /// A nick with a fully known mask.
    pub fn new(nick: impl Into<String>, username: impl Into<String>, hostname: impl Into<String>) -> Self {
        let mut n = Self::from_name(nick);
        n.username = Some(username.into());
        n.hostname = Some(hostname.into());
        n
    }

    /// A nick whose username and hostname are not known yet.
    pub fn from_name(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            username: None,
            hostname: None,
            realname: None,
            server: None,
            hops: None,
            modes: ModeSet::new(),
            away: false,
            query: false,
        }
    }

    /// Parse `nick!user@host`. Missing parts stay unknown.
    pub fn from_hostmask(mask: &str) -> Self {
        let mut n = Self::from_name(String::new());
        n.set_hostmask(mask);
        n
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    pub fn set_nick(&mut self, nick: impl Into<String>) {
        self.nick = nick.into();
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = Some(username.into());
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    pub fn set_hostname(&mut self, hostname: impl Into<String>) {
        self.hostname = Some(hostname.into());
    }

    /// `nick!user@host`, once both username and hostname are known.
    pub fn hostmask(&self) -> Option<String> {
        match (&self.username, &self.hostname) {
            (Some(user), Some(host)) => Some(format!("{}!{}@{}", self.nick, user, host)),
            _ => None,
        }
    }

    /// The hostmask, or a placeholder mask for nicks we never saw in full.
    pub fn hostmask_or_unknown(&self) -> String {
        self.hostmask()
            .unwrap_or_else(|| format!("{}!~UNKNOWN@UNKNOWN", self.nick))
    }

    /// Replace nick, username and hostname from a `nick!user@host` mask.
    ///
    /// A mask without `!` or `@` only updates the parts it has.
    pub fn set_hostmask(&mut self, mask: &str) {
        let (nick_user, host) = match mask.rsplit_once('@') {
            Some((left, host)) => (left, Some(host)),
            None => (mask, None),
        };
        let (nick, user) = match nick_user.split_once('!') {
            Some((nick, user)) => (nick, Some(user)),
            None => (nick_user, None),
        };
        if !nick.is_empty() {
            self.nick = nick.to_owned();
        }
        if let Some(user) = user.filter(|u| !u.is_empty()) {
            self.username = Some(user.to_owned());
        }
        if let Some(host) = host.filter(|h| !h.is_empty()) {
            self.hostname = Some(host.to_owned());
        }
    }

    /// Channel-independent user modes as `+iw`, or `None` when none are set.
    pub fn modes(&self) -> Option<String> {
        self.modes.to_mode_string()
    }

    pub fn mode_set(&self) -> &ModeSet {
        &self.modes
    }

    /// Replace the user modes. An empty string clears them.
    pub fn set_modes(&mut self, modes: &str) {
        self.modes.replace(modes);
    }

    /// Apply a `+x-y` change to the user modes.
    pub fn apply_modes(&mut self, change: &str) {
        self.modes.apply(change);
    }
}
