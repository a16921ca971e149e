//! Per-command state transitions.
//!
//! Dispatch is over the closed [`Command`] set; everything without a handler
//! falls through to a no-op. Handlers never fail: unknown channels and nicks
//! are logged and ignored.

use std::collections::BTreeMap;

use slproxy_proto::{
    ChanModeType, Command, Isupport, Line, ModeSet, Prefix, Response, Sign, nick_of,
    parse_mode_changes,
};
use tracing::{debug, warn};

use super::{ChannelState, ListEntry, NetworkState};

/// Split a comma separated target list, skipping empty items.
fn targets(arg: &str) -> impl Iterator<Item = &str> {
    arg.split(',').filter(|t| !t.is_empty())
}

impl NetworkState {
    pub(super) fn dispatch(&mut self, line: &Line, now: i64) {
        match line.command() {
            Command::Join => self.handle_join(line),
            Command::Part => self.handle_part(line),
            Command::Kick => self.handle_kick(line),
            Command::Quit => self.handle_quit(line),
            Command::Nick => self.handle_nick(line),
            Command::Topic => self.handle_topic(line, now),
            Command::Mode => self.handle_mode(line, now),
            Command::Privmsg | Command::Notice => self.handle_message(line),
            Command::Response(response) => self.handle_response(response, line),
            Command::Ping | Command::Pong | Command::Numeric(_) | Command::Other(_) => {}
        }
    }

    /// Nick of the sender, for commands that make no sense without one.
    fn sender<'a>(&self, line: &'a Line) -> Option<&'a str> {
        let nick = line.nick();
        if nick.is_none() {
            debug!(command = line.command_word(), "line without origin, not applied");
        }
        nick
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    fn handle_join(&mut self, line: &Line) {
        let Some(origin) = line.origin() else {
            debug!("JOIN without origin, not applied");
            return;
        };
        let nick = nick_of(origin).to_owned();
        let casemapping = self.info.casemapping;

        for name in targets(&line.args()[0]) {
            let key = self.info.fold(name);
            self.channels
                .entry(key)
                .or_insert_with(|| ChannelState::with_casemapping(name, casemapping))
                .add_nick(&nick);
        }
        self.ensure_nick_mask(origin);
    }

    fn handle_part(&mut self, line: &Line) {
        let Some(nick) = self.sender(line) else {
            return;
        };
        for name in targets(&line.args()[0]) {
            self.leave_channel(name, nick);
        }
    }

    fn handle_kick(&mut self, line: &Line) {
        if self.sender(line).is_none() {
            return;
        }
        let channels: Vec<&str> = targets(&line.args()[0]).collect();
        let nicks = targets(&line.args()[1]);
        for (i, nick) in nicks.enumerate() {
            let channel = if channels.len() == 1 {
                channels[0]
            } else {
                match channels.get(i) {
                    Some(channel) => channel,
                    None => {
                        warn!(nick, "KICK has more nicks than channels");
                        break;
                    }
                }
            };
            self.leave_channel(channel, nick);
        }
    }

    /// Remove `nick` from `name`. When we are no longer a member the channel
    /// is dropped entirely.
    fn leave_channel(&mut self, name: &str, nick: &str) {
        let key = self.info.fold(name);
        let me = self.me.nick().to_owned();
        let Some(channel) = self.channels.get_mut(&key) else {
            debug!(channel = name, nick, "leave for unknown channel ignored");
            return;
        };
        if channel.remove_nick(nick).is_none() {
            debug!(channel = name, nick, "nick was not a member");
        }
        if self.info.irc_eq(nick, &me) || !channel.contains(&me) {
            self.remove_channel(name);
        }
        self.drop_if_orphan(nick);
    }

    fn handle_quit(&mut self, line: &Line) {
        let Some(nick) = self.sender(line) else {
            return;
        };
        if self.is_me(nick) {
            self.channels.clear();
            self.prune_orphans();
            return;
        }
        for channel in self.channels.values_mut() {
            channel.remove_nick(nick);
        }
        self.drop_if_orphan(nick);
    }

    fn handle_nick(&mut self, line: &Line) {
        let Some(old) = self.sender(line) else {
            return;
        };
        let new = line.args()[0].as_str();
        self.rename(old, new);
    }

    fn rename(&mut self, old: &str, new: &str) {
        for channel in self.channels.values_mut() {
            channel.rename_nick(old, new);
        }
        if self.is_me(old) {
            self.me.set_nick(new);
            return;
        }
        match self.nicks.remove(&self.info.fold(old)) {
            Some(mut record) => {
                record.set_nick(new);
                self.nicks.insert(self.info.fold(new), record);
            }
            None => debug!(old, new, "rename of unknown nick"),
        }
    }

    fn handle_message(&mut self, line: &Line) {
        let target = line.args()[0].as_str();
        if !self.is_me(target) {
            return;
        }
        let Some(origin) = line.origin() else {
            return;
        };
        if let Prefix::Nickname(nick, _, _) = Prefix::new_from_str(origin)
            && !nick.is_empty()
            && !self.is_me(&nick)
        {
            self.ensure_nick_mask(origin).query = true;
        }
    }

    // ------------------------------------------------------------------
    // Topic and modes
    // ------------------------------------------------------------------

    fn handle_topic(&mut self, line: &Line, now: i64) {
        let Some(nick) = self.sender(line).map(str::to_owned) else {
            return;
        };
        let name = line.args()[0].as_str();
        let Some(channel) = self.channel_mut(name) else {
            debug!(channel = name, "TOPIC for unknown channel ignored");
            return;
        };
        match line.arg(1) {
            Some("") => channel.clear_topic(),
            Some(topic) => channel.set_topic(topic, Some(&nick), now),
            None => {}
        }
    }

    fn handle_mode(&mut self, line: &Line, now: i64) {
        let Some(setter) = self.sender(line).map(str::to_owned) else {
            return;
        };
        let target = line.args()[0].as_str();
        let Some(flags) = line.arg(1) else {
            return;
        };

        if !self.info.is_channel_name(target) {
            match self.nick_mut(target) {
                Some(nick) => nick.apply_modes(flags),
                None => debug!(nick = target, "MODE for unknown nick ignored"),
            }
            return;
        }

        let info = &self.info;
        let changes = parse_mode_changes(
            flags,
            line.args()[2..].iter().map(String::as_str),
            |sign, mode| info.takes_arg(sign, mode),
        );
        if !changes.missing.is_empty() {
            debug!(channel = target, missing = ?changes.missing, "MODE is short of arguments");
        }

        let key = self.info.fold(target);
        let Some(channel) = self.channels.get_mut(&key) else {
            debug!(channel = target, "MODE for unknown channel ignored");
            return;
        };

        for change in changes.changes {
            match (self.info.chanmode_type(change.mode), change.arg) {
                (ChanModeType::List, Some(mask)) => match change.sign {
                    Sign::Plus => channel.add_list_entry(
                        change.mode,
                        ListEntry {
                            mask,
                            set_by: Some(setter.clone()),
                            set_at: now,
                        },
                    ),
                    Sign::Minus => {
                        channel.remove_list_entry(change.mode, &mask);
                    }
                },
                (ChanModeType::Prefix, Some(nick)) => match channel.member_mut(&nick) {
                    Some(member) => {
                        member.modes.change(change.sign, change.mode);
                    }
                    None => debug!(channel = target, nick, "prefix mode for non-member"),
                },
                (ChanModeType::List | ChanModeType::Prefix, None) => {}
                (kind, arg) => {
                    if kind == ChanModeType::Unknown {
                        debug!(channel = target, mode = %change.mode, "unannounced channel mode, treating as flag");
                    }
                    match change.sign {
                        Sign::Plus => {
                            channel.set_mode(change.mode);
                            if let Some(value) = arg {
                                channel.set_mode_option(change.mode, value);
                            }
                        }
                        Sign::Minus => channel.unset_mode(change.mode),
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Numerics
    // ------------------------------------------------------------------

    fn handle_response(&mut self, response: Response, line: &Line) {
        let args = line.args();
        match response {
            Response::RPL_WELCOME => {
                let nick = args[0].clone();
                if self.me.nick() != nick {
                    let old = self.me.nick().to_owned();
                    self.rename(&old, &nick);
                }
            }
            Response::RPL_MYINFO => self.info.handle_004(args),
            Response::RPL_ISUPPORT => {
                if let Some(isupport) = Isupport::from_line(line) {
                    let before = self.info.casemapping;
                    self.info.apply_isupport(&isupport);
                    if self.info.casemapping != before {
                        self.rekey();
                    }
                }
            }
            Response::RPL_UMODEIS => {
                if let Some(modes) = args.last() {
                    self.me.set_modes(modes);
                }
            }
            Response::RPL_USERHOST => self.handle_userhost(&args[1]),
            Response::RPL_UNAWAY => self.me.away = false,
            Response::RPL_NOWAWAY => self.me.away = true,
            Response::RPL_CHANNELMODEIS => self.handle_channel_modes(line),
            Response::RPL_CREATIONTIME => {
                let time: i64 = args[2].parse().unwrap_or_else(|_| {
                    warn!(value = %args[2], "non-numeric creation time");
                    0
                });
                if let Some(channel) = self.known_channel(&args[1]) {
                    channel.creation_time = time;
                }
            }
            Response::RPL_NOTOPIC => {
                if let Some(channel) = self.known_channel(&args[1]) {
                    channel.clear_topic();
                }
            }
            Response::RPL_TOPIC => {
                let topic = args[2].clone();
                if let Some(channel) = self.known_channel(&args[1]) {
                    channel.topic = Some(topic);
                }
            }
            Response::RPL_TOPICWHOTIME => {
                let set_by = args[2].clone();
                let time: i64 = args[3].parse().unwrap_or(0);
                if let Some(channel) = self.known_channel(&args[1]) {
                    channel.topic_set_by = Some(set_by);
                    channel.topic_set_time = time;
                }
            }
            Response::RPL_NAMREPLY => self.handle_names(line),
            Response::RPL_ENDOFNAMES => {
                if let Some(channel) = self.known_channel(&args[1]) {
                    channel.names_reply_end();
                }
                self.prune_orphans();
            }
            Response::RPL_BANLIST => self.handle_list_entry('b', line),
            Response::RPL_INVITELIST => {
                let mode = self.info.invex_mode.unwrap_or('I');
                self.handle_list_entry(mode, line)
            }
            Response::RPL_EXCEPTLIST => {
                let mode = self.info.excepts_mode.unwrap_or('e');
                self.handle_list_entry(mode, line)
            }
            Response::RPL_ENDOFBANLIST => self.handle_list_end('b', line),
            Response::RPL_ENDOFINVITELIST => {
                let mode = self.info.invex_mode.unwrap_or('I');
                self.handle_list_end(mode, line)
            }
            Response::RPL_ENDOFEXCEPTLIST => {
                let mode = self.info.excepts_mode.unwrap_or('e');
                self.handle_list_end(mode, line)
            }
            Response::RPL_WHOREPLY => self.handle_whoreply(line),
            _ => {}
        }
    }

    fn known_channel(&mut self, name: &str) -> Option<&mut ChannelState> {
        let channel = self.channels.get_mut(&self.info.fold(name));
        if channel.is_none() {
            debug!(channel = name, "reply for unknown channel ignored");
        }
        channel
    }

    /// `302 <me> :nick[*]=<+|->user@host ...`
    fn handle_userhost(&mut self, replies: &str) {
        for reply in replies.split(' ').filter(|r| !r.is_empty()) {
            let Some((nick, rest)) = reply.split_once('=') else {
                warn!(reply, "malformed USERHOST reply");
                continue;
            };
            let nick = nick.trim_end_matches('*');
            let away = rest.starts_with('-');
            let mask = rest.trim_start_matches(['+', '-']);
            match self.nick_mut(nick) {
                Some(record) => {
                    record.set_hostmask(&format!("{}!{}", nick, mask));
                    record.away = away;
                }
                None => debug!(nick, "USERHOST for unknown nick"),
            }
        }
    }

    /// `324 <me> <channel> <modes> [values...]` replaces the channel's flags.
    fn handle_channel_modes(&mut self, line: &Line) {
        let args = line.args();
        let info = &self.info;
        let changes = parse_mode_changes(
            &args[2],
            args[3..].iter().map(String::as_str),
            |sign, mode| info.takes_arg(sign, mode),
        );

        let mut modes = ModeSet::new();
        let mut options = BTreeMap::new();
        for change in changes.changes {
            if change.sign == Sign::Minus {
                continue;
            }
            match self.info.chanmode_type(change.mode) {
                ChanModeType::List | ChanModeType::Prefix => {}
                _ => {
                    modes.set(change.mode);
                    if let Some(value) = change.arg {
                        options.insert(change.mode, value);
                    }
                }
            }
        }

        if let Some(channel) = self.known_channel(&args[1]) {
            channel.replace_modes(modes, options);
        }
    }

    /// `353 <me> <visibility> <channel> :[prefixes]nick[!user@host] ...`
    fn handle_names(&mut self, line: &Line) {
        let args = line.args();
        let visibility = args[1].chars().next();
        let Some(channel) = self.known_channel(&args[2]) else {
            return;
        };
        channel.visibility = visibility;
        if channel.names_reply_begin() {
            channel.clear_members();
        }

        let mut seen = Vec::new();
        for entry in args[3].split(' ').filter(|e| !e.is_empty()) {
            let (modes, mask) = self.info.split_name_prefix(entry);
            seen.push((modes, mask));
        }

        let key = self.info.fold(&args[2]);
        for (modes, mask) in seen {
            let nick = nick_of(mask);
            if let Some(channel) = self.channels.get_mut(&key) {
                let member = channel.add_nick(nick);
                for mode in modes.iter() {
                    member.modes.set(mode);
                }
            }
            self.ensure_nick_mask(mask);
        }
    }

    /// `367 <me> <channel> <mask> [<set_by> <set_at>]` and friends.
    fn handle_list_entry(&mut self, mode: char, line: &Line) {
        let args = line.args();
        let entry = ListEntry {
            mask: args[2].clone(),
            set_by: args.get(3).cloned(),
            set_at: args.get(4).and_then(|t| t.parse().ok()).unwrap_or(0),
        };
        if let Some(channel) = self.known_channel(&args[1]) {
            channel.list_reply_entry(mode, entry);
        }
    }

    fn handle_list_end(&mut self, mode: char, line: &Line) {
        if let Some(channel) = self.known_channel(&line.args()[1]) {
            channel.list_reply_end(mode);
        }
    }

    /// `352 <me> <channel> <user> <host> <server> <nick> <flags> :<hops> <realname>`
    fn handle_whoreply(&mut self, line: &Line) {
        let args = line.args();
        let nick = args[5].as_str();
        let Some(record) = self.nick_mut(nick) else {
            debug!(nick, "WHO reply for unknown nick");
            return;
        };
        record.set_username(args[2].as_str());
        record.set_hostname(args[3].as_str());
        record.server = Some(args[4].clone());
        record.away = args[6].starts_with('G');
        let (hops, realname) = args[7].split_once(' ').unwrap_or((args[7].as_str(), ""));
        record.hops = hops.parse().ok();
        record.realname = Some(realname.to_owned());
    }
}
