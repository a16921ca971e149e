//! Channel-related types and state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use slproxy_proto::{CaseMapping, ModeSet};

use crate::error::LookupError;

/// An entry in a list mode (bans, excepts, invex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub mask: String,
    pub set_by: Option<String>,
    pub set_at: i64,
}

impl ListEntry {
    pub fn new(mask: impl Into<String>) -> Self {
        Self {
            mask: mask.into(),
            set_by: None,
            set_at: 0,
        }
    }
}

/// A nick's membership in one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMember {
    nick: String,
    /// Prefix modes held in this channel (`o`, `v`, ...).
    pub modes: ModeSet,
}

impl ChannelMember {
    pub fn nick(&self) -> &str {
        &self.nick
    }
}

/// Everything we know about one channel.
///
/// Lookups by nick are case-insensitive under the channel's casemapping;
/// the name and nicks keep the case they were first seen with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelState {
    name: String,
    casemapping: CaseMapping,
    members: BTreeMap<String, ChannelMember>,
    modes: ModeSet,
    mode_options: BTreeMap<char, String>,
    lists: BTreeMap<char, Vec<ListEntry>>,
    /// Topic text, `None` when no topic is set.
    pub topic: Option<String>,
    /// When the topic was set; 0 when unknown.
    pub topic_set_time: i64,
    /// Who set the topic.
    pub topic_set_by: Option<String>,
    /// Channel creation time; 0 when unknown.
    pub creation_time: i64,
    /// Visibility character from NAMES replies (`=`, `*` or `@`).
    pub visibility: Option<char>,
    names_in_progress: bool,
    lists_in_progress: BTreeSet<char>,
}

impl ChannelState {
    /// An empty channel using RFC 1459 casemapping.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_casemapping(name, CaseMapping::default())
    }

    pub fn with_casemapping(name: impl Into<String>, casemapping: CaseMapping) -> Self {
        Self {
            name: name.into(),
            casemapping,
            members: BTreeMap::new(),
            modes: ModeSet::new(),
            mode_options: BTreeMap::new(),
            lists: BTreeMap::new(),
            topic: None,
            topic_set_time: 0,
            topic_set_by: None,
            creation_time: 0,
            visibility: None,
            names_in_progress: false,
            lists_in_progress: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-folded name used as the lookup key.
    pub fn key(&self) -> String {
        self.casemapping.fold(&self.name)
    }

    pub fn casemapping(&self) -> CaseMapping {
        self.casemapping
    }

    /// Switch casemapping and re-key the membership.
    pub fn set_casemapping(&mut self, casemapping: CaseMapping) {
        if casemapping == self.casemapping {
            return;
        }
        self.casemapping = casemapping;
        let members = std::mem::take(&mut self.members);
        self.members = members
            .into_values()
            .map(|m| (casemapping.fold(&m.nick), m))
            .collect();
    }

    // ------------------------------------------------------------------
    // Membership
    // ------------------------------------------------------------------

    /// Add a nick, or return the existing membership.
    pub fn add_nick(&mut self, nick: &str) -> &mut ChannelMember {
        self.members
            .entry(self.casemapping.fold(nick))
            .or_insert_with(|| ChannelMember {
                nick: nick.to_owned(),
                modes: ModeSet::new(),
            })
    }

    pub fn remove_nick(&mut self, nick: &str) -> Option<ChannelMember> {
        self.members.remove(&self.casemapping.fold(nick))
    }

    /// Move a membership to a new nick, keeping its modes.
    pub fn rename_nick(&mut self, old: &str, new: &str) -> bool {
        match self.members.remove(&self.casemapping.fold(old)) {
            Some(mut member) => {
                member.nick = new.to_owned();
                self.members.insert(self.casemapping.fold(new), member);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, nick: &str) -> bool {
        self.members.contains_key(&self.casemapping.fold(nick))
    }

    pub fn member(&self, nick: &str) -> Option<&ChannelMember> {
        self.members.get(&self.casemapping.fold(nick))
    }

    pub fn member_mut(&mut self, nick: &str) -> Option<&mut ChannelMember> {
        self.members.get_mut(&self.casemapping.fold(nick))
    }

    /// Members in case-folded nick order.
    pub fn members(&self) -> impl Iterator<Item = &ChannelMember> {
        self.members.values()
    }

    pub fn nicks(&self) -> impl Iterator<Item = &str> {
        self.members.values().map(|m| m.nick.as_str())
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub(crate) fn clear_members(&mut self) -> Vec<ChannelMember> {
        std::mem::take(&mut self.members).into_values().collect()
    }

    // ------------------------------------------------------------------
    // Modes
    // ------------------------------------------------------------------

    pub fn modes(&self) -> &ModeSet {
        &self.modes
    }

    /// Mode flags as `+ntk`, or the empty string when none are set.
    pub fn mode_string(&self) -> String {
        self.modes.to_string()
    }

    pub fn set_mode(&mut self, mode: char) {
        self.modes.set(mode);
    }

    /// Unset a flag and drop any value it carried.
    pub fn unset_mode(&mut self, mode: char) {
        self.modes.unset(mode);
        self.mode_options.remove(&mode);
    }

    /// Replace every flag and value.
    pub fn replace_modes(&mut self, modes: ModeSet, options: BTreeMap<char, String>) {
        self.modes = modes;
        self.mode_options = options;
    }

    /// Value of a value-bearing mode such as `k` or `l`.
    pub fn mode_option(&self, mode: char) -> Result<&str, LookupError> {
        self.mode_options
            .get(&mode)
            .map(String::as_str)
            .ok_or_else(|| LookupError::ModeOptionUnset {
                channel: self.name.clone(),
                mode,
            })
    }

    pub fn set_mode_option(&mut self, mode: char, value: impl Into<String>) {
        self.mode_options.insert(mode, value.into());
    }

    pub fn mode_options(&self) -> impl Iterator<Item = (char, &str)> {
        self.mode_options.iter().map(|(m, v)| (*m, v.as_str()))
    }

    // ------------------------------------------------------------------
    // List modes
    // ------------------------------------------------------------------

    /// Entries of a list mode (`b`, `e`, `I`, ...).
    pub fn list(&self, mode: char) -> &[ListEntry] {
        self.lists.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Add a list entry unless an equal mask is already present.
    pub fn add_list_entry(&mut self, mode: char, entry: ListEntry) {
        let casemapping = self.casemapping;
        let list = self.lists.entry(mode).or_default();
        if !list.iter().any(|e| casemapping.eq(&e.mask, &entry.mask)) {
            list.push(entry);
        }
    }

    pub fn remove_list_entry(&mut self, mode: char, mask: &str) -> bool {
        let casemapping = self.casemapping;
        let Some(list) = self.lists.get_mut(&mode) else {
            return false;
        };
        let before = list.len();
        list.retain(|e| !casemapping.eq(&e.mask, mask));
        if list.is_empty() {
            self.lists.remove(&mode);
        }
        before != self.lists.get(&mode).map_or(0, Vec::len)
    }

    /// Record one entry of a list reply (367, 346, 348). The first entry
    /// after an end marker replaces the whole list.
    pub(crate) fn list_reply_entry(&mut self, mode: char, entry: ListEntry) {
        if self.lists_in_progress.insert(mode) {
            self.lists.remove(&mode);
        }
        self.add_list_entry(mode, entry);
    }

    /// End of a list reply. A reply with no entries empties the list.
    pub(crate) fn list_reply_end(&mut self, mode: char) {
        if !self.lists_in_progress.remove(&mode) {
            self.lists.remove(&mode);
        }
    }

    /// Start or continue a NAMES reply. Returns true for the first reply
    /// after an end marker, whose members replace the current ones.
    pub(crate) fn names_reply_begin(&mut self) -> bool {
        !std::mem::replace(&mut self.names_in_progress, true)
    }

    pub(crate) fn names_reply_end(&mut self) {
        self.names_in_progress = false;
    }

    // ------------------------------------------------------------------
    // Topic
    // ------------------------------------------------------------------

    pub fn set_topic(&mut self, topic: impl Into<String>, set_by: Option<&str>, set_time: i64) {
        self.topic = Some(topic.into());
        self.topic_set_by = set_by.map(str::to_owned);
        self.topic_set_time = set_time;
    }

    pub fn clear_topic(&mut self) {
        self.topic = None;
        self.topic_set_by = None;
        self.topic_set_time = 0;
    }
}
