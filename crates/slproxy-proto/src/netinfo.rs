//! Per-network capability table.
//!
//! [`NetworkInfo`] collects what a server tells us about itself in `004`
//! and `005` replies: how nicks are case-folded, which characters start a
//! channel name, which mode letters map to membership prefixes and how
//! channel modes consume arguments. Everything else in the proxy asks this
//! table instead of hardcoding RFC 1459 defaults.

use std::cmp::Ordering;

use tracing::warn;

use crate::casemap::CaseMapping;
use crate::isupport::{ChanModes, Isupport, PrefixSpec};
use crate::mode::{ModeSet, Sign};

const DEFAULT_PREFIX_MODES: &str = "ov";
const DEFAULT_PREFIX_CHARS: &str = "@+";
const DEFAULT_CHANTYPES: &str = "#&";
const DEFAULT_CHANMODES: [&str; 4] = ["beI", "k", "l", "imnpsta"];

/// How a channel mode letter behaves in a MODE command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChanModeType {
    /// Type A: adds or removes a list entry; always takes an argument.
    List,
    /// Type B: always takes an argument (`k`).
    Setting,
    /// Type C: takes an argument only when set (`l`).
    OptSetting,
    /// Type D: plain flag.
    Flag,
    /// Membership prefix mode (`o`, `v`); the argument is a nick.
    Prefix,
    /// Not announced by the server.
    Unknown,
}

/// Capabilities of one IRC network.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NetworkInfo {
    /// `NETWORK` name.
    pub name: Option<String>,
    /// Server name from `004`.
    pub server: Option<String>,
    /// Server version from `004`.
    pub version: Option<String>,
    /// User mode letters from `004`.
    pub supported_user_modes: Option<String>,
    /// Channel mode letters from `004`.
    pub supported_channel_modes: Option<String>,
    /// Case-folding rule.
    pub casemapping: CaseMapping,
    /// Prefix mode letters, highest rank first.
    pub prefix_modes: String,
    /// Prefix characters, positionally matching `prefix_modes`.
    pub prefix_chars: String,
    /// Characters a channel name may start with.
    pub chantypes: String,
    /// `CHANMODES` classes A, B, C and D.
    pub chanmodes: [String; 4],
    /// Ban exception mode letter.
    pub excepts_mode: Option<char>,
    /// Invite exception mode letter.
    pub invex_mode: Option<char>,
    /// Prefixes allowed in front of a channel in PRIVMSG/NOTICE targets.
    pub statusmsg: Option<String>,
    /// Advertised character set.
    pub charset: Option<String>,
    /// Maximum nick length.
    pub nicklen: Option<u32>,
    /// Maximum channel name length.
    pub channellen: Option<u32>,
    /// Maximum topic length.
    pub topiclen: Option<u32>,
    /// Maximum kick reason length.
    pub kicklen: Option<u32>,
    /// Maximum away message length.
    pub awaylen: Option<u32>,
    /// Maximum value-bearing modes per MODE command.
    pub max_modes: Option<u32>,
    /// Maximum channels a client may join.
    pub maxchannels: Option<u32>,
    /// NAMES replies list every prefix of a member.
    pub namesx: bool,
    /// NAMES replies carry full nickmasks.
    pub uhnames: bool,
}

impl Default for NetworkInfo {
    fn default() -> Self {
        NetworkInfo {
            name: None,
            server: None,
            version: None,
            supported_user_modes: None,
            supported_channel_modes: None,
            casemapping: CaseMapping::default(),
            prefix_modes: DEFAULT_PREFIX_MODES.to_owned(),
            prefix_chars: DEFAULT_PREFIX_CHARS.to_owned(),
            chantypes: DEFAULT_CHANTYPES.to_owned(),
            chanmodes: DEFAULT_CHANMODES.map(str::to_owned),
            excepts_mode: None,
            invex_mode: None,
            statusmsg: None,
            charset: None,
            nicklen: None,
            channellen: None,
            topiclen: None,
            kicklen: None,
            awaylen: None,
            max_modes: None,
            maxchannels: None,
            namesx: false,
            uhnames: false,
        }
    }
}

fn parse_len(key: &str, value: Option<&str>) -> Option<u32> {
    let value = value?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            warn!(key, value, "ignoring non-numeric ISUPPORT value");
            None
        }
    }
}

fn single_char(value: Option<&str>, default: char) -> Option<char> {
    Some(value.and_then(|v| v.chars().next()).unwrap_or(default))
}

impl NetworkInfo {
    /// Compare two names under the network's casemapping.
    pub fn irccmp(&self, a: &str, b: &str) -> Ordering {
        self.casemapping.cmp(a, b)
    }

    /// Case-insensitive equality under the network's casemapping.
    pub fn irc_eq(&self, a: &str, b: &str) -> bool {
        self.casemapping.eq(a, b)
    }

    /// Case-folded form used as a lookup key.
    pub fn fold(&self, name: &str) -> String {
        self.casemapping.fold(name)
    }

    /// Whether `name` starts with one of the channel type characters.
    pub fn is_channel_name(&self, name: &str) -> bool {
        name.chars()
            .next()
            .is_some_and(|c| self.chantypes.contains(c))
    }

    /// Whether `c` is a membership prefix character (`@`, `+`, ...).
    pub fn is_prefix(&self, c: char) -> bool {
        self.prefix_chars.contains(c)
    }

    /// Mode letter for a prefix character.
    pub fn mode_for_prefix(&self, prefix: char) -> Option<char> {
        self.prefix_chars
            .chars()
            .position(|c| c == prefix)
            .and_then(|i| self.prefix_modes.chars().nth(i))
    }

    /// Prefix character for a mode letter.
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        self.prefix_modes
            .chars()
            .position(|c| c == mode)
            .and_then(|i| self.prefix_chars.chars().nth(i))
    }

    /// Highest ranked prefix character among `modes`.
    pub fn highest_prefix(&self, modes: &ModeSet) -> Option<char> {
        self.prefix_modes
            .chars()
            .find(|m| modes.contains(*m))
            .and_then(|m| self.prefix_for_mode(m))
    }

    /// Split a NAMES entry such as `@+nick` into its prefix modes and the
    /// remainder.
    pub fn split_name_prefix<'a>(&self, entry: &'a str) -> (ModeSet, &'a str) {
        let mut modes = ModeSet::new();
        let mut rest = entry;
        while let Some(c) = rest.chars().next() {
            match self.mode_for_prefix(c) {
                Some(mode) => {
                    modes.set(mode);
                    rest = &rest[c.len_utf8()..];
                }
                None => break,
            }
        }
        (modes, rest)
    }

    /// Classify a channel mode letter.
    pub fn chanmode_type(&self, mode: char) -> ChanModeType {
        if self.prefix_modes.contains(mode) {
            return ChanModeType::Prefix;
        }
        let [a, b, c, d] = &self.chanmodes;
        if a.contains(mode) {
            ChanModeType::List
        } else if b.contains(mode) {
            ChanModeType::Setting
        } else if c.contains(mode) {
            ChanModeType::OptSetting
        } else if d.contains(mode) {
            ChanModeType::Flag
        } else {
            ChanModeType::Unknown
        }
    }

    /// Whether a channel mode change consumes a positional argument.
    pub fn takes_arg(&self, sign: Sign, mode: char) -> bool {
        match self.chanmode_type(mode) {
            ChanModeType::List | ChanModeType::Setting | ChanModeType::Prefix => true,
            ChanModeType::OptSetting => sign == Sign::Plus,
            ChanModeType::Flag | ChanModeType::Unknown => false,
        }
    }

    /// Apply the arguments of a `004` reply: `<me> <server> <version>
    /// <usermodes> <chanmodes> ...`.
    pub fn handle_004(&mut self, args: &[String]) {
        self.server = args.get(1).cloned();
        self.version = args.get(2).cloned();
        self.supported_user_modes = args.get(3).cloned();
        self.supported_channel_modes = args.get(4).cloned();
        self.reconcile_chanmodes();
    }

    /// Apply every token of one or more `005` replies.
    pub fn apply_isupport(&mut self, isupport: &Isupport<'_>) {
        for entry in isupport.iter() {
            self.apply_token(entry.key, entry.value);
        }
        self.reconcile_chanmodes();
    }

    fn apply_token(&mut self, key: &str, value: Option<&str>) {
        if let Some(negated) = key.strip_prefix('-') {
            self.reset_token(negated);
            return;
        }

        match key.to_ascii_uppercase().as_str() {
            "CASEMAPPING" => {
                let value = value.unwrap_or_default();
                self.casemapping = CaseMapping::from_token(value).unwrap_or_else(|| {
                    warn!(value, "unknown CASEMAPPING, using rfc1459");
                    CaseMapping::Rfc1459
                });
            }
            "NETWORK" => self.name = value.map(str::to_owned),
            "CHANTYPES" => self.chantypes = value.unwrap_or_default().to_owned(),
            "CHANMODES" => match value.and_then(ChanModes::parse) {
                Some(modes) => {
                    self.chanmodes = [modes.a, modes.b, modes.c, modes.d].map(str::to_owned);
                }
                None => warn!(value, "CHANMODES is not a 4-tuple, ignoring"),
            },
            "PREFIX" => match PrefixSpec::parse(value.unwrap_or_default()) {
                Some(spec) => {
                    self.prefix_modes = spec.modes.to_owned();
                    self.prefix_chars = spec.prefixes.to_owned();
                }
                None => warn!(value, "malformed PREFIX, ignoring"),
            },
            "EXCEPTS" => self.excepts_mode = single_char(value, 'e'),
            "INVEX" => self.invex_mode = single_char(value, 'I'),
            "STATUSMSG" => self.statusmsg = value.map(str::to_owned),
            "CHARSET" => self.charset = value.map(str::to_owned),
            "NAMESX" => self.namesx = true,
            "UHNAMES" => self.uhnames = true,
            "NICKLEN" => self.nicklen = parse_len(key, value),
            "CHANNELLEN" => self.channellen = parse_len(key, value),
            "TOPICLEN" => self.topiclen = parse_len(key, value),
            "KICKLEN" => self.kicklen = parse_len(key, value),
            "AWAYLEN" => self.awaylen = parse_len(key, value),
            "MODES" => self.max_modes = parse_len(key, value),
            "MAXCHANNELS" => self.maxchannels = parse_len(key, value),
            _ => {}
        }
    }

    fn reset_token(&mut self, key: &str) {
        let defaults = NetworkInfo::default();
        match key.to_ascii_uppercase().as_str() {
            "CASEMAPPING" => self.casemapping = defaults.casemapping,
            "NETWORK" => self.name = None,
            "CHANTYPES" => self.chantypes = defaults.chantypes,
            "CHANMODES" => self.chanmodes = defaults.chanmodes,
            "PREFIX" => {
                self.prefix_modes = defaults.prefix_modes;
                self.prefix_chars = defaults.prefix_chars;
            }
            "EXCEPTS" => self.excepts_mode = None,
            "INVEX" => self.invex_mode = None,
            "STATUSMSG" => self.statusmsg = None,
            "CHARSET" => self.charset = None,
            "NAMESX" => self.namesx = false,
            "UHNAMES" => self.uhnames = false,
            "NICKLEN" => self.nicklen = None,
            "CHANNELLEN" => self.channellen = None,
            "TOPICLEN" => self.topiclen = None,
            "KICKLEN" => self.kicklen = None,
            "AWAYLEN" => self.awaylen = None,
            "MODES" => self.max_modes = None,
            "MAXCHANNELS" => self.maxchannels = None,
            _ => {}
        }
    }

    /// Make sure every CHANMODES letter is listed in the `004` channel
    /// modes.
    fn reconcile_chanmodes(&mut self) {
        let Some(supported) = self.supported_channel_modes.as_mut() else {
            return;
        };
        for mode in self.chanmodes.iter().flat_map(|class| class.chars()) {
            if !supported.contains(mode) {
                warn!(%mode, "CHANMODES letter missing from 004 channel modes, adding");
                supported.push(mode);
            }
        }
    }

    /// Render the table back into `005` tokens.
    pub fn isupport_tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            format!("CASEMAPPING={}", self.casemapping.as_token()),
            format!("CHANTYPES={}", self.chantypes),
            format!("CHANMODES={}", self.chanmodes.join(",")),
            format!("PREFIX=({}){}", self.prefix_modes, self.prefix_chars),
        ];
        if let Some(name) = &self.name {
            tokens.push(format!("NETWORK={}", name));
        }
        if let Some(mode) = self.excepts_mode {
            tokens.push(format!("EXCEPTS={}", mode));
        }
        if let Some(mode) = self.invex_mode {
            tokens.push(format!("INVEX={}", mode));
        }
        if let Some(statusmsg) = &self.statusmsg {
            tokens.push(format!("STATUSMSG={}", statusmsg));
        }
        if let Some(charset) = &self.charset {
            tokens.push(format!("CHARSET={}", charset));
        }
        for (key, value) in [
            ("NICKLEN", self.nicklen),
            ("CHANNELLEN", self.channellen),
            ("TOPICLEN", self.topiclen),
            ("KICKLEN", self.kicklen),
            ("AWAYLEN", self.awaylen),
            ("MODES", self.max_modes),
            ("MAXCHANNELS", self.maxchannels),
        ] {
            if let Some(n) = value {
                tokens.push(format!("{}={}", key, n));
            }
        }
        if self.namesx {
            tokens.push("NAMESX".to_owned());
        }
        if self.uhnames {
            tokens.push("UHNAMES".to_owned());
        }
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isupport::parse_params;

    #[test]
    fn test_defaults() {
        let info = NetworkInfo::default();
        assert!(info.is_channel_name("#foo"));
        assert!(info.is_channel_name("&local"));
        assert!(!info.is_channel_name("nick"));
        assert!(!info.is_channel_name(""));
        assert!(info.is_prefix('@'));
        assert!(!info.is_prefix('#'));
        assert_eq!(info.mode_for_prefix('@'), Some('o'));
        assert_eq!(info.prefix_for_mode('v'), Some('+'));
        assert_eq!(info.irccmp("Nick[a]", "nick{A}"), Ordering::Equal);
    }

    #[test]
    fn test_default_value_bearing_set() {
        let info = NetworkInfo::default();
        for mode in ['b', 'k', 'l', 'v', 'o'] {
            assert!(info.takes_arg(Sign::Plus, mode), "{mode}");
        }
        for mode in ['n', 't', 'm', 'x'] {
            assert!(!info.takes_arg(Sign::Plus, mode), "{mode}");
        }
        assert!(info.takes_arg(Sign::Minus, 'k'));
        assert!(!info.takes_arg(Sign::Minus, 'l'));
        assert_eq!(info.chanmode_type('x'), ChanModeType::Unknown);
    }

    #[test]
    fn test_apply_isupport() {
        let mut info = NetworkInfo::default();
        info.apply_isupport(&parse_params(&[
            "NETWORK=TestNet",
            "CASEMAPPING=ascii",
            "CHANTYPES=#",
            "PREFIX=(qaohv)~&@%+",
            "CHANMODES=beI,kL,lj,psmntirRcOAQKVCuzNSMTGZ",
            "NICKLEN=30",
            "EXCEPTS",
            "NAMESX",
        ]));
        assert_eq!(info.name.as_deref(), Some("TestNet"));
        assert_eq!(info.casemapping, CaseMapping::Ascii);
        assert!(!info.is_channel_name("&local"));
        assert_eq!(info.mode_for_prefix('~'), Some('q'));
        assert_eq!(info.chanmode_type('L'), ChanModeType::Setting);
        assert_eq!(info.chanmode_type('j'), ChanModeType::OptSetting);
        assert_eq!(info.nicklen, Some(30));
        assert_eq!(info.excepts_mode, Some('e'));
        assert!(info.namesx);
        assert_ne!(info.irccmp("a[", "A{"), Ordering::Equal);
    }

    #[test]
    fn test_malformed_tokens_keep_previous_values() {
        let mut info = NetworkInfo::default();
        info.apply_isupport(&parse_params(&[
            "PREFIX=ov@+",
            "CHANMODES=b,k",
            "CASEMAPPING=klingon",
            "NICKLEN=lots",
        ]));
        assert_eq!(info.prefix_modes, "ov");
        assert_eq!(info.chanmodes[0], "beI");
        assert_eq!(info.casemapping, CaseMapping::Rfc1459);
        assert_eq!(info.nicklen, None);
    }

    #[test]
    fn test_negated_token_resets() {
        let mut info = NetworkInfo::default();
        info.apply_isupport(&parse_params(&["NETWORK=Foo", "PREFIX=(o)@"]));
        info.apply_isupport(&parse_params(&["-NETWORK", "-PREFIX"]));
        assert_eq!(info.name, None);
        assert_eq!(info.prefix_modes, "ov");
    }

    #[test]
    fn test_004_reconciles_chanmodes() {
        let mut info = NetworkInfo::default();
        let args: Vec<String> = ["me", "irc.example.net", "ircd-1.0", "iw", "klmnt"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        info.handle_004(&args);
        assert_eq!(info.server.as_deref(), Some("irc.example.net"));
        let modes = info.supported_channel_modes.unwrap();
        for mode in "beIklimnpsta".chars() {
            assert!(modes.contains(mode), "{mode}");
        }
    }

    #[test]
    fn test_split_name_prefix() {
        let info = NetworkInfo::default();
        let (modes, rest) = info.split_name_prefix("@+bob");
        assert_eq!(rest, "bob");
        assert!(modes.contains('o') && modes.contains('v'));
        assert_eq!(info.highest_prefix(&modes), Some('@'));

        let (modes, rest) = info.split_name_prefix("carol");
        assert!(modes.is_empty());
        assert_eq!(rest, "carol");
    }

    #[test]
    fn test_isupport_tokens_round_trip() {
        let mut info = NetworkInfo::default();
        info.apply_isupport(&parse_params(&["NETWORK=TestNet", "TOPICLEN=390", "UHNAMES"]));
        let tokens = info.isupport_tokens();
        let borrowed: Vec<&str> = tokens.iter().map(String::as_str).collect();
        let mut copy = NetworkInfo::default();
        copy.apply_isupport(&parse_params(&borrowed));
        assert_eq!(copy, info);
    }
}
