//! ISUPPORT parsing and data structures.

use crate::command::Command;
use crate::line::Line;
use crate::response::Response;

/// A single ISUPPORT token: `KEY` or `KEY=VALUE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IsupportEntry<'a> {
    /// The token key (e.g., `NETWORK`, `CHANTYPES`).
    pub key: &'a str,
    /// The optional value (e.g., `Libera.Chat` for `NETWORK=Libera.Chat`).
    pub value: Option<&'a str>,
}

/// Tokens carried by one or more `005` lines.
///
/// ```
/// use slproxy_proto::isupport::parse_params;
///
/// let isupport = parse_params(&["NETWORK=TestNet", "CHANTYPES=#&", "PREFIX=(ov)@+"]);
/// assert_eq!(isupport.get("network"), Some(Some("TestNet")));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Isupport<'a> {
    entries: Vec<IsupportEntry<'a>>,
}

impl<'a> Isupport<'a> {
    /// Tokens from the arguments of a `005` reply.
    ///
    /// The first argument (our nick) and the human-readable trailer
    /// ("are supported by this server") are skipped.
    pub fn from_response_args(args: &'a [String]) -> Option<Self> {
        let (_, mut tokens) = args.split_first()?;
        if let Some(last) = tokens.last() {
            if last.contains(' ') {
                tokens = &tokens[..tokens.len() - 1];
            }
        }
        let borrowed: Vec<&'a str> = tokens.iter().map(String::as_str).collect();
        Some(parse_params(&borrowed))
    }

    /// Tokens from a line, or `None` if it is not a `005` reply.
    pub fn from_line(line: &'a Line) -> Option<Self> {
        match line.command() {
            Command::Response(Response::RPL_ISUPPORT) => Self::from_response_args(line.args()),
            _ => None,
        }
    }

    /// Iterate over all parsed entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &IsupportEntry<'a>> {
        self.entries.iter()
    }

    /// Look up a key (case-insensitive). The last occurrence wins.
    ///
    /// Returns `Some(Some(value))` for `KEY=VALUE`, `Some(None)` for a bare
    /// `KEY`, and `None` when the key is absent.
    pub fn get(&self, key: &str) -> Option<Option<&'a str>> {
        self.entries
            .iter()
            .rfind(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value)
    }
}

/// Parse ISUPPORT tokens from a slice of string parameters.
///
/// Parsing stops at the first parameter that starts with `:`.
pub fn parse_params<'a>(params: &[&'a str]) -> Isupport<'a> {
    let entries = params
        .iter()
        .copied()
        .take_while(|p| !p.starts_with(':'))
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((key, value)) => IsupportEntry {
                key,
                value: Some(value),
            },
            None => IsupportEntry {
                key: p,
                value: None,
            },
        })
        .collect();
    Isupport { entries }
}

/// A `PREFIX` value such as `(ov)@+`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrefixSpec<'a> {
    /// Mode characters (e.g., `ov`).
    pub modes: &'a str,
    /// Prefix symbols, positionally matching `modes` (e.g., `@+`).
    pub prefixes: &'a str,
}

impl<'a> PrefixSpec<'a> {
    /// Parse `(modes)prefixes`. Anything else is malformed and yields `None`.
    /// An empty value is a valid, empty table.
    pub fn parse(s: &'a str) -> Option<Self> {
        if s.is_empty() {
            return Some(PrefixSpec {
                modes: "",
                prefixes: "",
            });
        }
        let inner = s.strip_prefix('(')?;
        let (modes, prefixes) = inner.split_once(')')?;
        if modes.chars().count() != prefixes.chars().count() {
            return None;
        }
        Some(PrefixSpec { modes, prefixes })
    }

    /// Prefix symbol for a mode character (`o` → `@`).
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        self.modes
            .chars()
            .position(|c| c == mode)
            .and_then(|i| self.prefixes.chars().nth(i))
    }

    /// Mode character for a prefix symbol (`@` → `o`).
    pub fn mode_for_prefix(&self, prefix: char) -> Option<char> {
        self.prefixes
            .chars()
            .position(|c| c == prefix)
            .and_then(|i| self.modes.chars().nth(i))
    }
}

/// A `CHANMODES` value: four comma separated classes A,B,C,D.
///
/// - **A**: list modes, always take a parameter (`b`)
/// - **B**: always take a parameter (`k`)
/// - **C**: take a parameter only when set (`l`)
/// - **D**: never take a parameter (`n`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChanModes<'a> {
    /// Type A: list modes.
    pub a: &'a str,
    /// Type B: parameter on set and unset.
    pub b: &'a str,
    /// Type C: parameter on set only.
    pub c: &'a str,
    /// Type D: flags.
    pub d: &'a str,
}

impl<'a> ChanModes<'a> {
    /// Parse `A,B,C,D`. Fewer than four classes is malformed; extra commas
    /// stay in the last class.
    pub fn parse(s: &'a str) -> Option<Self> {
        let mut parts = s.splitn(4, ',');
        let (a, b, c, d) = (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
        Some(ChanModes { a, b, c, d })
    }
}
