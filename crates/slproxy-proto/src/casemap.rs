//! IRC case-mapping functions.
//!
//! IRC uses a special case-insensitive comparison where some characters
//! are considered equivalent (e.g., `[` and `{`). Networks announce which
//! rule they use through the `CASEMAPPING` ISUPPORT token; `rfc1459` is the
//! default when nothing is announced.

use std::cmp::Ordering;

/// Case-folding rule announced by a network.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CaseMapping {
    /// ASCII letters plus `[]\~` folded to `{}|^`.
    #[default]
    Rfc1459,
    /// ASCII letters plus `[]\` folded to `{}|` (no `~`).
    StrictRfc1459,
    /// Plain ASCII letters only.
    Ascii,
}

impl CaseMapping {
    /// Parse a `CASEMAPPING` value. Returns `None` for unknown mappings.
    pub fn from_token(value: &str) -> Option<Self> {
        match value {
            "rfc1459" => Some(CaseMapping::Rfc1459),
            "strict-rfc1459" => Some(CaseMapping::StrictRfc1459),
            "ascii" => Some(CaseMapping::Ascii),
            _ => None,
        }
    }

    /// The token used in `CASEMAPPING=` for this mapping.
    pub fn as_token(self) -> &'static str {
        match self {
            CaseMapping::Rfc1459 => "rfc1459",
            CaseMapping::StrictRfc1459 => "strict-rfc1459",
            CaseMapping::Ascii => "ascii",
        }
    }

    /// Fold a single character.
    #[inline]
    pub const fn fold_char(self, c: char) -> char {
        match (self, c) {
            (_, 'A'..='Z') => (c as u8 + 32) as char,
            (CaseMapping::Ascii, _) => c,
            (_, '[') => '{',
            (_, ']') => '}',
            (_, '\\') => '|',
            (CaseMapping::Rfc1459, '~') => '^',
            _ => c,
        }
    }

    /// Fold a whole string, e.g. to build a lookup key.
    pub fn fold(self, s: &str) -> String {
        s.chars().map(|c| self.fold_char(c)).collect()
    }

    /// Case-insensitive equality under this mapping.
    pub fn eq(self, a: &str, b: &str) -> bool {
        a.len() == b.len()
            && a
                .chars()
                .zip(b.chars())
                .all(|(ca, cb)| self.fold_char(ca) == self.fold_char(cb))
    }

    /// Case-insensitive ordering under this mapping.
    pub fn cmp(self, a: &str, b: &str) -> Ordering {
        a.chars()
            .map(|c| self.fold_char(c))
            .cmp(b.chars().map(|c| self.fold_char(c)))
    }
}

/// Convert a single character to IRC lowercase using RFC 1459 case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    CaseMapping::Rfc1459.fold_char(c)
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    CaseMapping::Rfc1459.fold(s)
}

/// Compare two strings using RFC 1459 case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    CaseMapping::Rfc1459.eq(a, b)
}
