//! Mode flag containers.
//!
//! # Reference
//! - RFC 2812 Section 3.1.5 (User Modes)
//! - RFC 2812 Section 3.2.3 (Channel Modes)

use std::fmt;

/// Whether a mode is being set or unset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Sign {
    /// `+`
    Plus,
    /// `-`
    Minus,
}

impl Sign {
    /// The sign character.
    pub fn as_char(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }
}

/// One mode letter being set or unset, with its argument if it took one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModeChange {
    /// Set or unset.
    pub sign: Sign,
    /// The mode letter.
    pub mode: char,
    /// Positional argument consumed by this change.
    pub arg: Option<String>,
}

/// Set of mode letters in the order they were first set.
///
/// Renders as `+ntk`; an empty set renders as the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeSet {
    modes: Vec<char>,
}

impl ModeSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from a `+abc` / `-d+e` style string. Leading letters with
    /// no sign are treated as set.
    pub fn from_mode_string(s: &str) -> Self {
        let mut set = Self::new();
        set.apply(s);
        set
    }

    /// Set a letter. Returns false if it was already set.
    pub fn set(&mut self, mode: char) -> bool {
        if self.modes.contains(&mode) {
            return false;
        }
        self.modes.push(mode);
        true
    }

    /// Unset a letter. Returns false if it was not set.
    pub fn unset(&mut self, mode: char) -> bool {
        let before = self.modes.len();
        self.modes.retain(|m| *m != mode);
        self.modes.len() != before
    }

    /// Set or unset according to `sign`.
    pub fn change(&mut self, sign: Sign, mode: char) -> bool {
        match sign {
            Sign::Plus => self.set(mode),
            Sign::Minus => self.unset(mode),
        }
    }

    /// Apply a `+abc-d` style flag string, ignoring any arguments.
    pub fn apply(&mut self, flags: &str) {
        let mut sign = Sign::Plus;
        for c in flags.chars() {
            match c {
                '+' => sign = Sign::Plus,
                '-' => sign = Sign::Minus,
                ' ' => break,
                _ => {
                    self.change(sign, c);
                }
            }
        }
    }

    /// Replace the contents with exactly the letters of `flags`.
    pub fn replace(&mut self, flags: &str) {
        self.modes.clear();
        self.apply(flags);
    }

    /// Whether a letter is set.
    pub fn contains(&self, mode: char) -> bool {
        self.modes.contains(&mode)
    }

    /// True when no letter is set.
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Letters in the order they were set.
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.modes.iter().copied()
    }

    /// `Some("+abc")`, or `None` for an empty set.
    pub fn to_mode_string(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    /// Letters set in `self` but not in `other`, in `self`'s order.
    pub fn difference<'a>(&'a self, other: &'a ModeSet) -> impl Iterator<Item = char> + 'a {
        self.iter().filter(move |m| !other.contains(*m))
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modes.is_empty() {
            return Ok(());
        }
        f.write_str("+")?;
        for m in &self.modes {
            write!(f, "{}", m)?;
        }
        Ok(())
    }
}

impl FromIterator<char> for ModeSet {
    fn from_iter<T: IntoIterator<Item = char>>(iter: T) -> Self {
        let mut set = ModeSet::new();
        for m in iter {
            set.set(m);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_first_insertion_order() {
        let mut set = ModeSet::new();
        assert!(set.set('n'));
        assert!(set.set('t'));
        assert!(!set.set('n'));
        assert!(set.set('k'));
        assert_eq!(set.to_string(), "+ntk");
    }

    #[test]
    fn test_empty_renders_nothing() {
        let set = ModeSet::new();
        assert_eq!(set.to_string(), "");
        assert_eq!(set.to_mode_string(), None);
    }

    #[test]
    fn test_apply_signs() {
        let mut set = ModeSet::from_mode_string("+iws");
        set.apply("-w+x");
        assert_eq!(set.to_mode_string().as_deref(), Some("+isx"));
        set.apply("-isx");
        assert_eq!(set.to_mode_string(), None);
    }

    #[test]
    fn test_apply_stops_at_arguments() {
        let set = ModeSet::from_mode_string("+nt extra");
        assert_eq!(set.to_string(), "+nt");
    }

    #[test]
    fn test_difference() {
        let old = ModeSet::from_mode_string("+np");
        let new = ModeSet::from_mode_string("+nr");
        assert_eq!(new.difference(&old).collect::<String>(), "r");
        assert_eq!(old.difference(&new).collect::<String>(), "p");
    }
}
