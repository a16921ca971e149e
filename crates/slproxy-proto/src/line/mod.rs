//! Parsed protocol lines.
//!
//! A [`Line`] is the unit everything in the proxy passes around: the state
//! machine consumes them, the sync engine produces them and the linestack
//! stores them. Parsing and serialising are lossless for well-formed input,
//! including whether the last argument carried a colon.

mod parse;
mod serialize;

use std::fmt;
use std::str::FromStr;

use crate::command::Command;
use crate::error::ParseError;
use crate::prefix::{nick_of, Prefix};

use self::parse::ParsedLine;

/// Which way a line travelled through the proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Sent by the proxy (on behalf of a client) to the upstream server.
    ToServer,
    /// Received from the upstream server.
    FromServer,
}

impl Direction {
    /// Short tag used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::ToServer => "to-server",
            Direction::FromServer => "from-server",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the last argument is introduced when the line is serialised.
///
/// Whatever the policy, a last argument that is empty, contains a space or
/// starts with `:` always gets a colon.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Trailing {
    /// Always prefix the last argument with `:`.
    #[default]
    Colon,
    /// Only use `:` when the argument could not be read back otherwise.
    Bare,
    /// Decide per command, following the conventions servers use.
    Auto,
}

/// An immutable IRC protocol line.
///
/// Equality is structural: origin, command and arguments. The colon policy
/// and direction tag do not take part.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    origin: Option<String>,
    command: String,
    args: Vec<String>,
    trailing: Trailing,
    direction: Option<Direction>,
}

impl Line {
    /// Build a line from an explicit argument list.
    ///
    /// The last argument is always serialised with a leading colon.
    ///
    /// ```
    /// use slproxy_proto::Line;
    ///
    /// let line = Line::new(None, "JOIN", ["#rust"]);
    /// assert_eq!(line.to_string(), "JOIN :#rust");
    /// ```
    #[must_use]
    pub fn new<I, S>(origin: Option<&str>, command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Line {
            origin: origin.map(str::to_owned),
            command: command.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
            trailing: Trailing::Colon,
            direction: None,
        }
    }

    /// Parse one line of protocol text.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let parsed = ParsedLine::parse(text)?;
        Ok(Line {
            origin: parsed.origin.map(str::to_owned),
            command: parsed.command.to_owned(),
            args: parsed.params.iter().map(|s| (*s).to_owned()).collect(),
            trailing: if parsed.has_colon {
                Trailing::Colon
            } else {
                Trailing::Bare
            },
            direction: None,
        })
    }

    /// Replace the colon policy.
    #[must_use]
    pub fn with_trailing(mut self, trailing: Trailing) -> Self {
        self.trailing = trailing;
        self
    }

    /// Tag the line with the direction it travelled.
    #[must_use]
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Replace the origin.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// The raw origin, without the leading colon.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The origin parsed as a server name or nickmask.
    pub fn prefix(&self) -> Option<Prefix> {
        self.origin.as_deref().map(Prefix::new_from_str)
    }

    /// The nick part of the origin (everything before `!`).
    pub fn nick(&self) -> Option<&str> {
        self.origin.as_deref().map(nick_of)
    }

    /// The command word exactly as received.
    pub fn command_word(&self) -> &str {
        &self.command
    }

    /// The command classified into the closed set the core dispatches on.
    pub fn command(&self) -> Command<'_> {
        Command::parse(&self.command)
    }

    /// Arguments after the command word.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Argument at `index` (0 is the first argument after the command).
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Number of arguments after the command word.
    pub fn argc(&self) -> usize {
        self.args.len()
    }

    /// Colon policy used when serialising.
    pub fn trailing(&self) -> Trailing {
        self.trailing
    }

    /// Direction tag, if one was attached.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Ensure the command has at least as many arguments as the core needs
    /// to act on it.
    pub fn check_args(&self) -> Result<(), ParseError> {
        let expected = self.command().min_args();
        if self.args.len() < expected {
            return Err(ParseError::NotEnoughArguments {
                command: self.command.to_ascii_uppercase(),
                expected,
                got: self.args.len(),
            });
        }
        Ok(())
    }
}

impl PartialEq for Line {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.command == other.command && self.args == other.args
    }
}

impl Eq for Line {}

impl FromStr for Line {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Line::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accessors() {
        let line = Line::parse(":nick!user@host KICK #foo bar :bye now").unwrap();
        assert_eq!(line.origin(), Some("nick!user@host"));
        assert_eq!(line.nick(), Some("nick"));
        assert_eq!(line.command(), Command::Kick);
        assert_eq!(line.arg(0), Some("#foo"));
        assert_eq!(line.arg(2), Some("bye now"));
        assert_eq!(line.arg(3), None);
        assert_eq!(line.argc(), 3);
    }

    #[test]
    fn test_equality_is_structural() {
        let parsed = Line::parse("PRIVMSG #a hello").unwrap();
        let built = Line::new(None, "PRIVMSG", ["#a", "hello"]);
        assert_eq!(parsed, built);
        assert_ne!(parsed.to_string(), built.to_string());

        let tagged = built.clone().with_direction(Direction::ToServer);
        assert_eq!(tagged, built);
    }

    #[test]
    fn test_check_args() {
        let line = Line::parse(":a!b@c KICK #foo").unwrap();
        assert_eq!(
            line.check_args(),
            Err(ParseError::NotEnoughArguments {
                command: "KICK".into(),
                expected: 2,
                got: 1,
            })
        );
        assert!(Line::parse("QUIT").unwrap().check_args().is_ok());
        assert!(Line::parse("FOO").unwrap().check_args().is_ok());
    }

    #[test]
    fn test_server_prefix() {
        let line = Line::parse(":irc.example.net 001 me :Welcome").unwrap();
        assert_eq!(
            line.prefix(),
            Some(Prefix::ServerName("irc.example.net".into()))
        );
    }
}
