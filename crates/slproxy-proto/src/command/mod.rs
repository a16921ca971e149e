//! Closed set of commands the proxy core understands.
//!
//! Dispatch in the state machine and the reply correlator happens over this
//! enum instead of comparing command strings at every call site. Anything
//! the core does not track lands in [`Command::Other`] or
//! [`Command::Numeric`] and is a no-op for state purposes.

use std::fmt;

use crate::response::Response;

/// A classified command word borrowed from a [`Line`](crate::Line).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command<'a> {
    /// `JOIN <channels>`
    Join,
    /// `PART <channels> [:reason]`
    Part,
    /// `KICK <channels> <nicks> [:reason]`
    Kick,
    /// `MODE <target> [<flags> [args...]]`
    Mode,
    /// `TOPIC <channel> [:topic]`
    Topic,
    /// `NICK <newnick>`
    Nick,
    /// `QUIT [:reason]`
    Quit,
    /// `PRIVMSG <target> :text`
    Privmsg,
    /// `NOTICE <target> :text`
    Notice,
    /// `PING <token>`
    Ping,
    /// `PONG <token>`
    Pong,
    /// A numeric the core knows by name.
    Response(Response),
    /// A numeric the core has no name for.
    Numeric(u16),
    /// Any other command word, verbatim.
    Other(&'a str),
}

impl<'a> Command<'a> {
    /// Classify a command word. Words are matched case-insensitively.
    pub fn parse(word: &'a str) -> Self {
        if word.len() == 3 && word.bytes().all(|b| b.is_ascii_digit()) {
            // Three ASCII digits always fit in u16.
            let code = word.parse::<u16>().unwrap_or_default();
            return match Response::from_code(code) {
                Some(resp) => Command::Response(resp),
                None => Command::Numeric(code),
            };
        }

        match word.to_ascii_uppercase().as_str() {
            "JOIN" => Command::Join,
            "PART" => Command::Part,
            "KICK" => Command::Kick,
            "MODE" => Command::Mode,
            "TOPIC" => Command::Topic,
            "NICK" => Command::Nick,
            "QUIT" => Command::Quit,
            "PRIVMSG" => Command::Privmsg,
            "NOTICE" => Command::Notice,
            "PING" => Command::Ping,
            "PONG" => Command::Pong,
            _ => Command::Other(word),
        }
    }

    /// Canonical spelling of the command.
    pub fn name(&self) -> String {
        match self {
            Command::Join => "JOIN".into(),
            Command::Part => "PART".into(),
            Command::Kick => "KICK".into(),
            Command::Mode => "MODE".into(),
            Command::Topic => "TOPIC".into(),
            Command::Nick => "NICK".into(),
            Command::Quit => "QUIT".into(),
            Command::Privmsg => "PRIVMSG".into(),
            Command::Notice => "NOTICE".into(),
            Command::Ping => "PING".into(),
            Command::Pong => "PONG".into(),
            Command::Response(resp) => format!("{:03}", resp.code()),
            Command::Numeric(code) => format!("{:03}", code),
            Command::Other(word) => word.to_ascii_uppercase(),
        }
    }

    /// Numeric code, if this is a numeric reply.
    pub fn code(&self) -> Option<u16> {
        match self {
            Command::Response(resp) => Some(resp.code()),
            Command::Numeric(code) => Some(*code),
            _ => None,
        }
    }

    /// Minimum number of arguments (after the command word) the state
    /// machine needs before it will act on this command.
    pub fn min_args(&self) -> usize {
        use Response::*;
        match self {
            Command::Join | Command::Part | Command::Nick | Command::Topic | Command::Mode => 1,
            Command::Kick | Command::Privmsg | Command::Notice => 2,
            Command::Quit => 0,
            Command::Response(resp) => match resp {
                RPL_WELCOME | RPL_UMODEIS | RPL_NOWAWAY | RPL_UNAWAY | RPL_ENDOFWHO => 1,
                RPL_MYINFO => 5,
                RPL_ISUPPORT | RPL_CHANNELMODEIS | RPL_CREATIONTIME | RPL_TOPIC
                | RPL_BANLIST | RPL_INVITELIST | RPL_EXCEPTLIST => 3,
                RPL_USERHOST | RPL_NOTOPIC | RPL_ENDOFNAMES | RPL_ENDOFBANLIST
                | RPL_ENDOFINVITELIST | RPL_ENDOFEXCEPTLIST => 2,
                RPL_TOPICWHOTIME | RPL_NAMREPLY => 4,
                RPL_WHOREPLY => 8,
                _ => 0,
            },
            _ => 0,
        }
    }

    /// Whether a constructed line of this command should carry a colon on
    /// its last argument when no explicit choice was made.
    ///
    /// `argc` counts the arguments after the command word.
    pub fn requires_colon(&self, argc: usize) -> bool {
        match self {
            Command::Mode | Command::Nick | Command::Join => false,
            Command::Part | Command::Topic => argc > 1,
            _ => match self.code() {
                Some(code) => !matches!(
                    code,
                    4 | 200..=209 | 211..=219 | 221 | 324 | 329 | 333 | 341 | 367
                ),
                None => true,
            },
        }
    }
}

impl fmt::Display for Command<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_words_case_insensitive() {
        assert_eq!(Command::parse("join"), Command::Join);
        assert_eq!(Command::parse("Kick"), Command::Kick);
        assert_eq!(Command::parse("WHOIS"), Command::Other("WHOIS"));
    }

    #[test]
    fn test_parse_numerics() {
        assert_eq!(
            Command::parse("332"),
            Command::Response(Response::RPL_TOPIC)
        );
        assert_eq!(Command::parse("999"), Command::Numeric(999));
        assert_eq!(Command::parse("999").code(), Some(999));
        assert_eq!(Command::parse("0012"), Command::Other("0012"));
    }

    #[test]
    fn test_min_args() {
        assert_eq!(Command::Kick.min_args(), 2);
        assert_eq!(Command::Topic.min_args(), 1);
        assert_eq!(Command::parse("352").min_args(), 8);
        assert_eq!(Command::parse("331").min_args(), 2);
        assert_eq!(Command::parse("333").min_args(), 4);
        for list_entry in ["346", "348", "367"] {
            assert_eq!(Command::parse(list_entry).min_args(), 3);
        }
        assert_eq!(Command::Notice.min_args(), 2);
        assert_eq!(Command::parse("FOO").min_args(), 0);
    }

    #[test]
    fn test_requires_colon() {
        assert!(!Command::Join.requires_colon(1));
        assert!(!Command::Topic.requires_colon(1));
        assert!(Command::Topic.requires_colon(2));
        assert!(!Command::parse("324").requires_colon(3));
        assert!(Command::parse("366").requires_colon(3));
        assert!(Command::Privmsg.requires_colon(2));
    }

    #[test]
    fn test_name_roundtrip() {
        assert_eq!(Command::parse("005").name(), "005");
        assert_eq!(Command::parse("privmsg").name(), "PRIVMSG");
    }
}
