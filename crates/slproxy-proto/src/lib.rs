//! # slproxy-proto
//!
//! Protocol primitives for the Straylight IRC proxy: lossless line parsing
//! and serialisation, nickmasks, case-mapping, ISUPPORT parsing, mode-change
//! parsing and the per-network capability table.
//!
//! This crate has no I/O. The proxy core in the root crate builds its state
//! machine, sync engine and line log on top of it.
//!
//! ## Quick Start
//!
//! ```rust
//! use slproxy_proto::{Command, Line, Trailing};
//!
//! let line = Line::parse(":nick!user@host PRIVMSG #channel :Hello!").unwrap();
//! assert_eq!(line.nick(), Some("nick"));
//! assert_eq!(line.command(), Command::Privmsg);
//! assert_eq!(line.to_string(), ":nick!user@host PRIVMSG #channel :Hello!");
//!
//! let join = Line::new(Some("me!u@h"), "JOIN", ["#rust"]).with_trailing(Trailing::Auto);
//! assert_eq!(join.to_string(), ":me!u@h JOIN #rust");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod command;
pub mod error;
pub mod isupport;
pub mod line;
pub mod mode;
pub mod netinfo;
pub mod prefix;
pub mod response;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, CaseMapping};
pub use self::command::Command;
pub use self::error::ParseError;
pub use self::isupport::{ChanModes, Isupport, IsupportEntry, PrefixSpec};
pub use self::line::{Direction, Line, Trailing};
pub use self::mode::{parse_mode_changes, ModeChange, ModeChanges, ModeSet, Sign};
pub use self::netinfo::{ChanModeType, NetworkInfo};
pub use self::prefix::{nick_of, Prefix};
pub use self::response::Response;
