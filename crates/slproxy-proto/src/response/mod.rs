//! IRC numeric replies the proxy core acts on.
//!
//! Only the numerics that drive state tracking or are synthesised during
//! state sync have names here. Every other numeric is still carried
//! verbatim by [`Line`](crate::Line) and classified as
//! [`Command::Numeric`](crate::Command::Numeric).
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol
//! - Modern IRC documentation: <https://modern.ircdocs.horse/>

#![allow(non_camel_case_types)]

mod helpers;

pub use helpers::ParseResponseError;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001 - Welcome; the first argument is our confirmed nick
    RPL_WELCOME = 1,
    /// 004 - Server name, version, user modes, channel modes
    RPL_MYINFO = 4,
    /// 005 - Server supported features (ISUPPORT)
    RPL_ISUPPORT = 5,
    /// 221 - Our user mode string
    RPL_UMODEIS = 221,
    /// 263 - Server dropped the command, try again later
    RPL_TRYAGAIN = 263,
    /// 302 - USERHOST reply
    RPL_USERHOST = 302,
    /// 305 - No longer marked away
    RPL_UNAWAY = 305,
    /// 306 - Marked away
    RPL_NOWAWAY = 306,
    /// 315 - End of WHO
    RPL_ENDOFWHO = 315,
    /// 324 - Channel modes
    RPL_CHANNELMODEIS = 324,
    /// 329 - Channel creation time
    RPL_CREATIONTIME = 329,
    /// 331 - No topic set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 333 - Topic setter and time
    RPL_TOPICWHOTIME = 333,
    /// 346 - Invite list entry
    RPL_INVITELIST = 346,
    /// 347 - End of invite list
    RPL_ENDOFINVITELIST = 347,
    /// 348 - Exception list entry
    RPL_EXCEPTLIST = 348,
    /// 349 - End of exception list
    RPL_ENDOFEXCEPTLIST = 349,
    /// 352 - WHO reply
    RPL_WHOREPLY = 352,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES
    RPL_ENDOFNAMES = 366,
    /// 367 - Ban list entry
    RPL_BANLIST = 367,
    /// 368 - End of ban list
    RPL_ENDOFBANLIST = 368,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
}
