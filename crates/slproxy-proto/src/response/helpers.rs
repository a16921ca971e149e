//! Code conversion and trait implementations for [`Response`].

use super::Response;
use std::str::FromStr;

const ALL: &[Response] = &[
    Response::RPL_WELCOME,
    Response::RPL_MYINFO,
    Response::RPL_ISUPPORT,
    Response::RPL_UMODEIS,
    Response::RPL_TRYAGAIN,
    Response::RPL_USERHOST,
    Response::RPL_UNAWAY,
    Response::RPL_NOWAWAY,
    Response::RPL_ENDOFWHO,
    Response::RPL_CHANNELMODEIS,
    Response::RPL_CREATIONTIME,
    Response::RPL_NOTOPIC,
    Response::RPL_TOPIC,
    Response::RPL_TOPICWHOTIME,
    Response::RPL_INVITELIST,
    Response::RPL_ENDOFINVITELIST,
    Response::RPL_EXCEPTLIST,
    Response::RPL_ENDOFEXCEPTLIST,
    Response::RPL_WHOREPLY,
    Response::RPL_NAMREPLY,
    Response::RPL_ENDOFNAMES,
    Response::RPL_BANLIST,
    Response::RPL_ENDOFBANLIST,
    Response::ERR_UNKNOWNCOMMAND,
];

impl Response {
    /// Returns the numeric code as u16
    #[inline]
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Creates a Response from a numeric code
    pub fn from_code(code: u16) -> Option<Response> {
        ALL.iter().copied().find(|r| r.code() == code)
    }

    /// Check if this is an error response (4xx, 5xx)
    #[inline]
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }
}

impl FromStr for Response {
    type Err = ParseResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code: u16 = s.parse().map_err(|_| ParseResponseError::InvalidFormat)?;
        Response::from_code(code).ok_or(ParseResponseError::UnknownCode(code))
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:03}", self.code())
    }
}

/// Error when parsing a response code
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ParseResponseError {
    /// The string was not a valid number
    #[error("invalid response code format")]
    InvalidFormat,
    /// The numeric code is not a known response
    #[error("unknown response code: {0}")]
    UnknownCode(u16),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_and_from_code_agree() {
        for resp in ALL {
            assert_eq!(Response::from_code(resp.code()), Some(*resp));
        }
        assert_eq!(Response::from_code(999), None);
    }

    #[test]
    fn test_display_is_zero_padded() {
        assert_eq!(Response::RPL_WELCOME.to_string(), "001");
        assert_eq!(Response::RPL_TOPIC.to_string(), "332");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("366".parse::<Response>(), Ok(Response::RPL_ENDOFNAMES));
        assert_eq!(
            "abc".parse::<Response>(),
            Err(ParseResponseError::InvalidFormat)
        );
        assert_eq!(
            "999".parse::<Response>(),
            Err(ParseResponseError::UnknownCode(999))
        );
    }

    #[test]
    fn test_is_error() {
        assert!(Response::ERR_UNKNOWNCOMMAND.is_error());
        assert!(!Response::RPL_NAMREPLY.is_error());
    }
}
