use std::fmt;

use super::Prefix;

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Prefix::ServerName(name) => f.write_str(name),
            Prefix::Nickname(name, user, host) => match (&name[..], &user[..], &host[..]) {
                (name, "", "") => f.write_str(name),
                (name, user, "") => write!(f, "{}!{}", name, user),
                (name, "", host) => write!(f, "{}@{}", name, host),
                (name, user, host) => write!(f, "{}!{}@{}", name, user, host),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_partial_masks() {
        assert_eq!(Prefix::new("nick", "", "").to_string(), "nick");
        assert_eq!(Prefix::new("nick", "user", "").to_string(), "nick!user");
        assert_eq!(Prefix::new("nick", "", "host").to_string(), "nick@host");
        assert_eq!(
            Prefix::new("nick", "user", "host").to_string(),
            "nick!user@host"
        );
        assert_eq!(
            Prefix::ServerName("irc.example.net".into()).to_string(),
            "irc.example.net"
        );
    }
}
