//! Expected replies per command.
//!
//! Codes are grouped per command into intermediate replies (more are on the
//! way), end replies and errors. Both of the latter finish the query.

/// Reply classes for one command.
#[derive(Debug, PartialEq, Eq)]
pub struct Query {
    /// Command word, `None` for the catch-all entry.
    pub name: Option<&'static str>,
    /// Replies that answer the query without finishing it.
    pub replies: &'static [u16],
    /// Replies that finish the query.
    pub end: &'static [u16],
    /// Errors, which also finish the query.
    pub errors: &'static [u16],
    /// When the command carries an argument at this index it expects no
    /// reply and is not recorded (`TOPIC #chan :new topic`).
    pub silent_with_arg: Option<usize>,
}

impl Query {
    const fn new(
        name: &'static str,
        replies: &'static [u16],
        end: &'static [u16],
        errors: &'static [u16],
    ) -> Self {
        Self {
            name: Some(name),
            replies,
            end,
            errors,
            silent_with_arg: None,
        }
    }

    /// Whether `code` belongs to this query at all.
    pub fn matches(&self, code: u16) -> bool {
        self.replies.contains(&code) || self.end.contains(&code) || self.errors.contains(&code)
    }

    /// Whether `code` finishes the query.
    pub fn finishes(&self, code: u16) -> bool {
        !self.replies.contains(&code) && self.matches(code)
    }
}

const TRYAGAIN: u16 = 263;

/// Commands the table has no row for.
pub static UNKNOWN: Query = Query {
    name: None,
    replies: &[],
    end: &[TRYAGAIN],
    errors: &[421],
    silent_with_arg: None,
};

static QUERIES: &[Query] = &[
    Query::new(
        "WHOIS",
        &[311, 319, 301, 317, 338, 312, 313, 671, 330, 307, 320, 378, 379, 401],
        &[318, TRYAGAIN],
        &[402, 431],
    ),
    Query::new("WHO", &[352, 354], &[315, TRYAGAIN], &[402]),
    Query::new("NAMES", &[353], &[366, TRYAGAIN], &[416, 402]),
    Query::new("LIST", &[322, 321], &[323, TRYAGAIN], &[416, 402]),
    Query {
        silent_with_arg: Some(1),
        ..Query::new("TOPIC", &[], &[331, 332, TRYAGAIN], &[442, 461, 482, 477])
    },
    Query::new("WHOWAS", &[314, 312, 406], &[369, TRYAGAIN], &[431]),
    Query::new(
        "STATS",
        &[213, 215, 217, 220, 211, 212, 244, 214, 216, 241, 242, 243, 246],
        &[TRYAGAIN, 219],
        &[402],
    ),
    Query::new("VERSION", &[], &[351, TRYAGAIN], &[402]),
    Query::new("LINKS", &[364], &[365, TRYAGAIN], &[402]),
    Query::new("TIME", &[], &[391, TRYAGAIN], &[402]),
    Query::new(
        "TRACE",
        &[200, 201, 203, 205, 209, 202, 204, 206, 208],
        &[TRYAGAIN],
        &[402],
    ),
    Query::new("SUMMON", &[], &[342, TRYAGAIN], &[411, 424, 444, 402]),
    Query::new("USERS", &[392, 393, 395], &[394, TRYAGAIN], &[402, 424, 446]),
    Query::new("USERHOST", &[], &[302, TRYAGAIN], &[461]),
    Query::new("ISON", &[], &[303, TRYAGAIN], &[461]),
    Query::new(
        "JOIN",
        &[],
        &[TRYAGAIN],
        &[461, 474, 473, 475, 471, 476, 470, 403, 479, 405],
    ),
    Query::new("PART", &[], &[TRYAGAIN], &[461, 403, 442]),
    Query::new("NICK", &[], &[TRYAGAIN], &[431, 432, 433, 437, 484, 436, 438]),
    Query::new("PASS", &[], &[], &[461, 462]),
    Query::new("USER", &[], &[TRYAGAIN], &[461, 462]),
    Query::new("QUIT", &[], &[TRYAGAIN], &[]),
    Query::new("OPER", &[], &[381, TRYAGAIN], &[461, 491, 464]),
    Query::new(
        "MODE",
        &[367, 348, 346],
        &[221, 324, 368, 349, 347, 325, TRYAGAIN],
        &[461, 501, 502, 441, 467, 482, 472, 477, 403, 479],
    ),
    Query::new("SERVICE", &[], &[383, 2, 4, TRYAGAIN], &[462, 461, 432]),
    Query::new("SQUIT", &[], &[TRYAGAIN], &[481, 461, 402]),
    Query::new("INVITE", &[], &[341, 301, TRYAGAIN], &[461, 442, 401, 482, 443]),
    Query::new("KICK", &[], &[TRYAGAIN], &[461, 476, 441, 403, 482, 442]),
    Query::new(
        "PRIVMSG",
        &[],
        &[301, TRYAGAIN],
        &[411, 412, 404, 413, 407, 414, 401, 403],
    ),
    Query::new("NICKSERV", &[], &[TRYAGAIN], &[412]),
    Query::new("CHANSERV", &[], &[TRYAGAIN], &[412]),
    Query::new("MOTD", &[375, 372], &[376, TRYAGAIN], &[422]),
    Query::new("LUSERS", &[251, 252, 253, 254, 255, 246], &[TRYAGAIN], &[402]),
    Query::new("CONNECT", &[], &[TRYAGAIN], &[402, 461, 481]),
    Query::new("ADMIN", &[256, 258, 257, 259], &[TRYAGAIN], &[402]),
    Query::new("INFO", &[371], &[TRYAGAIN, 374], &[402]),
    Query::new("SERVLIST", &[234], &[TRYAGAIN, 235], &[]),
    Query::new("SQUERY", &[], &[301, TRYAGAIN], &[411, 412, 404, 413, 407, 414, 401]),
    Query::new("KILL", &[], &[TRYAGAIN], &[481, 461, 401, 483]),
    Query::new("AWAY", &[], &[305, 306, TRYAGAIN], &[]),
    Query::new("REHASH", &[], &[382, TRYAGAIN], &[481]),
    Query::new("DIE", &[], &[TRYAGAIN], &[481]),
    Query::new("RESTART", &[], &[TRYAGAIN], &[481]),
    Query::new("PING", &[], &[TRYAGAIN], &[409]),
    Query::new("WALLOPS", &[], &[TRYAGAIN], &[461]),
    Query::new("PONG", &[], &[TRYAGAIN], &[409, 402]),
    Query::new("NOTICE", &[], &[TRYAGAIN], &[]),
];

/// Row for a command word, matched case-insensitively.
pub fn find(command: &str) -> Option<&'static Query> {
    QUERIES
        .iter()
        .find(|q| q.name.is_some_and(|n| n.eq_ignore_ascii_case(command)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_is_case_insensitive() {
        assert_eq!(find("whois").and_then(|q| q.name), Some("WHOIS"));
        assert!(find("IDONTKNOW").is_none());
    }

    #[test]
    fn test_reply_classes() {
        let names = find("NAMES").unwrap();
        assert!(names.matches(353));
        assert!(!names.finishes(353));
        assert!(names.finishes(366));
        assert!(names.finishes(402));
        assert!(!names.matches(421));
        assert!(UNKNOWN.finishes(421));
    }

    #[test]
    fn test_every_row_ends_on_tryagain() {
        for query in QUERIES.iter().filter(|q| q.name != Some("PASS")) {
            assert!(query.finishes(TRYAGAIN), "{:?}", query.name);
        }
    }
}
