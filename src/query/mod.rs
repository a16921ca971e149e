//! Correlation of outbound commands with their replies.
//!
//! A [`QueryStack`] belongs to one client connection. Every command the
//! client sends upstream is recorded with a caller-chosen token; when a
//! numeric reply arrives, [`QueryStack::response`] tells the caller which
//! client it belongs to.

mod table;

use std::collections::VecDeque;

use chrono::Utc;
use slproxy_proto::Line;
use tracing::debug;

use crate::error::RoutingError;

pub use table::Query;

/// One outstanding query.
#[derive(Debug, Clone)]
pub struct QueryEntry<T> {
    pub token: T,
    query: &'static Query,
    /// Unix time the command was recorded.
    pub recorded_at: i64,
}

impl<T> QueryEntry<T> {
    /// The recorded command word, or `None` for commands without a table row.
    pub fn command(&self) -> Option<&'static str> {
        self.query.name
    }
}

/// FIFO of outstanding queries for one connection.
#[derive(Debug, Clone)]
pub struct QueryStack<T> {
    entries: VecDeque<QueryEntry<T>>,
}

impl<T> Default for QueryStack<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

impl<T: Clone> QueryStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outbound command under `token`.
    ///
    /// Returns `false` when the command expects no reply and nothing was
    /// recorded. Commands without a table row are recorded as unknown.
    pub fn record(&mut self, token: T, line: &Line) -> bool {
        let query = table::find(line.command_word()).unwrap_or(&table::UNKNOWN);
        if let Some(index) = query.silent_with_arg
            && line.arg(index).is_some()
        {
            return false;
        }
        self.entries.push_back(QueryEntry {
            token,
            query,
            recorded_at: Utc::now().timestamp(),
        });
        true
    }

    /// Find the token a reply belongs to.
    ///
    /// The oldest entry whose command lists the reply wins. Intermediate
    /// replies leave the entry in place; end replies and errors remove it.
    /// A numeric nobody claims goes to the oldest unknown entry, which is
    /// removed.
    pub fn response(&mut self, line: &Line) -> Result<T, RoutingError> {
        let unroutable = || RoutingError::Unroutable(line.to_string());
        let code = line.command().code().ok_or_else(unroutable)?;

        if let Some(pos) = self.entries.iter().position(|e| e.query.matches(code)) {
            if self.entries[pos].query.finishes(code) {
                return self
                    .entries
                    .remove(pos)
                    .map(|e| e.token)
                    .ok_or_else(unroutable);
            }
            return Ok(self.entries[pos].token.clone());
        }

        let pos = self
            .entries
            .iter()
            .position(|e| e.query.name.is_none())
            .ok_or_else(unroutable)?;
        debug!(code, "reply routed to oldest unknown query");
        self.entries.remove(pos).map(|e| e.token).ok_or_else(unroutable)
    }
}

impl<T> QueryStack<T> {
    /// Outstanding entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueryEntry<T>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries recorded before `cutoff`. Returns how many were dropped.
    pub fn prune(&mut self, cutoff: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.recorded_at >= cutoff);
        before - self.entries.len()
    }

    /// Drop every entry recorded under `token`, e.g. when its client leaves.
    pub fn forget(&mut self, token: &T) -> usize
    where
        T: PartialEq,
    {
        let before = self.entries.len();
        self.entries.retain(|e| &e.token != token);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> Line {
        Line::parse(text).unwrap()
    }

    fn listing(stack: &QueryStack<&'static str>) -> Vec<(&'static str, Option<&'static str>)> {
        stack.iter().map(|e| (e.token, e.command())).collect()
    }

    #[test]
    fn test_empty() {
        let mut stack: QueryStack<&str> = QueryStack::new();
        assert!(stack.is_empty());
        assert!(matches!(
            stack.response(&line(":server 421 user :No such command")),
            Err(RoutingError::Unroutable(_))
        ));
    }

    #[test]
    fn test_privmsg() {
        let mut stack = QueryStack::new();
        assert!(stack.record("token", &line("PRIVMSG joe :bla")));
        stack.record("token", &line("PRIVMSG bla :bar"));
        assert_eq!(
            listing(&stack),
            [("token", Some("PRIVMSG")), ("token", Some("PRIVMSG"))]
        );
    }

    #[test]
    fn test_unknown_command() {
        let mut stack = QueryStack::new();
        stack.record("token", &line("IDONTKNOW joe :bla"));
        assert_eq!(listing(&stack), [("token", None)]);
        assert_eq!(
            stack.response(&line(":server 421 user :No such command")),
            Ok("token")
        );
        assert!(stack.is_empty());
    }

    #[test]
    fn test_unknown_reply_skips_older_known_entry() {
        let mut stack = QueryStack::new();
        stack.record("token1", &line("PRIVMSG joe :bla"));
        stack.record("token2", &line("UNKNOWN joe :bla"));
        assert_eq!(
            stack.response(&line(":server 421 user :No such command")),
            Ok("token2")
        );
        assert_eq!(listing(&stack), [("token1", Some("PRIVMSG"))]);
    }

    #[test]
    fn test_intermediate_replies_keep_entry() {
        let mut stack = QueryStack::new();
        stack.record("a", &line("NAMES #foo"));
        stack.record("b", &line("WHO #foo"));
        assert_eq!(stack.response(&line(":srv 352 me #foo u h s n H :0 r")), Ok("b"));
        assert_eq!(stack.response(&line(":srv 353 me = #foo :x y")), Ok("a"));
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.response(&line(":srv 366 me #foo :End")), Ok("a"));
        assert_eq!(stack.response(&line(":srv 315 me #foo :End")), Ok("b"));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_fallback_to_unknown_entry() {
        let mut stack = QueryStack::new();
        stack.record("known", &line("PRIVMSG joe :hi"));
        stack.record("mystery", &line("FROB x"));
        assert_eq!(stack.response(&line(":srv 704 me help :text")), Ok("mystery"));
        assert_eq!(listing(&stack), [("known", Some("PRIVMSG"))]);
        assert!(stack.response(&line(":srv 704 me help :text")).is_err());
    }

    #[test]
    fn test_topic_change_is_not_recorded() {
        let mut stack = QueryStack::new();
        assert!(!stack.record("t", &line("TOPIC #foo :new topic")));
        assert!(stack.is_empty());
        assert!(stack.record("t", &line("TOPIC #foo")));
        assert_eq!(stack.response(&line(":srv 332 me #foo :topic")), Ok("t"));
    }

    #[test]
    fn test_non_numeric_is_unroutable() {
        let mut stack = QueryStack::new();
        stack.record("t", &line("FROB"));
        assert!(stack.response(&line(":srv PONG srv :x")).is_err());
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_prune_and_forget() {
        let mut stack = QueryStack::new();
        stack.record("a", &line("WHOIS joe"));
        stack.record("b", &line("WHOIS bob"));
        assert_eq!(stack.forget(&"a"), 1);
        assert_eq!(stack.prune(0), 0);
        assert_eq!(stack.prune(i64::MAX), 1);
        assert!(stack.is_empty());
    }
}
