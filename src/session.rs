//! Per-network processing pipeline.
//!
//! A [`Session`] is the single writer of one network's state. Every line,
//! in either direction, is appended to the linestack and then applied to the
//! live [`NetworkState`] inside one exclusive section, so a reader never sees
//! an effect the log does not have. Readers take a cheap [`snapshot`] and
//! diff against it without holding any lock.
//!
//! [`snapshot`]: Session::snapshot

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use slproxy_proto::{Direction, Line};
use tokio::sync::mpsc;
use tracing::{Instrument, debug, info, warn};

use crate::error::StorageError;
use crate::linestack::{Linestack, Marker};
use crate::state::{NetworkState, StateObserver};
use crate::telemetry::spans;

/// A line queued for a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Received from the upstream server.
    Inbound(Line),
    /// Sent upstream on behalf of a client.
    Outbound(Line),
}

impl SessionEvent {
    fn into_parts(self) -> (Line, Direction) {
        match self {
            SessionEvent::Inbound(line) => (line, Direction::FromServer),
            SessionEvent::Outbound(line) => (line, Direction::ToServer),
        }
    }
}

/// One upstream network session.
pub struct Session {
    name: String,
    state: RwLock<NetworkState>,
    linestack: Mutex<Linestack>,
    observers: RwLock<Vec<Arc<dyn StateObserver>>>,
}

impl Session {
    pub fn new(name: impl Into<String>, state: NetworkState, linestack: Linestack) -> Self {
        Self {
            name: name.into(),
            state: RwLock::new(state),
            linestack: Mutex::new(linestack),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Network name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_observer(&self, observer: Arc<dyn StateObserver>) {
        self.observers.write().push(observer);
    }

    /// A line received from the server.
    pub fn handle_inbound(&self, line: &Line) -> Result<Marker, StorageError> {
        self.process(line, Direction::FromServer, Utc::now().timestamp())
    }

    /// A line sent to the server.
    pub fn handle_outbound(&self, line: &Line) -> Result<Marker, StorageError> {
        self.process(line, Direction::ToServer, Utc::now().timestamp())
    }

    /// Append, then apply, with `now` as the clock for both.
    ///
    /// A storage failure leaves the state untouched. A malformed line is
    /// still logged; it only fails to change state.
    pub fn process(&self, line: &Line, direction: Direction, now: i64) -> Result<Marker, StorageError> {
        let mut state = self.state.write();
        let marker = self
            .linestack
            .lock()
            .insert_line_at(line, direction, &state, now)?;

        let applied = state.handle_line_at(line, now);
        let state = RwLockWriteGuard::downgrade(state);
        let observers = self.observers.read();
        match applied {
            Ok(()) => {
                for observer in observers.iter() {
                    observer.on_line(line, direction, &state);
                }
            }
            Err(e) => {
                warn!(error = %e, %line, %direction, "line logged but not applied");
                for observer in observers.iter() {
                    observer.on_rejected(line, direction);
                }
            }
        }
        Ok(marker)
    }

    /// A copy of the live state.
    pub fn snapshot(&self) -> NetworkState {
        self.state.read().clone()
    }

    /// Run `f` against the live state without copying it.
    pub fn with_state<R>(&self, f: impl FnOnce(&NetworkState) -> R) -> R {
        f(&self.state.read())
    }

    /// The current end of the log.
    pub fn marker(&self) -> Marker {
        self.linestack.lock().get_marker()
    }

    /// The state as it was at `marker`, rebuilt from the log.
    pub fn state_at(&self, marker: Marker) -> Result<NetworkState, StorageError> {
        let _span = spans::replay(Marker::START.position(), marker.position()).entered();
        self.linestack.lock().get_state(marker)
    }

    /// Lines logged between two markers.
    pub fn lines_between(&self, from: Marker, to: Marker) -> Result<Vec<Line>, StorageError> {
        let linestack = self.linestack.lock();
        linestack
            .traverse(from, to)?
            .map(|entry| entry.map(|e| e.line))
            .collect()
    }

    /// Process queued lines one at a time until the sender side closes.
    ///
    /// Stops at the first storage failure: the log can no longer vouch for
    /// the state, so nothing more is applied.
    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<SessionEvent>) -> Result<(), StorageError> {
        let span = spans::session(&self.name);
        async move {
            info!("session started");
            let mut processed = 0u64;
            while let Some(event) = rx.recv().await {
                let (line, direction) = event.into_parts();
                self.process(&line, direction, Utc::now().timestamp())?;
                processed += 1;
            }
            info!(processed, "session queue closed");
            Ok(())
        }
        .instrument(span)
        .await
    }
}

/// All live sessions, by network name.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, replacing any previous one with the same name.
    pub fn insert(&self, session: Arc<Session>) -> Option<Arc<Session>> {
        let name = session.name().to_owned();
        debug!(network = %name, "session registered");
        self.sessions.insert(name, session)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions.get(name).map(|s| Arc::clone(s.value()))
    }

    pub fn remove(&self, name: &str) -> Option<Arc<Session>> {
        self.sessions.remove(name).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Registered network names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linestack::MemoryBackend;

    fn session() -> Session {
        let state = NetworkState::new("me", "user", "host");
        let linestack = Linestack::new(Box::new(MemoryBackend::new()), 2, &state).unwrap();
        Session::new("example", state, linestack)
    }

    fn line(text: &str) -> Line {
        Line::parse(text).unwrap()
    }

    #[derive(Default)]
    struct Counter {
        applied: Mutex<Vec<String>>,
        rejected: Mutex<Vec<String>>,
    }

    impl StateObserver for Counter {
        fn on_line(&self, line: &Line, _direction: Direction, _state: &NetworkState) {
            self.applied.lock().push(line.to_string());
        }

        fn on_rejected(&self, line: &Line, _direction: Direction) {
            self.rejected.lock().push(line.to_string());
        }
    }

    #[test]
    fn test_append_then_apply() {
        let s = session();
        let marker = s.handle_inbound(&line(":me!user@host JOIN #rust")).unwrap();
        assert_eq!(marker.position(), 1);
        assert!(s.snapshot().channel("#rust").is_some());
        assert_eq!(s.marker(), marker);
    }

    #[test]
    fn test_malformed_line_is_logged_not_applied() {
        let s = session();
        let counter = Arc::new(Counter::default());
        s.add_observer(counter.clone());

        s.handle_inbound(&line(":me!user@host JOIN #rust")).unwrap();
        s.handle_inbound(&line(":op!o@h KICK #rust")).unwrap();

        assert_eq!(s.marker().position(), 2);
        assert_eq!(counter.applied.lock().len(), 1);
        assert_eq!(counter.rejected.lock().as_slice(), [":op!o@h KICK #rust"]);
        assert!(s.snapshot().channel("#rust").is_some());
    }

    #[test]
    fn test_outbound_lines_are_logged() {
        let s = session();
        s.handle_outbound(&line("PRIVMSG #rust :hi")).unwrap();
        let lines = s.lines_between(Marker::START, s.marker()).unwrap();
        assert_eq!(lines, [line("PRIVMSG #rust :hi")]);
    }

    #[test]
    fn test_state_at_matches_live() {
        let s = session();
        let first = s.marker();
        for text in [
            ":me!user@host JOIN #rust",
            ":server 332 me #rust :Systems",
            ":you!u@h JOIN #rust",
            ":you!u@h PART #rust",
            ":me!user@host NICK me2",
        ] {
            s.process(&line(text), Direction::FromServer, 1_700_000_000).unwrap();
        }
        assert_eq!(s.state_at(s.marker()).unwrap(), s.snapshot());
        assert!(s.state_at(first).unwrap().channel("#rust").is_none());
    }

    #[test]
    fn test_with_state() {
        let s = session();
        s.handle_inbound(&line(":me!user@host JOIN #a")).unwrap();
        assert_eq!(s.with_state(|st| st.channel_count()), 1);
    }

    #[tokio::test]
    async fn test_run_drains_queue() {
        let s = Arc::new(session());
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(Arc::clone(&s).run(rx));

        tx.send(SessionEvent::Inbound(line(":me!user@host JOIN #a"))).await.unwrap();
        tx.send(SessionEvent::Outbound(line("TOPIC #a :hello"))).await.unwrap();
        tx.send(SessionEvent::Inbound(line(":me!user@host JOIN #b"))).await.unwrap();
        drop(tx);

        task.await.unwrap().unwrap();
        let state = s.snapshot();
        assert_eq!(state.channel_count(), 2);
        assert_eq!(s.marker().position(), 3);
    }

    #[test]
    fn test_registry() {
        let registry = SessionRegistry::new();
        assert!(registry.is_empty());
        registry.insert(Arc::new(session()));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), ["example"]);
        assert_eq!(registry.get("example").unwrap().name(), "example");
        assert!(registry.get("other").is_none());
        assert!(registry.remove("example").is_some());
        assert!(registry.is_empty());
    }
}
