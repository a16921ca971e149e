//! Integration tests for the per-network session: queued lines, observers
//! and client catch-up from a snapshot.

use std::sync::Arc;

use parking_lot::Mutex;
use slproxy::client::{ChannelTransport, Client};
use slproxy::linestack::{Linestack, MemoryBackend};
use slproxy::proto::{Direction, Line};
use slproxy::session::{Session, SessionEvent, SessionRegistry};
use slproxy::state::{NetworkState, StateObserver};
use tokio::sync::mpsc;

#[derive(Default)]
struct Log(Mutex<Vec<(Direction, String)>>);

impl StateObserver for Log {
    fn on_line(&self, line: &Line, direction: Direction, _state: &NetworkState) {
        self.0.lock().push((direction, line.to_string()));
    }
}

fn new_session() -> Arc<Session> {
    let state = NetworkState::new("jelmer", "jvr", "example.org");
    let linestack = Linestack::new(Box::new(MemoryBackend::new()), 5, &state).unwrap();
    Arc::new(Session::new("example", state, linestack))
}

#[tokio::test]
async fn test_queue_observers_and_catch_up() {
    let session = new_session();
    let log = Arc::new(Log::default());
    session.add_observer(log.clone());

    let (tx, rx) = mpsc::channel(16);
    let task = tokio::spawn(Arc::clone(&session).run(rx));
    for event in [
        SessionEvent::Inbound(Line::parse(":jelmer!jvr@example.org JOIN #rust").unwrap()),
        SessionEvent::Inbound(Line::parse(":srv 332 jelmer #rust :Fearless").unwrap()),
        SessionEvent::Outbound(Line::parse("PRIVMSG #rust :hello").unwrap()),
        SessionEvent::Inbound(Line::parse(":alice!a@host JOIN #rust").unwrap()),
    ] {
        tx.send(event).await.unwrap();
    }
    drop(tx);
    task.await.unwrap().unwrap();

    let seen = log.0.lock().clone();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen[2], (Direction::ToServer, "PRIVMSG #rust :hello".to_string()));

    let snapshot = session.snapshot();
    assert_eq!(session.state_at(session.marker()).unwrap(), snapshot);

    let (transport, mut out) = ChannelTransport::new(16);
    let mut client = Client::new(transport, "proxy.local", "catch-up");
    client.send_state(&snapshot).await.unwrap();
    let mut lines = Vec::new();
    while let Ok(line) = out.try_recv() {
        lines.push(line.to_string());
    }
    assert_eq!(lines[0], "JOIN #rust");
    assert_eq!(lines[1], ":proxy.local 332 * #rust :Fearless");
}

#[tokio::test]
async fn test_concurrent_readers() {
    let session = new_session();
    session
        .handle_inbound(&Line::parse(":jelmer!jvr@example.org JOIN #rust").unwrap())
        .unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.snapshot().channel_count() })
        })
        .collect();
    session
        .handle_inbound(&Line::parse(":jelmer!jvr@example.org JOIN #tokio").unwrap())
        .unwrap();
    for reader in readers {
        let count = reader.await.unwrap();
        assert!(count == 1 || count == 2);
    }
}

#[test]
fn test_rejected_outbound_commands_leave_state_alone() {
    let session = new_session();
    for text in [":jelmer!jvr@example.org JOIN #rust", ":bob!b@host JOIN #rust"] {
        session.handle_inbound(&Line::parse(text).unwrap()).unwrap();
    }
    let before = session.snapshot();

    session
        .handle_outbound(&Line::parse("MODE #rust +k secret").unwrap())
        .unwrap();
    session
        .handle_outbound(&Line::parse("KICK #rust bob").unwrap())
        .unwrap();
    session
        .handle_inbound(
            &Line::parse(":srv 482 jelmer #rust :You're not channel operator").unwrap(),
        )
        .unwrap();

    let after = session.snapshot();
    assert_eq!(after, before);
    let channel = after.channel("#rust").unwrap();
    assert!(channel.mode_option('k').is_err());
    assert!(channel.contains("bob"));
    assert_eq!(session.marker().position(), 5);
}

#[test]
fn test_registry_lookup() {
    let registry = SessionRegistry::new();
    let session = new_session();
    assert!(registry.insert(Arc::clone(&session)).is_none());
    assert!(registry.insert(session).is_some());
    assert_eq!(registry.get("example").unwrap().marker().position(), 0);
}
