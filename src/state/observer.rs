//! State observer trait.
//!
//! Observers are attached to a [`Session`](crate::session::Session) and are
//! told about every line after it has been recorded and applied, together
//! with the resulting state. Logging sinks, client fan-out and tests hook in
//! here.

use slproxy_proto::{Direction, Line};

use super::NetworkState;

/// Trait for observing applied lines.
///
/// Called with the session's state lock held for reading; implementations
/// must not block.
pub trait StateObserver: Send + Sync {
    /// Called once per line, after it was appended and applied.
    fn on_line(&self, line: &Line, direction: Direction, state: &NetworkState);

    /// Called when a line could not be applied because it was malformed.
    /// The line was still recorded.
    fn on_rejected(&self, _line: &Line, _direction: Direction) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(String, Direction, usize)>>,
    }

    impl StateObserver for Recorder {
        fn on_line(&self, line: &Line, direction: Direction, state: &NetworkState) {
            self.seen
                .lock()
                .push((line.to_string(), direction, state.channel_count()));
        }
    }

    #[test]
    fn observer_sees_post_apply_state() {
        let recorder = Recorder::default();
        let mut state = NetworkState::new("me", "u", "h");
        let line = Line::parse(":me!u@h JOIN #rust").unwrap();
        state.handle_line(&line).unwrap();
        recorder.on_line(&line, Direction::FromServer, &state);
        recorder.on_rejected(&line, Direction::FromServer);

        let seen = recorder.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, Direction::FromServer);
        assert_eq!(seen[0].2, 1);
    }
}
