//! Append-only log of every line that passed through a session.
//!
//! The linestack is the durability boundary: a line is appended before it is
//! applied to live state, so replaying the log from any marker reproduces
//! exactly what live processing saw. Periodic snapshots of the network state
//! bound how much has to be replayed to rebuild the state at a marker.
//!
//! # Markers
//!
//! A [`Marker`] is a position *between* entries: the number of entries
//! before it. [`Linestack::traverse`]`(m1, m2)` yields the entries inserted
//! after `m1` was taken and before `m2` was taken, in insertion order. The
//! range is empty when `m1 >= m2`.

mod memory;
mod redb;

use std::collections::VecDeque;
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use slproxy_proto::{Direction, Line, NetworkInfo};
use tracing::{debug, info, warn};

use crate::config::{LinestackBackendKind, LinestackConfig};
use crate::error::StorageError;
use crate::state::NetworkState;

pub use self::memory::MemoryBackend;
pub use self::redb::RedbBackend;

/// Entries fetched from the backend per read while traversing.
const TRAVERSE_CHUNK: u64 = 256;

/// A position in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Marker(u64);

impl Marker {
    /// The marker before any entry.
    pub const START: Marker = Marker(0);

    /// Number of entries before this marker.
    pub fn position(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// One logged line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinestackEntry {
    pub direction: Direction,
    pub line: Line,
    /// Unix time the line was logged; also the clock used when replaying it.
    pub time: i64,
    /// Index of the nearest snapshot at or before this entry.
    pub snapshot: u64,
}

/// Storage behind a [`Linestack`].
///
/// Indices are dense and start at zero. A snapshot stored at index `i` is
/// the state before entry `i` was applied.
pub trait LinestackBackend: Send {
    /// Append an entry at index `len()`.
    fn append(&mut self, entry: &LinestackEntry) -> Result<(), StorageError>;

    /// Number of stored entries.
    fn len(&self) -> Result<u64, StorageError>;

    /// Entries with indices in `from..to`, in order.
    fn read_range(&self, from: u64, to: u64) -> Result<Vec<LinestackEntry>, StorageError>;

    /// Store the state before entry `index`.
    fn put_snapshot(&mut self, index: u64, state: &NetworkState) -> Result<(), StorageError>;

    /// The latest snapshot at or before `index`.
    fn snapshot_before(&self, index: u64) -> Result<Option<(u64, NetworkState)>, StorageError>;
}

/// The line log of one session.
pub struct Linestack {
    backend: Box<dyn LinestackBackend>,
    len: u64,
    snapshot_interval: u64,
    last_snapshot: u64,
}

impl Linestack {
    /// Wrap a backend. An empty backend gets `initial` as its first
    /// snapshot; a non-empty one continues where it left off.
    pub fn new(
        mut backend: Box<dyn LinestackBackend>,
        snapshot_interval: u64,
        initial: &NetworkState,
    ) -> Result<Self, StorageError> {
        let len = backend.len()?;
        let last_snapshot = match backend.snapshot_before(len)? {
            Some((index, _)) => index,
            None => {
                backend.put_snapshot(len, initial)?;
                len
            }
        };
        debug!(len, last_snapshot, "linestack opened");
        Ok(Self {
            backend,
            len,
            snapshot_interval: snapshot_interval.max(1),
            last_snapshot,
        })
    }

    /// Open the backend named by the configuration.
    pub fn open(config: &LinestackConfig, initial: &NetworkState) -> Result<Self, StorageError> {
        let backend: Box<dyn LinestackBackend> = match config.backend {
            LinestackBackendKind::Memory => Box::new(MemoryBackend::new()),
            LinestackBackendKind::Redb => Box::new(RedbBackend::open(&config.path)?),
        };
        info!(backend = ?config.backend, path = %config.path, "opening linestack");
        Self::new(backend, config.snapshot_interval, initial)
    }

    /// The current end of the log.
    pub fn get_marker(&self) -> Marker {
        Marker(self.len)
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a line, stamped with the current time.
    ///
    /// `state` is the state *before* the line is applied; it is stored as a
    /// snapshot when one is due.
    pub fn insert_line(
        &mut self,
        line: &Line,
        direction: Direction,
        state: &NetworkState,
    ) -> Result<Marker, StorageError> {
        self.insert_line_at(line, direction, state, Utc::now().timestamp())
    }

    /// [`insert_line`](Self::insert_line) with an explicit timestamp.
    pub fn insert_line_at(
        &mut self,
        line: &Line,
        direction: Direction,
        state: &NetworkState,
        time: i64,
    ) -> Result<Marker, StorageError> {
        let index = self.len;
        if index - self.last_snapshot >= self.snapshot_interval {
            self.backend.put_snapshot(index, state)?;
            self.last_snapshot = index;
            debug!(index, "state snapshot stored");
        }
        let entry = LinestackEntry {
            direction,
            line: line.clone(),
            time,
            snapshot: self.last_snapshot,
        };
        self.backend.append(&entry)?;
        self.len += 1;
        Ok(Marker(self.len))
    }

    fn check_marker(&self, marker: Marker) -> Result<(), StorageError> {
        if marker.0 > self.len {
            return Err(StorageError::MarkerOutOfRange {
                marker: marker.0,
                len: self.len,
            });
        }
        Ok(())
    }

    /// Entries between two markers, read lazily. Calling again with the same
    /// markers yields the same entries.
    pub fn traverse(&self, from: Marker, to: Marker) -> Result<Traverse<'_>, StorageError> {
        self.check_marker(to)?;
        Ok(Traverse {
            backend: self.backend.as_ref(),
            next: from.0,
            end: to.0.max(from.0),
            buffer: VecDeque::new(),
        })
    }

    /// Entries between two markers whose first argument names `target`.
    /// Comma separated target lists match when any element does.
    pub fn traverse_object<'a>(
        &'a self,
        from: Marker,
        to: Marker,
        target: &'a str,
        info: &'a NetworkInfo,
    ) -> Result<impl Iterator<Item = Result<LinestackEntry, StorageError>> + 'a, StorageError> {
        Ok(self.traverse(from, to)?.filter(move |entry| match entry {
            Ok(entry) => entry
                .line
                .arg(0)
                .is_some_and(|arg| arg.split(',').any(|t| info.irc_eq(t, target))),
            Err(_) => true,
        }))
    }

    /// Apply the entries between two markers to `state`, with each entry's
    /// logged time as the clock. Returns the number of entries applied.
    ///
    /// Malformed lines were logged but never changed live state either; they
    /// are skipped the same way here.
    pub fn replay(
        &self,
        state: &mut NetworkState,
        from: Marker,
        to: Marker,
    ) -> Result<usize, StorageError> {
        let mut count = 0;
        for entry in self.traverse(from, to)? {
            let entry = entry?;
            if let Err(e) = state.handle_line_at(&entry.line, entry.time) {
                warn!(error = %e, line = %entry.line, "skipping malformed line during replay");
            }
            count += 1;
        }
        Ok(count)
    }

    /// The network state as it was at `marker`.
    pub fn get_state(&self, marker: Marker) -> Result<NetworkState, StorageError> {
        self.check_marker(marker)?;
        let (index, mut state) = self
            .backend
            .snapshot_before(marker.0)?
            .ok_or_else(|| StorageError::Database(format!("no snapshot before {}", marker)))?;
        let replayed = self.replay(&mut state, Marker(index), marker)?;
        debug!(%marker, snapshot = index, replayed, "state rebuilt");
        Ok(state)
    }
}

/// Lazy iterator returned by [`Linestack::traverse`].
pub struct Traverse<'a> {
    backend: &'a dyn LinestackBackend,
    next: u64,
    end: u64,
    buffer: VecDeque<LinestackEntry>,
}

impl Iterator for Traverse<'_> {
    type Item = Result<LinestackEntry, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && self.next < self.end {
            let to = (self.next + TRAVERSE_CHUNK).min(self.end);
            match self.backend.read_range(self.next, to) {
                Ok(entries) if entries.len() as u64 == to - self.next => {
                    self.buffer.extend(entries);
                    self.next = to;
                }
                Ok(entries) => {
                    let missing = self.next + entries.len() as u64;
                    self.next = self.end;
                    return Some(Err(StorageError::Database(format!(
                        "entry {} missing from log",
                        missing
                    ))));
                }
                Err(e) => {
                    self.next = self.end;
                    return Some(Err(e));
                }
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
