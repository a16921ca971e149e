//! Redb-backed persistent linestack.
//!
//! Entries and snapshots live in two tables keyed by index; values are JSON.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

use super::{LinestackBackend, LinestackEntry};
use crate::error::StorageError;
use crate::state::NetworkState;

const ENTRIES_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("entries");
const SNAPSHOTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("snapshots");

pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open or create the database file and make sure both tables exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(|e| StorageError::Database(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            write_txn
                .open_table(SNAPSHOTS_TABLE)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(Self { db })
    }

    fn insert(&self, snapshot: bool, index: u64, value: &[u8]) -> Result<(), StorageError> {
        let table = if snapshot {
            SNAPSHOTS_TABLE
        } else {
            ENTRIES_TABLE
        };
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(table)
                .map_err(|e| StorageError::Database(e.to_string()))?;
            table
                .insert(index, value)
                .map_err(|e| StorageError::Database(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }
}

impl LinestackBackend for RedbBackend {
    fn append(&mut self, entry: &LinestackEntry) -> Result<(), StorageError> {
        let index = self.len()?;
        let value = serde_json::to_vec(entry)?;
        self.insert(false, index, &value)
    }

    fn len(&self) -> Result<u64, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let last = table
            .last()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(last.map_or(0, |(k, _v)| k.value() + 1))
    }

    fn read_range(&self, from: u64, to: u64) -> Result<Vec<LinestackEntry>, StorageError> {
        if from >= to {
            return Ok(Vec::new());
        }
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut entries = Vec::with_capacity((to - from) as usize);
        for item in table
            .range(from..to)
            .map_err(|e| StorageError::Database(e.to_string()))?
        {
            let (_k, v) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            entries.push(serde_json::from_slice(v.value())?);
        }
        Ok(entries)
    }

    fn put_snapshot(&mut self, index: u64, state: &NetworkState) -> Result<(), StorageError> {
        let value = serde_json::to_vec(state)?;
        self.insert(true, index, &value)
    }

    fn snapshot_before(&self, index: u64) -> Result<Option<(u64, NetworkState)>, StorageError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let table = read_txn
            .open_table(SNAPSHOTS_TABLE)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        let mut range = table
            .range(..=index)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        match range.next_back() {
            Some(item) => {
                let (k, v) = item.map_err(|e| StorageError::Database(e.to_string()))?;
                let state: NetworkState = serde_json::from_slice(v.value())?;
                Ok(Some((k.value(), state)))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linestack::{Linestack, Marker};
    use slproxy_proto::{Direction, Line};
    use tempfile::TempDir;

    fn state() -> NetworkState {
        NetworkState::new("nick", "user", "host")
    }

    fn append(stack: &mut Linestack, live: &mut NetworkState, text: &str) {
        let line = Line::parse(text).unwrap();
        stack
            .insert_line_at(&line, Direction::FromServer, live, 7)
            .unwrap();
        live.handle_line_at(&line, 7).unwrap();
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.redb");
        let mut live = state();

        {
            let backend = RedbBackend::open(&path).unwrap();
            let mut stack = Linestack::new(Box::new(backend), 2, &live).unwrap();
            append(&mut stack, &mut live, ":nick!user@host JOIN #foo");
            append(&mut stack, &mut live, ":bob!b@h JOIN #foo");
            append(&mut stack, &mut live, ":srv 332 nick #foo :persisted");
        }

        let backend = RedbBackend::open(&path).unwrap();
        let stack = Linestack::new(Box::new(backend), 2, &state()).unwrap();
        assert_eq!(stack.len(), 3);
        let rebuilt = stack.get_state(stack.get_marker()).unwrap();
        assert_eq!(rebuilt, live);
        assert_eq!(
            rebuilt.channel("#foo").unwrap().topic.as_deref(),
            Some("persisted")
        );
    }

    #[test]
    fn test_read_range_and_snapshots() {
        let dir = TempDir::new().unwrap();
        let mut backend = RedbBackend::open(dir.path().join("log.redb")).unwrap();
        assert_eq!(backend.len().unwrap(), 0);
        assert!(backend.snapshot_before(10).unwrap().is_none());

        backend.put_snapshot(0, &state()).unwrap();
        for text in ["PING :a", "PING :b", "PING :c"] {
            let entry = LinestackEntry {
                direction: Direction::ToServer,
                line: Line::parse(text).unwrap(),
                time: 1,
                snapshot: 0,
            };
            backend.append(&entry).unwrap();
        }
        assert_eq!(backend.len().unwrap(), 3);
        let middle = backend.read_range(1, 2).unwrap();
        assert_eq!(middle.len(), 1);
        assert_eq!(middle[0].line.to_string(), "PING :b");
        assert!(backend.read_range(2, 2).unwrap().is_empty());

        let (index, _) = backend.snapshot_before(2).unwrap().unwrap();
        assert_eq!(index, 0);
        let stack = Linestack::new(Box::new(backend), 100, &state()).unwrap();
        assert_eq!(stack.traverse(Marker::START, stack.get_marker()).unwrap().count(), 3);
    }
}
