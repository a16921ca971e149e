//! In-memory linestack backend. Nothing survives a restart.

use std::collections::BTreeMap;

use super::{LinestackBackend, LinestackEntry};
use crate::error::StorageError;
use crate::state::NetworkState;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Vec<LinestackEntry>,
    snapshots: BTreeMap<u64, NetworkState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LinestackBackend for MemoryBackend {
    fn append(&mut self, entry: &LinestackEntry) -> Result<(), StorageError> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn len(&self) -> Result<u64, StorageError> {
        Ok(self.entries.len() as u64)
    }

    fn read_range(&self, from: u64, to: u64) -> Result<Vec<LinestackEntry>, StorageError> {
        let len = self.entries.len();
        let from = (from as usize).min(len);
        let to = (to as usize).clamp(from, len);
        Ok(self.entries[from..to].to_vec())
    }

    fn put_snapshot(&mut self, index: u64, state: &NetworkState) -> Result<(), StorageError> {
        self.snapshots.insert(index, state.clone());
        Ok(())
    }

    fn snapshot_before(&self, index: u64) -> Result<Option<(u64, NetworkState)>, StorageError> {
        Ok(self
            .snapshots
            .range(..=index)
            .next_back()
            .map(|(i, s)| (*i, s.clone())))
    }
}
