//! Entry storage interface and in-memory implementation.
//!
//! Provides the [`EntryStore`] trait used by every list to read and write
//! its records by key. The [`MemoryEntryStore`] keeps records in a
//! `HashMap`; the persistent backend lives in drips-storage (RocksDB).
//!
//! A list issues all writes of one operation and then calls
//! [`EntryStore::commit`], or [`EntryStore::discard`] if the operation
//! failed. Backends that stage writes use these hooks to make every list
//! operation atomic.

use std::collections::HashMap;

use crate::error::DripsError;
use crate::types::{Entry, ListKey, Payload};

/// Key-addressed record storage backing one list instance.
///
/// Missing records read as `None` and are treated as detached zero
/// entries by the list. Not synchronised; a list owns its store.
pub trait EntryStore<K: ListKey, P: Payload>: Send + Sync {
    /// Look up the record stored under `key`.
    fn load(&self, key: &K) -> Result<Option<Entry<K, P>>, DripsError>;

    /// Store a record, replacing any previous one.
    fn save(&mut self, key: K, entry: Entry<K, P>) -> Result<(), DripsError>;

    /// Remove the record under `key`. Removing a missing record is a no-op.
    fn delete(&mut self, key: &K) -> Result<(), DripsError>;

    /// Make all writes since the last commit durable as one unit.
    ///
    /// Default implementation does nothing (writes apply immediately).
    fn commit(&mut self) -> Result<(), DripsError> {
        Ok(())
    }

    /// Drop all writes since the last commit.
    ///
    /// Default implementation does nothing.
    fn discard(&mut self) {}
}

/// In-memory entry storage.
///
/// Writes apply immediately. Lists validate their input before the first
/// write, so a failed operation never leaves partial state here.
#[derive(Debug, Clone)]
pub struct MemoryEntryStore<K, P> {
    entries: HashMap<K, Entry<K, P>>,
}

impl<K: ListKey, P: Payload> MemoryEntryStore<K, P> {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Number of records held, including the root record.
    pub fn record_count(&self) -> usize {
        self.entries.len()
    }

    /// All records sorted by key.
    pub fn records(&self) -> Vec<(K, Entry<K, P>)> {
        let mut records: Vec<_> = self.entries.iter().map(|(k, e)| (*k, *e)).collect();
        records.sort_by_key(|(k, _)| *k);
        records
    }
}

impl<K, P> MemoryEntryStore<K, P>
where
    K: ListKey + bincode::Encode + bincode::Decode<()>,
    P: Payload + bincode::Encode + bincode::Decode<()>,
{
    /// Serialize every record with bincode, sorted by key.
    pub fn to_snapshot(&self) -> Result<Vec<u8>, DripsError> {
        bincode::encode_to_vec(self.records(), bincode::config::standard())
            .map_err(|e| DripsError::Storage(e.to_string()))
    }

    /// Rebuild a store from [`to_snapshot`](Self::to_snapshot) output.
    pub fn from_snapshot(bytes: &[u8]) -> Result<Self, DripsError> {
        let (records, _): (Vec<(K, Entry<K, P>)>, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())
                .map_err(|e| DripsError::Storage(e.to_string()))?;
        Ok(Self {
            entries: records.into_iter().collect(),
        })
    }
}

impl<K: ListKey, P: Payload> Default for MemoryEntryStore<K, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ListKey, P: Payload> EntryStore<K, P> for MemoryEntryStore<K, P> {
    fn load(&self, key: &K) -> Result<Option<Entry<K, P>>, DripsError> {
        Ok(self.entries.get(key).copied())
    }

    fn save(&mut self, key: K, entry: Entry<K, P>) -> Result<(), DripsError> {
        self.entries.insert(key, entry);
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<(), DripsError> {
        self.entries.remove(key);
        Ok(())
    }
}
