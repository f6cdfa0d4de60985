//! RocksDB-backed persistent list storage.
//!
//! Implements [`EntryStore`] on RocksDB column families, one per key
//! domain. Every record is written in the packed word layout of
//! [`drips_core::layout`] under `owner ‖ key`, so many independent lists
//! share one database. Writes of a list operation are staged and applied
//! with a single atomic [`WriteBatch`] on commit.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use rocksdb::{ColumnFamilyDescriptor, Options, SliceTransform, WriteBatch, DB};

use drips_core::layout::PackedLayout;
use drips_core::store::EntryStore;
use drips_core::types::{AccountId, CycleId, Entry};
use drips_core::{CycleDeltas, DripsError, ReceiverWeights};

// --- Column family names ---

const CF_RECEIVER_WEIGHTS: &str = "receiver_weights";
const CF_CYCLE_DELTAS: &str = "cycle_deltas";

/// All column family names.
const ALL_CFS: &[&str] = &[CF_RECEIVER_WEIGHTS, CF_CYCLE_DELTAS];

/// Width of the owner prefix on every stored key.
const OWNER_PREFIX_LEN: usize = 20;

fn storage_err(e: rocksdb::Error) -> DripsError {
    DripsError::Storage(e.to_string())
}

/// A key domain persisted in its own column family.
pub trait StoredList: PackedLayout {
    const COLUMN_FAMILY: &'static str;
}

impl StoredList for AccountId {
    const COLUMN_FAMILY: &'static str = CF_RECEIVER_WEIGHTS;
}

impl StoredList for CycleId {
    const COLUMN_FAMILY: &'static str = CF_CYCLE_DELTAS;
}

/// Receiver weights of one owner, persisted in RocksDB.
pub type PersistentWeights = ReceiverWeights<RocksEntryStore<AccountId>>;

/// Cycle deltas of one owner, persisted in RocksDB.
pub type PersistentDeltas = CycleDeltas<RocksEntryStore<CycleId>>;

/// Database holding any number of lists, isolated by owner account.
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path.
    ///
    /// Creates all column families if they don't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DripsError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| {
                let mut opts = Options::default();
                // Keys start with the 20-byte owner account.
                opts.set_prefix_extractor(SliceTransform::create_fixed_prefix(OWNER_PREFIX_LEN));
                ColumnFamilyDescriptor::new(*name, opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors)
            .map_err(storage_err)?;
        tracing::info!(path = %path.as_ref().display(), "opened list storage");

        Ok(Self { db: Arc::new(db) })
    }

    /// Entry store for the list of `K` records belonging to `owner`.
    pub fn entry_store<K: StoredList>(&self, owner: AccountId) -> RocksEntryStore<K> {
        RocksEntryStore {
            db: Arc::clone(&self.db),
            owner,
            pending: HashMap::new(),
        }
    }

    /// Receiver weights list of `owner`.
    pub fn receiver_weights(&self, owner: AccountId) -> PersistentWeights {
        ReceiverWeights::new(self.entry_store(owner))
    }

    /// Cycle deltas list of `owner`.
    pub fn cycle_deltas(&self, owner: AccountId) -> PersistentDeltas {
        CycleDeltas::new(self.entry_store(owner))
    }

    /// Number of `K` records persisted for `owner`, including its root record.
    pub fn record_count<K: StoredList>(&self, owner: &AccountId) -> Result<usize, DripsError> {
        let cf = cf_handle(&self.db, K::COLUMN_FAMILY)?;
        let mut count = 0;
        for item in self.db.prefix_iterator_cf(cf, owner.as_bytes()) {
            let (key, _) = item.map_err(storage_err)?;
            if !key.starts_with(owner.as_bytes()) {
                break;
            }
            count += 1;
        }
        Ok(count)
    }

    /// Flush all in-memory buffers to disk.
    pub fn flush(&self) -> Result<(), DripsError> {
        self.db.flush().map_err(storage_err)
    }

    /// Trigger manual compaction across all column families.
    ///
    /// Reclaims space from records deleted by pruning.
    pub fn compact(&self) -> Result<(), DripsError> {
        for cf_name in ALL_CFS {
            let cf = cf_handle(&self.db, cf_name)?;
            self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        }
        tracing::info!("compacted list storage");
        Ok(())
    }
}

fn cf_handle<'a>(db: &'a DB, name: &str) -> Result<&'a rocksdb::ColumnFamily, DripsError> {
    db.cf_handle(name)
        .ok_or_else(|| DripsError::Storage(format!("missing column family: {name}")))
}

/// [`EntryStore`] for one owner's list of `K` records.
///
/// Writes are staged in memory and become visible to other handles only on
/// [`commit`](EntryStore::commit). Reads see staged writes first.
pub struct RocksEntryStore<K: StoredList> {
    db: Arc<DB>,
    owner: AccountId,
    /// Staged writes; `None` marks a deletion.
    pending: HashMap<K, Option<Entry<K, K::Payload>>>,
}

impl<K: StoredList> RocksEntryStore<K> {
    pub fn owner(&self) -> AccountId {
        self.owner
    }

    /// Number of staged, uncommitted writes.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    fn db_key(&self, key: &K) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(OWNER_PREFIX_LEN + 8);
        bytes.extend_from_slice(self.owner.as_bytes());
        bytes.extend_from_slice(&key.key_bytes());
        bytes
    }
}

impl<K: StoredList> EntryStore<K, K::Payload> for RocksEntryStore<K> {
    fn load(&self, key: &K) -> Result<Option<Entry<K, K::Payload>>, DripsError> {
        if let Some(staged) = self.pending.get(key) {
            return Ok(*staged);
        }
        let cf = cf_handle(&self.db, K::COLUMN_FAMILY)?;
        match self.db.get_cf(cf, self.db_key(key)).map_err(storage_err)? {
            Some(bytes) => Ok(Some(K::unpack(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: K, entry: Entry<K, K::Payload>) -> Result<(), DripsError> {
        self.pending.insert(key, Some(entry));
        Ok(())
    }

    fn delete(&mut self, key: &K) -> Result<(), DripsError> {
        self.pending.insert(*key, None);
        Ok(())
    }

    /// Apply the staged writes in one batch. The overlay is emptied whether
    /// or not the batch is written.
    fn commit(&mut self) -> Result<(), DripsError> {
        let staged = std::mem::take(&mut self.pending);
        if staged.is_empty() {
            return Ok(());
        }
        let cf = cf_handle(&self.db, K::COLUMN_FAMILY)?;
        let mut batch = WriteBatch::default();
        for (key, write) in &staged {
            match write {
                Some(entry) => batch.put_cf(cf, self.db_key(key), K::pack(entry)),
                None => batch.delete_cf(cf, self.db_key(key)),
            }
        }
        self.db.write(batch).map_err(storage_err)?;
        tracing::trace!(owner = %self.owner, writes = staged.len(), "committed list writes");
        Ok(())
    }

    fn discard(&mut self) {
        if !self.pending.is_empty() {
            tracing::debug!(owner = %self.owner, writes = self.pending.len(), "discarded list writes");
        }
        self.pending.clear();
    }
}
