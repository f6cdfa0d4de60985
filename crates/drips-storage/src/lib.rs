//! # drips-storage — RocksDB persistence for drips lists.
//!
//! - [`storage::RocksStore`] — database of per-owner lists in the packed word layout
//! - [`config::StorageConfig`] — data directory and logging settings
//! - [`logging::init_logging`] — tracing subscriber setup

pub mod config;
pub mod logging;
pub mod storage;

pub use crate::config::StorageConfig;
pub use logging::init_logging;
pub use storage::{PersistentDeltas, PersistentWeights, RocksEntryStore, RocksStore, StoredList};
