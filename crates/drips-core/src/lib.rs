//! # drips-core
//! Storage-embedded accounting lists for continuous value streaming.
//!
//! - [`ReceiverWeights`] — receivers and proxies with their weights
//! - [`CycleDeltas`] — signed per-cycle payment deltas with watermark pruning
//!
//! Both lists live inside a key-addressed [`EntryStore`](store::EntryStore):
//! a root record plus one record per attached key, linked by key values.
//! Zeroed entries stay linked until a pruning iteration walks over them.

pub mod cycle_deltas;
pub mod error;
pub mod layout;
pub mod list;
pub mod store;
pub mod types;
pub mod weights;

pub use cycle_deltas::CycleDeltas;
pub use error::{DripsError, LayoutError, ListError};
pub use list::{Cursor, PruneSummary, Step};
pub use store::{EntryStore, MemoryEntryStore};
pub use types::{AccountId, CycleId, Deltas, Entry, ListKey, Payload, Weights};
pub use weights::ReceiverWeights;
