//! Per-cycle amount deltas of a receiver, kept as a prunable list.
//!
//! Each attached cycle holds two signed deltas: the change effective from
//! that cycle and the change effective from the cycle after it. Deltas are
//! only ever added to. Pruning removes zeroed cycles and every cycle below
//! the finished-cycle watermark, whose effect the caller has already folded
//! into its totals.

use crate::error::{DripsError, ListError};
use crate::list::{Cursor, LinkedEntries, PruneSummary, Step};
use crate::store::{EntryStore, MemoryEntryStore};
use crate::types::{CycleId, Deltas, Payload};

/// Dead-entry predicate for a given watermark.
fn obsolete(finished_cycle: CycleId) -> impl Fn(CycleId, &Deltas) -> bool {
    move |cycle: CycleId, deltas: &Deltas| deltas.is_zero() || cycle < finished_cycle
}

/// Signed per-cycle deltas, embedded in an [`EntryStore`].
#[derive(Debug, Clone)]
pub struct CycleDeltas<S = MemoryEntryStore<CycleId, Deltas>> {
    list: LinkedEntries<CycleId, Deltas, S>,
}

impl CycleDeltas {
    /// Create an empty in-memory list.
    pub fn in_memory() -> Self {
        Self::new(MemoryEntryStore::new())
    }
}

impl<S: EntryStore<CycleId, Deltas>> CycleDeltas<S> {
    pub fn new(store: S) -> Self {
        Self {
            list: LinkedEntries::new(store),
        }
    }

    pub fn store(&self) -> &S {
        self.list.store()
    }

    pub fn into_store(self) -> S {
        self.list.into_store()
    }

    /// Add signed increments to the deltas of `cycle`, attaching it if needed.
    ///
    /// # Errors
    ///
    /// - [`ListError::InvalidKey`] for cycle 0 and `u64::MAX`
    /// - [`ListError::DeltaOverflow`] if either sum leaves the `i128` range
    ///
    /// The list is unchanged on error.
    pub fn add_to_delta(
        &mut self,
        cycle: CycleId,
        this_cycle_added: i128,
        next_cycle_added: i128,
    ) -> Result<(), DripsError> {
        self.list.update(cycle, |deltas| {
            let overflow = || ListError::DeltaOverflow { cycle: cycle.get() };
            let this_cycle = deltas.this_cycle.checked_add(this_cycle_added).ok_or_else(overflow)?;
            let next_cycle = deltas.next_cycle.checked_add(next_cycle_added).ok_or_else(overflow)?;
            *deltas = Deltas { this_cycle, next_cycle };
            Ok(())
        })
    }

    /// Stored deltas of `cycle`; zero if it is not in the list.
    pub fn deltas(&self, cycle: &CycleId) -> Result<Deltas, DripsError> {
        self.list.payload(cycle)
    }

    /// Whether the root has no successor.
    pub fn is_empty(&self) -> Result<bool, DripsError> {
        self.list.is_empty()
    }

    /// Next cycle after `cursor` with non-zero deltas at or above
    /// `finished_cycle`, without writes.
    pub fn next_delta(
        &self,
        cursor: Cursor<CycleId>,
        finished_cycle: CycleId,
    ) -> Result<Step<CycleId, Deltas>, DripsError> {
        self.list.next_live(cursor, obsolete(finished_cycle))
    }

    /// Like [`next_delta`](Self::next_delta), but deletes every zeroed or
    /// finished cycle it passes over, whatever its deltas.
    pub fn next_delta_pruning(
        &mut self,
        cursor: Cursor<CycleId>,
        finished_cycle: CycleId,
    ) -> Result<Step<CycleId, Deltas>, DripsError> {
        self.list.next_live_pruning(cursor, obsolete(finished_cycle))
    }

    /// Read-only iterator over pending cycles at or above `finished_cycle`.
    pub fn iter(&self, finished_cycle: CycleId) -> DeltasIter<'_, S> {
        DeltasIter {
            deltas: self,
            finished_cycle,
            cursor: Some(Cursor::start()),
        }
    }

    /// Prune the whole list, calling `visit` for every pending cycle.
    pub fn prune_with(
        &mut self,
        finished_cycle: CycleId,
        visit: impl FnMut(CycleId, Deltas),
    ) -> Result<PruneSummary, DripsError> {
        let summary = self.list.prune_all(obsolete(finished_cycle), visit)?;
        tracing::debug!(
            finished_cycle = finished_cycle.get(),
            live = summary.live,
            removed = summary.removed,
            "pruned cycle deltas"
        );
        Ok(summary)
    }

    /// Prune the whole list.
    pub fn prune(&mut self, finished_cycle: CycleId) -> Result<PruneSummary, DripsError> {
        self.prune_with(finished_cycle, |_, _| {})
    }
}

/// Iterator returned by [`CycleDeltas::iter`].
pub struct DeltasIter<'a, S> {
    deltas: &'a CycleDeltas<S>,
    finished_cycle: CycleId,
    cursor: Option<Cursor<CycleId>>,
}

impl<S: EntryStore<CycleId, Deltas>> Iterator for DeltasIter<'_, S> {
    type Item = Result<(CycleId, Deltas), DripsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        match self.deltas.next_delta(cursor, self.finished_cycle) {
            Ok(step) if step.is_end() => None,
            Ok(step) => {
                self.cursor = Some(step.cursor);
                Some(Ok((step.cursor.current, step.payload)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
