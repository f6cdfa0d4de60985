//! Singly-linked list embedded in an [`EntryStore`].
//!
//! The record under `K::ROOT` heads the list. Attaching inserts right after
//! the root, so iteration runs newest-first. Entries are never unlinked on
//! update; a walk treats entries matching a "dead" predicate as absent and,
//! in pruning mode, deletes them and re-points their live predecessor with
//! a single write.

use std::marker::PhantomData;

use crate::error::{DripsError, ListError};
use crate::store::EntryStore;
use crate::types::{Entry, ListKey, Payload};

/// Resumption token for list iteration.
///
/// `current` is the entry returned by the previous step and `next` the key
/// that followed it at that time. Only valid while no other mutation has
/// reshaped the chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cursor<K> {
    pub current: K,
    pub next: K,
}

impl<K: ListKey> Cursor<K> {
    /// Cursor that starts iteration at the head of the list.
    pub fn start() -> Self {
        Self {
            current: K::ROOT,
            next: K::ROOT,
        }
    }

    /// Whether iteration is exhausted (`current` is the sentinel).
    pub fn is_end(&self) -> bool {
        self.current == K::ROOT
    }
}

impl<K: ListKey> Default for Cursor<K> {
    fn default() -> Self {
        Self::start()
    }
}

/// Result of one iteration step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step<K, P> {
    /// Cursor to pass to the next call. `cursor.current` is the returned entry.
    pub cursor: Cursor<K>,
    /// Payload of `cursor.current`; zero at the end of the list.
    pub payload: P,
}

impl<K: ListKey, P: Payload> Step<K, P> {
    pub fn is_end(&self) -> bool {
        self.cursor.is_end()
    }

    fn end() -> Self {
        Self {
            cursor: Cursor::start(),
            payload: P::default(),
        }
    }
}

/// Outcome of a full pruning pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PruneSummary {
    /// Entries returned by the pass.
    pub live: usize,
    /// Entries unlinked and deleted by the pass.
    pub removed: usize,
}

/// What a walk found between the cursor and the next live entry.
struct Scan<K, P> {
    step: Step<K, P>,
    /// Dead entries passed over, in chain order.
    dead: Vec<K>,
}

/// Generic storage-embedded list shared by
/// [`ReceiverWeights`](crate::ReceiverWeights) and [`CycleDeltas`](crate::CycleDeltas).
#[derive(Debug, Clone)]
pub struct LinkedEntries<K, P, S> {
    store: S,
    _marker: PhantomData<fn() -> (K, P)>,
}

impl<K, P, S> LinkedEntries<K, P, S>
where
    K: ListKey,
    P: Payload,
    S: EntryStore<K, P>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Stored record for `key`, or a detached zero entry.
    pub fn entry(&self, key: &K) -> Result<Entry<K, P>, DripsError> {
        Ok(self.store.load(key)?.unwrap_or_default())
    }

    /// Payload stored for `key`, zero if unknown.
    pub fn payload(&self, key: &K) -> Result<P, DripsError> {
        Ok(self.entry(key)?.payload)
    }

    /// Whether the root has no successor.
    pub fn is_empty(&self) -> Result<bool, DripsError> {
        Ok(self.entry(&K::ROOT)?.next == K::ROOT)
    }

    /// Apply `f` to the payload under `key`, attaching the key if needed.
    ///
    /// `f` runs before anything is written; if it fails, or `key` is not
    /// attachable, the list is left unchanged.
    pub fn update<R>(
        &mut self,
        key: K,
        f: impl FnOnce(&mut P) -> Result<R, ListError>,
    ) -> Result<R, DripsError> {
        key.ensure_attachable()?;
        let mut entry = self.entry(&key)?;
        let result = f(&mut entry.payload)?;
        let written = self.write_update(key, entry);
        self.finish(written)?;
        Ok(result)
    }

    fn write_update(&mut self, key: K, mut entry: Entry<K, P>) -> Result<(), DripsError> {
        if !entry.attached {
            let mut root = self.entry(&K::ROOT)?;
            entry.next = root.next;
            entry.attached = true;
            root.next = key;
            self.store.save(K::ROOT, root)?;
            tracing::trace!(key = %key, "attached list entry");
        }
        self.store.save(key, entry)
    }

    /// Read-only step: the first live entry after `prev`.
    pub fn next_live(
        &self,
        prev: Cursor<K>,
        is_dead: impl Fn(K, &P) -> bool,
    ) -> Result<Step<K, P>, DripsError> {
        Ok(self.scan(prev, is_dead)?.step)
    }

    /// Pruning step: like [`next_live`](Self::next_live), but every dead
    /// entry passed over is deleted and the predecessor re-pointed once.
    pub fn next_live_pruning(
        &mut self,
        prev: Cursor<K>,
        is_dead: impl Fn(K, &P) -> bool,
    ) -> Result<Step<K, P>, DripsError> {
        Ok(self.prune_step(prev, is_dead)?.0)
    }

    /// Run the pruning step to exhaustion, calling `visit` for each live entry.
    pub fn prune_all(
        &mut self,
        is_dead: impl Fn(K, &P) -> bool,
        mut visit: impl FnMut(K, P),
    ) -> Result<PruneSummary, DripsError> {
        let mut summary = PruneSummary::default();
        let mut cursor = Cursor::start();
        loop {
            let (step, removed) = self.prune_step(cursor, &is_dead)?;
            summary.removed += removed;
            if step.is_end() {
                return Ok(summary);
            }
            summary.live += 1;
            visit(step.cursor.current, step.payload);
            cursor = step.cursor;
        }
    }

    fn prune_step(
        &mut self,
        prev: Cursor<K>,
        is_dead: impl Fn(K, &P) -> bool,
    ) -> Result<(Step<K, P>, usize), DripsError> {
        let scan = self.scan(prev, is_dead)?;
        if scan.dead.is_empty() {
            return Ok((scan.step, 0));
        }
        let written = self.unlink(prev.current, scan.step.cursor.current, &scan.dead);
        self.finish(written)?;
        Ok((scan.step, scan.dead.len()))
    }

    fn unlink(&mut self, predecessor: K, successor: K, dead: &[K]) -> Result<(), DripsError> {
        for key in dead {
            self.store.delete(key)?;
        }
        let mut pred = self.entry(&predecessor)?;
        pred.next = successor;
        self.store.save(predecessor, pred)
    }

    fn scan(
        &self,
        prev: Cursor<K>,
        is_dead: impl Fn(K, &P) -> bool,
    ) -> Result<Scan<K, P>, DripsError> {
        let first = if prev.current == K::ROOT {
            self.entry(&K::ROOT)?.next
        } else {
            prev.next
        };
        let mut dead = Vec::new();
        let mut key = first;
        while key != K::ROOT {
            let entry = self.entry(&key)?;
            if !is_dead(key, &entry.payload) {
                let step = Step {
                    cursor: Cursor {
                        current: key,
                        next: entry.next,
                    },
                    payload: entry.payload,
                };
                return Ok(Scan { step, dead });
            }
            dead.push(key);
            key = entry.next;
        }
        Ok(Scan {
            step: Step::end(),
            dead,
        })
    }

    /// Commit the writes of one operation, or drop them all if any write or
    /// the commit itself failed.
    fn finish(&mut self, written: Result<(), DripsError>) -> Result<(), DripsError> {
        let result = written.and_then(|()| self.store.commit());
        if result.is_err() {
            self.store.discard();
        }
        result
    }
}
