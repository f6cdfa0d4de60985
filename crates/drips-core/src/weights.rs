//! Receiver and proxy weights of a stream, kept as a prunable list.
//!
//! Setting a weight is O(1): the account is attached after the root on
//! first use and updated in place afterwards. An account whose receiver
//! and proxy weights are both zero stays linked until a pruning iteration
//! passes over it. Iteration order is newest-attached first and carries
//! no meaning.

use crate::error::DripsError;
use crate::list::{Cursor, LinkedEntries, PruneSummary, Step};
use crate::store::{EntryStore, MemoryEntryStore};
use crate::types::{AccountId, Payload, Weights};

fn is_dead(_: AccountId, weights: &Weights) -> bool {
    weights.is_zero()
}

/// Weights of receivers and proxies, embedded in an [`EntryStore`].
#[derive(Debug, Clone)]
pub struct ReceiverWeights<S = MemoryEntryStore<AccountId, Weights>> {
    list: LinkedEntries<AccountId, Weights, S>,
}

impl ReceiverWeights {
    /// Create an empty in-memory list.
    pub fn in_memory() -> Self {
        Self::new(MemoryEntryStore::new())
    }
}

impl<S: EntryStore<AccountId, Weights>> ReceiverWeights<S> {
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

    /// Set the receiver weight of `account`, returning the previous one.
    ///
    /// Attaches the account if needed, even for weight 0.
    ///
    /// # Errors
    ///
    /// - [`ListError::InvalidKey`](crate::ListError::InvalidKey) for the zero account
    pub fn set_receiver_weight(&mut self, account: AccountId, weight: u32) -> Result<u32, DripsError> {
        self.list
            .update(account, |w| Ok(std::mem::replace(&mut w.receiver, weight)))
    }

    /// Set the proxy weight of `account`, returning the previous one.
    ///
    /// # Errors
    ///
    /// - [`ListError::InvalidKey`](crate::ListError::InvalidKey) for the zero account
    pub fn set_proxy_weight(&mut self, account: AccountId, weight: u32) -> Result<u32, DripsError> {
        self.list
            .update(account, |w| Ok(std::mem::replace(&mut w.proxy, weight)))
    }

    /// Stored weights of `account`; zero if it is not in the list.
    pub fn weights(&self, account: &AccountId) -> Result<Weights, DripsError> {
        self.list.payload(account)
    }

    /// Whether the root has no successor.
    ///
    /// Zeroed entries keep the list non-empty until they are pruned; see
    /// [`is_zeroed`](Self::is_zeroed).
    pub fn is_empty(&self) -> Result<bool, DripsError> {
        self.list.is_empty()
    }

    /// Whether no account has a non-zero weight.
    pub fn is_zeroed(&self) -> Result<bool, DripsError> {
        Ok(self.next_weight(Cursor::start())?.is_end())
    }

    /// Next account with a non-zero weight after `cursor`, without writes.
    ///
    /// Pass [`Cursor::start`] to begin and the returned `step.cursor` to
    /// continue. A step whose cursor [`is_end`](Cursor::is_end) ends iteration.
    pub fn next_weight(&self, cursor: Cursor<AccountId>) -> Result<Step<AccountId, Weights>, DripsError> {
        self.list.next_live(cursor, is_dead)
    }

    /// Like [`next_weight`](Self::next_weight), but deletes every zeroed
    /// account it passes over.
    pub fn next_weight_pruning(
        &mut self,
        cursor: Cursor<AccountId>,
    ) -> Result<Step<AccountId, Weights>, DripsError> {
        self.list.next_live_pruning(cursor, is_dead)
    }

    /// Read-only iterator over accounts with a non-zero weight.
    pub fn iter(&self) -> WeightsIter<'_, S> {
        WeightsIter {
            weights: self,
            cursor: Some(Cursor::start()),
        }
    }

    /// Prune the whole list, calling `visit` for every live account.
    pub fn prune_with(&mut self, visit: impl FnMut(AccountId, Weights)) -> Result<PruneSummary, DripsError> {
        let summary = self.list.prune_all(is_dead, visit)?;
        tracing::debug!(
            live = summary.live,
            removed = summary.removed,
            "pruned receiver weights"
        );
        Ok(summary)
    }

    /// Prune the whole list.
    pub fn prune(&mut self) -> Result<PruneSummary, DripsError> {
        self.prune_with(|_, _| {})
    }
}

/// Iterator returned by [`ReceiverWeights::iter`].
pub struct WeightsIter<'a, S> {
    weights: &'a ReceiverWeights<S>,
    cursor: Option<Cursor<AccountId>>,
}

impl<S: EntryStore<AccountId, Weights>> Iterator for WeightsIter<'_, S> {
    type Item = Result<(AccountId, Weights), DripsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        match self.weights.next_weight(cursor) {
            Ok(step) if step.is_end() => None,
            Ok(step) => {
                self.cursor = Some(step.cursor);
                Some(Ok((step.cursor.current, step.payload)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
