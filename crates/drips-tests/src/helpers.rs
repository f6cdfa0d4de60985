//! Shared test helpers: key constructors and reference models.

use std::collections::BTreeMap;

use drips_core::store::EntryStore;
use drips_core::types::{AccountId, CycleId, Deltas, Weights};
use drips_core::{CycleDeltas, ReceiverWeights};

/// Account from a seed byte. Seed 0 yields the root sentinel.
pub fn acct(seed: u8) -> AccountId {
    AccountId([seed; 20])
}

/// A weight update applied to a [`ReceiverWeights`] list.
#[derive(Clone, Copy, Debug)]
pub enum WeightOp {
    Receiver { seed: u8, weight: u32 },
    Proxy { seed: u8, weight: u32 },
}

/// Expected weights, keyed by account, ignoring list order.
#[derive(Clone, Debug, Default)]
pub struct WeightsModel {
    weights: BTreeMap<AccountId, Weights>,
}

impl WeightsModel {
    pub fn apply(&mut self, op: WeightOp) {
        match op {
            WeightOp::Receiver { seed, weight } => {
                self.weights.entry(acct(seed)).or_default().receiver = weight;
            }
            WeightOp::Proxy { seed, weight } => {
                self.weights.entry(acct(seed)).or_default().proxy = weight;
            }
        }
    }

    /// Accounts with at least one non-zero weight.
    pub fn live(&self) -> BTreeMap<AccountId, Weights> {
        self.weights
            .iter()
            .filter(|(_, w)| w.receiver != 0 || w.proxy != 0)
            .map(|(k, w)| (*k, *w))
            .collect()
    }
}

/// Apply `op` to a list.
pub fn apply_op<S: EntryStore<AccountId, Weights>>(list: &mut ReceiverWeights<S>, op: WeightOp) {
    match op {
        WeightOp::Receiver { seed, weight } => {
            list.set_receiver_weight(acct(seed), weight).unwrap();
        }
        WeightOp::Proxy { seed, weight } => {
            list.set_proxy_weight(acct(seed), weight).unwrap();
        }
    }
}

/// Apply `op` to both the list and the model.
pub fn apply_weight<S: EntryStore<AccountId, Weights>>(
    list: &mut ReceiverWeights<S>,
    model: &mut WeightsModel,
    op: WeightOp,
) {
    apply_op(list, op);
    model.apply(op);
}

/// Read-only traversal of a weights list, one entry per visited account.
pub fn visited<S: EntryStore<AccountId, Weights>>(list: &ReceiverWeights<S>) -> Vec<(AccountId, Weights)> {
    list.iter().map(|item| item.unwrap()).collect()
}

/// Expected per-cycle totals.
#[derive(Clone, Debug, Default)]
pub struct DeltasModel {
    deltas: BTreeMap<CycleId, Deltas>,
}

impl DeltasModel {
    pub fn add(&mut self, cycle: u64, this_cycle: i128, next_cycle: i128) {
        let entry = self.deltas.entry(CycleId(cycle)).or_default();
        entry.this_cycle += this_cycle;
        entry.next_cycle += next_cycle;
    }

    /// Cycles a pass with `finished` would return.
    pub fn pending(&self, finished: u64) -> BTreeMap<CycleId, Deltas> {
        self.deltas
            .iter()
            .filter(|(cycle, d)| cycle.0 >= finished && (d.this_cycle != 0 || d.next_cycle != 0))
            .map(|(k, d)| (*k, *d))
            .collect()
    }

    /// Forget everything a pruning pass with `finished` removes.
    pub fn prune(&mut self, finished: u64) {
        self.deltas = self.pending(finished);
    }
}

/// Read-only traversal of a deltas list.
pub fn pending<S: EntryStore<CycleId, Deltas>>(list: &CycleDeltas<S>, finished: u64) -> Vec<(CycleId, Deltas)> {
    list.iter(CycleId(finished)).map(|item| item.unwrap()).collect()
}
