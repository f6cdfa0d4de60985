//! Criterion benchmarks for drips-core list operations.
//!
//! Covers: weight updates, delta additions, read-only iteration and pruning passes.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use drips_core::{AccountId, CycleDeltas, CycleId, ReceiverWeights};

fn random_accounts(count: usize) -> Vec<AccountId> {
    let mut rng = StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            let mut bytes = [0u8; 20];
            rng.fill(&mut bytes);
            bytes[0] |= 1; // never the root
            AccountId(bytes)
        })
        .collect()
}

fn populated_weights(accounts: &[AccountId]) -> ReceiverWeights {
    let mut weights = ReceiverWeights::in_memory();
    for (i, account) in accounts.iter().enumerate() {
        weights.set_receiver_weight(*account, (i % 3) as u32).unwrap();
    }
    weights
}

fn bench_set_weight(c: &mut Criterion) {
    let accounts = random_accounts(1_000);
    let mut weights = populated_weights(&accounts);

    c.bench_function("set_receiver_weight", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % accounts.len();
            weights.set_receiver_weight(black_box(accounts[i]), black_box(5)).unwrap()
        })
    });
}

fn bench_add_to_delta(c: &mut Criterion) {
    let mut deltas = CycleDeltas::in_memory();

    c.bench_function("add_to_delta", |b| {
        let mut cycle = 0u64;
        b.iter(|| {
            cycle = cycle % 1_000 + 1;
            deltas.add_to_delta(black_box(CycleId(cycle)), 10, -10).unwrap()
        })
    });
}

fn bench_iterate_weights(c: &mut Criterion) {
    let weights = populated_weights(&random_accounts(1_000));

    c.bench_function("iterate_weights_1000", |b| {
        b.iter(|| weights.iter().filter_map(Result::ok).count())
    });
}

fn bench_prune_weights(c: &mut Criterion) {
    let accounts = random_accounts(1_000);

    // A third of the entries are zeroed; only the pruning pass is timed.
    c.bench_function("prune_weights_1000", |b| {
        b.iter_batched(
            || populated_weights(&accounts),
            |mut weights| weights.prune().unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_prune_deltas(c: &mut Criterion) {
    c.bench_function("prune_deltas_1000", |b| {
        b.iter_batched(
            || {
                let mut deltas = CycleDeltas::in_memory();
                for cycle in 1..=1_000u64 {
                    deltas.add_to_delta(CycleId(cycle), 1, -1).unwrap();
                }
                deltas
            },
            |mut deltas| deltas.prune(black_box(CycleId(500))).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_set_weight,
    bench_add_to_delta,
    bench_iterate_weights,
    bench_prune_weights,
    bench_prune_deltas,
);
criterion_main!(benches);
