mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use event_sampler::prelude::*;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

/// Fire the next event and reschedule it, as the next-reaction method does.
fn next_reaction_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/next_reaction");

    for &n in &common::SIZES {
        let propensities = common::spread_weights(n, 0xC0FFEE);
        group.throughput(common::elements_throughput(1));

        group.bench_with_input(BenchmarkId::new("hashing", n), &n, |b, &n| {
            let mut rng = StdRng::seed_from_u64(0xDEADBEEF);
            let mut queue = HashingQueue::new(n);
            for (i, &a) in propensities.iter().enumerate() {
                queue.push(i, -rng.random::<f64>().ln() / a);
            }
            b.iter(|| {
                let index = queue.top(&propensities);
                let now = queue.get(index);
                queue.push_top(now - rng.random::<f64>().ln() / propensities[index]);
                black_box(index);
            });
        });

        group.bench_with_input(BenchmarkId::new("placebo", n), &n, |b, &n| {
            let mut queue = PlaceboQueue::new(n);
            for i in 0..n {
                queue.push(i, 0.0);
            }
            b.iter(|| {
                let index = queue.top(&propensities);
                queue.push_top(0.0);
                black_box(index);
            });
        });
    }

    group.finish();
}

fn churn_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue/set_then_top");

    for &load in &[0.5f64, 2.0, 8.0] {
        let n = 4096usize;
        let propensities = common::spread_weights(n, 0x12345678);
        let config = HashingConfig::default().with_target_load(load);
        group.throughput(common::elements_throughput(1));

        group.bench_with_input(BenchmarkId::new("target_load", load), &load, |b, _| {
            let mut rng = StdRng::seed_from_u64(0x87654321);
            let mut queue = HashingQueue::with_config(n, config).expect("valid config");
            for i in 0..n {
                queue.push(i, rng.random::<f64>());
            }
            b.iter(|| {
                let index = queue.top(&propensities);
                let now = queue.get(index);
                let other = rng.random_range(0..n);
                queue.set(other, now + rng.random::<f64>());
                queue.push_top(now + rng.random::<f64>());
                black_box(index);
            });
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = next_reaction_benches, churn_benches
}
criterion_main!(benches);
