use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use criterion::{criterion_group, criterion_main, BatchSize, Criterion};

use substrate_core::traits::ManualClock;
use substrate_core::SubstrateConfig;
use substrate_engine::CycleEngine;
use substrate_storage::{InMemoryBackend, MemoryFailureLog};
use test_fixtures::{add_entities, seeded_graph};

fn engine_with(nodes: usize, links: usize) -> (CycleEngine, ManualClock) {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(t0);
    let mut engine = CycleEngine::new(
        SubstrateConfig::default(),
        Arc::new(InMemoryBackend::new()),
        Arc::new(MemoryFailureLog::new()),
    )
    .unwrap()
    .with_clock(Arc::new(clock.clone()));
    let mut state = seeded_graph(nodes, links, 7, t0);
    add_entities(&mut state, nodes / 20, 1);
    engine.seed(state).unwrap();
    (engine, clock)
}

fn bench_cycle(c: &mut Criterion) {
    for (nodes, links) in [(100, 200), (1_000, 3_000)] {
        c.bench_function(&format!("cycle_{nodes}_nodes_{links}_links"), |b| {
            b.iter_batched(
                || engine_with(nodes, links),
                |(mut engine, clock)| {
                    clock.advance(Duration::seconds(1));
                    engine.run_cycle().unwrap();
                },
                BatchSize::LargeInput,
            );
        });
    }
}

criterion_group!(benches, bench_cycle);
criterion_main!(benches);
