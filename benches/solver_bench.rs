//! Exact-solve latency on generated candidate pools, with and without the result cache.
//!
//! Run with: `cargo bench --bench solver`

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use roster_optimizer::data::{Attributes, Candidate, Role, ScoredDataset};
use roster_optimizer::optimizer::{
    OptimizationEngine, OptimizationRequest, OptimizationService, ResultCache, Strategy,
};

/// Deterministic pool: prices 5.0..=14.5 in half steps, scores loosely tied to price.
fn pool(size: usize) -> ScoredDataset {
    let roles = [Role::Wk, Role::Bat, Role::Bowl, Role::All];
    let mut state = 0x9e37_79b9_7f4a_7c15_u64;
    ScoredDataset::new(
        (0..size)
            .map(|i| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                let price = 5.0 + (state % 20) as f64 * 0.5;
                let score = price * 18.0 + (state >> 20) as f64 % 120.0;
                Candidate {
                    id: format!("p{i}"),
                    role: roles[i % roles.len()],
                    price,
                    attributes: Attributes::default(),
                    score,
                }
            })
            .collect(),
    )
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");
    group.sample_size(30);

    for size in [22_usize, 60, 120] {
        let dataset = pool(size);
        for strategy in [Strategy::MaxScore, Strategy::MaxScorePerCost] {
            let request = OptimizationRequest::new(100.0, 11, strategy);
            group.bench_with_input(
                BenchmarkId::new(strategy.as_str(), size),
                &request,
                |b, request| {
                    let engine = OptimizationEngine::default();
                    b.iter(|| black_box(engine.optimize(black_box(request), &dataset)))
                },
            );
        }
    }
    group.finish();
}

fn bench_cached_service(c: &mut Criterion) {
    let dataset = pool(120);
    let request = OptimizationRequest::new(100.0, 11, Strategy::MaxScore);
    let service =
        OptimizationService::new(OptimizationEngine::default(), Arc::new(ResultCache::default()));
    let _ = service.run(&request, &dataset);

    c.bench_function("service_cache_hit_120", |b| {
        b.iter(|| black_box(service.run(black_box(&request), &dataset)))
    });
}

criterion_group!(benches, bench_engine, bench_cached_service);
criterion_main!(benches);
