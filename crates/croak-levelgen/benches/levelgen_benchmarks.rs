//! Level generation benchmarks.
//!
//! Measures a full terrain collapse at several square sizes under both
//! propagation policies, and a default-length path walk.
//!
//! Run with: `cargo bench --bench levelgen_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use croak_levelgen::prelude::*;
use croak_levelgen::PathBounds;

fn bench_terrain(c: &mut Criterion) {
    let mut group = c.benchmark_group("terrain_collapse");
    for radius in [3, 6, 12] {
        for propagation in [Propagation::Live, Propagation::PassStart] {
            let id = BenchmarkId::new(format!("{propagation:?}"), radius);
            group.bench_with_input(id, &radius, |b, &radius| {
                b.iter(|| {
                    let config = LevelConfig {
                        terrain_radius: radius,
                        propagation,
                        seed: Some(42),
                        ..LevelConfig::default()
                    };
                    black_box(LevelGenerator::generate(config))
                });
            });
        }
    }
    group.finish();
}

fn bench_path(c: &mut Criterion) {
    c.bench_function("path_walk_30", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let mut generator =
                PathGenerator::with_seed(seed).with_bounds(PathBounds::symmetric(5));
            black_box(generator.generate(-4, 4, Some(Direction::Up), 30, Path::new()))
        });
    });
}

criterion_group!(benches, bench_terrain, bench_path);
criterion_main!(benches);
