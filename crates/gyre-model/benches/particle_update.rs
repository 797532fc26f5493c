//! Criterion micro-benchmarks for the particle system.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use gyre_core::SimulationEngine;
use gyre_model::ParticleSystem;

/// Benchmark: one update of the default 100-particle dashboard system.
fn bench_update_100(c: &mut Criterion) {
    let mut sys = ParticleSystem::new(100, 100.0).unwrap();
    c.bench_function("particle_update_100", |b| {
        b.iter(|| {
            let _ = black_box(sys.update(black_box(0.1)));
        });
    });
}

/// Benchmark: one update at the dashboard's 1000-particle ceiling.
fn bench_update_1000(c: &mut Criterion) {
    let mut sys = ParticleSystem::new(1000, 2500.0).unwrap();
    c.bench_function("particle_update_1000", |b| {
        b.iter(|| {
            let _ = black_box(sys.update(black_box(0.1)));
        });
    });
}

/// Benchmark: construct a fresh system, as a reset does.
fn bench_construct_1000(c: &mut Criterion) {
    c.bench_function("particle_construct_1000", |b| {
        b.iter(|| black_box(ParticleSystem::new(1000, 2500.0).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_update_100,
    bench_update_1000,
    bench_construct_1000
);
criterion_main!(benches);
