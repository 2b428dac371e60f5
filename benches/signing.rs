//! Hot-path benchmarks: workspace resolution and SharedKey signing.
//!
//! # Usage
//! ```bash
//! cargo bench --bench signing
//! ```

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use data_proxy::config::WorkspaceEntry;
use data_proxy::registry::WorkspaceRegistry;
use data_proxy::signature::{SignedRequest, rfc1123_timestamp};

const SECRET: &str = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";
const TS: &str = "Mon, 02 Jan 2006 15:04:05 GMT";

fn registry(size: usize) -> (WorkspaceRegistry, Vec<String>) {
    let entries: Vec<WorkspaceEntry> = (0..size)
        .map(|i| WorkspaceEntry {
            id: format!("{i:08x}-0000-4000-8000-000000000000"),
            name: format!("team-{i}"),
            secret: SECRET.to_string(),
        })
        .collect();
    let ids = entries.iter().map(|e| e.id.clone()).collect();
    let registry = WorkspaceRegistry::build(&entries).expect("valid entries");
    (registry, ids)
}

/// Sign one request across payload sizes. Only the length enters the MAC.
fn bench_sign(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature/sign");
    for len in [0usize, 1_024, 1_048_576] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| {
                SignedRequest::new(
                    black_box("00000000-0000-4000-8000-000000000000"),
                    black_box(len),
                    TS.to_string(),
                    SECRET,
                )
            })
        });
    }
    group.finish();

    c.bench_function("signature/timestamp", |b| {
        b.iter(|| rfc1123_timestamp(black_box(chrono::Utc::now())))
    });
}

/// Resolve by id and by name against registries of increasing size.
fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry/resolve");
    group.throughput(Throughput::Elements(1));
    for size in [1usize, 100, 10_000] {
        let (registry, ids) = registry(size);
        let id = ids[size / 2].clone();
        let name = format!("team-{}", size / 2);

        group.bench_with_input(BenchmarkId::new("id", size), &id, |b, id| {
            b.iter(|| registry.resolve(black_box(id)).map(|w| w.id().len()))
        });
        group.bench_with_input(BenchmarkId::new("name", size), &name, |b, name| {
            b.iter(|| registry.resolve(black_box(name)).map(|w| w.id().len()))
        });
        group.bench_function(BenchmarkId::new("miss", size), |b| {
            b.iter(|| registry.resolve(black_box("nope")).is_none())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sign, bench_resolve);
criterion_main!(benches);
