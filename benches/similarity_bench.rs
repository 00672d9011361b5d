//! Benchmarks for instance building and best-base search
//!
//! Run with: cargo bench --bench similarity_bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use datatrait::inference::Inferrer;
use datatrait::similarity::BaseMatcher;
use serde_json::{Value, json};

/// Generate documents that share most of their values
fn generate_documents(count: usize) -> Vec<(String, Value)> {
    (0..count)
        .map(|i| {
            let doc = json!({
                "id": format!("user-{}", i % 7),
                "isActive": i % 2 == 0,
                "age": 20 + (i % 5),
                "name": format!("User {}", i % 3),
                "tags": (0..(i % 4)).collect::<Vec<_>>(),
                "friends": [
                    {"id": 0, "name": "Colon Salazar"},
                    {"id": 1, "name": format!("Friend {}", i % 6)}
                ],
                "device": {"android": {"model": "pixel", "version": 10 + (i % 3)}}
            });
            (format!("doc{i:04}.json"), doc)
        })
        .collect()
}

fn build(docs: &[(String, Value)]) -> Inferrer {
    let mut inferrer = Inferrer::new();
    for (key, doc) in docs {
        inferrer.add_document(key, doc).unwrap();
    }
    inferrer
}

/// Benchmark instance building with varying document counts
fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");

    for count in [10, 100, 500].iter() {
        let docs = generate_documents(*count);
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("add_document", count), &docs, |b, docs| {
            b.iter(|| black_box(build(docs)));
        });
    }

    group.finish();
}

/// Benchmark the pairwise best-base search
fn bench_best_base(c: &mut Criterion) {
    let mut group = c.benchmark_group("best_base");

    for count in [10, 50, 200].iter() {
        let inferrer = build(&generate_documents(*count));
        group.throughput(Throughput::Elements(inferrer.instance_count() as u64));

        group.bench_with_input(
            BenchmarkId::new("search", count),
            &inferrer,
            |b, inferrer| {
                b.iter(|| {
                    let mut matcher = BaseMatcher::new(inferrer.registry(), inferrer.instances());
                    for instance in inferrer.instances() {
                        black_box(matcher.best_base_for(instance.id).unwrap());
                    }
                });
            },
        );
    }

    group.finish();
}

/// Benchmark the full run including collapsing and ordering
fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");

    for count in [10, 100].iter() {
        let docs = generate_documents(*count);

        group.bench_with_input(BenchmarkId::new("finalize", count), &docs, |b, docs| {
            b.iter(|| black_box(build(docs).finalize().unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_best_base, bench_finalize);
criterion_main!(benches);
