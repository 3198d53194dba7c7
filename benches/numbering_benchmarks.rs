// Copyright 2025 Cowboy AI, LLC.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use livestock_movement::numbering::{format_document_number, DocumentNumberGenerator};
use livestock_movement::persistence::InMemorySequenceStore;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn setup_runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn benchmark_format(c: &mut Criterion) {
    c.bench_function("format_document_number", |b| {
        b.iter(|| format_document_number(black_box("PC-KW"), black_box(4_217)))
    });
}

fn benchmark_sequential_allocation(c: &mut Criterion) {
    let rt = setup_runtime();
    let numbers = DocumentNumberGenerator::new(Arc::new(InMemorySequenceStore::new()));

    c.bench_function("next_clearance_number", |b| {
        b.to_async(&rt)
            .iter(|| async { numbers.next_clearance_number(black_box("KW")).await.unwrap() })
    });
}

fn benchmark_concurrent_allocation(c: &mut Criterion) {
    let rt = setup_runtime();
    let mut group = c.benchmark_group("concurrent_permit_numbers");

    for tasks in [1usize, 8, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(tasks), &tasks, |b, &tasks| {
            let numbers = DocumentNumberGenerator::new(Arc::new(InMemorySequenceStore::new()));
            b.to_async(&rt).iter(|| {
                let numbers = numbers.clone();
                async move {
                    let handles: Vec<_> = (0..tasks)
                        .map(|_| {
                            let numbers = numbers.clone();
                            tokio::spawn(async move { numbers.next_permit_number(2026).await })
                        })
                        .collect();
                    for handle in handles {
                        handle.await.unwrap().unwrap();
                    }
                }
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_format,
    benchmark_sequential_allocation,
    benchmark_concurrent_allocation
);
criterion_main!(benches);
