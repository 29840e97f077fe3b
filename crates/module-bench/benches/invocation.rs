// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for input materialization and module invocation.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hal::{Allocator, MemoryBudget};
use module_bench::materialize::{materialize, parse_entry};
use module_bench::{BenchmarkConfig, Invocation, Session};
use std::path::PathBuf;

fn module_path() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../testdata/simple_add.json"))
}

fn bench_materialize(c: &mut Criterion) {
    let entries = [
        parse_entry("64x64xf32=0.25").unwrap(),
        parse_entry("64x64xf32").unwrap(),
    ];
    let descriptors: Vec<_> = entries.iter().map(|e| e.descriptor.clone()).collect();
    let allocator = Allocator::new(MemoryBudget::unlimited());

    c.bench_function("materialize_64x64_pair", |b| {
        b.iter(|| materialize(&descriptors, &entries, &allocator).unwrap())
    });
}

fn bench_invoke(c: &mut Criterion) {
    let mut group = c.benchmark_group("invoke_mlp");
    for driver in ["vmla", "local-task"] {
        let config = BenchmarkConfig {
            input_file: Some(module_path()),
            entry_function: "mlp".into(),
            driver: driver.into(),
            inputs: vec!["4x8xf32=0.5".into(), "8x16xf32=0.125".into()],
            ..Default::default()
        };
        let session = Session::open(&config).unwrap();
        let warm = Invocation::prepare(&session, &config)
            .unwrap()
            .warm_up()
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(driver), &warm, |b, warm| {
            b.iter(|| warm.invoke().unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_materialize, bench_invoke);
criterion_main!(benches);
