//! Benchmarks for query compilation and evaluation.
//!
//! Run with: cargo bench -p propwatch-core --bench query_bench

use std::collections::HashMap;
use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use propwatch_core::arena::TextArena;
use propwatch_core::search::{ColumnId, SearchQuery};

const QUERIES: &[(&str, &str)] = &[
    ("single_term", "health"),
    ("and_or", "(health | armor) !max"),
    ("columns", "health (value:>=3 | metadata:actor) size:>=10 size:<=100 cpptype:+int8"),
    ("regex", "r:\"^(max|min)_?speed$\""),
];

fn sample_row(i: usize) -> HashMap<ColumnId, String> {
    [
        (ColumnId::Name, format!("MaxHealth_{i}")),
        (ColumnId::Value, format!("{}", i % 250)),
        (ColumnId::Metadata, "Category:\n\tStats".to_owned()),
        (ColumnId::CppType, "int8".to_owned()),
        (ColumnId::Size, format!("{} B", i % 128)),
    ]
    .into_iter()
    .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("query/parse");
    for (name, query) in QUERIES {
        group.bench_with_input(BenchmarkId::from_parameter(name), query, |b, q| {
            b.iter(|| black_box(SearchQuery::parse(black_box(q))));
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let rows: Vec<_> = (0..1_000).map(sample_row).collect();
    let mut group = c.benchmark_group("query/evaluate_1k_rows");
    for (name, query) in QUERIES {
        let compiled = SearchQuery::parse(query);
        group.bench_function(*name, |b| {
            b.iter(|| rows.iter().filter(|row| compiled.evaluate(*row)).count());
        });
    }
    group.finish();
}

fn bench_arena(c: &mut Criterion) {
    c.bench_function("arena/row_texts_10k", |b| {
        let mut arena = TextArena::with_capacity(1 << 16);
        b.iter(|| {
            for i in 0..10_000 {
                let mark = arena.checkpoint();
                let name = arena.alloc_join(["Player", "Inventory", "Slot"], ".");
                let size = arena.alloc_fmt(format_args!("{} B", i % 64));
                black_box((arena.get(name), arena.get(size)));
                arena.rollback(mark);
            }
            arena.reset();
        });
    });
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_arena);
criterion_main!(benches);
