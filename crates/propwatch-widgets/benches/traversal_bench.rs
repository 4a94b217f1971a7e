//! Benchmarks for the row traversal over the mock host.
//!
//! Run with: cargo bench -p propwatch-widgets --bench traversal_bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use propwatch_core::arena::TextArena;
use propwatch_core::item::PropertyItem;
use propwatch_core::mock::{MockField, MockHost};
use propwatch_core::reflect::{FieldKind, Value};
use propwatch_core::search::SearchQuery;
use propwatch_widgets::harness::RecordingSubstrate;
use propwatch_widgets::inspector::column;
use propwatch_widgets::tree_view::{TreeOptions, TreeState};

/// A chain of `len` nodes, each with a handful of scalars and a `Next`
/// pointer to the following node.
fn chain(len: usize) -> (MockHost, PropertyItem) {
    let mut host = MockHost::new();
    let mut fields: Vec<_> = (0..6)
        .map(|i| host.add_field(MockField::new(format!("Stat{i}"), FieldKind::Float).owner("Node")))
        .collect();
    let label = host.add_field(MockField::new("Label", FieldKind::Str).owner("Base"));
    let next = host.add_field(MockField::new("Next", FieldKind::Object).owner("Base"));
    fields.extend([label, next]);
    let class = host.add_class("Node", &fields);

    let nodes: Vec<_> = (0..len)
        .map(|i| host.spawn(class, &format!("Node_{i}")))
        .collect();
    for (i, pair) in nodes.windows(2).enumerate() {
        host.set_object(pair[0], next, pair[1]);
        host.set_value(pair[0], label, Value::Str(format!("node {i}")));
    }
    (host, PropertyItem::object(nodes[0]))
}

/// Open everything once so later passes walk the whole chain.
fn opened(host: &MockHost, root: &PropertyItem, options: TreeOptions) -> RecordingSubstrate {
    let mut ui = RecordingSubstrate::new(column::COUNT);
    let query = SearchQuery::default();
    let mut arena = TextArena::new();
    ui.toggle_bulk("Node_0", 0);
    TreeState::new(host, &query, options).draw_item_row(&mut ui, &mut arena, root, 0);
    ui
}

fn bench_open_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal/open_chain");
    for len in [8usize, 32] {
        let (host, root) = chain(len);
        let options = TreeOptions {
            default_bulk_depth: len * 4,
            ..TreeOptions::default()
        };
        let mut ui = opened(&host, &root, options);
        let query = SearchQuery::default();
        let mut arena = TextArena::new();
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, _| {
            b.iter(|| {
                ui.clear_frame();
                let mut state = TreeState::new(&host, &query, options);
                state.draw_item_row(&mut ui, &mut arena, &root, 0);
                black_box(state.rows_drawn())
            });
        });
    }
    group.finish();
}

fn bench_filtered(c: &mut Criterion) {
    let (host, root) = chain(32);
    let options = TreeOptions {
        default_bulk_depth: 128,
        filter_active: true,
        ..TreeOptions::default()
    };
    let mut ui = opened(&host, &root, options);
    let mut arena = TextArena::new();
    let mut group = c.benchmark_group("traversal/filtered_32");
    for (name, query) in [("name", "stat3"), ("value", "label value:node")] {
        let query = SearchQuery::parse(query);
        group.bench_function(name, |b| {
            b.iter(|| {
                ui.clear_frame();
                let mut state = TreeState::new(&host, &query, options);
                state.draw_item_row(&mut ui, &mut arena, &root, 0);
                black_box(state.rows_drawn())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_open_chain, bench_filtered);
criterion_main!(benches);
