//! Benchmarks for write propagation
//!
//! These benchmarks measure:
//! - A primitive write resolved against a document of N bound elements
//! - A composite write cascading into every bound leaf below it
//! - The same composite rewritten repeatedly inside one batch

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use tether_core::{Binder, Document, Value};

fn fixture(rows: usize) -> Binder {
    let doc = Document::new();
    let table = doc.create_element("table");
    doc.append_child(doc.body(), table).ok();

    let mut state = serde_json::Map::new();
    for i in 0..rows {
        let row = doc.create_element("tr");
        for field in ["name", "price"] {
            let path = format!("rows.{i}.{field}");
            let cell = doc.create_element_with("td", &[("data-bind", path.as_str())]);
            doc.append_child(row, cell).ok();
        }
        doc.append_child(table, row).ok();
        state.insert(i.to_string(), json!({ "name": format!("item {i}"), "price": i }));
    }

    let binder = Binder::new(doc, Value::from(json!({ "rows": state }))).expect("valid state");
    binder.init();
    binder.flush_mutations();
    binder
}

fn rows_value(rows: usize, generation: usize) -> Value {
    let mut map = serde_json::Map::new();
    for i in 0..rows {
        map.insert(i.to_string(), json!({ "name": format!("item {i}"), "price": i + generation }));
    }
    Value::from(serde_json::Value::Object(map))
}

fn bench_leaf_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaf_write");
    for rows in [10, 100, 500] {
        let binder = fixture(rows);
        let mut n = 0i64;
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                n += 1;
                binder.set("rows.0.price", black_box(n)).ok();
            })
        });
    }
    group.finish();
}

fn bench_composite_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("composite_cascade");
    for rows in [10, 100] {
        let binder = fixture(rows);
        let mut generation = 0;
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                generation += 1;
                binder.set("rows", rows_value(rows, generation)).ok();
            })
        });
    }
    group.finish();
}

fn bench_batched_rewrites(c: &mut Criterion) {
    let binder = fixture(100);
    c.bench_function("batched_rewrites_100x10", |b| {
        b.iter(|| {
            binder.batch(|store| {
                for generation in 0..10 {
                    store.set("rows", rows_value(100, generation)).ok();
                }
            });
        })
    });
}

criterion_group!(benches, bench_leaf_write, bench_composite_cascade, bench_batched_rewrites);
criterion_main!(benches);
