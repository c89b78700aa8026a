//! Change-set benchmarks
//!
//! Diff cost for orders with many lines, where only a few were added while
//! recording.
//!
//! Run with: `cargo bench --bench changes`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tillsync_core::{Amount, Credit, Item, LineId, Order, ProductId, RoomId, RoomSelection};

fn item(n: usize) -> Item {
    Item {
        uid: LineId::random(),
        product_id: ProductId::new(format!("p{n}")),
        product_name: format!("Product {n}"),
        variant_name: None,
        price: Amount(100 + n as i64),
        quantity: 1,
        taxes: vec![],
    }
}

fn order_with_lines(lines: usize) -> Order {
    let mut order = Order::new();
    for n in 0..lines {
        order.add_item(item(n));
        order.add_credit(Credit::new(Amount(1), "promo"));
    }
    for n in 0..lines / 10 {
        order.add_room_selection(RoomSelection::new(RoomId::new(format!("room-{n}")), 0, 10));
    }
    order
}

fn bench_changes(c: &mut Criterion) {
    let mut group = c.benchmark_group("changes");

    for lines in [10usize, 100, 1000] {
        let mut order = order_with_lines(lines);
        order.record_changes();
        order.add_item(item(lines));
        order.set_note("edited");

        group.bench_with_input(BenchmarkId::new("diff", lines), &order, |b, order| {
            b.iter(|| black_box(order.changes()))
        });
    }

    group.finish();
}

fn bench_record(c: &mut Criterion) {
    let order = order_with_lines(1000);

    c.bench_function("record_and_revert_1000", |b| {
        b.iter(|| {
            let mut order = order.clone();
            order.record_changes();
            order.add_item(item(0));
            order.revert_changes();
            black_box(order)
        })
    });
}

criterion_group!(benches, bench_changes, bench_record);
criterion_main!(benches);
