#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion};
use ubiquity::Mapper;
use ubiquity_benchmark::{BenchConfig, Order, copy_by_hand, create_order};

#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn bench_order_copy(c: &mut Criterion) {
    let order = create_order();
    let mut group = c.benchmark_group("order_copy");

    // every iteration pays for descriptors, plans and routine compilation
    group.bench_function("cold_cache", |b| {
        b.iter_batched(
            Mapper::<BenchConfig>::with_config,
            |mapper| {
                let copy: Order = mapper.map(black_box(&order)).unwrap();
                copy
            },
            BatchSize::SmallInput,
        );
    });

    let mapper = Mapper::<BenchConfig>::with_config();
    let _: Order = mapper.map(&order).unwrap();

    group.bench_function("warm_cache", |b| {
        b.iter(|| {
            let copy: Order = mapper.map(black_box(&order)).unwrap();
            copy
        });
    });

    group.bench_function("warm_cache_map_into", |b| {
        let mut destination = Order::default();
        b.iter(|| {
            mapper.map_into(black_box(&order), &mut destination).unwrap();
        });
    });

    group.bench_function("by_hand", |b| {
        b.iter(|| copy_by_hand(black_box(&order)));
    });

    group.bench_function("clone", |b| {
        b.iter(|| black_box(&order).clone());
    });

    group.finish();
}

criterion::criterion_group!(benches, bench_order_copy);
criterion::criterion_main!(benches);
