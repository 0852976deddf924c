use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use timegrain::accumulate::CategoryTree;
use timegrain::{Accumulator, Aggregation, DataSeries, Quantity};

const REGIONS: [&str; 4] = ["north", "south", "east", "west"];
const PRODUCTS: [&str; 3] = ["widget", "gadget", "gizmo"];

fn base_instant() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .unwrap()
        .and_time(NaiveTime::MIN)
}

/// One row per hour, cycling through region and product labels.
fn create_hourly_rows(count: usize) -> (DataSeries, DataSeries, DataSeries, DataSeries) {
    let base = base_instant();
    let temporal = DataSeries::temporal((0..count).map(|i| base + Duration::hours(i as i64)));
    let regions = DataSeries::categorical((0..count).map(|i| REGIONS[i % REGIONS.len()]));
    let products = DataSeries::categorical((0..count).map(|i| PRODUCTS[i % PRODUCTS.len()]));
    let values = DataSeries::numerical((0..count).map(|i| 100.0 + (i as f64 * 0.5)));
    (temporal, regions, products, values)
}

fn bench_accumulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulation");

    for size in [100, 1000, 10000].iter() {
        let (temporal, regions, products, values) = create_hourly_rows(*size);
        let accumulator = Accumulator::new(temporal)
            .with_category(regions)
            .with_category(products)
            .with_quantity(
                Quantity::new(values.with_name("value"))
                    .with_aggregation(Aggregation::CumulativeSum),
            );

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(accumulator.accumulate().unwrap()));
        });
    }

    group.finish();
}

fn bench_policies(c: &mut Criterion) {
    let mut group = c.benchmark_group("policies");
    let size = 10000;

    let policies = [
        ("identity", Aggregation::Identity),
        ("last_value", Aggregation::LastValue),
        ("max_value", Aggregation::MaxValue),
        ("cumulative_sum", Aggregation::CumulativeSum),
        ("moving_average", Aggregation::MovingAverage { window: 7 }),
    ];

    for (name, policy) in policies.iter() {
        let (temporal, regions, _, values) = create_hourly_rows(size);
        let accumulator = Accumulator::new(temporal)
            .with_category(regions)
            .with_quantity(Quantity::new(values.with_name("value")).with_aggregation(*policy));

        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, _| {
            b.iter(|| black_box(accumulator.accumulate().unwrap()));
        });
    }

    group.finish();
}

fn bench_grouping(c: &mut Criterion) {
    let mut group = c.benchmark_group("grouping");

    for size in [100, 1000, 10000].iter() {
        let (_, regions, products, _) = create_hourly_rows(*size);
        let categories = vec![regions, products];

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| black_box(CategoryTree::build(&categories, *size)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_accumulation, bench_policies, bench_grouping);
criterion_main!(benches);
