// Aggregation benchmarks
// Author: Gabriel Demetrios Lafis

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use site_performance_engine::{
    data::{DimensionName, MetricName, MetricRecord, MockGenerator},
    processing::{aggregate, redact, time_series},
};

fn records_for_days(days: i64) -> Vec<MetricRecord> {
    let end = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    let start = end - chrono::Duration::days(days - 1);
    MockGenerator::with_seed(7).generate(start, end)
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for days in [28, 90, 480] {
        let records = records_for_days(days);
        group.throughput(Throughput::Elements(records.len() as u64));

        group.bench_with_input(BenchmarkId::new("top_queries", days), &records, |b, records| {
            b.iter(|| aggregate(black_box(records), DimensionName::Query, MetricName::Clicks, 10))
        });

        group.bench_with_input(BenchmarkId::new("top_pages_by_position", days), &records, |b, records| {
            b.iter(|| aggregate(black_box(records), DimensionName::Page, MetricName::Position, 10))
        });

        group.bench_with_input(BenchmarkId::new("time_series", days), &records, |b, records| {
            b.iter(|| time_series(black_box(records)))
        });
    }

    group.finish();
}

fn bench_redact(c: &mut Criterion) {
    let records = records_for_days(480);

    c.bench_function("redact_480_days", |b| {
        b.iter(|| redact(black_box(records.clone()), "superapp.backend.apudsi.com"))
    });
}

criterion_group!(benches, bench_aggregate, bench_redact);
criterion_main!(benches);
