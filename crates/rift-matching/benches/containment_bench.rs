use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rift_matching::{
    contains_all, contains_subset, lists_equal, KeyAndValue, KeyMatchStyle, MatchContext,
    MultiValueContainer, PatternString, SilentObserver,
};
use std::sync::Arc;

fn quiet() -> MatchContext {
    MatchContext::data_plane().with_observer(Arc::new(SilentObserver))
}

fn request_headers(count: usize) -> Vec<KeyAndValue> {
    (0..count)
        .map(|i| {
            KeyAndValue::new(
                PatternString::literal(format!("X-Header-{i}")),
                PatternString::literal(format!("value-{i}")),
            )
        })
        .collect()
}

fn literal_matcher(count: usize) -> Vec<KeyAndValue> {
    (0..count)
        .map(|i| {
            KeyAndValue::new(
                PatternString::literal(format!("x-header-{}", i * 3)),
                PatternString::literal(format!("value-{}", i * 3)),
            )
        })
        .collect()
}

fn regex_matcher(count: usize) -> Vec<KeyAndValue> {
    (0..count)
        .map(|i| {
            KeyAndValue::new(
                PatternString::regex(format!("x-header-{}[0-9]*", i)),
                PatternString::regex("value-[0-9]+"),
            )
        })
        .collect()
}

fn bench_subset_literal(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset_literal");
    let ctx = quiet();

    for size in [10, 25, 50] {
        let matched = request_headers(size);
        let matcher = literal_matcher(size / 5);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| contains_subset(black_box(&matcher), black_box(&matched), &ctx));
        });
    }

    group.finish();
}

fn bench_subset_regex(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset_regex");
    let ctx = quiet();

    for size in [10, 25, 50] {
        let matched = request_headers(size);
        let matcher = regex_matcher(size / 5);
        // compile once outside the measured loop
        contains_subset(&matcher, &matched, &ctx);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| contains_subset(black_box(&matcher), black_box(&matched), &ctx));
        });
    }

    group.finish();
}

fn bench_matching_key(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching_key");
    let ctx = quiet().with_style(KeyMatchStyle::MatchingKey);

    let matcher = MultiValueContainer::from_entries(
        ctx.clone(),
        (0..5).map(|i| (format!("x-header-{i}"), "value-[0-9]+".to_string())),
    )
    .unwrap();
    let matched = MultiValueContainer::from_entries(
        ctx.clone(),
        request_headers(50).into_iter().map(|e| (e.key, e.value)),
    )
    .unwrap();

    group.bench_function("containers_50", |b| {
        b.iter(|| contains_all(Some(black_box(&matcher)), Some(black_box(&matched)), &ctx));
    });

    group.finish();
}

fn bench_lists_equal(c: &mut Criterion) {
    let mut group = c.benchmark_group("lists_equal");
    let ctx = quiet();

    for size in [4, 8, 16] {
        let matched = request_headers(size);
        let mut matcher = matched.clone();
        matcher.reverse();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| lists_equal(black_box(&matcher), black_box(&matched), &ctx));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_subset_literal,
    bench_subset_regex,
    bench_matching_key,
    bench_lists_equal
);
criterion_main!(benches);
