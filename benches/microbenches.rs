//! Criterion microbenches for key dispatch and failure classification.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Key normalization and scheme parsing (normalize_key, parse_scheme)
//! - Resolver dispatch through a registry of trivial handlers
//! - Download failure classification (classify_failure)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use datagrab::download::{classify_failure, DownloadError};
use datagrab::resolve::{normalize_key, parse_scheme};
use datagrab::{Content, Resolver};

const KEYS: &[&str] = &[
    "/var/data/life-expectancy.csv",
    "file:///var/data/",
    "https://ourworldindata.org/grapher/life-expectancy.metadata.json",
    "hf://org/dataset/data/train.csv",
    "fixtures.samples.greeting",
];

/// Benchmark key normalization plus scheme parsing.
fn bench_parse_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("keys");
    group.throughput(Throughput::Elements(KEYS.len() as u64));

    group.bench_function("normalize_and_parse", |b| {
        b.iter(|| {
            for key in KEYS {
                let normalized = normalize_key(black_box(key));
                black_box(parse_scheme(&normalized).map(|(scheme, _)| scheme.len()));
            }
        })
    });

    group.finish();
}

/// Benchmark full dispatch with handlers that do no I/O.
fn bench_dispatch(c: &mut Criterion) {
    let mut resolver = Resolver::default();
    for scheme in ["file", "hf", "http", "https", "s3", "gs"] {
        resolver.register(scheme, |_| Ok(Content::Bytes(Vec::new())));
    }

    let mut group = c.benchmark_group("dispatch");
    group.bench_function("resolve_https", |b| {
        b.iter(|| {
            let content = resolver
                .resolve(black_box("https://ourworldindata.org/grapher/x.csv"))
                .unwrap();
            black_box(content)
        })
    });
    group.finish();
}

/// Benchmark failure classification on typical server messages.
fn bench_classify(c: &mut Criterion) {
    let url = "https://ourworldindata.org/grapher/x.csv";
    let errors = vec![
        DownloadError::with_status(url, 403, "HTTP 403 Forbidden"),
        DownloadError::with_status(
            url,
            403,
            "HTTP 403 Forbidden: This chart contains non-redistributable data",
        ),
        DownloadError::with_status(url, 500, "HTTP 500 Internal Server Error"),
        DownloadError::new(url, "connection reset by peer"),
    ];

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(errors.len() as u64));
    group.bench_function("classify_failure", |b| {
        b.iter(|| {
            for err in &errors {
                black_box(classify_failure(black_box(err)));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_parse_keys, bench_dispatch, bench_classify);
criterion_main!(benches);
