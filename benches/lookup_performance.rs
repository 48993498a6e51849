//! Lookup benchmarks for overlay-config.
//!
//! Covers the hot read paths:
//! - Scalar lookups across many ranked sources
//! - Lookups through the profile and expression interceptors
//! - Wildcard matching against declared names
//! - Environment variable spellings

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use overlay_config::names::NameMatcherIndex;
use overlay_config::prelude::*;
use overlay_config::sources::{EnvSource, MapSource};
use std::sync::Arc;
use std::thread;

fn layered(sources: usize) -> Config {
    let mut builder = Config::builder().with_expressions(false);
    for i in 0..sources {
        let mut pairs = vec![(format!("layer{}.value", i), i.to_string())];
        if i == 0 {
            pairs.push(("bottom".to_string(), "found".to_string()));
        }
        builder = builder.with_source(MapSource::new(format!("layer-{}", i), pairs).with_ordinal(100 + i as i32));
    }
    builder.build().unwrap()
}

/// Benchmark a lookup that falls through every source
fn benchmark_ranked_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranked_lookup");
    for sources in [1, 4, 16] {
        let config = layered(sources);
        group.bench_with_input(BenchmarkId::from_parameter(sources), &config, |b, config| {
            b.iter(|| black_box(config.get_config_value(black_box("bottom"))));
        });
    }
    group.finish();
}

/// Benchmark lookups through the default interceptor chain
fn benchmark_interceptor_chain(c: &mut Criterion) {
    let config = Config::builder()
        .with_source(MapSource::new("app", [
            ("host", "localhost"),
            ("port", "8080"),
            ("%dev.host", "dev.local"),
            ("url", "http://${host}:${port}/api"),
        ]))
        .with_profile("dev")
        .build()
        .unwrap();

    let mut group = c.benchmark_group("interceptor_chain");
    group.bench_function("profiled_value", |b| {
        b.iter(|| black_box(config.get_value::<String>(black_box("host")).unwrap()));
    });
    group.bench_function("expression_value", |b| {
        b.iter(|| black_box(config.get_value::<String>(black_box("url")).unwrap()));
    });
    group.bench_function("inline_list", |b| {
        let config = Config::builder()
            .with_source(MapSource::new("app", [("hosts", "a,b,c,d,e")]))
            .build()
            .unwrap();
        b.iter(|| black_box(config.get_values::<String>(black_box("hosts")).unwrap()));
    });
    group.finish();
}

/// Benchmark matching names against declared patterns
fn benchmark_matcher_index(c: &mut Criterion) {
    let patterns: Vec<String> = (0..200)
        .flat_map(|i| {
            [
                format!("service{}.host", i),
                format!("service{}.routes[*].path", i),
                format!("service{}.labels.*", i),
            ]
        })
        .collect();
    let index = NameMatcherIndex::new(&patterns);

    let mut group = c.benchmark_group("matcher_index");
    group.bench_function("literal_hit", |b| {
        b.iter(|| black_box(index.matches(black_box("service150.host"))));
    });
    group.bench_function("wildcard_hit", |b| {
        b.iter(|| black_box(index.matches(black_box("service150.routes[3].path"))));
    });
    group.bench_function("miss", |b| {
        b.iter(|| black_box(index.matches(black_box("service150.unknown.name"))));
    });
    group.finish();
}

/// Benchmark environment lookups by dotted name
fn benchmark_env_lookup(c: &mut Criterion) {
    let vars: Vec<(String, String)> = (0..500)
        .map(|i| (format!("APP_SETTING_{}_VALUE", i), i.to_string()))
        .collect();
    let config = Config::builder().with_env_source(EnvSource::from_vars(vars)).build().unwrap();

    let mut group = c.benchmark_group("env_lookup");
    group.bench_function("dotted_name", |b| {
        b.iter(|| black_box(config.get_config_value(black_box("app.setting.250.value"))));
    });
    group.bench_function("kebab_name", |b| {
        b.iter(|| black_box(config.get_config_value(black_box("app.setting-250-value"))));
    });
    group.finish();
}

/// Benchmark concurrent reads of a shared configuration
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");
    for threads in [1, 4, 8] {
        let config = Arc::new(layered(8));
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let config = Arc::clone(&config);
                        thread::spawn(move || {
                            for _ in 0..100 {
                                black_box(config.get_config_value("bottom"));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_ranked_lookup,
    benchmark_interceptor_chain,
    benchmark_matcher_index,
    benchmark_env_lookup,
    benchmark_concurrent_reads
);
criterion_main!(benches);
