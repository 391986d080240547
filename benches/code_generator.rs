//! 短码生成性能基准测试

use std::collections::HashSet;

use criterion::{Criterion, criterion_group, criterion_main};
use snaplink::config::CodesConfig;
use snaplink::services::CodeGenerator;

fn bench_generate_one(c: &mut Criterion) {
    let generator = CodeGenerator::from_config(&CodesConfig::default()).expect("valid config");

    let mut group = c.benchmark_group("code_generator/generate_one");
    group.bench_function("default_7", |b| {
        b.iter(|| generator.generate_one());
    });

    let long = CodeGenerator::new(
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789",
        16,
        5,
    )
    .expect("valid config");
    group.bench_function("base62_16", |b| {
        b.iter(|| long.generate_one());
    });
    group.finish();
}

fn bench_generate_with_taken_set(c: &mut Criterion) {
    let generator = CodeGenerator::from_config(&CodesConfig::default()).expect("valid config");
    let taken: HashSet<String> = (0..10_000).map(|_| generator.generate_one()).collect();

    c.bench_function("code_generator/generate_with_10k_taken", |b| {
        b.iter(|| {
            generator
                .generate(|code| taken.contains(code))
                .expect("free code")
        });
    });
}

criterion_group!(benches, bench_generate_one, bench_generate_with_taken_set);
criterion_main!(benches);
