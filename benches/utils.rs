//! 跳转热路径上的工具函数基准测试

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use zaplinker::utils::{
    DeviceType, UtmParams, build_whatsapp_url, detect_device_type, generate_random_code,
    is_valid_slug,
};

// ============== build_whatsapp_url 基准测试 ==============

fn bench_build_whatsapp_url(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/build_whatsapp_url");

    let utm = UtmParams {
        source: Some("instagram".to_string()),
        medium: Some("bio".to_string()),
        campaign: Some("black-friday".to_string()),
        ..Default::default()
    };

    group.bench_function("plain_template", |b| {
        b.iter(|| {
            build_whatsapp_url(
                black_box("+55 (11) 99999-8888"),
                black_box("Hello! I want to know more."),
                &utm,
            )
        });
    });

    group.bench_function("with_placeholders", |b| {
        b.iter(|| {
            build_whatsapp_url(
                black_box("5511999998888"),
                black_box("Hi from {{utm_source}} / {{ UTM_Campaign }} ({{utm_term}})"),
                &utm,
            )
        });
    });

    group.bench_function("empty_template", |b| {
        b.iter(|| build_whatsapp_url(black_box("5511999998888"), black_box(""), &utm));
    });

    for words in [10usize, 100, 500] {
        let template = "olá {{utm_source}} ".repeat(words);
        group.bench_with_input(BenchmarkId::new("words", words), &template, |b, t| {
            b.iter(|| build_whatsapp_url(black_box("5511999998888"), t, &utm));
        });
    }

    group.finish();
}

// ============== detect_device_type 基准测试 ==============

fn bench_detect_device_type(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/detect_device_type");

    let cases = [
        (
            "iphone",
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
            DeviceType::Mobile,
        ),
        (
            "ipad",
            "Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148",
            DeviceType::Tablet,
        ),
        (
            "windows",
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0 Safari/537.36",
            DeviceType::Desktop,
        ),
        ("curl", "curl/8.4.0", DeviceType::Other),
    ];

    for (name, ua, expected) in cases {
        group.bench_function(name, |b| {
            b.iter(|| {
                assert_eq!(detect_device_type(black_box(Some(ua))), expected);
            });
        });
    }

    group.bench_function("missing", |b| {
        b.iter(|| detect_device_type(black_box(None)));
    });

    group.finish();
}

// ============== slug 基准测试 ==============

fn bench_slug(c: &mut Criterion) {
    let mut group = c.benchmark_group("utils/slug");

    group.bench_function("generate", |b| {
        b.iter(|| generate_random_code(black_box(7)));
    });

    group.bench_function("validate", |b| {
        b.iter(|| {
            assert!(is_valid_slug(black_box("promo-2024_black")));
            assert!(!is_valid_slug(black_box("../etc/passwd")));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_build_whatsapp_url,
    bench_detect_device_type,
    bench_slug
);
criterion_main!(benches);
