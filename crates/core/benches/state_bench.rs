//! 상태 마커 파싱 벤치마크
//!
//! 상태 파일 내용 파싱과 판정 변환 성능을 측정합니다.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use guestlab_core::types::{SkippedPolicy, TestState, Verdict};

fn bench_marker_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("marker_parsing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("parse_completed", |b| {
        b.iter(|| TestState::parse_marker(black_box("TestCompleted")))
    });

    group.bench_function("parse_running", |b| {
        b.iter(|| TestState::parse_marker(black_box("TestRunning")))
    });

    group.bench_function("parse_with_whitespace", |b| {
        b.iter(|| TestState::parse_marker(black_box("  TestFailed\n")))
    });

    group.bench_function("parse_legacy_aborted", |b| {
        b.iter(|| TestState::parse_marker(black_box("Aborted")))
    });

    group.bench_function("parse_unrecognized", |b| {
        b.iter(|| TestState::parse_marker(black_box("SomethingElse")))
    });

    group.finish();
}

fn bench_verdict_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("verdict_mapping");
    group.throughput(Throughput::Elements(1));

    group.bench_function("from_state_distinct", |b| {
        b.iter(|| {
            Verdict::from_state(black_box(TestState::Skipped), black_box(SkippedPolicy::Distinct))
        })
    });

    group.bench_function("from_state_fold_into_pass", |b| {
        b.iter(|| {
            Verdict::from_state(
                black_box(TestState::Skipped),
                black_box(SkippedPolicy::FoldIntoPass),
            )
        })
    });

    group.finish();
}

fn bench_marker_display(c: &mut Criterion) {
    let mut group = c.benchmark_group("marker_display");
    group.throughput(Throughput::Elements(1));

    group.bench_function("state_to_string", |b| {
        b.iter(|| {
            let _s = format!("{}", black_box(TestState::Completed));
        })
    });

    group.bench_function("verdict_to_string", |b| {
        b.iter(|| {
            let _s = format!("{}", black_box(Verdict::Pass));
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_marker_parsing,
    bench_verdict_mapping,
    bench_marker_display
);
criterion_main!(benches);
