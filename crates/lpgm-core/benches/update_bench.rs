//! Per-sample update cost of the LPGM pipeline
//!
//! Run with: cargo bench -p lpgm-core --bench update_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lpgm_core::{LpgmCalculator, RollingMaxWindow};
use std::f64::consts::PI;

fn synthetic_record(sample_rate: f64, seconds: f64) -> Vec<[f64; 3]> {
    let n = (sample_rate * seconds) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let a = 30.0 * (2.0 * PI * t / 5.0).sin();
            [a + 2.0, 0.7 * a - 1.0, 980.0 + 0.1 * a]
        })
        .collect()
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("lpgm_update");

    for &rate in &[50.0, 100.0, 200.0] {
        let record = synthetic_record(rate, 10.0);
        group.throughput(Throughput::Elements(record.len() as u64));

        group.bench_with_input(BenchmarkId::new("update", rate as u32), &record, |b, record| {
            b.iter_batched(
                || LpgmCalculator::new(rate).unwrap(),
                |mut calc| {
                    for sample in record {
                        black_box(calc.update(black_box(sample)).unwrap());
                    }
                    calc
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_rolling_window(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_max");

    for &capacity in &[1_500usize, 3_000, 6_000] {
        group.bench_with_input(BenchmarkId::new("push", capacity), &capacity, |b, &capacity| {
            let mut window = RollingMaxWindow::new(capacity).unwrap();
            let mut x = 0.0_f64;
            b.iter(|| {
                x = (x + 0.37) % 100.0;
                black_box(window.push(black_box(x)))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_update, bench_rolling_window);
criterion_main!(benches);
