//! Benchmarks for the Heretic saturating feedback delay.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::graph::heretic::HereticSettings;
use flux_suite::graph::{HereticProcessor, Stage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_heretic(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/heretic");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        let mut left = input.clone();
        let mut right = input.clone();

        for (name, time_ms) in [("short", 5.0), ("long", 200.0)] {
            let mut heretic = HereticProcessor::new(2);
            heretic.prepare(SAMPLE_RATE, size);
            heretic.set_settings(HereticSettings { drive: 4.0, feedback: 0.8, time_ms, ..HereticSettings::default() });
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    heretic.process_buffer(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
                })
            });
        }
    }

    group.finish();
}
