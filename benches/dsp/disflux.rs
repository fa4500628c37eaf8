//! Benchmarks for the Disflux all-pass bank.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::graph::disflux::DisfluxSettings;
use flux_suite::graph::{DisfluxProcessor, Stage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_disflux(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/disflux");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.05).sin()).collect();
        let mut left = input.clone();
        let mut right = input.clone();

        // Cost grows linearly with the number of active sections.
        for stages in [8, 32, 128] {
            let Ok(mut disflux) = DisfluxProcessor::new(2, stages) else {
                continue;
            };
            disflux.prepare(SAMPLE_RATE, size);
            disflux.set_settings(DisfluxSettings {
                amount: stages,
                frequency_hz: 800.0,
                spread_hz: 1_200.0,
                ..DisfluxSettings::default()
            });
            group.bench_with_input(BenchmarkId::new(format!("stages_{stages}"), size), &size, |b, _| {
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    disflux.process_buffer(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
                })
            });
        }
    }

    group.finish();
}
