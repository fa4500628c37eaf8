//! Benchmarks for the cascaded biquad filter stage.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::dsp::FilterType;
use flux_suite::graph::filter::FilterSettings;
use flux_suite::graph::{FilterProcessor, Stage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        // Sawtooth-like ramp
        let input: Vec<f32> = (0..size).map(|i| (i as f32 / size as f32) * 2.0 - 1.0).collect();
        let mut left = input.clone();
        let mut right = input.clone();

        for (name, kind, sections) in [
            ("lowpass", FilterType::LowPass, 1),
            ("peak", FilterType::Peak, 1),
            ("lowpass_x4", FilterType::LowPass, 4),
            ("lowpass_x8", FilterType::LowPass, 8),
        ] {
            let mut filter = FilterProcessor::new(2, 8);
            filter.prepare(SAMPLE_RATE, size);
            filter.set_settings(FilterSettings {
                kind,
                cutoff_hz: 1000.0,
                resonance: 2.0,
                gain_db: 6.0,
                sections,
                mix: 1.0,
            });
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    left.copy_from_slice(&input);
                    right.copy_from_slice(&input);
                    filter.process_buffer(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
                })
            });
        }

        // Automation: a new cutoff every block forces a redesign.
        let mut filter = FilterProcessor::new(2, 8);
        filter.prepare(SAMPLE_RATE, size);
        let mut cutoff = 200.0f32;
        group.bench_with_input(BenchmarkId::new("swept_cutoff", size), &size, |b, _| {
            b.iter(|| {
                cutoff = if cutoff > 8_000.0 { 200.0 } else { cutoff * 1.01 };
                filter.set_settings(FilterSettings { cutoff_hz: cutoff, ..FilterSettings::default() });
                left.copy_from_slice(&input);
                right.copy_from_slice(&input);
                filter.process_buffer(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
            })
        });
    }

    group.finish();
}
