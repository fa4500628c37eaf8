//! Benchmarks for the oversampled waveshaper.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::config::Oversampling;
use flux_suite::dsp::distortion::Waveshape;
use flux_suite::graph::distortion::DistortionSettings;
use flux_suite::graph::{Distortion, Stage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/distortion");

    for &size in BLOCK_SIZES {
        // Sine-like values
        let input: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
        let mut left = input.clone();
        let mut right = input.clone();

        for (factor, oversampling) in [("2x", Oversampling::X2), ("4x", Oversampling::X4)] {
            for shape in Waveshape::ALL {
                let mut distortion = Distortion::new(2, oversampling);
                distortion.prepare(SAMPLE_RATE, size);
                distortion.set_settings(DistortionSettings {
                    shape,
                    pre_gain_db: 12.0,
                    ..DistortionSettings::default()
                });
                let name = format!("{}_{factor}", format!("{shape:?}").to_lowercase());
                group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                    b.iter(|| {
                        left.copy_from_slice(&input);
                        right.copy_from_slice(&input);
                        distortion.process_buffer(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]));
                    })
                });
            }
        }
    }

    group.finish();
}
