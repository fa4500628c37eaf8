//! Benchmarks for band-limited oscillator waveforms.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::dsp::{AnalogOscillator, Waveform};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Sine is the baseline without any PolyBLEP correction.
        for waveform in Waveform::ALL {
            let mut osc = AnalogOscillator::new(SAMPLE_RATE).with_waveform(waveform);
            osc.set_frequency(440.0);
            let name = format!("{waveform:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    osc.render(black_box(&mut buffer));
                })
            });
        }

        // High notes hit a discontinuity every few samples.
        let mut osc = AnalogOscillator::new(SAMPLE_RATE).with_waveform(Waveform::Saw);
        osc.set_frequency(8_000.0);
        group.bench_with_input(BenchmarkId::new("saw_8k", size), &size, |b, _| {
            b.iter(|| {
                osc.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
