//! Benchmarks for DSP primitives, effect stages and the full processor.
//!
//! Run with: cargo bench
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Primitives and single stages (oscillator, filter, disflux, ...)
//!   - scenarios/*  Polyphonic synth, the whole chain and the visualisation rings

use criterion::{criterion_group, criterion_main};

mod dsp;
mod scenarios;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

pub const SAMPLE_RATE: f32 = 48_000.0;

criterion_group!(
    benches,
    // Primitives and stages
    dsp::bench_oscillator,
    dsp::bench_envelope,
    dsp::bench_filter,
    dsp::bench_disflux,
    dsp::bench_distortion,
    dsp::bench_heretic,
    // Real-world scenarios
    scenarios::bench_voices,
    scenarios::bench_chain,
    scenarios::bench_buffers,
);
criterion_main!(benches);
