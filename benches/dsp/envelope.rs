//! Benchmarks for the attack/hold/decay envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::dsp::{AdhEnvelope, AdhParameters};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Long attack: stays in the linear ramp for the whole run.
        let mut env = AdhEnvelope::new(SAMPLE_RATE).with_parameters(
            AdhParameters { attack_ms: 60_000.0, hold_ms: 0.0, decay_ms: 500.0, attack_skew: 1.0, decay_skew: 2.0 },
        );
        env.note_on();
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        // Decay evaluates a powf per sample.
        let mut env = AdhEnvelope::new(SAMPLE_RATE).with_parameters(
            AdhParameters { attack_ms: 0.0, hold_ms: 0.0, decay_ms: 60_000.0, attack_skew: 1.0, decay_skew: 3.0 },
        );
        env.note_on();
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });

        let mut env = AdhEnvelope::new(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("idle", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
