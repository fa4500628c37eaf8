//! Benchmarks for the polyphonic voice pool.
//!
//! Each voice is an oscillator with amplitude and pitch envelopes, so the
//! cost should grow roughly linearly with the number of sounding notes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::synth::{PolySynth, SynthMessage};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// A minor chord stacked over three octaves.
const NOTES: [u8; 8] = [45, 52, 57, 60, 64, 69, 72, 76];

fn strike(synth: &mut PolySynth, voices: usize) {
    for &note in &NOTES[..voices] {
        synth.handle(SynthMessage::NoteOn { note, velocity: 100 });
    }
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for voices in [1, 4, 8] {
            let mut synth = PolySynth::new(SAMPLE_RATE, 8, size);
            strike(&mut synth, voices);

            group.bench_with_input(BenchmarkId::new(format!("voices_{voices}"), size), &size, |b, _| {
                b.iter(|| {
                    // The envelopes have no sustain; retrigger once they fade.
                    if synth.active_voices() < voices {
                        strike(&mut synth, voices);
                    }
                    synth.render_block(black_box(&mut buffer));
                })
            });
        }

        // Stealing: more notes than voices, every block.
        let mut synth = PolySynth::new(SAMPLE_RATE, 4, size);
        let mut next = 0usize;
        group.bench_with_input(BenchmarkId::new("stealing", size), &size, |b, _| {
            b.iter(|| {
                synth.handle(SynthMessage::NoteOn { note: NOTES[next % NOTES.len()], velocity: 90 });
                next += 1;
                synth.render_block(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
