//! Benchmarks for the whole processor: synth, effect chain, taps and meters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::config::{Oversampling, ProcessorConfig};
use flux_suite::io::MidiEvent;
use flux_suite::params::Param;
use flux_suite::PluginProcessor;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/chain");
    let chord = [
        MidiEvent::NoteOn { channel: 0, key: 45, velocity: 100 },
        MidiEvent::NoteOn { channel: 0, key: 52, velocity: 100 },
        MidiEvent::NoteOn { channel: 0, key: 57, velocity: 100 },
    ];

    for &size in BLOCK_SIZES {
        let mut left = vec![0.0f32; size];
        let mut right = vec![0.0f32; size];

        for (name, oversampling) in [("full_2x", Oversampling::X2), ("full_4x", Oversampling::X4)] {
            let config = ProcessorConfig::default().with_oversampling(oversampling).with_max_block_size(size);
            let Ok(mut processor) = PluginProcessor::new(config) else {
                continue;
            };
            if processor.prepare(SAMPLE_RATE, size).is_err() {
                continue;
            }
            let mut block = 0usize;
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let midi: &[MidiEvent] = if block % 200 == 0 { &chord } else { &[] };
                    block += 1;
                    left.fill(0.0);
                    right.fill(0.0);
                    processor.process_block(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]), midi);
                })
            });
        }

        // Automation: one parameter moves every block.
        let config = ProcessorConfig::default().with_max_block_size(size);
        let Ok(mut processor) = PluginProcessor::new(config) else {
            continue;
        };
        if processor.prepare(SAMPLE_RATE, size).is_err() {
            continue;
        }
        let shared = processor.shared();
        processor.process_block(&mut [left.as_mut_slice(), right.as_mut_slice()], &chord);
        let mut step = 0usize;
        group.bench_with_input(BenchmarkId::new("automated", size), &size, |b, _| {
            b.iter(|| {
                step += 1;
                shared.set_parameter(Param::FilterCutoff.index(), (step % 100) as f32 / 100.0);
                shared.set_parameter(Param::DisfluxFrequency.index(), (step % 37) as f32 / 37.0);
                left.fill(0.0);
                right.fill(0.0);
                processor.process_block(black_box(&mut [left.as_mut_slice(), right.as_mut_slice()]), &[]);
            })
        });
    }

    group.finish();
}
