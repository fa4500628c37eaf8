//! Benchmarks for the lock-free audio buffers.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use flux_suite::buffer::{AudioRingBuffer, FifoAudioBuffer, OverflowMode};

use crate::BLOCK_SIZES;

pub fn bench_buffers(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/buffers");

    for &size in BLOCK_SIZES {
        let block = vec![vec![0.25f32; size]; 2];
        let mut out = vec![vec![0.0f32; size]; 2];

        let Ok(ring) = AudioRingBuffer::new(2, 8192, OverflowMode::Overwrite) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("ring_write", size), &size, |b, _| {
            b.iter(|| ring.write_block(black_box(&block)))
        });

        let mut window = vec![vec![0.0f32; 1024]; 2];
        group.bench_with_input(BenchmarkId::new("ring_write_peek_1024", size), &size, |b, _| {
            b.iter(|| {
                ring.write_block(black_box(&block));
                ring.peek_latest(black_box(&mut window))
            })
        });

        let Ok(fifo) = FifoAudioBuffer::new(2, 8192, size) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("fifo_push_pop", size), &size, |b, _| {
            b.iter(|| {
                fifo.push(black_box(&block));
                fifo.pop_block(black_box(&mut out))
            })
        });
    }

    group.finish();
}
