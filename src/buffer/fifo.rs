use crate::buffer::audio_ring::AudioRingBuffer;
use crate::buffer::ring::{Cursors, OverflowMode, Slots};
use crate::error::ConfigError;
use crate::MAX_CHANNELS;

/// Block-granular multi-channel FIFO.
///
/// The producer pushes whatever it has; the consumer only ever sees whole
/// blocks of `block_size` frames. Always strict: nothing is overwritten, and
/// a full FIFO reports a short push count instead.
pub struct FifoAudioBuffer {
    cursors: Cursors,
    channels: Box<[Slots<f32>]>,
    block_size: usize,
}

impl FifoAudioBuffer {
    pub fn new(channels: usize, capacity: usize, block_size: usize) -> Result<Self, ConfigError> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ConfigError::InvalidChannelCount { channels });
        }
        let cursors = Cursors::new(capacity, OverflowMode::Strict);
        if block_size == 0 || block_size > cursors.capacity() {
            return Err(ConfigError::InvalidBlockSize { block_size });
        }

        let channels = (0..channels).map(|_| Slots::new(cursors.capacity())).collect();
        Ok(Self { cursors, channels, block_size })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn capacity(&self) -> usize {
        self.cursors.capacity()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn available(&self) -> usize {
        self.cursors.available()
    }

    /// Whole blocks ready for the consumer.
    pub fn available_blocks(&self) -> usize {
        self.available() / self.block_size
    }

    pub fn free_space(&self) -> usize {
        self.cursors.free_space()
    }

    /// Producer: append as many frames of `block` as fit.
    pub fn push<S: AsRef<[f32]>>(&self, block: &[S]) -> usize {
        let Some(last) = block.len().checked_sub(1) else {
            return 0;
        };
        let frames = block.iter().map(|channel| channel.as_ref().len()).min().unwrap_or(0);

        let reservation = self.cursors.reserve(frames, false);
        for (index, slots) in self.channels.iter().enumerate() {
            let source = &block[index.min(last)].as_ref()[..reservation.count];
            slots.store_run(&self.cursors, reservation.start, source);
        }
        self.cursors.publish(&reservation);
        reservation.count
    }

    /// Consumer: pop exactly one block into `out`.
    ///
    /// Returns false, leaving `out` untouched, while less than a full block is
    /// queued or when `out` is shorter than a block.
    pub fn pop_block<S: AsMut<[f32]>>(&self, out: &mut [S]) -> bool {
        let frames = out.iter_mut().map(|channel| channel.as_mut().len()).min().unwrap_or(0);
        if frames < self.block_size {
            return false;
        }

        let (read, available) = self.cursors.begin_read();
        if available < self.block_size {
            return false;
        }
        for (slots, channel) in self.channels.iter().zip(out.iter_mut()) {
            slots.load_run(&self.cursors, read, &mut channel.as_mut()[..self.block_size]);
        }
        self.cursors.commit_read(read, self.cursors.advance(read, self.block_size))
    }

    /// Consumer: move every whole queued block into `target`.
    ///
    /// Stops early if `target` is strict and full. Returns the number of
    /// frames moved.
    pub fn drain_into(&self, target: &AudioRingBuffer) -> usize {
        let mut moved = 0;
        while self.available() >= self.block_size {
            let reservation = target.cursors.reserve(self.block_size, true);
            if reservation.count == 0 {
                break;
            }

            let (read, _) = self.cursors.begin_read();
            let sources = self.channels.len() - 1;
            for (index, slots) in target.channels.iter().enumerate() {
                let source = &self.channels[index.min(sources)];
                for frame in 0..reservation.count {
                    let from = self.cursors.slot(read.wrapping_add(reservation.skip + frame));
                    let to = target.cursors.slot(reservation.start.wrapping_add(frame));
                    slots.set(to, source.get(from));
                }
            }
            target.cursors.publish(&reservation);
            self.cursors.commit_read(read, self.cursors.advance(read, self.block_size));
            moved += self.block_size;
        }
        moved
    }

    /// Consumer: drop every queued frame.
    pub fn clear(&self) {
        self.cursors.discard();
    }

    /// Reallocate for a new channel count or capacity. Not realtime safe.
    pub fn set_size(&mut self, channels: usize, capacity: usize) -> Result<(), ConfigError> {
        *self = Self::new(channels, capacity, self.block_size)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_only_whole_blocks() {
        let fifo = FifoAudioBuffer::new(1, 16, 4).unwrap();
        assert_eq!(fifo.push(&[&[1.0f32, 2.0, 3.0][..]]), 3);

        let mut out = [0.0f32; 4];
        assert!(!fifo.pop_block(&mut [&mut out[..]]), "three frames are not a block");

        fifo.push(&[&[4.0f32, 5.0][..]]);
        assert_eq!(fifo.available_blocks(), 1);
        assert!(fifo.pop_block(&mut [&mut out[..]]));
        assert_eq!(out, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(fifo.available(), 1);
    }

    #[test]
    fn push_reports_short_count_when_full() {
        let fifo = FifoAudioBuffer::new(2, 8, 4).unwrap();
        let block = [0.5f32; 6];
        assert_eq!(fifo.push(&[&block[..], &block[..]]), 6);
        assert_eq!(fifo.push(&[&block[..], &block[..]]), 2);
        assert_eq!(fifo.free_space(), 0);
    }

    #[test]
    fn rejects_block_larger_than_capacity() {
        assert!(matches!(
            FifoAudioBuffer::new(1, 8, 32),
            Err(ConfigError::InvalidBlockSize { block_size: 32 })
        ));
    }

    #[test]
    fn drains_whole_blocks_into_ring() {
        let fifo = FifoAudioBuffer::new(2, 32, 4).unwrap();
        let ring = AudioRingBuffer::new(2, 64, OverflowMode::Overwrite).unwrap();

        let left: Vec<f32> = (0..10).map(|i| i as f32).collect();
        let right: Vec<f32> = left.iter().map(|v| v * 10.0).collect();
        fifo.push(&[&left[..], &right[..]]);

        assert_eq!(fifo.drain_into(&ring), 8);
        assert_eq!(fifo.available(), 2, "the partial block stays queued");

        let mut out_l = [0.0f32; 8];
        let mut out_r = [0.0f32; 8];
        assert_eq!(ring.read(&mut [&mut out_l[..], &mut out_r[..]]), 8);
        assert_eq!(out_l[7], 7.0);
        assert_eq!(out_r[3], 30.0);
    }

    #[test]
    fn set_size_reallocates_and_empties() {
        let mut fifo = FifoAudioBuffer::new(1, 8, 4).unwrap();
        fifo.push(&[&[1.0f32; 4][..]]);
        fifo.set_size(2, 64).unwrap();
        assert_eq!(fifo.channel_count(), 2);
        assert_eq!(fifo.capacity(), 64);
        assert_eq!(fifo.available(), 0);
    }
}
