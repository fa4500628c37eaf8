use crate::buffer::ring::{Cursors, OverflowMode, Slots};
use crate::error::ConfigError;
use crate::MAX_CHANNELS;

/// Multi-channel ring buffer with one cursor pair shared by every channel.
///
/// The audio thread writes whole blocks with [`write_block`](Self::write_block);
/// the display side samples windows with [`read_window`](Self::read_window) or
/// [`peek_latest`](Self::peek_latest). Because the cursors are shared, every
/// channel always reports the same number of available frames.
pub struct AudioRingBuffer {
    pub(crate) cursors: Cursors,
    pub(crate) channels: Box<[Slots<f32>]>,
}

impl AudioRingBuffer {
    pub fn new(channels: usize, capacity: usize, mode: OverflowMode) -> Result<Self, ConfigError> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(ConfigError::InvalidChannelCount { channels });
        }

        let cursors = Cursors::new(capacity, mode);
        let channels = (0..channels).map(|_| Slots::new(cursors.capacity())).collect();
        Ok(Self { cursors, channels })
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn capacity(&self) -> usize {
        self.cursors.capacity()
    }

    pub fn mode(&self) -> OverflowMode {
        self.cursors.mode()
    }

    /// Frames written but not yet consumed, identical for every channel.
    pub fn available(&self) -> usize {
        self.cursors.available()
    }

    pub fn free_space(&self) -> usize {
        self.cursors.free_space()
    }

    /// Producer: append one block of audio.
    ///
    /// The frame count is the shortest channel in `block`. If `block` has
    /// fewer channels than the ring, the last one is repeated so a mono
    /// source fills a stereo ring. In strict mode a block that does not fit
    /// is rejected whole and 0 is returned, so the channels never drift apart.
    pub fn write_block<S: AsRef<[f32]>>(&self, block: &[S]) -> usize {
        let Some(last) = block.len().checked_sub(1) else {
            return 0;
        };
        let frames = block.iter().map(|channel| channel.as_ref().len()).min().unwrap_or(0);

        let reservation = self.cursors.reserve(frames, true);
        for (index, slots) in self.channels.iter().enumerate() {
            let source = &block[index.min(last)].as_ref()[..frames];
            let run = &source[reservation.skip..reservation.skip + reservation.count];
            slots.store_run(&self.cursors, reservation.start, run);
        }
        self.cursors.publish(&reservation);

        match self.cursors.mode() {
            OverflowMode::Strict => reservation.count,
            OverflowMode::Overwrite => frames,
        }
    }

    /// Consumer: copy the oldest unread frames into `out` and consume them.
    pub fn read<S: AsMut<[f32]>>(&self, out: &mut [S]) -> usize {
        let frames = Self::frames_in(out);
        loop {
            let (read, available) = self.cursors.begin_read();
            let count = available.min(frames);
            self.load_into(read, count, out);
            if self.cursors.commit_read(read, self.cursors.advance(read, count)) {
                return count;
            }
        }
    }

    /// Consumer: sample the most recent `length` frames for display.
    ///
    /// Returns 0 and leaves `out` untouched until at least `length` frames
    /// are available. After a successful read the cursor is placed `overlap`
    /// frames before the newest frame, so the next window shares that many
    /// samples with this one.
    pub fn read_window<S: AsMut<[f32]>>(&self, length: usize, out: &mut [S], overlap: usize) -> usize {
        if length == 0 || length > Self::frames_in(out) || length > self.capacity() {
            return 0;
        }
        let overlap = overlap.min(length);

        loop {
            let (read, available) = self.cursors.begin_read();
            if available < length {
                return 0;
            }
            let start = self.cursors.advance(read, available - length);
            self.load_into(start, length, out);

            let write = self.cursors.advance(read, available);
            let next_read = self.cursors.advance(write, 2 * self.capacity() - overlap);
            if self.cursors.commit_read(read, next_read) {
                return length;
            }
        }
    }

    /// Consumer: copy the newest unread frames without consuming anything.
    ///
    /// The last frame written lands at the end of the copied run.
    pub fn peek_latest<S: AsMut<[f32]>>(&self, out: &mut [S]) -> usize {
        let frames = Self::frames_in(out);
        loop {
            let (read, available) = self.cursors.begin_read();
            let count = available.min(frames);
            let start = self.cursors.advance(read, available - count);
            self.load_into(start, count, out);
            if self.cursors.read_unchanged(read) {
                return count;
            }
        }
    }

    /// Consumer: drop every unread frame.
    pub fn clear(&self) {
        self.cursors.discard();
    }

    /// Zero all slots and rewind both cursors. Needs exclusive access.
    pub fn reset(&mut self) {
        self.cursors.reset();
        for slots in self.channels.iter_mut() {
            slots.fill(0.0);
        }
    }

    fn frames_in<S: AsMut<[f32]>>(out: &mut [S]) -> usize {
        out.iter_mut().map(|channel| channel.as_mut().len()).min().unwrap_or(0)
    }

    fn load_into<S: AsMut<[f32]>>(&self, start: usize, count: usize, out: &mut [S]) {
        for (slots, channel) in self.channels.iter().zip(out.iter_mut()) {
            slots.load_run(&self.cursors, start, &mut channel.as_mut()[..count]);
        }
    }
}
