use std::sync::atomic::{fence, AtomicI32, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/*
Lock-Free SPSC Ring Buffer
==========================

One thread writes (the audio callback), one thread reads (the GUI or a worker).
Neither side ever blocks or allocates once the buffer exists.

Cursors
-------

  write   owned by the producer, published with Release after the slots are
          filled
  read    owned by the consumer in strict mode; in overwrite mode the producer
          may also push it forward when it laps the consumer

Both cursors count in the range [0, 2C) where C is the capacity (a power of
two). Using twice the capacity keeps "full" (distance C) distinguishable from
"empty" (distance 0) without wasting a slot:

    occupancy = (write - read) mod 2C
    slot      = index mod C           (a mask, not a division)

     read                 write
      │                     │
  ┌───┼───┬───┬───┬───┬───┼───┬───┐
  │   │ a │ b │ c │ d │ e │   │   │     occupancy = 5, free = 3
  └───┴───┴───┴───┴───┴───┴───┴───┘

Overflow
--------

  Strict     writes that do not fit are truncated and the short count is
             returned (inter-thread FIFO)
  Overwrite  the producer advances the read cursor past the oldest samples
             and always writes everything (oscilloscope tap)

In overwrite mode the consumer commits its read with a compare-exchange. If
the producer moved the read cursor in the meantime the copied data may be torn,
so the consumer retries. Slots are atomics, so a torn read is never undefined
behaviour, only stale data that gets discarded.
*/

/// Scalar types that can live in a ring buffer slot.
///
/// Each slot is backed by an atomic of the same width so concurrent access is
/// always well defined. Relaxed loads and stores compile to plain moves.
pub trait RingSample: Copy + Default + Send + Sync + 'static {
    type Cell: Send + Sync;

    fn new_cell(value: Self) -> Self::Cell;
    fn load(cell: &Self::Cell) -> Self;
    fn store(cell: &Self::Cell, value: Self);
}

impl RingSample for f32 {
    type Cell = AtomicU32;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU32::new(value.to_bits())
    }

    #[inline]
    fn load(cell: &Self::Cell) -> Self {
        f32::from_bits(cell.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(cell: &Self::Cell, value: Self) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl RingSample for f64 {
    type Cell = AtomicU64;

    fn new_cell(value: Self) -> Self::Cell {
        AtomicU64::new(value.to_bits())
    }

    #[inline]
    fn load(cell: &Self::Cell) -> Self {
        f64::from_bits(cell.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(cell: &Self::Cell, value: Self) {
        cell.store(value.to_bits(), Ordering::Relaxed);
    }
}

macro_rules! impl_integer_sample {
    ($($ty:ty => $atomic:ty),* $(,)?) => {
        $(
            impl RingSample for $ty {
                type Cell = $atomic;

                fn new_cell(value: Self) -> Self::Cell {
                    <$atomic>::new(value)
                }

                #[inline]
                fn load(cell: &Self::Cell) -> Self {
                    cell.load(Ordering::Relaxed)
                }

                #[inline]
                fn store(cell: &Self::Cell, value: Self) {
                    cell.store(value, Ordering::Relaxed);
                }
            }
        )*
    };
}

impl_integer_sample!(u32 => AtomicU32, i32 => AtomicI32, u64 => AtomicU64, usize => AtomicUsize);

/// What the producer does when the consumer has not kept up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowMode {
    /// Reject what does not fit; `write` returns a short count.
    Strict,
    /// Drop the oldest unread samples to make room.
    Overwrite,
}

/// A slot range handed out to the producer before it copies data in.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Reservation {
    pub start: usize,
    pub count: usize,
    /// Leading input elements that are dropped because they would be
    /// overwritten by the same write anyway.
    pub skip: usize,
}

/// The cursor pair shared by every ring flavour in this module tree.
#[derive(Debug)]
pub(crate) struct Cursors {
    capacity: usize,
    slot_mask: usize,
    index_mask: usize,
    write: AtomicUsize,
    read: AtomicUsize,
    mode: OverflowMode,
}

impl Cursors {
    pub fn new(requested_capacity: usize, mode: OverflowMode) -> Self {
        let capacity = requested_capacity.max(1).next_power_of_two();
        Self {
            capacity,
            slot_mask: capacity - 1,
            index_mask: capacity * 2 - 1,
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            mode,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn mode(&self) -> OverflowMode {
        self.mode
    }

    #[inline]
    pub fn slot(&self, index: usize) -> usize {
        index & self.slot_mask
    }

    #[inline]
    pub fn advance(&self, index: usize, by: usize) -> usize {
        index.wrapping_add(by) & self.index_mask
    }

    #[inline]
    fn distance(&self, from: usize, to: usize) -> usize {
        to.wrapping_sub(from) & self.index_mask
    }

    pub fn available(&self) -> usize {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        self.distance(read, write)
    }

    pub fn free_space(&self) -> usize {
        self.capacity - self.available()
    }

    /// Producer: claim room for up to `requested` elements.
    ///
    /// With `all_or_nothing` a strict buffer either grants everything or
    /// nothing, which keeps multi-channel writes aligned.
    pub fn reserve(&self, requested: usize, all_or_nothing: bool) -> Reservation {
        let write = self.write.load(Ordering::Relaxed);

        match self.mode {
            OverflowMode::Strict => {
                let read = self.read.load(Ordering::Acquire);
                let free = self.capacity - self.distance(read, write);
                let count = if all_or_nothing && requested > free {
                    0
                } else {
                    requested.min(free)
                };
                Reservation { start: write, count, skip: 0 }
            }
            OverflowMode::Overwrite => {
                let count = requested.min(self.capacity);
                let skip = requested - count;

                // Push the consumer forward before touching any slot it may own.
                let mut read = self.read.load(Ordering::Acquire);
                loop {
                    let occupied = self.distance(read, write);
                    let overflow = (occupied + count).saturating_sub(self.capacity);
                    if overflow == 0 {
                        break;
                    }
                    let new_read = self.advance(read, overflow);
                    match self.read.compare_exchange_weak(
                        read,
                        new_read,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    ) {
                        Ok(_) => break,
                        Err(current) => read = current,
                    }
                }

                Reservation { start: write, count, skip }
            }
        }
    }

    /// Producer: make a filled reservation visible to the consumer.
    pub fn publish(&self, reservation: &Reservation) {
        if reservation.count > 0 {
            let write = self.advance(reservation.start, reservation.count);
            self.write.store(write, Ordering::Release);
        }
    }

    /// Consumer: current read cursor and the number of readable elements.
    pub fn begin_read(&self) -> (usize, usize) {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        (read, self.distance(read, write))
    }

    /// Consumer: current write cursor and the number of readable elements.
    pub fn latest(&self) -> (usize, usize) {
        let read = self.read.load(Ordering::Acquire);
        let write = self.write.load(Ordering::Acquire);
        (write, self.distance(read, write))
    }

    /// Consumer: move the read cursor from `from` to `to`.
    ///
    /// Returns false when the producer overtook the consumer while it was
    /// copying, in which case the copied data must be discarded.
    pub fn commit_read(&self, from: usize, to: usize) -> bool {
        match self.mode {
            OverflowMode::Strict => {
                self.read.store(to, Ordering::Release);
                true
            }
            OverflowMode::Overwrite => self
                .read
                .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
                .is_ok(),
        }
    }

    /// Consumer: true while the read cursor still equals `expected`.
    ///
    /// Call after copying slots; the fence keeps those loads ahead of the
    /// cursor check.
    pub fn read_unchanged(&self, expected: usize) -> bool {
        fence(Ordering::Acquire);
        self.read.load(Ordering::Acquire) == expected
    }

    /// Consumer: drop everything currently readable.
    pub fn discard(&self) {
        loop {
            let (read, available) = self.begin_read();
            if self.commit_read(read, self.advance(read, available)) {
                return;
            }
        }
    }

    /// Exclusive reset, only valid while neither side is running.
    pub fn reset(&mut self) {
        *self.write.get_mut() = 0;
        *self.read.get_mut() = 0;
    }
}

/// One channel worth of atomic slots.
pub(crate) struct Slots<T: RingSample> {
    cells: Box<[T::Cell]>,
}

impl<T: RingSample> Slots<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            cells: (0..capacity).map(|_| T::new_cell(T::default())).collect(),
        }
    }

    /// Copy `data` into the ring starting at cursor index `start`.
    #[inline]
    pub fn store_run(&self, cursors: &Cursors, start: usize, data: &[T]) {
        for (i, &value) in data.iter().enumerate() {
            let slot = cursors.slot(start.wrapping_add(i));
            T::store(&self.cells[slot], value);
        }
    }

    /// Copy `out.len()` elements starting at cursor index `start`.
    #[inline]
    pub fn load_run(&self, cursors: &Cursors, start: usize, out: &mut [T]) {
        for (i, value) in out.iter_mut().enumerate() {
            let slot = cursors.slot(start.wrapping_add(i));
            *value = T::load(&self.cells[slot]);
        }
    }

    #[inline]
    pub fn get(&self, slot: usize) -> T {
        T::load(&self.cells[slot])
    }

    #[inline]
    pub fn set(&self, slot: usize, value: T) {
        T::store(&self.cells[slot], value);
    }

    pub fn fill(&mut self, value: T) {
        for cell in self.cells.iter() {
            T::store(cell, value);
        }
    }
}

/// Single-producer/single-consumer lock-free circular buffer of scalars.
///
/// All methods take `&self`, so the buffer is usually shared through an
/// `Arc`. Calling `write` from two threads at once, or reading from two
/// threads at once, is a programming error; it cannot cause undefined
/// behaviour but it will scramble the data.
pub struct RingBuffer<T: RingSample> {
    cursors: Cursors,
    slots: Slots<T>,
}

impl<T: RingSample> RingBuffer<T> {
    /// Create a ring holding at least `capacity` elements.
    ///
    /// The capacity is rounded up to the next power of two.
    pub fn new(capacity: usize, mode: OverflowMode) -> Self {
        let cursors = Cursors::new(capacity, mode);
        let slots = Slots::new(cursors.capacity());
        Self { cursors, slots }
    }

    pub fn capacity(&self) -> usize {
        self.cursors.capacity()
    }

    pub fn mode(&self) -> OverflowMode {
        self.cursors.mode()
    }

    /// Elements written but not yet read.
    pub fn available(&self) -> usize {
        self.cursors.available()
    }

    pub fn free_space(&self) -> usize {
        self.cursors.free_space()
    }

    pub fn is_empty(&self) -> bool {
        self.available() == 0
    }

    /// Producer: append `data`, returning how many elements were accepted.
    ///
    /// Overwrite mode always accepts everything. Strict mode returns a short
    /// count when the buffer is full.
    pub fn write(&self, data: &[T]) -> usize {
        let reservation = self.cursors.reserve(data.len(), false);
        let run = &data[reservation.skip..reservation.skip + reservation.count];
        self.slots.store_run(&self.cursors, reservation.start, run);
        self.cursors.publish(&reservation);

        match self.cursors.mode() {
            OverflowMode::Strict => reservation.count,
            OverflowMode::Overwrite => data.len(),
        }
    }

    /// Consumer: copy the oldest unread elements into `out` and consume them.
    pub fn read(&self, out: &mut [T]) -> usize {
        loop {
            let (read, available) = self.cursors.begin_read();
            let count = available.min(out.len());
            self.slots.load_run(&self.cursors, read, &mut out[..count]);
            if self.cursors.commit_read(read, self.cursors.advance(read, count)) {
                return count;
            }
        }
    }

    /// Consumer: copy unread elements starting `offset` past the read cursor
    /// without consuming them.
    pub fn peek(&self, offset: usize, out: &mut [T]) -> usize {
        loop {
            let (read, available) = self.cursors.begin_read();
            if offset >= available {
                return 0;
            }
            let count = (available - offset).min(out.len());
            let start = self.cursors.advance(read, offset);
            self.slots.load_run(&self.cursors, start, &mut out[..count]);
            if self.cursors.read_unchanged(read) {
                return count;
            }
        }
    }

    /// Consumer: copy the most recent unread elements so that the last
    /// element written lands at the end of the returned run.
    pub fn peek_latest(&self, out: &mut [T]) -> usize {
        let available = self.available();
        let count = available.min(out.len());
        self.peek(available - count, &mut out[..count])
    }

    /// Consumer: drop every unread element.
    pub fn clear(&self) {
        self.cursors.discard();
    }
}
