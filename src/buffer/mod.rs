//! Lock-free buffers that carry audio from the realtime thread to its readers.
//!
//! Nothing in this module blocks or allocates after construction. All three
//! buffers share the same cursor scheme, described in [`ring`].

/// Multi-channel ring with a shared cursor pair.
pub mod audio_ring;
/// Block-granular FIFO for consumers that want whole blocks.
pub mod fifo;
/// Scalar SPSC ring and the cursor logic shared by the others.
pub mod ring;

pub use audio_ring::AudioRingBuffer;
pub use fifo::FifoAudioBuffer;
pub use ring::{OverflowMode, RingBuffer, RingSample};
