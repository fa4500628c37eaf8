//! Real-world scenario benchmarks.
//!
//! These model what a host actually does: a full synth voice pool, a
//! complete processor block and the GUI reading the visualisation rings.

mod buffers;
mod chain;
mod voices;

pub use buffers::bench_buffers;
pub use chain::bench_chain;
pub use voices::bench_voices;
