//! Benchmarks for DSP primitives and single effect stages.

mod disflux;
mod distortion;
mod envelope;
mod filter;
mod heretic;
mod oscillator;

pub use disflux::bench_disflux;
pub use distortion::bench_distortion;
pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use heretic::bench_heretic;
pub use oscillator::bench_oscillator;
