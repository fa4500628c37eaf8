//! Low-level DSP primitives used by the processing stages and synth voices.
//!
//! Everything here is allocation-free once constructed and safe to call from
//! the audio thread. The modules stay focused on the signal math; parameter
//! handling and channel layout live in [`crate::graph`].

/// RBJ cookbook biquads in transposed direct form II.
pub mod biquad;
/// Integer and fractional delay line.
pub mod delay;
/// Waveshaping curves.
pub mod distortion;
/// Attack/hold/decay envelope generator.
pub mod envelope;
/// PolyBLEP oscillator.
pub mod oscillator;
pub mod one_pole;
/// Polyphase half-band oversampling.
pub mod oversampling;

pub use biquad::{Biquad, Coefficients, FilterType};
pub use envelope::{AdhEnvelope, AdhParameters, EnvelopeStage};
pub use oscillator::{AnalogOscillator, Waveform};
