//! The effect chain and the processor that drives it.
//!
//! Each effect is a [`Stage`]: prepared once, then fed one block at a time
//! together with the block's parameter snapshot. [`PluginProcessor`] owns the
//! stages in their fixed order and publishes everything the editor needs.

/// Bank of all-pass sections.
pub mod disflux;
/// Oversampled waveshaper with DC blocking.
pub mod distortion;
/// Cascaded biquad filter.
pub mod filter;
/// Saturating feedback delay.
pub mod heretic;
/// Per-block orchestration, shared state and meters.
pub mod processor;
/// Stage trait and status flags.
pub mod stage;

pub use disflux::DisfluxProcessor;
pub use distortion::Distortion;
pub use filter::FilterProcessor;
pub use heretic::HereticProcessor;
pub use processor::{MeterSnapshot, PluginProcessor, SharedState, StageId, INPUT_TAP, OSCILLOSCOPE_TAP};
pub use stage::{Stage, StageStatus};
