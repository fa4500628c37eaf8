pub mod buffer; // Lock-free rings between the audio thread and its readers
pub mod config;
pub mod dsp; // Stateless and per-sample DSP primitives
pub mod editor; // GUI-side layout, scope and repaint timer
pub mod error;
pub mod graph; // Effect stages and the plugin processor
pub mod io;
pub mod params; // Host parameters, snapshots and presets
pub mod synth; // Voice management and polyphony

pub use config::{Oversampling, ProcessorConfig, Settings};
pub use error::{ConfigError, FluxError, PresetError};
pub use graph::processor::{PluginProcessor, SharedState};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub const MAX_CHANNELS: usize = 2;
