//! Construction-time configuration for the processor and process-wide GUI
//! settings.

use std::sync::OnceLock;

use crate::error::ConfigError;
use crate::{MAX_BLOCK_SIZE, MAX_CHANNELS};

/// Oversampling factor used around the distortion waveshaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Oversampling {
    X2,
    X4,
}

impl Oversampling {
    pub fn factor(self) -> usize {
        match self {
            Oversampling::X2 => 2,
            Oversampling::X4 => 4,
        }
    }
}

/// Upper bound for the number of Disflux all-pass stages.
pub const MAX_DISFLUX_STAGES: usize = 128;
/// Upper bound for cascaded filter sections.
pub const MAX_FILTER_SECTIONS: usize = 8;

/// Everything that is fixed when the processor is built.
///
/// ```
/// use flux_suite::config::{Oversampling, ProcessorConfig};
///
/// let config = ProcessorConfig::default()
///     .with_channels(1)
///     .with_oversampling(Oversampling::X4)
///     .with_disflux_stages(16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub channels: usize,
    pub max_block_size: usize,
    pub oversampling: Oversampling,
    pub disflux_stages: usize,
    pub filter_sections: usize,
    pub scope_capacity: usize,
    pub spectrum_block: usize,
    pub polyphony: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            channels: MAX_CHANNELS,
            max_block_size: 512,
            oversampling: Oversampling::X2,
            disflux_stages: 32,
            filter_sections: 4,
            scope_capacity: 4096,
            spectrum_block: 1024,
            polyphony: 8,
        }
    }
}

impl ProcessorConfig {
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn with_disflux_stages(mut self, stages: usize) -> Self {
        self.disflux_stages = stages;
        self
    }

    pub fn with_filter_sections(mut self, sections: usize) -> Self {
        self.filter_sections = sections;
        self
    }

    pub fn with_scope_capacity(mut self, capacity: usize) -> Self {
        self.scope_capacity = capacity;
        self
    }

    pub fn with_spectrum_block(mut self, block: usize) -> Self {
        self.spectrum_block = block;
        self
    }

    pub fn with_polyphony(mut self, voices: usize) -> Self {
        self.polyphony = voices;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(ConfigError::InvalidChannelCount { channels: self.channels });
        }
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize { block_size: self.max_block_size });
        }
        if self.disflux_stages == 0 || self.disflux_stages > MAX_DISFLUX_STAGES {
            return Err(ConfigError::InvalidStageCount { stages: self.disflux_stages });
        }
        if self.filter_sections == 0 || self.filter_sections > MAX_FILTER_SECTIONS {
            return Err(ConfigError::InvalidStageCount { stages: self.filter_sections });
        }
        if self.spectrum_block == 0 || self.spectrum_block > self.scope_capacity {
            return Err(ConfigError::InvalidBlockSize { block_size: self.spectrum_block });
        }
        Ok(())
    }
}

/// Process-wide GUI settings. Written once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub framerate: u32,
    pub debug_grid: bool,
    pub scaling: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            framerate: 30,
            debug_grid: false,
            scaling: 1.0,
        }
    }
}

static SETTINGS: OnceLock<Settings> = OnceLock::new();

impl Settings {
    /// Install the process-wide settings.
    ///
    /// Only the first call wins; later calls hand their value back as `Err`.
    pub fn install(settings: Settings) -> Result<(), Settings> {
        SETTINGS.set(settings)
    }

    /// The installed settings, or the defaults if nothing was installed.
    pub fn get() -> &'static Settings {
        SETTINGS.get_or_init(Settings::default)
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate.max(1);
        self
    }

    pub fn with_debug_grid(mut self, enabled: bool) -> Self {
        self.debug_grid = enabled;
        self
    }

    pub fn with_scaling(mut self, scaling: f32) -> Self {
        self.scaling = scaling.max(0.25);
        self
    }
}
