//! Error types for configuration and preset loading.
//!
//! The audio thread never produces these. Everything here is raised on the
//! host or GUI thread at construction time or when a preset is loaded.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    DuplicateParameter { id: String },
    UnknownParameter { id: String },
    InvalidRange { id: String, min: f32, max: f32 },
    InvalidDefault { id: String, value: f32 },
    InvalidSeparators { axis: GridAxis, reason: &'static str },
    InvalidGridCell { start: (usize, usize), end: (usize, usize), columns: usize, rows: usize },
    UnsupportedWaveform { index: usize },
    InvalidChannelCount { channels: usize },
    InvalidBlockSize { block_size: usize },
    InvalidStageCount { stages: usize },
    InvalidSampleRate { sample_rate: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAxis {
    Columns,
    Rows,
}

#[derive(Debug)]
pub enum PresetError {
    Malformed(serde_json::Error),
    Encoding(std::str::Utf8Error),
    SchemaMismatch { found: u32, supported: u32 },
}

/// Umbrella error so `?` works across the whole API.
#[derive(Debug)]
pub enum FluxError {
    Config(ConfigError),
    Preset(PresetError),
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridAxis::Columns => write!(f, "column"),
            GridAxis::Rows => write!(f, "row"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::DuplicateParameter { id } => {
                write!(f, "parameter id '{id}' is registered twice")
            }
            ConfigError::UnknownParameter { id } => write!(f, "unknown parameter id '{id}'"),
            ConfigError::InvalidRange { id, min, max } => {
                write!(f, "parameter '{id}' has an empty range {min}..={max}")
            }
            ConfigError::InvalidDefault { id, value } => {
                write!(f, "default {value} of parameter '{id}' lies outside its range")
            }
            ConfigError::InvalidSeparators { axis, reason } => {
                write!(f, "invalid {axis} separators: {reason}")
            }
            ConfigError::InvalidGridCell { start, end, columns, rows } => write!(
                f,
                "grid cell {start:?}..{end:?} does not fit a {columns}x{rows} grid"
            ),
            ConfigError::UnsupportedWaveform { index } => {
                write!(f, "waveform index {index} is not supported")
            }
            ConfigError::InvalidChannelCount { channels } => {
                write!(f, "{channels} channels requested, only mono and stereo are supported")
            }
            ConfigError::InvalidBlockSize { block_size } => {
                write!(f, "block size {block_size} is out of range")
            }
            ConfigError::InvalidStageCount { stages } => {
                write!(f, "stage count {stages} is out of range")
            }
            ConfigError::InvalidSampleRate { sample_rate } => {
                write!(f, "sample rate {sample_rate} is not usable")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for PresetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresetError::Malformed(e) => write!(f, "preset document is malformed: {e}"),
            PresetError::Encoding(e) => write!(f, "preset document is not valid UTF-8: {e}"),
            PresetError::SchemaMismatch { found, supported } => write!(
                f,
                "preset schema version {found} is newer than the supported version {supported}"
            ),
        }
    }
}

impl std::error::Error for PresetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PresetError::Malformed(e) => Some(e),
            PresetError::Encoding(e) => Some(e),
            PresetError::SchemaMismatch { .. } => None,
        }
    }
}

impl fmt::Display for FluxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FluxError::Config(e) => write!(f, "configuration error: {e}"),
            FluxError::Preset(e) => write!(f, "preset error: {e}"),
        }
    }
}

impl std::error::Error for FluxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FluxError::Config(e) => Some(e),
            FluxError::Preset(e) => Some(e),
        }
    }
}

impl From<ConfigError> for FluxError {
    fn from(e: ConfigError) -> Self {
        FluxError::Config(e)
    }
}

impl From<PresetError> for FluxError {
    fn from(e: PresetError) -> Self {
        FluxError::Preset(e)
    }
}

impl From<std::str::Utf8Error> for PresetError {
    fn from(e: std::str::Utf8Error) -> Self {
        PresetError::Encoding(e)
    }
}

impl From<serde_json::Error> for PresetError {
    fn from(e: serde_json::Error) -> Self {
        PresetError::Malformed(e)
    }
}
