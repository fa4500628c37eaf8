//! Value ranges and display units.
//!
//! Every parameter stores a normalized value in `[0, 1]`. The range maps it to
//! the plain value the DSP code works with and back again.

/// Display unit attached to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Decibels,
    Hertz,
    Milliseconds,
    Semitones,
    Ratio,
    Percent,
    Raw,
}

impl Unit {
    /// Format a plain value for display.
    ///
    /// Percent expects a `0..=1` value and shows it scaled by 100.
    pub fn format(self, value: f32) -> String {
        match self {
            Unit::Decibels => format!("{value:.1} dB"),
            Unit::Hertz if value >= 1000.0 => format!("{:.2} kHz", value / 1000.0),
            Unit::Hertz => format!("{value:.0} Hz"),
            Unit::Milliseconds => format!("{value:.1} ms"),
            Unit::Semitones => format!("{value:.0} st"),
            Unit::Ratio => format!("{value:.1} x"),
            Unit::Percent => format!("{:.0} %", value * 100.0),
            Unit::Raw => format!("{value:.2}"),
        }
    }

    /// Parse text produced by [`format`](Self::format), or a bare number.
    pub fn parse(self, text: &str) -> Option<f32> {
        let text = text.trim();
        let (number, scale) = match self {
            Unit::Decibels => (strip_suffix(text, "dB"), 1.0),
            Unit::Hertz => match text.strip_suffix("kHz") {
                Some(khz) => (khz.trim(), 1000.0),
                None => (strip_suffix(text, "Hz"), 1.0),
            },
            Unit::Milliseconds => (strip_suffix(text, "ms"), 1.0),
            Unit::Semitones => (strip_suffix(text, "st"), 1.0),
            Unit::Ratio => (strip_suffix(text, "x"), 1.0),
            Unit::Percent => return strip_suffix(text, "%").parse::<f32>().ok().map(|v| v / 100.0),
            Unit::Raw => (text, 1.0),
        };
        number.parse::<f32>().ok().filter(|v| v.is_finite()).map(|v| v * scale)
    }
}

fn strip_suffix<'a>(text: &'a str, suffix: &str) -> &'a str {
    text.strip_suffix(suffix).unwrap_or(text).trim()
}

/// Typed value range of a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterRange {
    /// Continuous range. `skew` below 1 spends more of the control travel on
    /// the low end (useful for frequencies); `step` of 0 means continuous.
    Float { min: f32, max: f32, skew: f32, step: f32 },
    /// Integer steps from `min` to `max` inclusive.
    Int { min: i32, max: i32 },
    /// One of a fixed list of labels; the plain value is the index.
    Choice { options: Vec<&'static str> },
    Bool,
}

impl ParameterRange {
    pub fn linear(min: f32, max: f32) -> Self {
        ParameterRange::Float { min, max, skew: 1.0, step: 0.0 }
    }

    pub fn skewed(min: f32, max: f32, skew: f32) -> Self {
        ParameterRange::Float { min, max, skew, step: 0.0 }
    }

    /// Pick the skew so that `centre` sits at the middle of the control.
    pub fn centred(min: f32, max: f32, centre: f32) -> Self {
        let proportion = ((centre - min) / (max - min)).clamp(1e-6, 1.0 - 1e-6);
        let skew = 0.5f32.ln() / proportion.ln();
        ParameterRange::Float { min, max, skew, step: 0.0 }
    }

    pub fn with_step(self, step: f32) -> Self {
        match self {
            ParameterRange::Float { min, max, skew, .. } => ParameterRange::Float { min, max, skew, step },
            other => other,
        }
    }

    pub fn min(&self) -> f32 {
        match self {
            ParameterRange::Float { min, .. } => *min,
            ParameterRange::Int { min, .. } => *min as f32,
            ParameterRange::Choice { .. } | ParameterRange::Bool => 0.0,
        }
    }

    pub fn max(&self) -> f32 {
        match self {
            ParameterRange::Float { max, .. } => *max,
            ParameterRange::Int { max, .. } => *max as f32,
            ParameterRange::Choice { options } => options.len().saturating_sub(1) as f32,
            ParameterRange::Bool => 1.0,
        }
    }

    /// A range is usable when it spans a non-empty, finite interval.
    pub fn is_valid(&self) -> bool {
        match self {
            ParameterRange::Float { min, max, skew, step } => {
                min.is_finite() && max.is_finite() && min < max && *skew > 0.0 && *step >= 0.0
            }
            ParameterRange::Int { min, max } => min < max,
            ParameterRange::Choice { options } => options.len() >= 2,
            ParameterRange::Bool => true,
        }
    }

    /// Map a normalized value to the plain value.
    pub fn to_plain(&self, normalized: f32) -> f32 {
        let p = normalized.clamp(0.0, 1.0);
        match self {
            ParameterRange::Float { min, max, skew, step } => {
                let shaped = if *skew == 1.0 { p } else { p.powf(1.0 / skew) };
                let value = min + (max - min) * shaped;
                Self::snap(value, *min, *max, *step)
            }
            ParameterRange::Int { min, max } => {
                let span = (max - min) as f32;
                (*min as f32 + (p * span).round()).clamp(*min as f32, *max as f32)
            }
            ParameterRange::Choice { .. } => (p * self.max()).round(),
            ParameterRange::Bool => {
                if p >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Map a plain value to the normalized value, clamping into the range.
    pub fn to_normalized(&self, plain: f32) -> f32 {
        let (min, max) = (self.min(), self.max());
        let clamped = plain.clamp(min, max);
        let linear = (clamped - min) / (max - min);
        match self {
            ParameterRange::Float { skew, .. } if *skew != 1.0 => linear.powf(*skew),
            ParameterRange::Bool => {
                if plain >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            _ => linear,
        }
    }

    pub fn contains(&self, plain: f32) -> bool {
        plain >= self.min() && plain <= self.max()
    }

    /// Label for choice ranges.
    pub fn label(&self, plain: f32) -> Option<&'static str> {
        match self {
            ParameterRange::Choice { options } => options.get(plain.round().max(0.0) as usize).copied(),
            ParameterRange::Bool => Some(if plain >= 0.5 { "On" } else { "Off" }),
            _ => None,
        }
    }

    fn snap(value: f32, min: f32, max: f32, step: f32) -> f32 {
        if step > 0.0 {
            (min + ((value - min) / step).round() * step).clamp(min, max)
        } else {
            value.clamp(min, max)
        }
    }
}
