//! The suite's parameter layout: every id, range, default and unit.
//!
//! Ids are `<group><Name>` in camel case, e.g. `hereticFeedback`. The order of
//! [`Param::ALL`] is the registration order, so `Param as usize` is also the
//! parameter's index in the tree and in every [`ParamSnapshot`].

use crate::error::ConfigError;
use crate::params::range::{ParameterRange, Unit};
use crate::params::tree::{ParamSnapshot, ParameterDescriptor, ParameterTree};

macro_rules! parameters {
    ($($variant:ident => $id:literal),* $(,)?) => {
        /// Every parameter of the suite.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(usize)]
        pub enum Param {
            $($variant),*
        }

        impl Param {
            pub const ALL: &'static [Param] = &[$(Param::$variant),*];

            pub fn id(self) -> &'static str {
                match self {
                    $(Param::$variant => $id),*
                }
            }
        }
    };
}

parameters! {
    GlobalBypass => "globalBypass",

    OscilloscopeZoom => "oscilloscopeZoom",
    OscilloscopeGain => "oscilloscopeGain",
    OscilloscopeThickness => "oscilloscopeThickness",

    OscWaveform => "oscWaveform",
    OscPwm => "oscPwm",
    OscOctave => "oscOctave",
    OscSemitone => "oscSemitone",
    OscGain => "oscGain",
    OscDrive => "oscDrive",
    OscBias => "oscBias",
    OscBend => "oscBend",
    OscSync => "oscSync",

    EnvAttack => "envAttack",
    EnvHold => "envHold",
    EnvDecay => "envDecay",
    EnvSkew => "envSkew",
    EnvAttackSkew => "envAttackSkew",

    PitchEnvHold => "pitchEnvHold",
    PitchEnvDecay => "pitchEnvDecay",
    PitchEnvDepth => "pitchEnvDepth",
    PitchEnvSkew => "pitchEnvSkew",

    DistortionType => "distortionType",
    DistortionPreGain => "distortionPreGain",
    DistortionDrive => "distortionDrive",
    DistortionPostGain => "distortionPostGain",
    DistortionSymmetry => "distortionSymmetry",
    DistortionCrush => "distortionCrush",
    DistortionMix => "distortionMix",

    FilterType => "filterType",
    FilterCutoff => "filterCutoff",
    FilterResonance => "filterResonance",
    FilterGain => "filterGain",
    FilterStages => "filterStages",
    FilterMix => "filterMix",

    DisfluxAmount => "disfluxAmount",
    DisfluxSpread => "disfluxSpread",
    DisfluxFrequency => "disfluxFrequency",
    DisfluxPinch => "disfluxPinch",
    DisfluxMix => "disfluxMix",
    DisfluxDistribution => "disfluxDistribution",

    HereticDrive => "hereticDrive",
    HereticFeedback => "hereticFeedback",
    HereticTone => "hereticTone",
    HereticTime => "hereticTime",
    HereticMix => "hereticMix",
}

pub const WAVEFORM_NAMES: [&str; 5] = ["Sine", "Triangle", "Saw", "Square", "Pulse"];
pub const DISTORTION_NAMES: [&str; 4] = ["Soft", "Hard", "Fold", "Asymmetric"];
pub const FILTER_NAMES: [&str; 6] = ["LowPass", "HighPass", "BandPass", "Notch", "Peak", "AllPass"];
pub const DISTRIBUTION_NAMES: [&str; 2] = ["Log", "Even"];

impl Param {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> ParameterDescriptor {
        use ParameterRange as R;
        use Unit::*;

        let (group, name, range, default, unit) = match self {
            Param::GlobalBypass => ("global", "Bypass", R::Bool, 0.0, Raw),

            Param::OscilloscopeZoom => ("oscilloscope", "Zoom", R::linear(0.01, 1.0), 1.0, Percent),
            Param::OscilloscopeGain => ("oscilloscope", "Gain", R::linear(-24.0, 24.0), 0.0, Decibels),
            Param::OscilloscopeThickness => ("oscilloscope", "Thickness", R::linear(0.5, 5.0), 1.5, Raw),

            Param::OscWaveform => ("osc", "Waveform", choice(&WAVEFORM_NAMES), 2.0, Raw),
            Param::OscPwm => ("osc", "Pulse Width", R::linear(0.05, 0.95), 0.5, Percent),
            Param::OscOctave => ("osc", "Octave", R::Int { min: -3, max: 3 }, 0.0, Raw),
            Param::OscSemitone => ("osc", "Semitone", R::Int { min: -12, max: 12 }, 0.0, Semitones),
            Param::OscGain => ("osc", "Gain", R::linear(-48.0, 6.0), -6.0, Decibels),
            Param::OscDrive => ("osc", "Drive", R::linear(0.0, 10.0), 0.0, Ratio),
            Param::OscBias => ("osc", "Bias", R::linear(-1.0, 1.0), 0.0, Raw),
            Param::OscBend => ("osc", "Bend", R::linear(-1.0, 1.0), 0.0, Percent),
            Param::OscSync => ("osc", "Sync", R::linear(0.0, 1.0), 0.0, Percent),

            Param::EnvAttack => ("env", "Attack", R::skewed(0.0, 300.0, 0.5), 15.0, Milliseconds),
            Param::EnvHold => ("env", "Hold", R::skewed(0.0, 300.0, 0.5), 80.0, Milliseconds),
            Param::EnvDecay => ("env", "Decay", R::skewed(0.0, 1000.0, 0.5), 500.0, Milliseconds),
            Param::EnvSkew => ("env", "Skew", R::linear(0.1, 16.0), 2.0, Raw),
            Param::EnvAttackSkew => ("env", "Attack Skew", R::linear(0.1, 16.0), 1.0, Raw),

            Param::PitchEnvHold => ("pitchEnv", "Hold", R::skewed(0.0, 300.0, 0.5), 0.0, Milliseconds),
            Param::PitchEnvDecay => ("pitchEnv", "Decay", R::skewed(0.0, 1000.0, 0.5), 50.0, Milliseconds),
            Param::PitchEnvDepth => ("pitchEnv", "Depth", R::linear(0.0, 48.0), 0.0, Semitones),
            Param::PitchEnvSkew => ("pitchEnv", "Skew", R::linear(0.1, 16.0), 4.0, Raw),

            Param::DistortionType => ("distortion", "Type", choice(&DISTORTION_NAMES), 0.0, Raw),
            Param::DistortionPreGain => ("distortion", "Pre Gain", R::linear(-24.0, 24.0), 0.0, Decibels),
            Param::DistortionDrive => ("distortion", "Drive", R::linear(0.0, 10.0), 1.0, Ratio),
            Param::DistortionPostGain => ("distortion", "Post Gain", R::linear(-24.0, 24.0), 0.0, Decibels),
            Param::DistortionSymmetry => ("distortion", "Symmetry", R::linear(-1.0, 1.0), 0.0, Raw),
            Param::DistortionCrush => ("distortion", "Crush", R::linear(1.0, 16.0), 16.0, Raw),
            Param::DistortionMix => ("distortion", "Mix", R::linear(0.0, 1.0), 1.0, Percent),

            Param::FilterType => ("filter", "Type", choice(&FILTER_NAMES), 0.0, Raw),
            Param::FilterCutoff => ("filter", "Cutoff", R::skewed(20.0, 20_000.0, 0.25), 20_000.0, Hertz),
            Param::FilterResonance => ("filter", "Resonance", R::centred(0.5, 20.0, 2.0), 0.707, Raw),
            Param::FilterGain => ("filter", "Gain", R::linear(-24.0, 24.0), 0.0, Decibels),
            Param::FilterStages => ("filter", "Stages", R::Int { min: 1, max: 8 }, 1.0, Raw),
            Param::FilterMix => ("filter", "Mix", R::linear(0.0, 1.0), 1.0, Percent),

            Param::DisfluxAmount => ("disflux", "Amount", R::Int { min: 1, max: 128 }, 1.0, Raw),
            Param::DisfluxSpread => ("disflux", "Spread", R::skewed(0.0, 10_000.0, 0.5), 200.0, Hertz),
            Param::DisfluxFrequency => ("disflux", "Frequency", R::skewed(20.0, 20_000.0, 0.25), 400.0, Hertz),
            Param::DisfluxPinch => ("disflux", "Pinch", R::linear(0.5, 16.0), 1.0, Raw),
            Param::DisfluxMix => ("disflux", "Mix", R::linear(0.0, 1.0), 1.0, Percent),
            Param::DisfluxDistribution => ("disflux", "Distribution", choice(&DISTRIBUTION_NAMES), 0.0, Raw),

            Param::HereticDrive => ("heretic", "Drive", R::skewed(1.0, 32.0, 0.5), 1.5, Ratio),
            Param::HereticFeedback => ("heretic", "Feedback", R::linear(0.0, 1.0), 0.2, Percent),
            Param::HereticTone => ("heretic", "Tone", R::skewed(20.0, 20_000.0, 0.25), 6000.0, Hertz),
            Param::HereticTime => ("heretic", "Time", R::skewed(1.0, 240.0, 0.5), 20.0, Milliseconds),
            Param::HereticMix => ("heretic", "Mix", R::linear(0.0, 1.0), 0.5, Percent),
        };

        ParameterDescriptor::new(name, range, default, unit).in_group(group)
    }
}

fn choice(options: &[&'static str]) -> ParameterRange {
    ParameterRange::Choice { options: options.to_vec() }
}

/// Build the tree holding every suite parameter in [`Param::ALL`] order.
pub fn build_tree() -> Result<ParameterTree, ConfigError> {
    let mut builder = ParameterTree::builder();
    for &param in Param::ALL {
        builder.register(param.id(), param.descriptor())?;
    }
    Ok(builder.build())
}

impl ParamSnapshot {
    /// Plain value of a suite parameter.
    #[inline]
    pub fn get(&self, param: Param) -> f32 {
        self.plain(param.index())
    }

    /// Choice or integer parameter as an index.
    #[inline]
    pub fn index(&self, param: Param) -> usize {
        self.get(param).round().max(0.0) as usize
    }

    #[inline]
    pub fn flag(&self, param: Param) -> bool {
        self.get(param) >= 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn layout_builds_without_conflicts() {
        let tree = build_tree().expect("suite layout must be valid");
        assert_eq!(tree.len(), Param::ALL.len());
    }

    #[test]
    fn indices_follow_registration_order() {
        let tree = build_tree().unwrap();
        for &param in Param::ALL {
            assert_eq!(tree.index_of(param.id()), Some(param.index()), "{param:?} is out of order");
        }
    }

    #[test]
    fn ids_are_unique_and_prefixed_by_group() {
        let mut seen = HashSet::new();
        for &param in Param::ALL {
            assert!(seen.insert(param.id()), "duplicate id {}", param.id());
            let descriptor = param.descriptor();
            assert!(
                param.id().starts_with(&descriptor.group),
                "{} should start with its group {}",
                param.id(),
                descriptor.group
            );
        }
    }

    #[test]
    fn snapshot_reads_defaults_by_param() {
        let tree = build_tree().unwrap();
        let snapshot = tree.snapshot();
        assert!((snapshot.get(Param::FilterCutoff) - 20_000.0).abs() < 1.0);
        assert!((snapshot.get(Param::FilterResonance) - 0.707).abs() < 1e-3);
        assert_eq!(snapshot.index(Param::OscWaveform), 2);
        assert!(!snapshot.flag(Param::GlobalBypass));
        assert!((snapshot.get(Param::HereticTime) - 20.0).abs() < 1e-3);
    }

    #[test]
    fn shaping_controls_default_to_clean() {
        let snapshot = build_tree().unwrap().snapshot();
        assert_eq!(snapshot.get(Param::OscDrive), 0.0);
        assert!(snapshot.get(Param::OscBias).abs() < 1e-6);
        assert!(snapshot.get(Param::OscBend).abs() < 1e-6);
        assert_eq!(snapshot.get(Param::OscSync), 0.0);
        assert!((snapshot.get(Param::EnvAttackSkew) - 1.0).abs() < 1e-5);
        assert!((snapshot.get(Param::DistortionDrive) - 1.0).abs() < 1e-5);
        assert!((snapshot.get(Param::DistortionCrush) - 16.0).abs() < 1e-4);
    }
}
