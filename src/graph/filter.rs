use log::debug;
use rustfft::num_complex::Complex32;

use crate::config::MAX_FILTER_SECTIONS;
use crate::dsp::biquad::{Biquad, Coefficients, FilterType};
use crate::graph::stage::{blend, changed, Stage, StageStatus};
use crate::params::{Param, ParamSnapshot};

/*
Filter Stage
============

A cascade of identical biquad sections. One section gives the classic 12 dB
per octave slope; each extra section adds another 12 dB.

    input ──→ [section 1] ──→ [section 2] ──→ ... ──→ [section n] ──→ mix ──→ output
      │                                                                ↑
      └───────────────────────────── dry ──────────────────────────────┘

Coefficients are recomputed only when the requested settings move by more
than a small epsilon, so a static snapshot costs nothing per block.

Limits
------

  cutoff      10 Hz .. 0.499 · sample rate
  resonance   0.5 .. 20 (Q)

Requests outside those limits are clamped and reported through the status
word; the filter itself never fails.
*/

/// Lowest cutoff the filter will design for.
pub const MIN_CUTOFF_HZ: f32 = 10.0;
/// Highest cutoff as a fraction of the sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.499;
pub const MIN_RESONANCE: f32 = 0.5;
pub const MAX_RESONANCE: f32 = 20.0;

/// Everything the filter needs to know for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterSettings {
    pub kind: FilterType,
    pub cutoff_hz: f32,
    pub resonance: f32,
    pub gain_db: f32,
    pub sections: usize,
    pub mix: f32,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            kind: FilterType::LowPass,
            cutoff_hz: 20_000.0,
            resonance: std::f32::consts::FRAC_1_SQRT_2,
            gain_db: 0.0,
            sections: 1,
            mix: 1.0,
        }
    }
}

impl FilterSettings {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        Self {
            kind: FilterType::from_index(params.index(Param::FilterType)),
            cutoff_hz: params.get(Param::FilterCutoff),
            resonance: params.get(Param::FilterResonance),
            gain_db: params.get(Param::FilterGain),
            sections: params.index(Param::FilterStages),
            mix: params.get(Param::FilterMix),
        }
    }

    fn differs(&self, other: &Self) -> bool {
        self.kind != other.kind
            || self.sections != other.sections
            || changed(self.cutoff_hz, other.cutoff_hz)
            || changed(self.resonance, other.resonance)
            || changed(self.gain_db, other.gain_db)
    }
}

pub struct FilterProcessor {
    channels: usize,
    max_sections: usize,
    sample_rate: f32,
    sections: Vec<Biquad>,
    active: usize,
    current: Option<FilterSettings>,
    mix: f32,
    status: StageStatus,
}

impl FilterProcessor {
    /// `max_sections` is clamped to `1..=MAX_FILTER_SECTIONS`.
    pub fn new(channels: usize, max_sections: usize) -> Self {
        Self {
            channels,
            max_sections: max_sections.clamp(1, MAX_FILTER_SECTIONS),
            sample_rate: 0.0,
            sections: Vec::new(),
            active: 0,
            current: None,
            mix: 1.0,
            status: StageStatus::CLEAR,
        }
    }

    pub fn max_sections(&self) -> usize {
        self.max_sections
    }

    pub fn active_sections(&self) -> usize {
        self.active
    }

    /// Apply settings, redesigning coefficients only if they changed.
    pub fn set_settings(&mut self, settings: FilterSettings) {
        self.mix = settings.mix.clamp(0.0, 1.0);
        if self.sample_rate <= 0.0 {
            return;
        }
        if let Some(current) = &self.current {
            if !settings.differs(current) {
                return;
            }
        }

        let max_cutoff = self.sample_rate * MAX_CUTOFF_RATIO;
        let cutoff = settings.cutoff_hz.clamp(MIN_CUTOFF_HZ, max_cutoff);
        let resonance = settings.resonance.clamp(MIN_RESONANCE, MAX_RESONANCE);
        // NaN fails both comparisons above and would poison the state.
        let cutoff = if cutoff.is_finite() { cutoff } else { max_cutoff };
        let resonance = if resonance.is_finite() { resonance } else { MIN_RESONANCE };

        self.status.set(StageStatus::CUTOFF_CLAMPED, cutoff != settings.cutoff_hz);
        self.status.set(StageStatus::RESONANCE_CLAMPED, resonance != settings.resonance);

        let coefficients = Coefficients::design(settings.kind, cutoff, resonance, settings.gain_db, self.sample_rate);
        self.active = settings.sections.clamp(1, self.max_sections);
        for section in &mut self.sections[..self.active] {
            section.set_coefficients(coefficients);
        }
        // Sections that drop out of the cascade start clean when they return.
        for section in &mut self.sections[self.active..] {
            section.reset();
        }
        self.current = Some(settings);
    }

    /// Combined response of the active cascade, without the dry/wet blend.
    pub fn response(&self, frequency: f32) -> Complex32 {
        self.sections[..self.active]
            .iter()
            .fold(Complex32::new(1.0, 0.0), |acc, section| acc * section.response(frequency, self.sample_rate))
    }

    /// Process with the settings last passed to [`set_settings`](Self::set_settings).
    pub fn process_buffer(&mut self, audio: &mut [&mut [f32]]) {
        if self.active == 0 || self.mix <= 0.0 {
            return;
        }
        let mix = self.mix;
        for (channel, samples) in audio.iter_mut().enumerate().take(self.channels) {
            for sample in samples.iter_mut() {
                let dry = *sample;
                let mut y = dry;
                for section in &mut self.sections[..self.active] {
                    y = section.process_sample(channel, y);
                }
                *sample = blend(dry, y, mix);
            }
        }
        for section in &mut self.sections[..self.active] {
            section.flush_denormals();
        }
    }
}

impl Stage for FilterProcessor {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        debug!(
            "filter: prepare at {sample_rate} Hz, block {max_block_size}, {} sections x {} channels",
            self.max_sections, self.channels
        );
        self.sample_rate = sample_rate;
        self.sections = vec![Biquad::default(); self.max_sections];
        self.active = 0;
        self.current = None;
        self.status = StageStatus::CLEAR;
        self.set_settings(FilterSettings::default());
    }

    fn process(&mut self, audio: &mut [&mut [f32]], params: &ParamSnapshot) {
        self.set_settings(FilterSettings::from_snapshot(params));
        self.process_buffer(audio);
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }

    fn status(&self) -> StageStatus {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 44_100.0;

    fn prepared(settings: FilterSettings) -> FilterProcessor {
        let mut filter = FilterProcessor::new(1, 4);
        filter.prepare(SAMPLE_RATE, 512);
        filter.set_settings(settings);
        filter
    }

    fn lowpass(cutoff_hz: f32) -> FilterSettings {
        FilterSettings {
            cutoff_hz,
            ..FilterSettings::default()
        }
    }

    #[test]
    fn lowpass_is_three_db_down_at_cutoff() {
        let filter = prepared(lowpass(1_000.0));
        let db = 20.0 * filter.response(1_000.0).norm().log10();
        assert!((db + 3.0).abs() < 0.2, "expected -3 dB at cutoff, got {db}");
    }

    #[test]
    fn more_sections_steepen_the_slope() {
        let one = prepared(lowpass(1_000.0));
        let four = prepared(FilterSettings {
            sections: 4,
            ..lowpass(1_000.0)
        });
        assert_eq!(four.active_sections(), 4);
        assert!(four.response(4_000.0).norm() < one.response(4_000.0).norm().powi(3));
    }

    #[test]
    fn out_of_range_requests_are_clamped_and_reported() {
        let mut filter = prepared(FilterSettings {
            cutoff_hz: 40_000.0,
            resonance: 100.0,
            ..FilterSettings::default()
        });
        assert!(filter.status().contains(StageStatus::CUTOFF_CLAMPED));
        assert!(filter.status().contains(StageStatus::RESONANCE_CLAMPED));

        let mut buffer = vec![0.0f32; 512];
        buffer[0] = 1.0;
        filter.process_buffer(&mut [buffer.as_mut_slice()]);
        assert!(buffer.iter().all(|s| s.is_finite()));

        filter.set_settings(lowpass(1_000.0));
        assert!(filter.status().is_clear());
    }

    #[test]
    fn zero_mix_leaves_audio_untouched() {
        let mut filter = prepared(FilterSettings {
            mix: 0.0,
            ..lowpass(200.0)
        });
        let mut buffer: Vec<f32> = (0..256).map(|n| (TAU * 5_000.0 * n as f32 / SAMPLE_RATE).sin()).collect();
        let original = buffer.clone();
        filter.process_buffer(&mut [buffer.as_mut_slice()]);
        assert_eq!(buffer, original);
    }

    #[test]
    fn unchanged_settings_keep_coefficients() {
        let mut filter = prepared(lowpass(1_000.0));
        let before = *filter.sections[0].coefficients();
        filter.set_settings(lowpass(1_000.000_1));
        assert_eq!(*filter.sections[0].coefficients(), before);

        filter.set_settings(lowpass(2_000.0));
        assert_ne!(*filter.sections[0].coefficients(), before);
    }

    #[test]
    fn stable_for_every_type_and_range_corner() {
        for kind in FilterType::ALL {
            for cutoff in [MIN_CUTOFF_HZ, 100.0, 5_000.0, SAMPLE_RATE * MAX_CUTOFF_RATIO] {
                for resonance in [MIN_RESONANCE, 4.0, MAX_RESONANCE] {
                    let filter = prepared(FilterSettings {
                        kind,
                        cutoff_hz: cutoff,
                        resonance,
                        gain_db: 12.0,
                        ..FilterSettings::default()
                    });
                    let c = filter.sections[0].coefficients();
                    assert!(c.is_stable(), "{kind:?} at {cutoff} Hz, Q {resonance} is unstable: {c:?}");
                }
            }
        }
    }
}
