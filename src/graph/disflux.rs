use log::debug;
use rustfft::num_complex::Complex32;

use crate::config::MAX_DISFLUX_STAGES;
use crate::dsp::biquad::{Biquad, Coefficients, FilterType};
use crate::error::ConfigError;
use crate::graph::stage::{blend, changed, Stage};
use crate::params::{Param, ParamSnapshot};

/*
Disflux
=======

A long chain of all-pass sections. Each section passes every frequency at
unity gain but delays frequencies near its centre more than the rest. Stack
enough of them around one region and transients smear into a "laser" chirp,
while the magnitude response stays perfectly flat.

    x ──→ [AP f1] ──→ [AP f2] ──→ ... ──→ [AP fn] ──→ mix ──→ y

Centre frequencies
------------------

    lo = max(frequency - spread/2, 20 Hz)
    hi = min(frequency + spread/2, 0.45 · sample rate)

    t_k = k / (n - 1)                   (0.5 when n == 1)

    log   f_k = lo · (hi / lo)^t_k
    even  f_k = lo + (hi - lo) · t_k

Every section uses the pinch as its Q: higher pinch, narrower and longer
ringing delay peak.

Stage count
-----------

The bank holds N sections sized when the processor is built. `disfluxAmount`
picks how many of them are active, at most N. Changing N itself reallocates,
so it happens off the audio thread through `set_stage_count`.
*/

const MIN_FREQUENCY_HZ: f32 = 20.0;
const MAX_FREQUENCY_RATIO: f32 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distribution {
    Log,
    Even,
}

impl Distribution {
    pub fn from_index(index: usize) -> Self {
        if index == 1 {
            Distribution::Even
        } else {
            Distribution::Log
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisfluxSettings {
    pub amount: usize,
    pub spread_hz: f32,
    pub frequency_hz: f32,
    pub pinch: f32,
    pub mix: f32,
    pub distribution: Distribution,
}

impl Default for DisfluxSettings {
    fn default() -> Self {
        Self {
            amount: 1,
            spread_hz: 200.0,
            frequency_hz: 400.0,
            pinch: 1.0,
            mix: 1.0,
            distribution: Distribution::Log,
        }
    }
}

impl DisfluxSettings {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        Self {
            amount: params.index(Param::DisfluxAmount),
            spread_hz: params.get(Param::DisfluxSpread),
            frequency_hz: params.get(Param::DisfluxFrequency),
            pinch: params.get(Param::DisfluxPinch),
            mix: params.get(Param::DisfluxMix),
            distribution: Distribution::from_index(params.index(Param::DisfluxDistribution)),
        }
    }

    fn differs(&self, other: &Self) -> bool {
        self.amount != other.amount
            || self.distribution != other.distribution
            || changed(self.spread_hz, other.spread_hz)
            || changed(self.frequency_hz, other.frequency_hz)
            || changed(self.pinch, other.pinch)
    }
}

/// Centre frequency of section `k` out of `n`.
pub fn centre_frequency(settings: &DisfluxSettings, k: usize, n: usize, sample_rate: f32) -> f32 {
    let half = settings.spread_hz.max(0.0) * 0.5;
    let lo = (settings.frequency_hz - half).max(MIN_FREQUENCY_HZ);
    let hi = (settings.frequency_hz + half).min(sample_rate * MAX_FREQUENCY_RATIO).max(lo);
    let t = if n <= 1 { 0.5 } else { k as f32 / (n - 1) as f32 };

    match settings.distribution {
        Distribution::Log => lo * (hi / lo).powf(t),
        Distribution::Even => lo + (hi - lo) * t,
    }
}

pub struct DisfluxProcessor {
    channels: usize,
    stage_count: usize,
    sample_rate: f32,
    max_block_size: usize,
    sections: Vec<Biquad>,
    active: usize,
    current: Option<DisfluxSettings>,
    mix: f32,
}

impl DisfluxProcessor {
    pub fn new(channels: usize, stage_count: usize) -> Result<Self, ConfigError> {
        validate_stage_count(stage_count)?;
        Ok(Self {
            channels,
            stage_count,
            sample_rate: 0.0,
            max_block_size: 0,
            sections: Vec::new(),
            active: 0,
            current: None,
            mix: 1.0,
        })
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    pub fn active_stages(&self) -> usize {
        self.active
    }

    /// Resize the bank. Reallocates and re-prepares when already prepared.
    pub fn set_stage_count(&mut self, stage_count: usize) -> Result<(), ConfigError> {
        validate_stage_count(stage_count)?;
        self.stage_count = stage_count;
        if self.sample_rate > 0.0 {
            self.prepare(self.sample_rate, self.max_block_size);
        }
        Ok(())
    }

    pub fn set_settings(&mut self, settings: DisfluxSettings) {
        self.mix = settings.mix.clamp(0.0, 1.0);
        if self.sample_rate <= 0.0 {
            return;
        }
        if let Some(current) = &self.current {
            if !settings.differs(current) {
                return;
            }
        }

        let n = settings.amount.clamp(1, self.stage_count);
        let q = settings.pinch.max(0.5);
        for (k, section) in self.sections[..n].iter_mut().enumerate() {
            let frequency = centre_frequency(&settings, k, n, self.sample_rate);
            section.set_coefficients(Coefficients::design(FilterType::AllPass, frequency, q, 0.0, self.sample_rate));
        }
        if n < self.active {
            for section in &mut self.sections[n..self.active] {
                section.reset();
            }
        }
        self.active = n;
        self.current = Some(settings);
    }

    /// Combined response of the active sections.
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

fn validate_stage_count(stage_count: usize) -> Result<(), ConfigError> {
    if stage_count == 0 || stage_count > MAX_DISFLUX_STAGES {
        return Err(ConfigError::InvalidStageCount { stages: stage_count });
    }
    Ok(())
}

impl Stage for DisfluxProcessor {
    fn name(&self) -> &'static str {
        "disflux"
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        debug!(
            "disflux: prepare at {sample_rate} Hz, {} stages x {} channels",
            self.stage_count, self.channels
        );
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.sections = vec![Biquad::default(); self.stage_count];
        self.active = 0;
        self.current = None;
        self.set_settings(DisfluxSettings::default());
    }

    fn process(&mut self, audio: &mut [&mut [f32]], params: &ParamSnapshot) {
        self.set_settings(DisfluxSettings::from_snapshot(params));
        self.process_buffer(audio);
    }

    fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}
