use log::debug;

use crate::dsp::delay::DelayLine;
use crate::dsp::one_pole::OnePoleLowpass;
use crate::graph::stage::{blend, Stage, StageStatus};
use crate::params::{Param, ParamSnapshot};
use crate::MAX_CHANNELS;

/*
Heretic
=======

A saturating feedback delay. The saturator sits inside the loop, so every
pass through the delay is driven again and the repeats get dirtier as they
build up; a one-pole lowpass darkens them on the way back.

    x ──→(+)──→ tanh(drive · _) ──┬──────────────→ mix ──→ out
          ↑                       │
          │                       ↓
       feedback ←── delay ←── lowpass

Loop gain
---------

tanh has slope 1 at zero, so small signals see a loop gain of
`drive · feedback`. At or above 1 the loop self-oscillates. Feedback is
clamped at commit time so that

    drive · feedback ≤ 1 - ε        (ε = 0.1)

and the clamp is reported through `StageStatus::FEEDBACK_CLAMPED`. Because
tanh never exceeds ±1 and the lowpass never amplifies, the loop content can
only shrink once the input stops.
*/

/// Safety margin below unity loop gain.
pub const LOOP_MARGIN: f32 = 0.1;
/// Longest delay time the processor allocates for.
pub const MAX_TIME_MS: f32 = 240.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HereticSettings {
    pub drive: f32,
    pub feedback: f32,
    pub tone_hz: f32,
    pub time_ms: f32,
    pub mix: f32,
}

impl Default for HereticSettings {
    fn default() -> Self {
        Self {
            drive: 1.5,
            feedback: 0.2,
            tone_hz: 6_000.0,
            time_ms: 20.0,
            mix: 0.5,
        }
    }
}

impl HereticSettings {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        Self {
            drive: params.get(Param::HereticDrive),
            feedback: params.get(Param::HereticFeedback),
            tone_hz: params.get(Param::HereticTone),
            time_ms: params.get(Param::HereticTime),
            mix: params.get(Param::HereticMix),
        }
    }
}

/// Largest feedback that keeps `drive · feedback` at or below `1 - ε`.
#[inline]
pub fn max_feedback(drive: f32) -> f32 {
    (1.0 - LOOP_MARGIN) / drive.max(f32::MIN_POSITIVE)
}

pub struct HereticProcessor {
    channels: usize,
    sample_rate: f32,
    lines: Vec<DelayLine>,
    tone: [OnePoleLowpass; MAX_CHANNELS],
    drive: f32,
    feedback: f32,
    delay_samples: usize,
    mix: f32,
    tone_hz: f32,
    status: StageStatus,
}

impl HereticProcessor {
    pub fn new(channels: usize) -> Self {
        Self {
            channels,
            sample_rate: 0.0,
            lines: Vec::new(),
            tone: Default::default(),
            drive: 1.0,
            feedback: 0.0,
            delay_samples: 1,
            mix: 0.0,
            tone_hz: 0.0,
            status: StageStatus::CLEAR,
        }
    }

    /// Feedback actually used after the loop-gain clamp.
    pub fn effective_feedback(&self) -> f32 {
        self.feedback
    }

    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn set_settings(&mut self, settings: HereticSettings) {
        self.drive = settings.drive.max(0.0);
        let requested = settings.feedback.clamp(0.0, 1.0);
        let limit = max_feedback(self.drive);
        self.feedback = requested.min(limit);
        self.status.set(StageStatus::FEEDBACK_CLAMPED, requested > limit);
        self.mix = settings.mix.clamp(0.0, 1.0);

        if self.sample_rate <= 0.0 {
            return;
        }
        let max_delay = self.lines.first().map_or(1, DelayLine::max_delay);
        let samples = (settings.time_ms.clamp(0.0, MAX_TIME_MS) * 0.001 * self.sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, max_delay);

        if settings.tone_hz != self.tone_hz {
            self.tone_hz = settings.tone_hz;
            for filter in &mut self.tone {
                filter.set_cutoff(settings.tone_hz, self.sample_rate);
            }
        }
    }

    pub fn process_buffer(&mut self, audio: &mut [&mut [f32]]) {
        let (drive, feedback, mix, delay) = (self.drive, self.feedback, self.mix, self.delay_samples);
        for (channel, samples) in audio.iter_mut().enumerate().take(self.channels) {
            let Some(line) = self.lines.get_mut(channel) else {
                return;
            };
            let tone = &mut self.tone[channel];
            for sample in samples.iter_mut() {
                let x = *sample;
                let fed_back = line.read(delay);
                let y = (drive * (x + feedback * fed_back)).tanh();
                line.push(tone.process(y));
                *sample = blend(x, y, mix);
            }
        }
    }
}

impl Stage for HereticProcessor {
    fn name(&self) -> &'static str {
        "heretic"
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        let capacity = (MAX_TIME_MS * 0.001 * sample_rate).ceil() as usize;
        debug!("heretic: prepare at {sample_rate} Hz, block {max_block_size}, {capacity} samples of delay");
        self.sample_rate = sample_rate;
        self.lines = (0..self.channels).map(|_| DelayLine::new(capacity)).collect();
        for filter in &mut self.tone {
            filter.reset();
        }
        self.tone_hz = 0.0;
        self.set_settings(HereticSettings::default());
    }

    fn process(&mut self, audio: &mut [&mut [f32]], params: &ParamSnapshot) {
        self.set_settings(HereticSettings::from_snapshot(params));
        self.process_buffer(audio);
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.reset();
        }
        for filter in &mut self.tone {
            filter.reset();
        }
    }

    fn status(&self) -> StageStatus {
        self.status
    }
}
