use log::debug;

use crate::config::Oversampling;
use crate::dsp::delay::DelayLine;
use crate::dsp::distortion::{crush, db_to_gain, Waveshape, CRUSH_OFF_BITS};
use crate::dsp::one_pole::DcBlocker;
use crate::dsp::oversampling::Oversampler;
use crate::graph::stage::{blend, Stage};
use crate::params::{Param, ParamSnapshot};

/*
Distortion Stage
================

    x ──→ DC blocker ──→ pre gain ──→ ↑N ──→ drive · shape ──→ ↓N ──→ crush ──→ post gain ──→ mix ──→ out
    │                                                                                          ↑
    └──────────────────────────────────── dry (latency matched) ───────────────────────────────┘

Pre gain sets the input level in dB and drive multiplies it into the curve;
together they decide how hard the signal hits it. Crush quantises the
band-limited result at the host rate. Post gain brings the level back. The waveshaper runs at 2x or 4x the host rate, fixed when the
stage is built, so the harmonics it creates above Nyquist are filtered out
instead of folding back.

The dry path is delayed by the oversampler latency so that partial mixes do
not comb filter.
*/

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionSettings {
    pub shape: Waveshape,
    pub pre_gain_db: f32,
    pub drive: f32,
    pub post_gain_db: f32,
    pub symmetry: f32,
    /// Bit depth of the output, 1 to 16; 16 is off.
    pub crush_bits: f32,
    pub mix: f32,
}

impl Default for DistortionSettings {
    fn default() -> Self {
        Self {
            shape: Waveshape::Soft,
            pre_gain_db: 0.0,
            drive: 1.0,
            post_gain_db: 0.0,
            symmetry: 0.0,
            crush_bits: CRUSH_OFF_BITS,
            mix: 1.0,
        }
    }
}

impl DistortionSettings {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        Self {
            shape: Waveshape::from_index(params.index(Param::DistortionType)),
            pre_gain_db: params.get(Param::DistortionPreGain),
            drive: params.get(Param::DistortionDrive),
            post_gain_db: params.get(Param::DistortionPostGain),
            symmetry: params.get(Param::DistortionSymmetry),
            crush_bits: params.get(Param::DistortionCrush),
            mix: params.get(Param::DistortionMix),
        }
    }
}

struct ChannelState {
    dc: DcBlocker,
    oversampler: Oversampler,
    dry: DelayLine,
}

pub struct Distortion {
    channels: usize,
    oversampling: Oversampling,
    state: Vec<ChannelState>,
    shape: Waveshape,
    pre_gain: f32,
    drive: f32,
    post_gain: f32,
    symmetry: f32,
    crush_bits: f32,
    mix: f32,
}

impl Distortion {
    pub fn new(channels: usize, oversampling: Oversampling) -> Self {
        let defaults = DistortionSettings::default();
        let mut stage = Self {
            channels,
            oversampling,
            state: Vec::new(),
            shape: defaults.shape,
            pre_gain: 1.0,
            drive: 1.0,
            post_gain: 1.0,
            symmetry: 0.0,
            crush_bits: CRUSH_OFF_BITS,
            mix: 1.0,
        };
        stage.set_settings(defaults);
        stage
    }

    pub fn oversampling(&self) -> Oversampling {
        self.oversampling
    }

    /// Host-rate latency of the wet path.
    pub fn latency(&self) -> usize {
        Oversampler::new(self.oversampling).latency()
    }

    pub fn set_settings(&mut self, settings: DistortionSettings) {
        self.shape = settings.shape;
        self.pre_gain = db_to_gain(settings.pre_gain_db);
        self.drive = settings.drive.clamp(0.0, 10.0);
        self.post_gain = db_to_gain(settings.post_gain_db);
        self.symmetry = settings.symmetry.clamp(-1.0, 1.0);
        self.crush_bits = settings.crush_bits.clamp(1.0, CRUSH_OFF_BITS);
        self.mix = settings.mix.clamp(0.0, 1.0);
    }

    pub fn process_buffer(&mut self, audio: &mut [&mut [f32]]) {
        if self.mix <= 0.0 {
            return;
        }
        let (shape, symmetry, drive, bits) = (self.shape, self.symmetry, self.drive, self.crush_bits);
        let (pre_gain, post_gain, mix) = (self.pre_gain, self.post_gain, self.mix);

        for (samples, state) in audio.iter_mut().zip(self.state.iter_mut()).take(self.channels) {
            let latency = state.dry.max_delay();
            for sample in samples.iter_mut() {
                let x = *sample;
                let dry = state.dry.read(latency);
                state.dry.push(x);

                let driven = state.dc.process(x) * pre_gain;
                let shaped = state.oversampler.process(driven, |s| shape.apply(s * drive, symmetry));
                let wet = crush(shaped, bits) * post_gain;
                *sample = blend(dry, wet, mix);
            }
        }
    }
}

impl Stage for Distortion {
    fn name(&self) -> &'static str {
        "distortion"
    }

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        let latency = self.latency();
        debug!(
            "distortion: prepare at {sample_rate} Hz, block {max_block_size}, {}x oversampling, latency {latency}",
            self.oversampling.factor()
        );
        self.state = (0..self.channels)
            .map(|_| ChannelState {
                dc: DcBlocker::new(sample_rate),
                oversampler: Oversampler::new(self.oversampling),
                dry: DelayLine::new(latency),
            })
            .collect();
    }

    fn process(&mut self, audio: &mut [&mut [f32]], params: &ParamSnapshot) {
        self.set_settings(DistortionSettings::from_snapshot(params));
        self.process_buffer(audio);
    }

    fn reset(&mut self) {
        for state in &mut self.state {
            state.dc.reset();
            state.oversampler.reset();
            state.dry.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn prepared(settings: DistortionSettings, oversampling: Oversampling) -> Distortion {
        let mut stage = Distortion::new(1, oversampling);
        stage.prepare(SAMPLE_RATE, 512);
        stage.set_settings(settings);
        stage
    }

    fn sine(frequency: f32, len: usize) -> Vec<f32> {
        (0..len).map(|n| (TAU * frequency * n as f32 / SAMPLE_RATE).sin()).collect()
    }

    #[test]
    fn hard_clip_with_unity_post_gain_stays_bounded() {
        for oversampling in [Oversampling::X2, Oversampling::X4] {
            let mut stage = prepared(
                DistortionSettings {
                    shape: Waveshape::Hard,
                    pre_gain_db: 24.0,
                    ..DistortionSettings::default()
                },
                oversampling,
            );
            let mut buffer = sine(440.0, 4800);
            stage.process_buffer(&mut [buffer.as_mut_slice()]);
            let peak = buffer.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
            // Band limiting a clipped wave overshoots a little.
            assert!(peak < 1.25, "{oversampling:?}: peak {peak}");
            assert!(peak > 0.9);
        }
    }

    #[test]
    fn drive_pushes_further_into_the_curve() {
        let mut gentle = prepared(DistortionSettings::default(), Oversampling::X2);
        let mut driven = prepared(
            DistortionSettings {
                drive: 8.0,
                ..DistortionSettings::default()
            },
            Oversampling::X2,
        );
        let mut a = sine(440.0, 4800);
        let mut b = a.clone();
        gentle.process_buffer(&mut [a.as_mut_slice()]);
        driven.process_buffer(&mut [b.as_mut_slice()]);

        let peak = |x: &[f32]| x[2400..].iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        // Soft curve: 1 / (1 + 1) against 8 / (1 + 8).
        assert!((peak(&a) - 0.5).abs() < 0.05, "unit drive peak {}", peak(&a));
        assert!((peak(&b) - 0.89).abs() < 0.05, "drive 8 peak {}", peak(&b));
    }

    #[test]
    fn crush_quantises_the_wet_signal() {
        let mut stage = prepared(
            DistortionSettings {
                shape: Waveshape::Hard,
                crush_bits: 2.0,
                ..DistortionSettings::default()
            },
            Oversampling::X2,
        );
        let mut buffer = sine(440.0, 4800);
        stage.process_buffer(&mut [buffer.as_mut_slice()]);
        for &s in &buffer[2400..] {
            let steps = s * 2.0;
            assert!((steps - steps.round()).abs() < 1e-6, "{s} is off the 2-bit grid");
        }
        assert!(buffer[2400..].iter().any(|&s| (s.abs() - 0.5).abs() < 1e-6));
    }

    #[test]
    fn zero_mix_passes_audio_untouched() {
        let mut stage = prepared(
            DistortionSettings {
                mix: 0.0,
                pre_gain_db: 24.0,
                ..DistortionSettings::default()
            },
            Oversampling::X2,
        );
        let mut buffer = sine(1_000.0, 256);
        let original = buffer.clone();
        stage.process_buffer(&mut [buffer.as_mut_slice()]);
        assert_eq!(buffer, original);
    }

    #[test]
    fn dry_path_matches_wet_latency() {
        let mut stage = prepared(
            DistortionSettings {
                mix: 0.5,
                pre_gain_db: -40.0,
                post_gain_db: 40.0,
                ..DistortionSettings::default()
            },
            Oversampling::X2,
        );
        // At -40 dB the soft curve is nearly linear, so a half mix of two
        // aligned copies reproduces the input, delayed.
        let input = sine(500.0, 9600);
        let mut buffer = input.clone();
        stage.process_buffer(&mut [buffer.as_mut_slice()]);

        let latency = stage.latency();
        let error = buffer[4800..]
            .iter()
            .zip(&input[4800 - latency..])
            .fold(0.0f32, |acc, (y, x)| acc.max((y - x).abs()));
        assert!(error < 0.05, "dry and wet should line up, max error {error}");
    }
}
