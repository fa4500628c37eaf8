use crate::dsp::distortion::db_to_gain;
use crate::dsp::envelope::{AdhEnvelope, AdhParameters, EnvelopeStage};
use crate::dsp::oscillator::{AnalogOscillator, Waveform};
use crate::io::converter::midi_note_to_freq;
use crate::params::{Param, ParamSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Free,     // Available for allocation
    Active,   // Attack or hold
    Decaying, // Running down to silence
}

/// Sound of a voice, shared by every voice of a [`PolySynth`](super::poly::PolySynth).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub waveform: Waveform,
    pub pulse_width: f32,
    pub octave: i32,
    pub semitone: i32,
    pub gain_db: f32,
    pub drive: f32,
    pub bias: f32,
    /// Waveform bend, -1..1.
    pub bend: f32,
    /// Hard sync amount, 0..1.
    pub sync: f32,
    pub amp: AdhParameters,
    pub pitch: AdhParameters,
    /// Pitch envelope depth in semitones.
    pub pitch_depth: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            waveform: Waveform::Saw,
            pulse_width: 0.5,
            octave: 0,
            semitone: 0,
            gain_db: -6.0,
            drive: 0.0,
            bias: 0.0,
            bend: 0.0,
            sync: 0.0,
            amp: AdhParameters::default(),
            pitch: AdhParameters {
                attack_ms: 0.0,
                hold_ms: 0.0,
                decay_ms: 50.0,
                attack_skew: 1.0,
                decay_skew: 4.0,
            },
            pitch_depth: 0.0,
        }
    }
}

impl VoiceSettings {
    pub fn from_snapshot(params: &ParamSnapshot) -> Self {
        Self {
            waveform: Waveform::try_from(params.index(Param::OscWaveform)).unwrap_or(Waveform::Saw),
            pulse_width: params.get(Param::OscPwm),
            octave: params.get(Param::OscOctave).round() as i32,
            semitone: params.get(Param::OscSemitone).round() as i32,
            gain_db: params.get(Param::OscGain),
            drive: params.get(Param::OscDrive),
            bias: params.get(Param::OscBias),
            bend: params.get(Param::OscBend),
            sync: params.get(Param::OscSync),
            amp: AdhParameters {
                attack_ms: params.get(Param::EnvAttack),
                hold_ms: params.get(Param::EnvHold),
                decay_ms: params.get(Param::EnvDecay),
                attack_skew: params.get(Param::EnvAttackSkew),
                decay_skew: params.get(Param::EnvSkew),
            },
            pitch: AdhParameters {
                attack_ms: 0.0,
                hold_ms: params.get(Param::PitchEnvHold),
                decay_ms: params.get(Param::PitchEnvDecay),
                attack_skew: 1.0,
                decay_skew: params.get(Param::PitchEnvSkew),
            },
            pitch_depth: params.get(Param::PitchEnvDepth),
        }
    }

    fn transpose(&self) -> f32 {
        (self.octave * 12 + self.semitone) as f32
    }
}

/// One note: oscillator shaped by an amplitude envelope, with a second
/// envelope sweeping the pitch down onto the note.
pub struct SynthVoice {
    osc: AnalogOscillator,
    amp_env: AdhEnvelope,
    pitch_env: AdhEnvelope,
    settings: VoiceSettings,
    note: u8,
    velocity: u8,
    age: u64,
    bend_cents: f32,
}

impl SynthVoice {
    pub fn new(sample_rate: f32) -> Self {
        let settings = VoiceSettings::default();
        let mut voice = Self {
            osc: AnalogOscillator::new(sample_rate),
            amp_env: AdhEnvelope::new(sample_rate),
            pitch_env: AdhEnvelope::new(sample_rate),
            settings,
            note: 0,
            velocity: 0,
            age: 0,
            bend_cents: 0.0,
        };
        voice.apply_settings(settings);
        voice
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.osc.set_sample_rate(sample_rate);
        self.amp_env.set_sample_rate(sample_rate);
        self.pitch_env.set_sample_rate(sample_rate);
    }

    pub fn apply_settings(&mut self, settings: VoiceSettings) {
        self.settings = settings;
        self.osc.set_waveform(settings.waveform);
        self.osc.set_pulse_width(settings.pulse_width);
        self.osc.set_bend(settings.bend);
        self.osc.set_sync(settings.sync);
        self.osc.set_drive(settings.drive);
        self.osc.set_bias(settings.bias);
        self.amp_env.set_parameters(settings.amp);
        self.pitch_env.set_parameters(settings.pitch);
    }

    pub fn set_pitch_bend(&mut self, cents: f32) {
        self.bend_cents = cents;
    }

    /// Start (or retrigger) a note. The oscillator restarts at phase zero.
    pub fn note_on(&mut self, note: u8, velocity: u8, age: u64) {
        self.note = note;
        self.velocity = velocity;
        self.age = age;
        self.osc.reset_phase();
        self.amp_env.note_on();
        self.pitch_env.note_on();
    }

    pub fn note_off(&mut self) {
        self.amp_env.note_off();
        self.pitch_env.note_off();
    }

    fn frequency(&self, pitch_level: f32) -> f32 {
        let semitones = self.settings.transpose() + self.settings.pitch_depth * pitch_level + self.bend_cents / 100.0;
        midi_note_to_freq(self.note) * 2.0_f32.powf(semitones / 12.0)
    }

    /// Overwrite `out` with the next `out.len()` samples.
    pub fn render(&mut self, out: &mut [f32]) {
        if !self.is_active() {
            out.fill(0.0);
            return;
        }

        let gain = db_to_gain(self.settings.gain_db) * f32::from(self.velocity) / 127.0;
        let sweep = self.settings.pitch_depth != 0.0;
        if !sweep {
            self.osc.set_frequency(self.frequency(0.0));
        }

        for sample in out.iter_mut() {
            if sweep {
                let level = self.pitch_env.next_sample();
                self.osc.set_frequency(self.frequency(level));
            }
            let amp = self.amp_env.next_sample();
            *sample = self.osc.next_sample() * amp * gain;
        }
    }

    pub fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    pub fn state(&self) -> VoiceState {
        match self.amp_env.stage() {
            EnvelopeStage::Idle => VoiceState::Free,
            EnvelopeStage::Attack | EnvelopeStage::Hold => VoiceState::Active,
            EnvelopeStage::Decay => VoiceState::Decaying,
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn reset(&mut self) {
        self.amp_env.reset();
        self.pitch_env.reset();
        self.osc.reset_phase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn quick_voice() -> SynthVoice {
        let mut voice = SynthVoice::new(SAMPLE_RATE);
        voice.apply_settings(VoiceSettings {
            gain_db: 0.0,
            amp: AdhParameters {
                attack_ms: 1.0,
                hold_ms: 5.0,
                decay_ms: 20.0,
                attack_skew: 1.0,
                decay_skew: 1.0,
            },
            ..VoiceSettings::default()
        });
        voice
    }

    #[test]
    fn silent_until_triggered() {
        let mut voice = quick_voice();
        let mut out = [1.0f32; 64];
        voice.render(&mut out);
        assert!(out.iter().all(|&s| s == 0.0));
        assert_eq!(voice.state(), VoiceState::Free);
    }

    #[test]
    fn note_runs_through_to_free() {
        let mut voice = quick_voice();
        voice.note_on(69, 127, 0);
        assert_eq!(voice.state(), VoiceState::Active);

        let mut out = vec![0.0f32; 480];
        voice.render(&mut out);
        let peak = out.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.5, "a full velocity note should be loud, peak {peak}");

        let mut tail = vec![0.0f32; 2400];
        voice.render(&mut tail);
        assert_eq!(voice.state(), VoiceState::Free);
        assert!(!voice.is_active());
    }

    #[test]
    fn note_off_moves_to_decay() {
        let mut voice = quick_voice();
        voice.note_on(60, 100, 0);
        let mut out = vec![0.0f32; 96];
        voice.render(&mut out);
        voice.note_off();
        assert_eq!(voice.state(), VoiceState::Decaying);
    }

    #[test]
    fn retrigger_restarts_the_amplitude() {
        let mut voice = quick_voice();
        voice.note_on(69, 127, 0);
        let mut out = vec![0.0f32; 240];
        voice.render(&mut out);
        assert_eq!(voice.state(), VoiceState::Active);

        voice.note_on(69, 127, 1);
        let mut first = [0.0f32; 1];
        voice.render(&mut first);
        assert!(first[0].abs() < 0.05, "retrigger should start from silence, got {}", first[0]);
    }

    #[test]
    fn shaping_parameters_reach_the_oscillator() {
        let tree = crate::params::build_tree().unwrap();
        tree.set_plain("oscSync", 0.5).unwrap();
        tree.set_plain("oscDrive", 3.0).unwrap();
        tree.set_plain("envAttackSkew", 4.0).unwrap();
        let settings = VoiceSettings::from_snapshot(&tree.snapshot());
        assert!((settings.sync - 0.5).abs() < 1e-5);
        assert!((settings.drive - 3.0).abs() < 1e-4);
        assert!((settings.amp.attack_skew - 4.0).abs() < 1e-4);

        let mut voice = quick_voice();
        voice.apply_settings(settings);
        assert!((voice.osc.sync_ratio() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn octave_and_semitone_transpose() {
        let mut voice = quick_voice();
        voice.apply_settings(VoiceSettings {
            octave: 1,
            semitone: -12,
            ..voice.settings
        });
        voice.note = 69;
        assert!((voice.frequency(0.0) - 440.0).abs() < 1e-3);

        voice.apply_settings(VoiceSettings {
            octave: 1,
            semitone: 0,
            ..voice.settings
        });
        assert!((voice.frequency(0.0) - 880.0).abs() < 1e-2);
    }

    #[test]
    fn pitch_envelope_starts_high_and_settles() {
        let mut voice = quick_voice();
        voice.apply_settings(VoiceSettings {
            pitch_depth: 12.0,
            ..voice.settings
        });
        voice.note = 57;
        assert!((voice.frequency(1.0) - 440.0).abs() < 1e-2);
        assert!((voice.frequency(0.0) - 220.0).abs() < 1e-2);
    }
}
