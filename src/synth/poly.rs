use log::debug;

use crate::params::ParamSnapshot;
use crate::synth::message::{MessageReceiver, SynthMessage};
use crate::synth::voice::{SynthVoice, VoiceSettings, VoiceState};

/// Fixed-size pool of [`SynthVoice`]s.
///
/// Voice allocation, in order of preference:
/// 1. a voice already playing the same note (retrigger),
/// 2. a free voice,
/// 3. the oldest voice that is already decaying,
/// 4. the oldest voice overall.
pub struct PolySynth {
    voices: Vec<SynthVoice>,
    temp_buffer: Vec<f32>,
    settings: VoiceSettings,
    frame_counter: u64,
}

impl PolySynth {
    pub fn new(sample_rate: f32, polyphony: usize, max_block_size: usize) -> Self {
        Self {
            voices: (0..polyphony.max(1)).map(|_| SynthVoice::new(sample_rate)).collect(),
            temp_buffer: vec![0.0; max_block_size.max(1)],
            settings: VoiceSettings::default(),
            frame_counter: 0,
        }
    }

    /// Resize scratch space and retune the voices. Not realtime-safe.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) {
        debug!(
            "synth: prepare {} voices at {sample_rate} Hz, block {max_block_size}",
            self.voices.len()
        );
        self.temp_buffer = vec![0.0; max_block_size.max(1)];
        for voice in &mut self.voices {
            voice.set_sample_rate(sample_rate);
            voice.reset();
        }
        self.frame_counter = 0;
    }

    pub fn polyphony(&self) -> usize {
        self.voices.len()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    pub fn voices(&self) -> &[SynthVoice] {
        &self.voices
    }

    /// Push the voice settings from a parameter snapshot into every voice.
    pub fn apply(&mut self, params: &ParamSnapshot) {
        let settings = VoiceSettings::from_snapshot(params);
        if settings != self.settings {
            self.set_settings(settings);
        }
    }

    pub fn set_settings(&mut self, settings: VoiceSettings) {
        self.settings = settings;
        for voice in &mut self.voices {
            voice.apply_settings(settings);
        }
    }

    pub fn handle(&mut self, message: SynthMessage) {
        match message {
            SynthMessage::NoteOn { velocity: 0, note } => self.release(note),
            SynthMessage::NoteOn { note, velocity } => {
                let age = self.frame_counter;
                let index = self.allocate_voice(note);
                self.voices[index].note_on(note, velocity, age);
            }
            SynthMessage::NoteOff { note, .. } => self.release(note),
            SynthMessage::PitchBend { cents } => {
                for voice in &mut self.voices {
                    voice.set_pitch_bend(cents);
                }
            }
            SynthMessage::AllNotesOff => {
                for voice in &mut self.voices {
                    voice.note_off();
                }
            }
        }
    }

    /// Handle every message waiting in `rx`.
    pub fn drain(&mut self, rx: &mut dyn MessageReceiver) {
        while let Some(message) = rx.pop() {
            self.handle(message);
        }
    }

    fn release(&mut self, note: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.note() == note && v.is_active()) {
            voice.note_off();
        }
    }

    fn allocate_voice(&self, note: u8) -> usize {
        if let Some(index) = self
            .voices
            .iter()
            .position(|v| v.is_active() && v.note() == note)
        {
            return index;
        }
        if let Some(index) = self.voices.iter().position(|v| v.state() == VoiceState::Free) {
            return index;
        }

        let oldest = |state: Option<VoiceState>| {
            self.voices
                .iter()
                .enumerate()
                .filter(|(_, v)| state.map_or(true, |s| v.state() == s))
                .min_by_key(|(_, v)| v.age())
                .map(|(index, _)| index)
        };
        oldest(Some(VoiceState::Decaying))
            .or_else(|| oldest(None))
            .unwrap_or(0)
    }

    /// Overwrite `out` with the mixed voices.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let chunk = self.temp_buffer.len();
        for block in out.chunks_mut(chunk) {
            let len = block.len();
            for voice in &mut self.voices {
                if voice.is_active() {
                    voice.render(&mut self.temp_buffer[..len]);
                    for (o, v) in block.iter_mut().zip(&self.temp_buffer[..len]) {
                        *o += v;
                    }
                }
            }
        }
        self.frame_counter += out.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::envelope::AdhParameters;

    const SAMPLE_RATE: f32 = 48_000.0;

    fn synth(polyphony: usize) -> PolySynth {
        let mut synth = PolySynth::new(SAMPLE_RATE, polyphony, 256);
        synth.set_settings(VoiceSettings {
            amp: AdhParameters {
                attack_ms: 1.0,
                hold_ms: 1_000.0,
                decay_ms: 100.0,
                attack_skew: 1.0,
                decay_skew: 1.0,
            },
            ..VoiceSettings::default()
        });
        synth
    }

    fn note_on(note: u8) -> SynthMessage {
        SynthMessage::NoteOn { note, velocity: 100 }
    }

    fn notes(synth: &PolySynth) -> Vec<u8> {
        synth.voices().iter().filter(|v| v.is_active()).map(|v| v.note()).collect()
    }

    #[test]
    fn fills_free_voices_first() {
        let mut synth = synth(3);
        let mut out = vec![0.0; 64];
        for note in [60, 64, 67] {
            synth.handle(note_on(note));
            synth.render_block(&mut out);
        }
        assert_eq!(synth.active_voices(), 3);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn steals_oldest_voice_when_full() {
        let mut synth = synth(2);
        let mut out = vec![0.0; 64];
        synth.handle(note_on(60));
        synth.render_block(&mut out);
        synth.handle(note_on(64));
        synth.render_block(&mut out);
        synth.handle(note_on(67));

        let mut active = notes(&synth);
        active.sort_unstable();
        assert_eq!(active, vec![64, 67]);
    }

    #[test]
    fn prefers_decaying_voices_when_stealing() {
        let mut synth = synth(2);
        let mut out = vec![0.0; 64];
        synth.handle(note_on(60));
        synth.render_block(&mut out);
        synth.handle(note_on(64));
        synth.render_block(&mut out);
        synth.handle(SynthMessage::NoteOff { note: 64, velocity: 0 });
        synth.render_block(&mut out);

        synth.handle(note_on(67));
        let mut active = notes(&synth);
        active.sort_unstable();
        assert_eq!(active, vec![60, 67], "the released voice should be taken before the older held one");
    }

    #[test]
    fn repeated_note_retriggers_its_voice() {
        let mut synth = synth(4);
        let mut out = vec![0.0; 64];
        synth.handle(note_on(60));
        synth.render_block(&mut out);
        synth.handle(note_on(60));
        assert_eq!(synth.active_voices(), 1);
    }

    #[test]
    fn zero_velocity_note_on_releases() {
        let mut synth = synth(2);
        let mut out = vec![0.0; 64];
        synth.handle(note_on(60));
        synth.render_block(&mut out);
        synth.handle(SynthMessage::NoteOn { note: 60, velocity: 0 });
        assert_eq!(synth.voices()[0].state(), VoiceState::Decaying);
    }

    #[test]
    fn render_handles_blocks_longer_than_scratch() {
        let mut synth = PolySynth::new(SAMPLE_RATE, 2, 16);
        synth.handle(note_on(69));
        let mut out = vec![0.0; 100];
        synth.render_block(&mut out);
        assert!(out[50..].iter().any(|&s| s != 0.0));
    }
}
