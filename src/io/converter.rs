use crate::{io::midi::MidiEvent, synth::message::SynthMessage};

/// Bend range of a full pitch wheel throw, in cents.
pub const PITCH_BEND_RANGE_CENTS: f32 = 200.0;

/// Translate a MIDI event on `channel_filter` into a synth message.
pub fn midi_to_synth(midi: MidiEvent, channel_filter: u8) -> Option<SynthMessage> {
    if midi.channel() != channel_filter {
        return None;
    }
    match midi {
        MidiEvent::NoteOn { key, velocity, .. } => Some(SynthMessage::NoteOn { note: key, velocity }),
        MidiEvent::NoteOff { key, velocity, .. } => Some(SynthMessage::NoteOff { note: key, velocity }),
        MidiEvent::PitchBend { value, .. } => Some(SynthMessage::PitchBend {
            cents: f32::from(value) / 8192.0 * PITCH_BEND_RANGE_CENTS,
        }),
        // CC 123: all notes off.
        MidiEvent::ControlChange { controller: 123, .. } => Some(SynthMessage::AllNotesOff),
        _ => None,
    }
}

/// A4 = 440 Hz = MIDI note 69.
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((f32::from(note) - 69.0) / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_by_channel() {
        let on = MidiEvent::NoteOn { channel: 2, key: 64, velocity: 90 };
        assert_eq!(midi_to_synth(on, 2), Some(SynthMessage::NoteOn { note: 64, velocity: 90 }));
        assert_eq!(midi_to_synth(on, 0), None);
    }

    #[test]
    fn pitch_bend_maps_to_cents() {
        let bend = MidiEvent::PitchBend { channel: 0, value: -8192 };
        assert_eq!(midi_to_synth(bend, 0), Some(SynthMessage::PitchBend { cents: -200.0 }));
    }

    #[test]
    fn note_frequencies() {
        assert!((midi_note_to_freq(69) - 440.0).abs() < 1e-4);
        assert!((midi_note_to_freq(57) - 220.0).abs() < 1e-3);
        assert!((midi_note_to_freq(60) - 261.626).abs() < 1e-2);
    }
}
