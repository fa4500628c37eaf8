// External interfaces: MIDI decoding and conversion into synth messages.

pub mod converter;
pub mod midi;

pub use converter::{midi_note_to_freq, midi_to_synth};
pub use midi::MidiEvent;
