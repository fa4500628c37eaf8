// Voice management and polyphony.
// This layer sits above the DSP primitives and turns note messages into audio.

pub mod message;
pub mod poly;
pub mod voice;

pub use message::{MessageReceiver, SynthMessage};
pub use poly::PolySynth;
pub use voice::{SynthVoice, VoiceSettings, VoiceState};
