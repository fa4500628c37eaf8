/// A channel voice message as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiEvent {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// 14-bit bend centred on zero, -8192..=8191.
    PitchBend { channel: u8, value: i16 },
    ProgramChange { channel: u8, program: u8 },
}

impl MidiEvent {
    /// Decode one raw message. Running status and system messages are not
    /// supported and yield `None`.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let (&status, data) = bytes.split_first()?;
        let channel = status & 0x0F;
        let byte = |i: usize| data.get(i).copied().filter(|b| b & 0x80 == 0);

        match status & 0xF0 {
            0x80 => Some(MidiEvent::NoteOff { channel, key: byte(0)?, velocity: byte(1)? }),
            0x90 => Some(MidiEvent::NoteOn { channel, key: byte(0)?, velocity: byte(1)? }),
            0xB0 => Some(MidiEvent::ControlChange { channel, controller: byte(0)?, value: byte(1)? }),
            0xC0 => Some(MidiEvent::ProgramChange { channel, program: byte(0)? }),
            0xE0 => {
                let value = (i16::from(byte(1)?) << 7 | i16::from(byte(0)?)) - 8192;
                Some(MidiEvent::PitchBend { channel, value })
            }
            _ => None,
        }
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiEvent::NoteOn { channel, .. }
            | MidiEvent::NoteOff { channel, .. }
            | MidiEvent::ControlChange { channel, .. }
            | MidiEvent::PitchBend { channel, .. }
            | MidiEvent::ProgramChange { channel, .. } => channel,
        }
    }
}
