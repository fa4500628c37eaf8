//! Arpeggio - a tiny note source for the demo host
//!
//! Runs on the UI thread and pushes note messages into the processor's
//! message queue. Timing follows the UI loop, which is plenty for a demo.

use std::time::{Duration, Instant};

use flux_suite::synth::SynthMessage;
use rtrb::Producer;

/// Semitone offsets from the root, played as sixteenth notes.
const PATTERN: [u8; 8] = [0, 7, 12, 15, 19, 15, 12, 7];

pub struct Arpeggio {
    root: u8,
    step: Duration,
    next_at: Instant,
    index: usize,
    held: Option<u8>,
    enabled: bool,
}

impl Arpeggio {
    pub fn new(root: u8, bpm: f64) -> Self {
        let step = Duration::from_secs_f64(60.0 / bpm.max(1.0) / 4.0);
        Self { root, step, next_at: Instant::now(), index: 0, held: None, enabled: true }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self, tx: &mut Producer<SynthMessage>) {
        self.enabled = !self.enabled;
        if self.enabled {
            self.next_at = Instant::now();
        } else {
            self.release(tx);
        }
    }

    /// Emit every step that is due at `now`.
    pub fn poll(&mut self, now: Instant, tx: &mut Producer<SynthMessage>) {
        if !self.enabled {
            return;
        }
        while now >= self.next_at {
            self.release(tx);
            let note = self.root.saturating_add(PATTERN[self.index % PATTERN.len()]).min(127);
            let velocity = if self.index % 4 == 0 { 120 } else { 90 };
            if tx.push(SynthMessage::NoteOn { note, velocity }).is_ok() {
                self.held = Some(note);
            } else {
                log::debug!("message queue full, dropped note {note}");
            }
            self.index = self.index.wrapping_add(1);
            self.next_at += self.step;
        }
    }

    fn release(&mut self, tx: &mut Producer<SynthMessage>) {
        if let Some(note) = self.held.take() {
            if tx.push(SynthMessage::NoteOff { note, velocity: 0 }).is_err() {
                log::debug!("message queue full, dropped release of {note}");
            }
        }
    }
}
