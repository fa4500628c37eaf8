/*
AHD Envelope
============

Attack / Hold / Decay: the envelope shape of percussive synth voices. There is
no sustain stage; once triggered the envelope runs to silence on its own.
A note-off simply jumps to Decay from wherever the level is.

Vocabulary
----------

  level       Current output, 0.0 to 1.0. Multiplies the oscillator.

  stage       Idle, Attack, Hold or Decay.

  skew        Exponent applied to a ramp. 1 is a straight line. On the
              decay, larger values drop quickly at first and then tail off,
              which sounds closer to a natural exponential decay. On the
              attack, values below 1 rise quickly and values above 1 ease in.


The Shape
---------

  Level
    1.0 ┐   ┌────────┐
        │  ╱          ╲
        │ ╱            ╲_
        │╱               ╲___
    0.0 └──────────────────────╲___→ Time
         Attack  Hold   Decay

  attack   level = progress^attack_skew      (0 → 1)
  hold     level = 1
  decay    level = start · (1 - progress)^skew


The State Machine
-----------------

    ┌──────┐ note_on ┌────────┐ level ≥ 1 ┌──────┐ hold elapsed ┌───────┐
    │ Idle │ ──────→ │ Attack │ ────────→ │ Hold │ ───────────→ │ Decay │
    └──────┘         └────────┘           └──────┘              └───────┘
       ↑                                                            │
       └──────────────── level ≤ silence threshold ─────────────────┘

  note_on from any stage restarts the envelope: level and ramp go back to
  zero and Attack begins again. A zero attack time enters Hold on the very
  first sample. note_off skips whatever is left of Attack or Hold and moves
  to Decay from the current level.
*/

/// Below this the envelope is considered silent and goes Idle.
pub const SILENCE_THRESHOLD: f32 = 1.0e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Hold,
    Decay,
}

/// Envelope timing. Times are in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdhParameters {
    pub attack_ms: f32,
    pub hold_ms: f32,
    pub decay_ms: f32,
    pub attack_skew: f32,
    pub decay_skew: f32,
}

impl Default for AdhParameters {
    fn default() -> Self {
        Self {
            attack_ms: 15.0,
            hold_ms: 80.0,
            decay_ms: 500.0,
            attack_skew: 1.0,
            decay_skew: 2.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdhEnvelope {
    params: AdhParameters,
    sample_rate: f32,

    stage: EnvelopeStage,
    level: f32,

    // Progress through the current ramp, 0.0 to 1.0.
    progress: f32,
    hold_elapsed: u32,
    decay_start_level: f32,
}

impl AdhEnvelope {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            params: AdhParameters::default(),
            sample_rate,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            progress: 0.0,
            hold_elapsed: 0,
            decay_start_level: 0.0,
        }
    }

    pub fn with_parameters(mut self, params: AdhParameters) -> Self {
        self.params = params;
        self
    }

    /// New timings apply from the next sample; a running ramp continues from
    /// its current progress.
    pub fn set_parameters(&mut self, params: AdhParameters) {
        self.params = params;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn parameters(&self) -> &AdhParameters {
        &self.params
    }

    pub fn note_on(&mut self) {
        self.level = 0.0;
        self.progress = 0.0;
        self.hold_elapsed = 0;
        self.decay_start_level = 0.0;
        self.stage = EnvelopeStage::Attack;
    }

    pub fn note_off(&mut self) {
        if matches!(self.stage, EnvelopeStage::Idle | EnvelopeStage::Decay) {
            return;
        }
        self.start_decay();
    }

    fn start_decay(&mut self) {
        self.decay_start_level = self.level;
        self.progress = 0.0;
        self.stage = EnvelopeStage::Decay;
    }

    fn samples(&self, ms: f32) -> f32 {
        (ms.max(0.0) * 0.001 * self.sample_rate).round()
    }

    /// Advance one sample and return the new level.
    pub fn next_sample(&mut self) -> f32 {
        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }

            EnvelopeStage::Attack => {
                let total = self.samples(self.params.attack_ms);
                self.progress = if total < 1.0 { 1.0 } else { self.progress + 1.0 / total };
                self.level = self.progress.min(1.0).powf(self.params.attack_skew.max(0.01));

                if self.progress >= 1.0 {
                    self.level = 1.0;
                    self.hold_elapsed = 0;
                    self.stage = EnvelopeStage::Hold;
                }
            }

            EnvelopeStage::Hold => {
                self.level = 1.0;
                self.hold_elapsed = self.hold_elapsed.saturating_add(1);
                if self.hold_elapsed as f32 >= self.samples(self.params.hold_ms) {
                    self.start_decay();
                }
            }

            EnvelopeStage::Decay => {
                let total = self.samples(self.params.decay_ms);
                self.progress = if total < 1.0 { 1.0 } else { self.progress + 1.0 / total };
                let remaining = (1.0 - self.progress).max(0.0);
                self.level = self.decay_start_level * remaining.powf(self.params.decay_skew.max(0.01));

                if self.level <= SILENCE_THRESHOLD {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        debug_assert!((0.0..=1.0).contains(&self.level));
        self.level
    }

    /// Fill `buffer` with consecutive envelope values.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample();
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
        self.progress = 0.0;
        self.hold_elapsed = 0;
        self.decay_start_level = 0.0;
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }
}
