use std::f32::consts::TAU;

use crate::error::ConfigError;

/*
Band-Limited Oscillator
=======================

A naive sawtooth (`2t - 1`) jumps instantly from +1 to -1. That jump contains
harmonics all the way up, and everything above Nyquist folds back down as
inharmonic aliasing, which is audible as a metallic whine on high notes.

PolyBLEP
--------

Instead of rendering a perfect step we subtract the difference between a
perfect step and a band-limited one (a "BLEP"). The polynomial version only
touches the two samples around each discontinuity:

    t < dt:        x = t / dt          blep = 2x - x² - 1
    t > 1 - dt:    x = (t - 1) / dt    blep = x² + 2x + 1
    otherwise                          blep = 0

where t is the phase in [0, 1) and dt the phase increment per sample.

  saw     = (2t - 1) - blep(t)
  pulse   = naive pulse + blep(t) - blep(frac(t + 1 - width))
  square  = pulse with width 0.5

PolyBLAMP
---------

A triangle has no jumps, only corners where the slope flips. Integrating the
BLEP gives a correction for corners:

    t < dt:        x = t / dt          blamp = (1 - x)³ / 6
    t > 1 - dt:    x = (t - 1) / dt    blamp = (1 + x)³ / 6

The slope changes by ±8 per cycle at each corner, so

  triangle = naive triangle + 8·dt · (blamp(t) - blamp(frac(t + 0.5)))

Sine needs no correction.

Bend
----

Bend moves the midpoint of the cycle. With r the fraction of the cycle spent
in the first half (0.5 when straight), the phase is warped as

    t < r:   t' = 0.5 · t / r
    t ≥ r:   t' = 0.5 + 0.5 · (t - r) / (1 - r)

and the waveform reads t'. The square's falling edge and the triangle's peak
land on t = r, so the corrections above are placed there instead of at 0.5,
scaled by the slopes on either side.

Hard sync
---------

A sync ratio s > 1 runs a slave phase s times faster that restarts with every
master cycle. The corrections follow the slave phase; the restart itself is
not band-limited.

Drive and bias
--------------

Drive crossfades into tanh saturation (normalised so a full-scale input
stays full scale) and pushes harder beyond 1. Bias then offsets the result,
which is clamped to ±1.
*/

// tanh(1), the level a full-scale input reaches at drive 1.
const TANH_ONE: f32 = 0.761_594_2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Saw,
    Square,
    Pulse,
}

impl Waveform {
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Saw,
        Waveform::Square,
        Waveform::Pulse,
    ];
}

impl TryFrom<usize> for Waveform {
    type Error = ConfigError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ConfigError::UnsupportedWaveform { index })
    }
}

#[inline]
fn blep(t: f32, dt: f32) -> f32 {
    if t < dt {
        let x = t / dt;
        2.0 * x - x * x - 1.0
    } else if t > 1.0 - dt {
        let x = (t - 1.0) / dt;
        x * x + 2.0 * x + 1.0
    } else {
        0.0
    }
}

#[inline]
fn blamp(t: f32, dt: f32) -> f32 {
    if t < dt {
        let x = 1.0 - t / dt;
        x * x * x / 6.0
    } else if t > 1.0 - dt {
        let x = 1.0 + (t - 1.0) / dt;
        x * x * x / 6.0
    } else {
        0.0
    }
}

#[inline]
fn wrap(t: f32) -> f32 {
    if t >= 1.0 {
        t - 1.0
    } else {
        t
    }
}

/// Saturate `x`; `drive` 0 is clean.
#[inline]
fn saturate(x: f32, drive: f32) -> f32 {
    if drive >= 1.0 {
        (drive * x).tanh() / drive.tanh()
    } else {
        let shaped = x.tanh() / TANH_ONE;
        x + (shaped - x) * drive
    }
}

/// PolyBLEP oscillator with pulse-width modulation, bend, hard sync and a
/// drive/bias output stage.
#[derive(Debug, Clone)]
pub struct AnalogOscillator {
    waveform: Waveform,
    sample_rate: f32,
    frequency: f32,
    phase: f32,
    increment: f32,
    pulse_width: f32,
    // Fraction of the cycle before the midpoint.
    split: f32,
    sync: f32,
    drive: f32,
    bias: f32,
}

impl AnalogOscillator {
    pub fn new(sample_rate: f32) -> Self {
        let mut osc = Self {
            waveform: Waveform::Saw,
            sample_rate,
            frequency: 440.0,
            phase: 0.0,
            increment: 0.0,
            pulse_width: 0.5,
            split: 0.5,
            sync: 1.0,
            drive: 0.0,
            bias: 0.0,
        };
        osc.set_frequency(440.0);
        osc
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.set_frequency(self.frequency);
    }

    /// Frequencies at or above Nyquist are held just below it.
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency.max(0.0);
        self.increment = (self.frequency / self.sample_rate).min(0.499);
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Width of the high part of the pulse, clamped to 0.05..=0.95.
    pub fn set_pulse_width(&mut self, width: f32) {
        self.pulse_width = width.clamp(0.05, 0.95);
    }

    pub fn pulse_width(&self) -> f32 {
        self.pulse_width
    }

    /// Bend in `-1..=1`; 0 leaves the cycle symmetric, ±1 moves the midpoint
    /// to 10 % or 90 % of the cycle.
    pub fn set_bend(&mut self, bend: f32) {
        self.split = 0.5 + 0.4 * bend.clamp(-1.0, 1.0);
    }

    /// Hard sync amount in `0..=1`, mapped to a slave ratio of 1 to 5.
    pub fn set_sync(&mut self, sync: f32) {
        self.sync = 1.0 + 4.0 * sync.clamp(0.0, 1.0);
    }

    pub fn sync_ratio(&self) -> f32 {
        self.sync
    }

    /// Output saturation, `0..=10`.
    pub fn set_drive(&mut self, drive: f32) {
        self.drive = drive.clamp(0.0, 10.0);
    }

    /// DC offset added after saturation, `-1..=1`.
    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias.clamp(-1.0, 1.0);
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        let master = self.phase;
        let (t, dt) = if self.sync > 1.0 {
            ((master * self.sync).fract(), (self.increment * self.sync).min(0.5))
        } else {
            (master, self.increment)
        };

        let value = self.shape(t, dt);
        self.phase = wrap(master + self.increment);

        if self.drive > 0.0 || self.bias != 0.0 {
            (saturate(value, self.drive) + self.bias).clamp(-1.0, 1.0)
        } else {
            value
        }
    }

    #[inline]
    fn shape(&self, t: f32, dt: f32) -> f32 {
        let r = self.split;
        match self.waveform {
            Waveform::Sine => (TAU * self.warp(t)).sin(),
            Waveform::Saw => {
                let corner = 1.0 / r - 1.0 / (1.0 - r);
                2.0 * self.warp(t) - 1.0 - blep(t, dt) + corner * dt * (blamp(t, dt) - blamp(wrap(t + 1.0 - r), dt))
            }
            Waveform::Square => self.pulse(t, dt, r),
            Waveform::Pulse => self.pulse(t, dt, self.unwarp(self.pulse_width)),
            Waveform::Triangle => {
                let naive = 1.0 - 4.0 * (self.warp(t) - 0.5).abs();
                let corner = 2.0 / (r * (1.0 - r));
                naive + corner * dt * (blamp(t, dt) - blamp(wrap(t + 1.0 - r), dt))
            }
        }
    }

    /// Bent phase read by the waveform.
    #[inline]
    fn warp(&self, t: f32) -> f32 {
        let r = self.split;
        if t < r {
            0.5 * t / r
        } else {
            0.5 + 0.5 * (t - r) / (1.0 - r)
        }
    }

    /// Raw phase at which the bent phase reaches `t`.
    #[inline]
    fn unwarp(&self, t: f32) -> f32 {
        let r = self.split;
        if t < 0.5 {
            2.0 * t * r
        } else {
            r + 2.0 * (t - 0.5) * (1.0 - r)
        }
    }

    #[inline]
    fn pulse(&self, t: f32, dt: f32, width: f32) -> f32 {
        let naive = if t < width { 1.0 } else { -1.0 };
        naive + blep(t, dt) - blep(wrap(t + 1.0 - width), dt)
    }

    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
