use std::f32::consts::TAU;

/// One-pole lowpass: `y += g · (x - y)`.
///
/// Used as the tone control inside the Heretic feedback loop.
#[derive(Debug, Clone, Default)]
pub struct OnePoleLowpass {
    g: f32,
    y: f32,
}

impl OnePoleLowpass {
    pub fn new(cutoff_hz: f32, sample_rate: f32) -> Self {
        let mut filter = Self::default();
        filter.set_cutoff(cutoff_hz, sample_rate);
        filter
    }

    /// Matched-pole coefficient, so the -3 dB point lands on `cutoff_hz`
    /// for cutoffs well below Nyquist.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        let cutoff = cutoff_hz.clamp(1.0, sample_rate * 0.49);
        self.g = 1.0 - (-TAU * cutoff / sample_rate).exp();
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        self.y += self.g * (x - self.y);
        self.y
    }

    pub fn reset(&mut self) {
        self.y = 0.0;
    }
}

/// DC blocker: a one-pole highpass around 5 Hz.
///
///   y[n] = x[n] - x[n-1] + R · y[n-1]
#[derive(Debug, Clone)]
pub struct DcBlocker {
    r: f32,
    x1: f32,
    y1: f32,
}

impl DcBlocker {
    pub const CUTOFF_HZ: f32 = 5.0;

    pub fn new(sample_rate: f32) -> Self {
        Self {
            r: (-TAU * Self::CUTOFF_HZ / sample_rate).exp(),
            x1: 0.0,
            y1: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = x - self.x1 + self.r * self.y1;
        self.x1 = x;
        self.y1 = y;
        y
    }

    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}
