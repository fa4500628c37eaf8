use std::f64::consts::PI;

use rustfft::num_complex::Complex32;

use crate::MAX_CHANNELS;

/*
Biquad Sections
===============

A biquad is a second order IIR filter: two poles and two zeros. Every
response in this crate (low-pass, high-pass, band-pass, notch, peak, all-pass)
is the same difference equation with different coefficients.

    H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2)

Coefficients come from the RBJ "Audio EQ Cookbook":

    w0    = 2π · f0 / fs
    alpha = sin(w0) / (2Q)
    A     = 10^(gain_db / 40)         (peak only)

| type      | b0          | b1       | b2          | a0        | a1       | a2        |
| --------- | ----------- | -------- | ----------- | --------- | -------- | --------- |
| low-pass  | (1-cos)/2   | 1-cos    | (1-cos)/2   | 1+alpha   | -2cos    | 1-alpha   |
| high-pass | (1+cos)/2   | -(1+cos) | (1+cos)/2   | 1+alpha   | -2cos    | 1-alpha   |
| band-pass | alpha       | 0        | -alpha      | 1+alpha   | -2cos    | 1-alpha   |
| notch     | 1           | -2cos    | 1           | 1+alpha   | -2cos    | 1-alpha   |
| peak      | 1+alpha·A   | -2cos    | 1-alpha·A   | 1+alpha/A | -2cos    | 1-alpha/A |
| all-pass  | 1-alpha     | -2cos    | 1+alpha     | 1+alpha   | -2cos    | 1-alpha   |

Everything is divided by a0 so the stored a0 is implicitly 1.


Transposed Direct Form II
-------------------------

    y  = b0·x + s1
    s1 = b1·x - a1·y + s2
    s2 = b2·x - a2·y

Two state variables per channel and good numerical behaviour in single
precision, which is why it is the usual choice for audio biquads.


Stability
---------

The poles are inside the unit circle exactly when

    |a2| < 1   and   |a1| < 1 + a2

With Q ≥ 0.5 and 0 < w0 < π every cookbook design above satisfies this.
*/

/// Response shape of a biquad section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterType {
    LowPass,
    HighPass,
    BandPass,
    Notch,
    Peak,
    AllPass,
}

impl FilterType {
    pub const ALL: [FilterType; 6] = [
        FilterType::LowPass,
        FilterType::HighPass,
        FilterType::BandPass,
        FilterType::Notch,
        FilterType::Peak,
        FilterType::AllPass,
    ];

    /// Map a choice index to a type, falling back to low-pass.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(FilterType::LowPass)
    }
}

/// Normalized biquad coefficients (a0 == 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::identity()
    }
}

impl Coefficients {
    /// Pass-through section.
    pub const fn identity() -> Self {
        Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 }
    }

    /// Design a cookbook section.
    ///
    /// `frequency` must already lie strictly between 0 and Nyquist and `q`
    /// must be positive; callers clamp before designing.
    pub fn design(kind: FilterType, frequency: f32, q: f32, gain_db: f32, sample_rate: f32) -> Self {
        let w0 = 2.0 * PI * f64::from(frequency) / f64::from(sample_rate);
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * f64::from(q));
        let a = 10f64.powf(f64::from(gain_db) / 40.0);

        let (b0, b1, b2, a0, a1, a2) = match kind {
            FilterType::LowPass => {
                let b = (1.0 - cos) / 2.0;
                (b, 1.0 - cos, b, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
            }
            FilterType::HighPass => {
                let b = (1.0 + cos) / 2.0;
                (b, -(1.0 + cos), b, 1.0 + alpha, -2.0 * cos, 1.0 - alpha)
            }
            FilterType::BandPass => (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos, 1.0 - alpha),
            FilterType::Notch => (1.0, -2.0 * cos, 1.0, 1.0 + alpha, -2.0 * cos, 1.0 - alpha),
            FilterType::Peak => (
                1.0 + alpha * a,
                -2.0 * cos,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos,
                1.0 - alpha / a,
            ),
            FilterType::AllPass => {
                // Numerator is the reversed denominator, bit for bit.
                let a1 = (-2.0 * cos / (1.0 + alpha)) as f32;
                let a2 = ((1.0 - alpha) / (1.0 + alpha)) as f32;
                return Self { b0: a2, b1: a1, b2: 1.0, a1, a2 };
            }
        };

        Self {
            b0: (b0 / a0) as f32,
            b1: (b1 / a0) as f32,
            b2: (b2 / a0) as f32,
            a1: (a1 / a0) as f32,
            a2: (a2 / a0) as f32,
        }
    }

    /// True when both poles lie strictly inside the unit circle.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Complex frequency response at `frequency` Hz.
    pub fn response(&self, frequency: f32, sample_rate: f32) -> Complex32 {
        let w = 2.0 * std::f32::consts::PI * frequency / sample_rate;
        let z1 = Complex32::from_polar(1.0, -w);
        let z2 = z1 * z1;
        let numerator = Complex32::new(self.b0, 0.0) + z1 * self.b1 + z2 * self.b2;
        let denominator = Complex32::new(1.0, 0.0) + z1 * self.a1 + z2 * self.a2;
        numerator / denominator
    }
}

/// Values below this are flushed to zero between blocks.
const DENORMAL_THRESHOLD: f32 = 1.0e-15;

/// One biquad section with independent state per channel.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    coefficients: Coefficients,
    s1: [f32; MAX_CHANNELS],
    s2: [f32; MAX_CHANNELS],
}

impl Biquad {
    pub fn new(coefficients: Coefficients) -> Self {
        Self {
            coefficients,
            ..Self::default()
        }
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Swap coefficients, keeping the state so the change does not click.
    pub fn set_coefficients(&mut self, coefficients: Coefficients) {
        self.coefficients = coefficients;
    }

    #[inline]
    pub fn process_sample(&mut self, channel: usize, x: f32) -> f32 {
        let c = &self.coefficients;
        let y = c.b0 * x + self.s1[channel];
        self.s1[channel] = c.b1 * x - c.a1 * y + self.s2[channel];
        self.s2[channel] = c.b2 * x - c.a2 * y;
        y
    }

    pub fn process(&mut self, channel: usize, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(channel, *sample);
        }
    }

    /// Zero any state that has decayed into the denormal range.
    pub fn flush_denormals(&mut self) {
        for state in self.s1.iter_mut().chain(self.s2.iter_mut()) {
            if state.abs() < DENORMAL_THRESHOLD {
                *state = 0.0;
            }
        }
    }

    pub fn reset(&mut self) {
        self.s1 = [0.0; MAX_CHANNELS];
        self.s2 = [0.0; MAX_CHANNELS];
    }

    pub fn response(&self, frequency: f32, sample_rate: f32) -> Complex32 {
        self.coefficients.response(frequency, sample_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn magnitude_db(c: &Coefficients, frequency: f32, sample_rate: f32) -> f32 {
        20.0 * c.response(frequency, sample_rate).norm().log10()
    }

    #[test]
    fn lowpass_is_minus_three_db_at_cutoff() {
        let c = Coefficients::design(FilterType::LowPass, 1000.0, 0.707, 0.0, 44_100.0);
        let db = magnitude_db(&c, 1000.0, 44_100.0);
        assert!((db + 3.0).abs() < 0.2, "expected about -3 dB at cutoff, got {db}");
        assert!(magnitude_db(&c, 20.0, 44_100.0).abs() < 0.01, "passband should be flat");
    }

    #[test]
    fn highpass_blocks_dc() {
        let c = Coefficients::design(FilterType::HighPass, 500.0, 0.707, 0.0, 48_000.0);
        assert!(c.response(0.0, 48_000.0).norm() < 1e-4);
        assert!((c.response(12_000.0, 48_000.0).norm() - 1.0).abs() < 0.01);
    }

    #[test]
    fn notch_kills_centre_frequency() {
        let c = Coefficients::design(FilterType::Notch, 2000.0, 2.0, 0.0, 48_000.0);
        assert!(c.response(2000.0, 48_000.0).norm() < 1e-3);
    }

    #[test]
    fn peak_reaches_requested_gain() {
        let c = Coefficients::design(FilterType::Peak, 1000.0, 1.0, 6.0, 48_000.0);
        let db = magnitude_db(&c, 1000.0, 48_000.0);
        assert!((db - 6.0).abs() < 0.05, "peak gain was {db}");
    }

    #[test]
    fn allpass_has_unit_magnitude() {
        let c = Coefficients::design(FilterType::AllPass, 700.0, 3.0, 0.0, 48_000.0);
        for frequency in [20.0, 300.0, 700.0, 5000.0, 20_000.0] {
            let magnitude = c.response(frequency, 48_000.0).norm();
            assert!((magnitude - 1.0).abs() < 1e-4, "|H({frequency})| = {magnitude}");
        }
    }

    #[test]
    fn every_design_in_range_is_stable() {
        let sample_rate = 44_100.0;
        for kind in FilterType::ALL {
            for &frequency in &[20.0, 200.0, 2000.0, 15_000.0, sample_rate * 0.499] {
                for &q in &[0.5, 0.707, 2.0, 8.0, 20.0] {
                    for &gain in &[-24.0, 0.0, 24.0] {
                        let c = Coefficients::design(kind, frequency, q, gain, sample_rate);
                        assert!(c.is_stable(), "{kind:?} f={frequency} q={q} g={gain} is unstable: {c:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn impulse_response_decays() {
        let mut filter = Biquad::new(Coefficients::design(FilterType::LowPass, 100.0, 20.0, 0.0, 48_000.0));
        let mut buffer = vec![0.0f32; 48_000];
        buffer[0] = 1.0;
        filter.process(0, &mut buffer);

        let tail = buffer[47_000..].iter().fold(0.0f32, |peak, s| peak.max(s.abs()));
        assert!(tail < 1e-4, "resonant lowpass should ring out within a second, tail {tail}");
    }

    #[test]
    fn channels_do_not_share_state() {
        let mut filter = Biquad::new(Coefficients::design(FilterType::LowPass, 1000.0, 0.707, 0.0, 48_000.0));
        filter.process_sample(0, 1.0);
        assert_eq!(filter.process_sample(1, 0.0), 0.0);
    }
}
