use std::f32::consts::PI;

use crate::config::Oversampling;

/*
Polyphase Half-Band Oversampling
================================

Waveshaping creates harmonics above Nyquist that fold back as aliasing. Running
the shaper at 2x or 4x the sample rate, then filtering before decimating,
pushes most of that energy out of the audible band.

Half-band filter
----------------

A linear-phase lowpass with its cutoff at a quarter of the (oversampled) rate.
Every other tap is zero except the centre tap, which is exactly 0.5:

    h:  g0  0  g1  0  g2 ... g7  0.5  g7 ... g2  0  g1  0  g0
                                  ↑ centre (tap 15 of 31)

Polyphase split
---------------

Up by 2: zero-stuff, filter, scale by 2. The even output phase only sees the
non-zero g taps; the odd output phase only sees the centre tap, which makes it
a pure delay of the input.

    y[2m]   = 2 · Σ g[k] · x[m-k]
    y[2m+1] = x[m-7]

Down by 2: filter, keep every other sample. Split the input into even and odd
streams and the same structure appears in reverse.

    v[m] = Σ g[k] · even[m-k]  +  0.5 · odd[m-7]

4x is two 2x stages in series.
*/

const PHASE_TAPS: usize = 16;
const CENTRE_DELAY: usize = 7;

/// The 16 non-zero, non-centre taps of a 31-tap Blackman windowed half-band.
fn halfband_taps() -> [f32; PHASE_TAPS] {
    const LENGTH: usize = 2 * PHASE_TAPS - 1;
    const CENTRE: f32 = (LENGTH / 2) as f32;

    let mut taps = [0.0f32; PHASE_TAPS];
    for (k, tap) in taps.iter_mut().enumerate() {
        let n = (2 * k) as f32;
        let offset = n - CENTRE;
        let sinc = (PI * offset / 2.0).sin() / (PI * offset);
        let phase = 2.0 * PI * n / (LENGTH - 1) as f32;
        let window = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();
        *tap = sinc * window;
    }

    // Normalize so the filter has exactly unity gain at DC.
    let sum: f32 = taps.iter().sum();
    for tap in taps.iter_mut() {
        *tap *= 0.5 / sum;
    }
    taps
}

/// Shift `value` into the front of a history line.
#[inline]
fn push_front<const N: usize>(history: &mut [f32; N], value: f32) {
    history.copy_within(0..N - 1, 1);
    history[0] = value;
}

#[inline]
fn dot(taps: &[f32; PHASE_TAPS], history: &[f32; PHASE_TAPS]) -> f32 {
    taps.iter().zip(history.iter()).map(|(t, h)| t * h).sum()
}

#[derive(Debug, Clone)]
struct HalfbandUp {
    history: [f32; PHASE_TAPS],
}

impl HalfbandUp {
    fn new() -> Self {
        Self { history: [0.0; PHASE_TAPS] }
    }

    #[inline]
    fn process(&mut self, taps: &[f32; PHASE_TAPS], x: f32) -> [f32; 2] {
        push_front(&mut self.history, x);
        [2.0 * dot(taps, &self.history), self.history[CENTRE_DELAY]]
    }

    fn reset(&mut self) {
        self.history = [0.0; PHASE_TAPS];
    }
}

#[derive(Debug, Clone)]
struct HalfbandDown {
    even: [f32; PHASE_TAPS],
    odd: [f32; CENTRE_DELAY + 1],
    pending_odd: f32,
}

impl HalfbandDown {
    fn new() -> Self {
        Self {
            even: [0.0; PHASE_TAPS],
            odd: [0.0; CENTRE_DELAY + 1],
            pending_odd: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, taps: &[f32; PHASE_TAPS], pair: [f32; 2]) -> f32 {
        push_front(&mut self.even, pair[0]);
        // The odd stream lags by one input sample: odd[m] = u[2m - 1].
        push_front(&mut self.odd, self.pending_odd);
        self.pending_odd = pair[1];
        dot(taps, &self.even) + 0.5 * self.odd[CENTRE_DELAY]
    }

    fn reset(&mut self) {
        self.even = [0.0; PHASE_TAPS];
        self.odd = [0.0; CENTRE_DELAY + 1];
        self.pending_odd = 0.0;
    }
}

/// Runs a memoryless function at 2x or 4x the host rate.
///
/// One instance handles one channel. No allocation; all state is inline.
#[derive(Debug, Clone)]
pub struct Oversampler {
    factor: Oversampling,
    taps: [f32; PHASE_TAPS],
    up: HalfbandUp,
    down: HalfbandDown,
    up_inner: HalfbandUp,
    down_inner: HalfbandDown,
}

impl Oversampler {
    pub fn new(factor: Oversampling) -> Self {
        Self {
            factor,
            taps: halfband_taps(),
            up: HalfbandUp::new(),
            down: HalfbandDown::new(),
            up_inner: HalfbandUp::new(),
            down_inner: HalfbandDown::new(),
        }
    }

    pub fn factor(&self) -> Oversampling {
        self.factor
    }

    /// Latency in host-rate samples, rounded down.
    pub fn latency(&self) -> usize {
        let stage = 2 * CENTRE_DELAY + 1;
        match self.factor {
            Oversampling::X2 => stage,
            Oversampling::X4 => stage + stage / 2,
        }
    }

    /// Upsample `x`, apply `shape` to every oversampled point, decimate.
    #[inline]
    pub fn process(&mut self, x: f32, mut shape: impl FnMut(f32) -> f32) -> f32 {
        let taps = &self.taps;
        let [a, b] = self.up.process(taps, x);
        let (a, b) = match self.factor {
            Oversampling::X2 => (shape(a), shape(b)),
            Oversampling::X4 => {
                // The inner stage runs on the 2x stream, one sample at a time.
                let [a0, a1] = self.up_inner.process(taps, a);
                let da = self.down_inner.process(taps, [shape(a0), shape(a1)]);
                let [b0, b1] = self.up_inner.process(taps, b);
                let db = self.down_inner.process(taps, [shape(b0), shape(b1)]);
                (da, db)
            }
        };
        self.down.process(taps, [a, b])
    }

    pub fn reset(&mut self) {
        self.up.reset();
        self.down.reset();
        self.up_inner.reset();
        self.down_inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taps_sum_to_half() {
        let sum: f32 = halfband_taps().iter().sum();
        assert!((sum - 0.5).abs() < 1e-6);
    }

    #[test]
    fn identity_shape_passes_dc() {
        for factor in [Oversampling::X2, Oversampling::X4] {
            let mut oversampler = Oversampler::new(factor);
            let mut y = 0.0;
            for _ in 0..256 {
                y = oversampler.process(0.5, |s| s);
            }
            assert!((y - 0.5).abs() < 1e-3, "{factor:?}: DC came out as {y}");
        }
    }

    #[test]
    fn identity_shape_passes_low_sine() {
        let mut oversampler = Oversampler::new(Oversampling::X2);
        let mut peak = 0.0f32;
        for n in 0..4800 {
            let x = (2.0 * PI * 1000.0 * n as f32 / 48_000.0).sin();
            let y = oversampler.process(x, |s| s);
            if n > 1000 {
                peak = peak.max(y.abs());
            }
        }
        assert!((peak - 1.0).abs() < 0.02, "1 kHz should pass with unity gain, peak {peak}");
    }
}
