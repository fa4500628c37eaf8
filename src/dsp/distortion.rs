//! Waveshaping transfer functions.
//!
//! A waveshaper maps every sample through a fixed curve:
//!   output = f(input)
//!
//! Gain in front of the curve decides how far into the nonlinear region the
//! signal travels; the curves themselves are all bounded to ±1.
//!
//! # Shapes
//!
//! Soft (x / (1 + |x|)):
//!   - Smooth, warm saturation
//!   - Odd harmonics that fall off quickly
//!
//! Hard (clamp to ±1):
//!   - Buzzy, square-ish at high gain
//!   - Strong odd harmonics
//!
//! Fold:
//!   Anything past ±1 is reflected back towards zero, repeatedly. The result
//!   is a triangle-shaped transfer curve with dense, metallic harmonics.
//!
//! Asymmetric (tanh with a bias):
//!   Shifting the operating point makes the positive and negative halves clip
//!   differently, which adds even harmonics. `symmetry` in [-1, 1] sets the
//!   bias; 0 is symmetric.
//!
//! # Crush
//!
//! Not a curve but a quantiser: the output is rounded onto a grid of
//! 2^(bits-1) steps per polarity, the grit of a low bit-depth converter.

/// Waveshape selected by the `distortionType` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveshape {
    Soft,
    Hard,
    Fold,
    Asymmetric,
}

impl Waveshape {
    pub const ALL: [Waveshape; 4] = [Waveshape::Soft, Waveshape::Hard, Waveshape::Fold, Waveshape::Asymmetric];

    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or(Waveshape::Soft)
    }

    #[inline]
    pub fn apply(self, x: f32, symmetry: f32) -> f32 {
        match self {
            Waveshape::Soft => soft_clip(x),
            Waveshape::Hard => hard_clip(x),
            Waveshape::Fold => foldback(x),
            Waveshape::Asymmetric => asymmetric(x, symmetry),
        }
    }
}

#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x / (1.0 + x.abs())
}

#[inline]
pub fn hard_clip(x: f32) -> f32 {
    x.clamp(-1.0, 1.0)
}

/// Reflect the signal at ±1 until it lies inside.
///
/// Closed form of repeated folding, so the cost does not grow with gain.
#[inline]
pub fn foldback(x: f32) -> f32 {
    if (-1.0..=1.0).contains(&x) {
        return x;
    }
    // Triangle wave with period 4 that matches x on [-1, 1].
    let phase = (x + 1.0).rem_euclid(4.0);
    if phase < 2.0 {
        phase - 1.0
    } else {
        3.0 - phase
    }
}

/// Biased tanh, re-centred so silence maps to silence and scaled back to ±1.
#[inline]
pub fn asymmetric(x: f32, symmetry: f32) -> f32 {
    let bias = symmetry.clamp(-1.0, 1.0);
    let offset = bias.tanh();
    ((x + bias).tanh() - offset) / (1.0 + offset.abs())
}

/// Bit depth at which [`crush`] leaves the signal alone.
pub const CRUSH_OFF_BITS: f32 = 16.0;

/// Quantise `x` to `bits` of resolution. Fractional depths are allowed.
#[inline]
pub fn crush(x: f32, bits: f32) -> f32 {
    if bits >= CRUSH_OFF_BITS {
        return x;
    }
    let steps = 2f32.powf(bits.max(1.0) - 1.0);
    (x * steps).round() / steps
}

/// Convert decibels to a linear gain factor.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}
