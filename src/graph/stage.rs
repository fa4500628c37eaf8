use crate::params::ParamSnapshot;

/// Flags a stage raises when it had to clamp a requested setting.
///
/// Clamping is never an error on the audio thread. The processor publishes
/// each stage's status word so the editor can show it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StageStatus(u32);

impl StageStatus {
    pub const CLEAR: StageStatus = StageStatus(0);
    pub const CUTOFF_CLAMPED: StageStatus = StageStatus(1 << 0);
    pub const RESONANCE_CLAMPED: StageStatus = StageStatus(1 << 1);
    pub const FEEDBACK_CLAMPED: StageStatus = StageStatus(1 << 2);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        StageStatus(bits)
    }

    pub const fn contains(self, other: StageStatus) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_clear(self) -> bool {
        self.0 == 0
    }

    pub fn set(&mut self, flag: StageStatus, on: bool) {
        if on {
            self.0 |= flag.0;
        } else {
            self.0 &= !flag.0;
        }
    }
}

impl std::ops::BitOr for StageStatus {
    type Output = StageStatus;

    fn bitor(self, rhs: StageStatus) -> StageStatus {
        StageStatus(self.0 | rhs.0)
    }
}

/// One effect in the processor chain.
///
/// `prepare` may allocate and is called off the audio thread. `process` must
/// not allocate, lock or block; it reads its settings from the per-block
/// snapshot and works in place on every channel.
pub trait Stage: Send {
    fn name(&self) -> &'static str;

    fn prepare(&mut self, sample_rate: f32, max_block_size: usize);

    fn process(&mut self, audio: &mut [&mut [f32]], params: &ParamSnapshot);

    /// Clear filter and delay memory without touching settings.
    fn reset(&mut self);

    fn status(&self) -> StageStatus {
        StageStatus::CLEAR
    }
}

/// Linear dry/wet blend.
#[inline]
pub(crate) fn blend(dry: f32, wet: f32, mix: f32) -> f32 {
    dry + mix * (wet - dry)
}

/// True when `a` and `b` differ by more than a relative epsilon.
#[inline]
pub(crate) fn changed(a: f32, b: f32) -> bool {
    const EPSILON: f32 = 1.0e-5;
    (a - b).abs() > EPSILON * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_flags_combine() {
        let mut status = StageStatus::CLEAR;
        assert!(status.is_clear());

        status.set(StageStatus::CUTOFF_CLAMPED, true);
        status.set(StageStatus::FEEDBACK_CLAMPED, true);
        assert!(status.contains(StageStatus::CUTOFF_CLAMPED));
        assert!(!status.contains(StageStatus::RESONANCE_CLAMPED));

        status.set(StageStatus::CUTOFF_CLAMPED, false);
        assert_eq!(status, StageStatus::FEEDBACK_CLAMPED);
        assert_eq!(StageStatus::from_bits(status.bits()), status);
        assert_eq!(
            (StageStatus::CUTOFF_CLAMPED | StageStatus::RESONANCE_CLAMPED).bits(),
            0b11
        );
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(0.2, 0.8, 0.0), 0.2);
        assert_eq!(blend(0.2, 0.8, 1.0), 0.8);
        assert!((blend(0.0, 1.0, 0.25) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn change_detection_ignores_float_noise() {
        assert!(!changed(1000.0, 1000.001));
        assert!(changed(1000.0, 1001.0));
        assert!(changed(0.0, 0.01));
    }
}
