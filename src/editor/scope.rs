use crate::buffer::AudioRingBuffer;
use crate::params::{Param, ParameterTree};

/// Oscilloscope state on the GUI side.
///
/// Holds one scratch trace per channel and copies the newest samples out of
/// a visualisation ring on every refresh. Zoom picks how much of the ring
/// is shown, gain scales the trace.
#[derive(Debug, Clone)]
pub struct ScopeView {
    traces: Vec<Vec<f32>>,
    capacity: usize,
    visible: usize,
    zoom: f32,
    gain: f32,
    thickness: f32,
}

impl ScopeView {
    pub fn new(channels: usize, capacity: usize) -> Self {
        Self {
            traces: vec![Vec::with_capacity(capacity); channels],
            capacity,
            visible: 0,
            zoom: 1.0,
            gain: 1.0,
            thickness: 1.5,
        }
    }

    pub fn for_buffer(buffer: &AudioRingBuffer) -> Self {
        Self::new(buffer.channel_count(), buffer.capacity())
    }

    pub fn channel_count(&self) -> usize {
        self.traces.len()
    }

    /// Pick up zoom, gain and line thickness from the parameter tree.
    pub fn apply(&mut self, tree: &ParameterTree) {
        let value = |param: Param| tree.get(param.index()).map(|p| p.plain());
        if let Some(zoom) = value(Param::OscilloscopeZoom) {
            self.zoom = zoom.clamp(0.0, 1.0);
        }
        if let Some(gain_db) = value(Param::OscilloscopeGain) {
            self.gain = 10.0_f32.powf(gain_db / 20.0);
        }
        if let Some(thickness) = value(Param::OscilloscopeThickness) {
            self.thickness = thickness;
        }
    }

    /// Frames the current zoom asks for.
    pub fn window(&self) -> usize {
        let frames = (self.capacity as f32 * self.zoom).round() as usize;
        frames.clamp(self.capacity.min(2), self.capacity)
    }

    /// Copy the newest frames out of `buffer`. Returns how many are shown.
    pub fn refresh(&mut self, buffer: &AudioRingBuffer) -> usize {
        let window = self.window();
        for trace in &mut self.traces {
            trace.resize(window, 0.0);
        }
        let copied = buffer.peek_latest(&mut self.traces);
        for trace in &mut self.traces {
            trace.truncate(copied);
            trace.iter_mut().for_each(|s| *s *= self.gain);
        }
        self.visible = copied;
        copied
    }

    pub fn samples(&self, channel: usize) -> &[f32] {
        self.traces.get(channel).map_or(&[], |trace| &trace[..self.visible])
    }

    /// `(x, y)` points of a trace, x counted in frames.
    pub fn points(&self, channel: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.samples(channel).iter().enumerate().map(|(i, s)| (i as f64, f64::from(*s)))
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::OverflowMode;
    use crate::params::build_tree;

    fn filled_ring() -> AudioRingBuffer {
        let ring = AudioRingBuffer::new(1, 512, OverflowMode::Overwrite).unwrap();
        let block: Vec<f32> = (0..512).map(|i| i as f32 / 512.0).collect();
        ring.write_block(&[block.as_slice()]);
        ring
    }

    #[test]
    fn shows_newest_samples_last() {
        let ring = filled_ring();
        let mut scope = ScopeView::for_buffer(&ring);
        assert_eq!(scope.refresh(&ring), 512);
        let trace = scope.samples(0);
        assert_eq!(trace.len(), 512);
        assert_eq!(trace[511], 511.0 / 512.0);
        // Peeking leaves the ring readable.
        assert_eq!(ring.available(), 512);
    }

    #[test]
    fn zoom_and_gain_follow_parameters() {
        let ring = filled_ring();
        let tree = build_tree().unwrap();
        tree.set_normalized_by_id(Param::OscilloscopeZoom.id(), 0.0).unwrap();
        tree.set_normalized_by_id(Param::OscilloscopeGain.id(), 1.0).unwrap();

        let mut scope = ScopeView::for_buffer(&ring);
        scope.apply(&tree);
        let shown = scope.refresh(&ring);
        assert_eq!(shown, (512.0_f32 * 0.01).round() as usize);

        let gain = 10.0_f32.powf(24.0 / 20.0);
        let last = *scope.samples(0).last().unwrap();
        assert!((last - 511.0 / 512.0 * gain).abs() < 1e-3);
    }

    #[test]
    fn empty_ring_shows_nothing() {
        let ring = AudioRingBuffer::new(2, 64, OverflowMode::Overwrite).unwrap();
        let mut scope = ScopeView::for_buffer(&ring);
        assert_eq!(scope.refresh(&ring), 0);
        assert!(scope.samples(1).is_empty());
        assert!(scope.samples(7).is_empty());
        assert_eq!(scope.points(0).count(), 0);
    }
}
