//! Spectrum analyzer widget
//!
//! FFT-based frequency spectrum visualization with log-spaced bins, fed
//! from the processor's spectrum FIFO one block at a time.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Number of frequency bins to display
const SPECTRUM_BINS: usize = 64;

/// Weight of the newest frame in the displayed magnitude.
const SMOOTHING: f64 = 0.5;

/// Spectrum analyzer with FFT processing
pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// FFT bin index for each displayed frequency
    bin_indices: Vec<usize>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Current spectrum data: (log10 frequency, magnitude_db)
    spectrum: Vec<(f64, f64)>,
    /// Normalises a full-scale sine to 0 dB
    reference: f32,
}

impl SpectrumAnalyzer {
    /// Create an analyzer for blocks of `block_len` samples.
    pub fn new(block_len: usize, sample_rate: f32) -> Self {
        let block_len = block_len.max(4);
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(block_len);

        // Hann window - reduces spectral leakage
        let denom = (block_len - 1) as f32;
        let window: Vec<f32> = (0..block_len)
            .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / denom).cos()))
            .collect();
        let reference = window.iter().sum::<f32>() / 2.0;

        // Log-spaced frequency bins (20 Hz to Nyquist)
        let max_freq = (sample_rate / 2.0).min(20_000.0).max(40.0) as f64;
        let min_freq = 20.0f64;
        let half = block_len / 2;
        let mut bin_indices = Vec::with_capacity(SPECTRUM_BINS);
        let mut spectrum = Vec::with_capacity(SPECTRUM_BINS);
        for i in 0..SPECTRUM_BINS {
            let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
            let freq = min_freq * (max_freq / min_freq).powf(t);
            let index = ((freq * block_len as f64 / sample_rate as f64).round() as usize).clamp(1, half - 1);
            bin_indices.push(index);
            spectrum.push((freq.log10(), -120.0));
        }

        Self {
            window,
            bin_indices,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); block_len],
            spectrum,
            reference,
        }
    }

    pub fn block_len(&self) -> usize {
        self.window.len()
    }

    /// Fold one block into the displayed spectrum.
    pub fn update(&mut self, block: &[f32]) {
        if block.len() != self.window.len() {
            return;
        }

        for ((slot, sample), w) in self.scratch.iter_mut().zip(block).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for ((_, magnitude_db), &index) in self.spectrum.iter_mut().zip(&self.bin_indices) {
            let bin = self.scratch[index] / self.reference;
            let power = f64::from(bin.norm_sqr()).max(1e-12);
            let db = 10.0 * power.log10();
            *magnitude_db = SMOOTHING * db + (1.0 - SMOOTHING) * *magnitude_db;
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum analyzer widget
pub fn render_spectrum(frame: &mut Frame, area: Rect, title: &str, spectrum: &[(f64, f64)]) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Green))
        .data(spectrum);

    let (min_x, max_x) = match (spectrum.first(), spectrum.last()) {
        (Some(first), Some(last)) => (first.0, last.0),
        _ => (1.0, 4.0),
    };

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([min_x, max_x])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-96.0, 6.0])
                .labels(vec!["-96", "-48", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
