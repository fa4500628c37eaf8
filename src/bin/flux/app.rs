//! FluxApp - audio device setup and the run loop

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};

use flux_suite::{
    editor::Editor, synth::SynthMessage, Oversampling, PluginProcessor, ProcessorConfig, MAX_BLOCK_SIZE,
    MAX_CHANNELS,
};

use super::arpeggio::Arpeggio;
use super::ui::UiApp;

/// Capacity of the UI to audio note queue.
const MESSAGE_QUEUE: usize = 256;

/// Main application builder
pub struct FluxApp {
    config: ProcessorConfig,
    root: u8,
    bpm: f64,
}

impl FluxApp {
    pub fn new() -> Self {
        Self { config: ProcessorConfig::default(), root: 45, bpm: 120.0 }
    }

    pub fn oversampling(mut self, oversampling: Oversampling) -> Self {
        self.config = self.config.with_oversampling(oversampling);
        self
    }

    /// MIDI note the arpeggio is built on.
    pub fn root_note(mut self, note: u8) -> Self {
        self.root = note.min(127);
        self
    }

    pub fn tempo(mut self, bpm: f64) -> Self {
        self.bpm = bpm;
        self
    }

    /// Open the default output device and run until the UI quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = config.sample_rate().0 as f32;
        let device_channels = usize::from(config.channels());
        let channels = device_channels.clamp(1, MAX_CHANNELS);
        log::info!("output: {sample_rate} Hz, {device_channels} channels");

        let (tx, rx) = rtrb::RingBuffer::<SynthMessage>::new(MESSAGE_QUEUE);
        let mut processor = PluginProcessor::new(self.config.with_channels(channels))
            .wrap_err("invalid processor configuration")?
            .with_messages(rx);
        processor
            .prepare(sample_rate, MAX_BLOCK_SIZE)
            .wrap_err("failed to prepare processor")?;
        let shared = processor.shared();

        // Planar scratch for the processor, allocated here and moved into the callback.
        let mut left = vec![0.0f32; MAX_BLOCK_SIZE];
        let mut right = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &config.into(),
            move |data: &mut [f32], _| {
                let total_frames = data.len() / device_channels;
                let mut frames_written = 0;

                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let mut planar = [&mut left[..frames], &mut right[..frames]];
                    let audio = &mut planar[..channels];
                    for channel in audio.iter_mut() {
                        channel.fill(0.0);
                    }

                    processor.process_block(audio, &[]);

                    // Extra device channels repeat the last processed one.
                    let out = &mut data[frames_written * device_channels..];
                    for (i, frame) in out.chunks_mut(device_channels).take(frames).enumerate() {
                        for (ch, sample) in frame.iter_mut().enumerate() {
                            *sample = audio[ch.min(channels - 1)][i];
                        }
                    }

                    frames_written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let mut editor = Editor::new(&shared, Editor::default_layout()?);
        editor.start_timer().wrap_err("failed to start repaint timer")?;

        let mut ui = UiApp::new(editor, shared, tx, Arpeggio::new(self.root, self.bpm));
        let mut terminal = ratatui::init();
        let result = ui.run(&mut terminal);
        ratatui::restore();

        // The editor's timer must be gone before the stream takes the processor down.
        drop(ui);
        drop(stream);
        result
    }
}

impl Default for FluxApp {
    fn default() -> Self {
        Self::new()
    }
}
