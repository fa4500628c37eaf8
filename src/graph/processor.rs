use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};

use crate::buffer::{AudioRingBuffer, FifoAudioBuffer, OverflowMode};
use crate::config::ProcessorConfig;
use crate::error::{ConfigError, PresetError};
use crate::graph::disflux::DisfluxProcessor;
use crate::graph::distortion::Distortion;
use crate::graph::filter::FilterProcessor;
use crate::graph::heretic::HereticProcessor;
use crate::graph::stage::{Stage, StageStatus};
use crate::io::converter::midi_to_synth;
use crate::io::midi::MidiEvent;
use crate::params::preset::{self, Preserved};
use crate::params::{build_tree, Param, ParamSnapshot, Parameter, ParameterTree};
use crate::synth::message::MessageReceiver;
use crate::synth::poly::PolySynth;
use crate::{MAX_BLOCK_SIZE, MAX_CHANNELS};

/*
Plugin Processor
================

One block, start to finish:

    host audio ──→ (+ synth) ──→ input tap
                                     │
              ┌──────────────────────┘
              ↓
        Distortion → Filter → Disflux → Heretic ──→ oscilloscope tap ──→ host
                                                   ├─→ spectrum FIFO
                                                   └─→ peak / RMS meters

  1. Snapshot every parameter once. Stages only read the snapshot, so a
     block never sees half of a host update.
  2. Turn incoming MIDI and queued synth messages into voice events and
     render the synth on top of the input.
  3. Run the stages in place, in the fixed order above.
  4. Publish: scope rings (overwrite mode), spectrum FIFO, meters, and each
     stage's status word.

Everything the editor reads lives in `SharedState` behind an `Arc`: the
parameter tree, the rings and the meter atomics. The editor holds only a
`Weak`, so closing the plugin frees the DSP even while a GUI is open.

Nothing in `process_block` allocates, locks or blocks. All buffers are
sized in `prepare`.
*/

/// Ring holding the signal before the effect chain.
pub const INPUT_TAP: &str = "input";
/// Ring holding the processed output.
pub const OSCILLOSCOPE_TAP: &str = "oscilloscope";

/// Stages in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageId {
    Distortion,
    Filter,
    Disflux,
    Heretic,
}

impl StageId {
    pub const ALL: [StageId; 4] = [StageId::Distortion, StageId::Filter, StageId::Disflux, StageId::Heretic];
}

/// Peak and RMS level of the last processed block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MeterSnapshot {
    pub channels: usize,
    pub peak: [f32; MAX_CHANNELS],
    pub rms: [f32; MAX_CHANNELS],
}

/// State the audio thread publishes and the editor reads.
pub struct SharedState {
    params: ParameterTree,
    input_tap: AudioRingBuffer,
    output_tap: AudioRingBuffer,
    spectrum: FifoAudioBuffer,
    peak: [AtomicU32; MAX_CHANNELS],
    rms: [AtomicU32; MAX_CHANNELS],
    status: [AtomicU32; StageId::ALL.len()],
    sample_rate: AtomicU32,
    blocks: AtomicU64,
    channels: usize,
    // Host and GUI threads only.
    preserved: Mutex<Preserved>,
}

impl SharedState {
    fn new(config: &ProcessorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            params: build_tree()?,
            input_tap: AudioRingBuffer::new(config.channels, config.scope_capacity, OverflowMode::Overwrite)?,
            output_tap: AudioRingBuffer::new(config.channels, config.scope_capacity, OverflowMode::Overwrite)?,
            spectrum: FifoAudioBuffer::new(config.channels, config.scope_capacity, config.spectrum_block)?,
            peak: Default::default(),
            rms: Default::default(),
            status: Default::default(),
            sample_rate: AtomicU32::new(0),
            blocks: AtomicU64::new(0),
            channels: config.channels,
            preserved: Mutex::new(Preserved::default()),
        })
    }

    pub fn params(&self) -> &ParameterTree {
        &self.params
    }

    pub fn channel_count(&self) -> usize {
        self.channels
    }

    /// `"input"` or `"oscilloscope"`.
    pub fn visualization_buffer(&self, name: &str) -> Option<&AudioRingBuffer> {
        match name {
            INPUT_TAP => Some(&self.input_tap),
            OSCILLOSCOPE_TAP => Some(&self.output_tap),
            _ => None,
        }
    }

    /// Block-granular copy of the output for spectrum analysis.
    pub fn spectrum(&self) -> &FifoAudioBuffer {
        &self.spectrum
    }

    pub fn meters(&self) -> MeterSnapshot {
        let mut snapshot = MeterSnapshot {
            channels: self.channels,
            ..MeterSnapshot::default()
        };
        for channel in 0..self.channels {
            snapshot.peak[channel] = f32::from_bits(self.peak[channel].load(Ordering::Relaxed));
            snapshot.rms[channel] = f32::from_bits(self.rms[channel].load(Ordering::Relaxed));
        }
        snapshot
    }

    pub fn stage_status(&self, stage: StageId) -> StageStatus {
        StageStatus::from_bits(self.status[stage as usize].load(Ordering::Relaxed))
    }

    /// Sample rate of the last `prepare`, 0 before the first one.
    pub fn sample_rate(&self) -> f32 {
        f32::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }

    /// Blocks processed since construction.
    pub fn processed_blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }

    // -- host surface -----------------------------------------------------

    pub fn parameter_count(&self) -> usize {
        self.params.parameter_count()
    }

    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        self.params.get(index)
    }

    /// Host automation entry point, normalized value.
    pub fn set_parameter(&self, index: usize, normalized: f32) -> bool {
        self.params.set_normalized(index, normalized)
    }

    pub fn state(&self) -> Result<Vec<u8>, PresetError> {
        let preserved = self.preserved.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(preset::serialize(&self.params, &preserved)?.into_bytes())
    }

    /// Load a state blob. On error every parameter keeps its current value.
    pub fn set_state(&self, bytes: &[u8]) -> Result<(), PresetError> {
        let text = std::str::from_utf8(bytes)?;
        let preserved = preset::deserialize(&self.params, text)?;
        *self.preserved.lock().unwrap_or_else(PoisonError::into_inner) = preserved;
        Ok(())
    }

    fn publish_meters(&self, audio: &[&mut [f32]]) {
        for (channel, samples) in audio.iter().enumerate().take(self.channels) {
            let (peak, sum) = samples
                .iter()
                .fold((0.0f32, 0.0f32), |(peak, sum), &s| (peak.max(s.abs()), sum + s * s));
            let rms = if samples.is_empty() { 0.0 } else { (sum / samples.len() as f32).sqrt() };
            self.peak[channel].store(peak.to_bits(), Ordering::Relaxed);
            self.rms[channel].store(rms.to_bits(), Ordering::Relaxed);
        }
    }
}

pub struct PluginProcessor {
    config: ProcessorConfig,
    shared: Arc<SharedState>,
    snapshot: ParamSnapshot,
    synth: PolySynth,
    synth_buffer: Vec<f32>,
    messages: Option<Box<dyn MessageReceiver>>,
    distortion: Distortion,
    filter: FilterProcessor,
    disflux: DisfluxProcessor,
    heretic: HereticProcessor,
    sample_rate: f32,
    max_block_size: usize,
    prepared: bool,
}

impl PluginProcessor {
    pub fn new(config: ProcessorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let shared = Arc::new(SharedState::new(&config)?);
        let snapshot = shared.params.snapshot();
        let channels = config.channels;

        Ok(Self {
            synth: PolySynth::new(48_000.0, config.polyphony, config.max_block_size),
            synth_buffer: Vec::new(),
            messages: None,
            distortion: Distortion::new(channels, config.oversampling),
            filter: FilterProcessor::new(channels, config.filter_sections),
            disflux: DisfluxProcessor::new(channels, config.disflux_stages)?,
            heretic: HereticProcessor::new(channels),
            sample_rate: 0.0,
            max_block_size: 0,
            prepared: false,
            shared,
            snapshot,
            config,
        })
    }

    /// Drain note messages from `rx` at the top of every block.
    pub fn with_messages(mut self, rx: impl MessageReceiver + 'static) -> Self {
        self.messages = Some(Box::new(rx));
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Handle for the editor and host threads.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Output delay introduced by the chain, in samples.
    pub fn latency(&self) -> usize {
        self.distortion.latency()
    }

    /// Allocate and reset everything for a new sample rate and block size.
    pub fn prepare(&mut self, sample_rate: f32, max_block_size: usize) -> Result<(), ConfigError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate {
                sample_rate: f64::from(sample_rate),
            });
        }
        if max_block_size == 0 || max_block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::InvalidBlockSize { block_size: max_block_size });
        }

        debug!(
            "processor: prepare at {sample_rate} Hz, block {max_block_size}, {} channels",
            self.config.channels
        );
        self.sample_rate = sample_rate;
        self.max_block_size = max_block_size;
        self.synth.prepare(sample_rate, max_block_size);
        self.synth_buffer = vec![0.0; max_block_size];
        self.snapshot = self.shared.params.snapshot();
        for stage in self.stages_mut() {
            stage.prepare(sample_rate, max_block_size);
        }
        self.shared.input_tap.clear();
        self.shared.output_tap.clear();
        self.shared.spectrum.clear();
        self.shared.sample_rate.store(sample_rate.to_bits(), Ordering::Relaxed);
        self.prepared = true;
        Ok(())
    }

    /// Drop scratch memory and clear DSP state. `prepare` must run again
    /// before the next block.
    pub fn release(&mut self) {
        debug!("processor: release");
        self.prepared = false;
        self.synth_buffer = Vec::new();
        for stage in self.stages_mut() {
            stage.reset();
        }
    }

    /// Resize the Disflux bank. Not realtime-safe.
    pub fn set_disflux_stages(&mut self, stages: usize) -> Result<(), ConfigError> {
        self.disflux.set_stage_count(stages)?;
        self.config.disflux_stages = stages;
        info!("processor: disflux bank resized to {stages} stages");
        Ok(())
    }

    fn stages_mut(&mut self) -> [&mut dyn Stage; 4] {
        [&mut self.distortion, &mut self.filter, &mut self.disflux, &mut self.heretic]
    }

    /// Process one block in place.
    ///
    /// Before `prepare`, audio passes through untouched.
    pub fn process_block(&mut self, audio: &mut [&mut [f32]], midi: &[MidiEvent]) {
        if !self.prepared {
            return;
        }
        let frames = audio.iter().map(|channel| channel.len()).min().unwrap_or(0);
        if frames == 0 {
            return;
        }

        self.shared.params.snapshot_into(&mut self.snapshot);
        let bypass = self.snapshot.flag(Param::GlobalBypass);

        for event in midi {
            if let Some(message) = midi_to_synth(*event, event.channel()) {
                self.synth.handle(message);
            }
        }
        if let Some(rx) = self.messages.as_mut() {
            self.synth.drain(rx.as_mut());
        }

        if !bypass {
            self.render_synth(audio, frames);
        }
        self.shared.input_tap.write_block(&*audio);

        if !bypass {
            let stages: [&mut dyn Stage; 4] =
                [&mut self.distortion, &mut self.filter, &mut self.disflux, &mut self.heretic];
            for (stage, slot) in stages.into_iter().zip(self.shared.status.iter()) {
                stage.process(audio, &self.snapshot);
                slot.store(stage.status().bits(), Ordering::Relaxed);
            }
        }

        self.shared.output_tap.write_block(&*audio);
        self.shared.spectrum.push(&*audio);
        self.shared.publish_meters(audio);
        self.shared.blocks.fetch_add(1, Ordering::Relaxed);
    }

    fn render_synth(&mut self, audio: &mut [&mut [f32]], frames: usize) {
        self.synth.apply(&self.snapshot);
        if self.synth.active_voices() == 0 || self.synth_buffer.is_empty() {
            return;
        }
        let chunk = self.synth_buffer.len();
        let mut start = 0;
        while start < frames {
            let len = chunk.min(frames - start);
            let voice_mix = &mut self.synth_buffer[..len];
            self.synth.render_block(voice_mix);
            for channel in audio.iter_mut() {
                for (out, v) in channel[start..start + len].iter_mut().zip(voice_mix.iter()) {
                    *out += v;
                }
            }
            start += len;
        }
    }

    // -- host surface -----------------------------------------------------

    pub fn parameter_count(&self) -> usize {
        self.shared.parameter_count()
    }

    pub fn parameter(&self, index: usize) -> Option<&Parameter> {
        self.shared.parameter(index)
    }

    pub fn set_parameter(&self, index: usize, normalized: f32) -> bool {
        self.shared.set_parameter(index, normalized)
    }

    pub fn state(&self) -> Result<Vec<u8>, PresetError> {
        self.shared.state()
    }

    pub fn set_state(&self, bytes: &[u8]) -> Result<(), PresetError> {
        self.shared.set_state(bytes)
    }

    // -- editor surface ---------------------------------------------------

    pub fn visualization_buffer(&self, name: &str) -> Option<&AudioRingBuffer> {
        self.shared.visualization_buffer(name)
    }

    pub fn meters(&self) -> MeterSnapshot {
        self.shared.meters()
    }
}
