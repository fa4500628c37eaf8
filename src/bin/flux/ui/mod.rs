//! TUI module for flux
//!
//! Draws the editor's grid in the terminal: scope, spectrum, meters and one
//! panel per parameter group. Keys select and nudge parameters the same way
//! a host automation lane would.

mod panels;
mod scope;
mod spectrum;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Producer;
use std::sync::Arc;
use std::time::{Duration, Instant};

use flux_suite::{
    editor::{Editor, PanelRect},
    params::{Param, ParameterRange},
    synth::SynthMessage,
    SharedState, Settings,
};

use super::arpeggio::Arpeggio;
use panels::{groups_for, render_meters, render_parameters};
use scope::render_scope;
use spectrum::{render_spectrum, SpectrumAnalyzer};

/// Where `s` and `l` save and load the preset.
const PRESET_PATH: &str = "flux_preset.json";

/// Normalised step for continuous parameters.
const NUDGE: f32 = 0.02;

/// UI application state
pub struct UiApp {
    editor: Editor,
    shared: Arc<SharedState>,
    tx: Producer<SynthMessage>,
    arpeggio: Arpeggio,
    spectrum: SpectrumAnalyzer,
    /// One spectrum block per channel, reused every frame
    spectrum_block: Vec<Vec<f32>>,
    /// Tree index of the parameter the arrow keys act on
    selected: usize,
    message: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(editor: Editor, shared: Arc<SharedState>, tx: Producer<SynthMessage>, arpeggio: Arpeggio) -> Self {
        let block_len = shared.spectrum().block_size();
        let spectrum = SpectrumAnalyzer::new(block_len, shared.sample_rate());
        let spectrum_block = vec![vec![0.0; block_len]; shared.channel_count()];
        Self {
            editor,
            shared,
            tx,
            arpeggio,
            spectrum,
            spectrum_block,
            selected: Param::OscWaveform.index(),
            message: String::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        terminal.draw(|frame| self.render(frame))?;
        while !self.should_quit {
            self.arpeggio.poll(Instant::now(), &mut self.tx);

            if self.editor.poll() {
                self.poll_spectrum();
                terminal.draw(|frame| self.render(frame))?;
            }
            if !self.editor.is_attached() {
                break;
            }

            if event::poll(Duration::from_millis(5))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }
        self.editor.close();
        Ok(())
    }

    /// Fold every complete spectrum block into the analyzer.
    fn poll_spectrum(&mut self) {
        while self.shared.spectrum().pop_block(&mut self.spectrum_block) {
            if let Some(first) = self.spectrum_block.first() {
                self.spectrum.update(first);
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let count = self.shared.parameter_count();
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up => self.selected = (self.selected + count - 1) % count,
            KeyCode::Down => self.selected = (self.selected + 1) % count,
            KeyCode::Left => self.nudge(-1.0),
            KeyCode::Right => self.nudge(1.0),
            KeyCode::Char('r') => {
                if let Some(parameter) = self.shared.parameter(self.selected) {
                    self.shared.set_parameter(self.selected, parameter.default_normalized());
                }
            }
            KeyCode::Char(' ') => {
                let index = Param::GlobalBypass.index();
                let bypassed = self.shared.params().normalized(index).unwrap_or(0.0) >= 0.5;
                self.shared.set_parameter(index, if bypassed { 0.0 } else { 1.0 });
            }
            KeyCode::Char('a') => self.arpeggio.toggle(&mut self.tx),
            KeyCode::Char('s') => {
                self.message = match self.save_preset() {
                    Ok(()) => format!("saved {PRESET_PATH}"),
                    Err(err) => format!("save failed: {err}"),
                };
            }
            KeyCode::Char('l') => {
                self.message = match self.load_preset() {
                    Ok(()) => format!("loaded {PRESET_PATH}"),
                    Err(err) => format!("load failed: {err}"),
                };
            }
            _ => {}
        }
    }

    /// Step the selected parameter; choices and integers move one option.
    fn nudge(&mut self, direction: f32) {
        let Some(parameter) = self.shared.parameter(self.selected) else {
            return;
        };
        let step = match parameter.range() {
            ParameterRange::Choice { options } => 1.0 / (options.len().max(2) - 1) as f32,
            ParameterRange::Int { min, max } => 1.0 / (max - min).max(1) as f32,
            ParameterRange::Bool => 1.0,
            ParameterRange::Float { .. } => NUDGE,
        };
        let value = (parameter.normalized() + direction * step).clamp(0.0, 1.0);
        self.shared.set_parameter(self.selected, value);
    }

    fn save_preset(&self) -> EyreResult<()> {
        let bytes = self.shared.state()?;
        std::fs::write(PRESET_PATH, bytes).wrap_err_with(|| format!("writing {PRESET_PATH}"))?;
        log::info!("preset saved to {PRESET_PATH}");
        Ok(())
    }

    fn load_preset(&self) -> EyreResult<()> {
        let bytes = std::fs::read(PRESET_PATH).wrap_err_with(|| format!("reading {PRESET_PATH}"))?;
        self.shared.set_state(&bytes)?;
        log::info!("preset loaded from {PRESET_PATH}");
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let grid_area = Rect { height: area.height.saturating_sub(1), ..area };
        let debug_grid = Settings::get().debug_grid;

        for (name, rect) in self.editor.layout().layout(u32::from(grid_area.width), u32::from(grid_area.height)) {
            let target = to_terminal(grid_area, rect);
            if target.width < 2 || target.height < 2 {
                continue;
            }
            let title = if debug_grid {
                format!(" {name} {}x{}+{}+{} ", rect.width, rect.height, rect.x, rect.y)
            } else {
                format!(" {name} ")
            };
            match name {
                "scope" => render_scope(frame, target, &title, self.editor.scope()),
                "spectrum" => render_spectrum(frame, target, &title, self.spectrum.data()),
                "meters" => render_meters(frame, target, &title, self.editor.meters(), &self.shared),
                _ => render_parameters(frame, target, &title, self.shared.params(), groups_for(name), self.selected),
            }
        }

        // Global and scope parameters have no panel of their own.
        let selected = self
            .shared
            .parameter(self.selected)
            .map(|p| format!("{}.{} = {}", p.group(), p.name(), p.display()))
            .unwrap_or_default();
        let arp = if self.arpeggio.is_enabled() { "on" } else { "off" };
        let help = Paragraph::new(format!(
            " [Q] Quit  [↑↓] Select  [←→] Adjust  [R] Reset  [Space] Bypass  [A] Arp {arp}  [S/L] Preset  | {selected}  {}",
            self.message
        ))
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, Rect { y: area.bottom().saturating_sub(1), height: 1, ..area });
    }
}

fn to_terminal(area: Rect, rect: PanelRect) -> Rect {
    let clamp = |v: u32| u16::try_from(v).unwrap_or(u16::MAX);
    Rect {
        x: area.x.saturating_add(clamp(rect.x)),
        y: area.y.saturating_add(clamp(rect.y)),
        width: clamp(rect.width),
        height: clamp(rect.height),
    }
}
