//! GUI-side state of the suite.
//!
//! The editor never owns the processor. It keeps a [`Weak`] handle to the
//! shared state and quietly goes inert once the processor is dropped, so a
//! host can tear the two down in either order. Drawing itself is left to the
//! front end; this module decides where panels go and what they show.

/// Proportional grid placement for panels.
pub mod layout;
/// Oscilloscope trace state.
pub mod scope;
/// Cancellable repaint ticker.
pub mod timer;

pub use layout::{GridCell, GridLayout, PanelRect};
pub use scope::ScopeView;
pub use timer::RepaintTimer;

use std::io;
use std::sync::{Arc, Weak};

use crate::config::Settings;
use crate::error::ConfigError;
use crate::graph::processor::{MeterSnapshot, SharedState, OSCILLOSCOPE_TAP};
use crate::params::ParameterListeners;

/// Panel names used by [`Editor::default_layout`].
pub const PANELS: &[&str] =
    &["scope", "meters", "spectrum", "oscillator", "envelope", "distortion", "filter", "disflux", "heretic"];

pub struct Editor {
    processor: Weak<SharedState>,
    layout: GridLayout,
    scope: ScopeView,
    listeners: ParameterListeners,
    timer: Option<RepaintTimer>,
    meters: MeterSnapshot,
}

impl Editor {
    pub fn new(shared: &Arc<SharedState>, layout: GridLayout) -> Self {
        let scope = match shared.visualization_buffer(OSCILLOSCOPE_TAP) {
            Some(ring) => ScopeView::for_buffer(ring),
            None => ScopeView::new(shared.channel_count(), 0),
        };
        Self {
            processor: Arc::downgrade(shared),
            layout,
            scope,
            listeners: ParameterListeners::new(),
            timer: None,
            meters: MeterSnapshot::default(),
        }
    }

    /// Four columns, three rows: scope and meters on top, spectrum and the
    /// synth controls in the middle, one column per effect at the bottom.
    pub fn default_layout() -> Result<GridLayout, ConfigError> {
        let mut grid = GridLayout::new(&[0.25, 0.5, 0.75], &[0.45, 0.7])?;
        grid.add("scope", GridCell::new(0, 0, 3, 1))?;
        grid.add("meters", GridCell::new(3, 0, 4, 1))?;
        grid.add("spectrum", GridCell::new(0, 1, 2, 2))?;
        grid.add("oscillator", GridCell::new(2, 1, 3, 2))?;
        grid.add("envelope", GridCell::new(3, 1, 4, 2))?;
        for (col, name) in ["distortion", "filter", "disflux", "heretic"].into_iter().enumerate() {
            grid.add(name, GridCell::new(col, 2, col + 1, 3))?;
        }
        Ok(grid)
    }

    /// Start repainting at the installed framerate.
    pub fn start_timer(&mut self) -> io::Result<()> {
        if self.timer.is_none() {
            self.timer = Some(RepaintTimer::start(Settings::get().framerate)?);
        }
        Ok(())
    }

    /// Whether the processor is still alive.
    pub fn is_attached(&self) -> bool {
        self.processor.strong_count() > 0
    }

    pub fn shared(&self) -> Option<Arc<SharedState>> {
        self.processor.upgrade()
    }

    /// Run `callback` on the GUI thread whenever parameter `id` changes.
    /// Does nothing once the processor is gone.
    pub fn on_parameter_changed(
        &mut self,
        id: &str,
        callback: impl FnMut(&str, f32) + 'static,
    ) -> Result<(), ConfigError> {
        match self.processor.upgrade() {
            Some(shared) => self.listeners.on_parameter_changed(shared.params(), id, callback),
            None => Ok(()),
        }
    }

    /// One repaint's worth of work: dispatch parameter changes, refresh the
    /// scope and read the meters. Returns `false` once the processor has
    /// been dropped, after which the timer is stopped.
    pub fn tick(&mut self) -> bool {
        let Some(shared) = self.processor.upgrade() else {
            self.close();
            return false;
        };
        self.listeners.dispatch(shared.params());
        self.scope.apply(shared.params());
        if let Some(ring) = shared.visualization_buffer(OSCILLOSCOPE_TAP) {
            self.scope.refresh(ring);
        }
        self.meters = shared.meters();
        true
    }

    /// Tick if the repaint timer fired since the last frame.
    pub fn poll(&mut self) -> bool {
        let due = self.timer.as_ref().is_some_and(|timer| timer.take_pending() > 0);
        due && self.tick()
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn scope(&self) -> &ScopeView {
        &self.scope
    }

    pub fn meters(&self) -> &MeterSnapshot {
        &self.meters
    }

    /// Stop the repaint timer. Must run before the processor side is torn
    /// down; `Drop` does it too.
    pub fn close(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop();
        }
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.close();
    }
}
