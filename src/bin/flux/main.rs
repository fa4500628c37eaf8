//! flux - terminal host for the effect suite
//!
//! Run with: cargo run --bin flux
//!
//! Plays an arpeggio through the synth and the effect chain and shows the
//! scope, spectrum, meters and every parameter. `FLUX_DEBUG_GRID=1` outlines
//! the layout grid.

mod app;
mod arpeggio;
mod ui;

use app::FluxApp;
use flux_suite::{Oversampling, Settings};
use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // The terminal UI owns stdout, keep stderr quiet unless RUST_LOG says otherwise.
    SimpleLogger::new().with_level(LevelFilter::Warn).env().init()?;

    let debug_grid = std::env::var_os("FLUX_DEBUG_GRID").is_some();
    if Settings::install(Settings::default().with_framerate(30).with_debug_grid(debug_grid)).is_err() {
        log::warn!("gui settings were already installed");
    }

    FluxApp::new()
        .oversampling(Oversampling::X2)
        .root_note(45)
        .tempo(132.0)
        .run()
}
