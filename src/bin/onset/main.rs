//! onset - live onset detection on the default input device
//!
//! Run with: cargo run --bin onset

mod app;
mod ui;

use app::OnsetApp;
use onset_dsp::DetectorConfig;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    OnsetApp::new(DetectorConfig::default()).run()
}
