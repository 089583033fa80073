use anyhow::{Context, Result};
use eframe::egui;

use troponin_viewer::app::TroponinApp;
use troponin_viewer::config::ViewerConfig;
use troponin_viewer::state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let config = ViewerConfig::from_env().context("loading configuration")?;
    let thresholds = config.thresholds.table().context("building threshold table")?;
    let [width, height] = config.window_size;

    let mut state = AppState::new(config, thresholds);
    if let Some(path) = std::env::args_os().nth(1) {
        state.load_path(std::path::Path::new(&path));
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([width, height])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Troponin Viewer – cTnI Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(TroponinApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the viewer: {e}"))
}
