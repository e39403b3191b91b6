mod app;
mod chart;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::Context;
use app::DashboardApp;
use chart::Page;
use config::DashboardConfig;
use eframe::egui;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = DashboardConfig::from_env();
    log::debug!("Starting with {config:?}");

    // A missing or malformed dataset is fatal: there is nothing to show.
    let table = data::loader::load_cached(&config.data_path)
        .with_context(|| format!("loading {}", config.data_path.display()))
        .inspect_err(|e| log::error!("{e:#}"))?;

    let start_page = Page::from_label(&config.start_page).unwrap_or_else(|| {
        log::warn!("Unknown start page {:?}, showing Home", config.start_page);
        Page::Home
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window_width, config.window_height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "HOME.LLC – US Housing Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(DashboardApp::new(table, start_page)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
