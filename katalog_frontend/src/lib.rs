pub mod api;
pub mod app;
pub mod config;
pub mod models;

use anyhow::{anyhow, Result};
use eframe::{self, egui};

pub use app::KatalogApp;
use config::FrontendConfig;

/// Launches the egui application with default window options, configured
/// from the environment.
pub fn run_frontend() -> Result<()> {
    run_frontend_with_options(FrontendConfig::from_env(), default_native_options())
}

/// Launches the egui app with caller-provided configuration and options.
pub fn run_frontend_with_options(
    config: FrontendConfig,
    options: eframe::NativeOptions,
) -> Result<()> {
    let _ = env_logger::builder().is_test(false).try_init();
    eframe::run_native(
        "Katalog",
        options,
        Box::new(move |cc| Ok(Box::new(KatalogApp::new(cc, config)?))),
    )
    .map_err(|err| anyhow!("failed to run the UI: {err}"))
}

fn default_native_options() -> eframe::NativeOptions {
    eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    }
}
