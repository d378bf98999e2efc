mod app;
mod color;
mod config;
mod data;
mod export;
mod state;
mod ui;

use std::path::PathBuf;

use app::DashboardApp;
use clap::Parser;
use eframe::egui;

use crate::color::Theme;
use crate::state::{AppState, ViewState};

/// Electric vehicle population dashboard.
#[derive(Parser)]
#[command(name = "ev-dashboard", version, about)]
struct Cli {
    /// Dataset to load at startup (CSV or records-oriented JSON).
    ///
    /// Overrides `[data] path` from the config file.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Path to the configuration file (TOML).
    ///
    /// Defaults to `./config/dashboard.toml`; a missing default file means
    /// built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with the dark theme.
    #[arg(long)]
    dark: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = config::resolve_config(cli.config.as_deref())?;
    log::debug!("Using config {config:?}");

    let theme = if cli.dark { Theme::Dark } else { config.ui.theme };
    let data_path = cli.data.unwrap_or(config.data.path);

    let mut state = AppState::new(
        ViewState::new(config.table.page_size, theme),
        config.dashboard.top_n,
    );
    state.start_load(&data_path);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EV Population Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("running the UI: {e}"))
}
