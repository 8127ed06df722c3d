//! # waterfaller
//!
//! Turns an Agilent MassHunter multi-sample CSV export into a tidy table
//! (`<stem> parsed.csv`) and a stacked chromatogram figure.
//!
//! ```bash
//! # Everything from the parameter file
//! waterfaller --config waterfaller.toml
//!
//! # Override paths and open the interactive viewer afterwards
//! waterfaller -i UV_example.csv -o UV_example.png --show
//! ```

mod app;
mod state;
mod ui;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;
use log::info;

use app::WaterfallerApp;
use state::AppState;
use waterfaller::config::PlotConfig;
use waterfaller::render::{self, layout::Figure};

const DEFAULT_CONFIG: &str = "waterfaller.toml";

/// Waterfall plots from MassHunter chromatogram exports
#[derive(Parser)]
#[command(name = "waterfaller")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML parameter file [default: waterfaller.toml, if present]
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// MassHunter CSV export (overrides `input`)
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Figure path, .svg/.png/.jpg/.bmp (overrides `output`)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Open the interactive viewer after saving the figure
    #[arg(long)]
    show: bool,

    /// Verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = load_config(&cli)?;
    let input = config
        .input
        .clone()
        .context("No input file: set `input` in the config file or pass --input")?;

    let data = waterfaller::load_selection(&input, &config)
        .with_context(|| format!("Failed to process {}", input.display()))?;
    let figure = Figure::prepare(&data, &config);
    render::save_figure(&figure, &config, &config.output)
        .with_context(|| format!("Failed to save figure to {}", config.output.display()))?;

    if cli.show {
        run_viewer(AppState::new(config, Some(input), Some(figure)))?;
    }
    Ok(())
}

/// Build the immutable run configuration: file first, then CLI overrides.
fn load_config(cli: &Cli) -> Result<PlotConfig> {
    let mut config = match &cli.config {
        Some(path) => PlotConfig::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG).exists() => {
            PlotConfig::from_file(Path::new(DEFAULT_CONFIG))?
        }
        None => {
            info!("No {DEFAULT_CONFIG} found, using default parameters");
            PlotConfig::default()
        }
    };

    if let Some(input) = &cli.input {
        config.input = Some(input.clone());
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    Ok(config)
}

fn run_viewer(state: AppState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 800.0])
            .with_min_inner_size([500.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "waterfaller – Chromatogram Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(WaterfallerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("Viewer failed: {e}"))
}
