use std::path::{Path, PathBuf};

use waterfaller::config::PlotConfig;
use waterfaller::render::{self, layout::Figure};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The viewer state, independent of rendering.
pub struct AppState {
    /// Run configuration; never modified after startup.
    pub config: PlotConfig,

    /// Export currently shown.
    pub input: Option<PathBuf>,

    /// Laid-out panels for the current export.
    pub figure: Option<Figure>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: PlotConfig, input: Option<PathBuf>, figure: Option<Figure>) -> Self {
        Self {
            config,
            input,
            figure,
            status_message: None,
        }
    }

    /// Reconstruct another export with the same configuration.
    pub fn open(&mut self, path: PathBuf) {
        match waterfaller::load_selection(&path, &self.config) {
            Ok(data) => {
                log::info!(
                    "Loaded {} chromatogram(s) from {}",
                    data.len(),
                    path.display()
                );
                self.figure = Some(Figure::prepare(&data, &self.config));
                self.input = Some(path);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Export the current figure through the static renderer.
    pub fn save(&mut self, path: &Path) {
        let Some(figure) = &self.figure else {
            self.status_message = Some("Nothing to save.".to_string());
            return;
        };
        match render::save_figure(figure, &self.config, path) {
            Ok(()) => self.status_message = Some(format!("Figure saved to {}", path.display())),
            Err(e) => {
                log::error!("Failed to save figure: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}
