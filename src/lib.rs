//! Waterfall chromatogram plots from Agilent MassHunter CSV exports.
//!
//! A MassHunter export stacks every sample's `#Point, X(Minutes), Y(Counts)`
//! block in one flat file, separated by marker rows. [`data::loader`] rebuilds
//! a time-aligned table from it, [`data::filter`] cuts and reorders that table,
//! and [`render`] draws one panel per sample.

pub mod color;
pub mod config;
pub mod data;
pub mod render;

use std::path::Path;

use config::PlotConfig;
use data::error::Result;
use data::model::Chromatograms;

/// Reconstruct `input` and apply the configured time window and column order.
///
/// Fails if writing the `<stem> parsed.csv` side-effect export fails.
pub fn load_selection(input: &Path, config: &PlotConfig) -> Result<Chromatograms> {
    let reconstruction = data::loader::reconstruct_with_marker(input, &config.boundary_marker)?;
    let data = reconstruction.into_data()?;
    data::filter::select(data, config.time_window(), &config.selection.reorder)
}
