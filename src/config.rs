//! TOML parameter file for a waterfall run.
//!
//! Every field has a default, so a file only needs the settings that differ:
//!
//! ```toml
//! # waterfaller.toml
//! input = "UV_example.csv"
//! output = "UV_example.svg"
//!
//! [selection]
//! t_min = 0.0
//! t_max = 10.0
//! reorder = [1, 3, 2, 0]   # 0-indexed sample columns
//!
//! [y_scales]               # 1-indexed: chromatogram -> zoom factor
//! 3 = 10.0
//!
//! [rename]                 # 1-indexed: chromatogram -> label
//! 1 = "blk"
//! 2 = "propargylglycine"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Deserializer};

use crate::data::filter::TimeWindow;
use crate::data::loader::BOUNDARY_MARKER;

/// Immutable run configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    /// MassHunter CSV export to read.
    pub input: Option<PathBuf>,
    /// Figure path; the extension picks the backend.
    pub output: PathBuf,
    /// Substring identifying sample-boundary rows.
    pub boundary_marker: String,
    pub selection: SelectionConfig,
    /// Zoom factor per chromatogram, 1 = top panel.
    pub y_scales: SampleOverrides<f64>,
    /// Display label per chromatogram, 1 = top panel.
    pub rename: SampleOverrides<String>,
    pub title: TitleConfig,
    pub x_axis: XAxisConfig,
    pub lines: LineConfig,
    pub figure: FigureConfig,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: PathBuf::from("figure.svg"),
            boundary_marker: BOUNDARY_MARKER.to_string(),
            selection: SelectionConfig::default(),
            y_scales: SampleOverrides::default(),
            rename: SampleOverrides::default(),
            title: TitleConfig::default(),
            x_axis: XAxisConfig::default(),
            lines: LineConfig::default(),
            figure: FigureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Rows with `t_min < time < t_max` are kept.
    pub t_min: f64,
    pub t_max: f64,
    /// 0-indexed sample columns to plot, in order. Empty keeps all.
    pub reorder: Vec<usize>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            t_min: 0.0,
            t_max: 10.0,
            reorder: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    /// Empty for no title.
    pub text: String,
    pub size: u32,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            size: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct XAxisConfig {
    pub min: f64,
    pub max: f64,
    /// Distance between tick marks.
    pub tick: f64,
    pub tick_size: u32,
    /// Empty for no axis title.
    pub label: String,
    pub label_size: u32,
}

impl Default for XAxisConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 10.0,
            tick: 1.0,
            tick_size: 16,
            label: "Time (min)".to_string(),
            label_size: 18,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    pub axis_width: f64,
    pub chrom_width: f64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            axis_width: 1.5,
            chrom_width: 1.5,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Distinct palette colours per trace instead of black.
    pub colorize: bool,
}

impl PlotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    pub fn time_window(&self) -> TimeWindow {
        TimeWindow::new(self.selection.t_min, self.selection.t_max)
    }
}

// ---------------------------------------------------------------------------
// 1-indexed per-chromatogram overrides
// ---------------------------------------------------------------------------

/// Sparse per-chromatogram settings keyed by 1-indexed display position.
///
/// This is the only place where 1-indexed chromatogram numbers are turned
/// into 0-indexed column positions.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOverrides<T>(BTreeMap<usize, T>);

impl<T> Default for SampleOverrides<T> {
    fn default() -> Self {
        SampleOverrides(BTreeMap::new())
    }
}

impl<T> SampleOverrides<T> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Chromatogram numbers as written in the config, 1-indexed.
    pub fn numbers(&self) -> Vec<usize> {
        self.0.keys().copied().collect()
    }

    /// Override for the 0-indexed column `index`, if any.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.0.get(&(index + 1))
    }

    /// In-range entries as `(0-indexed column, value)`.
    ///
    /// Numbers outside `1..=len` are reported with a warning and skipped;
    /// `action` names the operation in that warning ("scaling", "renaming").
    pub fn resolve(&self, len: usize, action: &str) -> Vec<(usize, &T)> {
        self.0
            .iter()
            .filter_map(|(&number, value)| {
                if (1..=len).contains(&number) {
                    Some((number - 1, value))
                } else {
                    warn!(
                        "Error while {action}. Chromatogram number {number} is not in chromatogram index."
                    );
                    None
                }
            })
            .collect()
    }
}

impl<T> FromIterator<(usize, T)> for SampleOverrides<T> {
    fn from_iter<I: IntoIterator<Item = (usize, T)>>(iter: I) -> Self {
        SampleOverrides(iter.into_iter().collect())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for SampleOverrides<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = BTreeMap::<String, T>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, value)| {
                key.trim()
                    .parse::<usize>()
                    .map(|number| (number, value))
                    .map_err(|_| {
                        serde::de::Error::custom(format!(
                            "'{key}' is not a chromatogram number (expected 1, 2, 3, ...)"
                        ))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            input = "UV_example.csv"
            output = "out.png"

            [selection]
            t_min = 1.0
            t_max = 8.5
            reorder = [1, 3, 2, 0]

            [y_scales]
            3 = 10.0
            4 = 2

            [rename]
            1 = "blk"
            2 = "propargylglycine"

            [x_axis]
            tick = 0.5
            label = ""
        "#;

        let config = PlotConfig::from_str(toml).unwrap();
        assert_eq!(config.input, Some(PathBuf::from("UV_example.csv")));
        assert_eq!(config.output, PathBuf::from("out.png"));
        assert_eq!(config.selection.reorder, vec![1, 3, 2, 0]);
        assert_eq!(config.time_window(), TimeWindow::new(1.0, 8.5));
        assert_eq!(config.y_scales.numbers(), vec![3, 4]);
        assert_eq!(config.y_scales.get(3), Some(&2.0));
        assert_eq!(config.rename.get(0).map(String::as_str), Some("blk"));
        assert_eq!(config.x_axis.tick, 0.5);
        assert_eq!(config.x_axis.max, 10.0);
        assert!(config.x_axis.label.is_empty());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PlotConfig::from_str("").unwrap();
        assert_eq!(config.input, None);
        assert_eq!(config.boundary_marker, "ESI");
        assert!(config.selection.reorder.is_empty());
        assert!(config.y_scales.is_empty());
        assert_eq!(config.title.size, 20);
        assert_eq!(config.lines.chrom_width, 1.5);
        assert!(!config.figure.colorize);
    }

    #[test]
    fn test_non_numeric_override_key_is_rejected() {
        let toml = r#"
            [rename]
            first = "blk"
        "#;
        assert!(PlotConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_resolve_converts_to_zero_indexed_and_skips_out_of_range() {
        let overrides: SampleOverrides<f64> = [(0, 9.0), (1, 2.0), (3, 4.0), (7, 1.0)]
            .into_iter()
            .collect();
        assert_eq!(overrides.resolve(3, "scaling"), vec![(0, &2.0), (2, &4.0)]);
    }
}
