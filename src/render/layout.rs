use log::{info, warn};

use crate::color::{trace_colors, Rgb};
use crate::config::PlotConfig;
use crate::data::model::{ChromatogramTable, Chromatograms};

/// Fraction of the data range added above and below the traces.
const Y_PADDING: f64 = 0.1;

/// Vertical position of the panel label, as a fraction of the panel height.
const LABEL_HEIGHT: f64 = 0.85;

/// Upper bound on the number of x-axis ticks.
pub const MAX_TICKS: usize = 1000;

// ---------------------------------------------------------------------------
// Figure – everything both renderers need, computed once
// ---------------------------------------------------------------------------

/// One chromatogram panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    /// Display label (after renames).
    pub label: String,
    /// Contiguous `(time, intensity)` runs; gaps in the table split runs.
    pub runs: Vec<Vec<(f64, f64)>>,
    /// Visible y-range `(bottom, top)`.
    pub y_range: (f64, f64),
    pub color: Rgb,
}

impl Panel {
    /// Where the label is anchored (right-aligned) for a given x-range.
    pub fn label_anchor(&self, x_range: (f64, f64)) -> (f64, f64) {
        let (bottom, top) = self.y_range;
        (x_range.1, bottom + (top - bottom) * LABEL_HEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// One chromatogram, one short panel.
    Single,
    /// Stacked panels sharing the bottom x-axis.
    Waterfall,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub layout: Layout,
    /// Top to bottom.
    pub panels: Vec<Panel>,
    pub x_range: (f64, f64),
    pub x_ticks: Vec<f64>,
}

impl Figure {
    /// Lay out `data` according to `config`, logging the applied overrides.
    ///
    /// Scale and rename overrides address panels by 1-indexed position in the
    /// order given (i.e. after selection/reordering).
    pub fn prepare(data: &Chromatograms, config: &PlotConfig) -> Figure {
        let table = &data.table;
        let n = table.n_samples();
        let layout = if data.is_single() {
            Layout::Single
        } else {
            Layout::Waterfall
        };

        let shared = padded_range(table.intensity_bounds());
        let mut ranges = vec![shared; n];
        match layout {
            Layout::Waterfall => apply_scales(&mut ranges, table, config),
            Layout::Single if !config.y_scales.is_empty() => {
                info!("Single chromatogram: y-axis scale factors are not applied.");
            }
            Layout::Single => {}
        }

        let labels = display_labels(&data.names, config);
        let colors = trace_colors(n, config.figure.colorize);

        let panels = table
            .samples
            .iter()
            .zip(labels)
            .zip(ranges)
            .zip(colors)
            .map(|(((column, label), y_range), color)| Panel {
                label,
                runs: line_runs(&table.time, &column.intensity),
                y_range,
                color,
            })
            .collect();

        Figure {
            layout,
            panels,
            x_range: (config.x_axis.min, config.x_axis.max),
            x_ticks: x_ticks(config.x_axis.min, config.x_axis.max, config.x_axis.tick),
        }
    }

    pub fn is_single(&self) -> bool {
        self.layout == Layout::Single
    }

    /// Output size in pixels (8×6 or 8×3 inches at 100 dpi).
    pub fn pixel_size(&self) -> (u32, u32) {
        match self.layout {
            Layout::Single => (800, 300),
            Layout::Waterfall => (800, 600),
        }
    }
}

// ---------------------------------------------------------------------------
// Y-axis limits
// ---------------------------------------------------------------------------

/// `[min - 10 %, max + 10 %]` of the data range; ±0.5 around a flat signal.
pub fn padded_range(bounds: Option<(f64, f64)>) -> (f64, f64) {
    match bounds {
        Some((min, max)) if max - min > f64::EPSILON => {
            let pad = (max - min) * Y_PADDING;
            (min - pad, max + pad)
        }
        Some((min, max)) => (min - 0.5, max + 0.5),
        None => (0.0, 1.0),
    }
}

/// Zoom into a panel by `factor` while keeping its lowest point at the same
/// relative height.
pub fn scaled_range(current: (f64, f64), data_min: f64, factor: f64) -> (f64, f64) {
    let (bottom, top) = current;
    let range = top - bottom;
    let ratio = (data_min - bottom) / range;
    let new_range = range / factor;
    let new_bottom = data_min - ratio * new_range;
    (new_bottom, new_bottom + new_range)
}

fn apply_scales(ranges: &mut [(f64, f64)], table: &ChromatogramTable, config: &PlotConfig) {
    if config.y_scales.is_empty() {
        info!("No y-axis manipulation performed. Each plot set to the same y-axis values.");
        return;
    }

    let mut scaled = Vec::new();
    for (index, &factor) in config.y_scales.resolve(ranges.len(), "scaling") {
        if !(factor.is_finite() && factor > 0.0) {
            warn!(
                "Error while scaling. Scale factor {factor} for chromatogram {} must be positive.",
                index + 1
            );
            continue;
        }
        let Some(data_min) = table.samples[index].min() else {
            warn!(
                "Chromatogram {} has no points in the time window; not scaled.",
                index + 1
            );
            continue;
        };
        ranges[index] = scaled_range(ranges[index], data_min, factor);
        scaled.push(index + 1);
    }

    if !scaled.is_empty() {
        info!("Chromatogram(s) {scaled:?} scaled.");
    }
}

// ---------------------------------------------------------------------------
// Labels, ticks, line runs
// ---------------------------------------------------------------------------

/// Apply 1-indexed renames to `names`, listing the originals first.
pub fn display_labels(names: &[String], config: &PlotConfig) -> Vec<String> {
    info!("Sample names found in .csv file:");
    for (i, name) in names.iter().enumerate() {
        match config.rename.get(i) {
            Some(custom) => info!("{}: {name} // {custom}", i + 1),
            None => info!("{}: {name}", i + 1),
        }
    }

    let mut labels = names.to_vec();
    for (index, custom) in config.rename.resolve(labels.len(), "renaming") {
        labels[index] = custom.clone();
    }
    labels
}

/// Tick positions `min, min + step, ...` up to and including `max`.
///
/// Returns no ticks for an unusable step, including one so small that the
/// axis would need more than [`MAX_TICKS`] of them.
pub fn x_ticks(min: f64, max: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) || !(max >= min) {
        return Vec::new();
    }
    let count = ((max - min) / step + 1e-9).floor();
    if !(count < MAX_TICKS as f64) {
        warn!("x-axis tick step {step} gives too many ticks between {min} and {max}; ticks omitted.");
        return Vec::new();
    }
    (0..=count as usize).map(|i| min + i as f64 * step).collect()
}

/// Split a column into drawable runs, breaking at gaps and non-finite values.
pub fn line_runs(time: &[f64], intensity: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for (&t, &y) in time.iter().zip(intensity) {
        match y {
            Some(y) if y.is_finite() && t.is_finite() => current.push((t, y)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SampleColumn;

    fn data(columns: &[(&str, Vec<Option<f64>>)]) -> Chromatograms {
        let rows = columns[0].1.len();
        Chromatograms::from_table(ChromatogramTable {
            time: (0..rows).map(|i| i as f64).collect(),
            samples: columns
                .iter()
                .map(|(name, values)| SampleColumn {
                    name: name.to_string(),
                    intensity: values.clone(),
                })
                .collect(),
        })
    }

    fn assert_close(a: (f64, f64), b: (f64, f64)) {
        assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_padded_range() {
        assert_close(padded_range(Some((0.0, 100.0))), (-10.0, 110.0));
        assert_close(padded_range(Some((5.0, 5.0))), (4.5, 5.5));
        assert_close(padded_range(None), (0.0, 1.0));
    }

    #[test]
    fn test_scaled_range_keeps_data_min_ratio() {
        // data_min sits 1/12 of the way up; zooming 2x halves the range.
        let scaled = scaled_range((-10.0, 110.0), 0.0, 2.0);
        assert_close(scaled, (-5.0, 55.0));
    }

    #[test]
    fn test_waterfall_shares_limits_and_scales_one_panel() {
        let d = data(&[
            ("a", vec![Some(0.0), Some(100.0)]),
            ("b", vec![Some(0.0), Some(10.0)]),
        ]);
        let mut config = PlotConfig::default();
        config.y_scales = [(2, 2.0), (9, 3.0)].into_iter().collect();

        let figure = Figure::prepare(&d, &config);
        assert_eq!(figure.layout, Layout::Waterfall);
        assert_close(figure.panels[0].y_range, (-10.0, 110.0));
        assert_close(figure.panels[1].y_range, (-5.0, 55.0));
    }

    #[test]
    fn test_single_panel_ignores_scales() {
        let d = data(&[("ESI_blank", vec![Some(1.0), Some(3.0), Some(2.0)])]);
        let mut config = PlotConfig::default();
        config.y_scales = [(1, 5.0)].into_iter().collect();

        let figure = Figure::prepare(&d, &config);
        assert!(figure.is_single());
        assert_eq!(figure.pixel_size(), (800, 300));
        assert_close(figure.panels[0].y_range, (0.8, 3.2));
    }

    #[test]
    fn test_renames_apply_to_display_order() {
        let d = data(&[
            ("x", vec![Some(1.0)]),
            ("y", vec![Some(1.0)]),
            ("z", vec![Some(1.0)]),
        ]);
        let mut config = PlotConfig::default();
        config.rename = [(1, "blk".to_string()), (3, "last".to_string()), (4, "nope".to_string())]
            .into_iter()
            .collect();

        let labels: Vec<String> = Figure::prepare(&d, &config)
            .panels
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, vec!["blk", "y", "last"]);
    }

    #[test]
    fn test_x_ticks_include_max() {
        assert_eq!(x_ticks(0.0, 10.0, 2.5), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
        assert_eq!(x_ticks(0.0, 1.0, 0.1).len(), 11);
        assert!(x_ticks(0.0, 10.0, 0.0).is_empty());
        assert!(x_ticks(5.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_x_ticks_refuses_tiny_steps() {
        assert!(x_ticks(0.0, 10.0, 1e-12).is_empty());
        assert!(x_ticks(0.0, 10.0, f64::MIN_POSITIVE).is_empty());
        assert_eq!(x_ticks(0.0, 999.0, 1.0).len(), MAX_TICKS);
        assert!(x_ticks(0.0, 1000.0, 1.0).is_empty());
    }

    #[test]
    fn test_line_runs_break_at_gaps() {
        let runs = line_runs(
            &[0.0, 1.0, 2.0, 3.0, 4.0],
            &[Some(1.0), Some(2.0), None, Some(4.0), Some(f64::NAN)],
        );
        assert_eq!(runs, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]);
    }

    #[test]
    fn test_label_anchor() {
        let d = data(&[("a", vec![Some(0.0), Some(100.0)])]);
        let figure = Figure::prepare(&d, &PlotConfig::default());
        let (x, y) = figure.panels[0].label_anchor(figure.x_range);
        assert_eq!(x, 10.0);
        assert!((y - 92.0).abs() < 1e-9);
    }
}
