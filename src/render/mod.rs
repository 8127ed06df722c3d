//! Static figure export.
//!
//! [`layout::Figure`] holds the backend-independent layout; [`save_figure`]
//! draws it with plotters, picking SVG or bitmap output from the extension.

pub mod layout;

use std::ops::Range;
use std::path::Path;

use log::info;
use plotters::coord::ranged1d::{DefaultFormatting, KeyPointHint, Ranged};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontStyle;

use crate::color::Rgb;
use crate::config::PlotConfig;
use crate::data::error::{Result, WaterfallError};
use layout::Figure;

const FONT_FAMILY: &str = "sans-serif";
const PANEL_LABEL_SIZE: u32 = 14;

/// Render `figure` to `path`. `.svg` is vector; `.png`, `.jpg`, `.bmp` raster.
pub fn save_figure(figure: &Figure, config: &PlotConfig, path: &Path) -> Result<()> {
    if figure.panels.is_empty() {
        return Err(WaterfallError::Render("no chromatograms to plot".into()));
    }
    if !(figure.x_range.1 > figure.x_range.0) {
        return Err(WaterfallError::Render(format!(
            "x-axis max ({}) must be greater than min ({})",
            figure.x_range.1, figure.x_range.0
        )));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !matches!(ext.as_str(), "svg" | "png" | "jpg" | "jpeg" | "bmp") {
        return Err(WaterfallError::UnsupportedFigure(ext));
    }

    // Surface an unwritable path as an I/O error before the backend hides it.
    std::fs::File::create(path).map_err(|e| WaterfallError::io(path, e))?;

    let size = figure.pixel_size();
    if ext == "svg" {
        draw(SVGBackend::new(path, size).into_drawing_area(), figure, config)?;
    } else {
        draw(BitMapBackend::new(path, size).into_drawing_area(), figure, config)?;
    }

    info!("Figure saved to: {}", path.display());
    Ok(())
}

fn render_err<E: std::fmt::Display>(e: E) -> WaterfallError {
    WaterfallError::Render(e.to_string())
}

fn font(size: u32) -> FontDesc<'static> {
    (FONT_FAMILY, f64::from(size)).into_font()
}

fn stroke_px(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

fn format_tick(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{x:.0}")
    } else {
        format!("{x}")
    }
}

/// Linear time axis whose labelled ticks sit exactly at the configured
/// positions. Without positions it falls back to plotters' own choice.
#[derive(Clone)]
struct TickAxis {
    inner: RangedCoordf64,
    ticks: Vec<f64>,
}

impl TickAxis {
    fn new((min, max): (f64, f64), ticks: &[f64]) -> Self {
        Self {
            inner: (min..max).into(),
            ticks: ticks.to_vec(),
        }
    }
}

impl Ranged for TickAxis {
    type FormatOption = DefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.inner.map(value, limit)
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if self.ticks.is_empty() {
            self.inner.key_points(hint)
        } else if hint.weight().allow_light_points() {
            // Light points only feed grid lines, which stay off.
            Vec::new()
        } else {
            self.ticks.clone()
        }
    }

    fn range(&self) -> Range<f64> {
        self.inner.range()
    }
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    figure: &Figure,
    config: &PlotConfig,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;

    let area = if config.title.text.is_empty() {
        root.clone()
    } else {
        root.titled(
            &config.title.text,
            TextStyle::from(font(config.title.size).style(FontStyle::Bold)),
        )
        .map_err(render_err)?
    };

    let regions = area.split_evenly((figure.panels.len(), 1));
    let last = regions.len() - 1;
    let (x_lo, x_hi) = figure.x_range;
    let axis_style = BLACK.stroke_width(stroke_px(config.lines.axis_width));
    let line_px = stroke_px(config.lines.chrom_width);
    let tick_formatter = |x: &f64| format_tick(*x);

    let x_area = config.x_axis.tick_size
        + 15
        + if config.x_axis.label.is_empty() {
            0
        } else {
            config.x_axis.label_size + 10
        };

    for (i, (panel, region)) in figure.panels.iter().zip(&regions).enumerate() {
        let bottom_panel = i == last;
        let (y_lo, y_hi) = panel.y_range;

        let mut chart = ChartBuilder::on(region)
            .margin_left(10)
            .margin_right(20)
            .x_label_area_size(if bottom_panel { x_area } else { 0 })
            .build_cartesian_2d(TickAxis::new(figure.x_range, &figure.x_ticks), y_lo..y_hi)
            .map_err(render_err)?;

        let mut mesh = chart.configure_mesh();
        mesh.disable_mesh().disable_y_axis().axis_style(axis_style);
        if bottom_panel {
            mesh.x_label_style(TextStyle::from(font(config.x_axis.tick_size)))
                .x_label_formatter(&tick_formatter);
            if !config.x_axis.label.is_empty() {
                mesh.x_desc(config.x_axis.label.as_str()).axis_desc_style(TextStyle::from(
                    font(config.x_axis.label_size).style(FontStyle::Bold),
                ));
            }
        } else {
            mesh.disable_x_axis();
        }
        mesh.draw().map_err(render_err)?;

        // Left spine only; the y-axis itself stays hidden.
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x_lo, y_lo), (x_lo, y_hi)],
                axis_style,
            )))
            .map_err(render_err)?;

        let line_style = rgb(panel.color).stroke_width(line_px);
        for run in &panel.runs {
            chart
                .draw_series(LineSeries::new(
                    run.iter().copied().filter(|(x, _)| *x >= x_lo && *x <= x_hi),
                    line_style,
                ))
                .map_err(render_err)?;
        }

        let anchor = panel.label_anchor(figure.x_range);
        chart
            .draw_series(std::iter::once(Text::new(
                panel.label.clone(),
                anchor,
                font(PANEL_LABEL_SIZE)
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Right, VPos::Center)),
            )))
            .map_err(render_err)?;
    }

    root.present().map_err(render_err)?;
    Ok(())
}
