use eframe::egui::{Align2, Color32, RichText, Ui};
use egui_plot::{Line, Plot, PlotPoint, PlotPoints, Text};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Waterfall plot (central panel)
// ---------------------------------------------------------------------------

/// Smallest height a single panel is squeezed to.
const MIN_PANEL_HEIGHT: f32 = 60.0;

/// Render one `egui_plot` per chromatogram, stacked, with linked x-axes.
pub fn waterfall_plot(ui: &mut Ui, state: &AppState) {
    let figure = match &state.figure {
        Some(figure) => figure,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a MassHunter export  (File → Open export…)");
            });
            return;
        }
    };

    let config = &state.config;
    let n = figure.panels.len();
    let height = (ui.available_height() / n.max(1) as f32).max(MIN_PANEL_HEIGHT);
    let (x_lo, x_hi) = figure.x_range;
    let line_width = config.lines.chrom_width as f32;

    for (i, panel) in figure.panels.iter().enumerate() {
        let bottom_panel = i + 1 == n;
        let (y_lo, y_hi) = panel.y_range;

        let mut plot = Plot::new(("waterfall_panel", i))
            .height(height)
            .link_axis("waterfall_x", [true, false])
            .show_axes([bottom_panel, false])
            .show_grid(false)
            .include_x(x_lo)
            .include_x(x_hi)
            .include_y(y_lo)
            .include_y(y_hi)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true);
        if bottom_panel && !config.x_axis.label.is_empty() {
            plot = plot.x_axis_label(config.x_axis.label.clone());
        }

        let color = Color32::from_rgb(panel.color.0, panel.color.1, panel.color.2);
        let stroke = if color == Color32::BLACK {
            ui.visuals().text_color()
        } else {
            color
        };

        plot.show(ui, |plot_ui| {
            for run in &panel.runs {
                let points: PlotPoints = run.iter().map(|&(x, y)| [x, y]).collect();
                plot_ui.line(Line::new(points).color(stroke).width(line_width));
            }

            let (lx, ly) = panel.label_anchor(figure.x_range);
            plot_ui.text(
                Text::new(PlotPoint::new(lx, ly), RichText::new(&panel.label).strong())
                    .anchor(Align2::RIGHT_CENTER),
            );
        });
    }
}
