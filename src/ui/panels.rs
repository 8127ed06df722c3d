use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – chromatogram list
// ---------------------------------------------------------------------------

/// List the panels with their 1-indexed numbers, as used by the
/// `[y_scales]` and `[rename]` config tables.
pub fn side_panel(ui: &mut Ui, state: &AppState) {
    ui.heading("Chromatograms");
    ui.separator();

    let Some(figure) = &state.figure else {
        ui.label("No export loaded.");
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (i, panel) in figure.panels.iter().enumerate() {
                let mut text = RichText::new(format!("{}: {}", i + 1, panel.label));
                if state.config.figure.colorize {
                    text = text.color(Color32::from_rgb(
                        panel.color.0,
                        panel.color.1,
                        panel.color.2,
                    ));
                }
                ui.label(text);
                if let Some(factor) = state.config.y_scales.get(i) {
                    ui.small(format!("    zoom ×{factor}"));
                }
            }

            ui.separator();
            ui.strong("Time window");
            let window = state.config.time_window();
            ui.label(format!("{} < t < {}", window.min, window.max));
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open export…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.figure.is_some(), egui::Button::new("Save figure as…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(input) = &state.input {
            ui.label(input.display().to_string());
        }
        if let Some(figure) = &state.figure {
            ui.label(format!("{} chromatogram(s)", figure.panels.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                ui.visuals().text_color()
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open MassHunter export")
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        state.open(path);
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let default_name = state
        .config
        .output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "figure.svg".to_string());

    let file = rfd::FileDialog::new()
        .set_title("Save figure")
        .set_file_name(default_name)
        .add_filter("SVG", &["svg"])
        .add_filter("PNG", &["png"])
        .add_filter("JPEG", &["jpg", "jpeg"])
        .add_filter("BMP", &["bmp"])
        .save_file();

    if let Some(path) = file {
        state.save(&path);
    }
}
