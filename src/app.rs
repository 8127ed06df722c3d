use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct WaterfallerApp {
    pub state: AppState,
}

impl WaterfallerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for WaterfallerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: chromatogram list ----
        egui::SidePanel::left("sample_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &self.state);
            });

        // ---- Central panel: stacked plots ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::waterfall_plot(ui, &self.state);
        });
    }
}
