use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EmissionSurfaceApp {
    pub state: AppState,
}

impl eframe::App for EmissionSurfaceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_worker() {
            ctx.request_repaint();
        }

        // ---- Top panel: menu bar and analysis controls ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: summary and statistics ----
        egui::SidePanel::left("summary_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: pollutant tabs and surface ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::surface_view(ui, &mut self.state);
        });
    }
}
