use std::time::Duration;

use eframe::egui;

use crate::state::{AppState, Tab};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.state.poll_load() {
            ctx.request_repaint();
        }
        if self.state.is_loading() {
            // Keep polling the loader thread while the spinner is up.
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        ctx.set_visuals(self.state.view.theme.visuals());

        // ---- Top panel: menu bar, tabs, theme toggle ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: dashboard or data table ----
        egui::CentralPanel::default().show(ctx, |ui| {
            if panels::load_status(ui, &self.state) {
                return;
            }
            match self.state.view.tab {
                Tab::Dashboard => plot::dashboard(ui, &self.state),
                Tab::DataTable => table::data_table(ui, &mut self.state),
            }
        });
    }
}
