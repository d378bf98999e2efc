use std::path::PathBuf;

use eframe::egui::{self, Color32, RichText, Ui};

use crate::export::pdf::ReportMeta;
use crate::export::{ExportError, ExportScope, write_file};
use crate::state::{AppState, LoadState, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.menu_button("Export", |ui: &mut Ui| {
            let ready = state.dataset.is_some();
            match state.view.tab {
                Tab::Dashboard => {
                    if ui
                        .add_enabled(ready, egui::Button::new("Export All Charts (PDF)"))
                        .clicked()
                    {
                        export_dashboard_pdf(state);
                        ui.close_menu();
                    }
                }
                Tab::DataTable => {
                    ui.label(RichText::new("Rows").strong());
                    for scope in [ExportScope::CurrentPage, ExportScope::AllMatching] {
                        if ui
                            .radio(state.export_scope == scope, scope.label())
                            .clicked()
                        {
                            state.export_scope = scope;
                        }
                    }
                    ui.separator();
                    if ui
                        .add_enabled(ready, egui::Button::new("Export as CSV"))
                        .clicked()
                    {
                        export_table_csv(state);
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(ready, egui::Button::new("Export as PDF"))
                        .clicked()
                    {
                        export_table_pdf(state);
                        ui.close_menu();
                    }
                }
            }
        });

        ui.separator();

        for (tab, label) in [(Tab::Dashboard, "Dashboard"), (Tab::DataTable, "Data Table")] {
            if ui.selectable_label(state.view.tab == tab, label).clicked() {
                state.update_view(|v| v.with_tab(tab));
            }
        }

        ui.separator();

        if let Some(ds) = &state.dataset {
            ui.label(format!(
                "{} vehicles loaded, {} matching",
                ds.len(),
                state.table.total_matching()
            ));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            if ui.button(state.view.theme.toggle_label()).clicked() {
                state.update_view(|v| v.with_theme_toggled());
            }
            if let Some(msg) = &state.status_message {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
        });
    });
}

/// Full-window placeholder while the dataset is loading or after it failed.
/// Returns true when it drew something and the tabs should be skipped.
pub fn load_status(ui: &mut Ui, state: &AppState) -> bool {
    match &state.load {
        LoadState::Loading(path) if state.dataset.is_none() => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.vertical_centered(|ui: &mut Ui| {
                    ui.spinner();
                    ui.label(format!("Loading {}…", path.display()));
                });
            });
            true
        }
        LoadState::Failed(msg) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(
                    RichText::new(format!("Error loading data: {msg}"))
                        .color(Color32::RED)
                        .heading(),
                );
            });
            true
        }
        _ if state.dataset.is_none() => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view the dashboard  (File → Open…)");
            });
            true
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle population data")
        .add_filter("Supported files", &["csv", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        state.start_load(&path);
    }
}

fn save_dialog(title: &str, file_name: &str, ext: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .set_file_name(file_name)
        .add_filter(ext.to_ascii_uppercase(), &[ext])
        .save_file()
}

/// Report the outcome of an export in the status line.
fn finish_export(state: &mut AppState, result: Result<PathBuf, ExportError>) {
    match result {
        Ok(path) => {
            state.status_message = None;
            log::info!("Saved {}", path.display());
        }
        Err(e) => {
            log::error!("Export failed: {e}");
            state.status_message = Some(format!("Export failed: {e}"));
        }
    }
}

fn export_table_csv(state: &mut AppState) {
    let Some(path) = save_dialog("Export as CSV", "ev_data.csv", "csv") else {
        return;
    };
    let result = state
        .table_csv(state.export_scope)
        .and_then(|text| write_file(&path, text.as_bytes()))
        .map(|_| path);
    finish_export(state, result);
}

fn export_table_pdf(state: &mut AppState) {
    let Some(path) = save_dialog("Export as PDF", "ev_data.pdf", "pdf") else {
        return;
    };
    let result = state
        .table_pdf(state.export_scope, &ReportMeta::now())
        .and_then(|bytes| write_file(&path, &bytes))
        .map(|_| path);
    finish_export(state, result);
}

fn export_dashboard_pdf(state: &mut AppState) {
    let Some(path) = save_dialog("Export All Charts", "ev_dashboard_charts.pdf", "pdf") else {
        return;
    };
    let Some(document) = state.dashboard_pdf(&ReportMeta::now()) else {
        return;
    };
    let result = document
        .and_then(|bytes| write_file(&path, &bytes))
        .map(|_| path);
    finish_export(state, result);
}
