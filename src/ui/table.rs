use eframe::egui::{self, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::BASE_MSRP;
use crate::data::table::display_columns;
use crate::export::format::dollars;
use crate::state::{AppState, ViewState};

const ROW_HEIGHT: f32 = 22.0;

// ---------------------------------------------------------------------------
// Data table tab (central panel)
// ---------------------------------------------------------------------------

/// Render the search box, the current page of the table and the pager.
pub fn data_table(ui: &mut Ui, state: &mut AppState) {
    let Some(dataset) = &state.dataset else {
        return;
    };

    ui.heading("Electric Vehicle Population Data");
    ui.label(
        RichText::new(
            "Comprehensive dataset of electric vehicles including make, model, range, \
             and location information. Use the search bar to filter data and column \
             headers to sort.",
        )
        .weak(),
    );
    ui.add_space(6.0);

    let mut search = state.view.search.clone();
    let search_changed = ui
        .horizontal(|ui: &mut Ui| {
            ui.label("🔍");
            ui.add(
                egui::TextEdit::singleline(&mut search)
                    .hint_text("Search...")
                    .desired_width(f32::INFINITY),
            )
            .changed()
        })
        .inner;
    ui.add_space(6.0);

    let columns = display_columns();
    let page = &state.table;
    let mut clicked_column: Option<String> = None;

    let footer_height = 36.0;
    let table_height = (ui.available_height() - footer_height).max(ROW_HEIGHT * 2.0);

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(table_height)
        .columns(TableColumn::auto().at_least(70.0), columns.len() - 1)
        .column(TableColumn::remainder())
        .header(ROW_HEIGHT, |mut header| {
            for col in &columns {
                header.col(|ui| {
                    let arrow = match &state.view.sort {
                        Some(s) if s.column == col.key => s.direction.arrow(),
                        _ => "",
                    };
                    let text = RichText::new(format!("{} {arrow}", col.label)).strong();
                    if ui.add(egui::Button::new(text).frame(false)).clicked() {
                        clicked_column = Some(col.key.clone());
                    }
                });
            }
        })
        .body(|mut body| {
            for &idx in &page.rows {
                let rec = &dataset.records[idx];
                body.row(ROW_HEIGHT, |mut row| {
                    for col in &columns {
                        row.col(|ui| {
                            let text = match rec.number(&col.key) {
                                Some(v) if col.key == BASE_MSRP => dollars(v),
                                _ => rec.text(&col.key),
                            };
                            ui.label(text);
                        });
                    }
                });
            }
        });

    ui.add_space(6.0);
    let total_pages = page.total_pages;
    let (first, last) = page.showing();
    let total = page.total_matching();
    let current = state.view.page;

    let mut nav: Option<fn(ViewState, usize) -> ViewState> = None;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("Showing {first} to {last} of {total} entries"));
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            if ui
                .add_enabled(current < total_pages, egui::Button::new("▶"))
                .clicked()
            {
                nav = Some(ViewState::next_page);
            }
            ui.label(format!("Page {current} of {total_pages}"));
            if ui
                .add_enabled(current > 1, egui::Button::new("◀"))
                .clicked()
            {
                nav = Some(ViewState::prev_page);
            }
        });
    });

    // Apply interactions after drawing; the page above borrowed the state.
    if search_changed {
        state.update_view(|v| v.with_search(search));
    }
    if let Some(column) = clicked_column {
        state.update_view(|v| v.with_sort_toggled(&column));
    }
    if let Some(step) = nav {
        state.update_view(|v| step(v, total_pages));
    }
}
