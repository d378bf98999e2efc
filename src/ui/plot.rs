use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints};

use crate::color::{ColorMap, Theme};
use crate::data::aggregate::{CountBucket, DashboardAggregates};
use crate::export::format::{dollars, miles, thousands};
use crate::export::pdf::key_insights;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Dashboard tab (central panel)
// ---------------------------------------------------------------------------

/// Render the metric cards and every chart of the dashboard.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(agg) = &state.aggregates else {
        return;
    };
    let theme = state.view.theme;
    let colors = theme.chart_colors(6);
    let n = state.top_n;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            metric_cards(ui, agg);
            ui.add_space(12.0);

            ui.columns(2, |cols| {
                chart_frame(&mut cols[0], &format!("Top {n} EV Manufacturers"), |ui| {
                    let (labels, values) = split_counts(&agg.top_makes);
                    category_bars(ui, "top_makes", &labels, &values, colors[0]);
                });
                chart_frame(&mut cols[1], "EV Type Distribution", |ui| {
                    type_distribution(ui, agg, theme);
                });
            });

            ui.columns(2, |cols| {
                chart_frame(&mut cols[0], "Vehicles by Model Year", |ui| {
                    year_line(ui, agg, colors[4]);
                });
                chart_frame(&mut cols[1], &format!("Top {n} Manufacturers by Avg. Electric Range"), |ui| {
                    let (labels, values): (Vec<String>, Vec<f64>) = agg
                        .range_by_make
                        .iter()
                        .map(|b| (b.label.clone(), b.mean))
                        .unzip();
                    category_bars(ui, "range_by_make", &labels, &values, colors[1]);
                });
            });

            ui.columns(2, |cols| {
                chart_frame(&mut cols[0], &format!("Top {n} Counties by EV Population"), |ui| {
                    let (labels, values) = split_counts(&agg.top_counties);
                    category_bars(ui, "top_counties", &labels, &values, colors[2]);
                });
                chart_frame(&mut cols[1], &format!("Top {n} EV Models"), |ui| {
                    let (labels, values) = split_counts(&agg.top_models);
                    category_bars(ui, "top_models", &labels, &values, colors[3]);
                });
            });

            chart_frame(ui, "EVs by Price Range", |ui| {
                let labels: Vec<String> = agg
                    .price_ranges
                    .iter()
                    .map(|b| b.band.label().to_string())
                    .collect();
                let values: Vec<f64> = agg.price_ranges.iter().map(|b| b.count as f64).collect();
                category_bars(ui, "price_ranges", &labels, &values, colors[5]);
            });

            ui.add_space(8.0);
            ui.strong("Key Insights");
            for line in key_insights(agg) {
                ui.label(line);
            }
        });
}

fn metric_cards(ui: &mut Ui, agg: &DashboardAggregates) {
    let s = &agg.summary;
    let cards = [
        ("Total Vehicles", thousands(s.total_vehicles as f64)),
        ("Avg. Electric Range", miles(s.avg_range)),
        ("Avg. Base MSRP", dollars(s.avg_msrp)),
        ("Unique Manufacturers", s.unique_makes.to_string()),
    ];
    ui.columns(cards.len(), |cols| {
        for (col, (title, value)) in cols.iter_mut().zip(cards) {
            egui::Frame::group(col.style()).show(col, |ui: &mut Ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(title).weak());
                ui.label(RichText::new(value).size(24.0).strong());
            });
        }
    });
}

fn chart_frame(ui: &mut Ui, title: &str, add_contents: impl FnOnce(&mut Ui)) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.heading(title);
        add_contents(ui);
    });
    ui.add_space(8.0);
}

fn split_counts(buckets: &[CountBucket]) -> (Vec<String>, Vec<f64>) {
    buckets
        .iter()
        .map(|b| (b.label.clone(), b.count as f64))
        .unzip()
}

/// Bar chart over categorical labels; the x axis shows the label under
/// each bar.
fn category_bars(ui: &mut Ui, id: &str, labels: &[String], values: &[f64], color: Color32) {
    if labels.is_empty() {
        ui.label("No data");
        return;
    }
    let bars: Vec<Bar> = labels
        .iter()
        .zip(values)
        .enumerate()
        .map(|(i, (label, &v))| Bar::new(i as f64, v).name(label).fill(color))
        .collect();

    let axis_labels = labels.to_vec();
    Plot::new(id)
        .height(CHART_HEIGHT)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .x_axis_formatter(move |mark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            axis_labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(color).width(0.7));
        });
}

/// Vehicle types as coloured bars with a legend entry per type.
fn type_distribution(ui: &mut Ui, agg: &DashboardAggregates, theme: Theme) {
    if agg.ev_types.is_empty() {
        ui.label("No data");
        return;
    }
    let color_map = ColorMap::new(agg.ev_types.iter().map(|b| b.label.as_str()), theme);

    Plot::new("ev_types")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show_axes([false, true])
        .show(ui, |plot_ui| {
            for (i, bucket) in agg.ev_types.iter().enumerate() {
                let color = color_map.color_for(&bucket.label);
                let bar = Bar::new(i as f64, bucket.count as f64)
                    .name(&bucket.label)
                    .fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(&bucket.label).color(color));
            }
        });
}

/// Records per model year as a line.
fn year_line(ui: &mut Ui, agg: &DashboardAggregates, color: Color32) {
    if agg.years.is_empty() {
        ui.label("No data");
        return;
    }
    let points: PlotPoints = agg
        .years
        .iter()
        .map(|b| [b.year as f64, b.count as f64])
        .collect();

    Plot::new("years")
        .height(CHART_HEIGHT)
        .x_axis_label("Model Year")
        .y_axis_label("Vehicles")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.line(Line::new(points).color(color).width(2.0));
        });
}
