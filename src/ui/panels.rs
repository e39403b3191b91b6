use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{self, Color32, RichText, Ui};
use serde::Serialize;

use crate::chart::{Page, PageView};
use crate::data::filter::YearRange;
use crate::data::model::Metric;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – navigation and filters
// ---------------------------------------------------------------------------

/// Render the left navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Navigation");
    ui.separator();

    ui.label("Go to");
    let mut selected = state.page;
    for page in Page::ALL {
        ui.radio_value(&mut selected, page, page.label());
    }
    state.set_page(selected);

    ui.separator();
    year_range(ui, state);

    if state.page == Page::ScatterMatrix {
        ui.separator();
        scatter_variables(ui, state);
    }
}

/// Two sliders over the distinct years present in the table.
fn year_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Select Year Range");

    let years = state.years().to_vec();
    let Some(range) = state.year_range else {
        ui.label("No data loaded.");
        return;
    };
    if years.is_empty() {
        return;
    }

    let index_of = |year: i32| years.iter().position(|&y| y == year).unwrap_or(0);
    let mut lo = index_of(range.start);
    let mut hi = index_of(range.end);

    let changed_lo = ui.add(year_slider(&mut lo, &years, "from")).changed();
    let changed_hi = ui.add(year_slider(&mut hi, &years, "to")).changed();

    // Keep the handles ordered by dragging the other one along.
    if changed_lo && lo > hi {
        hi = lo;
    } else if changed_hi && hi < lo {
        lo = hi;
    }

    if changed_lo || changed_hi {
        state.set_year_bounds(years[lo], years[hi]);
    }
}

/// Slider over indices into `years`, labelled with the year itself.
fn year_slider<'a>(value: &'a mut usize, years: &'a [i32], text: &str) -> egui::Slider<'a> {
    egui::Slider::new(value, 0..=years.len().saturating_sub(1))
        .text(text)
        .custom_formatter(move |v, _| {
            years
                .get(v.round() as usize)
                .map(|y| y.to_string())
                .unwrap_or_default()
        })
        .custom_parser(move |s| {
            let year: i32 = s.trim().parse().ok()?;
            years.iter().position(|&y| y == year).map(|i| i as f64)
        })
}

fn scatter_variables(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Choose variables to explore:");
    for metric in Metric::ALL {
        let mut checked = state.scatter_selection.contains(&metric);
        if ui.checkbox(&mut checked, metric.column()).changed() {
            state.toggle_scatter_variable(metric);
        }
    }
}

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
            if ui.button("Export chart spec…").clicked() {
                export_spec_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label(format!(
            "{} rows loaded, {} in range",
            state.table.len(),
            state.visible_indices.len()
        ));

        if let Some(range) = state.year_range {
            ui.separator();
            ui.label(format!("{}–{}", range.start, range.end));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open housing data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_cached(&path) {
            Ok(table) => state.set_table(table),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

pub fn export_spec_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export chart specification")
        .add_filter("JSON", &["json"])
        .set_file_name(format!("{}.json", state.page.label().to_lowercase().replace(' ', "_")))
        .save_file();

    if let Some(path) = file {
        match export_spec(state, &path) {
            Ok(()) => {
                log::info!("Exported {} to {}", state.page, path.display());
                state.status_message = None;
            }
            Err(e) => {
                log::error!("Export failed: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

/// Exported file layout: the page view plus the data it was built from.
#[derive(Serialize)]
struct ExportedSpec {
    page: Page,
    year_range: Option<YearRange>,
    /// Table columns read by the page's charts, in first-use order.
    columns: Vec<String>,
    view: PageView,
}

/// Write the current page's specification as pretty JSON.
pub fn export_spec(state: &AppState, path: &Path) -> Result<()> {
    let view = state.current_view();

    let mut columns: Vec<String> = Vec::new();
    for col in view.charts().flat_map(|c| c.columns()) {
        if !state.table.has_column(&col) {
            log::warn!("{} references unknown column {col}", state.page);
        }
        if !columns.contains(&col) {
            columns.push(col);
        }
    }

    let exported = ExportedSpec {
        page: state.page,
        year_range: state.year_range,
        columns,
        view,
    };
    let json = serde_json::to_string_pretty(&exported).context("serializing page view")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
