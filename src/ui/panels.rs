use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use emission_surface::analysis::InterpolationMethod;
use emission_surface::color::{ColorScale, ColorScaleKind};

use crate::state::AppState;

const GRID_SIZE_RANGE: std::ops::RangeInclusive<usize> = 10..=100;
const STRIDE_RANGE: std::ops::RangeInclusive<usize> = 1..=100;

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu and analysis controls.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui
                .add_enabled(state.report.is_some(), egui::Button::new("Export CSV…"))
                .clicked()
            {
                export_file_dialog(state);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Save settings…").clicked() {
                save_config_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let mut changed = false;

        ui.label("Method");
        egui::ComboBox::from_id_salt("method")
            .selected_text(state.config.method.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for method in InterpolationMethod::ALL {
                    changed |= ui
                        .selectable_value(&mut state.config.method, method, method.to_string())
                        .changed();
                }
            });

        ui.label("Grid");
        changed |= ui
            .add(egui::Slider::new(&mut state.config.grid_size, GRID_SIZE_RANGE))
            .changed();

        ui.label("Stride");
        changed |= ui
            .add(egui::DragValue::new(&mut state.config.stride).range(STRIDE_RANGE))
            .changed();

        if changed && state.series.is_some() {
            state.start_analysis();
        }

        ui.separator();

        if state.is_running() {
            let progress = state.progress.unwrap_or(0.0);
            ui.add(
                egui::ProgressBar::new(progress)
                    .desired_width(160.0)
                    .show_percentage(),
            );
            if ui.small_button("Cancel").clicked() {
                state.cancel_analysis();
            }
        }

        if let Some(msg) = &state.status_message {
            ui.label(msg);
        }
        if let Some(msg) = &state.error_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel
// ---------------------------------------------------------------------------

/// Render the dataset summary, efficiency statistics and color settings.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset");
    ui.separator();

    let Some(series) = state.series.clone() else {
        ui.label("No data loaded.");
        return;
    };

    if let Some(path) = &state.source_path {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        ui.label(RichText::new(name).strong());
    }
    ui.label(format!("{} samples, {:.1} s", series.len(), series.duration()));
    if let Some(report) = &state.report {
        ui.label(format!("{} after decimation", report.samples.len()));
    }

    ui.add_space(8.0);
    ui.heading("Efficiency");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            stats_table(ui, state);

            ui.add_space(8.0);
            ui.strong("Color scale");
            let current = state.config.color_scale;
            egui::ComboBox::from_id_salt("color_scale")
                .selected_text(current.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for kind in ColorScaleKind::ALL {
                        if ui.selectable_label(current == kind, kind.label()).clicked() {
                            state.set_color_scale(kind);
                        }
                    }
                });
            color_bar(ui, &state.config.color_scale.scale());
        });
}

fn stats_table(ui: &mut Ui, state: &AppState) {
    let Some(report) = &state.report else {
        ui.label("No analysis yet.");
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto())
        .columns(Column::remainder(), 3)
        .header(20.0, |mut header| {
            for title in ["", "Mean", "Min", "Max"] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for result in &report.results {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(result.pollutant.label());
                    });
                    for value in [result.stats.mean, result.stats.min, result.stats.max] {
                        row.col(|ui| {
                            ui.label(format!("{value:.1} %"));
                        });
                    }
                });
            }
        });
}

/// Horizontal gradient from 0 % to 100 %.
fn color_bar(ui: &mut Ui, scale: &ColorScale) {
    const SEGMENTS: usize = 64;
    let width = ui.available_width().min(240.0);
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, 14.0), egui::Sense::hover());
    let step = rect.width() / SEGMENTS as f32;
    for i in 0..SEGMENTS {
        let c = scale.color_at(i as f64 / (SEGMENTS - 1) as f64);
        let x = rect.left() + i as f32 * step;
        let seg = egui::Rect::from_min_max(
            egui::pos2(x, rect.top()),
            egui::pos2(x + step + 0.5, rect.bottom()),
        );
        ui.painter()
            .rect_filled(seg, 0.0, Color32::from_rgb(c.red, c.green, c.blue));
    }
    ui.horizontal(|ui: &mut Ui| {
        ui.small("0 %");
        ui.add_space((width - 60.0).max(0.0));
        ui.small("100 %");
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open emission data")
        .add_filter(
            "Supported files",
            &["xlsx", "xls", "ods", "csv", "txt", "parquet", "pq"],
        )
        .add_filter("Spreadsheet", &["xlsx", "xls", "ods"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}

fn export_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Export efficiencies")
        .set_file_name("efficiency.csv")
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.export_csv(&path);
    }
}

fn save_config_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Save settings")
        .set_file_name("emission-surface.json")
        .add_filter("JSON", &["json"])
        .save_file();

    if let Some(path) = file {
        state.save_config(&path);
    }
}
