use eframe::egui::{self, Color32, Stroke, Ui};
use egui_plot::{Plot, PlotPoint, PlotPoints, Points, Polygon};

use emission_surface::data::Pollutant;
use emission_surface::surface::{Surface, X_AXIS_TITLE, Y_AXIS_TITLE};
use emission_surface::SurfaceOutcome;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel: pollutant tabs + efficiency surface
// ---------------------------------------------------------------------------

/// Render the pollutant tabs and the selected surface.
pub fn surface_view(ui: &mut Ui, state: &mut AppState) {
    if state.series.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to analyse  (File → Open…)");
        });
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        for pollutant in Pollutant::ALL {
            if ui
                .selectable_label(state.selected == pollutant, pollutant.label())
                .clicked()
            {
                state.selected = pollutant;
            }
        }
    });
    ui.separator();

    let Some(report) = &state.report else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.spinner();
        });
        return;
    };

    let Some(result) = report.result(state.selected) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(format!("{} was not analysed (cancelled).", state.selected));
        });
        return;
    };

    let surface = match &result.surface {
        SurfaceOutcome::Available(surface) => surface,
        SurfaceOutcome::Unavailable { reason } => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.label(format!("No surface available: {reason}"));
            });
            return;
        }
    };

    ui.horizontal(|ui: &mut Ui| {
        ui.label(egui::RichText::new(&surface.title).strong());
        if let Some(total) = result.subsampled_from {
            ui.label(
                egui::RichText::new(format!("subsampled from {total} points"))
                    .small()
                    .weak(),
            );
        }
    });

    let samples: PlotPoints = report
        .samples
        .iter()
        .map(|s| [s.flow, s.catalyst_temp])
        .collect();

    Plot::new("surface_plot")
        .x_axis_label(X_AXIS_TITLE)
        .y_axis_label(Y_AXIS_TITLE)
        .label_formatter(|_name, value| hover_label(surface, value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for cell in heat_map(surface) {
                plot_ui.polygon(cell);
            }
            plot_ui.points(
                Points::new(samples)
                    .name("Samples")
                    .radius(1.5)
                    .color(Color32::from_black_alpha(140)),
            );
        });
}

/// One filled quad per grid node, spanning halfway to each neighbour.
fn heat_map(surface: &Surface) -> Vec<Polygon> {
    let grid = &surface.grid;
    let x_edges = cell_edges(grid.xs());
    let y_edges = cell_edges(grid.ys());
    let alpha = (surface.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut cells = Vec::with_capacity(grid.size() * grid.size());
    for (row, y) in y_edges.windows(2).enumerate() {
        for (col, x) in x_edges.windows(2).enumerate() {
            let c = surface.cell_color(row, col);
            let fill = Color32::from_rgba_unmultiplied(c.red, c.green, c.blue, alpha);
            let corners = vec![[x[0], y[0]], [x[1], y[0]], [x[1], y[1]], [x[0], y[1]]];
            cells.push(
                Polygon::new(PlotPoints::new(corners))
                    .fill_color(fill)
                    .stroke(Stroke::NONE),
            );
        }
    }
    cells
}

/// Midpoints between axis coordinates, extended half a step past each end.
fn cell_edges(axis: &[f64]) -> Vec<f64> {
    match axis {
        [] => Vec::new(),
        [only] => vec![only - 0.5, only + 0.5],
        _ => {
            let first = axis[0] - (axis[1] - axis[0]) / 2.0;
            let n = axis.len();
            let last = axis[n - 1] + (axis[n - 1] - axis[n - 2]) / 2.0;
            std::iter::once(first)
                .chain(axis.windows(2).map(|w| (w[0] + w[1]) / 2.0))
                .chain(std::iter::once(last))
                .collect()
        }
    }
}

fn nearest_index(axis: &[f64], v: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .min_by(|a, b| (a.1 - v).abs().total_cmp(&(b.1 - v).abs()))
        .map(|(i, _)| i)
}

fn hover_label(surface: &Surface, value: &PlotPoint) -> String {
    let grid = &surface.grid;
    let efficiency = nearest_index(grid.xs(), value.x)
        .zip(nearest_index(grid.ys(), value.y))
        .map(|(col, row)| grid.z()[row][col]);
    match efficiency {
        Some(e) => format!("flow {:.1}\ntemp {:.1}\n{e:.1} %", value.x, value.y),
        None => format!("flow {:.1}\ntemp {:.1}", value.x, value.y),
    }
}
