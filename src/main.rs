mod app;
mod state;
mod ui;

use app::EmissionSurfaceApp;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    // Optional data file as first argument.
    let initial = std::env::args_os().nth(1).map(std::path::PathBuf::from);

    eframe::run_native(
        &format!("Emission Surface {}", emission_surface::VERSION),
        options,
        Box::new(move |_cc| {
            let mut app = EmissionSurfaceApp::default();
            if let Some(path) = initial {
                app.state.load_path(&path);
            }
            Ok(Box::new(app))
        }),
    )
}
