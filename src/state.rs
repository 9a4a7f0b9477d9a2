use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use emission_surface::color::ColorScaleKind;
use emission_surface::config::CONFIG_ENV_VAR;
use emission_surface::data::{load_file, Pollutant, SampleSeries};
use emission_surface::{analyze, AnalysisConfig, AnalysisReport, ProgressEvent, ProgressObserver};

// ---------------------------------------------------------------------------
// Background analysis
// ---------------------------------------------------------------------------

/// Messages from the analysis thread to the UI.
pub enum WorkerMessage {
    Progress(ProgressEvent),
    Finished(AnalysisReport),
}

/// Forwards pipeline events over a channel and exposes a cancel flag.
struct ChannelObserver {
    tx: Sender<WorkerMessage>,
    cancel: Arc<AtomicBool>,
}

impl ProgressObserver for ChannelObserver {
    fn on_event(&mut self, event: &ProgressEvent) {
        // The receiver is gone once the UI has moved on; nothing to do then.
        let _ = self.tx.send(WorkerMessage::Progress(event.clone()));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}

struct Worker {
    rx: Receiver<WorkerMessage>,
    cancel: Arc<AtomicBool>,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded series (None until user loads a file).
    pub series: Option<Arc<SampleSeries>>,

    pub source_path: Option<PathBuf>,

    pub config: AnalysisConfig,

    /// Latest finished (or cancelled) analysis.
    pub report: Option<AnalysisReport>,

    /// Pollutant whose surface is shown.
    pub selected: Pollutant,

    /// Fraction complete while an analysis is running.
    pub progress: Option<f32>,

    /// Status line shown in the top bar.
    pub status_message: Option<String>,

    /// Error shown in red in the top bar.
    pub error_message: Option<String>,

    worker: Option<Worker>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            series: None,
            source_path: None,
            config: load_config_from_env(),
            report: None,
            selected: Pollutant::Co,
            progress: None,
            status_message: None,
            error_message: None,
            worker: None,
        }
    }
}

fn load_config_from_env() -> AnalysisConfig {
    let Ok(path) = std::env::var(CONFIG_ENV_VAR) else {
        return AnalysisConfig::default();
    };
    match AnalysisConfig::from_json_file(&path) {
        Ok(config) => {
            log::info!("Loaded config from {path}");
            config
        }
        Err(e) => {
            log::warn!("Ignoring config from {CONFIG_ENV_VAR}: {e}");
            AnalysisConfig::default()
        }
    }
}

impl AppState {
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Load a data file and start analysing it.
    pub fn load_path(&mut self, path: &Path) {
        match load_file(path, self.config.missing_values) {
            Ok(series) => {
                self.source_path = Some(path.to_path_buf());
                self.set_series(series);
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.error_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn set_series(&mut self, series: SampleSeries) {
        self.series = Some(Arc::new(series));
        self.report = None;
        self.error_message = None;
        self.start_analysis();
    }

    /// Run the pipeline on a background thread, replacing any running pass.
    pub fn start_analysis(&mut self) {
        let Some(series) = self.series.clone() else {
            return;
        };
        self.cancel_analysis();

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        let mut observer = ChannelObserver {
            tx: tx.clone(),
            cancel: Arc::clone(&cancel),
        };
        let config = self.config.clone();

        thread::spawn(move || {
            let report = analyze(&series, &config, &mut observer);
            let _ = tx.send(WorkerMessage::Finished(report));
        });

        self.worker = Some(Worker { rx, cancel });
        self.progress = Some(0.0);
        self.status_message = Some("Analysing…".to_string());
    }

    /// Ask the running pass to stop after the current pollutant.
    pub fn cancel_analysis(&mut self) {
        if let Some(worker) = &self.worker {
            worker.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Drain worker messages. Returns true while a pass is still running.
    pub fn poll_worker(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        loop {
            match worker.rx.try_recv() {
                Ok(WorkerMessage::Progress(event)) => {
                    self.progress = Some(event.fraction());
                    self.status_message = Some(event.describe());
                }
                Ok(WorkerMessage::Finished(report)) => {
                    self.finish(report);
                    self.progress = None;
                    return false;
                }
                Err(TryRecvError::Empty) => {
                    self.worker = Some(worker);
                    return true;
                }
                Err(TryRecvError::Disconnected) => {
                    log::error!("Analysis thread exited without a result");
                    self.error_message = Some("Analysis failed".to_string());
                    self.progress = None;
                    return false;
                }
            }
        }
    }

    fn finish(&mut self, report: AnalysisReport) {
        let surfaces = report
            .results
            .iter()
            .filter(|r| r.surface.surface().is_some())
            .count();
        self.status_message = Some(if report.cancelled {
            format!("Cancelled ({surfaces} surfaces)")
        } else {
            format!(
                "{} of {} samples analysed, {surfaces} surfaces",
                report.samples.len(),
                report.total_samples
            )
        });
        self.report = Some(report);
    }

    /// Switch color scale without recomputing any grid.
    pub fn set_color_scale(&mut self, kind: ColorScaleKind) {
        self.config.color_scale = kind;
        let Some(report) = &mut self.report else {
            return;
        };
        for result in &mut report.results {
            if let emission_surface::SurfaceOutcome::Available(surface) = &mut result.surface {
                surface.color_scale = kind.scale();
            }
        }
    }

    pub fn export_csv(&mut self, path: &Path) {
        let Some(report) = &self.report else {
            return;
        };
        match report.write_csv_file(path) {
            Ok(()) => {
                self.status_message = Some(format!("Exported to {}", path.display()));
                self.error_message = None;
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.error_message = Some(format!("Export failed: {e}"));
            }
        }
    }

    pub fn save_config(&mut self, path: &Path) {
        match self.config.to_json_file(path) {
            Ok(()) => self.status_message = Some(format!("Settings saved to {}", path.display())),
            Err(e) => {
                log::error!("{e}");
                self.error_message = Some(e.to_string());
            }
        }
    }
}
