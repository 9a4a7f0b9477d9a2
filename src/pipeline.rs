//! One analysis pass over a loaded sample series.
//!
//! ```text
//!  SampleSeries ─► decimate ─► for each pollutant:
//!                                efficiency ─► scatter cloud ─► grid ─► Surface
//! ```
//!
//! Progress is reported to a caller-supplied [`ProgressObserver`] at each
//! phase boundary. The observer may request cancellation; it is honoured
//! between pollutant passes, so every pollutant already reported is complete.

use std::io::Write;
use std::path::Path;

use crate::analysis::efficiency::{compute_efficiency, EfficiencyStats};
use crate::analysis::interpolate::{InterpolationError, ScatterCloud};
use crate::analysis::resample::{decimate, subsample_cloud};
use crate::config::AnalysisConfig;
use crate::data::export::{self, ExportError};
use crate::data::model::{Pollutant, SampleSeries};
use crate::surface::Surface;

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Phase boundaries of an analysis pass.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    ResampleStarted { samples: usize, stride: usize },
    EfficiencyComputed { pollutant: Pollutant, samples: usize },
    InterpolationDone { pollutant: Pollutant, available: bool },
    Finished { cancelled: bool },
}

impl ProgressEvent {
    /// Rough completed fraction of the pass when this event fires.
    pub fn fraction(&self) -> f32 {
        const STEPS: f32 = 2.0 + 2.0 * Pollutant::ALL.len() as f32;
        let index = |p: &Pollutant| Pollutant::ALL.iter().position(|q| q == p).unwrap_or(0) as f32;
        match self {
            ProgressEvent::ResampleStarted { .. } => 0.0,
            ProgressEvent::EfficiencyComputed { pollutant, .. } => {
                (2.0 + 2.0 * index(pollutant)) / STEPS
            }
            ProgressEvent::InterpolationDone { pollutant, .. } => {
                (3.0 + 2.0 * index(pollutant)) / STEPS
            }
            ProgressEvent::Finished { .. } => 1.0,
        }
    }

    /// Short status line for display.
    pub fn describe(&self) -> String {
        match self {
            ProgressEvent::ResampleStarted { samples, stride } => {
                format!("Resampling {samples} samples (stride {stride})…")
            }
            ProgressEvent::EfficiencyComputed { pollutant, .. } => {
                format!("{pollutant} efficiency computed, interpolating…")
            }
            ProgressEvent::InterpolationDone { pollutant, available: true } => {
                format!("{pollutant} surface ready")
            }
            ProgressEvent::InterpolationDone { pollutant, available: false } => {
                format!("{pollutant}: no surface available")
            }
            ProgressEvent::Finished { cancelled: false } => "Analysis complete".to_string(),
            ProgressEvent::Finished { cancelled: true } => "Analysis cancelled".to_string(),
        }
    }
}

/// Receives progress events during [`analyze`].
pub trait ProgressObserver {
    fn on_event(&mut self, event: &ProgressEvent);

    /// Checked before each pollutant pass.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F: FnMut(&ProgressEvent)> ProgressObserver for F {
    fn on_event(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_event(&mut self, _event: &ProgressEvent) {}
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Surface for one pollutant, or why there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOutcome {
    Available(Surface),
    Unavailable { reason: InterpolationError },
}

impl SurfaceOutcome {
    pub fn surface(&self) -> Option<&Surface> {
        match self {
            SurfaceOutcome::Available(s) => Some(s),
            SurfaceOutcome::Unavailable { .. } => None,
        }
    }
}

/// Everything computed for one pollutant.
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantResult {
    pub pollutant: Pollutant,
    /// Efficiency per decimated sample.
    pub efficiency: Vec<f64>,
    /// Statistics over the full, undecimated series.
    pub stats: EfficiencyStats,
    pub surface: SurfaceOutcome,
    /// Cloud size before subsampling, when the point cap applied.
    pub subsampled_from: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// The decimated series the efficiencies are aligned with.
    pub samples: SampleSeries,
    /// Sample count before decimation.
    pub total_samples: usize,
    /// One entry per completed pollutant, in [`Pollutant::ALL`] order.
    pub results: Vec<PollutantResult>,
    pub cancelled: bool,
}

impl AnalysisReport {
    pub fn result(&self, pollutant: Pollutant) -> Option<&PollutantResult> {
        self.results.iter().find(|r| r.pollutant == pollutant)
    }

    fn efficiency_columns(&self) -> Vec<(Pollutant, &[f64])> {
        self.results
            .iter()
            .map(|r| (r.pollutant, r.efficiency.as_slice()))
            .collect()
    }

    /// Export the decimated table with one efficiency column per completed
    /// pollutant.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        export::write_augmented_csv(writer, &self.samples, &self.efficiency_columns())
    }

    pub fn write_csv_file(&self, path: &Path) -> Result<(), ExportError> {
        export::write_augmented_csv_file(path, &self.samples, &self.efficiency_columns())
    }
}

// ---------------------------------------------------------------------------
// Analysis pass
// ---------------------------------------------------------------------------

/// Run a full analysis pass.
///
/// Never fails: per-pollutant interpolation problems are reported as
/// [`SurfaceOutcome::Unavailable`] and the other pollutants proceed.
pub fn analyze(
    series: &SampleSeries,
    config: &AnalysisConfig,
    observer: &mut dyn ProgressObserver,
) -> AnalysisReport {
    observer.on_event(&ProgressEvent::ResampleStarted {
        samples: series.len(),
        stride: config.stride,
    });
    let samples = decimate(series, config.stride);
    let flow = samples.flow();
    let temp = samples.catalyst_temp();
    let interpolator = config.interpolator();
    let color_scale = config.color_scale.scale();

    let mut results = Vec::with_capacity(Pollutant::ALL.len());
    let mut cancelled = false;

    for pollutant in Pollutant::ALL {
        if observer.is_cancelled() {
            log::info!("analysis cancelled before {pollutant}");
            cancelled = true;
            break;
        }

        let efficiency =
            compute_efficiency(&samples.upstream(pollutant), &samples.downstream(pollutant));
        let full = compute_efficiency(&series.upstream(pollutant), &series.downstream(pollutant));
        let stats = EfficiencyStats::from_series(&full);
        observer.on_event(&ProgressEvent::EfficiencyComputed {
            pollutant,
            samples: efficiency.len(),
        });

        let mut subsampled_from = None;
        let surface = ScatterCloud::new(flow.clone(), temp.clone(), efficiency.clone())
            .map(|cloud| match config.max_cloud_points {
                Some(cap) if cloud.len() > cap => {
                    log::info!("{pollutant}: interpolating {cap} of {} points", cloud.len());
                    subsampled_from = Some(cloud.len());
                    subsample_cloud(&cloud, cap, config.sample_seed)
                }
                _ => cloud,
            })
            .and_then(|cloud| interpolator.run(&cloud));

        let surface = match surface {
            Ok(grid) => SurfaceOutcome::Available(Surface::build(pollutant, grid, color_scale.clone())),
            Err(reason) => {
                log::warn!("{pollutant}: no surface available: {reason}");
                SurfaceOutcome::Unavailable { reason }
            }
        };

        observer.on_event(&ProgressEvent::InterpolationDone {
            pollutant,
            available: surface.surface().is_some(),
        });

        log::debug!(
            "{pollutant}: mean {:.1}% (min {:.1}, max {:.1}) over {} samples",
            stats.mean,
            stats.min,
            stats.max,
            stats.count
        );

        results.push(PollutantResult {
            pollutant,
            efficiency,
            stats,
            surface,
            subsampled_from,
        });
    }

    observer.on_event(&ProgressEvent::Finished { cancelled });
    log::info!(
        "analysis of {} samples ({} after decimation) finished with {} surfaces",
        series.len(),
        samples.len(),
        results.iter().filter(|r| r.surface.surface().is_some()).count()
    );

    AnalysisReport {
        samples,
        total_samples: series.len(),
        results,
        cancelled,
    }
}
