//! Catalyst conversion-efficiency analysis.
//!
//! Loads a 10-column exhaust-gas time series, computes per-pollutant
//! conversion efficiency from upstream/downstream concentrations, and
//! interpolates efficiency over a (flow, catalyst temperature) grid for
//! display as a colored surface.
//!
//! The viewer binary (`emission-surface`) drives [`pipeline::analyze`] on a
//! worker thread; everything here is UI-free and usable headless.

pub mod analysis;
pub mod color;
pub mod config;
pub mod data;
pub mod pipeline;
pub mod surface;

pub use config::AnalysisConfig;
pub use pipeline::{analyze, AnalysisReport, ProgressEvent, ProgressObserver, SurfaceOutcome};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
