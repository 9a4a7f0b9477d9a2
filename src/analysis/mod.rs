//! Numeric core: efficiency, decimation and grid interpolation.
//!
//! ```text
//!  SampleSeries ──decimate──► SampleSeries
//!        │
//!        ▼
//!  compute_efficiency(upstream, downstream) ──► Vec<f64> in [0, 100]
//!        │
//!        ▼
//!  ScatterCloud (flow, temp, efficiency) ──Interpolator──► Grid
//! ```

pub mod clough_tocher;
pub mod efficiency;
pub mod interpolate;
pub mod resample;
pub mod triangulation;

pub use efficiency::{compute_efficiency, EfficiencyStats};
pub use interpolate::{
    interpolate, Grid, InterpolationError, InterpolationMethod, Interpolator, ScatterCloud,
};
pub use resample::{decimate, subsample_cloud};
