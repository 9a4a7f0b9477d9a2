//! Point-count reduction ahead of interpolation and rendering.
//!
//! Decimation keeps every k-th sample with no averaging. Cloud subsampling
//! drops a seeded random subset of scatter points to bound interpolation
//! cost, which grows with `grid_size² · points`.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::interpolate::ScatterCloud;
use crate::data::model::SampleSeries;

/// Default decimation stride: 10 Hz acquisition down to 1 Hz.
pub const DEFAULT_STRIDE: usize = 10;

/// Keep every `stride`-th element starting at index 0.
///
/// A `stride` of 0 is treated as 1. When `stride >= len` only the first
/// element is kept; an empty input gives an empty output.
pub fn decimate_slice<T: Clone>(items: &[T], stride: usize) -> Vec<T> {
    let stride = if stride == 0 {
        log::warn!("decimation stride 0 requested, using 1");
        1
    } else {
        stride
    };
    items.iter().step_by(stride).cloned().collect()
}

/// Decimate a sample series, preserving acquisition order.
pub fn decimate(series: &SampleSeries, stride: usize) -> SampleSeries {
    let out = SampleSeries::new(decimate_slice(&series.samples, stride));
    log::debug!(
        "decimated {} samples to {} (stride {stride})",
        series.len(),
        out.len()
    );
    out
}

/// Uniform random subsample of a scatter cloud, without replacement.
///
/// Clouds with at most `max_points` points are returned unchanged. Kept
/// points stay in their original relative order. The same `seed` always
/// selects the same subset.
pub fn subsample_cloud(cloud: &ScatterCloud, max_points: usize, seed: u64) -> ScatterCloud {
    if cloud.len() <= max_points {
        return cloud.clone();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut indices = rand::seq::index::sample(&mut rng, cloud.len(), max_points).into_vec();
    indices.sort_unstable();

    log::debug!("subsampled scatter cloud from {} to {max_points} points", cloud.len());
    cloud.select(&indices)
}
