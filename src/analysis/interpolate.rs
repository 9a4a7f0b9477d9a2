//! Scattered-data to regular-grid interpolation.
//!
//! A [`ScatterCloud`] of `(flow, temperature, efficiency)` triples is
//! resampled onto a `grid_size × grid_size` lattice spanning the cloud's
//! bounding box, using one of three [`InterpolationMethod`]s:
//!
//! | Method       | Holes outside hull | Cost                    | Range       |
//! |--------------|--------------------|-------------------------|-------------|
//! | `NearestIdw` | never              | O(grid² · points)       | within data |
//! | `Linear`     | filled with 0      | O(points² + grid² · tri)| within data |
//! | `Cubic`      | filled with 0      | as linear               | may overshoot, clamped by default |

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::clough_tocher::CloughTocher;
use super::efficiency::{EFFICIENCY_MAX, EFFICIENCY_MIN};
use super::triangulation::{min_max, Degeneracy, Triangulation};

/// Added to every distance so a grid node on top of a sample stays finite.
pub const IDW_EPSILON: f64 = 1e-8;

/// Default grid resolution per axis.
pub const DEFAULT_GRID_SIZE: usize = 30;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    #[error("scatter cloud is empty")]
    EmptyCloud,

    #[error("grid size must be at least 1, got {0}")]
    InvalidGridSize(usize),

    #[error("scatter columns differ in length: x={x}, y={y}, z={z}")]
    LengthMismatch { x: usize, y: usize, z: usize },

    /// Triangulation-based methods need three non-collinear points.
    #[error("{method} interpolation needs at least 3 non-collinear points (distinct: {distinct}, collinear: {collinear})")]
    DegenerateGeometry {
        method: InterpolationMethod,
        distinct: usize,
        collinear: bool,
    },
}

pub type Result<T> = std::result::Result<T, InterpolationError>;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// Interpolation strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InterpolationMethod {
    /// Inverse-distance weighting over every sample. Defined everywhere.
    #[default]
    NearestIdw,
    /// Barycentric interpolation on the Delaunay triangulation.
    Linear,
    /// Clough–Tocher piecewise cubic on the Delaunay triangulation.
    Cubic,
}

impl InterpolationMethod {
    pub const ALL: [InterpolationMethod; 3] = [
        InterpolationMethod::NearestIdw,
        InterpolationMethod::Linear,
        InterpolationMethod::Cubic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            InterpolationMethod::NearestIdw => "nearest-idw",
            InterpolationMethod::Linear => "linear",
            InterpolationMethod::Cubic => "cubic",
        }
    }

    /// Whether the method needs a triangulation.
    pub fn is_triangulated(self) -> bool {
        !matches!(self, InterpolationMethod::NearestIdw)
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// ScatterCloud
// ---------------------------------------------------------------------------

/// Scattered `(x, y, z)` samples. The three columns always have equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScatterCloud {
    x: Vec<f64>,
    y: Vec<f64>,
    z: Vec<f64>,
}

impl ScatterCloud {
    pub fn new(x: Vec<f64>, y: Vec<f64>, z: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() || y.len() != z.len() {
            return Err(InterpolationError::LengthMismatch {
                x: x.len(),
                y: y.len(),
                z: z.len(),
            });
        }
        Ok(ScatterCloud { x, y, z })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn z(&self) -> &[f64] {
        &self.z
    }

    /// The points at `indices`, in the order given.
    pub fn select(&self, indices: &[usize]) -> ScatterCloud {
        ScatterCloud {
            x: indices.iter().map(|&i| self.x[i]).collect(),
            y: indices.iter().map(|&i| self.y[i]).collect(),
            z: indices.iter().map(|&i| self.z[i]).collect(),
        }
    }

    /// `(min, max)` of the x column.
    pub fn x_range(&self) -> (f64, f64) {
        min_max(&self.x)
    }

    /// `(min, max)` of the y column.
    pub fn y_range(&self) -> (f64, f64) {
        min_max(&self.y)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// `n` evenly spaced values over `[min, max]`, both ends included.
///
/// A zero span yields `n` copies of `min`; `n == 1` yields `[min]`.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ if max == min => vec![min; n],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n)
                .map(|k| if k == n - 1 { max } else { min + step * k as f64 })
                .collect()
        }
    }
}

/// Interpolated values on a regular lattice.
///
/// `x[i][j] = xs[j]` and `y[i][j] = ys[i]`, so row `i` runs along the x axis
/// at constant y.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    method: InterpolationMethod,
    xs: Vec<f64>,
    ys: Vec<f64>,
    x: Vec<Vec<f64>>,
    y: Vec<Vec<f64>>,
    z: Vec<Vec<f64>>,
}

impl Grid {
    fn from_axes(
        method: InterpolationMethod,
        xs: Vec<f64>,
        ys: Vec<f64>,
        mut value: impl FnMut(f64, f64) -> f64,
    ) -> Self {
        let x: Vec<Vec<f64>> = ys.iter().map(|_| xs.clone()).collect();
        let y: Vec<Vec<f64>> = ys.iter().map(|&yi| vec![yi; xs.len()]).collect();
        let z: Vec<Vec<f64>> = ys
            .iter()
            .map(|&yi| xs.iter().map(|&xj| value(xj, yi)).collect())
            .collect();
        Grid { method, xs, ys, x, y, z }
    }

    /// Cells per axis.
    pub fn size(&self) -> usize {
        self.xs.len()
    }

    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Grid coordinates along the x axis.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Grid coordinates along the y axis.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn x(&self) -> &[Vec<f64>] {
        &self.x
    }

    pub fn y(&self) -> &[Vec<f64>] {
        &self.y
    }

    pub fn z(&self) -> &[Vec<f64>] {
        &self.z
    }

    pub fn x_range(&self) -> (f64, f64) {
        min_max(&self.xs)
    }

    pub fn y_range(&self) -> (f64, f64) {
        min_max(&self.ys)
    }

    /// `(min, max)` over finite z values.
    pub fn z_range(&self) -> (f64, f64) {
        self.z
            .iter()
            .flatten()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

// ---------------------------------------------------------------------------
// Interpolator
// ---------------------------------------------------------------------------

/// Interpolation settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    pub grid_size: usize,
    pub method: InterpolationMethod,
    /// Value for cells outside the convex hull (triangulated methods).
    pub fill_value: f64,
    /// Clamp cubic output into the efficiency range.
    pub clamp_cubic: bool,
}

impl Default for Interpolator {
    fn default() -> Self {
        Interpolator::new(DEFAULT_GRID_SIZE, InterpolationMethod::default())
    }
}

impl Interpolator {
    pub fn new(grid_size: usize, method: InterpolationMethod) -> Self {
        Interpolator {
            grid_size,
            method,
            fill_value: 0.0,
            clamp_cubic: true,
        }
    }

    pub fn with_fill_value(mut self, fill_value: f64) -> Self {
        self.fill_value = fill_value;
        self
    }

    pub fn with_clamp_cubic(mut self, clamp: bool) -> Self {
        self.clamp_cubic = clamp;
        self
    }

    /// Interpolate `cloud` onto a fresh grid.
    pub fn run(&self, cloud: &ScatterCloud) -> Result<Grid> {
        if self.grid_size == 0 {
            return Err(InterpolationError::InvalidGridSize(0));
        }
        if cloud.is_empty() {
            return Err(InterpolationError::EmptyCloud);
        }

        let (x0, x1) = cloud.x_range();
        let (y0, y1) = cloud.y_range();
        let xs = linspace(x0, x1, self.grid_size);
        let ys = linspace(y0, y1, self.grid_size);

        let grid = match self.method {
            InterpolationMethod::NearestIdw => {
                Grid::from_axes(self.method, xs, ys, |gx, gy| idw(cloud, gx, gy))
            }
            InterpolationMethod::Linear => {
                let tri = self.triangulate(cloud)?;
                Grid::from_axes(self.method, xs, ys, |gx, gy| match tri.locate(gx, gy) {
                    Some(loc) => {
                        let [a, b, c] = tri.triangles()[loc.triangle];
                        let v = tri.values();
                        loc.weights[0] * v[a] + loc.weights[1] * v[b] + loc.weights[2] * v[c]
                    }
                    None => self.fill_value,
                })
            }
            InterpolationMethod::Cubic => {
                let tri = self.triangulate(cloud)?;
                let ct = CloughTocher::fit(&tri);
                Grid::from_axes(self.method, xs, ys, |gx, gy| match ct.evaluate(gx, gy) {
                    Some(v) if !v.is_finite() => self.fill_value,
                    Some(v) if self.clamp_cubic => v.clamp(EFFICIENCY_MIN, EFFICIENCY_MAX),
                    Some(v) => v,
                    None => self.fill_value,
                })
            }
        };

        log::debug!(
            "{} interpolation of {} points onto {}x{} grid",
            self.method,
            cloud.len(),
            self.grid_size,
            self.grid_size
        );
        Ok(grid)
    }

    fn triangulate(&self, cloud: &ScatterCloud) -> Result<Triangulation> {
        Triangulation::build(cloud.x(), cloud.y(), cloud.z()).map_err(|d| {
            let (distinct, collinear) = match d {
                Degeneracy::TooFewPoints { distinct } => (distinct, false),
                Degeneracy::Collinear { distinct } => (distinct, true),
            };
            InterpolationError::DegenerateGeometry {
                method: self.method,
                distinct,
                collinear,
            }
        })
    }
}

/// Interpolate with default options (exterior filled with 0, cubic clamped).
pub fn interpolate(
    cloud: &ScatterCloud,
    grid_size: usize,
    method: InterpolationMethod,
) -> Result<Grid> {
    Interpolator::new(grid_size, method).run(cloud)
}

/// Inverse-distance weighted value at `(gx, gy)`.
fn idw(cloud: &ScatterCloud, gx: f64, gy: f64) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for ((&x, &y), &z) in cloud.x.iter().zip(&cloud.y).zip(&cloud.z) {
        let d = ((x - gx).powi(2) + (y - gy).powi(2)).sqrt();
        let w = 1.0 / (d + IDW_EPSILON);
        num += z * w;
        den += w;
    }
    num / den
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cloud(points: &[(f64, f64, f64)]) -> ScatterCloud {
        ScatterCloud::new(
            points.iter().map(|p| p.0).collect(),
            points.iter().map(|p| p.1).collect(),
            points.iter().map(|p| p.2).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 3.0, 3), vec![3.0, 3.0, 3.0]);
        assert_eq!(linspace(2.0, 9.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_cloud_length_mismatch() {
        let err = ScatterCloud::new(vec![1.0], vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert_eq!(err, InterpolationError::LengthMismatch { x: 1, y: 2, z: 1 });
    }

    #[test]
    fn test_idw_single_point_fills_grid() {
        let c = cloud(&[(5.0, 300.0, 42.0)]);
        let grid = interpolate(&c, 4, InterpolationMethod::NearestIdw).unwrap();
        assert_eq!(grid.size(), 4);
        for row in grid.z() {
            for &v in row {
                assert!((v - 42.0).abs() < 1e-9);
            }
        }
        // Zero span collapses both axes.
        assert!(grid.xs().iter().all(|&v| v == 5.0));
        assert!(grid.ys().iter().all(|&v| v == 300.0));
    }

    #[test]
    fn test_idw_hits_sample_values() {
        let c = cloud(&[(0.0, 0.0, 10.0), (1.0, 1.0, 90.0)]);
        let grid = interpolate(&c, 2, InterpolationMethod::NearestIdw).unwrap();
        assert!((grid.z()[0][0] - 10.0).abs() < 1e-4);
        assert!((grid.z()[1][1] - 90.0).abs() < 1e-4);
        // Equidistant corners average.
        assert!((grid.z()[0][1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_meshgrid_layout() {
        let c = cloud(&[(0.0, 10.0, 1.0), (2.0, 30.0, 1.0), (1.0, 20.0, 1.0)]);
        let grid = interpolate(&c, 3, InterpolationMethod::NearestIdw).unwrap();
        assert_eq!(grid.x()[0], vec![0.0, 1.0, 2.0]);
        assert_eq!(grid.x()[2], vec![0.0, 1.0, 2.0]);
        assert_eq!(grid.y()[0], vec![10.0; 3]);
        assert_eq!(grid.y()[2], vec![30.0; 3]);
        assert_eq!(grid.x_range(), (0.0, 2.0));
        assert_eq!(grid.y_range(), (10.0, 30.0));
    }

    #[test]
    fn test_linear_plane_and_exterior_fill() {
        // Triangle hull: the upper-right half of the bounding box is outside.
        let c = cloud(&[(0.0, 0.0, 10.0), (10.0, 0.0, 30.0), (0.0, 10.0, 50.0)]);
        let grid = interpolate(&c, 3, InterpolationMethod::Linear).unwrap();

        // z = 10 + 2x + 4y inside the hull.
        assert!((grid.z()[0][0] - 10.0).abs() < 1e-9);
        assert!((grid.z()[1][1] - 40.0).abs() < 1e-9);
        assert!((grid.z()[0][2] - 30.0).abs() < 1e-9);
        // (10, 10) lies outside.
        assert_eq!(grid.z()[2][2], 0.0);
    }

    #[test]
    fn test_fill_value_option() {
        let c = cloud(&[(0.0, 0.0, 10.0), (10.0, 0.0, 30.0), (0.0, 10.0, 50.0)]);
        let grid = Interpolator::new(3, InterpolationMethod::Linear)
            .with_fill_value(f64::NAN)
            .run(&c)
            .unwrap();
        assert!(grid.z()[2][2].is_nan());
        assert_eq!(grid.z_range(), (10.0, 50.0));
    }

    #[test]
    fn test_triangulated_methods_report_degenerate_geometry() {
        let two = cloud(&[(0.0, 0.0, 1.0), (1.0, 1.0, 2.0)]);
        let line = cloud(&[(0.0, 0.0, 1.0), (1.0, 1.0, 2.0), (2.0, 2.0, 3.0)]);

        for method in [InterpolationMethod::Linear, InterpolationMethod::Cubic] {
            assert_eq!(
                interpolate(&two, 10, method).unwrap_err(),
                InterpolationError::DegenerateGeometry { method, distinct: 2, collinear: false }
            );
            assert_eq!(
                interpolate(&line, 10, method).unwrap_err(),
                InterpolationError::DegenerateGeometry { method, distinct: 3, collinear: true }
            );
        }
        assert!(interpolate(&line, 10, InterpolationMethod::NearestIdw).is_ok());
    }

    #[test]
    fn test_cubic_clamping() {
        // A sharp spike surrounded by a ring produces overshoot between them.
        let mut pts = vec![(0.0, 0.0, 100.0)];
        for k in 0..8 {
            let a = k as f64 * std::f64::consts::FRAC_PI_4;
            pts.push((a.cos(), a.sin(), 0.0));
            pts.push((3.0 * a.cos(), 3.0 * a.sin(), 100.0));
        }
        let c = cloud(&pts);

        let clamped = interpolate(&c, 25, InterpolationMethod::Cubic).unwrap();
        for row in clamped.z() {
            for &v in row {
                assert!((0.0..=100.0).contains(&v));
            }
        }

        let raw = Interpolator::new(25, InterpolationMethod::Cubic)
            .with_clamp_cubic(false)
            .run(&c)
            .unwrap();
        assert_eq!(raw.method(), InterpolationMethod::Cubic);
        assert_eq!(raw.size(), 25);
        assert!(raw.z_range().0 < 0.0, "no undershoot: {:?}", raw.z_range());
    }

    #[test]
    fn test_linear_fills_near_collinear_hull_edge() {
        for eps in [2e-5, 1e-5, 1e-6, 1e-7, 1e-8] {
            let c = cloud(&[
                (0.0, 0.0, 50.0),
                (1.0, 0.0, 50.0),
                (0.25, 0.75 * eps, 50.0),
                (0.5, eps, 50.0),
                (0.75, 0.75 * eps, 50.0),
                (0.5, 1.0, 50.0),
            ]);
            let grid = interpolate(&c, 9, InterpolationMethod::Linear).unwrap();
            // The bottom row runs along the hull edge, every node inside.
            for &v in &grid.z()[0] {
                assert_relative_eq!(v, 50.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_invalid_requests() {
        let c = cloud(&[(0.0, 0.0, 1.0)]);
        assert_eq!(
            interpolate(&c, 0, InterpolationMethod::NearestIdw).unwrap_err(),
            InterpolationError::InvalidGridSize(0)
        );
        assert_eq!(
            interpolate(&ScatterCloud::default(), 10, InterpolationMethod::NearestIdw)
                .unwrap_err(),
            InterpolationError::EmptyCloud
        );
    }

    #[test]
    fn test_method_serde_names() {
        let json = serde_json::to_string(&InterpolationMethod::NearestIdw).unwrap();
        assert_eq!(json, "\"nearest-idw\"");
        let m: InterpolationMethod = serde_json::from_str("\"cubic\"").unwrap();
        assert_eq!(m, InterpolationMethod::Cubic);
    }
}
