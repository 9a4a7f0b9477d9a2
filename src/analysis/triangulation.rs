//! Delaunay triangulation of scattered 2-D points.
//!
//! Points are normalized to the unit square before triangulating so that
//! axes with very different units (m³/h against °C) produce well-shaped
//! triangles. Coincident points are merged, their values averaged.

use std::collections::HashMap;

/// Relative tolerance for orientation and in-circle predicates.
const GEOMETRY_EPS: f64 = 1e-12;
/// Barycentric slack when testing whether a query lies in a triangle.
const LOCATE_EPS: f64 = 1e-10;

/// Why a triangulation could not be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degeneracy {
    /// Fewer than three distinct points.
    TooFewPoints { distinct: usize },
    /// All distinct points lie on one line.
    Collinear { distinct: usize },
}

/// Affine map from data coordinates into the unit square.
#[derive(Debug, Clone, Copy)]
struct Normalizer {
    x0: f64,
    y0: f64,
    sx: f64,
    sy: f64,
}

impl Normalizer {
    fn fit(x: &[f64], y: &[f64]) -> Self {
        let (x0, x1) = min_max(x);
        let (y0, y1) = min_max(y);
        let span = |a: f64, b: f64| if b > a { b - a } else { 1.0 };
        Normalizer {
            x0,
            y0,
            sx: span(x0, x1),
            sy: span(y0, y1),
        }
    }

    #[inline]
    fn apply(&self, x: f64, y: f64) -> [f64; 2] {
        [(x - self.x0) / self.sx, (y - self.y0) / self.sy]
    }
}

pub(crate) fn min_max(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// A triangle as three counter-clockwise vertex indices.
pub type Triangle = [usize; 3];

/// Position of a query point inside a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub triangle: usize,
    /// Barycentric weights of the triangle's three vertices.
    pub weights: [f64; 3],
}

/// A Delaunay triangulation over merged, normalized points.
#[derive(Debug, Clone)]
pub struct Triangulation {
    normalizer: Normalizer,
    /// Vertex positions in data coordinates.
    points: Vec<[f64; 2]>,
    /// Vertex positions in normalized coordinates.
    unit_points: Vec<[f64; 2]>,
    /// Vertex values (averaged over merged duplicates).
    values: Vec<f64>,
    triangles: Vec<Triangle>,
    /// Normalized bounding box per triangle: [min_x, min_y, max_x, max_y].
    bounds: Vec<[f64; 4]>,
}

impl Triangulation {
    /// Triangulate `(x[i], y[i])` carrying `z[i]`.
    pub fn build(x: &[f64], y: &[f64], z: &[f64]) -> Result<Self, Degeneracy> {
        debug_assert!(x.len() == y.len() && y.len() == z.len());

        let normalizer = Normalizer::fit(x, y);
        let (points, values) = merge_duplicates(x, y, z);
        let unit_points: Vec<[f64; 2]> = points
            .iter()
            .map(|p| normalizer.apply(p[0], p[1]))
            .collect();

        let distinct = unit_points.len();
        if distinct < 3 {
            return Err(Degeneracy::TooFewPoints { distinct });
        }
        if all_collinear(&unit_points) {
            return Err(Degeneracy::Collinear { distinct });
        }

        let triangles = triangulate(&unit_points);
        if triangles.is_empty() {
            return Err(Degeneracy::Collinear { distinct });
        }

        let bounds = triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.map(|i| unit_points[i]);
                [
                    a[0].min(b[0]).min(c[0]),
                    a[1].min(b[1]).min(c[1]),
                    a[0].max(b[0]).max(c[0]),
                    a[1].max(b[1]).max(c[1]),
                ]
            })
            .collect();

        log::debug!(
            "triangulated {} points ({} distinct) into {} triangles",
            x.len(),
            distinct,
            triangles.len()
        );

        Ok(Triangulation {
            normalizer,
            points,
            unit_points,
            values,
            triangles,
            bounds,
        })
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    /// Vertex positions mapped into the unit square.
    pub fn unit_points(&self) -> &[[f64; 2]] {
        &self.unit_points
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Find the triangle containing `(x, y)`, or `None` outside the hull.
    pub fn locate(&self, x: f64, y: f64) -> Option<Location> {
        let q = self.normalizer.apply(x, y);

        self.triangles
            .iter()
            .zip(&self.bounds)
            .enumerate()
            .filter(|(_, (_, b))| {
                q[0] >= b[0] - LOCATE_EPS
                    && q[0] <= b[2] + LOCATE_EPS
                    && q[1] >= b[1] - LOCATE_EPS
                    && q[1] <= b[3] + LOCATE_EPS
            })
            .find_map(|(idx, (tri, _))| {
                let [a, b, c] = tri.map(|i| self.unit_points[i]);
                let w = barycentric(a, b, c, q)?;
                w.iter().all(|&wi| wi >= -LOCATE_EPS).then_some(Location {
                    triangle: idx,
                    weights: w,
                })
            })
    }

    /// Distinct neighbours of each vertex along triangle edges.
    pub fn neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj: Vec<Vec<usize>> = vec![Vec::new(); self.points.len()];
        for tri in &self.triangles {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                if !adj[a].contains(&b) {
                    adj[a].push(b);
                }
                if !adj[b].contains(&a) {
                    adj[b].push(a);
                }
            }
        }
        adj
    }
}

/// Collapse exactly coincident points, averaging their values.
fn merge_duplicates(x: &[f64], y: &[f64], z: &[f64]) -> (Vec<[f64; 2]>, Vec<f64>) {
    let mut index: HashMap<(u64, u64), usize> = HashMap::with_capacity(x.len());
    let mut points: Vec<[f64; 2]> = Vec::with_capacity(x.len());
    let mut sums: Vec<(f64, usize)> = Vec::with_capacity(x.len());

    for ((&xi, &yi), &zi) in x.iter().zip(y).zip(z) {
        // -0.0 and 0.0 are the same location.
        let key = ((xi + 0.0).to_bits(), (yi + 0.0).to_bits());
        match index.get(&key) {
            Some(&slot) => {
                sums[slot].0 += zi;
                sums[slot].1 += 1;
            }
            None => {
                index.insert(key, points.len());
                points.push([xi, yi]);
                sums.push((zi, 1));
            }
        }
    }

    let values = sums.into_iter().map(|(s, n)| s / n as f64).collect();
    (points, values)
}

#[inline]
fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

fn all_collinear(points: &[[f64; 2]]) -> bool {
    let p0 = points[0];
    let Some(p1) = points
        .iter()
        .copied()
        .max_by(|a, b| dist_sq(p0, *a).total_cmp(&dist_sq(p0, *b)))
    else {
        return true;
    };
    let base = dist_sq(p0, p1).sqrt();
    if base == 0.0 {
        return true;
    }
    points
        .iter()
        .all(|&p| orient(p0, p1, p).abs() <= GEOMETRY_EPS * base.max(1.0))
}

#[inline]
fn dist_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Barycentric coordinates of `q` in triangle `abc`.
fn barycentric(a: [f64; 2], b: [f64; 2], c: [f64; 2], q: [f64; 2]) -> Option<[f64; 3]> {
    let det = orient(a, b, c);
    if det.abs() < f64::MIN_POSITIVE {
        return None;
    }
    let wa = orient(b, c, q) / det;
    let wb = orient(c, a, q) / det;
    Some([wa, wb, 1.0 - wa - wb])
}

// ---------------------------------------------------------------------------
// Sweep hull + Lawson flips
// ---------------------------------------------------------------------------

/// Whether `d` lies inside the circumcircle of the counter-clockwise
/// triangle `abc` by more than rounding noise.
fn in_circumcircle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> bool {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);
    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdx * cdy - cdx * bdy)
        + blift * (cdx * ady - adx * cdy)
        + clift * (adx * bdy - bdx * ady);
    let permanent = alift * ((bdx * cdy).abs() + (cdx * bdy).abs())
        + blift * ((cdx * ady).abs() + (adx * cdy).abs())
        + clift * ((adx * bdy).abs() + (bdx * ady).abs());
    det > GEOMETRY_EPS * permanent
}

fn counter_clockwise(t: Triangle, pts: &[[f64; 2]]) -> Triangle {
    if orient(pts[t[0]], pts[t[1]], pts[t[2]]) < 0.0 {
        [t[0], t[2], t[1]]
    } else {
        t
    }
}

/// Triangulate points already normalized to the unit square.
///
/// Points are swept in lexicographic order, each one fanned to the hull
/// edges it sees, so the result always covers the convex hull. Lawson
/// flips then make it Delaunay without changing the covered region.
fn triangulate(points: &[[f64; 2]]) -> Vec<Triangle> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by(|&a, &b| {
        points[a][0]
            .total_cmp(&points[b][0])
            .then(points[a][1].total_cmp(&points[b][1]))
    });

    // Leading run of points on the line through the first two.
    let (p0, p1) = (order[0], order[1]);
    let Some(k) = (2..order.len()).find(|&k| orient(points[p0], points[p1], points[order[k]]) != 0.0)
    else {
        return Vec::new();
    };
    let apex = order[k];

    let mut triangles: Vec<Triangle> = order[..k]
        .windows(2)
        .map(|w| counter_clockwise([w[0], w[1], apex], points))
        .collect();

    // Hull as a counter-clockwise vertex cycle.
    let mut hull: Vec<usize> = if orient(points[p0], points[order[k - 1]], points[apex]) > 0.0 {
        order[..=k].to_vec()
    } else {
        order[..k].iter().rev().copied().chain([apex]).collect()
    };

    for &p in &order[k + 1..] {
        let q = points[p];
        let m = hull.len();
        let sees = |hull: &[usize], i: usize| {
            orient(points[hull[i]], points[hull[(i + 1) % m]], q) < 0.0
        };

        let Some(first) = (0..m).find(|&i| sees(&hull, i) && !sees(&hull, (i + m - 1) % m)) else {
            log::warn!("triangulation skipped point {p}: no visible hull edge");
            continue;
        };
        hull.rotate_left(first);
        let visible = (0..m).take_while(|&i| sees(&hull, i)).count();

        triangles.extend((0..visible).map(|i| [hull[i + 1], hull[i], p]));
        hull.splice(1..visible, [p]);
    }

    legalize(points, &mut triangles);
    triangles
}

/// Flip interior edges until every triangle passes the empty-circumcircle
/// test.
fn legalize(points: &[[f64; 2]], triangles: &mut [Triangle]) {
    // Directed edge -> triangle holding it in counter-clockwise order.
    let mut edges: HashMap<(usize, usize), usize> = HashMap::with_capacity(triangles.len() * 3);
    for (t, tri) in triangles.iter().enumerate() {
        for k in 0..3 {
            edges.insert((tri[k], tri[(k + 1) % 3]), t);
        }
    }

    let mut pending: Vec<(usize, usize)> = edges.keys().copied().filter(|&(a, b)| a < b).collect();
    let max_flips = 4 * points.len() * points.len() + 64;
    let mut flips = 0;

    while let Some((a, b)) = pending.pop() {
        let (Some(&t1), Some(&t2)) = (edges.get(&(a, b)), edges.get(&(b, a))) else {
            continue;
        };
        let third = |t: Triangle, u: usize, v: usize| t.into_iter().find(|&w| w != u && w != v);
        let (Some(c), Some(d)) = (third(triangles[t1], a, b), third(triangles[t2], a, b)) else {
            continue;
        };

        let [pa, pb, pc, pd] = [a, b, c, d].map(|i| points[i]);
        if !in_circumcircle(pa, pb, pc, pd) {
            continue;
        }
        // Both new triangles must keep positive area.
        if orient(pa, pd, pc) <= 0.0 || orient(pd, pb, pc) <= 0.0 {
            continue;
        }
        if flips == max_flips {
            log::warn!("triangulation stopped after {flips} edge flips");
            break;
        }
        flips += 1;

        triangles[t1] = [a, d, c];
        triangles[t2] = [d, b, c];
        edges.remove(&(a, b));
        edges.remove(&(b, a));
        for t in [t1, t2] {
            let tri = triangles[t];
            for k in 0..3 {
                edges.insert((tri[k], tri[(k + 1) % 3]), t);
            }
        }
        pending.extend([(a, d), (d, b), (b, c), (c, a)]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(t: &Triangulation, tri: &Triangle) -> f64 {
        let [a, b, c] = tri.map(|i| t.points()[i]);
        orient(a, b, c) / 2.0
    }

    #[test]
    fn test_square_grid_covers_area() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                x.push(i as f64);
                y.push(j as f64);
            }
        }
        let z = vec![0.0; x.len()];
        let t = Triangulation::build(&x, &y, &z).unwrap();

        // 16 points on a 4x4 lattice: 2 * 3 * 3 triangles.
        assert_eq!(t.triangles().len(), 18);
        let total: f64 = t.triangles().iter().map(|tri| area(&t, tri)).sum();
        assert!((total - 9.0).abs() < 1e-9);
        assert!(t.triangles().iter().all(|tri| area(&t, tri) > 0.0));
    }

    #[test]
    fn test_delaunay_empty_circumcircle() {
        let x = [0.0, 1.0, 0.3, 0.8, 0.5, 0.1, 0.9];
        let y = [0.0, 0.1, 0.9, 0.7, 0.4, 0.5, 0.95];
        let z = [0.0; 7];
        let t = Triangulation::build(&x, &y, &z).unwrap();

        for tri in t.triangles() {
            let [a, b, c] = tri.map(|i| t.unit_points[i]);
            assert!(orient(a, b, c) > 0.0);
            for (k, p) in t.unit_points.iter().enumerate() {
                if !tri.contains(&k) {
                    assert!(!in_circumcircle(a, b, c, *p), "{tri:?} contains point {k}");
                }
            }
        }
    }

    #[test]
    fn test_near_collinear_hull_edge_is_covered() {
        for eps in [2e-5, 1e-5, 1e-6, 1e-7, 1e-8] {
            let x = [0.0, 1.0, 0.25, 0.5, 0.75, 0.5];
            let y = [0.0, 0.0, 0.75 * eps, eps, 0.75 * eps, 1.0];
            let t = Triangulation::build(&x, &y, &[0.0; 6]).unwrap();

            // Area of the convex hull (0,0), (1,0), (0.5,1).
            let total: f64 = t.triangles().iter().map(|tri| area(&t, tri)).sum();
            assert!((total - 0.5).abs() < 1e-12, "eps {eps}: area {total}");

            for i in 0..=8 {
                let qx = i as f64 / 8.0;
                assert!(t.locate(qx, 0.0).is_some(), "eps {eps}: ({qx}, 0) outside");
            }
        }
    }

    #[test]
    fn test_random_cloud_covers_hull() {
        // Deterministic scatter with a far-off outlier stretching the hull.
        let mut x: Vec<f64> = (0..60).map(|i| ((i * 37) % 61) as f64 / 61.0).collect();
        let mut y: Vec<f64> = (0..60).map(|i| ((i * 17) % 59) as f64 / 59.0).collect();
        x.push(0.5);
        y.push(40.0);
        let t = Triangulation::build(&x, &y, &vec![0.0; x.len()]).unwrap();

        let n = t.points().len();
        assert!(t.triangles().iter().all(|tri| area(&t, tri) > 0.0));
        // Every vertex is used.
        let mut used = vec![false; n];
        for tri in t.triangles() {
            for &v in tri {
                used[v] = true;
            }
        }
        assert!(used.iter().all(|&u| u));
        // Euler: 2n - 2 - h triangles, h hull vertices, so at most 2n - 5.
        assert!(t.triangles().len() <= 2 * n - 5);
        for &(qx, qy) in &[(0.5, 1.0), (0.5, 39.0), (0.0, 0.0), (0.5, 0.5)] {
            assert!(t.locate(qx, qy).is_some(), "({qx}, {qy}) outside");
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(
            Triangulation::build(&[1.0, 2.0], &[1.0, 2.0], &[0.0, 0.0]).unwrap_err(),
            Degeneracy::TooFewPoints { distinct: 2 }
        );
        assert_eq!(
            Triangulation::build(&[1.0, 1.0, 1.0], &[2.0, 2.0, 2.0], &[0.0; 3]).unwrap_err(),
            Degeneracy::TooFewPoints { distinct: 1 }
        );
        assert_eq!(
            Triangulation::build(&[0.0, 1.0, 2.0, 3.0], &[0.0, 2.0, 4.0, 6.0], &[0.0; 4])
                .unwrap_err(),
            Degeneracy::Collinear { distinct: 4 }
        );
    }

    #[test]
    fn test_duplicates_are_merged() {
        let x = [0.0, 1.0, 0.0, 0.0];
        let y = [0.0, 0.0, 1.0, 0.0];
        let z = [10.0, 0.0, 0.0, 30.0];
        let t = Triangulation::build(&x, &y, &z).unwrap();
        assert_eq!(t.points().len(), 3);
        assert_eq!(t.values()[0], 20.0);
    }

    #[test]
    fn test_locate_inside_and_outside() {
        let t = Triangulation::build(&[0.0, 10.0, 0.0], &[0.0, 0.0, 10.0], &[0.0; 3]).unwrap();
        let loc = t.locate(2.0, 2.0).unwrap();
        let sum: f64 = loc.weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(t.locate(9.0, 9.0).is_none());
        // Vertices and edges count as inside.
        assert!(t.locate(0.0, 0.0).is_some());
        assert!(t.locate(5.0, 5.0).is_some());
    }
}
