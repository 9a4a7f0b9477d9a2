//! Clough–Tocher 2D interpolant.
//!
//! C1-continuous piecewise cubic interpolation on a Delaunay triangulation.
//! Each triangle is split at its centroid into three cubic Bézier patches;
//! the control net is fixed by the vertex values, the vertex gradients and
//! the requirement that the cross-edge derivative be linear along every
//! outer edge, which makes neighbouring triangles join with C1 continuity.
//!
//! All geometry is evaluated in the triangulation's normalized coordinates.

use super::triangulation::{Location, Triangulation};

type Vec2 = [f64; 2];

#[inline]
fn sub(a: Vec2, b: Vec2) -> Vec2 {
    [a[0] - b[0], a[1] - b[1]]
}

#[inline]
fn dot(a: Vec2, b: Vec2) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

/// Bézier control net of one triangle.
#[derive(Debug, Clone, Copy)]
struct Element {
    /// Vertex values.
    f: [f64; 3],
    /// `edge[i][j]`: edge coefficient next to vertex `i`, toward vertex `j`.
    edge: [[f64; 3]; 3],
    /// Coefficient next to vertex `i`, toward the centroid.
    toward_center: [f64; 3],
    /// `mid[e]`: inner coefficient of outer edge `(e, e+1)`.
    mid: [f64; 3],
    /// Coefficient on the segment vertex `i` → centroid, next to the centroid.
    inner: [f64; 3],
    /// Value at the centroid.
    center: f64,
}

impl Element {
    fn new(p: [Vec2; 3], f: [f64; 3], g: [Vec2; 3]) -> Self {
        let c = [
            (p[0][0] + p[1][0] + p[2][0]) / 3.0,
            (p[0][1] + p[1][1] + p[2][1]) / 3.0,
        ];

        let mut edge = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    edge[i][j] = f[i] + dot(g[i], sub(p[j], p[i])) / 3.0;
                }
            }
        }

        let toward_center: [f64; 3] =
            std::array::from_fn(|i| f[i] + dot(g[i], sub(c, p[i])) / 3.0);

        let mid: [f64; 3] = std::array::from_fn(|e| {
            let (i, j) = (e, (e + 1) % 3);
            let t = sub(p[j], p[i]);
            let m = [(p[i][0] + p[j][0]) / 2.0, (p[i][1] + p[j][1]) / 2.0];
            let d = sub(c, m);
            // Split the edge-to-centroid direction into its tangential part
            // and the part normal to the edge.
            let tau = dot(d, t) / dot(t, t);
            let normal = [d[0] - tau * t[0], d[1] - tau * t[1]];
            let g_sum = [g[i][0] + g[j][0], g[i][1] + g[j][1]];

            (edge[i][j] + edge[j][i]) / 2.0
                + dot(g_sum, normal) / 6.0
                + tau * (edge[j][i] - edge[i][j])
        });

        let inner: [f64; 3] = std::array::from_fn(|i| {
            let next = i;
            let prev = (i + 2) % 3;
            (toward_center[i] + mid[next] + mid[prev]) / 3.0
        });

        let center = (inner[0] + inner[1] + inner[2]) / 3.0;

        Element {
            f,
            edge,
            toward_center,
            mid,
            inner,
            center,
        }
    }

    /// Evaluate at barycentric weights `b` of the full triangle.
    fn evaluate(&self, b: [f64; 3]) -> f64 {
        // The sub-triangle holding the point is the one opposite the
        // smallest weight.
        let k = (0..3)
            .min_by(|&u, &v| b[u].total_cmp(&b[v]))
            .unwrap_or(0);
        let i = (k + 1) % 3;
        let j = (k + 2) % 3;

        let bi = b[i] - b[k];
        let bj = b[j] - b[k];
        let bc = 3.0 * b[k];

        self.f[i] * bi.powi(3)
            + self.f[j] * bj.powi(3)
            + self.center * bc.powi(3)
            + 3.0 * self.edge[i][j] * bi * bi * bj
            + 3.0 * self.edge[j][i] * bi * bj * bj
            + 3.0 * self.toward_center[i] * bi * bi * bc
            + 3.0 * self.toward_center[j] * bj * bj * bc
            + 3.0 * self.inner[i] * bi * bc * bc
            + 3.0 * self.inner[j] * bj * bc * bc
            + 6.0 * self.mid[i] * bi * bj * bc
    }
}

/// A fitted Clough–Tocher interpolant.
#[derive(Debug, Clone)]
pub struct CloughTocher<'a> {
    triangulation: &'a Triangulation,
    elements: Vec<Element>,
}

impl<'a> CloughTocher<'a> {
    /// Fit the interpolant to the triangulation's vertex values.
    pub fn fit(triangulation: &'a Triangulation) -> Self {
        let gradients = estimate_gradients(triangulation);
        let pts = triangulation.unit_points();
        let vals = triangulation.values();

        let elements = triangulation
            .triangles()
            .iter()
            .map(|tri| {
                Element::new(
                    tri.map(|v| pts[v]),
                    tri.map(|v| vals[v]),
                    tri.map(|v| gradients[v]),
                )
            })
            .collect();

        CloughTocher {
            triangulation,
            elements,
        }
    }

    /// Value at `(x, y)` in data coordinates; `None` outside the hull.
    pub fn evaluate(&self, x: f64, y: f64) -> Option<f64> {
        self.triangulation
            .locate(x, y)
            .map(|loc| self.evaluate_at(loc))
    }

    fn evaluate_at(&self, loc: Location) -> f64 {
        self.elements[loc.triangle].evaluate(loc.weights)
    }
}

/// Per-vertex gradient by inverse-square-distance weighted least squares
/// over the vertex's triangulation neighbours.
fn estimate_gradients(triangulation: &Triangulation) -> Vec<Vec2> {
    let pts = triangulation.unit_points();
    let vals = triangulation.values();

    triangulation
        .neighbors()
        .iter()
        .enumerate()
        .map(|(i, nbrs)| {
            let (mut sxx, mut sxy, mut syy, mut sxf, mut syf) = (0.0, 0.0, 0.0, 0.0, 0.0);
            for &k in nbrs {
                let d = sub(pts[k], pts[i]);
                let df = vals[k] - vals[i];
                let r2 = dot(d, d);
                if r2 == 0.0 {
                    continue;
                }
                let w = 1.0 / r2;
                sxx += w * d[0] * d[0];
                sxy += w * d[0] * d[1];
                syy += w * d[1] * d[1];
                sxf += w * d[0] * df;
                syf += w * d[1] * df;
            }

            let det = sxx * syy - sxy * sxy;
            if det.abs() <= 1e-12 * (sxx * syy).abs().max(f64::MIN_POSITIVE) {
                return [0.0, 0.0];
            }
            [(syy * sxf - sxy * syf) / det, (sxx * syf - sxy * sxf) / det]
        })
        .collect()
}
