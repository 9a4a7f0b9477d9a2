//! Catalyst conversion efficiency.
//!
//! Efficiency is the relative drop in concentration across the catalyst,
//! `(1 - downstream / upstream) * 100`, bounded to `[0, 100]`.

use serde::Serialize;

/// Lower bound of the efficiency scale (%).
pub const EFFICIENCY_MIN: f64 = 0.0;
/// Upper bound of the efficiency scale (%).
pub const EFFICIENCY_MAX: f64 = 100.0;

/// Efficiency of a single upstream/downstream pair.
///
/// A non-positive upstream or a negative downstream reading cannot be
/// measured against and yields `0` rather than an error; NaN readings fail
/// both comparisons and also yield `0`.
#[inline]
pub fn efficiency(upstream: f64, downstream: f64) -> f64 {
    if upstream > 0.0 && downstream >= 0.0 {
        ((1.0 - downstream / upstream) * 100.0).clamp(EFFICIENCY_MIN, EFFICIENCY_MAX)
    } else {
        0.0
    }
}

/// Element-wise [`efficiency`] over two concentration sequences.
///
/// The output has the length of the shorter input.
pub fn compute_efficiency(upstream: &[f64], downstream: &[f64]) -> Vec<f64> {
    upstream
        .iter()
        .zip(downstream)
        .map(|(&up, &down)| efficiency(up, down))
        .collect()
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Mean / min / max of an efficiency series, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EfficiencyStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl EfficiencyStats {
    /// Summarize a series. An empty series reports zeros.
    pub fn from_series(values: &[f64]) -> Self {
        if values.is_empty() {
            return EfficiencyStats::default();
        }

        let (sum, min, max) = values.iter().fold(
            (0.0, f64::INFINITY, f64::NEG_INFINITY),
            |(sum, min, max), &v| (sum + v, min.min(v), max.max(v)),
        );

        EfficiencyStats {
            count: values.len(),
            mean: sum / values.len() as f64,
            min,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_efficiency_reference_values() {
        assert_eq!(efficiency(100.0, 0.0), 100.0);
        assert_eq!(efficiency(100.0, 100.0), 0.0);
        assert_eq!(efficiency(100.0, 20.0), 80.0);
    }

    #[test]
    fn test_downstream_above_upstream_clamps_to_zero() {
        assert_eq!(efficiency(100.0, 150.0), 0.0);
    }

    #[test]
    fn test_invalid_inputs_yield_zero() {
        assert_eq!(efficiency(0.0, 10.0), 0.0);
        assert_eq!(efficiency(0.0, 0.0), 0.0);
        assert_eq!(efficiency(-5.0, 1.0), 0.0);
        // Negative downstream disqualifies the sample, even though the
        // unclamped ratio would exceed 100.
        assert_eq!(efficiency(100.0, -1.0), 0.0);
        assert_eq!(efficiency(-100.0, -1.0), 0.0);
        assert_eq!(efficiency(f64::NAN, 1.0), 0.0);
        assert_eq!(efficiency(1.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_compute_efficiency_truncates_to_shorter() {
        assert_eq!(compute_efficiency(&[100.0, 100.0], &[20.0]), vec![80.0]);
        assert_eq!(compute_efficiency(&[100.0], &[20.0, 50.0]), vec![80.0]);
        assert!(compute_efficiency(&[], &[1.0]).is_empty());
    }

    #[test]
    fn test_compute_efficiency_sequence() {
        let up = [100.0, 100.0, 0.0];
        let down = [20.0, 50.0, 10.0];
        assert_eq!(compute_efficiency(&up, &down), vec![80.0, 50.0, 0.0]);
        assert!(compute_efficiency(&[], &[]).is_empty());
    }

    #[test]
    fn test_stats() {
        let stats = EfficiencyStats::from_series(&[80.0, 50.0, 0.0, 90.0]);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 55.0).abs() < 1e-12);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 90.0);

        assert_eq!(EfficiencyStats::from_series(&[]), EfficiencyStats::default());
    }
}
