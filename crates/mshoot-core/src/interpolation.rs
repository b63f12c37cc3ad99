//! Linear interpolation over sampled trajectories
//!
//! Queries are clamped to the sampled range. Duplicated sample instants
//! (as produced by event splitting in the shooting grid) are handled by
//! always selecting the left-closed interval containing the query.

use nalgebra::{DMatrix, DVector};

/// Index of the interval containing `t` plus the interpolation weight
/// of its right end point.
fn interval(t: f64, times: &[f64]) -> (usize, f64) {
    debug_assert!(!times.is_empty());
    if times.len() == 1 || t <= times[0] {
        return (0, 0.0);
    }
    if t >= times[times.len() - 1] {
        return (times.len() - 2, 1.0);
    }
    // First index with times[k] > t; the interval is [k-1, k].
    let k = times.partition_point(|&s| s <= t);
    let (t0, t1) = (times[k - 1], times[k]);
    let alpha = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
    (k - 1, alpha)
}

/// Linearly interpolate a vector trajectory at `t`, clamped at both ends.
///
/// # Panics
/// Panics if `values` is empty or shorter than `times`.
pub fn interpolate_vector(t: f64, times: &[f64], values: &[DVector<f64>]) -> DVector<f64> {
    assert!(!values.is_empty(), "cannot interpolate an empty trajectory");
    assert!(values.len() >= times.len(), "trajectory shorter than its time grid");
    if times.len() <= 1 {
        return values[0].clone();
    }
    let (k, alpha) = interval(t, times);
    if alpha == 0.0 {
        values[k].clone()
    } else if alpha == 1.0 {
        values[k + 1].clone()
    } else {
        (1.0 - alpha) * &values[k] + alpha * &values[k + 1]
    }
}

/// Linearly interpolate a matrix trajectory at `t`, clamped at both ends.
///
/// # Panics
/// Panics if `values` is empty or shorter than `times`.
pub fn interpolate_matrix(t: f64, times: &[f64], values: &[DMatrix<f64>]) -> DMatrix<f64> {
    assert!(!values.is_empty(), "cannot interpolate an empty trajectory");
    assert!(values.len() >= times.len(), "trajectory shorter than its time grid");
    if times.len() <= 1 {
        return values[0].clone();
    }
    let (k, alpha) = interval(t, times);
    if alpha == 0.0 {
        values[k].clone()
    } else if alpha == 1.0 {
        values[k + 1].clone()
    } else {
        (1.0 - alpha) * &values[k] + alpha * &values[k + 1]
    }
}
