//! Shooting-grid construction
//!
//! Builds the time grid the horizon is shot over. Every dynamics event
//! strictly inside the horizon appears twice, separated by a small gap:
//! once closing the interval before the switch and once opening the
//! interval after it. Between anchors the grid is spaced uniformly at
//! approximately the nominal step, so a nominal sample close to an
//! event is absorbed by the event itself rather than straddling it.

/// Gap inserted between the two copies of a duplicated event time.
pub const EVENT_TIME_EPS: f64 = 1e-6;

/// Build the shooting grid over `[t0, tf]`.
///
/// `event_times` must be sorted ascending. Events within `eps` of either
/// horizon boundary are not duplicated.
///
/// # Panics
/// Panics unless `tf > t0` and `dt > 0`.
pub fn time_discretization_with_events(
    t0: f64,
    tf: f64,
    dt: f64,
    event_times: &[f64],
    eps: f64,
) -> Vec<f64> {
    assert!(tf > t0, "horizon must have positive length");
    assert!(dt > 0.0, "nominal step must be positive");
    debug_assert!(
        event_times.windows(2).all(|w| w[0] <= w[1]),
        "event times must be sorted"
    );

    let mut grid = vec![t0];
    let mut segment_start = t0;
    for &event in event_times {
        if event <= t0 + eps || event >= tf - eps {
            continue;
        }
        push_uniform(&mut grid, segment_start, event, dt);
        grid.push(event + eps);
        segment_start = event + eps;
    }
    push_uniform(&mut grid, segment_start, tf, dt);
    grid
}

/// Append a uniform subdivision of `(start, end]` at roughly `dt` spacing.
fn push_uniform(grid: &mut Vec<f64>, start: f64, end: f64, dt: f64) {
    let n = (((end - start) / dt).round() as usize).max(1);
    let step = (end - start) / n as f64;
    for k in 1..n {
        grid.push(start + k as f64 * step);
    }
    grid.push(end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn contains(grid: &[f64], t: f64) -> bool {
        grid.iter().any(|&s| (s - t).abs() < 1e-12)
    }

    #[test]
    fn grid_spans_the_horizon_uniformly() {
        let grid = time_discretization_with_events(0.0, 1.0, 0.1, &[], EVENT_TIME_EPS);
        assert_eq!(grid.len(), 11);
        assert_relative_eq!(grid[0], 0.0);
        assert_relative_eq!(*grid.last().unwrap(), 1.0);
        for w in grid.windows(2) {
            assert_relative_eq!(w[1] - w[0], 0.1, epsilon = 1e-12);
        }
    }

    #[test]
    fn events_are_duplicated_with_gap() {
        let eps = EVENT_TIME_EPS;
        let grid = time_discretization_with_events(0.0, 1.0, 0.1, &[0.25, 0.5], eps);

        for event in [0.25, 0.5] {
            assert!(contains(&grid, event), "missing event {event}");
            assert!(contains(&grid, event + eps), "missing reopened event {event}");
            // Exactly one adjacent pair (e, e + eps).
            let pairs = grid
                .windows(2)
                .filter(|w| (w[0] - event).abs() < 1e-12 && (w[1] - (event + eps)).abs() < 1e-12)
                .count();
            assert_eq!(pairs, 1);
        }
    }

    #[test]
    fn grid_is_strictly_increasing() {
        let grid =
            time_discretization_with_events(0.0, 1.0, 0.1, &[0.25, 0.5], EVENT_TIME_EPS);
        for w in grid.windows(2) {
            assert!(w[1] > w[0]);
        }
    }

    #[test]
    fn boundary_events_are_not_duplicated() {
        let eps = EVENT_TIME_EPS;
        let grid = time_discretization_with_events(0.0, 1.0, 0.1, &[0.0, 1.0], eps);
        assert_eq!(grid.len(), 11);
        assert!(!contains(&grid, eps));
    }

    #[test]
    fn event_close_to_nominal_sample_absorbs_it() {
        // An event just off the 0.3 nominal sample: the segment up to the
        // event is re-spaced so no sample straddles the switch.
        let eps = EVENT_TIME_EPS;
        let event = 0.3 + 0.2 * eps;
        let grid = time_discretization_with_events(0.0, 1.0, 0.1, &[event], eps);
        assert!(contains(&grid, event));
        assert!(contains(&grid, event + eps));
        let near_but_not_event = grid
            .iter()
            .any(|&s| (s - 0.3).abs() < eps && (s - event).abs() > 1e-12 && s < event);
        assert!(!near_but_not_event, "nominal sample straddles the event");
    }

    #[test]
    fn events_outside_the_horizon_are_ignored() {
        let grid =
            time_discretization_with_events(0.0, 1.0, 0.1, &[-0.5, 1.5], EVENT_TIME_EPS);
        assert_eq!(grid.len(), 11);
    }
}
