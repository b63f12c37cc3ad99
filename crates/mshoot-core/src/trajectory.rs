//! Mode schedules, reference signals, and warm-start heuristics
//!
//! A [`ModeSchedule`] lists the horizon instants at which the dynamics
//! switch between discrete modes; the solver duplicates grid points at
//! those instants. [`DesiredTrajectories`] carries the reference signals
//! the cost function tracks. [`OperatingTrajectories`] is the optional
//! collaborator consulted when no previous solution covers a grid point.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::interpolation;

/// Sequence of dynamics modes separated by event times.
///
/// `mode_sequence` has exactly one more entry than `event_times`:
/// mode `mode_sequence[k]` is active on `(event_times[k-1], event_times[k])`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeSchedule {
    /// Strictly increasing switching instants.
    pub event_times: Vec<f64>,
    /// Active mode per inter-event segment.
    pub mode_sequence: Vec<usize>,
}

impl Default for ModeSchedule {
    fn default() -> Self {
        Self {
            event_times: Vec::new(),
            mode_sequence: vec![0],
        }
    }
}

impl ModeSchedule {
    /// Create a schedule from event times and per-segment modes.
    ///
    /// # Panics
    /// Panics unless `mode_sequence.len() == event_times.len() + 1`.
    pub fn new(event_times: Vec<f64>, mode_sequence: Vec<usize>) -> Self {
        assert_eq!(
            mode_sequence.len(),
            event_times.len() + 1,
            "mode sequence needs one entry per inter-event segment"
        );
        Self {
            event_times,
            mode_sequence,
        }
    }

    /// Active mode at time `t`. Event instants belong to the following mode.
    pub fn mode_at(&self, t: f64) -> usize {
        let segment = self.event_times.partition_point(|&e| e <= t);
        self.mode_sequence[segment]
    }
}

/// Reference signals tracked by the cost function.
///
/// Empty trajectories mean "track the origin"; cost implementations fall
/// back to zero references in that case.
#[derive(Debug, Clone, Default)]
pub struct DesiredTrajectories {
    /// Sample instants, non-decreasing.
    pub times: Vec<f64>,
    /// Desired states, aligned with `times`.
    pub states: Vec<DVector<f64>>,
    /// Desired inputs, aligned with `times`.
    pub inputs: Vec<DVector<f64>>,
}

impl DesiredTrajectories {
    /// A single sample held constant over the whole horizon.
    pub fn constant(state: DVector<f64>, input: DVector<f64>) -> Self {
        Self {
            times: vec![0.0],
            states: vec![state],
            inputs: vec![input],
        }
    }

    /// Whether any reference samples are available.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Interpolated desired state at `t`, if any samples exist.
    pub fn desired_state(&self, t: f64) -> Option<DVector<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(interpolation::interpolate_vector(t, &self.times, &self.states))
    }

    /// Interpolated desired input at `t`, if any samples exist.
    pub fn desired_input(&self, t: f64) -> Option<DVector<f64>> {
        if self.is_empty() {
            return None;
        }
        Some(interpolation::interpolate_vector(t, &self.times, &self.inputs))
    }
}

/// Warm-start heuristic consulted for grid points the previous solution
/// does not cover.
pub trait OperatingTrajectories: Send {
    /// Heuristic (state, input) pair over `[start, end]` given the
    /// current state estimate at `start`.
    fn operating_point(
        &mut self,
        state: &DVector<f64>,
        start: f64,
        end: f64,
    ) -> (DVector<f64>, DVector<f64>);

    /// Independent copy for a worker thread.
    fn clone_box(&self) -> Box<dyn OperatingTrajectories>;
}

impl Clone for Box<dyn OperatingTrajectories> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mode_lookup_follows_event_times() {
        let schedule = ModeSchedule::new(vec![1.0, 2.0], vec![0, 3, 1]);
        assert_eq!(schedule.mode_at(0.5), 0);
        assert_eq!(schedule.mode_at(1.0), 3);
        assert_eq!(schedule.mode_at(1.5), 3);
        assert_eq!(schedule.mode_at(2.5), 1);
    }

    #[test]
    fn default_schedule_is_single_mode() {
        let schedule = ModeSchedule::default();
        assert_eq!(schedule.mode_at(-10.0), 0);
        assert_eq!(schedule.mode_at(10.0), 0);
    }

    #[test]
    fn desired_trajectories_interpolate_between_samples() {
        let desired = DesiredTrajectories {
            times: vec![0.0, 1.0],
            states: vec![
                DVector::from_vec(vec![0.0]),
                DVector::from_vec(vec![2.0]),
            ],
            inputs: vec![
                DVector::from_vec(vec![1.0]),
                DVector::from_vec(vec![1.0]),
            ],
        };
        let state = desired.desired_state(0.25).unwrap();
        assert_relative_eq!(state[0], 0.5);
        let input = desired.desired_input(0.25).unwrap();
        assert_relative_eq!(input[0], 1.0);
    }

    #[test]
    fn empty_desired_trajectories_yield_none() {
        let desired = DesiredTrajectories::default();
        assert!(desired.desired_state(0.0).is_none());
        assert!(desired.desired_input(0.0).is_none());
    }
}
