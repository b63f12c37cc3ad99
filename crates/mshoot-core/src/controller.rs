//! Time-parameterized control policies
//!
//! The solver emits either a pure feedforward policy (piecewise-linear
//! interpolation of the optimized input trajectory) or an affine state
//! feedback u(t, x) = u_ff(t) + K(t)·x recovered from the Riccati
//! recursion of the final QP. Sampling at a grid instant reproduces the
//! stored sample exactly.

use nalgebra::{DMatrix, DVector};

use crate::interpolation;

/// Feedforward policy: piecewise-linear in time.
#[derive(Debug, Clone)]
pub struct FeedforwardController {
    /// Sample instants.
    pub times: Vec<f64>,
    /// Input samples aligned with `times`.
    pub inputs: Vec<DVector<f64>>,
}

impl FeedforwardController {
    /// Create the policy from aligned samples.
    ///
    /// # Panics
    /// Panics if the sample counts disagree or are empty.
    pub fn new(times: Vec<f64>, inputs: Vec<DVector<f64>>) -> Self {
        assert!(!times.is_empty(), "controller needs at least one sample");
        assert_eq!(times.len(), inputs.len(), "time and input sample counts differ");
        Self { times, inputs }
    }

    /// Input at time `t`, clamped to the sampled range.
    pub fn input_at(&self, t: f64) -> DVector<f64> {
        interpolation::interpolate_vector(t, &self.times, &self.inputs)
    }
}

/// Affine feedback policy u(t, x) = u_ff(t) + K(t)·x.
#[derive(Debug, Clone)]
pub struct LinearController {
    /// Sample instants.
    pub times: Vec<f64>,
    /// Feedforward samples aligned with `times`.
    pub uff: Vec<DVector<f64>>,
    /// Gain samples aligned with `times`.
    pub gains: Vec<DMatrix<f64>>,
}

impl LinearController {
    /// Create the policy from aligned samples.
    ///
    /// # Panics
    /// Panics if the sample counts disagree or are empty.
    pub fn new(times: Vec<f64>, uff: Vec<DVector<f64>>, gains: Vec<DMatrix<f64>>) -> Self {
        assert!(!times.is_empty(), "controller needs at least one sample");
        assert_eq!(times.len(), uff.len(), "time and feedforward sample counts differ");
        assert_eq!(times.len(), gains.len(), "time and gain sample counts differ");
        Self { times, uff, gains }
    }

    /// Input at time `t` for state `x`.
    pub fn input_at(&self, t: f64, x: &DVector<f64>) -> DVector<f64> {
        let uff = interpolation::interpolate_vector(t, &self.times, &self.uff);
        let gain = interpolation::interpolate_matrix(t, &self.times, &self.gains);
        uff + gain * x
    }
}

/// Control policy emitted with a primal solution.
#[derive(Debug, Clone)]
pub enum Controller {
    /// Open-loop policy, ignores the state argument.
    Feedforward(FeedforwardController),
    /// Affine state feedback.
    Linear(LinearController),
}

impl Controller {
    /// Input at time `t` for state `x`.
    pub fn input_at(&self, t: f64, x: &DVector<f64>) -> DVector<f64> {
        match self {
            Controller::Feedforward(c) => c.input_at(t),
            Controller::Linear(c) => c.input_at(t, x),
        }
    }
}
