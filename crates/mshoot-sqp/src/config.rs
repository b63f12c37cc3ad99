//! Solver settings
//!
//! All knobs of the SQP solver in one serde-friendly struct. Defaults
//! are tuned for receding-horizon use: few outer iterations, an RK2
//! discretizer, and a permissive filter.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mshoot_core::integrator::IntegratorType;

/// Rejected settings values.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{name} must lie in ({low}, {high}), got {value}")]
    OutOfRange {
        name: &'static str,
        low: f64,
        high: f64,
        value: f64,
    },
    #[error("g_min must be smaller than g_max ({g_min} >= {g_max})")]
    FilterBandEmpty { g_min: f64, g_max: f64 },
    #[error("{name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: f64 },
    #[error("{name} must be at least one")]
    ZeroCount { name: &'static str },
}

/// SQP solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum number of outer SQP iterations per solve.
    pub sqp_iteration: usize,
    /// Convergence tolerance on the scaled step norm.
    pub delta_tol: f64,
    /// Convergence tolerance on the merit decrease.
    pub cost_tol: f64,

    /// Nominal shooting interval [s].
    pub dt: f64,
    /// Integration scheme for the shooting intervals.
    pub integrator_type: IntegratorType,

    /// Step contraction factor of the line-search.
    pub alpha_decay: f64,
    /// Smallest step size tried before giving up.
    pub alpha_min: f64,
    /// Filter mixing parameter.
    pub gamma_c: f64,
    /// Candidates above this violation are rejected outright.
    pub g_max: f64,
    /// Below this violation only the merit decides.
    pub g_min: f64,

    /// Reparameterize inputs onto the null space of the state-input
    /// equality constraints instead of passing them to the QP.
    pub project_state_input_equality_constraints: bool,
    /// Relaxed-barrier weight; zero disables the penalty.
    pub inequality_constraint_mu: f64,
    /// Relaxed-barrier relaxation threshold.
    pub inequality_constraint_delta: f64,

    /// Emit an affine feedback controller instead of a feedforward one.
    pub controller_feedback: bool,

    /// Number of worker threads; the calling thread counts as one.
    pub n_threads: usize,

    /// Nominal state dimension.
    pub n_state: usize,
    /// Nominal input dimension.
    pub n_input: usize,

    /// Log solver progress per iteration.
    pub print_solver_status: bool,
    /// Log line-search candidates and their acceptance.
    pub print_linesearch: bool,
    /// Log the benchmark report when the solver is dropped.
    pub print_solver_statistics: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sqp_iteration: 10,
            delta_tol: 1e-6,
            cost_tol: 1e-4,
            dt: 0.01,
            integrator_type: IntegratorType::Rk2,
            alpha_decay: 0.5,
            alpha_min: 1e-4,
            gamma_c: 1e-6,
            g_max: 1e6,
            g_min: 1e-6,
            project_state_input_equality_constraints: true,
            inequality_constraint_mu: 0.0,
            inequality_constraint_delta: 1e-6,
            controller_feedback: false,
            n_threads: 4,
            n_state: 0,
            n_input: 0,
            print_solver_status: false,
            print_linesearch: false,
            print_solver_statistics: false,
        }
    }
}

impl Settings {
    /// Check the ranges the line-search and the discretization rely on.
    pub fn validate(&self) -> Result<(), SettingsError> {
        fn open_unit(name: &'static str, value: f64) -> Result<(), SettingsError> {
            if value <= 0.0 || value >= 1.0 {
                return Err(SettingsError::OutOfRange {
                    name,
                    low: 0.0,
                    high: 1.0,
                    value,
                });
            }
            Ok(())
        }

        open_unit("alpha_decay", self.alpha_decay)?;
        open_unit("gamma_c", self.gamma_c)?;
        if self.alpha_min <= 0.0 || self.alpha_min > 1.0 {
            return Err(SettingsError::OutOfRange {
                name: "alpha_min",
                low: 0.0,
                high: 1.0,
                value: self.alpha_min,
            });
        }
        if self.g_min <= 0.0 {
            return Err(SettingsError::NotPositive {
                name: "g_min",
                value: self.g_min,
            });
        }
        if self.g_min >= self.g_max {
            return Err(SettingsError::FilterBandEmpty {
                g_min: self.g_min,
                g_max: self.g_max,
            });
        }
        if self.dt <= 0.0 {
            return Err(SettingsError::NotPositive {
                name: "dt",
                value: self.dt,
            });
        }
        if self.inequality_constraint_mu < 0.0 {
            return Err(SettingsError::NotPositive {
                name: "inequality_constraint_mu",
                value: self.inequality_constraint_mu,
            });
        }
        if self.inequality_constraint_mu > 0.0 && self.inequality_constraint_delta <= 0.0 {
            return Err(SettingsError::NotPositive {
                name: "inequality_constraint_delta",
                value: self.inequality_constraint_delta,
            });
        }
        if self.sqp_iteration == 0 {
            return Err(SettingsError::ZeroCount {
                name: "sqp_iteration",
            });
        }
        if self.n_threads == 0 {
            return Err(SettingsError::ZeroCount { name: "n_threads" });
        }
        Ok(())
    }
}
