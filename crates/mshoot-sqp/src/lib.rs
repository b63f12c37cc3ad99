//! # mshoot SQP solver
//!
//! Sequential Quadratic Programming solver for finite-horizon optimal
//! control problems transcribed by multiple shooting. Each solve builds
//! a shooting grid honoring the mode schedule's event times, linearizes
//! every interval in parallel, solves the structured QP subproblem, and
//! accepts steps through a filter line-search until convergence. The
//! result is a state-input trajectory plus a time-varying controller,
//! either feedforward or affine feedback from the Riccati recursion of
//! the last QP.
//!
//! Designed as the workhorse of an MPC loop: construct one
//! [`SqpSolver`] per problem and call [`SqpSolver::solve`] with a fresh
//! initial state every receding-horizon tick; the previous solution
//! warm-starts the next one.
//!
//! ## Modules
//!
//! - [`config`]: solver settings and validation
//! - [`time_grid`]: shooting-grid construction with event splitting
//! - [`pool`]: node-level worker pool
//! - [`transcription`]: per-node linear-quadratic approximation
//! - [`ocp_qp`]: structured QP back-end (Riccati / cone solver)
//! - [`linesearch`]: filter acceptance rule
//! - [`performance`]: cost and constraint-violation bookkeeping
//! - [`solver`]: the SQP driver
//! - [`solution`]: primal solution container

pub mod config;
pub mod linesearch;
pub mod ocp_qp;
pub mod performance;
pub mod pool;
pub mod solution;
pub mod solver;
pub mod time_grid;
pub mod timing;
pub mod transcription;

pub use config::{Settings, SettingsError};
pub use ocp_qp::{OcpSize, QpError};
pub use performance::PerformanceIndex;
pub use solution::PrimalSolution;
pub use solver::{SqpError, SqpSolver};
pub use time_grid::time_discretization_with_events;
