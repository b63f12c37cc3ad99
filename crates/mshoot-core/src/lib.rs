//! # mshoot core
//!
//! Shared building blocks for the mshoot multiple-shooting SQP solver.
//!
//! This crate defines the collaborator interfaces the solver talks to
//! (system dynamics, cost functions, constraints, warm-start heuristics)
//! together with the numerics both sides exchange: local linear and
//! quadratic approximations, dynamics discretizers with exact
//! sensitivities, trajectory interpolation, the relaxed barrier penalty,
//! and the time-parameterized controllers the solver emits.
//!
//! ## Modules
//!
//! - [`approximation`]: first- and second-order local model value types
//! - [`dynamics`]: continuous-time system interface + linear reference model
//! - [`cost`]: cost function interface + quadratic reference cost
//! - [`constraint`]: equality/inequality constraint interface
//! - [`integrator`]: Euler/RK2/RK4 discretizers and their sensitivities
//! - [`interpolation`]: linear interpolation over sampled trajectories
//! - [`trajectory`]: mode schedules, reference signals, warm-start heuristics
//! - [`penalty`]: relaxed logarithmic barrier for inequality constraints
//! - [`controller`]: feedforward and affine state-feedback policies

pub mod approximation;
pub mod constraint;
pub mod controller;
pub mod cost;
pub mod dynamics;
pub mod integrator;
pub mod interpolation;
pub mod penalty;
pub mod trajectory;

pub use approximation::{LinearApproximation, QuadraticApproximation};
pub use constraint::Constraint;
pub use controller::Controller;
pub use cost::CostFunction;
pub use dynamics::SystemDynamics;
pub use integrator::IntegratorType;
pub use trajectory::{DesiredTrajectories, ModeSchedule, OperatingTrajectories};
