//! Per-node linear-quadratic transcription
//!
//! Each shooting interval is turned into the blocks of the QP
//! subproblem: the discretized affine dynamics (with the multiple
//! shooting defect as bias), the quadratized stage cost, and the
//! constraint representation. With projection enabled the state-input
//! equality is eliminated by a null-space reparameterization of the
//! input, and the cost and dynamics blocks are expressed in the reduced
//! input. The performance-only variants re-evaluate the same quantities
//! without derivatives for the line-search.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use mshoot_core::approximation::{LinearApproximation, QuadraticApproximation};
use mshoot_core::constraint::Constraint;
use mshoot_core::cost::CostFunction;
use mshoot_core::dynamics::SystemDynamics;
use mshoot_core::integrator::{discretize, discretize_sensitivity, IntegratorType};
use mshoot_core::penalty::RelaxedBarrierPenalty;
use mshoot_core::trajectory::DesiredTrajectories;

use crate::performance::PerformanceIndex;

/// Transcription failures, fatal for the current solve.
#[derive(Debug, Clone, Error)]
pub enum TranscriptionError {
    /// The state-input equality jacobian in the input lost row rank, so
    /// no null-space parameterization exists.
    #[error("state-input equality jacobian is rank deficient at node {node} (t = {time})")]
    RankDeficientConstraint { node: usize, time: f64 },
}

/// Per-region evaluation context shared by all nodes.
pub struct NodeContext<'a> {
    /// Integration scheme for the shooting intervals.
    pub integrator: IntegratorType,
    /// Whether state-input equalities are projected out.
    pub project: bool,
    /// Relaxed barrier, if configured.
    pub penalty: Option<&'a RelaxedBarrierPenalty>,
    /// Reference signals for the cost.
    pub desired: &'a DesiredTrajectories,
}

/// QP blocks of one intermediate node.
#[derive(Debug, Clone)]
pub struct Transcription {
    /// Discretized dynamics; `f` holds the shooting defect.
    pub dynamics: LinearApproximation,
    /// Quadratized stage cost, already weighted by the interval length.
    pub cost: QuadraticApproximation,
    /// Projection map (projected mode) or raw equality block, when a
    /// constraint collaborator is present.
    pub constraints: Option<LinearApproximation>,
    /// Number of inequality rows evaluated at this node.
    pub num_ineq: usize,
    /// Local contribution to the performance index.
    pub performance: PerformanceIndex,
}

/// QP blocks of the terminal node.
#[derive(Debug, Clone)]
pub struct TerminalTranscription {
    /// Quadratized terminal cost (state only).
    pub cost: QuadraticApproximation,
    /// Raw terminal state-equality block, when a constraint collaborator
    /// is present.
    pub constraints: Option<LinearApproximation>,
    /// Local contribution to the performance index.
    pub performance: PerformanceIndex,
}

/// Transcribe one intermediate node.
#[allow(clippy::too_many_arguments)]
pub fn setup_intermediate_node(
    dynamics: &mut dyn SystemDynamics,
    cost_fn: &mut dyn CostFunction,
    mut constraint: Option<&mut (dyn Constraint + '_)>,
    ctx: &NodeContext<'_>,
    node: usize,
    t: f64,
    dt: f64,
    x: &DVector<f64>,
    x_next: &DVector<f64>,
    u: &DVector<f64>,
) -> Result<Transcription, TranscriptionError> {
    let mut performance = PerformanceIndex::default();

    // Dynamics: integrate over the interval, defect closes the gap to
    // the next shooting state.
    let step = discretize_sensitivity(dynamics, ctx.integrator, t, dt, x, u);
    let defect = &step.x_next - x_next;
    performance.state_eq_constraint_ise += defect.norm_squared();
    let mut dynamics_block = LinearApproximation {
        f: defect,
        dfdx: step.a,
        dfdu: step.b,
    };

    // Stage cost, weighted by the interval length.
    let mut cost = cost_fn.stage_quadratic(t, x, u, ctx.desired);
    cost.scale(dt);
    performance.total_cost += cost.f;

    let mut constraints = None;
    let mut num_ineq = 0;
    if let Some(constraint) = constraint.as_deref_mut() {
        // Inequalities first: the penalty model is folded in the full
        // input space, before any projection.
        let ineq = constraint.inequality_linearized(t, x, u);
        num_ineq = ineq.rows();
        performance.inequality_constraint_ise +=
            ineq.f.iter().map(|&h| h.min(0.0).powi(2)).sum::<f64>();
        if let Some(penalty) = ctx.penalty {
            let mut model = penalty.quadratic_model(&ineq);
            model.scale(dt);
            performance.inequality_constraint_penalty += model.f;
            cost.add_assign(&model);
        }

        let equality = constraint.state_input_equality_linearized(t, x, u);
        performance.state_input_eq_constraint_ise += equality.f.norm_squared();
        if ctx.project {
            let projection = project_equality(&equality, node, t)?;
            cost = project_cost(&cost, &projection);
            dynamics_block = project_dynamics(&dynamics_block, &projection);
            constraints = Some(projection);
        } else {
            constraints = Some(equality);
        }
    }

    Ok(Transcription {
        dynamics: dynamics_block,
        cost,
        constraints,
        num_ineq,
        performance,
    })
}

/// Transcribe the terminal node.
pub fn setup_terminal_node(
    cost_fn: &mut dyn CostFunction,
    mut constraint: Option<&mut (dyn Constraint + '_)>,
    desired: &DesiredTrajectories,
    t: f64,
    x: &DVector<f64>,
) -> TerminalTranscription {
    let mut performance = PerformanceIndex::default();

    let cost = cost_fn.terminal_quadratic(t, x, desired);
    performance.total_cost += cost.f;

    let constraints = constraint.as_deref_mut().map(|constraint| {
        let equality = constraint.terminal_state_equality_linearized(t, x);
        performance.state_eq_constraint_ise += equality.f.norm_squared();
        equality
    });

    TerminalTranscription {
        cost,
        constraints,
        performance,
    }
}

/// Evaluate one intermediate node without derivatives.
#[allow(clippy::too_many_arguments)]
pub fn compute_intermediate_performance(
    dynamics: &mut dyn SystemDynamics,
    cost_fn: &mut dyn CostFunction,
    mut constraint: Option<&mut (dyn Constraint + '_)>,
    ctx: &NodeContext<'_>,
    t: f64,
    dt: f64,
    x: &DVector<f64>,
    x_next: &DVector<f64>,
    u: &DVector<f64>,
) -> PerformanceIndex {
    let mut performance = PerformanceIndex::default();

    let x_pred = discretize(dynamics, ctx.integrator, t, dt, x, u);
    performance.state_eq_constraint_ise += (x_pred - x_next).norm_squared();
    performance.total_cost += dt * cost_fn.stage_cost(t, x, u, ctx.desired);

    if let Some(constraint) = constraint.as_deref_mut() {
        let equality = constraint.state_input_equality(t, x, u);
        performance.state_input_eq_constraint_ise += equality.norm_squared();

        let ineq = constraint.inequality(t, x, u);
        performance.inequality_constraint_ise +=
            ineq.iter().map(|&h| h.min(0.0).powi(2)).sum::<f64>();
        if let Some(penalty) = ctx.penalty {
            performance.inequality_constraint_penalty += dt * penalty.total(&ineq);
        }
    }

    performance
}

/// Evaluate the terminal node without derivatives.
pub fn compute_terminal_performance(
    cost_fn: &mut dyn CostFunction,
    mut constraint: Option<&mut (dyn Constraint + '_)>,
    desired: &DesiredTrajectories,
    t: f64,
    x: &DVector<f64>,
) -> PerformanceIndex {
    let mut performance = PerformanceIndex::default();
    performance.total_cost += cost_fn.terminal_cost(t, x, desired);
    if let Some(constraint) = constraint.as_deref_mut() {
        performance.state_eq_constraint_ise +=
            constraint.terminal_state_equality(t, x).norm_squared();
    }
    performance
}

/// Null-space parameterization of `e + C_x·δx + C_u·δu = 0`.
///
/// Returns the affine map `δu = f + dfdx·δx + dfdu·δũ` with `dfdu` an
/// orthonormal basis of ker(C_u). Requires C_u to have full row rank.
pub fn project_equality(
    equality: &LinearApproximation,
    node: usize,
    time: f64,
) -> Result<LinearApproximation, TranscriptionError> {
    let m = equality.rows();
    let nx = equality.dfdx.ncols();
    let nu = equality.dfdu.ncols();

    if m == 0 {
        // Nothing to eliminate, the reduced input is the full input.
        return Ok(LinearApproximation {
            f: DVector::zeros(nu),
            dfdx: DMatrix::zeros(nu, nx),
            dfdu: DMatrix::identity(nu, nu),
        });
    }
    if m > nu {
        return Err(TranscriptionError::RankDeficientConstraint { node, time });
    }

    // QR of C_uᵀ padded to a square matrix: the first m columns of Q span
    // range(C_uᵀ), the remaining nu - m columns span ker(C_u).
    let mut padded = DMatrix::zeros(nu, nu);
    padded
        .view_mut((0, 0), (nu, m))
        .copy_from(&equality.dfdu.transpose());
    let qr = padded.qr();
    let q = qr.q();
    let r = qr.r();

    let r1 = r.view((0, 0), (m, m)).into_owned();
    let max_diag = (0..m).map(|i| r1[(i, i)].abs()).fold(0.0, f64::max);
    let tol = f64::EPSILON.sqrt() * max_diag.max(1.0);
    if (0..m).any(|i| r1[(i, i)].abs() < tol) {
        return Err(TranscriptionError::RankDeficientConstraint { node, time });
    }

    let q1 = q.view((0, 0), (nu, m)).into_owned();
    let q2 = q.view((0, m), (nu, nu - m)).into_owned();

    // C_u = R1ᵀ Q1ᵀ, so the particular solution is -Q1 R1⁻ᵀ (e + C_x δx).
    let r1_t = r1.transpose();
    let ye = r1_t
        .solve_lower_triangular(&equality.f)
        .expect("triangular solve after rank check");
    let yx = r1_t
        .solve_lower_triangular(&equality.dfdx)
        .expect("triangular solve after rank check");

    Ok(LinearApproximation {
        f: -(&q1 * ye),
        dfdx: -(&q1 * yx),
        dfdu: q2,
    })
}

/// Express a quadratic cost in the reduced input of a projection map.
fn project_cost(
    cost: &QuadraticApproximation,
    projection: &LinearApproximation,
) -> QuadraticApproximation {
    let w = &projection.f;
    let px = &projection.dfdx;
    let pu = &projection.dfdu;

    let huu_w = &cost.dfduu * w;
    let gu_huu_w = &cost.dfdu + &huu_w;
    let hux_huu_px = &cost.dfdux + &cost.dfduu * px;

    QuadraticApproximation {
        f: cost.f + cost.dfdu.dot(w) + 0.5 * w.dot(&huu_w),
        dfdx: &cost.dfdx + px.transpose() * &gu_huu_w + cost.dfdux.transpose() * w,
        dfdu: pu.transpose() * gu_huu_w,
        dfdxx: &cost.dfdxx
            + px.transpose() * &cost.dfdux
            + cost.dfdux.transpose() * px
            + px.transpose() * &cost.dfduu * px,
        dfdux: pu.transpose() * &hux_huu_px,
        dfduu: pu.transpose() * &cost.dfduu * pu,
    }
}

/// Express discretized dynamics in the reduced input of a projection map.
fn project_dynamics(
    dynamics: &LinearApproximation,
    projection: &LinearApproximation,
) -> LinearApproximation {
    LinearApproximation {
        f: &dynamics.f + &dynamics.dfdu * &projection.f,
        dfdx: &dynamics.dfdx + &dynamics.dfdu * &projection.dfdx,
        dfdu: &dynamics.dfdu * &projection.dfdu,
    }
}
