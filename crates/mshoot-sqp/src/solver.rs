//! SQP driver
//!
//! Orchestrates one receding-horizon solve: build the shooting grid,
//! warm-start the trajectories, then iterate transcription, QP solve,
//! and filter line-search until convergence or the iteration budget is
//! spent. The accepted iterate becomes the primal solution, and the
//! controller is recovered from the Riccati feedback of the last QP.

use std::time::Instant;

use nalgebra::DVector;
use thiserror::Error;
use tracing::info;

use mshoot_core::constraint::Constraint;
use mshoot_core::controller::{Controller, FeedforwardController, LinearController};
use mshoot_core::cost::CostFunction;
use mshoot_core::dynamics::SystemDynamics;
use mshoot_core::interpolation;
use mshoot_core::penalty::RelaxedBarrierPenalty;
use mshoot_core::trajectory::{DesiredTrajectories, ModeSchedule, OperatingTrajectories};

use crate::config::{Settings, SettingsError};
use crate::linesearch::FilterLinesearch;
use crate::ocp_qp::{OcpQpSolver, OcpSize, QpError};
use crate::performance::PerformanceIndex;
use crate::pool::{IndexQueue, WorkerPool};
use crate::solution::PrimalSolution;
use crate::time_grid::{time_discretization_with_events, EVENT_TIME_EPS};
use crate::transcription::{
    compute_intermediate_performance, compute_terminal_performance, setup_intermediate_node,
    setup_terminal_node, NodeContext, TerminalTranscription, Transcription, TranscriptionError,
};

use mshoot_core::approximation::{LinearApproximation, QuadraticApproximation};

/// Solver failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum SqpError {
    /// The QP back-end returned a non-success status. The primal
    /// trajectory is left untouched.
    #[error("QP back-end failed: {0}")]
    QpSolveFailure(#[from] QpError),
    /// The iteration log was queried before any solve.
    #[error("no performance log yet, no problem solved yet")]
    EmptyLogQuery,
    /// Transcription failed, e.g. a rank-deficient projection.
    #[error(transparent)]
    Transcription(#[from] TranscriptionError),
    /// Settings rejected at construction.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
}

/// Evaluator clones owned by one worker slot.
struct WorkerResources {
    dynamics: Box<dyn SystemDynamics>,
    cost: Box<dyn CostFunction>,
    constraint: Option<Box<dyn Constraint>>,
}

enum NodeBlocks {
    Intermediate(Transcription),
    Terminal(TerminalTranscription),
}

/// One worker's share of a transcription region: its locally accumulated
/// performance index plus the blocks of the nodes it claimed.
struct WorkerOutput {
    performance: PerformanceIndex,
    nodes: Vec<(usize, NodeBlocks)>,
}

/// Multiple-shooting SQP solver.
///
/// Constructed once per problem; [`SqpSolver::solve`] is then invoked
/// with a fresh initial state every receding-horizon tick and reuses the
/// previous solution as warm start.
pub struct SqpSolver {
    settings: Settings,
    pool: WorkerPool,
    workers: Vec<WorkerResources>,
    has_constraints: bool,
    penalty: Option<RelaxedBarrierPenalty>,
    operating_trajectories: Option<Box<dyn OperatingTrajectories>>,
    mode_schedule: ModeSchedule,
    desired: DesiredTrajectories,
    qp: OcpQpSolver,
    primal: PrimalSolution,
    performance_log: Vec<PerformanceIndex>,
    total_iterations: usize,

    dynamics_blocks: Vec<LinearApproximation>,
    cost_blocks: Vec<QuadraticApproximation>,
    constraint_blocks: Vec<LinearApproximation>,
    ineq_counts: Vec<usize>,

    lq_approximation_timer: crate::timing::RepeatedTimer,
    solve_qp_timer: crate::timing::RepeatedTimer,
    linesearch_timer: crate::timing::RepeatedTimer,
    controller_timer: crate::timing::RepeatedTimer,
}

impl SqpSolver {
    /// Create a solver for the given collaborators.
    ///
    /// Every evaluator is cloned once per worker thread. The relaxed
    /// barrier is active when a constraint collaborator is present and
    /// `inequality_constraint_mu` is positive.
    pub fn new(
        settings: Settings,
        dynamics: &dyn SystemDynamics,
        cost: &dyn CostFunction,
        constraint: Option<&(dyn Constraint + '_)>,
        operating_trajectories: Option<&dyn OperatingTrajectories>,
    ) -> Result<Self, SqpError> {
        settings.validate()?;

        let pool = WorkerPool::new(settings.n_threads);
        let workers = (0..settings.n_threads)
            .map(|_| WorkerResources {
                dynamics: dynamics.clone_box(),
                cost: cost.clone_box(),
                constraint: constraint.map(|c| c.clone_box()),
            })
            .collect();

        let penalty = if constraint.is_some() && settings.inequality_constraint_mu > 0.0 {
            Some(RelaxedBarrierPenalty::new(
                settings.inequality_constraint_mu,
                settings.inequality_constraint_delta,
            ))
        } else {
            None
        };

        Ok(Self {
            has_constraints: constraint.is_some(),
            penalty,
            operating_trajectories: operating_trajectories.map(|o| o.clone_box()),
            mode_schedule: ModeSchedule::default(),
            desired: DesiredTrajectories::default(),
            qp: OcpQpSolver::new(),
            primal: PrimalSolution::default(),
            performance_log: Vec::new(),
            total_iterations: 0,
            dynamics_blocks: Vec::new(),
            cost_blocks: Vec::new(),
            constraint_blocks: Vec::new(),
            ineq_counts: Vec::new(),
            lq_approximation_timer: Default::default(),
            solve_qp_timer: Default::default(),
            linesearch_timer: Default::default(),
            controller_timer: Default::default(),
            settings,
            pool,
            workers,
        })
    }

    /// Replace the mode schedule used for grid construction.
    pub fn set_mode_schedule(&mut self, mode_schedule: ModeSchedule) {
        self.mode_schedule = mode_schedule;
    }

    /// Replace the reference signals consumed by the cost.
    pub fn set_desired_trajectories(&mut self, desired: DesiredTrajectories) {
        self.desired = desired;
    }

    /// Last computed primal solution.
    pub fn primal_solution(&self) -> &PrimalSolution {
        &self.primal
    }

    /// Performance index of every SQP iteration of the last solve.
    pub fn iterations_log(&self) -> Result<&[PerformanceIndex], SqpError> {
        if self.performance_log.is_empty() {
            Err(SqpError::EmptyLogQuery)
        } else {
            Ok(&self.performance_log)
        }
    }

    /// Drop the previous solution, the iteration log, and all timers.
    pub fn reset(&mut self) {
        self.primal = PrimalSolution::default();
        self.performance_log.clear();
        self.total_iterations = 0;
        self.lq_approximation_timer.reset();
        self.solve_qp_timer.reset();
        self.linesearch_timer.reset();
        self.controller_timer.reset();
    }

    /// Per-phase timing summary over all iterations since the last reset.
    pub fn benchmark_report(&self) -> String {
        let lq = self.lq_approximation_timer;
        let qp = self.solve_qp_timer;
        let ls = self.linesearch_timer;
        let ctrl = self.controller_timer;
        let total = lq.total_ms() + qp.total_ms() + ls.total_ms() + ctrl.total_ms();
        if total <= 0.0 {
            return String::from("SQP benchmarking: no solves recorded yet");
        }
        let percent = |t: f64| 100.0 * t / total;
        format!(
            "SQP benchmarking over {} iterations: average time [ms] (% of total)\n\
             \tLQ approximation   : {:.3} ms ({:.1}%)\n\
             \tSolve QP           : {:.3} ms ({:.1}%)\n\
             \tLinesearch         : {:.3} ms ({:.1}%)\n\
             \tCompute controller : {:.3} ms ({:.1}%)",
            self.total_iterations,
            lq.average_ms(),
            percent(lq.total_ms()),
            qp.average_ms(),
            percent(qp.total_ms()),
            ls.average_ms(),
            percent(ls.total_ms()),
            ctrl.average_ms(),
            percent(ctrl.total_ms()),
        )
    }

    /// Solve the optimal control problem over `[init_time, final_time]`.
    ///
    /// On success the returned solution holds the accepted iterate and
    /// its controller. Running out of iterations is not an error; the
    /// last accepted iterate is returned.
    pub fn solve(
        &mut self,
        init_time: f64,
        init_state: &DVector<f64>,
        final_time: f64,
    ) -> Result<PrimalSolution, SqpError> {
        if self.settings.print_solver_status || self.settings.print_linesearch {
            info!(init_time, final_time, "SQP solver starting");
        }

        let grid = time_discretization_with_events(
            init_time,
            final_time,
            self.settings.dt,
            &self.mode_schedule.event_times,
            EVENT_TIME_EPS,
        );

        let mut x = self.initialize_state_trajectory(init_state, &grid);
        let mut u = self.initialize_input_trajectory(&grid, &x);

        self.performance_log.clear();

        for iteration in 0..self.settings.sqp_iteration {
            if self.settings.print_solver_status {
                info!(iteration, "SQP iteration");
            }

            let start = Instant::now();
            let baseline = self.setup_quadratic_subproblem(&grid, init_state, &x, &u)?;
            self.lq_approximation_timer.add(start.elapsed());
            self.performance_log.push(baseline);

            let start = Instant::now();
            let dx0 = init_state - &x[0];
            let (dx, du) = self.ocp_solution(&dx0)?;
            self.solve_qp_timer.add(start.elapsed());

            let start = Instant::now();
            let converged = self.take_step(&baseline, &grid, init_state, &dx, &du, &mut x, &mut u);
            self.linesearch_timer.add(start.elapsed());

            self.total_iterations += 1;
            if converged {
                break;
            }
        }

        let start = Instant::now();
        self.primal.time_grid = grid;
        self.primal.states = x;
        self.primal.inputs = u;
        if let Some(last) = self.primal.inputs.last().cloned() {
            // Pad to grid length for controller emission.
            self.primal.inputs.push(last);
        }
        self.primal.mode_schedule = self.mode_schedule.clone();
        self.assemble_controller()?;
        self.controller_timer.add(start.elapsed());

        if self.settings.print_solver_status || self.settings.print_linesearch {
            info!("SQP solver terminated");
        }
        Ok(self.primal.clone())
    }

    fn initialize_state_trajectory(
        &self,
        init_state: &DVector<f64>,
        grid: &[f64],
    ) -> Vec<DVector<f64>> {
        let n = grid.len() - 1;
        if self.total_iterations == 0 {
            return vec![init_state.clone(); n + 1];
        }
        // Linearize the first node around the measured state, interpolate
        // the rest from the previous solution.
        let mut x = Vec::with_capacity(n + 1);
        x.push(init_state.clone());
        for &t in &grid[1..] {
            x.push(interpolation::interpolate_vector(
                t,
                &self.primal.time_grid,
                &self.primal.states,
            ));
        }
        x
    }

    fn initialize_input_trajectory(
        &mut self,
        grid: &[f64],
        x: &[DVector<f64>],
    ) -> Vec<DVector<f64>> {
        let n = grid.len() - 1;
        let interpolate_till = if self.total_iterations > 0 {
            *self.primal.time_grid.last().expect("previous solution grid")
        } else {
            grid[0]
        };

        let mut u = Vec::with_capacity(n);
        for i in 0..n {
            let ti = grid[i];
            if ti < interpolate_till {
                u.push(interpolation::interpolate_vector(
                    ti,
                    &self.primal.time_grid,
                    &self.primal.inputs,
                ));
            } else if let Some(operating) = self.operating_trajectories.as_deref_mut() {
                let (_, input) = operating.operating_point(&x[i], ti, grid[i + 1]);
                u.push(input);
            } else {
                u.push(DVector::zeros(self.settings.n_input));
            }
        }
        u
    }

    fn setup_quadratic_subproblem(
        &mut self,
        grid: &[f64],
        init_state: &DVector<f64>,
        x: &[DVector<f64>],
        u: &[DVector<f64>],
    ) -> Result<PerformanceIndex, SqpError> {
        let n = grid.len() - 1;

        let placeholder = LinearApproximation::zeros(0, 0, 0);
        self.dynamics_blocks.clear();
        self.dynamics_blocks.resize(n, placeholder.clone());
        self.cost_blocks.clear();
        self.cost_blocks
            .resize(n + 1, QuadraticApproximation::zeros(0, 0));
        self.constraint_blocks.clear();
        self.constraint_blocks.resize(n + 1, placeholder);
        self.ineq_counts.clear();
        self.ineq_counts.resize(n + 1, 0);

        let queue = IndexQueue::new();
        let desired = &self.desired;
        let ctx = NodeContext {
            integrator: self.settings.integrator_type,
            project: self.settings.project_state_input_equality_constraints,
            penalty: self.penalty.as_ref(),
            desired,
        };
        let ctx = &ctx;

        let results = self.pool.run(&mut self.workers, |_, resources| {
            let mut output = WorkerOutput {
                performance: PerformanceIndex::default(),
                nodes: Vec::new(),
            };
            loop {
                let i = queue.claim();
                if i > n {
                    break;
                }
                if i < n {
                    let node = setup_intermediate_node(
                        resources.dynamics.as_mut(),
                        resources.cost.as_mut(),
                        resources.constraint.as_deref_mut(),
                        ctx,
                        i,
                        grid[i],
                        grid[i + 1] - grid[i],
                        &x[i],
                        &x[i + 1],
                        &u[i],
                    )?;
                    output.performance += node.performance;
                    output.nodes.push((i, NodeBlocks::Intermediate(node)));
                } else {
                    // Exactly one worker claims the terminal node.
                    let node = setup_terminal_node(
                        resources.cost.as_mut(),
                        resources.constraint.as_deref_mut(),
                        ctx.desired,
                        grid[n],
                        &x[n],
                    );
                    output.performance += node.performance;
                    output.nodes.push((i, NodeBlocks::Terminal(node)));
                    break;
                }
            }
            Ok::<WorkerOutput, TranscriptionError>(output)
        });

        // Reduce the per-worker indices left to right in worker order
        // (the pool returns them that way), then scatter the blocks.
        let mut aggregate = PerformanceIndex::default();
        for result in results {
            let output = result?;
            aggregate += output.performance;
            for (i, blocks) in output.nodes {
                match blocks {
                    NodeBlocks::Intermediate(node) => {
                        self.dynamics_blocks[i] = node.dynamics;
                        self.cost_blocks[i] = node.cost;
                        self.ineq_counts[i] = node.num_ineq;
                        if let Some(block) = node.constraints {
                            self.constraint_blocks[i] = block;
                        }
                    }
                    NodeBlocks::Terminal(node) => {
                        self.cost_blocks[i] = node.cost;
                        if let Some(block) = node.constraints {
                            self.constraint_blocks[i] = block;
                        }
                    }
                }
            }
        }

        aggregate.state_eq_constraint_ise += (init_state - &x[0]).norm_squared();
        aggregate.merit = aggregate.total_cost + aggregate.inequality_constraint_penalty;

        // Per-node sizes discovered during transcription.
        let mut size = OcpSize::uniform(n, self.settings.n_state, self.settings.n_input);
        size.num_ineq.copy_from_slice(&self.ineq_counts);
        if self.has_constraints {
            for i in 0..n {
                if self.settings.project_state_input_equality_constraints {
                    size.num_inputs[i] = self.constraint_blocks[i].dfdu.ncols();
                } else {
                    size.num_eq[i] = self.constraint_blocks[i].rows();
                }
            }
            if !self.settings.project_state_input_equality_constraints {
                size.num_eq[n] = self.constraint_blocks[n].rows();
            }
        }
        self.qp.resize(size);

        Ok(aggregate)
    }

    fn compute_performance(
        &mut self,
        grid: &[f64],
        init_state: &DVector<f64>,
        x: &[DVector<f64>],
        u: &[DVector<f64>],
    ) -> PerformanceIndex {
        let n = grid.len() - 1;
        let queue = IndexQueue::new();
        let desired = &self.desired;
        let ctx = NodeContext {
            integrator: self.settings.integrator_type,
            project: self.settings.project_state_input_equality_constraints,
            penalty: self.penalty.as_ref(),
            desired,
        };
        let ctx = &ctx;

        let results = self.pool.run(&mut self.workers, |_, resources| {
            // Accumulate in a worker-local index.
            let mut performance = PerformanceIndex::default();
            loop {
                let i = queue.claim();
                if i > n {
                    break;
                }
                if i < n {
                    performance += compute_intermediate_performance(
                        resources.dynamics.as_mut(),
                        resources.cost.as_mut(),
                        resources.constraint.as_deref_mut(),
                        ctx,
                        grid[i],
                        grid[i + 1] - grid[i],
                        &x[i],
                        &x[i + 1],
                        &u[i],
                    );
                } else {
                    performance += compute_terminal_performance(
                        resources.cost.as_mut(),
                        resources.constraint.as_deref_mut(),
                        ctx.desired,
                        grid[n],
                        &x[n],
                    );
                    break;
                }
            }
            performance
        });

        // Reduce left to right in worker order.
        let mut total = PerformanceIndex::default();
        for performance in results {
            total += performance;
        }
        total.state_eq_constraint_ise += (init_state - &x[0]).norm_squared();
        total.merit = total.total_cost + total.inequality_constraint_penalty;
        total
    }

    fn ocp_solution(
        &mut self,
        dx0: &DVector<f64>,
    ) -> Result<(Vec<DVector<f64>>, Vec<DVector<f64>>), SqpError> {
        let project = self.settings.project_state_input_equality_constraints;
        let (dx, mut du) = if self.has_constraints && !project {
            self.qp.solve(
                dx0,
                &self.dynamics_blocks,
                &self.cost_blocks,
                Some(&self.constraint_blocks),
            )?
        } else {
            // Unconstrained, or unconstrained in the reduced input.
            self.qp
                .solve(dx0, &self.dynamics_blocks, &self.cost_blocks, None)?
        };

        if self.has_constraints && project {
            // Map the reduced input step back to the full input space.
            for i in 0..du.len() {
                let map = &self.constraint_blocks[i];
                let step = &map.f + &map.dfdx * &dx[i] + &map.dfdu * &du[i];
                du[i] = step;
            }
        }
        Ok((dx, du))
    }

    #[allow(clippy::too_many_arguments)]
    fn take_step(
        &mut self,
        baseline: &PerformanceIndex,
        grid: &[f64],
        init_state: &DVector<f64>,
        dx: &[DVector<f64>],
        du: &[DVector<f64>],
        x: &mut Vec<DVector<f64>>,
        u: &mut Vec<DVector<f64>>,
    ) -> bool {
        let filter = FilterLinesearch {
            alpha_decay: self.settings.alpha_decay,
            alpha_min: self.settings.alpha_min,
            gamma_c: self.settings.gamma_c,
            g_max: self.settings.g_max,
            g_min: self.settings.g_min,
        };
        let n = grid.len() - 1;

        if self.settings.print_linesearch {
            info!(
                merit = baseline.merit,
                dynamics_ise = baseline.state_eq_constraint_ise,
                state_input_ise = baseline.state_input_eq_constraint_ise,
                inequality_ise = baseline.inequality_constraint_ise,
                penalty = baseline.inequality_constraint_penalty,
                "linesearch baseline"
            );
        }

        let du_norm = trajectory_norm(du);
        let dx_norm = trajectory_norm(dx);

        let mut alpha = 1.0;
        while alpha > filter.alpha_min {
            let x_new: Vec<DVector<f64>> = (0..=n).map(|i| &x[i] + alpha * &dx[i]).collect();
            let u_new: Vec<DVector<f64>> = (0..n).map(|i| &u[i] + alpha * &du[i]).collect();

            let candidate = self.compute_performance(grid, init_state, &x_new, &u_new);
            let accepted = filter.accepts(baseline, &candidate);

            if self.settings.print_linesearch {
                info!(
                    alpha,
                    accepted,
                    merit = candidate.merit,
                    dynamics_ise = candidate.state_eq_constraint_ise,
                    state_input_ise = candidate.state_input_eq_constraint_ise,
                    inequality_ise = candidate.inequality_constraint_ise,
                    penalty = candidate.inequality_constraint_penalty,
                    "linesearch candidate"
                );
            }

            let step_below_tol = alpha * du_norm < self.settings.delta_tol
                && alpha * dx_norm < self.settings.delta_tol;

            if accepted {
                *x = x_new;
                *u = u_new;
                let improvement_below_tol = (baseline.merit - candidate.merit).abs()
                    < self.settings.cost_tol
                    && candidate.constraint_violation() < filter.g_min;
                return step_below_tol || improvement_below_tol;
            }
            if step_below_tol {
                if self.settings.print_linesearch {
                    info!("step size below tolerance without acceptance, converged");
                }
                return true;
            }
            alpha *= filter.alpha_decay;
        }

        // Smallest step reached without improvement.
        true
    }

    fn assemble_controller(&mut self) -> Result<(), SqpError> {
        if !self.settings.controller_feedback {
            self.primal.controller = Some(Controller::Feedforward(FeedforwardController::new(
                self.primal.time_grid.clone(),
                self.primal.inputs.clone(),
            )));
            return Ok(());
        }

        let n = self.primal.time_grid.len() - 1;
        let reduced_gains = self
            .qp
            .riccati_feedback(&self.dynamics_blocks, &self.cost_blocks)?;
        let projected =
            self.has_constraints && self.settings.project_state_input_equality_constraints;

        let mut uff = Vec::with_capacity(n + 1);
        let mut gains = Vec::with_capacity(n + 1);
        for i in 0..n {
            // With projection the reduced-space gain is composed with the
            // reconstruction map to act on the full input.
            let gain = if projected {
                &self.constraint_blocks[i].dfdx
                    + &self.constraint_blocks[i].dfdu * &reduced_gains[i]
            } else {
                reduced_gains[i].clone()
            };
            // Convention u = uff + K·x, so uff absorbs the gain action on
            // the optimized state.
            let ff = &self.primal.inputs[i] - &gain * &self.primal.states[i];
            uff.push(ff);
            gains.push(gain);
        }
        uff.push(uff.last().cloned().expect("at least one interval"));
        gains.push(gains.last().cloned().expect("at least one interval"));

        self.primal.controller = Some(Controller::Linear(LinearController::new(
            self.primal.time_grid.clone(),
            uff,
            gains,
        )));
        Ok(())
    }
}

impl Drop for SqpSolver {
    fn drop(&mut self) {
        if self.settings.print_solver_statistics {
            info!("{}", self.benchmark_report());
        }
    }
}

/// Euclidean norm of a concatenated trajectory.
fn trajectory_norm(v: &[DVector<f64>]) -> f64 {
    v.iter().map(|vi| vi.norm_squared()).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;

    use mshoot_core::cost::QuadraticCost;
    use mshoot_core::dynamics::LinearSystem;

    fn simple_solver(n_threads: usize) -> SqpSolver {
        let dynamics = LinearSystem::new(DMatrix::identity(2, 2), DMatrix::identity(2, 2));
        let cost = QuadraticCost::new(
            DMatrix::identity(2, 2),
            DMatrix::identity(2, 2),
            DMatrix::identity(2, 2),
        );
        let settings = Settings {
            dt: 0.1,
            n_state: 2,
            n_input: 2,
            n_threads,
            integrator_type: mshoot_core::integrator::IntegratorType::Euler,
            ..Default::default()
        };
        SqpSolver::new(settings, &dynamics, &cost, None, None).unwrap()
    }

    #[test]
    fn log_query_before_any_solve_fails() {
        let solver = simple_solver(1);
        assert!(matches!(
            solver.iterations_log(),
            Err(SqpError::EmptyLogQuery)
        ));
    }

    #[test]
    fn benchmark_report_is_available_after_a_solve() {
        let mut solver = simple_solver(1);
        let x0 = DVector::from_vec(vec![1.0, 0.0]);
        solver.solve(0.0, &x0, 0.5).unwrap();
        let report = solver.benchmark_report();
        assert!(report.contains("Solve QP"), "unexpected report: {report}");
    }

    #[test]
    fn reset_clears_the_iteration_log() {
        let mut solver = simple_solver(2);
        let x0 = DVector::from_vec(vec![1.0, 0.0]);
        solver.solve(0.0, &x0, 0.5).unwrap();
        assert!(solver.iterations_log().is_ok());
        solver.reset();
        assert!(solver.iterations_log().is_err());
        assert!(solver.primal_solution().is_empty());
    }

    #[test]
    fn invalid_settings_are_rejected_at_construction() {
        let dynamics = LinearSystem::new(DMatrix::identity(1, 1), DMatrix::identity(1, 1));
        let cost = QuadraticCost::new(
            DMatrix::identity(1, 1),
            DMatrix::identity(1, 1),
            DMatrix::identity(1, 1),
        );
        let settings = Settings {
            alpha_decay: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            SqpSolver::new(settings, &dynamics, &cost, None, None),
            Err(SqpError::Settings(_))
        ));
    }

    #[test]
    fn trajectory_norm_concatenates() {
        let v = vec![
            DVector::from_vec(vec![3.0, 0.0]),
            DVector::from_vec(vec![0.0, 4.0]),
        ];
        assert!((trajectory_norm(&v) - 5.0).abs() < 1e-12);
    }
}
