//! Structured OCP-QP back-end
//!
//! Solves the banded linear-quadratic subproblem of one SQP iteration:
//!
//! ```text
//! minimize    Σ ½[δx;δu]ᵀH_i[δx;δu] + g_iᵀ[δx;δu]
//! subject to  δx_0 given
//!             δx_{i+1} = A_i·δx_i + B_i·δu_i + b_i
//!             e_i + C_x·δx_i + C_u·δu_i = 0        (raw mode only)
//! ```
//!
//! Without constraint blocks the problem is solved exactly by a backward
//! Riccati recursion and a forward rollout, which also yields the
//! feedback gains of the emitted controller. With raw constraint blocks
//! the problem is assembled sparse and handed to Clarabel with zero-cone
//! equality rows.

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT::ZeroConeT,
};
use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use mshoot_core::approximation::{LinearApproximation, QuadraticApproximation};

/// Per-node dimensions of one OCP-QP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OcpSize {
    /// Number of shooting intervals N.
    pub num_stages: usize,
    /// State dimension per node, length N + 1.
    pub num_states: Vec<usize>,
    /// Input dimension per intermediate node, length N.
    pub num_inputs: Vec<usize>,
    /// Inequality rows evaluated per node, length N + 1.
    pub num_ineq: Vec<usize>,
    /// Equality rows passed to the QP per node, length N + 1.
    pub num_eq: Vec<usize>,
}

impl OcpSize {
    /// Constant per-node sizes; constraint counts start at zero.
    pub fn uniform(num_stages: usize, n_state: usize, n_input: usize) -> Self {
        Self {
            num_stages,
            num_states: vec![n_state; num_stages + 1],
            num_inputs: vec![n_input; num_stages],
            num_ineq: vec![0; num_stages + 1],
            num_eq: vec![0; num_stages + 1],
        }
    }
}

/// QP back-end failures.
#[derive(Debug, Error)]
pub enum QpError {
    /// The input-space Hessian lost positive definiteness during the
    /// Riccati recursion.
    #[error("stage hessian is not positive definite at node {0}")]
    NotPositiveDefinite(usize),
    /// The cone solver did not reach an optimal point.
    #[error("cone solver terminated with status {0}")]
    ConeSolver(String),
    /// A block disagrees with the negotiated problem size.
    #[error("block shape mismatch at node {node}: {what}")]
    ShapeMismatch { node: usize, what: String },
}

/// Structured QP solver with a persistent workspace.
#[derive(Debug, Default)]
pub struct OcpQpSolver {
    size: OcpSize,
    value_fn: Vec<DMatrix<f64>>,
    value_vec: Vec<DVector<f64>>,
    gains: Vec<DMatrix<f64>>,
    feedforward: Vec<DVector<f64>>,
}

impl OcpQpSolver {
    /// Fresh solver with an empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Negotiated problem size of the last `resize`.
    pub fn size(&self) -> &OcpSize {
        &self.size
    }

    /// Declare the problem size; idempotent.
    pub fn resize(&mut self, size: OcpSize) {
        if self.size == size {
            return;
        }
        let n = size.num_stages;
        self.value_fn.clear();
        self.value_fn.reserve(n + 1);
        self.value_vec.clear();
        self.value_vec.reserve(n + 1);
        self.gains.clear();
        self.gains.reserve(n);
        self.feedforward.clear();
        self.feedforward.reserve(n);
        self.size = size;
    }

    /// Solve the subproblem; returns (δx, δu) with lengths N + 1 and N.
    pub fn solve(
        &mut self,
        dx0: &DVector<f64>,
        dynamics: &[LinearApproximation],
        cost: &[QuadraticApproximation],
        constraints: Option<&[LinearApproximation]>,
    ) -> Result<(Vec<DVector<f64>>, Vec<DVector<f64>>), QpError> {
        self.validate(dx0, dynamics, cost, constraints)?;
        match constraints {
            None => {
                self.backward_pass(dynamics, cost)?;
                Ok(self.forward_pass(dx0, dynamics))
            }
            Some(constraints) => self.solve_constrained(dx0, dynamics, cost, constraints),
        }
    }

    /// Feedback gains of the backward Riccati recursion over the given
    /// blocks, one per intermediate node.
    pub fn riccati_feedback(
        &mut self,
        dynamics: &[LinearApproximation],
        cost: &[QuadraticApproximation],
    ) -> Result<Vec<DMatrix<f64>>, QpError> {
        self.backward_pass(dynamics, cost)?;
        Ok(self.gains.clone())
    }

    fn validate(
        &self,
        dx0: &DVector<f64>,
        dynamics: &[LinearApproximation],
        cost: &[QuadraticApproximation],
        constraints: Option<&[LinearApproximation]>,
    ) -> Result<(), QpError> {
        let n = self.size.num_stages;
        let mismatch = |node: usize, what: &str| QpError::ShapeMismatch {
            node,
            what: what.to_string(),
        };

        if dynamics.len() != n {
            return Err(mismatch(0, "dynamics block count"));
        }
        if cost.len() != n + 1 {
            return Err(mismatch(0, "cost block count"));
        }
        if dx0.len() != self.size.num_states[0] {
            return Err(mismatch(0, "initial state offset length"));
        }
        for i in 0..n {
            let (nx, nx_next, nu) = (
                self.size.num_states[i],
                self.size.num_states[i + 1],
                self.size.num_inputs[i],
            );
            if dynamics[i].dfdx.shape() != (nx_next, nx) {
                return Err(mismatch(i, "dynamics state jacobian"));
            }
            if dynamics[i].dfdu.shape() != (nx_next, nu) {
                return Err(mismatch(i, "dynamics input jacobian"));
            }
            if dynamics[i].f.len() != nx_next {
                return Err(mismatch(i, "dynamics bias"));
            }
            if cost[i].dfdxx.shape() != (nx, nx)
                || cost[i].dfduu.shape() != (nu, nu)
                || cost[i].dfdux.shape() != (nu, nx)
            {
                return Err(mismatch(i, "cost hessian blocks"));
            }
        }
        let nx_final = self.size.num_states[n];
        if cost[n].dfdxx.shape() != (nx_final, nx_final) {
            return Err(mismatch(n, "terminal cost hessian"));
        }
        if let Some(constraints) = constraints {
            if constraints.len() != n + 1 {
                return Err(mismatch(0, "constraint block count"));
            }
            for (i, block) in constraints.iter().enumerate() {
                if block.rows() != self.size.num_eq[i] {
                    return Err(mismatch(i, "equality row count"));
                }
                if block.dfdx.ncols() != self.size.num_states[i] {
                    return Err(mismatch(i, "equality state jacobian"));
                }
                if i < n && block.rows() > 0 && block.dfdu.ncols() != self.size.num_inputs[i] {
                    return Err(mismatch(i, "equality input jacobian"));
                }
            }
        }
        Ok(())
    }

    fn backward_pass(
        &mut self,
        dynamics: &[LinearApproximation],
        cost: &[QuadraticApproximation],
    ) -> Result<(), QpError> {
        let n = self.size.num_stages;
        self.value_fn.resize(n + 1, DMatrix::zeros(0, 0));
        self.value_vec.resize(n + 1, DVector::zeros(0));
        self.gains.resize(n, DMatrix::zeros(0, 0));
        self.feedforward.resize(n, DVector::zeros(0));

        self.value_fn[n] = cost[n].dfdxx.clone();
        self.value_vec[n] = cost[n].dfdx.clone();

        for i in (0..n).rev() {
            let a = &dynamics[i].dfdx;
            let b = &dynamics[i].dfdu;
            let bias = &dynamics[i].f;
            let p_next = &self.value_fn[i + 1];
            let pv = p_next * bias + &self.value_vec[i + 1];

            let quu = &cost[i].dfduu + b.transpose() * p_next * b;
            let qux = &cost[i].dfdux + b.transpose() * p_next * a;
            let qu = &cost[i].dfdu + b.transpose() * &pv;
            let qxx = &cost[i].dfdxx + a.transpose() * p_next * a;
            let qx = &cost[i].dfdx + a.transpose() * &pv;

            let chol = quu
                .clone()
                .cholesky()
                .ok_or(QpError::NotPositiveDefinite(i))?;
            let gain = -chol.solve(&qux);
            let ff = -chol.solve(&qu);

            let mut value_fn = qxx + qux.transpose() * &gain;
            // Symmetrize against drift from the recursion products.
            value_fn = 0.5 * (&value_fn + value_fn.transpose());
            let value_vec = qx + qux.transpose() * &ff;

            self.value_fn[i] = value_fn;
            self.value_vec[i] = value_vec;
            self.gains[i] = gain;
            self.feedforward[i] = ff;
        }
        Ok(())
    }

    fn forward_pass(
        &self,
        dx0: &DVector<f64>,
        dynamics: &[LinearApproximation],
    ) -> (Vec<DVector<f64>>, Vec<DVector<f64>>) {
        let n = self.size.num_stages;
        let mut dx = Vec::with_capacity(n + 1);
        let mut du = Vec::with_capacity(n);
        dx.push(dx0.clone());
        for i in 0..n {
            let step = &self.gains[i] * &dx[i] + &self.feedforward[i];
            let next = &dynamics[i].dfdx * &dx[i] + &dynamics[i].dfdu * &step + &dynamics[i].f;
            du.push(step);
            dx.push(next);
        }
        (dx, du)
    }

    fn solve_constrained(
        &mut self,
        dx0: &DVector<f64>,
        dynamics: &[LinearApproximation],
        cost: &[QuadraticApproximation],
        constraints: &[LinearApproximation],
    ) -> Result<(Vec<DVector<f64>>, Vec<DVector<f64>>), QpError> {
        let n = self.size.num_stages;
        let x_offsets: Vec<usize> = self
            .size
            .num_states
            .iter()
            .scan(0, |acc, &nx| {
                let off = *acc;
                *acc += nx;
                Some(off)
            })
            .collect();
        let total_nx: usize = self.size.num_states.iter().sum();
        let u_offsets: Vec<usize> = self
            .size
            .num_inputs
            .iter()
            .scan(total_nx, |acc, &nu| {
                let off = *acc;
                *acc += nu;
                Some(off)
            })
            .collect();
        let total_nu: usize = self.size.num_inputs.iter().sum();
        let n_z = total_nx + total_nu;

        // Quadratic cost over the stacked variables.
        let mut p = DMatrix::zeros(n_z, n_z);
        let mut q = DVector::zeros(n_z);
        for i in 0..=n {
            let (nx, xo) = (self.size.num_states[i], x_offsets[i]);
            p.view_mut((xo, xo), (nx, nx)).copy_from(&cost[i].dfdxx);
            q.rows_mut(xo, nx).copy_from(&cost[i].dfdx);
            if i < n {
                let (nu, uo) = (self.size.num_inputs[i], u_offsets[i]);
                p.view_mut((uo, uo), (nu, nu)).copy_from(&cost[i].dfduu);
                p.view_mut((uo, xo), (nu, nx)).copy_from(&cost[i].dfdux);
                p.view_mut((xo, uo), (nx, nu))
                    .copy_from(&cost[i].dfdux.transpose());
                q.rows_mut(uo, nu).copy_from(&cost[i].dfdu);
            }
        }

        // Equality rows: initial condition, dynamics, constraint blocks.
        let n_dyn: usize = self.size.num_states[1..].iter().sum();
        let n_con: usize = self.size.num_eq.iter().sum();
        let n_rows = self.size.num_states[0] + n_dyn + n_con;
        let mut a = DMatrix::zeros(n_rows, n_z);
        let mut b = DVector::zeros(n_rows);

        let mut row = 0;
        let nx0 = self.size.num_states[0];
        a.view_mut((row, x_offsets[0]), (nx0, nx0))
            .copy_from(&DMatrix::identity(nx0, nx0));
        b.rows_mut(row, nx0).copy_from(dx0);
        row += nx0;

        for i in 0..n {
            let nx_next = self.size.num_states[i + 1];
            let (nx, nu) = (self.size.num_states[i], self.size.num_inputs[i]);
            a.view_mut((row, x_offsets[i]), (nx_next, nx))
                .copy_from(&dynamics[i].dfdx);
            a.view_mut((row, u_offsets[i]), (nx_next, nu))
                .copy_from(&dynamics[i].dfdu);
            a.view_mut((row, x_offsets[i + 1]), (nx_next, nx_next))
                .copy_from(&(-DMatrix::<f64>::identity(nx_next, nx_next)));
            b.rows_mut(row, nx_next).copy_from(&(-&dynamics[i].f));
            row += nx_next;
        }

        for (i, block) in constraints.iter().enumerate() {
            let rows = block.rows();
            if rows == 0 {
                continue;
            }
            let nx = self.size.num_states[i];
            a.view_mut((row, x_offsets[i]), (rows, nx))
                .copy_from(&block.dfdx);
            if i < n {
                let nu = self.size.num_inputs[i];
                a.view_mut((row, u_offsets[i]), (rows, nu))
                    .copy_from(&block.dfdu);
            }
            b.rows_mut(row, rows).copy_from(&(-&block.f));
            row += rows;
        }
        debug_assert_eq!(row, n_rows);

        let p_csc = dmatrix_to_csc_upper_tri(&p);
        let a_csc = dmatrix_to_csc(&a);
        let cones = vec![ZeroConeT(n_rows)];
        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .tol_gap_abs(1e-10)
            .tol_gap_rel(1e-10)
            .tol_feas(1e-10)
            .build()
            .expect("static cone solver settings");

        let q_data: Vec<f64> = q.iter().copied().collect();
        let b_data: Vec<f64> = b.iter().copied().collect();
        let mut solver = DefaultSolver::new(&p_csc, &q_data, &a_csc, &b_data, &cones, settings)
            .map_err(|e| QpError::ConeSolver(format!("{e:?}")))?;
        solver.solve();

        let solution = &solver.solution;
        if !matches!(
            solution.status,
            SolverStatus::Solved | SolverStatus::AlmostSolved
        ) {
            return Err(QpError::ConeSolver(format!("{:?}", solution.status)));
        }

        let mut dx = Vec::with_capacity(n + 1);
        for i in 0..=n {
            let nx = self.size.num_states[i];
            dx.push(DVector::from_iterator(
                nx,
                solution.x[x_offsets[i]..x_offsets[i] + nx].iter().copied(),
            ));
        }
        let mut du = Vec::with_capacity(n);
        for i in 0..n {
            let nu = self.size.num_inputs[i];
            du.push(DVector::from_iterator(
                nu,
                solution.x[u_offsets[i]..u_offsets[i] + nu].iter().copied(),
            ));
        }
        Ok((dx, du))
    }
}

/// Dense nalgebra matrix to Clarabel CSC, full pattern.
fn dmatrix_to_csc(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for j in 0..ncols {
        for i in 0..nrows {
            let v = m[(i, j)];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }
    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}

/// Dense symmetric nalgebra matrix to Clarabel CSC, upper triangle only.
fn dmatrix_to_csc_upper_tri(m: &DMatrix<f64>) -> CscMatrix<f64> {
    let (nrows, ncols) = m.shape();
    let mut colptr = vec![0usize; ncols + 1];
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for j in 0..ncols {
        for i in 0..=j.min(nrows.saturating_sub(1)) {
            let v = m[(i, j)];
            if v != 0.0 {
                rowval.push(i);
                nzval.push(v);
            }
        }
        colptr[j + 1] = rowval.len();
    }
    CscMatrix::new(nrows, ncols, colptr, rowval, nzval)
}
