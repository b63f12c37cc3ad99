//! Cost function interface
//!
//! Stage and terminal cost of the optimal control problem, evaluated
//! against the reference signals in [`DesiredTrajectories`]. Quadratic
//! approximations feed the QP subproblem; plain values feed the
//! line-search performance evaluation.

use nalgebra::{DMatrix, DVector};

use crate::approximation::QuadraticApproximation;
use crate::trajectory::DesiredTrajectories;

/// Stage and terminal cost with quadratic approximations.
pub trait CostFunction: Send {
    /// Stage cost L(t, x, u).
    fn stage_cost(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> f64;

    /// Quadratic model of the stage cost around (x, u).
    fn stage_quadratic(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> QuadraticApproximation;

    /// Terminal cost Φ(t, x).
    fn terminal_cost(&mut self, t: f64, x: &DVector<f64>, desired: &DesiredTrajectories) -> f64;

    /// Quadratic state-only model of the terminal cost around x.
    fn terminal_quadratic(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> QuadraticApproximation;

    /// Independent copy for a worker thread.
    fn clone_box(&self) -> Box<dyn CostFunction>;
}

impl Clone for Box<dyn CostFunction> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Quadratic tracking cost
/// `½(x−x_ref)ᵀQ(x−x_ref) + ½(u−u_ref)ᵀR(u−u_ref)` with terminal weight
/// `½(x−x_ref)ᵀQ_f(x−x_ref)`.
///
/// Missing reference samples are treated as zero references.
#[derive(Debug, Clone)]
pub struct QuadraticCost {
    q: DMatrix<f64>,
    r: DMatrix<f64>,
    q_final: DMatrix<f64>,
}

impl QuadraticCost {
    /// Create the cost from its weight matrices.
    ///
    /// # Panics
    /// Panics if any weight matrix is not square.
    pub fn new(q: DMatrix<f64>, r: DMatrix<f64>, q_final: DMatrix<f64>) -> Self {
        assert_eq!(q.nrows(), q.ncols(), "Q must be square");
        assert_eq!(r.nrows(), r.ncols(), "R must be square");
        assert_eq!(q_final.nrows(), q_final.ncols(), "Q_f must be square");
        assert_eq!(q.nrows(), q_final.nrows(), "Q and Q_f must agree in size");
        Self { q, r, q_final }
    }

    fn state_error(&self, t: f64, x: &DVector<f64>, desired: &DesiredTrajectories) -> DVector<f64> {
        match desired.desired_state(t) {
            Some(x_ref) => x - x_ref,
            None => x.clone(),
        }
    }

    fn input_error(&self, t: f64, u: &DVector<f64>, desired: &DesiredTrajectories) -> DVector<f64> {
        match desired.desired_input(t) {
            Some(u_ref) => u - u_ref,
            None => u.clone(),
        }
    }
}

impl CostFunction for QuadraticCost {
    fn stage_cost(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> f64 {
        let ex = self.state_error(t, x, desired);
        let eu = self.input_error(t, u, desired);
        0.5 * ex.dot(&(&self.q * &ex)) + 0.5 * eu.dot(&(&self.r * &eu))
    }

    fn stage_quadratic(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> QuadraticApproximation {
        let ex = self.state_error(t, x, desired);
        let eu = self.input_error(t, u, desired);
        let qx = &self.q * &ex;
        let ru = &self.r * &eu;
        QuadraticApproximation {
            f: 0.5 * ex.dot(&qx) + 0.5 * eu.dot(&ru),
            dfdx: qx,
            dfdu: ru,
            dfdxx: self.q.clone(),
            dfdux: DMatrix::zeros(self.r.nrows(), self.q.nrows()),
            dfduu: self.r.clone(),
        }
    }

    fn terminal_cost(&mut self, t: f64, x: &DVector<f64>, desired: &DesiredTrajectories) -> f64 {
        let ex = self.state_error(t, x, desired);
        0.5 * ex.dot(&(&self.q_final * &ex))
    }

    fn terminal_quadratic(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        desired: &DesiredTrajectories,
    ) -> QuadraticApproximation {
        let ex = self.state_error(t, x, desired);
        let qx = &self.q_final * &ex;
        QuadraticApproximation::state_only(0.5 * ex.dot(&qx), qx, self.q_final.clone())
    }

    fn clone_box(&self) -> Box<dyn CostFunction> {
        Box::new(self.clone())
    }
}
