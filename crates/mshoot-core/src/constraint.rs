//! Constraint interface
//!
//! Three constraint families feed the solver: state-input equalities
//! g(t, x, u) = 0 (projected or passed to the QP), inequalities
//! h(t, x, u) ≥ 0 (penalized through the relaxed barrier), and terminal
//! state equalities g_f(t, x) = 0. All families default to empty so an
//! implementation only overrides what it uses.

use nalgebra::{DMatrix, DVector};

use crate::approximation::LinearApproximation;

/// Equality and inequality constraints of the optimal control problem.
pub trait Constraint: Send {
    /// State-input equality value g(t, x, u); empty by default.
    fn state_input_equality(
        &mut self,
        _t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> DVector<f64> {
        let _ = (x, u);
        DVector::zeros(0)
    }

    /// Linearization of the state-input equality; empty by default.
    fn state_input_equality_linearized(
        &mut self,
        _t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> LinearApproximation {
        LinearApproximation::zeros(0, x.len(), u.len())
    }

    /// Inequality value h(t, x, u) with the convention h ≥ 0; empty by default.
    fn inequality(&mut self, _t: f64, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        let _ = (x, u);
        DVector::zeros(0)
    }

    /// Linearization of the inequality; empty by default.
    fn inequality_linearized(
        &mut self,
        _t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> LinearApproximation {
        LinearApproximation::zeros(0, x.len(), u.len())
    }

    /// Terminal state equality value g_f(t, x); empty by default.
    fn terminal_state_equality(&mut self, _t: f64, x: &DVector<f64>) -> DVector<f64> {
        let _ = x;
        DVector::zeros(0)
    }

    /// Linearization of the terminal state equality; empty by default.
    fn terminal_state_equality_linearized(
        &mut self,
        _t: f64,
        x: &DVector<f64>,
    ) -> LinearApproximation {
        LinearApproximation::state_only(DVector::zeros(0), DMatrix::zeros(0, x.len()))
    }

    /// Independent copy for a worker thread.
    fn clone_box(&self) -> Box<dyn Constraint>;
}

impl Clone for Box<dyn Constraint> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Affine constraint set: equality `e + C_x·x + C_u·u = 0` and
/// inequality `h_0 + H_x·x + H_u·u ≥ 0`. Either family may be empty.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    /// Equality offset e.
    pub eq_offset: DVector<f64>,
    /// Equality state jacobian C_x.
    pub eq_dx: DMatrix<f64>,
    /// Equality input jacobian C_u.
    pub eq_du: DMatrix<f64>,
    /// Inequality offset h_0.
    pub ineq_offset: DVector<f64>,
    /// Inequality state jacobian H_x.
    pub ineq_dx: DMatrix<f64>,
    /// Inequality input jacobian H_u.
    pub ineq_du: DMatrix<f64>,
}

impl LinearConstraint {
    /// Equality-only constraint set.
    pub fn equality(e: DVector<f64>, cx: DMatrix<f64>, cu: DMatrix<f64>) -> Self {
        let nx = cx.ncols();
        let nu = cu.ncols();
        Self {
            eq_offset: e,
            eq_dx: cx,
            eq_du: cu,
            ineq_offset: DVector::zeros(0),
            ineq_dx: DMatrix::zeros(0, nx),
            ineq_du: DMatrix::zeros(0, nu),
        }
    }

    /// Inequality-only constraint set.
    pub fn inequality(h0: DVector<f64>, hx: DMatrix<f64>, hu: DMatrix<f64>) -> Self {
        let nx = hx.ncols();
        let nu = hu.ncols();
        Self {
            eq_offset: DVector::zeros(0),
            eq_dx: DMatrix::zeros(0, nx),
            eq_du: DMatrix::zeros(0, nu),
            ineq_offset: h0,
            ineq_dx: hx,
            ineq_du: hu,
        }
    }
}

impl Constraint for LinearConstraint {
    fn state_input_equality(
        &mut self,
        _t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> DVector<f64> {
        &self.eq_offset + &self.eq_dx * x + &self.eq_du * u
    }

    fn state_input_equality_linearized(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> LinearApproximation {
        LinearApproximation {
            f: self.state_input_equality(t, x, u),
            dfdx: self.eq_dx.clone(),
            dfdu: self.eq_du.clone(),
        }
    }

    fn inequality(&mut self, _t: f64, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        &self.ineq_offset + &self.ineq_dx * x + &self.ineq_du * u
    }

    fn inequality_linearized(
        &mut self,
        t: f64,
        x: &DVector<f64>,
        u: &DVector<f64>,
    ) -> LinearApproximation {
        LinearApproximation {
            f: self.inequality(t, x, u),
            dfdx: self.ineq_dx.clone(),
            dfdu: self.ineq_du.clone(),
        }
    }

    fn clone_box(&self) -> Box<dyn Constraint> {
        Box::new(self.clone())
    }
}
