//! Local model value types
//!
//! The solver and its collaborators exchange first- and second-order
//! Taylor models of vector- and scalar-valued functions of the state x
//! and input u. Terminal-node models carry zero-width input blocks so a
//! single type covers both intermediate and terminal quantities.

use nalgebra::{DMatrix, DVector};

/// Affine model `f + dfdx·δx + dfdu·δu` of a vector-valued function.
///
/// Also used to store the constraint projection map, where `f`, `dfdx`
/// and `dfdu` describe the affine reconstruction of the full input from
/// the reduced one.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearApproximation {
    /// Value at the linearization point.
    pub f: DVector<f64>,
    /// Jacobian with respect to the state.
    pub dfdx: DMatrix<f64>,
    /// Jacobian with respect to the input.
    pub dfdu: DMatrix<f64>,
}

impl LinearApproximation {
    /// Zero model of the given dimensions.
    pub fn zeros(nf: usize, nx: usize, nu: usize) -> Self {
        Self {
            f: DVector::zeros(nf),
            dfdx: DMatrix::zeros(nf, nx),
            dfdu: DMatrix::zeros(nf, nu),
        }
    }

    /// State-only model; the input jacobian has zero columns.
    pub fn state_only(f: DVector<f64>, dfdx: DMatrix<f64>) -> Self {
        let nf = f.len();
        Self {
            f,
            dfdx,
            dfdu: DMatrix::zeros(nf, 0),
        }
    }

    /// Number of rows of the modeled function.
    pub fn rows(&self) -> usize {
        self.f.len()
    }
}

/// Quadratic model `f + dfdxᵀδx + dfduᵀδu + ½δxᵀdfdxx·δx + δuᵀdfdux·δx
/// + ½δuᵀdfduu·δu` of a scalar-valued function.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadraticApproximation {
    /// Value at the expansion point.
    pub f: f64,
    /// Gradient with respect to the state.
    pub dfdx: DVector<f64>,
    /// Gradient with respect to the input.
    pub dfdu: DVector<f64>,
    /// State-state Hessian block.
    pub dfdxx: DMatrix<f64>,
    /// Input-state Hessian block (input rows, state columns).
    pub dfdux: DMatrix<f64>,
    /// Input-input Hessian block.
    pub dfduu: DMatrix<f64>,
}

impl QuadraticApproximation {
    /// Zero model of the given dimensions.
    pub fn zeros(nx: usize, nu: usize) -> Self {
        Self {
            f: 0.0,
            dfdx: DVector::zeros(nx),
            dfdu: DVector::zeros(nu),
            dfdxx: DMatrix::zeros(nx, nx),
            dfdux: DMatrix::zeros(nu, nx),
            dfduu: DMatrix::zeros(nu, nu),
        }
    }

    /// State-only model; all input blocks have zero width.
    pub fn state_only(f: f64, dfdx: DVector<f64>, dfdxx: DMatrix<f64>) -> Self {
        let nx = dfdx.len();
        Self {
            f,
            dfdx,
            dfdu: DVector::zeros(0),
            dfdxx,
            dfdux: DMatrix::zeros(0, nx),
            dfduu: DMatrix::zeros(0, 0),
        }
    }

    /// Scale every term, e.g. by a quadrature weight.
    pub fn scale(&mut self, s: f64) {
        self.f *= s;
        self.dfdx *= s;
        self.dfdu *= s;
        self.dfdxx *= s;
        self.dfdux *= s;
        self.dfduu *= s;
    }

    /// Add another model of identical dimensions term by term.
    pub fn add_assign(&mut self, other: &QuadraticApproximation) {
        self.f += other.f;
        self.dfdx += &other.dfdx;
        self.dfdu += &other.dfdu;
        self.dfdxx += &other.dfdxx;
        self.dfdux += &other.dfdux;
        self.dfduu += &other.dfduu;
    }

    /// Evaluate the model at a displacement (δx, δu).
    pub fn evaluate(&self, dx: &DVector<f64>, du: &DVector<f64>) -> f64 {
        self.f
            + self.dfdx.dot(dx)
            + self.dfdu.dot(du)
            + 0.5 * dx.dot(&(&self.dfdxx * dx))
            + du.dot(&(&self.dfdux * dx))
            + 0.5 * du.dot(&(&self.dfduu * du))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn state_only_has_zero_width_input_blocks() {
        let model = QuadraticApproximation::state_only(
            1.0,
            DVector::from_vec(vec![1.0, 2.0]),
            DMatrix::identity(2, 2),
        );
        assert_eq!(model.dfdu.len(), 0);
        assert_eq!(model.dfdux.shape(), (0, 2));
        assert_eq!(model.dfduu.shape(), (0, 0));
    }

    #[test]
    fn evaluate_matches_manual_expansion() {
        let mut model = QuadraticApproximation::zeros(2, 1);
        model.f = 0.5;
        model.dfdx = DVector::from_vec(vec![1.0, -1.0]);
        model.dfdu = DVector::from_vec(vec![2.0]);
        model.dfdxx = DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 4.0]));
        model.dfdux = DMatrix::from_row_slice(1, 2, &[1.0, 0.0]);
        model.dfduu = DMatrix::from_element(1, 1, 3.0);

        let dx = DVector::from_vec(vec![0.5, -0.5]);
        let du = DVector::from_vec(vec![2.0]);

        let expected = 0.5 + (0.5 + 0.5) + 4.0 + 0.5 * (2.0 * 0.25 + 4.0 * 0.25)
            + 2.0 * 0.5
            + 0.5 * 3.0 * 4.0;
        assert_relative_eq!(model.evaluate(&dx, &du), expected, epsilon = 1e-12);
    }

    #[test]
    fn scale_applies_to_all_terms() {
        let mut model = QuadraticApproximation::zeros(1, 1);
        model.f = 1.0;
        model.dfdx[0] = 2.0;
        model.dfduu[(0, 0)] = 4.0;
        model.scale(0.5);
        assert_relative_eq!(model.f, 0.5);
        assert_relative_eq!(model.dfdx[0], 1.0);
        assert_relative_eq!(model.dfduu[(0, 0)], 2.0);
    }
}
