//! Relaxed logarithmic barrier
//!
//! Penalizes inequality constraints h ≥ 0 with the log barrier -μ·ln(h)
//! above the relaxation threshold δ and a quadratic extension below it.
//! Unlike a plain log barrier the penalty is finite and smooth for
//! infeasible iterates, which the line-search relies on when stepping
//! through infeasible candidates. The second derivative is strictly
//! positive everywhere, so the Gauss-Newton model contributes a PSD
//! Hessian block to the QP.

use nalgebra::DVector;

use crate::approximation::{LinearApproximation, QuadraticApproximation};

/// Relaxed log barrier with weight μ and relaxation threshold δ.
#[derive(Debug, Clone)]
pub struct RelaxedBarrierPenalty {
    mu: f64,
    delta: f64,
}

impl RelaxedBarrierPenalty {
    /// Create the penalty.
    ///
    /// # Panics
    /// Panics unless μ > 0 and δ > 0.
    pub fn new(mu: f64, delta: f64) -> Self {
        assert!(mu > 0.0, "barrier weight must be positive");
        assert!(delta > 0.0, "relaxation threshold must be positive");
        Self { mu, delta }
    }

    /// Penalty value at constraint value h.
    pub fn value(&self, h: f64) -> f64 {
        if h > self.delta {
            -self.mu * h.ln()
        } else {
            let z = (h - 2.0 * self.delta) / self.delta;
            0.5 * self.mu * (z * z - 1.0) - self.mu * self.delta.ln()
        }
    }

    /// First derivative of the penalty with respect to h.
    pub fn derivative(&self, h: f64) -> f64 {
        if h > self.delta {
            -self.mu / h
        } else {
            self.mu * (h - 2.0 * self.delta) / (self.delta * self.delta)
        }
    }

    /// Second derivative of the penalty with respect to h.
    pub fn second_derivative(&self, h: f64) -> f64 {
        if h > self.delta {
            self.mu / (h * h)
        } else {
            self.mu / (self.delta * self.delta)
        }
    }

    /// Total penalty over a vector of constraint values.
    pub fn total(&self, h: &DVector<f64>) -> f64 {
        h.iter().map(|&hj| self.value(hj)).sum()
    }

    /// Gauss-Newton quadratic model of the summed penalty over a
    /// linearized inequality constraint.
    ///
    /// The constraint curvature is dropped; only the strictly positive
    /// penalty curvature enters, keeping the model PSD.
    pub fn quadratic_model(&self, ineq: &LinearApproximation) -> QuadraticApproximation {
        let nx = ineq.dfdx.ncols();
        let nu = ineq.dfdu.ncols();
        let mut model = QuadraticApproximation::zeros(nx, nu);
        for j in 0..ineq.f.len() {
            let hj = ineq.f[j];
            let first = self.derivative(hj);
            let second = self.second_derivative(hj);
            let row_x = ineq.dfdx.row(j);
            let row_u = ineq.dfdu.row(j);

            model.f += self.value(hj);
            model.dfdx += first * row_x.transpose();
            model.dfdu += first * row_u.transpose();
            model.dfdxx += second * row_x.transpose() * row_x;
            model.dfdux += second * row_u.transpose() * row_x;
            model.dfduu += second * row_u.transpose() * row_u;
        }
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn value_and_derivatives_are_continuous_at_the_threshold() {
        let penalty = RelaxedBarrierPenalty::new(0.7, 1e-2);
        let delta = 1e-2;
        let below = delta - 1e-10;
        let above = delta + 1e-10;
        assert_relative_eq!(penalty.value(below), penalty.value(above), epsilon = 1e-6);
        assert_relative_eq!(
            penalty.derivative(below),
            penalty.derivative(above),
            epsilon = 1e-4
        );
        assert_relative_eq!(
            penalty.second_derivative(below),
            penalty.second_derivative(above),
            epsilon = 1e-2
        );
    }

    #[test]
    fn derivative_matches_finite_differences() {
        let penalty = RelaxedBarrierPenalty::new(1.0, 1e-2);
        let h_step = 1e-7;
        for h in [-0.5, 0.0, 5e-3, 0.5, 2.0] {
            let fd = (penalty.value(h + h_step) - penalty.value(h - h_step)) / (2.0 * h_step);
            assert_relative_eq!(penalty.derivative(h), fd, epsilon = 1e-5);
        }
    }

    #[test]
    fn penalty_grows_with_violation() {
        let penalty = RelaxedBarrierPenalty::new(1.0, 1e-2);
        assert!(penalty.value(-1.0) > penalty.value(-0.1));
        assert!(penalty.value(-0.1) > penalty.value(0.1));
    }

    #[test]
    fn second_derivative_is_strictly_positive() {
        let penalty = RelaxedBarrierPenalty::new(1.0, 1e-2);
        for h in [-10.0, -1e-3, 1e-3, 1.0, 100.0] {
            assert!(penalty.second_derivative(h) > 0.0);
        }
    }

    #[test]
    fn quadratic_model_hessian_is_psd() {
        let penalty = RelaxedBarrierPenalty::new(1.0, 1e-2);
        let ineq = LinearApproximation {
            f: DVector::from_vec(vec![0.3, -0.2]),
            dfdx: DMatrix::from_row_slice(2, 2, &[1.0, -1.0, 0.5, 2.0]),
            dfdu: DMatrix::from_row_slice(2, 1, &[1.0, -0.5]),
        };
        let model = penalty.quadratic_model(&ineq);

        // Quadratic form of the full Hessian must be non-negative.
        for trial in [
            (DVector::from_vec(vec![1.0, 0.0]), DVector::from_vec(vec![0.0])),
            (DVector::from_vec(vec![0.0, 1.0]), DVector::from_vec(vec![1.0])),
            (DVector::from_vec(vec![-1.0, 2.0]), DVector::from_vec(vec![0.5])),
        ] {
            let (dx, du) = trial;
            let form = dx.dot(&(&model.dfdxx * &dx))
                + 2.0 * du.dot(&(&model.dfdux * &dx))
                + du.dot(&(&model.dfduu * &du));
            assert!(form >= -1e-12, "indefinite penalty model: {form}");
        }
    }

    #[test]
    fn model_value_matches_total() {
        let penalty = RelaxedBarrierPenalty::new(0.5, 1e-2);
        let ineq = LinearApproximation {
            f: DVector::from_vec(vec![0.4, 0.9]),
            dfdx: DMatrix::zeros(2, 1),
            dfdu: DMatrix::zeros(2, 1),
        };
        let model = penalty.quadratic_model(&ineq);
        assert_relative_eq!(model.f, penalty.total(&ineq.f), epsilon = 1e-12);
    }
}
