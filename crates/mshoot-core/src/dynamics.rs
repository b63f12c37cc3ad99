//! Continuous-time system dynamics interface
//!
//! The solver sees the controlled system as a vector field
//! ẋ = f(t, x, u) with jacobians. Implementations may carry internal
//! scratch state; the solver obtains one instance per worker thread via
//! [`SystemDynamics::clone_box`], so evaluation methods take `&mut self`
//! without any cross-thread aliasing.

use nalgebra::{DMatrix, DVector};

use crate::approximation::LinearApproximation;

/// Continuous-time vector field of the controlled system.
pub trait SystemDynamics: Send {
    /// Flow value ẋ = f(t, x, u).
    fn flow(&mut self, t: f64, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64>;

    /// Flow value together with its state and input jacobians.
    fn linearize(&mut self, t: f64, x: &DVector<f64>, u: &DVector<f64>) -> LinearApproximation;

    /// Independent copy for a worker thread.
    fn clone_box(&self) -> Box<dyn SystemDynamics>;
}

impl Clone for Box<dyn SystemDynamics> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Time-invariant linear system ẋ = A·x + B·u.
#[derive(Debug, Clone)]
pub struct LinearSystem {
    a: DMatrix<f64>,
    b: DMatrix<f64>,
}

impl LinearSystem {
    /// Create the system from its state and input matrices.
    ///
    /// # Panics
    /// Panics if the row counts of `a` and `b` disagree or `a` is not square.
    pub fn new(a: DMatrix<f64>, b: DMatrix<f64>) -> Self {
        assert_eq!(a.nrows(), a.ncols(), "state matrix must be square");
        assert_eq!(a.nrows(), b.nrows(), "A and B must have equal row counts");
        Self { a, b }
    }
}

impl SystemDynamics for LinearSystem {
    fn flow(&mut self, _t: f64, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
        &self.a * x + &self.b * u
    }

    fn linearize(&mut self, _t: f64, x: &DVector<f64>, u: &DVector<f64>) -> LinearApproximation {
        LinearApproximation {
            f: &self.a * x + &self.b * u,
            dfdx: self.a.clone(),
            dfdu: self.b.clone(),
        }
    }

    fn clone_box(&self) -> Box<dyn SystemDynamics> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_system_flow_and_jacobians() {
        let a = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]);
        let b = DMatrix::from_row_slice(2, 1, &[0.0, 1.0]);
        let mut system = LinearSystem::new(a.clone(), b.clone());

        let x = DVector::from_vec(vec![1.0, 2.0]);
        let u = DVector::from_vec(vec![0.5]);

        let dx = system.flow(0.0, &x, &u);
        assert_relative_eq!(dx[0], 2.0);
        assert_relative_eq!(dx[1], -0.5);

        let lin = system.linearize(0.0, &x, &u);
        assert_eq!(lin.dfdx, a);
        assert_eq!(lin.dfdu, b);
        assert_relative_eq!(lin.f[1], -0.5);
    }

    #[test]
    fn boxed_clone_is_independent() {
        let mut system: Box<dyn SystemDynamics> = Box::new(LinearSystem::new(
            DMatrix::identity(1, 1),
            DMatrix::identity(1, 1),
        ));
        let mut copy = system.clone();

        let x = DVector::from_vec(vec![3.0]);
        let u = DVector::from_vec(vec![1.0]);
        assert_eq!(system.flow(0.0, &x, &u), copy.flow(0.0, &x, &u));
    }
}
