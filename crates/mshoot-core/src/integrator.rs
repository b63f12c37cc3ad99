//! Dynamics discretization over shooting intervals
//!
//! Each shooting interval integrates the continuous dynamics with the
//! input held constant. Two variants exist per scheme: the nominal
//! discretizer propagates the state only (used by the line-search
//! performance evaluation), the sensitivity discretizer additionally
//! propagates the exact chain-rule jacobians of the end state with
//! respect to the start state and the input (used by the transcription).

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::dynamics::SystemDynamics;

/// Integration scheme for propagating the dynamics over one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorType {
    /// Explicit Euler, first order.
    Euler,
    /// Heun's method, second order.
    Rk2,
    /// Classic Runge-Kutta, fourth order.
    Rk4,
}

/// End state of one interval together with its sensitivities:
/// `x_next ≈ a·x + b·u` to first order around the expansion point.
#[derive(Debug, Clone)]
pub struct SensitivityStep {
    /// State at the end of the interval.
    pub x_next: DVector<f64>,
    /// Sensitivity of `x_next` with respect to the start state.
    pub a: DMatrix<f64>,
    /// Sensitivity of `x_next` with respect to the (held) input.
    pub b: DMatrix<f64>,
}

/// Propagate the state over `[t, t + dt]` with the input held constant.
pub fn discretize(
    dynamics: &mut dyn SystemDynamics,
    scheme: IntegratorType,
    t: f64,
    dt: f64,
    x: &DVector<f64>,
    u: &DVector<f64>,
) -> DVector<f64> {
    match scheme {
        IntegratorType::Euler => {
            let k1 = dynamics.flow(t, x, u);
            x + dt * k1
        }
        IntegratorType::Rk2 => {
            let k1 = dynamics.flow(t, x, u);
            let k2 = dynamics.flow(t + dt, &(x + dt * &k1), u);
            x + (0.5 * dt) * (k1 + k2)
        }
        IntegratorType::Rk4 => {
            let k1 = dynamics.flow(t, x, u);
            let k2 = dynamics.flow(t + 0.5 * dt, &(x + (0.5 * dt) * &k1), u);
            let k3 = dynamics.flow(t + 0.5 * dt, &(x + (0.5 * dt) * &k2), u);
            let k4 = dynamics.flow(t + dt, &(x + dt * &k3), u);
            x + (dt / 6.0) * (k1 + 2.0 * k2 + 2.0 * k3 + k4)
        }
    }
}

/// Propagate the state and its exact sensitivities over `[t, t + dt]`.
///
/// The jacobians are the derivatives of the discrete map itself, so the
/// pair (nominal, sensitivity) stays consistent for every scheme.
pub fn discretize_sensitivity(
    dynamics: &mut dyn SystemDynamics,
    scheme: IntegratorType,
    t: f64,
    dt: f64,
    x: &DVector<f64>,
    u: &DVector<f64>,
) -> SensitivityStep {
    let nx = x.len();
    let eye = DMatrix::<f64>::identity(nx, nx);
    match scheme {
        IntegratorType::Euler => {
            let s1 = dynamics.linearize(t, x, u);
            SensitivityStep {
                x_next: x + dt * &s1.f,
                a: &eye + dt * &s1.dfdx,
                b: dt * s1.dfdu,
            }
        }
        IntegratorType::Rk2 => {
            let s1 = dynamics.linearize(t, x, u);
            let s2 = dynamics.linearize(t + dt, &(x + dt * &s1.f), u);
            // Chain rule through the intermediate state x + dt·k1.
            let dk2dx = &s2.dfdx * (&eye + dt * &s1.dfdx);
            let dk2du = &s2.dfdx * (dt * &s1.dfdu) + &s2.dfdu;
            SensitivityStep {
                x_next: x + (0.5 * dt) * (&s1.f + &s2.f),
                a: &eye + (0.5 * dt) * (&s1.dfdx + dk2dx),
                b: (0.5 * dt) * (&s1.dfdu + dk2du),
            }
        }
        IntegratorType::Rk4 => {
            let s1 = dynamics.linearize(t, x, u);
            let s2 = dynamics.linearize(t + 0.5 * dt, &(x + (0.5 * dt) * &s1.f), u);
            let s3 = dynamics.linearize(t + 0.5 * dt, &(x + (0.5 * dt) * &s2.f), u);
            let s4 = dynamics.linearize(t + dt, &(x + dt * &s3.f), u);

            let dk1dx = s1.dfdx.clone();
            let dk1du = s1.dfdu.clone();
            let dk2dx = &s2.dfdx * (&eye + (0.5 * dt) * &dk1dx);
            let dk2du = &s2.dfdx * ((0.5 * dt) * &dk1du) + &s2.dfdu;
            let dk3dx = &s3.dfdx * (&eye + (0.5 * dt) * &dk2dx);
            let dk3du = &s3.dfdx * ((0.5 * dt) * &dk2du) + &s3.dfdu;
            let dk4dx = &s4.dfdx * (&eye + dt * &dk3dx);
            let dk4du = &s4.dfdx * (dt * &dk3du) + &s4.dfdu;

            SensitivityStep {
                x_next: x + (dt / 6.0) * (&s1.f + 2.0 * &s2.f + 2.0 * &s3.f + &s4.f),
                a: &eye + (dt / 6.0) * (dk1dx + 2.0 * dk2dx + 2.0 * dk3dx + dk4dx),
                b: (dt / 6.0) * (dk1du + 2.0 * dk2du + 2.0 * dk3du + dk4du),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximation::LinearApproximation;
    use crate::dynamics::LinearSystem;
    use approx::assert_relative_eq;

    /// Pendulum with unit parameters: θ̈ = -sin(θ) + u.
    #[derive(Clone)]
    struct Pendulum;

    impl SystemDynamics for Pendulum {
        fn flow(&mut self, _t: f64, x: &DVector<f64>, u: &DVector<f64>) -> DVector<f64> {
            DVector::from_vec(vec![x[1], -x[0].sin() + u[0]])
        }

        fn linearize(
            &mut self,
            t: f64,
            x: &DVector<f64>,
            u: &DVector<f64>,
        ) -> LinearApproximation {
            LinearApproximation {
                f: self.flow(t, x, u),
                dfdx: DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -x[0].cos(), 0.0]),
                dfdu: DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
            }
        }

        fn clone_box(&self) -> Box<dyn SystemDynamics> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn rk4_integrates_exponential_decay() {
        // dx/dt = -x, exact solution e^{-t}.
        let mut system = LinearSystem::new(
            DMatrix::from_element(1, 1, -1.0),
            DMatrix::zeros(1, 1),
        );
        let u = DVector::zeros(1);
        let mut x = DVector::from_vec(vec![1.0]);
        let dt = 0.01;
        for k in 0..100 {
            x = discretize(&mut system, IntegratorType::Rk4, k as f64 * dt, dt, &x, &u);
        }
        assert_relative_eq!(x[0], (-1.0_f64).exp(), epsilon = 1e-8);
    }

    #[test]
    fn rk4_is_more_accurate_than_euler() {
        let mut system = LinearSystem::new(
            DMatrix::from_element(1, 1, -1.0),
            DMatrix::zeros(1, 1),
        );
        let u = DVector::zeros(1);
        let dt = 0.1;
        let mut x_euler = DVector::from_vec(vec![1.0]);
        let mut x_rk4 = x_euler.clone();
        for k in 0..10 {
            let t = k as f64 * dt;
            x_euler = discretize(&mut system, IntegratorType::Euler, t, dt, &x_euler, &u);
            x_rk4 = discretize(&mut system, IntegratorType::Rk4, t, dt, &x_rk4, &u);
        }
        let exact = (-1.0_f64).exp();
        assert!((x_rk4[0] - exact).abs() < (x_euler[0] - exact).abs() / 100.0);
    }

    #[test]
    fn sensitivity_end_state_matches_nominal() {
        let x = DVector::from_vec(vec![0.3, -0.1]);
        let u = DVector::from_vec(vec![0.2]);
        for scheme in [IntegratorType::Euler, IntegratorType::Rk2, IntegratorType::Rk4] {
            let mut nominal = Pendulum;
            let mut sensitivity = Pendulum;
            let x_next = discretize(&mut nominal, scheme, 0.0, 0.05, &x, &u);
            let step = discretize_sensitivity(&mut sensitivity, scheme, 0.0, 0.05, &x, &u);
            assert_relative_eq!((x_next - step.x_next).norm(), 0.0, epsilon = 1e-14);
        }
    }

    #[test]
    fn sensitivities_match_finite_differences() {
        let x = DVector::from_vec(vec![0.4, 0.7]);
        let u = DVector::from_vec(vec![-0.3]);
        let dt = 0.1;
        let h = 1e-6;

        for scheme in [IntegratorType::Euler, IntegratorType::Rk2, IntegratorType::Rk4] {
            let mut system = Pendulum;
            let step = discretize_sensitivity(&mut system, scheme, 0.0, dt, &x, &u);

            for j in 0..x.len() {
                let mut xp = x.clone();
                xp[j] += h;
                let mut xm = x.clone();
                xm[j] -= h;
                let fp = discretize(&mut system, scheme, 0.0, dt, &xp, &u);
                let fm = discretize(&mut system, scheme, 0.0, dt, &xm, &u);
                let column = (fp - fm) / (2.0 * h);
                for i in 0..x.len() {
                    assert_relative_eq!(step.a[(i, j)], column[i], epsilon = 1e-7);
                }
            }

            let mut up = u.clone();
            up[0] += h;
            let mut um = u.clone();
            um[0] -= h;
            let fp = discretize(&mut system, scheme, 0.0, dt, &x, &up);
            let fm = discretize(&mut system, scheme, 0.0, dt, &x, &um);
            let column = (fp - fm) / (2.0 * h);
            for i in 0..x.len() {
                assert_relative_eq!(step.b[(i, 0)], column[i], epsilon = 1e-7);
            }
        }
    }
}
