//! Performance bookkeeping
//!
//! One [`PerformanceIndex`] summarizes an iterate: total cost, the
//! integrated squared errors of each constraint family, the inequality
//! penalty, and the merit driving the line-search. Each worker thread
//! accumulates a local index over the nodes it claims; the solver then
//! reduces the per-worker indices left to right in worker-id order, so
//! the summation stays bit-reproducible for a fixed thread count.

use std::ops::{Add, AddAssign};

/// Cost and constraint-violation summary of one trajectory.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceIndex {
    /// Line-search merit: total cost plus the inequality penalty.
    pub merit: f64,
    /// Accumulated cost quadrature.
    pub total_cost: f64,
    /// Squared dynamics defects plus the initial-condition residual.
    pub state_eq_constraint_ise: f64,
    /// Squared state-input equality residuals.
    pub state_input_eq_constraint_ise: f64,
    /// Squared inequality violations.
    pub inequality_constraint_ise: f64,
    /// Accumulated relaxed-barrier penalty.
    pub inequality_constraint_penalty: f64,
}

impl PerformanceIndex {
    /// Norm of the combined constraint violation used by the filter.
    pub fn constraint_violation(&self) -> f64 {
        (self.state_eq_constraint_ise
            + self.state_input_eq_constraint_ise
            + self.inequality_constraint_ise)
            .sqrt()
    }
}

impl AddAssign for PerformanceIndex {
    fn add_assign(&mut self, rhs: Self) {
        self.merit += rhs.merit;
        self.total_cost += rhs.total_cost;
        self.state_eq_constraint_ise += rhs.state_eq_constraint_ise;
        self.state_input_eq_constraint_ise += rhs.state_input_eq_constraint_ise;
        self.inequality_constraint_ise += rhs.inequality_constraint_ise;
        self.inequality_constraint_penalty += rhs.inequality_constraint_penalty;
    }
}

impl Add for PerformanceIndex {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn addition_is_componentwise() {
        let a = PerformanceIndex {
            total_cost: 1.0,
            state_eq_constraint_ise: 2.0,
            ..Default::default()
        };
        let b = PerformanceIndex {
            total_cost: 0.5,
            inequality_constraint_penalty: 3.0,
            ..Default::default()
        };
        let sum = a + b;
        assert_relative_eq!(sum.total_cost, 1.5);
        assert_relative_eq!(sum.state_eq_constraint_ise, 2.0);
        assert_relative_eq!(sum.inequality_constraint_penalty, 3.0);
    }

    #[test]
    fn violation_combines_all_ise_terms() {
        let index = PerformanceIndex {
            state_eq_constraint_ise: 9.0,
            state_input_eq_constraint_ise: 16.0,
            ..Default::default()
        };
        assert_relative_eq!(index.constraint_violation(), 5.0);
    }
}
