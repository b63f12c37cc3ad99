//! Filter line-search acceptance rule
//!
//! A candidate step is judged on two axes: merit (cost plus inequality
//! penalty) and constraint violation. Large violations are rejected
//! outright; nearly feasible candidates compete on merit alone; in
//! between, either a sufficient merit decrease or a sufficient violation
//! decrease admits the step. Follows Wächter and Biegler's filter
//! line-search for interior-point NLP.

use crate::performance::PerformanceIndex;

/// Acceptance parameters of the filter.
#[derive(Debug, Clone, Copy)]
pub struct FilterLinesearch {
    /// Step contraction factor.
    pub alpha_decay: f64,
    /// Smallest step size tried.
    pub alpha_min: f64,
    /// Mixing parameter for the medium-violation band.
    pub gamma_c: f64,
    /// Candidates above this violation are rejected outright.
    pub g_max: f64,
    /// Below this violation only the merit decides.
    pub g_min: f64,
}

impl FilterLinesearch {
    /// Whether `candidate` is acceptable against `baseline`.
    pub fn accepts(&self, baseline: &PerformanceIndex, candidate: &PerformanceIndex) -> bool {
        let violation = candidate.constraint_violation();
        let baseline_violation = baseline.constraint_violation();

        if violation > self.g_max {
            false
        } else if violation < self.g_min {
            // Close to feasible, only the merit matters.
            candidate.merit < baseline.merit
        } else {
            candidate.merit < baseline.merit - self.gamma_c * baseline_violation
                || violation < (1.0 - self.gamma_c) * baseline_violation
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> FilterLinesearch {
        FilterLinesearch {
            alpha_decay: 0.5,
            alpha_min: 1e-4,
            gamma_c: 0.1,
            g_max: 1.0,
            g_min: 1e-3,
        }
    }

    fn index(merit: f64, state_eq_ise: f64) -> PerformanceIndex {
        PerformanceIndex {
            merit,
            state_eq_constraint_ise: state_eq_ise,
            ..Default::default()
        }
    }

    #[test]
    fn excessive_violation_is_rejected_regardless_of_merit() {
        let baseline = index(10.0, 0.0);
        let candidate = index(-100.0, 4.0);
        assert!(!filter().accepts(&baseline, &candidate));
    }

    #[test]
    fn feasible_candidates_compete_on_merit() {
        let baseline = index(10.0, 0.0);
        assert!(filter().accepts(&baseline, &index(9.0, 0.0)));
        assert!(!filter().accepts(&baseline, &index(11.0, 0.0)));
        assert!(!filter().accepts(&baseline, &index(10.0, 0.0)));
    }

    #[test]
    fn medium_violation_accepts_on_merit_decrease() {
        let baseline = index(10.0, 0.25);
        // Violation unchanged, merit clearly lower.
        let candidate = index(5.0, 0.25);
        assert!(filter().accepts(&baseline, &candidate));
    }

    #[test]
    fn medium_violation_accepts_on_violation_decrease() {
        let baseline = index(10.0, 0.25);
        // Merit worse, violation clearly reduced.
        let candidate = index(12.0, 0.04);
        assert!(filter().accepts(&baseline, &candidate));
    }

    #[test]
    fn medium_violation_rejects_when_neither_improves() {
        let baseline = index(10.0, 0.25);
        let candidate = index(10.0, 0.25);
        assert!(!filter().accepts(&baseline, &candidate));
    }
}
