//! Primal solution container

use nalgebra::DVector;

use mshoot_core::controller::Controller;
use mshoot_core::trajectory::ModeSchedule;

/// Optimized trajectory plus the controller recovered from the final QP.
///
/// The input trajectory is padded by duplicating its last element, so
/// all three sequences share the grid length N + 1.
#[derive(Debug, Clone, Default)]
pub struct PrimalSolution {
    /// Shooting grid, including duplicated event instants.
    pub time_grid: Vec<f64>,
    /// State trajectory, length N + 1.
    pub states: Vec<DVector<f64>>,
    /// Input trajectory, padded to length N + 1.
    pub inputs: Vec<DVector<f64>>,
    /// Mode schedule the grid honors.
    pub mode_schedule: ModeSchedule,
    /// Emitted control policy; absent before the first solve.
    pub controller: Option<Controller>,
}

impl PrimalSolution {
    /// Whether a solve has populated this solution.
    pub fn is_empty(&self) -> bool {
        self.time_grid.is_empty()
    }
}
