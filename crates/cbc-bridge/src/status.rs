//! Solver status types and native code translation.

use cbc_bridge_sys::{CBC_STATUS_INFEASIBLE, CBC_STATUS_OPTIMAL};
use serde::{Deserialize, Serialize};
use std::ffi::c_int;

/// Terminal outcome of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Problem is proven infeasible.
    Infeasible,
    /// Anything else the engine reports (limits, unbounded, no status).
    Other,
}

impl SolverStatus {
    /// Check if the status indicates an optimal solution.
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Check if the status indicates infeasibility.
    pub fn is_infeasible(self) -> bool {
        matches!(self, SolverStatus::Infeasible)
    }

    /// Get a human-readable string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Other => "other",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Translate a raw `GetSolutionStatus` code. Unknown codes are `Other`.
pub(crate) fn status_from_native(code: c_int) -> SolverStatus {
    match code {
        CBC_STATUS_OPTIMAL => SolverStatus::Optimal,
        CBC_STATUS_INFEASIBLE => SolverStatus::Infeasible,
        _ => SolverStatus::Other,
    }
}
