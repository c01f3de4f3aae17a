//! Result extraction and the owned solution type.
#![allow(unsafe_code)]

use crate::engine::{NativeCall, NativeEngine};
use crate::error::BridgeError;
use crate::model::to_c_int;
use crate::solver::Solver;
use crate::status::SolverStatus;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Owned copy of a solve's results, detached from the native instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Terminal status of the solve
    pub(crate) status: SolverStatus,
    /// Objective value as reported by the engine (negated by the CBC shim)
    pub(crate) objective_value: f64,
    /// Variable values indexed 0..n-1, empty unless optimal
    pub(crate) values: Vec<f64>,
    /// Wall time of the native solve call
    pub(crate) solve_time_seconds: f64,
}

impl Solution {
    /// Get the value of the variable at the given index
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Get all variable values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn objective_value(&self) -> f64 {
        self.objective_value
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn solve_time_seconds(&self) -> f64 {
        self.solve_time_seconds
    }

    /// Consume the solution, returning the value vector
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

impl<E: NativeEngine> Solver<E> {
    /// Objective value of the last solve, exactly as the engine reports it.
    ///
    /// The CBC shim maximizes but returns the negated objective, so a model
    /// whose best value is `732` reads back as `-732`. Only meaningful when
    /// [`status`](Self::status) is `Optimal`; the call itself does not check.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before a successful solve or after free.
    pub fn objective_value(&self) -> Result<f64, BridgeError> {
        let handle = self.solved_handle("objective_value")?;
        // SAFETY: `handle` is live; the call only reads native state.
        let value = unsafe { E::objective_value(handle) };
        trace!(
            component = "solution",
            operation = "objective_value",
            status = "success",
            objective_value = value,
            "Read objective value"
        );
        Ok(value)
    }

    /// Copy the solution vector out of the engine.
    ///
    /// The vector always has [`num_variables`](Self::num_variables) entries
    /// and is owned by the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before a successful solve or after free,
    /// `NativeCallFailed` when the engine holds no solution (e.g. the model
    /// is infeasible) and `IncompleteSolution` when it wrote fewer values
    /// than declared variables.
    pub fn solution(&self) -> Result<Vec<f64>, BridgeError> {
        const OPERATION: &str = "solution";
        let handle = self.solved_handle(OPERATION)?;
        let expected = self.dims.num_variables;
        if expected == 0 {
            return Ok(Vec::new());
        }
        let n = to_c_int(OPERATION, "variable count", expected)?;

        let mut values = vec![0.0; expected];
        // SAFETY: `values` has room for exactly `n` doubles and is not
        // touched by anything else until the call returns.
        let written = unsafe { E::solution(handle, values.as_mut_ptr(), n) };
        if written < 0 {
            warn!(
                component = "solution",
                operation = NativeCall::GetSolution.as_str(),
                status = "error",
                status_code = written,
                "Engine holds no solution"
            );
            return Err(BridgeError::NativeCallFailed {
                call: NativeCall::GetSolution,
            });
        }
        let written = written as usize;
        if written != expected {
            warn!(
                component = "solution",
                operation = OPERATION,
                status = "error",
                expected,
                written,
                "Engine wrote a different number of values than declared"
            );
            return Err(BridgeError::IncompleteSolution { expected, written });
        }

        trace!(
            component = "solution",
            operation = OPERATION,
            status = "success",
            num_values = expected,
            "Copied solution vector"
        );
        Ok(values)
    }

    /// Status, objective and (when optimal) values in one owned value.
    ///
    /// # Errors
    ///
    /// Same as [`status`](Self::status) and [`solution`](Self::solution).
    pub fn snapshot(&self) -> Result<Solution, BridgeError> {
        let status = self.status()?;
        let objective_value = self.objective_value()?;
        let values = if status.is_optimal() {
            self.solution()?
        } else {
            Vec::new()
        };

        debug!(
            component = "solution",
            operation = "snapshot",
            status = "success",
            solver_status = %status,
            objective_value,
            num_values = values.len(),
            "Solution extracted"
        );

        Ok(Solution {
            status,
            objective_value,
            values,
            solve_time_seconds: self.solve_time_seconds.unwrap_or_default(),
        })
    }
}
