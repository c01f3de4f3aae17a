//! Error types for bridge operations.

use crate::engine::NativeCall;
use crate::solver::SolverState;

/// Error type for every fallible bridge operation.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The native allocator/initializer returned no handle.
    CreationFailed,
    /// Caller input rejected before reaching the native boundary.
    InvalidInput {
        operation: &'static str,
        reason: String,
    },
    /// A configuration or extraction call reported failure.
    NativeCallFailed { call: NativeCall },
    /// The native solve itself failed (not an infeasibility).
    SolveFailed,
    /// Operation is not allowed in the solver's current lifecycle state.
    InvalidState {
        operation: &'static str,
        state: SolverState,
    },
    /// The engine wrote fewer solution values than declared variables.
    IncompleteSolution { expected: usize, written: usize },
}

impl BridgeError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::CreationFailed => "SOLVER_CREATION_FAILED",
            BridgeError::InvalidInput { .. } => "INPUT_INVALID",
            BridgeError::NativeCallFailed { .. } => "NATIVE_CALL_FAILED",
            BridgeError::SolveFailed => "SOLVE_FAILED",
            BridgeError::InvalidState { .. } => "STATE_INVALID",
            BridgeError::IncompleteSolution { .. } => "SOLUTION_INCOMPLETE",
        }
    }

    pub(crate) fn invalid_input(operation: &'static str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidInput {
            operation,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::CreationFailed => {
                write!(f, "[{}] Native solver could not be created", self.code())
            }
            BridgeError::InvalidInput { operation, reason } => {
                write!(f, "[{}] Invalid input to {}: {}", self.code(), operation, reason)
            }
            BridgeError::NativeCallFailed { call } => {
                write!(f, "[{}] Native call {} failed", self.code(), call)
            }
            BridgeError::SolveFailed => {
                write!(f, "[{}] Native solve reported an internal failure", self.code())
            }
            BridgeError::InvalidState { operation, state } => write!(
                f,
                "[{}] Cannot call {} while solver is {}",
                self.code(),
                operation,
                state
            ),
            BridgeError::IncompleteSolution { expected, written } => write!(
                f,
                "[{}] Engine wrote {} of {} solution values",
                self.code(),
                written,
                expected
            ),
        }
    }
}

impl std::error::Error for BridgeError {}
