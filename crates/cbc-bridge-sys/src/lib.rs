//! Raw FFI declarations for the CBC C shim.
//!
//! The shim wraps `CbcModel` / `OsiClpSolverInterface` behind an opaque
//! `void*` and a handful of C functions. Nothing here is safe to call
//! directly; use the `cbc-bridge` crate instead.
//!
//! Symbols are only linked when the `link` feature is enabled. The build
//! script looks for `libcbc_bridge` under `CBC_BRIDGE_LIB_DIR` and for the
//! COIN-OR libraries under `COIN_LIB_DIR` (default `/usr/local/lib`).

#![allow(non_snake_case, unsafe_code)]
#![no_std]

use core::ffi::{c_double, c_int, c_void};

/// Opaque pointer to the shim's solver state.
pub type CbcHandle = *mut c_void;

/// Return code of every configuration call and of `CBC_Solve` on success.
pub const CBC_OK: c_int = 0;

/// `CBC_GetSolutionStatus`: proven optimal.
pub const CBC_STATUS_OPTIMAL: c_int = 0;
/// `CBC_GetSolutionStatus`: proven infeasible.
pub const CBC_STATUS_INFEASIBLE: c_int = 1;
/// `CBC_GetSolutionStatus`: stopped without proof (limits, unbounded, ...).
pub const CBC_STATUS_OTHER: c_int = 2;

/// Magnitude the engine treats as infinite in bounds and row ranges.
pub const CBC_INFINITY: c_double = 1.0e30;

unsafe extern "C" {
    /// Allocate a solver. Returns null on failure. The model is set up for
    /// maximization.
    pub fn CBC_CreateSolver() -> CbcHandle;

    /// Write `num_vars` dense objective coefficients.
    pub fn CBC_SetObjective(
        solver: CbcHandle,
        num_vars: c_int,
        coefficients: *const c_double,
    ) -> c_int;

    /// Append a sparse row `lb <= sum(values[i] * x[indices[i]]) <= ub`.
    pub fn CBC_AddConstraint(
        solver: CbcHandle,
        num_vars: c_int,
        indices: *const c_int,
        values: *const c_double,
        lb: c_double,
        ub: c_double,
    ) -> c_int;

    pub fn CBC_SetVariableBounds(
        solver: CbcHandle,
        index: c_int,
        lb: c_double,
        ub: c_double,
    ) -> c_int;

    pub fn CBC_SetVariableInteger(solver: CbcHandle, index: c_int) -> c_int;

    /// Run branch-and-cut. Blocks until the engine stops.
    pub fn CBC_Solve(solver: CbcHandle) -> c_int;

    /// One of the `CBC_STATUS_*` codes, or -1 when no solve has happened.
    pub fn CBC_GetSolutionStatus(solver: CbcHandle) -> c_int;

    /// Objective of the stored optimum, 0.0 when there is none.
    pub fn CBC_GetObjectiveValue(solver: CbcHandle) -> c_double;

    /// Copy up to `size` values of the stored optimum into `solution`.
    /// Returns the number of values written or -1.
    pub fn CBC_GetSolution(solver: CbcHandle, solution: *mut c_double, size: c_int) -> c_int;

    pub fn CBC_FreeSolver(solver: CbcHandle);
}
