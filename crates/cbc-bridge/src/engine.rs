//! The native call surface.
//!
//! This module contains unsafe code for interacting with the C library.
#![allow(unsafe_code)]

use std::ffi::{c_double, c_int, c_void};
use std::fmt;

/// Identifies a fallible native call in errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeCall {
    SetObjective,
    AddConstraint,
    SetVariableBounds,
    SetVariableInteger,
    GetSolution,
}

impl NativeCall {
    /// The ABI symbol name.
    pub fn as_str(self) -> &'static str {
        match self {
            NativeCall::SetObjective => "CBC_SetObjective",
            NativeCall::AddConstraint => "CBC_AddConstraint",
            NativeCall::SetVariableBounds => "CBC_SetVariableBounds",
            NativeCall::SetVariableInteger => "CBC_SetVariableInteger",
            NativeCall::GetSolution => "CBC_GetSolution",
        }
    }
}

impl fmt::Display for NativeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One associated function per call of the fixed foreign ABI.
///
/// Return-code conventions follow the C shim: `0` is success for the
/// configuration calls and `solve`; `solution_status` returns one of the
/// `CBC_STATUS_*` codes; `solution` returns the count written or a negative
/// value.
///
/// # Safety
///
/// Implementors must uphold the shim's contract: `create` returns either null
/// or a pointer that stays valid until passed to `free`, and every other
/// function only reads `n` elements from the arrays it is given and writes at
/// most `n` elements to `out`. Callers guarantee that `handle` came from
/// `create` of the same engine and has not been freed, that array pointers
/// are valid for `n` elements for the duration of the call, and that no two
/// calls on one handle run concurrently.
pub unsafe trait NativeEngine {
    /// Short name for logs.
    const NAME: &'static str;

    fn create() -> *mut c_void;

    unsafe fn set_objective(handle: *mut c_void, n: c_int, coeffs: *const c_double) -> c_int;

    unsafe fn add_constraint(
        handle: *mut c_void,
        n: c_int,
        indices: *const c_int,
        values: *const c_double,
        lb: c_double,
        ub: c_double,
    ) -> c_int;

    unsafe fn set_variable_bounds(
        handle: *mut c_void,
        index: c_int,
        lb: c_double,
        ub: c_double,
    ) -> c_int;

    unsafe fn set_variable_integer(handle: *mut c_void, index: c_int) -> c_int;

    unsafe fn solve(handle: *mut c_void) -> c_int;

    unsafe fn solution_status(handle: *mut c_void) -> c_int;

    unsafe fn objective_value(handle: *mut c_void) -> c_double;

    unsafe fn solution(handle: *mut c_void, out: *mut c_double, n: c_int) -> c_int;

    unsafe fn free(handle: *mut c_void);
}

/// The COIN-OR CBC engine behind the C shim.
#[cfg(feature = "native")]
#[derive(Debug, Clone, Copy)]
pub struct Cbc;

#[cfg(feature = "native")]
unsafe impl NativeEngine for Cbc {
    const NAME: &'static str = "cbc";

    fn create() -> *mut c_void {
        unsafe { cbc_bridge_sys::CBC_CreateSolver() }
    }

    unsafe fn set_objective(handle: *mut c_void, n: c_int, coeffs: *const c_double) -> c_int {
        unsafe { cbc_bridge_sys::CBC_SetObjective(handle, n, coeffs) }
    }

    unsafe fn add_constraint(
        handle: *mut c_void,
        n: c_int,
        indices: *const c_int,
        values: *const c_double,
        lb: c_double,
        ub: c_double,
    ) -> c_int {
        unsafe { cbc_bridge_sys::CBC_AddConstraint(handle, n, indices, values, lb, ub) }
    }

    unsafe fn set_variable_bounds(
        handle: *mut c_void,
        index: c_int,
        lb: c_double,
        ub: c_double,
    ) -> c_int {
        unsafe { cbc_bridge_sys::CBC_SetVariableBounds(handle, index, lb, ub) }
    }

    unsafe fn set_variable_integer(handle: *mut c_void, index: c_int) -> c_int {
        unsafe { cbc_bridge_sys::CBC_SetVariableInteger(handle, index) }
    }

    unsafe fn solve(handle: *mut c_void) -> c_int {
        unsafe { cbc_bridge_sys::CBC_Solve(handle) }
    }

    unsafe fn solution_status(handle: *mut c_void) -> c_int {
        unsafe { cbc_bridge_sys::CBC_GetSolutionStatus(handle) }
    }

    unsafe fn objective_value(handle: *mut c_void) -> c_double {
        unsafe { cbc_bridge_sys::CBC_GetObjectiveValue(handle) }
    }

    unsafe fn solution(handle: *mut c_void, out: *mut c_double, n: c_int) -> c_int {
        unsafe { cbc_bridge_sys::CBC_GetSolution(handle, out, n) }
    }

    unsafe fn free(handle: *mut c_void) {
        unsafe { cbc_bridge_sys::CBC_FreeSolver(handle) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_call_names() {
        assert_eq!(NativeCall::SetObjective.to_string(), "CBC_SetObjective");
        assert_eq!(NativeCall::GetSolution.as_str(), "CBC_GetSolution");
    }
}
