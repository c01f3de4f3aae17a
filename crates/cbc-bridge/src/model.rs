//! Model builder methods: objective, bounds, integrality, sparse rows.
//!
//! Every method validates its input before touching the native side, then
//! hands the engine pointers into buffers that live for the duration of the
//! call only. Nothing is retained after the call returns.
#![allow(unsafe_code)]

use crate::engine::{NativeCall, NativeEngine};
use crate::error::BridgeError;
use crate::solver::{Solver, SolverState};
use cbc_bridge_sys::CBC_OK;
use std::ffi::c_int;
use tracing::{trace, warn};

/// Problem dimensions as declared through the builder.
///
/// `num_variables` only ever grows: it is the largest variable index any
/// successful call referenced, plus one. It sizes the solution buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ModelDimensions {
    pub(crate) num_variables: usize,
    pub(crate) num_constraints: usize,
}

impl ModelDimensions {
    fn declare_variables(&mut self, count: usize) {
        self.num_variables = self.num_variables.max(count);
    }

    fn declare_index(&mut self, index: usize) {
        self.declare_variables(index + 1);
    }
}

impl<E: NativeEngine> Solver<E> {
    /// Write the dense objective `coeffs[0..n]`.
    ///
    /// The engine maximizes this objective.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty or NaN-containing slice and
    /// `NativeCallFailed` if the engine rejects it.
    pub fn set_objective(&mut self, coeffs: &[f64]) -> Result<(), BridgeError> {
        const OPERATION: &str = "set_objective";
        let handle = self.configurable_handle(OPERATION)?;
        if coeffs.is_empty() {
            return Err(reject_input(OPERATION, "objective coefficients are empty"));
        }
        check_not_nan(OPERATION, "objective coefficient", coeffs)?;
        let n = to_c_int(OPERATION, "objective length", coeffs.len())?;

        // SAFETY: `coeffs` is borrowed for the whole call and holds `n` values.
        let code = unsafe { E::set_objective(handle, n, coeffs.as_ptr()) };
        check_native(NativeCall::SetObjective, code)?;

        self.dims.declare_variables(coeffs.len());
        self.state = SolverState::Configured;
        trace!(
            component = "model",
            operation = OPERATION,
            status = "success",
            num_coeffs = coeffs.len(),
            num_variables = self.dims.num_variables,
            "Set objective"
        );
        Ok(())
    }

    /// Set `lower <= x[index] <= upper`.
    ///
    /// Infinite bounds are sent as the configured sentinel. `lower <= upper`
    /// is left for the engine to judge.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for NaN bounds or an index beyond the ABI's
    /// `int`, and `NativeCallFailed` if the engine rejects the call.
    pub fn set_variable_bounds(
        &mut self,
        index: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), BridgeError> {
        const OPERATION: &str = "set_variable_bounds";
        let handle = self.configurable_handle(OPERATION)?;
        check_not_nan(OPERATION, "bound", &[lower, upper])?;
        let c_index = to_c_index(OPERATION, index)?;
        let (lb, ub) = (
            self.config.native_bound(lower),
            self.config.native_bound(upper),
        );

        // SAFETY: scalar arguments only.
        let code = unsafe { E::set_variable_bounds(handle, c_index, lb, ub) };
        check_native(NativeCall::SetVariableBounds, code)?;

        self.dims.declare_index(index);
        self.state = SolverState::Configured;
        trace!(
            component = "model",
            operation = OPERATION,
            status = "success",
            index,
            lb,
            ub,
            "Set variable bounds"
        );
        Ok(())
    }

    /// Append the sparse row `lower <= sum(values[k] * x[indices[k]]) <= upper`.
    ///
    /// Repeated indices are forwarded as given. Use `f64::INFINITY` (or the
    /// sentinel) for a one-sided row.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when either slice is empty, their lengths
    /// differ, a value or bound is NaN, or an index does not fit the ABI's
    /// `int`; the native side is not called in those cases. Returns
    /// `NativeCallFailed` if the engine rejects the row.
    pub fn add_constraint(
        &mut self,
        indices: &[usize],
        values: &[f64],
        lower: f64,
        upper: f64,
    ) -> Result<(), BridgeError> {
        const OPERATION: &str = "add_constraint";
        let handle = self.configurable_handle(OPERATION)?;
        if indices.is_empty() || values.is_empty() {
            return Err(reject_input(OPERATION, "constraint has no coefficients"));
        }
        if indices.len() != values.len() {
            return Err(reject_input(
                OPERATION,
                format!(
                    "{} indices but {} values",
                    indices.len(),
                    values.len()
                ),
            ));
        }
        check_not_nan(OPERATION, "coefficient", values)?;
        check_not_nan(OPERATION, "bound", &[lower, upper])?;
        let n = to_c_int(OPERATION, "constraint length", indices.len())?;

        // Call-scoped copy in the ABI's index type.
        let c_indices = indices
            .iter()
            .map(|&index| to_c_index(OPERATION, index))
            .collect::<Result<Vec<c_int>, _>>()?;
        let max_index = indices.iter().copied().max().unwrap_or_default();
        let (lb, ub) = (
            self.config.native_bound(lower),
            self.config.native_bound(upper),
        );

        // SAFETY: `c_indices` and `values` both hold `n` elements and outlive
        // the call; the engine copies what it keeps.
        let code = unsafe {
            E::add_constraint(handle, n, c_indices.as_ptr(), values.as_ptr(), lb, ub)
        };
        check_native(NativeCall::AddConstraint, code)?;

        self.dims.declare_index(max_index);
        self.dims.num_constraints += 1;
        self.state = SolverState::Configured;
        trace!(
            component = "model",
            operation = OPERATION,
            status = "success",
            row = self.dims.num_constraints - 1,
            num_coeffs = indices.len(),
            lb,
            ub,
            "Added constraint"
        );
        Ok(())
    }

    /// Mark `x[index]` as integer. Repeating the call changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an index beyond the ABI's `int` and
    /// `NativeCallFailed` if the engine rejects the call.
    pub fn set_variable_integer(&mut self, index: usize) -> Result<(), BridgeError> {
        const OPERATION: &str = "set_variable_integer";
        let handle = self.configurable_handle(OPERATION)?;
        let c_index = to_c_index(OPERATION, index)?;

        // SAFETY: scalar arguments only.
        let code = unsafe { E::set_variable_integer(handle, c_index) };
        check_native(NativeCall::SetVariableInteger, code)?;

        self.dims.declare_index(index);
        self.state = SolverState::Configured;
        trace!(
            component = "model",
            operation = OPERATION,
            status = "success",
            index,
            "Set variable integer"
        );
        Ok(())
    }
}

fn reject_input(operation: &'static str, reason: impl Into<String>) -> BridgeError {
    let err = BridgeError::invalid_input(operation, reason);
    warn!(
        component = "model",
        operation,
        status = "error",
        error = %err,
        "Rejected input before native call"
    );
    err
}

fn check_not_nan(operation: &'static str, what: &str, values: &[f64]) -> Result<(), BridgeError> {
    match values.iter().position(|v| v.is_nan()) {
        Some(position) => Err(reject_input(
            operation,
            format!("{what} at position {position} is NaN"),
        )),
        None => Ok(()),
    }
}

pub(crate) fn to_c_int(
    operation: &'static str,
    what: &str,
    value: usize,
) -> Result<c_int, BridgeError> {
    c_int::try_from(value).map_err(|_| {
        reject_input(
            operation,
            format!("{what} {value} exceeds the native limit {}", c_int::MAX),
        )
    })
}

/// Convert a variable index, leaving room for `index + 1` as the tracked
/// variable count so the solution buffer size always fits the ABI.
fn to_c_index(operation: &'static str, index: usize) -> Result<c_int, BridgeError> {
    let c_index = to_c_int(operation, "variable index", index)?;
    if c_index == c_int::MAX {
        return Err(reject_input(
            operation,
            format!(
                "variable index {index} leaves no room for the variable count (max index {})",
                c_int::MAX - 1
            ),
        ));
    }
    Ok(c_index)
}

pub(crate) fn check_native(call: NativeCall, code: c_int) -> Result<(), BridgeError> {
    if code == CBC_OK {
        return Ok(());
    }
    warn!(
        component = "model",
        operation = call.as_str(),
        status = "error",
        status_code = code,
        "Native call failed"
    );
    Err(BridgeError::NativeCallFailed { call })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, ScriptedEngine};

    type TestSolver = Solver<ScriptedEngine>;

    #[test]
    fn test_dimensions_are_monotonic() {
        let mut dims = ModelDimensions::default();
        dims.declare_variables(3);
        dims.declare_index(1);
        assert_eq!(dims.num_variables, 3);
        dims.declare_index(7);
        assert_eq!(dims.num_variables, 8);
        dims.declare_variables(2);
        assert_eq!(dims.num_variables, 8);
    }

    #[test]
    fn test_objective_sets_variable_count() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(solver.num_variables(), 3);
        assert_eq!(solver.state(), SolverState::Configured);

        // A shorter objective never shrinks the count.
        solver.set_objective(&[4.0]).unwrap();
        assert_eq!(solver.num_variables(), 3);
    }

    #[test]
    fn test_empty_objective_rejected() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        let err = solver.set_objective(&[]).unwrap_err();
        assert_eq!(err.code(), "INPUT_INVALID");
        assert_eq!(testkit::counters().native_calls, 0);
        assert_eq!(solver.state(), SolverState::Created);
    }

    #[test]
    fn test_nan_rejected_before_native_call() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        assert!(solver.set_objective(&[1.0, f64::NAN]).is_err());
        assert!(solver.set_variable_bounds(0, f64::NAN, 1.0).is_err());
        assert!(
            solver
                .add_constraint(&[0], &[f64::NAN], 0.0, 1.0)
                .is_err()
        );
        assert_eq!(testkit::counters().native_calls, 0);
    }

    #[test]
    fn test_bounds_and_integer_raise_count() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_variable_bounds(4, 0.0, 10.0).unwrap();
        assert_eq!(solver.num_variables(), 5);
        solver.set_variable_integer(6).unwrap();
        solver.set_variable_integer(6).unwrap();
        assert_eq!(solver.num_variables(), 7);
    }

    #[test]
    fn test_inverted_bounds_forwarded() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_variable_bounds(0, 5.0, 1.0).unwrap();
        assert_eq!(testkit::counters().native_calls, 1);
    }

    #[test]
    fn test_constraint_length_mismatch() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        let err = solver
            .add_constraint(&[0, 1, 2], &[1.0, 1.0], f64::NEG_INFINITY, 10.0)
            .unwrap_err();
        assert!(err.to_string().contains("3 indices but 2 values"));
        assert!(solver.add_constraint(&[], &[], 0.0, 1.0).is_err());
        assert_eq!(testkit::counters().native_calls, 0);
        assert_eq!(solver.num_constraints(), 0);
        assert_eq!(solver.num_variables(), 0);
    }

    #[test]
    fn test_constraint_raises_count_from_max_index() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver
            .add_constraint(&[2, 9, 2], &[1.0, 1.0, 3.0], f64::NEG_INFINITY, 5.0)
            .unwrap();
        assert_eq!(solver.num_variables(), 10);
        assert_eq!(solver.num_constraints(), 1);
    }

    #[test]
    fn test_index_beyond_c_int_rejected() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        let huge = c_int::MAX as usize + 1;
        assert!(solver.set_variable_integer(huge).is_err());
        assert!(solver.set_variable_bounds(huge, 0.0, 1.0).is_err());
        assert!(solver.add_constraint(&[0, huge], &[1.0, 1.0], 0.0, 1.0).is_err());
        assert_eq!(testkit::counters().native_calls, 0);
        assert_eq!(solver.num_variables(), 0);
    }

    #[test]
    fn test_largest_c_int_index_rejected() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        let last = c_int::MAX as usize;
        for err in [
            solver.set_variable_integer(last).unwrap_err(),
            solver.set_variable_bounds(last, 0.0, 1.0).unwrap_err(),
            solver
                .add_constraint(&[0, last], &[1.0, 1.0], 0.0, 1.0)
                .unwrap_err(),
        ] {
            assert_eq!(err.code(), "INPUT_INVALID");
            assert!(err.to_string().contains("variable count"));
        }
        assert_eq!(testkit::counters().native_calls, 0);
        assert_eq!(solver.num_variables(), 0);

        solver.set_objective(&[1.0]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.solution().unwrap().len(), 1);
    }

    #[test]
    fn test_native_failure_surfaces_without_rollback() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0, 1.0]).unwrap();
        testkit::script(|s| s.fail_call = Some(NativeCall::SetVariableBounds));
        let err = solver.set_variable_bounds(3, 0.0, 1.0).unwrap_err();
        assert_eq!(
            err,
            BridgeError::NativeCallFailed {
                call: NativeCall::SetVariableBounds
            }
        );
        assert_eq!(solver.num_variables(), 2);
        assert_eq!(solver.state(), SolverState::Configured);
    }

    #[test]
    fn test_configuration_after_solve_rejected() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0]).unwrap();
        solver.solve().unwrap();
        let calls = testkit::counters().native_calls;
        assert_eq!(
            solver.set_variable_integer(0).unwrap_err(),
            BridgeError::InvalidState {
                operation: "set_variable_integer",
                state: SolverState::Solved
            }
        );
        assert!(solver.add_constraint(&[0], &[1.0], 0.0, 1.0).is_err());
        assert_eq!(testkit::counters().native_calls, calls);
    }
}
