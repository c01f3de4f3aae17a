//! In-process engine following the C shim's contract.
#![allow(unsafe_code)]

use super::{current_script, record};
use crate::engine::{NativeCall, NativeEngine};
use cbc_bridge_sys::{CBC_OK, CBC_STATUS_INFEASIBLE, CBC_STATUS_OPTIMAL, CBC_STATUS_OTHER};
use std::ffi::{c_double, c_int, c_void};
use std::slice;

const FAILURE: c_int = -1;

/// Engine that stores the model in a heap allocation behind the opaque
/// pointer and "solves" it by placing every variable at its lower bound
/// (zero when unbounded below, rounded up for integer columns).
///
/// It reports `Infeasible` when any column or row has an empty range,
/// `Optimal` when that point satisfies every row and `Other` otherwise.
/// Like the shim, `objective_value` returns the negated objective.
/// It is a stand-in for boundary tests, not a MIP solver.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedEngine;

#[derive(Debug, Clone, Copy)]
struct Column {
    lower: f64,
    upper: f64,
    objective: f64,
    is_integer: bool,
}

impl Default for Column {
    fn default() -> Self {
        Column {
            lower: 0.0,
            upper: f64::INFINITY,
            objective: 0.0,
            is_integer: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Row {
    indices: Vec<c_int>,
    values: Vec<f64>,
    lower: f64,
    upper: f64,
}

#[derive(Debug, Clone)]
struct Outcome {
    status: c_int,
    objective: f64,
    values: Vec<f64>,
}

#[derive(Debug, Default)]
struct ScriptedModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
    outcome: Option<Outcome>,
}

impl ScriptedModel {
    fn column_mut(&mut self, index: usize) -> &mut Column {
        if index >= self.columns.len() {
            self.columns.resize(index + 1, Column::default());
        }
        &mut self.columns[index]
    }

    fn solve(&mut self) -> Outcome {
        let values: Vec<f64> = self.columns.iter().map(Column::start_value).collect();
        let objective = self
            .columns
            .iter()
            .zip(&values)
            .map(|(c, x)| c.objective * x)
            .sum();

        let empty_column = self.columns.iter().any(|c| c.lower > c.upper);
        let empty_row = self.rows.iter().any(|r| r.lower > r.upper);
        let status = if empty_column || empty_row {
            CBC_STATUS_INFEASIBLE
        } else if self.rows.iter().all(|r| r.is_satisfied(&values)) {
            CBC_STATUS_OPTIMAL
        } else {
            CBC_STATUS_OTHER
        };

        Outcome {
            status,
            objective,
            values,
        }
    }
}

impl Column {
    fn start_value(&self) -> f64 {
        let value = if self.lower > -1e30 {
            self.lower
        } else {
            0.0_f64.min(self.upper)
        };
        if self.is_integer { value.ceil() } else { value }
    }
}

impl Row {
    fn is_satisfied(&self, values: &[f64]) -> bool {
        let activity: f64 = self
            .indices
            .iter()
            .zip(&self.values)
            .map(|(&i, a)| a * values.get(i as usize).copied().unwrap_or(0.0))
            .sum();
        activity >= self.lower - 1e-9 && activity <= self.upper + 1e-9
    }
}

/// Reborrow the model behind a handle, counting the call.
///
/// # Safety
///
/// `handle` must be null or a live pointer returned by `ScriptedEngine::create`.
unsafe fn model<'a>(handle: *mut c_void) -> Option<&'a mut ScriptedModel> {
    record(|c| c.native_calls += 1);
    // SAFETY: guaranteed by the caller.
    unsafe { handle.cast::<ScriptedModel>().as_mut() }
}

fn scripted_failure(call: NativeCall) -> bool {
    current_script().fail_call == Some(call)
}

unsafe impl NativeEngine for ScriptedEngine {
    const NAME: &'static str = "scripted";

    fn create() -> *mut c_void {
        if current_script().fail_create {
            return std::ptr::null_mut();
        }
        record(|c| c.created += 1);
        Box::into_raw(Box::new(ScriptedModel::default())).cast()
    }

    unsafe fn set_objective(handle: *mut c_void, n: c_int, coeffs: *const c_double) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        if n <= 0 || coeffs.is_null() || scripted_failure(NativeCall::SetObjective) {
            return FAILURE;
        }
        // SAFETY: the caller guarantees `coeffs` is valid for `n` elements.
        let coeffs = unsafe { slice::from_raw_parts(coeffs, n as usize) };
        for (index, coeff) in coeffs.iter().enumerate() {
            model.column_mut(index).objective = *coeff;
        }
        CBC_OK
    }

    unsafe fn add_constraint(
        handle: *mut c_void,
        n: c_int,
        indices: *const c_int,
        values: *const c_double,
        lb: c_double,
        ub: c_double,
    ) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        if n <= 0
            || indices.is_null()
            || values.is_null()
            || scripted_failure(NativeCall::AddConstraint)
        {
            return FAILURE;
        }
        // SAFETY: the caller guarantees both arrays are valid for `n` elements.
        let (indices, values) = unsafe {
            (
                slice::from_raw_parts(indices, n as usize),
                slice::from_raw_parts(values, n as usize),
            )
        };
        if indices.iter().any(|&i| i < 0) {
            return FAILURE;
        }
        for &index in indices {
            model.column_mut(index as usize);
        }
        model.rows.push(Row {
            indices: indices.to_vec(),
            values: values.to_vec(),
            lower: lb,
            upper: ub,
        });
        CBC_OK
    }

    unsafe fn set_variable_bounds(
        handle: *mut c_void,
        index: c_int,
        lb: c_double,
        ub: c_double,
    ) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        if index < 0 || scripted_failure(NativeCall::SetVariableBounds) {
            return FAILURE;
        }
        let column = model.column_mut(index as usize);
        column.lower = lb;
        column.upper = ub;
        CBC_OK
    }

    unsafe fn set_variable_integer(handle: *mut c_void, index: c_int) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        if index < 0 || scripted_failure(NativeCall::SetVariableInteger) {
            return FAILURE;
        }
        model.column_mut(index as usize).is_integer = true;
        CBC_OK
    }

    unsafe fn solve(handle: *mut c_void) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        let script = current_script();
        if script.solve_code != CBC_OK {
            return script.solve_code;
        }
        let mut outcome = model.solve();
        if let Some(code) = script.status_code {
            outcome.status = code;
        }
        model.outcome = Some(outcome);
        CBC_OK
    }

    unsafe fn solution_status(handle: *mut c_void) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        model.outcome.as_ref().map_or(FAILURE, |o| o.status)
    }

    unsafe fn objective_value(handle: *mut c_void) -> c_double {
        let Some(model) = (unsafe { model(handle) }) else {
            return 0.0;
        };
        match &model.outcome {
            Some(outcome) if outcome.status == CBC_STATUS_OPTIMAL => -outcome.objective,
            _ => 0.0,
        }
    }

    unsafe fn solution(handle: *mut c_void, out: *mut c_double, n: c_int) -> c_int {
        let Some(model) = (unsafe { model(handle) }) else {
            return FAILURE;
        };
        if out.is_null() || n <= 0 || scripted_failure(NativeCall::GetSolution) {
            return FAILURE;
        }
        let Some(outcome) = model
            .outcome
            .as_ref()
            .filter(|o| o.status == CBC_STATUS_OPTIMAL)
        else {
            return FAILURE;
        };

        let mut count = (n as usize).min(outcome.values.len());
        if current_script().short_solution {
            count = count.saturating_sub(1);
        }
        // SAFETY: the caller guarantees `out` is valid for `n` elements and
        // `count <= n`.
        let out = unsafe { slice::from_raw_parts_mut(out, count) };
        out.copy_from_slice(&outcome.values[..count]);
        count as c_int
    }

    unsafe fn free(handle: *mut c_void) {
        if handle.is_null() {
            return;
        }
        record(|c| c.freed += 1);
        // SAFETY: `handle` came from `Box::into_raw` in `create` and is
        // released only once by its owner.
        drop(unsafe { Box::from_raw(handle.cast::<ScriptedModel>()) });
    }
}
