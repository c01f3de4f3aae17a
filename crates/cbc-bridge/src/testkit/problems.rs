//! Canonical models used across tests.

use crate::engine::NativeEngine;
use crate::error::BridgeError;
use crate::solver::Solver;
use cbc_bridge_sys::CBC_INFINITY;

/// Best value of the production-mix objective: x = 33, y = 67, z = 0.
pub const PRODUCTION_MIX_OPTIMUM: f64 = 732.0;

/// What `CBC_GetObjectiveValue` returns for the production mix. The shim
/// negates the engine's maximized objective.
pub const PRODUCTION_MIX_REPORTED_OBJECTIVE: f64 = -PRODUCTION_MIX_OPTIMUM;

/// Three integer products competing for three resources:
///
/// ```text
/// max 10x + 6y + 4z
///     x +  y +  z <= 100
///   10x + 4y + 5z <= 600
///    2x + 2y + 6z <= 300
///   x, y, z >= 0 integer
/// ```
pub fn load_production_mix<E: NativeEngine>(solver: &mut Solver<E>) -> Result<(), BridgeError> {
    solver.set_objective(&[10.0, 6.0, 4.0])?;
    for index in 0..3 {
        solver.set_variable_bounds(index, 0.0, CBC_INFINITY)?;
    }
    solver.add_constraint(&[0, 1, 2], &[1.0, 1.0, 1.0], -CBC_INFINITY, 100.0)?;
    solver.add_constraint(&[0, 1, 2], &[10.0, 4.0, 5.0], -CBC_INFINITY, 600.0)?;
    solver.add_constraint(&[0, 1, 2], &[2.0, 2.0, 6.0], -CBC_INFINITY, 300.0)?;
    for index in 0..3 {
        solver.set_variable_integer(index)?;
    }
    Ok(())
}

/// `x + y >= 3` with both variables confined to `[0, 1]`.
pub fn load_infeasible_pair<E: NativeEngine>(solver: &mut Solver<E>) -> Result<(), BridgeError> {
    solver.set_objective(&[1.0, 1.0])?;
    solver.set_variable_bounds(0, 0.0, 1.0)?;
    solver.set_variable_bounds(1, 0.0, 1.0)?;
    solver.add_constraint(&[0, 1], &[1.0, 1.0], 3.0, f64::INFINITY)?;
    Ok(())
}

/// A single row whose range is empty (`5 <= x <= 3`). Any engine can see
/// this is infeasible without searching.
pub fn load_empty_row<E: NativeEngine>(solver: &mut Solver<E>) -> Result<(), BridgeError> {
    solver.set_objective(&[1.0])?;
    solver.add_constraint(&[0], &[1.0], 5.0, 3.0)?;
    Ok(())
}
