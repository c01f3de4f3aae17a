//! Solver lifecycle: creation, the solve call, status, release.
#![allow(unsafe_code)]

use crate::config::BridgeConfig;
use crate::engine::NativeEngine;
use crate::error::BridgeError;
use crate::handle::NativeHandle;
use crate::memory::SolveMemory;
use crate::model::ModelDimensions;
use crate::status::{SolverStatus, status_from_native};
use cbc_bridge_sys::CBC_OK;
use std::ffi::c_void;
use std::fmt;
use std::time::Instant;
use tracing::{debug, trace, warn};

/// Lifecycle state of a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverState {
    /// Native instance exists, nothing configured yet.
    Created,
    /// At least one configuration call succeeded.
    Configured,
    /// `solve` returned success; results are readable, the model is frozen.
    Solved,
    /// Native instance released. Terminal.
    Freed,
}

impl SolverState {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverState::Created => "created",
            SolverState::Configured => "configured",
            SolverState::Solved => "solved",
            SolverState::Freed => "freed",
        }
    }
}

impl fmt::Display for SolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Safe wrapper around one native solver instance.
///
/// The instance is released by [`free`](Self::free) or on drop, whichever
/// comes first. A `Solver` may be moved to another thread but not shared:
/// the engine's per-instance state is not reentrant.
pub struct Solver<E: NativeEngine> {
    pub(crate) handle: NativeHandle<E>,
    pub(crate) config: BridgeConfig,
    pub(crate) dims: ModelDimensions,
    pub(crate) state: SolverState,
    pub(crate) solve_time_seconds: Option<f64>,
}

/// Solver backed by the CBC shim.
#[cfg(feature = "native")]
pub type CbcSolver = Solver<crate::engine::Cbc>;

impl<E: NativeEngine> Solver<E> {
    /// Create a native solver with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `CreationFailed` if the engine could not allocate an instance.
    pub fn create() -> Result<Self, BridgeError> {
        Self::with_config(BridgeConfig::default())
    }

    /// Create a native solver with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid configuration and
    /// `CreationFailed` if the engine could not allocate an instance.
    pub fn with_config(config: BridgeConfig) -> Result<Self, BridgeError> {
        config.validate()?;
        let handle = NativeHandle::create()?;
        debug!(
            component = "solver",
            operation = "init",
            status = "success",
            engine = E::NAME,
            infinity = config.infinity,
            "Created solver"
        );
        Ok(Solver {
            handle,
            config,
            dims: ModelDimensions::default(),
            state: SolverState::Created,
            solve_time_seconds: None,
        })
    }

    /// Release the native instance. Later calls are no-ops, and every other
    /// operation fails with `InvalidState` afterwards.
    pub fn free(&mut self) {
        if self.handle.release() {
            debug!(
                component = "solver",
                operation = "free",
                status = "success",
                engine = E::NAME,
                previous_state = %self.state,
                "Freed solver"
            );
        } else {
            trace!(
                component = "solver",
                operation = "free",
                status = "skipped",
                "Solver already freed"
            );
        }
        self.state = SolverState::Freed;
    }

    /// Run the native solve. Blocks until the engine stops.
    ///
    /// Success only means the engine ran; read [`status`](Self::status) to
    /// learn whether the model was optimal or infeasible.
    ///
    /// # Errors
    ///
    /// Returns `SolveFailed` on a nonzero native return code and
    /// `InvalidState` if the solver was already solved or freed.
    pub fn solve(&mut self) -> Result<(), BridgeError> {
        let handle = self.configurable_handle("solve")?;
        let mut memory = self.config.capture_memory.then(SolveMemory::new);
        let rss_before = memory
            .as_mut()
            .and_then(|m| m.begin().ok())
            .map(|snapshot| snapshot.rss_bytes);
        let started = Instant::now();

        debug!(
            component = "solver",
            operation = "solve",
            status = "started",
            engine = E::NAME,
            num_variables = self.dims.num_variables,
            num_constraints = self.dims.num_constraints,
            rss_bytes = ?rss_before,
            "Starting native solve"
        );

        // SAFETY: `handle` is live and `&mut self` rules out concurrent calls.
        let code = unsafe { E::solve(handle) };
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let rss_delta = memory
            .as_mut()
            .and_then(|m| m.finish().ok())
            .map(|report| report.growth_bytes());

        if code != CBC_OK {
            warn!(
                component = "solver",
                operation = "solve",
                status = "error",
                engine = E::NAME,
                status_code = code,
                duration_ms,
                "Native solve failed"
            );
            return Err(BridgeError::SolveFailed);
        }

        self.state = SolverState::Solved;
        self.solve_time_seconds = Some(duration_ms / 1000.0);
        debug!(
            component = "solver",
            operation = "solve",
            status = "success",
            engine = E::NAME,
            duration_ms,
            rss_delta_bytes = ?rss_delta,
            "Native solve completed"
        );
        Ok(())
    }

    /// Terminal status of the last solve.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` before a successful solve or after free.
    pub fn status(&self) -> Result<SolverStatus, BridgeError> {
        let handle = self.solved_handle("status")?;
        // SAFETY: `handle` is live; the call only reads native state.
        let code = unsafe { E::solution_status(handle) };
        let status = status_from_native(code);
        trace!(
            component = "solver",
            operation = "status",
            status = "success",
            status_code = code,
            solver_status = %status,
            "Read solution status"
        );
        Ok(status)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Declared variable count: the largest index referenced so far plus one.
    pub fn num_variables(&self) -> usize {
        self.dims.num_variables
    }

    /// Number of rows successfully added.
    pub fn num_constraints(&self) -> usize {
        self.dims.num_constraints
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Name of the backing engine.
    pub fn engine_name(&self) -> &'static str {
        E::NAME
    }

    /// Handle for a call that needs nothing beyond a live instance.
    fn live_handle(&self, operation: &'static str) -> Result<*mut c_void, BridgeError> {
        self.handle.get().ok_or(BridgeError::InvalidState {
            operation,
            state: SolverState::Freed,
        })
    }

    /// Handle for configuration calls and `solve`: the model must not be
    /// solved yet.
    pub(crate) fn configurable_handle(
        &self,
        operation: &'static str,
    ) -> Result<*mut c_void, BridgeError> {
        let handle = self.live_handle(operation)?;
        match self.state {
            SolverState::Created | SolverState::Configured => Ok(handle),
            state => Err(self.reject(operation, state)),
        }
    }

    /// Handle for result reads: a solve must have succeeded.
    pub(crate) fn solved_handle(
        &self,
        operation: &'static str,
    ) -> Result<*mut c_void, BridgeError> {
        let handle = self.live_handle(operation)?;
        match self.state {
            SolverState::Solved => Ok(handle),
            state => Err(self.reject(operation, state)),
        }
    }

    fn reject(&self, operation: &'static str, state: SolverState) -> BridgeError {
        warn!(
            component = "solver",
            operation,
            status = "error",
            state = %state,
            "Operation not allowed in current state"
        );
        BridgeError::InvalidState { operation, state }
    }
}

impl<E: NativeEngine> fmt::Debug for Solver<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solver")
            .field("engine", &E::NAME)
            .field("state", &self.state)
            .field("num_variables", &self.dims.num_variables)
            .field("num_constraints", &self.dims.num_constraints)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{self, ScriptedEngine};
    use cbc_bridge_sys::CBC_STATUS_OTHER;

    type TestSolver = Solver<ScriptedEngine>;

    #[test]
    fn test_create_starts_empty() {
        testkit::reset();
        let solver = TestSolver::create().unwrap();
        assert_eq!(solver.state(), SolverState::Created);
        assert_eq!(solver.num_variables(), 0);
        assert_eq!(solver.num_constraints(), 0);
        assert_eq!(solver.engine_name(), "scripted");
    }

    #[test]
    fn test_create_failure() {
        testkit::reset();
        testkit::script(|s| s.fail_create = true);
        assert_eq!(
            TestSolver::create().unwrap_err(),
            BridgeError::CreationFailed
        );
    }

    #[test]
    fn test_with_config_rejects_bad_sentinel() {
        testkit::reset();
        let err = TestSolver::with_config(BridgeConfig::new().with_infinity(-1.0)).unwrap_err();
        assert_eq!(err.code(), "INPUT_INVALID");
        assert_eq!(testkit::counters().created, 0);
    }

    #[test]
    fn test_status_requires_solve() {
        testkit::reset();
        let solver = TestSolver::create().unwrap();
        let err = solver.status().unwrap_err();
        assert_eq!(
            err,
            BridgeError::InvalidState {
                operation: "status",
                state: SolverState::Created
            }
        );
        assert_eq!(testkit::counters().native_calls, 0);
    }

    #[test]
    fn test_solve_failure_keeps_model_configurable() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0]).unwrap();
        testkit::script(|s| s.solve_code = -1);
        assert_eq!(solver.solve().unwrap_err(), BridgeError::SolveFailed);
        assert_eq!(solver.state(), SolverState::Configured);

        testkit::script(|s| s.solve_code = 0);
        solver.solve().unwrap();
        assert_eq!(solver.state(), SolverState::Solved);
    }

    #[test]
    fn test_second_solve_rejected() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0]).unwrap();
        solver.solve().unwrap();
        let err = solver.solve().unwrap_err();
        assert_eq!(err.code(), "STATE_INVALID");
    }

    #[test]
    fn test_unknown_status_code_is_other() {
        testkit::reset();
        testkit::script(|s| s.status_code = Some(17));
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.status().unwrap(), SolverStatus::Other);

        testkit::script(|s| s.status_code = Some(CBC_STATUS_OTHER));
        let mut solver = TestSolver::create().unwrap();
        solver.set_objective(&[1.0]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.status().unwrap(), SolverStatus::Other);
    }

    #[test]
    fn test_free_is_idempotent_and_terminal() {
        testkit::reset();
        let mut solver = TestSolver::create().unwrap();
        solver.free();
        solver.free();
        assert_eq!(solver.state(), SolverState::Freed);
        assert_eq!(testkit::counters().freed, 1);

        let calls_before = testkit::counters().native_calls;
        assert_eq!(solver.solve().unwrap_err().code(), "STATE_INVALID");
        assert_eq!(solver.status().unwrap_err().code(), "STATE_INVALID");
        assert_eq!(testkit::counters().native_calls, calls_before);

        drop(solver);
        assert_eq!(testkit::counters().freed, 1);
    }

    #[test]
    fn test_capture_memory_does_not_affect_solve() {
        testkit::reset();
        let mut solver =
            TestSolver::with_config(BridgeConfig::new().with_capture_memory(true)).unwrap();
        solver.set_objective(&[1.0, 2.0]).unwrap();
        solver.solve().unwrap();
        assert_eq!(solver.status().unwrap(), SolverStatus::Optimal);
    }

    #[test]
    fn test_debug_output() {
        testkit::reset();
        let solver = TestSolver::create().unwrap();
        let debug = format!("{:?}", solver);
        assert!(debug.contains("scripted"));
        assert!(debug.contains("Created"));
    }
}
