//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`engine`]: `ScriptedEngine`, an in-process [`NativeEngine`](crate::NativeEngine)
//!   that keeps the model behind an opaque pointer like the real shim does.
//! - [`problems`]: Small models loaded through the public builder API.
//!
//! Scripts and counters are thread-local: each test thread (and each thread a
//! test spawns) sees only its own engine activity.

pub mod engine;
pub mod problems;

pub use engine::ScriptedEngine;

use crate::engine::NativeCall;
use std::cell::RefCell;
use std::ffi::c_int;

/// Knobs for the next calls into [`ScriptedEngine`] on this thread.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// `create` returns null.
    pub fail_create: bool,
    /// This configuration call (or `GetSolution`) returns -1.
    pub fail_call: Option<NativeCall>,
    /// Nonzero makes `solve` return this code without solving.
    pub solve_code: c_int,
    /// Reported by `GetSolutionStatus` instead of the computed status.
    pub status_code: Option<c_int>,
    /// `GetSolution` writes one value fewer than it could.
    pub short_solution: bool,
}

/// Engine activity observed on this thread.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub created: usize,
    pub freed: usize,
    /// Calls that received a handle, excluding `free`.
    pub native_calls: usize,
}

#[derive(Default)]
struct ThreadState {
    script: Script,
    counters: Counters,
}

thread_local! {
    static STATE: RefCell<ThreadState> = RefCell::new(ThreadState::default());
}

/// Clear the script and counters for the current thread.
pub fn reset() {
    STATE.with(|state| *state.borrow_mut() = ThreadState::default());
}

/// Adjust the current thread's script.
pub fn script(update: impl FnOnce(&mut Script)) {
    STATE.with(|state| update(&mut state.borrow_mut().script));
}

/// Snapshot of the current thread's counters.
pub fn counters() -> Counters {
    STATE.with(|state| state.borrow().counters)
}

pub(crate) fn current_script() -> Script {
    STATE.with(|state| state.borrow().script.clone())
}

pub(crate) fn record(update: impl FnOnce(&mut Counters)) {
    STATE.with(|state| update(&mut state.borrow_mut().counters));
}

/// Install a test subscriber; repeated calls are harmless.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
