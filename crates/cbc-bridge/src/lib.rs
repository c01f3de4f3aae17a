//! Safe bindings to the CBC mixed-integer solver
//!
//! This crate wraps the C shim declared in `cbc-bridge-sys`. One [`Solver`]
//! owns exactly one native instance, tracks the declared problem dimensions,
//! and turns every native return code into a [`SolverStatus`] or a
//! [`BridgeError`].
//!
//! ```ignore
//! use cbc_bridge::{CbcSolver, SolverStatus};
//!
//! let mut solver = CbcSolver::create()?;
//! solver.set_objective(&[10.0, 6.0, 4.0])?;
//! solver.add_constraint(&[0, 1, 2], &[1.0, 1.0, 1.0], f64::NEG_INFINITY, 100.0)?;
//! solver.solve()?;
//! if solver.status()? == SolverStatus::Optimal {
//!     let x = solver.solution()?;
//! }
//! ```
//!
//! The native engine is linked only with the `native` feature. Without it the
//! crate still builds and can be exercised through the `testkit` engine.

mod config;
mod engine;
mod error;
mod handle;
pub mod logging;
pub mod memory;
mod model;
mod solution;
mod solver;
mod status;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use config::BridgeConfig;
#[cfg(feature = "native")]
pub use engine::Cbc;
pub use engine::{NativeCall, NativeEngine};
pub use error::BridgeError;
pub use solution::Solution;
#[cfg(feature = "native")]
pub use solver::CbcSolver;
pub use solver::{Solver, SolverState};
pub use status::SolverStatus;
