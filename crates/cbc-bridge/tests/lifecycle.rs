use cbc_bridge::testkit::{self, ScriptedEngine, problems};
use cbc_bridge::{BridgeError, Solver, SolverState, SolverStatus};

type TestSolver = Solver<ScriptedEngine>;

#[test]
fn test_full_lifecycle() {
    testkit::init_tracing();
    testkit::reset();

    let mut solver = TestSolver::create().expect("failed to create solver");
    assert_eq!(solver.state(), SolverState::Created);

    problems::load_production_mix(&mut solver).expect("failed to load model");
    assert_eq!(solver.state(), SolverState::Configured);
    assert_eq!(solver.num_variables(), 3);
    assert_eq!(solver.num_constraints(), 3);

    solver.solve().expect("solve failed");
    assert_eq!(solver.state(), SolverState::Solved);
    assert_eq!(solver.status().expect("missing status"), SolverStatus::Optimal);

    let values = solver.solution().expect("missing solution");
    assert_eq!(values.len(), 3);

    solver.free();
    assert_eq!(solver.state(), SolverState::Freed);
    assert_eq!(testkit::counters().created, 1);
    assert_eq!(testkit::counters().freed, 1);
}

#[test]
fn test_solution_before_solve_never_zero_filled() {
    testkit::reset();
    let mut solver = TestSolver::create().expect("failed to create solver");
    solver.set_objective(&[1.0, 2.0]).expect("failed to set objective");

    match solver.solution() {
        Err(BridgeError::InvalidState { operation, state }) => {
            assert_eq!(operation, "solution");
            assert_eq!(state, SolverState::Configured);
        }
        other => panic!("Expected InvalidState, got {:?}", other),
    }
}

#[test]
fn test_double_free_releases_once() {
    testkit::reset();
    let mut solver = TestSolver::create().expect("failed to create solver");
    solver.free();
    solver.free();
    drop(solver);
    assert_eq!(testkit::counters().freed, 1);
}

#[test]
fn test_early_return_path_releases_handle() {
    testkit::reset();

    fn configure_badly() -> Result<TestSolver, BridgeError> {
        let mut solver = TestSolver::create()?;
        solver.set_objective(&[1.0])?;
        solver.add_constraint(&[0, 1], &[1.0], 0.0, 1.0)?;
        Ok(solver)
    }

    let err = configure_badly().expect_err("mismatched constraint should fail");
    assert_eq!(err.code(), "INPUT_INVALID");
    assert_eq!(testkit::counters().created, 1);
    assert_eq!(testkit::counters().freed, 1);
}

#[test]
fn test_operations_after_free_fail() {
    testkit::reset();
    let mut solver = TestSolver::create().expect("failed to create solver");
    problems::load_production_mix(&mut solver).expect("failed to load model");
    solver.free();

    let calls = testkit::counters().native_calls;
    let results = [
        solver.set_objective(&[1.0]),
        solver.set_variable_bounds(0, 0.0, 1.0),
        solver.add_constraint(&[0], &[1.0], 0.0, 1.0),
        solver.set_variable_integer(0),
        solver.solve(),
    ];
    for result in results {
        assert_eq!(result.expect_err("freed solver accepted a call").code(), "STATE_INVALID");
    }
    assert!(solver.status().is_err());
    assert!(solver.objective_value().is_err());
    assert!(solver.solution().is_err());
    assert!(solver.snapshot().is_err());
    assert_eq!(testkit::counters().native_calls, calls);
}

#[test]
fn test_infeasible_is_status_not_error() {
    testkit::reset();
    let mut solver = TestSolver::create().expect("failed to create solver");
    problems::load_empty_row(&mut solver).expect("failed to load model");

    solver.solve().expect("infeasible model must still solve");
    assert_eq!(
        solver.status().expect("missing status"),
        SolverStatus::Infeasible
    );
}

#[test]
fn test_creation_failure() {
    testkit::reset();
    testkit::script(|s| s.fail_create = true);
    let err = TestSolver::create().expect_err("creation should fail");
    assert_eq!(err, BridgeError::CreationFailed);
    assert_eq!(testkit::counters().freed, 0);
}

#[test]
fn test_solver_is_movable_between_owners() {
    testkit::reset();
    let mut solver = TestSolver::create().expect("failed to create solver");
    solver.set_objective(&[1.0]).expect("failed to set objective");
    let mut boxed = Box::new(solver);
    boxed.solve().expect("solve failed");
    drop(boxed);
    assert_eq!(testkit::counters().freed, 1);
}
