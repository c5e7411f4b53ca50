use cassowary::{CassowaryError, SimplexSolver, Strength};

const EPS: f64 = 1e-6;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < EPS
}

#[test]
fn stay_dominates_when_unconstrained() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 7.0);
    solver.add_stay(x).unwrap();
    assert!(approx(solver.value(x), 7.0));
}

#[test]
fn required_equality_beats_a_stay() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_stay(x).unwrap();
    solver.add_constraint(x.eq(12.0).unwrap()).unwrap();
    assert!(approx(solver.value(x), 12.0));
}

#[test]
fn inequality_direction_is_respected() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 100.0);
    solver.add_stay(x).unwrap();
    solver.add_constraint(x.leq(10.0).unwrap()).unwrap();
    assert!(solver.value(x) <= 10.0 + EPS);
}

#[test]
fn stronger_constraint_wins_when_two_soft_constraints_conflict() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_constraint(x.eq_with(10.0, Strength::WEAK, 1.0).unwrap()).unwrap();
    solver.add_constraint(x.eq_with(20.0, Strength::STRONG, 1.0).unwrap()).unwrap();
    assert!(approx(solver.value(x), 20.0));
}

#[test]
fn linear_relation_between_externals_holds_after_edits() {
    let mut solver = SimplexSolver::new();
    let left = solver.new_external("left", 0.0);
    let width = solver.new_external("width", 0.0);
    let right = solver.new_external("right", 0.0);

    solver.add_stay(left).unwrap();
    solver.add_constraint(width.eq_with(50.0, Strength::STRONG, 1.0).unwrap()).unwrap();
    solver
        .add_constraint(cassowary::Expression::from_single_variable(right).eq(left + width).unwrap())
        .unwrap();

    assert!(approx(solver.value(right), solver.value(left) + 50.0));

    solver.add_edit_var(left).unwrap();
    solver.begin_edit();
    solver.suggest_value(left, 30.0).unwrap();
    solver.resolve().unwrap();
    solver.end_edit().unwrap();

    assert!(approx(solver.value(right), solver.value(left) + 50.0));
}

#[test]
fn edit_stream_tracks_a_sequence_of_suggested_values() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_stay(x).unwrap();
    solver.add_edit_var(x).unwrap();
    solver.begin_edit();

    for &v in &[5.0, 15.0, -3.0, 42.0] {
        solver.suggest_value(x, v).unwrap();
        solver.resolve().unwrap();
        assert!(approx(solver.value(x), v));
    }

    solver.end_edit().unwrap();
}

#[test]
fn conflicting_required_constraints_are_rejected() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_constraint(x.eq(5.0).unwrap()).unwrap();
    let result = solver.add_constraint(x.eq(6.0).unwrap());
    assert!(matches!(result, Err(CassowaryError::RequiredFailure)));
    // The tableau was rolled back; x is still pinned at its first value.
    assert!(approx(solver.value(x), 5.0));
}

#[test]
fn inequality_between_two_constants_is_rejected_at_construction() {
    let result = cassowary::Constraint::new(1.0, cassowary::RelationalOperator::LessOrEqual, 2.0, Strength::REQUIRED, 1.0);
    assert!(result.is_err());
}

#[test]
fn removing_a_constraint_releases_its_hold_on_a_variable() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_stay(x).unwrap();
    let pin = x.eq(99.0).unwrap();
    solver.add_constraint(pin.clone()).unwrap();
    assert!(approx(solver.value(x), 99.0));

    solver.remove_constraint(&pin).unwrap();
    solver.add_stay(x).unwrap();
    // After the pin is gone, a fresh stay anchors x wherever it last sat.
    assert!(approx(solver.value(x), 99.0));
}

#[test]
fn removing_an_unknown_constraint_is_an_error() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    let c = x.eq(1.0).unwrap();
    let result = solver.remove_constraint(&c);
    assert!(matches!(result, Err(CassowaryError::ConstraintNotFound)));
}

#[test]
fn suggest_value_requires_an_active_edit_session() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_edit_var(x).unwrap();
    assert!(matches!(solver.suggest_value(x, 1.0), Err(CassowaryError::NoActiveEdit)));
}

#[test]
fn expression_algebra_round_trips_through_the_dsl() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    let y = solver.new_external("y", 0.0);

    let e = 2.0 * x + y - 3.0;
    assert_eq!(e.coefficient_for(x), 2.0);
    assert_eq!(e.coefficient_for(y), 1.0);
    assert_eq!(e.constant(), -3.0);

    let doubled = e * 2.0;
    assert_eq!(doubled.coefficient_for(x), 4.0);
    assert_eq!(doubled.constant(), -6.0);
}

#[test]
fn nested_edit_sessions_only_release_constraints_at_outermost_end() {
    let mut solver = SimplexSolver::new();
    let x = solver.new_external("x", 0.0);
    solver.add_stay(x).unwrap();
    solver.add_edit_var(x).unwrap();

    solver.begin_edit();
    solver.begin_edit();
    solver.suggest_value(x, 8.0).unwrap();
    solver.resolve().unwrap();
    solver.end_edit().unwrap();
    // Still inside the outer edit: suggest_value must keep working.
    solver.suggest_value(x, 9.0).unwrap();
    solver.resolve().unwrap();
    assert!(approx(solver.value(x), 9.0));
    solver.end_edit().unwrap();
}
