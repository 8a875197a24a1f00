#[path = "support/common.rs"]
mod common;

use common::{assert_value, change_for};
use taut::prelude::*;
use taut::strength::{MEDIUM, REQUIRED, STRONG};

#[test]
fn suggestions_drive_an_unconstrained_edit_variable() {
    let mut solver = Solver::new();
    let x = Variable::new();
    solver.add_edit_variable(x, STRONG).expect("register edit");
    assert!(solver.has_edit_variable(x));

    solver.suggest_value(x, 5.0).expect("suggest 5");
    let changes = solver.fetch_changes();
    assert_eq!(change_for(changes, x), Some(5.0));

    solver.suggest_value(x, 12.0).expect("suggest 12");
    let changes = solver.fetch_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(change_for(changes, x), Some(12.0));
}

#[test]
fn required_constraints_override_suggestions() {
    let mut solver = Solver::new();
    let x = Variable::new();
    solver
        .add_constraint(x | WeightedRelation::GreaterOrEqual(REQUIRED) | 2.0)
        .expect("add x >= 2");
    solver.add_edit_variable(x, STRONG).expect("register edit");

    solver.suggest_value(x, 1.0).expect("suggest below the floor");
    assert_value(&solver, x, 2.0);

    solver.suggest_value(x, 10.0).expect("suggest above the floor");
    assert_value(&solver, x, 10.0);
}

#[test]
fn suggestions_propagate_through_related_variables() {
    let mut solver = Solver::new();
    let x = Variable::new();
    let y = Variable::new();
    solver
        .add_constraint(y | WeightedRelation::Equal(REQUIRED) | 2.0 * x + 1.0)
        .expect("add y == 2x + 1");
    solver.add_edit_variable(x, MEDIUM).expect("register edit");

    solver.suggest_value(x, 4.0).expect("suggest 4");
    assert_value(&solver, x, 4.0);
    assert_value(&solver, y, 9.0);

    let changes = solver.fetch_changes();
    assert_eq!(change_for(changes, x), Some(4.0));
    assert_eq!(change_for(changes, y), Some(9.0));
}

#[test]
fn edit_registration_rejects_required_and_duplicates() {
    let mut solver = Solver::new();
    let x = Variable::new();
    assert_eq!(
        solver.add_edit_variable(x, REQUIRED),
        Err(AddEditVariableError::BadRequiredStrength)
    );
    solver.add_edit_variable(x, STRONG).expect("register edit");
    assert_eq!(
        solver.add_edit_variable(x, MEDIUM),
        Err(AddEditVariableError::DuplicateEditVariable)
    );
}

#[test]
fn suggesting_an_unregistered_variable_fails() {
    let mut solver = Solver::new();
    let x = Variable::new();
    assert_eq!(
        solver.suggest_value(x, 1.0),
        Err(SuggestValueError::UnknownEditVariable)
    );
}

#[test]
fn removing_an_edit_variable_releases_its_constraint() {
    let mut solver = Solver::new();
    let x = Variable::new();
    solver.add_edit_variable(x, STRONG).expect("register edit");
    solver.suggest_value(x, 7.0).expect("suggest 7");
    assert_value(&solver, x, 7.0);

    solver.remove_edit_variable(x).expect("remove edit");
    assert!(!solver.has_edit_variable(x));
    assert_eq!(
        solver.remove_edit_variable(x),
        Err(RemoveEditVariableError::UnknownEditVariable)
    );
    assert_eq!(
        solver.suggest_value(x, 3.0),
        Err(SuggestValueError::UnknownEditVariable)
    );
    // With the edit constraint gone nothing pins x any more.
    assert_eq!(solver.get_value(x), 0.0);
}

#[test]
fn edits_and_constraints_interact_across_removal() {
    let mut solver = Solver::new();
    let width = Variable::new();
    let right = Variable::new();
    solver
        .add_constraint(right | WeightedRelation::Equal(REQUIRED) | width * 2.0)
        .expect("add right == 2 width");
    solver.add_edit_variable(width, STRONG).expect("edit width");

    solver.suggest_value(width, 30.0).expect("suggest 30");
    assert_value(&solver, right, 60.0);

    solver.suggest_value(width, 45.0).expect("suggest 45");
    assert_value(&solver, right, 90.0);

    solver.remove_edit_variable(width).expect("remove edit");
    solver
        .add_constraint(width | WeightedRelation::Equal(STRONG) | 10.0)
        .expect("pin width directly");
    assert_value(&solver, width, 10.0);
    assert_value(&solver, right, 20.0);
}
