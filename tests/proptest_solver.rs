//! Property tests for the incremental solver protocol.
//!
//! Checked laws:
//! - a successful add followed by a remove restores the assignment
//! - reset followed by the same adds reproduces the same assignments
//! - fetch_changes drains: an immediate second call is empty
//! - a suggested value surfaces in the next fetch_changes batch

use proptest::prelude::*;
use taut::prelude::*;
use taut::strength::{MEDIUM, REQUIRED, STRONG, WEAK};

const VAR_COUNT: usize = 4;

#[derive(Clone, Debug)]
struct ConstraintRecipe {
    terms: Vec<(usize, f64)>,
    constant: f64,
    op: RelationalOperator,
    strength: f64,
}

fn arb_op() -> impl Strategy<Value = RelationalOperator> {
    prop_oneof![
        Just(RelationalOperator::LessOrEqual),
        Just(RelationalOperator::Equal),
        Just(RelationalOperator::GreaterOrEqual),
    ]
}

fn arb_strength() -> impl Strategy<Value = f64> {
    prop_oneof![Just(MEDIUM), Just(STRONG), Just(REQUIRED)]
}

fn arb_recipe() -> impl Strategy<Value = ConstraintRecipe> {
    (
        prop::collection::vec((0..VAR_COUNT, -5i32..=5), 1..=3),
        -20i32..=20,
        arb_op(),
        arb_strength(),
    )
        .prop_map(|(raw_terms, constant, op, strength)| ConstraintRecipe {
            terms: raw_terms
                .into_iter()
                .map(|(var, coeff)| (var, f64::from(coeff)))
                .collect(),
            constant: f64::from(constant),
            op,
            strength,
        })
}

fn build(recipe: &ConstraintRecipe, vars: &[Variable]) -> Constraint {
    let terms = recipe
        .terms
        .iter()
        .map(|&(idx, coeff)| Term::new(vars[idx], coeff))
        .collect();
    Constraint::new(Expression::new(terms, recipe.constant), recipe.op, recipe.strength)
}

fn fresh_vars() -> Vec<Variable> {
    (0..VAR_COUNT).map(|_| Variable::new()).collect()
}

/// A solver with a weak anchor per variable, so the base system has a unique
/// optimum to drift back to.
fn anchored_solver(vars: &[Variable]) -> Solver {
    let mut solver = Solver::new();
    for (i, &v) in vars.iter().enumerate() {
        let target = 3.0 * (i as f64 + 1.0);
        solver
            .add_constraint(v | WeightedRelation::Equal(WEAK) | target)
            .expect("a lone weak anchor is always satisfiable");
    }
    solver
}

proptest! {
    #[test]
    fn add_then_remove_restores_the_assignment(recipe in arb_recipe()) {
        let vars = fresh_vars();
        let mut solver = anchored_solver(&vars);
        let before: Vec<f64> = vars.iter().map(|&v| solver.get_value(v)).collect();

        let constraint = build(&recipe, &vars);
        // A rejected add may leave pivoting residue; the law covers
        // successful adds only.
        if solver.add_constraint(constraint.clone()).is_ok() {
            solver
                .remove_constraint(&constraint)
                .expect("an added constraint must be removable");
            for (&v, &expected) in vars.iter().zip(&before) {
                let actual = solver.get_value(v);
                prop_assert!(
                    (actual - expected).abs() < 1e-6,
                    "variable drifted after add/remove: {expected} -> {actual}"
                );
            }
        }
    }

    #[test]
    fn reset_and_replay_reproduces_assignments(
        recipes in prop::collection::vec(arb_recipe(), 1..5)
    ) {
        let vars = fresh_vars();
        let constraints: Vec<Constraint> = recipes.iter().map(|r| build(r, &vars)).collect();

        let mut solver = Solver::new();
        let first_outcomes: Vec<bool> = constraints
            .iter()
            .map(|c| solver.add_constraint(c.clone()).is_ok())
            .collect();
        let before: Vec<f64> = vars.iter().map(|&v| solver.get_value(v)).collect();

        solver.reset();
        let second_outcomes: Vec<bool> = constraints
            .iter()
            .map(|c| solver.add_constraint(c.clone()).is_ok())
            .collect();
        let after: Vec<f64> = vars.iter().map(|&v| solver.get_value(v)).collect();

        prop_assert_eq!(first_outcomes, second_outcomes);
        for (&expected, &actual) in before.iter().zip(&after) {
            prop_assert!(
                (actual - expected).abs() < 1e-9,
                "replay diverged: {} -> {}", expected, actual
            );
        }
    }

    #[test]
    fn fetch_changes_drains_between_calls(
        recipes in prop::collection::vec(arb_recipe(), 1..5)
    ) {
        let vars = fresh_vars();
        let mut solver = Solver::new();
        for recipe in &recipes {
            let _ = solver.add_constraint(build(recipe, &vars));
        }
        solver.fetch_changes();
        prop_assert!(solver.fetch_changes().is_empty());
    }

    #[test]
    fn suggested_values_surface_in_fetch_changes(
        value in prop_oneof![-50i32..=-1, 1i32..=50]
    ) {
        let mut solver = Solver::new();
        let v = Variable::new();
        solver.add_edit_variable(v, STRONG).expect("register edit");
        solver.suggest_value(v, f64::from(value)).expect("suggest");
        let changes = solver.fetch_changes();
        let reported = changes.iter().find(|(var, _)| *var == v);
        prop_assert_eq!(reported, Some(&(v, f64::from(value))));
    }
}
