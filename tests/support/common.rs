use taut::prelude::*;

pub const VALUE_TOLERANCE: f64 = 1e-6;

pub fn assert_value(solver: &Solver, variable: Variable, expected: f64) {
    let actual = solver.get_value(variable);
    assert!(
        (actual - expected).abs() < VALUE_TOLERANCE,
        "expected variable value {expected}, got {actual}"
    );
}

pub fn change_for(changes: &[(Variable, f64)], variable: Variable) -> Option<f64> {
    changes
        .iter()
        .find(|(v, _)| *v == variable)
        .map(|&(_, value)| value)
}
