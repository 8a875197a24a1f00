//! The incremental solver engine.
//!
//! The tableau is kept optimal and feasible between public calls: adding a
//! constraint re-runs the primal simplex, suggesting an edit value repairs
//! feasibility with the dual simplex, and removals pivot the constraint's
//! marker symbol out of the basis before dropping it.

mod pivot;
mod registry;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::error::{
    AddConstraintError, AddEditVariableError, InternalSolverError, RemoveConstraintError,
    RemoveEditVariableError, SuggestValueError,
};
use crate::num::{canonical_zero, near_zero};
use crate::row::Row;
use crate::strength;
use crate::symbol::{Symbol, SymbolKind};
use crate::types::{Constraint, Expression, RelationalOperator, Term, Variable};

use pivot::{Goal, choose_subject};
use registry::VarRegistry;

/// The slack/error/dummy symbols minted for a constraint, used to locate it
/// in the tableau later. `other` may be the invalid sentinel.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Tag {
    marker: Symbol,
    other: Symbol,
}

#[derive(Clone, Debug)]
struct EditInfo {
    tag: Tag,
    constraint: Constraint,
    constant: f64,
}

fn note_change(changed: &mut IndexSet<Variable>, should_clear: &mut bool, variable: Variable) {
    if *should_clear {
        changed.clear();
        *should_clear = false;
    }
    changed.insert(variable);
}

/// An incremental linear constraint solver.
///
/// Constraints relate linear expressions over [`Variable`]s with a strength;
/// required constraints must hold, weaker ones are violated as little as
/// their strength allows. Values are read back through [`fetch_changes`]
/// (deltas since the previous call) or [`get_value`].
///
/// [`fetch_changes`]: Solver::fetch_changes
/// [`get_value`]: Solver::get_value
#[derive(Debug)]
pub struct Solver {
    constraints: IndexMap<Constraint, Tag>,
    vars: VarRegistry,
    rows: IndexMap<Symbol, Row>,
    edits: IndexMap<Variable, EditInfo>,
    /// Work queue for the dual simplex; never holds external symbols.
    infeasible_rows: Vec<Symbol>,
    objective: Row,
    artificial: Option<Row>,
    changed: IndexSet<Variable>,
    should_clear_changes: bool,
    public_changes: Vec<(Variable, f64)>,
    id_tick: u32,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            constraints: IndexMap::new(),
            vars: VarRegistry::default(),
            rows: IndexMap::new(),
            edits: IndexMap::new(),
            infeasible_rows: Vec::new(),
            objective: Row::new(0.0),
            artificial: None,
            changed: IndexSet::new(),
            should_clear_changes: false,
            public_changes: Vec::new(),
            id_tick: 1,
        }
    }

    /// Add every constraint in order, stopping at the first failure.
    pub fn add_constraints<I>(&mut self, constraints: I) -> Result<(), AddConstraintError>
    where
        I: IntoIterator<Item = Constraint>,
    {
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Add a constraint to the system and re-optimize.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), AddConstraintError> {
        if self.constraints.contains_key(&constraint) {
            return Err(AddConstraintError::DuplicateConstraint);
        }

        // Building the row mints external symbols for new variables; those
        // may linger in the registry if the constraint is rejected below.
        let (mut row, tag) = self.create_row(&constraint);
        let mut subject = choose_subject(&row, &tag);

        // An all-dummy row is either redundant (zero constant, the marker
        // can enter) or in conflict with the required constraints.
        if subject.is_invalid() && row.all_dummies() {
            if !near_zero(row.constant()) {
                debug!("required equality conflicts with the existing system");
                return Err(AddConstraintError::UnsatisfiableConstraint);
            }
            subject = tag.marker;
        }

        if subject.is_invalid() {
            if !self.add_with_artificial_variable(row)? {
                return Err(AddConstraintError::UnsatisfiableConstraint);
            }
        } else {
            row.solve_for(subject);
            self.substitute(subject, &row);
            if subject.is_external() && row.constant() != 0.0 {
                self.symbol_value_changed(subject);
            }
            self.rows.insert(subject, row);
        }

        self.constraints.insert(constraint, tag);
        self.optimize(Goal::Objective)?;
        Ok(())
    }

    /// Remove a previously added constraint and re-optimize.
    pub fn remove_constraint(
        &mut self,
        constraint: &Constraint,
    ) -> Result<(), RemoveConstraintError> {
        let tag = self
            .constraints
            .shift_remove(constraint)
            .ok_or(RemoveConstraintError::UnknownConstraint)?;

        // Error weights must leave the objective before any pivoting, or
        // the substitutions below fold the stale weights back in.
        self.remove_constraint_effects(constraint, &tag);

        // A basic marker row can simply be dropped; otherwise the marker is
        // pivoted into the basis first.
        if self.rows.shift_remove(&tag.marker).is_none() {
            let (leaving, mut row) = self
                .marker_leaving_row(tag.marker)
                .ok_or(InternalSolverError::FailedToFindLeavingRow)?;
            row.solve_for_pair(leaving, tag.marker);
            self.substitute(tag.marker, &row);
        }
        self.optimize(Goal::Objective)?;

        for term in &constraint.expression().terms {
            if !near_zero(term.coefficient) {
                self.vars.release(term.variable);
            }
        }
        Ok(())
    }

    /// Whether the constraint is currently registered.
    pub fn has_constraint(&self, constraint: &Constraint) -> bool {
        self.constraints.contains_key(constraint)
    }

    /// Register `variable` for editing via [`suggest_value`].
    ///
    /// The strength weights the suggestion against other constraints and
    /// must be below [`strength::REQUIRED`].
    ///
    /// [`suggest_value`]: Solver::suggest_value
    pub fn add_edit_variable(
        &mut self,
        variable: Variable,
        strength: f64,
    ) -> Result<(), AddEditVariableError> {
        if self.edits.contains_key(&variable) {
            return Err(AddEditVariableError::DuplicateEditVariable);
        }
        let strength = strength::clip(strength);
        if strength == strength::REQUIRED {
            return Err(AddEditVariableError::BadRequiredStrength);
        }
        let constraint = Constraint::new(
            Expression::from_term(Term::new(variable, 1.0)),
            RelationalOperator::Equal,
            strength,
        );
        self.add_constraint(constraint.clone())
            .expect("a non-required single-variable equality is always satisfiable");
        let tag = self.constraints[&constraint];
        self.edits.insert(
            variable,
            EditInfo {
                tag,
                constraint,
                constant: 0.0,
            },
        );
        Ok(())
    }

    /// Unregister an edit variable, removing its underlying constraint.
    pub fn remove_edit_variable(&mut self, variable: Variable) -> Result<(), RemoveEditVariableError> {
        let Some(info) = self.edits.shift_remove(&variable) else {
            return Err(RemoveEditVariableError::UnknownEditVariable);
        };
        self.remove_constraint(&info.constraint)
            .map_err(|err| match err {
                RemoveConstraintError::UnknownConstraint => RemoveEditVariableError::Internal(
                    InternalSolverError::EditConstraintNotInSystem,
                ),
                RemoveConstraintError::Internal(internal) => {
                    RemoveEditVariableError::Internal(internal)
                }
            })
    }

    /// Whether the variable is registered for editing.
    pub fn has_edit_variable(&self, variable: Variable) -> bool {
        self.edits.contains_key(&variable)
    }

    /// Suggest a value for an edit variable and repair feasibility.
    pub fn suggest_value(
        &mut self,
        variable: Variable,
        value: f64,
    ) -> Result<(), SuggestValueError> {
        let (marker, other, delta) = {
            let info = self
                .edits
                .get_mut(&variable)
                .ok_or(SuggestValueError::UnknownEditVariable)?;
            let delta = value - info.constant;
            info.constant = value;
            (info.tag.marker, info.tag.other, delta)
        };
        trace!(?marker, delta, "suggesting edit value");

        // The tag symbols of an edit constraint are never external.
        if let Some(row) = self.rows.get_mut(&marker) {
            if row.add(-delta) < 0.0 {
                self.infeasible_rows.push(marker);
            }
        } else if let Some(row) = self.rows.get_mut(&other) {
            if row.add(delta) < 0.0 {
                self.infeasible_rows.push(other);
            }
        } else {
            // Neither symbol is basic: shift every row holding the marker.
            for (&symbol, row) in &mut self.rows {
                let coeff = row.coefficient_for(marker);
                if coeff == 0.0 {
                    continue;
                }
                let diff = delta * coeff;
                if diff != 0.0 && symbol.is_external() {
                    let v = self
                        .vars
                        .variable_for(symbol)
                        .expect("external symbol must map to a variable");
                    note_change(&mut self.changed, &mut self.should_clear_changes, v);
                }
                if row.add(diff) < 0.0 && !symbol.is_external() {
                    self.infeasible_rows.push(symbol);
                }
            }
        }
        self.dual_optimize()?;
        Ok(())
    }

    /// Variables whose value changed since the previous call, with their new
    /// values, in no particular order.
    pub fn fetch_changes(&mut self) -> &[(Variable, f64)] {
        // Two-call latch: changes noted while the caller consumes this batch
        // survive until the next call.
        if self.should_clear_changes {
            self.changed.clear();
            self.should_clear_changes = false;
        } else {
            self.should_clear_changes = true;
        }
        self.public_changes.clear();
        for &variable in &self.changed {
            if let Some(data) = self.vars.data_mut(variable) {
                let new_value = canonical_zero(
                    self.rows
                        .get(&data.symbol)
                        .map(|row| row.constant())
                        .unwrap_or(0.0),
                );
                if data.last_value != new_value {
                    self.public_changes.push((variable, new_value));
                    data.last_value = new_value;
                }
            }
        }
        &self.public_changes
    }

    /// Current value of a variable; zero when the solver does not know it.
    pub fn get_value(&self, variable: Variable) -> f64 {
        canonical_zero(
            self.vars
                .symbol_for(variable)
                .and_then(|symbol| self.rows.get(&symbol))
                .map(|row| row.constant())
                .unwrap_or(0.0),
        )
    }

    /// Return the solver to its freshly constructed state, keeping the
    /// allocated capacity. Existing [`Variable`] handles stay valid but are
    /// no longer known to the solver.
    pub fn reset(&mut self) {
        self.rows.clear();
        self.constraints.clear();
        self.vars.clear();
        self.changed.clear();
        self.public_changes.clear();
        self.should_clear_changes = false;
        self.edits.clear();
        self.infeasible_rows.clear();
        self.objective = Row::new(0.0);
        self.artificial = None;
        self.id_tick = 1;
    }

    fn next_symbol(&mut self, kind: SymbolKind) -> Symbol {
        let symbol = Symbol::new(self.id_tick, kind);
        self.id_tick += 1;
        symbol
    }

    /// Convert a constraint into a tableau row plus its tag.
    ///
    /// Basic variables are substituted on the way in, the slack/error/dummy
    /// symbols demanded by the operator and strength are appended, and the
    /// row sign is normalized so the constant is non-negative.
    fn create_row(&mut self, constraint: &Constraint) -> (Row, Tag) {
        let expr = constraint.expression();
        let mut row = Row::new(expr.constant);
        for term in &expr.terms {
            if near_zero(term.coefficient) {
                continue;
            }
            let symbol = self.vars.retain(term.variable, &mut self.id_tick);
            if let Some(basic) = self.rows.get(&symbol) {
                row.insert_row(basic, term.coefficient);
            } else {
                row.insert_symbol(symbol, term.coefficient);
            }
        }

        let strength = constraint.strength();
        let tag = match constraint.op() {
            RelationalOperator::LessOrEqual | RelationalOperator::GreaterOrEqual => {
                let coeff = if constraint.op() == RelationalOperator::LessOrEqual {
                    1.0
                } else {
                    -1.0
                };
                let slack = self.next_symbol(SymbolKind::Slack);
                row.insert_symbol(slack, coeff);
                if strength < strength::REQUIRED {
                    let error = self.next_symbol(SymbolKind::Error);
                    row.insert_symbol(error, -coeff);
                    self.objective.insert_symbol(error, strength);
                    Tag {
                        marker: slack,
                        other: error,
                    }
                } else {
                    Tag {
                        marker: slack,
                        other: Symbol::invalid(),
                    }
                }
            }
            RelationalOperator::Equal => {
                if strength < strength::REQUIRED {
                    // expr + errminus - errplus == 0
                    let errplus = self.next_symbol(SymbolKind::Error);
                    let errminus = self.next_symbol(SymbolKind::Error);
                    row.insert_symbol(errplus, -1.0);
                    row.insert_symbol(errminus, 1.0);
                    self.objective.insert_symbol(errplus, strength);
                    self.objective.insert_symbol(errminus, strength);
                    Tag {
                        marker: errplus,
                        other: errminus,
                    }
                } else {
                    let dummy = self.next_symbol(SymbolKind::Dummy);
                    row.insert_symbol(dummy, 1.0);
                    Tag {
                        marker: dummy,
                        other: Symbol::invalid(),
                    }
                }
            }
        };

        if row.constant() < 0.0 {
            row.reverse_sign();
        }
        (row, tag)
    }

    /// Withdraw a removed constraint's error weights from the objective.
    /// Reads the markers' *current* basic rows, not snapshots from add time.
    fn remove_constraint_effects(&mut self, constraint: &Constraint, tag: &Tag) {
        if tag.marker.kind() == SymbolKind::Error {
            self.remove_marker_effects(tag.marker, constraint.strength());
        }
        if tag.other.kind() == SymbolKind::Error {
            self.remove_marker_effects(tag.other, constraint.strength());
        }
    }

    fn remove_marker_effects(&mut self, marker: Symbol, strength: f64) {
        if let Some(row) = self.rows.get(&marker) {
            self.objective.insert_row(row, -strength);
        } else {
            self.objective.insert_symbol(marker, -strength);
        }
    }

    fn var_changed(&mut self, variable: Variable) {
        note_change(&mut self.changed, &mut self.should_clear_changes, variable);
    }

    fn symbol_value_changed(&mut self, symbol: Symbol) {
        let variable = self
            .vars
            .variable_for(symbol)
            .expect("external symbol must map to a variable");
        self.var_changed(variable);
    }
}
