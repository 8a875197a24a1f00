//! The pivoting kernel: primal and dual simplex steps, substitution, and
//! the entering/leaving selection rules.

use tracing::{debug, trace};

use crate::error::InternalSolverError;
use crate::num::near_zero;
use crate::row::Row;
use crate::symbol::{Symbol, SymbolKind};

use super::{Solver, Tag, note_change};

/// Which distinguished row a primal optimization drives to its minimum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Goal {
    Objective,
    Artificial,
}

/// First non-dummy symbol with a negative objective coefficient, or the
/// invalid sentinel once the optimum is reached.
fn entering_symbol(objective: &Row) -> Symbol {
    for (&symbol, &coeff) in objective.cells() {
        if symbol.kind() != SymbolKind::Dummy && coeff < 0.0 {
            return symbol;
        }
    }
    Symbol::invalid()
}

/// Subject precedence for a freshly built constraint row: first external
/// cell, then the marker or other tag symbol when pivotable with a negative
/// coefficient.
pub(super) fn choose_subject(row: &Row, tag: &Tag) -> Symbol {
    for &symbol in row.cells().keys() {
        if symbol.is_external() {
            return symbol;
        }
    }
    if tag.marker.is_pivotable() && row.coefficient_for(tag.marker) < 0.0 {
        return tag.marker;
    }
    if tag.other.is_pivotable() && row.coefficient_for(tag.other) < 0.0 {
        return tag.other;
    }
    Symbol::invalid()
}

impl Solver {
    /// Phase-2 simplex: pivot until no objective coefficient is negative.
    pub(super) fn optimize(&mut self, goal: Goal) -> Result<(), InternalSolverError> {
        loop {
            let entering = {
                let objective = match goal {
                    Goal::Objective => &self.objective,
                    Goal::Artificial => self
                        .artificial
                        .as_ref()
                        .expect("artificial row must exist while phase one runs"),
                };
                entering_symbol(objective)
            };
            if entering.is_invalid() {
                return Ok(());
            }
            let (leaving, mut row) = self
                .leaving_row(entering)
                .ok_or(InternalSolverError::ObjectiveUnbounded)?;
            trace!(?entering, ?leaving, "primal pivot");
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            if entering.is_external() && row.constant() != 0.0 {
                self.symbol_value_changed(entering);
            }
            self.rows.insert(entering, row);
        }
    }

    /// Dual simplex: repair rows queued as infeasible while keeping the
    /// objective optimal.
    pub(super) fn dual_optimize(&mut self) -> Result<(), InternalSolverError> {
        while let Some(leaving) = self.infeasible_rows.pop() {
            let is_infeasible = self
                .rows
                .get(&leaving)
                .is_some_and(|row| row.constant() < 0.0);
            if !is_infeasible {
                continue;
            }
            let mut row = self
                .rows
                .shift_remove(&leaving)
                .expect("infeasible row was just observed in the tableau");
            let entering = self.dual_entering_symbol(&row);
            if entering.is_invalid() {
                return Err(InternalSolverError::DualOptimizeFailed);
            }
            trace!(?entering, ?leaving, "dual pivot");
            row.solve_for_pair(leaving, entering);
            self.substitute(entering, &row);
            if entering.is_external() && row.constant() != 0.0 {
                self.symbol_value_changed(entering);
            }
            self.rows.insert(entering, row);
        }
        Ok(())
    }

    /// Replace `symbol` with its defining row throughout the tableau, the
    /// objective, and the artificial row when present.
    pub(super) fn substitute(&mut self, symbol: Symbol, row: &Row) {
        for (&other_symbol, other_row) in &mut self.rows {
            let constant_changed = other_row.substitute(symbol, row);
            if other_symbol.is_external() {
                if constant_changed {
                    let variable = self
                        .vars
                        .variable_for(other_symbol)
                        .expect("external symbol must map to a variable");
                    note_change(&mut self.changed, &mut self.should_clear_changes, variable);
                }
            } else if other_row.constant() < 0.0 {
                self.infeasible_rows.push(other_symbol);
            }
        }
        self.objective.substitute(symbol, row);
        if let Some(artificial) = &mut self.artificial {
            artificial.substitute(symbol, row);
        }
    }

    /// Dual entering rule: over positive non-dummy cells, minimize the ratio
    /// of objective coefficient to cell coefficient.
    fn dual_entering_symbol(&self, row: &Row) -> Symbol {
        let mut entering = Symbol::invalid();
        let mut ratio = f64::INFINITY;
        for (&symbol, &coeff) in row.cells() {
            if coeff > 0.0 && symbol.kind() != SymbolKind::Dummy {
                let r = self.objective.coefficient_for(symbol) / coeff;
                if r < ratio {
                    ratio = r;
                    entering = symbol;
                }
            }
        }
        entering
    }

    /// Min-ratio leaving row for a primal pivot. External basic rows never
    /// leave; absence means the objective is unbounded.
    fn leaving_row(&mut self, entering: Symbol) -> Option<(Symbol, Row)> {
        let mut ratio = f64::INFINITY;
        let mut found = None;
        for (&symbol, row) in &self.rows {
            if symbol.is_external() {
                continue;
            }
            let coeff = row.coefficient_for(entering);
            if coeff < 0.0 {
                let r = -row.constant() / coeff;
                if r < ratio {
                    ratio = r;
                    found = Some(symbol);
                }
            }
        }
        let symbol = found?;
        let row = self
            .rows
            .shift_remove(&symbol)
            .expect("selected leaving row must still be basic");
        Some((symbol, row))
    }

    /// Leaving row used when pivoting a removed constraint's marker into the
    /// basis: restricted rows with negative coefficient first, then
    /// restricted rows with positive coefficient, then any external row.
    pub(super) fn marker_leaving_row(&mut self, marker: Symbol) -> Option<(Symbol, Row)> {
        let mut r1 = f64::INFINITY;
        let mut r2 = f64::INFINITY;
        let mut first = None;
        let mut second = None;
        let mut third = None;
        for (&symbol, row) in &self.rows {
            let coeff = row.coefficient_for(marker);
            if coeff == 0.0 {
                continue;
            }
            if symbol.is_external() {
                third = Some(symbol);
            } else if coeff < 0.0 {
                let r = -row.constant() / coeff;
                if r < r1 {
                    r1 = r;
                    first = Some(symbol);
                }
            } else {
                let r = row.constant() / coeff;
                if r < r2 {
                    r2 = r;
                    second = Some(symbol);
                }
            }
        }
        let symbol = first.or(second).or(third)?;
        if symbol.is_external() && self.rows[&symbol].constant() != 0.0 {
            self.symbol_value_changed(symbol);
        }
        let row = self
            .rows
            .shift_remove(&symbol)
            .expect("marker leaving row must still be basic");
        Some((symbol, row))
    }

    /// Phase-1: introduce an artificial basic variable for a row with no
    /// usable subject and drive it out again. Returns whether the row could
    /// be made feasible.
    pub(super) fn add_with_artificial_variable(
        &mut self,
        row: Row,
    ) -> Result<bool, InternalSolverError> {
        debug!("entering row has no subject, running artificial phase");
        let art = self.next_symbol(SymbolKind::Slack);
        self.rows.insert(art, row.clone());
        self.artificial = Some(row);

        self.optimize(Goal::Artificial)?;
        let success = near_zero(
            self.artificial
                .as_ref()
                .expect("artificial row survives phase one")
                .constant(),
        );
        self.artificial = None;

        // If the artificial symbol is still basic, pivot it out before the
        // scrub below; a constant row means the constraint was redundant.
        if let Some(mut row) = self.rows.shift_remove(&art) {
            if row.cells().is_empty() {
                return Ok(success);
            }
            let entering = row.any_pivotable();
            if entering.is_invalid() {
                return Ok(false);
            }
            row.solve_for_pair(art, entering);
            self.substitute(entering, &row);
            self.rows.insert(entering, row);
        }
        for row in self.rows.values_mut() {
            row.remove(art);
        }
        self.objective.remove(art);
        Ok(success)
    }
}
