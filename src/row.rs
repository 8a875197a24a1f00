//! Sparse tableau rows.
//!
//! A row models `constant = Σ coeffᵢ·symᵢ`: when the row is basic for some
//! symbol, that symbol's value is the row constant once every non-basic
//! symbol is at zero. Cells stay in insertion order so "first candidate"
//! scans over a row are reproducible.

use indexmap::IndexMap;
use indexmap::map::Entry;

use crate::num::near_zero;
use crate::symbol::{Symbol, SymbolKind};

#[derive(Clone, Debug, Default)]
pub(crate) struct Row {
    cells: IndexMap<Symbol, f64>,
    constant: f64,
}

impl Row {
    pub(crate) fn new(constant: f64) -> Self {
        Self {
            cells: IndexMap::new(),
            constant,
        }
    }

    #[inline(always)]
    pub(crate) fn constant(&self) -> f64 {
        self.constant
    }

    #[inline(always)]
    pub(crate) fn cells(&self) -> &IndexMap<Symbol, f64> {
        &self.cells
    }

    /// Shift the constant by `value`, returning the new constant.
    pub(crate) fn add(&mut self, value: f64) -> f64 {
        self.constant += value;
        self.constant
    }

    /// Add `coefficient` to the cell for `symbol`, culling the cell if the
    /// result lands inside the zero band.
    pub(crate) fn insert_symbol(&mut self, symbol: Symbol, coefficient: f64) {
        match self.cells.entry(symbol) {
            Entry::Occupied(mut entry) => {
                let sum = *entry.get() + coefficient;
                if near_zero(sum) {
                    entry.shift_remove();
                } else {
                    *entry.get_mut() = sum;
                }
            }
            Entry::Vacant(entry) => {
                if !near_zero(coefficient) {
                    entry.insert(coefficient);
                }
            }
        }
    }

    /// Add `coefficient` times `other` into this row.
    ///
    /// Returns whether the constant changed, which callers use to detect
    /// externally visible value movement during substitution.
    pub(crate) fn insert_row(&mut self, other: &Row, coefficient: f64) -> bool {
        let diff = other.constant * coefficient;
        self.constant += diff;
        for (&symbol, &coeff) in &other.cells {
            self.insert_symbol(symbol, coeff * coefficient);
        }
        diff != 0.0
    }

    pub(crate) fn remove(&mut self, symbol: Symbol) {
        self.cells.shift_remove(&symbol);
    }

    pub(crate) fn reverse_sign(&mut self) {
        self.constant = -self.constant;
        for coeff in self.cells.values_mut() {
            *coeff = -*coeff;
        }
    }

    /// Rearrange the row so it expresses `symbol = constant + Σ cells`.
    ///
    /// The symbol must be present with a non-zero coefficient.
    pub(crate) fn solve_for(&mut self, symbol: Symbol) {
        let coeff = self
            .cells
            .shift_remove(&symbol)
            .expect("solve_for target must be a cell of the row");
        let factor = -1.0 / coeff;
        self.constant *= factor;
        self.cells.retain(|_, c| {
            *c *= factor;
            !near_zero(*c)
        });
    }

    /// Pivot: given this row basic in `lhs`, make it basic in `rhs`.
    pub(crate) fn solve_for_pair(&mut self, lhs: Symbol, rhs: Symbol) {
        self.insert_symbol(lhs, -1.0);
        self.solve_for(rhs);
    }

    #[inline(always)]
    pub(crate) fn coefficient_for(&self, symbol: Symbol) -> f64 {
        self.cells.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Replace `symbol` with the row that now defines it.
    ///
    /// Returns whether the constant changed.
    pub(crate) fn substitute(&mut self, symbol: Symbol, row: &Row) -> bool {
        match self.cells.shift_remove(&symbol) {
            Some(coefficient) => self.insert_row(row, coefficient),
            None => false,
        }
    }

    pub(crate) fn all_dummies(&self) -> bool {
        self.cells.keys().all(|s| s.kind() == SymbolKind::Dummy)
    }

    /// First slack or error symbol in the row, or the invalid sentinel.
    pub(crate) fn any_pivotable(&self) -> Symbol {
        self.cells
            .keys()
            .copied()
            .find(|s| s.is_pivotable())
            .unwrap_or(Symbol::invalid())
    }
}
