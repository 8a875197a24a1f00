use indexmap::IndexMap;

use crate::symbol::{Symbol, SymbolKind};
use crate::types::Variable;

#[derive(Clone, Debug)]
pub(crate) struct VarData {
    /// Last value handed to the caller. Starts as NaN so the first real
    /// value, zero included, registers as a change.
    pub(crate) last_value: f64,
    pub(crate) symbol: Symbol,
    pub(crate) refcount: u32,
}

/// Two-way map between user variables and their external tableau symbols.
///
/// Variables are reference-counted by the constraints that mention them and
/// evicted once the last such constraint is removed.
#[derive(Debug, Default)]
pub(crate) struct VarRegistry {
    var_data: IndexMap<Variable, VarData>,
    var_for_symbol: IndexMap<Symbol, Variable>,
}

impl VarRegistry {
    /// Symbol for `variable`, minting an external symbol on first sighting.
    /// Each call accounts for one constraint term referencing the variable.
    pub(crate) fn retain(&mut self, variable: Variable, id_tick: &mut u32) -> Symbol {
        let var_for_symbol = &mut self.var_for_symbol;
        let data = self.var_data.entry(variable).or_insert_with(|| {
            let symbol = Symbol::new(*id_tick, SymbolKind::External);
            *id_tick += 1;
            var_for_symbol.insert(symbol, variable);
            VarData {
                last_value: f64::NAN,
                symbol,
                refcount: 0,
            }
        });
        data.refcount += 1;
        data.symbol
    }

    /// Drop one constraint reference, evicting the variable at zero.
    pub(crate) fn release(&mut self, variable: Variable) {
        let Some(data) = self.var_data.get_mut(&variable) else {
            return;
        };
        data.refcount -= 1;
        if data.refcount == 0 {
            let symbol = data.symbol;
            self.var_for_symbol.shift_remove(&symbol);
            self.var_data.shift_remove(&variable);
        }
    }

    #[inline(always)]
    pub(crate) fn symbol_for(&self, variable: Variable) -> Option<Symbol> {
        self.var_data.get(&variable).map(|data| data.symbol)
    }

    #[inline(always)]
    pub(crate) fn variable_for(&self, symbol: Symbol) -> Option<Variable> {
        self.var_for_symbol.get(&symbol).copied()
    }

    #[inline(always)]
    pub(crate) fn data_mut(&mut self, variable: Variable) -> Option<&mut VarData> {
        self.var_data.get_mut(&variable)
    }

    #[cfg(test)]
    pub(crate) fn refcount(&self, variable: Variable) -> u32 {
        self.var_data
            .get(&variable)
            .map(|data| data.refcount)
            .unwrap_or(0)
    }

    pub(crate) fn clear(&mut self) {
        self.var_data.clear();
        self.var_for_symbol.clear();
    }
}
