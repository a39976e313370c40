use super::symbol::Symbol;
use super::table::SymbolTable;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Snapshot of one module's symbols for cross-module resolution.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSymbols {
    pub all: Vec<Symbol>,
    /// Indices into `all`, in declaration order.
    pub exported: Vec<usize>,
}

/// Aggregates every analyzed module's root-scope symbols. Modules are kept
/// in the order they were registered, which fixes cross-module resolution
/// order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSymbolTable {
    modules: IndexMap<String, ModuleSymbols>,
}

impl GlobalSymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module's table, replacing any previous snapshot.
    pub fn add_module(&mut self, table: &SymbolTable) {
        let mut snapshot = ModuleSymbols::default();
        for (_, symbol) in table.symbols() {
            if symbol.is_exported {
                snapshot.exported.push(snapshot.all.len());
            }
            snapshot.all.push(symbol.clone());
        }
        self.modules.insert(table.module_name.clone(), snapshot);
    }

    pub fn module(&self, name: &str) -> Option<&ModuleSymbols> {
        self.modules.get(name)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(|s| s.as_str())
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Resolve `name` as seen from `from_module`: every *other* module's
    /// exports are searched in registration order; first hit wins.
    pub fn lookup(&self, name: &str, from_module: &str) -> Option<(&str, &Symbol)> {
        for (module_name, module) in &self.modules {
            if module_name == from_module {
                continue;
            }
            for &idx in &module.exported {
                let symbol = &module.all[idx];
                if symbol.name == name {
                    return Some((module_name.as_str(), symbol));
                }
            }
        }
        None
    }

    /// Resolve `name` inside one module: any kind, exported or not.
    pub fn lookup_in_module(&self, name: &str, module: &str) -> Option<&Symbol> {
        self.modules.get(module)?.all.iter().find(|s| s.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::symbol::SymbolKind;
    use blend65_syntax::ast::NodeId;
    use blend65_syntax::span::SourceLocation;

    fn table_with(module: &str, names: &[(&str, bool)]) -> SymbolTable {
        let mut table = SymbolTable::new(module);
        for &(name, exported) in names {
            let mut sym = Symbol::new(name, SymbolKind::Function, NodeId::UNSET, SourceLocation::default());
            sym.is_exported = exported;
            table.declare(sym).unwrap();
        }
        table
    }

    #[test]
    fn lookup_skips_the_requesting_module() {
        let mut global = GlobalSymbolTable::new();
        global.add_module(&table_with("A", &[("f", true)]));
        global.add_module(&table_with("B", &[("f", true)]));
        let (module, _) = global.lookup("f", "A").unwrap();
        assert_eq!(module, "B");
    }

    #[test]
    fn lookup_only_sees_exports() {
        let mut global = GlobalSymbolTable::new();
        global.add_module(&table_with("A", &[("hidden", false)]));
        assert!(global.lookup("hidden", "B").is_none());
        assert!(global.lookup_in_module("hidden", "A").is_some());
    }

    #[test]
    fn first_registered_module_wins() {
        let mut global = GlobalSymbolTable::new();
        global.add_module(&table_with("First", &[("f", true)]));
        global.add_module(&table_with("Second", &[("f", true)]));
        let (module, _) = global.lookup("f", "Third").unwrap();
        assert_eq!(module, "First");
    }
}
