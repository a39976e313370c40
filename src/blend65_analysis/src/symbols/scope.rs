use super::symbol::SymbolId;
use blend65_syntax::ast::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Index of a scope in its table's arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
}

/// One lexical scope. Scopes are arena-allocated and live for the whole
/// compilation; parent/child links are arena indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    /// Declared names in insertion order. All declarable kinds share this
    /// one namespace.
    pub(crate) symbols: IndexMap<String, SymbolId>,
    /// AST node that opened this scope (function declaration, block).
    pub opened_by: Option<NodeId>,
}

impl Scope {
    pub(crate) fn new(id: ScopeId, kind: ScopeKind, parent: Option<ScopeId>, opened_by: Option<NodeId>) -> Self {
        Self { id, kind, parent, children: Vec::new(), symbols: IndexMap::new(), opened_by }
    }

    pub fn get(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get(name).copied()
    }

    /// Symbols of this scope, in declaration order.
    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.symbols.values().copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
