use super::scope::{Scope, ScopeId, ScopeKind};
use super::symbol::{Symbol, SymbolId};
use blend65_syntax::ast::NodeId;
use blend65_syntax::span::SourceLocation;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Declaring a name twice in one scope. Recoverable: the caller turns this
/// into a diagnostic and drops the new symbol.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("`{name}` is already declared in this scope")]
pub struct DuplicateDeclaration {
    pub name: String,
    pub location: SourceLocation,
    pub existing: SymbolId,
}

/// Scopes and symbols for one module, arena-allocated with index
/// cross-references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolTable {
    pub module_name: String,
    scopes: Vec<Scope>,
    symbols: Vec<Symbol>,
    #[serde(skip, default = "root_stack")]
    stack: Vec<ScopeId>,
    /// Scopes opened by each AST node, in creation order. An `if` opens up
    /// to two (then-branch, else-branch).
    scope_by_node: HashMap<NodeId, Vec<ScopeId>>,
    /// First symbol each declaration node produced.
    by_declaration: HashMap<NodeId, SymbolId>,
}

fn root_stack() -> Vec<ScopeId> {
    vec![ScopeId(0)]
}

impl SymbolTable {
    /// A fresh table with its module root scope entered.
    pub fn new(module_name: impl Into<String>) -> Self {
        let root = Scope::new(ScopeId(0), ScopeKind::Module, None, None);
        Self {
            module_name: module_name.into(),
            scopes: vec![root],
            symbols: Vec::new(),
            stack: vec![ScopeId(0)],
            scope_by_node: HashMap::new(),
            by_declaration: HashMap::new(),
        }
    }

    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn current_scope(&self) -> ScopeId {
        *self.stack.last().expect("scope stack never empties below the root")
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    /// All symbols in arena (declaration) order.
    pub fn symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, s)| (SymbolId(i as u32), s))
    }

    /// Exported symbols, in declaration order.
    pub fn exported_symbols(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols().filter(|(_, s)| s.is_exported)
    }

    /// The first scope an AST node opened, if any.
    pub fn scope_for_node(&self, node: NodeId) -> Option<ScopeId> {
        self.scope_by_node.get(&node).and_then(|v| v.first().copied())
    }

    /// All scopes an AST node opened, in creation order.
    pub fn scopes_for_node(&self, node: NodeId) -> &[ScopeId] {
        self.scope_by_node.get(&node).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn enter_scope(&mut self, kind: ScopeKind, opened_by: Option<NodeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        let parent = self.current_scope();
        self.scopes.push(Scope::new(id, kind, Some(parent), opened_by));
        self.scopes[parent.0 as usize].children.push(id);
        if let Some(node) = opened_by {
            self.scope_by_node.entry(node).or_default().push(id);
        }
        self.stack.push(id);
        trace!("enter {:?} scope {}", kind, id.0);
        id
    }

    pub fn enter_function_scope(&mut self, declaration: NodeId) -> ScopeId {
        self.enter_scope(ScopeKind::Function, Some(declaration))
    }

    pub fn enter_block_scope(&mut self, opened_by: Option<NodeId>) -> ScopeId {
        self.enter_scope(ScopeKind::Block, opened_by)
    }

    /// Leave the current scope. The module root is never popped.
    pub fn exit_scope(&mut self) {
        debug_assert!(self.stack.len() > 1, "exit_scope called at module root");
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    /// Re-enter an existing scope (used by later passes revisiting the tree).
    pub fn push_existing_scope(&mut self, id: ScopeId) {
        self.stack.push(id);
    }

    /// Insert into the current scope, or fail if the name is taken there.
    pub fn declare(&mut self, mut symbol: Symbol) -> Result<SymbolId, DuplicateDeclaration> {
        let scope_id = self.current_scope();
        if let Some(existing) = self.scopes[scope_id.0 as usize].get(&symbol.name) {
            return Err(DuplicateDeclaration {
                name: symbol.name,
                location: symbol.location,
                existing,
            });
        }
        symbol.scope = scope_id;
        let id = SymbolId(self.symbols.len() as u32);
        let name = symbol.name.clone();
        let declaration = symbol.declaration;
        self.symbols.push(symbol);
        self.scopes[scope_id.0 as usize].symbols.insert(name, id);
        if declaration.is_set() {
            self.by_declaration.entry(declaration).or_insert(id);
        }
        Ok(id)
    }

    /// First symbol a declaration node produced, if any survived.
    pub fn symbol_for_declaration(&self, node: NodeId) -> Option<SymbolId> {
        self.by_declaration.get(&node).copied()
    }

    /// Nearest declaration visible from the current scope.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.lookup_from(self.current_scope(), name)
    }

    /// Nearest declaration visible from a given scope, walking parents.
    pub fn lookup_from(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut cursor = Some(scope);
        while let Some(id) = cursor {
            let scope = &self.scopes[id.0 as usize];
            if let Some(sym) = scope.get(name) {
                return Some(sym);
            }
            cursor = scope.parent;
        }
        None
    }

    /// Declaration in the current scope only; never walks parents.
    pub fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        self.scope(self.current_scope()).get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::symbol::SymbolKind;

    fn sym(name: &str, kind: SymbolKind) -> Symbol {
        Symbol::new(name, kind, NodeId::UNSET, SourceLocation::default())
    }

    #[test]
    fn declare_then_lookup_round_trips() {
        let mut table = SymbolTable::new("Main");
        let id = table.declare(sym("x", SymbolKind::Variable)).unwrap();
        assert_eq!(table.lookup("x"), Some(id));
        assert_eq!(table.lookup_local("x"), Some(id));
        assert_eq!(table.symbol(id).scope, table.root_scope());
    }

    #[test]
    fn duplicate_declaration_is_rejected_and_recoverable() {
        let mut table = SymbolTable::new("Main");
        let first = table.declare(sym("x", SymbolKind::Variable)).unwrap();
        let err = table.declare(sym("x", SymbolKind::Function)).unwrap_err();
        assert_eq!(err.existing, first);
        // The arena still only holds the original.
        assert_eq!(table.symbol_count(), 1);
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let mut table = SymbolTable::new("Main");
        let outer = table.declare(sym("x", SymbolKind::Variable)).unwrap();
        table.enter_block_scope(None);
        let inner = table.declare(sym("x", SymbolKind::Variable)).unwrap();
        assert_eq!(table.lookup("x"), Some(inner));
        table.exit_scope();
        assert_eq!(table.lookup("x"), Some(outer));
    }

    #[test]
    fn lookup_local_ignores_parents() {
        let mut table = SymbolTable::new("Main");
        table.declare(sym("x", SymbolKind::Variable)).unwrap();
        table.enter_block_scope(None);
        assert_eq!(table.lookup_local("x"), None);
        assert!(table.lookup("x").is_some());
    }

    #[test]
    fn scope_for_node_finds_function_scopes() {
        let mut table = SymbolTable::new("Main");
        let decl = NodeId(7);
        let scope = table.enter_function_scope(decl);
        table.exit_scope();
        assert_eq!(table.scope_for_node(decl), Some(scope));
    }
}
