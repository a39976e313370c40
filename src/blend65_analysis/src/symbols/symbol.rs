use super::scope::ScopeId;
use crate::types::TypeInfo;
use blend65_syntax::ast::{NodeId, StorageClass};
use blend65_syntax::metadata::MetadataMap;
use blend65_syntax::span::SourceLocation;
use serde::{Deserialize, Serialize};

/// Index of a symbol in its table's arena.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Intrinsic,
    MapVariable,
    ImportedSymbol,
}

/// A declared name. Owned by the scope arena; the `scope` field is an index
/// back to the owning scope, never an owning reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// AST node that declared this symbol.
    pub declaration: NodeId,
    pub is_exported: bool,
    pub is_const: bool,
    pub scope: ScopeId,
    pub location: SourceLocation,
    pub storage_class: Option<StorageClass>,
    /// Resolved by the type-resolution pass; `None` until then.
    pub type_info: Option<TypeInfo>,
    pub has_initializer: bool,
    /// Declared by a `for` loop header.
    pub is_loop_counter: bool,
    pub metadata: MetadataMap,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, declaration: NodeId, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            kind,
            declaration,
            is_exported: false,
            is_const: false,
            scope: ScopeId(0),
            location,
            storage_class: None,
            type_info: None,
            has_initializer: false,
            is_loop_counter: false,
            metadata: MetadataMap::new(),
        }
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn with_storage(mut self, storage: StorageClass) -> Self {
        self.storage_class = Some(storage);
        self
    }

    pub fn with_initializer(mut self) -> Self {
        self.has_initializer = true;
        self
    }

    /// Parameters count as assigned on function entry; initialized
    /// variables are assigned at their declaration.
    pub fn is_assigned_on_entry(&self) -> bool {
        matches!(self.kind, SymbolKind::Parameter) || self.has_initializer
    }

    pub fn type_name(&self) -> &str {
        self.type_info.as_ref().map(|t| t.name.as_str()).unwrap_or("<unresolved>")
    }
}
