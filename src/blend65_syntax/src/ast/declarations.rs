use super::NodeId;
use super::expressions::Expression;
use super::statements::Statement;
use super::types::TypeExpr;
use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};

/// One parsed module: the `module` header plus its top-level items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub module: ModuleDecl,
    pub items: Vec<Item>,
}

impl Program {
    pub fn new(module: ModuleDecl) -> Self {
        Self { module, items: Vec::new() }
    }

    pub fn with_items(module: ModuleDecl, items: Vec<Item>) -> Self {
        Self { module, items }
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDecl {
    pub id: NodeId,
    pub name: String,
    pub location: SourceLocation,
}

impl ModuleDecl {
    pub fn new(name: impl Into<String>, location: SourceLocation) -> Self {
        Self { id: NodeId::UNSET, name: name.into(), location }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Import(ImportDecl),
    Variable(VariableDecl),
    Map(MapDecl),
    Function(FunctionDecl),
}

impl Item {
    pub fn location(&self) -> &SourceLocation {
        match self {
            Item::Import(d) => &d.location,
            Item::Variable(d) => &d.location,
            Item::Map(d) => &d.location,
            Item::Function(d) => &d.location,
        }
    }
}

/// `import a, b from Module`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportDecl {
    pub id: NodeId,
    pub names: Vec<String>,
    pub module: String,
    pub location: SourceLocation,
}

impl ImportDecl {
    pub fn new(names: Vec<String>, module: impl Into<String>, location: SourceLocation) -> Self {
        Self { id: NodeId::UNSET, names, module: module.into(), location }
    }
}

/// Requested placement of a variable, when the source asks for one.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClass {
    ZeroPage,
    Ram,
    Data,
    Map,
}

/// A `let` declaration, at module scope or inside a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeExpr,
    pub initializer: Option<Expression>,
    pub is_const: bool,
    pub is_exported: bool,
    pub storage: Option<StorageClass>,
    pub location: SourceLocation,
}

impl VariableDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr, location: SourceLocation) -> Self {
        Self {
            id: NodeId::UNSET,
            name: name.into(),
            ty,
            initializer: None,
            is_const: false,
            is_exported: false,
            storage: None,
            location,
        }
    }

    pub fn with_initializer(mut self, initializer: Expression) -> Self {
        self.initializer = Some(initializer);
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    pub fn with_storage(mut self, storage: StorageClass) -> Self {
        self.storage = Some(storage);
        self
    }
}

/// A hardware overlay: `map border at $D020: byte`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDecl {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeExpr,
    pub address: u16,
    pub is_exported: bool,
    pub location: SourceLocation,
}

impl MapDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr, address: u16, location: SourceLocation) -> Self {
        Self { id: NodeId::UNSET, name: name.into(), ty, address, is_exported: false, location }
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: NodeId,
    pub name: String,
    pub ty: TypeExpr,
    pub location: SourceLocation,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeExpr, location: SourceLocation) -> Self {
        Self { id: NodeId::UNSET, name: name.into(), ty, location }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub name: String,
    pub params: Vec<Parameter>,
    pub return_type: TypeExpr,
    pub body: Vec<Statement>,
    pub is_exported: bool,
    pub location: SourceLocation,
}

impl FunctionDecl {
    pub fn new(
        name: impl Into<String>,
        params: Vec<Parameter>,
        return_type: TypeExpr,
        body: Vec<Statement>,
        location: SourceLocation,
    ) -> Self {
        Self {
            id: NodeId::UNSET,
            name: name.into(),
            params,
            return_type,
            body,
            is_exported: false,
            location,
        }
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }
}
