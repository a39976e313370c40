//! Pass 2: resolve textual type annotations and attach `TypeInfo` to every
//! symbol pass 1 declared.

use super::{AnalyzerPass, ScopeCursor};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::symbols::{SymbolId, SymbolTable};
use crate::types::{TypeInfo, TypeSystem};
use blend65_syntax::ast::{FunctionDecl, Item, NodeId, Program, Statement, TypeExpr};
use log::debug;

pub struct TypeResolutionPass;

impl AnalyzerPass for TypeResolutionPass {
    fn id(&self) -> &'static str {
        "type-resolution"
    }

    fn run(&self, program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        let mut diagnostics = DiagnosticCollection::new();
        let mut resolver = Resolver {
            symbols: &mut session.symbols,
            types: &mut session.types,
            diagnostics: &mut diagnostics,
            cursor: ScopeCursor::new(),
        };
        for item in &program.items {
            match item {
                Item::Import(decl) => {
                    // Imported types are filled in by cross-module linking;
                    // until then they stay unresolved-tolerant.
                    for name in &decl.names {
                        resolver.set_symbol_type(name, decl.id, TypeInfo::unknown());
                    }
                }
                Item::Variable(decl) => {
                    let ty = resolver.resolve(&decl.ty);
                    resolver.set_symbol_type(&decl.name, decl.id, ty);
                }
                Item::Map(decl) => {
                    let ty = resolver.resolve(&decl.ty);
                    resolver.set_symbol_type(&decl.name, decl.id, ty);
                }
                Item::Function(decl) => resolver.resolve_function(decl),
            }
        }
        debug!("pass 2: resolved types for {} symbols", session.symbols.symbol_count());
        diagnostics
    }
}

struct Resolver<'a> {
    symbols: &'a mut SymbolTable,
    types: &'a mut TypeSystem,
    diagnostics: &'a mut DiagnosticCollection,
    cursor: ScopeCursor,
}

impl Resolver<'_> {
    fn resolve(&mut self, expr: &TypeExpr) -> TypeInfo {
        match self.types.resolve(expr) {
            Ok(ty) => ty,
            Err(err) => {
                self.diagnostics.add(
                    Diagnostic::error(
                        DiagnosticCode::UnknownType,
                        format!("unknown type name `{}`", err.name),
                    )
                    .with_location(err.location),
                );
                TypeInfo::unknown()
            }
        }
    }

    /// Attach a type to the symbol a declaration produced. Skips symbols
    /// that lost a duplicate-declaration race in pass 1.
    fn set_symbol_type(&mut self, name: &str, declaration: NodeId, ty: TypeInfo) {
        if let Some(id) = self.find_declared(name, declaration) {
            self.symbols.symbol_mut(id).type_info = Some(ty);
        }
    }

    fn find_declared(&self, name: &str, declaration: NodeId) -> Option<SymbolId> {
        let id = self.symbols.lookup(name)?;
        (self.symbols.symbol(id).declaration == declaration).then_some(id)
    }

    fn resolve_function(&mut self, decl: &FunctionDecl) {
        let mut param_types = Vec::with_capacity(decl.params.len());
        let mut param_names = Vec::with_capacity(decl.params.len());
        for param in &decl.params {
            param_types.push(self.resolve(&param.ty));
            param_names.push(param.name.clone());
        }
        let return_type = self.resolve(&decl.return_type);
        let signature = TypeInfo::callback(param_types.clone(), param_names, return_type);
        self.set_symbol_type(&decl.name, decl.id, signature);

        if self.cursor.enter(self.symbols, decl.id) {
            for (param, ty) in decl.params.iter().zip(param_types) {
                self.set_symbol_type(&param.name, param.id, ty);
            }
            self.resolve_statements(&decl.body);
            self.cursor.exit(self.symbols);
        }
    }

    fn resolve_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            match stmt {
                Statement::Let(decl) => {
                    let ty = self.resolve(&decl.ty);
                    self.set_symbol_type(&decl.name, decl.id, ty);
                }
                Statement::If(s) => {
                    if self.cursor.enter(self.symbols, s.id) {
                        self.resolve_statements(&s.then_branch);
                        self.cursor.exit(self.symbols);
                    }
                    if let Some(else_branch) = &s.else_branch {
                        if self.cursor.enter(self.symbols, s.id) {
                            self.resolve_statements(else_branch);
                            self.cursor.exit(self.symbols);
                        }
                    }
                }
                Statement::While(s) => {
                    if self.cursor.enter(self.symbols, s.id) {
                        self.resolve_statements(&s.body);
                        self.cursor.exit(self.symbols);
                    }
                }
                Statement::For(s) => {
                    if self.cursor.enter(self.symbols, s.id) {
                        // Loop counters are bytes; ranges that need more than
                        // 8 bits belong in a while loop.
                        self.set_symbol_type(&s.variable, s.id, TypeInfo::byte());
                        self.resolve_statements(&s.body);
                        self.cursor.exit(self.symbols);
                    }
                }
                Statement::Block(s) => {
                    if self.cursor.enter(self.symbols, s.id) {
                        self.resolve_statements(&s.statements);
                        self.cursor.exit(self.symbols);
                    }
                }
                Statement::Assign(_)
                | Statement::Expr(_)
                | Statement::Break(_)
                | Statement::Continue(_)
                | Statement::Return(_) => {}
            }
        }
    }
}
