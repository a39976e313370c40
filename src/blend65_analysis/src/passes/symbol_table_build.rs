//! Pass 1: build the scope tree and declare every name. Declaration-only;
//! expressions are not visited.

use super::AnalyzerPass;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::symbols::{Symbol, SymbolKind};
use blend65_syntax::ast::{Item, Program, Statement, StorageClass};
use log::debug;

pub struct SymbolTableBuildPass;

impl AnalyzerPass for SymbolTableBuildPass {
    fn id(&self) -> &'static str {
        "symbol-table-build"
    }

    fn run(&self, program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        let mut diagnostics = DiagnosticCollection::new();
        for item in &program.items {
            match item {
                Item::Import(decl) => {
                    for name in &decl.names {
                        let symbol =
                            Symbol::new(name, SymbolKind::ImportedSymbol, decl.id, decl.location.clone());
                        declare(session, &mut diagnostics, symbol);
                    }
                }
                Item::Variable(decl) => {
                    let mut symbol =
                        Symbol::new(&decl.name, SymbolKind::Variable, decl.id, decl.location.clone());
                    symbol.is_const = decl.is_const;
                    symbol.is_exported = decl.is_exported;
                    symbol.storage_class = decl.storage;
                    symbol.has_initializer = decl.initializer.is_some();
                    declare(session, &mut diagnostics, symbol);
                }
                Item::Map(decl) => {
                    let mut symbol =
                        Symbol::new(&decl.name, SymbolKind::MapVariable, decl.id, decl.location.clone());
                    symbol.is_exported = decl.is_exported;
                    symbol.storage_class = Some(StorageClass::Map);
                    declare(session, &mut diagnostics, symbol);
                }
                Item::Function(decl) => {
                    let mut symbol =
                        Symbol::new(&decl.name, SymbolKind::Function, decl.id, decl.location.clone());
                    symbol.is_exported = decl.is_exported;
                    declare(session, &mut diagnostics, symbol);

                    session.symbols.enter_function_scope(decl.id);
                    for param in &decl.params {
                        let p = Symbol::new(
                            &param.name,
                            SymbolKind::Parameter,
                            param.id,
                            param.location.clone(),
                        );
                        declare(session, &mut diagnostics, p);
                    }
                    declare_statements(session, &mut diagnostics, &decl.body);
                    session.symbols.exit_scope();
                }
            }
            session.stats.total_declarations += 1;
        }
        debug!(
            "pass 1: {} symbols in {} scopes",
            session.symbols.symbol_count(),
            session.symbols.scope_count()
        );
        diagnostics
    }
}

fn declare(session: &mut AnalysisSession, diagnostics: &mut DiagnosticCollection, symbol: Symbol) {
    if let Err(duplicate) = session.symbols.declare(symbol) {
        diagnostics.add(
            Diagnostic::error(
                DiagnosticCode::DuplicateDeclaration,
                format!("`{}` is already declared in this scope", duplicate.name),
            )
            .with_location(duplicate.location),
        );
    }
}

fn declare_statements(
    session: &mut AnalysisSession,
    diagnostics: &mut DiagnosticCollection,
    statements: &[Statement],
) {
    for stmt in statements {
        match stmt {
            Statement::Let(decl) => {
                if decl.is_exported {
                    diagnostics.add(
                        Diagnostic::error(
                            DiagnosticCode::ExportNotModuleScope,
                            format!("`{}` cannot be exported from a function body", decl.name),
                        )
                        .with_location(decl.location.clone()),
                    );
                }
                let mut symbol =
                    Symbol::new(&decl.name, SymbolKind::Variable, decl.id, decl.location.clone());
                symbol.is_const = decl.is_const;
                symbol.storage_class = decl.storage;
                symbol.has_initializer = decl.initializer.is_some();
                declare(session, diagnostics, symbol);
                session.stats.total_declarations += 1;
            }
            Statement::If(s) => {
                session.symbols.enter_block_scope(Some(s.id));
                declare_statements(session, diagnostics, &s.then_branch);
                session.symbols.exit_scope();
                if let Some(else_branch) = &s.else_branch {
                    session.symbols.enter_block_scope(Some(s.id));
                    declare_statements(session, diagnostics, else_branch);
                    session.symbols.exit_scope();
                }
            }
            Statement::While(s) => {
                session.symbols.enter_block_scope(Some(s.id));
                declare_statements(session, diagnostics, &s.body);
                session.symbols.exit_scope();
            }
            Statement::For(s) => {
                session.symbols.enter_block_scope(Some(s.id));
                let mut counter = Symbol::new(&s.variable, SymbolKind::Variable, s.id, s.location.clone());
                counter.has_initializer = true;
                counter.is_loop_counter = true;
                declare(session, diagnostics, counter);
                session.stats.total_declarations += 1;
                declare_statements(session, diagnostics, &s.body);
                session.symbols.exit_scope();
            }
            Statement::Block(s) => {
                session.symbols.enter_block_scope(Some(s.id));
                declare_statements(session, diagnostics, &s.statements);
                session.symbols.exit_scope();
            }
            Statement::Assign(_)
            | Statement::Expr(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Return(_) => {}
        }
    }
}
