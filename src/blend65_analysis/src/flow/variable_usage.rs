//! Read/write counting per variable and parameter, with hot-path
//! bookkeeping for the zero-page allocator and unused/write-only warnings.

use super::collect_reads;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::symbols::{SymbolId, SymbolKind};
use blend65_syntax::ast::{Expression, Item, Program, Statement};
use blend65_syntax::metadata::{MetadataValue, OptimizationMetadataKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageClass {
    Unused,
    WriteOnly,
    ReadOnly,
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableUsage {
    pub symbol: SymbolId,
    pub name: String,
    pub read_count: u32,
    pub write_count: u32,
    /// Accesses under at least one enclosing loop.
    pub hot_path_accesses: u32,
    pub max_loop_depth: u32,
    pub class: UsageClass,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableUsageReport {
    pub usages: Vec<VariableUsage>,
}

#[derive(Default)]
struct Counters {
    reads: u32,
    writes: u32,
    hot: u32,
    max_depth: u32,
}

pub fn analyze_program(
    program: &Program,
    session: &mut AnalysisSession,
) -> (VariableUsageReport, DiagnosticCollection) {
    let mut counters: HashMap<SymbolId, Counters> = HashMap::new();
    for item in &program.items {
        match item {
            Item::Variable(decl) => {
                if let Some(init) = &decl.initializer {
                    count_reads(init, session, &mut counters, 0);
                }
            }
            Item::Function(decl) => count_statements(&decl.body, session, &mut counters, 0),
            Item::Import(_) | Item::Map(_) => {}
        }
    }

    let mut report = VariableUsageReport::default();
    let mut diagnostics = DiagnosticCollection::new();
    for (id, symbol) in session.symbols.symbols() {
        if !matches!(symbol.kind, SymbolKind::Variable | SymbolKind::Parameter) {
            continue;
        }
        let c = counters.remove(&id).unwrap_or_default();
        let class = match (c.reads, c.writes) {
            (0, 0) => UsageClass::Unused,
            (0, _) => UsageClass::WriteOnly,
            (_, 0) => UsageClass::ReadOnly,
            _ => UsageClass::Live,
        };
        let exempt = symbol.name.starts_with('_')
            || symbol.is_exported
            || (session.options.ignore_loop_counters && symbol.is_loop_counter);
        if !exempt {
            match class {
                UsageClass::Unused => diagnostics.add(
                    Diagnostic::warning(
                        DiagnosticCode::UnusedVariable,
                        format!("`{}` is never used", symbol.name),
                    )
                    .with_location(symbol.location.clone()),
                ),
                UsageClass::WriteOnly => diagnostics.add(
                    Diagnostic::warning(
                        DiagnosticCode::WriteOnlyVariable,
                        format!("`{}` is written but never read", symbol.name),
                    )
                    .with_location(symbol.location.clone()),
                ),
                UsageClass::ReadOnly | UsageClass::Live => {}
            }
        }
        report.usages.push(VariableUsage {
            symbol: id,
            name: symbol.name.clone(),
            read_count: c.reads,
            write_count: c.writes,
            hot_path_accesses: c.hot,
            max_loop_depth: c.max_depth,
            class,
        });
    }

    // Seed the allocator-facing metadata on each declaration.
    for usage in &report.usages {
        let declaration = session.symbols.symbol(usage.symbol).declaration;
        if declaration.is_set() && (usage.hot_path_accesses > 0 || usage.max_loop_depth > 0) {
            session.metadata.attach(
                declaration,
                OptimizationMetadataKey::HotPathAccesses,
                MetadataValue::Int(i64::from(usage.hot_path_accesses)),
            );
            session.metadata.attach(
                declaration,
                OptimizationMetadataKey::LoopDepth,
                MetadataValue::Int(i64::from(usage.max_loop_depth)),
            );
        }
    }
    (report, diagnostics)
}

fn touch(counters: &mut HashMap<SymbolId, Counters>, id: SymbolId, depth: u32, write: bool) {
    let c = counters.entry(id).or_default();
    if write {
        c.writes += 1;
    } else {
        c.reads += 1;
    }
    if depth > 0 {
        c.hot += 1;
    }
    c.max_depth = c.max_depth.max(depth);
}

fn count_reads(
    expr: &Expression,
    session: &AnalysisSession,
    counters: &mut HashMap<SymbolId, Counters>,
    depth: u32,
) {
    for id in collect_reads(expr, &session.symbol_refs, &session.symbols) {
        touch(counters, id, depth, false);
    }
}

fn count_statements(
    statements: &[Statement],
    session: &AnalysisSession,
    counters: &mut HashMap<SymbolId, Counters>,
    depth: u32,
) {
    for stmt in statements {
        match stmt {
            Statement::Let(decl) => {
                if let Some(init) = &decl.initializer {
                    count_reads(init, session, counters, depth);
                    if let Some(id) = session.symbols.symbol_for_declaration(decl.id) {
                        touch(counters, id, depth, true);
                    }
                }
            }
            Statement::Assign(s) => {
                count_reads(&s.value, session, counters, depth);
                match &s.target {
                    Expression::Identifier(ident) => {
                        if let Some(&id) = session.symbol_refs.get(&ident.id) {
                            touch(counters, id, depth, true);
                        }
                    }
                    Expression::Index(index) => {
                        count_reads(&index.index, session, counters, depth);
                        if let Expression::Identifier(ident) = &index.object {
                            if let Some(&id) = session.symbol_refs.get(&ident.id) {
                                touch(counters, id, depth, true);
                            }
                        }
                    }
                    other => count_reads(other, session, counters, depth),
                }
            }
            Statement::Expr(s) => count_reads(&s.expression, session, counters, depth),
            Statement::If(s) => {
                count_reads(&s.condition, session, counters, depth);
                count_statements(&s.then_branch, session, counters, depth);
                if let Some(else_branch) = &s.else_branch {
                    count_statements(else_branch, session, counters, depth);
                }
            }
            Statement::While(s) => {
                count_reads(&s.condition, session, counters, depth + 1);
                count_statements(&s.body, session, counters, depth + 1);
            }
            Statement::For(s) => {
                count_reads(&s.from, session, counters, depth);
                count_reads(&s.to, session, counters, depth);
                if let Some(step) = &s.step {
                    count_reads(step, session, counters, depth);
                }
                if let Some(id) = session.symbols.symbol_for_declaration(s.id) {
                    touch(counters, id, depth + 1, true);
                }
                count_statements(&s.body, session, counters, depth + 1);
            }
            Statement::Return(s) => {
                if let Some(value) = &s.value {
                    count_reads(value, session, counters, depth);
                }
            }
            Statement::Block(s) => count_statements(&s.statements, session, counters, depth),
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }
}
