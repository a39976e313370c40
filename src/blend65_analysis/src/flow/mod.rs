//! Pass 7: the advanced analyses. Each produces an independent result and
//! its own diagnostic stream; all of them read the symbol table, type
//! system, CFGs and call graph built by passes 1-6.

pub mod coercion_check;
pub mod complexity;
pub mod dead_code;
pub mod definite_assignment;
pub mod liveness;
pub mod purity;
pub mod variable_usage;

pub use coercion_check::{CoercionInfo, CoercionReport};
pub use complexity::{ComplexityReport, ExpressionComplexity};
pub use dead_code::{DeadCodeCause, DeadCodeReport, DeadStatement};
pub use definite_assignment::{AssignState, DefiniteAssignmentAnalysis, StateSnapshot};
pub use liveness::{LivenessAnalysis, LivenessResult};
pub use purity::{FunctionPurity, ImpurityReason, PurityReport};
pub use variable_usage::{UsageClass, VariableUsage, VariableUsageReport};

use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use blend65_syntax::ast::{Expression, NodeId, Statement};
use blend65_syntax::walk::visit_expression;
use std::collections::HashMap;

/// Identifier reads inside an expression that resolved to a variable or
/// parameter, in visit order.
pub(crate) fn collect_reads(
    expr: &Expression,
    symbol_refs: &HashMap<NodeId, SymbolId>,
    symbols: &SymbolTable,
) -> Vec<SymbolId> {
    let mut reads = Vec::new();
    visit_expression(expr, &mut |e| {
        if let Expression::Identifier(ident) = e {
            if let Some(&id) = symbol_refs.get(&ident.id) {
                if matches!(symbols.symbol(id).kind, SymbolKind::Variable | SymbolKind::Parameter) {
                    reads.push(id);
                }
            }
        }
    });
    reads
}

/// Node-local USE/DEF sets for the dataflow analyses. USE is what the
/// statement reads before writing; DEF is what it fully overwrites.
pub(crate) fn statement_use_def(
    stmt: &Statement,
    symbol_refs: &HashMap<NodeId, SymbolId>,
    symbols: &SymbolTable,
) -> (Vec<SymbolId>, Vec<SymbolId>) {
    let mut uses = Vec::new();
    let mut defs = Vec::new();
    match stmt {
        Statement::Let(decl) => {
            if let Some(init) = &decl.initializer {
                uses.extend(collect_reads(init, symbol_refs, symbols));
                if let Some(id) = symbols.symbol_for_declaration(decl.id) {
                    defs.push(id);
                }
            }
        }
        Statement::Assign(s) => {
            uses.extend(collect_reads(&s.value, symbol_refs, symbols));
            match &s.target {
                Expression::Identifier(ident) => {
                    if let Some(&id) = symbol_refs.get(&ident.id) {
                        defs.push(id);
                    }
                }
                Expression::Index(index) => {
                    // An element store keeps the whole array live and kills
                    // nothing.
                    uses.extend(collect_reads(&index.index, symbol_refs, symbols));
                    uses.extend(collect_reads(&index.object, symbol_refs, symbols));
                }
                other => uses.extend(collect_reads(other, symbol_refs, symbols)),
            }
        }
        Statement::Expr(s) => uses.extend(collect_reads(&s.expression, symbol_refs, symbols)),
        Statement::If(s) => uses.extend(collect_reads(&s.condition, symbol_refs, symbols)),
        Statement::While(s) => uses.extend(collect_reads(&s.condition, symbol_refs, symbols)),
        Statement::For(s) => {
            uses.extend(collect_reads(&s.from, symbol_refs, symbols));
            uses.extend(collect_reads(&s.to, symbol_refs, symbols));
            if let Some(step) = &s.step {
                uses.extend(collect_reads(step, symbol_refs, symbols));
            }
            if let Some(id) = symbols.symbol_for_declaration(s.id) {
                defs.push(id);
            }
        }
        Statement::Return(s) => {
            if let Some(value) = &s.value {
                uses.extend(collect_reads(value, symbol_refs, symbols));
            }
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Block(_) => {}
    }
    (uses, defs)
}
