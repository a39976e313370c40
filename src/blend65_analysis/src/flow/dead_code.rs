//! Reports every statement the reachability pass proved dead, with a guess
//! at which terminator made it so.

use crate::artifacts::{CfgNodeId, CfgNodeKind, ControlFlowGraph};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use blend65_syntax::ast::{Expression, Statement};
use blend65_syntax::span::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeadCodeCause {
    AfterReturn,
    AfterBreak,
    AfterContinue,
    AfterInfiniteLoop,
    Unreachable,
}

impl DeadCodeCause {
    fn describe(self) -> &'static str {
        match self {
            DeadCodeCause::AfterReturn => "after a return",
            DeadCodeCause::AfterBreak => "after a break",
            DeadCodeCause::AfterContinue => "after a continue",
            DeadCodeCause::AfterInfiniteLoop => "after an infinite loop",
            DeadCodeCause::Unreachable => "unreachable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadStatement {
    pub node: CfgNodeId,
    pub function_name: String,
    pub location: SourceLocation,
    pub cause: DeadCodeCause,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadCodeReport {
    pub items: Vec<DeadStatement>,
}

/// Scan one CFG for unreachable statements. Requires reachability to have
/// been computed by pass 4.
pub fn analyze_cfg(cfg: &ControlFlowGraph, report: &mut DeadCodeReport, diagnostics: &mut DiagnosticCollection) {
    for node in cfg.unreachable_nodes() {
        let Some(location) = &node.location else { continue };
        let cause = infer_cause(cfg, location);
        report.items.push(DeadStatement {
            node: node.id,
            function_name: cfg.function_name.clone(),
            location: location.clone(),
            cause,
        });
        diagnostics.add(
            Diagnostic::warning(
                DiagnosticCode::UnreachableCode,
                format!("statement is unreachable ({})", cause.describe()),
            )
            .with_location(location.clone()),
        );
    }
}

/// The nearest reachable terminator whose source position precedes the dead
/// statement is the likeliest culprit.
fn infer_cause(cfg: &ControlFlowGraph, dead_at: &SourceLocation) -> DeadCodeCause {
    let mut best: Option<(&SourceLocation, DeadCodeCause)> = None;
    for node in cfg.nodes() {
        if !node.reachable {
            continue;
        }
        let candidate = match node.kind {
            CfgNodeKind::Return => DeadCodeCause::AfterReturn,
            CfgNodeKind::Break => DeadCodeCause::AfterBreak,
            CfgNodeKind::Continue => DeadCodeCause::AfterContinue,
            CfgNodeKind::Loop if is_infinite_loop(node.statement.as_ref()) => {
                DeadCodeCause::AfterInfiniteLoop
            }
            _ => continue,
        };
        let Some(location) = &node.location else { continue };
        if location.start.offset <= dead_at.start.offset {
            let closer = best
                .map(|(loc, _)| location.start.offset > loc.start.offset)
                .unwrap_or(true);
            if closer {
                best = Some((location, candidate));
            }
        }
    }
    best.map(|(_, cause)| cause).unwrap_or(DeadCodeCause::Unreachable)
}

fn is_infinite_loop(stmt: Option<&Statement>) -> bool {
    match stmt {
        Some(Statement::While(w)) => matches!(&w.condition, Expression::Bool(b) if b.value),
        _ => false,
    }
}
