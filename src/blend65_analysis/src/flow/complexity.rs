//! Expression complexity scoring. The IL generator uses these numbers to
//! decide between register-style evaluation and explicit temporaries.

use crate::intrinsics::intrinsics;
use crate::session::AnalysisSession;
use blend65_syntax::ast::{Expression, Item, NodeId, Program};
use blend65_syntax::metadata::{MetadataValue, OptimizationMetadataKey};
use blend65_syntax::walk::{statement_expressions, visit_statements};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const SPILL_PRESSURE: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpressionComplexity {
    /// 0-100, saturating.
    pub score: u8,
    /// Capped at three: the 6502 only has A, X and Y.
    pub register_pressure: u8,
    pub tree_depth: u8,
    pub operation_count: u16,
    pub contains_call: bool,
    pub contains_memory_access: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplexityReport {
    pub expressions: HashMap<NodeId, ExpressionComplexity>,
}

impl ComplexityReport {
    pub fn get(&self, node: NodeId) -> Option<&ExpressionComplexity> {
        self.expressions.get(&node)
    }

    /// Expression nodes whose evaluation cannot fit the register file.
    pub fn expressions_needing_spill(&self) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = self
            .expressions
            .iter()
            .filter(|(_, c)| c.register_pressure >= SPILL_PRESSURE)
            .map(|(&id, _)| id)
            .collect();
        nodes.sort();
        nodes
    }
}

pub fn analyze_program(program: &Program, session: &mut AnalysisSession) -> ComplexityReport {
    let mut report = ComplexityReport::default();
    for item in &program.items {
        match item {
            Item::Variable(decl) => {
                if let Some(init) = &decl.initializer {
                    score_expression(init, &mut report);
                }
            }
            Item::Function(decl) => {
                visit_statements(&decl.body, &mut |stmt| {
                    statement_expressions(stmt, &mut |expr| {
                        score_expression(expr, &mut report);
                    });
                });
            }
            Item::Import(_) | Item::Map(_) => {}
        }
    }
    for (&node, complexity) in &report.expressions {
        session.metadata.attach(
            node,
            OptimizationMetadataKey::ComplexityScore,
            MetadataValue::Int(i64::from(complexity.score)),
        );
        session.metadata.attach(
            node,
            OptimizationMetadataKey::RegisterPressure,
            MetadataValue::Int(i64::from(complexity.register_pressure)),
        );
    }
    report
}

/// Uncapped raw score plus the derived measures, recursing over children.
struct Raw {
    score: u32,
    pressure: u8,
    depth: u8,
    ops: u16,
    call: bool,
    memory: bool,
}

fn score_expression(expr: &Expression, report: &mut ComplexityReport) -> Raw {
    let raw = match expr {
        Expression::Number(_) | Expression::Bool(_) | Expression::Str(_) => {
            Raw { score: 1, pressure: 1, depth: 1, ops: 0, call: false, memory: false }
        }
        Expression::Identifier(_) => {
            Raw { score: 1, pressure: 1, depth: 1, ops: 0, call: false, memory: false }
        }
        Expression::Unary(e) => {
            let child = score_expression(&e.operand, report);
            Raw {
                score: 3 + child.score,
                pressure: child.pressure,
                depth: child.depth.saturating_add(1),
                ops: child.ops + 1,
                call: child.call,
                memory: child.memory,
            }
        }
        Expression::Binary(e) => {
            let left = score_expression(&e.left, report);
            let right = score_expression(&e.right, report);
            let both_loaded = left.pressure > 1 && right.pressure > 1;
            Raw {
                score: 5 + left.score + right.score,
                pressure: left.pressure.max(right.pressure) + u8::from(both_loaded),
                depth: left.depth.max(right.depth).saturating_add(1),
                ops: left.ops + right.ops + 1,
                call: left.call || right.call,
                memory: left.memory || right.memory,
            }
        }
        Expression::Index(e) => {
            let object = score_expression(&e.object, report);
            let index = score_expression(&e.index, report);
            Raw {
                score: 8 + object.score + index.score,
                pressure: object.pressure.max(index.pressure),
                depth: object.depth.max(index.depth).saturating_add(1),
                ops: object.ops + index.ops + 1,
                call: object.call || index.call,
                memory: true,
            }
        }
        Expression::Call(e) => {
            let memory_intrinsic = e
                .callee
                .as_identifier()
                .and_then(|name| intrinsics().get(name))
                .map(|def| def.is_volatile || def.has_side_effects)
                .unwrap_or(false);
            let mut score = 12u32;
            let mut pressure = 1u8;
            let mut depth = 0u8;
            let mut ops = 1u16;
            let mut memory = memory_intrinsic;
            for arg in &e.arguments {
                let a = score_expression(arg, report);
                score += a.score;
                pressure = pressure.max(a.pressure);
                depth = depth.max(a.depth);
                ops += a.ops;
                memory |= a.memory;
            }
            Raw { score, pressure, depth: depth.saturating_add(1), ops, call: true, memory }
        }
    };
    report.expressions.insert(
        expr.id(),
        ExpressionComplexity {
            score: raw.score.min(100) as u8,
            register_pressure: raw.pressure.min(3),
            tree_depth: raw.depth,
            operation_count: raw.ops,
            contains_call: raw.call,
            contains_memory_access: raw.memory,
        },
    );
    Raw { pressure: raw.pressure.min(3), ..raw }
}
