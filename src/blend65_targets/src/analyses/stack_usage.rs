//! Hardware-stack usage estimation. The 6502 stack is one page; deep call
//! chains get flagged well before they can wrap it.

use blend65_analysis::analyzer::AnalysisResult;
use blend65_analysis::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use blend65_syntax::ast::{Expression, Item, Program, Statement};
use blend65_syntax::walk::{statement_expressions, visit_expression, visit_statements};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The 6502 stack page holds 256 bytes; warn at three quarters.
const STACK_BYTES: u32 = 256;
const WARN_THRESHOLD: u32 = STACK_BYTES * 3 / 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionStackUsage {
    /// Bytes this function alone pushes: return address, spilled argument
    /// space, temporaries.
    pub estimated_depth: u32,
    /// Worst-case bytes along the deepest call chain rooted here.
    pub chain_depth: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackUsageReport {
    pub functions: IndexMap<String, FunctionStackUsage>,
}

pub struct Common6502Analyzer;

impl Common6502Analyzer {
    /// Per-function estimate: 2 bytes of return address, 2 per argument
    /// beyond the three that travel in registers, plus a body heuristic.
    pub fn estimate_function_depth(param_count: usize, body_complexity: u32) -> u32 {
        let spilled_params = param_count.saturating_sub(3) as u32;
        2 + 2 * spilled_params + 2 * body_complexity
    }

    /// Calls and loops both tend to cost stack bytes; cap the guess so one
    /// huge function does not dominate every chain.
    pub fn body_complexity(body: &[Statement]) -> u32 {
        let mut calls = 0u32;
        let mut loops = 0u32;
        visit_statements(body, &mut |stmt| {
            match stmt {
                Statement::While(_) | Statement::For(_) => loops += 1,
                _ => {}
            }
            statement_expressions(stmt, &mut |top| {
                visit_expression(top, &mut |expr| {
                    if matches!(expr, Expression::Call(_)) {
                        calls += 1;
                    }
                });
            });
        });
        (calls + loops).min(8)
    }

    /// Estimate every function and walk the call graph for chain depths.
    /// Requires the recursion check to have passed; cycles are skipped
    /// defensively rather than recursed into.
    pub fn analyze(
        program: &Program,
        analysis: &AnalysisResult,
    ) -> (StackUsageReport, DiagnosticCollection) {
        let mut report = StackUsageReport::default();
        let mut diagnostics = DiagnosticCollection::new();

        let mut own: HashMap<&str, u32> = HashMap::new();
        for item in &program.items {
            let Item::Function(decl) = item else { continue };
            let complexity = Self::body_complexity(&decl.body);
            own.insert(
                decl.name.as_str(),
                Self::estimate_function_depth(decl.params.len(), complexity),
            );
        }

        for item in &program.items {
            let Item::Function(decl) = item else { continue };
            let chain = Self::chain_depth(&decl.name, analysis, &own);
            report.functions.insert(
                decl.name.clone(),
                FunctionStackUsage {
                    estimated_depth: own.get(decl.name.as_str()).copied().unwrap_or(2),
                    chain_depth: chain,
                },
            );
            if chain > WARN_THRESHOLD {
                diagnostics.add(
                    Diagnostic::warning(
                        DiagnosticCode::StackOverflowRisk,
                        format!(
                            "call chain from `{}` may use {chain} of {STACK_BYTES} stack bytes",
                            decl.name
                        ),
                    )
                    .with_location(decl.location.clone()),
                );
            }
        }
        debug!("stack usage estimated for {} functions", report.functions.len());
        (report, diagnostics)
    }

    /// Deepest-path sum via iterative DFS with on-stack cycle detection.
    fn chain_depth(root: &str, analysis: &AnalysisResult, own: &HashMap<&str, u32>) -> u32 {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            OnStack,
            Done,
        }
        let graph = &analysis.call_graph;
        let callees = |name: &str| -> Vec<String> {
            graph
                .get(name)
                .map(|node| node.callees.iter().cloned().collect())
                .unwrap_or_default()
        };
        let mut colors: HashMap<String, Color> = HashMap::new();
        let mut best: HashMap<String, u32> = HashMap::new();
        let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();
        colors.insert(root.to_string(), Color::OnStack);
        let first = callees(root);
        stack.push((root.to_string(), first, 0));
        while let Some(frame) = stack.last_mut() {
            if frame.2 < frame.1.len() {
                let callee = frame.1[frame.2].clone();
                frame.2 += 1;
                match colors.get(&callee) {
                    // Cycles were already rejected as errors; skip the edge.
                    Some(Color::OnStack) => continue,
                    Some(Color::Done) => {}
                    None => {
                        colors.insert(callee.clone(), Color::OnStack);
                        let children = callees(&callee);
                        stack.push((callee, children, 0));
                    }
                }
            } else {
                let name = frame.0.clone();
                let deepest_callee = frame
                    .1
                    .iter()
                    .filter_map(|c| best.get(c))
                    .copied()
                    .max()
                    .unwrap_or(0);
                let self_cost = own.get(name.as_str()).copied().unwrap_or(2);
                best.insert(name.clone(), self_cost + deepest_callee);
                colors.insert(name, Color::Done);
                stack.pop();
            }
        }
        best.get(root).copied().unwrap_or(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_counts_spilled_params() {
        assert_eq!(Common6502Analyzer::estimate_function_depth(0, 0), 2);
        assert_eq!(Common6502Analyzer::estimate_function_depth(3, 0), 2);
        assert_eq!(Common6502Analyzer::estimate_function_depth(5, 0), 6);
        assert_eq!(Common6502Analyzer::estimate_function_depth(0, 4), 10);
    }
}
