//! Pass 5: discover direct calls. Intrinsic calls never enter the graph;
//! calls to names with no visible declaration become placeholder nodes so
//! recursion and reachability stay sound.

use super::AnalyzerPass;
use crate::diagnostics::DiagnosticCollection;
use crate::intrinsics::intrinsics;
use crate::session::AnalysisSession;
use crate::symbols::SymbolKind;
use blend65_syntax::ast::{Expression, Item, Program};
use blend65_syntax::walk::visit_all_expressions;
use log::debug;

pub struct CallGraphBuildPass;

impl AnalyzerPass for CallGraphBuildPass {
    fn id(&self) -> &'static str {
        "call-graph-build"
    }

    fn run(&self, program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        for item in &program.items {
            if let Item::Function(decl) = item {
                session.call_graph.add_function(&decl.name, decl.location.clone(), decl.id);
            }
        }
        for item in &program.items {
            let Item::Function(decl) = item else { continue };
            let mut calls: Vec<(String, blend65_syntax::span::SourceLocation)> = Vec::new();
            visit_all_expressions(&decl.body, &mut |expr| {
                if let Expression::Call(call) = expr {
                    if let Some(name) = call.callee.as_identifier() {
                        calls.push((name.to_string(), call.location.clone()));
                    }
                }
            });
            for (callee, location) in calls {
                match session.symbols.lookup_from(session.symbols.root_scope(), &callee) {
                    Some(id) => {
                        // Only direct calls of named functions; calls through
                        // callback variables are indirect and stay out.
                        if session.symbols.symbol(id).kind == SymbolKind::Function {
                            session.call_graph.add_call(&decl.name, &callee, location);
                        }
                    }
                    None => {
                        if !intrinsics().contains(&callee) {
                            session.call_graph.add_call(&decl.name, &callee, location);
                        }
                    }
                }
            }
        }
        debug!(
            "pass 5: call graph has {} nodes, {} call sites",
            session.call_graph.len(),
            session.call_graph.call_sites().len()
        );
        DiagnosticCollection::new()
    }
}
