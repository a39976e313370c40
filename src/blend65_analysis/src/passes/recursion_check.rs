//! Pass 6: recursion is a hard error. The backend fixes every function's
//! locals at link time, so a recursive call would alias its own frame.

use super::AnalyzerPass;
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use blend65_syntax::ast::Program;
use log::debug;

pub struct RecursionCheckPass;

impl AnalyzerPass for RecursionCheckPass {
    fn id(&self) -> &'static str {
        "recursion-check"
    }

    fn run(&self, _program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        let mut diagnostics = DiagnosticCollection::new();
        let cycles = session.call_graph.find_cycles();
        for cycle in &cycles {
            let mut chain = cycle.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(&cycle[0]);
            let location = session
                .call_graph
                .get(&cycle[0])
                .map(|node| node.location.clone())
                .unwrap_or_default();
            diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::RecursionProhibited,
                    format!("recursive call cycle: {chain}"),
                )
                .with_location(location),
            );
        }
        if !cycles.is_empty() {
            debug!("pass 6: {} recursion cycles found", cycles.len());
        }
        diagnostics
    }
}
