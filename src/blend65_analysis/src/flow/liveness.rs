//! Classical backward liveness over the statement CFG. Feeds dead-store
//! detection and the interference pairs the register allocator wants.

use super::statement_use_def;
use crate::artifacts::{CfgNodeId, ControlFlowGraph};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::symbols::SymbolId;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// A write whose value can never be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeadDefinition {
    pub node: CfgNodeId,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivenessResult {
    pub function_name: String,
    pub live_in: HashMap<CfgNodeId, BTreeSet<SymbolId>>,
    pub live_out: HashMap<CfgNodeId, BTreeSet<SymbolId>>,
    pub iterations: u32,
    pub converged: bool,
}

impl LivenessResult {
    /// Writes whose variable is dead immediately after the writing node.
    pub fn find_dead_definitions(
        &self,
        cfg: &ControlFlowGraph,
        session: &AnalysisSession,
    ) -> Vec<DeadDefinition> {
        let mut dead = Vec::new();
        for node in cfg.nodes() {
            let Some(stmt) = &node.statement else { continue };
            let (_, defs) = statement_use_def(stmt, &session.symbol_refs, &session.symbols);
            let out = self.live_out.get(&node.id);
            for def in defs {
                if out.map(|set| !set.contains(&def)).unwrap_or(true) {
                    dead.push(DeadDefinition { node: node.id, symbol: def });
                }
            }
        }
        dead
    }

    /// Symbol pairs that are simultaneously live somewhere, normalized so
    /// the smaller id comes first.
    pub fn compute_interference(&self) -> BTreeSet<(SymbolId, SymbolId)> {
        let mut pairs = BTreeSet::new();
        for set in self.live_in.values().chain(self.live_out.values()) {
            let members: Vec<SymbolId> = set.iter().copied().collect();
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    pairs.insert(if a < b { (a, b) } else { (b, a) });
                }
            }
        }
        pairs
    }
}

pub struct LivenessAnalysis;

impl LivenessAnalysis {
    /// Iterate `out(n) = ∪ in(s)`, `in(n) = use(n) ∪ (out(n) − def(n))` to a
    /// fixed point, capped by the configured iteration limit.
    pub fn run(
        cfg: &ControlFlowGraph,
        session: &AnalysisSession,
        diagnostics: &mut DiagnosticCollection,
    ) -> LivenessResult {
        let mut use_sets: HashMap<CfgNodeId, HashSet<SymbolId>> = HashMap::new();
        let mut def_sets: HashMap<CfgNodeId, HashSet<SymbolId>> = HashMap::new();
        for node in cfg.nodes() {
            if let Some(stmt) = &node.statement {
                let (uses, defs) = statement_use_def(stmt, &session.symbol_refs, &session.symbols);
                use_sets.insert(node.id, uses.into_iter().collect());
                def_sets.insert(node.id, defs.into_iter().collect());
            }
        }

        let empty = HashSet::new();
        let mut live_in: HashMap<CfgNodeId, HashSet<SymbolId>> = HashMap::new();
        let mut live_out: HashMap<CfgNodeId, HashSet<SymbolId>> = HashMap::new();
        // Reverse order converges fastest for a backward problem.
        let mut node_ids: Vec<CfgNodeId> = cfg.nodes().map(|n| n.id).collect();
        node_ids.reverse();
        let limit = session.options.liveness_iteration_limit;
        let mut iterations = 0u32;
        let mut converged = false;
        while iterations < limit {
            iterations += 1;
            let mut changed = false;
            for &id in &node_ids {
                let mut out: HashSet<SymbolId> = HashSet::new();
                for succ in cfg.successors(id) {
                    out.extend(live_in.get(succ).unwrap_or(&empty).iter().copied());
                }
                let uses = use_sets.get(&id).unwrap_or(&empty);
                let defs = def_sets.get(&id).unwrap_or(&empty);
                let mut inn: HashSet<SymbolId> = uses.clone();
                inn.extend(out.difference(defs).copied());
                if live_out.get(&id) != Some(&out) {
                    live_out.insert(id, out);
                    changed = true;
                }
                if live_in.get(&id) != Some(&inn) {
                    live_in.insert(id, inn);
                    changed = true;
                }
            }
            if !changed {
                converged = true;
                break;
            }
        }
        trace!("liveness for `{}`: {} iterations", cfg.function_name, iterations);
        if !converged {
            warn!("liveness for `{}` hit the {}-iteration cap", cfg.function_name, limit);
            diagnostics.add(Diagnostic::warning(
                DiagnosticCode::LivenessIterationLimit,
                format!(
                    "liveness analysis for `{}` did not converge within {} iterations",
                    cfg.function_name, limit
                ),
            ));
        }

        LivenessResult {
            function_name: cfg.function_name.clone(),
            live_in: live_in
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect::<BTreeSet<_>>()))
                .collect(),
            live_out: live_out
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect::<BTreeSet<_>>()))
                .collect(),
            iterations,
            converged,
        }
    }
}
