use blend65_syntax::ast::{NodeId, Statement};
use blend65_syntax::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Identifier of a node within one function's CFG.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CfgNodeId(pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CfgNodeKind {
    Entry,
    Exit,
    Statement,
    Branch,
    Merge,
    Loop,
    Return,
    Break,
    Continue,
}

/// One control-flow node. Statement-bearing nodes keep a copy of their
/// source statement so the dataflow analyses can read it without holding a
/// borrow on the AST.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgNode {
    pub id: CfgNodeId,
    pub kind: CfgNodeKind,
    pub statement: Option<Statement>,
    pub statement_id: NodeId,
    pub location: Option<SourceLocation>,
    pub successors: Vec<CfgNodeId>,
    pub predecessors: Vec<CfgNodeId>,
    pub reachable: bool,
}

/// Per-function control-flow graph with a distinguished entry and exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub function_name: String,
    nodes: Vec<CfgNode>,
    pub entry: CfgNodeId,
    pub exit: CfgNodeId,
    reachability_computed: bool,
}

impl ControlFlowGraph {
    pub fn new(function_name: impl Into<String>) -> Self {
        let mut cfg = Self {
            function_name: function_name.into(),
            nodes: Vec::new(),
            entry: CfgNodeId(0),
            exit: CfgNodeId(1),
            reachability_computed: false,
        };
        cfg.entry = cfg.add_node(CfgNodeKind::Entry, None);
        cfg.exit = cfg.add_node(CfgNodeKind::Exit, None);
        cfg
    }

    pub fn add_node(&mut self, kind: CfgNodeKind, statement: Option<&Statement>) -> CfgNodeId {
        let id = CfgNodeId(self.nodes.len() as u32);
        self.nodes.push(CfgNode {
            id,
            kind,
            statement: statement.cloned(),
            statement_id: statement.map(|s| s.id()).unwrap_or(NodeId::UNSET),
            location: statement.map(|s| s.location().clone()),
            successors: Vec::new(),
            predecessors: Vec::new(),
            reachable: false,
        });
        id
    }

    pub fn add_edge(&mut self, from: CfgNodeId, to: CfgNodeId) {
        if !self.nodes[from.0 as usize].successors.contains(&to) {
            self.nodes[from.0 as usize].successors.push(to);
            self.nodes[to.0 as usize].predecessors.push(from);
        }
    }

    pub fn node(&self, id: CfgNodeId) -> &CfgNode {
        &self.nodes[id.0 as usize]
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CfgNode> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn successors(&self, id: CfgNodeId) -> &[CfgNodeId] {
        &self.node(id).successors
    }

    pub fn predecessors(&self, id: CfgNodeId) -> &[CfgNodeId] {
        &self.node(id).predecessors
    }

    /// Forward reachability from the entry node, breadth-first. Unreachable
    /// nodes are kept; the dead-code analysis reports them later.
    pub fn compute_reachability(&mut self) {
        for node in &mut self.nodes {
            node.reachable = false;
        }
        let mut queue = VecDeque::from([self.entry]);
        self.nodes[self.entry.0 as usize].reachable = true;
        while let Some(id) = queue.pop_front() {
            for succ in self.nodes[id.0 as usize].successors.clone() {
                let node = &mut self.nodes[succ.0 as usize];
                if !node.reachable {
                    node.reachable = true;
                    queue.push_back(succ);
                }
            }
        }
        self.reachability_computed = true;
    }

    pub fn reachability_computed(&self) -> bool {
        self.reachability_computed
    }

    /// Nodes that carry a source statement (everything but the synthetic
    /// entry/exit/merge points).
    pub fn statement_nodes(&self) -> impl Iterator<Item = &CfgNode> {
        self.nodes.iter().filter(|n| n.statement.is_some())
    }

    /// Unreachable statement-bearing nodes, in creation (source) order.
    /// Meaningless before `compute_reachability` has run.
    pub fn unreachable_nodes(&self) -> Vec<&CfgNode> {
        debug_assert!(self.reachability_computed, "reachability pass has not run");
        self.nodes
            .iter()
            .filter(|n| !n.reachable && !matches!(n.kind, CfgNodeKind::Entry | CfgNodeKind::Exit))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_graph_has_entry_and_exit() {
        let cfg = ControlFlowGraph::new("f");
        assert_eq!(cfg.node_count(), 2);
        assert_eq!(cfg.node(cfg.entry).kind, CfgNodeKind::Entry);
        assert_eq!(cfg.node(cfg.exit).kind, CfgNodeKind::Exit);
    }

    #[test]
    fn reachability_marks_connected_nodes_only() {
        let mut cfg = ControlFlowGraph::new("f");
        let a = cfg.add_node(CfgNodeKind::Statement, None);
        let b = cfg.add_node(CfgNodeKind::Statement, None);
        let orphan = cfg.add_node(CfgNodeKind::Statement, None);
        cfg.add_edge(cfg.entry, a);
        cfg.add_edge(a, b);
        cfg.add_edge(b, cfg.exit);
        cfg.add_edge(orphan, cfg.exit);
        cfg.compute_reachability();
        assert!(cfg.node(a).reachable);
        assert!(cfg.node(b).reachable);
        assert!(!cfg.node(orphan).reachable);
        assert_eq!(cfg.unreachable_nodes().len(), 1);
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut cfg = ControlFlowGraph::new("f");
        let a = cfg.add_node(CfgNodeKind::Statement, None);
        cfg.add_edge(cfg.entry, a);
        cfg.add_edge(cfg.entry, a);
        assert_eq!(cfg.successors(cfg.entry).len(), 1);
        assert_eq!(cfg.predecessors(a).len(), 1);
    }
}
