use blend65_syntax::ast::NodeId;
use blend65_syntax::span::SourceLocation;
use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// One call expression, as discovered in a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: String,
    pub callee: String,
    pub location: SourceLocation,
}

/// Per-function node. Placeholder nodes stand in for callees no
/// declaration was found for, keeping cycle and reachability answers sound.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallGraphNode {
    pub name: String,
    pub location: SourceLocation,
    pub callees: BTreeSet<String>,
    pub callers: BTreeSet<String>,
    pub declaration: NodeId,
    pub is_placeholder: bool,
}

/// Direct-call graph over named functions. Intrinsics never appear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallGraph {
    nodes: IndexMap<String, CallGraphNode>,
    call_sites: Vec<CallSite>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, name: impl Into<String>, location: SourceLocation, declaration: NodeId) {
        let name = name.into();
        match self.nodes.get_mut(&name) {
            Some(node) => {
                // A placeholder created by an earlier call edge gets upgraded.
                node.location = location;
                node.declaration = declaration;
                node.is_placeholder = false;
            }
            None => {
                self.nodes.insert(
                    name.clone(),
                    CallGraphNode {
                        name,
                        location,
                        callees: BTreeSet::new(),
                        callers: BTreeSet::new(),
                        declaration,
                        is_placeholder: false,
                    },
                );
            }
        }
    }

    fn ensure_node(&mut self, name: &str) {
        if !self.nodes.contains_key(name) {
            self.nodes.insert(
                name.to_string(),
                CallGraphNode {
                    name: name.to_string(),
                    location: SourceLocation::default(),
                    callees: BTreeSet::new(),
                    callers: BTreeSet::new(),
                    declaration: NodeId::UNSET,
                    is_placeholder: true,
                },
            );
        }
    }

    pub fn add_call(&mut self, caller: &str, callee: &str, location: SourceLocation) {
        self.ensure_node(caller);
        self.ensure_node(callee);
        self.nodes.get_mut(caller).expect("caller ensured").callees.insert(callee.to_string());
        self.nodes.get_mut(callee).expect("callee ensured").callers.insert(caller.to_string());
        self.call_sites.push(CallSite {
            caller: caller.to_string(),
            callee: callee.to_string(),
            location,
        });
    }

    pub fn get(&self, name: &str) -> Option<&CallGraphNode> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &CallGraphNode> {
        self.nodes.values()
    }

    pub fn call_sites(&self) -> &[CallSite] {
        &self.call_sites
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Functions nobody calls.
    pub fn entry_points(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.callers.is_empty() && !n.is_placeholder)
            .map(|n| n.name.as_str())
            .collect()
    }

    /// Functions that call nothing.
    pub fn leaves(&self) -> Vec<&str> {
        self.nodes
            .values()
            .filter(|n| n.callees.is_empty() && !n.is_placeholder)
            .map(|n| n.name.as_str())
            .collect()
    }

    fn callee_names<'a>(&'a self, name: &str) -> Vec<&'a str> {
        self.nodes
            .get(name)
            .map(|node| node.callees.iter().map(|s| s.as_str()).collect())
            .unwrap_or_default()
    }

    fn petgraph(&self) -> (DiGraph<&str, ()>, HashMap<&str, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
        for name in self.nodes.keys() {
            indices.insert(name.as_str(), graph.add_node(name.as_str()));
        }
        for node in self.nodes.values() {
            for callee in &node.callees {
                graph.add_edge(indices[node.name.as_str()], indices[callee.as_str()], ());
            }
        }
        (graph, indices)
    }

    pub fn is_directly_recursive(&self, name: &str) -> bool {
        self.nodes.get(name).map(|n| n.callees.contains(name)).unwrap_or(false)
    }

    /// Strongly connected components with more than one member, plus
    /// self-loops. Every function in a returned group lies on a cycle.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let (graph, _) = self.petgraph();
        let mut cycles = Vec::new();
        for component in tarjan_scc(&graph) {
            if component.len() > 1 {
                let mut names: Vec<String> =
                    component.iter().map(|&ix| graph[ix].to_string()).collect();
                // Tarjan emits members in reverse topological order; present
                // them in declaration order instead.
                names.sort_by_key(|n| self.nodes.get_index_of(n.as_str()));
                cycles.push(names);
            } else if let Some(&ix) = component.first() {
                let name = graph[ix];
                if self.is_directly_recursive(name) {
                    cycles.push(vec![name.to_string()]);
                }
            }
        }
        cycles.sort_by_key(|c| self.nodes.get_index_of(c[0].as_str()));
        cycles
    }

    pub fn has_recursion(&self) -> bool {
        !self.find_cycles().is_empty()
    }

    /// Longest call chain starting at `name`, in call edges. `None` when a
    /// cycle is reachable (depth is unbounded). Iterative DFS.
    pub fn max_call_depth(&self, name: &str) -> Option<u32> {
        if !self.nodes.contains_key(name) {
            return Some(0);
        }
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            OnStack,
            Done,
        }
        let name = self.nodes.get(name).expect("checked above").name.as_str();
        let mut colors: HashMap<&str, Color> = HashMap::new();
        let mut depth: HashMap<&str, u32> = HashMap::new();
        // Stack entries are (node, callee list, next callee to expand).
        let mut stack: Vec<(&str, Vec<&str>, usize)> = Vec::new();
        colors.insert(name, Color::OnStack);
        let first = self.callee_names(name);
        stack.push((name, first, 0));
        while let Some(frame) = stack.last_mut() {
            if frame.2 < frame.1.len() {
                let callee = frame.1[frame.2];
                frame.2 += 1;
                match colors.get(callee) {
                    Some(Color::OnStack) => return None,
                    Some(Color::Done) => {}
                    None => {
                        colors.insert(callee, Color::OnStack);
                        let children = self.callee_names(callee);
                        stack.push((callee, children, 0));
                    }
                }
            } else {
                let node = frame.0;
                let best = frame
                    .1
                    .iter()
                    .filter_map(|c| depth.get(c).map(|d| d + 1))
                    .max()
                    .unwrap_or(0);
                depth.insert(node, best);
                colors.insert(node, Color::Done);
                stack.pop();
            }
        }
        depth.get(name).copied()
    }

    /// Declared functions not reachable from the named entry point.
    pub fn unreachable_from(&self, entry: &str) -> Vec<&str> {
        let mut visited: HashSet<&str> = HashSet::new();
        if self.nodes.contains_key(entry) {
            let mut queue = VecDeque::from([entry]);
            visited.insert(entry);
            while let Some(name) = queue.pop_front() {
                if let Some(node) = self.nodes.get(name) {
                    for callee in &node.callees {
                        if visited.insert(callee.as_str()) {
                            queue.push_back(callee.as_str());
                        }
                    }
                }
            }
        }
        self.nodes
            .values()
            .filter(|n| !n.is_placeholder && !visited.contains(n.name.as_str()))
            .map(|n| n.name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn direct_recursion_is_a_cycle() {
        let mut graph = CallGraph::new();
        graph.add_function("f", loc(), NodeId(1));
        graph.add_call("f", "f", loc());
        assert!(graph.is_directly_recursive("f"));
        assert_eq!(graph.find_cycles(), vec![vec!["f".to_string()]]);
        assert_eq!(graph.max_call_depth("f"), None);
    }

    #[test]
    fn mutual_recursion_names_every_member() {
        let mut graph = CallGraph::new();
        graph.add_function("a", loc(), NodeId(1));
        graph.add_function("b", loc(), NodeId(2));
        graph.add_function("c", loc(), NodeId(3));
        graph.add_call("a", "b", loc());
        graph.add_call("b", "c", loc());
        graph.add_call("c", "a", loc());
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0], vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    }

    #[test]
    fn acyclic_chain_has_finite_depth() {
        let mut graph = CallGraph::new();
        graph.add_function("main", loc(), NodeId(1));
        graph.add_function("mid", loc(), NodeId(2));
        graph.add_function("leaf", loc(), NodeId(3));
        graph.add_call("main", "mid", loc());
        graph.add_call("mid", "leaf", loc());
        assert_eq!(graph.max_call_depth("main"), Some(2));
        assert_eq!(graph.max_call_depth("leaf"), Some(0));
        assert_eq!(graph.entry_points(), vec!["main"]);
        assert_eq!(graph.leaves(), vec!["leaf"]);
    }

    #[test]
    fn unknown_callees_become_placeholders() {
        let mut graph = CallGraph::new();
        graph.add_function("main", loc(), NodeId(1));
        graph.add_call("main", "mystery", loc());
        let node = graph.get("mystery").unwrap();
        assert!(node.is_placeholder);
        // Placeholders are not reported as unreachable user functions.
        assert!(graph.unreachable_from("main").is_empty());
    }

    #[test]
    fn unreachable_function_detection() {
        let mut graph = CallGraph::new();
        graph.add_function("main", loc(), NodeId(1));
        graph.add_function("used", loc(), NodeId(2));
        graph.add_function("orphan", loc(), NodeId(3));
        graph.add_call("main", "used", loc());
        assert_eq!(graph.unreachable_from("main"), vec!["orphan"]);
    }
}
