pub mod call_graph;
pub mod control_flow_graph;

pub use call_graph::{CallGraph, CallGraphNode, CallSite};
pub use control_flow_graph::{CfgNode, CfgNodeId, CfgNodeKind, ControlFlowGraph};
