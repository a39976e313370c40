use crate::artifacts::{CallGraph, ControlFlowGraph};
use crate::diagnostics::DiagnosticCollection;
use crate::options::AnalysisOptions;
use crate::symbols::SymbolTable;
use crate::types::{TypeInfo, TypeSystem};
use blend65_syntax::ast::NodeId;
use blend65_syntax::metadata::{MetadataMap, MetadataValue, OptimizationMetadataKey};
use blend65_syntax::span::SourceLocation;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where an implicit conversion was required.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoercionContext {
    Initializer,
    Assignment,
    Argument,
    Return,
    Condition,
    Index,
}

/// An implicit-conversion site recorded by the type checker, consumed by
/// the coercion analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionSite {
    pub node: NodeId,
    pub from: TypeInfo,
    pub to: TypeInfo,
    pub context: CoercionContext,
    pub location: SourceLocation,
}

/// Node-keyed metadata written by the analysis passes. Append-only; a pass
/// never rewrites a key another pass wrote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataStore {
    entries: HashMap<NodeId, MetadataMap>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, node: NodeId, key: OptimizationMetadataKey, value: MetadataValue) {
        self.entries.entry(node).or_default().insert(key, value);
    }

    pub fn get(&self, node: NodeId, key: OptimizationMetadataKey) -> Option<&MetadataValue> {
        self.entries.get(&node)?.get(key)
    }

    pub fn node(&self, node: NodeId) -> Option<&MetadataMap> {
        self.entries.get(&node)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters reported with every analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub error_count: usize,
    pub warning_count: usize,
    pub functions_analyzed: usize,
    pub total_declarations: usize,
    pub expressions_checked: usize,
    pub analysis_time_ms: u64,
}

/// Mutable state threaded through the analyzer's pass sequence. Each pass
/// reads what earlier passes produced and appends its own results.
#[derive(Debug)]
pub struct AnalysisSession {
    pub module_name: String,
    pub options: AnalysisOptions,
    pub diagnostics: DiagnosticCollection,
    pub symbols: SymbolTable,
    pub types: TypeSystem,
    pub cfgs: IndexMap<String, ControlFlowGraph>,
    pub call_graph: CallGraph,
    /// Computed type of every checked expression, by node id.
    pub expr_types: HashMap<NodeId, TypeInfo>,
    /// Which symbol each identifier expression resolved to.
    pub symbol_refs: HashMap<NodeId, crate::symbols::SymbolId>,
    pub coercion_sites: Vec<CoercionSite>,
    pub metadata: MetadataStore,
    pub stats: AnalysisStats,
}

impl AnalysisSession {
    pub fn new(module_name: impl Into<String>, options: AnalysisOptions) -> Self {
        let module_name = module_name.into();
        Self {
            symbols: SymbolTable::new(module_name.clone()),
            module_name,
            options,
            diagnostics: DiagnosticCollection::new(),
            types: TypeSystem::new(),
            cfgs: IndexMap::new(),
            call_graph: CallGraph::new(),
            expr_types: HashMap::new(),
            symbol_refs: HashMap::new(),
            coercion_sites: Vec::new(),
            metadata: MetadataStore::new(),
            stats: AnalysisStats::default(),
        }
    }

    pub fn expr_type(&self, node: NodeId) -> Option<&TypeInfo> {
        self.expr_types.get(&node)
    }

    /// Merge a pass's diagnostics in source order, after the diagnostics of
    /// every earlier pass.
    pub fn absorb_pass_diagnostics(&mut self, mut pass_diagnostics: DiagnosticCollection) {
        pass_diagnostics.sort();
        self.diagnostics.extend(pass_diagnostics);
    }
}
