//! The pass orchestrator: a fixed, deterministic sequence over one parsed
//! module, producing diagnostics and the artifacts later stages consume.

use crate::artifacts::{CallGraph, ControlFlowGraph};
use crate::diagnostics::DiagnosticCollection;
use crate::flow::{
    self, CoercionReport, ComplexityReport, DeadCodeReport, LivenessAnalysis, LivenessResult,
    PurityReport, VariableUsageReport,
};
use crate::options::AnalysisOptions;
use crate::passes::call_graph_build::CallGraphBuildPass;
use crate::passes::control_flow::ControlFlowPass;
use crate::passes::numbering::assign_node_ids;
use crate::passes::recursion_check::RecursionCheckPass;
use crate::passes::symbol_table_build::SymbolTableBuildPass;
use crate::passes::type_check::TypeCheckPass;
use crate::passes::type_resolution::TypeResolutionPass;
use crate::passes::AnalyzerPass;
use crate::session::{AnalysisSession, AnalysisStats, MetadataStore};
use crate::symbols::{GlobalSymbolTable, SymbolTable};
use crate::types::{TypeInfo, TypeSystem};
use blend65_syntax::ast::{NodeId, Program};
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

/// What one pass contributed to the diagnostic stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    pub id: String,
    pub error_count: usize,
    pub warning_count: usize,
}

impl PassSummary {
    fn from_diagnostics(id: &str, diagnostics: &DiagnosticCollection) -> Self {
        Self {
            id: id.to_string(),
            error_count: diagnostics.error_count(),
            warning_count: diagnostics.warning_count(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassResults {
    pub symbol_table_build: PassSummary,
    pub type_resolution: PassSummary,
    pub type_check: PassSummary,
    pub control_flow: PassSummary,
    pub call_graph_build: PassSummary,
    pub recursion_check: PassSummary,
    pub advanced: Option<AdvancedAnalysisResults>,
}

/// Results of the optional pass-7 analyses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancedAnalysisResults {
    pub variable_usage: VariableUsageReport,
    pub liveness: IndexMap<String, LivenessResult>,
    pub dead_code: DeadCodeReport,
    pub purity: PurityReport,
    pub complexity: ComplexityReport,
    pub coercions: CoercionReport,
}

/// Everything the analyzer hands back for one module.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub success: bool,
    pub module_name: String,
    pub diagnostics: DiagnosticCollection,
    pub symbol_table: SymbolTable,
    pub type_system: TypeSystem,
    pub call_graph: CallGraph,
    pub cfgs: IndexMap<String, ControlFlowGraph>,
    pub pass_results: PassResults,
    pub stats: AnalysisStats,
    /// Annotations the IL generator reads: expression types, identifier
    /// resolutions, and per-node optimization metadata.
    pub expr_types: HashMap<NodeId, TypeInfo>,
    pub symbol_refs: HashMap<NodeId, crate::symbols::SymbolId>,
    pub metadata: MetadataStore,
}

/// Result of analyzing a set of modules together.
#[derive(Debug, Serialize, Deserialize)]
pub struct MultiModuleResult {
    pub results: Vec<AnalysisResult>,
    pub global_symbols: GlobalSymbolTable,
}

impl MultiModuleResult {
    pub fn success(&self) -> bool {
        self.results.iter().all(|r| r.success)
    }
}

#[derive(Debug, Default)]
pub struct SemanticAnalyzer {
    options: AnalysisOptions,
}

impl SemanticAnalyzer {
    pub fn new(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// Run passes 1-6 (plus numbering) and, when configured, the advanced
    /// analyses. The program is annotated with node ids in place.
    pub fn analyze(&self, program: &mut Program) -> AnalysisResult {
        let started = Instant::now();
        let numbered = assign_node_ids(program);
        debug!("analyzing module `{}` ({} nodes)", program.module.name, numbered);

        let mut session = AnalysisSession::new(program.module.name.clone(), self.options.clone());
        let mut pass_results = PassResults::default();

        macro_rules! run_pass {
            ($pass:expr, $slot:ident) => {{
                let pass = $pass;
                let diagnostics = pass.run(program, &mut session);
                pass_results.$slot = PassSummary::from_diagnostics(pass.id(), &diagnostics);
                session.absorb_pass_diagnostics(diagnostics);
            }};
        }

        run_pass!(SymbolTableBuildPass, symbol_table_build);
        run_pass!(TypeResolutionPass, type_resolution);
        run_pass!(TypeCheckPass, type_check);
        run_pass!(ControlFlowPass, control_flow);
        run_pass!(CallGraphBuildPass, call_graph_build);
        run_pass!(RecursionCheckPass, recursion_check);

        if self.options.run_advanced_analysis {
            pass_results.advanced = Some(run_advanced(program, &mut session));
        }

        let mut stats = session.stats;
        stats.error_count = session.diagnostics.error_count();
        stats.warning_count = session.diagnostics.warning_count();
        stats.analysis_time_ms = started.elapsed().as_millis() as u64;

        AnalysisResult {
            success: !session.diagnostics.has_errors(),
            module_name: session.module_name,
            diagnostics: session.diagnostics,
            symbol_table: session.symbols,
            type_system: session.types,
            call_graph: session.call_graph,
            cfgs: session.cfgs,
            pass_results,
            stats,
            expr_types: session.expr_types,
            symbol_refs: session.symbol_refs,
            metadata: session.metadata,
        }
    }

    /// Analyze several modules and aggregate their exports. Modules are
    /// registered in the order given, which fixes cross-module lookup.
    pub fn analyze_multiple(&self, programs: &mut [Program]) -> MultiModuleResult {
        let mut results = Vec::with_capacity(programs.len());
        let mut global_symbols = GlobalSymbolTable::new();
        for program in programs {
            let result = self.analyze(program);
            global_symbols.add_module(&result.symbol_table);
            results.push(result);
        }
        MultiModuleResult { results, global_symbols }
    }
}

fn run_advanced(program: &Program, session: &mut AnalysisSession) -> AdvancedAnalysisResults {
    let mut advanced = AdvancedAnalysisResults::default();

    let da_diagnostics = flow::definite_assignment::analyze_program(program, session);
    session.absorb_pass_diagnostics(da_diagnostics);

    let (usage, usage_diagnostics) = flow::variable_usage::analyze_program(program, session);
    advanced.variable_usage = usage;
    session.absorb_pass_diagnostics(usage_diagnostics);

    let mut liveness_diagnostics = DiagnosticCollection::new();
    for cfg in session.cfgs.values() {
        let result = LivenessAnalysis::run(cfg, session, &mut liveness_diagnostics);
        advanced.liveness.insert(cfg.function_name.clone(), result);
    }
    session.absorb_pass_diagnostics(liveness_diagnostics);

    let mut dead_code_diagnostics = DiagnosticCollection::new();
    for cfg in session.cfgs.values() {
        flow::dead_code::analyze_cfg(cfg, &mut advanced.dead_code, &mut dead_code_diagnostics);
    }
    session.absorb_pass_diagnostics(dead_code_diagnostics);

    advanced.purity = flow::purity::analyze_program(program, session);
    advanced.complexity = flow::complexity::analyze_program(program, session);

    let (coercions, coercion_diagnostics) = flow::coercion_check::analyze_session(session);
    advanced.coercions = coercions;
    session.absorb_pass_diagnostics(coercion_diagnostics);

    advanced
}
