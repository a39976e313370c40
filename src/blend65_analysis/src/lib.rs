pub mod analyzer;
pub mod artifacts;
pub mod diagnostics;
pub mod flow;
pub mod intrinsics;
pub mod options;
pub mod passes;
pub mod session;
pub mod symbols;
pub mod types;

pub use analyzer::{
    AdvancedAnalysisResults, AnalysisResult, MultiModuleResult, PassResults, PassSummary,
    SemanticAnalyzer,
};
pub use artifacts::{CallGraph, CfgNode, CfgNodeId, CfgNodeKind, ControlFlowGraph};
pub use diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticCode, DiagnosticCollection, Severity,
};
pub use intrinsics::{intrinsics, IntrinsicCategory, IntrinsicDefinition, IntrinsicOpcode};
pub use options::{
    AnalysisOptions, CompileOptions, DebugMode, OptimizationLevel, OutputFormat, RawCompileOptions,
};
pub use session::{AnalysisSession, AnalysisStats, CoercionContext, CoercionSite, MetadataStore};
pub use symbols::{
    GlobalSymbolTable, Scope, ScopeId, ScopeKind, Symbol, SymbolId, SymbolKind, SymbolTable,
};
pub use types::{CoercionKind, TypeCompatibility, TypeInfo, TypeKind, TypeSystem};
