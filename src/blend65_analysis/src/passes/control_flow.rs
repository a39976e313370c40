//! Pass 4: per-function CFG construction by structural lowering, forward
//! reachability, and the all-paths-return check for non-void functions.

use super::AnalyzerPass;
use crate::artifacts::{CfgNodeId, CfgNodeKind, ControlFlowGraph};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::types::TypeKind;
use blend65_syntax::ast::{Expression, FunctionDecl, Item, Program, Statement};
use log::debug;

pub struct ControlFlowPass;

impl AnalyzerPass for ControlFlowPass {
    fn id(&self) -> &'static str {
        "control-flow"
    }

    fn run(&self, program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        let mut diagnostics = DiagnosticCollection::new();
        for item in &program.items {
            let Item::Function(decl) = item else { continue };
            let mut cfg = build_function_cfg(decl);
            cfg.compute_reachability();
            check_all_paths_return(decl, &cfg, session, &mut diagnostics);
            session.cfgs.insert(decl.name.clone(), cfg);
        }
        debug!("pass 4: built {} control-flow graphs", session.cfgs.len());
        diagnostics
    }
}

pub fn build_function_cfg(decl: &FunctionDecl) -> ControlFlowGraph {
    let mut builder = CfgBuilder {
        cfg: ControlFlowGraph::new(decl.name.clone()),
        loops: Vec::new(),
    };
    let entry = builder.cfg.entry;
    let end = builder.lower_statements(&decl.body, Some(entry));
    if let Some(end) = end {
        let exit = builder.cfg.exit;
        builder.cfg.add_edge(end, exit);
    }
    builder.cfg
}

struct LoopContext {
    header: CfgNodeId,
    exit: CfgNodeId,
}

struct CfgBuilder {
    cfg: ControlFlowGraph,
    loops: Vec<LoopContext>,
}

impl CfgBuilder {
    /// Lower a statement list. `current` is the open end control flows in
    /// from; `None` means the previous statement diverged. Returns the open
    /// end after the list. Unreachable statements are still lowered so the
    /// dead-code analysis can see them.
    fn lower_statements(
        &mut self,
        statements: &[Statement],
        mut current: Option<CfgNodeId>,
    ) -> Option<CfgNodeId> {
        for stmt in statements {
            current = self.lower_statement(stmt, current);
        }
        current
    }

    fn connect(&mut self, from: Option<CfgNodeId>, to: CfgNodeId) {
        if let Some(from) = from {
            self.cfg.add_edge(from, to);
        }
    }

    fn lower_statement(&mut self, stmt: &Statement, current: Option<CfgNodeId>) -> Option<CfgNodeId> {
        match stmt {
            Statement::Let(_) | Statement::Assign(_) | Statement::Expr(_) => {
                let node = self.cfg.add_node(CfgNodeKind::Statement, Some(stmt));
                self.connect(current, node);
                Some(node)
            }
            Statement::If(s) => {
                let branch = self.cfg.add_node(CfgNodeKind::Branch, Some(stmt));
                self.connect(current, branch);
                let then_end = self.lower_statements(&s.then_branch, Some(branch));
                let merge = self.cfg.add_node(CfgNodeKind::Merge, None);
                match &s.else_branch {
                    Some(else_branch) => {
                        let else_end = self.lower_statements(else_branch, Some(branch));
                        self.connect(then_end, merge);
                        self.connect(else_end, merge);
                    }
                    None => {
                        self.connect(then_end, merge);
                        self.cfg.add_edge(branch, merge);
                    }
                }
                Some(merge)
            }
            Statement::While(s) => {
                let header = self.cfg.add_node(CfgNodeKind::Loop, Some(stmt));
                self.connect(current, header);
                let exit = self.cfg.add_node(CfgNodeKind::Merge, None);
                self.loops.push(LoopContext { header, exit });
                let body_end = self.lower_statements(&s.body, Some(header));
                self.loops.pop();
                self.connect(body_end, header);
                // `while true` has no false edge; whatever follows is only
                // reachable through a break.
                if !matches!(&s.condition, Expression::Bool(b) if b.value) {
                    self.cfg.add_edge(header, exit);
                }
                Some(exit)
            }
            Statement::For(s) => {
                let header = self.cfg.add_node(CfgNodeKind::Loop, Some(stmt));
                self.connect(current, header);
                let exit = self.cfg.add_node(CfgNodeKind::Merge, None);
                self.loops.push(LoopContext { header, exit });
                let body_end = self.lower_statements(&s.body, Some(header));
                self.loops.pop();
                self.connect(body_end, header);
                self.cfg.add_edge(header, exit);
                Some(exit)
            }
            Statement::Break(_) => {
                let node = self.cfg.add_node(CfgNodeKind::Break, Some(stmt));
                self.connect(current, node);
                if let Some(ctx) = self.loops.last() {
                    let exit = ctx.exit;
                    self.cfg.add_edge(node, exit);
                }
                None
            }
            Statement::Continue(_) => {
                let node = self.cfg.add_node(CfgNodeKind::Continue, Some(stmt));
                self.connect(current, node);
                if let Some(ctx) = self.loops.last() {
                    let header = ctx.header;
                    self.cfg.add_edge(node, header);
                }
                None
            }
            Statement::Return(_) => {
                let node = self.cfg.add_node(CfgNodeKind::Return, Some(stmt));
                self.connect(current, node);
                let exit = self.cfg.exit;
                self.cfg.add_edge(node, exit);
                None
            }
            Statement::Block(s) => self.lower_statements(&s.statements, current),
        }
    }
}

/// A non-void function must leave through `return` on every reachable path.
fn check_all_paths_return(
    decl: &FunctionDecl,
    cfg: &ControlFlowGraph,
    session: &mut AnalysisSession,
    diagnostics: &mut DiagnosticCollection,
) {
    let returns_value = session
        .symbols
        .lookup_from(session.symbols.root_scope(), &decl.name)
        .and_then(|id| session.symbols.symbol(id).type_info.clone())
        .map(|ty| match ty.kind {
            TypeKind::Callback { return_type, .. } => !return_type.is_void() && !return_type.is_unknown(),
            _ => false,
        })
        .unwrap_or(false);
    if !returns_value {
        return;
    }
    let falls_through = cfg
        .predecessors(cfg.exit)
        .iter()
        .any(|&pred| cfg.node(pred).reachable && cfg.node(pred).kind != CfgNodeKind::Return);
    if falls_through {
        diagnostics.add(
            Diagnostic::error(
                DiagnosticCode::MissingReturn,
                format!("`{}` does not return a value on every path", decl.name),
            )
            .with_location(decl.location.clone()),
        );
    }
}
