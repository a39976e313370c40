//! Definite-assignment analysis: every local must be written on every path
//! before it is read. Parameters and initialized declarations count as
//! written on entry; branch states fork and join; loop bodies join as if
//! they may not run at all.

use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::session::AnalysisSession;
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};
use blend65_syntax::ast::{Expression, NodeId, Program, Statement};
use blend65_syntax::span::SourceLocation;
use blend65_syntax::walk::visit_expression;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignState {
    Unassigned,
    MaybeAssigned,
    DefinitelyAssigned,
}

fn join(a: AssignState, b: AssignState) -> AssignState {
    use AssignState::*;
    match (a, b) {
        (DefinitelyAssigned, DefinitelyAssigned) => DefinitelyAssigned,
        (Unassigned, Unassigned) => Unassigned,
        _ => MaybeAssigned,
    }
}

/// A fork point's view of every tracked local.
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    states: HashMap<SymbolId, AssignState>,
}

/// Tracks per-local assignment states through one function. The snapshot
/// API lets a structural walker drive branching and merging.
#[derive(Debug, Default)]
pub struct DefiniteAssignmentAnalysis {
    states: HashMap<SymbolId, AssignState>,
    pub diagnostics: DiagnosticCollection,
}

impl DefiniteAssignmentAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    fn state_of(&self, symbols: &SymbolTable, id: SymbolId) -> AssignState {
        if let Some(&state) = self.states.get(&id) {
            return state;
        }
        if symbols.symbol(id).is_assigned_on_entry() {
            AssignState::DefinitelyAssigned
        } else {
            AssignState::Unassigned
        }
    }

    pub fn record_assignment(&mut self, id: SymbolId) {
        self.states.insert(id, AssignState::DefinitelyAssigned);
    }

    pub fn check_read(&mut self, symbols: &SymbolTable, id: SymbolId, location: &SourceLocation) {
        let symbol = symbols.symbol(id);
        // Module-scope variables are statically allocated and zero-filled;
        // only locals and parameters are tracked.
        if symbol.scope == symbols.root_scope() {
            return;
        }
        match self.state_of(symbols, id) {
            AssignState::Unassigned => self.diagnostics.add(
                Diagnostic::error(
                    DiagnosticCode::UsedBeforeAssigned,
                    format!("`{}` is read before it is assigned", symbol.name),
                )
                .with_location(location.clone()),
            ),
            AssignState::MaybeAssigned => self.diagnostics.add(
                Diagnostic::warning(
                    DiagnosticCode::PossiblyUninitialized,
                    format!("`{}` may be read before it is assigned", symbol.name),
                )
                .with_location(location.clone()),
            ),
            AssignState::DefinitelyAssigned => {}
        }
    }

    /// Snapshot the current state at a fork point.
    pub fn enter_branch(&self) -> StateSnapshot {
        StateSnapshot { states: self.states.clone() }
    }

    pub fn restore(&mut self, snapshot: StateSnapshot) {
        self.states = snapshot.states;
    }

    /// Join the current state with the pre-branch snapshot: the branch may
    /// or may not have executed.
    pub fn merge_branch(&mut self, symbols: &SymbolTable, before: StateSnapshot) {
        let keys: Vec<SymbolId> =
            self.states.keys().chain(before.states.keys()).copied().collect();
        for id in keys {
            let current = self.state_of(symbols, id);
            let other = before
                .states
                .get(&id)
                .copied()
                .unwrap_or_else(|| default_state(symbols, id));
            self.states.insert(id, join(current, other));
        }
    }

    /// Join two completed branch states: exactly one of them executed.
    pub fn merge_if_else(
        &mut self,
        symbols: &SymbolTable,
        then_state: StateSnapshot,
        else_state: StateSnapshot,
    ) {
        let keys: Vec<SymbolId> =
            then_state.states.keys().chain(else_state.states.keys()).copied().collect();
        self.states = then_state.states.clone();
        for id in keys {
            let a = then_state.states.get(&id).copied().unwrap_or_else(|| default_state(symbols, id));
            let b = else_state.states.get(&id).copied().unwrap_or_else(|| default_state(symbols, id));
            self.states.insert(id, join(a, b));
        }
    }
}

fn default_state(symbols: &SymbolTable, id: SymbolId) -> AssignState {
    if symbols.symbol(id).is_assigned_on_entry() {
        AssignState::DefinitelyAssigned
    } else {
        AssignState::Unassigned
    }
}

/// Run the analysis over every function of a program.
pub fn analyze_program(program: &Program, session: &AnalysisSession) -> DiagnosticCollection {
    let mut diagnostics = DiagnosticCollection::new();
    for decl in program.functions() {
        let mut analysis = DefiniteAssignmentAnalysis::new();
        walk_statements(&mut analysis, session, &decl.body);
        diagnostics.extend(analysis.diagnostics);
    }
    diagnostics
}

fn reads_with_locations(
    expr: &Expression,
    session: &AnalysisSession,
) -> Vec<(SymbolId, SourceLocation)> {
    let mut reads = Vec::new();
    visit_expression(expr, &mut |e| {
        if let Expression::Identifier(ident) = e {
            if let Some(&id) = session.symbol_refs.get(&ident.id) {
                if matches!(
                    session.symbols.symbol(id).kind,
                    SymbolKind::Variable | SymbolKind::Parameter
                ) {
                    reads.push((id, ident.location.clone()));
                }
            }
        }
    });
    reads
}

fn check_expression(
    analysis: &mut DefiniteAssignmentAnalysis,
    session: &AnalysisSession,
    expr: &Expression,
) {
    for (id, location) in reads_with_locations(expr, session) {
        analysis.check_read(&session.symbols, id, &location);
    }
}

fn assigned_symbol(session: &AnalysisSession, node: NodeId) -> Option<SymbolId> {
    session.symbol_refs.get(&node).copied()
}

fn walk_statements(
    analysis: &mut DefiniteAssignmentAnalysis,
    session: &AnalysisSession,
    statements: &[Statement],
) {
    for stmt in statements {
        match stmt {
            Statement::Let(decl) => {
                if let Some(init) = &decl.initializer {
                    check_expression(analysis, session, init);
                    if let Some(id) = session.symbols.symbol_for_declaration(decl.id) {
                        analysis.record_assignment(id);
                    }
                }
            }
            Statement::Assign(s) => {
                check_expression(analysis, session, &s.value);
                match &s.target {
                    Expression::Identifier(ident) => {
                        if let Some(id) = assigned_symbol(session, ident.id) {
                            analysis.record_assignment(id);
                        }
                    }
                    Expression::Index(index) => {
                        // Element stores read the index; the array base is
                        // allowed to be partially initialized.
                        check_expression(analysis, session, &index.index);
                    }
                    other => check_expression(analysis, session, other),
                }
            }
            Statement::Expr(s) => check_expression(analysis, session, &s.expression),
            Statement::If(s) => {
                check_expression(analysis, session, &s.condition);
                let before = analysis.enter_branch();
                walk_statements(analysis, session, &s.then_branch);
                match &s.else_branch {
                    Some(else_branch) => {
                        let then_state = analysis.enter_branch();
                        analysis.restore(before);
                        walk_statements(analysis, session, else_branch);
                        let else_state = analysis.enter_branch();
                        analysis.merge_if_else(&session.symbols, then_state, else_state);
                    }
                    None => analysis.merge_branch(&session.symbols, before),
                }
            }
            Statement::While(s) => {
                check_expression(analysis, session, &s.condition);
                let before = analysis.enter_branch();
                walk_statements(analysis, session, &s.body);
                analysis.merge_branch(&session.symbols, before);
            }
            Statement::For(s) => {
                check_expression(analysis, session, &s.from);
                check_expression(analysis, session, &s.to);
                if let Some(step) = &s.step {
                    check_expression(analysis, session, step);
                }
                if let Some(id) = session.symbols.symbol_for_declaration(s.id) {
                    analysis.record_assignment(id);
                }
                let before = analysis.enter_branch();
                walk_statements(analysis, session, &s.body);
                analysis.merge_branch(&session.symbols, before);
            }
            Statement::Return(s) => {
                if let Some(value) = &s.value {
                    check_expression(analysis, session, value);
                }
            }
            Statement::Block(s) => walk_statements(analysis, session, &s.statements),
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }
}
