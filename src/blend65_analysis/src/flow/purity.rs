//! Function purity: direct impurity seeding followed by a fixed point over
//! the call graph. Recursion alone never makes a function impure; calling
//! something impure always does.

use crate::intrinsics::intrinsics;
use crate::session::AnalysisSession;
use crate::symbols::SymbolKind;
use blend65_syntax::ast::{Expression, Item, Program, Statement};
use blend65_syntax::metadata::{MetadataValue, OptimizationMetadataKey};
use blend65_syntax::walk::{statement_expressions, visit_expression, visit_statements};
use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImpurityReason {
    GlobalWrite,
    GlobalRead,
    ArrayWrite,
    IntrinsicSideEffect,
    UnknownBody,
    ImpureCallee(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionPurity {
    pub name: String,
    pub is_pure: bool,
    pub reasons: BTreeSet<ImpurityReason>,
    pub reads_globals: bool,
    pub writes_globals: bool,
    pub writes_arrays: bool,
    pub calls_intrinsics: bool,
    pub callees: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurityReport {
    pub functions: IndexMap<String, FunctionPurity>,
}

impl PurityReport {
    pub fn is_pure(&self, name: &str) -> Option<bool> {
        self.functions.get(name).map(|f| f.is_pure)
    }
}

pub fn analyze_program(program: &Program, session: &mut AnalysisSession) -> PurityReport {
    let mut report = PurityReport::default();

    // Seed direct facts per function.
    for item in &program.items {
        let Item::Function(decl) = item else { continue };
        let mut facts = FunctionPurity {
            name: decl.name.clone(),
            is_pure: true,
            reasons: BTreeSet::new(),
            reads_globals: false,
            writes_globals: false,
            writes_arrays: false,
            calls_intrinsics: false,
            callees: BTreeSet::new(),
        };
        seed_function(decl, session, &mut facts);
        facts.is_pure = facts.reasons.is_empty();
        report.functions.insert(decl.name.clone(), facts);
    }

    // Fixed point: impurity flows from callee to caller.
    loop {
        let mut newly_impure: Vec<(String, String)> = Vec::new();
        for facts in report.functions.values() {
            if !facts.is_pure {
                continue;
            }
            for callee in &facts.callees {
                let callee_impure = match report.functions.get(callee) {
                    Some(other) => !other.is_pure,
                    // No body in this module: assume the worst.
                    None => true,
                };
                if callee_impure {
                    newly_impure.push((facts.name.clone(), callee.clone()));
                    break;
                }
            }
        }
        if newly_impure.is_empty() {
            break;
        }
        for (name, callee) in newly_impure {
            let known = report.functions.contains_key(&callee);
            let facts = report.functions.get_mut(&name).expect("seeded above");
            facts.is_pure = false;
            facts.reasons.insert(if known {
                ImpurityReason::ImpureCallee(callee)
            } else {
                ImpurityReason::UnknownBody
            });
        }
    }

    for decl in program.functions() {
        if let Some(facts) = report.functions.get(&decl.name) {
            trace!("purity: `{}` pure={}", facts.name, facts.is_pure);
            session.metadata.attach(
                decl.id,
                OptimizationMetadataKey::Pure,
                MetadataValue::Bool(facts.is_pure),
            );
        }
    }
    report
}

fn seed_function(
    decl: &blend65_syntax::ast::FunctionDecl,
    session: &AnalysisSession,
    facts: &mut FunctionPurity,
) {
    let root = session.symbols.root_scope();
    let is_global = |node: blend65_syntax::ast::NodeId| -> bool {
        session
            .symbol_refs
            .get(&node)
            .map(|&id| {
                let sym = session.symbols.symbol(id);
                match sym.kind {
                    SymbolKind::Variable => sym.scope == root,
                    SymbolKind::MapVariable => true,
                    _ => false,
                }
            })
            .unwrap_or(false)
    };

    visit_statements(&decl.body, &mut |stmt| {
        if let Statement::Assign(assign) = stmt {
            match &assign.target {
                Expression::Identifier(ident) => {
                    if is_global(ident.id) {
                        facts.writes_globals = true;
                        facts.reasons.insert(ImpurityReason::GlobalWrite);
                    }
                }
                Expression::Index(_) => {
                    facts.writes_arrays = true;
                    facts.reasons.insert(ImpurityReason::ArrayWrite);
                }
                _ => {}
            }
        }
        statement_expressions(stmt, &mut |top| {
            visit_expression(top, &mut |expr| match expr {
                Expression::Call(call) => {
                    if let Some(name) = call.callee.as_identifier() {
                        let shadowed = session
                            .symbols
                            .lookup_from(session.symbols.root_scope(), name)
                            .is_some();
                        if let (false, Some(def)) = (shadowed, intrinsics().get(name)) {
                            facts.calls_intrinsics = true;
                            if def.is_impure() {
                                facts.reasons.insert(ImpurityReason::IntrinsicSideEffect);
                            }
                        } else {
                            facts.callees.insert(name.to_string());
                        }
                    }
                }
                Expression::Identifier(ident) => {
                    if is_global(ident.id) {
                        facts.reads_globals = true;
                        if session.options.strict_global_reads {
                            facts.reasons.insert(ImpurityReason::GlobalRead);
                        }
                    }
                }
                _ => {}
            });
        });
    });
}
