//! End-to-end analyzer scenarios over hand-built programs.

mod common;

use blend65_analysis::diagnostics::DiagnosticCode;
use blend65_analysis::flow::DeadCodeCause;
use blend65_analysis::symbols::SymbolKind;
use blend65_analysis::CfgNodeKind;
use blend65_syntax::ast::{BinaryOperator, Expression, Item, Statement, VariableDecl};
use common::*;

#[test]
fn empty_module_analyzes_cleanly() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut program = program("Empty", vec![]);
    let result = analyze(&mut program);
    assert!(result.success);
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.symbol_table.scope_count(), 1);
    assert_eq!(result.stats.total_declarations, 0);
}

#[test]
fn module_variable_gets_type_and_initializer() {
    let decl = VariableDecl::new("x", byte_ty(2), at(2, 5))
        .with_initializer(Expression::number(10, at(2, 18)));
    let mut program = program("T", vec![Item::Variable(decl)]);
    let result = analyze(&mut program);
    assert!(result.success, "{:?}", result.diagnostics);
    assert!(result.stats.total_declarations >= 1);
    let (_, symbol) = result
        .symbol_table
        .symbols()
        .find(|(_, s)| s.name == "x")
        .expect("x is declared");
    assert_eq!(symbol.kind, SymbolKind::Variable);
    assert_eq!(symbol.type_info.as_ref().unwrap().name, "byte");
    assert!(!symbol.is_const);
    assert!(symbol.is_assigned_on_entry());
}

#[test]
fn add_function_builds_a_straight_line_cfg() {
    let body = vec![Statement::return_value(
        Some(Expression::binary(
            BinaryOperator::Add,
            Expression::identifier("a", at(3, 12)),
            Expression::identifier("b", at(3, 16)),
            at(3, 14),
        )),
        at(3, 5),
    )];
    let add = function(
        "add",
        2,
        vec![param("a", 2, 14, byte_ty(2)), param("b", 2, 23, byte_ty(2))],
        byte_ty(2),
        body,
    );
    let mut program = program("T", vec![add]);
    let result = analyze(&mut program);
    assert!(result.success, "{:?}", result.diagnostics);
    assert_eq!(result.stats.functions_analyzed, 1);

    let cfg = result.cfgs.get("add").expect("cfg built");
    let entry = cfg.node(cfg.entry);
    assert_eq!(entry.successors.len(), 1);
    let ret = cfg.node(entry.successors[0]);
    assert_eq!(ret.kind, CfgNodeKind::Return);
    assert_eq!(ret.successors, vec![cfg.exit]);
    assert!(cfg.node(cfg.exit).reachable);

    let node = result.call_graph.get("add").expect("in call graph");
    assert!(node.callees.is_empty());
    assert!(node.callers.is_empty());
}

#[test]
fn direct_recursion_is_an_error() {
    let body = vec![Statement::expr(call("f", 3, 5, vec![]), at(3, 5))];
    let f = function("f", 2, vec![], void_ty(2), body);
    let mut program = program("T", vec![f]);
    let result = analyze(&mut program);
    assert!(!result.success);
    let recursion: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::RecursionProhibited)
        .collect();
    assert_eq!(recursion.len(), 1);
    assert!(recursion[0].message.contains('f'));
}

#[test]
fn code_after_return_is_flagged_with_its_cause() {
    let dead_let = Statement::Let(Box::new(
        VariableDecl::new("d", byte_ty(4), at(4, 5))
            .with_initializer(Expression::number(2, at(4, 19))),
    ));
    let body = vec![
        Statement::return_value(Some(Expression::number(1, at(3, 12))), at(3, 5)),
        dead_let,
    ];
    let f = function("f", 2, vec![], byte_ty(2), body);
    let mut program = program("T", vec![f]);
    let result = analyze_advanced(&mut program);

    let unreachable: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::UnreachableCode)
        .collect();
    assert_eq!(unreachable.len(), 1);
    assert_eq!(unreachable[0].location, at(4, 5));

    let advanced = result.pass_results.advanced.as_ref().expect("advanced ran");
    assert_eq!(advanced.dead_code.items.len(), 1);
    assert_eq!(advanced.dead_code.items[0].cause, DeadCodeCause::AfterReturn);
}

#[test]
fn maybe_assigned_read_warns_possibly_uninitialized() {
    let body = vec![
        Statement::Let(Box::new(VariableDecl::new("x", byte_ty(3), at(3, 5)))),
        Statement::if_then(
            Expression::identifier("cond", at(4, 9)),
            vec![Statement::assign(
                Expression::identifier("x", at(5, 9)),
                Expression::number(1, at(5, 13)),
                at(5, 9),
            )],
            None,
            at(4, 5),
        ),
        Statement::return_value(Some(Expression::identifier("x", at(7, 12))), at(7, 5)),
    ];
    let f = function("f", 2, vec![param("cond", 2, 12, boolean_ty(2))], byte_ty(2), body);
    let mut program = program("T", vec![f]);
    let result = analyze_advanced(&mut program);

    let possibly: Vec<_> = result
        .diagnostics
        .iter()
        .filter(|d| d.code == DiagnosticCode::PossiblyUninitialized)
        .collect();
    assert_eq!(possibly.len(), 1, "{:?}", result.diagnostics);
    assert_eq!(possibly[0].location, at(7, 12));
    assert!(possibly[0].message.contains('x'));
}

#[test]
fn duplicate_declaration_recovers_and_continues() {
    let first = VariableDecl::new("x", byte_ty(2), at(2, 5));
    let second = VariableDecl::new("x", byte_ty(3), at(3, 5));
    let mut program = program("T", vec![Item::Variable(first), Item::Variable(second)]);
    let result = analyze(&mut program);
    assert!(!result.success);
    assert_eq!(result.diagnostics.error_count(), 1);
    assert_eq!(result.diagnostics.errors().next().unwrap().code, DiagnosticCode::DuplicateDeclaration);
    // The surviving symbol is the first declaration.
    assert_eq!(result.symbol_table.symbol_count(), 1);
}

#[test]
fn undefined_symbol_and_type_mismatch_are_reported_in_source_order() {
    let body = vec![
        Statement::expr(Expression::identifier("ghost", at(3, 5)), at(3, 5)),
        Statement::Let(Box::new(
            VariableDecl::new("b", boolean_ty(4), at(4, 5))
                .with_initializer(Expression::string("nope", at(4, 22))),
        )),
    ];
    let f = function("f", 2, vec![], void_ty(2), body);
    let mut program = program("T", vec![f]);
    let result = analyze(&mut program);
    assert!(!result.success);
    let codes: Vec<_> = result.diagnostics.errors().map(|d| d.code).collect();
    assert_eq!(codes, vec![DiagnosticCode::UndefinedSymbol, DiagnosticCode::TypeMismatch]);
}

#[test]
fn missing_return_on_some_path_is_an_error() {
    let body = vec![Statement::if_then(
        Expression::boolean(true, at(3, 9)),
        vec![Statement::return_value(Some(Expression::number(1, at(4, 12))), at(4, 5))],
        None,
        at(3, 5),
    )];
    let f = function("f", 2, vec![], byte_ty(2), body);
    let mut program = program("T", vec![f]);
    let result = analyze(&mut program);
    assert!(result.diagnostics.iter().any(|d| d.code == DiagnosticCode::MissingReturn));
}

#[test]
fn multi_module_exports_resolve_in_registration_order() {
    let exported = Item::Function(
        blend65_syntax::ast::FunctionDecl::new("helper", vec![], void_ty(2), vec![], at(2, 1))
            .exported(),
    );
    let lib = program("Lib", vec![exported]);
    let app = program("App", vec![]);
    let analyzer =
        blend65_analysis::SemanticAnalyzer::new(blend65_analysis::AnalysisOptions::default());
    let mut modules = [lib, app];
    let multi = analyzer.analyze_multiple(&mut modules);
    assert!(multi.success());
    let (module, symbol) = multi.global_symbols.lookup("helper", "App").expect("visible export");
    assert_eq!(module, "Lib");
    assert!(symbol.is_exported);
    assert!(multi.global_symbols.lookup("helper", "Lib").is_none());
}
