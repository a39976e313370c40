//! Target-facing invariants: zero-page allocation bounds and stack-depth
//! warnings over real analyzed programs.

use blend65_analysis::analyzer::SemanticAnalyzer;
use blend65_analysis::options::AnalysisOptions;
use blend65_syntax::ast::{
    Expression, FunctionDecl, Item, ModuleDecl, Parameter, Program, Statement, TypeExpr,
};
use blend65_syntax::span::{Position, SourceLocation};
use blend65_targets::{
    get_target_config, Common6502Analyzer, TargetArchitecture,
};

fn at(line: u32, column: u32) -> SourceLocation {
    let offset = line * 100 + column;
    SourceLocation::new(
        Some("test.b65".into()),
        Position::new(line, column, offset),
        Position::new(line, column + 1, offset + 1),
    )
}

fn void_ty(line: u32) -> TypeExpr {
    TypeExpr::named("void", at(line, 90))
}

fn byte_ty(line: u32) -> TypeExpr {
    TypeExpr::named("byte", at(line, 90))
}

#[test]
fn allocation_fit_implies_every_byte_is_safe_and_unreserved() {
    let zp = &get_target_config(TargetArchitecture::C64, false).unwrap().zero_page;
    for start in 0u16..=255 {
        for len in 1u16..=16 {
            if zp.does_allocation_fit(start, len) {
                for k in 0..len {
                    let address = start + k;
                    assert!(zp.is_address_safe(address), "${address:02X} inside a fitting allocation");
                    assert!(!zp.is_address_reserved(address));
                }
            }
        }
    }
}

#[test]
fn deep_call_chain_triggers_a_stack_warning() {
    // A chain of functions, each with enough parameters and calls to cost
    // real stack bytes: depth per function is 2 + 2*2 + 2*1 = 8, and forty
    // of them chain to 320 > 192.
    let mut items: Vec<Item> = Vec::new();
    let count = 40u32;
    for i in 0..count {
        let line = 2 + i * 3;
        let body = if i + 1 < count {
            vec![Statement::expr(
                Expression::call(
                    Expression::identifier(format!("f{}", i + 1), at(line + 1, 5)),
                    vec![
                        Expression::number(1, at(line + 1, 10)),
                        Expression::number(2, at(line + 1, 13)),
                        Expression::number(3, at(line + 1, 16)),
                        Expression::number(4, at(line + 1, 19)),
                        Expression::number(5, at(line + 1, 22)),
                    ],
                    at(line + 1, 8),
                ),
                at(line + 1, 5),
            )]
        } else {
            vec![]
        };
        let params = (0u32..5)
            .map(|p| Parameter::new(format!("p{p}"), byte_ty(line), at(line, 10 + p)))
            .collect();
        items.push(Item::Function(FunctionDecl::new(
            format!("f{i}"),
            params,
            void_ty(line),
            body,
            at(line, 1),
        )));
    }
    let mut program = Program::with_items(ModuleDecl::new("Deep", at(1, 1)), items);
    let analyzer = SemanticAnalyzer::new(AnalysisOptions::default());
    let analysis = analyzer.analyze(&mut program);
    assert!(analysis.success, "{:?}", analysis.diagnostics);

    let (report, diagnostics) = Common6502Analyzer::analyze(&program, &analysis);
    let root = report.functions.get("f0").unwrap();
    assert!(root.chain_depth > 192, "chain depth {}", root.chain_depth);
    assert!(
        diagnostics
            .iter()
            .any(|d| d.code == blend65_analysis::DiagnosticCode::StackOverflowRisk),
        "{diagnostics:?}"
    );
    // The leaf on its own is fine.
    let leaf = report.functions.get("f39").unwrap();
    assert!(leaf.chain_depth < 192);
}

#[test]
fn shallow_programs_stay_quiet() {
    let f = FunctionDecl::new("main", vec![], void_ty(2), vec![], at(2, 1));
    let mut program =
        Program::with_items(ModuleDecl::new("Tiny", at(1, 1)), vec![Item::Function(f)]);
    let analyzer = SemanticAnalyzer::new(AnalysisOptions::default());
    let analysis = analyzer.analyze(&mut program);
    let (report, diagnostics) = Common6502Analyzer::analyze(&program, &analysis);
    assert!(diagnostics.is_empty());
    assert_eq!(report.functions.get("main").unwrap().estimated_depth, 2);
}
