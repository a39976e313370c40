//! Shared AST construction helpers for the analyzer integration tests.
//! The parser is exercised elsewhere; these build the same trees by hand.

use blend65_analysis::analyzer::{AnalysisResult, SemanticAnalyzer};
use blend65_analysis::options::AnalysisOptions;
use blend65_syntax::ast::{
    Expression, FunctionDecl, Item, ModuleDecl, Parameter, Program, Statement, TypeExpr,
};
use blend65_syntax::span::{Position, SourceLocation};

/// Distinct, strictly increasing locations keyed by a line/column pair.
pub fn at(line: u32, column: u32) -> SourceLocation {
    let offset = line * 100 + column;
    SourceLocation::new(
        Some("test.b65".into()),
        Position::new(line, column, offset),
        Position::new(line, column + 1, offset + 1),
    )
}

pub fn byte_ty(line: u32) -> TypeExpr {
    TypeExpr::named("byte", at(line, 90))
}

pub fn word_ty(line: u32) -> TypeExpr {
    TypeExpr::named("word", at(line, 90))
}

pub fn void_ty(line: u32) -> TypeExpr {
    TypeExpr::named("void", at(line, 90))
}

pub fn boolean_ty(line: u32) -> TypeExpr {
    TypeExpr::named("boolean", at(line, 90))
}

pub fn program(name: &str, items: Vec<Item>) -> Program {
    Program::with_items(ModuleDecl::new(name, at(1, 1)), items)
}

pub fn function(
    name: &str,
    line: u32,
    params: Vec<Parameter>,
    return_type: TypeExpr,
    body: Vec<Statement>,
) -> Item {
    Item::Function(FunctionDecl::new(name, params, return_type, body, at(line, 1)))
}

pub fn param(name: &str, line: u32, column: u32, ty: TypeExpr) -> Parameter {
    Parameter::new(name, ty, at(line, column))
}

pub fn call(name: &str, line: u32, column: u32, arguments: Vec<Expression>) -> Expression {
    Expression::call(
        Expression::identifier(name, at(line, column)),
        arguments,
        at(line, column + 1),
    )
}

pub fn analyze(program: &mut Program) -> AnalysisResult {
    SemanticAnalyzer::new(AnalysisOptions::default()).analyze(program)
}

pub fn analyze_advanced(program: &mut Program) -> AnalysisResult {
    SemanticAnalyzer::new(AnalysisOptions::with_advanced_analysis()).analyze(program)
}
