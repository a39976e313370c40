//! AST serde round-trips: the CLI dumps trees as JSON, so every node type
//! must survive the trip unchanged.

use blend65_syntax::ast::{
    Expression, FunctionDecl, Item, ModuleDecl, Parameter, Program, Statement, TypeExpr,
};
use blend65_syntax::span::{Position, SourceLocation};

fn at(line: u32, column: u32) -> SourceLocation {
    SourceLocation::new(
        Some("demo.b65".into()),
        Position::new(line, column, line * 100 + column),
        Position::new(line, column + 1, line * 100 + column + 1),
    )
}

#[test]
fn program_round_trips_through_json() {
    let body = vec![
        Statement::if_then(
            Expression::identifier("flag", at(3, 9)),
            vec![Statement::return_value(Some(Expression::number(1, at(4, 16))), at(4, 9))],
            Some(vec![Statement::return_value(Some(Expression::number(0, at(6, 16))), at(6, 9))]),
            at(3, 5),
        ),
    ];
    let function = FunctionDecl::new(
        "pick",
        vec![Parameter::new("flag", TypeExpr::named("boolean", at(2, 18)), at(2, 12))],
        TypeExpr::named("byte", at(2, 28)),
        body,
        at(2, 1),
    );
    let program = Program::with_items(
        ModuleDecl::new("Demo", at(1, 1)),
        vec![Item::Function(function)],
    );

    let json = serde_json::to_string_pretty(&program).expect("serializes");
    let back: Program = serde_json::from_str(&json).expect("deserializes");
    assert_eq!(program, back);
}

#[test]
fn type_annotations_render_canonically() {
    let callback = TypeExpr::callback(
        vec![blend65_syntax::ast::CallbackParam {
            name: "value".into(),
            ty: TypeExpr::named("byte", at(1, 1)),
        }],
        TypeExpr::named("void", at(1, 10)),
        at(1, 1),
    );
    assert_eq!(callback.to_string(), "callback(value: byte): void");
    let array = TypeExpr::array(TypeExpr::named("word", at(1, 1)), Some(16), at(1, 1));
    assert_eq!(array.to_string(), "word[16]");
}
