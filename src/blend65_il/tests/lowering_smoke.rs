//! Lowering end-to-end: analyze a hand-built program, generate IL, check
//! the shapes the backend relies on.

use blend65_analysis::analyzer::{AnalysisResult, SemanticAnalyzer};
use blend65_analysis::options::AnalysisOptions;
use blend65_il::{IlGenerator, IlModule, IlVerifier, Opcode, Optimizer};
use blend65_syntax::ast::{
    BinaryOperator, Expression, FunctionDecl, Item, MapDecl, ModuleDecl, Parameter, Program,
    Statement, TypeExpr, VariableDecl,
};
use blend65_syntax::span::{Position, SourceLocation};

fn at(line: u32, column: u32) -> SourceLocation {
    let offset = line * 100 + column;
    SourceLocation::new(
        Some("test.b65".into()),
        Position::new(line, column, offset),
        Position::new(line, column + 1, offset + 1),
    )
}

fn byte_ty(line: u32) -> TypeExpr {
    TypeExpr::named("byte", at(line, 90))
}

fn void_ty(line: u32) -> TypeExpr {
    TypeExpr::named("void", at(line, 90))
}

fn lower(mut program: Program) -> (IlModule, AnalysisResult) {
    let analyzer = SemanticAnalyzer::new(AnalysisOptions::default());
    let analysis = analyzer.analyze(&mut program);
    assert!(analysis.success, "analysis failed: {:?}", analysis.diagnostics);
    let module = IlGenerator::generate(&program, &analysis).expect("lowering succeeds");
    IlVerifier::verify_module(&module).expect("generated IL validates");
    (module, analysis)
}

#[test]
fn add_function_lowers_to_params_add_return() {
    let body = vec![Statement::return_value(
        Some(Expression::binary(
            BinaryOperator::Add,
            Expression::identifier("a", at(3, 12)),
            Expression::identifier("b", at(3, 16)),
            at(3, 14),
        )),
        at(3, 5),
    )];
    let add = FunctionDecl::new(
        "add",
        vec![
            Parameter::new("a", byte_ty(2), at(2, 14)),
            Parameter::new("b", byte_ty(2), at(2, 23)),
        ],
        byte_ty(2),
        body,
        at(2, 1),
    );
    let program = Program::with_items(
        ModuleDecl::new("T", at(1, 1)),
        vec![Item::Function(add)],
    );
    let (module, _) = lower(program);

    let function = module.function("add").expect("lowered");
    assert_eq!(function.params.len(), 2);
    let opcodes: Vec<Opcode> = function
        .blocks
        .iter()
        .flat_map(|b| b.instructions.iter().map(|i| i.opcode))
        .collect();
    assert_eq!(
        opcodes,
        vec![Opcode::LoadParam, Opcode::LoadParam, Opcode::Add, Opcode::Return]
    );
}

#[test]
fn constant_expressions_fold_at_generation_time() {
    // return 2 + 3 * 4  =>  a single RETURN of #14, no arithmetic emitted.
    let expr = Expression::binary(
        BinaryOperator::Add,
        Expression::number(2, at(3, 12)),
        Expression::binary(
            BinaryOperator::Multiply,
            Expression::number(3, at(3, 16)),
            Expression::number(4, at(3, 20)),
            at(3, 18),
        ),
        at(3, 14),
    );
    let f = FunctionDecl::new(
        "f",
        vec![],
        byte_ty(2),
        vec![Statement::return_value(Some(expr), at(3, 5))],
        at(2, 1),
    );
    let program =
        Program::with_items(ModuleDecl::new("T", at(1, 1)), vec![Item::Function(f)]);
    let (module, _) = lower(program);

    let function = module.function("f").unwrap();
    assert_eq!(function.instruction_count(), 1);
    let ret = function.blocks[0].terminator().unwrap();
    assert_eq!(ret.opcode, Opcode::Return);
    assert_eq!(ret.operands[0].as_imm(), Some(14));
}

#[test]
fn short_circuit_and_skips_rhs_on_the_false_path() {
    // f(a: boolean): byte { if a && peek(53280) == 0 { return 1; } return 0; }
    let peek_call = Expression::call(
        Expression::identifier("peek", at(3, 17)),
        vec![Expression::number(53280, at(3, 22))],
        at(3, 18),
    );
    let condition = Expression::binary(
        BinaryOperator::LogicalAnd,
        Expression::identifier("a", at(3, 12)),
        Expression::binary(
            BinaryOperator::Equal,
            peek_call,
            Expression::number(0, at(3, 32)),
            at(3, 30),
        ),
        at(3, 14),
    );
    let body = vec![
        Statement::if_then(
            condition,
            vec![Statement::return_value(Some(Expression::number(1, at(4, 16))), at(4, 9))],
            None,
            at(3, 5),
        ),
        Statement::return_value(Some(Expression::number(0, at(6, 12))), at(6, 5)),
    ];
    let f = FunctionDecl::new(
        "f",
        vec![Parameter::new("a", TypeExpr::named("boolean", at(2, 20)), at(2, 12))],
        byte_ty(2),
        body,
        at(2, 1),
    );
    let program =
        Program::with_items(ModuleDecl::new("T", at(1, 1)), vec![Item::Function(f)]);
    let (module, _) = lower(program);
    let function = module.function("f").unwrap();

    // The entry block branches on `a` without having evaluated the peek.
    let entry = function.entry_block().unwrap();
    assert!(entry.instructions.iter().all(|i| i.opcode != Opcode::IntrinsicPeek));
    let branch = entry.terminator().unwrap();
    assert_eq!(branch.opcode, Opcode::Branch);

    // The peek lives in exactly one block, and that block is a branch
    // target only on the `a == true` edge.
    let peek_blocks: Vec<_> = function
        .blocks
        .iter()
        .filter(|b| b.instructions.iter().any(|i| i.opcode == Opcode::IntrinsicPeek))
        .collect();
    assert_eq!(peek_blocks.len(), 1);
    let rhs_block = peek_blocks[0].id;
    let true_target = branch.operands[1].as_block().unwrap();
    let false_target = branch.operands[2].as_block().unwrap();
    assert_eq!(true_target, rhs_block);
    assert_ne!(false_target, rhs_block);
}

#[test]
fn compile_time_intrinsics_fold_and_emit_no_il() {
    // let buffer: byte[8]; return sizeof(buffer) == length-of-array * 1.
    let buffer = VariableDecl::new(
        "buffer",
        TypeExpr::array(byte_ty(2), Some(8), at(2, 20)),
        at(2, 5),
    );
    let size_call = Expression::call(
        Expression::identifier("sizeof", at(4, 12)),
        vec![Expression::identifier("buffer", at(4, 19))],
        at(4, 13),
    );
    let f = FunctionDecl::new(
        "f",
        vec![],
        TypeExpr::named("word", at(3, 90)),
        vec![Statement::return_value(Some(size_call), at(4, 5))],
        at(3, 1),
    );
    let program = Program::with_items(
        ModuleDecl::new("T", at(1, 1)),
        vec![Item::Variable(buffer), Item::Function(f)],
    );
    let (module, _) = lower(program);
    let function = module.function("f").unwrap();
    assert_eq!(function.instruction_count(), 1);
    let ret = function.blocks[0].terminator().unwrap();
    assert_eq!(ret.operands[0].as_imm(), Some(8));
}

#[test]
fn map_stores_are_volatile_absolute_writes() {
    // map border at $D020: byte;  border = 0;
    let map = MapDecl::new("border", byte_ty(2), 0xD020, at(2, 5));
    let body = vec![Statement::assign(
        Expression::identifier("border", at(4, 5)),
        Expression::number(0, at(4, 14)),
        at(4, 5),
    )];
    let f = FunctionDecl::new("f", vec![], void_ty(3), body, at(3, 1));
    let program = Program::with_items(
        ModuleDecl::new("T", at(1, 1)),
        vec![Item::Map(map), Item::Function(f)],
    );
    let (module, _) = lower(program);

    assert_eq!(module.maps.len(), 1);
    assert_eq!(module.maps[0].address, 0xD020);

    let function = module.function("f").unwrap();
    let store = function
        .blocks
        .iter()
        .flat_map(|b| &b.instructions)
        .find(|i| i.opcode == Opcode::Store)
        .expect("store emitted");
    assert!(store.meta.is_volatile);
    assert_eq!(store.operands[0].as_imm(), Some(0xD020));
}

#[test]
fn globals_are_collected_with_initial_values() {
    let counter = VariableDecl::new("counter", byte_ty(2), at(2, 5))
        .with_initializer(Expression::number(5, at(2, 22)));
    let program =
        Program::with_items(ModuleDecl::new("T", at(1, 1)), vec![Item::Variable(counter)]);
    let (module, _) = lower(program);
    let global = module.global("counter").expect("collected");
    assert_eq!(global.initial_value, Some(5));
    assert!(!global.is_const);
}

#[test]
fn optimizer_o2_folds_constant_branches_and_drops_dead_blocks() {
    // while true { break; } return 0  lowers to a constant branch.
    let body = vec![
        Statement::if_then(
            Expression::boolean(true, at(3, 9)),
            vec![Statement::return_value(Some(Expression::number(1, at(4, 16))), at(4, 9))],
            Some(vec![Statement::return_value(Some(Expression::number(2, at(6, 16))), at(6, 9))]),
            at(3, 5),
        ),
    ];
    let f = FunctionDecl::new("f", vec![], byte_ty(2), body, at(2, 1));
    let program =
        Program::with_items(ModuleDecl::new("T", at(1, 1)), vec![Item::Function(f)]);
    let (module, _) = lower(program);
    let before = module.function("f").unwrap().blocks.len();

    let optimizer = Optimizer::new(blend65_analysis::OptimizationLevel::O2);
    let (optimized, diagnostics) = optimizer.optimize(module);
    assert!(diagnostics.is_empty(), "{:?}", diagnostics);
    let function = optimized.function("f").unwrap();
    assert!(function.blocks.len() < before);
    // The surviving terminators include no branch on a constant.
    for block in &function.blocks {
        if let Some(t) = block.terminator() {
            if t.opcode == Opcode::Branch {
                assert!(t.operands[0].as_imm().is_none());
            }
        }
    }
    IlVerifier::verify_module(&optimized).unwrap();
}

#[test]
fn string_literals_are_interned_once() {
    let f = FunctionDecl::new(
        "f",
        vec![],
        void_ty(2),
        vec![
            Statement::Let(Box::new(
                VariableDecl::new("a", TypeExpr::named("string", at(3, 90)), at(3, 5))
                    .with_initializer(Expression::string("READY.", at(3, 20))),
            )),
            Statement::Let(Box::new(
                VariableDecl::new("b", TypeExpr::named("string", at(4, 90)), at(4, 5))
                    .with_initializer(Expression::string("READY.", at(4, 20))),
            )),
        ],
        at(2, 1),
    );
    let program =
        Program::with_items(ModuleDecl::new("T", at(1, 1)), vec![Item::Function(f)]);
    let (module, _) = lower(program);
    assert_eq!(module.strings.len(), 1);
    assert_eq!(module.strings[0].value, "READY.");
}
