//! Preorder node numbering. Runs before pass 1 so every later pass can key
//! side tables by `NodeId`.

use blend65_syntax::ast::{Expression, Item, Program, Statement};

fn bump(next: &mut u32) -> u32 {
    let id = *next;
    *next += 1;
    id
}

/// Assign sequential ids in preorder. Returns how many nodes were numbered.
pub fn assign_node_ids(program: &mut Program) -> u32 {
    let mut next = 1u32;
    program.module.id.0 = bump(&mut next);
    for item in &mut program.items {
        match item {
            Item::Import(decl) => decl.id.0 = bump(&mut next),
            Item::Variable(decl) => {
                decl.id.0 = bump(&mut next);
                if let Some(init) = &mut decl.initializer {
                    number_expression(init, &mut next);
                }
            }
            Item::Map(decl) => decl.id.0 = bump(&mut next),
            Item::Function(decl) => {
                decl.id.0 = bump(&mut next);
                for param in &mut decl.params {
                    param.id.0 = bump(&mut next);
                }
                number_statements(&mut decl.body, &mut next);
            }
        }
    }
    next - 1
}

fn number_statements(statements: &mut [Statement], next: &mut u32) {
    for stmt in statements {
        stmt.id_mut().0 = bump(next);
        match stmt {
            Statement::Let(decl) => {
                if let Some(init) = &mut decl.initializer {
                    number_expression(init, next);
                }
            }
            Statement::Assign(s) => {
                number_expression(&mut s.target, next);
                number_expression(&mut s.value, next);
            }
            Statement::Expr(s) => number_expression(&mut s.expression, next),
            Statement::If(s) => {
                number_expression(&mut s.condition, next);
                number_statements(&mut s.then_branch, next);
                if let Some(else_branch) = &mut s.else_branch {
                    number_statements(else_branch, next);
                }
            }
            Statement::While(s) => {
                number_expression(&mut s.condition, next);
                number_statements(&mut s.body, next);
            }
            Statement::For(s) => {
                number_expression(&mut s.from, next);
                number_expression(&mut s.to, next);
                if let Some(step) = &mut s.step {
                    number_expression(step, next);
                }
                number_statements(&mut s.body, next);
            }
            Statement::Return(s) => {
                if let Some(value) = &mut s.value {
                    number_expression(value, next);
                }
            }
            Statement::Block(s) => number_statements(&mut s.statements, next),
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }
}

fn number_expression(expr: &mut Expression, next: &mut u32) {
    expr.id_mut().0 = bump(next);
    match expr {
        Expression::Binary(e) => {
            number_expression(&mut e.left, next);
            number_expression(&mut e.right, next);
        }
        Expression::Unary(e) => number_expression(&mut e.operand, next),
        Expression::Call(e) => {
            number_expression(&mut e.callee, next);
            for arg in &mut e.arguments {
                number_expression(arg, next);
            }
        }
        Expression::Index(e) => {
            number_expression(&mut e.object, next);
            number_expression(&mut e.index, next);
        }
        Expression::Number(_)
        | Expression::Bool(_)
        | Expression::Str(_)
        | Expression::Identifier(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blend65_syntax::ast::{FunctionDecl, ModuleDecl, TypeExpr};
    use blend65_syntax::span::SourceLocation;

    #[test]
    fn ids_are_unique_and_sequential() {
        let loc = SourceLocation::default;
        let body = vec![Statement::return_value(Some(Expression::number(1, loc())), loc())];
        let func = FunctionDecl::new("f", vec![], TypeExpr::named("byte", loc()), body, loc());
        let mut program = Program::with_items(
            ModuleDecl::new("T", loc()),
            vec![Item::Function(func)],
        );
        let count = assign_node_ids(&mut program);
        // module + function + return + literal
        assert_eq!(count, 4);
        assert_eq!(program.module.id.0, 1);
    }
}
