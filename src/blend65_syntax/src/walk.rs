//! Read-only traversal helpers. Passes that need mutation (the analyzer's
//! numbering step) walk the tree with their own exhaustive matches.

use crate::ast::{Expression, Statement};

/// Preorder visit of every statement, including statements nested in
/// `if`/`while`/`for`/block bodies.
pub fn visit_statements<'a>(statements: &'a [Statement], f: &mut dyn FnMut(&'a Statement)) {
    for stmt in statements {
        f(stmt);
        match stmt {
            Statement::If(s) => {
                visit_statements(&s.then_branch, f);
                if let Some(else_branch) = &s.else_branch {
                    visit_statements(else_branch, f);
                }
            }
            Statement::While(s) => visit_statements(&s.body, f),
            Statement::For(s) => visit_statements(&s.body, f),
            Statement::Block(s) => visit_statements(&s.statements, f),
            Statement::Let(_)
            | Statement::Assign(_)
            | Statement::Expr(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Return(_) => {}
        }
    }
}

/// The expressions a single statement owns directly, without descending
/// into nested statements or into sub-expressions.
pub fn statement_expressions<'a>(stmt: &'a Statement, f: &mut dyn FnMut(&'a Expression)) {
    match stmt {
        Statement::Let(s) => {
            if let Some(init) = &s.initializer {
                f(init);
            }
        }
        Statement::Assign(s) => {
            f(&s.target);
            f(&s.value);
        }
        Statement::Expr(s) => f(&s.expression),
        Statement::If(s) => f(&s.condition),
        Statement::While(s) => f(&s.condition),
        Statement::For(s) => {
            f(&s.from);
            f(&s.to);
            if let Some(step) = &s.step {
                f(step);
            }
        }
        Statement::Return(s) => {
            if let Some(value) = &s.value {
                f(value);
            }
        }
        Statement::Break(_) | Statement::Continue(_) | Statement::Block(_) => {}
    }
}

/// Preorder visit of an expression and all of its sub-expressions.
pub fn visit_expression<'a>(expr: &'a Expression, f: &mut dyn FnMut(&'a Expression)) {
    f(expr);
    match expr {
        Expression::Binary(e) => {
            visit_expression(&e.left, f);
            visit_expression(&e.right, f);
        }
        Expression::Unary(e) => visit_expression(&e.operand, f),
        Expression::Call(e) => {
            visit_expression(&e.callee, f);
            for arg in &e.arguments {
                visit_expression(arg, f);
            }
        }
        Expression::Index(e) => {
            visit_expression(&e.object, f);
            visit_expression(&e.index, f);
        }
        Expression::Number(_)
        | Expression::Bool(_)
        | Expression::Str(_)
        | Expression::Identifier(_) => {}
    }
}

/// Every expression (preorder, fully nested) reachable from a statement
/// list, nested statements included.
pub fn visit_all_expressions<'a>(statements: &'a [Statement], f: &mut dyn FnMut(&'a Expression)) {
    visit_statements(statements, &mut |stmt| {
        statement_expressions(stmt, &mut |expr| visit_expression(expr, f));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;
    use crate::span::SourceLocation;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn visits_nested_statements() {
        let inner = Statement::break_stmt(loc());
        let body = vec![Statement::if_then(
            Expression::boolean(true, loc()),
            vec![inner],
            None,
            loc(),
        )];
        let stmts = vec![Statement::while_loop(Expression::boolean(true, loc()), body, loc())];
        let mut count = 0;
        visit_statements(&stmts, &mut |_| count += 1);
        assert_eq!(count, 3);
    }

    #[test]
    fn visits_every_subexpression() {
        let expr = Expression::binary(
            BinaryOperator::Add,
            Expression::number(1, loc()),
            Expression::binary(
                BinaryOperator::Multiply,
                Expression::identifier("x", loc()),
                Expression::number(2, loc()),
                loc(),
            ),
            loc(),
        );
        let mut count = 0;
        visit_expression(&expr, &mut |_| count += 1);
        assert_eq!(count, 5);
    }
}
