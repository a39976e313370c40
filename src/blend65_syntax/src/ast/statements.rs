use super::NodeId;
use super::declarations::VariableDecl;
use super::expressions::Expression;
use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Let(Box<VariableDecl>),
    Assign(Box<AssignStatement>),
    Expr(ExpressionStatement),
    If(Box<IfStatement>),
    While(Box<WhileStatement>),
    For(Box<ForStatement>),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Return(ReturnStatement),
    Block(BlockStatement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStatement {
    pub id: NodeId,
    /// Identifier or index expression.
    pub target: Expression,
    pub value: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionStatement {
    pub id: NodeId,
    pub expression: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStatement {
    pub id: NodeId,
    pub condition: Expression,
    pub then_branch: Vec<Statement>,
    pub else_branch: Option<Vec<Statement>>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStatement {
    pub id: NodeId,
    pub condition: Expression,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

/// `for i = a to b [step s]`. The counter is declared by the loop itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStatement {
    pub id: NodeId,
    pub variable: String,
    pub from: Expression,
    pub to: Expression,
    pub step: Option<Expression>,
    pub body: Vec<Statement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakStatement {
    pub id: NodeId,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueStatement {
    pub id: NodeId,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStatement {
    pub id: NodeId,
    pub value: Option<Expression>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStatement {
    pub id: NodeId,
    pub statements: Vec<Statement>,
    pub location: SourceLocation,
}

impl Statement {
    pub fn assign(target: Expression, value: Expression, location: SourceLocation) -> Statement {
        Statement::Assign(Box::new(AssignStatement { id: NodeId::UNSET, target, value, location }))
    }

    pub fn expr(expression: Expression, location: SourceLocation) -> Statement {
        Statement::Expr(ExpressionStatement { id: NodeId::UNSET, expression, location })
    }

    pub fn if_then(
        condition: Expression,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
        location: SourceLocation,
    ) -> Statement {
        Statement::If(Box::new(IfStatement {
            id: NodeId::UNSET,
            condition,
            then_branch,
            else_branch,
            location,
        }))
    }

    pub fn while_loop(condition: Expression, body: Vec<Statement>, location: SourceLocation) -> Statement {
        Statement::While(Box::new(WhileStatement { id: NodeId::UNSET, condition, body, location }))
    }

    pub fn for_loop(
        variable: impl Into<String>,
        from: Expression,
        to: Expression,
        step: Option<Expression>,
        body: Vec<Statement>,
        location: SourceLocation,
    ) -> Statement {
        Statement::For(Box::new(ForStatement {
            id: NodeId::UNSET,
            variable: variable.into(),
            from,
            to,
            step,
            body,
            location,
        }))
    }

    pub fn break_stmt(location: SourceLocation) -> Statement {
        Statement::Break(BreakStatement { id: NodeId::UNSET, location })
    }

    pub fn continue_stmt(location: SourceLocation) -> Statement {
        Statement::Continue(ContinueStatement { id: NodeId::UNSET, location })
    }

    pub fn return_value(value: Option<Expression>, location: SourceLocation) -> Statement {
        Statement::Return(ReturnStatement { id: NodeId::UNSET, value, location })
    }

    pub fn block(statements: Vec<Statement>, location: SourceLocation) -> Statement {
        Statement::Block(BlockStatement { id: NodeId::UNSET, statements, location })
    }

    pub fn id(&self) -> NodeId {
        match self {
            Statement::Let(s) => s.id,
            Statement::Assign(s) => s.id,
            Statement::Expr(s) => s.id,
            Statement::If(s) => s.id,
            Statement::While(s) => s.id,
            Statement::For(s) => s.id,
            Statement::Break(s) => s.id,
            Statement::Continue(s) => s.id,
            Statement::Return(s) => s.id,
            Statement::Block(s) => s.id,
        }
    }

    pub fn id_mut(&mut self) -> &mut NodeId {
        match self {
            Statement::Let(s) => &mut s.id,
            Statement::Assign(s) => &mut s.id,
            Statement::Expr(s) => &mut s.id,
            Statement::If(s) => &mut s.id,
            Statement::While(s) => &mut s.id,
            Statement::For(s) => &mut s.id,
            Statement::Break(s) => &mut s.id,
            Statement::Continue(s) => &mut s.id,
            Statement::Return(s) => &mut s.id,
            Statement::Block(s) => &mut s.id,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Statement::Let(s) => &s.location,
            Statement::Assign(s) => &s.location,
            Statement::Expr(s) => &s.location,
            Statement::If(s) => &s.location,
            Statement::While(s) => &s.location,
            Statement::For(s) => &s.location,
            Statement::Break(s) => &s.location,
            Statement::Continue(s) => &s.location,
            Statement::Return(s) => &s.location,
            Statement::Block(s) => &s.location,
        }
    }
}
