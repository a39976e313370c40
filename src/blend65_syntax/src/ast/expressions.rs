use super::NodeId;
use super::operators::{BinaryOperator, UnaryOperator};
use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Number(NumberLiteral),
    Bool(BoolLiteral),
    Str(StringLiteral),
    Identifier(Identifier),
    Binary(Box<BinaryExpression>),
    Unary(Box<UnaryExpression>),
    Call(Box<CallExpression>),
    Index(Box<IndexExpression>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub id: NodeId,
    pub value: u32,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolLiteral {
    pub id: NodeId,
    pub value: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub id: NodeId,
    pub value: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identifier {
    pub id: NodeId,
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub id: NodeId,
    pub operator: BinaryOperator,
    pub left: Expression,
    pub right: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnaryExpression {
    pub id: NodeId,
    pub operator: UnaryOperator,
    pub operand: Expression,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallExpression {
    pub id: NodeId,
    pub callee: Expression,
    pub arguments: Vec<Expression>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexExpression {
    pub id: NodeId,
    pub object: Expression,
    pub index: Expression,
    pub location: SourceLocation,
}

impl Expression {
    pub fn number(value: u32, location: SourceLocation) -> Expression {
        Expression::Number(NumberLiteral { id: NodeId::UNSET, value, location })
    }

    pub fn boolean(value: bool, location: SourceLocation) -> Expression {
        Expression::Bool(BoolLiteral { id: NodeId::UNSET, value, location })
    }

    pub fn string(value: impl Into<String>, location: SourceLocation) -> Expression {
        Expression::Str(StringLiteral { id: NodeId::UNSET, value: value.into(), location })
    }

    pub fn identifier(name: impl Into<String>, location: SourceLocation) -> Expression {
        Expression::Identifier(Identifier { id: NodeId::UNSET, name: name.into(), location })
    }

    pub fn binary(
        operator: BinaryOperator,
        left: Expression,
        right: Expression,
        location: SourceLocation,
    ) -> Expression {
        Expression::Binary(Box::new(BinaryExpression {
            id: NodeId::UNSET,
            operator,
            left,
            right,
            location,
        }))
    }

    pub fn unary(operator: UnaryOperator, operand: Expression, location: SourceLocation) -> Expression {
        Expression::Unary(Box::new(UnaryExpression { id: NodeId::UNSET, operator, operand, location }))
    }

    pub fn call(callee: Expression, arguments: Vec<Expression>, location: SourceLocation) -> Expression {
        Expression::Call(Box::new(CallExpression { id: NodeId::UNSET, callee, arguments, location }))
    }

    pub fn index(object: Expression, index: Expression, location: SourceLocation) -> Expression {
        Expression::Index(Box::new(IndexExpression { id: NodeId::UNSET, object, index, location }))
    }

    pub fn id(&self) -> NodeId {
        match self {
            Expression::Number(e) => e.id,
            Expression::Bool(e) => e.id,
            Expression::Str(e) => e.id,
            Expression::Identifier(e) => e.id,
            Expression::Binary(e) => e.id,
            Expression::Unary(e) => e.id,
            Expression::Call(e) => e.id,
            Expression::Index(e) => e.id,
        }
    }

    pub fn id_mut(&mut self) -> &mut NodeId {
        match self {
            Expression::Number(e) => &mut e.id,
            Expression::Bool(e) => &mut e.id,
            Expression::Str(e) => &mut e.id,
            Expression::Identifier(e) => &mut e.id,
            Expression::Binary(e) => &mut e.id,
            Expression::Unary(e) => &mut e.id,
            Expression::Call(e) => &mut e.id,
            Expression::Index(e) => &mut e.id,
        }
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            Expression::Number(e) => &e.location,
            Expression::Bool(e) => &e.location,
            Expression::Str(e) => &e.location,
            Expression::Identifier(e) => &e.location,
            Expression::Binary(e) => &e.location,
            Expression::Unary(e) => &e.location,
            Expression::Call(e) => &e.location,
            Expression::Index(e) => &e.location,
        }
    }

    /// Name of the identifier this expression is, if it is one.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expression::Identifier(id) => Some(&id.name),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expression::Number(_) | Expression::Bool(_) | Expression::Str(_))
    }
}
