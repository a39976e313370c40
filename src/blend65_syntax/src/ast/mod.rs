pub mod declarations;
pub mod expressions;
pub mod operators;
pub mod statements;
pub mod types;

pub use declarations::{
    FunctionDecl, ImportDecl, Item, MapDecl, ModuleDecl, Parameter, Program, StorageClass,
    VariableDecl,
};
pub use expressions::{
    BinaryExpression, BoolLiteral, CallExpression, Expression, Identifier, IndexExpression,
    NumberLiteral, StringLiteral, UnaryExpression,
};
pub use operators::{BinaryOperator, UnaryOperator};
pub use statements::{
    AssignStatement, BlockStatement, BreakStatement, ContinueStatement, ExpressionStatement,
    ForStatement, IfStatement, ReturnStatement, Statement, WhileStatement,
};
pub use types::{ArrayTypeExpr, CallbackParam, CallbackTypeExpr, NamedTypeExpr, TypeExpr};

use serde::{Deserialize, Serialize};

/// Identity of an AST node within one program. Assigned in preorder by the
/// semantic analyzer's numbering step; zero means not yet numbered.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const UNSET: NodeId = NodeId(0);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}
