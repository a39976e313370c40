use crate::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A textual type annotation as the parser produced it. Resolution against
/// the type system happens in the semantic analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeExpr {
    Named(NamedTypeExpr),
    Array(Box<ArrayTypeExpr>),
    Callback(Box<CallbackTypeExpr>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTypeExpr {
    pub name: String,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayTypeExpr {
    pub element: TypeExpr,
    /// `None` for unsized array annotations (`byte[]`).
    pub size: Option<u16>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackParam {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackTypeExpr {
    pub params: Vec<CallbackParam>,
    pub return_type: TypeExpr,
    pub location: SourceLocation,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>, location: SourceLocation) -> TypeExpr {
        TypeExpr::Named(NamedTypeExpr { name: name.into(), location })
    }

    pub fn array(element: TypeExpr, size: Option<u16>, location: SourceLocation) -> TypeExpr {
        TypeExpr::Array(Box::new(ArrayTypeExpr { element, size, location }))
    }

    pub fn callback(
        params: Vec<CallbackParam>,
        return_type: TypeExpr,
        location: SourceLocation,
    ) -> TypeExpr {
        TypeExpr::Callback(Box::new(CallbackTypeExpr { params, return_type, location }))
    }

    pub fn location(&self) -> &SourceLocation {
        match self {
            TypeExpr::Named(t) => &t.location,
            TypeExpr::Array(t) => &t.location,
            TypeExpr::Callback(t) => &t.location,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(t) => f.write_str(&t.name),
            TypeExpr::Array(t) => match t.size {
                Some(n) => write!(f, "{}[{}]", t.element, n),
                None => write!(f, "{}[]", t.element),
            },
            TypeExpr::Callback(t) => {
                f.write_str("callback(")?;
                for (i, p) in t.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", p.name, p.ty)?;
                }
                write!(f, "): {}", t.return_type)
            }
        }
    }
}
