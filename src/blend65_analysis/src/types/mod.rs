pub mod coercion;
pub mod system;

pub use coercion::CoercionKind;
pub use system::TypeSystem;

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type universe of the language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeKind {
    Byte,
    Word,
    Boolean,
    Void,
    String,
    Array {
        element: Box<TypeInfo>,
        size: Option<u16>,
    },
    Callback {
        params: Vec<TypeInfo>,
        param_names: Vec<String>,
        return_type: Box<TypeInfo>,
    },
    /// Error-recovery type: produced where no real type is available so a
    /// single mistake does not cascade.
    Unknown,
}

/// A resolved type: variant, canonical printable name, byte size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub kind: TypeKind,
    pub name: String,
    pub size: u16,
    pub is_signed: bool,
    pub is_assignable: bool,
}

impl TypeInfo {
    pub fn byte() -> TypeInfo {
        TypeInfo { kind: TypeKind::Byte, name: "byte".into(), size: 1, is_signed: false, is_assignable: true }
    }

    pub fn word() -> TypeInfo {
        TypeInfo { kind: TypeKind::Word, name: "word".into(), size: 2, is_signed: false, is_assignable: true }
    }

    pub fn boolean() -> TypeInfo {
        TypeInfo {
            kind: TypeKind::Boolean,
            name: "boolean".into(),
            size: 1,
            is_signed: false,
            is_assignable: true,
        }
    }

    pub fn void() -> TypeInfo {
        TypeInfo { kind: TypeKind::Void, name: "void".into(), size: 0, is_signed: false, is_assignable: false }
    }

    pub fn string() -> TypeInfo {
        TypeInfo {
            kind: TypeKind::String,
            name: "string".into(),
            size: 0,
            is_signed: false,
            is_assignable: false,
        }
    }

    pub fn unknown() -> TypeInfo {
        TypeInfo {
            kind: TypeKind::Unknown,
            name: "<unknown>".into(),
            size: 0,
            is_signed: false,
            is_assignable: true,
        }
    }

    pub fn array(element: TypeInfo, size: Option<u16>) -> TypeInfo {
        let name = match size {
            Some(n) => format!("{}[{}]", element.name, n),
            None => format!("{}[]", element.name),
        };
        let byte_size = size.map(|n| n.saturating_mul(element.size)).unwrap_or(0);
        TypeInfo {
            kind: TypeKind::Array { element: Box::new(element), size },
            name,
            size: byte_size,
            is_signed: false,
            is_assignable: false,
        }
    }

    pub fn callback(params: Vec<TypeInfo>, param_names: Vec<String>, return_type: TypeInfo) -> TypeInfo {
        debug_assert_eq!(params.len(), param_names.len());
        let mut name = String::from("callback(");
        for (i, p) in params.iter().enumerate() {
            if i > 0 {
                name.push_str(", ");
            }
            name.push_str(&p.name);
        }
        name.push_str("): ");
        name.push_str(&return_type.name);
        TypeInfo {
            kind: TypeKind::Callback { params, param_names, return_type: Box::new(return_type) },
            name,
            size: 2,
            is_signed: false,
            is_assignable: true,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.kind, TypeKind::Unknown)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TypeKind::Byte | TypeKind::Word)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, TypeKind::Boolean)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.kind, TypeKind::Void)
    }

    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    pub fn is_callback(&self) -> bool {
        matches!(self.kind, TypeKind::Callback { .. })
    }

    /// Element type for arrays, `None` otherwise.
    pub fn element_type(&self) -> Option<&TypeInfo> {
        match &self.kind {
            TypeKind::Array { element, .. } => Some(element),
            _ => None,
        }
    }

    /// Declared length for sized arrays.
    pub fn array_size(&self) -> Option<u16> {
        match &self.kind {
            TypeKind::Array { size, .. } => *size,
            _ => None,
        }
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of a compatibility check, ordered from best to worst.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeCompatibility {
    Identical,
    Compatible,
    RequiresConversion,
    Incompatible,
}

impl TypeCompatibility {
    /// True for results an implicit context accepts without an explicit cast.
    pub fn is_implicit(self) -> bool {
        matches!(self, TypeCompatibility::Identical | TypeCompatibility::Compatible)
    }
}
