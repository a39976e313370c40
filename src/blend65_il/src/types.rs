use blend65_analysis::types::{TypeInfo, TypeKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width a pointer dereferences to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointeeWidth {
    Byte,
    Word,
}

/// The IL's mirror of the surface type universe, one abstraction level
/// lower: strings become pointers, callbacks become word-sized addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IlType {
    Void,
    Byte,
    Word,
    Bool,
    Pointer(PointeeWidth),
    Array { element: Box<IlType>, size: u16 },
}

impl IlType {
    /// Storage size in bytes.
    pub fn size(&self) -> u16 {
        match self {
            IlType::Void => 0,
            IlType::Byte | IlType::Bool => 1,
            IlType::Word | IlType::Pointer(_) => 2,
            IlType::Array { element, size } => element.size().saturating_mul(*size),
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, IlType::Void)
    }

    /// Lower a resolved front-end type.
    pub fn from_type_info(ty: &TypeInfo) -> IlType {
        match &ty.kind {
            TypeKind::Byte => IlType::Byte,
            TypeKind::Word => IlType::Word,
            TypeKind::Boolean => IlType::Bool,
            TypeKind::Void => IlType::Void,
            TypeKind::String => IlType::Pointer(PointeeWidth::Byte),
            TypeKind::Array { element, size } => IlType::Array {
                element: Box::new(IlType::from_type_info(element)),
                size: size.unwrap_or(0),
            },
            TypeKind::Callback { .. } => IlType::Pointer(PointeeWidth::Word),
            TypeKind::Unknown => IlType::Byte,
        }
    }
}

impl fmt::Display for IlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IlType::Void => f.write_str("void"),
            IlType::Byte => f.write_str("byte"),
            IlType::Word => f.write_str("word"),
            IlType::Bool => f.write_str("bool"),
            IlType::Pointer(PointeeWidth::Byte) => f.write_str("ptr8"),
            IlType::Pointer(PointeeWidth::Word) => f.write_str("ptr16"),
            IlType::Array { element, size } => write!(f, "{element}[{size}]"),
        }
    }
}
