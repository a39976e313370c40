use super::coercion::CoercionKind;
use super::{TypeCompatibility, TypeInfo, TypeKind};
use blend65_syntax::ast::{BinaryOperator, TypeExpr, UnaryOperator};
use blend65_syntax::span::SourceLocation;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
#[error("unknown type name `{name}`")]
pub struct UnknownTypeName {
    pub name: String,
    pub location: SourceLocation,
}

/// Type constructors plus the memoized compatibility oracle. One instance
/// per compilation; the cache is never shared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeSystem {
    #[serde(skip)]
    ids: HashMap<String, u16>,
    // Not serialized: the cache is an in-process memo, not part of any report.
    #[serde(skip)]
    cache: HashMap<u32, TypeCompatibility>,
    #[serde(skip)]
    cache_disabled: bool,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in type for a source-level name.
    pub fn builtin(name: &str) -> Option<TypeInfo> {
        match name {
            "byte" => Some(TypeInfo::byte()),
            "word" => Some(TypeInfo::word()),
            "boolean" => Some(TypeInfo::boolean()),
            "void" => Some(TypeInfo::void()),
            "string" => Some(TypeInfo::string()),
            _ => None,
        }
    }

    /// Resolve a textual annotation to a `TypeInfo`.
    pub fn resolve(&mut self, expr: &TypeExpr) -> Result<TypeInfo, UnknownTypeName> {
        match expr {
            TypeExpr::Named(named) => Self::builtin(&named.name).ok_or_else(|| UnknownTypeName {
                name: named.name.clone(),
                location: named.location.clone(),
            }),
            TypeExpr::Array(arr) => {
                let element = self.resolve(&arr.element)?;
                Ok(TypeInfo::array(element, arr.size))
            }
            TypeExpr::Callback(cb) => {
                let mut params = Vec::with_capacity(cb.params.len());
                let mut names = Vec::with_capacity(cb.params.len());
                for p in &cb.params {
                    params.push(self.resolve(&p.ty)?);
                    names.push(p.name.clone());
                }
                let return_type = self.resolve(&cb.return_type)?;
                Ok(TypeInfo::callback(params, names, return_type))
            }
        }
    }

    /// Compatibility of an implicit `from` → `to` conversion, memoized by
    /// interned type-name pair.
    pub fn check_compatibility(&mut self, from: &TypeInfo, to: &TypeInfo) -> TypeCompatibility {
        if let Some(key) = self.cache_key(from, to) {
            if let Some(&hit) = self.cache.get(&key) {
                trace!("compat cache hit: {} -> {}", from.name, to.name);
                return hit;
            }
            let result = self.compute_compatibility(from, to);
            self.cache.insert(key, result);
            return result;
        }
        self.compute_compatibility(from, to)
    }

    fn compute_compatibility(&mut self, from: &TypeInfo, to: &TypeInfo) -> TypeCompatibility {
        if from.name == to.name && std::mem::discriminant(&from.kind) == std::mem::discriminant(&to.kind)
        {
            return TypeCompatibility::Identical;
        }
        match (&from.kind, &to.kind) {
            // Widening is free on load: LDA / LDX #0.
            (TypeKind::Byte, TypeKind::Word) => TypeCompatibility::Compatible,
            // Booleans are stored as 0/1 bytes.
            (TypeKind::Boolean, TypeKind::Byte) | (TypeKind::Byte, TypeKind::Boolean) => {
                TypeCompatibility::Compatible
            }
            (TypeKind::Word, TypeKind::Byte) => TypeCompatibility::RequiresConversion,
            (
                TypeKind::Array { element: from_elem, size: from_size },
                TypeKind::Array { element: to_elem, size: to_size },
            ) => {
                let elements_identical =
                    self.check_compatibility(from_elem, to_elem) == TypeCompatibility::Identical;
                let size_ok = to_size.is_none() || from_size == to_size;
                if elements_identical && size_ok {
                    TypeCompatibility::Compatible
                } else {
                    TypeCompatibility::Incompatible
                }
            }
            (
                TypeKind::Callback { params: from_params, return_type: from_ret, .. },
                TypeKind::Callback { params: to_params, return_type: to_ret, .. },
            ) => {
                if from_params.len() != to_params.len() {
                    return TypeCompatibility::Incompatible;
                }
                // Parameters are contravariant, the return type covariant.
                let params_ok = from_params
                    .iter()
                    .zip(to_params)
                    .all(|(f, t)| self.check_compatibility(t, f).is_implicit());
                let ret_ok = self.check_compatibility(from_ret, to_ret).is_implicit();
                if params_ok && ret_ok {
                    TypeCompatibility::Compatible
                } else {
                    TypeCompatibility::Incompatible
                }
            }
            _ => TypeCompatibility::Incompatible,
        }
    }

    fn cache_key(&mut self, from: &TypeInfo, to: &TypeInfo) -> Option<u32> {
        if self.cache_disabled {
            return None;
        }
        let from_id = self.type_id(&from.name)?;
        let to_id = self.type_id(&to.name)?;
        Some((u32::from(from_id) << 16) | u32::from(to_id))
    }

    fn type_id(&mut self, name: &str) -> Option<u16> {
        if let Some(&id) = self.ids.get(name) {
            return Some(id);
        }
        if self.ids.len() > usize::from(u16::MAX) {
            // More distinct type names than the 16-bit key can hold; give up
            // on memoization rather than hand out colliding keys.
            warn!("type interner exceeded {} names, disabling compatibility cache", u16::MAX);
            self.cache_disabled = true;
            self.cache.clear();
            return None;
        }
        let id = self.ids.len() as u16;
        self.ids.insert(name.to_string(), id);
        Some(id)
    }

    /// Result type of a binary operator over already-validated operands.
    pub fn binary_result_type(op: BinaryOperator, left: &TypeInfo, right: &TypeInfo) -> TypeInfo {
        if op.is_comparison() || op.is_logical() {
            return TypeInfo::boolean();
        }
        // Arithmetic, bitwise and shifts widen to word when either side is.
        if matches!(left.kind, TypeKind::Word) || matches!(right.kind, TypeKind::Word) {
            TypeInfo::word()
        } else {
            TypeInfo::byte()
        }
    }

    /// Result type of a unary operator.
    pub fn unary_result_type(op: UnaryOperator, operand: &TypeInfo) -> TypeInfo {
        match op {
            UnaryOperator::Not => TypeInfo::boolean(),
            UnaryOperator::BitNot | UnaryOperator::Negate => operand.clone(),
            UnaryOperator::AddressOf => TypeInfo::word(),
        }
    }

    /// Which implicit conversion a `from` → `to` site performs, if any rule
    /// covers the pair at all.
    pub fn classify_coercion(from: &TypeInfo, to: &TypeInfo) -> Option<CoercionKind> {
        match (&from.kind, &to.kind) {
            _ if from.name == to.name => Some(CoercionKind::None),
            (TypeKind::Byte, TypeKind::Word) => Some(CoercionKind::ZeroExtend),
            (TypeKind::Word, TypeKind::Byte) => Some(CoercionKind::Truncate),
            (TypeKind::Boolean, TypeKind::Byte) => Some(CoercionKind::BoolToByte),
            (TypeKind::Byte, TypeKind::Boolean) => Some(CoercionKind::ByteToBool),
            (TypeKind::Boolean, TypeKind::Word) => Some(CoercionKind::BoolToWord),
            (TypeKind::Word, TypeKind::Boolean) => Some(CoercionKind::WordToBool),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_is_reflexive() {
        let mut ts = TypeSystem::new();
        for ty in [
            TypeInfo::byte(),
            TypeInfo::word(),
            TypeInfo::boolean(),
            TypeInfo::void(),
            TypeInfo::string(),
            TypeInfo::array(TypeInfo::byte(), Some(8)),
        ] {
            assert_eq!(ts.check_compatibility(&ty, &ty), TypeCompatibility::Identical, "{}", ty);
        }
    }

    #[test]
    fn widening_and_truncation() {
        let mut ts = TypeSystem::new();
        assert_eq!(
            ts.check_compatibility(&TypeInfo::byte(), &TypeInfo::word()),
            TypeCompatibility::Compatible
        );
        assert_eq!(
            ts.check_compatibility(&TypeInfo::word(), &TypeInfo::byte()),
            TypeCompatibility::RequiresConversion
        );
        assert_eq!(
            ts.check_compatibility(&TypeInfo::boolean(), &TypeInfo::byte()),
            TypeCompatibility::Compatible
        );
        assert_eq!(
            ts.check_compatibility(&TypeInfo::string(), &TypeInfo::word()),
            TypeCompatibility::Incompatible
        );
    }

    #[test]
    fn arrays_need_identical_elements_and_matching_size() {
        let mut ts = TypeSystem::new();
        let sized = TypeInfo::array(TypeInfo::byte(), Some(8));
        let unsized_ = TypeInfo::array(TypeInfo::byte(), None);
        let other_len = TypeInfo::array(TypeInfo::byte(), Some(4));
        let words = TypeInfo::array(TypeInfo::word(), Some(8));
        assert_eq!(ts.check_compatibility(&sized, &unsized_), TypeCompatibility::Compatible);
        assert_eq!(ts.check_compatibility(&sized, &other_len), TypeCompatibility::Incompatible);
        assert_eq!(ts.check_compatibility(&sized, &words), TypeCompatibility::Incompatible);
    }

    #[test]
    fn callbacks_are_contravariant_in_params_covariant_in_return() {
        let mut ts = TypeSystem::new();
        // (word) -> byte can stand in where (byte) -> word is expected:
        // the param accepts more, the return gives less.
        let provided = TypeInfo::callback(vec![TypeInfo::word()], vec!["a".into()], TypeInfo::byte());
        let expected = TypeInfo::callback(vec![TypeInfo::byte()], vec!["a".into()], TypeInfo::word());
        assert_eq!(ts.check_compatibility(&provided, &expected), TypeCompatibility::Compatible);
        assert_eq!(ts.check_compatibility(&expected, &provided), TypeCompatibility::Incompatible);
    }

    #[test]
    fn second_lookup_hits_the_cache() {
        let mut ts = TypeSystem::new();
        let first = ts.check_compatibility(&TypeInfo::byte(), &TypeInfo::word());
        let second = ts.check_compatibility(&TypeInfo::byte(), &TypeInfo::word());
        assert_eq!(first, second);
        assert_eq!(ts.cache.len(), 1);
    }

    #[test]
    fn result_types_follow_the_widening_rule() {
        let byte = TypeInfo::byte();
        let word = TypeInfo::word();
        assert_eq!(TypeSystem::binary_result_type(BinaryOperator::Add, &byte, &byte).name, "byte");
        assert_eq!(TypeSystem::binary_result_type(BinaryOperator::Add, &byte, &word).name, "word");
        assert_eq!(
            TypeSystem::binary_result_type(BinaryOperator::Less, &word, &word).name,
            "boolean"
        );
        assert_eq!(TypeSystem::unary_result_type(UnaryOperator::AddressOf, &byte).name, "word");
        assert_eq!(TypeSystem::unary_result_type(UnaryOperator::BitNot, &word).name, "word");
    }
}
