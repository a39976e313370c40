use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Closed set of per-node facts the optimization passes may attach.
/// Every pass appends under its own keys; no pass rewrites another's.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptimizationMetadataKey {
    ComplexityScore,
    RegisterPressure,
    CoercionKind,
    CoercionCost,
    ZeroPagePriority,
    RegisterHint,
    Pure,
    HotPathAccesses,
    LoopDepth,
}

/// Value attached under a metadata key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    Int(i64),
    Bool(bool),
    Text(String),
}

impl MetadataValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetadataValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// Typed metadata map for one AST node. BTreeMap keeps iteration
/// deterministic for serialized output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataMap {
    entries: BTreeMap<OptimizationMetadataKey, MetadataValue>,
}

impl MetadataMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fact. A pass never overwrites a key some other pass wrote;
    /// repeated inserts of the same key are a programming error.
    pub fn insert(&mut self, key: OptimizationMetadataKey, value: MetadataValue) {
        let previous = self.entries.insert(key, value);
        debug_assert!(previous.is_none(), "metadata key {key:?} written twice");
    }

    pub fn get(&self, key: OptimizationMetadataKey) -> Option<&MetadataValue> {
        self.entries.get(&key)
    }

    pub fn contains(&self, key: OptimizationMetadataKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (OptimizationMetadataKey, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_read_back() {
        let mut map = MetadataMap::new();
        map.insert(OptimizationMetadataKey::ComplexityScore, MetadataValue::Int(42));
        map.insert(OptimizationMetadataKey::Pure, MetadataValue::Bool(true));
        assert_eq!(map.get(OptimizationMetadataKey::ComplexityScore).unwrap().as_int(), Some(42));
        assert_eq!(map.get(OptimizationMetadataKey::Pure).unwrap().as_bool(), Some(true));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn iteration_order_is_stable() {
        let mut map = MetadataMap::new();
        map.insert(OptimizationMetadataKey::RegisterHint, MetadataValue::Text("X".into()));
        map.insert(OptimizationMetadataKey::ComplexityScore, MetadataValue::Int(1));
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                OptimizationMetadataKey::ComplexityScore,
                OptimizationMetadataKey::RegisterHint,
            ]
        );
    }
}
