use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an implicit conversion site. The cycle cost is a seed
/// for later register-allocation decisions, not a promise about emitted code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoercionKind {
    None,
    ZeroExtend,
    Truncate,
    BoolToByte,
    ByteToBool,
    BoolToWord,
    WordToBool,
}

impl CoercionKind {
    /// Estimated 6502 cycle cost of performing the conversion.
    pub fn cycle_cost(self) -> u8 {
        match self {
            CoercionKind::None => 0,
            CoercionKind::ZeroExtend => 4,
            CoercionKind::Truncate => 2,
            CoercionKind::BoolToByte => 0,
            CoercionKind::ByteToBool => 4,
            CoercionKind::BoolToWord => 4,
            CoercionKind::WordToBool => 6,
        }
    }

    pub fn is_lossy(self) -> bool {
        matches!(self, CoercionKind::Truncate | CoercionKind::WordToBool)
    }
}

impl fmt::Display for CoercionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoercionKind::None => "none",
            CoercionKind::ZeroExtend => "zero-extend",
            CoercionKind::Truncate => "truncate",
            CoercionKind::BoolToByte => "bool-to-byte",
            CoercionKind::ByteToBool => "byte-to-bool",
            CoercionKind::BoolToWord => "bool-to-word",
            CoercionKind::WordToBool => "word-to-bool",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_costs_match_the_table() {
        let table = [
            (CoercionKind::None, 0),
            (CoercionKind::ZeroExtend, 4),
            (CoercionKind::Truncate, 2),
            (CoercionKind::BoolToByte, 0),
            (CoercionKind::ByteToBool, 4),
            (CoercionKind::BoolToWord, 4),
            (CoercionKind::WordToBool, 6),
        ];
        for (kind, cost) in table {
            assert_eq!(kind.cycle_cost(), cost);
        }
    }
}
