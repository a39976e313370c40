//! Which 6502 register a variable wants. A hint for the allocator, never a
//! promise.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredRegister {
    A,
    X,
    Y,
    Any,
}

impl fmt::Display for PreferredRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreferredRegister::A => "A",
            PreferredRegister::X => "X",
            PreferredRegister::Y => "Y",
            PreferredRegister::Any => "any",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterHintFlags {
    pub is_loop_counter: bool,
    pub is_array_index: bool,
    pub uses_indirect_access: bool,
    pub loop_depth: u32,
}

/// Rule order matters: indirect addressing only works through Y, array
/// indexing favors X, inner loop counters keep X free for indexing.
pub fn preferred_register(flags: RegisterHintFlags) -> PreferredRegister {
    if flags.uses_indirect_access {
        return PreferredRegister::Y;
    }
    if flags.is_array_index {
        return PreferredRegister::X;
    }
    if flags.is_loop_counter {
        return if flags.loop_depth > 1 { PreferredRegister::Y } else { PreferredRegister::X };
    }
    PreferredRegister::A
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_order_is_indirect_then_index_then_counter() {
        let indirect = RegisterHintFlags { uses_indirect_access: true, is_array_index: true, ..Default::default() };
        assert_eq!(preferred_register(indirect), PreferredRegister::Y);

        let index = RegisterHintFlags { is_array_index: true, is_loop_counter: true, ..Default::default() };
        assert_eq!(preferred_register(index), PreferredRegister::X);

        let outer = RegisterHintFlags { is_loop_counter: true, loop_depth: 1, ..Default::default() };
        assert_eq!(preferred_register(outer), PreferredRegister::X);

        let inner = RegisterHintFlags { is_loop_counter: true, loop_depth: 2, ..Default::default() };
        assert_eq!(preferred_register(inner), PreferredRegister::Y);

        assert_eq!(preferred_register(RegisterHintFlags::default()), PreferredRegister::A);
    }
}
