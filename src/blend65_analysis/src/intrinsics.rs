//! Built-in operations with no user-written body. The registry is built
//! once per process and is immutable afterwards; the IL generator maps the
//! abstract opcode of each entry onto its own instruction set.

use crate::types::TypeInfo;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicCategory {
    Memory,
    Cpu,
    Stack,
    Optimization,
    Utility,
    CompileTime,
}

/// Abstract operation an intrinsic compiles to. `None` on the definition
/// means the call folds away at IL-generation time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntrinsicOpcode {
    Peek,
    Poke,
    PeekW,
    PokeW,
    Lo,
    Hi,
    Sei,
    Cli,
    Nop,
    Brk,
    Pha,
    Pla,
    Php,
    Plp,
    Barrier,
    VolatileRead,
    VolatileWrite,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntrinsicDefinition {
    pub name: &'static str,
    pub category: IntrinsicCategory,
    pub parameter_types: Vec<TypeInfo>,
    pub return_type: TypeInfo,
    pub opcode: Option<IntrinsicOpcode>,
    pub is_compile_time: bool,
    pub has_side_effects: bool,
    pub is_volatile: bool,
    pub is_barrier: bool,
    /// Documented 6502 cycle count, where one exists for the bare operation.
    pub cycle_count: Option<u8>,
}

impl IntrinsicDefinition {
    /// True when calling this intrinsic makes the caller impure.
    pub fn is_impure(&self) -> bool {
        self.has_side_effects || self.is_volatile
    }
}

#[derive(Debug, Default)]
pub struct IntrinsicRegistry {
    by_name: IndexMap<&'static str, IntrinsicDefinition>,
}

impl IntrinsicRegistry {
    pub fn get(&self, name: &str) -> Option<&IntrinsicDefinition> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IntrinsicDefinition> {
        self.by_name.values()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn add(&mut self, def: IntrinsicDefinition) {
        self.by_name.insert(def.name, def);
    }
}

/// The process-wide registry. Safe to read from multiple threads; never
/// mutated after first use.
pub fn intrinsics() -> &'static IntrinsicRegistry {
    static REGISTRY: OnceLock<IntrinsicRegistry> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

fn build_registry() -> IntrinsicRegistry {
    use IntrinsicCategory::*;
    use IntrinsicOpcode::*;

    fn def(
        name: &'static str,
        category: IntrinsicCategory,
        params: Vec<TypeInfo>,
        ret: TypeInfo,
        opcode: Option<IntrinsicOpcode>,
    ) -> IntrinsicDefinition {
        IntrinsicDefinition {
            name,
            category,
            parameter_types: params,
            return_type: ret,
            opcode,
            is_compile_time: false,
            has_side_effects: false,
            is_volatile: false,
            is_barrier: false,
            cycle_count: None,
        }
    }

    let mut reg = IntrinsicRegistry::default();

    // Memory access. Reads are volatile: hardware registers change behind
    // the compiler's back.
    let mut peek = def("peek", Memory, vec![TypeInfo::word()], TypeInfo::byte(), Some(Peek));
    peek.is_volatile = true;
    reg.add(peek);
    let mut poke = def("poke", Memory, vec![TypeInfo::word(), TypeInfo::byte()], TypeInfo::void(), Some(Poke));
    poke.has_side_effects = true;
    reg.add(poke);
    let mut peekw = def("peekw", Memory, vec![TypeInfo::word()], TypeInfo::word(), Some(PeekW));
    peekw.is_volatile = true;
    reg.add(peekw);
    let mut pokew = def("pokew", Memory, vec![TypeInfo::word(), TypeInfo::word()], TypeInfo::void(), Some(PokeW));
    pokew.has_side_effects = true;
    reg.add(pokew);

    // Pure byte extraction.
    reg.add(def("lo", Utility, vec![TypeInfo::word()], TypeInfo::byte(), Some(Lo)));
    reg.add(def("hi", Utility, vec![TypeInfo::word()], TypeInfo::byte(), Some(Hi)));

    // CPU state. All of these have documented cycle counts.
    for (name, opcode, cycles) in [
        ("sei", Sei, 2u8),
        ("cli", Cli, 2),
        ("nop", Nop, 2),
        ("brk", Brk, 7),
    ] {
        let mut d = def(name, Cpu, vec![], TypeInfo::void(), Some(opcode));
        d.has_side_effects = true;
        d.cycle_count = Some(cycles);
        reg.add(d);
    }

    // Hardware stack.
    let mut pha = def("pha", Stack, vec![TypeInfo::byte()], TypeInfo::void(), Some(Pha));
    pha.has_side_effects = true;
    pha.cycle_count = Some(3);
    reg.add(pha);
    let mut pla = def("pla", Stack, vec![], TypeInfo::byte(), Some(Pla));
    pla.has_side_effects = true;
    pla.cycle_count = Some(4);
    reg.add(pla);
    let mut php = def("php", Stack, vec![], TypeInfo::void(), Some(Php));
    php.has_side_effects = true;
    php.cycle_count = Some(3);
    reg.add(php);
    let mut plp = def("plp", Stack, vec![], TypeInfo::void(), Some(Plp));
    plp.has_side_effects = true;
    plp.cycle_count = Some(4);
    reg.add(plp);

    // Optimization fences.
    let mut barrier = def("barrier", Optimization, vec![], TypeInfo::void(), Some(Barrier));
    barrier.is_barrier = true;
    barrier.has_side_effects = true;
    reg.add(barrier);
    let mut vread = def(
        "volatile_read",
        Optimization,
        vec![TypeInfo::word()],
        TypeInfo::byte(),
        Some(VolatileRead),
    );
    vread.is_volatile = true;
    vread.is_barrier = true;
    reg.add(vread);
    let mut vwrite = def(
        "volatile_write",
        Optimization,
        vec![TypeInfo::word(), TypeInfo::byte()],
        TypeInfo::void(),
        Some(VolatileWrite),
    );
    vwrite.is_volatile = true;
    vwrite.is_barrier = true;
    vwrite.has_side_effects = true;
    reg.add(vwrite);

    // Compile-time only: folded during lowering, no opcode. The parameter
    // accepts any type; the type checker special-cases these.
    let mut sizeof_ = def("sizeof", CompileTime, vec![TypeInfo::unknown()], TypeInfo::word(), None);
    sizeof_.is_compile_time = true;
    reg.add(sizeof_);
    let mut length = def("length", CompileTime, vec![TypeInfo::unknown()], TypeInfo::word(), None);
    length.is_compile_time = true;
    reg.add(length);

    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_the_full_set() {
        let reg = intrinsics();
        for name in [
            "peek", "poke", "peekw", "pokew", "lo", "hi", "sei", "cli", "nop", "brk", "pha",
            "pla", "php", "plp", "barrier", "volatile_read", "volatile_write", "sizeof", "length",
        ] {
            assert!(reg.contains(name), "missing intrinsic {name}");
        }
    }

    #[test]
    fn compile_time_intrinsics_have_no_opcode() {
        let reg = intrinsics();
        assert!(reg.get("sizeof").unwrap().opcode.is_none());
        assert!(reg.get("length").unwrap().opcode.is_none());
        assert!(reg.get("peek").unwrap().opcode.is_some());
    }

    #[test]
    fn only_lo_hi_and_compile_time_are_pure() {
        let reg = intrinsics();
        let pure: Vec<_> = reg.iter().filter(|d| !d.is_impure()).map(|d| d.name).collect();
        assert_eq!(pure, vec!["lo", "hi", "sizeof", "length"]);
    }
}
