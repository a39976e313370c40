use crate::ids::{BlockId, TempId};
use crate::types::IlType;
use blend65_syntax::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The opcode set, sized for a compile-time-register-allocated 6502
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    // Bitwise
    And,
    Or,
    Xor,
    Not,
    Shl,
    Shr,
    // Comparison
    CmpEq,
    CmpNe,
    CmpLt,
    CmpLe,
    CmpGt,
    CmpGe,
    // Logical
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    // Memory
    Load,
    Store,
    LoadGlobal,
    StoreGlobal,
    LoadParam,
    StoreParam,
    Index,
    // Control
    Jump,
    Branch,
    Call,
    Return,
    // 6502 memory intrinsics
    IntrinsicPeek,
    IntrinsicPoke,
    IntrinsicPeekW,
    IntrinsicPokeW,
    IntrinsicLo,
    IntrinsicHi,
    // CPU intrinsics
    CpuSei,
    CpuCli,
    CpuNop,
    CpuBrk,
    CpuPha,
    CpuPla,
    CpuPhp,
    CpuPlp,
    // Optimization fences
    OptBarrier,
    VolatileRead,
    VolatileWrite,
}

impl Opcode {
    pub fn is_terminator(self) -> bool {
        matches!(self, Opcode::Jump | Opcode::Branch | Opcode::Return)
    }

    /// Instructions the optimizer must never remove or reorder across.
    pub fn is_fence(self) -> bool {
        matches!(self, Opcode::OptBarrier | Opcode::VolatileRead | Opcode::VolatileWrite)
    }

    pub fn has_side_effects(self) -> bool {
        matches!(
            self,
            Opcode::Store
                | Opcode::StoreGlobal
                | Opcode::StoreParam
                | Opcode::Call
                | Opcode::IntrinsicPoke
                | Opcode::IntrinsicPokeW
                | Opcode::CpuSei
                | Opcode::CpuCli
                | Opcode::CpuBrk
                | Opcode::CpuPha
                | Opcode::CpuPla
                | Opcode::CpuPhp
                | Opcode::CpuPlp
                | Opcode::OptBarrier
                | Opcode::VolatileRead
                | Opcode::VolatileWrite
        ) || self.is_terminator()
    }
}

/// One operand of an instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A virtual register.
    Temp(TempId),
    /// A typed constant.
    Imm { value: i64, ty: IlType },
    /// A link-time symbol address (variable, function, string label).
    Symbol(String),
    /// A basic-block label.
    Block(BlockId),
}

impl Operand {
    pub fn imm(value: i64, ty: IlType) -> Operand {
        Operand::Imm { value, ty }
    }

    pub fn as_imm(&self) -> Option<i64> {
        match self {
            Operand::Imm { value, .. } => Some(*value),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<BlockId> {
        match self {
            Operand::Block(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Temp(t) => write!(f, "{t}"),
            Operand::Imm { value, ty } => write!(f, "#{value}:{ty}"),
            Operand::Symbol(name) => write!(f, "@{name}"),
            Operand::Block(b) => write!(f, "{b}"),
        }
    }
}

/// Per-instruction flags the optimizer honors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructionMeta {
    pub is_volatile: bool,
    pub is_barrier: bool,
}

/// A single three-address instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlInstruction {
    pub opcode: Opcode,
    pub operands: Vec<Operand>,
    pub result: Option<TempId>,
    pub ty: Option<IlType>,
    pub location: SourceLocation,
    pub meta: InstructionMeta,
}

impl IlInstruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>, location: SourceLocation) -> Self {
        Self { opcode, operands, result: None, ty: None, location, meta: InstructionMeta::default() }
    }

    pub fn with_result(mut self, result: TempId, ty: IlType) -> Self {
        self.result = Some(result);
        self.ty = Some(ty);
        self
    }

    pub fn with_type(mut self, ty: IlType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn volatile(mut self) -> Self {
        self.meta.is_volatile = true;
        self
    }

    pub fn barrier(mut self) -> Self {
        self.meta.is_barrier = true;
        self
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }

    /// Block targets this instruction can jump to.
    pub fn block_targets(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.operands.iter().filter_map(Operand::as_block)
    }
}

impl fmt::Display for IlInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{result} = ")?;
        }
        write!(f, "{:?}", self.opcode)?;
        for (i, op) in self.operands.iter().enumerate() {
            if i == 0 {
                write!(f, " {op}")?;
            } else {
                write!(f, ", {op}")?;
            }
        }
        Ok(())
    }
}
