use crate::ids::BlockId;
use crate::instr::IlInstruction;
use crate::types::IlType;
use serde::{Deserialize, Serialize};

/// A straight-line instruction sequence ending in exactly one terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlBlock {
    pub id: BlockId,
    pub instructions: Vec<IlInstruction>,
}

impl IlBlock {
    pub fn terminator(&self) -> Option<&IlInstruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlParam {
    pub name: String,
    pub ty: IlType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlFunction {
    pub name: String,
    pub params: Vec<IlParam>,
    pub return_type: IlType,
    /// The first block is the entry block.
    pub blocks: Vec<IlBlock>,
    pub temp_count: u32,
    pub is_exported: bool,
}

impl IlFunction {
    pub fn entry_block(&self) -> Option<&IlBlock> {
        self.blocks.first()
    }

    pub fn block(&self, id: BlockId) -> Option<&IlBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn instruction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instructions.len()).sum()
    }
}

/// A module-scope variable with statically-allocated storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlGlobal {
    pub name: String,
    pub ty: IlType,
    /// Compile-time-known initial value, when the initializer folded.
    pub initial_value: Option<i64>,
    pub is_const: bool,
}

/// A hardware overlay the emitter turns into an absolute label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlMapEntry {
    pub name: String,
    pub address: u16,
    pub ty: IlType,
}

/// An interned string literal and its data label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IlString {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IlModule {
    pub name: String,
    pub entry_point: Option<String>,
    pub globals: Vec<IlGlobal>,
    pub maps: Vec<IlMapEntry>,
    pub strings: Vec<IlString>,
    pub functions: Vec<IlFunction>,
}

impl IlModule {
    pub fn function(&self, name: &str) -> Option<&IlFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn global(&self, name: &str) -> Option<&IlGlobal> {
        self.globals.iter().find(|g| g.name == name)
    }
}
