use crate::error::{IlError, IlResult};
use crate::ids::{BlockId, TempId};
use crate::instr::IlInstruction;
use crate::module::{IlBlock, IlFunction, IlModule, IlParam};
use crate::types::IlType;
use std::collections::HashMap;

/// Accumulates a module: globals and maps first, then functions.
#[derive(Debug, Default)]
pub struct IlModuleBuilder {
    module: IlModule,
}

impl IlModuleBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { module: IlModule { name: name.into(), ..IlModule::default() } }
    }

    pub fn set_entry_point(&mut self, name: impl Into<String>) {
        self.module.entry_point = Some(name.into());
    }

    pub fn module_mut(&mut self) -> &mut IlModule {
        &mut self.module
    }

    pub fn push_function(&mut self, function: IlFunction) {
        self.module.functions.push(function);
    }

    pub fn build(self) -> IlModule {
        self.module
    }
}

/// Builds one function: hands out block and temp ids, appends
/// instructions by block.
#[derive(Debug)]
pub struct IlFunctionBuilder {
    name: String,
    params: Vec<IlParam>,
    return_type: IlType,
    is_exported: bool,
    blocks: Vec<IlBlock>,
    block_index: HashMap<BlockId, usize>,
    next_block: u32,
    next_temp: u32,
}

impl IlFunctionBuilder {
    pub fn new(name: impl Into<String>, params: Vec<IlParam>, return_type: IlType) -> Self {
        let mut builder = Self {
            name: name.into(),
            params,
            return_type,
            is_exported: false,
            blocks: Vec::new(),
            block_index: HashMap::new(),
            next_block: 0,
            next_temp: 0,
        };
        // The entry block always exists and always comes first.
        builder.new_block();
        builder
    }

    pub fn exported(mut self) -> Self {
        self.is_exported = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.block_index.insert(id, self.blocks.len());
        self.blocks.push(IlBlock { id, instructions: Vec::new() });
        id
    }

    pub fn new_temp(&mut self) -> TempId {
        let id = TempId(self.next_temp);
        self.next_temp += 1;
        id
    }

    pub fn append(&mut self, block: BlockId, instruction: IlInstruction) -> IlResult<()> {
        let index =
            *self.block_index.get(&block).ok_or(IlError::UnknownBlockTarget(block))?;
        self.blocks[index].instructions.push(instruction);
        Ok(())
    }

    /// Whether a block already ends in a terminator.
    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.block_index
            .get(&block)
            .and_then(|&i| self.blocks[i].instructions.last())
            .map(|i| i.is_terminator())
            .unwrap_or(false)
    }

    pub fn build(self) -> IlFunction {
        IlFunction {
            name: self.name,
            params: self.params,
            return_type: self.return_type,
            blocks: self.blocks,
            temp_count: self.next_temp,
            is_exported: self.is_exported,
        }
    }
}
