//! AST-to-IL lowering. Consumes the analyzer's annotated output: expression
//! types, identifier resolutions, and the symbol table.

mod expr;
mod stmt;

use crate::builder::{IlFunctionBuilder, IlModuleBuilder};
use crate::error::{IlError, IlResult};
use crate::ids::BlockId;
use crate::module::{IlGlobal, IlMapEntry, IlModule, IlParam, IlString};
use crate::types::IlType;
use crate::verify::IlVerifier;
use blend65_analysis::analyzer::AnalysisResult;
use blend65_analysis::symbols::{SymbolId, SymbolKind};
use blend65_syntax::ast::{Expression, FunctionDecl, Item, NodeId, Program};
use log::debug;
use std::collections::HashMap;

pub struct IlGenerator;

impl IlGenerator {
    /// Lower a fully-analyzed program. The analysis must have succeeded;
    /// lowering failures beyond that point are internal errors.
    pub fn generate(program: &Program, analysis: &AnalysisResult) -> IlResult<IlModule> {
        let mut builder = IlModuleBuilder::new(program.module.name.clone());
        let mut strings = StringTable::default();

        for item in &program.items {
            match item {
                Item::Variable(decl) => {
                    let ty = symbol_il_type(analysis, decl.id);
                    let initial_value = decl.initializer.as_ref().and_then(fold_literal);
                    builder.module_mut().globals.push(IlGlobal {
                        name: decl.name.clone(),
                        ty,
                        initial_value,
                        is_const: decl.is_const,
                    });
                }
                Item::Map(decl) => {
                    let ty = symbol_il_type(analysis, decl.id);
                    builder.module_mut().maps.push(IlMapEntry {
                        name: decl.name.clone(),
                        address: decl.address,
                        ty,
                    });
                }
                Item::Import(_) | Item::Function(_) => {}
            }
        }

        let map_addresses: HashMap<NodeId, u16> = program
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Map(decl) => Some((decl.id, decl.address)),
                _ => None,
            })
            .collect();

        for item in &program.items {
            if let Item::Function(decl) = item {
                let function =
                    FunctionLowering::new(decl, analysis, &mut strings, &map_addresses).lower(decl)?;
                builder.push_function(function);
            }
        }

        builder.module_mut().strings = strings.items;
        if builder.module_mut().function("main").is_some() {
            builder.set_entry_point("main");
        }
        let module = builder.build();
        IlVerifier::verify_module(&module)?;
        debug!(
            "lowered module `{}`: {} functions, {} globals",
            module.name,
            module.functions.len(),
            module.globals.len()
        );
        Ok(module)
    }
}

fn symbol_il_type(analysis: &AnalysisResult, declaration: NodeId) -> IlType {
    analysis
        .symbol_table
        .symbol_for_declaration(declaration)
        .and_then(|id| analysis.symbol_table.symbol(id).type_info.as_ref())
        .map(IlType::from_type_info)
        .unwrap_or(IlType::Byte)
}

fn fold_literal(expr: &Expression) -> Option<i64> {
    match expr {
        Expression::Number(n) => Some(i64::from(n.value)),
        Expression::Bool(b) => Some(i64::from(b.value)),
        _ => None,
    }
}

#[derive(Debug, Default)]
pub(crate) struct StringTable {
    items: Vec<IlString>,
}

impl StringTable {
    /// Intern a literal, reusing an existing label for identical text.
    pub(crate) fn intern(&mut self, value: &str) -> String {
        if let Some(existing) = self.items.iter().find(|s| s.value == value) {
            return existing.label.clone();
        }
        let label = format!("str_{}", self.items.len());
        self.items.push(IlString { label: label.clone(), value: value.to_string() });
        label
    }
}

/// Where an identifier's storage lives.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Place {
    Local(String),
    Global(String),
    Param(usize),
    Map { address: u16, ty: IlType },
    FunctionRef(String),
}

struct LoopBlocks {
    continue_target: BlockId,
    break_target: BlockId,
}

pub(crate) struct FunctionLowering<'a> {
    analysis: &'a AnalysisResult,
    strings: &'a mut StringTable,
    map_addresses: &'a HashMap<NodeId, u16>,
    pub(crate) func: IlFunctionBuilder,
    pub(crate) current: BlockId,
    /// Control flow left the current block (return/break/continue). The
    /// next emitted instruction opens a fresh block lazily, so statements
    /// that never come produce no synthetic dead blocks.
    diverged: bool,
    loops: Vec<LoopBlocks>,
    param_indices: HashMap<SymbolId, usize>,
    pub(crate) return_type: IlType,
}

impl<'a> FunctionLowering<'a> {
    fn new(
        decl: &FunctionDecl,
        analysis: &'a AnalysisResult,
        strings: &'a mut StringTable,
        map_addresses: &'a HashMap<NodeId, u16>,
    ) -> Self {
        let mut params = Vec::with_capacity(decl.params.len());
        let mut param_indices = HashMap::new();
        for (index, param) in decl.params.iter().enumerate() {
            params.push(IlParam {
                name: param.name.clone(),
                ty: symbol_il_type(analysis, param.id),
            });
            if let Some(id) = analysis.symbol_table.symbol_for_declaration(param.id) {
                param_indices.insert(id, index);
            }
        }
        let return_type = analysis
            .symbol_table
            .symbol_for_declaration(decl.id)
            .and_then(|id| analysis.symbol_table.symbol(id).type_info.as_ref())
            .map(|ty| match &ty.kind {
                blend65_analysis::types::TypeKind::Callback { return_type, .. } => {
                    IlType::from_type_info(return_type)
                }
                _ => IlType::Void,
            })
            .unwrap_or(IlType::Void);
        let func = IlFunctionBuilder::new(decl.name.clone(), params, return_type.clone());
        let mut lowering = Self {
            analysis,
            strings,
            map_addresses,
            current: BlockId(0),
            diverged: false,
            func,
            loops: Vec::new(),
            param_indices,
            return_type,
        };
        lowering.current = lowering.func.entry();
        lowering
    }

    fn lower(mut self, decl: &FunctionDecl) -> IlResult<crate::module::IlFunction> {
        let exported = decl.is_exported;
        self.lower_statements(&decl.body)?;
        self.finish_open_block()?;
        let mut function = self.func.build();
        function.is_exported = exported;
        Ok(function)
    }

    /// Intern a string literal for this module.
    pub(crate) fn intern_string(&mut self, value: &str) -> String {
        self.strings.intern(value)
    }

    pub(crate) fn analysis(&self) -> &AnalysisResult {
        self.analysis
    }

    /// The IL type the checker computed for an expression.
    pub(crate) fn expr_il_type(&self, expr: &Expression) -> IlType {
        self.il_type_of(expr.id())
    }

    pub(crate) fn il_type_of(&self, node: NodeId) -> IlType {
        self.analysis
            .expr_types
            .get(&node)
            .map(IlType::from_type_info)
            .unwrap_or(IlType::Byte)
    }

    /// Resolve an identifier node to its storage place.
    pub(crate) fn place_of(&self, node: NodeId) -> Option<Place> {
        let &symbol_id = self.analysis.symbol_refs.get(&node)?;
        let symbol = self.analysis.symbol_table.symbol(symbol_id);
        let ty = symbol.type_info.as_ref().map(IlType::from_type_info).unwrap_or(IlType::Byte);
        match symbol.kind {
            SymbolKind::Parameter => self.param_indices.get(&symbol_id).map(|&i| Place::Param(i)),
            SymbolKind::Function => Some(Place::FunctionRef(symbol.name.clone())),
            SymbolKind::MapVariable => {
                let address = self.map_address(&symbol.name)?;
                Some(Place::Map { address, ty })
            }
            SymbolKind::ImportedSymbol => Some(Place::Global(symbol.name.clone())),
            SymbolKind::Variable | SymbolKind::Intrinsic => {
                if symbol.scope == self.analysis.symbol_table.root_scope() {
                    Some(Place::Global(symbol.name.clone()))
                } else {
                    // Locals are qualified by symbol id so shadowed names
                    // get distinct static slots.
                    Some(Place::Local(format!("{}_{}", symbol.name, symbol_id.0)))
                }
            }
        }
    }

    fn map_address(&self, name: &str) -> Option<u16> {
        let id = self
            .analysis
            .symbol_table
            .lookup_from(self.analysis.symbol_table.root_scope(), name)?;
        let symbol = self.analysis.symbol_table.symbol(id);
        self.map_addresses.get(&symbol.declaration).copied()
    }

    fn finish_open_block(&mut self) -> IlResult<()> {
        if !self.diverged && !self.func.is_terminated(self.current) {
            // Void functions may fall off the end; the analyzer already
            // rejected non-void fall-through.
            let instr = crate::instr::IlInstruction::new(
                crate::instr::Opcode::Return,
                vec![],
                Default::default(),
            );
            self.func.append(self.current, instr)?;
        }
        Ok(())
    }

    /// Make a block current and resume emitting into it.
    pub(crate) fn switch_to(&mut self, block: BlockId) {
        self.current = block;
        self.diverged = false;
    }

    /// Control has left the current block; anything lowered next is
    /// unreachable source and gets its own block on demand.
    pub(crate) fn mark_diverged(&mut self) {
        self.diverged = true;
    }

    pub(crate) fn has_diverged(&self) -> bool {
        self.diverged
    }

    /// The block the next instruction belongs in, opening one lazily after
    /// a divergence.
    pub(crate) fn ensure_block(&mut self) -> BlockId {
        if self.diverged {
            self.current = self.func.new_block();
            self.diverged = false;
        }
        self.current
    }

    pub(crate) fn push_loop(&mut self, continue_target: BlockId, break_target: BlockId) {
        self.loops.push(LoopBlocks { continue_target, break_target });
    }

    pub(crate) fn pop_loop(&mut self) {
        self.loops.pop();
    }

    pub(crate) fn current_loop(&self) -> Option<(BlockId, BlockId)> {
        self.loops.last().map(|l| (l.continue_target, l.break_target))
    }

    pub(crate) fn unsupported(&self, what: &str, why: &str) -> IlError {
        IlError::Unsupported(what.to_string(), why.to_string())
    }
}
