//! Level-parameterized pass manager. Every pass maps a module to a module
//! and must leave the block invariants intact; the manager re-verifies
//! after each pass and reports violations as internal diagnostics.

use crate::ids::BlockId;
use crate::instr::{Opcode, Operand};
use crate::module::{IlFunction, IlModule};
use crate::verify::IlVerifier;
use blend65_analysis::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use blend65_analysis::options::OptimizationLevel;
use log::debug;
use std::collections::{HashMap, HashSet, VecDeque};

type Pass = (&'static str, fn(&mut IlFunction) -> bool);

fn passes_for(level: OptimizationLevel) -> &'static [Pass] {
    const BASIC: &[Pass] = &[("branch-simplify", branch_simplify)];
    const SPEED: &[Pass] = &[
        ("branch-simplify", branch_simplify),
        ("jump-threading", thread_jumps),
        ("dead-blocks", remove_unreachable_blocks),
    ];
    const SIZE: &[Pass] = &[
        ("branch-simplify", branch_simplify),
        ("dead-blocks", remove_unreachable_blocks),
    ];
    match level {
        OptimizationLevel::O0 => &[],
        OptimizationLevel::O1 => BASIC,
        OptimizationLevel::O2 | OptimizationLevel::O3 => SPEED,
        OptimizationLevel::Os | OptimizationLevel::Oz => SIZE,
    }
}

pub struct Optimizer {
    level: OptimizationLevel,
}

impl Optimizer {
    pub fn new(level: OptimizationLevel) -> Self {
        Self { level }
    }

    /// Run the level's pass sequence. `O0` only validates.
    pub fn optimize(&self, mut module: IlModule) -> (IlModule, DiagnosticCollection) {
        let mut diagnostics = DiagnosticCollection::new();
        if let Err(err) = IlVerifier::verify_module(&module) {
            diagnostics.add(Diagnostic::error(
                DiagnosticCode::InternalError,
                format!("IL failed validation before optimization: {err}"),
            ));
            return (module, diagnostics);
        }
        for &(name, pass) in passes_for(self.level) {
            let mut changed = false;
            for function in &mut module.functions {
                changed |= pass(function);
            }
            debug!("optimizer pass `{name}` ({}): changed={changed}", self.level);
            if let Err(err) = IlVerifier::verify_module(&module) {
                diagnostics.add(Diagnostic::error(
                    DiagnosticCode::InternalError,
                    format!("optimizer pass `{name}` broke IL invariants: {err}"),
                ));
                break;
            }
        }
        (module, diagnostics)
    }
}

/// `BRANCH #const, a, b` decides at compile time; rewrite to a plain jump.
fn branch_simplify(function: &mut IlFunction) -> bool {
    let mut changed = false;
    for block in &mut function.blocks {
        let Some(last) = block.instructions.last_mut() else { continue };
        if last.opcode != Opcode::Branch {
            continue;
        }
        let Some(condition) = last.operands.first().and_then(Operand::as_imm) else { continue };
        let target_index = if condition != 0 { 1 } else { 2 };
        let Some(target) = last.operands.get(target_index).cloned() else { continue };
        last.opcode = Opcode::Jump;
        last.operands = vec![target];
        changed = true;
    }
    changed
}

/// A block whose only instruction is `JUMP b` adds nothing; point its
/// predecessors straight at `b`. Chains resolve transitively; cycles of
/// trivial jumps are left alone.
fn thread_jumps(function: &mut IlFunction) -> bool {
    let mut trivial: HashMap<BlockId, BlockId> = HashMap::new();
    for block in &function.blocks {
        if block.instructions.len() == 1 {
            if let Some(target) = block
                .instructions
                .first()
                .filter(|i| i.opcode == Opcode::Jump)
                .and_then(|i| i.operands.first())
                .and_then(Operand::as_block)
            {
                if target != block.id {
                    trivial.insert(block.id, target);
                }
            }
        }
    }
    let resolve = |mut id: BlockId| -> BlockId {
        let mut seen = HashSet::new();
        while let Some(&next) = trivial.get(&id) {
            if !seen.insert(id) {
                break;
            }
            id = next;
        }
        id
    };
    let mut changed = false;
    for block in &mut function.blocks {
        for instruction in &mut block.instructions {
            for operand in &mut instruction.operands {
                if let Operand::Block(target) = operand {
                    let resolved = resolve(*target);
                    if resolved != *target {
                        *operand = Operand::Block(resolved);
                        changed = true;
                    }
                }
            }
        }
    }
    changed
}

/// Drop blocks unreachable from the entry block. The entry itself always
/// stays.
fn remove_unreachable_blocks(function: &mut IlFunction) -> bool {
    let Some(entry) = function.blocks.first().map(|b| b.id) else { return false };
    let by_id: HashMap<BlockId, usize> =
        function.blocks.iter().enumerate().map(|(i, b)| (b.id, i)).collect();
    let mut reachable: HashSet<BlockId> = HashSet::new();
    let mut queue = VecDeque::from([entry]);
    reachable.insert(entry);
    while let Some(id) = queue.pop_front() {
        let Some(&index) = by_id.get(&id) else { continue };
        for instruction in &function.blocks[index].instructions {
            for target in instruction.block_targets() {
                if reachable.insert(target) {
                    queue.push_back(target);
                }
            }
        }
    }
    let before = function.blocks.len();
    function.blocks.retain(|b| reachable.contains(&b.id));
    before != function.blocks.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IlFunctionBuilder;
    use crate::instr::IlInstruction;
    use crate::types::IlType;
    use blend65_syntax::span::SourceLocation;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    fn constant_branch_function() -> IlFunction {
        let mut b = IlFunctionBuilder::new("f", vec![], IlType::Void);
        let entry = b.entry();
        let taken = b.new_block();
        let skipped = b.new_block();
        b.append(
            entry,
            IlInstruction::new(
                Opcode::Branch,
                vec![
                    Operand::imm(1, IlType::Bool),
                    Operand::Block(taken),
                    Operand::Block(skipped),
                ],
                loc(),
            ),
        )
        .unwrap();
        b.append(taken, IlInstruction::new(Opcode::Return, vec![], loc())).unwrap();
        b.append(skipped, IlInstruction::new(Opcode::Return, vec![], loc())).unwrap();
        b.build()
    }

    #[test]
    fn constant_branch_becomes_jump() {
        let mut function = constant_branch_function();
        assert!(branch_simplify(&mut function));
        let terminator = function.blocks[0].terminator().unwrap();
        assert_eq!(terminator.opcode, Opcode::Jump);
        assert_eq!(terminator.operands.len(), 1);
    }

    #[test]
    fn unreachable_block_is_removed_after_simplification() {
        let mut function = constant_branch_function();
        branch_simplify(&mut function);
        assert!(remove_unreachable_blocks(&mut function));
        assert_eq!(function.blocks.len(), 2);
        assert!(IlVerifier::verify_function(&function).is_ok());
    }

    #[test]
    fn o0_only_validates() {
        let module = IlModule {
            name: "t".into(),
            functions: vec![constant_branch_function()],
            ..IlModule::default()
        };
        let optimizer = Optimizer::new(OptimizationLevel::O0);
        let (out, diagnostics) = optimizer.optimize(module.clone());
        assert!(diagnostics.is_empty());
        assert_eq!(out, module);
    }
}
