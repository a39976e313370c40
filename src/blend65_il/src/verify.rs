//! Structural invariants every pass must preserve: exactly one terminator
//! per block, at the end; unique block ids; all jump targets resolve.

use crate::error::{IlError, IlResult};
use crate::module::{IlFunction, IlModule};
use std::collections::HashSet;

pub struct IlVerifier;

impl IlVerifier {
    pub fn verify_module(module: &IlModule) -> IlResult<()> {
        for function in &module.functions {
            Self::verify_function(function)?;
        }
        Ok(())
    }

    pub fn verify_function(function: &IlFunction) -> IlResult<()> {
        if function.blocks.is_empty() {
            return Err(IlError::EmptyFunction(function.name.clone()));
        }
        let mut ids = HashSet::new();
        for block in &function.blocks {
            if !ids.insert(block.id) {
                return Err(IlError::DuplicateBlockId(block.id));
            }
        }
        for block in &function.blocks {
            let Some(last) = block.instructions.last() else {
                return Err(IlError::MissingTerminator(block.id));
            };
            if !last.is_terminator() {
                return Err(IlError::MissingTerminator(block.id));
            }
            for instruction in &block.instructions[..block.instructions.len() - 1] {
                if instruction.is_terminator() {
                    return Err(IlError::EarlyTerminator(block.id));
                }
            }
            for instruction in &block.instructions {
                for target in instruction.block_targets() {
                    if !ids.contains(&target) {
                        return Err(IlError::UnknownBlockTarget(target));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IlFunctionBuilder;
    use crate::instr::{IlInstruction, Opcode, Operand};
    use crate::types::IlType;
    use blend65_syntax::span::SourceLocation;

    fn loc() -> SourceLocation {
        SourceLocation::default()
    }

    #[test]
    fn terminated_single_block_verifies() {
        let mut b = IlFunctionBuilder::new("f", vec![], IlType::Void);
        let entry = b.entry();
        b.append(entry, IlInstruction::new(Opcode::Return, vec![], loc())).unwrap();
        assert!(IlVerifier::verify_function(&b.build()).is_ok());
    }

    #[test]
    fn missing_terminator_is_rejected() {
        let mut b = IlFunctionBuilder::new("f", vec![], IlType::Byte);
        let entry = b.entry();
        let t = b.new_temp();
        b.append(
            entry,
            IlInstruction::new(
                Opcode::Add,
                vec![Operand::imm(1, IlType::Byte), Operand::imm(2, IlType::Byte)],
                loc(),
            )
            .with_result(t, IlType::Byte),
        )
        .unwrap();
        let function = b.build();
        assert_eq!(
            IlVerifier::verify_function(&function),
            Err(IlError::MissingTerminator(function.blocks[0].id))
        );
    }

    #[test]
    fn unknown_jump_target_is_rejected() {
        let mut b = IlFunctionBuilder::new("f", vec![], IlType::Void);
        let entry = b.entry();
        b.append(
            entry,
            IlInstruction::new(Opcode::Jump, vec![Operand::Block(crate::ids::BlockId(99))], loc()),
        )
        .unwrap();
        assert_eq!(
            IlVerifier::verify_function(&b.build()),
            Err(IlError::UnknownBlockTarget(crate::ids::BlockId(99)))
        );
    }

    #[test]
    fn early_terminator_is_rejected() {
        let mut b = IlFunctionBuilder::new("f", vec![], IlType::Void);
        let entry = b.entry();
        b.append(entry, IlInstruction::new(Opcode::Return, vec![], loc())).unwrap();
        b.append(entry, IlInstruction::new(Opcode::Return, vec![], loc())).unwrap();
        let function = b.build();
        assert_eq!(
            IlVerifier::verify_function(&function),
            Err(IlError::EarlyTerminator(function.blocks[0].id))
        );
    }
}
