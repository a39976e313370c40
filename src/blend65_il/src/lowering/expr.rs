//! Expression lowering: three-address instructions over typed temporaries,
//! with generation-time constant folding and short-circuit branches.

use super::{FunctionLowering, Place};
use crate::error::IlResult;
use crate::instr::{IlInstruction, Opcode, Operand};
use crate::types::IlType;
use blend65_analysis::intrinsics::{intrinsics, IntrinsicDefinition, IntrinsicOpcode};
use blend65_syntax::ast::{
    BinaryExpression, BinaryOperator, CallExpression, Expression, IndexExpression, UnaryExpression,
    UnaryOperator,
};
use blend65_syntax::span::SourceLocation;

impl FunctionLowering<'_> {
    pub(crate) fn emit(&mut self, instruction: IlInstruction) -> IlResult<()> {
        let block = self.ensure_block();
        self.func.append(block, instruction)
    }

    fn emit_result(
        &mut self,
        opcode: Opcode,
        operands: Vec<Operand>,
        ty: IlType,
        location: &SourceLocation,
    ) -> IlResult<Operand> {
        let temp = self.func.new_temp();
        self.emit(
            IlInstruction::new(opcode, operands, location.clone()).with_result(temp, ty),
        )?;
        Ok(Operand::Temp(temp))
    }

    pub(crate) fn lower_expr(&mut self, expr: &Expression) -> IlResult<Operand> {
        match expr {
            Expression::Number(n) => {
                Ok(Operand::imm(i64::from(n.value), self.expr_il_type(expr)))
            }
            Expression::Bool(b) => Ok(Operand::imm(i64::from(b.value), IlType::Bool)),
            Expression::Str(s) => {
                let label = self.intern_string(&s.value);
                Ok(Operand::Symbol(label))
            }
            Expression::Identifier(ident) => self.lower_identifier_read(ident.id, &ident.location),
            Expression::Binary(e) => self.lower_binary(e),
            Expression::Unary(e) => self.lower_unary(e),
            Expression::Call(e) => self.lower_call(e),
            Expression::Index(e) => self.lower_index_read(e),
        }
    }

    fn lower_identifier_read(
        &mut self,
        node: blend65_syntax::ast::NodeId,
        location: &SourceLocation,
    ) -> IlResult<Operand> {
        let place = self
            .place_of(node)
            .ok_or_else(|| self.unsupported("identifier", "no resolved symbol"))?;
        let ty = self
            .analysis()
            .expr_types
            .get(&node)
            .map(IlType::from_type_info)
            .unwrap_or(IlType::Byte);
        match place {
            Place::Local(slot) => {
                self.emit_result(Opcode::Load, vec![Operand::Symbol(slot)], ty, location)
            }
            Place::Global(name) => {
                self.emit_result(Opcode::LoadGlobal, vec![Operand::Symbol(name)], ty, location)
            }
            Place::Param(index) => self.emit_result(
                Opcode::LoadParam,
                vec![Operand::imm(index as i64, IlType::Byte)],
                ty,
                location,
            ),
            Place::Map { address, ty } => {
                let temp = self.func.new_temp();
                self.emit(
                    IlInstruction::new(
                        Opcode::Load,
                        vec![Operand::imm(i64::from(address), IlType::Word)],
                        location.clone(),
                    )
                    .with_result(temp, ty)
                    .volatile(),
                )?;
                Ok(Operand::Temp(temp))
            }
            Place::FunctionRef(name) => Ok(Operand::Symbol(name)),
        }
    }

    fn lower_binary(&mut self, e: &BinaryExpression) -> IlResult<Operand> {
        if e.operator.is_logical() {
            return self.lower_short_circuit(e);
        }
        let left = self.lower_expr(&e.left)?;
        let right = self.lower_expr(&e.right)?;
        let ty = match e.operator {
            op if op.is_comparison() => IlType::Bool,
            _ => {
                // Widening rule: word if either side is.
                let lt = self.expr_il_type(&e.left);
                let rt = self.expr_il_type(&e.right);
                if lt == IlType::Word || rt == IlType::Word { IlType::Word } else { IlType::Byte }
            }
        };
        if let Some(folded) = fold_binary(e.operator, &left, &right, &ty) {
            return Ok(folded);
        }
        let opcode = binary_opcode(e.operator);
        self.emit_result(opcode, vec![left, right], ty, &e.location)
    }

    /// `a && b` / `a || b` evaluate `b` only when `a` does not already
    /// decide the result. The merge writes one shared temporary from both
    /// arms; temporaries are not single-assignment.
    fn lower_short_circuit(&mut self, e: &BinaryExpression) -> IlResult<Operand> {
        let result = self.func.new_temp();
        let left = self.lower_expr(&e.left)?;
        let rhs_block = self.func.new_block();
        let short_block = self.func.new_block();
        let merge_block = self.func.new_block();
        let (on_true, on_false) = match e.operator {
            BinaryOperator::LogicalAnd => (rhs_block, short_block),
            _ => (short_block, rhs_block),
        };
        self.emit(IlInstruction::new(
            Opcode::Branch,
            vec![left.clone(), Operand::Block(on_true), Operand::Block(on_false)],
            e.location.clone(),
        ))?;

        // Right-hand side arm: the full operation.
        self.switch_to(rhs_block);
        let right = self.lower_expr(&e.right)?;
        let opcode = match e.operator {
            BinaryOperator::LogicalAnd => Opcode::LogicalAnd,
            _ => Opcode::LogicalOr,
        };
        self.emit(
            IlInstruction::new(opcode, vec![left, right], e.location.clone())
                .with_result(result, IlType::Bool),
        )?;
        self.emit(IlInstruction::new(
            Opcode::Jump,
            vec![Operand::Block(merge_block)],
            e.location.clone(),
        ))?;

        // Short arm: the left side already decided the value.
        self.switch_to(short_block);
        let decided = i64::from(e.operator != BinaryOperator::LogicalAnd);
        self.emit(
            IlInstruction::new(
                opcode,
                vec![Operand::imm(decided, IlType::Bool), Operand::imm(decided, IlType::Bool)],
                e.location.clone(),
            )
            .with_result(result, IlType::Bool),
        )?;
        self.emit(IlInstruction::new(
            Opcode::Jump,
            vec![Operand::Block(merge_block)],
            e.location.clone(),
        ))?;

        self.switch_to(merge_block);
        Ok(Operand::Temp(result))
    }

    fn lower_unary(&mut self, e: &UnaryExpression) -> IlResult<Operand> {
        match e.operator {
            UnaryOperator::AddressOf => self.lower_address_of(&e.operand, &e.location),
            UnaryOperator::Negate | UnaryOperator::BitNot | UnaryOperator::Not => {
                let operand = self.lower_expr(&e.operand)?;
                let (opcode, ty) = match e.operator {
                    UnaryOperator::Negate => (Opcode::Neg, self.expr_il_type(&e.operand)),
                    UnaryOperator::BitNot => (Opcode::Not, self.expr_il_type(&e.operand)),
                    _ => (Opcode::LogicalNot, IlType::Bool),
                };
                if let Some(value) = operand.as_imm() {
                    let folded = match e.operator {
                        UnaryOperator::Negate => Some(mask_to(&ty, -value)),
                        UnaryOperator::BitNot => Some(mask_to(&ty, !value)),
                        UnaryOperator::Not => Some(i64::from(value == 0)),
                        UnaryOperator::AddressOf => None,
                    };
                    if let Some(folded) = folded {
                        return Ok(Operand::imm(folded, ty));
                    }
                }
                self.emit_result(opcode, vec![operand], ty, &e.location)
            }
        }
    }

    /// `@x` is a link-time constant; `@arr[i]` adds the scaled offset.
    fn lower_address_of(
        &mut self,
        operand: &Expression,
        location: &SourceLocation,
    ) -> IlResult<Operand> {
        match operand {
            Expression::Identifier(ident) => {
                let place = self
                    .place_of(ident.id)
                    .ok_or_else(|| self.unsupported("address-of", "no resolved symbol"))?;
                Ok(match place {
                    Place::Local(slot) => Operand::Symbol(slot),
                    Place::Global(name) | Place::FunctionRef(name) => Operand::Symbol(name),
                    Place::Map { address, .. } => Operand::imm(i64::from(address), IlType::Word),
                    Place::Param(index) => {
                        let function = self.func.name().to_string();
                        Operand::Symbol(format!("{function}::arg{index}"))
                    }
                })
            }
            Expression::Index(index) => {
                let base = self.lower_address_of(&index.object, location)?;
                let element_size = self.element_size_of(&index.object);
                let offset = self.lower_scaled_index(&index.index, element_size)?;
                match (base.as_imm(), offset.as_imm()) {
                    (Some(b), Some(o)) => Ok(Operand::imm(mask_to(&IlType::Word, b + o), IlType::Word)),
                    _ => self.emit_result(Opcode::Add, vec![base, offset], IlType::Word, location),
                }
            }
            other => Err(self.unsupported("address-of", &format!("operand {:?}", other.location()))),
        }
    }

    fn element_size_of(&self, object: &Expression) -> u16 {
        self.analysis()
            .expr_types
            .get(&object.id())
            .and_then(|ty| ty.element_type())
            .map(|elem| elem.size)
            .unwrap_or(1)
    }

    /// Index value scaled by the element size, folded when constant.
    pub(crate) fn lower_scaled_index(
        &mut self,
        index: &Expression,
        element_size: u16,
    ) -> IlResult<Operand> {
        let value = self.lower_expr(index)?;
        if element_size <= 1 {
            return Ok(value);
        }
        if let Some(v) = value.as_imm() {
            return Ok(Operand::imm(v * i64::from(element_size), IlType::Word));
        }
        self.emit_result(
            Opcode::Mul,
            vec![value, Operand::imm(i64::from(element_size), IlType::Word)],
            IlType::Word,
            index.location(),
        )
    }

    pub(crate) fn lower_index_read(&mut self, e: &IndexExpression) -> IlResult<Operand> {
        let element_ty = self.il_type_of(e.id);
        let element_size = self.element_size_of(&e.object);
        match &e.object {
            Expression::Identifier(ident) => {
                let place = self
                    .place_of(ident.id)
                    .ok_or_else(|| self.unsupported("index", "no resolved symbol"))?;
                match place {
                    Place::Local(slot) => {
                        let offset = self.lower_scaled_index(&e.index, element_size)?;
                        self.emit_result(
                            Opcode::Index,
                            vec![Operand::Symbol(slot), offset],
                            element_ty,
                            &e.location,
                        )
                    }
                    Place::Global(name) => {
                        let offset = self.lower_scaled_index(&e.index, element_size)?;
                        self.emit_result(
                            Opcode::Index,
                            vec![Operand::Symbol(name), offset],
                            element_ty,
                            &e.location,
                        )
                    }
                    Place::Map { address, .. } => {
                        let offset = self.lower_scaled_index(&e.index, element_size)?;
                        let addr = self.add_address(
                            Operand::imm(i64::from(address), IlType::Word),
                            offset,
                            &e.location,
                        )?;
                        let temp = self.func.new_temp();
                        self.emit(
                            IlInstruction::new(Opcode::Load, vec![addr], e.location.clone())
                                .with_result(temp, element_ty)
                                .volatile(),
                        )?;
                        Ok(Operand::Temp(temp))
                    }
                    Place::Param(_) | Place::FunctionRef(_) => {
                        Err(self.unsupported("index", "object is not an array"))
                    }
                }
            }
            _ => Err(self.unsupported("index", "object must be a named array")),
        }
    }

    pub(crate) fn add_address(
        &mut self,
        base: Operand,
        offset: Operand,
        location: &SourceLocation,
    ) -> IlResult<Operand> {
        match (base.as_imm(), offset.as_imm()) {
            (Some(b), Some(o)) => Ok(Operand::imm(mask_to(&IlType::Word, b + o), IlType::Word)),
            _ => self.emit_result(Opcode::Add, vec![base, offset], IlType::Word, location),
        }
    }

    fn lower_call(&mut self, e: &CallExpression) -> IlResult<Operand> {
        if let Some(name) = e.callee.as_identifier() {
            let shadowed = self.analysis().symbol_refs.contains_key(&e.callee.id());
            if !shadowed {
                if let Some(def) = intrinsics().get(name) {
                    let def = def.clone();
                    return self.lower_intrinsic_call(e, &def);
                }
            }
        }
        let callee = self.lower_expr(&e.callee)?;
        let mut operands = vec![callee];
        for arg in &e.arguments {
            operands.push(self.lower_expr(arg)?);
        }
        let return_ty = self.il_type_of(e.id);
        if return_ty.is_void() {
            self.emit(IlInstruction::new(Opcode::Call, operands, e.location.clone()))?;
            Ok(Operand::imm(0, IlType::Void))
        } else {
            self.emit_result(Opcode::Call, operands, return_ty, &e.location)
        }
    }

    fn lower_intrinsic_call(
        &mut self,
        e: &CallExpression,
        def: &IntrinsicDefinition,
    ) -> IlResult<Operand> {
        if def.is_compile_time {
            return self.fold_compile_time_intrinsic(e, def);
        }
        let opcode = match def.opcode {
            Some(op) => intrinsic_opcode(op),
            None => return Err(self.unsupported(def.name, "runtime intrinsic without opcode")),
        };
        let mut operands = Vec::with_capacity(e.arguments.len());
        for arg in &e.arguments {
            operands.push(self.lower_expr(arg)?);
        }
        let return_ty = IlType::from_type_info(&def.return_type);
        let mut instruction = IlInstruction::new(opcode, operands, e.location.clone());
        if def.is_volatile {
            instruction = instruction.volatile();
        }
        if def.is_barrier {
            instruction = instruction.barrier();
        }
        if return_ty.is_void() {
            self.emit(instruction)?;
            Ok(Operand::imm(0, IlType::Void))
        } else {
            let temp = self.func.new_temp();
            self.emit(instruction.with_result(temp, return_ty))?;
            Ok(Operand::Temp(temp))
        }
    }

    /// `sizeof`/`length` fold to immediates and emit no IL at all.
    fn fold_compile_time_intrinsic(
        &mut self,
        e: &CallExpression,
        def: &IntrinsicDefinition,
    ) -> IlResult<Operand> {
        let arg = e
            .arguments
            .first()
            .ok_or_else(|| self.unsupported(def.name, "missing argument"))?;
        let arg_ty = self.analysis().expr_types.get(&arg.id());
        let value = match def.name {
            "sizeof" => arg_ty.map(|ty| i64::from(ty.size)).unwrap_or(0),
            _ => match arg {
                Expression::Str(s) => s.value.len() as i64,
                _ => arg_ty.and_then(|ty| ty.array_size()).map(i64::from).unwrap_or(0),
            },
        };
        Ok(Operand::imm(value, IlType::Word))
    }
}

fn binary_opcode(op: BinaryOperator) -> Opcode {
    match op {
        BinaryOperator::Add => Opcode::Add,
        BinaryOperator::Subtract => Opcode::Sub,
        BinaryOperator::Multiply => Opcode::Mul,
        BinaryOperator::Divide => Opcode::Div,
        BinaryOperator::Modulo => Opcode::Mod,
        BinaryOperator::BitAnd => Opcode::And,
        BinaryOperator::BitOr => Opcode::Or,
        BinaryOperator::BitXor => Opcode::Xor,
        BinaryOperator::ShiftLeft => Opcode::Shl,
        BinaryOperator::ShiftRight => Opcode::Shr,
        BinaryOperator::Equal => Opcode::CmpEq,
        BinaryOperator::NotEqual => Opcode::CmpNe,
        BinaryOperator::Less => Opcode::CmpLt,
        BinaryOperator::LessEqual => Opcode::CmpLe,
        BinaryOperator::Greater => Opcode::CmpGt,
        BinaryOperator::GreaterEqual => Opcode::CmpGe,
        BinaryOperator::LogicalAnd => Opcode::LogicalAnd,
        BinaryOperator::LogicalOr => Opcode::LogicalOr,
    }
}

fn intrinsic_opcode(op: IntrinsicOpcode) -> Opcode {
    match op {
        IntrinsicOpcode::Peek => Opcode::IntrinsicPeek,
        IntrinsicOpcode::Poke => Opcode::IntrinsicPoke,
        IntrinsicOpcode::PeekW => Opcode::IntrinsicPeekW,
        IntrinsicOpcode::PokeW => Opcode::IntrinsicPokeW,
        IntrinsicOpcode::Lo => Opcode::IntrinsicLo,
        IntrinsicOpcode::Hi => Opcode::IntrinsicHi,
        IntrinsicOpcode::Sei => Opcode::CpuSei,
        IntrinsicOpcode::Cli => Opcode::CpuCli,
        IntrinsicOpcode::Nop => Opcode::CpuNop,
        IntrinsicOpcode::Brk => Opcode::CpuBrk,
        IntrinsicOpcode::Pha => Opcode::CpuPha,
        IntrinsicOpcode::Pla => Opcode::CpuPla,
        IntrinsicOpcode::Php => Opcode::CpuPhp,
        IntrinsicOpcode::Plp => Opcode::CpuPlp,
        IntrinsicOpcode::Barrier => Opcode::OptBarrier,
        IntrinsicOpcode::VolatileRead => Opcode::VolatileRead,
        IntrinsicOpcode::VolatileWrite => Opcode::VolatileWrite,
    }
}

fn mask_to(ty: &IlType, value: i64) -> i64 {
    match ty {
        IlType::Byte | IlType::Bool => value & 0xFF,
        IlType::Word | IlType::Pointer(_) => value & 0xFFFF,
        IlType::Void | IlType::Array { .. } => value,
    }
}

/// Generation-time folding for all-constant operands.
fn fold_binary(op: BinaryOperator, left: &Operand, right: &Operand, ty: &IlType) -> Option<Operand> {
    let (l, r) = (left.as_imm()?, right.as_imm()?);
    let value = match op {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0 {
                return None;
            }
            l / r
        }
        BinaryOperator::Modulo => {
            if r == 0 {
                return None;
            }
            l % r
        }
        BinaryOperator::BitAnd => l & r,
        BinaryOperator::BitOr => l | r,
        BinaryOperator::BitXor => l ^ r,
        BinaryOperator::ShiftLeft => l << (r & 0x0F),
        BinaryOperator::ShiftRight => l >> (r & 0x0F),
        BinaryOperator::Equal => i64::from(l == r),
        BinaryOperator::NotEqual => i64::from(l != r),
        BinaryOperator::Less => i64::from(l < r),
        BinaryOperator::LessEqual => i64::from(l <= r),
        BinaryOperator::Greater => i64::from(l > r),
        BinaryOperator::GreaterEqual => i64::from(l >= r),
        BinaryOperator::LogicalAnd | BinaryOperator::LogicalOr => return None,
    };
    Some(Operand::imm(mask_to(ty, value), ty.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_arithmetic_folds_with_masking() {
        let l = Operand::imm(200, IlType::Byte);
        let r = Operand::imm(100, IlType::Byte);
        let folded = fold_binary(BinaryOperator::Add, &l, &r, &IlType::Byte).unwrap();
        assert_eq!(folded.as_imm(), Some(44)); // 300 & 0xFF
    }

    #[test]
    fn division_by_zero_does_not_fold() {
        let l = Operand::imm(10, IlType::Byte);
        let r = Operand::imm(0, IlType::Byte);
        assert!(fold_binary(BinaryOperator::Divide, &l, &r, &IlType::Byte).is_none());
    }

    #[test]
    fn comparisons_fold_to_bool() {
        let l = Operand::imm(3, IlType::Byte);
        let r = Operand::imm(7, IlType::Byte);
        let folded = fold_binary(BinaryOperator::Less, &l, &r, &IlType::Bool).unwrap();
        assert_eq!(folded.as_imm(), Some(1));
    }
}
