//! Statement lowering: blocks and terminators. Unreachable source is still
//! lowered (into blocks with no predecessors); the dead-code analysis has
//! already pointed at it.

use super::{FunctionLowering, Place};
use crate::error::IlResult;
use crate::instr::{IlInstruction, Opcode, Operand};
use crate::types::IlType;
use blend65_syntax::ast::{Expression, Statement};
use blend65_syntax::span::SourceLocation;

impl FunctionLowering<'_> {
    pub(crate) fn lower_statements(&mut self, statements: &[Statement]) -> IlResult<()> {
        for stmt in statements {
            self.lower_statement(stmt)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, stmt: &Statement) -> IlResult<()> {
        match stmt {
            Statement::Let(decl) => {
                if let Some(init) = &decl.initializer {
                    let value = self.lower_expr(init)?;
                    self.store_identifier(decl.id, value, &decl.location)?;
                }
                Ok(())
            }
            Statement::Assign(s) => match &s.target {
                Expression::Identifier(ident) => {
                    let value = self.lower_expr(&s.value)?;
                    self.store_identifier(ident.id, value, &s.location)
                }
                Expression::Index(index) => {
                    let value = self.lower_expr(&s.value)?;
                    self.store_indexed(index, value, &s.location)
                }
                other => Err(self.unsupported("assignment", &format!("target at {}", other.location()))),
            },
            Statement::Expr(s) => {
                self.lower_expr(&s.expression)?;
                Ok(())
            }
            Statement::If(s) => self.lower_if(s),
            Statement::While(s) => self.lower_while(s),
            Statement::For(s) => self.lower_for(s),
            Statement::Break(s) => {
                if let Some((_, break_target)) = self.current_loop() {
                    self.emit(IlInstruction::new(
                        Opcode::Jump,
                        vec![Operand::Block(break_target)],
                        s.location.clone(),
                    ))?;
                }
                self.mark_diverged();
                Ok(())
            }
            Statement::Continue(s) => {
                if let Some((continue_target, _)) = self.current_loop() {
                    self.emit(IlInstruction::new(
                        Opcode::Jump,
                        vec![Operand::Block(continue_target)],
                        s.location.clone(),
                    ))?;
                }
                self.mark_diverged();
                Ok(())
            }
            Statement::Return(s) => {
                let operands = match &s.value {
                    Some(value) => vec![self.lower_expr(value)?],
                    None => vec![],
                };
                let ty = self.return_type.clone();
                self.emit(
                    IlInstruction::new(Opcode::Return, operands, s.location.clone()).with_type(ty),
                )?;
                self.mark_diverged();
                Ok(())
            }
            Statement::Block(s) => self.lower_statements(&s.statements),
        }
    }

    /// Store a value into whatever an identifier names.
    fn store_identifier(
        &mut self,
        node: blend65_syntax::ast::NodeId,
        value: Operand,
        location: &SourceLocation,
    ) -> IlResult<()> {
        // For declarations the node is the declaration itself; for
        // assignment targets it is the identifier expression.
        let place = match self.place_of(node) {
            Some(place) => place,
            None => {
                let symbol_id = self
                    .analysis()
                    .symbol_table
                    .symbol_for_declaration(node)
                    .ok_or_else(|| self.unsupported("store", "no resolved symbol"))?;
                self.place_of_symbol(symbol_id)
            }
        };
        match place {
            Place::Local(slot) => self.emit(IlInstruction::new(
                Opcode::Store,
                vec![Operand::Symbol(slot), value],
                location.clone(),
            )),
            Place::Global(name) => self.emit(IlInstruction::new(
                Opcode::StoreGlobal,
                vec![Operand::Symbol(name), value],
                location.clone(),
            )),
            Place::Param(index) => self.emit(IlInstruction::new(
                Opcode::StoreParam,
                vec![Operand::imm(index as i64, IlType::Byte), value],
                location.clone(),
            )),
            Place::Map { address, ty } => self.emit(
                IlInstruction::new(
                    Opcode::Store,
                    vec![Operand::imm(i64::from(address), IlType::Word), value],
                    location.clone(),
                )
                .with_type(ty)
                .volatile(),
            ),
            Place::FunctionRef(name) => {
                Err(self.unsupported("store", &format!("cannot assign to function `{name}`")))
            }
        }
    }

    fn store_indexed(
        &mut self,
        index: &blend65_syntax::ast::IndexExpression,
        value: Operand,
        location: &SourceLocation,
    ) -> IlResult<()> {
        let element_size = self
            .analysis()
            .expr_types
            .get(&index.object.id())
            .and_then(|ty| ty.element_type())
            .map(|elem| elem.size)
            .unwrap_or(1);
        let Expression::Identifier(ident) = &index.object else {
            return Err(self.unsupported("indexed store", "object must be a named array"));
        };
        let place = self
            .place_of(ident.id)
            .ok_or_else(|| self.unsupported("indexed store", "no resolved symbol"))?;
        let offset = self.lower_scaled_index(&index.index, element_size)?;
        match place {
            Place::Local(slot) => {
                let address =
                    self.add_address(Operand::Symbol(slot), offset, location)?;
                self.emit(IlInstruction::new(
                    Opcode::Store,
                    vec![address, value],
                    location.clone(),
                ))
            }
            Place::Global(name) => {
                let address =
                    self.add_address(Operand::Symbol(name), offset, location)?;
                self.emit(IlInstruction::new(
                    Opcode::Store,
                    vec![address, value],
                    location.clone(),
                ))
            }
            Place::Map { address, .. } => {
                let target = self.add_address(
                    Operand::imm(i64::from(address), IlType::Word),
                    offset,
                    location,
                )?;
                self.emit(
                    IlInstruction::new(Opcode::Store, vec![target, value], location.clone())
                        .volatile(),
                )
            }
            Place::Param(_) | Place::FunctionRef(_) => {
                Err(self.unsupported("indexed store", "object is not an array"))
            }
        }
    }

    fn lower_if(&mut self, s: &blend65_syntax::ast::IfStatement) -> IlResult<()> {
        let condition = self.lower_expr(&s.condition)?;
        let then_block = self.func.new_block();
        let Some(else_branch) = &s.else_branch else {
            let merge_block = self.func.new_block();
            self.emit(IlInstruction::new(
                Opcode::Branch,
                vec![condition, Operand::Block(then_block), Operand::Block(merge_block)],
                s.location.clone(),
            ))?;
            self.switch_to(then_block);
            self.lower_statements(&s.then_branch)?;
            self.jump_if_open(merge_block, &s.location)?;
            self.switch_to(merge_block);
            return Ok(());
        };

        let else_block = self.func.new_block();
        self.emit(IlInstruction::new(
            Opcode::Branch,
            vec![condition, Operand::Block(then_block), Operand::Block(else_block)],
            s.location.clone(),
        ))?;

        // The merge block exists only if some arm falls through to it.
        let mut merge_block = None;
        self.switch_to(then_block);
        self.lower_statements(&s.then_branch)?;
        if !self.has_diverged() && !self.func.is_terminated(self.current) {
            let merge = self.func.new_block();
            merge_block = Some(merge);
            self.emit(IlInstruction::new(
                Opcode::Jump,
                vec![Operand::Block(merge)],
                s.location.clone(),
            ))?;
        }

        self.switch_to(else_block);
        self.lower_statements(else_branch)?;
        if !self.has_diverged() && !self.func.is_terminated(self.current) {
            let merge = match merge_block {
                Some(merge) => merge,
                None => {
                    let merge = self.func.new_block();
                    merge_block = Some(merge);
                    merge
                }
            };
            self.emit(IlInstruction::new(
                Opcode::Jump,
                vec![Operand::Block(merge)],
                s.location.clone(),
            ))?;
        }

        match merge_block {
            Some(merge) => self.switch_to(merge),
            None => self.mark_diverged(),
        }
        Ok(())
    }

    fn lower_while(&mut self, s: &blend65_syntax::ast::WhileStatement) -> IlResult<()> {
        let header = self.func.new_block();
        let body_block = self.func.new_block();
        let exit_block = self.func.new_block();
        self.emit(IlInstruction::new(
            Opcode::Jump,
            vec![Operand::Block(header)],
            s.location.clone(),
        ))?;

        self.switch_to(header);
        let condition = self.lower_expr(&s.condition)?;
        self.emit(IlInstruction::new(
            Opcode::Branch,
            vec![condition, Operand::Block(body_block), Operand::Block(exit_block)],
            s.location.clone(),
        ))?;

        self.switch_to(body_block);
        self.push_loop(header, exit_block);
        self.lower_statements(&s.body)?;
        self.pop_loop();
        self.jump_if_open(header, &s.location)?;

        self.switch_to(exit_block);
        Ok(())
    }

    /// `for i = a to b [step s]` counts upward; the increment block is the
    /// `continue` target.
    fn lower_for(&mut self, s: &blend65_syntax::ast::ForStatement) -> IlResult<()> {
        let counter_id = self
            .analysis()
            .symbol_table
            .symbol_for_declaration(s.id)
            .ok_or_else(|| self.unsupported("for", "loop counter has no symbol"))?;
        let counter = self.place_of_symbol(counter_id);
        let Place::Local(slot) = counter else {
            return Err(self.unsupported("for", "loop counter is not a local"));
        };

        let from = self.lower_expr(&s.from)?;
        self.emit(IlInstruction::new(
            Opcode::Store,
            vec![Operand::Symbol(slot.clone()), from],
            s.location.clone(),
        ))?;

        let header = self.func.new_block();
        let body_block = self.func.new_block();
        let step_block = self.func.new_block();
        let exit_block = self.func.new_block();
        self.emit(IlInstruction::new(
            Opcode::Jump,
            vec![Operand::Block(header)],
            s.location.clone(),
        ))?;

        self.switch_to(header);
        let limit = self.lower_expr(&s.to)?;
        let counter_value = self.emit_load_local(&slot, IlType::Byte, &s.location)?;
        let in_range = self.func.new_temp();
        self.emit(
            IlInstruction::new(
                Opcode::CmpLe,
                vec![counter_value, limit],
                s.location.clone(),
            )
            .with_result(in_range, IlType::Bool),
        )?;
        self.emit(IlInstruction::new(
            Opcode::Branch,
            vec![
                Operand::Temp(in_range),
                Operand::Block(body_block),
                Operand::Block(exit_block),
            ],
            s.location.clone(),
        ))?;

        self.switch_to(body_block);
        self.push_loop(step_block, exit_block);
        self.lower_statements(&s.body)?;
        self.pop_loop();
        self.jump_if_open(step_block, &s.location)?;

        self.switch_to(step_block);
        let step = match &s.step {
            Some(step) => self.lower_expr(step)?,
            None => Operand::imm(1, IlType::Byte),
        };
        let counter_value = self.emit_load_local(&slot, IlType::Byte, &s.location)?;
        let bumped = self.func.new_temp();
        self.emit(
            IlInstruction::new(Opcode::Add, vec![counter_value, step], s.location.clone())
                .with_result(bumped, IlType::Byte),
        )?;
        self.emit(IlInstruction::new(
            Opcode::Store,
            vec![Operand::Symbol(slot), Operand::Temp(bumped)],
            s.location.clone(),
        ))?;
        self.emit(IlInstruction::new(
            Opcode::Jump,
            vec![Operand::Block(header)],
            s.location.clone(),
        ))?;

        self.switch_to(exit_block);
        Ok(())
    }

    fn emit_load_local(
        &mut self,
        slot: &str,
        ty: IlType,
        location: &SourceLocation,
    ) -> IlResult<Operand> {
        let temp = self.func.new_temp();
        self.emit(
            IlInstruction::new(
                Opcode::Load,
                vec![Operand::Symbol(slot.to_string())],
                location.clone(),
            )
            .with_result(temp, ty),
        )?;
        Ok(Operand::Temp(temp))
    }

    /// Close the current block with a jump unless control already left it.
    fn jump_if_open(&mut self, target: crate::ids::BlockId, location: &SourceLocation) -> IlResult<()> {
        if !self.has_diverged() && !self.func.is_terminated(self.current) {
            self.emit(IlInstruction::new(
                Opcode::Jump,
                vec![Operand::Block(target)],
                location.clone(),
            ))?;
        }
        Ok(())
    }

    /// Place for a symbol known only by id (declarations, loop counters).
    pub(crate) fn place_of_symbol(&self, symbol_id: blend65_analysis::symbols::SymbolId) -> Place {
        let symbol = self.analysis().symbol_table.symbol(symbol_id);
        if symbol.scope == self.analysis().symbol_table.root_scope() {
            Place::Global(symbol.name.clone())
        } else {
            Place::Local(format!("{}_{}", symbol.name, symbol_id.0))
        }
    }
}
