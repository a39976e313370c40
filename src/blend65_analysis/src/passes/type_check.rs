//! Pass 3: bottom-up expression typing plus assignment, call, return,
//! condition and index checking. Records every computed expression type and
//! every implicit-conversion site for the later analyses.

use super::{AnalyzerPass, ScopeCursor};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollection};
use crate::intrinsics::{IntrinsicDefinition, intrinsics};
use crate::session::{AnalysisSession, CoercionContext, CoercionSite};
use crate::symbols::{SymbolId, SymbolKind};
use crate::types::{TypeCompatibility, TypeInfo, TypeSystem};
use blend65_syntax::ast::{
    Expression, FunctionDecl, Item, NodeId, Program, Statement, UnaryOperator,
};
use blend65_syntax::span::SourceLocation;
use log::debug;

pub struct TypeCheckPass;

impl AnalyzerPass for TypeCheckPass {
    fn id(&self) -> &'static str {
        "type-check"
    }

    fn run(&self, program: &Program, session: &mut AnalysisSession) -> DiagnosticCollection {
        let mut diagnostics = DiagnosticCollection::new();
        let mut checker = TypeChecker {
            session: &mut *session,
            diagnostics: &mut diagnostics,
            cursor: ScopeCursor::new(),
            current_return: TypeInfo::void(),
        };
        for item in &program.items {
            match item {
                Item::Variable(decl) => {
                    if let Some(init) = &decl.initializer {
                        let declared = checker.declared_type(&decl.name, decl.id);
                        let init_ty = checker.type_of(init);
                        checker.require_compatible(
                            &init_ty,
                            &declared,
                            CoercionContext::Initializer,
                            init.id(),
                            init.location(),
                            DiagnosticCode::TypeMismatch,
                        );
                    }
                }
                Item::Function(decl) => checker.check_function(decl),
                Item::Import(_) | Item::Map(_) => {}
            }
        }
        debug!("pass 3: checked {} expressions", session.stats.expressions_checked);
        diagnostics
    }
}

struct TypeChecker<'a> {
    session: &'a mut AnalysisSession,
    diagnostics: &'a mut DiagnosticCollection,
    cursor: ScopeCursor,
    current_return: TypeInfo,
}

impl TypeChecker<'_> {
    fn error(&mut self, code: DiagnosticCode, message: String, location: &SourceLocation) {
        self.diagnostics.add(Diagnostic::error(code, message).with_location(location.clone()));
    }

    /// Resolved type of the symbol a declaration created, or `Unknown`.
    fn declared_type(&self, name: &str, declaration: NodeId) -> TypeInfo {
        self.lookup_declared(name, declaration)
            .and_then(|id| self.session.symbols.symbol(id).type_info.clone())
            .unwrap_or_else(TypeInfo::unknown)
    }

    fn lookup_declared(&self, name: &str, declaration: NodeId) -> Option<SymbolId> {
        let id = self.session.symbols.lookup(name)?;
        (self.session.symbols.symbol(id).declaration == declaration).then_some(id)
    }

    fn check_function(&mut self, decl: &FunctionDecl) {
        self.current_return = match &self.declared_type(&decl.name, decl.id).kind {
            crate::types::TypeKind::Callback { return_type, .. } => (**return_type).clone(),
            _ => TypeInfo::unknown(),
        };
        if self.cursor.enter(&mut self.session.symbols, decl.id) {
            self.check_statements(&decl.body);
            self.cursor.exit(&mut self.session.symbols);
        }
        self.session.stats.functions_analyzed += 1;
    }

    fn check_statements(&mut self, statements: &[Statement]) {
        for stmt in statements {
            self.check_statement(stmt);
        }
    }

    fn check_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Let(decl) => {
                if let Some(init) = &decl.initializer {
                    let declared = self.declared_type(&decl.name, decl.id);
                    let init_ty = self.type_of(init);
                    self.require_compatible(
                        &init_ty,
                        &declared,
                        CoercionContext::Initializer,
                        init.id(),
                        init.location(),
                        DiagnosticCode::TypeMismatch,
                    );
                }
            }
            Statement::Assign(s) => self.check_assignment(&s.target, &s.value),
            Statement::Expr(s) => {
                self.type_of(&s.expression);
            }
            Statement::If(s) => {
                self.check_condition(&s.condition);
                if self.cursor.enter(&mut self.session.symbols, s.id) {
                    self.check_statements(&s.then_branch);
                    self.cursor.exit(&mut self.session.symbols);
                }
                if let Some(else_branch) = &s.else_branch {
                    if self.cursor.enter(&mut self.session.symbols, s.id) {
                        self.check_statements(else_branch);
                        self.cursor.exit(&mut self.session.symbols);
                    }
                }
            }
            Statement::While(s) => {
                self.check_condition(&s.condition);
                if self.cursor.enter(&mut self.session.symbols, s.id) {
                    self.check_statements(&s.body);
                    self.cursor.exit(&mut self.session.symbols);
                }
            }
            Statement::For(s) => {
                if self.cursor.enter(&mut self.session.symbols, s.id) {
                    for bound in [Some(&s.from), Some(&s.to), s.step.as_ref()].into_iter().flatten() {
                        let ty = self.type_of(bound);
                        if !ty.is_unknown() && !ty.is_numeric() {
                            self.error(
                                DiagnosticCode::TypeMismatch,
                                format!("loop bound must be numeric, found `{}`", ty),
                                bound.location(),
                            );
                        }
                    }
                    self.check_statements(&s.body);
                    self.cursor.exit(&mut self.session.symbols);
                }
            }
            Statement::Return(s) => self.check_return(s.value.as_ref(), &s.location),
            Statement::Block(s) => {
                if self.cursor.enter(&mut self.session.symbols, s.id) {
                    self.check_statements(&s.statements);
                    self.cursor.exit(&mut self.session.symbols);
                }
            }
            Statement::Break(_) | Statement::Continue(_) => {}
        }
    }

    fn check_condition(&mut self, condition: &Expression) {
        let ty = self.type_of(condition);
        if ty.is_unknown() || ty.is_boolean() {
            return;
        }
        let boolean = TypeInfo::boolean();
        if self.session.types.check_compatibility(&ty, &boolean).is_implicit() {
            self.record_coercion(&ty, &boolean, CoercionContext::Condition, condition.id(), condition.location());
        } else {
            self.error(
                DiagnosticCode::InvalidCondition,
                format!("condition must be boolean, found `{}`", ty),
                condition.location(),
            );
        }
    }

    fn check_return(&mut self, value: Option<&Expression>, location: &SourceLocation) {
        let expected = self.current_return.clone();
        match value {
            Some(value) => {
                let ty = self.type_of(value);
                if expected.is_void() {
                    self.error(
                        DiagnosticCode::InvalidReturnType,
                        "void function cannot return a value".to_string(),
                        value.location(),
                    );
                } else {
                    self.require_compatible(
                        &ty,
                        &expected,
                        CoercionContext::Return,
                        value.id(),
                        value.location(),
                        DiagnosticCode::InvalidReturnType,
                    );
                }
            }
            None => {
                if !expected.is_void() && !expected.is_unknown() {
                    self.error(
                        DiagnosticCode::InvalidReturnType,
                        format!("function must return `{}`", expected),
                        location,
                    );
                }
            }
        }
    }

    fn check_assignment(&mut self, target: &Expression, value: &Expression) {
        match target {
            Expression::Identifier(ident) => {
                let Some(symbol_id) = self.session.symbols.lookup(&ident.name) else {
                    self.error(
                        DiagnosticCode::UndefinedSymbol,
                        format!("`{}` is not declared", ident.name),
                        &ident.location,
                    );
                    self.type_of(value);
                    return;
                };
                self.session.symbol_refs.insert(ident.id, symbol_id);
                let symbol = self.session.symbols.symbol(symbol_id);
                let target_ty = symbol.type_info.clone().unwrap_or_else(TypeInfo::unknown);
                if symbol.is_const {
                    self.error(
                        DiagnosticCode::ConstReassignment,
                        format!("`{}` is a constant", ident.name),
                        &ident.location,
                    );
                } else if matches!(symbol.kind, SymbolKind::Function | SymbolKind::Intrinsic) {
                    self.error(
                        DiagnosticCode::TypeMismatch,
                        format!("cannot assign to function `{}`", ident.name),
                        &ident.location,
                    );
                }
                self.session.expr_types.insert(ident.id, target_ty.clone());
                let value_ty = self.type_of(value);
                self.require_compatible(
                    &value_ty,
                    &target_ty,
                    CoercionContext::Assignment,
                    value.id(),
                    value.location(),
                    DiagnosticCode::TypeMismatch,
                );
            }
            Expression::Index(index) => {
                let element = self.check_index_expr(index);
                self.session.expr_types.insert(index.id, element.clone());
                let value_ty = self.type_of(value);
                self.require_compatible(
                    &value_ty,
                    &element,
                    CoercionContext::Assignment,
                    value.id(),
                    value.location(),
                    DiagnosticCode::TypeMismatch,
                );
            }
            other => {
                self.error(
                    DiagnosticCode::TypeMismatch,
                    "invalid assignment target".to_string(),
                    other.location(),
                );
                self.type_of(value);
            }
        }
    }

    /// Element type of an index expression, with bounds and index checks.
    fn check_index_expr(&mut self, index: &blend65_syntax::ast::IndexExpression) -> TypeInfo {
        let object_ty = self.type_of(&index.object);
        let index_ty = self.type_of(&index.index);
        if !index_ty.is_unknown() && !index_ty.is_numeric() {
            self.error(
                DiagnosticCode::TypeMismatch,
                format!("array index must be numeric, found `{}`", index_ty),
                index.index.location(),
            );
        }
        if let (Expression::Number(n), Some(size)) = (&index.index, object_ty.array_size()) {
            if n.value >= u32::from(size) {
                self.error(
                    DiagnosticCode::IndexOutOfRange,
                    format!("index {} is out of range for `{}`", n.value, object_ty),
                    &n.location,
                );
            }
        }
        match &object_ty.kind {
            crate::types::TypeKind::Array { element, .. } => (**element).clone(),
            crate::types::TypeKind::String => TypeInfo::byte(),
            crate::types::TypeKind::Unknown => TypeInfo::unknown(),
            _ => {
                self.error(
                    DiagnosticCode::TypeMismatch,
                    format!("`{}` cannot be indexed", object_ty),
                    index.object.location(),
                );
                TypeInfo::unknown()
            }
        }
    }

    /// Check `from` flowing into `to`, recording the coercion site. Unknown
    /// on either side suppresses the check to avoid cascades.
    fn require_compatible(
        &mut self,
        from: &TypeInfo,
        to: &TypeInfo,
        context: CoercionContext,
        node: NodeId,
        location: &SourceLocation,
        code: DiagnosticCode,
    ) {
        if from.is_unknown() || to.is_unknown() {
            return;
        }
        match self.session.types.check_compatibility(from, to) {
            TypeCompatibility::Identical => {}
            TypeCompatibility::Compatible => {
                self.record_coercion(from, to, context, node, location);
            }
            TypeCompatibility::RequiresConversion => {
                self.record_coercion(from, to, context, node, location);
                self.error(
                    code,
                    format!("`{}` does not implicitly convert to `{}` (truncation)", from, to),
                    location,
                );
            }
            TypeCompatibility::Incompatible => {
                self.record_coercion(from, to, context, node, location);
                self.error(code, format!("expected `{}`, found `{}`", to, from), location);
            }
        }
    }

    fn record_coercion(
        &mut self,
        from: &TypeInfo,
        to: &TypeInfo,
        context: CoercionContext,
        node: NodeId,
        location: &SourceLocation,
    ) {
        if from.name == to.name {
            return;
        }
        self.session.coercion_sites.push(CoercionSite {
            node,
            from: from.clone(),
            to: to.clone(),
            context,
            location: location.clone(),
        });
    }

    /// Bottom-up expression typing. Every visited node lands in
    /// `expr_types`; failures produce `Unknown` and keep going.
    fn type_of(&mut self, expr: &Expression) -> TypeInfo {
        self.session.stats.expressions_checked += 1;
        let ty = match expr {
            Expression::Number(n) => {
                if n.value <= 0xFF {
                    TypeInfo::byte()
                } else {
                    TypeInfo::word()
                }
            }
            Expression::Bool(_) => TypeInfo::boolean(),
            Expression::Str(_) => TypeInfo::string(),
            Expression::Identifier(ident) => match self.session.symbols.lookup(&ident.name) {
                Some(id) => {
                    self.session.symbol_refs.insert(ident.id, id);
                    self.session.symbols.symbol(id).type_info.clone().unwrap_or_else(TypeInfo::unknown)
                }
                None => {
                    self.error(
                        DiagnosticCode::UndefinedSymbol,
                        format!("`{}` is not declared", ident.name),
                        &ident.location,
                    );
                    TypeInfo::unknown()
                }
            },
            Expression::Binary(e) => self.type_of_binary(e),
            Expression::Unary(e) => self.type_of_unary(e),
            Expression::Call(e) => self.type_of_call(e),
            Expression::Index(e) => self.check_index_expr(e),
        };
        self.session.expr_types.insert(expr.id(), ty.clone());
        ty
    }

    fn type_of_binary(&mut self, e: &blend65_syntax::ast::BinaryExpression) -> TypeInfo {
        let left = self.type_of(&e.left);
        let right = self.type_of(&e.right);
        if left.is_unknown() || right.is_unknown() {
            return TypeInfo::unknown();
        }
        let op = e.operator;
        if op.is_logical() {
            for (ty, side) in [(&left, &e.left), (&right, &e.right)] {
                if !ty.is_boolean() {
                    let boolean = TypeInfo::boolean();
                    if self.session.types.check_compatibility(ty, &boolean).is_implicit() {
                        self.record_coercion(ty, &boolean, CoercionContext::Condition, side.id(), side.location());
                    } else {
                        self.error(
                            DiagnosticCode::TypeMismatch,
                            format!("operand of `{}` must be boolean, found `{}`", op, ty),
                            side.location(),
                        );
                    }
                }
            }
            return TypeInfo::boolean();
        }
        if op.is_comparison() {
            let ok = self.session.types.check_compatibility(&left, &right).is_implicit()
                || self.session.types.check_compatibility(&right, &left).is_implicit();
            if !ok {
                self.error(
                    DiagnosticCode::TypeMismatch,
                    format!("cannot compare `{}` with `{}`", left, right),
                    &e.location,
                );
            }
            return TypeInfo::boolean();
        }
        // Arithmetic, bitwise, shifts.
        for (ty, side) in [(&left, &e.left), (&right, &e.right)] {
            if !ty.is_numeric() {
                self.error(
                    DiagnosticCode::TypeMismatch,
                    format!("operand of `{}` must be numeric, found `{}`", op, ty),
                    side.location(),
                );
            }
        }
        TypeSystem::binary_result_type(op, &left, &right)
    }

    fn type_of_unary(&mut self, e: &blend65_syntax::ast::UnaryExpression) -> TypeInfo {
        let operand = self.type_of(&e.operand);
        if operand.is_unknown() {
            return TypeInfo::unknown();
        }
        match e.operator {
            UnaryOperator::Not => {
                if !operand.is_boolean() {
                    let boolean = TypeInfo::boolean();
                    if self.session.types.check_compatibility(&operand, &boolean).is_implicit() {
                        self.record_coercion(
                            &operand,
                            &boolean,
                            CoercionContext::Condition,
                            e.operand.id(),
                            e.operand.location(),
                        );
                    } else {
                        self.error(
                            DiagnosticCode::TypeMismatch,
                            format!("operand of `!` must be boolean, found `{}`", operand),
                            e.operand.location(),
                        );
                    }
                }
                TypeInfo::boolean()
            }
            UnaryOperator::BitNot | UnaryOperator::Negate => {
                if !operand.is_numeric() {
                    self.error(
                        DiagnosticCode::TypeMismatch,
                        format!("operand of `{}` must be numeric, found `{}`", e.operator, operand),
                        e.operand.location(),
                    );
                    return TypeInfo::unknown();
                }
                operand
            }
            UnaryOperator::AddressOf => {
                if !matches!(e.operand, Expression::Identifier(_) | Expression::Index(_)) {
                    self.error(
                        DiagnosticCode::TypeMismatch,
                        "`@` needs an addressable operand".to_string(),
                        e.operand.location(),
                    );
                }
                TypeInfo::word()
            }
        }
    }

    fn type_of_call(&mut self, e: &blend65_syntax::ast::CallExpression) -> TypeInfo {
        // Declared symbols shadow intrinsics of the same name.
        if let Some(name) = e.callee.as_identifier() {
            if self.session.symbols.lookup(name).is_none() {
                if let Some(def) = intrinsics().get(name) {
                    let def = def.clone();
                    self.session.expr_types.insert(e.callee.id(), TypeInfo::unknown());
                    return self.check_intrinsic_call(e, &def);
                }
            }
        }
        let callee_ty = self.type_of(&e.callee);
        match &callee_ty.kind {
            crate::types::TypeKind::Callback { params, return_type, .. } => {
                let params = params.clone();
                let return_type = (**return_type).clone();
                if e.arguments.len() != params.len() {
                    self.error(
                        DiagnosticCode::ArgumentCountMismatch,
                        format!("expected {} arguments, found {}", params.len(), e.arguments.len()),
                        &e.location,
                    );
                    for arg in &e.arguments {
                        self.type_of(arg);
                    }
                    return return_type;
                }
                for (arg, expected) in e.arguments.iter().zip(&params) {
                    let arg_ty = self.type_of(arg);
                    self.require_compatible(
                        &arg_ty,
                        expected,
                        CoercionContext::Argument,
                        arg.id(),
                        arg.location(),
                        DiagnosticCode::TypeMismatch,
                    );
                }
                return_type
            }
            crate::types::TypeKind::Unknown => {
                for arg in &e.arguments {
                    self.type_of(arg);
                }
                TypeInfo::unknown()
            }
            _ => {
                self.error(
                    DiagnosticCode::NotCallable,
                    format!("`{}` is not callable", callee_ty),
                    e.callee.location(),
                );
                for arg in &e.arguments {
                    self.type_of(arg);
                }
                TypeInfo::unknown()
            }
        }
    }

    fn check_intrinsic_call(
        &mut self,
        e: &blend65_syntax::ast::CallExpression,
        def: &IntrinsicDefinition,
    ) -> TypeInfo {
        if def.is_compile_time {
            // sizeof/length accept exactly one argument of any type.
            if e.arguments.len() != 1 {
                self.error(
                    DiagnosticCode::ArgumentCountMismatch,
                    format!("`{}` expects 1 argument, found {}", def.name, e.arguments.len()),
                    &e.location,
                );
            }
            for arg in &e.arguments {
                self.type_of(arg);
            }
            return def.return_type.clone();
        }
        if e.arguments.len() != def.parameter_types.len() {
            self.error(
                DiagnosticCode::ArgumentCountMismatch,
                format!(
                    "`{}` expects {} arguments, found {}",
                    def.name,
                    def.parameter_types.len(),
                    e.arguments.len()
                ),
                &e.location,
            );
            for arg in &e.arguments {
                self.type_of(arg);
            }
            return def.return_type.clone();
        }
        for (arg, expected) in e.arguments.iter().zip(&def.parameter_types) {
            let arg_ty = self.type_of(arg);
            self.require_compatible(
                &arg_ty,
                expected,
                CoercionContext::Argument,
                arg.id(),
                arg.location(),
                DiagnosticCode::TypeMismatch,
            );
        }
        def.return_type.clone()
    }
}

