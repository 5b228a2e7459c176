use ir::ast::{AssignOp, ExprKind, NodeId, Stmt, TypeRef};
use ir::errors::error::{ErrorClassification, InternalError, PassResult};
use ir::scopes::{Scope, ScopeKind};
use ir::span::SourceSpan;
use ir::symbols::builtins::VOID;
use ir::symbols::search::MethodSearch;
use ir::symbols::{SymbolDetail, SymbolId};
use crate::file_resolver::FileResolver;
use crate::operators::CheckOperatorData;

impl FileResolver<'_, '_> {
    pub fn resolve_statements(&mut self, statements: &[Stmt]) -> PassResult<()> {
        for statement in statements {
            self.resolve_statement(statement)?;
        }
        Ok(())
    }

    pub fn resolve_statement(&mut self, statement: &Stmt) -> PassResult<()> {
        match statement {
            Stmt::Declare { name, declared, initializer, constant, span } => {
                self.resolve_declaration(name, declared.as_ref(), *initializer, *constant, span)
            }
            Stmt::Assign { target, operator, value, span } => self.resolve_assignment(*target, *operator, *value, span),
            Stmt::Expression(expression) => {
                if self.standalone_super(*expression)? {
                    return Ok(());
                }
                self.resolve_expr(*expression)?;
                Ok(())
            }
            Stmt::Block(statements) => self.resolve_block(statements),
            Stmt::Switch(switch) => {
                self.resolve_switch(switch, false)?;
                Ok(())
            }
        }
    }

    pub(crate) fn resolve_block(&mut self, statements: &[Stmt]) -> PassResult<()> {
        self.ctx.scopes.push(Scope::new(ScopeKind::Block, None));
        self.resolve_statements(statements)?;
        self.ctx.scopes.pop("block")?;
        Ok(())
    }

    // `x as T: init`, `x <- init` and `x as T?`.
    pub(crate) fn resolve_declaration(
        &mut self,
        name: &str,
        declared: Option<&TypeRef>,
        initializer: Option<NodeId>,
        constant: bool,
        span: &SourceSpan,
    ) -> PassResult<()> {
        if declared.is_none() && initializer.is_none() {
            return Err(InternalError::MalformedStatement { span: span.clone(), reason: "declaration without type or value" });
        }

        let declared_type = match declared {
            Some(type_ref) => Some(self.ctx.resolve_type_ref(type_ref)),
            None => None,
        };
        let initial = match initializer {
            Some(node) if self.standalone_super(node)? => Some(None),
            Some(node) => Some(self.resolve_expr(node)?),
            None => None,
        };

        let variable = {
            let mut table = self.ctx.program.write();
            let variable = table.new_variable(name, None, span.clone());
            table.symbol_mut(variable).flags.constant = constant;
            variable
        };
        self.ctx.scopes.define(name, variable);

        let ty = match (declared_type, initial) {
            (Some(Some(declared)), Some(Some(value))) => {
                self.narrow_or_check(span, declared, value);
                Some(declared)
            }
            (Some(Some(declared)), None) => Some(declared),
            (None, Some(Some(value))) => self.inferred_type(span, name, value),
            _ => None,
        };
        let program = self.ctx.program;
        let mut table = program.write();
        if let Some(ty) = ty {
            table.set_type(variable, ty);
        }
        if initializer.is_some() {
            table.mark_initialised(variable, span);
        }
        Ok(())
    }

    /// Narrows a bare generic initializer to the declared parameterisation, otherwise checks
    /// the value can be assigned.
    fn narrow_or_check(&mut self, span: &SourceSpan, declared: SymbolId, value: SymbolId) {
        let program = self.ctx.program;
        let (narrowed, assignable, names) = {
            let mut table = program.write();
            let value_type = table.type_of(value);
            let from_generic = value_type.is_some_and(|ty| {
                table.is_generic(ty) && table.origin_of(declared).is_some_and(|origin| origin.generic == ty)
            });
            let is_expression = matches!(table.symbol(value).detail, SymbolDetail::Expression);
            if from_generic && is_expression {
                table.rebind_type(value, declared);
                (true, true, None)
            } else {
                let assignable = value_type.is_some_and(|ty| table.is_assignable(ty, declared));
                let names = value_type.map(|ty| (table.name(ty).to_string(), table.name(declared).to_string()));
                (false, assignable, names)
            }
        };
        if !narrowed && !assignable {
            if let Some((from, to)) = names {
                self.ctx.error(span, format!("'{from}' cannot be assigned to '{to}'"), ErrorClassification::IncompatibleTypes);
            }
        }
    }

    fn inferred_type(&mut self, span: &SourceSpan, name: &str, value: SymbolId) -> Option<SymbolId> {
        let program = self.ctx.program;
        let (ty, generic) = {
            let table = program.read();
            let ty = table.type_of(value);
            (ty, ty.is_some_and(|ty| table.is_generic(ty)))
        };
        match ty {
            Some(VOID) => {
                self.ctx.error(span, format!("'{name}' initialised from nothing"), ErrorClassification::ReturningMissing);
                None
            }
            Some(ty) if generic => {
                let type_name = self.ctx.name_of(ty);
                self.ctx.error(
                    span,
                    format!("'{name}' would be a bare '{type_name}'"),
                    ErrorClassification::GenericTypeOrFunctionParametersNeeded,
                );
                Some(ty)
            }
            other => other,
        }
    }

    /// `=` and `:=?` give the target a value. Every other form calls the operator of that name
    /// on the target's type, so the target must already hold a value.
    fn resolve_assignment(&mut self, target: NodeId, operator: AssignOp, value: NodeId, span: &SourceSpan) -> PassResult<()> {
        let value_symbol = if self.standalone_super(value)? { None } else { self.resolve_expr(value)? };
        let target_node = self.tree.expr(target)?.clone();
        let assigning = operator.is_assignment();

        let target_symbol = match &target_node.kind {
            ExprKind::Identifier(name) => {
                let resolved = self.resolve_identifier(name, &target_node.span, !assigning);
                if let Some(symbol) = resolved {
                    self.tree.record(target, symbol)?;
                }
                resolved
            }
            ExprKind::This if assigning => {
                self.ctx.error(&target_node.span, "'this' cannot be assigned", ErrorClassification::InappropriateUseOfThis);
                None
            }
            ExprKind::Super => {
                self.ctx.error(&target_node.span, "'super' cannot be assigned", ErrorClassification::InappropriateUseOfSuper);
                None
            }
            _ => self.resolve_expr(target)?,
        };
        let Some(target_symbol) = target_symbol else { return Ok(()) };

        let program = self.ctx.program;
        let (constant, target_type, name) = {
            let table = program.read();
            let symbol = table.symbol(target_symbol);
            (symbol.flags.constant, symbol.ty(), symbol.name.clone())
        };
        if constant {
            self.ctx.error(span, format!("'{name}'"), ErrorClassification::NotMutable);
            return Ok(());
        }

        if let (Some(target_type), Some(value_symbol)) = (target_type, value_symbol) {
            if assigning {
                self.narrow_or_check(span, target_type, value_symbol);
                if operator == AssignOp::AssignIfUnset {
                    let is_set = CheckOperatorData::new(target_type, MethodSearch::new("?"), span);
                    self.ctx.operator_or_error(&is_set);
                }
            } else if let Some(value_type) = self.ctx.type_of(value_symbol) {
                let search = MethodSearch::new(operator.text()).with_parameter(value_type);
                let data = CheckOperatorData::new(target_type, search, span).with_origin(self.operand_origin(target)?);
                self.ctx.operator_or_error(&data);
            }
            self.not_self_assigned_or_error(span, target_symbol, value, value_symbol)?;
        }
        if assigning {
            program.write().mark_initialised(target_symbol, span);
        }
        Ok(())
    }

    // `x = x` or `x += (x)`: the value is the very variable being assigned.
    fn not_self_assigned_or_error(
        &mut self,
        span: &SourceSpan,
        target: SymbolId,
        mut value: NodeId,
        value_symbol: SymbolId,
    ) -> PassResult<()> {
        while let ExprKind::Paren(inner) = self.tree.expr(value)?.kind {
            value = inner;
        }
        if target != value_symbol || !matches!(self.tree.expr(value)?.kind, ExprKind::Identifier(_)) {
            return Ok(());
        }
        let (name, text) = (self.ctx.friendly_name(target), self.tree.expr(value)?.text.clone());
        self.ctx.error(span, format!("'{name}' and '{text}'"), ErrorClassification::SelfAssignment);
        Ok(())
    }

    // `super` is only meaningful as the target of a call or access.
    fn standalone_super(&mut self, node: NodeId) -> PassResult<bool> {
        let expression = self.tree.expr(node)?;
        if !matches!(expression.kind, ExprKind::Super) {
            return Ok(false);
        }
        let span = expression.span.clone();
        self.ctx.error(&span, "'super' used on its own", ErrorClassification::InappropriateUseOfSuper);
        Ok(true)
    }
}
