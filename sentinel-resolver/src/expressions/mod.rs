//! Typing of expression nodes.
//!
//! Every resolved node gets exactly one symbol recorded against it and that symbol is typed.
//! When a child fails the parent returns `None` without a diagnostic of its own; the failing
//! child has already reported why.

mod access;
mod calls;
mod operations;

use ir::ast::{ExprKind, ExprNode, Literal, NodeId};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::span::SourceSpan;
use ir::symbols::builtins::{ANY, BOOLEAN, CHARACTER, FLOAT, INTEGER, STRING};
use ir::symbols::search::MethodSearch;
use ir::symbols::{SymbolDetail, SymbolId};
use crate::file_resolver::FileResolver;
use crate::operators::{CheckOperatorData, OperandOrigin};

impl FileResolver<'_, '_> {
    pub fn resolve_expr(&mut self, id: NodeId) -> PassResult<Option<SymbolId>> {
        if let Some(existing) = self.tree.recorded(id) {
            return Ok(Some(existing));
        }
        let node = self.tree.expr(id)?.clone();
        let resolved = match &node.kind {
            ExprKind::Literal(literal) => Some(self.resolve_literal(&node, literal)),
            ExprKind::Identifier(name) => self.resolve_identifier(name, &node.span, true),
            ExprKind::This => self.resolve_this(&node),
            ExprKind::Super => self.resolve_super(&node),
            ExprKind::Paren(inner) => self.resolve_expr(*inner)?,
            ExprKind::Call { name, type_arguments, arguments } => {
                self.resolve_call(&node, name, type_arguments, arguments)?
            }
            ExprKind::List(elements) => self.resolve_list(&node, elements)?,
            ExprKind::Dict(entries) => self.resolve_dict(&node, entries)?,
            ExprKind::Unary { operator, operand } => self.resolve_unary(&node, operator, *operand)?,
            ExprKind::Binary { operator, left, right } => self.resolve_binary(&node, operator, *left, *right)?,
            ExprKind::IsSet(operand) => self.resolve_unary(&node, "?", *operand)?,
            ExprKind::Coalescing { left, right, .. } => self.resolve_coalescing(&node, *left, *right)?,
            ExprKind::CoalescingEquality { left, right, .. } => {
                self.resolve_coalescing_equality(&node, *left, *right)?
            }
            ExprKind::Ternary { control, when_true, when_false } => {
                self.resolve_ternary(&node, *control, *when_true, *when_false)?
            }
            ExprKind::Range { start, end } => self.resolve_range(&node, *start, *end)?,
            ExprKind::In { operand, container, negated } => self.resolve_in(&node, *operand, *container, *negated)?,
            ExprKind::ObjectAccess { target, steps } => self.resolve_object_access(&node, *target, steps)?,
            ExprKind::Stream(pipeline) => self.resolve_stream(&node, pipeline)?,
            ExprKind::ConstructorCall { reference, arguments } => {
                self.resolve_constructor_call(id, &node, *reference, arguments)?
            }
            ExprKind::Switch(switch) => self.resolve_switch_expression(&node, switch)?,
        };

        if let Some(symbol) = resolved {
            self.tree.record(id, symbol)?;
            if node.in_string_interpolation {
                self.string_convertible_or_error(&node.span, symbol);
            }
        }
        Ok(resolved)
    }

    fn resolve_literal(&mut self, node: &ExprNode, literal: &Literal) -> SymbolId {
        let ty = match literal {
            Literal::Integer(_) => INTEGER,
            Literal::Float(_) => FLOAT,
            Literal::String(_) => STRING,
            Literal::Boolean(_) => BOOLEAN,
            Literal::Character(_) => CHARACTER,
        };
        self.ctx.new_expression(&node.text, &node.span, ty)
    }

    /// Locals and parameters first, then properties of the enclosing aggregate, then module names.
    pub(crate) fn resolve_identifier(&mut self, name: &str, span: &SourceSpan, reading: bool) -> Option<SymbolId> {
        let program = self.ctx.program;
        let symbol = if let Some(local) = self.ctx.scopes.resolve(name) {
            let uninitialised = {
                let mut table = program.write();
                table.mark_referenced(local);
                let symbol = table.symbol(local);
                matches!(symbol.detail, SymbolDetail::Variable)
                    && !symbol.flags.property
                    && !symbol.flags.incoming_parameter
                    && !symbol.is_initialised()
            };
            if reading && uninitialised {
                self.ctx.error(span, format!("'{name}'"), ErrorClassification::NotInitialisedBeforeUse);
            }
            local
        } else if let Some((owner, property)) = self.property_in_scope(name) {
            if !self.ctx.accessible_or_error(span, property, owner) {
                return None;
            }
            property
        } else if let Some(module_level) = program.read().resolve_name(name) {
            module_level
        } else {
            self.ctx.error(span, format!("'{name}'"), ErrorClassification::NotResolved);
            return None;
        };
        self.typed_or_error(span, symbol)
    }

    fn property_in_scope(&self, name: &str) -> Option<(SymbolId, SymbolId)> {
        let aggregate = self.ctx.scopes.enclosing_aggregate()?;
        self.ctx.program.read().resolve_property(aggregate, name)
    }

    fn resolve_this(&mut self, node: &ExprNode) -> Option<SymbolId> {
        let Some(aggregate) = self.ctx.scopes.enclosing_aggregate() else {
            self.ctx.error(&node.span, "'this' outside of an aggregate", ErrorClassification::InappropriateUseOfThis);
            return None;
        };
        Some(self.ctx.new_expression(&node.text, &node.span, aggregate))
    }

    fn resolve_super(&mut self, node: &ExprNode) -> Option<SymbolId> {
        let super_type = self.ctx.scopes.enclosing_aggregate()
            .and_then(|aggregate| self.ctx.program.read().super_type(aggregate))
            .filter(|super_type| *super_type != ANY);
        let Some(super_type) = super_type else {
            self.ctx.error(&node.span, "'super' without a super type", ErrorClassification::InappropriateUseOfSuper);
            return None;
        };
        Some(self.ctx.new_expression(&node.text, &node.span, super_type))
    }

    /// The type of an already resolved symbol, reporting TYPE_NOT_RESOLVED when it has none.
    pub(crate) fn typed_or_error(&mut self, span: &SourceSpan, symbol: SymbolId) -> Option<SymbolId> {
        if self.ctx.type_of(symbol).is_some() {
            return Some(symbol);
        }
        let name = self.ctx.name_of(symbol);
        self.ctx.error(span, format!("'{name}' has no type"), ErrorClassification::TypeNotResolved);
        None
    }

    pub(crate) fn type_of_resolved(&self, symbol: Option<SymbolId>) -> Option<SymbolId> {
        symbol.and_then(|symbol| self.ctx.type_of(symbol))
    }

    pub(crate) fn resolve_all(&mut self, ids: &[NodeId]) -> PassResult<Option<Vec<SymbolId>>> {
        let mut types = Vec::with_capacity(ids.len());
        let mut complete = true;
        for id in ids {
            let symbol = self.resolve_expr(*id)?;
            match self.type_of_resolved(symbol) {
                Some(ty) => types.push(ty),
                None => complete = false,
            }
        }
        Ok(complete.then_some(types))
    }

    pub(crate) fn operand_origin(&self, id: NodeId) -> PassResult<OperandOrigin> {
        Ok(match self.tree.expr(id)?.kind {
            ExprKind::This => OperandOrigin::This,
            ExprKind::Super => OperandOrigin::Super,
            _ => OperandOrigin::Other,
        })
    }

    /// A type name used as a value, such as an enumeration.
    pub(crate) fn names_type(&self, symbol: SymbolId) -> bool {
        let table = self.ctx.program.read();
        let resolved = table.symbol(symbol);
        resolved.is_type() && resolved.ty() == Some(symbol)
    }

    fn string_convertible_or_error(&mut self, span: &SourceSpan, symbol: SymbolId) {
        let Some(ty) = self.ctx.type_of(symbol) else { return };
        if ty == STRING {
            return;
        }
        let (is_parameter, convertible, name) = {
            let table = self.ctx.program.read();
            let search = MethodSearch::new("$");
            let convertible = table.promotion_of(ty) == Some(STRING)
                || (table.symbol(ty).as_aggregate().is_some() && !table.resolve_matching_methods(ty, &search).is_empty());
            (table.symbol(ty).as_type_parameter().is_some(), convertible, table.name(ty).to_string())
        };
        if is_parameter {
            self.ctx.operator_or_error(&CheckOperatorData::new(ty, MethodSearch::new("$"), span));
        } else if !convertible {
            self.ctx.error(span, format!("'{name}'"), ErrorClassification::TypeMustBeConvertableToString);
        }
    }
}
