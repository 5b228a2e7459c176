use ir::ast::{ExprKind, ExprNode, NodeId};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::symbols::builtins::{BOOLEAN, INTEGER};
use ir::symbols::search::MethodSearch;
use ir::symbols::SymbolId;
use crate::file_resolver::FileResolver;
use crate::operators::CheckOperatorData;

impl FileResolver<'_, '_> {
    pub(super) fn resolve_unary(&mut self, node: &ExprNode, operator: &str, operand: NodeId) -> PassResult<Option<SymbolId>> {
        let Some(symbol) = self.resolve_expr(operand)? else { return Ok(None) };
        let Some(ty) = self.ctx.type_of(symbol) else { return Ok(None) };
        let data = CheckOperatorData::new(ty, MethodSearch::new(operator), &node.span)
            .with_origin(self.operand_origin(operand)?)
            .naming_type(self.names_type(symbol));
        let Some(resolved) = self.ctx.operator_or_error(&data) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, resolved.returning)))
    }

    pub(super) fn resolve_binary(
        &mut self,
        node: &ExprNode,
        operator: &str,
        left: NodeId,
        right: NodeId,
    ) -> PassResult<Option<SymbolId>> {
        let left_symbol = self.resolve_expr(left)?;
        let right_symbol = self.resolve_expr(right)?;
        let (Some(left_symbol), Some(right_type)) = (left_symbol, self.type_of_resolved(right_symbol)) else {
            return Ok(None);
        };
        let Some(left_type) = self.ctx.type_of(left_symbol) else { return Ok(None) };

        let data = CheckOperatorData::new(left_type, MethodSearch::new(operator).with_parameter(right_type), &node.span)
            .with_origin(self.operand_origin(left)?)
            .naming_type(self.names_type(left_symbol));
        let Some(resolved) = self.ctx.operator_or_error(&data) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, resolved.returning)))
    }

    /// `a ?? b` and `a ?: b`: both sides share a type that supports `?`.
    pub(super) fn resolve_coalescing(&mut self, node: &ExprNode, left: NodeId, right: NodeId) -> PassResult<Option<SymbolId>> {
        let Some(common) = self.common_of(node, &[left, right])? else { return Ok(None) };
        let is_set = CheckOperatorData::new(common, MethodSearch::new("?"), &node.span);
        if self.ctx.operator_or_error(&is_set).is_none() {
            return Ok(None);
        }
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, common)))
    }

    /// `a <? b` and friends: the shared type needs both `?` and `<=>`.
    pub(super) fn resolve_coalescing_equality(
        &mut self,
        node: &ExprNode,
        left: NodeId,
        right: NodeId,
    ) -> PassResult<Option<SymbolId>> {
        let Some(common) = self.common_of(node, &[left, right])? else { return Ok(None) };
        let is_set = CheckOperatorData::new(common, MethodSearch::new("?"), &node.span);
        let compare = CheckOperatorData::new(common, MethodSearch::new("<=>").with_parameter(common), &node.span);
        let is_set = self.ctx.operator_or_error(&is_set);
        let compare = self.ctx.operator_or_error(&compare);
        if is_set.is_none() || compare.is_none() {
            return Ok(None);
        }
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, common)))
    }

    pub(super) fn resolve_ternary(
        &mut self,
        node: &ExprNode,
        control: NodeId,
        when_true: NodeId,
        when_false: NodeId,
    ) -> PassResult<Option<SymbolId>> {
        let control_symbol = self.resolve_expr(control)?;
        let control_type = self.type_of_resolved(control_symbol);
        let boolean_control = match control_type {
            Some(ty) if self.ctx.is_assignable(ty, BOOLEAN) => true,
            Some(ty) => {
                let name = self.ctx.name_of(ty);
                let span = self.tree.span(control)?;
                self.ctx.error(&span, format!("control is '{name}'"), ErrorClassification::MustBeABoolean);
                false
            }
            None => false,
        };
        let common = self.common_of(node, &[when_true, when_false])?;
        match common {
            Some(common) if boolean_control => Ok(Some(self.ctx.new_expression(&node.text, &node.span, common))),
            _ => Ok(None),
        }
    }

    /// A range is typed as its element type.
    pub(super) fn resolve_range(&mut self, node: &ExprNode, start: NodeId, end: NodeId) -> PassResult<Option<SymbolId>> {
        let Some(common) = self.common_of(node, &[start, end])? else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, common)))
    }

    /// `x in a ..< b` compares against the range's element type; `x in items` asks the container.
    /// `x not in ...` negates the outcome with the Boolean's `~`.
    pub(super) fn resolve_in(
        &mut self,
        node: &ExprNode,
        operand: NodeId,
        container: NodeId,
        negated: bool,
    ) -> PassResult<Option<SymbolId>> {
        let operand_symbol = self.resolve_expr(operand)?;
        let container_symbol = self.resolve_expr(container)?;
        let (Some(operand_type), Some(container_type)) =
            (self.type_of_resolved(operand_symbol), self.type_of_resolved(container_symbol))
        else {
            return Ok(None);
        };

        let search = if self.is_range(container)? {
            MethodSearch::new("<=>").with_parameter(operand_type).returning(INTEGER)
        } else {
            MethodSearch::new("contains").with_parameter(operand_type).returning(BOOLEAN)
        };
        let data = CheckOperatorData::new(container_type, search, &node.span);
        if self.ctx.operator_or_error(&data).is_none() {
            return Ok(None);
        }
        if !negated {
            return Ok(Some(self.ctx.new_expression(&node.text, &node.span, BOOLEAN)));
        }

        let not = CheckOperatorData::new(BOOLEAN, MethodSearch::new("~"), &node.span);
        let Some(negation) = self.ctx.operator_or_error(&not) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, negation.returning)))
    }

    fn is_range(&self, mut id: NodeId) -> PassResult<bool> {
        loop {
            match self.tree.expr(id)?.kind {
                ExprKind::Paren(inner) => id = inner,
                ExprKind::Range { .. } => return Ok(true),
                _ => return Ok(false),
            }
        }
    }

    fn common_of(&mut self, node: &ExprNode, operands: &[NodeId]) -> PassResult<Option<SymbolId>> {
        let Some(types) = self.resolve_all(operands)? else { return Ok(None) };
        Ok(self.ctx.common_type_or_error(&node.span, &types))
    }
}
