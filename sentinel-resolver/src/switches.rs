//! `switch` as a statement and as an expression.
//!
//! Cases compare each value with the control through `==`, or through the operator written
//! after `case`. Switching on an enumeration with plain value cases must name every value once.
//! A `default` is always required.

use ir::ast::{AccessStep, ExprKind, ExprNode, NodeId, Switch};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::scopes::{Scope, ScopeKind};
use ir::span::SourceSpan;
use ir::symbols::search::MethodSearch;
use ir::symbols::{Genus, SymbolId};
use crate::file_resolver::FileResolver;
use crate::operators::CheckOperatorData;

enum CaseLookup {
    Found,
    Assumed,
    Missing(String),
    Skipped,
}

impl FileResolver<'_, '_> {
    /// Resolves the switch in a scope of its own and returns its returning variable, if any.
    pub(crate) fn resolve_switch(
        &mut self,
        switch: &Switch,
        as_expression: bool,
    ) -> PassResult<Option<SymbolId>> {
        self.ctx.scopes.push(Scope::new(ScopeKind::Block, None));
        let returning = match &switch.returning {
            Some(returning) => {
                self.resolve_declaration(
                    &returning.name,
                    returning.declared.as_ref(),
                    returning.initializer,
                    false,
                    &returning.span,
                )?;
                self.ctx.scopes.resolve(&returning.name)
            }
            None => None,
        };

        let control_symbol = self.resolve_expr(switch.control)?;
        let control_type = self.type_of_resolved(control_symbol);
        let control_text = self.tree.expr(switch.control)?.text.clone();
        for case in &switch.cases {
            let operator = case.operator.as_deref().unwrap_or("==");
            for value in &case.matches {
                let symbol = self.resolve_expr(*value)?;
                if let (Some(control), Some(case_type)) = (control_type, self.type_of_resolved(symbol)) {
                    let span = self.tree.span(*value)?;
                    self.case_operator_or_error(&span, &control_text, control, operator, case_type);
                }
            }
            self.resolve_block(&case.body)?;
        }
        if let Some(default) = &switch.default {
            self.resolve_block(default)?;
        }

        if let Some(control) = control_type {
            self.enumerated_cases_or_error(switch, control)?;
            if switch.default.is_none() {
                let classification = if as_expression {
                    ErrorClassification::DefaultRequiredInSwitchExpression
                } else {
                    ErrorClassification::DefaultRequiredInSwitchStatement
                };
                self.ctx.error(&switch.span, format!("wrt '{control_text}'"), classification);
            }
        }
        self.ctx.scopes.pop("switch")?;
        Ok(returning)
    }

    /// A switch expression is typed by its returning variable.
    pub(crate) fn resolve_switch_expression(
        &mut self,
        node: &ExprNode,
        switch: &Switch,
    ) -> PassResult<Option<SymbolId>> {
        let returning = self.resolve_switch(switch, true)?;
        if switch.returning.is_none() {
            let message = "switch expression without a returning variable";
            self.ctx.error(&node.span, message, ErrorClassification::ReturningMissing);
            return Ok(None);
        }
        let Some(ty) = returning.and_then(|variable| self.ctx.type_of(variable)) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, ty)))
    }

    fn case_operator_or_error(
        &mut self,
        span: &SourceSpan,
        control_text: &str,
        control: SymbolId,
        operator: &str,
        case_type: SymbolId,
    ) {
        let search = MethodSearch::new(operator).with_parameter(case_type);
        let lookup = {
            let table = self.ctx.program.read();
            let control_symbol = table.symbol(control);
            if control_symbol.as_type_parameter().is_some() {
                CaseLookup::Assumed
            } else if control_symbol.as_aggregate().is_none() {
                CaseLookup::Skipped
            } else if table.resolve_matching_methods(control, &search).single_best_match().is_some() {
                CaseLookup::Found
            } else {
                CaseLookup::Missing(table.describe(&search).to_string())
            }
        };
        match lookup {
            CaseLookup::Found | CaseLookup::Skipped => {}
            CaseLookup::Assumed => {
                self.ctx.operator_or_error(&CheckOperatorData::new(control, search, span));
            }
            CaseLookup::Missing(described) => {
                let message = format!("wrt '{control_text}' and '{described}'");
                self.ctx.error(span, message, ErrorClassification::MethodNotResolved);
            }
        }
    }

    // Only applies when every case value is written as `Enumeration.Value` of the control's
    // own enumeration.
    fn enumerated_cases_or_error(&mut self, switch: &Switch, control: SymbolId) -> PassResult<()> {
        let values: Vec<String> = {
            let table = self.ctx.program.read();
            if table.symbol(control).genus != Genus::ClassEnumeration {
                return Ok(());
            }
            table.properties_of(control).iter().map(|value| table.name(*value).to_string()).collect()
        };

        let mut encountered: Vec<(String, SourceSpan)> = Vec::new();
        for case in &switch.cases {
            for value in &case.matches {
                let Some(name) = self.enumerated_value(*value, control)? else { return Ok(()) };
                let span = self.tree.span(*value)?;
                let earlier = encountered.iter().find(|(seen, _)| *seen == name).map(|(_, at)| at.line);
                if let Some(line) = earlier {
                    self.ctx.error(
                        &case.span,
                        format!("wrt: '{name}' already encountered on line {line}"),
                        ErrorClassification::DuplicateEnumeratedValuesPresentInSwitch,
                    );
                }
                encountered.push((name, span));
            }
        }

        let missing: Vec<&str> = values.iter()
            .filter(|value| !encountered.iter().any(|(seen, _)| seen == *value))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            self.ctx.error(
                &switch.span,
                format!("should cover values: {}", missing.join(", ")),
                ErrorClassification::NotAllEnumeratedValuesPresentInSwitch,
            );
        }
        Ok(())
    }

    fn enumerated_value(&self, value: NodeId, control: SymbolId) -> PassResult<Option<String>> {
        let ExprKind::ObjectAccess { steps, .. } = &self.tree.expr(value)?.kind else { return Ok(None) };
        let Some(AccessStep::Field { name, .. }) = steps.last() else { return Ok(None) };
        let exact = self.type_of_resolved(self.tree.recorded(value)) == Some(control);
        Ok(exact.then(|| name.clone()))
    }
}
