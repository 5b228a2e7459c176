use ir::ast::{AccessStep, ExprNode, NodeId};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::span::SourceSpan;
use ir::symbols::search::MethodSearch;
use ir::symbols::{Genus, SymbolId};
use crate::file_resolver::FileResolver;
use crate::operators::{CheckOperatorData, OperandOrigin};

enum MethodLookup {
    Method { method: SymbolId, owner: SymbolId, returning: SymbolId, pure: bool, friendly: String },
    Delegate { function: SymbolId, property: SymbolId, owner: SymbolId },
    /// Resolved through the operator rules: type parameters and enumeration types.
    Operator,
    Failed(ErrorClassification, String),
}

impl FileResolver<'_, '_> {
    /// `target.field.call(args)...`: each step is resolved on the type the previous one produced.
    pub(super) fn resolve_object_access(
        &mut self,
        node: &ExprNode,
        target: NodeId,
        steps: &[AccessStep],
    ) -> PassResult<Option<SymbolId>> {
        let Some(symbol) = self.resolve_expr(target)? else { return Ok(None) };
        let Some(mut current) = self.ctx.type_of(symbol) else { return Ok(None) };
        let mut origin = self.operand_origin(target)?;
        let mut naming_type = self.names_type(symbol);

        for step in steps {
            let next = match step {
                AccessStep::Field { name, span } => self.resolve_field(current, name, span),
                AccessStep::Call { name, arguments, span } => {
                    self.resolve_method_call(current, name, arguments, span, origin, naming_type)?
                }
            };
            let Some(next) = next else { return Ok(None) };
            current = next;
            origin = OperandOrigin::Other;
            naming_type = false;
        }
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, current)))
    }

    fn resolve_field(&mut self, current: SymbolId, name: &str, span: &SourceSpan) -> Option<SymbolId> {
        let program = self.ctx.program;
        let (found, type_name) = {
            let table = program.read();
            (table.resolve_property(current, name), table.name(current).to_string())
        };
        let Some((owner, property)) = found else {
            self.ctx.error(span, format!("'.{name}' on '{type_name}'"), ErrorClassification::NotResolved);
            return None;
        };
        if !self.ctx.accessible_or_error(span, property, owner) {
            return None;
        }
        let property = self.typed_or_error(span, property)?;
        self.ctx.type_of(property)
    }

    fn resolve_method_call(
        &mut self,
        current: SymbolId,
        name: &str,
        arguments: &[NodeId],
        span: &SourceSpan,
        origin: OperandOrigin,
        naming_type: bool,
    ) -> PassResult<Option<SymbolId>> {
        let Some(argument_types) = self.resolve_all(arguments)? else { return Ok(None) };
        let search = MethodSearch::new(name).with_parameters(&argument_types);

        let program = self.ctx.program;
        let lookup = {
            let table = program.read();
            let type_symbol = table.symbol(current);
            let enumeration_type = naming_type && type_symbol.genus == Genus::ClassEnumeration;
            if enumeration_type || type_symbol.as_type_parameter().is_some() {
                MethodLookup::Operator
            } else if type_symbol.as_aggregate().is_none() {
                MethodLookup::Failed(
                    ErrorClassification::MethodNotResolved,
                    format!("'{}' on '{}'", table.describe(&search), type_symbol.name),
                )
            } else {
                let result = table.resolve_matching_methods(current, &search);
                if let Some(method) = result.single_best_match() {
                    let symbol = table.symbol(method);
                    MethodLookup::Method {
                        method,
                        owner: symbol.as_method().map(|m| m.owner).unwrap_or(current),
                        returning: table.return_type(method),
                        pure: symbol.is_pure(),
                        friendly: table.friendly_name(method),
                    }
                } else if result.is_ambiguous() {
                    let candidates: Vec<String> = result.best_matches().iter().map(|m| table.friendly_name(*m)).collect();
                    MethodLookup::Failed(
                        ErrorClassification::MethodAmbiguous,
                        format!("'{}' could be {}", table.describe(&search), candidates.join(" or ")),
                    )
                } else {
                    let delegate = table.resolve_property(current, name).and_then(|(owner, property)| {
                        let ty = table.type_of(property)?;
                        table.symbol(ty).as_function().map(|_| MethodLookup::Delegate { function: ty, property, owner })
                    });
                    delegate.unwrap_or_else(|| MethodLookup::Failed(
                        ErrorClassification::MethodNotResolved,
                        format!("'{}' on '{}'", table.describe(&search), type_symbol.name),
                    ))
                }
            }
        };

        match lookup {
            MethodLookup::Method { method, owner, returning, pure, friendly } => {
                self.ctx.accessible_or_error(span, method, owner);
                let exempt = self.ctx.scopes.in_constructor() && origin == OperandOrigin::This;
                if !pure && self.ctx.scopes.is_pure() && !exempt {
                    self.ctx.error(span, format!("'{friendly}'"), ErrorClassification::NonePureCallInPureScope);
                }
                Ok(Some(returning))
            }
            MethodLookup::Delegate { function, property, owner } => {
                if !self.ctx.accessible_or_error(span, property, owner) {
                    return Ok(None);
                }
                Ok(self.delegate_return(span, function, &search))
            }
            MethodLookup::Operator => {
                let data = CheckOperatorData::new(current, search, span)
                    .with_origin(origin)
                    .naming_type(naming_type);
                Ok(self.ctx.operator_or_error(&data).map(|resolved| resolved.returning))
            }
            MethodLookup::Failed(classification, message) => {
                self.ctx.error(span, message, classification);
                Ok(None)
            }
        }
    }

    fn delegate_return(&mut self, span: &SourceSpan, function: SymbolId, search: &MethodSearch) -> Option<SymbolId> {
        let program = self.ctx.program;
        let (weight, returning, friendly) = {
            let table = program.read();
            (table.method_weight(function, search), table.return_type(function), table.friendly_name(function))
        };
        if weight.is_none() {
            let described = program.read().describe(search).to_string();
            self.ctx.error(span, format!("'{described}' does not match '{friendly}'"), ErrorClassification::MethodNotResolved);
            return None;
        }
        Some(returning)
    }
}
