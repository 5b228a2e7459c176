use ir::ast::{ExprNode, NodeId, PrimaryReference, TypeRef};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::scopes::ScopeKind;
use ir::span::SourceSpan;
use ir::symbols::builtins::{ANY, DICT, LIST};
use ir::symbols::search::MethodSearch;
use ir::symbols::table::SymbolTable;
use ir::symbols::{Genus, SymbolId};
use crate::file_resolver::FileResolver;

impl FileResolver<'_, '_> {
    /// A call by name: a delegate variable in scope, a module function, or a constructor.
    pub(super) fn resolve_call(
        &mut self,
        node: &ExprNode,
        name: &str,
        type_arguments: &[TypeRef],
        arguments: &[NodeId],
    ) -> PassResult<Option<SymbolId>> {
        let Some(argument_types) = self.resolve_all(arguments)? else { return Ok(None) };

        if let Some(variable) = self.ctx.scopes.resolve(name) {
            return Ok(self.call_delegate(node, variable, &argument_types));
        }
        let program = self.ctx.program;
        let target = program.read().resolve_name(name);
        let Some(target) = target else {
            self.ctx.error(&node.span, format!("'{name}()'"), ErrorClassification::NotResolved);
            return Ok(None);
        };

        let (is_function, is_aggregate) = {
            let table = program.read();
            let symbol = table.symbol(target);
            (symbol.as_function().is_some(), symbol.as_aggregate().is_some())
        };
        if is_function {
            Ok(self.call_function(node, target, type_arguments, &argument_types))
        } else if is_aggregate {
            Ok(self.construct(node, target, type_arguments, &argument_types))
        } else {
            self.ctx.error(&node.span, format!("'{name}' cannot be called"), ErrorClassification::NotResolved);
            Ok(None)
        }
    }

    fn call_function(
        &mut self,
        node: &ExprNode,
        function: SymbolId,
        type_arguments: &[TypeRef],
        argument_types: &[SymbolId],
    ) -> Option<SymbolId> {
        let program = self.ctx.program;
        let (generic, is_abstract) = {
            let table = program.read();
            (table.is_generic(function), table.symbol(function).is_abstract())
        };

        let function = if generic {
            let arguments = if type_arguments.is_empty() {
                let inferred = infer_type_arguments(&program.read(), function, argument_types);
                let Some(inferred) = inferred else {
                    let name = self.ctx.name_of(function);
                    self.ctx.error(&node.span, format!("'{name}'"), ErrorClassification::GenericTypeOrFunctionParametersNeeded);
                    return None;
                };
                inferred
            } else {
                self.resolve_type_arguments(type_arguments)?
            };
            self.ctx.parameterised_or_error(&node.span, function, &arguments)?
        } else {
            if !type_arguments.is_empty() {
                let name = self.ctx.name_of(function);
                self.ctx.error(
                    &node.span,
                    format!("'{name}' is not generic"),
                    ErrorClassification::GenericTypeOrFunctionParametersIncorrect,
                );
                return None;
            }
            function
        };

        if is_abstract {
            let name = self.ctx.name_of(function);
            self.ctx.error(&node.span, format!("'{name}'"), ErrorClassification::CannotCallAbstractType);
            return None;
        }
        self.invoke(node, function, argument_types)
    }

    fn call_delegate(&mut self, node: &ExprNode, variable: SymbolId, argument_types: &[SymbolId]) -> Option<SymbolId> {
        let variable = self.typed_or_error(&node.span, variable)?;
        let program = self.ctx.program;
        let (function_type, name) = {
            let mut table = program.write();
            table.mark_referenced(variable);
            let ty = table.type_of(variable);
            let function_type = ty.filter(|ty| table.symbol(*ty).as_function().is_some());
            (function_type, table.name(variable).to_string())
        };
        let Some(function_type) = function_type else {
            self.ctx.error(&node.span, format!("'{name}' is not a function delegate"), ErrorClassification::TypeMustBeFunction);
            return None;
        };
        self.invoke(node, function_type, argument_types)
    }

    /// Checks the arguments against a function's parameters and types the call by its return.
    fn invoke(&mut self, node: &ExprNode, function: SymbolId, argument_types: &[SymbolId]) -> Option<SymbolId> {
        let program = self.ctx.program;
        let (weight, pure, returning, described, friendly) = {
            let table = program.read();
            let search = MethodSearch::new(table.name(function)).with_parameters(argument_types);
            (
                table.method_weight(function, &search),
                table.symbol(function).is_pure(),
                table.return_type(function),
                table.describe(&search).to_string(),
                table.friendly_name(function),
            )
        };
        if weight.is_none() {
            self.ctx.error(
                &node.span,
                format!("'{described}' does not match '{friendly}'"),
                ErrorClassification::MethodNotResolved,
            );
            return None;
        }
        if !pure && self.ctx.scopes.is_pure() {
            self.ctx.error(&node.span, format!("'{friendly}'"), ErrorClassification::NonePureCallInPureScope);
        }
        Some(self.ctx.new_expression(&node.text, &node.span, returning))
    }

    fn construct(
        &mut self,
        node: &ExprNode,
        ty: SymbolId,
        type_arguments: &[TypeRef],
        argument_types: &[SymbolId],
    ) -> Option<SymbolId> {
        let program = self.ctx.program;
        let generic = program.read().is_generic(ty);

        let ty = if !type_arguments.is_empty() {
            let arguments = self.resolve_type_arguments(type_arguments)?;
            self.ctx.parameterised_or_error(&node.span, ty, &arguments)?
        } else if generic && !argument_types.is_empty() {
            let inferred = {
                let table = program.read();
                table.constructors_of(ty).into_iter()
                    .find_map(|constructor| infer_type_arguments_for(&table, ty, constructor, argument_types))
            };
            let Some(inferred) = inferred else {
                let name = self.ctx.name_of(ty);
                self.ctx.error(&node.span, format!("'{name}'"), ErrorClassification::GenericTypeOrFunctionParametersNeeded);
                return None;
            };
            self.ctx.parameterised_or_error(&node.span, ty, &inferred)?
        } else {
            ty
        };

        let (is_abstract, type_name) = {
            let table = program.read();
            let symbol = table.symbol(ty);
            (symbol.is_abstract() || symbol.genus == Genus::ClassTrait, symbol.name.clone())
        };
        if is_abstract {
            self.ctx.error(&node.span, format!("'{type_name}' cannot be constructed"), ErrorClassification::TypeIsAbstract);
            return None;
        }

        if !self.constructor_or_error(&node.span, ty, argument_types) {
            return None;
        }
        Some(self.ctx.new_expression(&node.text, &node.span, ty))
    }

    /// Finds the one constructor of `ty` that accepts `argument_types`. A type that declares no
    /// constructors can still be built without arguments.
    fn constructor_or_error(&mut self, span: &SourceSpan, ty: SymbolId, argument_types: &[SymbolId]) -> bool {
        let program = self.ctx.program;
        let (best, tied, described, pure) = {
            let table = program.read();
            let search = MethodSearch::new(table.name(ty)).with_parameters(argument_types);
            let constructors = table.constructors_of(ty);
            if constructors.is_empty() && argument_types.is_empty() {
                return true;
            }
            let mut weighted: Vec<(u32, SymbolId)> = constructors.iter()
                .filter_map(|c| table.method_weight(*c, &search).map(|w| (w, *c)))
                .collect();
            weighted.sort_by_key(|(weight, _)| *weight);
            let best = weighted.first().copied();
            let tied: Vec<String> = weighted.iter()
                .filter(|(weight, _)| Some(*weight) == best.map(|(w, _)| w))
                .map(|(_, c)| table.friendly_name(*c))
                .collect();
            let pure = best.is_some_and(|(_, c)| table.symbol(c).is_pure());
            (best.map(|(_, c)| c), tied, table.describe(&search).to_string(), pure)
        };

        let Some(constructor) = best else {
            self.ctx.error(span, format!("constructor '{described}'"), ErrorClassification::MethodNotResolved);
            return false;
        };
        if tied.len() > 1 {
            self.ctx.error(span, format!("'{described}' could be {}", tied.join(" or ")), ErrorClassification::MethodAmbiguous);
            return false;
        }
        self.ctx.accessible_or_error(span, constructor, ty);
        if !pure && self.ctx.scopes.is_pure() {
            self.ctx.error(span, format!("constructor '{described}'"), ErrorClassification::NonePureCallInPureScope);
        }
        true
    }

    /// `this(...)` and `super(...)` hand construction to another constructor of this type or of
    /// its super. Only a constructor may do so, and only as its first statement.
    pub(super) fn resolve_constructor_call(
        &mut self,
        id: NodeId,
        node: &ExprNode,
        reference: PrimaryReference,
        arguments: &[NodeId],
    ) -> PassResult<Option<SymbolId>> {
        let in_method = self.ctx.scopes.nearest_non_block().kind == ScopeKind::Method;
        let Some(aggregate) = self.ctx.scopes.enclosing_aggregate().filter(|_| in_method) else {
            let classification = match reference {
                PrimaryReference::This => ErrorClassification::InappropriateUseOfThis,
                PrimaryReference::Super => ErrorClassification::InappropriateUseOfSuper,
            };
            self.ctx.error(&node.span, format!("'{}()' outside of a method", reference.text()), classification);
            return Ok(None);
        };
        if !self.ctx.scopes.in_constructor() {
            let classification = ErrorClassification::ThisAndSuperCallsOnlyInConstructor;
            self.ctx.error(&node.span, format!("'{}()'", reference.text()), classification);
            return Ok(None);
        }
        if self.leading_statement != Some(id) {
            let classification = ErrorClassification::ThisAndSuperMustBeFirstInConstructor;
            self.ctx.error(&node.span, format!("'{}()'", reference.text()), classification);
        }

        let target = match reference {
            PrimaryReference::This => Some(aggregate),
            PrimaryReference::Super => self.ctx.program.read().super_type(aggregate).filter(|super_type| *super_type != ANY),
        };
        let Some(target) = target else {
            self.ctx.error(&node.span, "'super()' without a super type", ErrorClassification::InappropriateUseOfSuper);
            return Ok(None);
        };
        let Some(argument_types) = self.resolve_all(arguments)? else { return Ok(None) };
        if !self.constructor_or_error(&node.span, target, &argument_types) {
            return Ok(None);
        }
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, target)))
    }

    fn resolve_type_arguments(&mut self, type_arguments: &[TypeRef]) -> Option<Vec<SymbolId>> {
        let mut resolved = Vec::with_capacity(type_arguments.len());
        for argument in type_arguments {
            resolved.push(self.ctx.resolve_type_ref(argument));
        }
        resolved.into_iter().collect()
    }

    pub(super) fn resolve_list(&mut self, node: &ExprNode, elements: &[NodeId]) -> PassResult<Option<SymbolId>> {
        if elements.is_empty() {
            self.ctx.error(&node.span, "element type of '[]' cannot be inferred", ErrorClassification::TypeNotResolved);
            return Ok(None);
        }
        let Some(types) = self.resolve_all(elements)? else { return Ok(None) };
        let Some(element) = self.ctx.common_type_or_error(&node.span, &types) else { return Ok(None) };
        let Some(list) = self.ctx.parameterised_or_error(&node.span, LIST, &[element]) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, list)))
    }

    pub(super) fn resolve_dict(&mut self, node: &ExprNode, entries: &[(NodeId, NodeId)]) -> PassResult<Option<SymbolId>> {
        if entries.is_empty() {
            self.ctx.error(&node.span, "key and value types of '{}' cannot be inferred", ErrorClassification::TypeNotResolved);
            return Ok(None);
        }
        let keys: Vec<NodeId> = entries.iter().map(|(key, _)| *key).collect();
        let values: Vec<NodeId> = entries.iter().map(|(_, value)| *value).collect();
        let key_types = self.resolve_all(&keys)?;
        let value_types = self.resolve_all(&values)?;
        let (Some(key_types), Some(value_types)) = (key_types, value_types) else { return Ok(None) };

        let key = self.ctx.common_type_or_error(&node.span, &key_types);
        let value = self.ctx.common_type_or_error(&node.span, &value_types);
        let (Some(key), Some(value)) = (key, value) else { return Ok(None) };
        let Some(dict) = self.ctx.parameterised_or_error(&node.span, DICT, &[key, value]) else { return Ok(None) };
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, dict)))
    }
}

/// Type arguments of a generic function read off the argument types of a call.
fn infer_type_arguments(table: &SymbolTable, generic: SymbolId, argument_types: &[SymbolId]) -> Option<Vec<SymbolId>> {
    infer_type_arguments_for(table, generic, generic, argument_types)
}

/// Type arguments of `generic` read off a call of `callable`: every type parameter must appear
/// directly as some parameter's type.
fn infer_type_arguments_for(
    table: &SymbolTable,
    generic: SymbolId,
    callable: SymbolId,
    argument_types: &[SymbolId],
) -> Option<Vec<SymbolId>> {
    let parameters = table.parameter_types(callable)?;
    if parameters.len() != argument_types.len() {
        return None;
    }
    let type_parameters = table.symbol(generic).generic()?.type_parameters.clone();
    type_parameters.iter()
        .map(|type_parameter| {
            parameters.iter()
                .position(|parameter| parameter == type_parameter)
                .map(|index| argument_types[index])
        })
        .collect()
}
