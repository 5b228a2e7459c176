//! Generic instantiation: one interned symbol per (generic, type arguments).

pub mod naming;
pub mod parameteriser;
pub mod type_substitution;

pub use parameteriser::{parameterise, Parameterised};

use ir::ast::{ParameterisationUse, TypeRef};
use ir::errors::error::{Diagnostic, ErrorClassification};
use ir::span::SourceSpan;
use ir::symbols::builtins::{ANY, ANY_RECORD};
use ir::symbols::search::MethodSearch;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;

impl ResolverCtx<'_> {
    /// Parameterises `generic` with `arguments`, reporting a wrong argument count.
    ///
    /// The use is remembered for [`ResolverCtx::assumed_operators_or_error`]: the generic's body
    /// may not have been resolved yet, so what it assumes of its parameters is not known here.
    pub fn parameterised_or_error(&mut self, span: &SourceSpan, generic: SymbolId, arguments: &[SymbolId]) -> Option<SymbolId> {
        let program = self.program;
        let expected = {
            let table = program.read();
            table.symbol(generic).generic().map(|g| g.type_parameters.len()).unwrap_or(0)
        };
        if expected != arguments.len() {
            let name = self.name_of(generic);
            self.error(
                span,
                format!("'{name}' takes {expected} type parameter(s), {} given", arguments.len()),
                ErrorClassification::GenericTypeOrFunctionParametersIncorrect,
            );
            return None;
        }

        let parameterised = parameterise(&mut program.write(), generic, arguments);
        self.parameterisations.push(ParameterisationUse {
            span: span.clone(),
            generic,
            arguments: arguments.to_vec(),
        });
        Some(parameterised.id)
    }

    /// Reports OPERATOR_NOT_DEFINED for every remembered use whose arguments lack an operator
    /// the generic assumed. Returns the checked uses.
    pub fn assumed_operators_or_error(&mut self) -> Vec<ParameterisationUse> {
        let uses = std::mem::take(&mut self.parameterisations);
        let found = assumed_operator_diagnostics(&self.program.read(), &uses);
        for diagnostic in found {
            self.error(&diagnostic.span, diagnostic.message, diagnostic.classification);
        }
        uses
    }

    /// Resolves a written type, parameterising generic types that carry arguments.
    /// A generic written without arguments resolves to the bare generic.
    pub fn resolve_type_ref(&mut self, type_ref: &TypeRef) -> Option<SymbolId> {
        let program = self.program;
        let found = {
            let table = program.read();
            self.type_parameter_in_scope(&table, &type_ref.name).or_else(|| table.resolve_name(&type_ref.name))
        };
        let Some(found) = found else {
            self.error(&type_ref.span, format!("'{}'", type_ref.name), ErrorClassification::TypeNotResolved);
            return None;
        };
        let is_type = program.read().symbol(found).is_type();
        if !is_type {
            self.error(&type_ref.span, format!("'{}' is not a type", type_ref.name), ErrorClassification::TypeNotResolved);
            return None;
        }
        if type_ref.arguments.is_empty() {
            return Some(found);
        }

        let mut arguments = Vec::with_capacity(type_ref.arguments.len());
        for argument in &type_ref.arguments {
            arguments.push(self.resolve_type_ref(argument));
        }
        let arguments: Option<Vec<SymbolId>> = arguments.into_iter().collect();
        self.parameterised_or_error(&type_ref.span, found, &arguments?)
    }

    fn type_parameter_in_scope(&self, table: &SymbolTable, name: &str) -> Option<SymbolId> {
        let owners = [self.scopes.nearest_non_block().owner, self.scopes.enclosing_aggregate()];
        owners.into_iter()
            .flatten()
            .filter_map(|owner| table.symbol(owner).generic())
            .flat_map(|generic| generic.type_parameters.iter().copied())
            .find(|parameter| table.name(*parameter) == name)
    }
}

/// OPERATOR_NOT_DEFINED for each use whose concrete arguments cannot supply an operator recorded
/// against the generic's type parameters.
pub fn assumed_operator_diagnostics(table: &SymbolTable, uses: &[ParameterisationUse]) -> Vec<Diagnostic> {
    uses.iter()
        .flat_map(|used| {
            unmet_operators(table, used.generic, &used.arguments)
                .into_iter()
                .map(|unmet| Diagnostic::new(used.span.clone(), unmet, ErrorClassification::OperatorNotDefined))
        })
        .collect()
}

/// Operators recorded against the generic's type parameters that a concrete argument cannot supply.
fn unmet_operators(table: &SymbolTable, generic: SymbolId, arguments: &[SymbolId]) -> Vec<String> {
    let Some(parameters) = table.symbol(generic).generic().map(|g| g.type_parameters.clone()) else {
        return Vec::new();
    };
    let concrete = |ty: SymbolId| parameters.iter().position(|p| *p == ty).map(|i| arguments[i]).unwrap_or(ty);

    let mut unmet = Vec::new();
    for (parameter, argument) in parameters.iter().zip(arguments) {
        if table.symbol(*argument).as_type_parameter().is_some() {
            continue;
        }
        let Some(detail) = table.symbol(*parameter).as_type_parameter() else { continue };
        for accessed in &detail.accessed_operators {
            let parameter_types: Vec<SymbolId> = accessed.arguments.iter().map(|a| concrete(*a)).collect();
            let search = MethodSearch::new(accessed.name.clone()).with_parameters(&parameter_types);
            if !supplies(table, *argument, &search) {
                unmet.push(format!(
                    "'{}' is required of '{}' by '{}'",
                    table.describe(&search),
                    table.name(*argument),
                    table.name(generic)
                ));
            }
        }
    }
    unmet
}

fn supplies(table: &SymbolTable, ty: SymbolId, search: &MethodSearch) -> bool {
    if search.name == "?" && (ty == ANY || ty == ANY_RECORD || table.symbol(ty).as_function().is_some()) {
        return true;
    }
    table.symbol(ty).as_aggregate().is_some() && !table.resolve_matching_methods(ty, search).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::context::Program;
    use ir::symbols::builtins::{BOOLEAN, INTEGER, LIST, STRING};
    use ir::symbols::{AccessedOperator, Genus, SymbolDetail};

    #[test]
    fn written_types_are_parameterised() {
        let program = Program::default();
        let mut ctx = ResolverCtx::new(&program);
        let span = SourceSpan::synthetic();
        let written = TypeRef::of("List", vec![TypeRef::named("String", span.clone())], span);
        let first = ctx.resolve_type_ref(&written);
        let second = ctx.resolve_type_ref(&written);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(program.read().origin_of(first.unwrap_or(LIST)).map(|o| o.arguments.clone()), Some(vec![STRING]));
    }

    #[test]
    fn wrong_argument_count_is_reported() {
        let program = Program::default();
        let mut ctx = ResolverCtx::new(&program);
        let span = SourceSpan::synthetic();
        assert_eq!(ctx.parameterised_or_error(&span, LIST, &[STRING, INTEGER]), None);
        assert_eq!(ctx.error_reporter.count_of(ErrorClassification::GenericTypeOrFunctionParametersIncorrect), 1);
    }

    #[test]
    fn unknown_type_is_reported() {
        let program = Program::default();
        let mut ctx = ResolverCtx::new(&program);
        let written = TypeRef::named("Missing", SourceSpan::synthetic());
        assert_eq!(ctx.resolve_type_ref(&written), None);
        assert_eq!(ctx.error_reporter.count_of(ErrorClassification::TypeNotResolved), 1);
    }

    #[test]
    fn assumed_operators_are_checked_against_arguments() {
        let program = Program::default();
        let sorter = {
            let mut table = program.write();
            let sorter = table.new_generic_aggregate("Sorter", Genus::Class, &["T"], SourceSpan::synthetic());
            let parameter = table.symbol(sorter).generic().map(|g| g.type_parameters[0]).unwrap_or(sorter);
            if let SymbolDetail::TypeParameter(detail) = &mut table.symbol_mut(parameter).detail {
                detail.accessed_operators.push(AccessedOperator { name: "<=>".to_string(), arguments: vec![parameter] });
            }
            sorter
        };
        let mut ctx = ResolverCtx::new(&program);
        let span = SourceSpan::synthetic();
        assert!(ctx.parameterised_or_error(&span, sorter, &[INTEGER]).is_some());
        let list_of_boolean = ctx.parameterised_or_error(&span, LIST, &[BOOLEAN]);
        assert!(list_of_boolean.is_some());
        let lists = list_of_boolean.unwrap_or(LIST);
        ctx.parameterised_or_error(&span, sorter, &[lists]);
        assert!(!ctx.error_reporter.has_errors(), "checked only once asked");

        let checked = ctx.assumed_operators_or_error();
        assert_eq!(checked.len(), 3);
        assert_eq!(ctx.error_reporter.count_of(ErrorClassification::OperatorNotDefined), 1);
        assert!(ctx.parameterisations.is_empty());
    }

    #[test]
    fn operators_assumed_after_the_use_are_still_checked() {
        let program = Program::default();
        let (holder, parameter) = {
            let mut table = program.write();
            let holder = table.new_generic_aggregate("Holder", Genus::Class, &["T"], SourceSpan::synthetic());
            let parameter = table.symbol(holder).generic().map(|g| g.type_parameters[0]).unwrap_or(holder);
            (holder, parameter)
        };
        let opaque = program.write().new_aggregate("Opaque", Genus::Class, SourceSpan::synthetic());
        let mut ctx = ResolverCtx::new(&program);
        let span = SourceSpan::synthetic();
        assert!(ctx.parameterised_or_error(&span, holder, &[opaque]).is_some());

        if let SymbolDetail::TypeParameter(detail) = &mut program.write().symbol_mut(parameter).detail {
            detail.accessed_operators.push(AccessedOperator { name: "$".to_string(), arguments: Vec::new() });
        }
        ctx.assumed_operators_or_error();
        assert_eq!(ctx.error_reporter.classifications(), vec![ErrorClassification::OperatorNotDefined]);
    }
}
