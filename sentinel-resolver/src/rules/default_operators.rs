use ir::errors::error::ErrorClassification;
use ir::symbols::builtins::{ANY, ANY_RECORD, COMPARISON_OPERATORS};
use ir::symbols::search::MethodSearch;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;
use super::rule::DeclarationRule;
use super::{report, Finding};

// Operators an aggregate asks the compiler to generate. Comparisons are built on `<=>`, the rest
// on the same operator of the super type and of every property type.
pub struct DefaultOperatorsRule;

impl DeclarationRule for DefaultOperatorsRule {
    fn check_aggregate(&self, ctx: &mut ResolverCtx, aggregate: SymbolId) {
        let findings = {
            let table = ctx.program.read();
            defaulted_operator_findings(&table, aggregate)
        };
        report(ctx, findings);
    }
}

fn defaulted_operator_findings(table: &SymbolTable, aggregate: SymbolId) -> Vec<Finding> {
    let symbol = table.symbol(aggregate);
    let mut findings = Vec::new();
    let mut delegate_properties: Vec<SymbolId> = Vec::new();

    for method in table.methods_of(aggregate) {
        let operator = table.symbol(*method);
        if !operator.flags.defaulted {
            continue;
        }
        let name = operator.name.as_str();

        if COMPARISON_OPERATORS.contains(&name) {
            let search = operator_search("<=>", aggregate);
            if table.resolve_matching_methods_in_this_scope_only(aggregate, &search).is_empty() {
                findings.push(Finding::new(
                    &operator.span,
                    format!("'<=>' on '{}' for '{name}'", symbol.name),
                    ErrorClassification::MissingOperatorInThis,
                ));
            }
            findings.extend(missing_in_super(table, aggregate, "<=>", &operator.span));
            continue;
        }

        findings.extend(missing_in_super(table, aggregate, name, &operator.span));
        for property in table.properties_of(aggregate) {
            let Some(ty) = table.type_of(*property) else { continue };
            let field = table.symbol(*property);
            if table.symbol(ty).as_function().is_some() {
                if name != "?" && !delegate_properties.contains(property) {
                    delegate_properties.push(*property);
                    findings.push(Finding::new(
                        &field.span,
                        format!("'{}' of '{}'", field.name, symbol.name),
                        ErrorClassification::FunctionDelegateWithDefaultOperators,
                    ));
                }
                continue;
            }
            if !supports(table, ty, name) {
                findings.push(Finding::new(
                    &field.span,
                    format!("'{name}' on '{}' of property '{}'", table.name(ty), field.name),
                    ErrorClassification::MissingOperatorInPropertyType,
                ));
            }
        }

        if name == "$$" {
            findings.extend(duplicate_json_fields(table, aggregate));
        }
    }
    findings
}

fn operator_search(name: &str, ty: SymbolId) -> MethodSearch {
    let search = MethodSearch::new(name);
    if name == "<=>" { search.with_parameter(ty) } else { search }
}

/// Whether values of `ty` offer `name`. `?` is intrinsic on the roots and type parameters are
/// checked when they are bound.
fn supports(table: &SymbolTable, ty: SymbolId, name: &str) -> bool {
    if table.symbol(ty).as_type_parameter().is_some() || (name == "?" && (ty == ANY || ty == ANY_RECORD)) {
        return true;
    }
    !table.resolve_matching_methods(ty, &operator_search(name, ty)).is_empty()
}

fn missing_in_super(table: &SymbolTable, aggregate: SymbolId, name: &str, span: &ir::span::SourceSpan) -> Option<Finding> {
    let base = table.super_type(aggregate).filter(|s| *s != ANY && *s != ANY_RECORD)?;
    if supports(table, base, name) {
        return None;
    }
    Some(Finding::new(
        span,
        format!("'{name}' on '{}'", table.name(base)),
        ErrorClassification::MissingOperatorInSuper,
    ))
}

/// `$$` writes every property of the hierarchy as a JSON member, so names must be unique.
fn duplicate_json_fields(table: &SymbolTable, aggregate: SymbolId) -> Option<Finding> {
    let mut seen: Vec<&str> = Vec::new();
    let mut duplicated: Vec<&str> = Vec::new();
    let mut current = Some(aggregate);
    while let Some(ty) = current {
        for property in table.properties_of(ty) {
            let name = table.name(*property);
            if seen.contains(&name) {
                if !duplicated.contains(&name) {
                    duplicated.push(name);
                }
            } else {
                seen.push(name);
            }
        }
        current = table.super_type(ty).filter(|s| *s != aggregate);
    }
    if duplicated.is_empty() {
        return None;
    }
    Some(Finding::new(
        &table.symbol(aggregate).span,
        format!("'{}' in '{}'", duplicated.join("', '"), table.name(aggregate)),
        ErrorClassification::CannotSupportToJsonDuplicatePropertyField,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::context::Program;
    use ir::span::SourceSpan;
    use ir::symbols::builtins::{BOOLEAN, INTEGER, STRING};
    use ir::symbols::{AccessModifier, Genus};

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn defaulted(table: &mut SymbolTable, owner: SymbolId, name: &str, parameters: &[(&str, SymbolId)], returning: SymbolId) {
        let operator = table.new_operator(owner, name, parameters, Some(returning), span());
        table.symbol_mut(operator).flags.defaulted = true;
    }

    fn check(table: SymbolTable, aggregate: SymbolId) -> Vec<ErrorClassification> {
        let program = Program::new(table);
        let mut ctx = ResolverCtx::new(&program);
        DefaultOperatorsRule.check_aggregate(&mut ctx, aggregate);
        ctx.error_reporter.classifications()
    }

    #[test]
    fn builtin_property_types_support_defaults() {
        let mut table = SymbolTable::new();
        let person = table.new_aggregate("Person", Genus::Record, span());
        table.new_property(person, "name", STRING, AccessModifier::Public, span());
        table.new_property(person, "age", INTEGER, AccessModifier::Public, span());
        defaulted(&mut table, person, "$", &[], STRING);
        defaulted(&mut table, person, "<=>", &[("o", person)], INTEGER);
        defaulted(&mut table, person, "<", &[("o", person)], BOOLEAN);
        assert!(check(table, person).is_empty());
    }

    #[test]
    fn comparison_needs_compare_on_this() {
        let mut table = SymbolTable::new();
        let person = table.new_aggregate("Person", Genus::Record, span());
        defaulted(&mut table, person, "==", &[("o", person)], BOOLEAN);
        assert_eq!(check(table, person), vec![ErrorClassification::MissingOperatorInThis]);
    }

    #[test]
    fn property_type_without_operator_is_reported() {
        let mut table = SymbolTable::new();
        let opaque = table.new_aggregate("Opaque", Genus::Class, span());
        let holder = table.new_aggregate("Holder", Genus::Record, span());
        table.new_property(holder, "inner", opaque, AccessModifier::Public, span());
        defaulted(&mut table, holder, "#?", &[], INTEGER);
        assert_eq!(check(table, holder), vec![ErrorClassification::MissingOperatorInPropertyType]);
    }

    #[test]
    fn super_without_operator_is_reported() {
        let mut table = SymbolTable::new();
        let base = table.new_aggregate("Base", Genus::Class, span());
        let derived = table.new_aggregate("Derived", Genus::Class, span());
        table.set_super(derived, base);
        defaulted(&mut table, derived, "$", &[], STRING);
        assert_eq!(check(table, derived), vec![ErrorClassification::MissingOperatorInSuper]);
    }

    #[test]
    fn function_delegate_only_allows_is_set() {
        let mut table = SymbolTable::new();
        let callback = table.new_function("callback", &[], None, span());
        let holder = table.new_aggregate("Holder", Genus::Record, span());
        table.new_property(holder, "onDone", callback, AccessModifier::Public, span());
        defaulted(&mut table, holder, "?", &[], BOOLEAN);
        defaulted(&mut table, holder, "$", &[], STRING);
        defaulted(&mut table, holder, "#?", &[], INTEGER);
        assert_eq!(check(table, holder), vec![ErrorClassification::FunctionDelegateWithDefaultOperators]);
    }

    #[test]
    fn json_rejects_shadowed_property_names() {
        let mut table = SymbolTable::new();
        let base = table.new_aggregate("Base", Genus::Record, span());
        let derived = table.new_aggregate("Derived", Genus::Record, span());
        table.set_super(derived, base);
        table.new_property(base, "id", INTEGER, AccessModifier::Public, span());
        table.new_property(derived, "id", INTEGER, AccessModifier::Public, span());
        defaulted(&mut table, base, "$$", &[], STRING);
        defaulted(&mut table, derived, "$$", &[], STRING);
        assert_eq!(check(table, derived), vec![ErrorClassification::CannotSupportToJsonDuplicatePropertyField]);
    }
}
