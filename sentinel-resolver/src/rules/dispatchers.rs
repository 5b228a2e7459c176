use ir::errors::error::ErrorClassification;
use ir::symbols::builtins::ANY;
use ir::symbols::table::SymbolTable;
use ir::symbols::{Genus, SymbolId};
use crate::context::ResolverCtx;
use super::rule::DeclarationRule;
use super::{report, Finding};

// A dispatcher method is the entry point that picks, at run time, the most specific method of
// the same name for its arguments. Every method it could pick is checked here.
pub struct DispatcherRule;

impl DeclarationRule for DispatcherRule {
    fn check_aggregate(&self, ctx: &mut ResolverCtx, aggregate: SymbolId) {
        let findings = {
            let table = ctx.program.read();
            table.methods_of(aggregate).iter()
                .filter(|m| {
                    let method = table.symbol(**m);
                    method.flags.dispatcher && !method.is_abstract() && !method.flags.operator
                })
                .flat_map(|dispatcher| dispatcher_findings(&table, aggregate, *dispatcher))
                .collect::<Vec<_>>()
        };
        report(ctx, findings);
    }
}

fn dispatcher_findings(table: &SymbolTable, aggregate: SymbolId, dispatcher: SymbolId) -> Vec<Finding> {
    let entry = table.symbol(dispatcher);
    let parameters = table.parameter_types(dispatcher).unwrap_or_default();
    if !(1..=2).contains(&parameters.len()) {
        return vec![Finding::new(
            &entry.span,
            format!("dispatcher '{}' must take one or two parameters", table.friendly_name(dispatcher)),
            ErrorClassification::InvalidNumberOfParameters,
        )];
    }

    let mut hierarchy = vec![aggregate];
    hierarchy.extend(table.all_supertypes(aggregate));
    let mut findings = Vec::new();

    for owner in hierarchy {
        for candidate in table.methods_of(owner) {
            let method = table.symbol(*candidate);
            if *candidate == dispatcher
                || method.name != entry.name
                || method.is_constructor()
                || method.is_abstract()
                || method.flags.operator
            {
                continue;
            }
            let message = format!("'{}' and '{}'", table.friendly_name(*candidate), table.friendly_name(dispatcher));
            let targets = table.parameter_types(*candidate).unwrap_or_default();

            if targets.len() != parameters.len() {
                findings.push(Finding::new(&method.span, message.clone(), ErrorClassification::InvalidNumberOfParameters));
            }
            if entry.is_pure() && !method.is_pure() {
                findings.push(Finding::new(&method.span, message.clone(), ErrorClassification::DispatcherPureMismatch));
            }
            if method.is_private() && owner != aggregate {
                findings.push(Finding::new(&method.span, message.clone(), ErrorClassification::DispatcherPrivateInSuper));
            }
            if method.flags.dispatcher {
                findings.push(Finding::new(
                    &method.span,
                    message.clone(),
                    ErrorClassification::DispatchersOnlyHaveOneMethodEntryPointMarked,
                ));
            }
            if targets.len() == parameters.len() {
                for (declared, target) in parameters.iter().zip(targets.iter()) {
                    if !compatible_genus(table, *declared, *target) {
                        let genera = format!("{} vs {}: {message}", table.symbol(*declared).genus, table.symbol(*target).genus);
                        findings.push(Finding::new(&method.span, genera, ErrorClassification::IncompatibleParameterGenus));
                    }
                }
            }
        }
    }
    findings
}

/// Same genus, class against class trait, or a dispatcher parameter of `Any`.
fn compatible_genus(table: &SymbolTable, declared: SymbolId, target: SymbolId) -> bool {
    if declared == ANY {
        return true;
    }
    let (declared, target) = (table.symbol(declared).genus, table.symbol(target).genus);
    declared == target
        || matches!((declared, target), (Genus::Class, Genus::ClassTrait) | (Genus::ClassTrait, Genus::Class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::context::Program;
    use ir::span::SourceSpan;
    use ir::symbols::builtins::{FLOAT, INTEGER, STRING};
    use ir::symbols::AccessModifier;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    fn check(table: SymbolTable, aggregate: SymbolId) -> Vec<ErrorClassification> {
        let program = Program::new(table);
        let mut ctx = ResolverCtx::new(&program);
        DispatcherRule.check_aggregate(&mut ctx, aggregate);
        ctx.error_reporter.classifications()
    }

    fn shapes(table: &mut SymbolTable) -> (SymbolId, SymbolId, SymbolId) {
        let shape = table.new_aggregate("Shape", Genus::Class, span());
        let circle = table.new_aggregate("Circle", Genus::Class, span());
        table.set_super(circle, shape);
        let visitor = table.new_aggregate("Visitor", Genus::Class, span());
        (shape, circle, visitor)
    }

    fn dispatcher(table: &mut SymbolTable, owner: SymbolId, parameters: &[(&str, SymbolId)]) -> SymbolId {
        let entry = table.new_method(owner, "visit", parameters, None, span());
        table.symbol_mut(entry).flags.dispatcher = true;
        entry
    }

    #[test]
    fn matching_targets_are_clean() {
        let mut table = SymbolTable::new();
        let (shape, circle, visitor) = shapes(&mut table);
        dispatcher(&mut table, visitor, &[("s", shape)]);
        table.new_method(visitor, "visit", &[("c", circle)], None, span());
        assert!(check(table, visitor).is_empty());
    }

    #[test]
    fn three_parameters_are_rejected() {
        let mut table = SymbolTable::new();
        let (_, _, visitor) = shapes(&mut table);
        dispatcher(&mut table, visitor, &[("a", INTEGER), ("b", INTEGER), ("c", INTEGER)]);
        assert_eq!(check(table, visitor), vec![ErrorClassification::InvalidNumberOfParameters]);
    }

    #[test]
    fn pure_dispatcher_needs_pure_targets() {
        let mut table = SymbolTable::new();
        let (shape, circle, visitor) = shapes(&mut table);
        let entry = dispatcher(&mut table, visitor, &[("s", shape)]);
        table.symbol_mut(entry).flags.pure = true;
        table.new_method(visitor, "visit", &[("c", circle)], None, span());
        assert_eq!(check(table, visitor), vec![ErrorClassification::DispatcherPureMismatch]);
    }

    #[test]
    fn private_target_in_super_is_reported() {
        let mut table = SymbolTable::new();
        let (shape, circle, visitor) = shapes(&mut table);
        let fancy = table.new_aggregate("FancyVisitor", Genus::Class, span());
        table.set_super(fancy, visitor);
        let hidden = table.new_method(visitor, "visit", &[("c", circle)], None, span());
        table.symbol_mut(hidden).access = AccessModifier::Private;
        dispatcher(&mut table, fancy, &[("s", shape)]);
        assert_eq!(check(table, fancy), vec![ErrorClassification::DispatcherPrivateInSuper]);
    }

    #[test]
    fn second_entry_point_is_reported() {
        let mut table = SymbolTable::new();
        let (shape, _, visitor) = shapes(&mut table);
        dispatcher(&mut table, visitor, &[("s", shape)]);
        dispatcher(&mut table, visitor, &[("v", FLOAT)]);
        let found = check(table, visitor);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|c| *c == ErrorClassification::DispatchersOnlyHaveOneMethodEntryPointMarked));
    }

    #[test]
    fn entry_points_of_different_arity_both_report() {
        let mut table = SymbolTable::new();
        let (shape, circle, visitor) = shapes(&mut table);
        dispatcher(&mut table, visitor, &[("s", shape)]);
        dispatcher(&mut table, visitor, &[("s", shape), ("c", circle)]);
        let found = check(table, visitor);
        assert_eq!(found.iter().filter(|c| **c == ErrorClassification::InvalidNumberOfParameters).count(), 2);
    }

    #[test]
    fn function_target_has_incompatible_genus() {
        let mut table = SymbolTable::new();
        let (shape, _, visitor) = shapes(&mut table);
        let callback = table.new_function("callback", &[("v", STRING)], None, span());
        dispatcher(&mut table, visitor, &[("s", shape)]);
        table.new_method(visitor, "visit", &[("f", callback)], None, span());
        assert_eq!(check(table, visitor), vec![ErrorClassification::IncompatibleParameterGenus]);
    }
}
