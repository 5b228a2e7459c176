use tracing::trace;
use ir::errors::error::ErrorClassification;
use ir::symbols::builtins::VOID;
use ir::symbols::search::MethodSearch;
use ir::symbols::table::SymbolTable;
use ir::symbols::{Genus, SymbolId, TraitDelegate};
use crate::context::ResolverCtx;
use super::rule::DeclarationRule;
use super::{report, Finding};

// `with trait of T by field`: a class implements the abstract methods of `T` by forwarding them
// to one of its own properties.
pub struct TraitDelegationRule;

impl DeclarationRule for TraitDelegationRule {
    fn check_aggregate(&self, ctx: &mut ResolverCtx, aggregate: SymbolId) {
        let program = ctx.program;
        let findings = {
            let table = program.read();
            let symbol = table.symbol(aggregate);
            let delegates = symbol.as_aggregate().map(|a| a.trait_delegates.as_slice()).unwrap_or(&[]);
            delegates.iter()
                .filter_map(|delegate| delegation_finding(&table, aggregate, delegate))
                .collect::<Vec<_>>()
        };
        if findings.is_empty() {
            synthesise_delegations(&mut program.write(), aggregate);
        }
        report(ctx, findings);
    }
}

fn delegation_finding(table: &SymbolTable, aggregate: SymbolId, delegate: &TraitDelegate) -> Option<Finding> {
    let symbol = table.symbol(aggregate);
    let trait_name = table.name(delegate.trait_type);
    if symbol.genus != Genus::Class {
        return Some(Finding::new(
            &delegate.span,
            format!("'{trait_name}' on {} '{}'", symbol.genus, symbol.name),
            ErrorClassification::TraitByDelegateForClassOnly,
        ));
    }
    let Some(field) = delegate_field(table, aggregate, delegate) else {
        return Some(Finding::new(
            &delegate.span,
            format!("'{}' to delegate '{trait_name}'", delegate.field),
            ErrorClassification::NotResolved,
        ));
    };
    let compatible = table.type_of(field).is_some_and(|ty| table.is_assignable_uncoerced(ty, delegate.trait_type));
    if !compatible {
        return Some(Finding::new(
            &delegate.span,
            format!("'{}' cannot delegate '{trait_name}'", delegate.field),
            ErrorClassification::IncompatibleTypes,
        ));
    }
    None
}

fn delegate_field(table: &SymbolTable, aggregate: SymbolId, delegate: &TraitDelegate) -> Option<SymbolId> {
    table.properties_of(aggregate).iter().copied().find(|p| table.name(*p) == delegate.field)
}

/// Adds a forwarding method for every abstract trait method a class leaves to a delegate.
/// Running it again adds nothing, so the program pass can do it for every class up front.
pub fn synthesise_delegations(table: &mut SymbolTable, aggregate: SymbolId) -> usize {
    let symbol = table.symbol(aggregate);
    let Some(detail) = symbol.as_aggregate() else { return 0 };
    if symbol.genus != Genus::Class {
        return 0;
    }
    let delegates = detail.trait_delegates.clone();

    let mut created = 0;
    for delegate in &delegates {
        let Some(field) = delegate_field(table, aggregate, delegate) else { continue };
        if !table.type_of(field).is_some_and(|ty| table.is_assignable_uncoerced(ty, delegate.trait_type)) {
            continue;
        }
        for required in table.all_abstract_methods(delegate.trait_type) {
            let implemented = table.methods_of(aggregate).iter()
                .any(|m| table.same_signature(*m, required) && !table.symbol(*m).is_abstract());
            if implemented {
                continue;
            }
            forward(table, aggregate, required, field, &delegate.span);
            created += 1;
        }
    }
    if created > 0 {
        trace!(aggregate = %table.name(aggregate), created, "trait methods delegated");
    }
    created
}

fn forward(table: &mut SymbolTable, aggregate: SymbolId, required: SymbolId, field: SymbolId, span: &ir::span::SourceSpan) {
    let name = table.name(required).to_string();
    let parameters: Vec<(String, SymbolId)> = table.symbol(required).call_parameters().iter()
        .filter_map(|p| table.type_of(*p).map(|ty| (table.name(*p).to_string(), ty)))
        .collect();
    let named: Vec<(&str, SymbolId)> = parameters.iter().map(|(n, ty)| (n.as_str(), *ty)).collect();
    let returning = Some(table.return_type(required)).filter(|ty| *ty != VOID);
    let (access, pure) = (table.symbol(required).access, table.symbol(required).is_pure());

    let method = table.new_method(aggregate, &name, &named, returning, span.clone());
    let forwarding = table.symbol_mut(method);
    forwarding.access = access;
    forwarding.flags.pure = pure;
    forwarding.flags.synthetic = true;
    if let ir::symbols::SymbolDetail::Method(detail) = &mut forwarding.detail {
        detail.delegate_via = Some(field);
    }
}

// Two concrete methods with one signature inherited from different places, and no method of
// the aggregate itself choosing between them.
pub struct MethodConflictRule;

impl DeclarationRule for MethodConflictRule {
    fn check_aggregate(&self, ctx: &mut ResolverCtx, aggregate: SymbolId) {
        let findings = {
            let table = ctx.program.read();
            conflict_findings(&table, aggregate)
        };
        report(ctx, findings);
    }
}

fn conflict_findings(table: &SymbolTable, aggregate: SymbolId) -> Vec<Finding> {
    let own = table.methods_of(aggregate);
    let mut checked: Vec<SymbolId> = Vec::new();
    let mut findings = Vec::new();

    for source in table.all_supertypes(aggregate) {
        for inherited in table.methods_of(source) {
            let symbol = table.symbol(*inherited);
            if symbol.is_abstract() || symbol.is_constructor() || symbol.is_private() {
                continue;
            }
            let seen = |m: &SymbolId| table.same_signature(*m, *inherited);
            if own.iter().any(seen) || checked.iter().any(seen) {
                continue;
            }
            checked.push(*inherited);

            let search = MethodSearch::like(table, *inherited);
            let mut concrete: Vec<SymbolId> = table.resolve_matching_methods(aggregate, &search)
                .matches()
                .iter()
                .map(|m| m.method)
                .filter(|m| table.same_signature(*m, *inherited) && !table.symbol(*m).is_abstract())
                .collect();
            concrete.dedup();
            if concrete.len() < 2 {
                continue;
            }
            let owners: Vec<String> = concrete.iter()
                .filter_map(|m| table.symbol(*m).as_method().map(|d| table.name(d.owner).to_string()))
                .collect();
            findings.push(Finding::new(
                &table.symbol(aggregate).span,
                format!("'{}' from '{}'", table.friendly_name(*inherited), owners.join("' and '")),
                ErrorClassification::MethodsConflict,
            ));
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::context::Program;
    use ir::span::SourceSpan;
    use ir::symbols::builtins::{INTEGER, STRING};
    use ir::symbols::AccessModifier;

    fn span() -> SourceSpan {
        SourceSpan::synthetic()
    }

    struct Fixture {
        table: SymbolTable,
        named: SymbolId,
        holder: SymbolId,
    }

    // trait Named { name() as String (abstract) }, class Impl with Named, class Holder with
    // Named by `inner`.
    fn fixture(genus: Genus, field: &str, field_type_is_impl: bool) -> Fixture {
        let mut table = SymbolTable::new();
        let named = table.new_aggregate("Named", Genus::ClassTrait, span());
        let abstract_name = table.new_method(named, "name", &[], Some(STRING), span());
        table.symbol_mut(abstract_name).flags.abstract_ = true;
        let implementation = table.new_aggregate("Impl", Genus::Class, span());
        table.add_trait(implementation, named);
        table.new_method(implementation, "name", &[], Some(STRING), span());

        let holder = table.new_aggregate("Holder", genus, span());
        let field_type = if field_type_is_impl { implementation } else { INTEGER };
        table.new_property(holder, field, field_type, AccessModifier::Private, span());
        table.add_trait_delegate(holder, named, "inner", span());
        Fixture { table, named, holder }
    }

    fn check(program: &Program, aggregate: SymbolId) -> Vec<ErrorClassification> {
        let mut ctx = ResolverCtx::new(program);
        TraitDelegationRule.check_aggregate(&mut ctx, aggregate);
        ctx.error_reporter.classifications()
    }

    #[test]
    fn delegated_methods_are_synthesised() {
        let Fixture { table, named, holder } = fixture(Genus::Class, "inner", true);
        let program = Program::new(table);
        assert!(check(&program, holder).is_empty());

        let table = program.read();
        let synthesised = table.resolve_matching_methods(holder, &MethodSearch::new("name")).single_best_match();
        let synthesised = synthesised.map(|m| table.symbol(m));
        assert!(synthesised.is_some_and(|m| m.flags.synthetic && m.as_method().is_some_and(|d| d.delegate_via.is_some())));
        assert!(table.all_abstract_methods(named).len() == 1);
    }

    #[test]
    fn synthesis_runs_once() {
        let Fixture { mut table, holder, .. } = fixture(Genus::Class, "inner", true);
        assert_eq!(synthesise_delegations(&mut table, holder), 1);
        assert_eq!(synthesise_delegations(&mut table, holder), 0);
    }

    #[test]
    fn only_classes_delegate() {
        let Fixture { table, holder, .. } = fixture(Genus::Record, "inner", true);
        assert_eq!(check(&Program::new(table), holder), vec![ErrorClassification::TraitByDelegateForClassOnly]);
    }

    #[test]
    fn missing_field_is_not_resolved() {
        let Fixture { table, holder, .. } = fixture(Genus::Class, "other", true);
        assert_eq!(check(&Program::new(table), holder), vec![ErrorClassification::NotResolved]);
    }

    #[test]
    fn field_must_implement_the_trait() {
        let Fixture { table, holder, .. } = fixture(Genus::Class, "inner", false);
        assert_eq!(check(&Program::new(table), holder), vec![ErrorClassification::IncompatibleTypes]);
    }

    #[test]
    fn concrete_peers_conflict() {
        let mut table = SymbolTable::new();
        let left = table.new_aggregate("Left", Genus::ClassTrait, span());
        let right = table.new_aggregate("Right", Genus::ClassTrait, span());
        let both = table.new_aggregate("Both", Genus::Class, span());
        table.add_trait(both, left);
        table.add_trait(both, right);
        table.new_method(left, "describe", &[], Some(STRING), span());
        table.new_method(right, "describe", &[], Some(STRING), span());

        let program = Program::new(table);
        let mut ctx = ResolverCtx::new(&program);
        MethodConflictRule.check_aggregate(&mut ctx, both);
        assert_eq!(ctx.error_reporter.classifications(), vec![ErrorClassification::MethodsConflict]);

        let described = program.write().new_method(both, "describe", &[], Some(STRING), span());
        assert!(program.read().symbol(described).as_method().is_some());
        let mut ctx = ResolverCtx::new(&program);
        MethodConflictRule.check_aggregate(&mut ctx, both);
        assert!(!ctx.error_reporter.has_errors());
    }
}
