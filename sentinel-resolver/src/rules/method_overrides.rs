use ir::errors::error::ErrorClassification;
use ir::symbols::search::MethodSearch;
use ir::symbols::table::SymbolTable;
use ir::symbols::{Genus, SymbolId};
use crate::context::ResolverCtx;
use super::rule::DeclarationRule;
use super::{covariant, purity_finding, report, Finding};

// Checks each method of an aggregate against the method it overrides, that constructors agree on
// purity, and that a concrete aggregate leaves nothing abstract.
pub struct MethodOverridesRule;

impl DeclarationRule for MethodOverridesRule {
    fn check_aggregate(&self, ctx: &mut ResolverCtx, aggregate: SymbolId) {
        let program = ctx.program;
        let (findings, synthesised) = {
            let table = program.read();
            let mut findings = Vec::new();
            let mut synthesised = Vec::new();
            for method in table.methods_of(aggregate) {
                if !table.symbol(*method).is_constructor() {
                    check_method(&table, aggregate, *method, &mut findings, &mut synthesised);
                }
            }
            findings.extend(constructor_purity(&table, aggregate));
            findings.extend(left_abstract(&table, aggregate));
            (findings, synthesised)
        };

        if !synthesised.is_empty() {
            let mut table = program.write();
            for method in synthesised {
                table.symbol_mut(method).flags.override_ = true;
            }
        }
        report(ctx, findings);
    }
}

/// The nearest method with the same signature in the super type, then in the traits.
pub(crate) fn overridden(table: &SymbolTable, aggregate: SymbolId, method: SymbolId) -> Option<SymbolId> {
    let search = MethodSearch::like(table, method);
    table.direct_supertypes(aggregate).into_iter().find_map(|source| {
        table.resolve_matching_methods(source, &search)
            .matches()
            .iter()
            .map(|m| m.method)
            .find(|candidate| table.same_signature(*candidate, method))
    })
}

fn check_method(
    table: &SymbolTable,
    aggregate: SymbolId,
    method: SymbolId,
    findings: &mut Vec<Finding>,
    synthesised: &mut Vec<SymbolId>,
) {
    let this = table.symbol(method);
    let friendly = table.friendly_name(method);

    let Some(base) = overridden(table, aggregate, method) else {
        if this.flags.override_ && !this.flags.synthetic {
            findings.push(Finding::new(&this.span, format!("'{friendly}'"), ErrorClassification::DoesNotOverride));
        }
        return;
    };
    let overridden = table.symbol(base);
    let owner = overridden.as_method().map(|m| table.name(m.owner).to_string()).unwrap_or_default();

    if overridden.is_private() {
        if this.flags.override_ {
            findings.push(Finding::new(
                &this.span,
                format!("'{friendly}' cannot override private method of '{owner}'"),
                ErrorClassification::DoesNotOverride,
            ));
        }
        return;
    }

    if this.access != overridden.access {
        findings.push(Finding::new(
            &this.span,
            format!("'{friendly}' and the one in '{owner}'"),
            ErrorClassification::MethodAccessModifiersDiffer,
        ));
    }

    let (returning, base_returning) = (table.return_type(method), table.return_type(base));
    if !covariant(table, returning, base_returning) {
        findings.push(Finding::new(
            &this.span,
            format!("'{friendly}' returns '{}' but '{owner}' returns '{}'", table.name(returning), table.name(base_returning)),
            ErrorClassification::CovarianceMismatch,
        ));
    }

    if !this.flags.override_ {
        if this.flags.synthetic {
            synthesised.push(method);
        } else {
            findings.push(Finding::new(
                &this.span,
                format!("'{friendly}' of '{owner}' needs 'override'"),
                ErrorClassification::MethodOverrides,
            ));
        }
    }

    findings.extend(purity_finding(table, method, base));
}

fn constructor_purity(table: &SymbolTable, aggregate: SymbolId) -> Vec<Finding> {
    let constructors = table.constructors_of(aggregate);
    let pure = constructors.iter().filter(|c| table.symbol(**c).is_pure()).count();
    if pure == 0 || pure == constructors.len() {
        return Vec::new();
    }
    constructors.iter()
        .map(|c| table.symbol(*c))
        .filter(|constructor| !constructor.is_pure())
        .map(|constructor| Finding::new(
            &constructor.span,
            format!("'{}'", table.friendly_name(constructor.id)),
            ErrorClassification::MixOfPureAndNotPureConstructors,
        ))
        .collect()
}

/// Abstract methods of the hierarchy with no concrete implementation reachable from `aggregate`.
fn left_abstract(table: &SymbolTable, aggregate: SymbolId) -> Option<Finding> {
    let symbol = table.symbol(aggregate);
    if symbol.is_abstract() || matches!(symbol.genus, Genus::ClassTrait | Genus::FunctionTrait | Genus::Any) {
        return None;
    }
    let unimplemented: Vec<String> = table.all_abstract_methods(aggregate).into_iter()
        .filter(|abstract_method| {
            let search = MethodSearch::like(table, *abstract_method);
            !table.resolve_matching_methods(aggregate, &search)
                .matches()
                .iter()
                .any(|m| table.same_signature(m.method, *abstract_method) && !table.symbol(m.method).is_abstract())
        })
        .map(|abstract_method| table.friendly_name(abstract_method))
        .collect();
    if unimplemented.is_empty() {
        return None;
    }
    Some(Finding::new(
        &symbol.span,
        format!("'{}' leaves {} unimplemented", symbol.name, unimplemented.join(", ")),
        ErrorClassification::NotMarkedAbstractButIsAbstract,
    ))
}
