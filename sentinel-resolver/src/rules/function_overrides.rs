use ir::errors::error::ErrorClassification;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;
use super::rule::DeclarationRule;
use super::{covariant, purity_finding, report, Finding};

// A function extending an abstract function must keep its parameters, return a compatible type
// and agree on purity.
pub struct FunctionOverridesRule;

impl DeclarationRule for FunctionOverridesRule {
    fn check_function(&self, ctx: &mut ResolverCtx, function: SymbolId) {
        let findings = {
            let table = ctx.program.read();
            super_function_findings(&table, function)
        };
        report(ctx, findings);
    }
}

fn super_function_findings(table: &SymbolTable, function: SymbolId) -> Vec<Finding> {
    let Some(base) = table.symbol(function).as_function().and_then(|f| f.super_function) else {
        return Vec::new();
    };
    let span = &table.symbol(function).span;
    let (friendly, base_friendly) = (table.friendly_name(function), table.friendly_name(base));
    let mut findings = Vec::new();

    if table.parameter_types(function) != table.parameter_types(base) {
        findings.push(Finding::new(
            span,
            format!("'{friendly}' and '{base_friendly}'"),
            ErrorClassification::FunctionSignatureDoesNotMatchSuper,
        ));
    }
    if !covariant(table, table.return_type(function), table.return_type(base)) {
        findings.push(Finding::new(
            span,
            format!("'{friendly}' and '{base_friendly}'"),
            ErrorClassification::CovarianceMismatch,
        ));
    }
    findings.extend(purity_finding(table, function, base));
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use ir::context::Program;
    use ir::span::SourceSpan;
    use ir::symbols::builtins::{BOOLEAN, INTEGER, STRING};

    fn check(table: SymbolTable, function: SymbolId) -> Vec<ErrorClassification> {
        let program = Program::new(table);
        let mut ctx = ResolverCtx::new(&program);
        FunctionOverridesRule.check_function(&mut ctx, function);
        ctx.error_reporter.classifications()
    }

    fn abstract_predicate(table: &mut SymbolTable) -> SymbolId {
        let predicate = table.new_function("predicate", &[("v", INTEGER)], Some(BOOLEAN), SourceSpan::synthetic());
        table.symbol_mut(predicate).flags.abstract_ = true;
        predicate
    }

    #[test]
    fn matching_function_is_clean() {
        let mut table = SymbolTable::new();
        let predicate = abstract_predicate(&mut table);
        let positive = table.new_function("positive", &[("v", INTEGER)], Some(BOOLEAN), SourceSpan::synthetic());
        table.set_super_function(positive, predicate);
        assert!(check(table, positive).is_empty());
    }

    #[test]
    fn parameters_must_match() {
        let mut table = SymbolTable::new();
        let predicate = abstract_predicate(&mut table);
        let named = table.new_function("named", &[("v", STRING)], Some(BOOLEAN), SourceSpan::synthetic());
        table.set_super_function(named, predicate);
        assert_eq!(check(table, named), vec![ErrorClassification::FunctionSignatureDoesNotMatchSuper]);
    }

    #[test]
    fn return_and_purity_are_checked() {
        let mut table = SymbolTable::new();
        let predicate = abstract_predicate(&mut table);
        let counted = table.new_function("counted", &[("v", INTEGER)], Some(STRING), SourceSpan::synthetic());
        table.symbol_mut(counted).flags.pure = true;
        table.set_super_function(counted, predicate);
        assert_eq!(
            check(table, counted),
            vec![ErrorClassification::CovarianceMismatch, ErrorClassification::SuperIsNotPure],
        );
    }
}
