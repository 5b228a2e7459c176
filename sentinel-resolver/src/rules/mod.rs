pub mod default_operators;
pub mod dispatchers;
pub mod function_overrides;
pub mod method_overrides;
pub mod rule;
pub mod traits_by_delegate;

pub use rule::{default_rules, DeclarationRule};
pub use traits_by_delegate::synthesise_delegations;

use ir::errors::error::ErrorClassification;
use ir::span::SourceSpan;
use ir::symbols::builtins::VOID;
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;

// Rules gather findings under a read guard and report them after releasing it.
pub(crate) struct Finding {
    pub span: SourceSpan,
    pub message: String,
    pub classification: ErrorClassification,
}

impl Finding {
    pub fn new(span: &SourceSpan, message: impl Into<String>, classification: ErrorClassification) -> Self {
        Finding { span: span.clone(), message: message.into(), classification }
    }
}

pub(crate) fn report(ctx: &mut ResolverCtx, findings: Vec<Finding>) {
    for finding in findings {
        ctx.error(&finding.span, finding.message, finding.classification);
    }
}

/// An overriding return type must be the overridden one or a subtype of it; `Void` only matches `Void`.
pub(crate) fn covariant(table: &SymbolTable, returning: SymbolId, overridden: SymbolId) -> bool {
    returning == overridden || (returning != VOID && overridden != VOID && table.is_assignable_uncoerced(returning, overridden))
}

/// Purity must agree in both directions between a definition and the one it overrides.
pub(crate) fn purity_finding(table: &SymbolTable, definition: SymbolId, overridden: SymbolId) -> Option<Finding> {
    let (this, base) = (table.symbol(definition), table.symbol(overridden));
    let message = format!("'{}' and '{}'", table.friendly_name(definition), table.friendly_name(overridden));
    match (this.is_pure(), base.is_pure()) {
        (false, true) => Some(Finding::new(&this.span, message, ErrorClassification::SuperIsPure)),
        (true, false) => Some(Finding::new(&this.span, message, ErrorClassification::SuperIsNotPure)),
        _ => None,
    }
}
