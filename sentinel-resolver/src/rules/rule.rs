use ir::symbols::SymbolId;
use crate::context::ResolverCtx;
use super::default_operators::DefaultOperatorsRule;
use super::dispatchers::DispatcherRule;
use super::function_overrides::FunctionOverridesRule;
use super::method_overrides::MethodOverridesRule;
use super::traits_by_delegate::{MethodConflictRule, TraitDelegationRule};

// A check run on a declaration once the bodies inside it have been resolved.
pub trait DeclarationRule: Send + Sync {
    fn check_aggregate(&self, _ctx: &mut ResolverCtx, _aggregate: SymbolId) {}
    fn check_function(&self, _ctx: &mut ResolverCtx, _function: SymbolId) {}
}

/// Delegation runs first so the synthesised methods take part in every later check.
pub fn default_rules() -> Vec<Box<dyn DeclarationRule>> {
    vec![
        Box::new(TraitDelegationRule),
        Box::new(MethodOverridesRule),
        Box::new(DefaultOperatorsRule),
        Box::new(DispatcherRule),
        Box::new(MethodConflictRule),
        Box::new(FunctionOverridesRule),
    ]
}
