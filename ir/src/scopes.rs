use crate::errors::error::{InternalError, PassResult};
use crate::ir_hasher::HashMap;
use crate::symbols::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Aggregate,
    Function,
    Method,
    Block,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub owner: Option<SymbolId>,
    pub pure: bool,
    pub constructor: bool,
    names: HashMap<String, SymbolId>,
}

impl Scope {
    pub fn new(kind: ScopeKind, owner: Option<SymbolId>) -> Self {
        Scope { kind, owner, pure: false, constructor: false, names: HashMap::default() }
    }

    pub fn with_purity(mut self, pure: bool) -> Self {
        self.pure = pure;
        self
    }

    pub fn as_constructor(mut self, constructor: bool) -> Self {
        self.constructor = constructor;
        self
    }

    pub fn define(&mut self, name: &str, symbol: SymbolId) {
        self.names.insert(name.to_string(), symbol);
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.names.get(name).copied()
    }
}

/// Lexical scopes of the walk, innermost last. The module scope at the bottom is never popped.
#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack { scopes: vec![Scope::new(ScopeKind::Module, None)] }
    }

    pub fn push(&mut self, scope: Scope) {
        self.scopes.push(scope);
    }

    pub fn pop(&mut self, leaving: &'static str) -> PassResult<Scope> {
        if self.scopes.len() <= 1 {
            return Err(InternalError::ScopeUnderflow(leaving));
        }
        self.scopes.pop().ok_or(InternalError::ScopeUnderflow(leaving))
    }

    pub fn define(&mut self, name: &str, symbol: SymbolId) {
        let last = self.scopes.len() - 1;
        self.scopes[last].define(name, symbol);
    }

    /// Innermost scope first, so locals shadow parameters and outer blocks.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        self.scopes.iter().rev().find_map(|scope| scope.lookup(name))
    }

    pub fn nearest_non_block(&self) -> &Scope {
        self.scopes.iter().rev()
            .find(|scope| scope.kind != ScopeKind::Block)
            .unwrap_or(&self.scopes[0])
    }

    pub fn enclosing_aggregate(&self) -> Option<SymbolId> {
        self.scopes.iter().rev()
            .find(|scope| scope.kind == ScopeKind::Aggregate)
            .and_then(|scope| scope.owner)
    }

    pub fn is_pure(&self) -> bool {
        self.nearest_non_block().pure
    }

    pub fn in_constructor(&self) -> bool {
        self.nearest_non_block().constructor
    }
}
