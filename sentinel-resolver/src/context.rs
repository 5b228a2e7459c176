use ir::ast::ParameterisationUse;
use ir::context::Program;
use ir::errors::error::ErrorClassification;
use ir::errors::reporter::ErrorReporter;
use ir::scopes::ScopeStack;
use ir::span::SourceSpan;
use ir::symbols::table::SymbolTable;
use ir::symbols::{AccessModifier, SymbolId};

// Per-file state of the resolution walk.
//
// The symbol table is shared by every file. Methods that take a `&SymbolTable` run inside a
// guard the caller already holds; every other method takes its own short guard, so callers
// must release theirs first. parking_lot locks are not reentrant.
pub struct ResolverCtx<'p> {
    pub program: &'p Program,
    pub scopes: ScopeStack,
    pub error_reporter: ErrorReporter,
    /// Generic uses whose assumed operators are checked after the last body.
    pub parameterisations: Vec<ParameterisationUse>,
}

impl<'p> ResolverCtx<'p> {
    pub fn new(program: &'p Program) -> Self {
        ResolverCtx {
            program,
            scopes: ScopeStack::new(),
            error_reporter: ErrorReporter::new(),
            parameterisations: Vec::new(),
        }
    }

    pub fn with_reporter(mut self, error_reporter: ErrorReporter) -> Self {
        self.error_reporter = error_reporter;
        self
    }

    pub fn into_reporter(self) -> ErrorReporter {
        self.error_reporter
    }

    pub fn error(&mut self, span: &SourceSpan, message: impl Into<String>, classification: ErrorClassification) {
        self.error_reporter.semantic_error(span, message, classification);
    }

    pub fn name_of(&self, id: SymbolId) -> String {
        self.program.read().name(id).to_string()
    }

    pub fn friendly_name(&self, id: SymbolId) -> String {
        self.program.read().friendly_name(id)
    }

    pub fn type_of(&self, id: SymbolId) -> Option<SymbolId> {
        self.program.read().type_of(id)
    }

    pub fn is_assignable(&self, from: SymbolId, to: SymbolId) -> bool {
        self.program.read().is_assignable(from, to)
    }

    /// A fresh expression symbol of the given type.
    pub fn new_expression(&self, text: &str, span: &SourceSpan, ty: SymbolId) -> SymbolId {
        self.program.write().new_expression(text, span.clone(), Some(ty))
    }

    /// Whether code in the current scope may use `member`, declared on `declared_in`.
    pub fn is_accessible(&self, table: &SymbolTable, member: SymbolId, declared_in: SymbolId) -> bool {
        let current = self.scopes.enclosing_aggregate();
        match table.symbol(member).access {
            AccessModifier::Public => true,
            AccessModifier::Private => current == Some(declared_in),
            AccessModifier::Protected => current
                .is_some_and(|from| from == declared_in || table.is_assignable_uncoerced(from, declared_in)),
        }
    }

    /// Reports NOT_ACCESSIBLE and returns false when `member` is hidden from the current scope.
    pub fn accessible_or_error(&mut self, span: &SourceSpan, member: SymbolId, declared_in: SymbolId) -> bool {
        let program = self.program;
        let (accessible, member_name, owner_name) = {
            let table = program.read();
            (
                self.is_accessible(&table, member, declared_in),
                table.friendly_name(member),
                table.name(declared_in).to_string(),
            )
        };
        if !accessible {
            self.error(span, format!("'{member_name}' of '{owner_name}'"), ErrorClassification::NotAccessible);
        }
        accessible
    }
}
