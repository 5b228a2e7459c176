use tracing::{debug, trace};
use ir::ast::{Declaration, MethodBody, NodeId, ParseTree, SourceFile, Stmt};
use ir::context::Program;
use ir::errors::error::{InternalError, PassResult};
use ir::errors::reporter::ErrorReporter;
use ir::scopes::{Scope, ScopeKind};
use ir::symbols::SymbolId;
use crate::context::ResolverCtx;
use crate::rules::rule::{default_rules, DeclarationRule};

// Resolves every declaration of one source file. Bodies are walked first so each expression
// gets its type, then the declaration rules run on the finished aggregate or function.
pub struct FileResolver<'p, 't> {
    pub ctx: ResolverCtx<'p>,
    pub(crate) tree: &'t mut ParseTree,
    rules: Vec<Box<dyn DeclarationRule>>,
    /// The expression standing as the first statement of the body being resolved.
    pub(crate) leading_statement: Option<NodeId>,
}

impl<'p, 't> FileResolver<'p, 't> {
    pub fn new(program: &'p Program, tree: &'t mut ParseTree) -> Self {
        FileResolver { ctx: ResolverCtx::new(program), tree, rules: default_rules(), leading_statement: None }
    }

    /// A resolver that runs only the rules added with [`FileResolver::add_rule`].
    pub fn without_rules(program: &'p Program, tree: &'t mut ParseTree) -> Self {
        FileResolver { ctx: ResolverCtx::new(program), tree, rules: Vec::new(), leading_statement: None }
    }

    pub fn add_rule<R: DeclarationRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn with_reporter(mut self, error_reporter: ErrorReporter) -> Self {
        self.ctx = self.ctx.with_reporter(error_reporter);
        self
    }

    pub fn into_reporter(self) -> ErrorReporter {
        self.ctx.into_reporter()
    }

    pub fn resolve_declarations(&mut self, declarations: &[Declaration]) -> PassResult<()> {
        for declaration in declarations {
            match declaration {
                Declaration::Aggregate { symbol, bodies } => self.resolve_aggregate(*symbol, bodies)?,
                Declaration::Function { symbol, body } => self.resolve_function(*symbol, body)?,
            }
        }
        Ok(())
    }

    /// Checks the generic uses of this file against what the generics' bodies assumed, now
    /// that every body of the file has been resolved. The uses stay on the tree so they can be
    /// checked again once the other files are done.
    pub fn check_parameterisations(&mut self) {
        let uses = self.ctx.assumed_operators_or_error();
        self.tree.note_parameterisations(uses);
    }

    fn resolve_aggregate(&mut self, aggregate: SymbolId, bodies: &[MethodBody]) -> PassResult<()> {
        if self.ctx.program.read().symbol(aggregate).as_aggregate().is_none() {
            return Err(InternalError::UnexpectedSymbol { symbol: aggregate, expected: "an aggregate" });
        }
        trace!(aggregate = %self.ctx.name_of(aggregate), "resolving aggregate");

        self.ctx.scopes.push(Scope::new(ScopeKind::Aggregate, Some(aggregate)));
        for MethodBody { method, body } in bodies {
            let (pure, constructor) = {
                let table = self.ctx.program.read();
                let symbol = table.symbol(*method);
                if symbol.as_method().is_none() {
                    return Err(InternalError::UnexpectedSymbol { symbol: *method, expected: "a method" });
                }
                (symbol.is_pure(), symbol.is_constructor())
            };
            let scope = Scope::new(ScopeKind::Method, Some(*method)).with_purity(pure).as_constructor(constructor);
            self.resolve_body(scope, *method, body, "method")?;
        }
        self.ctx.scopes.pop("aggregate")?;

        for rule in &self.rules {
            rule.check_aggregate(&mut self.ctx, aggregate);
        }
        Ok(())
    }

    fn resolve_function(&mut self, function: SymbolId, body: &[Stmt]) -> PassResult<()> {
        let pure = {
            let table = self.ctx.program.read();
            let symbol = table.symbol(function);
            if symbol.as_function().is_none() {
                return Err(InternalError::UnexpectedSymbol { symbol: function, expected: "a function" });
            }
            symbol.is_pure()
        };
        trace!(function = %self.ctx.name_of(function), "resolving function");

        self.resolve_body(Scope::new(ScopeKind::Function, Some(function)).with_purity(pure), function, body, "function")?;
        for rule in &self.rules {
            rule.check_function(&mut self.ctx, function);
        }
        Ok(())
    }

    // Parameters and the returning variable are visible by name inside the body.
    fn resolve_body(&mut self, scope: Scope, callable: SymbolId, body: &[Stmt], leaving: &'static str) -> PassResult<()> {
        self.ctx.scopes.push(scope);
        let named: Vec<(String, SymbolId)> = {
            let table = self.ctx.program.read();
            let symbol = table.symbol(callable);
            symbol.call_parameters().iter()
                .copied()
                .chain(symbol.returning())
                .map(|id| (table.name(id).to_string(), id))
                .collect()
        };
        for (name, id) in &named {
            self.ctx.scopes.define(name, *id);
        }
        self.leading_statement = match body.first() {
            Some(Stmt::Expression(first)) => Some(*first),
            _ => None,
        };
        self.resolve_statements(body)?;
        self.ctx.scopes.pop(leaving)?;
        Ok(())
    }
}

/// Resolves one source file against the shared program, adding its semantic errors to `error_reporter`.
///
/// An `Err` is a compiler defect and means the file could not be finished.
pub fn resolve_file(program: &Program, file: &mut SourceFile, error_reporter: ErrorReporter) -> PassResult<ErrorReporter> {
    let SourceFile { name, declarations, tree } = file;
    let mut resolver = FileResolver::new(program, tree).with_reporter(error_reporter);
    resolver.resolve_declarations(declarations)?;
    resolver.check_parameterisations();
    let error_reporter = resolver.into_reporter();
    debug!(file = %name, errors = error_reporter.error_count(), "file resolved");
    Ok(error_reporter)
}
