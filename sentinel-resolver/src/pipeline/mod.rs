//! Type flow through `cat`/`for` stream pipelines.
//!
//! The source fixes the element type, each stage consumes the current type and produces the
//! next, and the termination must accept the final type through its `|` operator. A stage
//! that cannot say what it produces hands `Void` to the next stage; later stages still run
//! their shape checks but skip checks that need a known type. `StreamTypeNotDefined` is
//! reported only by the source or `map` stage that loses the type.

mod stages;

use tracing::trace;
use ir::ast::{ExprNode, NodeId, Pipeline, SourceKind, TerminationKind};
use ir::errors::error::{ErrorClassification, PassResult};
use ir::span::SourceSpan;
use ir::symbols::builtins::{BOOLEAN, ITERATOR, VOID};
use ir::symbols::search::{MethodSearch, PROMOTION};
use ir::symbols::table::SymbolTable;
use ir::symbols::SymbolId;
use crate::file_resolver::FileResolver;

impl FileResolver<'_, '_> {
    pub(crate) fn resolve_stream(&mut self, node: &ExprNode, pipeline: &Pipeline) -> PassResult<Option<SymbolId>> {
        let mut current = self.resolve_source(pipeline.source)?;
        for stage in &pipeline.stages {
            current = self.resolve_stage(*stage, current)?;
        }

        let Some(collected) = self.resolve_termination(pipeline.termination, current)? else {
            return Ok(None);
        };
        trace!(stream = %node.text, result = %collected, "stream resolved");
        Ok(Some(self.ctx.new_expression(&node.text, &node.span, collected)))
    }

    fn resolve_source(&mut self, id: NodeId) -> PassResult<SymbolId> {
        let source = self.tree.source(id)?.clone();
        let name = match source.kind {
            SourceKind::Cat(_) => "cat",
            SourceKind::For(_) => "for",
        };
        let element = match &source.kind {
            SourceKind::Cat(items) => match self.resolve_all(items)? {
                Some(types) => {
                    let elements: Vec<SymbolId> = {
                        let table = self.ctx.program.read();
                        types.iter().map(|ty| element_type(&table, *ty).unwrap_or(*ty)).collect()
                    };
                    self.ctx.common_type_or_error(&source.span, &elements)
                }
                None => None,
            },
            SourceKind::For(range) => {
                let symbol = self.resolve_expr(*range)?;
                self.type_of_resolved(symbol)
            }
        };
        if element == Some(VOID) {
            self.ctx.error(&source.span, "stream source has no element type", ErrorClassification::StreamTypeNotDefined);
        }
        let element = element.unwrap_or(VOID);
        self.record_stream_call(id, name, &source.span, None, element)?;
        Ok(element)
    }

    fn resolve_termination(&mut self, id: NodeId, current: SymbolId) -> PassResult<Option<SymbolId>> {
        let termination = self.tree.termination(id)?.clone();
        let target = match &termination.kind {
            TerminationKind::Collect(type_ref) => {
                let collected = self.ctx.resolve_type_ref(type_ref);
                match collected {
                    Some(ty) if current != VOID && self.single_parameter_generic(ty) => {
                        self.ctx.parameterised_or_error(&termination.span, ty, &[current])
                    }
                    other => other,
                }
            }
            TerminationKind::Into(receiver) => {
                let symbol = self.resolve_expr(*receiver)?;
                self.type_of_resolved(symbol)
            }
        };
        let Some(target) = target else { return Ok(None) };

        let mut promotion_required = false;
        if current != VOID {
            match self.pipe_weight(target, current) {
                Some(weight) => promotion_required = weight >= PROMOTION,
                None => {
                    let (target_name, current_name) = (self.ctx.name_of(target), self.ctx.name_of(current));
                    self.ctx.error(
                        &termination.span,
                        format!("'{target_name}' cannot accept '{current_name}'"),
                        ErrorClassification::UnableToFindPipeForType,
                    );
                }
            }
        }

        let call = self.record_stream_call(id, "terminal", &termination.span, Some(current), target)?;
        if let Some(detail) = self.ctx.program.write().symbol_mut(call).as_stream_call_mut() {
            detail.promotion_required = promotion_required;
        }
        Ok(Some(target))
    }

    /// Weight of the best `|` on `receiver` accepting `value`.
    pub(crate) fn pipe_weight(&self, receiver: SymbolId, value: SymbolId) -> Option<u32> {
        let table = self.ctx.program.read();
        let search = MethodSearch::new("|").with_parameter(value);
        let result = table.resolve_matching_methods(receiver, &search);
        result.single_best_match()?;
        result.matches().first().map(|m| m.weight)
    }

    fn single_parameter_generic(&self, ty: SymbolId) -> bool {
        let table = self.ctx.program.read();
        table.symbol(ty).generic().is_some_and(|g| g.type_parameters.len() == 1)
    }

    /// Records the stream-call symbol for a source, stage or terminal node.
    pub(crate) fn record_stream_call(
        &mut self,
        id: NodeId,
        name: &str,
        span: &SourceSpan,
        consumes: Option<SymbolId>,
        produces: SymbolId,
    ) -> PassResult<SymbolId> {
        let call = {
            let mut table = self.ctx.program.write();
            let call = table.new_stream_call(name, span.clone());
            table.set_type(call, produces);
            if let Some(detail) = table.symbol_mut(call).as_stream_call_mut() {
                detail.consumes = consumes;
                detail.produces = Some(produces);
            }
            call
        };
        self.tree.record(id, call)?;
        Ok(call)
    }
}

/// What iterating a value of `ty` yields: through `iterator()`, or directly when `ty` is
/// itself an iterator.
pub(crate) fn element_type(table: &SymbolTable, ty: SymbolId) -> Option<SymbolId> {
    if table.symbol(ty).as_aggregate().is_none() {
        return None;
    }
    let next_of = |iterator: SymbolId| {
        if let Some(origin) = table.origin_of(iterator).filter(|o| o.generic == ITERATOR) {
            return origin.arguments.first().copied();
        }
        let has_next = table.resolve_matching_methods(iterator, &MethodSearch::new("hasNext").returning(BOOLEAN));
        let next = table.resolve_matching_methods(iterator, &MethodSearch::new("next")).single_best_match();
        match (has_next.is_empty(), next) {
            (false, Some(next)) => Some(table.return_type(next)),
            _ => None,
        }
    };
    let iterator = table.resolve_matching_methods(ty, &MethodSearch::new("iterator")).single_best_match();
    match iterator {
        Some(method) => next_of(table.return_type(method)),
        None => next_of(ty),
    }
}
