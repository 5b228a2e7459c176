use ir::ast::{ExprKind, Literal, NodeId, StageOperation, StreamStage};
use ir::errors::error::{ErrorClassification, InternalError, PassResult};
use ir::span::SourceSpan;
use ir::symbols::builtins::{BOOLEAN, INTEGER, LIST, VOID};
use ir::symbols::search::MethodSearch;
use ir::symbols::SymbolId;
use crate::file_resolver::FileResolver;
use crate::operators::CheckOperatorData;
use super::element_type;

// A function (or delegate) supplied to a stage, reduced to what the checks need.
struct StageFunction {
    name: String,
    parameters: Vec<SymbolId>,
    returning: SymbolId,
}

impl FileResolver<'_, '_> {
    /// Checks one stage against the type flowing into it and returns the type flowing out.
    pub(super) fn resolve_stage(&mut self, id: NodeId, current: SymbolId) -> PassResult<SymbolId> {
        let stage = self.tree.stage(id)?.clone();
        if stage.parts.len() > 1 {
            return Err(InternalError::MalformedStreamPart {
                span: stage.span.clone(),
                reason: format!("'{}' given {} parts", stage.operation.text(), stage.parts.len()),
            });
        }

        let produced = match stage.operation {
            StageOperation::Filter => self.filter_stage(&stage, current)?,
            StageOperation::Map => self.map_stage(&stage, current)?,
            StageOperation::Group | StageOperation::Uniq => self.group_stage(&stage, current)?,
            StageOperation::Sort => self.sort_stage(&stage, current)?,
            StageOperation::Join => self.join_stage(&stage, current)?,
            StageOperation::Split => self.split_stage(&stage, current)?,
            StageOperation::Flatten => self.flatten_stage(&stage, current),
            StageOperation::Skip | StageOperation::Head | StageOperation::Tail => self.limit_stage(&stage, current)?,
            StageOperation::Call | StageOperation::Async => self.call_stage(&stage, current),
            StageOperation::Tee => self.tee_stage(&stage, current)?,
        };

        let produced = produced.unwrap_or(VOID);
        self.record_stream_call(id, stage.operation.text(), &stage.span, Some(current), produced)?;
        Ok(produced)
    }

    fn filter_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if let Some(function) = self.stage_function(stage)? {
            if self.single_parameter_or_error(stage, &function) {
                self.accepts_or_error(&stage.span, &function, 0, current);
            }
            self.returns_or_error(&stage.span, &function, BOOLEAN, ErrorClassification::MustReturnBoolean);
        }
        Ok(Some(current))
    }

    fn map_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        let Some(function) = self.stage_function(stage)? else { return Ok(None) };
        if !self.single_parameter_or_error(stage, &function) {
            return Ok(None);
        }
        self.accepts_or_error(&stage.span, &function, 0, current);
        if function.returning == VOID {
            self.ctx.error(&stage.span, format!("'{}' returns nothing", function.name), ErrorClassification::StreamTypeNotDefined);
            return Ok(None);
        }
        Ok(Some(function.returning))
    }

    /// `group` and `uniq` key on `#?` or on an Integer-returning function.
    fn group_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if stage.parts.is_empty() {
            if current != VOID {
                let hash = CheckOperatorData::new(current, MethodSearch::new("#?"), &stage.span);
                self.ctx.operator_or_error(&hash);
            }
        } else if let Some(function) = self.stage_function(stage)? {
            if self.single_parameter_or_error(stage, &function) {
                self.accepts_or_error(&stage.span, &function, 0, current);
            }
            self.returns_or_error(&stage.span, &function, INTEGER, ErrorClassification::MustReturnInteger);
        }

        if current == VOID {
            return Ok(None);
        }
        match stage.operation {
            StageOperation::Group => Ok(self.ctx.parameterised_or_error(&stage.span, LIST, &[current])),
            _ => Ok(Some(current)),
        }
    }

    fn sort_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if stage.parts.is_empty() {
            if current != VOID {
                let compare = CheckOperatorData::new(current, MethodSearch::new("<=>").with_parameter(current), &stage.span);
                self.ctx.operator_or_error(&compare);
            }
        } else if let Some(function) = self.stage_function(stage)? {
            if self.two_parameters_or_error(stage, &function) {
                self.accepts_or_error(&stage.span, &function, 0, current);
                self.accepts_or_error(&stage.span, &function, 1, current);
            }
            self.returns_or_error(&stage.span, &function, INTEGER, ErrorClassification::MustReturnInteger);
        }
        Ok(Some(current))
    }

    fn join_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if let Some(function) = self.stage_function(stage)? {
            if self.two_parameters_or_error(stage, &function) {
                self.accepts_or_error(&stage.span, &function, 0, current);
                self.accepts_or_error(&stage.span, &function, 1, current);
            }
            if current != VOID && !self.ctx.is_assignable(function.returning, current) {
                let current_name = self.ctx.name_of(current);
                self.ctx.error(
                    &stage.span,
                    format!("'{}' must return '{current_name}'", function.name),
                    ErrorClassification::FunctionMustReturnSameTypeAsInput,
                );
            }
        }
        Ok(Some(current))
    }

    /// `split` cuts the stream into lists wherever the function says so.
    fn split_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if let Some(function) = self.stage_function(stage)? {
            if self.single_parameter_or_error(stage, &function) {
                self.accepts_or_error(&stage.span, &function, 0, current);
            }
            self.returns_or_error(&stage.span, &function, BOOLEAN, ErrorClassification::MustReturnBoolean);
        }
        if current == VOID {
            return Ok(None);
        }
        Ok(self.ctx.parameterised_or_error(&stage.span, LIST, &[current]))
    }

    fn flatten_stage(&mut self, stage: &StreamStage, current: SymbolId) -> Option<SymbolId> {
        if !stage.parts.is_empty() {
            self.ctx.error(&stage.span, "'flatten'", ErrorClassification::FunctionOrDelegateNotRequired);
        }
        if current == VOID {
            return None;
        }
        let element = element_type(&self.ctx.program.read(), current);
        if element.is_none() {
            let name = self.ctx.name_of(current);
            self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::MissingIterateMethod);
        }
        element
    }

    /// `skip`, `head` and `tail` take a positive literal, an Integer, or a function producing one.
    fn limit_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        let Some(part) = stage.parts.first().copied() else { return Ok(Some(current)) };

        if let ExprKind::Literal(Literal::Integer(value)) = self.tree.expr(part)?.kind {
            if value <= 0 {
                self.ctx.error(&stage.span, format!("'{value}'"), ErrorClassification::MustBeIntegerGreaterThanZero);
            }
        }
        let symbol = self.resolve_expr(part)?;
        let Some(ty) = self.type_of_resolved(symbol) else { return Ok(Some(current)) };
        if ty == INTEGER {
            return Ok(Some(current));
        }

        let function = {
            let table = self.ctx.program.read();
            table.symbol(ty).as_function().map(|_| StageFunction {
                name: table.name(ty).to_string(),
                parameters: table.parameter_types(ty).unwrap_or_default(),
                returning: table.return_type(ty),
            })
        };
        match function {
            Some(function) => {
                if !function.parameters.is_empty() {
                    self.ctx.error(&stage.span, format!("'{}'", function.name), ErrorClassification::FunctionMustHaveNoParameters);
                }
                self.returns_or_error(&stage.span, &function, INTEGER, ErrorClassification::MustReturnInteger);
            }
            None => {
                let name = self.ctx.name_of(ty);
                self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::IntegerVarOrFunctionOrDelegateRequired);
            }
        }
        Ok(Some(current))
    }

    /// `call` and `async` invoke each value, which must be a function taking nothing and returning something.
    fn call_stage(&mut self, stage: &StreamStage, current: SymbolId) -> Option<SymbolId> {
        if !stage.parts.is_empty() {
            self.ctx.error(&stage.span, format!("'{}'", stage.operation.text()), ErrorClassification::FunctionOrDelegateNotRequired);
        }
        if current == VOID {
            return None;
        }
        let function = {
            let table = self.ctx.program.read();
            table.symbol(current).as_function().map(|_| StageFunction {
                name: table.name(current).to_string(),
                parameters: table.parameter_types(current).unwrap_or_default(),
                returning: table.return_type(current),
            })
        };
        let Some(function) = function else {
            let name = self.ctx.name_of(current);
            self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::TypeMustBeFunction);
            return None;
        };
        if !function.parameters.is_empty() {
            self.ctx.error(&stage.span, format!("'{}'", function.name), ErrorClassification::FunctionMustHaveNoParameters);
            return None;
        }
        if function.returning == VOID {
            self.ctx.error(&stage.span, format!("'{}'", function.name), ErrorClassification::FunctionMustReturnValue);
            return None;
        }
        Some(function.returning)
    }

    /// `tee` passes values through unchanged, optionally copying them into a receiver with `|`.
    fn tee_stage(&mut self, stage: &StreamStage, current: SymbolId) -> PassResult<Option<SymbolId>> {
        if !stage.parts.is_empty() {
            self.ctx.error(&stage.span, "'tee'", ErrorClassification::FunctionOrDelegateNotRequired);
        }
        if let Some(receiver) = stage.tee_into {
            let symbol = self.resolve_expr(receiver)?;
            if let Some(target) = self.type_of_resolved(symbol) {
                if current != VOID && self.pipe_weight(target, current).is_none() {
                    let (target_name, current_name) = (self.ctx.name_of(target), self.ctx.name_of(current));
                    self.ctx.error(
                        &stage.span,
                        format!("'{target_name}' cannot accept '{current_name}'"),
                        ErrorClassification::UnableToFindPipeForType,
                    );
                }
            }
        }
        Ok(Some(current))
    }

    fn stage_function(&mut self, stage: &StreamStage) -> PassResult<Option<StageFunction>> {
        let Some(part) = stage.parts.first().copied() else {
            self.ctx.error(
                &stage.span,
                format!("'{}' requires a function or delegate", stage.operation.text()),
                ErrorClassification::TypeMustBeFunction,
            );
            return Ok(None);
        };
        let Some(symbol) = self.resolve_expr(part)? else { return Ok(None) };

        let program = self.ctx.program;
        let (shape, is_abstract, generic, name) = {
            let table = program.read();
            let ty = table.type_of(symbol);
            let shape = ty.filter(|ty| table.symbol(*ty).as_function().is_some()).map(|ty| StageFunction {
                name: table.name(ty).to_string(),
                parameters: table.parameter_types(ty).unwrap_or_default(),
                returning: table.return_type(ty),
            });
            let naming_function = ty == Some(symbol);
            (
                shape,
                naming_function && table.symbol(symbol).is_abstract(),
                naming_function && table.is_generic(symbol),
                table.name(symbol).to_string(),
            )
        };

        let Some(shape) = shape else {
            self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::TypeMustBeFunction);
            return Ok(None);
        };
        if is_abstract {
            self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::CannotCallAbstractType);
            return Ok(None);
        }
        if generic {
            self.ctx.error(&stage.span, format!("'{name}'"), ErrorClassification::GenericTypeOrFunctionParametersNeeded);
            return Ok(None);
        }
        Ok(Some(shape))
    }

    fn single_parameter_or_error(&mut self, stage: &StreamStage, function: &StageFunction) -> bool {
        if function.parameters.len() == 1 {
            return true;
        }
        self.ctx.error(&stage.span, format!("'{}'", function.name), ErrorClassification::FunctionMustHaveSingleParameter);
        false
    }

    fn two_parameters_or_error(&mut self, stage: &StreamStage, function: &StageFunction) -> bool {
        if function.parameters.len() == 2 {
            return true;
        }
        self.ctx.error(&stage.span, format!("'{}'", function.name), ErrorClassification::FunctionMustHaveTwoParameters);
        false
    }

    fn accepts_or_error(&mut self, span: &SourceSpan, function: &StageFunction, index: usize, current: SymbolId) {
        if current == VOID {
            return;
        }
        let Some(parameter) = function.parameters.get(index).copied() else { return };
        if !self.ctx.is_assignable(current, parameter) {
            let current_name = self.ctx.name_of(current);
            self.ctx.error(
                span,
                format!("'{}' cannot accept '{current_name}'", function.name),
                ErrorClassification::IncompatibleTypes,
            );
        }
    }

    fn returns_or_error(&mut self, span: &SourceSpan, function: &StageFunction, expected: SymbolId, classification: ErrorClassification) {
        if function.returning != expected {
            self.ctx.error(span, format!("'{}'", function.name), classification);
        }
    }
}
