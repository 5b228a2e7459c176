//! Type flow through `cat ... | stage ... > collect` pipelines.

use ir::ast::{Declaration, ExprKind, Literal, NodeId, Pipeline, SourceFile, SourceKind, StageOperation, Stmt, TerminationKind, TypeRef};
use ir::context::Program;
use ir::errors::error::ErrorClassification;
use ir::errors::reporter::ErrorReporter;
use ir::span::SourceSpan;
use ir::symbols::builtins::{BOOLEAN, INTEGER, LIST, STRING};
use ir::symbols::table::SymbolTable;
use ir::symbols::{Genus, SymbolId};
use sentinel_resolver::resolve_file;

fn at() -> SourceSpan {
    SourceSpan::new("streams.keel", 7, 3)
}

struct Stream {
    stream: NodeId,
    termination: NodeId,
}

struct Resolved {
    program: Program,
    file: SourceFile,
    classifications: Vec<ErrorClassification>,
}

// `cat [1, 2, 3] | <stages> > collect as <collect>`
fn integer_stream(file: &mut SourceFile, stages: Vec<(StageOperation, Option<&str>)>, collect: TypeRef) -> Stream {
    let numbers: Vec<NodeId> = (1..=3).map(|n| file.tree.literal(Literal::Integer(n), at())).collect();
    let list = file.tree.add_expr(ExprKind::List(numbers), at(), "[1, 2, 3]");
    stream_of(file, vec![list], stages, collect)
}

fn stream_of(file: &mut SourceFile, items: Vec<NodeId>, stages: Vec<(StageOperation, Option<&str>)>, collect: TypeRef) -> Stream {
    let source = file.tree.add_source(SourceKind::Cat(items), at());
    let stages = stages.into_iter()
        .map(|(operation, function)| {
            let parts = function.map(|name| vec![file.tree.identifier(name, at())]).unwrap_or_default();
            file.tree.add_stage(operation, parts, at())
        })
        .collect();
    let termination = file.tree.add_termination(TerminationKind::Collect(collect), at());
    let pipeline = Pipeline { source, stages, termination };
    let stream = file.tree.add_expr(ExprKind::Stream(pipeline), at(), "cat ...");
    Stream { stream, termination }
}

fn resolve(mut table: SymbolTable, build: impl FnOnce(&mut SourceFile) -> Stream) -> (Resolved, Stream) {
    let function = table.new_function("streams", &[], None, SourceSpan::synthetic());
    let mut file = SourceFile::new("streams.keel");
    let stream = build(&mut file);
    file.declarations.push(Declaration::Function { symbol: function, body: vec![Stmt::Expression(stream.stream)] });
    let program = Program::new(table);
    let reporter = resolve_file(&program, &mut file, ErrorReporter::new()).expect("no internal errors");
    (Resolved { program, file, classifications: reporter.classifications() }, stream)
}

fn helpers() -> SymbolTable {
    let mut table = SymbolTable::new();
    let span = SourceSpan::synthetic();
    table.new_function("positive", &[("value", INTEGER)], Some(BOOLEAN), span.clone());
    table.new_function("toText", &[("value", INTEGER)], Some(STRING), span.clone());
    table.new_function("discard", &[("value", INTEGER)], None, span.clone());
    table.new_function("doubled", &[("value", INTEGER)], Some(INTEGER), span.clone());
    table.new_function("joined", &[("left", INTEGER), ("right", INTEGER)], Some(STRING), span.clone());
    table.new_function("sum", &[("left", INTEGER), ("right", INTEGER)], Some(INTEGER), span.clone());
    table.new_function("howMany", &[], Some(INTEGER), span.clone());
    table.new_function("seed", &[], Some(INTEGER), span);
    table
}

// class Sink { operator | as (value as <accepts>) }
fn sink(table: &mut SymbolTable, accepts: SymbolId) {
    let sink = table.new_aggregate("Sink", Genus::Class, SourceSpan::synthetic());
    table.new_operator(sink, "|", &[("value", accepts)], None, SourceSpan::synthetic());
}

fn tee_stream(file: &mut SourceFile) -> Stream {
    let numbers = vec![file.tree.literal(Literal::Integer(4), at())];
    let list = file.tree.add_expr(ExprKind::List(numbers), at(), "[4]");
    let source = file.tree.add_source(SourceKind::Cat(vec![list]), at());
    let receiver = file.tree.call("Sink", Vec::new(), at());
    let tee = file.tree.add_tee(Vec::new(), Some(receiver), at());
    let termination = file.tree.add_termination(TerminationKind::Collect(TypeRef::named("List", at())), at());
    let pipeline = Pipeline { source, stages: vec![tee], termination };
    let stream = file.tree.add_expr(ExprKind::Stream(pipeline), at(), "cat [4] | tee Sink() > collect as List");
    Stream { stream, termination }
}

// `cat <functions> | <stage> > collect as List`
fn function_stream(file: &mut SourceFile, functions: &[&str], stage: StageOperation) -> Stream {
    let items = functions.iter().map(|name| file.tree.identifier(name, at())).collect();
    stream_of(file, items, vec![(stage, None)], TypeRef::named("List", at()))
}

fn list_argument(resolved: &Resolved, node: NodeId) -> Option<SymbolId> {
    let table = resolved.program.read();
    let ty = resolved.file.tree.recorded(node).and_then(|s| table.type_of(s))?;
    let origin = table.origin_of(ty)?;
    (origin.generic == LIST).then(|| origin.arguments[0])
}

#[test]
fn test_filter_then_map_collects_mapped_type() {
    let (resolved, stream) = resolve(helpers(), |file| {
        let stages = vec![(StageOperation::Filter, Some("positive")), (StageOperation::Map, Some("toText"))];
        integer_stream(file, stages, TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(STRING));
}

#[test]
fn test_map_then_uniq_keeps_strings() {
    let (resolved, stream) = resolve(helpers(), |file| {
        let stages = vec![(StageOperation::Map, Some("toText")), (StageOperation::Uniq, None)];
        integer_stream(file, stages, TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(STRING));
}

#[test]
fn test_map_needs_single_parameter_function() {
    let (resolved, _) = resolve(helpers(), |file| {
        let stages = vec![(StageOperation::Map, Some("joined")), (StageOperation::Uniq, None)];
        integer_stream(file, stages, TypeRef::named("List", at()))
    });
    assert!(
        resolved.classifications.contains(&ErrorClassification::FunctionMustHaveSingleParameter),
        "got {:?}",
        resolved.classifications,
    );
}

#[test]
fn test_filter_must_return_boolean() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Filter, Some("doubled"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::MustReturnBoolean]);
}

#[test]
fn test_map_to_nothing_leaves_stream_untyped() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Map, Some("discard"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::StreamTypeNotDefined]);
}

#[test]
fn test_map_needs_a_function() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Map, None)], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::TypeMustBeFunction]);
}

#[test]
fn test_head_rejects_zero() {
    let (resolved, _) = resolve(helpers(), |file| {
        let numbers = vec![file.tree.literal(Literal::Integer(9), at())];
        let list = file.tree.add_expr(ExprKind::List(numbers), at(), "[9]");
        let source = file.tree.add_source(SourceKind::Cat(vec![list]), at());
        let zero = file.tree.literal(Literal::Integer(0), at());
        let head = file.tree.add_stage(StageOperation::Head, vec![zero], at());
        let termination = file.tree.add_termination(TerminationKind::Collect(TypeRef::named("List", at())), at());
        let pipeline = Pipeline { source, stages: vec![head], termination };
        let stream = file.tree.add_expr(ExprKind::Stream(pipeline), at(), "cat [9] | head 0 > collect as List");
        Stream { stream, termination }
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::MustBeIntegerGreaterThanZero]);
}

#[test]
fn test_group_produces_lists() {
    let (resolved, stream) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Group, None)], TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    let outer = list_argument(&resolved, stream.stream).expect("list of groups");
    let table = resolved.program.read();
    assert_eq!(table.origin_of(outer).map(|o| o.arguments.clone()), Some(vec![INTEGER]));
}

#[test]
fn test_sort_needs_comparison_operator() {
    let mut table = helpers();
    table.new_aggregate("Opaque", Genus::Class, SourceSpan::synthetic());
    let (resolved, _) = resolve(table, |file| {
        let item = file.tree.call("Opaque", Vec::new(), at());
        stream_of(file, vec![item], vec![(StageOperation::Sort, None)], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::OperatorNotDefined]);
}

#[test]
fn test_flatten_needs_iteration() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Flatten, None)], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::MissingIterateMethod]);
}

#[test]
fn test_termination_needs_pipe_operator() {
    let (resolved, _) = resolve(helpers(), |file| integer_stream(file, Vec::new(), TypeRef::named("String", at())));
    assert_eq!(resolved.classifications, vec![ErrorClassification::UnableToFindPipeForType]);
}

#[test]
fn test_promoting_termination_is_flagged() {
    let (resolved, stream) = resolve(helpers(), |file| {
        let floats = TypeRef::of("List", vec![TypeRef::named("Float", at())], at());
        integer_stream(file, Vec::new(), floats)
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    let table = resolved.program.read();
    let terminal = resolved.file.tree.recorded(stream.termination).expect("terminal stream call");
    assert!(table.symbol(terminal).as_stream_call().is_some_and(|call| call.promotion_required));
}

#[test]
fn test_join_keeps_the_element_type() {
    let (resolved, stream) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Join, Some("sum"))], TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(INTEGER));
}

#[test]
fn test_join_must_return_its_input_type() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Join, Some("joined"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::FunctionMustReturnSameTypeAsInput]);
}

#[test]
fn test_join_needs_two_parameters() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Join, Some("doubled"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::FunctionMustHaveTwoParameters]);
}

#[test]
fn test_split_produces_lists() {
    let (resolved, stream) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Split, Some("positive"))], TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    let outer = list_argument(&resolved, stream.stream).expect("list of parts");
    let table = resolved.program.read();
    assert_eq!(table.origin_of(outer).map(|o| o.arguments.clone()), Some(vec![INTEGER]));
}

#[test]
fn test_split_must_return_boolean() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Split, Some("doubled"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::MustReturnBoolean]);
}

#[test]
fn test_tee_into_accepting_receiver() {
    let mut table = helpers();
    sink(&mut table, INTEGER);
    let (resolved, stream) = resolve(table, tee_stream);
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(INTEGER));
}

#[test]
fn test_tee_receiver_must_accept_values() {
    let mut table = helpers();
    sink(&mut table, BOOLEAN);
    let (resolved, _) = resolve(table, tee_stream);
    assert_eq!(resolved.classifications, vec![ErrorClassification::UnableToFindPipeForType]);
}

#[test]
fn test_call_yields_what_each_function_returns() {
    let (resolved, stream) = resolve(helpers(), |file| function_stream(file, &["seed"], StageOperation::Call));
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(INTEGER));
}

#[test]
fn test_async_needs_functions_without_parameters() {
    let (resolved, _) = resolve(helpers(), |file| function_stream(file, &["toText"], StageOperation::Async));
    assert_eq!(resolved.classifications, vec![ErrorClassification::FunctionMustHaveNoParameters]);
}

#[test]
fn test_call_needs_functions() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Call, None)], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::TypeMustBeFunction]);
}

#[test]
fn test_skip_takes_integer_function() {
    let (resolved, stream) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Skip, Some("howMany"))], TypeRef::named("List", at()))
    });
    assert!(resolved.classifications.is_empty(), "unexpected {:?}", resolved.classifications);
    assert_eq!(list_argument(&resolved, stream.stream), Some(INTEGER));
}

#[test]
fn test_tail_function_must_take_nothing() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Tail, Some("doubled"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::FunctionMustHaveNoParameters]);
}

#[test]
fn test_head_function_must_return_integer() {
    let (resolved, _) = resolve(helpers(), |file| {
        integer_stream(file, vec![(StageOperation::Head, Some("positive"))], TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![
        ErrorClassification::FunctionMustHaveNoParameters,
        ErrorClassification::MustReturnInteger,
    ]);
}

#[test]
fn test_untyped_stream_is_reported_once() {
    let (resolved, _) = resolve(helpers(), |file| {
        let stages = vec![
            (StageOperation::Map, Some("discard")),
            (StageOperation::Uniq, None),
            (StageOperation::Sort, None),
            (StageOperation::Join, Some("sum")),
            (StageOperation::Filter, Some("positive")),
            (StageOperation::Group, None),
        ];
        integer_stream(file, stages, TypeRef::named("List", at()))
    });
    assert_eq!(resolved.classifications, vec![ErrorClassification::StreamTypeNotDefined]);
}
