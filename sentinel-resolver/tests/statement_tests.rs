//! Declarations, assignments and initialisation tracking inside function bodies.

use ir::ast::{AssignOp, Declaration, ExprKind, Literal, SourceFile, Stmt, TypeRef};
use ir::context::Program;
use ir::errors::error::{ErrorClassification, InternalError, PassResult};
use ir::errors::reporter::ErrorReporter;
use ir::span::SourceSpan;
use ir::symbols::builtins::{LIST, STRING};
use ir::symbols::table::SymbolTable;
use sentinel_resolver::resolve_file;

fn at() -> SourceSpan {
    SourceSpan::new("statements.keel", 3, 5)
}

fn resolve_body(mut table: SymbolTable, build: impl FnOnce(&mut SourceFile) -> Vec<Stmt>) -> (Program, SourceFile, PassResult<ErrorReporter>) {
    let function = table.new_function("body", &[], None, SourceSpan::synthetic());
    let mut file = SourceFile::new("statements.keel");
    let body = build(&mut file);
    file.declarations.push(Declaration::Function { symbol: function, body });
    let program = Program::new(table);
    let result = resolve_file(&program, &mut file, ErrorReporter::new());
    (program, file, result)
}

fn classifications(result: PassResult<ErrorReporter>) -> Vec<ErrorClassification> {
    result.expect("no internal errors").classifications()
}

fn declare(name: &str, declared: Option<TypeRef>, initializer: Option<ir::ast::NodeId>) -> Stmt {
    Stmt::Declare { name: name.to_string(), declared, initializer, constant: false, span: at() }
}

#[test]
fn test_inferred_declaration_is_usable() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let read = file.tree.identifier("count", at());
        let two = file.tree.literal(Literal::Integer(2), at());
        let sum = file.tree.binary("+", read, two, at());
        vec![declare("count", None, Some(one)), declare("next", None, Some(sum))]
    });
    assert!(classifications(result).is_empty());
}

#[test]
fn test_reading_uninitialised_variable() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let read = file.tree.identifier("count", at());
        vec![declare("count", Some(TypeRef::named("Integer", at())), None), Stmt::Expression(read)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::NotInitialisedBeforeUse]);
}

#[test]
fn test_assignment_initialises_variable() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let target = file.tree.identifier("count", at());
        let value = file.tree.literal(Literal::Integer(4), at());
        let read = file.tree.identifier("count", at());
        vec![
            declare("count", Some(TypeRef::named("Integer", at())), None),
            Stmt::assign(target, value, at()),
            Stmt::Expression(read),
        ]
    });
    assert!(classifications(result).is_empty());
}

#[test]
fn test_constant_cannot_be_reassigned() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let target = file.tree.identifier("limit", at());
        let two = file.tree.literal(Literal::Integer(2), at());
        vec![
            Stmt::Declare { name: "limit".into(), declared: None, initializer: Some(one), constant: true, span: at() },
            Stmt::assign(target, two, at()),
        ]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::NotMutable]);
}

fn compound(target: ir::ast::NodeId, operator: AssignOp, value: ir::ast::NodeId) -> Stmt {
    Stmt::Assign { target, operator, value, span: at() }
}

#[test]
fn test_compound_assignment_uses_the_operator() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let target = file.tree.identifier("count", at());
        let two = file.tree.literal(Literal::Integer(2), at());
        vec![declare("count", None, Some(one)), compound(target, AssignOp::Add, two)]
    });
    assert!(classifications(result).is_empty());
}

#[test]
fn test_compound_assignment_without_operator() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let yes = file.tree.literal(Literal::Boolean(true), at());
        let target = file.tree.identifier("flag", at());
        let no = file.tree.literal(Literal::Boolean(false), at());
        vec![declare("flag", None, Some(yes)), compound(target, AssignOp::Add, no)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::OperatorNotDefined]);
}

#[test]
fn test_compound_assignment_reads_the_target() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let target = file.tree.identifier("count", at());
        let two = file.tree.literal(Literal::Integer(2), at());
        vec![declare("count", Some(TypeRef::named("Integer", at())), None), compound(target, AssignOp::Multiply, two)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::NotInitialisedBeforeUse]);
}

#[test]
fn test_assigning_a_variable_to_itself() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let target = file.tree.identifier("count", at());
        let same = file.tree.identifier("count", at());
        let wrapped = file.tree.add_expr(ExprKind::Paren(same), at(), "(count)");
        vec![declare("count", None, Some(one)), compound(target, AssignOp::Add, wrapped)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::SelfAssignment]);
}

#[test]
fn test_plain_self_assignment() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let target = file.tree.identifier("count", at());
        let same = file.tree.identifier("count", at());
        vec![declare("count", None, Some(one)), Stmt::assign(target, same, at())]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::SelfAssignment]);
}

#[test]
fn test_incompatible_initializer() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let text = file.tree.literal(Literal::String("four".into()), at());
        vec![declare("count", Some(TypeRef::named("Integer", at())), Some(text))]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::IncompatibleTypes]);
}

#[test]
fn test_initialising_from_nothing() {
    let mut table = SymbolTable::new();
    table.new_function("noop", &[], None, SourceSpan::synthetic());
    let (_, _, result) = resolve_body(table, |file| {
        let call = file.tree.call("noop", Vec::new(), at());
        vec![declare("result", None, Some(call))]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::ReturningMissing]);
}

#[test]
fn test_declared_type_narrows_bare_constructor() {
    let (program, file, result) = resolve_body(SymbolTable::new(), |file| {
        let construct = file.tree.call("List", Vec::new(), at());
        let declared = TypeRef::of("List", vec![TypeRef::named("String", at())], at());
        vec![declare("names", Some(declared), Some(construct))]
    });
    assert!(classifications(result).is_empty());

    let construct = file.tree.expression_ids()
        .find(|id| file.tree.expr(*id).is_ok_and(|e| matches!(e.kind, ExprKind::Call { .. })))
        .expect("call node");
    let table = program.read();
    let ty = file.tree.recorded(construct).and_then(|s| table.type_of(s)).expect("call is typed");
    let origin = table.origin_of(ty).expect("narrowed to a parameterisation");
    assert_eq!((origin.generic, origin.arguments.clone()), (LIST, vec![STRING]));
}

#[test]
fn test_inferred_bare_generic_needs_parameters() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let construct = file.tree.call("List", Vec::new(), at());
        vec![declare("names", None, Some(construct))]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::GenericTypeOrFunctionParametersNeeded]);
}

#[test]
fn test_block_locals_do_not_escape() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let one = file.tree.literal(Literal::Integer(1), at());
        let read = file.tree.identifier("inner", at());
        vec![Stmt::Block(vec![declare("inner", None, Some(one))]), Stmt::Expression(read)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::NotResolved]);
}

#[test]
fn test_super_on_its_own_is_inappropriate() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |file| {
        let alone = file.tree.add_expr(ExprKind::Super, at(), "super");
        vec![Stmt::Expression(alone)]
    });
    assert_eq!(classifications(result), vec![ErrorClassification::InappropriateUseOfSuper]);
}

#[test]
fn test_declaration_without_type_or_value_halts() {
    let (_, _, result) = resolve_body(SymbolTable::new(), |_| vec![declare("nothing", None, None)]);
    assert!(matches!(result, Err(InternalError::MalformedStatement { .. })), "got {result:?}");
}
