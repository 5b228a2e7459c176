//! Built-in types every program starts with. They are registered first and in a fixed order,
//! so their ids are the same in every [`SymbolTable`].

use crate::span::SourceSpan;
use crate::symbols::table::{parameterisation_key, SymbolTable};
use crate::symbols::{Genus, Parameterisation, SymbolId};

pub const ANY: SymbolId = SymbolId(0);
pub const ANY_RECORD: SymbolId = SymbolId(1);
pub const VOID: SymbolId = SymbolId(2);
pub const BOOLEAN: SymbolId = SymbolId(3);
pub const INTEGER: SymbolId = SymbolId(4);
pub const FLOAT: SymbolId = SymbolId(5);
pub const STRING: SymbolId = SymbolId(6);
pub const CHARACTER: SymbolId = SymbolId(7);
pub const ITERATOR: SymbolId = SymbolId(8);
pub const LIST: SymbolId = SymbolId(10);
pub const DICT: SymbolId = SymbolId(12);

/// Operators the compiler can generate for an aggregate when asked to `default` them.
pub const COMPARISON_OPERATORS: [&str; 6] = ["<", "<=", ">", ">=", "==", "<>"];

/// Operators that change the value they are applied to.
pub const MUTATING_OPERATORS: [&str; 11] = ["++", "--", "+=", "-=", "*=", "/=", "|", ":=:", ":~:", ":^:", ":=?"];

pub fn is_mutating_operator(name: &str) -> bool {
    MUTATING_OPERATORS.contains(&name)
}

type OperatorSpec<'a> = (&'a str, &'a [SymbolId], Option<SymbolId>);

fn declare_all(table: &mut SymbolTable, owner: SymbolId, specs: &[OperatorSpec]) {
    for (name, parameters, returning) in specs {
        let named: Vec<(&str, SymbolId)> = parameters.iter().map(|ty| ("arg", *ty)).collect();
        let is_operator = !name.chars().next().is_some_and(char::is_alphabetic);
        let id = table.new_method(owner, name, &named, *returning, SourceSpan::synthetic());
        let method = table.symbol_mut(id);
        method.flags.operator = is_operator;
        method.flags.pure = !is_mutating_operator(name);
    }
}

fn declare_comparable(table: &mut SymbolTable, ty: SymbolId) {
    let this: &[SymbolId] = &[ty];
    declare_all(table, ty, &[
        ("<", this, Some(BOOLEAN)),
        ("<=", this, Some(BOOLEAN)),
        (">", this, Some(BOOLEAN)),
        (">=", this, Some(BOOLEAN)),
        ("==", this, Some(BOOLEAN)),
        ("<>", this, Some(BOOLEAN)),
        ("<=>", this, Some(INTEGER)),
        ("?", &[], Some(BOOLEAN)),
        ("$", &[], Some(STRING)),
        ("$$", &[], Some(STRING)),
        ("#?", &[], Some(INTEGER)),
    ]);
}

fn declare_arithmetic(table: &mut SymbolTable, ty: SymbolId) {
    let this: &[SymbolId] = &[ty];
    declare_all(table, ty, &[
        ("+", this, Some(ty)),
        ("-", this, Some(ty)),
        ("*", this, Some(ty)),
        ("/", this, Some(ty)),
        ("-", &[], Some(ty)),
        ("abs", &[], Some(ty)),
        ("++", &[], Some(ty)),
        ("--", &[], Some(ty)),
        ("+=", this, None),
        ("-=", this, None),
        ("*=", this, None),
        ("/=", this, None),
    ]);
}

pub(crate) fn register(table: &mut SymbolTable) {
    let span = SourceSpan::synthetic;
    let plain = [
        ("Any", Genus::Any, ANY),
        ("AnyRecord", Genus::Record, ANY_RECORD),
        ("Void", Genus::Class, VOID),
        ("Boolean", Genus::Class, BOOLEAN),
        ("Integer", Genus::Class, INTEGER),
        ("Float", Genus::Class, FLOAT),
        ("String", Genus::Class, STRING),
        ("Character", Genus::Class, CHARACTER),
    ];
    for (name, genus, expected) in plain {
        let id = table.new_aggregate(name, genus, span());
        debug_assert_eq!(id, expected, "built-in {name} registered out of order");
    }
    table.symbol_mut(ANY).flags.abstract_ = true;
    table.symbol_mut(ANY_RECORD).flags.abstract_ = true;

    let iterator = table.new_generic_aggregate("Iterator", Genus::Class, &["T"], span());
    let list = table.new_generic_aggregate("List", Genus::Class, &["T"], span());
    let dict = table.new_generic_aggregate("Dict", Genus::Class, &["K", "V"], span());
    debug_assert_eq!((iterator, list, dict), (ITERATOR, LIST, DICT));

    table.add_promotion(INTEGER, FLOAT);
    table.add_promotion(CHARACTER, STRING);

    declare_comparable(table, BOOLEAN);
    declare_all(table, BOOLEAN, &[
        ("and", &[BOOLEAN], Some(BOOLEAN)),
        ("or", &[BOOLEAN], Some(BOOLEAN)),
        ("xor", &[BOOLEAN], Some(BOOLEAN)),
        ("~", &[], Some(BOOLEAN)),
    ]);
    for number in [INTEGER, FLOAT] {
        declare_comparable(table, number);
        declare_arithmetic(table, number);
    }
    declare_comparable(table, STRING);
    declare_all(table, STRING, &[
        ("+", &[STRING], Some(STRING)),
        ("+=", &[STRING], None),
        ("contains", &[STRING], Some(BOOLEAN)),
        ("length", &[], Some(INTEGER)),
    ]);
    declare_comparable(table, CHARACTER);

    let element = type_parameter(table, ITERATOR, 0);
    declare_all(table, ITERATOR, &[
        ("hasNext", &[], Some(BOOLEAN)),
        ("next", &[], Some(element)),
        ("?", &[], Some(BOOLEAN)),
    ]);

    let element = type_parameter(table, LIST, 0);
    let iterator_of_element = conceptual_iterator(table, element);
    table.new_constructor(LIST, &[], span());
    table.new_constructor(LIST, &[("first", element)], span());
    declare_all(table, LIST, &[
        ("iterator", &[], Some(iterator_of_element)),
        ("contains", &[element], Some(BOOLEAN)),
        ("get", &[INTEGER], Some(element)),
        ("size", &[], Some(INTEGER)),
        ("?", &[], Some(BOOLEAN)),
        ("$", &[], Some(STRING)),
        ("#?", &[], Some(INTEGER)),
        ("+=", &[element], None),
        ("|", &[element], None),
    ]);

    let key = type_parameter(table, DICT, 0);
    let value = type_parameter(table, DICT, 1);
    table.new_constructor(DICT, &[], span());
    declare_all(table, DICT, &[
        ("contains", &[key], Some(BOOLEAN)),
        ("get", &[key], Some(value)),
        ("size", &[], Some(INTEGER)),
        ("?", &[], Some(BOOLEAN)),
        ("$", &[], Some(STRING)),
        ("#?", &[], Some(INTEGER)),
    ]);
}

fn type_parameter(table: &SymbolTable, generic: SymbolId, index: usize) -> SymbolId {
    table.symbol(generic).generic().map(|g| g.type_parameters[index]).unwrap_or(ANY)
}

/// `Iterator of T` for List's own `T`, registered in the intern table like any other parameterisation.
fn conceptual_iterator(table: &mut SymbolTable, element: SymbolId) -> SymbolId {
    let name = format!("Iterator of ({})", table.name(element));
    let id = table.new_unregistered_aggregate(&name, Genus::Class, SourceSpan::synthetic());
    table.set_origin(id, Parameterisation { generic: ITERATOR, arguments: vec![element] });
    table.intern(parameterisation_key(ITERATOR, &[element]), id);
    declare_all(table, id, &[
        ("hasNext", &[], Some(BOOLEAN)),
        ("next", &[], Some(element)),
        ("?", &[], Some(BOOLEAN)),
    ]);
    id
}
