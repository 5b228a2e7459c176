use std::hint::black_box;
use criterion::{criterion_group, criterion_main, Criterion};
use ir::ast::{Declaration, SourceFile, Stmt, TypeRef};
use ir::span::SourceSpan;
use ir::symbols::builtins::{DICT, FLOAT, INTEGER, LIST, STRING};
use ir::symbols::table::SymbolTable;
use keel_lang::{compile, ResolverConfig};
use sentinel_resolver::monomorphization::parameterise;

const FILES: usize = 64;

pub fn bench_interned_lookup(c: &mut Criterion) {
    let mut table = SymbolTable::new();
    let strings = parameterise(&mut table, LIST, &[STRING]).id;
    parameterise(&mut table, DICT, &[INTEGER, strings]);

    c.bench_function("interned_lookup", |b| {
        b.iter(|| {
            let strings = parameterise(&mut table, black_box(LIST), &[STRING]).id;
            parameterise(&mut table, black_box(DICT), &[INTEGER, strings])
        });
    });
}

pub fn bench_first_parameterisation(c: &mut Criterion) {
    c.bench_function("first_parameterisation", |b| {
        b.iter(|| {
            let mut table = SymbolTable::new();
            let floats = parameterise(&mut table, LIST, &[FLOAT]).id;
            parameterise(&mut table, DICT, &[STRING, floats])
        });
    });
}

// Every file asks for the same `Dict of (String, List of Float)`.
fn contended_files(table: &mut SymbolTable) -> Vec<SourceFile> {
    (0..FILES)
        .map(|index| {
            let mut file = SourceFile::new(&format!("bench{index}.keel"));
            let at = file.span(1, 1);
            let function = table.new_function(&format!("bench{index}"), &[], None, SourceSpan::synthetic());
            let construct = file.tree.call("Dict", Vec::new(), at.clone());
            let floats = TypeRef::of("List", vec![TypeRef::named("Float", at.clone())], at.clone());
            let declared = TypeRef::of("Dict", vec![TypeRef::named("String", at.clone()), floats], at.clone());
            file.declarations.push(Declaration::Function {
                symbol: function,
                body: vec![Stmt::Declare {
                    name: "lookup".into(),
                    declared: Some(declared),
                    initializer: Some(construct),
                    constant: false,
                    span: at,
                }],
            });
            file
        })
        .collect()
}

pub fn bench_contended_resolution(c: &mut Criterion) {
    let config = ResolverConfig::new().with_colors(false);
    c.bench_function("contended_resolution", |b| {
        b.iter(|| {
            let mut table = SymbolTable::new();
            let mut files = contended_files(&mut table);
            compile(table, &mut files, &config).map(|compilation| compilation.error_count())
        });
    });
}

criterion_group!(benches, bench_interned_lookup, bench_first_parameterisation, bench_contended_resolution);
criterion_main!(benches);
