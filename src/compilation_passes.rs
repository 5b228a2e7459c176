use rayon::prelude::*;
use tracing::{debug, warn};
use ir::ast::{Declaration, SourceFile};
use ir::context::Program;
use ir::errors::reporter::ErrorReporter;
use ir::symbols::table::SymbolTable;
use sentinel_resolver::monomorphization::assumed_operator_diagnostics;
use sentinel_resolver::{resolve_file, synthesise_delegations};
use crate::config::{ResolverConfig, ThreadingMode};
use crate::main_structs::{Compilation, CompilerError, FileOutcome};

/// Runs every pass over `files` against the program-wide symbol table.
pub fn compile(table: SymbolTable, files: &mut [SourceFile], config: &ResolverConfig) -> Result<Compilation, CompilerError> {
    if files.is_empty() {
        return Err(CompilerError::NoSourceFiles);
    }
    let program = Program::new(table);
    pass_trait_delegation(&program, files);
    let mut outcomes = pass_full_resolution(&program, files, config)?;
    pass_assumed_operators(&program, files, &mut outcomes, config);
    Ok(Compilation { program, outcomes })
}

/// Pass 1: Trait delegation
/// Adds the forwarding methods of `with trait of T by field` up front, so every file sees the
/// same methods on every class whichever order the files are resolved in.
pub fn pass_trait_delegation(program: &Program, files: &[SourceFile]) {
    let mut table = program.write();
    let created: usize = files.iter()
        .flat_map(|file| file.declarations.iter())
        .filter_map(|declaration| match declaration {
            Declaration::Aggregate { symbol, .. } => Some(*symbol),
            Declaration::Function { .. } => None,
        })
        .map(|aggregate| synthesise_delegations(&mut table, aggregate))
        .sum();
    debug!(files = files.len(), created, "trait delegation pass");
}

/// Pass 2: Full resolution
/// Types every expression of every file and checks its declarations. Semantic errors stay with
/// their file; the first internal error stops the whole pass.
pub fn pass_full_resolution(
    program: &Program,
    files: &mut [SourceFile],
    config: &ResolverConfig,
) -> Result<Vec<FileOutcome>, CompilerError> {
    debug!(files = files.len(), threading = ?config.threading, "full resolution pass");
    match config.threading {
        ThreadingMode::Parallel => files.par_iter_mut()
            .map(|file| resolve_one(program, file, config))
            .collect(),
        ThreadingMode::SingleThreaded => files.iter_mut()
            .map(|file| resolve_one(program, file, config))
            .collect(),
    }
}

/// Pass 3: Assumed operators
/// A file can use a generic before another file resolves the generic's body, so every use is
/// checked again once all bodies are known. Only findings the file has not already reported
/// are added.
pub fn pass_assumed_operators(
    program: &Program,
    files: &[SourceFile],
    outcomes: &mut [FileOutcome],
    config: &ResolverConfig,
) {
    let table = program.read();
    let mut added = 0;
    for (file, outcome) in files.iter().zip(outcomes.iter_mut()) {
        let late: Vec<_> = assumed_operator_diagnostics(&table, file.tree.parameterisations())
            .into_iter()
            .filter(|diagnostic| !outcome.diagnostics.contains(diagnostic))
            .collect();
        if late.is_empty() {
            continue;
        }
        warn!(file = %file.name, errors = late.len(), "generic arguments lack assumed operators");
        if config.report_diagnostics {
            let mut error_reporter = ErrorReporter::new().with_colors(config.use_colors);
            for diagnostic in &late {
                error_reporter.semantic_error(&diagnostic.span, diagnostic.message.clone(), diagnostic.classification);
            }
            error_reporter.report_all();
        }
        added += late.len();
        outcome.add_diagnostics(late);
    }
    debug!(files = files.len(), added, "assumed operator pass");
}

fn resolve_one(program: &Program, file: &mut SourceFile, config: &ResolverConfig) -> Result<FileOutcome, CompilerError> {
    let error_reporter = ErrorReporter::new().with_colors(config.use_colors);
    let error_reporter = resolve_file(program, file, error_reporter)
        .map_err(|source| CompilerError::InternalInFile { file: file.name.clone(), source })?;

    if error_reporter.has_errors() {
        warn!(file = %file.name, errors = error_reporter.error_count(), "file has semantic errors");
        if config.report_diagnostics {
            error_reporter.report_all();
        }
    }
    Ok(FileOutcome::new(file.name.clone(), error_reporter.into_diagnostics()))
}
