use std::sync::Arc;
use thiserror::Error;
use ir::context::Program;
use ir::errors::error::{Diagnostic, InternalError};

// What one source file came out of the resolution pass with. Later passes only take
// files that are `valid`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub file_name: Arc<str>,
    pub diagnostics: Vec<Diagnostic>,
    pub valid: bool,
}

impl FileOutcome {
    pub(crate) fn new(file_name: Arc<str>, diagnostics: Vec<Diagnostic>) -> Self {
        let valid = diagnostics.is_empty();
        FileOutcome { file_name, diagnostics, valid }
    }

    pub(crate) fn add_diagnostics(&mut self, diagnostics: Vec<Diagnostic>) {
        self.valid &= diagnostics.is_empty();
        self.diagnostics.extend(diagnostics);
    }
}

pub struct Compilation {
    pub program: Program,
    /// In the order the files were given.
    pub outcomes: Vec<FileOutcome>,
}

impl Compilation {
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.valid)
    }

    pub fn error_count(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.diagnostics.len()).sum()
    }

    pub fn outcome(&self, file_name: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|outcome| &*outcome.file_name == file_name)
    }
}

#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("No source files found")]
    NoSourceFiles,

    #[error("Internal compiler error: {0}")]
    Internal(#[from] InternalError),

    #[error("Internal compiler error in {file}: {source}")]
    InternalInFile {
        file: Arc<str>,
        source: InternalError,
    },
}

impl CompilerError {
    pub fn internal_error(&self) -> Option<&InternalError> {
        match self {
            CompilerError::NoSourceFiles => None,
            CompilerError::Internal(error) | CompilerError::InternalInFile { source: error, .. } => Some(error),
        }
    }
}
