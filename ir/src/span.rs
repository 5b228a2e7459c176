use std::fmt;
use std::sync::Arc;

// Represents a source location for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceSpan {
    pub file_name: Arc<str>,
    pub line: usize,
    pub column: usize,
}

impl SourceSpan {
    pub fn new(file_name: impl Into<Arc<str>>, line: usize, column: usize) -> Self {
        SourceSpan { file_name: file_name.into(), line, column }
    }

    /// Location used for symbols the compiler itself creates (built-ins, synthetic methods).
    pub fn synthetic() -> Self {
        SourceSpan::new("<builtin>", 0, 0)
    }

    pub fn at(&self, line: usize, column: usize) -> Self {
        SourceSpan { file_name: self.file_name.clone(), line, column }
    }
}

impl Default for SourceSpan {
    fn default() -> Self {
        SourceSpan::synthetic()
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line number {} at column {} inside of file named {}", self.line, self.column, self.file_name)
    }
}
