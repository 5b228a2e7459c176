use crate::errors::error::{Diagnostic, ErrorClassification};
use crate::span::SourceSpan;

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

/// Accumulates the semantic errors of one source file in source order.
#[derive(Debug, Clone)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    pub use_colors: bool,
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            use_colors: std::io::stderr().is_terminal(),
        }
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn semantic_error(
        &mut self,
        span: &SourceSpan,
        message: impl Into<String>,
        classification: ErrorClassification,
    ) {
        self.diagnostics.push(Diagnostic::new(span.clone(), message, classification));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn count_of(&self, classification: ErrorClassification) -> usize {
        self.diagnostics.iter().filter(|d| d.classification == classification).count()
    }

    pub fn classifications(&self) -> Vec<ErrorClassification> {
        self.diagnostics.iter().map(|d| d.classification).collect()
    }

    pub fn report_all(&self) {
        for diagnostic in &self.diagnostics {
            self.print_diagnostic(diagnostic);
        }
        if !self.diagnostics.is_empty() {
            let error_count = self.diagnostics.len();
            let plural = if error_count == 1 { "" } else { "s" };
            if self.use_colors {
                eprintln!(
                    "\n{} Found {} error{}",
                    "error".bright_red().bold(),
                    error_count,
                    plural
                );
            } else {
                eprintln!("\nFound {} error{}", error_count, plural);
            }
        }
    }

    fn print_diagnostic(&self, diagnostic: &Diagnostic) {
        let description = diagnostic.classification.description();
        if self.use_colors {
            eprintln!(
                "{}: {}",
                "error".bright_red().bold(),
                diagnostic.classification.name().bold()
            );
            eprintln!("  {} {}", "-->".bright_blue().bold(), diagnostic.span);
            if diagnostic.message.is_empty() {
                eprintln!("  {} {}", "=".bright_blue().bold(), description);
            } else {
                eprintln!("  {} {} {}", "=".bright_blue().bold(), diagnostic.message, description);
            }
        } else {
            eprintln!("error: {}", diagnostic.classification.name());
            eprintln!("  --> {}", diagnostic.span);
            if diagnostic.message.is_empty() {
                eprintln!("  = {}", description);
            } else {
                eprintln!("  = {} {}", diagnostic.message, description);
            }
        }
    }
}
