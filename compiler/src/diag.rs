// diag.rs — Unified diagnostics model
//
// Provides the shared diagnostic types reported by the frontend and carried
// through the pipeline. Only the analyzer records diagnostics; later phases
// report failures through `PipelineError` instead.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;
use std::path::PathBuf;

use crate::ast::Span;
use crate::source::SourceFile;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0100`, `W0001`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub mod codes {
    use super::DiagCode;

    pub const E0001: DiagCode = DiagCode("E0001"); // syntax error
    pub const E0100: DiagCode = DiagCode("E0100"); // duplicate declaration
    pub const E0101: DiagCode = DiagCode("E0101"); // unknown name
    pub const E0102: DiagCode = DiagCode("E0102"); // type mismatch
    pub const E0103: DiagCode = DiagCode("E0103"); // arity mismatch
    pub const E0104: DiagCode = DiagCode("E0104"); // missing return
    pub const E0105: DiagCode = DiagCode("E0105"); // non-constant global initializer
    pub const E0106: DiagCode = DiagCode("E0106"); // unknown type

    pub const W0001: DiagCode = DiagCode("W0001"); // unused local
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Location ─────────────────────────────────────────────────────────────

/// File position a diagnostic points at, resolved while the source is at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
    }
}

// ── Related span ─────────────────────────────────────────────────────────

/// A secondary source location providing context for a diagnostic.
#[derive(Debug, Clone)]
pub struct RelatedSpan {
    pub span: Span,
    pub label: String,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A compiler diagnostic emitted by the frontend.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub span: Span,
    pub location: Option<Location>,
    pub message: String,
    pub hint: Option<String>,
    pub related_spans: Vec<RelatedSpan>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, location, hint or related spans.
    pub fn new(level: DiagLevel, span: Span, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            span,
            location: None,
            message: message.into(),
            hint: None,
            related_spans: Vec::new(),
        }
    }

    pub fn error(span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, span, message)
    }

    pub fn warning(span: Span, message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, span, message)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a related span.
    pub fn with_related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related_spans.push(RelatedSpan {
            span,
            label: label.into(),
        });
        self
    }

    /// Resolve the span's start to a line/column in `file`.
    pub fn located_in(mut self, file: &SourceFile) -> Self {
        let (line, column) = file.line_col(self.span.start);
        self.location = Some(Location {
            path: file.path.clone(),
            line,
            column,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagLevel::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        if let Some(location) = &self.location {
            write!(f, "{}: ", location)?;
        }
        if let Some(code) = &self.code {
            write!(f, "{}[{}]: {}", level, code, self.message)?;
        } else {
            write!(f, "{}: {}", level, self.message)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}

/// True if any diagnostic has error severity.
pub fn has_errors(diags: &[Diagnostic]) -> bool {
    diags.iter().any(Diagnostic::is_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::FileId;

    fn dummy_span() -> Span {
        Span::from(0..1)
    }

    #[test]
    fn display_without_code() {
        let d = Diagnostic::new(DiagLevel::Error, dummy_span(), "something failed");
        assert_eq!(format!("{d}"), "error: something failed");
    }

    #[test]
    fn display_with_code() {
        let d = Diagnostic::warning(dummy_span(), "unused local `x`").with_code(codes::W0001);
        assert_eq!(format!("{d}"), "warning[W0001]: unused local `x`");
    }

    #[test]
    fn display_with_location_and_hint() {
        let file = SourceFile::new(FileId(0), "a.src", "val x: Int = true;");
        let d = Diagnostic::error(Span::from(13..17), "type mismatch")
            .with_code(codes::E0102)
            .with_hint("expected Int")
            .located_in(&file);
        assert_eq!(
            format!("{d}"),
            "a.src:1:14: error[E0102]: type mismatch\n  hint: expected Int"
        );
    }

    #[test]
    fn builder_chain() {
        let d = Diagnostic::error(dummy_span(), "duplicate declaration")
            .with_code(codes::E0100)
            .with_related(dummy_span(), "first declared here");
        assert_eq!(d.code, Some(codes::E0100));
        assert_eq!(d.related_spans.len(), 1);
        assert!(has_errors(&[d]));
    }
}
