//! Compiler diagnostics.

use source_map::Span;

/// Severity of a compiler diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Informational.
    Info,
    /// Should be fixed.
    Warning,
    /// Broken template.
    Error,
}

/// Diagnostic codes emitted by the linker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticCode {
    /// A binding targets a bindable the owner does not declare.
    UnknownBindable,
    /// An attribute command outside the built-in command set.
    UnknownCommand,
    /// A `| name` tail that resolves to no value converter.
    UnknownConverter,
    /// A `& name` tail that resolves to no binding behavior.
    UnknownBehavior,
    /// A `.for` command on something that is not a template controller.
    ForOnNonController,
    /// A `repeat.for` value that is not a `for-of` head.
    InvalidIteratorHead,
    /// A recoverable expression parse failure.
    BadExpression,
    /// Template parse recovery.
    ParseError,
    /// Two local templates declare the same name.
    DuplicateLocalTemplate,
}

impl DiagnosticCode {
    /// The stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnknownBindable => "unknown-bindable",
            DiagnosticCode::UnknownCommand => "unknown-command",
            DiagnosticCode::UnknownConverter => "unknown-converter",
            DiagnosticCode::UnknownBehavior => "unknown-behavior",
            DiagnosticCode::ForOnNonController => "for-on-non-controller",
            DiagnosticCode::InvalidIteratorHead => "invalid-iterator-head",
            DiagnosticCode::BadExpression => "bad-expression",
            DiagnosticCode::ParseError => "parse-error",
            DiagnosticCode::DuplicateLocalTemplate => "duplicate-local-template",
        }
    }

    /// Default severity for the code.
    pub fn default_severity(&self) -> Severity {
        match self {
            DiagnosticCode::UnknownBindable
            | DiagnosticCode::UnknownConverter
            | DiagnosticCode::UnknownBehavior => Severity::Warning,
            DiagnosticCode::UnknownCommand
            | DiagnosticCode::ForOnNonController
            | DiagnosticCode::InvalidIteratorHead
            | DiagnosticCode::BadExpression
            | DiagnosticCode::ParseError
            | DiagnosticCode::DuplicateLocalTemplate => Severity::Error,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A diagnostic produced by the compiler, with a template span.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerDiagnostic {
    /// The code.
    pub code: DiagnosticCode,
    /// Severity.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// The template span.
    pub span: Span,
}

impl CompilerDiagnostic {
    /// Creates a diagnostic with the code's default severity.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: code.default_severity(),
            code,
            message: message.into(),
            span,
        }
    }
}
