//! Output formatting.

use crate::cli::OutputFormat;
use aurelia_compiler::Severity;
use aurelia_ls::MappedDiagnostic;
use camino::Utf8Path;
use serde::Serialize;
use source_map::{LineCol, LineIndex};

/// A formatted diagnostic for JSON output.
#[derive(Debug, Serialize)]
pub struct FormattedDiagnostic {
    /// The diagnostic type (Error, Warning, Info).
    #[serde(rename = "type")]
    pub diagnostic_type: String,
    /// The file path.
    pub filename: String,
    /// The start position.
    pub start: Position,
    /// The end position.
    pub end: Position,
    /// The message.
    pub message: String,
    /// The diagnostic code.
    pub code: String,
    /// The source channel (compiler, typecheck).
    pub source: String,
}

/// A position in the source.
#[derive(Debug, Serialize)]
pub struct Position {
    /// 1-indexed line number.
    pub line: u32,
    /// 1-indexed column number.
    pub column: u32,
    /// Byte offset.
    pub offset: u32,
}

fn position(index: &LineIndex, offset: source_map::ByteOffset) -> Position {
    let lc = index.line_col(offset).unwrap_or(LineCol::new(0, 0));
    Position {
        line: lc.line + 1,
        column: lc.col + 1,
        offset: u32::from(offset),
    }
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "Error",
        Severity::Warning => "Warning",
        Severity::Info => "Info",
    }
}

fn source_label(diag: &MappedDiagnostic) -> &'static str {
    match diag.source {
        aurelia_ls::DiagnosticSource::Compiler => "compiler",
        aurelia_ls::DiagnosticSource::Typecheck => "typecheck",
        aurelia_ls::DiagnosticSource::Typescript => "typescript",
    }
}

/// Formats diagnostics for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a file's diagnostics as text (empty for JSON mode).
    pub fn format(
        &self,
        diagnostics: &[MappedDiagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(diagnostics, file_path, source, false),
            OutputFormat::HumanVerbose => self.format_human(diagnostics, file_path, source, true),
            OutputFormat::Machine => self.format_machine(diagnostics, file_path, source),
            OutputFormat::Json => String::new(),
        }
    }

    fn format_human(
        &self,
        diagnostics: &[MappedDiagnostic],
        file_path: &Utf8Path,
        source: &str,
        verbose: bool,
    ) -> String {
        let line_index = LineIndex::new(source);
        let lines: Vec<&str> = source.lines().collect();
        let mut output = String::new();

        for diag in diagnostics {
            let start = line_index
                .line_col(diag.span.start)
                .unwrap_or(LineCol::new(0, 0));
            output.push_str(&format!(
                "{}:{}:{}\n{}: {} ({})\n",
                file_path,
                start.line + 1,
                start.col + 1,
                severity_label(diag.severity),
                diag.message,
                diag.code
            ));
            if verbose {
                let line_num = start.line as usize;
                if line_num < lines.len() {
                    output.push_str(&format!("  {} | {}\n", line_num + 1, lines[line_num]));
                    let padding = " ".repeat(start.col as usize);
                    output.push_str(&format!(
                        "  {} | {}^\n",
                        " ".repeat((line_num + 1).to_string().len()),
                        padding
                    ));
                }
            }
            output.push('\n');
        }

        output
    }

    fn format_machine(
        &self,
        diagnostics: &[MappedDiagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> String {
        let line_index = LineIndex::new(source);
        let mut output = String::new();
        for diag in diagnostics {
            let start = position(&line_index, diag.span.start);
            let end = position(&line_index, diag.span.end);
            output.push_str(&format!(
                "{} {}:{}:{}:{}:{} {} ({})\n",
                severity_label(diag.severity).to_uppercase(),
                file_path,
                start.line,
                start.column,
                end.line,
                end.column,
                diag.message,
                diag.code
            ));
        }
        output
    }

    /// Formats a file's diagnostics into JSON-ready structs.
    pub fn format_json_diagnostics(
        diagnostics: &[MappedDiagnostic],
        file_path: &Utf8Path,
        source: &str,
    ) -> Vec<FormattedDiagnostic> {
        let line_index = LineIndex::new(source);
        diagnostics
            .iter()
            .map(|diag| FormattedDiagnostic {
                diagnostic_type: severity_label(diag.severity).to_string(),
                filename: file_path.to_string(),
                start: position(&line_index, diag.span.start),
                end: position(&line_index, diag.span.end),
                message: diag.message.clone(),
                code: diag.code.clone(),
                source: source_label(diag).to_string(),
            })
            .collect()
    }
}

/// The summary printed after a check pass.
#[derive(Debug, Clone, Copy)]
pub struct CheckSummary {
    /// Number of templates checked.
    pub file_count: usize,
    /// Total errors.
    pub error_count: usize,
    /// Total warnings.
    pub warning_count: usize,
    /// Whether warnings fail the run.
    pub fail_on_warnings: bool,
}

impl CheckSummary {
    /// One-line summary.
    pub fn format(&self) -> String {
        format!(
            "Checked {} template{} — {} error{}, {} warning{}",
            self.file_count,
            plural(self.file_count),
            self.error_count,
            plural(self.error_count),
            self.warning_count,
            plural(self.warning_count),
        )
    }

    /// True when the process should exit non-zero.
    pub fn failed(&self) -> bool {
        self.error_count > 0 || (self.warning_count > 0 && self.fail_on_warnings)
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurelia_ls::DiagnosticSource;
    use source_map::Span;

    fn sample() -> MappedDiagnostic {
        MappedDiagnostic {
            source: DiagnosticSource::Compiler,
            severity: Severity::Error,
            code: "unknown-bindable".to_string(),
            message: "'my-card' does not declare a bindable 'subtitle'".to_string(),
            uri: source_map::normalize_uri("/src/app.html"),
            span: Span::new(9u32, 17u32),
            related: Vec::new(),
        }
    }

    #[test]
    fn human_format_has_position_and_code() {
        let formatter = Formatter::new(OutputFormat::Human);
        let source = "<my-card subtitle.bind=\"x\"></my-card>";
        let text = formatter.format(&[sample()], Utf8Path::new("src/app.html"), source);
        assert!(text.contains("src/app.html:1:10"));
        assert!(text.contains("Error:"));
        assert!(text.contains("(unknown-bindable)"));
    }

    #[test]
    fn machine_format_is_one_line() {
        let formatter = Formatter::new(OutputFormat::Machine);
        let source = "<my-card subtitle.bind=\"x\"></my-card>";
        let text = formatter.format(&[sample()], Utf8Path::new("src/app.html"), source);
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("ERROR src/app.html:1:10:"));
    }

    #[test]
    fn summary_exit_policy() {
        let mut summary = CheckSummary {
            file_count: 2,
            error_count: 0,
            warning_count: 1,
            fail_on_warnings: false,
        };
        assert!(!summary.failed());
        summary.fail_on_warnings = true;
        assert!(summary.failed());
        summary.fail_on_warnings = false;
        summary.error_count = 1;
        assert!(summary.failed());
    }
}
