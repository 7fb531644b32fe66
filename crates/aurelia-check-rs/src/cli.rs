//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};

/// Template compiler and type-check bridge for Aurelia projects.
#[derive(Debug, Parser)]
#[command(name = "aurelia-check-rs")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Working directory for the check
    #[arg(long, default_value = ".")]
    pub workspace: Utf8PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "human")]
    pub output: OutputFormat,

    /// Minimum severity threshold
    #[arg(long, value_enum, default_value = "warning")]
    pub threshold: Threshold,

    /// Watch mode
    #[arg(long)]
    pub watch: bool,

    /// Preserve watch output (don't clear screen)
    #[arg(long = "preserveWatchOutput")]
    pub preserve_watch_output: bool,

    /// Exit with error on warnings
    #[arg(long = "fail-on-warnings")]
    pub fail_on_warnings: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Externally produced overlay diagnostics to merge (JSON file)
    #[arg(long = "typecheck-diagnostics")]
    pub typecheck_diagnostics: Option<Utf8PathBuf>,

    /// Print the planned overlay for each template (for debugging)
    #[arg(long = "emit-overlay")]
    pub emit_overlay: bool,

    /// Diagnostic sources to include (comma-separated: compiler,typecheck)
    #[arg(long = "diagnostic-sources")]
    pub diagnostic_sources: Option<String>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// Human-readable with code snippets
    HumanVerbose,
    /// JSON output
    Json,
    /// Machine-readable (one line per diagnostic)
    Machine,
}

/// Severity threshold.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum Threshold {
    /// Only show errors
    Error,
    /// Show errors and warnings (default)
    #[default]
    Warning,
}

impl Args {
    /// Returns whether compiler diagnostics should be included.
    pub fn include_compiler(&self) -> bool {
        self.diagnostic_sources
            .as_ref()
            .map(|s| s.contains("compiler"))
            .unwrap_or(true)
    }

    /// Returns whether mapped type-checker diagnostics should be included.
    pub fn include_typecheck(&self) -> bool {
        self.diagnostic_sources
            .as_ref()
            .map(|s| s.contains("typecheck"))
            .unwrap_or(true)
    }
}
