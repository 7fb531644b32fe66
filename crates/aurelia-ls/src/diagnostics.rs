//! Diagnostic mapping.
//!
//! Compiler diagnostics already carry template spans and pass through.
//! Type-checker diagnostics arrive with overlay spans and are rewritten:
//! the provenance index resolves the overlay span to a template location,
//! the overlay location is demoted to related information when the two
//! disagree, type names are rewritten through the overlay planner's alias
//! map, and equal-type mismatches are suppressed.

use aurelia_compiler::{Severity, TemplateCompilation};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::{DocumentUri, ProvenanceIndex, Span};

/// Which channel produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSource {
    /// The template compiler.
    Compiler,
    /// The overlay type-checker bridge.
    Typecheck,
    /// The external TypeScript checker itself.
    Typescript,
}

/// A diagnostic produced by the external type-checker over overlay text.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypecheckDiagnostic {
    /// The overlay document the span points into.
    pub uri: String,
    /// Overlay span.
    pub span: Span,
    /// Checker code (`2339`, …).
    pub code: String,
    /// Message, possibly naming overlay aliases.
    pub message: String,
    /// `error`, `warning`, or `info`.
    pub severity: String,
    /// Quick-info type of the actual expression, when the checker provides
    /// it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<String>,
    /// The expected type at the site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<String>,
}

/// Related information attached to a mapped diagnostic.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedInfo {
    /// The document.
    pub uri: DocumentUri,
    /// The span within it.
    pub span: Span,
    /// Short description.
    pub message: String,
}

/// A diagnostic in template coordinates, ready for output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedDiagnostic {
    /// Producing channel.
    pub source: DiagnosticSource,
    /// Severity.
    pub severity: Severity,
    /// Stable code.
    pub code: String,
    /// Message with overlay aliases rewritten.
    pub message: String,
    /// The template document.
    pub uri: DocumentUri,
    /// The primary template span.
    pub span: Span,
    /// Related locations (the overlay site, when it disagrees).
    pub related: Vec<RelatedInfo>,
}

/// The result of a mapping pass.
#[derive(Debug)]
pub struct MappedDiagnostics {
    /// Diagnostics in template coordinates.
    pub diagnostics: Vec<MappedDiagnostic>,
    /// Overlay regions that could not be mapped back.
    pub gaps: Vec<String>,
}

/// Merges compiler diagnostics with mapped type-checker diagnostics.
pub fn map_diagnostics(
    compilation: &TemplateCompilation,
    provenance: &ProvenanceIndex,
    typecheck: &[TypecheckDiagnostic],
) -> MappedDiagnostics {
    let mut diagnostics: Vec<MappedDiagnostic> = Vec::new();
    let mut gaps = Vec::new();

    for diag in &compilation.diagnostics {
        diagnostics.push(MappedDiagnostic {
            source: DiagnosticSource::Compiler,
            severity: diag.severity,
            code: diag.code.as_str().to_string(),
            message: diag.message.clone(),
            uri: compilation.uri.clone(),
            span: diag.span,
            related: Vec::new(),
        });
    }

    for diag in typecheck {
        if suppress_equal_types(diag, &compilation.overlay.aliases) {
            continue;
        }
        let Some(edge) = provenance.lookup_generated(compilation.overlay.overlay_file, diag.span.start)
        else {
            gaps.push(format!(
                "no provenance for overlay span {}..{} ({})",
                u32::from(diag.span.start),
                u32::from(diag.span.end),
                diag.code
            ));
            continue;
        };

        // Prefer the template location; keep the overlay site as related
        // info only when the mapped region and the reported span disagree.
        let mut related = Vec::new();
        if edge.overlay.span != diag.span {
            related.push(RelatedInfo {
                uri: SmolStr::from(diag.uri.as_str()),
                span: diag.span,
                message: "reported against the generated overlay".to_string(),
            });
        }

        diagnostics.push(MappedDiagnostic {
            source: DiagnosticSource::Typecheck,
            severity: parse_severity(&diag.severity),
            code: diag.code.clone(),
            message: rewrite_aliases(&diag.message, &compilation.overlay.aliases),
            uri: compilation.uri.clone(),
            span: edge.template.span,
            related,
        });
    }

    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));
    MappedDiagnostics { diagnostics, gaps }
}

fn parse_severity(text: &str) -> Severity {
    match text {
        "warning" => Severity::Warning,
        "info" | "suggestion" | "hint" => Severity::Info,
        _ => Severity::Error,
    }
}

/// Rewrites overlay type aliases (`__VM`) to their display names.
fn rewrite_aliases(message: &str, aliases: &FxHashMap<SmolStr, SmolStr>) -> String {
    let mut out = message.to_string();
    for (alias, display) in aliases {
        if out.contains(alias.as_str()) {
            out = out.replace(alias.as_str(), display.as_str());
        }
    }
    out
}

/// Type-mismatch diagnostics whose actual and expected types normalize
/// equal are overlay artifacts, not user errors.
fn suppress_equal_types(
    diag: &TypecheckDiagnostic,
    aliases: &FxHashMap<SmolStr, SmolStr>,
) -> bool {
    let (Some(actual), Some(expected)) = (&diag.actual_type, &diag.expected_type) else {
        return false;
    };
    normalize_type(&rewrite_aliases(actual, aliases))
        == normalize_type(&rewrite_aliases(expected, aliases))
}

fn normalize_type(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}
