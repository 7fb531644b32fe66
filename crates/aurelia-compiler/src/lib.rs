//! Template compilation for aurelia-check-rs.
//!
//! `compile` runs the full per-template pipeline: parse the HTML, analyze
//! attribute names, link against the resource index, bind scopes, and plan
//! the overlay. Everything downstream (diagnostics, cursor entities,
//! semantic tokens, rename) consumes the [`TemplateCompilation`] this
//! crate produces.

mod diag;
mod instruction;
mod link;
mod overlay;
mod query;
mod scope;
mod table;

pub use diag::{CompilerDiagnostic, DiagnosticCode, Severity};
pub use instruction::{BindingTarget, ExprSource, Instruction, LinkedRow, NodeSem};
pub use link::{link, LinkedTemplate, NodeInfo};
pub use overlay::{plan_overlay, OverlayPlan};
pub use query::{ExpectedType, QueryFacade};
pub use scope::{ScopeFrame, ScopeGraph, ScopeSymbol, ScopeSymbolKind};
pub use table::{ExprEntry, ExprRole, ExprTable};

use aurelia_expr::ParseOptions;
use aurelia_resources::ResourceIndex;
use aurelia_template::{parse_template, AttributeParser, ParsedTemplate};
use source_map::FileId;

/// Options for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Expression-parse options (globals, base spans are managed
    /// internally).
    pub parse: ParseOptions,
    /// The view-model class name, for overlay typing.
    pub vm_class: Option<String>,
}

/// The full output of compiling one template.
#[derive(Debug)]
pub struct TemplateCompilation {
    /// Normalized template URI.
    pub uri: source_map::DocumentUri,
    /// Parsed DOM and meta declarations.
    pub parsed: ParsedTemplate,
    /// Linked rows, scope graph, expression table.
    pub linked: LinkedTemplate,
    /// The planned overlay.
    pub overlay: OverlayPlan,
    /// Combined parse + link diagnostics, in source order.
    pub diagnostics: Vec<CompilerDiagnostic>,
}

impl TemplateCompilation {
    /// A query facade over this compilation.
    pub fn query<'a>(&'a self, resources: &'a ResourceIndex) -> QueryFacade<'a> {
        QueryFacade::new(&self.linked, resources)
    }
}

/// Compiles one template end to end.
///
/// `template_file` and `overlay_file` are the interned ids of the template
/// document and its generated overlay document.
pub fn compile(
    uri: &str,
    source: &str,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    template_file: FileId,
    overlay_file: FileId,
    options: &CompileOptions,
) -> TemplateCompilation {
    let parsed = parse_template(source);
    let linked = link(
        uri,
        &parsed.dom,
        &parsed.meta,
        resources,
        attr_parser,
        &options.parse,
    );

    let mut diagnostics: Vec<CompilerDiagnostic> = parsed
        .errors
        .iter()
        .map(|error| {
            CompilerDiagnostic::new(DiagnosticCode::ParseError, error.to_string(), error.span)
        })
        .collect();
    diagnostics.extend(linked.diagnostics.iter().cloned());
    diagnostics.sort_by_key(|d| (d.span.start, d.span.end));

    let overlay = plan_overlay(
        &linked,
        options.vm_class.as_deref(),
        template_file,
        overlay_file,
    );

    TemplateCompilation {
        uri: source_map::normalize_uri(uri),
        parsed,
        linked,
        overlay,
        diagnostics,
    }
}
