//! Rename and code actions.
//!
//! Rename is reference-driven: resolve the cursor entity, derive the
//! symbol, collect every template-side site from the reference index, and
//! rewrite each site in its own name form. Script-side edits ride along
//! through the `Sourced` locations the resource index keeps.

use crate::cursor::{is_renameable, CursorEntity};
use crate::refs::{build_reference_index, frame_declaring, NameForm, ReferenceKind};
use aurelia_compiler::TemplateCompilation;
use aurelia_resources::{ResourceIndex, SymbolId};
use aurelia_template::AttributeParser;
use smol_str::SmolStr;
use source_map::{DocumentUri, Span};
use thiserror::Error;

/// A single text edit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEdit {
    /// The document to edit.
    pub uri: DocumentUri,
    /// The span to replace.
    pub span: Span,
    /// The replacement text.
    pub new_text: SmolStr,
}

/// Why a rename was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenameError {
    /// Nothing at the cursor.
    #[error("nothing renameable at this position")]
    NoEntity,
    /// The entity is framework-owned or a keyword.
    #[error("'{name}' cannot be renamed")]
    NotRenameable {
        /// The blocked name.
        name: String,
    },
}

/// Computes the rename edits for the entity at `offset`.
pub fn rename(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    source: &str,
    offset: source_map::ByteOffset,
    new_name: &str,
) -> Result<Vec<TextEdit>, RenameError> {
    let hit = crate::cursor::resolve(compilation, resources, attr_parser, source, offset)
        .ok_or(RenameError::NoEntity)?;
    if !is_renameable(&hit.entity, resources) {
        return Err(RenameError::NotRenameable {
            name: entity_name(&hit.entity).to_string(),
        });
    }

    let symbol = symbol_of(&hit.entity, compilation, resources)
        .ok_or(RenameError::NoEntity)?;

    let sites = build_reference_index(compilation, resources, attr_parser, source);
    let mut edits: Vec<TextEdit> = sites
        .iter()
        .filter(|site| site.symbol == symbol)
        .map(|site| TextEdit {
            uri: site.uri.clone(),
            span: site.span,
            new_text: site.name_form.render(new_name),
        })
        .collect();

    // Script-side declaration, when the definition records one.
    if let Some(def) = resources.get(&symbol) {
        if let Some(location) = &def.name.location {
            edits.push(TextEdit {
                uri: location.uri.clone(),
                span: location.span,
                new_text: NameForm::of(new_name).render(new_name),
            });
        }
    }

    edits.sort_by_key(|e| (e.uri.clone(), e.span.start));
    edits.dedup();
    Ok(edits)
}

fn entity_name(entity: &CursorEntity) -> &str {
    match entity {
        CursorEntity::CeTag { name, .. }
        | CursorEntity::CaAttr { name, .. }
        | CursorEntity::TcAttr { name, .. }
        | CursorEntity::Command { name, .. }
        | CursorEntity::PlainAttrBinding { name, .. }
        | CursorEntity::ValueConverter { name, .. }
        | CursorEntity::BindingBehavior { name, .. }
        | CursorEntity::ScopeIdentifier { name, .. }
        | CursorEntity::LocalTemplateName { name, .. }
        | CursorEntity::AsElement { name, .. } => name,
        CursorEntity::Bindable { property, .. } => property,
        CursorEntity::MemberAccess { path, .. } => path,
    }
}

/// Derives the symbol a cursor entity refers to.
fn symbol_of(
    entity: &CursorEntity,
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
) -> Option<SymbolId> {
    match entity {
        CursorEntity::CeTag { res, .. }
        | CursorEntity::CaAttr { res, .. }
        | CursorEntity::TcAttr { res, .. } => Some(res.clone()),
        CursorEntity::ValueConverter { res, .. } | CursorEntity::BindingBehavior { res, .. } => {
            res.clone()
        }
        CursorEntity::Bindable {
            owner, property, ..
        } => Some(SymbolId::bindable(owner, property)),
        CursorEntity::ScopeIdentifier {
            name, frame, span, ..
        } => {
            // A usage resolves through the frame chain; a declaration site
            // is the symbol's own span.
            let declared = compilation
                .linked
                .scope
                .resolve(*frame, name, 0)
                .map(|(frame, _)| frame)
                .or_else(|| frame_declaring(compilation, *span))?;
            Some(SymbolId::local(
                compilation.uri.as_str(),
                declared,
                name,
            ))
        }
        CursorEntity::LocalTemplateName { name, .. } | CursorEntity::AsElement { name, .. } => {
            resources
                .element(name)
                .map(|(id, _)| id.clone())
                .or_else(|| {
                    Some(SymbolId::resource(
                        aurelia_resources::ResourceKind::CustomElement,
                        name,
                        Some(compilation.uri.as_str()),
                    ))
                })
        }
        CursorEntity::MemberAccess { .. } | CursorEntity::Command { .. } => None,
        CursorEntity::PlainAttrBinding { .. } => None,
    }
}

/// A quick-fix produced from a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAction {
    /// Human-readable title.
    pub title: String,
    /// The edits to apply.
    pub edits: Vec<TextEdit>,
}

/// Computes quick-fixes for the compiler diagnostics of a template:
/// spelling suggestions for unknown converters, behaviors, and commands.
pub fn code_actions(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
) -> Vec<CodeAction> {
    use aurelia_compiler::DiagnosticCode;

    let mut actions = Vec::new();
    for diag in &compilation.diagnostics {
        let candidates: Vec<SmolStr> = match diag.code {
            DiagnosticCode::UnknownConverter => resources
                .iter()
                .filter(|(_, def)| {
                    def.kind == aurelia_resources::ResourceKind::ValueConverter
                })
                .map(|(_, def)| def.name.value.clone())
                .collect(),
            DiagnosticCode::UnknownBehavior => resources
                .iter()
                .filter(|(_, def)| {
                    def.kind == aurelia_resources::ResourceKind::BindingBehavior
                })
                .map(|(_, def)| def.name.value.clone())
                .collect(),
            DiagnosticCode::UnknownCommand => aurelia_resources::BINDING_COMMANDS
                .iter()
                .map(|c| SmolStr::new_static(c))
                .collect(),
            _ => continue,
        };
        let written = extract_quoted(&diag.message).unwrap_or_default();
        if let Some(best) = closest_match(&written, &candidates) {
            actions.push(CodeAction {
                title: format!("Replace '{written}' with '{best}'"),
                edits: vec![TextEdit {
                    uri: compilation.uri.clone(),
                    span: diag.span,
                    new_text: best,
                }],
            });
        }
    }
    actions
}

/// Pulls the 'quoted' name out of a diagnostic message.
fn extract_quoted(message: &str) -> Option<String> {
    let start = message.find('\'')? + 1;
    let end = message[start..].find('\'')? + start;
    Some(message[start..end].to_string())
}

/// The closest candidate within an edit distance of 2.
fn closest_match(written: &str, candidates: &[SmolStr]) -> Option<SmolStr> {
    candidates
        .iter()
        .map(|c| (edit_distance(written, c), c))
        .filter(|(d, _)| *d <= 2 && *d > 0)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.clone())
}

fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}
