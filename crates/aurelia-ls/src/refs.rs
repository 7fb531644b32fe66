//! The template-side reference index.
//!
//! Every place a symbol's *name* appears as text in a template becomes a
//! `TextReferenceSite`: tag names, attribute targets, converter and
//! behavior names, scope identifiers, local-template declarations. The
//! rename engine edits these sites; the references feature composes them
//! with script-side sites supplied by the host.

use aurelia_compiler::{NodeSem, TemplateCompilation};
use aurelia_expr::Expr;
use aurelia_resources::{ResourceIndex, ResourceKind, SymbolId};
use aurelia_template::AttributeParser;
use smol_str::SmolStr;
use source_map::{DocumentUri, ExprId, FrameId, NodeId, Span};

/// How the name is written at the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameForm {
    /// `my-card`
    KebabCase,
    /// `dateFormat`
    CamelCase,
    /// `MyCard`
    PascalCase,
}

impl NameForm {
    /// Classifies how `text` is written.
    pub fn of(text: &str) -> NameForm {
        if text.contains('-') {
            NameForm::KebabCase
        } else if text.chars().next().is_some_and(char::is_uppercase) {
            NameForm::PascalCase
        } else {
            NameForm::CamelCase
        }
    }

    /// Renders `name` in this form, converting from kebab or camel input.
    pub fn render(&self, name: &str) -> SmolStr {
        let camel = aurelia_resources::dash_to_camel(name);
        match self {
            NameForm::KebabCase => aurelia_resources::camel_to_dash(&camel),
            NameForm::CamelCase => camel,
            NameForm::PascalCase => {
                let mut chars = camel.chars();
                match chars.next() {
                    Some(first) => {
                        let mut out = String::new();
                        out.extend(first.to_uppercase());
                        out.push_str(chars.as_str());
                        SmolStr::from(out)
                    }
                    None => SmolStr::default(),
                }
            }
        }
    }
}

/// What role the reference plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceKind {
    /// Opening tag name.
    TagName,
    /// Closing tag name.
    CloseTagName,
    /// Attribute target segment.
    AttrTarget,
    /// Value-converter name in an expression.
    ConverterName,
    /// Binding-behavior name in an expression.
    BehaviorName,
    /// A scope identifier usage.
    ScopeIdentifier,
    /// A scope identifier declaration site.
    ScopeDeclaration,
    /// Local-template declaration value.
    LocalTemplateName,
    /// `as-element` attribute value.
    AsElementValue,
}

/// One textual reference to a symbol.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextReferenceSite {
    /// The role.
    pub reference_kind: ReferenceKind,
    /// How the name is written here.
    pub name_form: NameForm,
    /// The document.
    pub uri: DocumentUri,
    /// The span of the name text.
    pub span: Span,
    /// The referenced symbol.
    pub symbol: SymbolId,
    /// The owning expression, for expression-side sites.
    pub expr: Option<ExprId>,
    /// The owning node, when known.
    pub node: Option<NodeId>,
}

/// Builds the reference index for one compiled template.
pub fn build_reference_index(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    source: &str,
) -> Vec<TextReferenceSite> {
    let uri = compilation.uri.clone();
    let mut sites = Vec::new();

    // Tag names of resolved custom elements, open and close.
    for row in &compilation.linked.rows {
        match &row.node {
            NodeSem::Element {
                tag_span,
                close_tag_span,
                as_element_value_span,
                custom,
                ..
            } => {
                if let Some(res) = custom {
                    push_site(
                        &mut sites,
                        ReferenceKind::TagName,
                        &uri,
                        *tag_span,
                        res.clone(),
                        source,
                        None,
                        Some(row.target),
                    );
                    if let Some(span) = close_tag_span {
                        push_site(
                            &mut sites,
                            ReferenceKind::CloseTagName,
                            &uri,
                            *span,
                            res.clone(),
                            source,
                            None,
                            Some(row.target),
                        );
                    }
                    if let Some(span) = as_element_value_span {
                        push_site(
                            &mut sites,
                            ReferenceKind::AsElementValue,
                            &uri,
                            *span,
                            res.clone(),
                            source,
                            None,
                            Some(row.target),
                        );
                    }
                }
            }
            NodeSem::Template {
                local_name_span: Some(span),
                ..
            } => {
                let name = span.slice(source);
                let id = SymbolId::resource(
                    ResourceKind::CustomElement,
                    name,
                    Some(compilation.uri.as_str()),
                );
                push_site(
                    &mut sites,
                    ReferenceKind::LocalTemplateName,
                    &uri,
                    *span,
                    id,
                    source,
                    None,
                    Some(row.target),
                );
            }
            _ => {}
        }
    }

    // Attribute targets naming controllers, custom attributes, and
    // bindables.
    collect_attr_sites(compilation, resources, attr_parser, source, &uri, &mut sites);

    // Declaration sites come straight from the scope graph: iteration
    // variables, destructured names, and `<let>` values all carry their
    // declaration spans.
    for frame in compilation.linked.scope.frames() {
        for symbol in &frame.symbols {
            if let Some(span) = symbol.span {
                push_site(
                    &mut sites,
                    ReferenceKind::ScopeDeclaration,
                    &uri,
                    span,
                    SymbolId::local(uri.as_str(), frame.id, &symbol.name),
                    source,
                    None,
                    None,
                );
            }
        }
    }

    // Expression-side names.
    for (expr_id, entry) in compilation.linked.exprs.iter() {
        collect_expr_sites(
            &entry.expr,
            expr_id,
            entry.frame,
            compilation,
            resources,
            source,
            &uri,
            &mut sites,
        );
    }

    sites.sort_by_key(|s| (s.span.start, s.span.end));
    sites
}

#[allow(clippy::too_many_arguments)]
fn push_site(
    sites: &mut Vec<TextReferenceSite>,
    reference_kind: ReferenceKind,
    uri: &DocumentUri,
    span: Span,
    symbol: SymbolId,
    source: &str,
    expr: Option<ExprId>,
    node: Option<NodeId>,
) {
    sites.push(TextReferenceSite {
        reference_kind,
        name_form: NameForm::of(span.slice(source)),
        uri: uri.clone(),
        span,
        symbol,
        expr,
        node,
    });
}

fn collect_attr_sites(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    source: &str,
    uri: &DocumentUri,
    sites: &mut Vec<TextReferenceSite>,
) {
    use aurelia_template::Node;

    fn walk(
        nodes: &[Node],
        compilation: &TemplateCompilation,
        resources: &ResourceIndex,
        attr_parser: &mut AttributeParser,
        source: &str,
        uri: &DocumentUri,
        sites: &mut Vec<TextReferenceSite>,
    ) {
        for node in nodes {
            let (attrs, tag, children) = match node {
                Node::Element(el) => (&el.attrs, Some(el.tag.as_str()), &el.children),
                Node::Template(t) => (&t.attrs, None, &t.children),
                _ => continue,
            };
            for attr in attrs {
                let syntax = attr_parser.analyze(&attr.name);
                let Some(target_span) = syntax
                    .target_span
                    .map(|s| s.rebase(attr.name_span.start))
                else {
                    continue;
                };
                if let Some((res, _)) = resources.controller(&syntax.target) {
                    push_site(
                        sites,
                        ReferenceKind::AttrTarget,
                        uri,
                        target_span,
                        res.clone(),
                        source,
                        None,
                        None,
                    );
                } else if let Some((res, _)) = resources.attribute(&syntax.target) {
                    push_site(
                        sites,
                        ReferenceKind::AttrTarget,
                        uri,
                        target_span,
                        res.clone(),
                        source,
                        None,
                        None,
                    );
                } else if let Some(tag) = tag {
                    let bindable = resources
                        .element(tag)
                        .map(|(id, def)| (id.clone(), def.clone()))
                        .or_else(|| {
                            compilation
                                .linked
                                .local_defs
                                .iter()
                                .find(|(_, def)| def.name.value.as_str() == tag)
                                .map(|(id, def)| (id.clone(), def.clone()))
                        })
                        .and_then(|(id, def)| {
                            def.bindable_for_target(&syntax.target)
                                .map(|(property, _)| SymbolId::bindable(&id, property))
                        });
                    if let Some(symbol) = bindable {
                        push_site(
                            sites,
                            ReferenceKind::AttrTarget,
                            uri,
                            target_span,
                            symbol,
                            source,
                            None,
                            None,
                        );
                    }
                }
            }
            walk(children, compilation, resources, attr_parser, source, uri, sites);
        }
    }

    walk(
        &compilation.parsed.dom,
        compilation,
        resources,
        attr_parser,
        source,
        uri,
        sites,
    );
}

#[allow(clippy::too_many_arguments)]
fn collect_expr_sites(
    expr: &Expr,
    expr_id: ExprId,
    frame: FrameId,
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    source: &str,
    uri: &DocumentUri,
    sites: &mut Vec<TextReferenceSite>,
) {
    match expr {
        Expr::AccessScope { name, ancestor, .. }
        | Expr::CallScope { name, ancestor, .. } => {
            if let Some((declared_frame, _)) = compilation
                .linked
                .scope
                .resolve(frame, &name.name, *ancestor)
            {
                push_site(
                    sites,
                    ReferenceKind::ScopeIdentifier,
                    uri,
                    name.span,
                    SymbolId::local(uri.as_str(), declared_frame, &name.name),
                    source,
                    Some(expr_id),
                    None,
                );
            }
        }
        Expr::ValueConverter { name, .. } => {
            if let Some((res, _)) = resources.converter(&name.name) {
                push_site(
                    sites,
                    ReferenceKind::ConverterName,
                    uri,
                    name.span,
                    res.clone(),
                    source,
                    Some(expr_id),
                    None,
                );
            }
        }
        Expr::BindingBehavior { name, .. } => {
            if let Some((res, _)) = resources.behavior(&name.name) {
                push_site(
                    sites,
                    ReferenceKind::BehaviorName,
                    uri,
                    name.span,
                    res.clone(),
                    source,
                    Some(expr_id),
                    None,
                );
            }
        }
        _ => {}
    }
    expr.for_each_child(&mut |child| {
        collect_expr_sites(
            child, expr_id, frame, compilation, resources, source, uri, sites,
        );
    });
}

/// The frame whose symbol was declared at exactly `span`, for declaration
/// sites (`<let>` names, iteration variables).
pub fn frame_declaring(compilation: &TemplateCompilation, span: Span) -> Option<FrameId> {
    for frame in compilation.linked.scope.frames() {
        if frame.symbols.iter().any(|s| s.span == Some(span)) {
            return Some(frame.id);
        }
    }
    None
}
