//! Meta-element extraction.
//!
//! Templates declare their dependencies and surface inline: `<import>`
//! (or `<require>`) pulls resources in, `<bindable>` declares surrogate
//! bindables, `<let>` introduces scope values, and
//! `<template as-custom-element="…">` defines a local element. The
//! extractor pulls these out of the parsed DOM with every span a language
//! feature needs: tag spans, attribute name spans, and value spans.

use crate::ast::{Attr, Node, TemplateElement};
use crate::error::{ParseError, ParseErrorKind};
use smol_str::SmolStr;
use source_map::Span;

/// An attribute value with the spans of both the value and its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrText {
    /// The attribute value.
    pub value: SmolStr,
    /// Span of the value text.
    pub span: Span,
    /// Span of the attribute name.
    pub name_span: Span,
}

impl AttrText {
    fn from_attr(attr: &Attr) -> Option<Self> {
        Some(Self {
            value: attr.value.clone()?,
            span: attr.value_span?,
            name_span: attr.name_span,
        })
    }
}

/// A named alias on an import: `<import from="./x" Foo.as="LocalFoo">`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedAlias {
    /// The exported name being aliased.
    pub name: SmolStr,
    /// Span of the exported name inside the attribute name.
    pub name_span: Span,
    /// The local alias.
    pub alias: SmolStr,
    /// Span of the alias value.
    pub alias_span: Span,
    /// Span of the `as` keyword inside the attribute name.
    pub as_span: Span,
}

/// An `<import from="…">` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportMeta {
    /// Span of the tag name.
    pub tag_span: Span,
    /// The `from` attribute.
    pub from: AttrText,
    /// Default alias: `as="…"`.
    pub default_alias: Option<AttrText>,
    /// Named aliases: `Name.as="…"`.
    pub named_aliases: Vec<NamedAlias>,
}

/// A `<bindable>` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindableMeta {
    /// Span of the whole element.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
    /// The declared property name.
    pub name: AttrText,
    /// Optional binding mode keyword.
    pub mode: Option<AttrText>,
    /// Optional attribute-name override.
    pub attribute: Option<AttrText>,
}

/// One value declared by a `<let>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetDecl {
    /// The raw attribute name (`full-name.bind`, `total`).
    pub raw_name: SmolStr,
    /// Span of the attribute name.
    pub name_span: Span,
}

/// A `<let>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetMeta {
    /// Span of the whole element.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
    /// True when `to-binding-context` is present.
    pub to_binding_context: bool,
    /// The declared values.
    pub declarations: Vec<LetDecl>,
}

/// A `<template as-custom-element="…">` local element definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTemplateMeta {
    /// Span of the whole template element.
    pub span: Span,
    /// Span of the tag name.
    pub tag_span: Span,
    /// The declared element name, with the declaration attribute's spans.
    pub name: AttrText,
    /// Bindables declared inside the local template.
    pub bindables: Vec<BindableMeta>,
}

/// All meta declarations extracted from one template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateMeta {
    /// `<import>`/`<require>` declarations.
    pub imports: Vec<ImportMeta>,
    /// Root-surrogate `<bindable>` declarations.
    pub bindables: Vec<BindableMeta>,
    /// `<let>` elements.
    pub lets: Vec<LetMeta>,
    /// Local `<template as-custom-element>` definitions.
    pub local_templates: Vec<LocalTemplateMeta>,
}

/// Extracts meta declarations from a parsed fragment.
pub fn extract_meta(fragment: &[Node]) -> (TemplateMeta, Vec<ParseError>) {
    let mut meta = TemplateMeta::default();
    let mut errors = Vec::new();
    walk(fragment, &mut meta, &mut errors);
    (meta, errors)
}

fn walk(nodes: &[Node], meta: &mut TemplateMeta, errors: &mut Vec<ParseError>) {
    for node in nodes {
        match node {
            Node::Element(el) => match el.tag.to_ascii_lowercase().as_str() {
                "import" | "require" => {
                    if let Some(import) = extract_import(&el.attrs, el.tag_span, errors) {
                        meta.imports.push(import);
                    }
                }
                "bindable" => {
                    if let Some(bindable) =
                        extract_bindable(el.span, el.tag_span, &el.attrs, errors)
                    {
                        meta.bindables.push(bindable);
                    }
                }
                "let" => meta.lets.push(extract_let(el.span, el.tag_span, &el.attrs)),
                _ => walk(&el.children, meta, errors),
            },
            Node::Template(template) => {
                if let Some(local) = extract_local_template(template, errors) {
                    meta.local_templates.push(local);
                    continue;
                }
                walk(&template.children, meta, errors);
            }
            Node::Text(_) | Node::Comment(_) => {}
        }
    }
}

fn find_attr<'a>(attrs: &'a [Attr], name: &str) -> Option<&'a Attr> {
    attrs.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

fn extract_import(
    attrs: &[Attr],
    tag_span: Span,
    errors: &mut Vec<ParseError>,
) -> Option<ImportMeta> {
    let Some(from) = find_attr(attrs, "from").and_then(AttrText::from_attr) else {
        errors.push(ParseError::new(
            ParseErrorKind::MissingMetaAttribute {
                tag: "import".to_string(),
                attribute: "from".to_string(),
            },
            tag_span,
        ));
        return None;
    };
    let default_alias = find_attr(attrs, "as").and_then(AttrText::from_attr);
    let mut named_aliases = Vec::new();
    for attr in attrs {
        // `Name.as="alias"` — the name span and the `as` keyword span both
        // live inside the attribute name.
        let Some(name) = attr.name.strip_suffix(".as") else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let (Some(alias), Some(alias_span)) = (attr.value.clone(), attr.value_span) else {
            continue;
        };
        let name_start = attr.name_span.start;
        let name_len = name.len() as u32;
        named_aliases.push(NamedAlias {
            name: SmolStr::from(name),
            name_span: Span::new(name_start, name_start + text_size::TextSize::from(name_len)),
            alias,
            alias_span,
            as_span: Span::new(
                attr.name_span.end - text_size::TextSize::from(2),
                attr.name_span.end,
            ),
        });
    }
    Some(ImportMeta {
        tag_span,
        from,
        default_alias,
        named_aliases,
    })
}

fn extract_bindable(
    span: Span,
    tag_span: Span,
    attrs: &[Attr],
    errors: &mut Vec<ParseError>,
) -> Option<BindableMeta> {
    let Some(name) = find_attr(attrs, "name").and_then(AttrText::from_attr) else {
        errors.push(ParseError::new(
            ParseErrorKind::MissingMetaAttribute {
                tag: "bindable".to_string(),
                attribute: "name".to_string(),
            },
            tag_span,
        ));
        return None;
    };
    Some(BindableMeta {
        span,
        tag_span,
        name,
        mode: find_attr(attrs, "mode").and_then(AttrText::from_attr),
        attribute: find_attr(attrs, "attribute").and_then(AttrText::from_attr),
    })
}

fn extract_let(span: Span, tag_span: Span, attrs: &[Attr]) -> LetMeta {
    let to_binding_context = find_attr(attrs, "to-binding-context").is_some();
    let declarations = attrs
        .iter()
        .filter(|a| !a.name.eq_ignore_ascii_case("to-binding-context"))
        .map(|a| LetDecl {
            raw_name: a.name.clone(),
            name_span: a.name_span,
        })
        .collect();
    LetMeta {
        span,
        tag_span,
        to_binding_context,
        declarations,
    }
}

fn extract_local_template(
    template: &TemplateElement,
    errors: &mut Vec<ParseError>,
) -> Option<LocalTemplateMeta> {
    let decl = find_attr(&template.attrs, "as-custom-element")?;
    let Some(name) = AttrText::from_attr(decl) else {
        errors.push(ParseError::new(
            ParseErrorKind::MissingMetaAttribute {
                tag: "template".to_string(),
                attribute: "as-custom-element".to_string(),
            },
            template.tag_span,
        ));
        return None;
    };
    let mut bindables = Vec::new();
    for child in &template.children {
        if let Node::Element(el) = child {
            if el.tag.eq_ignore_ascii_case("bindable") {
                if let Some(bindable) = extract_bindable(el.span, el.tag_span, &el.attrs, errors)
                {
                    bindables.push(bindable);
                }
            }
        }
    }
    Some(LocalTemplateMeta {
        span: template.span,
        tag_span: template.tag_span,
        name,
        bindables,
    })
}
