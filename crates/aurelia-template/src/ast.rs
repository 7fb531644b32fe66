//! DOM types for parsed templates.
//!
//! The parser keeps every span a later stage needs: tag name spans, closing
//! tag spans, attribute name/value spans, and whether an element closed
//! itself. Nothing here interprets attribute names; that is the
//! attribute-pattern analyzer's job.

use smol_str::SmolStr;
use source_map::Span;

/// A node in the parsed template.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An element, including custom elements and meta elements.
    Element(Element),
    /// A `<template>` element.
    Template(TemplateElement),
    /// A text run, interpolation not yet split.
    Text(Text),
    /// An HTML comment.
    Comment(Comment),
}

impl Node {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            Node::Element(n) => n.span,
            Node::Template(n) => n.span,
            Node::Text(n) => n.span,
            Node::Comment(n) => n.span,
        }
    }

    /// The node's children, if it can have any.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(n) => &n.children,
            Node::Template(n) => &n.children,
            Node::Text(_) | Node::Comment(_) => &[],
        }
    }
}

/// An element.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Full span including the closing tag.
    pub span: Span,
    /// Tag name as written.
    pub tag: SmolStr,
    /// Span of the tag name in the opening tag.
    pub tag_span: Span,
    /// Span of the tag name in the closing tag, when one exists.
    pub close_tag_span: Option<Span>,
    /// Attributes in source order.
    pub attrs: Vec<Attr>,
    /// Child nodes.
    pub children: Vec<Node>,
    /// True for `<br/>` style closes and HTML void elements.
    pub self_closed: bool,
}

/// A `<template>` element, kept distinct because local-template
/// declarations and surrogate attributes hang off it.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateElement {
    /// Full span including the closing tag.
    pub span: Span,
    /// Span of the tag name in the opening tag.
    pub tag_span: Span,
    /// Span of the tag name in the closing tag, when one exists.
    pub close_tag_span: Option<Span>,
    /// Attributes in source order.
    pub attrs: Vec<Attr>,
    /// Child nodes.
    pub children: Vec<Node>,
}

/// A text node.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    /// Span of the text run.
    pub span: Span,
    /// The raw text.
    pub text: SmolStr,
}

/// An HTML comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    /// Span including the delimiters.
    pub span: Span,
}

/// An attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    /// Span of the whole attribute, value included.
    pub span: Span,
    /// Attribute name as written.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// Decoded value, when present.
    pub value: Option<SmolStr>,
    /// Span of the value text, excluding quotes.
    pub value_span: Option<Span>,
}

impl Attr {
    /// The attribute value, or the empty string for bare attributes.
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}
