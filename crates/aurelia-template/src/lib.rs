//! Template parsing for aurelia-check-rs.
//!
//! This crate provides:
//! - Template lexer (tokenizer) using `logos`
//! - A span-preserving HTML fragment parser with error recovery
//! - The attribute-pattern registry and memoizing name analyzer
//! - Meta-element extraction (`<import>`, `<bindable>`, `<let>`, local
//!   `<template as-custom-element>`)
//!
//! # Example
//!
//! ```
//! use aurelia_template::parse_template;
//!
//! let parsed = parse_template(r#"<div title.bind="item.name"></div>"#);
//! assert!(parsed.errors.is_empty());
//! assert_eq!(parsed.dom.len(), 1);
//! ```

mod ast;
mod error;
mod lexer;
mod meta;
mod parser;
mod patterns;

pub use ast::{Attr, Comment, Element, Node, TemplateElement, Text};
pub use error::{ParseError, ParseErrorKind, RegistryFrozen};
pub use lexer::{Lexer, Token, TokenKind};
pub use meta::{
    extract_meta, AttrText, BindableMeta, ImportMeta, LetDecl, LetMeta, LocalTemplateMeta,
    NamedAlias, TemplateMeta,
};
pub use parser::{parse_fragment, ParseResult};
pub use patterns::{
    handlers, AttrSyntax, AttributeParser, PartMatch, PatternHandler, PatternRegistry,
};
pub use source_map::Span;

/// A parsed template: DOM fragment plus extracted meta declarations.
#[derive(Debug)]
pub struct ParsedTemplate {
    /// Top-level DOM nodes.
    pub dom: Vec<Node>,
    /// Meta declarations.
    pub meta: TemplateMeta,
    /// Parse and extraction errors, in source order.
    pub errors: Vec<ParseError>,
}

/// Parses template text into a DOM and its meta declarations.
pub fn parse_template(source: &str) -> ParsedTemplate {
    let ParseResult {
        fragment,
        mut errors,
    } = parse_fragment(source);
    let (meta, meta_errors) = extract_meta(&fragment);
    errors.extend(meta_errors);
    ParsedTemplate {
        dom: fragment,
        meta,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_template_combines_dom_and_meta() {
        let parsed = parse_template(
            r#"<import from="./x"></import><div repeat.for="item of items">${item}</div>"#,
        );
        assert!(parsed.errors.is_empty());
        assert_eq!(parsed.meta.imports.len(), 1);
        assert_eq!(parsed.dom.len(), 2);
    }

    #[test]
    fn empty_template() {
        let parsed = parse_template("");
        assert!(parsed.errors.is_empty());
        assert!(parsed.dom.is_empty());
    }
}
