//! Recursive descent template parser.
//!
//! Tag structure is driven by the token stream; text runs, comments, and
//! quoted attribute values are sliced straight from source offsets so that
//! interpolation, expression syntax, and arbitrary punctuation survive
//! untouched. The parser recovers from mismatched and missing closing tags
//! and always produces a fragment.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{Lexer, Token, TokenKind};
use smol_str::SmolStr;
use source_map::Span;
use text_size::TextSize;

/// HTML void elements; they never take a closing tag.
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is raw text.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

fn is_raw_text_element(name: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}

/// The result of parsing a template fragment.
#[derive(Debug)]
pub struct ParseResult {
    /// Top-level nodes.
    pub fragment: Vec<Node>,
    /// Errors encountered during parsing.
    pub errors: Vec<ParseError>,
}

/// Parses template source into a DOM fragment.
pub fn parse_fragment(source: &str) -> ParseResult {
    Parser::new(source).parse()
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    /// Absolute source offset consumed so far; text runs start here.
    raw_pos: usize,
    errors: Vec<ParseError>,
    eof: Token,
}

impl<'src> Parser<'src> {
    fn new(source: &'src str) -> Self {
        let tokens = Lexer::tokens(source);
        Self {
            source,
            tokens,
            pos: 0,
            raw_pos: 0,
            errors: Vec::new(),
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::empty(TextSize::from(source.len() as u32)),
            },
        }
    }

    fn parse(mut self) -> ParseResult {
        let fragment = self.parse_nodes(None);
        ParseResult {
            fragment,
            errors: self.errors,
        }
    }

    // === Token helpers ===

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn kind(&self) -> TokenKind {
        self.current().kind
    }

    fn text_of(&self, token: &Token) -> &'src str {
        token.span.slice(self.source)
    }

    fn advance(&mut self) {
        self.raw_pos = usize::from(self.current().span.end);
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    /// Moves the token cursor to the first token at or past `offset`.
    fn resync(&mut self, offset: usize) {
        let target = TextSize::from(offset as u32);
        while self.pos < self.tokens.len() && self.current().span.start < target {
            self.pos += 1;
        }
        self.raw_pos = offset;
    }

    // === Node parsing ===

    /// Parses sibling nodes until EOF or a `</` that the caller owns.
    fn parse_nodes(&mut self, closing_for: Option<&str>) -> Vec<Node> {
        let mut nodes = Vec::new();
        loop {
            let rest = &self.source[self.raw_pos..];
            if rest.is_empty() {
                if let Some(tag) = closing_for {
                    self.error(
                        ParseErrorKind::UnclosedTag {
                            tag: tag.to_string(),
                        },
                        Span::empty(self.raw_pos as u32),
                    );
                }
                return nodes;
            }
            match rest.find('<') {
                None => {
                    self.push_text(&mut nodes, self.raw_pos, self.source.len());
                    self.resync(self.source.len());
                    continue;
                }
                Some(lt_rel) => {
                    let lt = self.raw_pos + lt_rel;
                    self.push_text(&mut nodes, self.raw_pos, lt);
                    let at_lt = &self.source[lt..];
                    if at_lt.starts_with("<!--") {
                        nodes.push(self.parse_comment(lt));
                    } else if at_lt.starts_with("<!") {
                        // Markup declarations (doctype) are skipped whole.
                        let end = at_lt
                            .find('>')
                            .map(|g| lt + g + 1)
                            .unwrap_or(self.source.len());
                        self.resync(end);
                    } else if at_lt.starts_with("</") {
                        if closing_for.is_some() {
                            // The caller consumes the closing tag.
                            self.resync(lt);
                            return nodes;
                        }
                        self.consume_stray_closing_tag(lt);
                    } else {
                        self.resync(lt);
                        match self.parse_element() {
                            Some(node) => nodes.push(node),
                            None => {
                                // `<` that opens nothing; keep it as text.
                                self.push_text(&mut nodes, lt, lt + 1);
                                self.resync(lt + 1);
                            }
                        }
                    }
                }
            }
        }
    }

    fn push_text(&mut self, nodes: &mut Vec<Node>, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let text = &self.source[start..end];
        if text.chars().all(char::is_whitespace) {
            return;
        }
        nodes.push(Node::Text(Text {
            span: Span::new(start as u32, end as u32),
            text: SmolStr::from(text),
        }));
    }

    fn parse_comment(&mut self, start: usize) -> Node {
        let rest = &self.source[start + 4..];
        let end = match rest.find("-->") {
            Some(close_rel) => start + 4 + close_rel + 3,
            None => {
                self.error(
                    ParseErrorKind::UnclosedComment,
                    Span::new(start as u32, (start + 4) as u32),
                );
                self.source.len()
            }
        };
        self.resync(end);
        Node::Comment(Comment {
            span: Span::new(start as u32, end as u32),
        })
    }

    /// A `</…>` with no matching open element.
    fn consume_stray_closing_tag(&mut self, lt: usize) {
        self.resync(lt);
        self.advance(); // `</`
        let found = if self.check(TokenKind::Name) {
            let text = self.text_of(self.current()).to_string();
            self.advance();
            text
        } else {
            String::new()
        };
        self.error(
            ParseErrorKind::MismatchedClosingTag {
                expected: String::new(),
                found,
            },
            Span::new(lt as u32, self.raw_pos as u32),
        );
        self.eat(TokenKind::RAngle);
    }

    fn parse_element(&mut self) -> Option<Node> {
        let start = self.current().span.start;
        if !self.eat(TokenKind::LAngle) {
            return None;
        }
        // The tag name must hug the `<`; `a < b` is text.
        if !self.check(TokenKind::Name) || self.current().span.start != start + TextSize::from(1) {
            return None;
        }
        let tag_span = self.current().span;
        let tag = SmolStr::from(self.text_of(self.current()));
        self.advance();

        let attrs = self.parse_attributes();

        let explicit_self_close = self.eat(TokenKind::SlashRAngle);
        if !explicit_self_close && !self.eat(TokenKind::RAngle) {
            self.error(
                ParseErrorKind::UnexpectedToken {
                    expected: "'>'".to_string(),
                    found: self.kind().name().to_string(),
                },
                self.current().span,
            );
        }
        let self_closed = explicit_self_close || is_void_element(&tag);

        let mut children = Vec::new();
        let mut close_tag_span = None;
        if !self_closed {
            if is_raw_text_element(&tag) {
                self.skip_raw_text(&tag);
            } else {
                children = self.parse_nodes(Some(&tag));
            }
            close_tag_span = self.parse_closing_tag(&tag);
        }

        let span = Span::new(start, TextSize::from(self.raw_pos as u32));
        if tag.eq_ignore_ascii_case("template") {
            Some(Node::Template(TemplateElement {
                span,
                tag_span,
                close_tag_span,
                attrs,
                children,
            }))
        } else {
            Some(Node::Element(Element {
                span,
                tag,
                tag_span,
                close_tag_span,
                attrs,
                children,
                self_closed,
            }))
        }
    }

    /// Consumes `</tag>` after children, reporting mismatches but closing
    /// the element either way.
    fn parse_closing_tag(&mut self, tag: &str) -> Option<Span> {
        if !self.check(TokenKind::LAngleSlash) {
            // parse_nodes already reported the unclosed tag at EOF.
            return None;
        }
        self.advance();
        let mut close_span = None;
        if self.check(TokenKind::Name) {
            let found = self.text_of(self.current());
            let span = self.current().span;
            if !found.eq_ignore_ascii_case(tag) {
                self.error(
                    ParseErrorKind::MismatchedClosingTag {
                        expected: tag.to_string(),
                        found: found.to_string(),
                    },
                    span,
                );
            }
            close_span = Some(span);
            self.advance();
        }
        self.eat(TokenKind::RAngle);
        close_span
    }

    /// Skips the raw content of `<script>`/`<style>` up to its closing tag.
    fn skip_raw_text(&mut self, tag: &str) {
        let rest = &self.source[self.raw_pos..];
        let needle = format!("</{}", tag.to_ascii_lowercase());
        let lower = rest.to_ascii_lowercase();
        match lower.find(&needle) {
            Some(close_rel) => self.resync(self.raw_pos + close_rel),
            None => {
                self.error(
                    ParseErrorKind::UnclosedTag {
                        tag: tag.to_string(),
                    },
                    Span::empty(self.raw_pos as u32),
                );
                self.resync(self.source.len());
            }
        }
    }

    // === Attributes ===

    fn parse_attributes(&mut self) -> Vec<Attr> {
        let mut attrs = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => return attrs,
                TokenKind::Name => {
                    let name_span = self.current().span;
                    let name = SmolStr::from(self.text_of(self.current()));
                    self.advance();
                    let (value, value_span) = if self.eat(TokenKind::Eq) {
                        self.parse_attribute_value(&name)
                    } else {
                        (None, None)
                    };
                    let end = value_span
                        .map(|s| {
                            // A quoted value span excludes the closing quote.
                            let quoted = usize::from(s.end) < self.source.len()
                                && matches!(
                                    self.source.as_bytes()[usize::from(s.end)],
                                    b'"' | b'\''
                                );
                            if quoted {
                                s.end + TextSize::from(1)
                            } else {
                                s.end
                            }
                        })
                        .unwrap_or(name_span.end);
                    attrs.push(Attr {
                        span: Span::new(name_span.start, end),
                        name,
                        name_span,
                        value,
                        value_span,
                    });
                }
                _ => {
                    // Skip anything unexpected inside a tag.
                    self.error(
                        ParseErrorKind::UnexpectedToken {
                            expected: "attribute name".to_string(),
                            found: self.kind().name().to_string(),
                        },
                        self.current().span,
                    );
                    self.advance();
                }
            }
        }
    }

    fn parse_attribute_value(&mut self, name: &str) -> (Option<SmolStr>, Option<Span>) {
        match self.kind() {
            TokenKind::DoubleQuote | TokenKind::SingleQuote => {
                let quote = if self.check(TokenKind::DoubleQuote) {
                    '"'
                } else {
                    '\''
                };
                let open_end = usize::from(self.current().span.end);
                self.advance();
                let rest = &self.source[open_end..];
                match rest.find(quote) {
                    Some(close_rel) => {
                        let close = open_end + close_rel;
                        let value = &self.source[open_end..close];
                        self.resync(close + 1);
                        (
                            Some(SmolStr::from(value)),
                            Some(Span::new(open_end as u32, close as u32)),
                        )
                    }
                    None => {
                        self.error(
                            ParseErrorKind::UnclosedAttributeValue {
                                name: name.to_string(),
                            },
                            Span::empty(open_end as u32),
                        );
                        let end = self.source.len();
                        self.resync(end);
                        (
                            Some(SmolStr::from(rest)),
                            Some(Span::new(open_end as u32, end as u32)),
                        )
                    }
                }
            }
            TokenKind::Name => {
                let span = self.current().span;
                let value = SmolStr::from(self.text_of(self.current()));
                self.advance();
                (Some(value), Some(span))
            }
            _ => (None, None),
        }
    }
}
