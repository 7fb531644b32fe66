//! Template lexer using logos.
//!
//! Only tag structure is tokenized. Text nodes, comments, and attribute
//! values are recovered straight from source offsets by the parser, so the
//! lexer stays oblivious to interpolation and expression syntax.

use logos::Logos;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

/// Token kinds for template syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Logos, Default)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    /// `<!--`
    #[token("<!--", priority = 12)]
    CommentOpen,

    /// `-->`
    #[token("-->", priority = 12)]
    CommentClose,

    /// `</`
    #[token("</", priority = 11)]
    LAngleSlash,

    /// `<`
    #[token("<", priority = 10)]
    LAngle,

    /// `/>`
    #[token("/>", priority = 11)]
    SlashRAngle,

    /// `>`
    #[token(">", priority = 10)]
    RAngle,

    /// `=`
    #[token("=", priority = 10)]
    Eq,

    /// `"`
    #[token("\"", priority = 10)]
    DoubleQuote,

    /// `'`
    #[token("'", priority = 10)]
    SingleQuote,

    /// A tag or attribute name. Aurelia attribute names carry command and
    /// pattern syntax (`value.bind`, `:class`, `@click:once`, `repeat.for`),
    /// so the class is anything that cannot terminate the name.
    #[regex(r#"[^ \t\r\n<>=/"']+"#, priority = 4)]
    Name,

    /// `/` alone (not part of `/>` or `</`).
    #[token("/", priority = 10)]
    Slash,

    /// End of file.
    Eof,

    /// Anything else.
    #[default]
    Error,
}

impl TokenKind {
    /// Human-readable token name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::CommentOpen => "'<!--'",
            TokenKind::CommentClose => "'-->'",
            TokenKind::LAngleSlash => "'</'",
            TokenKind::LAngle => "'<'",
            TokenKind::SlashRAngle => "'/>'",
            TokenKind::RAngle => "'>'",
            TokenKind::Eq => "'='",
            TokenKind::DoubleQuote => "'\"'",
            TokenKind::SingleQuote => "'''",
            TokenKind::Name => "name",
            TokenKind::Slash => "'/'",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A lexer for template source.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Collects the whole token stream, ending with a single `Eof` token.
    pub fn tokens(source: &'src str) -> Vec<Token> {
        Lexer::new(source).collect()
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(result) => {
                let span = self.inner.span();
                Some(Token {
                    kind: result.unwrap_or(TokenKind::Error),
                    span: Span::new(
                        TextSize::from(span.start as u32),
                        TextSize::from(span.end as u32),
                    ),
                })
            }
            None => {
                self.finished = true;
                let end = TextSize::from(self.source.len() as u32);
                Some(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(end, end),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokens(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn simple_tag() {
        assert_eq!(
            kinds("<div>"),
            vec![TokenKind::LAngle, TokenKind::Name, TokenKind::RAngle]
        );
    }

    #[test]
    fn self_closing() {
        assert_eq!(
            kinds("<br/>"),
            vec![TokenKind::LAngle, TokenKind::Name, TokenKind::SlashRAngle]
        );
    }

    #[test]
    fn closing_tag() {
        assert_eq!(
            kinds("</div>"),
            vec![TokenKind::LAngleSlash, TokenKind::Name, TokenKind::RAngle]
        );
    }

    #[test]
    fn aurelia_attribute_names_are_single_tokens() {
        assert_eq!(
            kinds("value.bind :class @click:once repeat.for"),
            vec![
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Name,
                TokenKind::Name
            ]
        );
    }

    #[test]
    fn attribute_with_quoted_value() {
        assert_eq!(
            kinds("class=\"foo\""),
            vec![
                TokenKind::Name,
                TokenKind::Eq,
                TokenKind::DoubleQuote,
                TokenKind::Name,
                TokenKind::DoubleQuote
            ]
        );
    }

    #[test]
    fn comment_delimiters() {
        assert_eq!(
            kinds("<!-- hi -->"),
            vec![TokenKind::CommentOpen, TokenKind::Name, TokenKind::CommentClose]
        );
    }
}
