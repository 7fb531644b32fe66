//! Expression scanner using logos.
//!
//! The scanner produces a flat token stream over binding-expression text.
//! It never fails: malformed input becomes an `Error` token or a string
//! token with its unterminated flag set, and the parser turns those into
//! in-tree `BadExpression` nodes. Template-literal *content* is not
//! tokenized here; the parser re-scans raw source between backticks.

use logos::Logos;
use smol_str::SmolStr;
use source_map::Span;
use text_size::TextSize;

/// A token produced by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token, with decoded payload for literals.
    pub kind: TokenKind,
    /// The span of the token in the source.
    pub span: Span,
}

impl Token {
    /// True for string tokens missing their closing quote.
    pub fn unterminated(&self) -> bool {
        matches!(self.kind, TokenKind::UnterminatedStr(_))
    }
}

fn decode_string(raw: &str) -> SmolStr {
    // `raw` includes the opening quote and, when terminated, the closing one.
    let quote = raw.as_bytes()[0] as char;
    let inner = raw[1..].strip_suffix(quote).unwrap_or(&raw[1..]);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    SmolStr::from(out)
}

fn number(slice: &str) -> Option<f64> {
    slice.parse::<f64>().ok()
}

/// Token kinds for the expression language.
#[derive(Debug, Clone, PartialEq, Logos, Default)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    // === Literals ===
    /// Numeric literal; the payload is the decoded IEEE-754 value.
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| number(lex.slice()))]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| number(lex.slice()))]
    Number(f64),

    /// String literal; the payload is escape-resolved.
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| decode_string(lex.slice()))]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| decode_string(lex.slice()))]
    Str(SmolStr),

    /// String literal missing its closing quote.
    #[regex(r#""([^"\\\n]|\\.)*"#, |lex| decode_string(lex.slice()), priority = 2)]
    #[regex(r"'([^'\\\n]|\\.)*", |lex| decode_string(lex.slice()), priority = 2)]
    UnterminatedStr(SmolStr),

    // === Keywords ===
    /// `new`
    #[token("new")]
    New,
    /// `typeof`
    #[token("typeof")]
    Typeof,
    /// `void`
    #[token("void")]
    Void,
    /// `instanceof`
    #[token("instanceof")]
    Instanceof,
    /// `in`
    #[token("in")]
    In,
    /// `of`
    #[token("of")]
    Of,
    /// `this`
    #[token("this")]
    This,
    /// `$this`
    #[token("$this")]
    DollarThis,
    /// `$parent`
    #[token("$parent")]
    DollarParent,
    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `null`
    #[token("null")]
    Null,
    /// `undefined`
    #[token("undefined")]
    Undefined,

    /// Identifier. Start: ASCII letter, `_`, `$`, or a Unicode letter;
    /// continue adds ASCII digits.
    #[regex(r"[\p{L}_$][\p{L}0-9_$]*", |lex| SmolStr::from(lex.slice()))]
    Ident(SmolStr),

    // === Operators ===
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `**`
    #[token("**")]
    StarStar,
    /// `==`
    #[token("==")]
    EqEq,
    /// `===`
    #[token("===")]
    EqEqEq,
    /// `!=`
    #[token("!=")]
    BangEq,
    /// `!==`
    #[token("!==")]
    BangEqEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,
    /// `&&`
    #[token("&&")]
    AmpAmp,
    /// `||`
    #[token("||")]
    PipePipe,
    /// `??`
    #[token("??")]
    QuestionQuestion,
    /// `=`
    #[token("=")]
    Eq,
    /// `+=`
    #[token("+=")]
    PlusEq,
    /// `-=`
    #[token("-=")]
    MinusEq,
    /// `*=`
    #[token("*=")]
    StarEq,
    /// `/=`
    #[token("/=")]
    SlashEq,
    /// `=>`
    #[token("=>")]
    Arrow,
    /// `++`
    #[token("++")]
    PlusPlus,
    /// `--`
    #[token("--")]
    MinusMinus,
    /// `!`
    #[token("!")]
    Bang,
    /// `&`
    #[token("&")]
    Amp,
    /// `|`
    #[token("|")]
    Pipe,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `:`
    #[token(":")]
    Colon,
    /// `;`
    #[token(";")]
    Semicolon,
    /// `.`
    #[token(".")]
    Dot,
    /// `?`
    #[token("?")]
    Question,
    /// `?.`
    #[token("?.")]
    QuestionDot,
    /// `...`
    #[token("...")]
    Ellipsis,
    /// `` ` ``
    #[token("`")]
    Backtick,

    /// End of input.
    Eof,

    /// Unrecognized byte.
    #[default]
    Error,
}

impl TokenKind {
    /// Human-readable token name used in diagnostic messages.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Number(_) => "Number",
            TokenKind::Str(_) | TokenKind::UnterminatedStr(_) => "String",
            TokenKind::New => "new",
            TokenKind::Typeof => "typeof",
            TokenKind::Void => "void",
            TokenKind::Instanceof => "instanceof",
            TokenKind::In => "in",
            TokenKind::Of => "of",
            TokenKind::This => "this",
            TokenKind::DollarThis => "$this",
            TokenKind::DollarParent => "$parent",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Undefined => "undefined",
            TokenKind::Ident(_) => "Identifier",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::StarStar => "'**'",
            TokenKind::EqEq => "'=='",
            TokenKind::EqEqEq => "'==='",
            TokenKind::BangEq => "'!='",
            TokenKind::BangEqEq => "'!=='",
            TokenKind::Lt => "'<'",
            TokenKind::LtEq => "'<='",
            TokenKind::Gt => "'>'",
            TokenKind::GtEq => "'>='",
            TokenKind::AmpAmp => "'&&'",
            TokenKind::PipePipe => "'||'",
            TokenKind::QuestionQuestion => "'??'",
            TokenKind::Eq => "'='",
            TokenKind::PlusEq => "'+='",
            TokenKind::MinusEq => "'-='",
            TokenKind::StarEq => "'*='",
            TokenKind::SlashEq => "'/='",
            TokenKind::Arrow => "'=>'",
            TokenKind::PlusPlus => "'++'",
            TokenKind::MinusMinus => "'--'",
            TokenKind::Bang => "'!'",
            TokenKind::Amp => "'&'",
            TokenKind::Pipe => "'|'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::Comma => "','",
            TokenKind::Colon => "':'",
            TokenKind::Semicolon => "';'",
            TokenKind::Dot => "'.'",
            TokenKind::Question => "'?'",
            TokenKind::QuestionDot => "'?.'",
            TokenKind::Ellipsis => "Ellipsis",
            TokenKind::Backtick => "'`'",
            TokenKind::Eof => "EOF",
            TokenKind::Error => "invalid token",
        }
    }

    /// Returns the identifier-like text of this token, accepting keywords in
    /// positions where the grammar treats them as plain names (member access).
    pub fn ident_name(&self) -> Option<SmolStr> {
        match self {
            TokenKind::Ident(name) => Some(name.clone()),
            TokenKind::New => Some(SmolStr::new_static("new")),
            TokenKind::Typeof => Some(SmolStr::new_static("typeof")),
            TokenKind::Void => Some(SmolStr::new_static("void")),
            TokenKind::In => Some(SmolStr::new_static("in")),
            TokenKind::Of => Some(SmolStr::new_static("of")),
            TokenKind::True => Some(SmolStr::new_static("true")),
            TokenKind::False => Some(SmolStr::new_static("false")),
            TokenKind::Null => Some(SmolStr::new_static("null")),
            TokenKind::Undefined => Some(SmolStr::new_static("undefined")),
            _ => None,
        }
    }
}

/// A scanner over expression source text.
pub struct Scanner<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    source: &'src str,
    finished: bool,
}

impl<'src> Scanner<'src> {
    /// Creates a scanner for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            source,
            finished: false,
        }
    }

    /// Collects the whole token stream, ending with a single `Eof` token.
    pub fn tokens(source: &'src str) -> Vec<Token> {
        Scanner::new(source).collect()
    }
}

impl<'src> Iterator for Scanner<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(result) => {
                let span = self.inner.span();
                let kind = result.unwrap_or(TokenKind::Error);
                Some(Token {
                    kind,
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
        Scanner::tokens(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| *k != TokenKind::Eof)
            .collect()
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            kinds("foo $this $parent newItem new"),
            vec![
                TokenKind::Ident(SmolStr::from("foo")),
                TokenKind::DollarThis,
                TokenKind::DollarParent,
                TokenKind::Ident(SmolStr::from("newItem")),
                TokenKind::New,
            ]
        );
    }

    #[test]
    fn unicode_identifier_start() {
        assert_eq!(
            kinds("café _x $y"),
            vec![
                TokenKind::Ident(SmolStr::from("café")),
                TokenKind::Ident(SmolStr::from("_x")),
                TokenKind::Ident(SmolStr::from("$y")),
            ]
        );
    }

    #[test]
    fn numbers_decode() {
        assert_eq!(
            kinds("1 2.5 .5 1e3 1.5e-2"),
            vec![
                TokenKind::Number(1.0),
                TokenKind::Number(2.5),
                TokenKind::Number(0.5),
                TokenKind::Number(1000.0),
                TokenKind::Number(0.015),
            ]
        );
    }

    #[test]
    fn number_span_preserves_whole_text() {
        let tokens = Scanner::tokens("  1.5e3");
        assert_eq!(tokens[0].span, Span::new(2u32, 7u32));
    }

    #[test]
    fn strings_decode_escapes() {
        assert_eq!(
            kinds(r#"'a\'b' "c\nd""#),
            vec![
                TokenKind::Str(SmolStr::from("a'b")),
                TokenKind::Str(SmolStr::from("c\nd")),
            ]
        );
    }

    #[test]
    fn string_span_includes_quotes() {
        let tokens = Scanner::tokens("'abc'");
        assert_eq!(tokens[0].span, Span::new(0u32, 5u32));
    }

    #[test]
    fn unterminated_string_flag() {
        let tokens = Scanner::tokens("'abc");
        assert!(tokens[0].unterminated());
        assert_eq!(tokens[0].kind, TokenKind::UnterminatedStr(SmolStr::from("abc")));
    }

    #[test]
    fn compound_operators_win_over_prefixes() {
        assert_eq!(
            kinds("=== == = => >= ** ?? ?. ... ++"),
            vec![
                TokenKind::EqEqEq,
                TokenKind::EqEq,
                TokenKind::Eq,
                TokenKind::Arrow,
                TokenKind::GtEq,
                TokenKind::StarStar,
                TokenKind::QuestionQuestion,
                TokenKind::QuestionDot,
                TokenKind::Ellipsis,
                TokenKind::PlusPlus,
            ]
        );
    }

    #[test]
    fn pipe_and_amp_tails() {
        assert_eq!(
            kinds("a | b & c"),
            vec![
                TokenKind::Ident(SmolStr::from("a")),
                TokenKind::Pipe,
                TokenKind::Ident(SmolStr::from("b")),
                TokenKind::Amp,
                TokenKind::Ident(SmolStr::from("c")),
            ]
        );
    }

    #[test]
    fn eof_terminates_stream() {
        let tokens = Scanner::tokens("a");
        assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(tokens.last().unwrap().span, Span::empty(1u32));
    }

    #[test]
    fn leading_dot_number_beats_dot() {
        assert_eq!(kinds(".5"), vec![TokenKind::Number(0.5)]);
        assert_eq!(
            kinds("a.b"),
            vec![
                TokenKind::Ident(SmolStr::from("a")),
                TokenKind::Dot,
                TokenKind::Ident(SmolStr::from("b")),
            ]
        );
    }
}
