//! Pratt parser for the binding-expression language.
//!
//! Every parse-local failure is recovered by emitting a `BadExpression` at
//! the recovery point; the parser never panics and never returns an error
//! type. Tail parsing runs a strict forward-only state machine: primary →
//! member/call tails → value converters → binding behaviors → end. Any
//! token left over after the end state turns the whole parse into a
//! `BadExpression`.

use crate::ast::*;
use crate::interp::{scan_balanced, split_interpolation_text};
use crate::lexer::{Scanner, Token, TokenKind};
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use source_map::{ByteOffset, Span};
use text_size::TextSize;

/// Parse modes. `IsProperty` and `IsFunction` behave identically over the
/// core grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Ordinary binding expression.
    #[default]
    IsProperty,
    /// Listener expression; identical to `IsProperty` over the core grammar.
    IsFunction,
    /// Iterator head; accepts `ForOfStatement`.
    IsIterator,
    /// HTML text with `${…}` holes.
    Interpolation,
    /// Opaque pass-through; returns a `Custom` node verbatim.
    IsCustom,
    /// Invalid mode; returns a `BadExpression`.
    None,
}

/// Options for a parse call.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// When present, every produced span is shifted by `base.start` once,
    /// at the top of the parse.
    pub base: Option<Span>,
    /// Names resolved as globals at parse time.
    pub globals: FxHashSet<SmolStr>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            base: None,
            globals: default_globals(),
        }
    }
}

impl ParseOptions {
    /// Options identical to `self` but rebased at `base`.
    pub fn rebased(&self, base: Span) -> Self {
        Self {
            base: Some(base),
            globals: self.globals.clone(),
        }
    }
}

/// The default global-name set resolved at parse time.
pub fn default_globals() -> FxHashSet<SmolStr> {
    [
        "Math", "JSON", "parseInt", "parseFloat", "isNaN", "isFinite", "Array", "Object",
        "Number", "String", "Boolean", "Date", "RegExp", "Infinity", "NaN", "undefined",
    ]
    .into_iter()
    .map(SmolStr::new_static)
    .collect()
}

/// Parses `source` in the given mode.
///
/// Recoverable failures come back as in-tree [`Expr::Bad`] nodes; this
/// function has no error return.
pub fn parse(source: &str, mode: ParseMode, options: &ParseOptions) -> Expr {
    let mut expr = match mode {
        ParseMode::None => Expr::Bad(BadExpression {
            span: whole(source),
            text: SmolStr::from(source),
            message: SmolStr::new_static("Invalid parse mode 'None'"),
            origin: parse_origin(&["mode"]),
        }),
        ParseMode::IsCustom => Expr::Custom {
            span: whole(source),
            text: SmolStr::from(source),
        },
        ParseMode::Interpolation => parse_interpolation(source, options),
        ParseMode::IsIterator => Parser::new(source, options).parse_for_of(),
        ParseMode::IsProperty | ParseMode::IsFunction => {
            Parser::new(source, options).parse_root()
        }
    };
    if let Some(base) = options.base {
        expr.rebase(base.start);
    }
    expr
}

/// Parses HTML text in `Interpolation` mode. Text without interpolation
/// (including text whose `${` never closes) becomes a single-part
/// `Interpolation` with no expressions.
fn parse_interpolation(source: &str, options: &ParseOptions) -> Expr {
    let span = whole(source);
    match split_interpolation_text(source) {
        None => Expr::Interpolation {
            span,
            parts: vec![SmolStr::from(source)],
            expressions: Vec::new(),
        },
        Some(split) => {
            let expressions = split
                .expr_spans
                .iter()
                .map(|&expr_span| {
                    let slice = expr_span.slice(source);
                    parse(slice, ParseMode::IsProperty, &options.rebased(expr_span))
                })
                .collect();
            Expr::Interpolation {
                span,
                parts: split.parts,
                expressions,
            }
        }
    }
}

fn whole(source: &str) -> Span {
    Span::new(0u32, source.len() as u32)
}

fn parse_origin(trace: &[&str]) -> Option<BadOrigin> {
    Some(BadOrigin {
        by: SmolStr::new_static("parse"),
        trace: trace.iter().map(|s| SmolStr::from(*s)).collect(),
    })
}

const BP_COALESCE: u8 = 10;
const BP_OR: u8 = 20;
const BP_AND: u8 = 30;
const BP_EQUALITY: u8 = 40;
const BP_RELATIONAL: u8 = 50;
const BP_ADDITIVE: u8 = 60;
const BP_MULTIPLICATIVE: u8 = 70;
const BP_EXPONENT: u8 = 80;

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8, bool)> {
    // (operator, binding power, right-associative)
    Some(match kind {
        TokenKind::QuestionQuestion => (BinaryOp::Coalesce, BP_COALESCE, false),
        TokenKind::PipePipe => (BinaryOp::Or, BP_OR, false),
        TokenKind::AmpAmp => (BinaryOp::And, BP_AND, false),
        TokenKind::EqEq => (BinaryOp::Eq, BP_EQUALITY, false),
        TokenKind::EqEqEq => (BinaryOp::StrictEq, BP_EQUALITY, false),
        TokenKind::BangEq => (BinaryOp::Ne, BP_EQUALITY, false),
        TokenKind::BangEqEq => (BinaryOp::StrictNe, BP_EQUALITY, false),
        TokenKind::Lt => (BinaryOp::Lt, BP_RELATIONAL, false),
        TokenKind::LtEq => (BinaryOp::Le, BP_RELATIONAL, false),
        TokenKind::Gt => (BinaryOp::Gt, BP_RELATIONAL, false),
        TokenKind::GtEq => (BinaryOp::Ge, BP_RELATIONAL, false),
        TokenKind::Instanceof => (BinaryOp::Instanceof, BP_RELATIONAL, false),
        TokenKind::In => (BinaryOp::In, BP_RELATIONAL, false),
        TokenKind::Plus => (BinaryOp::Add, BP_ADDITIVE, false),
        TokenKind::Minus => (BinaryOp::Sub, BP_ADDITIVE, false),
        TokenKind::Star => (BinaryOp::Mul, BP_MULTIPLICATIVE, false),
        TokenKind::Slash => (BinaryOp::Div, BP_MULTIPLICATIVE, false),
        TokenKind::Percent => (BinaryOp::Rem, BP_MULTIPLICATIVE, false),
        TokenKind::StarStar => (BinaryOp::Exp, BP_EXPONENT, true),
        _ => return None,
    })
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Assign,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        _ => return None,
    })
}

struct Parser<'src, 'opt> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    prev_end: ByteOffset,
    options: &'opt ParseOptions,
    eof: Token,
}

impl<'src, 'opt> Parser<'src, 'opt> {
    fn new(source: &'src str, options: &'opt ParseOptions) -> Self {
        let tokens = Scanner::tokens(source);
        let end = TextSize::from(source.len() as u32);
        Self {
            source,
            tokens,
            pos: 0,
            prev_end: TextSize::from(0),
            options,
            eof: Token {
                kind: TokenKind::Eof,
                span: Span::empty(end),
            },
        }
    }

    // === Token helpers ===

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_kind(&self, ahead: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map(|t| &t.kind)
            .unwrap_or(&self.eof.kind)
    }

    fn at(&self) -> ByteOffset {
        self.current().span.start
    }

    fn advance(&mut self) {
        self.prev_end = self.current().span.end;
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn span_from(&self, start: ByteOffset) -> Span {
        Span::new(start, self.prev_end)
    }

    /// Builds a recovery node covering the whole input.
    fn bad(&self, message: impl Into<SmolStr>, trace: &[&str]) -> Expr {
        Expr::Bad(BadExpression {
            span: whole(self.source),
            text: SmolStr::from(self.source),
            message: message.into(),
            origin: parse_origin(trace),
        })
    }

    /// Consumes an identifier-like token, returning it as an [`Identifier`].
    fn eat_identifier(&mut self) -> Option<Identifier> {
        let name = self.kind().ident_name()?;
        let span = self.current().span;
        self.advance();
        Some(Identifier::new(name, span))
    }

    // === Entry points ===

    /// Primary → tails → converters → behaviors → end.
    fn parse_root(&mut self) -> Expr {
        let expr = self.parse_assign();
        if matches!(expr, Expr::Bad(_)) {
            return expr;
        }
        let expr = self.parse_converter_and_behavior_tails(expr);
        if matches!(expr, Expr::Bad(_)) {
            return expr;
        }
        self.expect_end(expr)
    }

    /// `decl of iterable` for `IsIterator` mode.
    fn parse_for_of(&mut self) -> Expr {
        let start = self.at();
        let declaration = match self.parse_binding_target() {
            Ok(decl) => decl,
            Err(bad) => return bad,
        };
        if !self.eat(&TokenKind::Of) {
            return self.bad("Expected 'of' in for-of expression", &["iterator"]);
        }
        let iterable = self.parse_assign();
        let iterable = self.parse_converter_and_behavior_tails(iterable);
        if matches!(iterable, Expr::Bad(_)) {
            return iterable;
        }
        let stmt = Expr::ForOfStatement {
            span: self.span_from(start),
            declaration: Box::new(declaration),
            iterable: Box::new(iterable),
        };
        self.expect_end(stmt)
    }

    fn expect_end(&mut self, expr: Expr) -> Expr {
        if self.check(&TokenKind::Eof) {
            expr
        } else {
            self.bad("Unexpected token after end of expression", &["end"])
        }
    }

    // === Converter and behavior tails ===

    fn parse_converter_and_behavior_tails(&mut self, mut expr: Expr) -> Expr {
        while self.eat(&TokenKind::Pipe) {
            let name = match self.eat_identifier() {
                Some(name) => name,
                None => return self.bad("Expected identifier after '|'", &["converter"]),
            };
            let args = match self.parse_tail_args() {
                Ok(args) => args,
                Err(bad) => return bad,
            };
            let span = expr.span().cover(self.span_from(name.span.start));
            expr = Expr::ValueConverter {
                span,
                expression: Box::new(expr),
                name,
                args,
            };
        }
        while self.eat(&TokenKind::Amp) {
            let name = match self.eat_identifier() {
                Some(name) => name,
                None => return self.bad("Expected identifier after '&'", &["behavior"]),
            };
            let args = match self.parse_tail_args() {
                Ok(args) => args,
                Err(bad) => return bad,
            };
            let span = expr.span().cover(self.span_from(name.span.start));
            expr = Expr::BindingBehavior {
                span,
                expression: Box::new(expr),
                name,
                args,
            };
        }
        expr
    }

    /// Colon-separated converter/behavior arguments.
    fn parse_tail_args(&mut self) -> Result<Vec<Expr>, Expr> {
        let mut args = Vec::new();
        while self.eat(&TokenKind::Colon) {
            let arg = self.parse_assign();
            if matches!(arg, Expr::Bad(_)) {
                return Err(arg);
            }
            args.push(arg);
        }
        Ok(args)
    }

    // === Assignment / conditional / binary ===

    fn parse_assign(&mut self) -> Expr {
        let target = self.parse_conditional();
        if matches!(target, Expr::Bad(_)) {
            return target;
        }
        let Some(op) = assign_op(self.kind()) else {
            return target;
        };
        if !target.is_assignable() {
            return self.bad("Left-hand side is not assignable", &["assign"]);
        }
        self.advance();
        let value = self.parse_assign();
        let span = target.span().cover(value.span());
        Expr::Assign {
            span,
            target: Box::new(target),
            value: Box::new(value),
            op,
        }
    }

    fn parse_conditional(&mut self) -> Expr {
        let cond = self.parse_binary(0);
        if matches!(cond, Expr::Bad(_)) || !self.eat(&TokenKind::Question) {
            return cond;
        }
        let yes = self.parse_assign();
        if !self.eat(&TokenKind::Colon) {
            return self.bad("Expected ':' in conditional expression", &["conditional"]);
        }
        let no = self.parse_assign();
        let span = cond.span().cover(no.span());
        Expr::Conditional {
            span,
            cond: Box::new(cond),
            yes: Box::new(yes),
            no: Box::new(no),
        }
    }

    fn parse_binary(&mut self, min_bp: u8) -> Expr {
        let mut left = self.parse_unary();
        loop {
            if matches!(left, Expr::Bad(_)) {
                return left;
            }
            let Some((op, bp, right_assoc)) = binary_op(self.kind()) else {
                return left;
            };
            if bp < min_bp {
                return left;
            }
            self.advance();
            let next_min = if right_assoc { bp } else { bp + 1 };
            let right = self.parse_binary(next_min);
            if matches!(right, Expr::Bad(_)) {
                return right;
            }
            let span = left.span().cover(right.span());
            left = Expr::Binary {
                span,
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Expr {
        let start = self.at();
        let op = match self.kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Typeof => Some(UnaryOp::Typeof),
            TokenKind::Void => Some(UnaryOp::Void),
            TokenKind::PlusPlus => Some(UnaryOp::PreInc),
            TokenKind::MinusMinus => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary();
            if matches!(expr, Expr::Bad(_)) {
                return expr;
            }
            let span = self.span_from(start);
            return Expr::Unary {
                span,
                op,
                expr: Box::new(expr),
            };
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Expr {
        let start = self.at();
        let mut expr = self.parse_member_and_call_tails();
        loop {
            let op = match self.kind() {
                TokenKind::PlusPlus => UnaryOp::PostInc,
                TokenKind::MinusMinus => UnaryOp::PostDec,
                _ => return expr,
            };
            if matches!(expr, Expr::Bad(_)) {
                return expr;
            }
            self.advance();
            expr = Expr::Unary {
                span: self.span_from(start),
                op,
                expr: Box::new(expr),
            };
        }
    }

    // === Member / keyed / call / template tails ===

    fn parse_member_and_call_tails(&mut self) -> Expr {
        let start = self.at();
        let mut expr = self.parse_primary();
        loop {
            if matches!(expr, Expr::Bad(_)) {
                return expr;
            }
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let Some(name) = self.eat_identifier() else {
                        return self.bad("Expected identifier after '.'", &["tail"]);
                    };
                    expr = self.finish_member(expr, name, start, false);
                }
                TokenKind::QuestionDot => {
                    self.advance();
                    match self.kind() {
                        TokenKind::LParen => {
                            expr = match self.finish_call(expr, start, true) {
                                Ok(expr) => expr,
                                Err(bad) => return bad,
                            };
                        }
                        TokenKind::LBracket => {
                            self.advance();
                            let key = self.parse_assign();
                            if !self.eat(&TokenKind::RBracket) {
                                return self.bad("Expected ']' in indexed access", &["tail"]);
                            }
                            expr = Expr::AccessKeyed {
                                span: self.span_from(start),
                                object: Box::new(expr),
                                key: Box::new(key),
                                optional: true,
                            };
                        }
                        _ => {
                            let Some(name) = self.eat_identifier() else {
                                return self.bad("Expected identifier after '?.'", &["tail"]);
                            };
                            expr = self.finish_member(expr, name, start, true);
                        }
                    }
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_assign();
                    if !self.eat(&TokenKind::RBracket) {
                        return self.bad("Expected ']' in indexed access", &["tail"]);
                    }
                    expr = Expr::AccessKeyed {
                        span: self.span_from(start),
                        object: Box::new(expr),
                        key: Box::new(key),
                        optional: false,
                    };
                }
                TokenKind::LParen => {
                    expr = match self.finish_call(expr, start, false) {
                        Ok(expr) => expr,
                        Err(bad) => return bad,
                    };
                }
                TokenKind::Backtick => {
                    let (cooked, expressions, template_span) = match self.read_template(start) {
                        Ok(parts) => parts,
                        Err(bad) => return bad,
                    };
                    expr = Expr::TaggedTemplate {
                        span: expr.span().cover(template_span),
                        tag: Box::new(expr),
                        cooked,
                        expressions,
                    };
                }
                _ => return expr,
            }
        }
    }

    /// Builds the member access for `expr.name`, immediately folding a call
    /// when `(` follows.
    fn finish_member(&mut self, expr: Expr, name: Identifier, start: ByteOffset, optional: bool) -> Expr {
        if self.check(&TokenKind::LParen) {
            let args = match self.parse_args() {
                Ok(args) => args,
                Err(bad) => return bad,
            };
            return Expr::CallMember {
                span: self.span_from(start),
                object: Box::new(expr),
                name,
                args,
                optional_member: optional,
                optional_call: false,
            };
        }
        Expr::AccessMember {
            span: self.span_from(start),
            object: Box::new(expr),
            name,
            optional,
        }
    }

    /// Folds `expr(args…)` into the call variant matching the callee shape.
    fn finish_call(&mut self, expr: Expr, start: ByteOffset, optional_call: bool) -> Result<Expr, Expr> {
        let args = self.parse_args()?;
        let span = self.span_from(start);
        Ok(match expr {
            Expr::AccessScope { name, ancestor, .. } => Expr::CallScope {
                span,
                name,
                args,
                ancestor,
                optional_call,
            },
            Expr::AccessGlobal { name, .. } if !optional_call => {
                Expr::CallGlobal { span, name, args }
            }
            Expr::AccessMember {
                object,
                name,
                optional,
                ..
            } => Expr::CallMember {
                span,
                object,
                name,
                args,
                optional_member: optional,
                optional_call,
            },
            func => Expr::CallFunction {
                span,
                func: Box::new(func),
                args,
                optional_call,
            },
        })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, Expr> {
        // Current token is `(`.
        self.advance();
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            let arg = self.parse_assign();
            if matches!(arg, Expr::Bad(_)) {
                return Err(arg);
            }
            args.push(arg);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RParen) {
                return Ok(args);
            }
            return Err(self.bad("Expected ',' or ')' in argument list", &["tail"]));
        }
    }

    // === Primary forms ===

    fn parse_primary(&mut self) -> Expr {
        let start = self.at();
        let span = self.current().span;
        match self.kind().clone() {
            TokenKind::Number(value) => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Number(value),
                }
            }
            TokenKind::Str(value) => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Str(value),
                }
            }
            TokenKind::UnterminatedStr(_) => {
                self.advance();
                self.bad("Unterminated string literal", &["primary"])
            }
            TokenKind::True => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Bool(true),
                }
            }
            TokenKind::False => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Bool(false),
                }
            }
            TokenKind::Null => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Null,
                }
            }
            TokenKind::Undefined => {
                self.advance();
                Expr::PrimitiveLiteral {
                    span,
                    value: PrimitiveValue::Undefined,
                }
            }
            TokenKind::This => {
                self.advance();
                Expr::AccessBoundary { span }
            }
            TokenKind::DollarThis => self.parse_dollar_this(),
            TokenKind::DollarParent => self.parse_dollar_parent(),
            TokenKind::Ident(name) => {
                if matches!(self.peek_kind(1), TokenKind::Arrow) {
                    return self.parse_single_param_arrow();
                }
                self.advance();
                let ident = Identifier::new(name.clone(), span);
                if self.options.globals.contains(&name) {
                    Expr::AccessGlobal { span, name: ident }
                } else {
                    Expr::AccessScope {
                        span,
                        name: ident,
                        ancestor: 0,
                    }
                }
            }
            TokenKind::LParen => {
                if self.arrow_follows_paren() {
                    return self.parse_paren_arrow();
                }
                self.advance();
                let inner = self.parse_assign();
                if matches!(inner, Expr::Bad(_)) {
                    return inner;
                }
                if !self.eat(&TokenKind::RParen) {
                    return self.bad(
                        "Expected ')' to close parenthesized expression",
                        &["primary"],
                    );
                }
                Expr::Paren {
                    span: self.span_from(start),
                    inner: Box::new(inner),
                }
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            TokenKind::Backtick => {
                let (cooked, expressions, span) = match self.read_template(start) {
                    Ok(parts) => parts,
                    Err(bad) => return bad,
                };
                Expr::Template {
                    span,
                    cooked,
                    expressions,
                }
            }
            TokenKind::New => self.parse_new(),
            TokenKind::Ellipsis => {
                self.bad("Unexpected token Ellipsis in primary expression", &["primary"])
            }
            TokenKind::Eof => self.bad("Unexpected token EOF in primary expression", &["primary"]),
            other => self.bad(
                format!("Unexpected token {} in primary expression", other.name()),
                &["primary"],
            ),
        }
    }

    /// `$this`, `$this.name…`
    fn parse_dollar_this(&mut self) -> Expr {
        let span = self.current().span;
        self.advance();
        if !self.check(&TokenKind::Dot) {
            return Expr::AccessThis { span, ancestor: 0 };
        }
        self.advance();
        let Some(name) = self.eat_identifier() else {
            return self.bad("Expected identifier after '$this.'", &["primary"]);
        };
        // The access-scope span starts at the name so that the source text at
        // the span begins with the accessed name.
        Expr::AccessScope {
            span: name.span,
            name,
            ancestor: 0,
        }
    }

    /// `$parent`, `$parent.$parent…`, `$parent.name…`
    fn parse_dollar_parent(&mut self) -> Expr {
        let start = self.at();
        self.advance();
        let mut ancestor: u8 = 1;
        while self.check(&TokenKind::Dot) && matches!(self.peek_kind(1), TokenKind::DollarParent) {
            self.advance();
            self.advance();
            ancestor = ancestor.saturating_add(1);
        }
        if !self.check(&TokenKind::Dot) {
            return Expr::AccessThis {
                span: self.span_from(start),
                ancestor,
            };
        }
        self.advance();
        let Some(name) = self.eat_identifier() else {
            return self.bad("Expected identifier after '$parent.'", &["primary"]);
        };
        Expr::AccessScope {
            span: self.span_from(start),
            name,
            ancestor,
        }
    }

    /// `x => body`
    fn parse_single_param_arrow(&mut self) -> Expr {
        let start = self.at();
        let name = self
            .eat_identifier()
            .expect("caller checked the identifier");
        self.advance(); // `=>`
        let body = self.parse_assign();
        Expr::ArrowFunction {
            span: self.span_from(start),
            params: vec![ArrowParam { name, rest: false }],
            body: Box::new(body),
        }
    }

    /// True when the `(` at the current position opens an arrow parameter
    /// list, decided by finding the matching `)` and peeking for `=>`.
    fn arrow_follows_paren(&self) -> bool {
        let mut depth = 0usize;
        let mut idx = self.pos;
        while let Some(token) = self.tokens.get(idx) {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(idx + 1).map(|t| &t.kind),
                            Some(TokenKind::Arrow)
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            idx += 1;
        }
        false
    }

    const ARROW_PARAM_MESSAGE: &'static str =
        "Arrow functions currently support only a single identifier parameter in the LSP parser";

    /// `(a, b, ...rest) => body`
    fn parse_paren_arrow(&mut self) -> Expr {
        let start = self.at();
        self.advance(); // `(`
        let mut params: Vec<ArrowParam> = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                let rest = self.eat(&TokenKind::Ellipsis);
                let Some(name) = self.eat_identifier() else {
                    return self.bad(Self::ARROW_PARAM_MESSAGE, &["primary"]);
                };
                params.push(ArrowParam { name, rest });
                if rest && !self.check(&TokenKind::RParen) {
                    // A rest parameter must be last.
                    return self.bad(Self::ARROW_PARAM_MESSAGE, &["primary"]);
                }
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                if self.eat(&TokenKind::RParen) {
                    break;
                }
                return self.bad(Self::ARROW_PARAM_MESSAGE, &["primary"]);
            }
        }
        self.advance(); // `=>`, guaranteed by the lookahead
        let body = self.parse_assign();
        Expr::ArrowFunction {
            span: self.span_from(start),
            params,
            body: Box::new(body),
        }
    }

    fn parse_array_literal(&mut self) -> Expr {
        let start = self.at();
        self.advance(); // `[`
        let mut elements = Vec::new();
        loop {
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            if self.check(&TokenKind::Comma) {
                // An elision produces an undefined literal at the hole.
                elements.push(Expr::PrimitiveLiteral {
                    span: Span::empty(self.at()),
                    value: PrimitiveValue::Undefined,
                });
                self.advance();
                continue;
            }
            let element = self.parse_assign();
            if matches!(element, Expr::Bad(_)) {
                return element;
            }
            elements.push(element);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            return self.bad("Expected ',' or ']' in array literal", &["primary"]);
        }
        Expr::ArrayLiteral {
            span: self.span_from(start),
            elements,
        }
    }

    fn parse_object_literal(&mut self) -> Expr {
        let start = self.at();
        self.advance(); // `{`
        let mut entries = Vec::new();
        loop {
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let key_span = self.current().span;
            let key = match self.kind().clone() {
                TokenKind::Str(value) => {
                    self.advance();
                    ObjectKey::Str {
                        value,
                        span: key_span,
                    }
                }
                TokenKind::Number(value) => {
                    self.advance();
                    ObjectKey::Number {
                        value,
                        span: key_span,
                    }
                }
                kind => match kind.ident_name() {
                    Some(name) => {
                        self.advance();
                        ObjectKey::Ident(Identifier::new(name, key_span))
                    }
                    None => {
                        return self.bad(
                            "Invalid object literal key; expected identifier, string, or number",
                            &["primary"],
                        )
                    }
                },
            };
            let value = if self.eat(&TokenKind::Colon) {
                let value = self.parse_assign();
                if matches!(value, Expr::Bad(_)) {
                    return value;
                }
                value
            } else if matches!(key, ObjectKey::Ident(_))
                && (self.check(&TokenKind::Comma) || self.check(&TokenKind::RBrace))
            {
                // Shorthand property: the value is the scope access implied
                // by the key.
                let ObjectKey::Ident(ref ident) = key else {
                    unreachable!()
                };
                Expr::AccessScope {
                    span: ident.span,
                    name: ident.clone(),
                    ancestor: 0,
                }
            } else {
                return self.bad("Expected ':' after object literal key", &["primary"]);
            };
            entries.push(ObjectEntry { key, value });
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            return self.bad("Expected ',' or '}' in object literal", &["primary"]);
        }
        Expr::ObjectLiteral {
            span: self.span_from(start),
            entries,
        }
    }

    /// `new Foo`, `new Foo(args)`, `new foo.bar(args)`.
    fn parse_new(&mut self) -> Expr {
        let start = self.at();
        self.advance(); // `new`
        let callee_start = self.at();
        let mut callee = self.parse_primary();
        // Member and keyed tails only; a call ends the callee.
        loop {
            if matches!(callee, Expr::Bad(_)) {
                return callee;
            }
            match self.kind() {
                TokenKind::Dot => {
                    self.advance();
                    let Some(name) = self.eat_identifier() else {
                        return self.bad("Expected identifier after '.'", &["tail"]);
                    };
                    callee = Expr::AccessMember {
                        span: self.span_from(callee_start),
                        object: Box::new(callee),
                        name,
                        optional: false,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_assign();
                    if !self.eat(&TokenKind::RBracket) {
                        return self.bad("Expected ']' in indexed access", &["tail"]);
                    }
                    callee = Expr::AccessKeyed {
                        span: self.span_from(callee_start),
                        object: Box::new(callee),
                        key: Box::new(key),
                        optional: false,
                    };
                }
                _ => break,
            }
        }
        if self.check(&TokenKind::LParen) {
            let args = match self.parse_args() {
                Ok(args) => args,
                Err(bad) => return bad,
            };
            let span = self.span_from(start);
            // Construction of a member keeps the call embedded in the callee.
            if let Expr::AccessMember {
                object,
                name,
                optional,
                span: member_span,
            } = callee
            {
                let func = Expr::CallMember {
                    span: member_span.cover(span),
                    object,
                    name,
                    args,
                    optional_member: optional,
                    optional_call: false,
                };
                return Expr::New {
                    span,
                    func: Box::new(func),
                    args: Vec::new(),
                };
            }
            return Expr::New {
                span,
                func: Box::new(callee),
                args,
            };
        }
        Expr::New {
            span: self.span_from(start),
            func: Box::new(callee),
            args: Vec::new(),
        }
    }

    // === Template literals ===

    /// Reads a template literal starting at the current `` ` `` token by
    /// scanning raw source, then resynchronizes the token cursor past it.
    #[allow(clippy::type_complexity)]
    fn read_template(
        &mut self,
        _tail_start: ByteOffset,
    ) -> Result<(Vec<SmolStr>, Vec<Expr>, Span), Expr> {
        let open = usize::from(self.current().span.start);
        let bytes = self.source.as_bytes();
        let mut cooked: Vec<SmolStr> = Vec::new();
        let mut expressions: Vec<Expr> = Vec::new();
        let mut current = String::new();
        let mut i = open + 1;
        loop {
            if i >= bytes.len() {
                // Unterminated template literal.
                self.pos = self.tokens.len();
                return Err(self.bad("Unexpected token EOF in primary expression", &["primary"]));
            }
            match bytes[i] {
                b'\\' => {
                    match bytes.get(i + 1) {
                        Some(b'n') => current.push('\n'),
                        Some(b't') => current.push('\t'),
                        Some(b'r') => current.push('\r'),
                        Some(&other) => current.push(other as char),
                        None => current.push('\\'),
                    }
                    i += 2;
                }
                b'`' => {
                    cooked.push(SmolStr::from(std::mem::take(&mut current)));
                    let end = i + 1;
                    self.resync(end);
                    let span = Span::new(open as u32, end as u32);
                    return Ok((cooked, expressions, span));
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    let Some(close) = scan_balanced(self.source, i + 2) else {
                        self.pos = self.tokens.len();
                        return Err(
                            self.bad("Unexpected token EOF in primary expression", &["primary"])
                        );
                    };
                    cooked.push(SmolStr::from(std::mem::take(&mut current)));
                    let inner_span = Span::new((i + 2) as u32, close as u32);
                    let slice = inner_span.slice(self.source);
                    expressions.push(parse(
                        slice,
                        ParseMode::IsProperty,
                        &self.options.rebased(inner_span),
                    ));
                    i = close + 1;
                }
                _ => {
                    // Multi-byte characters are copied wholesale.
                    let ch_len = self.source[i..]
                        .chars()
                        .next()
                        .map(|c| c.len_utf8())
                        .unwrap_or(1);
                    current.push_str(&self.source[i..i + ch_len]);
                    i += ch_len;
                }
            }
        }
    }

    /// Moves the token cursor to the first token at or past `offset`.
    fn resync(&mut self, offset: usize) {
        let target = TextSize::from(offset as u32);
        while self.pos < self.tokens.len() && self.current().span.start < target {
            self.advance();
        }
        self.prev_end = target;
    }

    // === Iterator declarations ===

    fn parse_binding_target(&mut self) -> Result<Expr, Expr> {
        let start = self.at();
        match self.kind().clone() {
            TokenKind::Ident(name) => {
                let span = self.current().span;
                self.advance();
                Ok(Expr::BindingIdentifier { span, name })
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                loop {
                    if self.eat(&TokenKind::RBracket) {
                        break;
                    }
                    if self.check(&TokenKind::Comma) {
                        elements.push(Expr::PrimitiveLiteral {
                            span: Span::empty(self.at()),
                            value: PrimitiveValue::Undefined,
                        });
                        self.advance();
                        continue;
                    }
                    let element = self.parse_pattern_element()?;
                    elements.push(element);
                    if self.eat(&TokenKind::Comma) {
                        continue;
                    }
                    if self.eat(&TokenKind::RBracket) {
                        break;
                    }
                    return Err(self.bad("Expected ',' or ']' in binding pattern", &["iterator"]));
                }
                Ok(Expr::ArrayBindingPattern {
                    span: self.span_from(start),
                    elements,
                })
            }
            TokenKind::LBrace => {
                self.advance();
                let mut entries = Vec::new();
                loop {
                    if self.eat(&TokenKind::RBrace) {
                        break;
                    }
                    let key_span = self.current().span;
                    let Some(key_name) = self.kind().ident_name() else {
                        return Err(self.bad(
                            "Invalid object literal key; expected identifier, string, or number",
                            &["iterator"],
                        ));
                    };
                    self.advance();
                    let key = ObjectKey::Ident(Identifier::new(key_name.clone(), key_span));
                    let value = if self.eat(&TokenKind::Colon) {
                        self.parse_pattern_element()?
                    } else {
                        let target = Expr::BindingIdentifier {
                            span: key_span,
                            name: key_name,
                        };
                        if self.check(&TokenKind::Eq) {
                            self.parse_pattern_default(target, key_span.start)?
                        } else {
                            target
                        }
                    };
                    entries.push(ObjectEntry { key, value });
                    if self.eat(&TokenKind::Comma) {
                        continue;
                    }
                    if self.eat(&TokenKind::RBrace) {
                        break;
                    }
                    return Err(self.bad("Expected ',' or '}' in object literal", &["iterator"]));
                }
                Ok(Expr::ObjectBindingPattern {
                    span: self.span_from(start),
                    entries,
                })
            }
            other => Err(self.bad(
                format!(
                    "Unexpected token {} in for-of declaration",
                    other.name()
                ),
                &["iterator"],
            )),
        }
    }

    fn parse_pattern_element(&mut self) -> Result<Expr, Expr> {
        let start = self.at();
        let target = self.parse_binding_target()?;
        if self.check(&TokenKind::Eq) {
            return self.parse_pattern_default(target, start);
        }
        Ok(target)
    }

    fn parse_pattern_default(&mut self, target: Expr, start: ByteOffset) -> Result<Expr, Expr> {
        self.advance(); // `=`
        let default = self.parse_conditional();
        if matches!(default, Expr::Bad(_)) {
            return Err(default);
        }
        Ok(Expr::BindingPatternDefault {
            span: self.span_from(start),
            target: Box::new(target),
            default: Box::new(default),
        })
    }
}
