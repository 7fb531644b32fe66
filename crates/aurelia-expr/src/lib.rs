//! Binding-expression parser for aurelia-check-rs.
//!
//! This crate provides:
//! - Scanner (tokenizer) using `logos`, with decoded literal payloads
//! - A Pratt parser with mode switching (`IsProperty`, `IsIterator`,
//!   `Interpolation`, `IsCustom`)
//! - An AST as one closed enum with byte-accurate spans
//! - In-tree `BadExpression` recovery instead of thrown errors
//! - The tokenless `${…}` interpolation splitter
//!
//! # Example
//!
//! ```
//! use aurelia_expr::{parse, ParseMode, ParseOptions, Expr};
//!
//! let expr = parse("customer.name", ParseMode::IsProperty, &ParseOptions::default());
//! assert!(matches!(expr, Expr::AccessMember { .. }));
//! ```

mod ast;
mod interp;
mod lexer;
mod parser;

pub use ast::{
    ArrowParam, AssignOp, BadExpression, BadOrigin, BinaryOp, Expr, Identifier, ObjectEntry,
    ObjectKey, PrimitiveValue, UnaryOp,
};
pub use interp::{split_interpolation_text, InterpolationSplit};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{default_globals, parse, ParseMode, ParseOptions};
pub use source_map::Span;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_never_fails() {
        for source in ["", "   ", "###", "a +", "foo(", "1 = 2"] {
            let expr = parse(source, ParseMode::IsProperty, &ParseOptions::default());
            // Recovery keeps the result structurally valid.
            let _ = expr.span();
        }
    }

    #[test]
    fn custom_mode_is_verbatim() {
        let expr = parse("anything at all", ParseMode::IsCustom, &ParseOptions::default());
        match expr {
            Expr::Custom { text, span } => {
                assert_eq!(text.as_str(), "anything at all");
                assert_eq!(span, Span::new(0u32, 15u32));
            }
            other => panic!("expected Custom, got {other:?}"),
        }
    }

    #[test]
    fn none_mode_reports_bad() {
        let expr = parse("x", ParseMode::None, &ParseOptions::default());
        assert!(matches!(expr, Expr::Bad(_)));
    }
}
