//! The literal recovery-message contract.
//!
//! Each malformed input must produce a `BadExpression` carrying the exact
//! user-facing message, never a panic or an error return.

use aurelia_expr::{parse, Expr, ParseMode, ParseOptions};
use pretty_assertions::assert_eq;

fn bad_message(source: &str) -> String {
    bad_message_in(source, ParseMode::IsProperty)
}

fn bad_message_in(source: &str, mode: ParseMode) -> String {
    let expr = parse(source, mode, &ParseOptions::default());
    match find_bad(&expr) {
        Some(bad) => bad.message.to_string(),
        None => panic!("expected a BadExpression for {source:?}, got {expr:?}"),
    }
}

fn find_bad(expr: &Expr) -> Option<&aurelia_expr::BadExpression> {
    if let Expr::Bad(bad) = expr {
        return Some(bad);
    }
    let mut found = None;
    expr.for_each_child(&mut |child| {
        if found.is_none() {
            found = find_bad(child);
        }
    });
    found
}

#[test]
fn converter_requires_identifier() {
    assert_eq!(bad_message("value | 123"), "Expected identifier after '|'");
    assert_eq!(bad_message("value |"), "Expected identifier after '|'");
}

#[test]
fn behavior_requires_identifier() {
    assert_eq!(bad_message("value & 123"), "Expected identifier after '&'");
    assert_eq!(bad_message("value &"), "Expected identifier after '&'");
}

#[test]
fn optional_chain_requires_identifier() {
    assert_eq!(bad_message("foo?.123"), "Expected identifier after '?.'");
    assert_eq!(bad_message("foo?.`t`"), "Expected identifier after '?.'");
}

#[test]
fn member_access_requires_identifier() {
    assert_eq!(bad_message("foo."), "Expected identifier after '.'");
}

#[test]
fn scope_hop_requires_identifier() {
    assert_eq!(bad_message("$this."), "Expected identifier after '$this.'");
    assert_eq!(bad_message("$parent."), "Expected identifier after '$parent.'");
}

#[test]
fn keyed_access_requires_closing_bracket() {
    assert_eq!(bad_message("items[0"), "Expected ']' in indexed access");
}

#[test]
fn argument_list_separator() {
    assert_eq!(bad_message("foo(a b)"), "Expected ',' or ')' in argument list");
}

#[test]
fn unclosed_paren() {
    assert_eq!(
        bad_message("(a + b"),
        "Expected ')' to close parenthesized expression"
    );
}

#[test]
fn non_assignable_left_hand_side() {
    assert_eq!(bad_message("1 = foo"), "Left-hand side is not assignable");
    assert_eq!(bad_message("a + b = c"), "Left-hand side is not assignable");
}

#[test]
fn eof_in_primary() {
    assert_eq!(bad_message(""), "Unexpected token EOF in primary expression");
    assert_eq!(bad_message("a +"), "Unexpected token EOF in primary expression");
}

#[test]
fn converter_arg_hitting_eof() {
    assert_eq!(
        bad_message("value | vc:"),
        "Unexpected token EOF in primary expression"
    );
}

#[test]
fn ellipsis_in_primary() {
    assert_eq!(
        bad_message("..."),
        "Unexpected token Ellipsis in primary expression"
    );
}

#[test]
fn trailing_token_after_end() {
    assert_eq!(
        bad_message("foo bar"),
        "Unexpected token after end of expression"
    );
}

#[test]
fn behavior_cannot_precede_converter() {
    // Once in the behavior state the tail machine only moves forward, so a
    // converter after a behavior is a trailing token.
    assert_eq!(
        bad_message("x & b | c"),
        "Unexpected token after end of expression"
    );
}

#[test]
fn arrow_parameters_must_be_identifiers() {
    let expected = "Arrow functions currently support only a single identifier parameter in the LSP parser";
    assert_eq!(bad_message("([a, b]) => a"), expected);
    assert_eq!(bad_message("({a}) => a"), expected);
    assert_eq!(bad_message("(...rest, a) => a"), expected);
}

#[test]
fn object_literal_messages() {
    assert_eq!(
        bad_message("{a 1}"),
        "Expected ':' after object literal key"
    );
    assert_eq!(
        bad_message("{a: 1 b: 2}"),
        "Expected ',' or '}' in object literal"
    );
    assert_eq!(
        bad_message("{[x]: 1}"),
        "Invalid object literal key; expected identifier, string, or number"
    );
}

#[test]
fn bad_origin_is_parse() {
    let expr = parse("value |", ParseMode::IsProperty, &ParseOptions::default());
    let bad = find_bad(&expr).unwrap();
    let origin = bad.origin.as_ref().unwrap();
    assert_eq!(origin.by.as_str(), "parse");
    assert!(!origin.trace.is_empty());
}

#[test]
fn bad_carries_source_text() {
    let expr = parse("value |", ParseMode::IsProperty, &ParseOptions::default());
    let bad = find_bad(&expr).unwrap();
    assert_eq!(bad.text.as_str(), "value |");
}

#[test]
fn unterminated_string_recovers() {
    assert_eq!(bad_message("'abc"), "Unterminated string literal");
}

#[test]
fn iterator_mode_requires_of() {
    assert_eq!(
        bad_message_in("item in items", ParseMode::IsIterator),
        "Expected 'of' in for-of expression"
    );
}
