//! End-to-end parses asserting concrete AST shapes.

use aurelia_expr::{
    parse, BinaryOp, Expr, ParseMode, ParseOptions, PrimitiveValue, Span, UnaryOp,
};
use pretty_assertions::assert_eq;

fn prop(source: &str) -> Expr {
    parse(source, ParseMode::IsProperty, &ParseOptions::default())
}

#[test]
fn bare_identifier_is_scope_access() {
    match prop("foo") {
        Expr::AccessScope {
            name,
            ancestor,
            span,
        } => {
            assert_eq!(name.name.as_str(), "foo");
            assert_eq!(ancestor, 0);
            assert_eq!(span, Span::new(0u32, 3u32));
        }
        other => panic!("expected AccessScope, got {other:?}"),
    }
}

#[test]
fn parent_hops_contract_into_one_access() {
    match prop("$parent.$parent.baz") {
        Expr::AccessScope {
            name,
            ancestor,
            span,
        } => {
            assert_eq!(name.name.as_str(), "baz");
            assert_eq!(ancestor, 2);
            assert_eq!(span, Span::new(0u32, 19u32));
            assert_eq!(name.span, Span::new(16u32, 19u32));
        }
        other => panic!("expected AccessScope, got {other:?}"),
    }
}

#[test]
fn bare_this_forms() {
    assert!(matches!(prop("this"), Expr::AccessBoundary { .. }));
    assert!(matches!(prop("$this"), Expr::AccessThis { ancestor: 0, .. }));
    assert!(matches!(prop("$parent"), Expr::AccessThis { ancestor: 1, .. }));
    assert!(matches!(
        prop("$parent.$parent"),
        Expr::AccessThis { ancestor: 2, .. }
    ));
}

#[test]
fn this_dot_member_is_scope_access() {
    match prop("$this.foo") {
        Expr::AccessScope { name, ancestor, .. } => {
            assert_eq!(name.name.as_str(), "foo");
            assert_eq!(ancestor, 0);
        }
        other => panic!("expected AccessScope, got {other:?}"),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    match prop("1 + 2 * 3") {
        Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::PrimitiveLiteral {
                    value: PrimitiveValue::Number(n),
                    ..
                } if n == 1.0
            ));
            match *right {
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ref left,
                    ref right,
                    ..
                } => {
                    assert!(matches!(
                        **left,
                        Expr::PrimitiveLiteral {
                            value: PrimitiveValue::Number(n),
                            ..
                        } if n == 2.0
                    ));
                    assert!(matches!(
                        **right,
                        Expr::PrimitiveLiteral {
                            value: PrimitiveValue::Number(n),
                            ..
                        } if n == 3.0
                    ));
                }
                ref other => panic!("expected Binary, got {other:?}"),
            }
        }
        other => panic!("expected Binary, got {other:?}"),
    }
}

#[test]
fn exponentiation_is_right_associative() {
    match prop("2 ** 3 ** 2") {
        Expr::Binary {
            op: BinaryOp::Exp,
            left,
            right,
            ..
        } => {
            assert!(matches!(
                *left,
                Expr::PrimitiveLiteral {
                    value: PrimitiveValue::Number(n),
                    ..
                } if n == 2.0
            ));
            assert!(matches!(*right, Expr::Binary { op: BinaryOp::Exp, .. }));
        }
        other => panic!("expected Binary, got {other:?}"),
    }
}

#[test]
fn assignment_is_right_associative() {
    match prop("a = b = c") {
        Expr::Assign { target, value, .. } => {
            assert!(matches!(*target, Expr::AccessScope { .. }));
            assert!(matches!(*value, Expr::Assign { .. }));
        }
        other => panic!("expected Assign, got {other:?}"),
    }
}

#[test]
fn converter_then_behavior_tails() {
    match prop("amount | currency:'USD' & throttle:100") {
        Expr::BindingBehavior {
            name,
            args,
            expression,
            span,
        } => {
            assert_eq!(name.name.as_str(), "throttle");
            assert_eq!(args.len(), 1);
            assert!(matches!(
                args[0],
                Expr::PrimitiveLiteral {
                    value: PrimitiveValue::Number(n),
                    ..
                } if n == 100.0
            ));
            // The behavior span covers the entire input.
            assert_eq!(span, Span::new(0u32, 38u32));
            match *expression {
                Expr::ValueConverter {
                    ref name,
                    ref args,
                    ref expression,
                    span,
                } => {
                    assert_eq!(name.name.as_str(), "currency");
                    assert_eq!(args.len(), 1);
                    assert!(matches!(
                        args[0],
                        Expr::PrimitiveLiteral {
                            value: PrimitiveValue::Str(ref s),
                            ..
                        } if s == "USD"
                    ));
                    // The converter span covers `amount | currency:'USD'`.
                    assert_eq!(span, Span::new(0u32, 23u32));
                    assert!(matches!(**expression, Expr::AccessScope { .. }));
                }
                ref other => panic!("expected ValueConverter, got {other:?}"),
            }
        }
        other => panic!("expected BindingBehavior, got {other:?}"),
    }
}

#[test]
fn behaviors_chain_to_the_right() {
    match prop("x & a & b") {
        Expr::BindingBehavior {
            name, expression, ..
        } => {
            assert_eq!(name.name.as_str(), "b");
            assert!(matches!(
                *expression,
                Expr::BindingBehavior { ref name, .. } if name.name.as_str() == "a"
            ));
        }
        other => panic!("expected BindingBehavior, got {other:?}"),
    }
}

#[test]
fn interpolation_parse() {
    let expr = parse(
        "Hello ${name}",
        ParseMode::Interpolation,
        &ParseOptions::default(),
    );
    match expr {
        Expr::Interpolation {
            parts, expressions, ..
        } => {
            assert_eq!(parts.len(), 2);
            assert_eq!(parts[0].as_str(), "Hello ");
            assert_eq!(parts[1].as_str(), "");
            assert_eq!(expressions.len(), 1);
            match &expressions[0] {
                Expr::AccessScope { name, span, .. } => {
                    assert_eq!(name.name.as_str(), "name");
                    assert_eq!(*span, Span::new(8u32, 12u32));
                }
                other => panic!("expected AccessScope, got {other:?}"),
            }
        }
        other => panic!("expected Interpolation, got {other:?}"),
    }
}

#[test]
fn escaped_interpolation_is_plain_text() {
    let expr = parse(r"\${x}", ParseMode::Interpolation, &ParseOptions::default());
    match expr {
        Expr::Interpolation {
            parts, expressions, ..
        } => {
            assert_eq!(parts.len(), 1);
            assert_eq!(parts[0].as_str(), r"\${x}");
            assert!(expressions.is_empty());
        }
        other => panic!("expected Interpolation, got {other:?}"),
    }
}

#[test]
fn bad_hole_does_not_fail_the_outer_interpolation() {
    let expr = parse(
        "a ${1 +} b",
        ParseMode::Interpolation,
        &ParseOptions::default(),
    );
    match expr {
        Expr::Interpolation {
            parts, expressions, ..
        } => {
            assert_eq!(parts.len(), 2);
            assert_eq!(expressions.len(), 1);
            assert!(matches!(expressions[0], Expr::Bad(_)));
        }
        other => panic!("expected Interpolation, got {other:?}"),
    }
}

#[test]
fn optional_chain_structure() {
    match prop("foo?.bar()?.baz") {
        Expr::AccessMember {
            object,
            name,
            optional,
            ..
        } => {
            assert_eq!(name.name.as_str(), "baz");
            assert!(optional);
            match *object {
                Expr::CallMember {
                    ref object,
                    ref name,
                    optional_member,
                    optional_call,
                    ..
                } => {
                    assert_eq!(name.name.as_str(), "bar");
                    assert!(optional_member);
                    assert!(!optional_call);
                    assert!(matches!(**object, Expr::AccessScope { .. }));
                }
                ref other => panic!("expected CallMember, got {other:?}"),
            }
        }
        other => panic!("expected AccessMember, got {other:?}"),
    }
}

#[test]
fn optional_call_flag() {
    match prop("foo?.()") {
        Expr::CallScope {
            name,
            optional_call,
            ..
        } => {
            assert_eq!(name.name.as_str(), "foo");
            assert!(optional_call);
        }
        other => panic!("expected CallScope, got {other:?}"),
    }
}

#[test]
fn globals_resolve_at_parse_time() {
    assert!(matches!(prop("Math"), Expr::AccessGlobal { .. }));
    match prop("parseInt(x)") {
        Expr::CallGlobal { name, args, .. } => {
            assert_eq!(name.name.as_str(), "parseInt");
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected CallGlobal, got {other:?}"),
    }
    match prop("Math.max(a, b)") {
        Expr::CallMember { object, name, .. } => {
            assert!(matches!(*object, Expr::AccessGlobal { .. }));
            assert_eq!(name.name.as_str(), "max");
        }
        other => panic!("expected CallMember, got {other:?}"),
    }
    // Unknown names stay scope accesses.
    assert!(matches!(prop("mathish"), Expr::AccessScope { .. }));
}

#[test]
fn scope_calls() {
    match prop("doIt(1, 2)") {
        Expr::CallScope {
            name,
            args,
            ancestor,
            ..
        } => {
            assert_eq!(name.name.as_str(), "doIt");
            assert_eq!(args.len(), 2);
            assert_eq!(ancestor, 0);
        }
        other => panic!("expected CallScope, got {other:?}"),
    }
    match prop("$parent.doIt()") {
        Expr::CallScope { ancestor, .. } => assert_eq!(ancestor, 1),
        other => panic!("expected CallScope, got {other:?}"),
    }
}

#[test]
fn parenthesized_expression_keeps_paren_node() {
    match prop("(a + b)") {
        Expr::Paren { inner, span } => {
            assert_eq!(span, Span::new(0u32, 7u32));
            assert!(matches!(*inner, Expr::Binary { .. }));
        }
        other => panic!("expected Paren, got {other:?}"),
    }
}

#[test]
fn array_literal_with_holes_and_trailing_comma() {
    match prop("[1,,2,]") {
        Expr::ArrayLiteral { elements, .. } => {
            assert_eq!(elements.len(), 3);
            assert!(matches!(
                elements[1],
                Expr::PrimitiveLiteral {
                    value: PrimitiveValue::Undefined,
                    ..
                }
            ));
        }
        other => panic!("expected ArrayLiteral, got {other:?}"),
    }
}

#[test]
fn object_literal_keys_and_shorthand() {
    match prop("{a: 1, 'b': 2, 3: c, d}") {
        Expr::ObjectLiteral { entries, .. } => {
            assert_eq!(entries.len(), 4);
            assert_eq!(entries[0].key.name().as_str(), "a");
            assert_eq!(entries[1].key.name().as_str(), "b");
            assert_eq!(entries[2].key.name().as_str(), "3");
            // Shorthand implies a scope access.
            assert!(matches!(entries[3].value, Expr::AccessScope { .. }));
        }
        other => panic!("expected ObjectLiteral, got {other:?}"),
    }
}

#[test]
fn template_literal_cooked_invariant() {
    match prop("`a${x}b${y}c`") {
        Expr::Template {
            cooked,
            expressions,
            ..
        } => {
            assert_eq!(cooked.len(), expressions.len() + 1);
            assert_eq!(cooked[0].as_str(), "a");
            assert_eq!(cooked[1].as_str(), "b");
            assert_eq!(cooked[2].as_str(), "c");
        }
        other => panic!("expected Template, got {other:?}"),
    }
}

#[test]
fn tagged_template() {
    match prop("tag`a${x}b`") {
        Expr::TaggedTemplate { tag, cooked, .. } => {
            assert!(matches!(*tag, Expr::AccessScope { .. }));
            assert_eq!(cooked.len(), 2);
        }
        other => panic!("expected TaggedTemplate, got {other:?}"),
    }
}

#[test]
fn new_expressions() {
    match prop("new Foo") {
        Expr::New { func, args, .. } => {
            assert!(matches!(*func, Expr::AccessScope { .. }));
            assert!(args.is_empty());
        }
        other => panic!("expected New, got {other:?}"),
    }
    match prop("new Foo(1)") {
        Expr::New { func, args, .. } => {
            assert!(matches!(*func, Expr::AccessScope { .. }));
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected New, got {other:?}"),
    }
    match prop("new foo.bar(1)") {
        Expr::New { func, args, .. } => {
            assert!(args.is_empty());
            assert!(matches!(*func, Expr::CallMember { .. }));
        }
        other => panic!("expected New, got {other:?}"),
    }
}

#[test]
fn arrow_functions() {
    match prop("x => x.y") {
        Expr::ArrowFunction { params, body, .. } => {
            assert_eq!(params.len(), 1);
            assert_eq!(params[0].name.name.as_str(), "x");
            assert!(!params[0].rest);
            assert!(matches!(*body, Expr::AccessMember { .. }));
        }
        other => panic!("expected ArrowFunction, got {other:?}"),
    }
    match prop("(a, b) => a") {
        Expr::ArrowFunction { params, .. } => assert_eq!(params.len(), 2),
        other => panic!("expected ArrowFunction, got {other:?}"),
    }
    match prop("(a, ...rest) => a") {
        Expr::ArrowFunction { params, .. } => {
            assert!(params[1].rest);
        }
        other => panic!("expected ArrowFunction, got {other:?}"),
    }
    match prop("() => 1") {
        Expr::ArrowFunction { params, .. } => assert!(params.is_empty()),
        other => panic!("expected ArrowFunction, got {other:?}"),
    }
}

#[test]
fn unary_and_postfix() {
    assert!(matches!(
        prop("!done"),
        Expr::Unary {
            op: UnaryOp::Not,
            ..
        }
    ));
    assert!(matches!(
        prop("typeof x"),
        Expr::Unary {
            op: UnaryOp::Typeof,
            ..
        }
    ));
    assert!(matches!(
        prop("++i"),
        Expr::Unary {
            op: UnaryOp::PreInc,
            ..
        }
    ));
    assert!(matches!(
        prop("i++"),
        Expr::Unary {
            op: UnaryOp::PostInc,
            ..
        }
    ));
}

#[test]
fn conditional_expression() {
    match prop("a ? b : c") {
        Expr::Conditional { cond, yes, no, .. } => {
            assert!(matches!(*cond, Expr::AccessScope { .. }));
            assert!(matches!(*yes, Expr::AccessScope { .. }));
            assert!(matches!(*no, Expr::AccessScope { .. }));
        }
        other => panic!("expected Conditional, got {other:?}"),
    }
}

#[test]
fn iterator_mode_for_of() {
    let expr = parse(
        "item of items",
        ParseMode::IsIterator,
        &ParseOptions::default(),
    );
    match expr {
        Expr::ForOfStatement {
            declaration,
            iterable,
            ..
        } => {
            assert!(matches!(
                *declaration,
                Expr::BindingIdentifier { ref name, .. } if name == "item"
            ));
            assert!(matches!(*iterable, Expr::AccessScope { .. }));
        }
        other => panic!("expected ForOfStatement, got {other:?}"),
    }
}

#[test]
fn iterator_mode_destructuring() {
    let expr = parse(
        "[key, value] of entries",
        ParseMode::IsIterator,
        &ParseOptions::default(),
    );
    match expr {
        Expr::ForOfStatement { declaration, .. } => match *declaration {
            Expr::ArrayBindingPattern { ref elements, .. } => {
                assert_eq!(elements.len(), 2);
                assert!(matches!(elements[0], Expr::BindingIdentifier { .. }));
            }
            ref other => panic!("expected ArrayBindingPattern, got {other:?}"),
        },
        other => panic!("expected ForOfStatement, got {other:?}"),
    }
}

#[test]
fn iterator_mode_converter_on_iterable() {
    let expr = parse(
        "item of items | take:3",
        ParseMode::IsIterator,
        &ParseOptions::default(),
    );
    match expr {
        Expr::ForOfStatement { iterable, .. } => {
            assert!(matches!(*iterable, Expr::ValueConverter { .. }));
        }
        other => panic!("expected ForOfStatement, got {other:?}"),
    }
}

#[test]
fn keyed_access() {
    match prop("items[0]") {
        Expr::AccessKeyed { object, key, .. } => {
            assert!(matches!(*object, Expr::AccessScope { .. }));
            assert!(matches!(
                *key,
                Expr::PrimitiveLiteral {
                    value: PrimitiveValue::Number(n),
                    ..
                } if n == 0.0
            ));
        }
        other => panic!("expected AccessKeyed, got {other:?}"),
    }
}

#[test]
fn compound_assignment() {
    use aurelia_expr::AssignOp;
    match prop("count += 1") {
        Expr::Assign { op, .. } => assert_eq!(op, AssignOp::Add),
        other => panic!("expected Assign, got {other:?}"),
    }
}
