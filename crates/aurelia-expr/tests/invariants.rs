//! Universal parser invariants checked over an expression corpus.

use aurelia_expr::{parse, Expr, ParseMode, ParseOptions, Span};
use pretty_assertions::assert_eq;
use text_size::TextSize;

const CORPUS: &[&str] = &[
    "foo",
    "foo.bar.baz",
    "items[idx].name",
    "$parent.$parent.baz",
    "$this.total",
    "this.count",
    "1 + 2 * 3",
    "2 ** 3 ** 2",
    "a ?? b || c && d",
    "a === b ? yes : no",
    "!done && count > 0",
    "-x + +y",
    "typeof value",
    "amount | currency:'USD' & throttle:100",
    "items | sort:'name' | take:10",
    "doIt(a, b, c)",
    "$parent.save()",
    "Math.max(a, b)",
    "parseInt(text)",
    "foo?.bar()?.baz",
    "items?.[0]",
    "[1, 2, 3]",
    "[1,,2,]",
    "{a: 1, b: two, c}",
    "(a + b) * c",
    "x => x.y + 1",
    "(a, b) => a || b",
    "new Foo(1, 2)",
    "new foo.bar(x)",
    "`a${x}b${y.z}c`",
    "tag`v${x}`",
    "count += 1",
    "a = b = c",
    "x instanceof Date",
    "'k' in map",
];

fn check_containment(expr: &Expr) {
    let span = expr.span();
    expr.for_each_child(&mut |child| {
        let child_span = child.span();
        assert!(
            span.start <= child_span.start && child_span.end <= span.end,
            "child span {child_span:?} escapes parent span {span:?}"
        );
        check_containment(child);
    });
}

#[test]
fn span_containment_holds_over_corpus() {
    for source in CORPUS {
        let expr = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        assert!(!matches!(expr, Expr::Bad(_)), "corpus entry failed: {source}");
        check_containment(&expr);
    }
}

fn check_leaf_roundtrip(expr: &Expr, source: &str) {
    match expr {
        Expr::AccessScope { name, .. }
        | Expr::AccessGlobal { name, .. }
        | Expr::CallScope { name, .. }
        | Expr::CallGlobal { name, .. } => {
            assert_eq!(name.span.slice(source), name.name.as_str());
        }
        Expr::AccessMember { name, .. } | Expr::CallMember { name, .. } => {
            assert_eq!(name.span.slice(source), name.name.as_str());
        }
        Expr::BindingIdentifier { span, name } => {
            assert_eq!(span.slice(source), name.as_str());
        }
        _ => {}
    }
    expr.for_each_child(&mut |child| check_leaf_roundtrip(child, source));
}

#[test]
fn identifier_spans_roundtrip_to_text() {
    for source in CORPUS {
        let expr = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        check_leaf_roundtrip(&expr, source);
    }
}

#[test]
fn rebasing_composes_once() {
    for source in CORPUS {
        let base = Span::new(37u32, 37u32 + source.len() as u32);
        let at_zero = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        let rebased = parse(
            source,
            ParseMode::IsProperty,
            &ParseOptions::default().rebased(base),
        );
        let mut shifted = at_zero;
        shifted.rebase(TextSize::from(37));
        assert_eq!(shifted, rebased, "rebase mismatch for {source}");
    }
}

#[test]
fn rebased_spans_are_concrete() {
    let base = Span::new(10u32, 17u32);
    let expr = parse(
        "foo.bar",
        ParseMode::IsProperty,
        &ParseOptions::default().rebased(base),
    );
    match expr {
        Expr::AccessMember { span, name, object, .. } => {
            assert_eq!(span, Span::new(10u32, 17u32));
            assert_eq!(name.span, Span::new(14u32, 17u32));
            assert_eq!(object.span(), Span::new(10u32, 13u32));
        }
        other => panic!("expected AccessMember, got {other:?}"),
    }
}

#[test]
fn property_and_function_modes_are_identical() {
    for source in CORPUS {
        let a = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        let b = parse(source, ParseMode::IsFunction, &ParseOptions::default());
        assert_eq!(a, b, "mode divergence for {source}");
    }
}

#[test]
fn parsing_is_deterministic() {
    for source in CORPUS {
        let a = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        let b = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        assert_eq!(a, b);
    }
}

#[test]
fn interpolation_parts_invariant() {
    for source in [
        "Hello ${name}",
        "${a}${b}",
        "x ${a} y ${b} z",
        "no holes here",
        r"\${escaped}",
    ] {
        let expr = parse(source, ParseMode::Interpolation, &ParseOptions::default());
        match expr {
            Expr::Interpolation {
                parts, expressions, ..
            } => {
                assert_eq!(parts.len(), expressions.len() + 1, "for {source:?}");
            }
            other => panic!("expected Interpolation, got {other:?}"),
        }
    }
}

#[test]
fn template_cooked_invariant() {
    for source in ["`plain`", "`a${x}`", "`${x}${y}done`"] {
        let expr = parse(source, ParseMode::IsProperty, &ParseOptions::default());
        match expr {
            Expr::Template {
                cooked,
                expressions,
                ..
            } => {
                assert_eq!(cooked.len(), expressions.len() + 1, "for {source:?}");
            }
            other => panic!("expected Template, got {other:?}"),
        }
    }
}
