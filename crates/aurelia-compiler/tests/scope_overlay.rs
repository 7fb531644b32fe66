//! Scope-graph resolution and overlay provenance, end to end.

use aurelia_compiler::{compile, CompileOptions, ExprRole, TemplateCompilation};
use aurelia_expr::Expr;
use aurelia_resources::ResourceIndex;
use aurelia_template::AttributeParser;
use pretty_assertions::assert_eq;
use source_map::{ByteOffset, FileId, FrameId, ProvenanceIndex};

const TEMPLATE_FILE: FileId = FileId(0);
const OVERLAY_FILE: FileId = FileId(1);

fn compile_source(source: &str) -> TemplateCompilation {
    let index = ResourceIndex::build(&[], &[]);
    let mut attr_parser = AttributeParser::default();
    compile(
        "/src/app.html",
        source,
        &index,
        &mut attr_parser,
        TEMPLATE_FILE,
        OVERLAY_FILE,
        &CompileOptions::default(),
    )
}

#[test]
fn repeat_scope_property() {
    // The canonical scope-graph property: `x` inside the repeat body
    // resolves to the frame declared by the `repeat`, not the root.
    let source = r#"<ul><li repeat.for="x of xs">${x.y}</li></ul>"#;
    let compilation = compile_source(source);

    let (_, hole) = compilation
        .linked
        .exprs
        .iter()
        .find(|(_, e)| e.role == ExprRole::InterpolationHole)
        .expect("hole recorded");
    assert_ne!(hole.frame, FrameId::ROOT);

    let Expr::AccessMember { object, .. } = &hole.expr else {
        panic!("expected member access, got {:?}", hole.expr);
    };
    let Expr::AccessScope { name, ancestor, .. } = &**object else {
        panic!("expected scope access, got {object:?}");
    };
    assert_eq!(ancestor, &0);

    let (frame, symbol) = compilation
        .linked
        .scope
        .resolve(hole.frame, &name.name, *ancestor)
        .expect("x resolves");
    assert_eq!(frame, hole.frame);
    assert_eq!(symbol.name.as_str(), "x");
    // The declaration span points into the attribute value.
    let span = symbol.span.expect("declared in source");
    assert_eq!(span.slice(source), "x");
}

#[test]
fn repeat_contextuals_resolve() {
    let compilation = compile_source(r#"<li repeat.for="item of items">${$index}</li>"#);
    let (_, hole) = compilation
        .linked
        .exprs
        .iter()
        .find(|(_, e)| e.role == ExprRole::InterpolationHole)
        .unwrap();
    assert!(compilation
        .linked
        .scope
        .resolve(hole.frame, "$index", 0)
        .is_some());
    // But contextuals are invisible outside the repeat.
    assert!(compilation
        .linked
        .scope
        .resolve(FrameId::ROOT, "$index", 0)
        .is_none());
}

#[test]
fn iterator_head_parses_in_outer_frame() {
    let compilation = compile_source(r#"<li repeat.for="x of xs">${x}</li>"#);
    let (_, iterator) = compilation
        .linked
        .exprs
        .iter()
        .find(|(_, e)| e.role == ExprRole::Iterator)
        .expect("iterator recorded");
    assert_eq!(iterator.frame, FrameId::ROOT);
}

#[test]
fn nested_repeats_shadow() {
    let source =
        r#"<div repeat.for="x of xs"><span repeat.for="x of x.children">${x}</span></div>"#;
    let compilation = compile_source(source);
    let holes: Vec<_> = compilation
        .linked
        .exprs
        .iter()
        .filter(|(_, e)| e.role == ExprRole::InterpolationHole)
        .collect();
    assert_eq!(holes.len(), 1);
    let frame = holes[0].1.frame;
    let (resolved_frame, _) = compilation.linked.scope.resolve(frame, "x", 0).unwrap();
    assert_eq!(resolved_frame, frame);
    // One hop reaches the outer iteration variable.
    let (outer_frame, _) = compilation.linked.scope.resolve(frame, "x", 1).unwrap();
    assert_ne!(outer_frame, frame);
}

#[test]
fn overlay_renders_vm_members() {
    let compilation = compile_source(r#"<div>${customer.name}</div>"#);
    assert!(compilation.overlay.text.contains("vm.customer.name"));
    assert!(compilation.overlay.text.contains("declare const vm"));
}

#[test]
fn overlay_renders_scope_locals_bare() {
    let compilation = compile_source(r#"<li repeat.for="item of items">${item.label}</li>"#);
    // `items` is a view-model member; `item` is a scope local.
    assert!(compilation.overlay.text.contains("vm.items"));
    assert!(compilation.overlay.text.contains("item.label"));
    assert!(!compilation.overlay.text.contains("vm.item.label"));
    assert!(compilation.overlay.text.contains("declare let item: any;"));
}

#[test]
fn overlay_edges_roundtrip_through_the_index() {
    let source = r#"<div>${customer.name}</div>"#;
    let compilation = compile_source(source);

    let mut index = ProvenanceIndex::new();
    index.set_document(
        OVERLAY_FILE,
        TEMPLATE_FILE,
        compilation.overlay.edges.clone(),
    );

    // The template offset of `customer` maps into the overlay.
    let customer_offset = source.find("customer").unwrap() as u32;
    let edge = index
        .lookup_source(TEMPLATE_FILE, ByteOffset::from(customer_offset))
        .expect("template offset maps");
    let overlay_text = &compilation.overlay.text;
    let hit = edge.overlay.span.slice(overlay_text);
    assert_eq!(hit, "customer");

    // And back: that overlay offset maps to the template span of
    // `customer`.
    let back = index
        .lookup_generated(OVERLAY_FILE, edge.overlay.span.start)
        .expect("overlay offset maps");
    assert_eq!(back.template.span.slice(source), "customer");
}

#[test]
fn member_edges_carry_paths() {
    let compilation = compile_source(r#"<div>${customer.name}</div>"#);
    let paths: Vec<_> = compilation
        .overlay
        .edges
        .iter()
        .filter_map(|e| e.template.member_path.as_deref().map(str::to_string))
        .collect();
    assert!(paths.contains(&"customer".to_string()));
    assert!(paths.contains(&"customer.name".to_string()));
}

#[test]
fn overlay_alias_map_names_the_vm_type() {
    let index = ResourceIndex::build(&[], &[]);
    let mut attr_parser = AttributeParser::default();
    let compilation = compile(
        "/src/app.html",
        r#"<div>${x}</div>"#,
        &index,
        &mut attr_parser,
        TEMPLATE_FILE,
        OVERLAY_FILE,
        &CompileOptions {
            vm_class: Some("App".to_string()),
            ..Default::default()
        },
    );
    assert!(compilation.overlay.text.contains("type __VM = App;"));
    assert_eq!(
        compilation.overlay.aliases.get("__VM").map(|s| s.as_str()),
        Some("App")
    );
}

#[test]
fn query_facade_basics() {
    let source = r#"<div if.bind="visible">${message}</div>"#;
    let compilation = compile_source(source);
    let resources = ResourceIndex::build(&[], &[]);
    let query = compilation.query(&resources);

    let message_offset = ByteOffset::from(source.find("message").unwrap() as u32 + 1);
    let expr = query.expr_at(message_offset).expect("expression at cursor");
    assert_eq!(
        query.expected_type_of(expr),
        aurelia_compiler::ExpectedType::Value
    );

    let node = query.node_at(message_offset).expect("node at cursor");
    assert!(query.row_for(node).is_some());

    let visible_offset = ByteOffset::from(source.find("visible").unwrap() as u32 + 1);
    assert!(query.controller_at(visible_offset).is_some());
}
