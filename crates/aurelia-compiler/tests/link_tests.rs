//! Linker behavior over realistic templates.

use aurelia_compiler::{
    compile, BindingTarget, CompileOptions, DiagnosticCode, ExprSource, Instruction, NodeSem,
    TemplateCompilation,
};
use aurelia_resources::{extract_file_facts, BindingMode, ResourceIndex};
use aurelia_template::AttributeParser;
use source_map::FileId;

fn card_index() -> ResourceIndex {
    let facts = extract_file_facts(
        "/src/my-card.ts",
        r#"
@customElement('my-card')
export class MyCard {
  @bindable title = '';
  @bindable({ mode: 'two-way' }) value;
}
export class DateFormatValueConverter {}
"#,
    );
    ResourceIndex::build(&[facts], &[])
}

fn compile_with(index: &ResourceIndex, source: &str) -> TemplateCompilation {
    let mut attr_parser = AttributeParser::default();
    compile(
        "/src/app.html",
        source,
        index,
        &mut attr_parser,
        FileId(0),
        FileId(1),
        &CompileOptions::default(),
    )
}

fn all_instructions(compilation: &TemplateCompilation) -> Vec<&Instruction> {
    fn collect<'a>(instruction: &'a Instruction, out: &mut Vec<&'a Instruction>) {
        out.push(instruction);
        match instruction {
            Instruction::HydrateElement { props, .. }
            | Instruction::HydrateAttribute { props, .. }
            | Instruction::HydrateTemplateController { props, .. } => {
                for prop in props {
                    collect(prop, out);
                }
            }
            Instruction::HydrateLetElement { instructions, .. } => {
                for inner in instructions {
                    collect(inner, out);
                }
            }
            _ => {}
        }
    }
    let mut out = Vec::new();
    for row in &compilation.linked.rows {
        for instruction in &row.instructions {
            collect(instruction, &mut out);
        }
    }
    out
}

#[test]
fn property_binding_on_native_element() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<input value.bind="query">"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::PropertyBinding { to, .. } if to == "value"
    )));
}

#[test]
fn dashed_target_binds_the_attribute() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<div data-id.bind="item.id"></div>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::AttributeBinding { to, .. } if to == "data-id"
    )));
}

#[test]
fn style_command_routes_to_style_binding() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<div background-color.style="color"></div>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::StylePropertyBinding { to, .. } if to == "background-color"
    )));
}

#[test]
fn listener_bindings() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<button click.trigger="save()">Go</button>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::ListenerBinding { to, modifier: None, .. } if to == "click"
    )));
}

#[test]
fn at_pattern_listener_with_modifier() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<button @click:once="save()">Go</button>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::ListenerBinding { to, modifier: Some(m), .. }
            if to == "click" && m == "once"
    )));
}

#[test]
fn ref_binding() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<input ref="emailInput">"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions
        .iter()
        .any(|i| matches!(i, Instruction::RefBinding { to, .. } if to == "element")));
}

#[test]
fn custom_element_hydration_and_bindables() {
    let index = card_index();
    let compilation = compile_with(
        &index,
        r#"<my-card title.bind="heading" value.bind="amount" subtitle="static"></my-card>"#,
    );
    let instructions = all_instructions(&compilation);

    let hydrate = instructions
        .iter()
        .find_map(|i| match i {
            Instruction::HydrateElement { props, .. } => Some(props),
            _ => None,
        })
        .expect("custom element hydrated");
    assert_eq!(hydrate.len(), 2);
    assert!(matches!(
        &hydrate[0],
        Instruction::PropertyBinding {
            target: BindingTarget::ElementBindable { property },
            ..
        } if property == "title"
    ));
    // The declared two-way mode flows into the instruction.
    assert!(matches!(
        &hydrate[1],
        Instruction::PropertyBinding {
            mode: BindingMode::TwoWay,
            ..
        }
    ));
    // `subtitle` is not a bindable: the diagnostic path reports it.
    assert!(compilation
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::UnknownBindable));
}

#[test]
fn static_bindable_value_becomes_set_property() {
    let index = card_index();
    let compilation = compile_with(&index, r#"<my-card title="Hello"></my-card>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions.iter().any(|i| matches!(
        i,
        Instruction::SetProperty { value, to, .. } if value == "Hello" && to == "title"
    )));
}

#[test]
fn custom_attribute_hydration() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<input focus.bind="isFocused">"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions
        .iter()
        .any(|i| matches!(i, Instruction::HydrateAttribute { .. })));
}

#[test]
fn template_controller_hydration() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<div if.bind="visible">shown</div>"#);
    let instructions = all_instructions(&compilation);
    assert!(instructions
        .iter()
        .any(|i| matches!(i, Instruction::HydrateTemplateController { .. })));
}

#[test]
fn let_element() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(
        &index,
        r#"<let full-name.bind="first + last" to-binding-context></let><div>${fullName}</div>"#,
    );
    let instructions = all_instructions(&compilation);
    let hydrate = instructions
        .iter()
        .find_map(|i| match i {
            Instruction::HydrateLetElement {
                instructions,
                to_binding_context,
                ..
            } => Some((instructions, *to_binding_context)),
            _ => None,
        })
        .expect("let element hydrated");
    assert!(hydrate.1);
    assert!(matches!(
        &hydrate.0[0],
        Instruction::LetBinding { to, from: ExprSource::Expr(_), .. } if to == "fullName"
    ));

    // The declared name is visible to the following interpolation.
    let hole = compilation
        .linked
        .exprs
        .iter()
        .find(|(_, e)| matches!(e.role, aurelia_compiler::ExprRole::InterpolationHole))
        .expect("interpolation hole recorded");
    let frame = hole.1.frame;
    assert!(compilation
        .linked
        .scope
        .resolve(frame, "fullName", 0)
        .is_some());
}

#[test]
fn text_interpolation_row() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<div>Hello ${name}!</div>"#);
    let row = compilation
        .linked
        .rows
        .iter()
        .find(|row| matches!(row.node, NodeSem::Text))
        .expect("text row");
    assert!(matches!(
        &row.instructions[0],
        Instruction::PropertyBinding {
            to,
            from: ExprSource::Interp(ids),
            ..
        } if to == "textContent" && ids.len() == 1
    ));
}

#[test]
fn unknown_converter_is_reported() {
    let index = card_index();
    let compilation = compile_with(&index, r#"<div>${when | dateFormat | bogus}</div>"#);
    let codes: Vec<_> = compilation.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&DiagnosticCode::UnknownConverter));
    // The known converter does not trip the diagnostic.
    assert_eq!(
        codes
            .iter()
            .filter(|c| **c == DiagnosticCode::UnknownConverter)
            .count(),
        1
    );
}

#[test]
fn local_template_definition_and_use() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(
        &index,
        r#"<template as-custom-element="my-list"><bindable name="items"></bindable></template><my-list items.bind="people"></my-list>"#,
    );
    assert_eq!(compilation.linked.local_defs.len(), 1);
    let instructions = all_instructions(&compilation);
    let hydrate = instructions
        .iter()
        .find_map(|i| match i {
            Instruction::HydrateElement { props, .. } => Some(props),
            _ => None,
        })
        .expect("local element hydrated");
    assert!(matches!(
        &hydrate[0],
        Instruction::PropertyBinding {
            target: BindingTarget::ElementBindable { property },
            ..
        } if property == "items"
    ));
}

#[test]
fn as_element_resolves_the_named_definition() {
    let index = card_index();
    let compilation = compile_with(
        &index,
        r#"<div as-element="my-card" title.bind="heading"></div>"#,
    );
    let row = compilation
        .linked
        .rows
        .iter()
        .find(|row| matches!(&row.node, NodeSem::Element { custom: Some(_), .. }))
        .expect("as-element resolved");
    match &row.node {
        NodeSem::Element {
            as_element_value_span,
            ..
        } => assert!(as_element_value_span.is_some()),
        _ => unreachable!(),
    }
}

#[test]
fn for_on_non_controller_is_reported() {
    let index = ResourceIndex::build(&[], &[]);
    let compilation = compile_with(&index, r#"<div bogus.for="x of xs"></div>"#);
    assert!(compilation
        .diagnostics
        .iter()
        .any(|d| d.code == DiagnosticCode::ForOnNonController));
}

#[test]
fn compilation_is_deterministic() {
    let index = card_index();
    let source = r#"<my-card title.bind="a"></my-card><div repeat.for="x of xs">${x}</div>"#;
    let a = compile_with(&index, source);
    let b = compile_with(&index, source);
    assert_eq!(a.overlay.text, b.overlay.text);
    assert_eq!(a.linked.rows.len(), b.linked.rows.len());
    assert_eq!(a.diagnostics.len(), b.diagnostics.len());
}
