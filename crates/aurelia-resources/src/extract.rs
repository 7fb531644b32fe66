//! Companion-script fact extraction.
//!
//! Parses the view-model TypeScript with swc and mines class declarations
//! for resource decorations and members. Recognized forms:
//!
//! - `@customElement('kebab-name')` / `@customElement({ name, aliases })`
//! - `@customAttribute(…)`, `@templateController(…)`,
//!   `@valueConverter(…)`, `@bindingBehavior(…)`
//! - Class-name conventions: `FooCustomElement`, `FooCustomAttribute`,
//!   `FooValueConverter`, `FooBindingBehavior`, `FooTemplateController`
//! - `@bindable` fields, with `{ mode, attribute, primary }` options
//!
//! A class with no decoration still contributes its public members, so the
//! reference composer can resolve view-model accesses for templates whose
//! component class is undecorated.

use crate::facts::{BindableFacts, ClassFacts, FileFacts, MemberFacts, MemberKind, ResourceFacts};
use crate::{camel_to_dash, ResourceKind};
use smol_str::SmolStr;
use source_map::{normalize_uri, Span};
use std::sync::Arc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    Accessibility, Callee, ClassDecl, ClassMember, Decl, Decorator, Expr, Lit, Module, ModuleDecl,
    ModuleItem, Prop, PropName, PropOrSpread, Stmt,
};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

/// Extracts facts from one companion script.
///
/// Parse failures yield facts with no classes rather than an error; the
/// template pipeline must keep working against a broken script.
pub fn extract_file_facts(uri: &str, script: &str) -> FileFacts {
    let Some((module, base)) = parse_module(script) else {
        return FileFacts {
            uri: normalize_uri(uri),
            classes: Vec::new(),
        };
    };

    let mut classes = Vec::new();
    for item in &module.body {
        let class = match item {
            ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => match &export.decl {
                Decl::Class(class) => class,
                _ => continue,
            },
            ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                match &export.decl {
                    swc_ecma_ast::DefaultDecl::Class(expr) => {
                        if let Some(facts) = class_expr_facts(expr, base) {
                            classes.push(facts);
                        }
                        continue;
                    }
                    _ => continue,
                }
            }
            ModuleItem::Stmt(Stmt::Decl(Decl::Class(class))) => class,
            _ => continue,
        };
        classes.push(class_facts(class, base));
    }

    FileFacts {
        uri: normalize_uri(uri),
        classes,
    }
}

fn parse_module(script: &str) -> Option<(Module, u32)> {
    let cm: Arc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("view-model".into()).into(),
        script.to_string(),
    );
    let base = fm.start_pos.0;
    let syntax = Syntax::Typescript(TsSyntax {
        tsx: false,
        decorators: true,
        ..Default::default()
    });
    let mut parser = Parser::new(syntax, StringInput::from(&*fm), None);
    parser.parse_module().ok().map(|module| (module, base))
}

fn to_span(span: swc_common::Span, base: u32) -> Span {
    Span::new(span.lo.0.saturating_sub(base), span.hi.0.saturating_sub(base))
}

fn class_facts(class: &ClassDecl, base: u32) -> ClassFacts {
    let name = SmolStr::from(class.ident.sym.as_str());
    let name_span = Some(to_span(class.ident.span, base));
    build_class_facts(name, name_span, &class.class, base)
}

fn class_expr_facts(expr: &swc_ecma_ast::ClassExpr, base: u32) -> Option<ClassFacts> {
    let ident = expr.ident.as_ref()?;
    let name = SmolStr::from(ident.sym.as_str());
    let name_span = Some(to_span(ident.span, base));
    Some(build_class_facts(name, name_span, &expr.class, base))
}

fn build_class_facts(
    name: SmolStr,
    name_span: Option<Span>,
    class: &swc_ecma_ast::Class,
    base: u32,
) -> ClassFacts {
    let resource = class
        .decorators
        .iter()
        .find_map(|d| decorator_resource(d, base))
        .or_else(|| convention_resource(&name));

    let mut bindables = Vec::new();
    let mut members = Vec::new();
    for member in &class.body {
        match member {
            ClassMember::ClassProp(prop) => {
                if prop.is_static || is_non_public(prop.accessibility) {
                    continue;
                }
                let Some((member_name, span)) = prop_name(&prop.key, base) else {
                    continue;
                };
                if let Some(bindable) = prop
                    .decorators
                    .iter()
                    .find_map(|d| decorator_bindable(d, &member_name, span))
                {
                    bindables.push(bindable);
                }
                members.push(MemberFacts {
                    name: member_name,
                    span: Some(span),
                    kind: MemberKind::Property,
                });
            }
            ClassMember::Method(method) => {
                if method.is_static || is_non_public(method.accessibility) {
                    continue;
                }
                let Some((member_name, span)) = prop_name(&method.key, base) else {
                    continue;
                };
                members.push(MemberFacts {
                    name: member_name,
                    span: Some(span),
                    kind: MemberKind::Method,
                });
            }
            _ => {}
        }
    }

    ClassFacts {
        name,
        name_span,
        resource,
        bindables,
        members,
    }
}

fn is_non_public(accessibility: Option<Accessibility>) -> bool {
    matches!(
        accessibility,
        Some(Accessibility::Private) | Some(Accessibility::Protected)
    )
}

fn prop_name(key: &PropName, base: u32) -> Option<(SmolStr, Span)> {
    match key {
        PropName::Ident(ident) => Some((
            SmolStr::from(ident.sym.as_str()),
            to_span(ident.span, base),
        )),
        PropName::Str(s) => Some((SmolStr::from(s.value.as_str().unwrap_or_default()), to_span(s.span, base))),
        _ => None,
    }
}

/// Maps a decorator name to the resource kind it declares.
fn decorator_kind(name: &str) -> Option<ResourceKind> {
    Some(match name {
        "customElement" => ResourceKind::CustomElement,
        "customAttribute" => ResourceKind::CustomAttribute,
        "templateController" => ResourceKind::TemplateController,
        "valueConverter" => ResourceKind::ValueConverter,
        "bindingBehavior" => ResourceKind::BindingBehavior,
        _ => return None,
    })
}

fn decorator_resource(decorator: &Decorator, base: u32) -> Option<ResourceFacts> {
    let call = decorator.expr.as_call()?;
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    let ident = callee.as_ident()?;
    let kind = decorator_kind(ident.sym.as_str())?;
    let arg = call.args.first()?;

    match &*arg.expr {
        Expr::Lit(Lit::Str(s)) => Some(ResourceFacts {
            kind,
            name: SmolStr::from(s.value.as_str().unwrap_or_default()),
            name_span: Some(string_content_span(s, base)),
            aliases: Vec::new(),
            explicit: true,
        }),
        Expr::Object(object) => {
            let mut name = None;
            let mut name_span = None;
            let mut aliases = Vec::new();
            for prop in &object.props {
                let PropOrSpread::Prop(prop) = prop else {
                    continue;
                };
                let Prop::KeyValue(kv) = &**prop else {
                    continue;
                };
                let key = match &kv.key {
                    PropName::Ident(ident) => ident.sym.as_str().to_string(),
                    PropName::Str(s) => s.value.as_str().unwrap_or_default().to_string(),
                    _ => continue,
                };
                match key.as_str() {
                    "name" => {
                        if let Expr::Lit(Lit::Str(s)) = &*kv.value {
                            name = Some(SmolStr::from(s.value.as_str().unwrap_or_default()));
                            name_span = Some(string_content_span(s, base));
                        }
                    }
                    "aliases" => {
                        if let Expr::Array(array) = &*kv.value {
                            for element in array.elems.iter().flatten() {
                                if let Expr::Lit(Lit::Str(s)) = &*element.expr {
                                    aliases.push(SmolStr::from(s.value.as_str().unwrap_or_default()));
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            Some(ResourceFacts {
                kind,
                name: name?,
                name_span,
                aliases,
                explicit: true,
            })
        }
        _ => None,
    }
}

/// Class-name conventions: `DateFormatValueConverter` declares the
/// `dateFormat` converter; element and attribute names are kebab-cased.
fn convention_resource(class_name: &str) -> Option<ResourceFacts> {
    const SUFFIXES: &[(&str, ResourceKind, bool)] = &[
        ("CustomElement", ResourceKind::CustomElement, true),
        ("CustomAttribute", ResourceKind::CustomAttribute, true),
        ("TemplateController", ResourceKind::TemplateController, true),
        ("ValueConverter", ResourceKind::ValueConverter, false),
        ("BindingBehavior", ResourceKind::BindingBehavior, false),
    ];
    for (suffix, kind, kebab) in SUFFIXES {
        let Some(stem) = class_name.strip_suffix(suffix) else {
            continue;
        };
        if stem.is_empty() {
            continue;
        }
        let name = if *kebab {
            camel_to_dash(stem)
        } else {
            // Converter and behavior names stay camelCase with a lowered
            // first letter.
            let mut chars = stem.chars();
            let first = chars.next().expect("non-empty stem");
            let mut lowered = String::new();
            lowered.extend(first.to_lowercase());
            lowered.push_str(chars.as_str());
            SmolStr::from(lowered)
        };
        return Some(ResourceFacts {
            kind: *kind,
            name,
            name_span: None,
            aliases: Vec::new(),
            explicit: false,
        });
    }
    None
}

fn decorator_bindable(
    decorator: &Decorator,
    property: &SmolStr,
    property_span: Span,
) -> Option<BindableFacts> {
    let mut mode = None;
    let mut attribute = None;
    let mut primary = false;

    match &*decorator.expr {
        Expr::Ident(ident) if ident.sym.as_str() == "bindable" => {}
        Expr::Call(call) => {
            let Callee::Expr(callee) = &call.callee else {
                return None;
            };
            if callee.as_ident()?.sym.as_str() != "bindable" {
                return None;
            }
            if let Some(arg) = call.args.first() {
                if let Expr::Object(object) = &*arg.expr {
                    for prop in &object.props {
                        let PropOrSpread::Prop(prop) = prop else {
                            continue;
                        };
                        let Prop::KeyValue(kv) = &**prop else {
                            continue;
                        };
                        let PropName::Ident(key) = &kv.key else {
                            continue;
                        };
                        match key.sym.as_str() {
                            "mode" => {
                                // Either a string keyword or a
                                // `BindingMode.twoWay` member access.
                                match &*kv.value {
                                    Expr::Lit(Lit::Str(s)) => {
                                        mode = Some(SmolStr::from(s.value.as_str().unwrap_or_default()));
                                    }
                                    Expr::Member(member) => {
                                        if let Some(prop) = member.prop.as_ident() {
                                            mode = Some(SmolStr::from(prop.sym.as_str()));
                                        }
                                    }
                                    _ => {}
                                }
                            }
                            "attribute" => {
                                if let Expr::Lit(Lit::Str(s)) = &*kv.value {
                                    attribute = Some(SmolStr::from(s.value.as_str().unwrap_or_default()));
                                }
                            }
                            "primary" => {
                                if let Expr::Lit(Lit::Bool(b)) = &*kv.value {
                                    primary = b.value;
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }
        _ => return None,
    }

    Some(BindableFacts {
        property: property.clone(),
        span: Some(property_span),
        mode,
        attribute,
        primary,
    })
}

/// Span of a string literal's content, quotes excluded.
fn string_content_span(s: &swc_ecma_ast::Str, base: u32) -> Span {
    let full = to_span(s.span(), base);
    if full.len() >= text_size::TextSize::from(2) {
        Span::new(
            full.start + text_size::TextSize::from(1),
            full.end - text_size::TextSize::from(1),
        )
    } else {
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decorator_with_string_name() {
        let facts = extract_file_facts(
            "/src/card.ts",
            r#"
import { customElement } from 'aurelia';

@customElement('my-card')
export class Card {
  title = '';
  save() {}
}
"#,
        );
        assert_eq!(facts.classes.len(), 1);
        let class = &facts.classes[0];
        let resource = class.resource.as_ref().unwrap();
        assert_eq!(resource.kind, ResourceKind::CustomElement);
        assert_eq!(resource.name.as_str(), "my-card");
        assert!(resource.explicit);
        assert_eq!(class.members.len(), 2);
    }

    #[test]
    fn decorator_with_object_options() {
        let facts = extract_file_facts(
            "/src/tip.ts",
            r#"
@customAttribute({ name: 'tooltip', aliases: ['tip'] })
export class Tooltip {}
"#,
        );
        let resource = facts.classes[0].resource.as_ref().unwrap();
        assert_eq!(resource.kind, ResourceKind::CustomAttribute);
        assert_eq!(resource.name.as_str(), "tooltip");
        assert_eq!(resource.aliases, vec![SmolStr::from("tip")]);
    }

    #[test]
    fn class_name_conventions() {
        let facts = extract_file_facts(
            "/src/res.ts",
            r#"
export class DateFormatValueConverter {}
export class PersonCardCustomElement {}
export class ThrottleBindingBehavior {}
"#,
        );
        let kinds: Vec<_> = facts
            .classes
            .iter()
            .map(|c| {
                let r = c.resource.as_ref().unwrap();
                (r.kind, r.name.clone())
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                (ResourceKind::ValueConverter, SmolStr::from("dateFormat")),
                (ResourceKind::CustomElement, SmolStr::from("person-card")),
                (ResourceKind::BindingBehavior, SmolStr::from("throttle")),
            ]
        );
    }

    #[test]
    fn bindable_decorators() {
        let facts = extract_file_facts(
            "/src/card.ts",
            r#"
@customElement('my-card')
export class Card {
  @bindable title = '';
  @bindable({ mode: 'two-way', attribute: 'val', primary: true }) value;
  private secret = 1;
}
"#,
        );
        let class = &facts.classes[0];
        assert_eq!(class.bindables.len(), 2);
        assert_eq!(class.bindables[0].property.as_str(), "title");
        let value = &class.bindables[1];
        assert_eq!(value.mode.as_deref(), Some("two-way"));
        assert_eq!(value.attribute.as_deref(), Some("val"));
        assert!(value.primary);
        // Private members stay out of the member list.
        assert!(class.members.iter().all(|m| m.name != "secret"));
    }

    #[test]
    fn undecorated_class_still_contributes_members() {
        let facts = extract_file_facts(
            "/src/app.ts",
            r#"
export class App {
  message = 'hello';
  greet() {}
}
"#,
        );
        let class = &facts.classes[0];
        assert!(class.resource.is_none());
        assert_eq!(class.members.len(), 2);
    }

    #[test]
    fn broken_script_yields_empty_facts() {
        let facts = extract_file_facts("/src/broken.ts", "class {{{{");
        assert!(facts.classes.is_empty());
    }
}
