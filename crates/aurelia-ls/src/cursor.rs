//! Cursor-entity resolution.
//!
//! One position dispatch for every language feature: an offset classifies
//! into exactly one entity of a closed set. Ambiguity is resolved by
//! innermost-span-wins, then by a fixed priority: command > bindable >
//! attribute-name > tag-name > expression-member > scope-identifier.

use crate::envelope::Confidence;
use aurelia_compiler::{NodeSem, TemplateCompilation};
use aurelia_expr::Expr;
use aurelia_resources::{
    ResourceIndex, SourcedOrigin, SymbolId, NON_RENAMEABLE_NAMES,
};
use aurelia_template::{AttributeParser, Node};
use smol_str::SmolStr;
use source_map::{ByteOffset, ExprId, FrameId, Span};

/// The single semantic thing at an offset.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CursorEntity {
    /// A custom element tag (open or close).
    CeTag {
        /// The resolved element.
        res: SymbolId,
        /// The tag name.
        name: SmolStr,
        /// Span of the tag name under the cursor.
        span: Span,
    },
    /// A custom attribute name.
    CaAttr {
        /// The resolved attribute.
        res: SymbolId,
        /// The attribute name.
        name: SmolStr,
        /// Span of the target segment.
        span: Span,
    },
    /// A template-controller attribute name.
    TcAttr {
        /// The resolved controller.
        res: SymbolId,
        /// The controller name.
        name: SmolStr,
        /// Span of the target segment.
        span: Span,
    },
    /// A bindable attribute on a custom element or attribute.
    Bindable {
        /// The owning resource.
        owner: SymbolId,
        /// The bindable property name.
        property: SmolStr,
        /// Span of the target segment.
        span: Span,
    },
    /// A binding-command suffix (`bind`, `trigger`, …).
    Command {
        /// The command name.
        name: SmolStr,
        /// Span of the command segment.
        span: Span,
    },
    /// A plain attribute with a binding but no resource behind it.
    PlainAttrBinding {
        /// The attribute target.
        name: SmolStr,
        /// Span of the target segment.
        span: Span,
    },
    /// A value-converter name inside an expression.
    ValueConverter {
        /// The resolved converter, when the name is known.
        res: Option<SymbolId>,
        /// The converter name.
        name: SmolStr,
        /// Span of the name.
        span: Span,
    },
    /// A binding-behavior name inside an expression.
    BindingBehavior {
        /// The resolved behavior, when the name is known.
        res: Option<SymbolId>,
        /// The behavior name.
        name: SmolStr,
        /// Span of the name.
        span: Span,
    },
    /// An identifier bound by the template scope (iteration variables,
    /// `<let>` values, contextuals).
    ScopeIdentifier {
        /// The identifier.
        name: SmolStr,
        /// The frame it resolves in.
        frame: FrameId,
        /// The owning expression.
        expr: ExprId,
        /// Span of the identifier.
        span: Span,
    },
    /// A member access against the view-model.
    MemberAccess {
        /// Dotted path up to and including this member.
        path: SmolStr,
        /// The owning expression.
        expr: ExprId,
        /// Span of the member name.
        span: Span,
    },
    /// The name declared by `<template as-custom-element="…">`.
    LocalTemplateName {
        /// The declared name.
        name: SmolStr,
        /// Span of the name value.
        span: Span,
    },
    /// The value of an `as-element` attribute.
    AsElement {
        /// The referenced element name.
        name: SmolStr,
        /// Span of the value.
        span: Span,
    },
}

impl CursorEntity {
    /// The span of the entity under the cursor.
    pub fn span(&self) -> Span {
        match self {
            CursorEntity::CeTag { span, .. }
            | CursorEntity::CaAttr { span, .. }
            | CursorEntity::TcAttr { span, .. }
            | CursorEntity::Bindable { span, .. }
            | CursorEntity::Command { span, .. }
            | CursorEntity::PlainAttrBinding { span, .. }
            | CursorEntity::ValueConverter { span, .. }
            | CursorEntity::BindingBehavior { span, .. }
            | CursorEntity::ScopeIdentifier { span, .. }
            | CursorEntity::MemberAccess { span, .. }
            | CursorEntity::LocalTemplateName { span, .. }
            | CursorEntity::AsElement { span, .. } => *span,
        }
    }
}

/// A resolved cursor position.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorHit {
    /// The entity.
    pub entity: CursorEntity,
    /// How the tie was broken: `Exact` for a single candidate, `High`
    /// when priority decided.
    pub confidence: Confidence,
}

/// Whether the entity may be renamed. Framework contextual variables,
/// framework-owned resources, and template-controller names (keywords
/// here) are blocked.
pub fn is_renameable(entity: &CursorEntity, resources: &ResourceIndex) -> bool {
    let origin_of = |id: &SymbolId| resources.get(id).map(|def| def.name.origin);
    match entity {
        CursorEntity::Command { .. }
        | CursorEntity::TcAttr { .. }
        | CursorEntity::PlainAttrBinding { .. } => false,
        CursorEntity::ScopeIdentifier { name, .. } => {
            !NON_RENAMEABLE_NAMES.contains(&name.as_str())
        }
        CursorEntity::CeTag { res, .. } | CursorEntity::CaAttr { res, .. } => {
            origin_of(res) != Some(SourcedOrigin::Builtin)
        }
        CursorEntity::Bindable { owner, .. } => origin_of(owner) != Some(SourcedOrigin::Builtin),
        CursorEntity::ValueConverter { res, .. } | CursorEntity::BindingBehavior { res, .. } => {
            match res {
                Some(res) => origin_of(res) != Some(SourcedOrigin::Builtin),
                None => false,
            }
        }
        CursorEntity::MemberAccess { .. }
        | CursorEntity::LocalTemplateName { .. }
        | CursorEntity::AsElement { .. } => true,
    }
}

struct Candidate {
    span: Span,
    priority: u8,
    entity: CursorEntity,
}

const PRIO_COMMAND: u8 = 0;
const PRIO_BINDABLE: u8 = 1;
const PRIO_ATTR_NAME: u8 = 2;
const PRIO_TAG_NAME: u8 = 3;
const PRIO_EXPR_MEMBER: u8 = 4;
const PRIO_SCOPE_IDENT: u8 = 5;
const PRIO_OTHER: u8 = 6;

/// Resolves the entity at `offset`. Returns at most one hit.
pub fn resolve(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    source: &str,
    offset: ByteOffset,
) -> Option<CursorHit> {
    let mut candidates: Vec<Candidate> = Vec::new();

    collect_row_candidates(compilation, source, offset, &mut candidates);
    collect_attr_candidates(compilation, resources, attr_parser, offset, &mut candidates);
    collect_expr_candidates(compilation, resources, offset, &mut candidates);

    let total = candidates.len();
    candidates.sort_by_key(|c| (c.span.len(), c.priority));
    let winner = candidates.into_iter().next()?;
    Some(CursorHit {
        entity: winner.entity,
        confidence: if total == 1 {
            Confidence::Exact
        } else {
            Confidence::High
        },
    })
}

fn collect_row_candidates(
    compilation: &TemplateCompilation,
    source: &str,
    offset: ByteOffset,
    out: &mut Vec<Candidate>,
) {
    for row in &compilation.linked.rows {
        match &row.node {
            NodeSem::Element {
                tag,
                tag_span,
                close_tag_span,
                as_element_value_span,
                custom,
            } => {
                if let Some(res) = custom {
                    for span in [Some(*tag_span), *close_tag_span].into_iter().flatten() {
                        if span.touches(offset) {
                            out.push(Candidate {
                                span,
                                priority: PRIO_TAG_NAME,
                                entity: CursorEntity::CeTag {
                                    res: res.clone(),
                                    name: tag.clone(),
                                    span,
                                },
                            });
                        }
                    }
                }
                if let Some(span) = as_element_value_span {
                    if span.touches(offset) {
                        out.push(Candidate {
                            span: *span,
                            priority: PRIO_OTHER,
                            entity: CursorEntity::AsElement {
                                name: SmolStr::from(span.slice(source)),
                                span: *span,
                            },
                        });
                    }
                }
            }
            NodeSem::Template {
                local_name_span, ..
            } => {
                if let Some(span) = local_name_span {
                    if span.touches(offset) {
                        out.push(Candidate {
                            span: *span,
                            priority: PRIO_OTHER,
                            entity: CursorEntity::LocalTemplateName {
                                name: SmolStr::from(span.slice(source)),
                                span: *span,
                            },
                        });
                    }
                }
            }
            NodeSem::Let { .. } | NodeSem::Text => {}
        }
    }
}

fn collect_attr_candidates(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    offset: ByteOffset,
    out: &mut Vec<Candidate>,
) {
    walk_dom(&compilation.parsed.dom, &mut |node| {
        let (attrs, tag) = match node {
            Node::Element(el) => (&el.attrs, Some(el.tag.as_str())),
            Node::Template(t) => (&t.attrs, None),
            _ => return,
        };
        for attr in attrs {
            if !attr.name_span.touches(offset) {
                continue;
            }
            let syntax = attr_parser.analyze(&attr.name);
            let target_span = syntax
                .target_span
                .map(|s| s.rebase(attr.name_span.start));
            let command_span = syntax
                .command_span
                .map(|s| s.rebase(attr.name_span.start));

            if let (Some(span), Some(command)) = (command_span, &syntax.command) {
                if span.touches(offset) {
                    out.push(Candidate {
                        span,
                        priority: PRIO_COMMAND,
                        entity: CursorEntity::Command {
                            name: command.clone(),
                            span,
                        },
                    });
                }
            }

            let Some(span) = target_span else { continue };
            if !span.touches(offset) {
                continue;
            }
            if let Some((res, _)) = resources.controller(&syntax.target) {
                out.push(Candidate {
                    span,
                    priority: PRIO_ATTR_NAME,
                    entity: CursorEntity::TcAttr {
                        res: res.clone(),
                        name: syntax.target.clone(),
                        span,
                    },
                });
                continue;
            }
            if let Some((res, _)) = resources.attribute(&syntax.target) {
                out.push(Candidate {
                    span,
                    priority: PRIO_ATTR_NAME,
                    entity: CursorEntity::CaAttr {
                        res: res.clone(),
                        name: syntax.target.clone(),
                        span,
                    },
                });
                continue;
            }
            if let Some((owner, property)) =
                host_bindable(compilation, resources, tag, &syntax.target)
            {
                out.push(Candidate {
                    span,
                    priority: PRIO_BINDABLE,
                    entity: CursorEntity::Bindable {
                        owner,
                        property,
                        span,
                    },
                });
                continue;
            }
            if syntax.command.is_some() {
                out.push(Candidate {
                    span,
                    priority: PRIO_OTHER,
                    entity: CursorEntity::PlainAttrBinding {
                        name: syntax.target.clone(),
                        span,
                    },
                });
            }
        }
    });
}

/// Resolves the element hosting an attribute and looks the target up in
/// its bindables.
fn host_bindable(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    tag: Option<&str>,
    target: &str,
) -> Option<(SymbolId, SmolStr)> {
    let tag = tag?;
    let (id, def) = resources
        .element(tag)
        .map(|(id, def)| (id.clone(), def.clone()))
        .or_else(|| {
            compilation
                .linked
                .local_defs
                .iter()
                .find(|(_, def)| def.name.value.as_str() == tag)
                .map(|(id, def)| (id.clone(), def.clone()))
        })?;
    let (property, _) = def.bindable_for_target(target)?;
    Some((id, property.clone()))
}

fn collect_expr_candidates(
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    offset: ByteOffset,
    out: &mut Vec<Candidate>,
) {
    for (expr_id, entry) in compilation.linked.exprs.iter() {
        if !entry.span.touches(offset) {
            continue;
        }
        collect_in_expr(
            &entry.expr,
            expr_id,
            entry.frame,
            compilation,
            resources,
            offset,
            out,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn collect_in_expr(
    expr: &Expr,
    expr_id: ExprId,
    frame: FrameId,
    compilation: &TemplateCompilation,
    resources: &ResourceIndex,
    offset: ByteOffset,
    out: &mut Vec<Candidate>,
) {
    match expr {
        Expr::AccessScope { name, ancestor, .. }
        | Expr::CallScope { name, ancestor, .. } => {
            if name.span.touches(offset) {
                let resolves = compilation
                    .linked
                    .scope
                    .resolve(frame, &name.name, *ancestor)
                    .is_some();
                if resolves {
                    out.push(Candidate {
                        span: name.span,
                        priority: PRIO_SCOPE_IDENT,
                        entity: CursorEntity::ScopeIdentifier {
                            name: name.name.clone(),
                            frame,
                            expr: expr_id,
                            span: name.span,
                        },
                    });
                } else {
                    out.push(Candidate {
                        span: name.span,
                        priority: PRIO_EXPR_MEMBER,
                        entity: CursorEntity::MemberAccess {
                            path: name.name.clone(),
                            expr: expr_id,
                            span: name.span,
                        },
                    });
                }
            }
        }
        Expr::AccessMember { object, name, .. } | Expr::CallMember { object, name, .. } => {
            if name.span.touches(offset) {
                let path = match path_of(object) {
                    Some(base) => SmolStr::from(format!("{base}.{}", name.name)),
                    None => name.name.clone(),
                };
                out.push(Candidate {
                    span: name.span,
                    priority: PRIO_EXPR_MEMBER,
                    entity: CursorEntity::MemberAccess {
                        path,
                        expr: expr_id,
                        span: name.span,
                    },
                });
            }
        }
        Expr::ValueConverter { name, .. } => {
            if name.span.touches(offset) {
                out.push(Candidate {
                    span: name.span,
                    priority: PRIO_EXPR_MEMBER,
                    entity: CursorEntity::ValueConverter {
                        res: resources.converter(&name.name).map(|(id, _)| id.clone()),
                        name: name.name.clone(),
                        span: name.span,
                    },
                });
            }
        }
        Expr::BindingBehavior { name, .. } => {
            if name.span.touches(offset) {
                out.push(Candidate {
                    span: name.span,
                    priority: PRIO_EXPR_MEMBER,
                    entity: CursorEntity::BindingBehavior {
                        res: resources.behavior(&name.name).map(|(id, _)| id.clone()),
                        name: name.name.clone(),
                        span: name.span,
                    },
                });
            }
        }
        Expr::BindingIdentifier { span, name } => {
            if span.touches(offset) {
                out.push(Candidate {
                    span: *span,
                    priority: PRIO_SCOPE_IDENT,
                    entity: CursorEntity::ScopeIdentifier {
                        name: name.clone(),
                        frame,
                        expr: expr_id,
                        span: *span,
                    },
                });
            }
        }
        _ => {}
    }
    expr.for_each_child(&mut |child| {
        collect_in_expr(child, expr_id, frame, compilation, resources, offset, out);
    });
}

/// The dotted path of a plain access chain, when it is one.
fn path_of(expr: &Expr) -> Option<String> {
    match expr {
        Expr::AccessScope { name, .. } => Some(name.name.to_string()),
        Expr::AccessMember { object, name, .. } => {
            Some(format!("{}.{}", path_of(object)?, name.name))
        }
        Expr::AccessThis { .. } | Expr::AccessBoundary { .. } => Some(String::new()),
        _ => None,
    }
}

fn walk_dom(nodes: &[Node], f: &mut impl FnMut(&Node)) {
    for node in nodes {
        f(node);
        match node {
            Node::Element(el) => walk_dom(&el.children, f),
            Node::Template(t) => walk_dom(&t.children, f),
            _ => {}
        }
    }
}
