//! Linked instructions.
//!
//! One closed enum; every variant carries its template span and, for
//! resource-binding kinds, the `SymbolId` of the resolved resource.
//! Exhaustive matches downstream make adding a kind a compile-time event.

use aurelia_resources::{BindingMode, SymbolId};
use smol_str::SmolStr;
use source_map::{ExprId, NodeId, Span};

/// Where an instruction's expression comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprSource {
    /// A full parsed expression.
    Expr(ExprId),
    /// Interpolated text; one id per `${…}` hole.
    Interp(Vec<ExprId>),
    /// A static string, no expression involved.
    Static(SmolStr),
}

/// What a binding writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingTarget {
    /// A declared bindable of a custom element.
    ElementBindable {
        /// The bindable's property name.
        property: SmolStr,
    },
    /// A declared bindable of a custom attribute.
    AttributeBindable {
        /// The bindable's property name.
        property: SmolStr,
    },
    /// A property of a template controller.
    ControllerProp {
        /// The controller property name.
        property: SmolStr,
    },
    /// A `<let>` declaration.
    LetBinding {
        /// The declared name (camelCase).
        name: SmolStr,
    },
    /// Nothing declared matches; the diagnostic path reports it.
    Unknown,
}

/// A linked instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Bind an expression to an element or view-model property.
    PropertyBinding {
        /// Span of the originating attribute (or text node).
        loc: Span,
        /// The expression source.
        from: ExprSource,
        /// The property written to.
        to: SmolStr,
        /// Effective binding mode.
        mode: BindingMode,
        /// Target classification.
        target: BindingTarget,
        /// The owning resource, for bindable targets.
        res: Option<SymbolId>,
    },
    /// Bind an expression to a DOM attribute.
    AttributeBinding {
        /// Span of the originating attribute.
        loc: Span,
        /// The expression source.
        from: ExprSource,
        /// The attribute written to.
        to: SmolStr,
        /// Target classification.
        target: BindingTarget,
        /// The owning resource, for bindable targets.
        res: Option<SymbolId>,
    },
    /// Bind an expression to an inline style property.
    StylePropertyBinding {
        /// Span of the originating attribute.
        loc: Span,
        /// The expression source.
        from: ExprSource,
        /// The style property.
        to: SmolStr,
    },
    /// Attach an event listener.
    ListenerBinding {
        /// Span of the originating attribute.
        loc: Span,
        /// The handler expression.
        from: ExprId,
        /// The event name.
        to: SmolStr,
        /// Listener modifier (`once`, `capture`), when the pattern or
        /// command supplied one.
        modifier: Option<SmolStr>,
    },
    /// Set a static value on a bindable.
    SetProperty {
        /// Span of the originating attribute.
        loc: Span,
        /// The static value.
        value: SmolStr,
        /// The property written to.
        to: SmolStr,
        /// Target classification.
        target: BindingTarget,
        /// The owning resource.
        res: Option<SymbolId>,
    },
    /// Capture a reference to the element or a controller view-model.
    RefBinding {
        /// Span of the originating attribute.
        loc: Span,
        /// The expression receiving the reference.
        from: ExprId,
        /// What is referenced (`element`, `view-model`, …).
        to: SmolStr,
    },
    /// One declaration of a `<let>` element.
    LetBinding {
        /// Span of the originating attribute.
        loc: Span,
        /// The bound expression.
        from: ExprSource,
        /// The declared name (camelCase).
        to: SmolStr,
    },
    /// Hydrate a custom element and bind its bindables.
    HydrateElement {
        /// Span of the element tag.
        loc: Span,
        /// The element definition.
        res: SymbolId,
        /// Bindable-targeting instructions.
        props: Vec<Instruction>,
    },
    /// Hydrate a custom attribute and bind its bindables.
    HydrateAttribute {
        /// Span of the originating attribute.
        loc: Span,
        /// The attribute definition.
        res: SymbolId,
        /// Bindable-targeting instructions.
        props: Vec<Instruction>,
    },
    /// Hydrate a template controller around the element.
    HydrateTemplateController {
        /// Span of the originating attribute.
        loc: Span,
        /// The controller definition.
        res: SymbolId,
        /// Controller property instructions.
        props: Vec<Instruction>,
    },
    /// Hydrate a `<let>` element.
    HydrateLetElement {
        /// Span of the `<let>` element.
        loc: Span,
        /// The individual declarations.
        instructions: Vec<Instruction>,
        /// Mirrors the `to-binding-context` attribute.
        to_binding_context: bool,
    },
}

impl Instruction {
    /// The template span of this instruction.
    pub fn loc(&self) -> Span {
        match self {
            Instruction::PropertyBinding { loc, .. }
            | Instruction::AttributeBinding { loc, .. }
            | Instruction::StylePropertyBinding { loc, .. }
            | Instruction::ListenerBinding { loc, .. }
            | Instruction::SetProperty { loc, .. }
            | Instruction::RefBinding { loc, .. }
            | Instruction::LetBinding { loc, .. }
            | Instruction::HydrateElement { loc, .. }
            | Instruction::HydrateAttribute { loc, .. }
            | Instruction::HydrateTemplateController { loc, .. }
            | Instruction::HydrateLetElement { loc, .. } => *loc,
        }
    }

    /// Expression ids referenced directly by this instruction.
    pub fn expr_ids(&self) -> Vec<ExprId> {
        fn from_source(source: &ExprSource, out: &mut Vec<ExprId>) {
            match source {
                ExprSource::Expr(id) => out.push(*id),
                ExprSource::Interp(ids) => out.extend(ids.iter().copied()),
                ExprSource::Static(_) => {}
            }
        }
        let mut out = Vec::new();
        match self {
            Instruction::PropertyBinding { from, .. }
            | Instruction::AttributeBinding { from, .. }
            | Instruction::StylePropertyBinding { from, .. }
            | Instruction::LetBinding { from, .. } => from_source(from, &mut out),
            Instruction::ListenerBinding { from, .. } | Instruction::RefBinding { from, .. } => {
                out.push(*from)
            }
            Instruction::SetProperty { .. } => {}
            Instruction::HydrateElement { props, .. }
            | Instruction::HydrateAttribute { props, .. }
            | Instruction::HydrateTemplateController { props, .. } => {
                for prop in props {
                    out.extend(prop.expr_ids());
                }
            }
            Instruction::HydrateLetElement { instructions, .. } => {
                for instruction in instructions {
                    out.extend(instruction.expr_ids());
                }
            }
        }
        out
    }
}

/// Semantic summary of a linked DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSem {
    /// An element.
    Element {
        /// Tag name as written.
        tag: SmolStr,
        /// Span of the opening tag name.
        tag_span: Span,
        /// Span of the closing tag name.
        close_tag_span: Option<Span>,
        /// Value span of an `as-element` attribute.
        as_element_value_span: Option<Span>,
        /// Resolved custom element, when the tag (or `as-element`) names
        /// one.
        custom: Option<SymbolId>,
    },
    /// A `<template>` element.
    Template {
        /// Span of the opening tag name.
        tag_span: Span,
        /// Local-template name value span, when declared.
        local_name_span: Option<Span>,
    },
    /// A `<let>` element.
    Let {
        /// Span of the opening tag name.
        tag_span: Span,
    },
    /// A text run.
    Text,
}

/// One linked row: a DOM node that survived linking plus its instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedRow {
    /// The node this row targets.
    pub target: NodeId,
    /// Semantic summary of the node.
    pub node: NodeSem,
    /// Instructions in source order.
    pub instructions: Vec<Instruction>,
}
