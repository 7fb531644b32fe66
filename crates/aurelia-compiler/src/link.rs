//! The link phase.
//!
//! Walks the parsed DOM together with attribute-name analysis and the
//! resource index, producing linked rows, instructions, the scope graph,
//! and the expression table. Attribute values are parsed per-attribute
//! with rebased spans, so every expression node carries absolute template
//! offsets.

use crate::diag::{CompilerDiagnostic, DiagnosticCode};
use crate::instruction::{BindingTarget, ExprSource, Instruction, LinkedRow, NodeSem};
use crate::scope::{ScopeGraph, ScopeSymbol, ScopeSymbolKind};
use crate::table::{ExprRole, ExprTable};
use aurelia_expr::{parse, Expr, ParseMode, ParseOptions};
use aurelia_resources::{
    camel_to_dash, dash_to_camel, BindableDef, BindingMode, ResourceDef, ResourceIndex,
    ResourceKind, SourceLocation, Sourced, SymbolId, LISTENER_COMMANDS, PROPERTY_COMMANDS,
};
use aurelia_template::{
    Attr, AttrSyntax, AttributeParser, Element, Node, TemplateElement, TemplateMeta,
};
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::{ExprId, FrameId, NodeId, Span};

/// Per-node record kept for queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    /// Full span of the node.
    pub span: Span,
    /// Parent node, absent at the fragment root.
    pub parent: Option<NodeId>,
    /// The frame in which this node's content binds.
    pub frame: FrameId,
}

/// Everything the link phase produces.
#[derive(Debug)]
pub struct LinkedTemplate {
    /// Rows in document order.
    pub rows: Vec<LinkedRow>,
    /// Node arena; `NodeId` indexes it.
    pub nodes: Vec<NodeInfo>,
    /// The scope graph.
    pub scope: ScopeGraph,
    /// The expression table.
    pub exprs: ExprTable,
    /// Diagnostics collected while linking.
    pub diagnostics: Vec<CompilerDiagnostic>,
    /// Local `<template as-custom-element>` definitions.
    pub local_defs: IndexMap<SymbolId, ResourceDef>,
}

/// Native element properties that bind without a bindable declaration even
/// on custom-element hosts.
const NATIVE_PROPERTIES: &[&str] = &[
    "id", "class", "style", "title", "value", "checked", "disabled", "readonly", "placeholder",
    "src", "href", "alt", "name", "type", "tabindex", "textcontent", "innerhtml", "scrolltop",
    "scrollleft", "width", "height",
];

fn is_native_property(target: &str) -> bool {
    NATIVE_PROPERTIES.contains(&target.to_ascii_lowercase().as_str())
}

fn command_mode(command: &str) -> BindingMode {
    match command {
        "one-time" => BindingMode::OneTime,
        "to-view" | "one-way" => BindingMode::ToView,
        "from-view" => BindingMode::FromView,
        "two-way" => BindingMode::TwoWay,
        _ => BindingMode::Default,
    }
}

/// Links a parsed template against the resource index.
pub fn link(
    uri: &str,
    dom: &[Node],
    meta: &TemplateMeta,
    resources: &ResourceIndex,
    attr_parser: &mut AttributeParser,
    parse_options: &ParseOptions,
) -> LinkedTemplate {
    let mut linker = Linker {
        uri,
        resources,
        attr_parser,
        parse_options,
        rows: Vec::new(),
        nodes: Vec::new(),
        scope: ScopeGraph::new(),
        exprs: ExprTable::new(),
        diagnostics: Vec::new(),
        local_defs: IndexMap::new(),
    };
    linker.collect_local_templates(meta);
    linker.walk(dom, None, FrameId::ROOT);
    LinkedTemplate {
        rows: linker.rows,
        nodes: linker.nodes,
        scope: linker.scope,
        exprs: linker.exprs,
        diagnostics: linker.diagnostics,
        local_defs: linker.local_defs,
    }
}

struct Linker<'a> {
    uri: &'a str,
    resources: &'a ResourceIndex,
    attr_parser: &'a mut AttributeParser,
    parse_options: &'a ParseOptions,
    rows: Vec<LinkedRow>,
    nodes: Vec<NodeInfo>,
    scope: ScopeGraph,
    exprs: ExprTable,
    diagnostics: Vec<CompilerDiagnostic>,
    local_defs: IndexMap<SymbolId, ResourceDef>,
}

impl<'a> Linker<'a> {
    // === Local template definitions ===

    fn collect_local_templates(&mut self, meta: &TemplateMeta) {
        for local in &meta.local_templates {
            let name = &local.name.value;
            let id = SymbolId::resource(ResourceKind::CustomElement, name, Some(self.uri));
            if self.local_defs.contains_key(&id) {
                self.diagnostics.push(CompilerDiagnostic::new(
                    DiagnosticCode::DuplicateLocalTemplate,
                    format!("local template '{name}' is declared more than once"),
                    local.name.span,
                ));
                continue;
            }
            let mut bindables = IndexMap::new();
            for bindable in &local.bindables {
                let property = dash_to_camel(&bindable.name.value);
                let mode = bindable
                    .mode
                    .as_ref()
                    .and_then(|m| BindingMode::from_keyword(&m.value))
                    .unwrap_or_default();
                let attribute = bindable
                    .attribute
                    .as_ref()
                    .map(|a| a.value.clone())
                    .unwrap_or_else(|| camel_to_dash(&property));
                bindables.insert(
                    property.clone(),
                    BindableDef {
                        property: Sourced::source(
                            property.clone(),
                            Some(SourceLocation {
                                uri: source_map::normalize_uri(self.uri),
                                span: bindable.name.span,
                            }),
                        ),
                        attribute,
                        mode,
                        primary: false,
                    },
                );
            }
            self.local_defs.insert(
                id,
                ResourceDef {
                    kind: ResourceKind::CustomElement,
                    name: Sourced::source(
                        name.clone(),
                        Some(SourceLocation {
                            uri: source_map::normalize_uri(self.uri),
                            span: local.name.span,
                        }),
                    ),
                    class_name: None,
                    file: Some(source_map::normalize_uri(self.uri)),
                    aliases: Vec::new(),
                    bindables,
                },
            );
        }
    }

    fn resolve_element(&self, tag: &str) -> Option<(SymbolId, ResourceDef)> {
        let id = SymbolId::resource(ResourceKind::CustomElement, tag, Some(self.uri));
        if let Some(def) = self.local_defs.get(&id) {
            return Some((id, def.clone()));
        }
        self.resources
            .element(tag)
            .map(|(id, def)| (id.clone(), def.clone()))
    }

    // === Walk ===

    fn walk(&mut self, nodes: &[Node], parent: Option<NodeId>, frame: FrameId) {
        for node in nodes {
            self.walk_node(node, parent, frame);
        }
    }

    fn alloc_node(&mut self, span: Span, parent: Option<NodeId>, frame: FrameId) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeInfo {
            span,
            parent,
            frame,
        });
        id
    }

    fn walk_node(&mut self, node: &Node, parent: Option<NodeId>, frame: FrameId) {
        match node {
            Node::Text(text) => {
                if !text.text.contains("${") {
                    return;
                }
                let id = self.alloc_node(text.span, parent, frame);
                let holes = self.parse_interp(&text.text, text.span, frame, id);
                if holes.is_empty() {
                    return;
                }
                self.rows.push(LinkedRow {
                    target: id,
                    node: NodeSem::Text,
                    instructions: vec![Instruction::PropertyBinding {
                        loc: text.span,
                        from: ExprSource::Interp(holes),
                        to: SmolStr::new_static("textContent"),
                        mode: BindingMode::ToView,
                        target: BindingTarget::Unknown,
                        res: None,
                    }],
                });
            }
            Node::Comment(_) => {}
            Node::Template(template) => self.walk_template(template, parent, frame),
            Node::Element(el) => {
                let lower = el.tag.to_ascii_lowercase();
                match lower.as_str() {
                    // Meta elements produce no rows; S5 owns them.
                    "import" | "require" | "bindable" => {}
                    "let" => self.link_let(el, parent, frame),
                    _ => self.link_element(el, parent, frame),
                }
            }
        }
    }

    fn walk_template(&mut self, template: &TemplateElement, parent: Option<NodeId>, frame: FrameId) {
        let local_decl = template
            .attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case("as-custom-element"));
        let (content_frame, local_name_span) = match local_decl {
            Some(attr) => {
                // A local element body binds against its own component, not
                // the surrounding scope.
                (self.scope.push_frame(FrameId::ROOT), attr.value_span)
            }
            None => (frame, None),
        };
        let id = self.alloc_node(template.span, parent, content_frame);
        self.rows.push(LinkedRow {
            target: id,
            node: NodeSem::Template {
                tag_span: template.tag_span,
                local_name_span,
            },
            instructions: Vec::new(),
        });
        self.walk(&template.children, Some(id), content_frame);
    }

    // === <let> ===

    fn link_let(&mut self, el: &Element, parent: Option<NodeId>, frame: FrameId) {
        let id = self.alloc_node(el.span, parent, frame);
        let to_binding_context = el
            .attrs
            .iter()
            .any(|a| a.name.eq_ignore_ascii_case("to-binding-context"));
        let mut instructions = Vec::new();
        for attr in &el.attrs {
            if attr.name.eq_ignore_ascii_case("to-binding-context") {
                continue;
            }
            let syntax = self.attr_parser.analyze(&attr.name);
            let to = dash_to_camel(&syntax.target);
            let from = self.parse_attr_source(
                attr,
                syntax.command.as_deref() == Some("bind"),
                frame,
                id,
                ExprRole::Let,
            );
            instructions.push(Instruction::LetBinding {
                loc: attr.span,
                from,
                to: to.clone(),
            });
            let name_span = abs_span(attr.name_span, syntax.target_span);
            self.scope.add_symbol(
                frame,
                ScopeSymbol {
                    name: to,
                    span: name_span,
                    kind: ScopeSymbolKind::Let,
                },
            );
        }
        self.rows.push(LinkedRow {
            target: id,
            node: NodeSem::Let {
                tag_span: el.tag_span,
            },
            instructions: vec![Instruction::HydrateLetElement {
                loc: el.span,
                instructions,
                to_binding_context,
            }],
        });
    }

    // === Elements ===

    fn link_element(&mut self, el: &Element, parent: Option<NodeId>, frame: FrameId) {
        let id = self.alloc_node(el.span, parent, frame);

        let syntaxes: Vec<AttrSyntax> = el
            .attrs
            .iter()
            .map(|attr| self.attr_parser.analyze(&attr.name))
            .collect();

        // Controllers first: they restructure scope for everything else on
        // and under this element.
        let mut content_frame = frame;
        let mut controller_instructions = Vec::new();
        let mut is_controller_attr = vec![false; el.attrs.len()];
        for (i, (attr, syntax)) in el.attrs.iter().zip(&syntaxes).enumerate() {
            let Some((controller_id, controller)) = self
                .resources
                .controller(&syntax.target)
                .map(|(id, def)| (id.clone(), def.clone()))
            else {
                continue;
            };
            is_controller_attr[i] = true;
            let value_frame = content_frame;
            let instruction = self.link_controller(
                attr,
                syntax,
                &controller_id,
                &controller,
                id,
                value_frame,
                &mut content_frame,
            );
            controller_instructions.push(instruction);
        }

        // Custom element resolution, honoring `as-element`.
        let as_element_attr = el
            .attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case("as-element"));
        let effective_tag = as_element_attr
            .and_then(|a| a.value.as_deref())
            .unwrap_or(el.tag.as_str());
        let custom = self.resolve_element(effective_tag);

        let mut element_props = Vec::new();
        let mut row_instructions = controller_instructions;
        for (i, (attr, syntax)) in el.attrs.iter().zip(&syntaxes).enumerate() {
            if is_controller_attr[i] {
                continue;
            }
            if attr.name.eq_ignore_ascii_case("as-element") {
                continue;
            }
            if let Some(linked) = self.link_plain_attr(attr, syntax, id, content_frame, &custom) {
                if linked.element_prop {
                    element_props.push(linked.instruction);
                } else {
                    row_instructions.push(linked.instruction);
                }
            }
        }

        if let Some((res_id, _)) = &custom {
            row_instructions.push(Instruction::HydrateElement {
                loc: el.tag_span,
                res: res_id.clone(),
                props: element_props,
            });
        } else {
            // Without a definition there is nothing to hydrate; any
            // props-classified instructions stay on the row.
            row_instructions.extend(element_props);
        }

        self.rows.push(LinkedRow {
            target: id,
            node: NodeSem::Element {
                tag: el.tag.clone(),
                tag_span: el.tag_span,
                close_tag_span: el.close_tag_span,
                as_element_value_span: as_element_attr.and_then(|a| a.value_span),
                custom: custom.as_ref().map(|(id, _)| id.clone()),
            },
            instructions: row_instructions,
        });

        self.walk(&el.children, Some(id), content_frame);
    }

    #[allow(clippy::too_many_arguments)]
    fn link_controller(
        &mut self,
        attr: &Attr,
        syntax: &AttrSyntax,
        controller_id: &SymbolId,
        controller: &ResourceDef,
        node: NodeId,
        value_frame: FrameId,
        content_frame: &mut FrameId,
    ) -> Instruction {
        let primary = controller
            .primary_bindable()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| SmolStr::new_static("value"));

        let mut props = Vec::new();
        if syntax.command.as_deref() == Some("for") {
            // Iterator heads parse in the surrounding frame; the declared
            // names live in the pushed frame.
            if let Some(expr_id) =
                self.parse_value(attr, ParseMode::IsIterator, value_frame, node, ExprRole::Iterator)
            {
                let entry_expr = self.exprs.expr(expr_id).clone();
                match &entry_expr {
                    Expr::ForOfStatement { declaration, .. } => {
                        let declared = declared_names(declaration);
                        *content_frame = self.scope.push_repeat_frame(value_frame, declared);
                    }
                    _ => {
                        self.diagnostics.push(CompilerDiagnostic::new(
                            DiagnosticCode::InvalidIteratorHead,
                            format!(
                                "'{}' requires a 'declaration of iterable' head",
                                attr.name
                            ),
                            attr.value_span.unwrap_or(attr.span),
                        ));
                    }
                }
                props.push(Instruction::PropertyBinding {
                    loc: attr.span,
                    from: ExprSource::Expr(expr_id),
                    to: primary.clone(),
                    mode: BindingMode::ToView,
                    target: BindingTarget::ControllerProp { property: primary },
                    res: Some(controller_id.clone()),
                });
            }
        } else if attr.value.is_some() {
            let source = self.parse_attr_source(
                attr,
                syntax.command.is_some(),
                value_frame,
                node,
                ExprRole::Property,
            );
            props.push(Instruction::PropertyBinding {
                loc: attr.span,
                from: source,
                to: primary.clone(),
                mode: syntax
                    .command
                    .as_deref()
                    .map(command_mode)
                    .unwrap_or_default(),
                target: BindingTarget::ControllerProp { property: primary },
                res: Some(controller_id.clone()),
            });
        }

        Instruction::HydrateTemplateController {
            loc: attr.span,
            res: controller_id.clone(),
            props,
        }
    }

    // === Plain attributes ===

    fn link_plain_attr(
        &mut self,
        attr: &Attr,
        syntax: &AttrSyntax,
        node: NodeId,
        frame: FrameId,
        custom: &Option<(SymbolId, ResourceDef)>,
    ) -> Option<LinkedAttr> {
        // Custom attributes own their targets outright.
        if let Some((attr_id, attr_def)) = self
            .resources
            .attribute(&syntax.target)
            .map(|(id, def)| (id.clone(), def.clone()))
        {
            return Some(LinkedAttr::row(
                self.link_custom_attribute(attr, syntax, &attr_id, &attr_def, node, frame),
            ));
        }

        // References.
        if syntax.raw == "ref" || syntax.command.as_deref() == Some("ref") {
            let expr_id =
                self.parse_value(attr, ParseMode::IsProperty, frame, node, ExprRole::Ref)?;
            let to = if syntax.command.as_deref() == Some("ref") {
                syntax.target.clone()
            } else {
                SmolStr::new_static("element")
            };
            return Some(LinkedAttr::row(Instruction::RefBinding {
                loc: attr.span,
                from: expr_id,
                to,
            }));
        }

        match syntax.command.as_deref() {
            Some(command) if LISTENER_COMMANDS.contains(&command) || command == "trigger" => {
                let expr_id =
                    self.parse_value(attr, ParseMode::IsFunction, frame, node, ExprRole::Listener)?;
                let modifier = syntax.parts.get(2).map(|p| p.text.clone()).or_else(|| {
                    // `@click:once` keeps the modifier in the second part.
                    (syntax.pattern.as_deref() == Some("@PART:PART"))
                        .then(|| syntax.parts.get(1).map(|p| p.text.clone()))
                        .flatten()
                });
                Some(LinkedAttr::row(Instruction::ListenerBinding {
                    loc: attr.span,
                    from: expr_id,
                    to: syntax.target.clone(),
                    modifier,
                }))
            }
            Some("for") => {
                self.diagnostics.push(CompilerDiagnostic::new(
                    DiagnosticCode::ForOnNonController,
                    format!("'{}' is not a template controller", syntax.target),
                    abs_span(attr.name_span, syntax.target_span).unwrap_or(attr.name_span),
                ));
                None
            }
            Some("style") => {
                let expr_id =
                    self.parse_value(attr, ParseMode::IsProperty, frame, node, ExprRole::Property)?;
                Some(LinkedAttr::row(Instruction::StylePropertyBinding {
                    loc: attr.span,
                    from: ExprSource::Expr(expr_id),
                    to: syntax.target.clone(),
                }))
            }
            Some(command) if PROPERTY_COMMANDS.contains(&command) => {
                self.link_property_command(attr, syntax, command, node, frame, custom)
            }
            Some(command) => {
                if !aurelia_resources::is_binding_command(command) {
                    self.diagnostics.push(CompilerDiagnostic::new(
                        DiagnosticCode::UnknownCommand,
                        format!("unknown binding command '{command}'"),
                        abs_span(attr.name_span, syntax.command_span).unwrap_or(attr.name_span),
                    ));
                }
                None
            }
            None => self.link_commandless(attr, syntax, node, frame, custom),
        }
    }

    fn link_custom_attribute(
        &mut self,
        attr: &Attr,
        syntax: &AttrSyntax,
        attr_id: &SymbolId,
        attr_def: &ResourceDef,
        node: NodeId,
        frame: FrameId,
    ) -> Instruction {
        let primary = attr_def
            .primary_bindable()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| SmolStr::new_static("value"));
        let mut props = Vec::new();
        if attr.value.is_some() {
            let source = self.parse_attr_source(
                attr,
                syntax.command.is_some(),
                frame,
                node,
                ExprRole::Property,
            );
            match source {
                ExprSource::Static(value) => props.push(Instruction::SetProperty {
                    loc: attr.span,
                    value,
                    to: primary.clone(),
                    target: BindingTarget::AttributeBindable {
                        property: primary.clone(),
                    },
                    res: Some(attr_id.clone()),
                }),
                source => props.push(Instruction::PropertyBinding {
                    loc: attr.span,
                    from: source,
                    to: primary.clone(),
                    mode: syntax
                        .command
                        .as_deref()
                        .map(command_mode)
                        .unwrap_or_default(),
                    target: BindingTarget::AttributeBindable { property: primary },
                    res: Some(attr_id.clone()),
                }),
            }
        }
        Instruction::HydrateAttribute {
            loc: attr.span,
            res: attr_id.clone(),
            props,
        }
    }

    fn link_property_command(
        &mut self,
        attr: &Attr,
        syntax: &AttrSyntax,
        command: &str,
        node: NodeId,
        frame: FrameId,
        custom: &Option<(SymbolId, ResourceDef)>,
    ) -> Option<LinkedAttr> {
        let expr_id =
            self.parse_value(attr, ParseMode::IsProperty, frame, node, ExprRole::Property)?;
        let from = ExprSource::Expr(expr_id);
        let mode = command_mode(command);

        if let Some((res_id, def)) = custom {
            if let Some((property, bindable)) = def.bindable_for_target(&syntax.target) {
                let effective_mode = if mode == BindingMode::Default {
                    bindable.mode
                } else {
                    mode
                };
                return Some(LinkedAttr::element_prop(Instruction::PropertyBinding {
                    loc: attr.span,
                    from,
                    to: property.clone(),
                    mode: effective_mode,
                    target: BindingTarget::ElementBindable {
                        property: property.clone(),
                    },
                    res: Some(res_id.clone()),
                }));
            }
            if !is_native_property(&syntax.target) && !syntax.target.contains('-') {
                self.diagnostics.push(CompilerDiagnostic::new(
                    DiagnosticCode::UnknownBindable,
                    format!(
                        "'{}' does not declare a bindable '{}'",
                        def.name.value, syntax.target
                    ),
                    abs_span(attr.name_span, syntax.target_span).unwrap_or(attr.name_span),
                ));
                return Some(LinkedAttr::row(Instruction::PropertyBinding {
                    loc: attr.span,
                    from,
                    to: syntax.target.clone(),
                    mode,
                    target: BindingTarget::Unknown,
                    res: Some(res_id.clone()),
                }));
            }
        }

        if command == "attr" || syntax.target.contains('-') {
            return Some(LinkedAttr::row(Instruction::AttributeBinding {
                loc: attr.span,
                from,
                to: syntax.target.clone(),
                target: BindingTarget::Unknown,
                res: None,
            }));
        }
        Some(LinkedAttr::row(Instruction::PropertyBinding {
            loc: attr.span,
            from,
            to: dash_to_camel(&syntax.target),
            mode,
            target: BindingTarget::Unknown,
            res: None,
        }))
    }

    fn link_commandless(
        &mut self,
        attr: &Attr,
        syntax: &AttrSyntax,
        node: NodeId,
        frame: FrameId,
        custom: &Option<(SymbolId, ResourceDef)>,
    ) -> Option<LinkedAttr> {
        let value = attr.value.as_deref()?;
        let bindable = custom
            .as_ref()
            .and_then(|(id, def)| {
                def.bindable_for_target(&syntax.target)
                    .map(|(property, _)| (id.clone(), property.clone()))
            });

        if value.contains("${") {
            let holes = self.parse_interp(value, attr.value_span?, frame, node);
            if holes.is_empty() {
                return None;
            }
            return Some(match bindable {
                Some((res_id, property)) => LinkedAttr::element_prop(Instruction::PropertyBinding {
                    loc: attr.span,
                    from: ExprSource::Interp(holes),
                    to: property.clone(),
                    mode: BindingMode::ToView,
                    target: BindingTarget::ElementBindable { property },
                    res: Some(res_id),
                }),
                None => LinkedAttr::row(Instruction::AttributeBinding {
                    loc: attr.span,
                    from: ExprSource::Interp(holes),
                    to: syntax.target.clone(),
                    target: BindingTarget::Unknown,
                    res: None,
                }),
            });
        }

        // Static value: only a bindable target demands an instruction.
        let (res_id, property) = bindable?;
        Some(LinkedAttr::element_prop(Instruction::SetProperty {
            loc: attr.span,
            value: SmolStr::from(value),
            to: property.clone(),
            target: BindingTarget::ElementBindable { property },
            res: Some(res_id),
        }))
    }

    // === Expression parsing ===

    /// Parses an attribute value with the span rebased to the value region,
    /// interning the result. Bad nodes and unknown converter/behavior names
    /// become diagnostics.
    fn parse_value(
        &mut self,
        attr: &Attr,
        mode: ParseMode,
        frame: FrameId,
        node: NodeId,
        role: ExprRole,
    ) -> Option<ExprId> {
        let value = attr.value.as_deref()?;
        let value_span = attr.value_span?;
        let expr = parse(value, mode, &self.parse_options.rebased(value_span));
        self.check_expression(&expr);
        Some(self.exprs.push(expr, value_span, frame, node, role))
    }

    /// A command means a full expression; no command means interpolation or
    /// a static string.
    fn parse_attr_source(
        &mut self,
        attr: &Attr,
        has_command: bool,
        frame: FrameId,
        node: NodeId,
        role: ExprRole,
    ) -> ExprSource {
        let value = attr.value.as_deref().unwrap_or("");
        if has_command {
            match self.parse_value(attr, ParseMode::IsProperty, frame, node, role) {
                Some(id) => ExprSource::Expr(id),
                None => ExprSource::Static(SmolStr::default()),
            }
        } else if value.contains("${") {
            match attr.value_span {
                Some(span) => ExprSource::Interp(self.parse_interp(value, span, frame, node)),
                None => ExprSource::Static(SmolStr::from(value)),
            }
        } else {
            ExprSource::Static(SmolStr::from(value))
        }
    }

    /// Parses interpolated text and interns each hole expression.
    fn parse_interp(
        &mut self,
        text: &str,
        span: Span,
        frame: FrameId,
        node: NodeId,
    ) -> Vec<ExprId> {
        let parsed = parse(
            text,
            ParseMode::Interpolation,
            &self.parse_options.rebased(span),
        );
        let Expr::Interpolation { expressions, .. } = parsed else {
            return Vec::new();
        };
        expressions
            .into_iter()
            .map(|expr| {
                self.check_expression(&expr);
                let expr_span = expr.span();
                self.exprs
                    .push(expr, expr_span, frame, node, ExprRole::InterpolationHole)
            })
            .collect()
    }

    /// Reports bad sub-expressions and unresolved converter/behavior names.
    fn check_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Bad(bad) => {
                self.diagnostics.push(CompilerDiagnostic::new(
                    DiagnosticCode::BadExpression,
                    bad.message.to_string(),
                    bad.span,
                ));
            }
            Expr::ValueConverter { name, .. } => {
                if self.resources.converter(&name.name).is_none() {
                    self.diagnostics.push(CompilerDiagnostic::new(
                        DiagnosticCode::UnknownConverter,
                        format!("unknown value converter '{}'", name.name),
                        name.span,
                    ));
                }
            }
            Expr::BindingBehavior { name, .. } => {
                if self.resources.behavior(&name.name).is_none() {
                    self.diagnostics.push(CompilerDiagnostic::new(
                        DiagnosticCode::UnknownBehavior,
                        format!("unknown binding behavior '{}'", name.name),
                        name.span,
                    ));
                }
            }
            _ => {}
        }
        expr.for_each_child(&mut |child| self.check_expression(child));
    }
}

struct LinkedAttr {
    instruction: Instruction,
    element_prop: bool,
}

impl LinkedAttr {
    fn row(instruction: Instruction) -> Self {
        Self {
            instruction,
            element_prop: false,
        }
    }

    fn element_prop(instruction: Instruction) -> Self {
        Self {
            instruction,
            element_prop: true,
        }
    }
}

/// Names declared by a for-of declaration, with their spans.
fn declared_names(declaration: &Expr) -> Vec<(SmolStr, Option<Span>, ScopeSymbolKind)> {
    let mut names = Vec::new();
    collect_declared(declaration, ScopeSymbolKind::Iteration, &mut names);
    names
}

fn collect_declared(
    expr: &Expr,
    kind: ScopeSymbolKind,
    out: &mut Vec<(SmolStr, Option<Span>, ScopeSymbolKind)>,
) {
    match expr {
        Expr::BindingIdentifier { span, name } => {
            out.push((name.clone(), Some(*span), kind));
        }
        Expr::ArrayBindingPattern { elements, .. } => {
            for element in elements {
                collect_declared(element, ScopeSymbolKind::Destructured, out);
            }
        }
        Expr::ObjectBindingPattern { entries, .. } => {
            for entry in entries {
                collect_declared(&entry.value, ScopeSymbolKind::Destructured, out);
            }
        }
        Expr::BindingPatternDefault { target, .. } => {
            collect_declared(target, kind, out);
        }
        _ => {}
    }
}

/// Shifts a name-relative span to an absolute template span.
fn abs_span(name_span: Span, relative: Option<Span>) -> Option<Span> {
    relative.map(|r| r.rebase(name_span.start))
}
