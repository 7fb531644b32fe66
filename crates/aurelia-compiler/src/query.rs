//! The query facade.
//!
//! Read-only lookups over one linked template, used by every language
//! feature: innermost node/expression at an offset, the controller in
//! effect, bindables of a resolved element, and the rough expected type of
//! an expression.

use crate::instruction::{Instruction, LinkedRow, NodeSem};
use crate::link::LinkedTemplate;
use crate::table::ExprRole;
use aurelia_resources::{BindableDef, ResourceDef, ResourceIndex, SymbolId};
use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::{ByteOffset, ExprId, NodeId};

/// What kind of value an expression is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    /// An iterable (a `repeat.for` head).
    Iterable,
    /// A handler (listener bindings).
    Handler,
    /// An ordinary value.
    Value,
}

/// Read-only queries over a linked template plus the resource index.
pub struct QueryFacade<'a> {
    linked: &'a LinkedTemplate,
    resources: &'a ResourceIndex,
}

impl<'a> QueryFacade<'a> {
    /// Creates the facade.
    pub fn new(linked: &'a LinkedTemplate, resources: &'a ResourceIndex) -> Self {
        Self { linked, resources }
    }

    /// The innermost node whose span contains `offset`.
    pub fn node_at(&self, offset: ByteOffset) -> Option<NodeId> {
        self.linked
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, info)| info.span.touches(offset))
            .min_by_key(|(_, info)| info.span.len())
            .map(|(i, _)| NodeId(i as u32))
    }

    /// The innermost expression whose span touches `offset`.
    pub fn expr_at(&self, offset: ByteOffset) -> Option<ExprId> {
        self.linked.exprs.at_offset(offset)
    }

    /// The linked row for a node, when one was produced.
    pub fn row_for(&self, node: NodeId) -> Option<&LinkedRow> {
        self.linked.rows.iter().find(|row| row.target == node)
    }

    /// The template controller whose attribute contains `offset`, walking
    /// outward from the innermost node.
    pub fn controller_at(&self, offset: ByteOffset) -> Option<(&SymbolId, &Instruction)> {
        let mut node = self.node_at(offset);
        while let Some(id) = node {
            if let Some(row) = self.row_for(id) {
                for instruction in &row.instructions {
                    if let Instruction::HydrateTemplateController { loc, res, .. } = instruction {
                        if loc.touches(offset) {
                            return Some((res, instruction));
                        }
                    }
                }
            }
            node = self.linked.nodes[id.0 as usize].parent;
        }
        None
    }

    /// The resolved definition of a custom element or local template.
    pub fn definition_of(&self, res: &SymbolId) -> Option<&ResourceDef> {
        self.linked
            .local_defs
            .get(res)
            .or_else(|| self.resources.get(res))
    }

    /// The bindables of the custom element resolved for `node`.
    pub fn bindables_for(&self, node: NodeId) -> Option<&IndexMap<SmolStr, BindableDef>> {
        let row = self.row_for(node)?;
        let NodeSem::Element {
            custom: Some(res), ..
        } = &row.node
        else {
            return None;
        };
        self.definition_of(res).map(|def| &def.bindables)
    }

    /// The rough expected type of an expression, from its role.
    pub fn expected_type_of(&self, expr: ExprId) -> ExpectedType {
        match self.linked.exprs.get(expr).role {
            ExprRole::Iterator => ExpectedType::Iterable,
            ExprRole::Listener => ExpectedType::Handler,
            ExprRole::Property
            | ExprRole::InterpolationHole
            | ExprRole::Let
            | ExprRole::Ref => ExpectedType::Value,
        }
    }
}
