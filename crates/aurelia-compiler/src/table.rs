//! The expression table.
//!
//! Every expression parsed during linking is interned here under a stable
//! `ExprId`, together with its absolute template span, the scope frame it
//! was parsed in, the owning DOM node, and its role. Cross-stage consumers
//! reference expressions only by id.

use aurelia_expr::Expr;
use source_map::{ExprId, FrameId, NodeId, Span};

/// Why an expression was parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprRole {
    /// A property/attribute binding value.
    Property,
    /// A listener handler.
    Listener,
    /// A `repeat.for` iterator head.
    Iterator,
    /// One `${…}` hole of an interpolation.
    InterpolationHole,
    /// A `<let>` declaration value.
    Let,
    /// A `ref` target.
    Ref,
}

/// One table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprEntry {
    /// The parsed tree, spans already absolute.
    pub expr: Expr,
    /// The template span of the parsed text.
    pub span: Span,
    /// The frame the expression was parsed in.
    pub frame: FrameId,
    /// The owning DOM node.
    pub node: NodeId,
    /// Why it exists.
    pub role: ExprRole,
}

/// The table of parsed expressions for one compilation.
#[derive(Debug, Clone, Default)]
pub struct ExprTable {
    entries: Vec<ExprEntry>,
}

impl ExprTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns an expression, returning its id.
    pub fn push(
        &mut self,
        expr: Expr,
        span: Span,
        frame: FrameId,
        node: NodeId,
        role: ExprRole,
    ) -> ExprId {
        let id = ExprId(self.entries.len() as u32);
        self.entries.push(ExprEntry {
            expr,
            span,
            frame,
            node,
            role,
        });
        id
    }

    /// The entry for an id.
    pub fn get(&self, id: ExprId) -> &ExprEntry {
        &self.entries[id.0 as usize]
    }

    /// The parsed expression for an id.
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.get(id).expr
    }

    /// The owning frame for an id.
    pub fn frame_of(&self, id: ExprId) -> FrameId {
        self.get(id).frame
    }

    /// All entries with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ExprId, &ExprEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (ExprId(i as u32), entry))
    }

    /// Number of interned expressions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was interned.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The innermost expression whose span touches `offset`.
    pub fn at_offset(&self, offset: source_map::ByteOffset) -> Option<ExprId> {
        self.iter()
            .filter(|(_, entry)| entry.span.touches(offset))
            .min_by_key(|(_, entry)| entry.span.len())
            .map(|(id, _)| id)
    }
}
