//! Overlay ↔ template provenance.
//!
//! Every compiled template plans an overlay (the generated type-checker
//! input). The planner records one edge per bound expression and one edge
//! per member segment inside it; this module stores those edges per
//! document and answers offset lookups in both directions.

use crate::{ByteOffset, ExprId, FileId, NodeId, Span};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// What a provenance edge maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EdgeKind {
    /// The overlay rendering of a whole bound expression.
    OverlayExpr,
    /// One member segment inside a bound expression.
    OverlayMember,
}

/// The overlay side of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlaySite {
    /// The overlay document.
    pub file: FileId,
    /// The generated span.
    pub span: Span,
}

/// The template side of an edge.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateSite {
    /// The template document.
    pub file: FileId,
    /// The originating span in the template.
    pub span: Span,
    /// The DOM node owning the expression, when known.
    pub node: Option<NodeId>,
    /// The expression this edge belongs to.
    pub expr: Option<ExprId>,
    /// Dotted member path for `OverlayMember` edges (`"customer.name"`).
    pub member_path: Option<SmolStr>,
}

/// A single invertible mapping between an overlay span and a template span.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProvenanceEdge {
    /// Edge classification.
    pub kind: EdgeKind,
    /// Generated (overlay) side.
    pub overlay: OverlaySite,
    /// Source (template) side.
    pub template: TemplateSite,
}

/// Edge list for one overlay/template document pair, indexed for lookup
/// from either side.
#[derive(Debug, Default)]
struct DocumentEdges {
    edges: Vec<ProvenanceEdge>,
    /// Edge indices sorted by overlay start, with a running max of overlay
    /// ends for early cutoff during backward scans.
    by_overlay: Vec<u32>,
    overlay_max_end: Vec<ByteOffset>,
    /// Same, for the template side.
    by_template: Vec<u32>,
    template_max_end: Vec<ByteOffset>,
}

impl DocumentEdges {
    fn new(mut edges: Vec<ProvenanceEdge>) -> Self {
        edges.sort_by_key(|e| (e.overlay.span.start, e.overlay.span.end));
        let mut by_overlay: Vec<u32> = (0..edges.len() as u32).collect();
        by_overlay.sort_by_key(|&i| edges[i as usize].overlay.span.start);
        let mut by_template: Vec<u32> = (0..edges.len() as u32).collect();
        by_template.sort_by_key(|&i| edges[i as usize].template.span.start);

        let overlay_max_end = running_max(&by_overlay, |i| edges[i as usize].overlay.span.end);
        let template_max_end = running_max(&by_template, |i| edges[i as usize].template.span.end);

        Self {
            edges,
            by_overlay,
            overlay_max_end,
            by_template,
            template_max_end,
        }
    }

    /// Innermost edge whose overlay span contains `offset`.
    fn lookup_overlay(&self, offset: ByteOffset) -> Option<&ProvenanceEdge> {
        lookup(
            &self.edges,
            &self.by_overlay,
            &self.overlay_max_end,
            offset,
            |e| e.overlay.span,
        )
    }

    /// Innermost edge whose template span contains `offset`.
    fn lookup_template(&self, offset: ByteOffset) -> Option<&ProvenanceEdge> {
        lookup(
            &self.edges,
            &self.by_template,
            &self.template_max_end,
            offset,
            |e| e.template.span,
        )
    }
}

fn running_max(order: &[u32], end: impl Fn(u32) -> ByteOffset) -> Vec<ByteOffset> {
    let mut maxes = Vec::with_capacity(order.len());
    let mut current = ByteOffset::from(0);
    for &i in order {
        current = current.max(end(i));
        maxes.push(current);
    }
    maxes
}

/// Backward scan from the last edge starting at or before `offset`; the
/// first containing edge has the maximal start, which is the innermost
/// because member edges never overlap each other.
fn lookup<'a>(
    edges: &'a [ProvenanceEdge],
    order: &[u32],
    max_end: &[ByteOffset],
    offset: ByteOffset,
    span_of: impl Fn(&ProvenanceEdge) -> Span,
) -> Option<&'a ProvenanceEdge> {
    let upper = order.partition_point(|&i| span_of(&edges[i as usize]).start <= offset);
    for pos in (0..upper).rev() {
        if max_end[pos] <= offset {
            return None;
        }
        let edge = &edges[order[pos] as usize];
        if span_of(edge).contains(offset) {
            return Some(edge);
        }
    }
    None
}

/// Bidirectional overlay↔template span index across all documents.
#[derive(Debug, Default)]
pub struct ProvenanceIndex {
    /// Keyed by overlay file.
    by_overlay_file: FxHashMap<FileId, DocumentEdges>,
    /// Overlay file for each template file.
    overlay_of: FxHashMap<FileId, FileId>,
}

impl ProvenanceIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or replaces) the edge set for one overlay document. All
    /// edges must share `overlay_file` on the overlay side and
    /// `template_file` on the template side.
    pub fn set_document(
        &mut self,
        overlay_file: FileId,
        template_file: FileId,
        edges: Vec<ProvenanceEdge>,
    ) {
        debug_assert!(edges
            .iter()
            .all(|e| e.overlay.file == overlay_file && e.template.file == template_file));
        self.by_overlay_file
            .insert(overlay_file, DocumentEdges::new(edges));
        self.overlay_of.insert(template_file, overlay_file);
    }

    /// Drops the edges for a template document, if present.
    pub fn remove_template(&mut self, template_file: FileId) {
        if let Some(overlay) = self.overlay_of.remove(&template_file) {
            self.by_overlay_file.remove(&overlay);
        }
    }

    /// Maps a generated (overlay) position back to its template edge.
    pub fn lookup_generated(
        &self,
        overlay_file: FileId,
        offset: ByteOffset,
    ) -> Option<&ProvenanceEdge> {
        self.by_overlay_file.get(&overlay_file)?.lookup_overlay(offset)
    }

    /// Maps a template position forward to its overlay edge.
    pub fn lookup_source(
        &self,
        template_file: FileId,
        offset: ByteOffset,
    ) -> Option<&ProvenanceEdge> {
        let overlay = self.overlay_of.get(&template_file)?;
        self.by_overlay_file.get(overlay)?.lookup_template(offset)
    }

    /// The overlay document generated for a template, if one exists.
    pub fn overlay_for(&self, template_file: FileId) -> Option<FileId> {
        self.overlay_of.get(&template_file).copied()
    }

    /// All edges recorded for an overlay document.
    pub fn edges(&self, overlay_file: FileId) -> impl Iterator<Item = &ProvenanceEdge> {
        self.by_overlay_file
            .get(&overlay_file)
            .into_iter()
            .flat_map(|d| d.edges.iter())
    }
}

/// Accumulates overlay text and provenance edges in lockstep.
///
/// The generated offset advances with every push, so callers never compute
/// overlay spans by hand.
#[derive(Debug)]
pub struct ProvenanceBuilder {
    overlay_file: FileId,
    template_file: FileId,
    text: String,
    edges: Vec<ProvenanceEdge>,
}

impl ProvenanceBuilder {
    /// Starts a builder for one overlay/template pair.
    pub fn new(overlay_file: FileId, template_file: FileId) -> Self {
        Self {
            overlay_file,
            template_file,
            text: String::new(),
            edges: Vec::new(),
        }
    }

    /// Current generated offset.
    pub fn offset(&self) -> ByteOffset {
        ByteOffset::from(self.text.len() as u32)
    }

    /// Appends synthetic text with no template counterpart.
    pub fn push_synthetic(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Appends the overlay rendering of a whole expression.
    pub fn push_expr(&mut self, template_span: Span, node: Option<NodeId>, expr: ExprId, text: &str) {
        let span = self.advance(text);
        self.edges.push(ProvenanceEdge {
            kind: EdgeKind::OverlayExpr,
            overlay: OverlaySite {
                file: self.overlay_file,
                span,
            },
            template: TemplateSite {
                file: self.template_file,
                span: template_span,
                node,
                expr: Some(expr),
                member_path: None,
            },
        });
    }

    /// Records an `OverlayExpr` edge over an already-rendered region, from
    /// `start` (a prior [`Self::offset`]) to the current offset. Used by
    /// renderers that compose an expression out of member pushes.
    pub fn mark_expr(
        &mut self,
        start: ByteOffset,
        template_span: Span,
        node: Option<NodeId>,
        expr: ExprId,
    ) {
        self.edges.push(ProvenanceEdge {
            kind: EdgeKind::OverlayExpr,
            overlay: OverlaySite {
                file: self.overlay_file,
                span: Span::new(start, self.offset()),
            },
            template: TemplateSite {
                file: self.template_file,
                span: template_span,
                node,
                expr: Some(expr),
                member_path: None,
            },
        });
    }

    /// Appends one member segment, mapping it to the precise sub-span of the
    /// template expression.
    pub fn push_member(
        &mut self,
        template_span: Span,
        expr: ExprId,
        member_path: &str,
        text: &str,
    ) {
        let span = self.advance(text);
        self.edges.push(ProvenanceEdge {
            kind: EdgeKind::OverlayMember,
            overlay: OverlaySite {
                file: self.overlay_file,
                span,
            },
            template: TemplateSite {
                file: self.template_file,
                span: template_span,
                node: None,
                expr: Some(expr),
                member_path: Some(SmolStr::from(member_path)),
            },
        });
    }

    fn advance(&mut self, text: &str) -> Span {
        let start = self.offset();
        self.text.push_str(text);
        Span::new(start, self.offset())
    }

    /// Finishes the build, returning the overlay text and its edges.
    pub fn finish(self) -> (String, Vec<ProvenanceEdge>) {
        (self.text, self.edges)
    }
}
