//! Source position tracking for the Aurelia template engine.
//!
//! Everything downstream of the parsers speaks in byte spans keyed by
//! canonical [`FileId`]s. This crate provides the span types, the file
//! interner, line/column conversion, the small stable ids shared across
//! pipeline stages, and the overlay↔template provenance index.

mod file;
mod ids;
mod line_index;
mod provenance;
mod span;

pub use file::{normalize_uri, DocumentUri, FileId, FileSet};
pub use ids::{ExprId, FrameId, NodeId};
pub use line_index::{LineCol, LineIndex};
pub use provenance::{
    EdgeKind, OverlaySite, ProvenanceBuilder, ProvenanceEdge, ProvenanceIndex, TemplateSite,
};
pub use span::{ByteOffset, Span};
