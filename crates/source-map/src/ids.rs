//! Small stable identifiers shared across pipeline stages.
//!
//! Cross-stage references are spans plus these ids, never node pointers;
//! the arenas behind them are append-only per compilation.

/// Identifies a parsed expression within one template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExprId(pub u32);

/// Identifies a DOM node within one template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

/// Identifies a scope frame within one template compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FrameId(pub u32);

impl FrameId {
    /// The root frame of every template compilation.
    pub const ROOT: FrameId = FrameId(0);
}
