//! The scope graph.
//!
//! An append-only arena of frames indexed by `FrameId`; parents are
//! indices, never pointers. The root frame is the view-model scope; each
//! `repeat`-style controller pushes a frame carrying its iteration
//! variables and the framework contextuals.

use aurelia_resources::REPEAT_CONTEXTUALS;
use smol_str::SmolStr;
use source_map::{FrameId, Span};

/// What kind of thing a scope symbol names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeSymbolKind {
    /// The iteration variable of a `repeat.for`.
    Iteration,
    /// A framework contextual (`$index`, `$first`, …).
    Contextual,
    /// A variable destructured from the iteration head.
    Destructured,
    /// A value declared by `<let>`.
    Let,
}

/// One name visible in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSymbol {
    /// The visible name.
    pub name: SmolStr,
    /// Declaration span in the template, absent for contextuals.
    pub span: Option<Span>,
    /// Symbol classification.
    pub kind: ScopeSymbolKind,
}

/// One scope frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFrame {
    /// This frame's id.
    pub id: FrameId,
    /// Parent frame, absent only for the root.
    pub parent: Option<FrameId>,
    /// Symbols declared directly in this frame.
    pub symbols: Vec<ScopeSymbol>,
}

/// The arena of frames for one template compilation.
#[derive(Debug, Clone)]
pub struct ScopeGraph {
    frames: Vec<ScopeFrame>,
}

impl Default for ScopeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeGraph {
    /// A graph containing only the root frame.
    pub fn new() -> Self {
        Self {
            frames: vec![ScopeFrame {
                id: FrameId::ROOT,
                parent: None,
                symbols: Vec::new(),
            }],
        }
    }

    /// Pushes a new frame under `parent`.
    pub fn push_frame(&mut self, parent: FrameId) -> FrameId {
        let id = FrameId(self.frames.len() as u32);
        self.frames.push(ScopeFrame {
            id,
            parent: Some(parent),
            symbols: Vec::new(),
        });
        id
    }

    /// Pushes a `repeat` frame: the declared names plus the contextuals.
    pub fn push_repeat_frame(
        &mut self,
        parent: FrameId,
        declared: impl IntoIterator<Item = (SmolStr, Option<Span>, ScopeSymbolKind)>,
    ) -> FrameId {
        let id = self.push_frame(parent);
        for (name, span, kind) in declared {
            self.add_symbol(id, ScopeSymbol { name, span, kind });
        }
        for contextual in REPEAT_CONTEXTUALS {
            self.add_symbol(
                id,
                ScopeSymbol {
                    name: SmolStr::new_static(contextual),
                    span: None,
                    kind: ScopeSymbolKind::Contextual,
                },
            );
        }
        id
    }

    /// Adds a symbol to a frame.
    pub fn add_symbol(&mut self, frame: FrameId, symbol: ScopeSymbol) {
        self.frames[frame.0 as usize].symbols.push(symbol);
    }

    /// The frame record.
    pub fn frame(&self, id: FrameId) -> &ScopeFrame {
        &self.frames[id.0 as usize]
    }

    /// All frames in creation order.
    pub fn frames(&self) -> &[ScopeFrame] {
        &self.frames
    }

    /// Resolves a scope access: hop `ancestor` frames up, then walk the
    /// remaining parent chain until a symbol named `name` is found.
    /// Closest-enclosing wins; resolution stops at the root.
    pub fn resolve(
        &self,
        from: FrameId,
        name: &str,
        ancestor: u8,
    ) -> Option<(FrameId, &ScopeSymbol)> {
        let mut current = Some(from);
        for _ in 0..ancestor {
            current = self.frame(current?).parent;
        }
        while let Some(id) = current {
            let frame = self.frame(id);
            if let Some(symbol) = frame.symbols.iter().find(|s| s.name == name) {
                return Some((id, symbol));
            }
            current = frame.parent;
        }
        None
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Always false: the root frame exists from construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}
