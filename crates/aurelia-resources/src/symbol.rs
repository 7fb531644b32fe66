//! Stable symbol identity.
//!
//! A `SymbolId` survives recompilation as long as the thing it names does:
//! resources key on kind + name + normalized file, bindables on their owner
//! plus property, scope locals on file + frame + name. The inner text is an
//! implementation detail; only equality and hashing are contractual.

use crate::ResourceKind;
use smol_str::SmolStr;
use source_map::{normalize_uri, FrameId};

/// An opaque, stable identifier for a nameable thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct SymbolId(SmolStr);

impl SymbolId {
    /// Identity of a resource definition.
    pub fn resource(kind: ResourceKind, name: &str, file: Option<&str>) -> Self {
        let file = file.map(|f| normalize_uri(f)).unwrap_or_default();
        SymbolId(SmolStr::from(format!("res:{}:{name}@{file}", kind.as_str())))
    }

    /// Identity of a bindable on a resource.
    pub fn bindable(owner: &SymbolId, property: &str) -> Self {
        SymbolId(SmolStr::from(format!("{}#{property}", owner.0)))
    }

    /// Identity of a scope-local symbol.
    pub fn local(file: &str, frame: FrameId, name: &str) -> Self {
        SymbolId(SmolStr::from(format!(
            "local:{}:{}:{name}",
            normalize_uri(file),
            frame.0
        )))
    }

    /// The raw key, for diagnostics and test output only.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SymbolId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
