//! Canonical file identity.
//!
//! The engine sees the same document under several syntactic spellings
//! (editor URIs, relative paths, mixed separators and casing on
//! case-insensitive filesystems). All of them collapse to one [`FileId`]
//! through [`normalize_uri`], and every span in the pipeline is keyed by
//! that id rather than by the raw string.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A stable, interned identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub u32);

/// A normalized document URI.
pub type DocumentUri = SmolStr;

/// Normalizes a path or URI so that syntactic variants of the same file
/// compare equal: the scheme prefix is dropped, backslashes become forward
/// slashes, `./` segments are removed, and the result is lowercased.
pub fn normalize_uri(raw: &str) -> DocumentUri {
    let raw = raw.strip_prefix("file://").unwrap_or(raw);
    let mut lowered = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        for lower in ch.to_lowercase() {
            lowered.push(lower);
        }
    }
    let absolute = lowered.starts_with('/');
    let joined = lowered
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect::<Vec<_>>()
        .join("/");
    if absolute {
        SmolStr::from(format!("/{joined}"))
    } else {
        SmolStr::from(joined)
    }
}

/// Interns normalized URIs to dense [`FileId`]s.
#[derive(Debug, Default)]
pub struct FileSet {
    by_uri: FxHashMap<DocumentUri, FileId>,
    uris: Vec<DocumentUri>,
}

impl FileSet {
    /// Creates an empty file set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `raw`, normalizing it first. Two spellings of the same path
    /// return the same id.
    pub fn intern(&mut self, raw: &str) -> FileId {
        let uri = normalize_uri(raw);
        if let Some(&id) = self.by_uri.get(&uri) {
            return id;
        }
        let id = FileId(self.uris.len() as u32);
        self.by_uri.insert(uri.clone(), id);
        self.uris.push(uri);
        id
    }

    /// Looks up an already-interned URI without inserting.
    pub fn get(&self, raw: &str) -> Option<FileId> {
        self.by_uri.get(&normalize_uri(raw)).copied()
    }

    /// Returns the normalized URI for an id.
    pub fn uri(&self, id: FileId) -> &DocumentUri {
        &self.uris[id.0 as usize]
    }

    /// Number of interned files.
    pub fn len(&self) -> usize {
        self.uris.len()
    }

    /// Returns true if no files are interned.
    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }
}
