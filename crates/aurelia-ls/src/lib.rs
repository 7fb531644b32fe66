//! Language-service layer for aurelia-check-rs.
//!
//! Owns the session (versioned snapshots, memoized compilations,
//! invalidation), and projects the compiler's output into language
//! features: cursor-entity resolution, semantic tokens, references,
//! rename, code actions, and the diagnostics channel merge. Every host
//! command answers with the standard envelope.

mod commands;
mod cursor;
mod diagnostics;
mod envelope;
mod refs;
mod rename;
mod semantic_tokens;
mod session;

pub use cursor::{is_renameable, resolve as resolve_cursor, CursorEntity, CursorHit};
pub use diagnostics::{
    map_diagnostics, DiagnosticSource, MappedDiagnostic, MappedDiagnostics, RelatedInfo,
    TypecheckDiagnostic,
};
pub use envelope::{
    CacheState, CommandError, Confidence, Envelope, Epistemic, Meta, Status, SCHEMA_VERSION,
};
pub use refs::{build_reference_index, NameForm, ReferenceKind, TextReferenceSite};
pub use rename::{code_actions, rename, CodeAction, RenameError, TextEdit};
pub use semantic_tokens::{collect_semantic_tokens, SemanticToken, TokenType};
pub use session::{
    companion_script_uri, CancelToken, DocumentSnapshot, Session, SessionConfig, SessionError,
};
