//! Resource definitions and the script-side fact pipeline.
//!
//! This crate owns everything the linker needs to know about *what exists*:
//! the five resource kinds, their bindables, stable `SymbolId`s, the
//! framework built-ins, and the extraction of `FileFacts` from companion
//! TypeScript files via swc. The collated [`ResourceIndex`] is rebuilt
//! whenever any analyzed script or meta-declaration file changes.

mod builtins;
mod def;
mod extract;
mod facts;
mod index;
mod symbol;

pub use builtins::{
    builtin_resources, is_binding_command, BINDING_COMMANDS, LISTENER_COMMANDS,
    NON_RENAMEABLE_NAMES, PROPERTY_COMMANDS, REPEAT_CONTEXTUALS,
};
pub use def::{
    camel_to_dash, dash_to_camel, BindableDef, BindingMode, ResourceDef, ResourceKind,
    SourceLocation, Sourced, SourcedOrigin,
};
pub use extract::extract_file_facts;
pub use facts::{BindableFacts, ClassFacts, FileFacts, MemberFacts, MemberKind, ResourceFacts};
pub use index::ResourceIndex;
pub use symbol::SymbolId;
