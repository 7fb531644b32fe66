//! Envelope-wrapped session commands.
//!
//! One method per host command. Each resolves the snapshot, runs the
//! memoized pipeline with cancellation checkpoints, and answers with the
//! standard envelope; host-contract violations become `status: error`
//! with a stable code.

use crate::cursor::{self, CursorHit};
use crate::diagnostics::{map_diagnostics, MappedDiagnostic};
use crate::envelope::{CacheState, Envelope, Meta};
use crate::refs::{build_reference_index, TextReferenceSite};
use crate::rename::{code_actions, rename, CodeAction, RenameError, TextEdit};
use crate::semantic_tokens::{collect_semantic_tokens, SemanticToken};
use crate::session::{CancelToken, Session, SessionError};
use source_map::ByteOffset;
use std::time::Instant;

fn meta(started: Instant, cache: CacheState) -> Meta {
    Meta::timed(started.elapsed().as_micros() as u64, cache)
}

impl Session {
    fn resolve_file(
        &self,
        uri: &str,
    ) -> Result<source_map::FileId, SessionError> {
        self.file_id(uri).ok_or_else(|| SessionError::MissingSnapshot {
            uri: uri.to_string(),
        })
    }

    /// Template diagnostics: compiler plus mapped type-checker channels.
    pub fn diagnostics_command(
        &mut self,
        uri: &str,
        cancel: &CancelToken,
    ) -> Envelope<Vec<MappedDiagnostic>> {
        const COMMAND: &str = "diagnostics";
        let started = Instant::now();
        let file = match self.resolve_file(uri) {
            Ok(file) => file,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let (compilation, cached) = match self.compilation(file, cancel) {
            Ok(result) => result,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let mapped = map_diagnostics(
            &compilation,
            self.provenance(),
            self.typecheck_diagnostics(file),
        );
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        if mapped.gaps.is_empty() {
            Envelope::ok(COMMAND, mapped.diagnostics, meta(started, cache))
        } else {
            Envelope::degraded(COMMAND, mapped.diagnostics, mapped.gaps, meta(started, cache))
        }
    }

    /// The cursor entity at an offset.
    pub fn cursor_command(
        &mut self,
        uri: &str,
        offset: u32,
        cancel: &CancelToken,
    ) -> Envelope<Option<CursorHit>> {
        const COMMAND: &str = "cursorEntity";
        let started = Instant::now();
        let (file, compilation, cached) = match self.prepare(uri, cancel) {
            Ok(parts) => parts,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let source = self
            .snapshot(file)
            .map(|s| s.text.to_string())
            .unwrap_or_default();
        let mut attr_parser = self.attribute_parser();
        let hit = cursor::resolve(
            &compilation,
            self.resources(),
            &mut attr_parser,
            &source,
            ByteOffset::from(offset),
        );
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        Envelope::ok(COMMAND, hit, meta(started, cache))
    }

    /// Rename the entity at an offset.
    pub fn rename_command(
        &mut self,
        uri: &str,
        offset: u32,
        new_name: &str,
        cancel: &CancelToken,
    ) -> Envelope<Vec<TextEdit>> {
        const COMMAND: &str = "rename";
        let started = Instant::now();
        let (file, compilation, cached) = match self.prepare(uri, cancel) {
            Ok(parts) => parts,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let source = self
            .snapshot(file)
            .map(|s| s.text.to_string())
            .unwrap_or_default();
        let mut attr_parser = self.attribute_parser();
        let result = rename(
            &compilation,
            self.resources(),
            &mut attr_parser,
            &source,
            ByteOffset::from(offset),
            new_name,
        );
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        match result {
            Ok(edits) => Envelope::ok(COMMAND, edits, meta(started, cache)),
            Err(RenameError::NoEntity) => Envelope::error(
                COMMAND,
                "no-entity",
                "nothing renameable at this position",
                meta(started, cache),
            ),
            Err(error @ RenameError::NotRenameable { .. }) => Envelope::error(
                COMMAND,
                "not-renameable",
                error.to_string(),
                meta(started, cache),
            ),
        }
    }

    /// Semantic tokens for a template.
    pub fn semantic_tokens_command(
        &mut self,
        uri: &str,
        cancel: &CancelToken,
    ) -> Envelope<Vec<SemanticToken>> {
        const COMMAND: &str = "semanticTokens";
        let started = Instant::now();
        let (_, compilation, cached) = match self.prepare(uri, cancel) {
            Ok(parts) => parts,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let mut attr_parser = self.attribute_parser();
        let tokens = collect_semantic_tokens(&compilation, self.resources(), &mut attr_parser);
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        Envelope::ok(COMMAND, tokens, meta(started, cache))
    }

    /// Quick-fixes for the template's current diagnostics.
    pub fn code_actions_command(
        &mut self,
        uri: &str,
        cancel: &CancelToken,
    ) -> Envelope<Vec<CodeAction>> {
        const COMMAND: &str = "codeActions";
        let started = Instant::now();
        let (_, compilation, cached) = match self.prepare(uri, cancel) {
            Ok(parts) => parts,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let actions = code_actions(&compilation, self.resources());
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        Envelope::ok(COMMAND, actions, meta(started, cache))
    }

    /// All template-side reference sites for the symbol at an offset.
    pub fn references_command(
        &mut self,
        uri: &str,
        offset: u32,
        cancel: &CancelToken,
    ) -> Envelope<Vec<TextReferenceSite>> {
        const COMMAND: &str = "references";
        let started = Instant::now();
        let (file, compilation, cached) = match self.prepare(uri, cancel) {
            Ok(parts) => parts,
            Err(e) => return Envelope::error(COMMAND, e.code(), e.to_string(), meta(started, CacheState::None)),
        };
        let source = self
            .snapshot(file)
            .map(|s| s.text.to_string())
            .unwrap_or_default();
        let mut attr_parser = self.attribute_parser();
        let sites = build_reference_index(
            &compilation,
            self.resources(),
            &mut attr_parser,
            &source,
        );
        let at_cursor = cursor::resolve(
            &compilation,
            self.resources(),
            &mut attr_parser,
            &source,
            ByteOffset::from(offset),
        );
        let filtered: Vec<TextReferenceSite> = match at_cursor {
            Some(hit) => {
                let span = hit.entity.span();
                let symbol = sites
                    .iter()
                    .find(|s| s.span == span)
                    .map(|s| s.symbol.clone());
                match symbol {
                    Some(symbol) => sites.into_iter().filter(|s| s.symbol == symbol).collect(),
                    None => Vec::new(),
                }
            }
            None => Vec::new(),
        };
        let cache = if cached { CacheState::Hit } else { CacheState::Miss };
        Envelope::ok(COMMAND, filtered, meta(started, cache))
    }

    fn prepare(
        &mut self,
        uri: &str,
        cancel: &CancelToken,
    ) -> Result<
        (
            source_map::FileId,
            std::sync::Arc<aurelia_compiler::TemplateCompilation>,
            bool,
        ),
        SessionError,
    > {
        let file = self.resolve_file(uri)?;
        let (compilation, cached) = self.compilation(file, cancel)?;
        Ok((file, compilation, cached))
    }
}
