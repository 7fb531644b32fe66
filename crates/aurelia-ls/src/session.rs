//! The session: snapshots, memoized compilations, and invalidation.
//!
//! Document snapshots are copy-on-write: every upsert installs a new
//! snapshot object and readers keep whatever they started with. Derived
//! artifacts are memoized per snapshot tuple (content hash plus resource
//! generation); once produced they are never recomputed, which is what
//! makes repeated queries byte-identical.

use crate::diagnostics::TypecheckDiagnostic;
use aurelia_compiler::{compile, CompileOptions, TemplateCompilation};
use aurelia_expr::ParseOptions;
use aurelia_resources::{extract_file_facts, FileFacts, ResourceDef, ResourceIndex};
use aurelia_template::AttributeParser;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use source_map::{DocumentUri, FileId, FileSet, ProvenanceIndex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// A versioned, immutable document snapshot.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    /// Normalized URI.
    pub uri: DocumentUri,
    /// Host-supplied version; strictly increasing per document.
    pub version: i32,
    /// The text.
    pub text: Arc<str>,
}

/// Cooperative cancellation token, polled between pipeline stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Session-level host-contract violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// The document was never opened.
    #[error("no snapshot for {uri}")]
    MissingSnapshot {
        /// The requested document.
        uri: String,
    },
    /// The command's token was cancelled at a checkpoint.
    #[error("cancelled")]
    Cancelled,
}

impl SessionError {
    /// The stable envelope error code.
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::MissingSnapshot { .. } => "missing-snapshot",
            SessionError::Cancelled => "cancelled",
        }
    }
}

/// Session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Extra global names visible to the expression parser.
    pub extra_globals: Vec<SmolStr>,
    /// Extra attribute patterns: `(template, symbols)` pairs handled as
    /// target+command splits.
    pub extra_patterns: Vec<(String, String)>,
    /// Config-contributed resources.
    pub config_resources: Vec<ResourceDef>,
}

struct MemoizedCompilation {
    key: blake3::Hash,
    compilation: Arc<TemplateCompilation>,
}

/// One editing session over a set of templates and companion scripts.
pub struct Session {
    config: SessionConfig,
    files: FileSet,
    docs: FxHashMap<FileId, DocumentSnapshot>,
    facts: FxHashMap<FileId, FileFacts>,
    resources: ResourceIndex,
    /// Bumped whenever the resource index is rebuilt; part of every memo
    /// key so stale compilations never survive a rebuild.
    resource_generation: u64,
    compilations: FxHashMap<FileId, MemoizedCompilation>,
    provenance: ProvenanceIndex,
    /// External type-checker diagnostics, keyed by template file.
    typecheck: FxHashMap<FileId, Vec<TypecheckDiagnostic>>,
}

impl Session {
    /// Creates a session with the given configuration.
    pub fn new(config: SessionConfig) -> Self {
        let resources = ResourceIndex::build(&[], &config.config_resources);
        Self {
            config,
            files: FileSet::new(),
            docs: FxHashMap::default(),
            facts: FxHashMap::default(),
            resources,
            resource_generation: 0,
            compilations: FxHashMap::default(),
            provenance: ProvenanceIndex::new(),
            typecheck: FxHashMap::default(),
        }
    }

    /// The current resource index build.
    pub fn resources(&self) -> &ResourceIndex {
        &self.resources
    }

    /// A fresh attribute analyzer honoring the session's extra patterns.
    pub fn attribute_parser(&self) -> AttributeParser {
        let mut parser = AttributeParser::default();
        for (template, symbols) in &self.config.extra_patterns {
            // Extra patterns reuse the target+command handler.
            let _ = parser.register_pattern(
                template,
                symbols,
                aurelia_template::handlers::target_command,
            );
        }
        parser
    }

    fn parse_options(&self) -> ParseOptions {
        let mut options = ParseOptions::default();
        for name in &self.config.extra_globals {
            options.globals.insert(name.clone());
        }
        options
    }

    /// Installs or replaces a template snapshot, invalidating its derived
    /// artifacts.
    pub fn upsert_template(&mut self, uri: &str, version: i32, text: &str) -> FileId {
        let file = self.files.intern(uri);
        self.docs.insert(
            file,
            DocumentSnapshot {
                uri: source_map::normalize_uri(uri),
                version,
                text: Arc::from(text),
            },
        );
        self.compilations.remove(&file);
        self.provenance.remove_template(file);
        file
    }

    /// Installs or replaces a companion-script snapshot. Facts are
    /// re-extracted and the resource index rebuilt, which invalidates
    /// every memoized compilation.
    pub fn upsert_script(&mut self, uri: &str, version: i32, text: &str) -> FileId {
        let file = self.files.intern(uri);
        self.docs.insert(
            file,
            DocumentSnapshot {
                uri: source_map::normalize_uri(uri),
                version,
                text: Arc::from(text),
            },
        );
        self.facts.insert(file, extract_file_facts(uri, text));
        self.rebuild_resources();
        file
    }

    /// Installs the external checker's diagnostics for a template.
    pub fn set_typecheck_diagnostics(
        &mut self,
        template: FileId,
        diagnostics: Vec<TypecheckDiagnostic>,
    ) {
        self.typecheck.insert(template, diagnostics);
    }

    /// The stored external diagnostics for a template.
    pub fn typecheck_diagnostics(&self, template: FileId) -> &[TypecheckDiagnostic] {
        self.typecheck
            .get(&template)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn rebuild_resources(&mut self) {
        let mut facts: Vec<&FileFacts> = self.facts.values().collect();
        facts.sort_by(|a, b| a.uri.cmp(&b.uri));
        let owned: Vec<FileFacts> = facts.into_iter().cloned().collect();
        self.resources = ResourceIndex::build(&owned, &self.config.config_resources);
        self.resource_generation += 1;
        self.compilations.clear();
    }

    /// The snapshot for a document, when one exists.
    pub fn snapshot(&self, file: FileId) -> Option<&DocumentSnapshot> {
        self.docs.get(&file)
    }

    /// Resolves a URI to its file id without inserting.
    pub fn file_id(&self, uri: &str) -> Option<FileId> {
        self.files.get(uri)
    }

    /// The provenance index over all compiled overlays.
    pub fn provenance(&self) -> &ProvenanceIndex {
        &self.provenance
    }

    /// The companion view-model class for a template, when its script was
    /// analyzed.
    fn vm_class_for(&self, uri: &str) -> Option<String> {
        let script_uri = companion_script_uri(uri);
        let script_file = self.files.get(&script_uri)?;
        let facts = self.facts.get(&script_file)?;
        facts
            .classes
            .iter()
            .find(|c| c.resource.is_some())
            .or_else(|| facts.classes.first())
            .map(|c| c.name.to_string())
    }

    /// The memoized compilation for a template, computing it on a miss.
    /// Returns the compilation and whether it was served from cache.
    pub fn compilation(
        &mut self,
        file: FileId,
        cancel: &CancelToken,
    ) -> Result<(Arc<TemplateCompilation>, bool), SessionError> {
        let Some(snapshot) = self.docs.get(&file).cloned() else {
            return Err(SessionError::MissingSnapshot {
                uri: self.files.uri(file).to_string(),
            });
        };
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        let mut hasher = blake3::Hasher::new();
        hasher.update(snapshot.text.as_bytes());
        hasher.update(&self.resource_generation.to_le_bytes());
        let key = hasher.finalize();

        if let Some(memo) = self.compilations.get(&file) {
            if memo.key == key {
                return Ok((Arc::clone(&memo.compilation), true));
            }
        }

        let overlay_uri = format!("{}.__au.ts", snapshot.uri);
        let overlay_file = self.files.intern(&overlay_uri);
        let vm_class = self.vm_class_for(&snapshot.uri);
        let mut attr_parser = self.attribute_parser();
        let options = CompileOptions {
            parse: self.parse_options(),
            vm_class,
        };

        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }
        let compilation = Arc::new(compile(
            &snapshot.uri,
            &snapshot.text,
            &self.resources,
            &mut attr_parser,
            file,
            overlay_file,
            &options,
        ));
        if cancel.is_cancelled() {
            return Err(SessionError::Cancelled);
        }

        self.provenance
            .set_document(overlay_file, file, compilation.overlay.edges.clone());
        self.compilations.insert(
            file,
            MemoizedCompilation {
                key,
                compilation: Arc::clone(&compilation),
            },
        );
        Ok((compilation, false))
    }
}

/// `/src/app.html` → `/src/app.ts`.
pub fn companion_script_uri(template_uri: &str) -> String {
    match template_uri.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.ts"),
        None => format!("{template_uri}.ts"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn companion_uri() {
        assert_eq!(companion_script_uri("/src/app.html"), "/src/app.ts");
        assert_eq!(companion_script_uri("noext"), "noext.ts");
    }

    #[test]
    fn compilation_is_memoized() {
        let mut session = Session::new(SessionConfig::default());
        let file = session.upsert_template("/src/app.html", 1, "<div>${x}</div>");
        let cancel = CancelToken::new();
        let (first, cached_first) = session.compilation(file, &cancel).unwrap();
        let (second, cached_second) = session.compilation(file, &cancel).unwrap();
        assert!(!cached_first);
        assert!(cached_second);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn upsert_invalidates() {
        let mut session = Session::new(SessionConfig::default());
        let file = session.upsert_template("/src/app.html", 1, "<div>${x}</div>");
        let cancel = CancelToken::new();
        let (first, _) = session.compilation(file, &cancel).unwrap();
        session.upsert_template("/src/app.html", 2, "<div>${y}</div>");
        let (second, cached) = session.compilation(file, &cancel).unwrap();
        assert!(!cached);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn script_upsert_rebuilds_resources() {
        let mut session = Session::new(SessionConfig::default());
        let template = session.upsert_template(
            "/src/page.html",
            1,
            r#"<my-card title.bind="t"></my-card>"#,
        );
        let cancel = CancelToken::new();
        let (before, _) = session.compilation(template, &cancel).unwrap();
        // The element is unknown before the script arrives.
        assert!(session.resources().element("my-card").is_none());
        let _ = before;

        session.upsert_script(
            "/src/my-card.ts",
            1,
            r#"
@customElement('my-card')
export class MyCard {}
"#,
        );
        assert!(session.resources().element("my-card").is_some());
        let (after, cached) = session.compilation(template, &cancel).unwrap();
        assert!(!cached, "resource rebuild must invalidate compilations");
        let _ = after;
    }

    #[test]
    fn missing_snapshot_is_a_contract_error() {
        let mut session = Session::new(SessionConfig::default());
        let ghost = FileId(999);
        let result = session.compilation(ghost, &CancelToken::new());
        assert!(matches!(result, Err(SessionError::MissingSnapshot { .. })));
    }

    #[test]
    fn cancelled_token_aborts() {
        let mut session = Session::new(SessionConfig::default());
        let file = session.upsert_template("/src/app.html", 1, "<div></div>");
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = session.compilation(file, &cancel);
        assert!(matches!(result, Err(SessionError::Cancelled)));
    }
}
