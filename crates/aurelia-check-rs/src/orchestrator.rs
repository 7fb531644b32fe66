//! Main orchestration logic.
//!
//! Discovers templates and their companion scripts, feeds them into one
//! language-service session, and prints the merged diagnostics. Reading
//! files happens in parallel; the session itself is single-threaded and
//! processes documents in deterministic path order.

use crate::cli::Args;
use crate::config::ProjectConfig;
use crate::output::{CheckSummary, FormattedDiagnostic, Formatter};
use aurelia_ls::{
    companion_script_uri, CancelToken, Session, SessionConfig, Status, TypecheckDiagnostic,
};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use smol_str::SmolStr;
use std::fs;
use thiserror::Error;
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Watch error.
    #[error("watch error: {0}")]
    WatchFailed(String),

    /// The external diagnostics file was unreadable.
    #[error("failed to read typecheck diagnostics: {0}")]
    TypecheckReadFailed(String),
}

/// Runs the check on all files.
pub async fn run(args: Args) -> Result<CheckSummary, OrchestratorError> {
    let workspace = if args.workspace.is_relative() {
        std::env::current_dir()
            .map(|p| Utf8PathBuf::try_from(p).unwrap_or_default())
            .unwrap_or_default()
            .join(&args.workspace)
    } else {
        args.workspace.clone()
    };

    let config = ProjectConfig::load(&workspace);
    let ignore_set = build_ignore_set(&args.ignore)?;
    let templates = find_templates(&workspace, &config, &ignore_set);

    if args.watch {
        run_watch_mode(&args, &workspace, &config).await
    } else {
        run_single_check(&args, &workspace, &config, templates).await
    }
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    for pattern in ["**/node_modules/**", "**/dist/**", "**/.aurelia-check-rs/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

fn find_templates(
    workspace: &Utf8Path,
    config: &ProjectConfig,
    ignore_set: &GlobSet,
) -> Vec<Utf8PathBuf> {
    let extensions = config.template_extensions();
    let mut templates: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| {
            let file_name = p.file_name().unwrap_or("");
            extensions.iter().any(|ext| file_name.ends_with(ext))
        })
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p);
            !ignore_set.is_match(relative.as_str())
        })
        .collect();
    // Deterministic processing order.
    templates.sort();
    templates
}

struct LoadedTemplate {
    path: Utf8PathBuf,
    text: String,
    script: Option<(Utf8PathBuf, String)>,
}

/// Reads templates and their companion scripts off disk in parallel.
fn load_templates(templates: &[Utf8PathBuf]) -> Vec<LoadedTemplate> {
    let mut loaded: Vec<LoadedTemplate> = templates
        .par_iter()
        .filter_map(|path| {
            let text = match fs::read_to_string(path) {
                Ok(text) => text,
                Err(e) => {
                    eprintln!("Failed to read {path}: {e}");
                    return None;
                }
            };
            let script_path = Utf8PathBuf::from(companion_script_uri(path.as_str()));
            let script = fs::read_to_string(&script_path)
                .ok()
                .map(|text| (script_path, text));
            Some(LoadedTemplate {
                path: path.clone(),
                text,
                script,
            })
        })
        .collect();
    loaded.sort_by(|a, b| a.path.cmp(&b.path));
    loaded
}

/// Loads externally produced overlay diagnostics, grouped per template by
/// stripping the overlay suffix from each entry's URI.
fn load_typecheck_diagnostics(
    path: &Utf8Path,
) -> Result<Vec<TypecheckDiagnostic>, OrchestratorError> {
    let text =
        fs::read_to_string(path).map_err(|e| OrchestratorError::TypecheckReadFailed(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| OrchestratorError::TypecheckReadFailed(e.to_string()))
}

async fn run_single_check(
    args: &Args,
    workspace: &Utf8Path,
    config: &ProjectConfig,
    templates: Vec<Utf8PathBuf>,
) -> Result<CheckSummary, OrchestratorError> {
    let formatter = Formatter::new(args.output);
    let output_json = matches!(args.output, crate::cli::OutputFormat::Json);
    let cancel = CancelToken::new();

    let mut session = Session::new(SessionConfig {
        extra_globals: config.global_names.iter().map(SmolStr::from).collect(),
        extra_patterns: config
            .patterns
            .iter()
            .map(|p| (p.pattern.clone(), p.symbols.clone()))
            .collect(),
        config_resources: config.resource_defs(),
    });

    let loaded = load_templates(&templates);

    // Scripts first so the resource index is complete before any template
    // compiles.
    for template in &loaded {
        if let Some((path, text)) = &template.script {
            session.upsert_script(path.as_str(), 1, text);
        }
    }
    let mut files = Vec::with_capacity(loaded.len());
    for template in &loaded {
        let file = session.upsert_template(template.path.as_str(), 1, &template.text);
        files.push(file);
    }

    // External checker results, when supplied.
    if let Some(path) = &args.typecheck_diagnostics {
        let diagnostics = load_typecheck_diagnostics(path)?;
        for (template, file) in loaded.iter().zip(&files) {
            let overlay_uri = format!(
                "{}.__au.ts",
                source_map::normalize_uri(template.path.as_str())
            );
            let for_template: Vec<TypecheckDiagnostic> = diagnostics
                .iter()
                .filter(|d| source_map::normalize_uri(&d.uri) == overlay_uri.as_str())
                .cloned()
                .collect();
            if !for_template.is_empty() {
                session.set_typecheck_diagnostics(*file, for_template);
            }
        }
    }

    let mut error_count = 0usize;
    let mut warning_count = 0usize;
    let mut json_output: Vec<FormattedDiagnostic> = Vec::new();

    for (template, file) in loaded.iter().zip(&files) {
        if args.emit_overlay {
            if let Ok((compilation, _)) = session.compilation(*file, &cancel) {
                let relative = template.path.strip_prefix(workspace).unwrap_or(&template.path);
                eprintln!("=== Overlay for {relative} ===\n{}", compilation.overlay.text);
            }
        }

        let envelope = session.diagnostics_command(template.path.as_str(), &cancel);
        if envelope.status == Status::Error {
            for error in &envelope.errors {
                eprintln!("{}: {}", error.code, error.message);
            }
            continue;
        }
        for gap in &envelope.epistemic.gaps {
            eprintln!("Warning: {gap}");
        }

        let mut diagnostics = envelope.result.unwrap_or_default();
        diagnostics.retain(|d| match d.source {
            aurelia_ls::DiagnosticSource::Compiler => args.include_compiler(),
            aurelia_ls::DiagnosticSource::Typecheck | aurelia_ls::DiagnosticSource::Typescript => {
                args.include_typecheck()
            }
        });
        diagnostics.retain(|d| include_severity(d.severity, args.threshold));
        if diagnostics.is_empty() {
            continue;
        }

        for diag in &diagnostics {
            match diag.severity {
                aurelia_compiler::Severity::Error => error_count += 1,
                aurelia_compiler::Severity::Warning => warning_count += 1,
                aurelia_compiler::Severity::Info => {}
            }
        }

        let relative = template.path.strip_prefix(workspace).unwrap_or(&template.path);
        if output_json {
            json_output.extend(Formatter::format_json_diagnostics(
                &diagnostics,
                relative,
                &template.text,
            ));
        } else {
            print!("{}", formatter.format(&diagnostics, relative, &template.text));
        }
    }

    let summary = CheckSummary {
        file_count: loaded.len(),
        error_count,
        warning_count,
        fail_on_warnings: args.fail_on_warnings,
    };

    if output_json {
        let json = serde_json::to_string_pretty(&json_output).unwrap_or_else(|_| "[]".to_string());
        println!("{json}");
    } else {
        println!("{}", summary.format());
    }

    Ok(summary)
}

fn include_severity(severity: aurelia_compiler::Severity, threshold: crate::cli::Threshold) -> bool {
    match threshold {
        crate::cli::Threshold::Error => matches!(severity, aurelia_compiler::Severity::Error),
        crate::cli::Threshold::Warning => true,
    }
}

/// Runs in watch mode: re-checks when a template or script changes.
async fn run_watch_mode(
    args: &Args,
    workspace: &Utf8Path,
    config: &ProjectConfig,
) -> Result<CheckSummary, OrchestratorError> {
    use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
    use std::time::Duration;

    println!("Starting watch mode...\n");

    let ignore_set = build_ignore_set(&args.ignore)?;
    let templates = find_templates(workspace, config, &ignore_set);
    let _ = run_single_check(args, workspace, config, templates).await?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        },
        Config::default().with_poll_interval(Duration::from_secs(1)),
    )
    .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    watcher
        .watch(workspace.as_std_path(), RecursiveMode::Recursive)
        .map_err(|e| OrchestratorError::WatchFailed(e.to_string()))?;

    println!("Watching for changes... (Ctrl+C to stop)\n");

    let extensions = config.template_extensions();
    while let Some(event) = rx.recv().await {
        let relevant = event.paths.iter().any(|p| {
            let name = p.file_name().and_then(|n| n.to_str()).unwrap_or("");
            extensions.iter().any(|ext| name.ends_with(ext)) || name.ends_with(".ts")
        });
        if relevant {
            if !args.preserve_watch_output {
                print!("\x1B[2J\x1B[1;1H");
            }
            println!("File changed, re-checking...\n");
            let templates = find_templates(workspace, config, &ignore_set);
            let _ = run_single_check(args, workspace, config, templates).await;
        }
    }

    Err(OrchestratorError::WatchFailed(
        "watch channel closed unexpectedly".to_string(),
    ))
}
