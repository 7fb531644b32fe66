//! End-to-end runs of the binary against scratch workspaces.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run_check(workspace: &Path, extra_args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_aurelia-check-rs"))
        .arg("--workspace")
        .arg(workspace)
        .args(extra_args)
        .output()
        .expect("binary runs")
}

fn write(workspace: &Path, relative: &str, content: &str) {
    let path = workspace.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn clean_workspace_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/app.html",
        r#"<div>${message}</div>"#,
    );
    write(
        dir.path(),
        "src/app.ts",
        "export class App { message = ''; }\n",
    );
    let output = run_check(dir.path(), &[]);
    assert!(
        output.status.success(),
        "stdout: {}\nstderr: {}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked 1 template"));
}

#[test]
fn unknown_bindable_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "src/card.ts",
        r#"
@customElement('my-card')
export class MyCard {
  @bindable title = '';
}
"#,
    );
    write(
        dir.path(),
        "src/card.html",
        r#"<template></template>"#,
    );
    write(
        dir.path(),
        "src/page.html",
        r#"<my-card subtitle.bind="x"></my-card>"#,
    );
    // The resource index only sees scripts that pair with templates, so
    // card.html pulls card.ts in. Unknown bindables are warnings.
    let output = run_check(dir.path(), &["--fail-on-warnings"]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("unknown-bindable"), "stdout: {stdout}");
}

#[test]
fn bad_expression_is_reported_with_position() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/app.html", "<div>${items | }</div>");
    let output = run_check(dir.path(), &[]);
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Expected identifier after '|'"),
        "stdout: {stdout}"
    );
    assert!(stdout.contains("src/app.html:1:"), "stdout: {stdout}");
}

#[test]
fn json_output_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/app.html", "<div>${items | }</div>");
    let output = run_check(dir.path(), &["--output", "json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    let list = parsed.as_array().expect("array of diagnostics");
    assert!(!list.is_empty());
    assert_eq!(list[0]["source"], "compiler");
}

#[test]
fn threshold_error_hides_warnings() {
    let dir = tempfile::tempdir().unwrap();
    // Unknown converters are warnings.
    write(dir.path(), "src/app.html", "<div>${x | nope}</div>");
    let output = run_check(dir.path(), &["--threshold", "error"]);
    assert!(output.status.success());

    let output = run_check(dir.path(), &["--fail-on-warnings"]);
    assert!(!output.status.success());
}

#[test]
fn ignored_globs_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "skip/broken.html", "<div>${items | }</div>");
    let output = run_check(dir.path(), &["--ignore", "**/skip/**"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Checked 0 templates"));
}

#[test]
fn typecheck_diagnostics_are_merged() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "src/app.html", "<div>${customer.nmae}</div>");
    write(
        dir.path(),
        "src/app.ts",
        "export class App { customer = { name: '' }; }\n",
    );

    // First pass to learn the overlay layout.
    let probe = run_check(dir.path(), &["--emit-overlay"]);
    let stderr = String::from_utf8_lossy(&probe.stderr);
    let overlay_text = stderr
        .split("===")
        .nth(2)
        .expect("overlay dump present")
        .trim_start_matches('\n');
    let member_offset = overlay_text.find("nmae").expect("member rendered") as u32;

    let template_path = dir.path().join("src/app.html");
    let template_path = template_path.to_string_lossy();
    let overlay_uri = format!("{}.__au.ts", template_path.to_lowercase());
    let diagnostics = serde_json::json!([{
        "uri": overlay_uri,
        "span": { "start": member_offset, "end": member_offset + 4 },
        "code": "2339",
        "message": "Property 'nmae' does not exist on type '__VM'.",
        "severity": "error"
    }]);
    write(
        dir.path(),
        "tsc-diagnostics.json",
        &diagnostics.to_string(),
    );

    let diag_path = dir.path().join("tsc-diagnostics.json");
    let output = run_check(
        dir.path(),
        &["--typecheck-diagnostics", diag_path.to_str().unwrap()],
    );
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2339"), "stdout: {stdout}");
    // The alias is rewritten to the class name.
    assert!(stdout.contains("'App'"), "stdout: {stdout}");
}
