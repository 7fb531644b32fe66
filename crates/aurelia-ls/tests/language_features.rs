//! Cursor entities, references, rename, and diagnostics over a session.

use aurelia_ls::{
    CancelToken, CursorEntity, ReferenceKind, Session, SessionConfig, Status, TokenType,
    TypecheckDiagnostic,
};
use pretty_assertions::assert_eq;
use source_map::Span;

fn session_with(template: &str) -> (Session, String) {
    let mut session = Session::new(SessionConfig::default());
    session.upsert_script(
        "/src/app.ts",
        1,
        r#"
@customElement('my-app')
export class App {
  items = [];
  customer = { name: '' };
  save() {}
}
export class DateFormatValueConverter {}
@customElement('my-card')
export class MyCard {
  @bindable title = '';
}
"#,
    );
    session.upsert_template("/src/app.html", 1, template);
    (session, "/src/app.html".to_string())
}

fn offset_of(source: &str, needle: &str) -> u32 {
    source.find(needle).unwrap() as u32
}

#[test]
fn cursor_resolves_custom_element_tag() {
    let source = r#"<my-card title.bind="t"></my-card>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let hit = session
        .cursor_command(&uri, offset_of(source, "my-card") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at tag");
    assert!(matches!(hit.entity, CursorEntity::CeTag { .. }));
}

#[test]
fn cursor_resolves_command_segment() {
    let source = r#"<my-card title.bind="t"></my-card>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let hit = session
        .cursor_command(&uri, offset_of(source, "bind") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at command");
    assert!(matches!(hit.entity, CursorEntity::Command { ref name, .. } if name == "bind"));
}

#[test]
fn cursor_resolves_bindable_target() {
    let source = r#"<my-card title.bind="t"></my-card>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let hit = session
        .cursor_command(&uri, offset_of(source, "title") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at bindable");
    assert!(matches!(
        hit.entity,
        CursorEntity::Bindable { ref property, .. } if property == "title"
    ));
}

#[test]
fn cursor_resolves_controller_and_scope_identifier() {
    let source = r#"<li repeat.for="item of items">${item.label}</li>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();

    let hit = session
        .cursor_command(&uri, offset_of(source, "repeat") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at controller");
    assert!(matches!(hit.entity, CursorEntity::TcAttr { ref name, .. } if name == "repeat"));

    let hit = session
        .cursor_command(&uri, offset_of(source, "${item") + 3, &cancel)
        .result
        .flatten()
        .expect("entity at scope identifier");
    assert!(matches!(
        hit.entity,
        CursorEntity::ScopeIdentifier { ref name, .. } if name == "item"
    ));

    let hit = session
        .cursor_command(&uri, offset_of(source, "label") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at member");
    assert!(matches!(
        hit.entity,
        CursorEntity::MemberAccess { ref path, .. } if path == "item.label"
    ));
}

#[test]
fn cursor_resolves_converter_name() {
    let source = r#"<div>${when | dateFormat}</div>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let hit = session
        .cursor_command(&uri, offset_of(source, "dateFormat") + 1, &cancel)
        .result
        .flatten()
        .expect("entity at converter");
    assert!(matches!(
        hit.entity,
        CursorEntity::ValueConverter { res: Some(_), .. }
    ));
}

#[test]
fn cursor_returns_at_most_one_entity() {
    let source = r#"<li repeat.for="item of items">${item}</li>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    for offset in 0..source.len() as u32 {
        // Every position resolves to zero or one entity, never a panic.
        let _ = session.cursor_command(&uri, offset, &cancel);
    }
}

#[test]
fn contextuals_are_not_renameable() {
    let source = r#"<li repeat.for="item of items">${$index}</li>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let envelope = session.rename_command(
        &uri,
        offset_of(source, "$index") + 2,
        "newName",
        &cancel,
    );
    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.errors[0].code, "not-renameable");
}

#[test]
fn renaming_the_iterator_renames_every_site() {
    // Declaration in the attribute value plus each expression site.
    let source = r#"<ul><li repeat.for="x of xs">${x.y} ${x}</li></ul>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let envelope = session.rename_command(&uri, offset_of(source, "${x.y}") + 2, "item", &cancel);
    assert_eq!(envelope.status, Status::Ok);
    let edits = envelope.result.unwrap();
    assert_eq!(edits.len(), 3, "declaration + two usages: {edits:?}");
    for edit in &edits {
        assert_eq!(edit.span.slice(source), "x");
        assert_eq!(edit.new_text.as_str(), "item");
    }
}

#[test]
fn renaming_a_custom_element_edits_tags_and_script() {
    let source = r#"<my-card title.bind="t"></my-card>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let envelope =
        session.rename_command(&uri, offset_of(source, "my-card") + 1, "nice-card", &cancel);
    assert_eq!(envelope.status, Status::Ok);
    let edits = envelope.result.unwrap();
    // Open tag, close tag, and the script-side name literal.
    assert_eq!(edits.len(), 3, "{edits:?}");
    assert!(edits.iter().any(|e| e.uri.as_str() == "/src/app.ts"));
    assert!(edits
        .iter()
        .filter(|e| e.uri.as_str() == "/src/app.html")
        .all(|e| e.new_text.as_str() == "nice-card"));
}

#[test]
fn references_compose_declaration_and_usages() {
    let source = r#"<li repeat.for="item of items">${item}</li>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let envelope = session.references_command(&uri, offset_of(source, "${item") + 3, &cancel);
    let sites = envelope.result.unwrap();
    assert_eq!(sites.len(), 2, "{sites:?}");
    assert!(sites
        .iter()
        .any(|s| s.reference_kind == ReferenceKind::ScopeDeclaration));
    assert!(sites
        .iter()
        .any(|s| s.reference_kind == ReferenceKind::ScopeIdentifier));
}

#[test]
fn semantic_tokens_cover_the_template() {
    let source = r#"<my-card title.bind="customer.name"></my-card>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let tokens = session
        .semantic_tokens_command(&uri, &cancel)
        .result
        .unwrap();
    assert!(tokens
        .iter()
        .any(|t| t.token_type == TokenType::Element));
    assert!(tokens
        .iter()
        .any(|t| t.token_type == TokenType::Command));
    assert!(tokens.iter().any(|t| t.token_type == TokenType::Member));
    // Sorted and non-overlapping.
    for pair in tokens.windows(2) {
        assert!(pair[0].span.end <= pair[1].span.start);
    }
}

#[test]
fn diagnostics_merge_compiler_and_typecheck_channels() {
    let source = r#"<div>${customer.nmae}</div>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();

    // Compile once so the provenance index is populated.
    let first = session.diagnostics_command(&uri, &cancel);
    assert_eq!(first.status, Status::Ok);

    // Simulate the external checker flagging the overlay rendering of
    // `customer.nmae`.
    let file = session.file_id(&uri).unwrap();
    let overlay_offset = {
        let (compilation, _) = session.compilation(file, &cancel).unwrap();
        let needle = "nmae";
        compilation.overlay.text.find(needle).unwrap() as u32
    };
    session.set_typecheck_diagnostics(
        file,
        vec![TypecheckDiagnostic {
            uri: format!("{uri}.__au.ts"),
            span: Span::new(overlay_offset, overlay_offset + 4),
            code: "2339".to_string(),
            message: "Property 'nmae' does not exist on type '__VM'.".to_string(),
            severity: "error".to_string(),
            actual_type: None,
            expected_type: None,
        }],
    );

    let envelope = session.diagnostics_command(&uri, &cancel);
    assert_eq!(envelope.status, Status::Ok);
    let diagnostics = envelope.result.unwrap();
    let mapped = diagnostics
        .iter()
        .find(|d| d.code == "2339")
        .expect("typecheck diagnostic mapped");
    // The primary span is the template's `nmae`, not the overlay's.
    assert_eq!(mapped.span.slice(source), "nmae");
    // The alias is rewritten to the class name.
    assert!(mapped.message.contains("'App'"), "{}", mapped.message);
}

#[test]
fn unmapped_overlay_spans_degrade_with_gaps() {
    let source = r#"<div>${x}</div>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let _ = session.diagnostics_command(&uri, &cancel);
    let file = session.file_id(&uri).unwrap();
    session.set_typecheck_diagnostics(
        file,
        vec![TypecheckDiagnostic {
            uri: format!("{uri}.__au.ts"),
            span: Span::new(0u32, 1u32),
            code: "2300".to_string(),
            message: "somewhere synthetic".to_string(),
            severity: "error".to_string(),
            actual_type: None,
            expected_type: None,
        }],
    );
    let envelope = session.diagnostics_command(&uri, &cancel);
    assert_eq!(envelope.status, Status::Degraded);
    assert!(!envelope.epistemic.gaps.is_empty());
}

#[test]
fn missing_snapshot_is_an_error_envelope() {
    let mut session = Session::new(SessionConfig::default());
    let cancel = CancelToken::new();
    let envelope = session.diagnostics_command("/never/opened.html", &cancel);
    assert_eq!(envelope.status, Status::Error);
    assert_eq!(envelope.errors[0].code, "missing-snapshot");
}

#[test]
fn code_actions_suggest_spelling_fixes() {
    let source = r#"<div>${when | dateFromat}</div>"#;
    let (mut session, uri) = session_with(source);
    let cancel = CancelToken::new();
    let actions = session.code_actions_command(&uri, &cancel).result.unwrap();
    assert!(
        actions.iter().any(|a| a.title.contains("dateFormat")),
        "{actions:?}"
    );
}
