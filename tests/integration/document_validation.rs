//! Document validation through the admin surface, driven by the active configuration.

use crate::integration::support::{knowledge_document, object, open_admin};
use kbase::admin::ConfigUpdate;
use kbase::validation::{DocumentClass, DocumentTemplateRequest, IssueKind};
use serde_json::json;
use tempfile::TempDir;

#[test]
fn well_formed_knowledge_document_passes() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let result = admin.validate_document(&knowledge_document(), None);
    assert!(result.is_valid(), "{:?}", result.issues());
    assert!(result.corrections().is_empty());
    assert!(result.warnings().is_empty());
}

#[test]
fn every_problem_is_reported_at_once() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut document = knowledge_document();
    document.remove("summary");
    document.remove("tags");
    document.insert("priority".to_string(), json!("urgent"));
    document.insert("related".to_string(), json!(["md-install", ""]));
    document.insert("last_modified".to_string(), json!("yesterday"));
    document.insert("reviewer".to_string(), json!("sam"));

    let result = admin.validate_document(&document, None);
    assert!(!result.is_valid());

    let missing = result.missing_fields();
    assert!(missing.contains(&"summary"));
    assert!(missing.contains(&"tags"));

    let invalid = result.fields_with(IssueKind::InvalidValue);
    assert!(invalid.contains(&"priority"));
    assert!(invalid.contains(&"related[1]"));
    assert!(invalid.contains(&"last_modified"));

    assert_eq!(result.fields_with(IssueKind::ExtraField), vec!["reviewer"]);
}

#[test]
fn paths_are_normalized_and_derived_fields_follow() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut document = knowledge_document();
    document.insert(
        "file_path".to_string(),
        json!("guides\\drafts\\..\\setup.md"),
    );

    let result = admin.validate_document(&document, None);
    assert!(result.is_valid(), "{:?}", result.issues());

    let corrected = result.document().unwrap();
    assert_eq!(corrected["file_path"], "guides/setup.md");
    assert_eq!(corrected["file_name"], "setup.md");
    assert_eq!(corrected["directory"], "guides");

    let fields: Vec<&str> = result
        .corrections()
        .iter()
        .map(|c| c.field.as_str())
        .collect();
    assert_eq!(fields, vec!["file_path", "file_name"]);
}

#[test]
fn paths_under_the_base_directory_become_relative() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    admin
        .update_config(ConfigUpdate::set(
            "security",
            "allowed_base_directory",
            "/srv/kb",
        ))
        .unwrap();

    let mut document = knowledge_document();
    document.insert(
        "file_path".to_string(),
        json!("/srv/kb/guides/getting-started.md"),
    );

    let result = admin.validate_document(&document, None);
    assert!(result.is_valid(), "{:?}", result.issues());
    assert_eq!(
        result.document().unwrap()["file_path"],
        "guides/getting-started.md"
    );
}

#[test]
fn disabling_auto_correction_keeps_paths_verbatim() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    admin
        .update_config(ConfigUpdate::set(
            "document_validation",
            "auto_correct_paths",
            "false",
        ))
        .unwrap();

    let mut document = knowledge_document();
    document.insert("file_path".to_string(), json!("guides\\getting-started.md"));

    let result = admin.validate_document(&document, None);
    assert!(result.corrections().is_empty());
    assert_eq!(
        result.document().unwrap()["file_path"],
        "guides\\getting-started.md"
    );
}

#[test]
fn extra_fields_become_warnings_when_allowed() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    let mut document = knowledge_document();
    document.insert("reviewer".to_string(), json!("sam"));

    assert!(!admin.validate_document(&document, None).is_valid());

    admin
        .update_config(ConfigUpdate::set(
            "document_validation",
            "allow_extra_fields",
            "true",
        ))
        .unwrap();
    let result = admin.validate_document(&document, None);
    assert!(result.is_valid());
    assert_eq!(result.warnings().len(), 1);
    assert!(result.warnings()[0].contains("reviewer"));
}

#[test]
fn required_fields_only_narrows_accepted_fields() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    let mut document = knowledge_document();
    document.insert("content".to_string(), json!("# Getting Started"));

    assert!(admin.validate_document(&document, None).is_valid());

    admin
        .update_config(ConfigUpdate::set(
            "document_validation",
            "required_fields_only",
            "true",
        ))
        .unwrap();
    let result = admin.validate_document(&document, None);
    assert_eq!(result.fields_with(IssueKind::ExtraField), vec!["content"]);
}

#[test]
fn custom_documents_accept_the_minimal_fields() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    let document = object(json!({
        "id": "note-1",
        "title": "Scratch note",
        "content": "anything",
        "metadata": { "owner": "ops" }
    }));

    let result = admin.validate_document(&document, Some(DocumentClass::Custom));
    assert!(result.is_valid(), "{:?}", result.issues());

    let mut with_extra = document.clone();
    with_extra.insert("color".to_string(), json!("blue"));
    let result = admin.validate_document(&with_extra, Some(DocumentClass::Custom));
    assert_eq!(result.fields_with(IssueKind::ExtraField), vec!["color"]);
}

#[test]
fn schema_changes_apply_after_update() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    admin
        .update_config(ConfigUpdate::set(
            "document_schema",
            "custom.required_fields",
            r#"["owner"]"#,
        ))
        .unwrap();

    let document = object(json!({ "title": "Scratch note" }));
    let result = admin.validate_document(&document, Some(DocumentClass::Custom));
    assert_eq!(result.missing_fields(), vec!["owner"]);
}

#[test]
fn generated_template_is_complete_and_valid() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut request = DocumentTemplateRequest::new("Getting Started", "docs\\intro.md");
    request.tags = vec!["setup".to_string()];

    let result = admin.create_document_template(&request);
    assert!(result.is_valid(), "{:?}", result.issues());

    let document = result.document().unwrap();
    assert_eq!(document["id"], "md-getting-started");
    assert_eq!(document["file_path"], "docs/intro.md");
    assert_eq!(document["file_name"], "intro.md");
    assert_eq!(document["directory"], "docs");
    assert_eq!(document["summary"], "Brief description of Getting Started");
    assert_eq!(document["priority"], "medium");
    assert_eq!(document.len(), 12);
}

#[test]
fn generated_template_with_bad_priority_is_reported() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut request = DocumentTemplateRequest::new("Release Notes", "notes.md");
    request.priority = "someday".to_string();

    let result = admin.create_document_template(&request);
    assert!(!result.is_valid());
    assert_eq!(result.fields_with(IssueKind::InvalidValue), vec!["priority"]);
    assert!(result.document().is_some());
}
