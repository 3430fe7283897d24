//! Shared fixtures.

use kbase::admin::ConfigAdmin;
use kbase::backup::BackupManager;
use kbase::merge::SectionMergeEngine;
use kbase::store::FileConfigStore;
use kbase::template::DefaultTemplate;
use kbase::types::{ConfigDocument, Document};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub fn object(value: Value) -> ConfigDocument {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}

pub fn config_path(dir: &TempDir) -> PathBuf {
    dir.path().join("config.json")
}

pub fn backup_dir(dir: &TempDir) -> PathBuf {
    dir.path().join("backups")
}

pub fn template() -> DefaultTemplate {
    DefaultTemplate::embedded().unwrap()
}

pub fn open_admin(dir: &TempDir) -> ConfigAdmin {
    try_open_admin(dir).unwrap()
}

pub fn try_open_admin(dir: &TempDir) -> Result<ConfigAdmin, kbase::error::ApiError> {
    ConfigAdmin::open(
        Arc::new(FileConfigStore::new(config_path(dir))),
        BackupManager::in_directory(backup_dir(dir)),
        template(),
        SectionMergeEngine::default(),
    )
}

pub fn write_json(path: &Path, value: &Value) {
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// The embedded template as it looked one release ago, with operator edits.
pub fn previous_release_config() -> Value {
    let mut config = Value::Object(template().document().clone());
    config["server"]["version"] = json!("0.9.0");
    config["document_schema"]["knowledge"]["required_fields"] = json!(["id", "title"]);
    config["elasticsearch"]["host"] = json!("search.internal");
    config["elasticsearch"]["old_endpoint"] = json!("http://legacy:9200");
    config["elasticsearch"].as_object_mut().unwrap().remove("auto_setup");
    config["logging"]["level"] = json!("debug");
    config["features"]["legacy_sync"] = json!(true);
    config["custom_tools"] = json!({ "indexer": { "threads": 4 } });
    config
}

pub fn knowledge_document() -> Document {
    object(json!({
        "id": "md-getting-started",
        "title": "Getting Started",
        "summary": "How to install and run the server",
        "file_path": "guides/getting-started.md",
        "file_name": "getting-started.md",
        "directory": "guides",
        "last_modified": "2025-01-04T10:30:00Z",
        "priority": "high",
        "tags": ["setup", "install"],
        "related": [],
        "source_type": "markdown",
        "key_points": ["Install the binary", "Run kbase config show"]
    }))
}
