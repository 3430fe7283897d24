//! CLI commands executed against a temporary configuration directory.

use crate::integration::support::{backup_dir, config_path, knowledge_document, write_json};
use kbase::config::{PathSettings, Settings};
use kbase::error::ApiError;
use kbase::tooling::cli::{CliContext, Commands, ConfigCommands, DocumentCommands};
use serde_json::{json, Value};
use tempfile::TempDir;

fn context(dir: &TempDir) -> CliContext {
    let settings = Settings {
        paths: PathSettings {
            config_file: Some(config_path(dir)),
            default_template: None,
            backup_dir: Some(backup_dir(dir)),
        },
        ..Settings::default()
    };
    CliContext::from_settings(&settings).unwrap()
}

fn config(command: ConfigCommands) -> Commands {
    Commands::Config { command }
}

#[test]
fn update_then_show_reflects_the_change() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);

    let output = cli
        .execute(&config(ConfigCommands::Update {
            section: Some("elasticsearch".to_string()),
            key: Some("port".to_string()),
            value: Some("9300".to_string()),
            file: None,
            format: "json".to_string(),
        }))
        .unwrap();
    let outcome: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(outcome["status"], "applied");

    let shown = cli
        .execute(&config(ConfigCommands::Show {
            format: "json".to_string(),
        }))
        .unwrap();
    let shown: Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(shown["elasticsearch"]["port"], 9300);
}

#[test]
fn show_renders_toml() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);

    let shown = cli
        .execute(&config(ConfigCommands::Show {
            format: "toml".to_string(),
        }))
        .unwrap();
    let parsed: toml::Value = toml::from_str(&shown).unwrap();
    assert_eq!(parsed["server"]["version"].as_str(), Some("1.0.0"));
}

#[test]
fn reset_and_restore_round_trip_through_backups() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);

    cli.execute(&config(ConfigCommands::Update {
        section: Some("logging".to_string()),
        key: Some("level".to_string()),
        value: Some("warn".to_string()),
        file: None,
        format: "text".to_string(),
    }))
    .unwrap();
    cli.execute(&config(ConfigCommands::Reset {
        yes: true,
        format: "text".to_string(),
    }))
    .unwrap();

    let listed = cli
        .execute(&config(ConfigCommands::Backups {
            format: "json".to_string(),
        }))
        .unwrap();
    let listed: Value = serde_json::from_str(&listed).unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let restored = cli
        .execute(&config(ConfigCommands::Restore {
            format: "json".to_string(),
        }))
        .unwrap();
    let restored: Value = serde_json::from_str(&restored).unwrap();
    assert_eq!(restored["backup"]["name"], listed[0]["name"]);
    assert_eq!(cli.admin().get_config()["logging"]["level"], "warn");
}

#[test]
fn validating_a_broken_file_reports_without_applying() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let candidate = dir.path().join("candidate.json");
    write_json(
        &candidate,
        &json!({ "document_validation": { "strict_schema_validation": "perhaps" } }),
    );

    let output = cli
        .execute(&config(ConfigCommands::Validate {
            file: Some(candidate),
            format: "json".to_string(),
        }))
        .unwrap();
    let result: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(result["ok"], false);
    let fields: Vec<&str> = result["issues"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|issue| issue["field"].as_str())
        .collect();
    assert!(fields.contains(&"document_schema"));
    assert!(fields.contains(&"document_validation.strict_schema_validation"));
}

#[test]
fn document_validate_reads_a_file() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("doc.json");
    write_json(&path, &Value::Object(knowledge_document()));

    let output = cli
        .execute(&Commands::Document {
            command: DocumentCommands::Validate {
                file: path,
                class: None,
                format: "json".to_string(),
            },
        })
        .unwrap();
    let result: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(result["ok"], true);
}

#[test]
fn document_validate_rejects_unknown_class() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);
    let path = dir.path().join("doc.json");
    write_json(&path, &Value::Object(knowledge_document()));

    let err = cli
        .execute(&Commands::Document {
            command: DocumentCommands::Validate {
                file: path,
                class: Some("article".to_string()),
                format: "text".to_string(),
            },
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(_)));
}

#[test]
fn document_template_prints_the_generated_document() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir);

    let output = cli
        .execute(&Commands::Document {
            command: DocumentCommands::Template {
                title: "Config Layers".to_string(),
                file_path: "guides/config-layers.md".to_string(),
                priority: "high".to_string(),
                source_type: "documentation".to_string(),
                tags: vec!["config".to_string()],
                summary: Some("How settings are layered".to_string()),
                key_points: vec![],
                related: vec![],
                format: "json".to_string(),
            },
        })
        .unwrap();
    let result: Value = serde_json::from_str(&output).unwrap();
    assert_eq!(result["ok"], true);
    assert_eq!(result["document"]["id"], "doc-config-layers");
    assert_eq!(result["document"]["directory"], "guides");
}
