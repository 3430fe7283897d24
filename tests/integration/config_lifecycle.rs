//! Startup, update, reset, upgrade, restore and reload against a real directory.

use crate::integration::support::{
    backup_dir, config_path, object, open_admin, previous_release_config, read_json,
    try_open_admin, write_json,
};
use kbase::admin::{ConfigAdmin, ConfigUpdate};
use kbase::config::{PathSettings, Settings};
use kbase::error::{ApiError, BackupError, ConfigError};
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn settings_for(dir: &TempDir) -> Settings {
    Settings {
        paths: PathSettings {
            config_file: Some(config_path(dir)),
            default_template: None,
            backup_dir: Some(backup_dir(dir)),
        },
        ..Settings::default()
    }
}

#[test]
fn startup_upgrade_merges_template_and_keeps_operator_values() {
    let dir = TempDir::new().unwrap();
    let before = previous_release_config();
    write_json(&config_path(&dir), &before);

    let admin = ConfigAdmin::from_settings(&settings_for(&dir)).unwrap();
    let config = read_json(&config_path(&dir));

    // Sections that track the code come from the template.
    assert_eq!(config["server"]["version"], "1.0.0");
    assert_eq!(
        config["document_schema"]["knowledge"]["required_fields"]
            .as_array()
            .unwrap()
            .len(),
        12
    );

    // Operator sections keep their values and pick up new keys.
    assert_eq!(config["elasticsearch"]["host"], "search.internal");
    assert_eq!(config["elasticsearch"]["auto_setup"], true);
    assert_eq!(config["logging"]["level"], "debug");
    assert_eq!(config["custom_tools"]["indexer"]["threads"], 4);

    // Deprecated keys are gone.
    assert!(config["elasticsearch"].get("old_endpoint").is_none());
    assert!(config["features"].get("legacy_sync").is_none());

    // The active state matches what was persisted.
    assert_eq!(serde_json::Value::Object(admin.get_config()), config);

    // And the pre-upgrade document was snapshotted verbatim.
    let backups = admin.list_backups().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(
        serde_json::Value::Object(admin.backups().restore().unwrap()),
        before
    );
}

#[test]
fn startup_without_version_change_takes_no_backup() {
    let dir = TempDir::new().unwrap();
    let settings = settings_for(&dir);

    ConfigAdmin::from_settings(&settings).unwrap();
    let admin = ConfigAdmin::from_settings(&settings).unwrap();
    assert!(admin.list_backups().unwrap().is_empty());
}

#[test]
fn explicit_upgrade_reports_what_changed() {
    let dir = TempDir::new().unwrap();
    write_json(&config_path(&dir), &previous_release_config());
    let admin = open_admin(&dir);

    let outcome = admin.server_upgrade(None).unwrap();
    assert_eq!(outcome.from_version.as_deref(), Some("0.9.0"));
    assert_eq!(outcome.to_version.as_deref(), Some("1.0.0"));
    assert!(outcome
        .report
        .dropped_keys
        .contains(&"elasticsearch.old_endpoint".to_string()));
    assert!(outcome
        .report
        .dropped_keys
        .contains(&"features.legacy_sync".to_string()));
    assert!(outcome
        .report
        .added_keys
        .contains(&"elasticsearch.auto_setup".to_string()));
    assert!(outcome
        .report
        .preserved_keys
        .contains(&"custom_tools".to_string()));
}

#[test]
fn missing_required_section_is_fatal_and_leaves_file_alone() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    config.as_object_mut().unwrap().remove("document_validation");
    write_json(&config_path(&dir), &config);
    let before = std::fs::read_to_string(config_path(&dir)).unwrap();

    let err = try_open_admin(&dir).err().unwrap();
    match err {
        ApiError::ConfigError(ConfigError::MissingSection { section, .. }) => {
            assert_eq!(section, "document_validation")
        }
        other => panic!("expected MissingSection, got {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(config_path(&dir)).unwrap(), before);
}

#[test]
fn missing_template_section_is_fatal_at_startup() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    let sections = config.as_object_mut().unwrap();
    sections.remove("server");
    sections.remove("elasticsearch");
    write_json(&config_path(&dir), &config);
    let before = std::fs::read_to_string(config_path(&dir)).unwrap();

    match try_open_admin(&dir).err().unwrap() {
        ApiError::ConfigError(ConfigError::MissingSection { section, .. }) => {
            assert_eq!(section, "server")
        }
        other => panic!("expected MissingSection, got {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(config_path(&dir)).unwrap(), before);
}

#[test]
fn current_version_missing_a_section_is_fatal_even_with_auto_upgrade() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    config["server"]["version"] = json!("1.0.0");
    config.as_object_mut().unwrap().remove("elasticsearch");
    write_json(&config_path(&dir), &config);
    let before = std::fs::read_to_string(config_path(&dir)).unwrap();

    match ConfigAdmin::from_settings(&settings_for(&dir)).err().unwrap() {
        ApiError::ConfigError(ConfigError::MissingSection { section, .. }) => {
            assert_eq!(section, "elasticsearch")
        }
        other => panic!("expected MissingSection, got {:?}", other),
    }
    assert_eq!(std::fs::read_to_string(config_path(&dir)).unwrap(), before);
    assert!(!backup_dir(&dir).exists());
}

#[test]
fn startup_upgrade_restores_sections_an_older_file_lacks() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    config.as_object_mut().unwrap().remove("elasticsearch");
    write_json(&config_path(&dir), &config);

    let admin = ConfigAdmin::from_settings(&settings_for(&dir)).unwrap();
    assert_eq!(admin.get_config()["elasticsearch"]["auto_setup"], true);
    assert_eq!(admin.list_backups().unwrap().len(), 1);
}

#[test]
fn reload_rejects_a_file_missing_a_template_section() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut config = read_json(&config_path(&dir));
    config.as_object_mut().unwrap().remove("logging");
    write_json(&config_path(&dir), &config);

    let err = admin.reload_config().unwrap_err();
    assert!(matches!(
        err,
        ApiError::ConfigError(ConfigError::MissingSection { ref section, .. })
            if section == "logging"
    ));
    assert_eq!(admin.get_config()["logging"]["level"], "info");
}

#[test]
fn unreadable_live_file_aborts_upgrade_and_reset() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    std::fs::write(config_path(&dir), "{ operator was mid-edit").unwrap();

    let err = admin.server_upgrade(None).unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(ConfigError::Parse { .. })));
    let err = admin.reset_config().unwrap_err();
    assert!(matches!(err, ApiError::ConfigError(ConfigError::Parse { .. })));

    assert!(admin.list_backups().unwrap().is_empty());
    assert_eq!(
        std::fs::read_to_string(config_path(&dir)).unwrap(),
        "{ operator was mid-edit"
    );
}

#[test]
fn malformed_boolean_is_fatal_at_startup() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    config["document_validation"]["strict_schema_validation"] = json!("maybe");
    write_json(&config_path(&dir), &config);

    let err = try_open_admin(&dir).err().unwrap();
    assert!(matches!(
        err,
        ApiError::ConfigError(ConfigError::MalformedBoolean { .. })
    ));
}

#[test]
fn string_booleans_are_coerced() {
    let dir = TempDir::new().unwrap();
    let mut config = previous_release_config();
    config["document_validation"]["allow_extra_fields"] = json!("yes");
    config["document_validation"]["strict_schema_validation"] = json!("off");
    write_json(&config_path(&dir), &config);

    let admin = open_admin(&dir);
    let policy = *admin.active().policy();
    assert!(policy.allow_extra_fields);
    assert!(!policy.strict_schema_validation);
}

#[test]
fn backup_is_taken_before_the_live_file_changes() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    admin
        .update_config(ConfigUpdate::set("logging", "level", "warn"))
        .unwrap();
    let before = std::fs::read_to_string(config_path(&dir)).unwrap();
    let modified = std::fs::metadata(config_path(&dir))
        .unwrap()
        .modified()
        .unwrap();

    let outcome = admin.reset_config().unwrap();

    let backup_text = std::fs::read_to_string(&outcome.backup.path).unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&backup_text).unwrap(),
        serde_json::from_str::<serde_json::Value>(&before).unwrap()
    );
    assert!(outcome.backup.created_at > chrono::DateTime::<chrono::Utc>::from(modified));
    assert_eq!(read_json(&config_path(&dir))["logging"]["level"], "info");
}

#[test]
fn restore_picks_the_newest_backup_and_takes_none_itself() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    admin
        .update_config(ConfigUpdate::set("logging", "level", "warn"))
        .unwrap();
    admin.reset_config().unwrap();
    admin
        .update_config(ConfigUpdate::set("logging", "level", "error"))
        .unwrap();
    admin.reset_config().unwrap();

    admin.restore_config().unwrap();
    assert_eq!(admin.get_config()["logging"]["level"], "error");
    assert_eq!(admin.list_backups().unwrap().len(), 2);

    admin.restore_config().unwrap();
    assert_eq!(read_json(&config_path(&dir))["logging"]["level"], "error");
}

#[test]
fn restore_never_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    admin
        .update_config(ConfigUpdate::set("logging", "level", "warn"))
        .unwrap();

    let err = admin.restore_config().unwrap_err();
    assert!(matches!(
        err,
        ApiError::BackupError(BackupError::NotFound { .. })
    ));
    assert_eq!(admin.get_config()["logging"]["level"], "warn");
}

#[test]
fn backups_list_newest_first() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);
    for _ in 0..3 {
        admin.reset_config().unwrap();
    }

    let backups = admin.list_backups().unwrap();
    assert_eq!(backups.len(), 3);
    assert!(backups
        .windows(2)
        .all(|pair| pair[0].created_at > pair[1].created_at));
}

#[test]
fn concurrent_mutations_never_interleave() {
    let dir = TempDir::new().unwrap();
    let admin = Arc::new(open_admin(&dir));
    let barrier = Arc::new(Barrier::new(8));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let admin = Arc::clone(&admin);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                admin.reset_config()
            })
        })
        .collect();

    let mut applied = Vec::new();
    for handle in handles {
        match handle.join().unwrap() {
            Ok(outcome) => applied.push(outcome.backup.name),
            Err(ApiError::Busy { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert!(!applied.is_empty());
    let listed = admin.list_backups().unwrap();
    assert_eq!(listed.len(), applied.len());
    applied.sort();
    applied.dedup();
    assert_eq!(applied.len(), listed.len());
}

#[test]
fn reload_picks_up_external_edits() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let mut config = read_json(&config_path(&dir));
    config["document_validation"]["allow_extra_fields"] = json!(true);
    config["security"]["allowed_base_directory"] = json!("/srv/kb");
    write_json(&config_path(&dir), &config);

    let active = admin.reload_config().unwrap();
    assert!(active.policy().allow_extra_fields);
    assert_eq!(active.registry().base_directory(), Some("/srv/kb"));
}

#[test]
fn replacing_the_document_validates_first() {
    let dir = TempDir::new().unwrap();
    let admin = open_admin(&dir);

    let outcome = admin
        .update_config(ConfigUpdate::Replace(object(json!({ "server": { "version": "1.0.0" } }))))
        .unwrap();
    assert!(!outcome.is_applied());
    assert!(outcome
        .validation()
        .missing_fields()
        .contains(&"document_schema"));
    assert_eq!(admin.get_config()["server"]["name"], "kbase");
}
