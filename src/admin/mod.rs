//! Configuration Admin
//!
//! The tool-facing surface over the configuration lifecycle. Reads go to the
//! active snapshot and never block on a mutation. Mutations (update, reset,
//! upgrade, restore, reload) hold the mutation gate for their whole run, so at
//! most one is in flight; the live file is replaced only after every check
//! and the pre-change snapshot have succeeded.

pub mod active;
pub mod outcome;

use crate::backup::{BackupManager, BackupRecord};
use crate::concurrency::MutationGate;
use crate::config::Settings;
use crate::error::ApiError;
use crate::merge::{SectionMergeEngine, SectionPolicyTable};
use crate::store::{ConfigStore, FileConfigStore};
use crate::template::{server_version, DefaultTemplate};
use crate::types::{ConfigDocument, Document};
use crate::validation::{
    create_document_template, DocumentClass, DocumentTemplateRequest, ValidationConfigLoader,
    ValidationResult,
};
use parking_lot::RwLock;
use std::sync::Arc;

pub use active::ActiveConfig;
pub use outcome::{
    parse_update_value, ConfigUpdate, ResetOutcome, RestoreOutcome, UpdateOutcome, UpgradeOutcome,
};

/// Owns the store, backups, template and active state for one configuration file.
pub struct ConfigAdmin {
    store: Arc<dyn ConfigStore>,
    backups: BackupManager,
    template: DefaultTemplate,
    engine: SectionMergeEngine,
    gate: MutationGate,
    active: RwLock<Arc<ActiveConfig>>,
}

impl ConfigAdmin {
    /// Open the configuration, writing the template first if no file exists yet.
    ///
    /// Any missing or malformed required section is fatal, as is a missing
    /// top-level section of the template.
    pub fn open(
        store: Arc<dyn ConfigStore>,
        backups: BackupManager,
        template: DefaultTemplate,
        engine: SectionMergeEngine,
    ) -> Result<Self, ApiError> {
        Self::open_with(store, backups, template, engine, false)
    }

    /// Wire everything from runtime settings and run the startup upgrade if enabled.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        let template = DefaultTemplate::resolve(settings.paths.default_template.as_deref())?;
        let store = Arc::new(FileConfigStore::new(settings.config_file()?));
        let backups = BackupManager::in_directory(settings.backup_dir()?);
        let engine =
            SectionMergeEngine::new(SectionPolicyTable::default(), settings.deprecated_filter());

        Self::open_with(
            store,
            backups,
            template,
            engine,
            settings.upgrade.auto_upgrade_on_start,
        )
    }

    /// The startup upgrade, when enabled, runs before the template-section check.
    fn open_with(
        store: Arc<dyn ConfigStore>,
        backups: BackupManager,
        template: DefaultTemplate,
        engine: SectionMergeEngine,
        auto_upgrade: bool,
    ) -> Result<Self, ApiError> {
        if !store.exists() {
            store.save(template.document())?;
            tracing::info!(
                path = %store.location().display(),
                template = %template.origin().display(),
                "configuration bootstrapped from template"
            );
        }

        let active = ActiveConfig::build(store.load()?)?;
        let admin = Self {
            store,
            backups,
            template,
            engine,
            gate: MutationGate::new(),
            active: RwLock::new(Arc::new(active)),
        };
        if auto_upgrade {
            admin.upgrade_if_needed()?;
        }

        let active = admin.active();
        ValidationConfigLoader::require_template_sections(
            active.document(),
            admin.template.document(),
        )?;
        tracing::info!(
            path = %admin.store.location().display(),
            version = server_version(active.document()).unwrap_or("unknown"),
            "configuration loaded"
        );
        Ok(admin)
    }

    /// Current active snapshot. Cheap; holds the lock only to clone the `Arc`.
    pub fn active(&self) -> Arc<ActiveConfig> {
        Arc::clone(&self.active.read())
    }

    pub fn template(&self) -> &DefaultTemplate {
        &self.template
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    pub fn store(&self) -> &dyn ConfigStore {
        self.store.as_ref()
    }

    pub fn get_config(&self) -> ConfigDocument {
        self.active().document().clone()
    }

    /// Check a candidate configuration without applying it.
    pub fn validate_config(&self, candidate: &ConfigDocument) -> ValidationResult {
        ValidationConfigLoader::validate_config(candidate, self.template.document())
    }

    /// Validate, then persist and activate. A rejected update leaves everything untouched.
    pub fn update_config(&self, update: ConfigUpdate) -> Result<UpdateOutcome, ApiError> {
        let _guard = self.gate.try_acquire("update")?;

        let candidate = update.apply_to(self.active().document())?;
        let validation = self.validate_config(&candidate);
        if !validation.is_valid() {
            tracing::warn!(issues = validation.issues().len(), "configuration update rejected");
            return Ok(UpdateOutcome::Rejected { validation });
        }

        let next = ActiveConfig::build(candidate)?;
        self.store.save(next.document())?;
        self.activate(next);
        tracing::info!("configuration updated");
        Ok(UpdateOutcome::Applied { validation })
    }

    /// Snapshot the current configuration, then overwrite it with the template.
    pub fn reset_config(&self) -> Result<ResetOutcome, ApiError> {
        let _guard = self.gate.try_acquire("reset")?;

        let backup = self.snapshot_current()?;
        let next = ActiveConfig::build(self.template.document().clone())?;
        self.store.save(next.document())?;
        self.activate(next);

        tracing::info!(backup = %backup.name, "configuration reset to template");
        Ok(ResetOutcome { backup })
    }

    /// Snapshot, merge the template into the current configuration, validate, persist.
    ///
    /// `template` overrides the configured template for this one upgrade.
    pub fn server_upgrade(
        &self,
        template: Option<&DefaultTemplate>,
    ) -> Result<UpgradeOutcome, ApiError> {
        let _guard = self.gate.try_acquire("upgrade")?;
        self.upgrade_locked(template.unwrap_or(&self.template))
    }

    /// Upgrade when the stored `server.version` differs from the template's.
    pub fn upgrade_if_needed(&self) -> Result<Option<UpgradeOutcome>, ApiError> {
        let current = self.active();
        let stored = server_version(current.document());
        let shipped = self.template.server_version();
        if stored == shipped {
            tracing::debug!(version = stored.unwrap_or("unknown"), "configuration is current");
            return Ok(None);
        }
        self.server_upgrade(None).map(Some)
    }

    fn upgrade_locked(&self, template: &DefaultTemplate) -> Result<UpgradeOutcome, ApiError> {
        let current = self.current_document()?;
        let backup = self.snapshot_document(&current)?;

        let (merged, report) = self.engine.merge_with_report(&current, template.document());
        let next = ActiveConfig::build(merged)?;
        self.store.save(next.document())?;

        let outcome = UpgradeOutcome {
            backup,
            from_version: server_version(&current).map(str::to_string),
            to_version: server_version(next.document()).map(str::to_string),
            report,
        };
        self.activate(next);

        tracing::info!(
            from = outcome.from_version.as_deref().unwrap_or("unknown"),
            to = outcome.to_version.as_deref().unwrap_or("unknown"),
            backup = %outcome.backup.name,
            added = outcome.report.added_keys.len(),
            dropped = outcome.report.dropped_keys.len(),
            "configuration upgraded"
        );
        Ok(outcome)
    }

    /// Replace the configuration with the newest snapshot. Takes no snapshot itself.
    pub fn restore_config(&self) -> Result<RestoreOutcome, ApiError> {
        let _guard = self.gate.try_acquire("restore")?;

        let (backup, document) = self.backups.restore_latest()?;
        let next = ActiveConfig::build(document)?;
        self.store.save(next.document())?;
        self.activate(next);

        tracing::info!(backup = %backup.name, "configuration restored");
        Ok(RestoreOutcome { backup })
    }

    /// Re-read the persisted file. On failure the previous active state stays in force.
    pub fn reload_config(&self) -> Result<Arc<ActiveConfig>, ApiError> {
        let _guard = self.gate.try_acquire("reload")?;

        let next = ActiveConfig::build(self.store.load()?)?;
        ValidationConfigLoader::require_template_sections(
            next.document(),
            self.template.document(),
        )?;
        self.activate(next);
        tracing::info!(path = %self.store.location().display(), "configuration reloaded");
        Ok(self.active())
    }

    pub fn list_backups(&self) -> Result<Vec<BackupRecord>, ApiError> {
        Ok(self.backups.list()?)
    }

    /// Validate a document against the active schema. `class` defaults to the inferred one.
    pub fn validate_document(
        &self,
        document: &Document,
        class: Option<DocumentClass>,
    ) -> ValidationResult {
        let active = self.active();
        let validator = active.validator();
        match class {
            Some(class) => validator.validate(document, class, active.policy()),
            None => validator.validate_inferred(document, active.policy()),
        }
    }

    /// Build and validate a new knowledge document.
    pub fn create_document_template(&self, request: &DocumentTemplateRequest) -> ValidationResult {
        let active = self.active();
        create_document_template(request, &active.validator(), active.policy())
    }

    fn activate(&self, next: ActiveConfig) {
        *self.active.write() = Arc::new(next);
    }

    /// The persisted document. An unreadable file aborts the mutation before
    /// anything is snapshotted or written.
    fn current_document(&self) -> Result<ConfigDocument, ApiError> {
        self.store.load().map_err(|e| {
            tracing::error!(
                path = %self.store.location().display(),
                error = %e,
                "persisted configuration unreadable"
            );
            ApiError::from(e)
        })
    }

    fn snapshot_current(&self) -> Result<BackupRecord, ApiError> {
        let current = self.current_document()?;
        self.snapshot_document(&current)
    }

    fn snapshot_document(&self, document: &ConfigDocument) -> Result<BackupRecord, ApiError> {
        let last_modified = self.store.modified()?;
        Ok(self.backups.snapshot(document, last_modified)?)
    }
}
