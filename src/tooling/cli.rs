//! CLI Interface
//!
//! Command-line interface over the configuration admin and the document validator.

use crate::admin::{ConfigAdmin, ConfigUpdate, UpdateOutcome};
use crate::config::Settings;
use crate::error::{ApiError, ConfigError};
use crate::logging::LoggingConfig;
use crate::store::{parse_document, render_document};
use crate::template::DefaultTemplate;
use crate::tooling::format::{
    format_backups_text, format_reset_text, format_restore_text, format_section_heading,
    format_upgrade_text, format_validation_text,
};
use crate::types::{json_type_name, ConfigDocument, Document};
use crate::validation::{DocumentClass, DocumentTemplateRequest, ValidationResult};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// CLI application
#[derive(Parser)]
#[command(name = "kbase")]
#[command(about = "Knowledge base configuration lifecycle and document validation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file for kbase itself (layered over the global settings.toml)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Managed configuration file (overrides paths.config_file)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Settings logging with command-line flags applied on top.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Managed configuration (show, validate, update, reset, restore, upgrade, backups, reload)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Document validation (validate, template)
    Document {
        #[command(subcommand)]
        command: DocumentCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the active configuration
    Show {
        /// Output format (json or toml)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Validate a configuration file, or the active configuration
    Validate {
        /// Candidate file; defaults to the active configuration
        #[arg(long)]
        file: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Set one value, or replace the whole configuration from a file
    Update {
        #[arg(long, requires_all = ["key", "value"], conflicts_with = "file")]
        section: Option<String>,
        /// Dotted keys reach nested tables, e.g. auth.user
        #[arg(long, requires = "section")]
        key: Option<String>,
        /// Parsed as JSON when possible, stored as text otherwise
        #[arg(long, requires = "section")]
        value: Option<String>,
        /// Replacement document
        #[arg(long)]
        file: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Back up the configuration and overwrite it with the shipped template
    Reset {
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Restore the most recent backup
    Restore {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Back up, then merge the template into the configuration
    Upgrade {
        /// Template to merge instead of the configured one
        #[arg(long)]
        template: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List backups, newest first
    Backups {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Re-read the configuration file and rebuild validation state
    Reload,
}

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// Validate a JSON document against the active schema
    Validate {
        /// Document file (JSON object)
        file: PathBuf,
        /// Document class (knowledge or custom); inferred when omitted
        #[arg(long)]
        class: Option<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Generate a knowledge document and validate it
    Template {
        #[arg(long)]
        title: String,
        #[arg(long)]
        file_path: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        /// markdown, code, config, documentation, tutorial
        #[arg(long, default_value = "markdown")]
        source_type: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long)]
        summary: Option<String>,
        #[arg(long = "key-point")]
        key_points: Vec<String>,
        #[arg(long = "related")]
        related: Vec<String>,
        /// Output format (text or json)
        #[arg(long, default_value = "json")]
        format: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    fn parse(format: &str) -> Result<Self, ApiError> {
        match format {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ApiError::InvalidRequest(format!(
                "unknown output format '{}' (expected text or json)",
                other
            ))),
        }
    }
}

/// CLI context for executing commands
pub struct CliContext {
    admin: ConfigAdmin,
}

impl CliContext {
    /// Open the configuration described by already-loaded settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ApiError> {
        Ok(Self {
            admin: ConfigAdmin::from_settings(settings)?,
        })
    }

    pub fn admin(&self) -> &ConfigAdmin {
        &self.admin
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Config { command } => self.handle_config_command(command),
            Commands::Document { command } => self.handle_document_command(command),
        }
    }

    fn handle_config_command(&self, command: &ConfigCommands) -> Result<String, ApiError> {
        match command {
            ConfigCommands::Show { format } => self.handle_config_show(format),
            ConfigCommands::Validate { file, format } => {
                self.handle_config_validate(file.as_deref(), OutputFormat::parse(format)?)
            }
            ConfigCommands::Update {
                section,
                key,
                value,
                file,
                format,
            } => {
                let update = match (section, key, value, file) {
                    (_, _, _, Some(path)) => ConfigUpdate::Replace(read_config_file(path)?),
                    (Some(section), Some(key), Some(value), None) => {
                        ConfigUpdate::set(section.as_str(), key.as_str(), value.as_str())
                    }
                    _ => {
                        return Err(ApiError::InvalidRequest(
                            "update needs --section, --key and --value, or --file".to_string(),
                        ))
                    }
                };
                self.handle_config_update(update, OutputFormat::parse(format)?)
            }
            ConfigCommands::Reset { yes, format } => {
                self.handle_config_reset(*yes, OutputFormat::parse(format)?)
            }
            ConfigCommands::Restore { format } => {
                let format = OutputFormat::parse(format)?;
                let outcome = self.admin.restore_config()?;
                match format {
                    OutputFormat::Json => to_json(&outcome),
                    OutputFormat::Text => Ok(format_restore_text(&outcome)),
                }
            }
            ConfigCommands::Upgrade { template, format } => {
                self.handle_config_upgrade(template.as_deref(), OutputFormat::parse(format)?)
            }
            ConfigCommands::Backups { format } => {
                let format = OutputFormat::parse(format)?;
                let records = self.admin.list_backups()?;
                match format {
                    OutputFormat::Json => to_json(&records),
                    OutputFormat::Text => Ok(format_backups_text(&records)),
                }
            }
            ConfigCommands::Reload => {
                let active = self.admin.reload_config()?;
                Ok(format!(
                    "Configuration reloaded from {} (strict: {}, extra fields allowed: {})",
                    self.admin.store().location().display(),
                    active.policy().strict_schema_validation,
                    active.policy().allow_extra_fields
                ))
            }
        }
    }

    fn handle_config_show(&self, format: &str) -> Result<String, ApiError> {
        let document = self.admin.get_config();
        match format {
            "json" => Ok(render_document(&document)?),
            "toml" => toml::to_string_pretty(&document).map_err(|e| {
                ApiError::InvalidRequest(format!("configuration cannot be shown as TOML: {}", e))
            }),
            other => Err(ApiError::InvalidRequest(format!(
                "unknown output format '{}' (expected json or toml)",
                other
            ))),
        }
    }

    fn handle_config_validate(
        &self,
        file: Option<&Path>,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let result = match file {
            Some(path) => self.admin.validate_config(&read_config_file(path)?),
            None => self.admin.validate_config(self.admin.active().document()),
        };
        render_validation(&result, format)
    }

    fn handle_config_update(
        &self,
        update: ConfigUpdate,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let outcome = self.admin.update_config(update)?;
        if format == OutputFormat::Json {
            return to_json(&outcome);
        }
        let heading = match &outcome {
            UpdateOutcome::Applied { .. } => "Configuration updated",
            UpdateOutcome::Rejected { .. } => "Configuration update rejected; nothing was changed",
        };
        Ok(format!(
            "{}\n\n{}",
            format_section_heading(heading),
            format_validation_text(outcome.validation())
        ))
    }

    fn handle_config_reset(&self, yes: bool, format: OutputFormat) -> Result<String, ApiError> {
        if !yes {
            use dialoguer::Confirm;
            let confirmed = Confirm::new()
                .with_prompt(format!(
                    "Overwrite {} with the shipped template? A backup is taken first.",
                    self.admin.store().location().display()
                ))
                .interact()
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to get user input: {}", e)))?;

            if !confirmed {
                return Ok("Reset cancelled".to_string());
            }
        }

        let outcome = self.admin.reset_config()?;
        match format {
            OutputFormat::Json => to_json(&outcome),
            OutputFormat::Text => Ok(format_reset_text(&outcome)),
        }
    }

    fn handle_config_upgrade(
        &self,
        template: Option<&Path>,
        format: OutputFormat,
    ) -> Result<String, ApiError> {
        let override_template = template.map(DefaultTemplate::from_file).transpose()?;
        let outcome = self.admin.server_upgrade(override_template.as_ref())?;
        match format {
            OutputFormat::Json => to_json(&outcome),
            OutputFormat::Text => Ok(format_upgrade_text(&outcome)),
        }
    }

    fn handle_document_command(&self, command: &DocumentCommands) -> Result<String, ApiError> {
        match command {
            DocumentCommands::Validate {
                file,
                class,
                format,
            } => {
                let format = OutputFormat::parse(format)?;
                let class = class
                    .as_deref()
                    .map(str::parse::<DocumentClass>)
                    .transpose()
                    .map_err(ApiError::InvalidRequest)?;
                let document = read_document_file(file)?;
                let result = self.admin.validate_document(&document, class);
                render_validation(&result, format)
            }
            DocumentCommands::Template {
                title,
                file_path,
                priority,
                source_type,
                tags,
                summary,
                key_points,
                related,
                format,
            } => {
                let format = OutputFormat::parse(format)?;
                let request = DocumentTemplateRequest {
                    title: title.clone(),
                    file_path: file_path.clone(),
                    priority: priority.clone(),
                    source_type: source_type.clone(),
                    tags: tags.clone(),
                    summary: summary.clone(),
                    key_points: key_points.clone(),
                    related: related.clone(),
                };
                let result = self.admin.create_document_template(&request);
                match format {
                    OutputFormat::Json => to_json(&result),
                    OutputFormat::Text => {
                        let mut out = format_validation_text(&result);
                        if let Some(document) = result.document() {
                            out.push_str(&format!(
                                "\n{}\n\n{}\n",
                                format_section_heading("Document"),
                                serde_json::to_string_pretty(document).map_err(json_error)?
                            ));
                        }
                        Ok(out)
                    }
                }
            }
        }
    }
}

fn render_validation(result: &ValidationResult, format: OutputFormat) -> Result<String, ApiError> {
    match format {
        OutputFormat::Json => to_json(result),
        OutputFormat::Text => Ok(format_validation_text(result)),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(json_error)
}

fn json_error(e: serde_json::Error) -> ApiError {
    ApiError::StorageError(e.into())
}

fn read_config_file(path: &Path) -> Result<ConfigDocument, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_document(&text, path)?)
}

fn read_document_file(path: &Path) -> Result<Document, ApiError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        ApiError::InvalidRequest(format!("cannot read document {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|e| {
        ApiError::InvalidRequest(format!("document {} is not valid JSON: {}", path.display(), e))
    })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::InvalidRequest(format!(
            "document {} must be a JSON object, found {}",
            path.display(),
            json_type_name(&other)
        ))),
    }
}
