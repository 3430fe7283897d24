//! Text rendering for CLI output.

use crate::admin::{ResetOutcome, RestoreOutcome, UpgradeOutcome};
use crate::backup::BackupRecord;
use crate::merge::MergeReport;
use crate::validation::ValidationResult;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Bold, underlined section heading.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_validation_text(result: &ValidationResult) -> String {
    let mut out = String::new();
    let verdict = if result.is_valid() {
        format!("{}", "valid".green())
    } else {
        format!("{}", "invalid".red())
    };
    out.push_str(&format!(
        "{}\n\n  Result: {}\n",
        format_section_heading(&format!("Validation: {}", result.subject())),
        verdict
    ));

    if !result.issues().is_empty() {
        out.push('\n');
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Kind", "Field", "Problem"]);
        for issue in result.issues() {
            table.add_row(vec![
                issue.kind.to_string(),
                issue.field.clone(),
                issue.message.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !result.corrections().is_empty() {
        out.push_str(&format!("\n{}\n\n", format_section_heading("Path corrections")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Field", "Was", "Now"]);
        for correction in result.corrections() {
            table.add_row(vec![
                correction.field.clone(),
                correction.original.clone(),
                correction.corrected.clone(),
            ]);
        }
        out.push_str(&format!("{}\n", table));
    }

    if !result.warnings().is_empty() {
        out.push_str(&format!("\n{}\n", format_section_heading("Warnings")));
        for warning in result.warnings() {
            out.push_str(&format!("  - {}\n", warning.yellow()));
        }
    }
    out
}

pub fn format_backups_text(records: &[BackupRecord]) -> String {
    if records.is_empty() {
        return "No configuration backups yet. Backups are taken before every reset and upgrade.\n"
            .to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Backup", "Created (UTC)", "Size", "Digest"]);
    for record in records {
        table.add_row(vec![
            record.name.clone(),
            record.created_at.format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
            format!("{} B", record.size_bytes),
            record.digest[..record.digest.len().min(12)].to_string(),
        ]);
    }
    format!(
        "{}\n\n{}\n",
        format_section_heading(&format!("Backups ({})", records.len())),
        table
    )
}

pub fn format_merge_report_text(report: &MergeReport) -> String {
    let rows: [(&str, &Vec<String>); 6] = [
        ("Replaced sections", &report.replaced_sections),
        ("Retired sections", &report.retired_sections),
        ("Added keys", &report.added_keys),
        ("Preserved keys", &report.preserved_keys),
        ("Dropped keys", &report.dropped_keys),
        ("Type conflicts", &report.type_conflicts),
    ];
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Change", "Count", "Paths"]);
    for (label, paths) in rows {
        table.add_row(vec![
            label.to_string(),
            paths.len().to_string(),
            paths.join(", "),
        ]);
    }
    format!("{}\n", table)
}

pub fn format_upgrade_text(outcome: &UpgradeOutcome) -> String {
    format!(
        "{}\n\n  From: {}\n  To: {}\n  Backup: {}\n\n{}",
        format_section_heading("Configuration upgraded"),
        outcome.from_version.as_deref().unwrap_or("unknown"),
        outcome.to_version.as_deref().unwrap_or("unknown"),
        outcome.backup.name,
        format_merge_report_text(&outcome.report)
    )
}

pub fn format_reset_text(outcome: &ResetOutcome) -> String {
    format!(
        "Configuration reset to the shipped template.\nPrevious configuration saved as {}\n",
        outcome.backup.name
    )
}

pub fn format_restore_text(outcome: &RestoreOutcome) -> String {
    format!(
        "Configuration restored from {} (taken {}).\n",
        outcome.backup.name,
        outcome.backup.created_at.to_rfc3339()
    )
}
