//! Backup file names embed a sortable UTC timestamp with microsecond precision.

use crate::error::BackupError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

const PREFIX: &str = "config.backup.";
const SUFFIX: &str = ".json";
const STAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6fZ";
const STAMP_PARSE_FORMAT: &str = "%Y%m%dT%H%M%S%.fZ";

/// `config.backup.20250704T150000.000000Z.json`
pub fn backup_name(created_at: DateTime<Utc>) -> String {
    format!("{}{}{}", PREFIX, created_at.format(STAMP_FORMAT), SUFFIX)
}

/// Recover the timestamp embedded in a backup file name.
pub fn parse_backup_name(name: &str) -> Result<DateTime<Utc>, BackupError> {
    let invalid = || BackupError::InvalidName {
        name: name.to_string(),
    };
    let stamp = name
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(SUFFIX))
        .ok_or_else(invalid)?;
    let naive = NaiveDateTime::parse_from_str(stamp, STAMP_PARSE_FORMAT).map_err(|_| invalid())?;
    Ok(Utc.from_utc_datetime(&naive))
}
