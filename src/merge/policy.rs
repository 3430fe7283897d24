//! Section policy table and deprecated-key filter.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How a top-level section is carried across an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPolicy {
    /// Replaced wholesale by the incoming template.
    Latest,
    /// Recursively merged; operator leaves win unless the template changed their type.
    Merge,
}

/// Sections whose structure must track the running code.
pub const LATEST_SECTIONS: &[&str] = &[
    "server",
    "schema",
    "version",
    "document_schema",
    "defaults",
    "required_fields",
    "field_types",
];

/// Sections that carry operator customizations.
pub const MERGE_SECTIONS: &[&str] = &[
    "security",
    "elasticsearch",
    "logging",
    "features",
    "custom",
    "document_validation",
];

/// Key prefixes dropped during merge.
pub const DEFAULT_DEPRECATED_PREFIXES: &[&str] = &["old_", "deprecated_", "legacy_"];

/// Lookup table from section name to policy. Sections not listed merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionPolicyTable {
    entries: BTreeMap<String, SectionPolicy>,
}

impl SectionPolicyTable {
    /// Table with no entries: every section merges.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Set or override the policy for one section.
    pub fn with(mut self, section: impl Into<String>, policy: SectionPolicy) -> Self {
        self.entries.insert(section.into(), policy);
        self
    }

    pub fn policy_for(&self, section: &str) -> SectionPolicy {
        self.entries
            .get(section)
            .copied()
            .unwrap_or(SectionPolicy::Merge)
    }
}

impl Default for SectionPolicyTable {
    fn default() -> Self {
        let table = LATEST_SECTIONS
            .iter()
            .fold(Self::empty(), |t, s| t.with(*s, SectionPolicy::Latest));
        MERGE_SECTIONS
            .iter()
            .fold(table, |t, s| t.with(*s, SectionPolicy::Merge))
    }
}

/// Drops keys whose names start with a deprecated prefix, at any depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecatedKeyFilter {
    prefixes: Vec<String>,
}

impl DeprecatedKeyFilter {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(Into::into)
                .filter(|p: &String| !p.is_empty())
                .collect(),
        }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_deprecated(&self, key: &str) -> bool {
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// Remove deprecated keys from `value` in place, recording their dotted paths.
    pub fn apply(&self, value: &mut Value, path: &str, dropped: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                let doomed: Vec<String> = map
                    .keys()
                    .filter(|k| self.is_deprecated(k))
                    .cloned()
                    .collect();
                for key in doomed {
                    map.remove(&key);
                    dropped.push(join_path(path, &key));
                }
                for (key, child) in map.iter_mut() {
                    self.apply(child, &join_path(path, key), dropped);
                }
            }
            Value::Array(items) => {
                for (i, item) in items.iter_mut().enumerate() {
                    self.apply(item, &format!("{}[{}]", path, i), dropped);
                }
            }
            _ => {}
        }
    }
}

impl Default for DeprecatedKeyFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DEPRECATED_PREFIXES.iter().copied())
    }
}

pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}
