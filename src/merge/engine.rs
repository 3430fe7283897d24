//! SectionMergeEngine: carries a persisted configuration across a template upgrade.

use super::policy::{join_path, DeprecatedKeyFilter, SectionPolicy, SectionPolicyTable};
use crate::types::ConfigDocument;
use serde::Serialize;
use serde_json::{Map, Value};
use std::mem;

/// What a merge did, for logs and tool output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Sections taken wholesale from the incoming template.
    pub replaced_sections: Vec<String>,
    /// Sections merged leaf by leaf.
    pub merged_sections: Vec<String>,
    /// Latest-policy sections absent from the template, hence removed.
    pub retired_sections: Vec<String>,
    /// Operator leaves kept although the template does not know them.
    pub preserved_keys: Vec<String>,
    /// Leaves introduced by the template.
    pub added_keys: Vec<String>,
    /// Keys removed by the deprecated-prefix filter.
    pub dropped_keys: Vec<String>,
    /// Paths where the two sides disagreed on JSON type; the template's value won.
    pub type_conflicts: Vec<String>,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.retired_sections.is_empty()
            && self.added_keys.is_empty()
            && self.dropped_keys.is_empty()
            && self.type_conflicts.is_empty()
    }
}

/// Merges an existing configuration with an incoming template, section by section.
#[derive(Debug, Clone, Default)]
pub struct SectionMergeEngine {
    table: SectionPolicyTable,
    filter: DeprecatedKeyFilter,
}

impl SectionMergeEngine {
    pub fn new(table: SectionPolicyTable, filter: DeprecatedKeyFilter) -> Self {
        Self { table, filter }
    }

    /// Merge `incoming` into `existing`. Never fails.
    pub fn merge(&self, existing: &ConfigDocument, incoming: &ConfigDocument) -> ConfigDocument {
        self.merge_with_report(existing, incoming).0
    }

    pub fn merge_with_report(
        &self,
        existing: &ConfigDocument,
        incoming: &ConfigDocument,
    ) -> (ConfigDocument, MergeReport) {
        let mut report = MergeReport::default();
        let mut merged = ConfigDocument::new();

        // Template order first, then sections only the operator has.
        let sections: Vec<&String> = incoming
            .keys()
            .chain(existing.keys().filter(|k| !incoming.contains_key(*k)))
            .collect();

        for section in sections {
            let value = match self.table.policy_for(section) {
                SectionPolicy::Latest => match incoming.get(section) {
                    Some(template_value) => {
                        report.replaced_sections.push(section.clone());
                        template_value.clone()
                    }
                    None => {
                        report.retired_sections.push(section.clone());
                        continue;
                    }
                },
                SectionPolicy::Merge => {
                    report.merged_sections.push(section.clone());
                    match (existing.get(section), incoming.get(section)) {
                        (Some(current), Some(template_value)) => {
                            merge_value(current, template_value, section, &mut report)
                        }
                        (Some(current), None) => {
                            report.preserved_keys.push(section.clone());
                            current.clone()
                        }
                        (None, Some(template_value)) => {
                            report.added_keys.push(section.clone());
                            template_value.clone()
                        }
                        (None, None) => continue,
                    }
                }
            };

            let mut value = value;
            self.filter.apply(&mut value, section, &mut report.dropped_keys);
            merged.insert(section.clone(), value);
        }

        let dropped = report.dropped_keys.clone();
        let survives = |path: &String| {
            !dropped.iter().any(|d| {
                path == d
                    || path.starts_with(&format!("{}.", d))
                    || path.starts_with(&format!("{}[", d))
            })
        };
        report.preserved_keys.retain(|p| survives(p));
        report.added_keys.retain(|p| survives(p));

        tracing::debug!(
            replaced = report.replaced_sections.len(),
            merged = report.merged_sections.len(),
            preserved = report.preserved_keys.len(),
            added = report.added_keys.len(),
            dropped = report.dropped_keys.len(),
            conflicts = report.type_conflicts.len(),
            "configuration merge complete"
        );

        (merged, report)
    }
}

fn merge_value(current: &Value, template: &Value, path: &str, report: &mut MergeReport) -> Value {
    match (current, template) {
        (Value::Object(current_map), Value::Object(template_map)) => {
            let mut out = Map::new();
            for (key, template_child) in template_map {
                let child_path = join_path(path, key);
                let child = match current_map.get(key) {
                    Some(current_child) => {
                        merge_value(current_child, template_child, &child_path, report)
                    }
                    None => {
                        report.added_keys.push(child_path);
                        template_child.clone()
                    }
                };
                out.insert(key.clone(), child);
            }
            for (key, current_child) in current_map {
                if !template_map.contains_key(key) {
                    report.preserved_keys.push(join_path(path, key));
                    out.insert(key.clone(), current_child.clone());
                }
            }
            Value::Object(out)
        }
        (current, template) if mem::discriminant(current) == mem::discriminant(template) => {
            current.clone()
        }
        _ => {
            report.type_conflicts.push(path.to_string());
            template.clone()
        }
    }
}
