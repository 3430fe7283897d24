//! Section Merge
//!
//! Carries an operator's configuration across a template upgrade. Each
//! top-level section is either replaced by the template (`Latest`) or merged
//! leaf by leaf with the operator's values winning (`Merge`). Keys with a
//! deprecated prefix are dropped from the result at every depth.

pub mod engine;
pub mod policy;

pub use engine::{MergeReport, SectionMergeEngine};
pub use policy::{
    DeprecatedKeyFilter, SectionPolicy, SectionPolicyTable, DEFAULT_DEPRECATED_PREFIXES,
    LATEST_SECTIONS, MERGE_SECTIONS,
};
