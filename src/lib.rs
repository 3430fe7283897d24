//! Kbase: Configuration Lifecycle and Document Validation
//!
//! Keeps a knowledge-base tool server's JSON configuration correct across
//! updates, resets, and version upgrades, and validates the documents the
//! server stores against the schema that configuration declares.

pub mod admin;
pub mod backup;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod store;
pub mod template;
pub mod tooling;
pub mod types;
pub mod validation;
