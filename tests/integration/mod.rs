//! Integration tests for the kbase configuration lifecycle and document validation

mod cli_commands;
mod config_lifecycle;
mod document_validation;
mod support;
