//! Kbase CLI Binary
//!
//! Command-line interface for configuration lifecycle and document validation.

use clap::Parser;
use kbase::config::SettingsLoader;
use kbase::logging::init_logging;
use kbase::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let mut settings = match SettingsLoader::load(cli.settings.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            process::exit(1);
        }
    };
    if let Some(config) = &cli.config {
        settings.paths.config_file = Some(config.clone());
    }
    settings.logging = cli.logging_config(&settings.logging);

    if let Err(e) = init_logging(Some(&settings.logging)) {
        eprintln!("Error initializing logging: {}", e);
        process::exit(1);
    }

    // Opening fails fast on a missing or malformed required section.
    let context = match CliContext::from_settings(&settings) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
