//! Coursegen CLI Binary
//!
//! Command-line interface for the content-generation orchestrator.

use anyhow::Context;
use clap::Parser;
use coursegen::cli::{map_error, Cli, RunContext};
use coursegen::config::{ConfigLoader, CoursegenConfig};
use coursegen::logging::{init_logging, LogFormat, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    // Initialize logging early
    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(Some(&logging_config)) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Coursegen CLI starting");

    let context = match RunContext::new(config) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("Error initializing runtime: {:#}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            info!(exit_code = output.status.code(), "Command completed");
            println!("{}", output.body);
            process::exit(output.status.code());
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<CoursegenConfig> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_file(path);
    }
    loader.load().context("Failed to load configuration")
}

/// Precedence: CLI flags override config file override defaults. Environment variables are
/// applied later by `init_logging`.
fn build_logging_config(cli: &Cli, config: &CoursegenConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        logging.level = level.clone();
    }
    if let Some(format) = cli.log_format.as_deref().and_then(LogFormat::parse) {
        logging.format = format;
    }
    logging
}
