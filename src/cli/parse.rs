//! CLI parse: clap types for coursegen. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Coursegen CLI - AI-generated lesson plans and exams
#[derive(Debug, Parser)]
#[command(name = "coursegen")]
#[command(about = "Build a section outline, have the AI fill it in, write the results back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the user config)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true, value_parser = ["text", "json"], ignore_case = true)]
    pub log_format: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a full workflow: structure, generate, reconcile
    Run {
        /// JSON file with the section outline (`{"sections": [...]}`)
        #[arg(long)]
        spec: PathBuf,
        /// JSON file with the workflow context (kind, containerName, requestedBy, ...)
        #[arg(long)]
        context: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Fetch the current status of a generation task once
    Status {
        /// Task id returned at submission
        #[arg(long)]
        task: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Inspect the effective configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Load and validate the configuration
    Validate,
    /// Print the effective configuration (tokens redacted)
    Show,
}
