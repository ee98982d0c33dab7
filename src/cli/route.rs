//! CLI route: single route table and run context. Dispatches to the workflow driver and
//! presentation.

use crate::cli::output::{CommandOutput, ExitStatus};
use crate::cli::parse::{Commands, ConfigCommands, OutputFormat};
use crate::cli::presentation::{
    format_config_show, format_progress_line, format_task_status_json, format_task_status_text,
    format_validation_result, format_workflow_error_json, format_workflow_error_text,
    format_workflow_result_json, format_workflow_result_text,
};
use crate::config::CoursegenConfig;
use crate::progress::WorkflowProgress;
use crate::service::{GenerationService, HttpGenerationService, HttpPrimaryStore};
use crate::types::{StructureSpec, TaskId, WorkflowContext};
use crate::workflow::WorkflowDriver;
use anyhow::{anyhow, Context};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runtime context for CLI execution: effective config plus the tokio runtime commands block on.
pub struct RunContext {
    config: CoursegenConfig,
    runtime: Runtime,
}

impl RunContext {
    pub fn new(config: CoursegenConfig) -> anyhow::Result<Self> {
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &CoursegenConfig {
        &self.config
    }

    /// Execute a CLI command via the single route table.
    pub fn execute(&self, command: &Commands) -> anyhow::Result<CommandOutput> {
        match command {
            Commands::Run {
                spec,
                context,
                format,
            } => self.handle_run(spec, context, *format),
            Commands::Status { task, format } => self.handle_status(task, *format),
            Commands::Config { command } => Ok(self.handle_config(command)),
        }
    }

    fn ensure_valid_config(&self) -> anyhow::Result<()> {
        self.config.validate().map_err(|errors| {
            let lines: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            anyhow!("Configuration validation failed:\n{}", lines.join("\n"))
        })
    }

    fn handle_run(
        &self,
        spec_path: &Path,
        context_path: &Path,
        format: OutputFormat,
    ) -> anyhow::Result<CommandOutput> {
        let spec: StructureSpec = load_json(spec_path, "structure spec")?;
        let context: WorkflowContext = load_json(context_path, "workflow context")?;
        self.ensure_valid_config()?;

        let store = HttpPrimaryStore::new(&self.config.primary_store)
            .context("Failed to set up primary store client")?;
        let generator = HttpGenerationService::new(&self.config.generation)
            .context("Failed to set up generation service client")?;
        let driver = WorkflowDriver::with_options(
            Arc::new(store),
            Arc::new(generator),
            self.config.workflow_options(),
        );

        info!(
            sections = spec.len(),
            container = %context.container_name,
            "Starting workflow"
        );
        let outcome = self.runtime.block_on(async {
            let cancel = CancellationToken::new();
            let interrupt = {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("Interrupt received; cancelling workflow");
                        cancel.cancel();
                    }
                })
            };
            let sink = |progress: WorkflowProgress| eprintln!("{}", format_progress_line(&progress));
            let outcome = driver.run(&spec, &context, &sink, &cancel).await;
            interrupt.abort();
            outcome
        });

        Ok(match outcome {
            Ok(result) => {
                let status = ExitStatus::for_result(&result);
                let body = match format {
                    OutputFormat::Text => format_workflow_result_text(&result),
                    OutputFormat::Json => format_workflow_result_json(&result),
                };
                CommandOutput::with_status(body, status)
            }
            Err(err) => {
                let body = match format {
                    OutputFormat::Text => format_workflow_error_text(&err),
                    OutputFormat::Json => format_workflow_error_json(&err),
                };
                CommandOutput::with_status(body, ExitStatus::Failure)
            }
        })
    }

    fn handle_status(&self, task: &str, format: OutputFormat) -> anyhow::Result<CommandOutput> {
        self.config
            .generation
            .validate()
            .map_err(|e| anyhow!("Generation endpoint: {}", e))?;
        let service = HttpGenerationService::new(&self.config.generation)
            .context("Failed to set up generation service client")?;
        let task_id = TaskId::new(task);
        let report = self
            .runtime
            .block_on(service.task_status(&task_id))
            .with_context(|| format!("Failed to fetch status of task {}", task_id))?;
        Ok(CommandOutput::success(match format {
            OutputFormat::Text => format_task_status_text(&task_id, &report),
            OutputFormat::Json => format_task_status_json(&task_id, &report),
        }))
    }

    fn handle_config(&self, command: &ConfigCommands) -> CommandOutput {
        match command {
            ConfigCommands::Validate => {
                let result = self.config.validate();
                let status = if result.is_ok() {
                    ExitStatus::Success
                } else {
                    ExitStatus::Failure
                };
                CommandOutput::with_status(format_validation_result(&result), status)
            }
            ConfigCommands::Show => CommandOutput::success(format_config_show(&self.config)),
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {} {}", what, path.display()))
}
