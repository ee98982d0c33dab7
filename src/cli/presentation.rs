//! CLI presentation: text and json formatters per command.

use crate::config::{CoursegenConfig, ValidationError};
use crate::error::WorkflowError;
use crate::generation::TaskStatusReport;
use crate::progress::WorkflowProgress;
use crate::reconcile::{NodeOutcome, ReconcileStatus};
use crate::types::TaskId;
use crate::workflow::WorkflowResult;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

fn colored_status(status: ReconcileStatus) -> String {
    match status {
        ReconcileStatus::Succeeded => status.as_str().green().bold().to_string(),
        ReconcileStatus::PartiallySucceeded => status.as_str().yellow().bold().to_string(),
        ReconcileStatus::Failed => status.as_str().red().bold().to_string(),
    }
}

fn outcome_label(outcome: &NodeOutcome) -> String {
    match outcome {
        NodeOutcome::Updated => "updated".green().to_string(),
        NodeOutcome::Failed { message } => format!("{} ({})", "failed".red(), message),
        NodeOutcome::NotGenerated => "unresolved".yellow().to_string(),
    }
}

/// One stderr line per progress update.
pub fn format_progress_line(progress: &WorkflowProgress) -> String {
    format!(
        "[{}/3 {:>3}%] {}",
        progress.phase.number(),
        progress.percent,
        progress.message
    )
}

pub fn format_workflow_result_text(result: &WorkflowResult) -> String {
    let mut output = format!("Workflow {}\n", colored_status(result.status));
    output.push_str(&format!(
        "Container: {}  Task: {}\n",
        result.container_id, result.task_id
    ));
    output.push_str(&format!(
        "Started: {}  (structuring {} ms, generating {} ms, reconciling {} ms)\n\n",
        result.started_at.to_rfc3339(),
        result.timings.structuring_ms,
        result.timings.generating_ms,
        result.timings.reconciling_ms
    ));

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Node", "Section", "Outcome"]);
    for id in &result.created_node_ids {
        let title = result
            .section_titles
            .get(id)
            .map(String::as_str)
            .unwrap_or("");
        let outcome = result
            .per_node_outcome
            .get(id)
            .map(outcome_label)
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![id.to_string(), title.to_string(), outcome]);
    }
    output.push_str(&table.to_string());
    output.push('\n');

    if !result.misses.is_empty() {
        output.push_str(&format!(
            "\n{} generated section(s) matched no node:\n",
            result.misses.len()
        ));
        for miss in &result.misses {
            output.push_str(&format!("  {}  {}\n", miss.correlation_id, miss.title));
        }
    }

    if !result.ai_statistics.is_null() {
        output.push_str(&format!("\nAI statistics: {}\n", result.ai_statistics));
    }
    output
}

pub fn format_workflow_result_json(result: &WorkflowResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_workflow_error_text(err: &WorkflowError) -> String {
    format!(
        "Workflow {} during {} ({}): {}",
        "failed".red().bold(),
        err.phase(),
        err.kind(),
        err
    )
}

pub fn format_workflow_error_json(err: &WorkflowError) -> String {
    let out = json!({
        "status": "failed",
        "phase": err.phase(),
        "kind": err.kind(),
        "message": err.to_string(),
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_task_status_text(task_id: &TaskId, report: &TaskStatusReport) -> String {
    let mut output = format!("Task {}: {}", task_id, report.status.as_str());
    if let Some(percent) = report.progress_percent {
        output.push_str(&format!(" ({}%)", percent));
    }
    if let Some(message) = &report.message {
        output.push_str(&format!(" - {}", message));
    }
    output
}

pub fn format_task_status_json(task_id: &TaskId, report: &TaskStatusReport) -> String {
    let out = json!({
        "task_id": task_id,
        "status": report.status.as_str(),
        "progress_percent": report.progress_percent,
        "message": report.message,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

pub fn format_validation_result(result: &Result<(), Vec<ValidationError>>) -> String {
    match result {
        Ok(()) => format!("{} Configuration is valid", "✓".green()),
        Err(errors) => {
            let mut output = format!(
                "{} Configuration has {} problem(s):\n",
                "✗".red(),
                errors.len()
            );
            for error in errors {
                output.push_str(&format!("  - {}\n", error));
            }
            output
        }
    }
}

/// TOML rendering of the effective config with tokens masked.
pub fn format_config_show(config: &CoursegenConfig) -> String {
    let mut shown = config.clone();
    for endpoint in [&mut shown.primary_store, &mut shown.generation] {
        if endpoint.api_token.is_some() {
            endpoint.api_token = Some("********".to_string());
        }
    }
    toml::to_string_pretty(&shown)
        .unwrap_or_else(|e| format!("# failed to render configuration: {}", e))
}
